use serde::Serialize;

/// A single entry of a flatpak-builder `sources` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    File(FileSource),
    Git(GitSource),
    Script(ScriptSource),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileSource {
    pub url: String,
    #[serde(flatten)]
    pub checksum: Checksum,
    pub dest: String,
    pub dest_filename: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only_arches: Vec<Arch>,
}

impl FileSource {
    pub fn new(
        url: impl Into<String>,
        checksum: Checksum,
        dest: impl Into<String>,
        dest_filename: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            checksum,
            dest: dest.into(),
            dest_filename: dest_filename.into(),
            only_arches: Vec::new(),
        }
    }

    pub fn only_arch(mut self, arch: Arch) -> Self {
        self.only_arches.push(arch);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Checksum {
    Sha256(String),
    Sha512(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSource {
    pub url: String,
    pub commit: String,
    pub dest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptSource {
    pub commands: Vec<String>,
    pub dest: String,
    pub dest_filename: String,
}

impl From<FileSource> for Source {
    fn from(source: FileSource) -> Self {
        Source::File(source)
    }
}

impl From<GitSource> for Source {
    fn from(source: GitSource) -> Self {
        Source::Git(source)
    }
}

impl From<ScriptSource> for Source {
    fn from(source: ScriptSource) -> Self {
        Source::Script(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serialize_file_source() {
        let source: Source = FileSource::new(
            "https://example.com/electron.zip",
            Checksum::Sha256("abc".to_owned()),
            "electron",
            "electron.zip",
        )
        .only_arch(Arch::Aarch64)
        .into();
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({
                "type": "file",
                "url": "https://example.com/electron.zip",
                "sha256": "abc",
                "dest": "electron",
                "dest-filename": "electron.zip",
                "only-arches": ["aarch64"]
            })
        );
    }

    #[test]
    fn serialize_file_source_without_arches() {
        let source: Source = FileSource::new(
            "https://example.com/a.tgz",
            Checksum::Sha512("00".to_owned()),
            "flatpak-node",
            "a-00",
        )
        .into();
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({
                "type": "file",
                "url": "https://example.com/a.tgz",
                "sha512": "00",
                "dest": "flatpak-node",
                "dest-filename": "a-00"
            })
        );
    }

    #[test]
    fn serialize_git_and_script_sources() {
        let sources = vec![
            Source::Git(GitSource {
                url: "https://github.com/a/b.git".to_owned(),
                commit: "c".repeat(40),
                dest: "flatpak-node/git/b".to_owned(),
            }),
            Source::Script(ScriptSource {
                commands: vec!["set -x".to_owned()],
                dest: "flatpak-node".to_owned(),
                dest_filename: "install.sh".to_owned(),
            }),
        ];
        assert_eq!(
            serde_json::to_value(&sources).unwrap(),
            json!([
                {
                    "type": "git",
                    "url": "https://github.com/a/b.git",
                    "commit": "c".repeat(40),
                    "dest": "flatpak-node/git/b"
                },
                {
                    "type": "script",
                    "commands": ["set -x"],
                    "dest": "flatpak-node",
                    "dest-filename": "install.sh"
                }
            ])
        );
    }
}
