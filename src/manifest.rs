use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::{debug, info};
use regex_lite::Regex;
use thiserror::Error;

use crate::model::source::Source;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Output location {0} is not a directory")]
    BadOutputDir(String),
    #[error("Error while serializing {file_name}: {source}")]
    Serialize {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No `commit:` of {url} was found in {path}")]
    PatchFailure { path: String, url: String },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// Writes `sources` as pretty printed JSON to `directory/file_name`.
pub fn write_sources(
    directory: &Path,
    file_name: &str,
    sources: &[Source],
) -> Result<PathBuf, ManifestError> {
    if !directory.exists() {
        std::fs::create_dir_all(directory)?;
    } else if !directory.is_dir() {
        return Err(ManifestError::BadOutputDir(directory.display().to_string()));
    }

    let mut json = serde_json::to_string_pretty(sources).map_err(|source| {
        ManifestError::Serialize {
            file_name: file_name.to_owned(),
            source,
        }
    })?;
    json.push('\n');

    let path = directory.join(file_name);
    std::fs::write(&path, json)?;
    info!("Wrote {} sources to {}", sources.len(), path.display());
    Ok(path)
}

/// Points the git source of `url` in a flatpak-builder manifest at `commit`.
pub fn patch_commit(manifest: &Path, url: &str, commit: &str) -> Result<(), ManifestError> {
    let text = std::fs::read_to_string(manifest)?;
    let patched = patch_commit_str(&text, url, commit).ok_or_else(|| {
        ManifestError::PatchFailure {
            path: manifest.display().to_string(),
            url: url.to_owned(),
        }
    })?;
    if patched == text {
        debug!("{} already builds {}", manifest.display(), commit);
    } else {
        std::fs::write(manifest, patched)?;
        info!("Updated {} to {}", manifest.display(), commit);
    }
    Ok(())
}

/// Replaces the first `commit:` line that follows the `url:` line of `url`.
/// Returns `None` if there is no such line.
fn patch_commit_str(text: &str, url: &str, commit: &str) -> Option<String> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    static COMMIT_RE: OnceLock<Regex> = OnceLock::new();
    let url_re =
        URL_RE.get_or_init(|| Regex::new(r#"^\s*(?:-\s+)?url:\s*["']?(?P<url>[^"'\s]+)["']?\s*$"#).unwrap());
    let commit_re = COMMIT_RE.get_or_init(|| {
        Regex::new(r#"^(?P<key>\s*(?:-\s+)?commit:\s*)["']?[0-9a-f]{40}["']?(?P<rest>\s*)$"#)
            .unwrap()
    });

    let wanted = normalize_url(url);
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    let mut after_url = false;
    let mut patched = false;
    for line in lines.iter_mut() {
        if let Some(captures) = url_re.captures(line) {
            after_url = normalize_url(&captures["url"]) == wanted;
            continue;
        }
        if !after_url {
            continue;
        }
        let replacement = commit_re
            .captures(line)
            .map(|captures| format!("{}{}{}", &captures["key"], commit, &captures["rest"]));
        if let Some(replacement) = replacement {
            *line = replacement;
            patched = true;
            break;
        }
    }

    patched.then(|| lines.join("\n"))
}

fn normalize_url(url: &str) -> &str {
    url.trim_end_matches('/').trim_end_matches(".git")
}
