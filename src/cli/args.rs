use clap::Parser;

use crate::model::repository::Repository;

/// Generates flatpak-builder sources for building an Electron application
/// offline.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    /// Tag, branch or full commit hash of the upstream repository.
    /// Defaults to its newest release tag.
    pub revision: Option<String>,
    /// Directory the `*-sources.json` files are written to.
    #[clap(short, long, env = "SOURCEGEN_OUTPUT_DIR")]
    pub output_directory: Option<String>,
    /// Location of the download cache.
    /// Defaults to `$HOME/.cache/flatpak-sourcegen`.
    #[clap(long)]
    pub cache_directory: Option<String>,
    /// flatpak-builder manifest whose upstream `commit:` is updated.
    #[clap(long)]
    pub manifest: Option<String>,
    /// Upstream repository as `owner/name`.
    #[clap(long)]
    pub repository: Option<Repository>,
    /// Removes every cached download before generating.
    #[clap(long)]
    pub clear_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_all_flags() {
        let args = CliArgs::try_parse_from([
            "flatpak-sourcegen",
            "v1.2.3",
            "-o",
            "out",
            "--cache-directory",
            "cache",
            "--manifest",
            "app.yaml",
            "--repository",
            "fork/desktop",
            "--clear-cache",
        ])
        .unwrap();

        assert_eq!(args.revision.as_deref(), Some("v1.2.3"));
        assert_eq!(args.output_directory.as_deref(), Some("out"));
        assert_eq!(args.cache_directory.as_deref(), Some("cache"));
        assert_eq!(args.manifest.as_deref(), Some("app.yaml"));
        assert_eq!(args.repository, Some(Repository::new("fork", "desktop")));
        assert!(args.clear_cache);
    }

    #[test]
    fn reject_malformed_repository() {
        assert!(CliArgs::try_parse_from(["flatpak-sourcegen", "--repository", "desktop"]).is_err());
    }
}
