use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::model::repository::Repository;

pub const CONFIG_FILE_NAME: &str = "sourcegen.toml";

pub const DEFAULT_UPSTREAM_OWNER: &str = "TurboWarp";
pub const DEFAULT_UPSTREAM_REPOSITORY: &str = "desktop";

pub struct SourcegenConfig {
    pub cache_dir: Option<PathBuf>,
    pub upstream: Option<Repository>,
}

impl SourcegenConfig {
    /// Loads `sourcegen.toml` from `root` if present, overridden by
    /// `SOURCEGEN_*` environment variables.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(Some(&root.join(CONFIG_FILE_NAME)), None)?;

        Ok(Self {
            cache_dir: raw_config.cache.dir,
            upstream: raw_config.upstream.into_repository(),
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    upstream: UpstreamConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct UpstreamConfig {
    owner: Option<String>,
    repository: Option<String>,
}

impl UpstreamConfig {
    /// A fork may override only one half of the default upstream.
    fn into_repository(self) -> Option<Repository> {
        match (self.owner, self.repository) {
            (None, None) => None,
            (owner, repository) => Some(Repository::new(
                owner.unwrap_or_else(|| DEFAULT_UPSTREAM_OWNER.to_owned()),
                repository.unwrap_or_else(|| DEFAULT_UPSTREAM_REPOSITORY.to_owned()),
            )),
        }
    }
}

impl RawConfig {
    fn load(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("SOURCEGEN")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(None, Some(env)).unwrap();
        assert_eq!(config, RawConfig::default())
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            ("SOURCEGEN_CACHE_DIR".to_owned(), "/cache".to_owned()),
            ("SOURCEGEN_UPSTREAM_OWNER".to_owned(), "fork".to_owned()),
            (
                "SOURCEGEN_UPSTREAM_REPOSITORY".to_owned(),
                "desktop-fork".to_owned(),
            ),
        ]);
        let config = RawConfig::load(None, Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                cache: CacheConfig {
                    dir: Some("/cache".into())
                },
                upstream: UpstreamConfig {
                    owner: Some("fork".to_owned()),
                    repository: Some("desktop-fork".to_owned())
                },
            }
        )
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &file,
            "[cache]\ndir = \"/from-file\"\n\n[upstream]\nowner = \"fork\"\n",
        )
        .unwrap();
        let env = HashMap::from([("SOURCEGEN_CACHE_DIR".to_owned(), "/from-env".to_owned())]);

        let config = RawConfig::load(Some(&file), Some(env)).unwrap();

        assert_eq!(config.cache.dir, Some("/from-env".into()));
        assert_eq!(
            config.upstream.into_repository(),
            Some(Repository::new("fork", "desktop"))
        );
    }

    #[test]
    fn missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = RawConfig::load(
            Some(&dir.path().join(CONFIG_FILE_NAME)),
            Some(HashMap::new()),
        )
        .unwrap();
        assert_eq!(config, RawConfig::default());
    }
}
