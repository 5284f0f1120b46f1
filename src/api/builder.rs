use std::{env, path::PathBuf, sync::Arc};

use anyhow::Context;
use home::home_dir;

use crate::{
    cache::HttpContentCache,
    config::{SourcegenConfig, DEFAULT_UPSTREAM_OWNER, DEFAULT_UPSTREAM_REPOSITORY},
    model::repository::Repository,
    Sourcegen,
};

#[derive(Default)]
pub struct SourcegenBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    cache_directory: Option<PathBuf>,
    upstream: Option<Repository>,
    manifest: Option<PathBuf>,
}

impl SourcegenBuilder {
    /// Directory holding `sourcegen.toml`.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Where the `*-sources.json` files are written.
    ///
    /// Defaults to `root`.
    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(path.into());
        self
    }

    /// Location of the download cache.
    ///
    /// Defaults to `$HOME/.cache/flatpak-sourcegen`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(path.into());
        self
    }

    /// Repository of the application to generate sources for.
    ///
    /// Defaults to `TurboWarp/desktop`.
    pub fn upstream(mut self, repository: Repository) -> Self {
        self.upstream = Some(repository);
        self
    }

    /// flatpak-builder manifest whose upstream commit is updated after a
    /// successful run.
    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    pub fn try_build(self) -> anyhow::Result<Sourcegen> {
        let Self {
            root,
            output_directory,
            cache_directory,
            upstream,
            manifest,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let config = SourcegenConfig::load(&root)?;

        let cache_directory = match cache_directory.or(config.cache_dir) {
            Some(cache_directory) => root.join(cache_directory),
            None => default_cache_directory()?,
        };
        let cache = HttpContentCache::new(cache_directory)?;

        let upstream = upstream.or(config.upstream).unwrap_or_else(|| {
            Repository::new(DEFAULT_UPSTREAM_OWNER, DEFAULT_UPSTREAM_REPOSITORY)
        });

        let output_directory = match output_directory {
            Some(output_directory) => root.join(output_directory),
            None => root.clone(),
        };

        Ok(Sourcegen {
            cache: Arc::new(cache),
            upstream,
            output_directory,
            manifest: manifest.map(|manifest| root.join(manifest)),
        })
    }
}

fn default_cache_directory() -> anyhow::Result<PathBuf> {
    let mut cache_directory =
        home_dir().context("Could not find home dir. Please define $HOME env variable.")?;
    cache_directory.push(".cache/flatpak-sourcegen");
    Ok(cache_directory)
}
