use std::{path::PathBuf, sync::Arc};

use crate::{
    cache::HttpContentCache,
    cli::command_handlers::{do_clear_cache, do_generate},
    git::GitRemote,
    model::repository::Repository,
};

mod builder;

pub use builder::SourcegenBuilder;

pub struct Sourcegen {
    cache: Arc<HttpContentCache>,
    upstream: Repository,
    output_directory: PathBuf,
    manifest: Option<PathBuf>,
}

impl Sourcegen {
    pub fn builder() -> SourcegenBuilder {
        SourcegenBuilder::default()
    }

    /// Generates every source manifest for `revision` of the upstream
    /// repository, or for its newest release if `revision` is `None`.
    pub fn generate(&self, revision: Option<&str>) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(do_generate(
            GitRemote,
            Arc::clone(&self.cache),
            &self.upstream,
            revision,
            &self.output_directory,
            self.manifest.as_deref(),
        ))
    }

    /// Removes every cached download.
    pub fn clear_cache(&self) -> anyhow::Result<()> {
        do_clear_cache(&self.cache)
    }
}
