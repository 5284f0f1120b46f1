mod github;

pub use github::GithubLockfileFetcher;

use thiserror::Error;

use crate::{
    cache::CacheError,
    model::{lockfile::Lockfile, repository::PinnedRepository, ParseError},
};

pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Retrieves the lockfile of a repository at a pinned commit.
pub trait LockfileFetcher {
    fn fetch_lockfile(&self, repository: &PinnedRepository) -> Result<Lockfile, LockfileError>;
}

#[derive(Error, Debug)]
pub enum LockfileError {
    #[error("No package-lock.json in {repository}")]
    NotFound { repository: PinnedRepository },
    #[error("Error while fetching the lockfile of {repository}: {source}")]
    Fetch {
        repository: PinnedRepository,
        #[source]
        source: CacheError,
    },
    #[error("Invalid package-lock.json in {repository}: {source}")]
    Parse {
        repository: PinnedRepository,
        #[source]
        source: ParseError,
    },
}
