use log::debug;

use crate::{
    cache::{CacheError, ContentFetcher},
    model::{lockfile::Lockfile, repository::PinnedRepository},
};

use super::{LockfileError, LockfileFetcher, LOCKFILE_NAME};

/// Reads `package-lock.json` from the root of a GitHub repository through a
/// [`ContentFetcher`]. Commits are immutable, so a cached response is always
/// valid.
pub struct GithubLockfileFetcher<F> {
    fetcher: F,
}

impl<F> GithubLockfileFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F> LockfileFetcher for GithubLockfileFetcher<F>
where
    F: ContentFetcher,
{
    fn fetch_lockfile(&self, repository: &PinnedRepository) -> Result<Lockfile, LockfileError> {
        let url = repository.raw_url(LOCKFILE_NAME);
        debug!("Reading lockfile of {} from {}", repository, url);
        let bytes = self.fetcher.fetch(&url).map_err(|e| match e {
            CacheError::NotFound { .. } => LockfileError::NotFound {
                repository: repository.clone(),
            },
            source => LockfileError::Fetch {
                repository: repository.clone(),
                source,
            },
        })?;
        Lockfile::from_slice(&bytes).map_err(|source| LockfileError::Parse {
            repository: repository.clone(),
            source,
        })
    }
}
