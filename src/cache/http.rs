use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, info, trace};
use reqwest::{blocking::Client, StatusCode};
use sha2::{Digest, Sha256};

use crate::flock::FileLock;

use super::{CacheError, ContentFetcher};

const OBJECTS_DIR: &str = "objects";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher backed by an on-disk cache keyed by the SHA-256 of the URL.
///
/// Every URL this tool fetches is immutable (pinned commits, release assets,
/// content-addressed library files), so entries never expire.
pub struct HttpContentCache {
    location: PathBuf,
    objects: PathBuf,
    client: Client,
    _lock: FileLock,
}

impl HttpContentCache {
    pub fn new(location: PathBuf) -> Result<HttpContentCache, CacheError> {
        if location.exists() {
            if !location.is_dir() {
                return Err(CacheError::BadLocation {
                    location: location.to_str().unwrap_or("").to_string(),
                });
            }
        } else {
            std::fs::create_dir_all(&location)?;
        }

        let lock = Self::acquire_lock(&location)?;

        let objects = location.join(OBJECTS_DIR);
        std::fs::create_dir_all(&objects)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(CacheError::Client)?;

        Ok(HttpContentCache {
            location,
            objects,
            client,
            _lock: lock,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Removes every cached response. The lock stays in place.
    pub fn clear(&self) -> Result<(), CacheError> {
        if self.objects.exists() {
            info!("Clearing content cache {}.", self.objects.display());
            std::fs::remove_dir_all(&self.objects)?;
        }
        std::fs::create_dir_all(&self.objects)?;
        Ok(())
    }

    fn acquire_lock(location: &Path) -> Result<FileLock, CacheError> {
        let location = location.join(".lock");
        debug!(
            "Acquiring a lock on the cache location: {}",
            location.display()
        );
        let lock = FileLock::acquire(&location)?;
        debug!("Acquired a lock on the cache location");
        Ok(lock)
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.objects.join(hex::encode(Sha256::digest(url.as_bytes())))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        let http_error = |source| CacheError::Http {
            url: url.to_owned(),
            source,
        };
        let response = self.client.get(url).send().map_err(http_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CacheError::NotFound {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(CacheError::RemoteFetchFailure {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().map_err(http_error)?.to_vec())
    }

    // Readers never observe a partially written entry: each writer gets its
    // own temporary file which is renamed into place.
    fn store(&self, path: &Path, data: &[u8]) -> Result<(), CacheError> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let temp = path.with_extension(format!(
            "{}-{}.temp",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        trace!("Writing {}", temp.display());
        std::fs::write(&temp, data)?;
        std::fs::rename(&temp, path)?;
        Ok(())
    }
}

impl ContentFetcher for HttpContentCache {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.entry_path(url);
        match std::fs::read(&path) {
            Ok(data) => {
                info!("Cached: {}", url);
                return Ok(data);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!("Fetching: {}", url);
        let data = self.download(url)?;
        self.store(&path, &data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn serve_cached_entries_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpContentCache::new(dir.path().join("cache")).unwrap();
        let url = "https://invalid.example/never-fetched.json";
        std::fs::write(cache.entry_path(url), b"{}").unwrap();

        assert_eq!(cache.fetch(url).unwrap(), b"{}");
    }

    #[test]
    fn entries_are_keyed_by_url_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpContentCache::new(dir.path().to_path_buf()).unwrap();
        let path = cache.entry_path("https://example.com/");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "0f115db062b7c0dd030b16878c99dea5c354b49dc37b38eb8846179c7783e9d7"
        );
        assert_ne!(path, cache.entry_path("https://example.com"));
    }

    #[test]
    fn store_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpContentCache::new(dir.path().to_path_buf()).unwrap();
        let path = cache.entry_path("https://example.com/a");
        cache.store(&path, b"first").unwrap();
        cache.store(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(&cache.objects)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".temp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpContentCache::new(dir.path().to_path_buf()).unwrap();
        let path = cache.entry_path("https://example.com/a");
        cache.store(&path, b"data").unwrap();

        cache.clear().unwrap();
        assert!(!path.exists());
        assert!(cache.objects.is_dir());
    }

    #[test]
    fn reject_file_as_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            HttpContentCache::new(file),
            Err(CacheError::BadLocation { .. })
        ));
    }
}
