mod http;

pub use http::HttpContentCache;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::ParseError;

/// Retrieves the bytes behind a URL, possibly from a local cache.
pub trait ContentFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError>;
}

impl<T: ContentFetcher + ?Sized> ContentFetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        (**self).fetch(url)
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("{url} was not found")]
    NotFound { url: String },
    #[error("HTTP {status} fetching {url}")]
    RemoteFetchFailure { url: String, status: u16 },
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Could not create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Cache location {location} is not a directory")]
    BadLocation { location: String },
    #[error("Cache lock cannot be acquired")]
    Lock(#[from] crate::flock::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FetchJsonError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Invalid document {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
}

/// Fetches and deserializes a JSON document.
pub fn fetch_json<T, F>(fetcher: &F, url: &str) -> Result<T, FetchJsonError>
where
    T: DeserializeOwned,
    F: ContentFetcher + ?Sized,
{
    let bytes = fetcher.fetch(url)?;
    serde_json::from_slice(&bytes).map_err(|e| FetchJsonError::Parse {
        url: url.to_owned(),
        source: e.into(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::{CacheError, ContentFetcher};

    /// In-memory fetcher serving canned documents and recording every request.
    #[derive(Default, Clone)]
    pub struct FakeFetcher {
        documents: HashMap<String, Vec<u8>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFetcher {
        pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
            self.documents.insert(url.into(), body.into());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests().iter().filter(|request| *request == url).count()
        }
    }

    impl ContentFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
            self.requests.lock().unwrap().push(url.to_owned());
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| CacheError::NotFound {
                    url: url.to_owned(),
                })
        }
    }
}
