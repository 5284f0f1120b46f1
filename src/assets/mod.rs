//! Resolvers for the files the application needs besides its node modules.
//!
//! Each resolver is independent of the dependency walk and of the others.

use thiserror::Error;

use crate::{
    cache::{CacheError, FetchJsonError},
    model::ParseError,
};

pub mod electron;
pub mod extensions;
pub mod library;
pub mod microbit;
pub mod packager;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Hash mismatch for {url}: expected {expected} got {actual}")]
    IntegrityMismatch {
        url: String,
        expected: String,
        actual: String,
    },
    #[error(transparent)]
    Fetch(#[from] CacheError),
    #[error(transparent)]
    Document(#[from] FetchJsonError),
    #[error("Invalid {context}: {source}")]
    Invalid {
        context: String,
        #[source]
        source: ParseError,
    },
}

impl AssetError {
    fn invalid(context: impl Into<String>, source: ParseError) -> Self {
        AssetError::Invalid {
            context: context.into(),
            source,
        }
    }
}

fn validate_sha256(sha256: &str) -> Result<(), ParseError> {
    if sha256.len() == 64 && sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ParseError::malformed("sha256 digest", sha256))
    }
}
