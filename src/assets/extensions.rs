use std::collections::{BTreeMap, HashSet};

use log::info;
use serde::Deserialize;

use crate::{
    cache::{fetch_json, CacheError, ContentFetcher, FetchJsonError},
    model::{
        repository::PinnedRepository,
        source::{Checksum, FileSource, Source},
        ParseError,
    },
};

use super::{validate_sha256, AssetError};

pub const EXTENSION_DEPENDENCIES_PATH: &str = "scripts/extension-dependencies.json";
const DEST: &str = "extension-dependencies";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionDependency {
    pub sha256: String,
}

/// Files that bundled extensions load at runtime, keyed by URL.
pub fn resolve_extension_dependencies<F>(
    fetcher: &F,
    upstream: &PinnedRepository,
) -> Result<Vec<Source>, AssetError>
where
    F: ContentFetcher + ?Sized,
{
    let document_url = upstream.raw_url(EXTENSION_DEPENDENCIES_PATH);
    let dependencies: BTreeMap<String, ExtensionDependency> =
        match fetch_json(fetcher, &document_url) {
            Ok(dependencies) => dependencies,
            // Older releases do not bundle extension dependencies.
            Err(FetchJsonError::Cache(CacheError::NotFound { .. })) => {
                info!("{} has no extension dependencies", upstream);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

    // Every file lands in the same directory, so names must not collide.
    let mut file_names = HashSet::new();
    dependencies
        .into_iter()
        .map(|(url, dependency)| -> Result<Source, AssetError> {
            validate_sha256(&dependency.sha256)
                .map_err(|e| AssetError::invalid(document_url.as_str(), e))?;
            let file_name = file_name(&url)
                .ok_or_else(|| {
                    AssetError::invalid(
                        document_url.as_str(),
                        ParseError::malformed("extension dependency URL", url.as_str()),
                    )
                })?
                .to_owned();
            if !file_names.insert(file_name.clone()) {
                return Err(AssetError::invalid(
                    document_url.as_str(),
                    ParseError::malformed("extension dependency, duplicate file name", url),
                ));
            }
            Ok(FileSource::new(url, Checksum::Sha256(dependency.sha256), DEST, file_name).into())
        })
        .collect()
}

fn file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.strip_prefix("https://")?
        .split_once('/')
        .and_then(|(_, path)| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
}
