use serde::Deserialize;

use crate::{
    cache::{fetch_json, ContentFetcher},
    model::{
        repository::PinnedRepository,
        source::{Checksum, FileSource, Source},
    },
};

use super::{validate_sha256, AssetError};

pub const PACKAGER_DESCRIPTOR_PATH: &str = "scripts/packager.json";
const DEST: &str = "src-renderer/packager";
const DEST_FILENAME: &str = "standalone.html";

/// Pinned build of the standalone packager bundled with the application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackagerDescriptor {
    pub src: String,
    pub sha256: String,
}

pub fn resolve_packager<F>(
    fetcher: &F,
    upstream: &PinnedRepository,
) -> Result<Vec<Source>, AssetError>
where
    F: ContentFetcher + ?Sized,
{
    let url = upstream.raw_url(PACKAGER_DESCRIPTOR_PATH);
    let descriptor: PackagerDescriptor = fetch_json(fetcher, &url)?;
    validate_sha256(&descriptor.sha256).map_err(|e| AssetError::invalid(url, e))?;

    Ok(vec![FileSource::new(
        descriptor.src,
        Checksum::Sha256(descriptor.sha256),
        DEST,
        DEST_FILENAME,
    )
    .into()])
}
