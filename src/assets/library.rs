use std::collections::BTreeSet;

use log::{debug, info};
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::{
    cache::{fetch_json, ContentFetcher},
    model::{
        library::{LibraryAsset, LibrarySprite, Md5Ext},
        lockfile::Lockfile,
        repository::PinnedRepository,
        source::{Checksum, FileSource, Source},
        ParseError,
    },
};

use super::AssetError;

const ASSETS_URL: &str = "https://assets.scratch.mit.edu";
/// The GUI package that ships the library definitions.
const LIBRARY_PACKAGE_PATH: &str = "node_modules/scratch-gui";
const LIBRARY_DIR: &str = "src/lib/libraries";
const ASSET_DOCUMENTS: [&str; 3] = ["costumes.json", "backdrops.json", "sounds.json"];
const SPRITE_DOCUMENT: &str = "sprites.json";
const DEST: &str = "uncompressed-library-files";

/// The scratch-gui commit the root lockfile pins.
pub fn library_repository(lockfile: &Lockfile) -> Result<PinnedRepository, AssetError> {
    let resolved = lockfile
        .package(LIBRARY_PACKAGE_PATH)
        .and_then(|entry| entry.resolved.as_deref())
        .ok_or_else(|| {
            AssetError::invalid(
                "root lockfile",
                ParseError::malformed("resolved package", LIBRARY_PACKAGE_PATH),
            )
        })?;
    PinnedRepository::from_resolved(resolved)
        .map_err(|e| AssetError::invalid(LIBRARY_PACKAGE_PATH, e))
}

/// Every asset referenced by the library definitions, sorted by file name.
pub fn collect_library_assets<F>(
    fetcher: &F,
    repository: &PinnedRepository,
) -> Result<BTreeSet<Md5Ext>, AssetError>
where
    F: ContentFetcher + ?Sized,
{
    let document_url = |name: &str| repository.raw_url(&format!("{LIBRARY_DIR}/{name}"));

    let mut md5exts = BTreeSet::new();
    let mut add = |asset: &LibraryAsset| -> Result<(), AssetError> {
        let md5ext = Md5Ext::parse(&asset.md5ext)
            .map_err(|e| AssetError::invalid(format!("library of {repository}"), e))?;
        md5exts.insert(md5ext);
        Ok(())
    };

    for name in ASSET_DOCUMENTS {
        let assets: Vec<LibraryAsset> = fetch_json(fetcher, &document_url(name))?;
        assets.iter().try_for_each(&mut add)?;
    }
    let sprites: Vec<LibrarySprite> = fetch_json(fetcher, &document_url(SPRITE_DOCUMENT))?;
    sprites
        .iter()
        .flat_map(LibrarySprite::assets)
        .try_for_each(&mut add)?;

    Ok(md5exts)
}

/// Downloads every library asset, checking it against the MD5 its name
/// carries, and records its SHA-256 for the build.
pub fn resolve_library<F>(
    fetcher: &F,
    repository: &PinnedRepository,
) -> Result<Vec<Source>, AssetError>
where
    F: ContentFetcher + ?Sized,
{
    let md5exts = collect_library_assets(fetcher, repository)?;
    info!("Verifying {} library assets", md5exts.len());

    md5exts
        .into_iter()
        .map(|md5ext| -> Result<Source, AssetError> {
            let file_name = md5ext.file_name();
            let url = format!("{ASSETS_URL}/{file_name}");
            let data = fetcher.fetch(&url)?;

            let actual = hex::encode(Md5::digest(&data));
            if actual != md5ext.md5 {
                return Err(AssetError::IntegrityMismatch {
                    url,
                    expected: md5ext.md5,
                    actual,
                });
            }
            debug!("Verified {}", file_name);

            let sha256 = hex::encode(Sha256::digest(&data));
            Ok(FileSource::new(url, Checksum::Sha256(sha256), DEST, file_name).into())
        })
        .collect()
}
