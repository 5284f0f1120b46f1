use log::debug;

use crate::{
    cache::ContentFetcher,
    model::{
        checksums::ChecksumManifest,
        lockfile::Lockfile,
        source::{Arch, Checksum, FileSource, Source},
        ParseError,
    },
};

use super::AssetError;

const RELEASES_URL: &str = "https://github.com/electron/electron/releases/download";
const ELECTRON_PACKAGE_PATH: &str = "node_modules/electron";
const DEST: &str = "electron";
const PLATFORMS: [(Arch, &str); 2] = [(Arch::X86_64, "x64"), (Arch::Aarch64, "arm64")];

/// Version of the Electron runtime the application is locked to.
pub fn electron_version(lockfile: &Lockfile) -> Result<&str, AssetError> {
    lockfile
        .package(ELECTRON_PACKAGE_PATH)
        .and_then(|entry| entry.version.as_deref())
        .ok_or_else(|| {
            AssetError::invalid(
                "root lockfile",
                ParseError::malformed("package entry with a version", ELECTRON_PACKAGE_PATH),
            )
        })
}

/// Prebuilt Linux runtime archives, one per supported architecture.
pub fn resolve_electron<F>(lockfile: &Lockfile, fetcher: &F) -> Result<Vec<Source>, AssetError>
where
    F: ContentFetcher + ?Sized,
{
    let version = electron_version(lockfile)?;
    let release_url = format!("{RELEASES_URL}/v{version}");
    let sums_url = format!("{release_url}/SHASUMS256.txt");
    let sums = ChecksumManifest::parse(&String::from_utf8_lossy(&fetcher.fetch(&sums_url)?));
    debug!("{} lists {} checksums", sums_url, sums.len());

    PLATFORMS
        .iter()
        .map(|&(arch, platform)| -> Result<Source, AssetError> {
            let file_name = format!("electron-v{version}-linux-{platform}.zip");
            let sha256 = sums
                .sha256(&file_name)
                .map_err(|e| AssetError::invalid(sums_url.as_str(), e))?;
            Ok(FileSource::new(
                format!("{release_url}/{file_name}"),
                Checksum::Sha256(sha256.to_owned()),
                DEST,
                file_name,
            )
            .only_arch(arch)
            .into())
        })
        .collect()
}
