use std::{path::Path, sync::Arc};

use log::{debug, info, warn};

use crate::{
    assets::{
        electron::resolve_electron,
        extensions::resolve_extension_dependencies,
        library::{library_repository, resolve_library},
        microbit::microbit_sources,
        packager::resolve_packager,
    },
    cache::{ContentFetcher, HttpContentCache},
    emit::emit,
    git::{resolve_revision, RefLister},
    manifest,
    model::{repository::Repository, source::Source},
    resolve::resolve,
    resolver::{GithubLockfileFetcher, LockfileFetcher},
};

pub const ELECTRON_SOURCES: &str = "electron-sources.json";
pub const NODE_SOURCES: &str = "node-sources.json";
pub const LIBRARY_SOURCES: &str = "library-sources.json";
pub const PACKAGER_SOURCES: &str = "packager-sources.json";
pub const MICROBIT_SOURCES: &str = "microbit-sources.json";
pub const EXTENSION_SOURCES: &str = "extension-sources.json";

/// Handler to generate every sources file.
/// 1 - Pins the upstream revision
/// 2 - Reads the upstream lockfile
/// 3 - Resolves node modules and every asset concurrently
/// 4 - Writes the sources files, then patches the manifest
pub async fn do_generate<L, F>(
    lister: L,
    cache: Arc<F>,
    upstream: &Repository,
    revision: Option<&str>,
    output_directory: &Path,
    manifest_path: Option<&Path>,
) -> anyhow::Result<()>
where
    L: RefLister + Send + 'static,
    F: ContentFetcher + Send + Sync + 'static,
{
    let pinned = {
        let upstream = upstream.clone();
        let revision = revision.map(str::to_owned);
        blocking(move || Ok(resolve_revision(&lister, &upstream, revision.as_deref())?)).await?
    };
    info!("Generating sources for {}", pinned);

    let lockfile = {
        let cache = Arc::clone(&cache);
        let pinned = pinned.clone();
        Arc::new(
            blocking(move || Ok(GithubLockfileFetcher::new(&*cache).fetch_lockfile(&pinned)?))
                .await?,
        )
    };
    if lockfile.packages.is_empty() {
        warn!("Lockfile of {} lists no packages", pinned);
    } else {
        debug!("Upstream lockfile has {} packages", lockfile.packages.len());
    }

    let node = {
        let (cache, lockfile) = (Arc::clone(&cache), Arc::clone(&lockfile));
        blocking(move || {
            let registries = resolve(&lockfile, &GithubLockfileFetcher::new(&*cache))?;
            Ok(emit(&registries).into_sources())
        })
    };
    let electron = {
        let (cache, lockfile) = (Arc::clone(&cache), Arc::clone(&lockfile));
        blocking(move || Ok(resolve_electron(&lockfile, &*cache)?))
    };
    let library = {
        let (cache, lockfile) = (Arc::clone(&cache), Arc::clone(&lockfile));
        blocking(move || {
            let repository = library_repository(&lockfile)?;
            Ok(resolve_library(&*cache, &repository)?)
        })
    };
    let packager = {
        let (cache, pinned) = (Arc::clone(&cache), pinned.clone());
        blocking(move || Ok(resolve_packager(&*cache, &pinned)?))
    };
    let extensions = {
        let (cache, pinned) = (Arc::clone(&cache), pinned.clone());
        blocking(move || Ok(resolve_extension_dependencies(&*cache, &pinned)?))
    };

    let (node, electron, library, packager, extensions) =
        tokio::try_join!(node, electron, library, packager, extensions)?;

    let outputs: [(&str, Vec<Source>); 6] = [
        (ELECTRON_SOURCES, electron),
        (NODE_SOURCES, node),
        (LIBRARY_SOURCES, library),
        (PACKAGER_SOURCES, packager),
        (MICROBIT_SOURCES, microbit_sources()),
        (EXTENSION_SOURCES, extensions),
    ];
    for (file_name, sources) in outputs {
        manifest::write_sources(output_directory, file_name, &sources)?;
    }

    if let Some(manifest_path) = manifest_path {
        manifest::patch_commit(manifest_path, &upstream.clone_url(), &pinned.commit)?;
    }

    info!("Generated sources for {}", pinned);
    Ok(())
}

pub fn do_clear_cache(cache: &HttpContentCache) -> anyhow::Result<()> {
    cache.clear()?;
    Ok(())
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        cache::testing::FakeFetcher,
        git::{GitError, RemoteRef},
        model::ParseError,
        resolve::ResolveError,
    };
    use pretty_assertions::assert_eq;

    const UPSTREAM_COMMIT: &str = "dddddddddddddddddddddddddddddddddddddddd";
    const GUI_COMMIT: &str = "cccccccccccccccccccccccccccccccccccccccc";
    const SUMS_URL: &str =
        "https://github.com/electron/electron/releases/download/v28.1.0/SHASUMS256.txt";

    /// Revisions in these tests are commit hashes, which never reach the remote.
    struct NoRefs;

    impl RefLister for NoRefs {
        fn list_refs(&self, _: &Repository) -> Result<Vec<RemoteRef>, GitError> {
            Ok(Vec::new())
        }
    }

    fn upstream() -> Repository {
        Repository::new("TurboWarp", "desktop")
    }

    /// Serves every document an upstream commit needs, with `packages` as the
    /// body of its root lockfile.
    fn fetcher(packages: &str) -> FakeFetcher {
        let pinned = upstream().at(UPSTREAM_COMMIT);
        let gui = Repository::new("TurboWarp", "scratch-gui").at(GUI_COMMIT);
        let library = |name: &str| gui.raw_url(&format!("src/lib/libraries/{name}"));
        FakeFetcher::default()
            .with(
                pinned.raw_url("package-lock.json"),
                format!(r#"{{"packages": {{{packages}}}}}"#),
            )
            .with(gui.raw_url("package-lock.json"), r#"{"packages": {}}"#)
            .with(
                SUMS_URL,
                format!(
                    "{} *electron-v28.1.0-linux-x64.zip\n{} *electron-v28.1.0-linux-arm64.zip\n",
                    "1".repeat(64),
                    "2".repeat(64)
                ),
            )
            .with(library("costumes.json"), "[]")
            .with(library("backdrops.json"), "[]")
            .with(library("sounds.json"), "[]")
            .with(library("sprites.json"), "[]")
            .with(
                pinned.raw_url("scripts/packager.json"),
                format!(
                    r#"{{"src": "https://example.com/packager.html", "sha256": "{}"}}"#,
                    "e".repeat(64)
                ),
            )
    }

    fn electron_and_gui() -> String {
        format!(
            r#""node_modules/electron": {{
                "version": "28.1.0",
                "resolved": "https://registry.npmjs.org/electron/-/electron-28.1.0.tgz",
                "integrity": "sha512-AAAA"
            }},
            "node_modules/scratch-gui": {{
                "resolved": "git+ssh://git@github.com/TurboWarp/scratch-gui.git#{GUI_COMMIT}"
            }}"#
        )
    }

    fn written_files(directory: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(directory)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn generate_writes_every_sources_file() {
        let output = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(fetcher(&electron_and_gui()));

        do_generate(
            NoRefs,
            fetcher,
            &upstream(),
            Some(UPSTREAM_COMMIT),
            output.path(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            written_files(output.path()),
            vec![
                ELECTRON_SOURCES,
                EXTENSION_SOURCES,
                LIBRARY_SOURCES,
                MICROBIT_SOURCES,
                NODE_SOURCES,
                PACKAGER_SOURCES,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_git_url_writes_nothing() {
        let output = tempfile::tempdir().unwrap();
        let packages = format!(
            r#""node_modules/b": {{"resolved": "git+ssh://git@github.com/org/b.git#abc123"}},
            {}"#,
            electron_and_gui()
        );
        let fetcher = Arc::new(fetcher(&packages));

        let error = do_generate(
            NoRefs,
            fetcher,
            &upstream(),
            Some(UPSTREAM_COMMIT),
            output.path(),
            None,
        )
        .await
        .unwrap_err();

        assert!(
            matches!(
                error.downcast_ref::<ResolveError>(),
                Some(ResolveError::InvalidPackage {
                    source: ParseError::MalformedGitUrl(_),
                    ..
                })
            ),
            "{error:#}"
        );
        assert!(written_files(output.path()).is_empty());
    }
}
