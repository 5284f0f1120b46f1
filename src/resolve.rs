//! Resolution of a lockfile into the set of artifacts an offline build needs.
//!
//! Registry tarballs are deduplicated by content hash and git-hosted packages
//! by clone URL and commit, so an artifact that appears at many install paths
//! is fetched once and placed at each of them.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    model::{
        lockfile::{Integrity, Lockfile, PackageEntry},
        repository::PinnedRepository,
        ParseError,
    },
    resolver::{LockfileError, LockfileFetcher},
};

/// Git-hosted packages that are never fetched nor walked.
///
/// `electron/node-gyp` is only needed to rebuild native modules, and its
/// lockfile is not at the repository root where the fetcher looks for it.
const SKIPPED_GIT_DEPENDENCIES: &[(&str, &str)] = &[("electron", "node-gyp")];

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unknown resolved source `{resolved}` for {path}")]
    UnknownResolvedScheme { path: String, resolved: String },
    #[error("Invalid package {path}: {source}")]
    InvalidPackage {
        path: String,
        #[source]
        source: ParseError,
    },
    #[error("Error while resolving {path}: {source}")]
    Lockfile {
        path: String,
        #[source]
        source: LockfileError,
    },
}

/// A registry tarball and every install path it is extracted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmArtifact {
    pub name: String,
    pub url: String,
    pub sha512: String,
    pub destinations: Vec<String>,
}

/// A git-hosted package and every install path it is copied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDependency {
    pub name: String,
    pub url: String,
    pub commit: String,
    pub destinations: Vec<String>,
}

trait Destinations {
    fn destinations_mut(&mut self) -> &mut Vec<String>;
}

impl Destinations for NpmArtifact {
    fn destinations_mut(&mut self) -> &mut Vec<String> {
        &mut self.destinations
    }
}

impl Destinations for GitDependency {
    fn destinations_mut(&mut self) -> &mut Vec<String> {
        &mut self.destinations
    }
}

/// Records keyed by a normalized key, iterated in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry<T> {
    records: Vec<T>,
    index: HashMap<String, usize>,
    /// `(record, install path)` pairs already appended.
    destinations: HashSet<(usize, String)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            destinations: HashSet::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    /// Returns the position of the record for `key`, creating it first if it
    /// is unseen. The flag is true when the record was created by this call.
    fn entry(&mut self, key: String, create: impl FnOnce() -> T) -> (usize, bool) {
        match self.index.get(&key) {
            Some(&i) => (i, false),
            None => {
                let i = self.records.len();
                self.records.push(create());
                self.index.insert(key, i);
                (i, true)
            }
        }
    }
}

impl<T: Destinations> Registry<T> {
    /// Appends `path` to the destinations of the record at `i` unless it is
    /// already there.
    fn add_destination(&mut self, i: usize, path: String) {
        if self.destinations.insert((i, path.clone())) {
            self.records[i].destinations_mut().push(path);
        }
    }
}

/// The deduplicated outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registries {
    /// Keyed by the hex encoded sha512 of the tarball.
    pub npm: Registry<NpmArtifact>,
    /// Keyed by `<https clone url>#<commit>`.
    pub git: Registry<GitDependency>,
}

struct ResolutionContext<'a> {
    lockfile: &'a Lockfile,
    /// Set while walking the lockfile of a git-hosted package: its development
    /// dependencies are build tooling the parent already provides.
    dev_only: bool,
    /// Install path of the git-hosted package whose lockfile is being walked.
    prefix: &'a str,
}

/// Walks `lockfile` and every lockfile of the git-hosted packages it
/// references. Any malformed entry aborts the whole resolution.
pub fn resolve<F>(lockfile: &Lockfile, fetcher: &F) -> Result<Registries, ResolveError>
where
    F: LockfileFetcher + ?Sized,
{
    fn go<F: LockfileFetcher + ?Sized>(
        fetcher: &F,
        registries: &mut Registries,
        context: ResolutionContext,
    ) -> Result<(), ResolveError> {
        for (path, entry) in context.lockfile.packages.iter() {
            // The package itself, already provided by whoever fetched this lockfile.
            if path.is_empty() {
                continue;
            }

            if context.dev_only && entry.dev {
                continue;
            }

            let prefixed_path = join_path(context.prefix, path);

            // Workspace links and bundled packages have nothing to fetch.
            let Some(resolved) = entry.resolved.as_deref() else {
                warn!("Unresolved: {}", prefixed_path);
                continue;
            };

            if resolved.starts_with("https://") {
                visit_npm(registries, prefixed_path, resolved, entry)?;
            } else if resolved.starts_with("git+ssh://") {
                visit_git(fetcher, registries, prefixed_path, resolved)?;
            } else {
                return Err(ResolveError::UnknownResolvedScheme {
                    path: prefixed_path,
                    resolved: resolved.to_owned(),
                });
            }
        }

        Ok(())
    }

    fn visit_npm(
        registries: &mut Registries,
        path: String,
        resolved: &str,
        entry: &PackageEntry,
    ) -> Result<(), ResolveError> {
        let integrity = Integrity::parse(entry.integrity.as_deref().unwrap_or_default())
            .map_err(|source| ResolveError::InvalidPackage {
                path: path.clone(),
                source,
            })?;
        let sha512 = integrity.to_hex();

        let (i, created) = registries.npm.entry(sha512.clone(), || NpmArtifact {
            name: basename(&path).to_owned(),
            url: resolved.to_owned(),
            sha512,
            destinations: Vec::new(),
        });
        if !created {
            debug!("{} is identical to {}", path, registries.npm.records[i].name);
        }
        registries.npm.add_destination(i, path);
        Ok(())
    }

    fn visit_git<F: LockfileFetcher + ?Sized>(
        fetcher: &F,
        registries: &mut Registries,
        path: String,
        resolved: &str,
    ) -> Result<(), ResolveError> {
        let pinned = PinnedRepository::from_resolved(resolved).map_err(|source| {
            ResolveError::InvalidPackage {
                path: path.clone(),
                source,
            }
        })?;

        let repository = &pinned.repository;
        if SKIPPED_GIT_DEPENDENCIES
            .iter()
            .any(|&(owner, name)| repository.owner == owner && repository.name == name)
        {
            debug!("Skipping {} ({})", path, pinned);
            return Ok(());
        }

        // The record exists before its lockfile is walked so that a cycle
        // between git-hosted packages terminates.
        let (i, created) = registries.git.entry(pinned.key(), || GitDependency {
            name: repository.name.clone(),
            url: repository.clone_url(),
            commit: pinned.commit.clone(),
            destinations: Vec::new(),
        });
        registries.git.add_destination(i, path.clone());

        if created {
            info!("Resolving {} for {}", pinned, path);
            let lockfile =
                fetcher
                    .fetch_lockfile(&pinned)
                    .map_err(|source| ResolveError::Lockfile {
                        path: path.clone(),
                        source,
                    })?;
            go(
                fetcher,
                registries,
                ResolutionContext {
                    lockfile: &lockfile,
                    dev_only: true,
                    prefix: &path,
                },
            )?;
        }
        Ok(())
    }

    let mut registries = Registries::default();
    go(
        fetcher,
        &mut registries,
        ResolutionContext {
            lockfile,
            dev_only: false,
            prefix: "",
        },
    )?;

    info!(
        "Resolved {} package tarballs and {} git repositories",
        registries.npm.len(),
        registries.git.len()
    );
    Ok(registries)
}

fn join_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_owned()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), path)
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
