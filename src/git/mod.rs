//! Resolution of the upstream revision to build.

mod remote;

pub use remote::GitRemote;

use std::{collections::BTreeMap, sync::OnceLock};

use log::info;
use regex_lite::Regex;
use thiserror::Error;

use crate::model::repository::{is_commit_hash, PinnedRepository, Repository};

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("Revision {revision} was not found in {repository}")]
    RevisionNotFound {
        revision: String,
        repository: Repository,
    },
    #[error("No release tag found in {repository}")]
    NoReleaseTag { repository: Repository },
}

/// A reference advertised by a remote, as listed by `git ls-remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub name: String,
    pub oid: String,
}

impl RemoteRef {
    pub fn new(name: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            oid: oid.into(),
        }
    }
}

pub trait RefLister {
    fn list_refs(&self, repository: &Repository) -> Result<Vec<RemoteRef>, GitError>;
}

/// Pins `repository` to a commit.
///
/// A full commit hash is used as is. Any other revision names a tag or a
/// branch of the remote. Without a revision, the newest `vMAJOR.MINOR.PATCH`
/// tag is used.
pub fn resolve_revision<L>(
    lister: &L,
    repository: &Repository,
    revision: Option<&str>,
) -> Result<PinnedRepository, GitError>
where
    L: RefLister + ?Sized,
{
    if let Some(commit) = revision.filter(|revision| is_commit_hash(revision)) {
        return Ok(repository.at(commit));
    }

    let refs = lister.list_refs(repository)?;
    let pinned = match revision {
        Some(revision) => {
            let commit = find_ref(&refs, revision).ok_or_else(|| GitError::RevisionNotFound {
                revision: revision.to_owned(),
                repository: repository.clone(),
            })?;
            info!("Resolved {} of {} to {}", revision, repository, commit);
            repository.at(commit)
        }
        None => {
            let (version, commit) =
                latest_release(&refs).ok_or_else(|| GitError::NoReleaseTag {
                    repository: repository.clone(),
                })?;
            info!(
                "Latest release of {} is v{}.{}.{} at {}",
                repository, version.0, version.1, version.2, commit
            );
            repository.at(commit)
        }
    };
    Ok(pinned)
}

type Version = (u64, u64, u64);

/// Newest release tag and the commit it points to.
fn latest_release(refs: &[RemoteRef]) -> Option<(Version, &str)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^refs/tags/v(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?P<peeled>\^\{\})?$")
            .unwrap()
    });

    // Annotated tags are advertised twice, the `^{}` entry carries the commit.
    let mut releases: BTreeMap<Version, (bool, &str)> = BTreeMap::new();
    for remote_ref in refs {
        let Some(captures) = re.captures(&remote_ref.name) else {
            continue;
        };
        let (Ok(major), Ok(minor), Ok(patch)) = (
            captures["major"].parse::<u64>(),
            captures["minor"].parse::<u64>(),
            captures["patch"].parse::<u64>(),
        ) else {
            continue;
        };
        let peeled = captures.name("peeled").is_some();
        let entry = releases
            .entry((major, minor, patch))
            .or_insert((peeled, remote_ref.oid.as_str()));
        if peeled {
            *entry = (true, remote_ref.oid.as_str());
        }
    }

    releases
        .into_iter()
        .next_back()
        .map(|(version, (_, commit))| (version, commit))
}

fn find_ref<'a>(refs: &'a [RemoteRef], revision: &str) -> Option<&'a str> {
    [
        format!("refs/tags/{revision}^{{}}"),
        format!("refs/tags/{revision}"),
        format!("refs/heads/{revision}"),
        revision.to_owned(),
    ]
    .iter()
    .find_map(|name| refs.iter().find(|remote_ref| &remote_ref.name == name))
    .map(|remote_ref| remote_ref.oid.as_str())
}
