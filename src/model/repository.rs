use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::OnceLock,
};

use regex_lite::Regex;

use crate::model::ParseError;

const GITHUB_CLONE_BASE: &str = "https://github.com";
const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// A GitHub repository, without a revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn clone_url(&self) -> String {
        format!("{}/{}/{}.git", GITHUB_CLONE_BASE, self.owner, self.name)
    }

    pub fn at(&self, commit: impl Into<String>) -> PinnedRepository {
        PinnedRepository {
            repository: self.clone(),
            commit: commit.into(),
        }
    }
}

impl Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>()[..] {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self::new(owner, name)),
            _ => Err(ParseError::malformed("repository, expected `owner/name`", s)),
        }
    }
}

/// A GitHub repository pinned to a full 40 character commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PinnedRepository {
    pub repository: Repository,
    pub commit: String,
}

impl PinnedRepository {
    /// Parses the `resolved` field of a git-hosted lockfile entry, for example
    /// `git+ssh://git@github.com/TurboWarp/scratch-gui.git#<commit>`.
    pub fn from_resolved(resolved: &str) -> Result<Self, ParseError> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(
                r"^git\+ssh://git@github\.com/(?P<owner>[\w-]+)/(?P<name>[\w-]+)\.git#(?P<commit>[0-9a-f]{40})$",
            )
            .unwrap()
        });
        let captures = re
            .captures(resolved)
            .ok_or_else(|| ParseError::MalformedGitUrl(resolved.to_owned()))?;

        Ok(Repository::new(&captures["owner"], &captures["name"]).at(&captures["commit"]))
    }

    /// Deduplication key shared by every install path of this repository and commit.
    pub fn key(&self) -> String {
        format!("{}#{}", self.repository.clone_url(), self.commit)
    }

    /// URL of a single file of the repository at this commit.
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            GITHUB_RAW_BASE, self.repository.owner, self.repository.name, self.commit, path
        )
    }
}

impl Display for PinnedRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.commit)
    }
}

pub fn is_commit_hash(revision: &str) -> bool {
    revision.len() == 40 && revision.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
