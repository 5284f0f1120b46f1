use crate::{
    model::source::{Checksum, FileSource, GitSource, ScriptSource, Source},
    resolve::{GitDependency, NpmArtifact, Registries},
};

/// Directory of the build tree where tarballs are downloaded to.
pub const NPM_STAGING_DIR: &str = "flatpak-node";
/// Directory of the build tree where git-hosted packages are checked out to.
pub const GIT_STAGING_DIR: &str = "flatpak-node/git";
pub const SCRIPT_FILE_NAME: &str = "install-dependencies.sh";

/// Sources that fetch every resolved artifact once, plus a single script
/// placing each of them at all of its install paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSources {
    pub fetches: Vec<Source>,
    pub script: ScriptSource,
}

impl NodeSources {
    pub fn into_sources(self) -> Vec<Source> {
        let mut sources = self.fetches;
        sources.push(self.script.into());
        sources
    }
}

/// Builds the sources of a resolution.
///
/// Git-hosted packages are placed before any tarball so that tarballs
/// resolved from their lockfiles land inside an existing checkout.
pub fn emit(registries: &Registries) -> NodeSources {
    let mut fetches = Vec::with_capacity(registries.git.len() + registries.npm.len());
    let mut commands = vec!["set -x".to_owned()];

    for dependency in registries.git.iter() {
        let staging = git_staging_dir(dependency);
        fetches.push(
            GitSource {
                url: dependency.url.clone(),
                commit: dependency.commit.clone(),
                dest: staging.clone(),
            }
            .into(),
        );
        for destination in &dependency.destinations {
            commands.push(format!("mkdir -p \"{destination}\""));
            commands.push(format!("cp -a \"{staging}/.\" \"{destination}\""));
        }
    }

    for artifact in registries.npm.iter() {
        let file_name = staged_file_name(artifact);
        for destination in &artifact.destinations {
            commands.push(format!("mkdir -p \"{destination}\""));
            commands.push(format!(
                "tar -xzf \"{NPM_STAGING_DIR}/{file_name}\" -C \"{destination}\" --warning=no-unknown-keyword --strip-components=1"
            ));
        }
        fetches.push(
            FileSource::new(
                artifact.url.clone(),
                Checksum::Sha512(artifact.sha512.clone()),
                NPM_STAGING_DIR,
                file_name,
            )
            .into(),
        );
    }

    NodeSources {
        fetches,
        script: ScriptSource {
            commands,
            dest: NPM_STAGING_DIR.to_owned(),
            dest_filename: SCRIPT_FILE_NAME.to_owned(),
        },
    }
}

// Distinct tarballs may share a package name, the hash keeps them apart.
fn staged_file_name(artifact: &NpmArtifact) -> String {
    format!("{}-{}", artifact.name, artifact.sha512)
}

fn git_staging_dir(dependency: &GitDependency) -> String {
    format!("{}/{}-{}", GIT_STAGING_DIR, dependency.name, dependency.commit)
}
