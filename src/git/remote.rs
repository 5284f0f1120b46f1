use git2::{Config, Cred, CredentialType, Direction, Remote, RemoteCallbacks};
use log::{debug, trace};

use crate::model::repository::Repository;

use super::{GitError, RefLister, RemoteRef};

/// Lists the references of a remote repository without cloning it.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRemote;

impl GitRemote {
    fn callbacks(git_config: Option<&Config>) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed_types| {
            trace!(
                "Requested credentials for {}, username {:?}, allowed types {:?}",
                url,
                username,
                allowed_types
            );
            if allowed_types.contains(CredentialType::USERNAME) {
                return Cred::username("git");
            }
            if allowed_types.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(git_config) = git_config {
                    return Cred::credential_helper(git_config, url, username);
                }
            }
            Err(git2::Error::from_str("no valid authentication available"))
        });
        callbacks
    }
}

impl RefLister for GitRemote {
    fn list_refs(&self, repository: &Repository) -> Result<Vec<RemoteRef>, GitError> {
        let url = repository.clone_url();
        debug!("Listing references of {}", url);

        let git_config = Config::open_default().ok();
        let mut remote = Remote::create_detached(url.as_str())?;
        let connection =
            remote.connect_auth(Direction::Fetch, Some(Self::callbacks(git_config.as_ref())), None)?;
        let refs = connection
            .list()?
            .iter()
            .map(|head| RemoteRef::new(head.name(), head.oid().to_string()))
            .collect::<Vec<_>>();

        debug!("{} advertises {} references", url, refs.len());
        Ok(refs)
    }
}
