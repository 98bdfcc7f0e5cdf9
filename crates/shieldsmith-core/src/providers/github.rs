// GitHub provider implementation - bridges API client with RepositoryHost trait
use async_trait::async_trait;
use shieldsmith_api::{GitHubClient, GitHubError};

use crate::{
    host::{FetchError, RepositoryHost},
    models::RepoRef,
    Error, Result,
};

/// Wrapper around GitHubClient that implements RepositoryHost
pub struct GitHubHost {
    client: GitHubClient,
}

impl GitHubHost {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: GitHubClient::new(token),
        }
    }

    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        Self {
            client: GitHubClient::with_base_url(token, base_url),
        }
    }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepoRef>> {
        let repos = self
            .client
            .list_user_repositories(owner)
            .await
            .map_err(|e| Error::HostUnavailable(e.to_string()))?;

        Ok(repos.into_iter().map(|r| RepoRef::new(r.name)).collect())
    }

    async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        self.client
            .get_file_contents(owner, repo, path)
            .await
            .map_err(to_fetch_error)
    }
}

/// Only a 404 is proof of absence
fn to_fetch_error(err: GitHubError) -> FetchError {
    if err.is_not_found() {
        FetchError::NotFound(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            to_fetch_error(GitHubError::NotFound("package.json".into())),
            FetchError::NotFound(_)
        ));
        assert!(matches!(
            to_fetch_error(GitHubError::RateLimitExceeded),
            FetchError::Transport(_)
        ));
        assert!(matches!(
            to_fetch_error(GitHubError::AuthRequired),
            FetchError::Transport(_)
        ));
        assert!(matches!(
            to_fetch_error(GitHubError::DecodeError("bad padding".into())),
            FetchError::Transport(_)
        ));
    }
}
