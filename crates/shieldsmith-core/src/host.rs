use crate::{models::RepoRef, Error, Result};
use thiserror::Error;

/// Outcome of a single file fetch that went wrong.
///
/// Kept apart from [`Error`] because the classifier's caching policy hinges
/// on telling these two apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(what) => Error::NotFound(what),
            FetchError::Transport(what) => Error::TransportError(what),
        }
    }
}

/// Source-control host the reconciler walks.
///
/// GitHub implements this in production; tests swap in a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Every repository owned by `owner`. Fails with [`Error::HostUnavailable`].
    async fn list_repositories(&self, owner: &str) -> Result<Vec<RepoRef>>;

    /// Raw bytes of one file on the default branch
    async fn get_file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> std::result::Result<Vec<u8>, FetchError>;
}
