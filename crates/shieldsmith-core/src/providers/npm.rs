// npm provider implementation - bridges API client with NpmRegistry trait
use async_trait::async_trait;
use shieldsmith_api::{NpmClient, NpmError};

use crate::{registries::NpmRegistry, Error, Result};

/// Wrapper around NpmClient that implements NpmRegistry
pub struct NpmProvider {
    client: NpmClient,
}

impl NpmProvider {
    pub fn new() -> Self {
        Self {
            client: NpmClient::new(),
        }
    }

    pub fn with_base_urls(registry_url: String, downloads_url: String) -> Self {
        Self {
            client: NpmClient::with_base_urls(registry_url, downloads_url),
        }
    }
}

impl Default for NpmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NpmRegistry for NpmProvider {
    async fn maintainer_packages(&self, username: &str) -> Result<Vec<String>> {
        self.client
            .search_by_maintainer(username)
            .await
            .map_err(npm_error)
    }

    async fn download_count(&self, package: &str) -> Result<u64> {
        self.client
            .all_time_downloads(package)
            .await
            .map_err(npm_error)
    }
}

fn npm_error(err: NpmError) -> Error {
    match err {
        NpmError::NotFound(name) => Error::NotFound(name),
        other => Error::TransportError(other.to_string()),
    }
}
