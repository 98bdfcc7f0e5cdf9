// Modrinth provider implementation - bridges API client with ModPlatform trait
use async_trait::async_trait;
use shieldsmith_api::{ModrinthClient, ModrinthError};

use crate::{
    registries::{ModPlatform, ProjectDownloads},
    Error, Result,
};

/// Wrapper around ModrinthClient that implements ModPlatform
pub struct ModrinthProvider {
    client: ModrinthClient,
}

impl ModrinthProvider {
    pub fn new() -> Self {
        Self {
            client: ModrinthClient::new(),
        }
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: ModrinthClient::with_base_url(base_url),
        }
    }
}

impl Default for ModrinthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModPlatform for ModrinthProvider {
    async fn user_projects(&self, username: &str) -> Result<Vec<ProjectDownloads>> {
        let projects = self
            .client
            .user_projects(username)
            .await
            .map_err(|e| match e {
                ModrinthError::NotFound(user) => Error::NotFound(user),
                other => Error::TransportError(other.to_string()),
            })?;

        Ok(projects
            .into_iter()
            .map(|p| ProjectDownloads {
                slug: p.slug,
                downloads: p.downloads,
            })
            .collect())
    }
}
