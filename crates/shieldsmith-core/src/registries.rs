// Registries we read download counts from
// Each one is a trait so aggregation can be tested without the network

use crate::Result;

/// The npm registry plus its downloads API
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NpmRegistry: Send + Sync {
    /// Packages the registry lists under a maintainer
    async fn maintainer_packages(&self, username: &str) -> Result<Vec<String>>;

    /// All-time downloads for one package
    async fn download_count(&self, package: &str) -> Result<u64>;
}

/// Install figures for one marketplace listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionStats {
    pub name: String,
    pub installs: u64,
    pub updates: u64,
}

/// The VS Code extension marketplace
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ExtensionMarketplace: Send + Sync {
    /// Listings matching `publisher.extension`; empty when unknown
    async fn extension_stats(&self, publisher: &str, extension: &str)
        -> Result<Vec<ExtensionStats>>;
}

/// Download figures for one mod project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDownloads {
    pub slug: String,
    pub downloads: u64,
}

/// Modrinth, or anything else that reports per-project downloads for a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModPlatform: Send + Sync {
    async fn user_projects(&self, username: &str) -> Result<Vec<ProjectDownloads>>;
}
