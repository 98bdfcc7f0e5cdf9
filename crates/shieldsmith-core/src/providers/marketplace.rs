// Marketplace provider implementation - bridges API client with ExtensionMarketplace trait
use async_trait::async_trait;
use shieldsmith_api::MarketplaceClient;

use crate::{
    registries::{ExtensionMarketplace, ExtensionStats},
    Error, Result,
};

/// Wrapper around MarketplaceClient that implements ExtensionMarketplace
pub struct MarketplaceProvider {
    client: MarketplaceClient,
}

impl MarketplaceProvider {
    pub fn new() -> Self {
        Self {
            client: MarketplaceClient::new(),
        }
    }

    pub fn with_query_url(query_url: String) -> Self {
        Self {
            client: MarketplaceClient::with_query_url(query_url),
        }
    }
}

impl Default for MarketplaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionMarketplace for MarketplaceProvider {
    async fn extension_stats(
        &self,
        publisher: &str,
        extension: &str,
    ) -> Result<Vec<ExtensionStats>> {
        let listings = self
            .client
            .query_extension(publisher, extension)
            .await
            .map_err(|e| Error::TransportError(e.to_string()))?;

        Ok(listings
            .into_iter()
            .map(|ext| ExtensionStats {
                installs: ext.installs(),
                updates: ext.updates(),
                name: ext.display_name.unwrap_or(ext.extension_name),
            })
            .collect())
    }
}
