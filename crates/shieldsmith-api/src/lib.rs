// API clients for the source host and the registries we count downloads on
pub mod github;
pub mod marketplace;
pub mod modrinth;
pub mod npm;

// Re-export common types
pub use github::{GitHubClient, GitHubError, GitHubRepo};
pub use marketplace::{MarketplaceClient, MarketplaceError, MarketplaceExtension};
pub use modrinth::{ModrinthClient, ModrinthError, ModrinthProject};
pub use npm::{NpmClient, NpmError};
