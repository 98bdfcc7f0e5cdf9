// Provider implementations - bridge the API clients onto the core traits
pub mod github;
pub mod marketplace;
pub mod modrinth;
pub mod npm;

pub use github::GitHubHost;
pub use marketplace::MarketplaceProvider;
pub use modrinth::ModrinthProvider;
pub use npm::NpmProvider;
