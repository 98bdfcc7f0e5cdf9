// One job per badge key: figure out what to count, count it, write it down
use crate::{
    aggregate,
    badge::BadgeFile,
    config::Config,
    host::RepositoryHost,
    models::{MarketplaceStats, ModrinthStats, NpmStats, ProjectType},
    reconcile::Reconciler,
    registries::{ExtensionMarketplace, ModPlatform, NpmRegistry},
    Result,
};
use shieldsmith_cache::CacheStore;
use tracing::info;

/// Badge key each job writes under
pub const NPM_BADGE_KEY: &str = "npm";
pub const MARKETPLACE_BADGE_KEY: &str = "vsmarketplace";
pub const MODRINTH_BADGE_KEY: &str = "modrinth";

/// Which cache type npm classification uses under this config
pub fn npm_project_type(config: &Config) -> ProjectType {
    if config.npm.strict {
        ProjectType::NpmStrict
    } else {
        ProjectType::Npm
    }
}

/// Reconcile npm packages, add the maintainer's registry listing, sum downloads
pub async fn update_npm(
    config: &Config,
    host: &dyn RepositoryHost,
    registry: &dyn NpmRegistry,
    store: &CacheStore,
    badge: &BadgeFile,
) -> Result<NpmStats> {
    let report = Reconciler::new(host, store, config.github.owner.as_str())
        .with_concurrency(config.reconcile.concurrency)
        .run(npm_project_type(config), &config.npm.fallback_packages)
        .await;

    let packages =
        aggregate::with_maintainer_packages(registry, &config.npm.username, report.identifiers)
            .await;

    let stats = aggregate::npm_downloads(registry, &packages).await?;
    info!(
        "Total npm packages with data: {}, all-time downloads: {}",
        stats.packages, stats.downloads
    );

    badge.update(NPM_BADGE_KEY, &stats)?;
    Ok(stats)
}

/// Reconcile VS Code extensions and sum their marketplace figures
pub async fn update_marketplace(
    config: &Config,
    host: &dyn RepositoryHost,
    marketplace: &dyn ExtensionMarketplace,
    store: &CacheStore,
    badge: &BadgeFile,
) -> Result<MarketplaceStats> {
    let report = Reconciler::new(host, store, config.github.owner.as_str())
        .with_concurrency(config.reconcile.concurrency)
        .run(ProjectType::VsCode, &config.vscode.fallback_extensions)
        .await;

    let stats =
        aggregate::marketplace_stats(marketplace, &config.vscode.publisher, &report.identifiers)
            .await?;

    badge.update(MARKETPLACE_BADGE_KEY, &stats)?;
    Ok(stats)
}

/// Sum Modrinth project downloads. No classification involved.
pub async fn update_modrinth(
    config: &Config,
    platform: &dyn ModPlatform,
    badge: &BadgeFile,
) -> Result<ModrinthStats> {
    let stats = aggregate::modrinth_stats(platform, &config.modrinth.username).await?;
    badge.update(MODRINTH_BADGE_KEY, &stats)?;
    Ok(stats)
}
