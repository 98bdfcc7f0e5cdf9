// Turns identifier lists into download totals
//
// Individual lookups fail soft (counted as zero or skipped). A whole
// aggregation only fails when every lookup failed, since then there is
// nothing worth writing to the badge.

use crate::{
    models::{MarketplaceStats, ModrinthStats, NpmStats},
    registries::{ExtensionMarketplace, ModPlatform, NpmRegistry},
    Error, Result,
};
use futures::future::join_all;
use std::collections::BTreeSet;
use tracing::{error, info, warn};

/// Add the registry's maintainer listing to the identifiers from the cache.
///
/// A failed search leaves the list as it was.
pub async fn with_maintainer_packages(
    registry: &dyn NpmRegistry,
    username: &str,
    identifiers: Vec<String>,
) -> Vec<String> {
    info!("Fetching additional packages from npm registry for user: {}", username);

    match registry.maintainer_packages(username).await {
        Ok(found) => {
            info!("Found {} packages from npm registry search", found.len());
            let combined: BTreeSet<String> = identifiers.into_iter().chain(found).collect();
            info!("Combined total: {} unique packages", combined.len());
            combined.into_iter().collect()
        }
        Err(e) => {
            warn!("Error fetching packages from npm registry: {}", e);
            identifiers
        }
    }
}

/// Sum all-time downloads across packages, concurrently
pub async fn npm_downloads(registry: &dyn NpmRegistry, packages: &[String]) -> Result<NpmStats> {
    let lookups = packages.iter().map(|name| async move {
        info!("Fetching download stats for package: {}", name);
        (name, registry.download_count(name).await)
    });

    let results = join_all(lookups).await;

    let mut stats = NpmStats::default();
    let mut failures = 0usize;

    for (name, result) in results {
        let downloads = match result {
            Ok(count) => count,
            Err(e) => {
                error!("Error fetching stats for {}: {}", name, e);
                failures += 1;
                0
            }
        };

        if downloads > 0 {
            info!("{}: {} downloads (all time)", name, downloads);
            stats.packages += 1;
            stats.downloads += downloads;
        }
    }

    if !packages.is_empty() && failures == packages.len() {
        return Err(Error::AggregationFailed(format!(
            "all {} npm download lookups failed",
            failures
        )));
    }

    Ok(stats)
}

/// Sum installs and downloads for `publisher.extension` listings, concurrently
pub async fn marketplace_stats(
    marketplace: &dyn ExtensionMarketplace,
    publisher: &str,
    extensions: &[String],
) -> Result<MarketplaceStats> {
    info!("Fetching VS Marketplace extensions for publisher: {}", publisher);

    let lookups = extensions.iter().map(|id| async move {
        (id, marketplace.extension_stats(publisher, id).await)
    });

    let results = join_all(lookups).await;

    let mut stats = MarketplaceStats::default();
    let mut failures = 0usize;

    for (id, result) in results {
        let listings = match result {
            Ok(listings) => listings,
            Err(e) => {
                error!("Error fetching extension {}: {}", id, e);
                failures += 1;
                continue;
            }
        };

        if listings.is_empty() {
            warn!("Extension not found: {}", id);
            continue;
        }

        for listing in listings {
            let downloads = listing.installs + listing.updates;
            info!(
                "{}: {} installs, {} downloads",
                listing.name, listing.installs, downloads
            );
            stats.extensions += 1;
            stats.installs += listing.installs;
            stats.downloads += downloads;
        }
    }

    if !extensions.is_empty() && failures == extensions.len() {
        return Err(Error::AggregationFailed(format!(
            "all {} marketplace lookups failed",
            failures
        )));
    }

    info!(
        "Total extensions found: {}, installs: {}, downloads: {}",
        stats.extensions, stats.installs, stats.downloads
    );
    Ok(stats)
}

/// Project count and download total for a mod author
pub async fn modrinth_stats(platform: &dyn ModPlatform, username: &str) -> Result<ModrinthStats> {
    info!("Fetching Modrinth projects for user: {}", username);

    let projects = platform.user_projects(username).await?;
    let downloads: u64 = projects.iter().map(|p| p.downloads).sum();

    info!("Found {} projects, {} downloads", projects.len(), downloads);

    Ok(ModrinthStats {
        projects: projects.len(),
        downloads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{
        ExtensionStats, MockExtensionMarketplace, MockModPlatform, MockNpmRegistry,
        ProjectDownloads,
    };
    use mockall::predicate::eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_maintainer_packages_are_merged() {
        let mut registry = MockNpmRegistry::new();
        registry
            .expect_maintainer_packages()
            .with(eq("darkphoenix"))
            .returning(|_| Ok(names(&["relativedelta", "other-pkg"])));

        let merged =
            with_maintainer_packages(&registry, "darkphoenix", names(&["relativedelta"])).await;
        assert_eq!(merged, names(&["other-pkg", "relativedelta"]));
    }

    #[tokio::test]
    async fn test_maintainer_search_failure_keeps_list() {
        let mut registry = MockNpmRegistry::new();
        registry
            .expect_maintainer_packages()
            .returning(|_| Err(Error::TransportError("Status 500".into())));

        let merged = with_maintainer_packages(&registry, "someone", names(&["b", "a"])).await;
        assert_eq!(merged, names(&["b", "a"]));
    }

    #[tokio::test]
    async fn test_npm_downloads_count_zero_for_failures() {
        let mut registry = MockNpmRegistry::new();
        registry
            .expect_download_count()
            .returning(|name| match name {
                "popular" => Ok(1200),
                "unused" => Ok(0),
                _ => Err(Error::NotFound(name.to_string())),
            });

        let stats = npm_downloads(&registry, &names(&["popular", "unused", "gone"]))
            .await
            .unwrap();

        assert_eq!(stats, NpmStats { packages: 1, downloads: 1200 });
    }

    #[tokio::test]
    async fn test_npm_downloads_all_failed_is_an_error() {
        let mut registry = MockNpmRegistry::new();
        registry
            .expect_download_count()
            .returning(|_| Err(Error::TransportError("timed out".into())));

        let result = npm_downloads(&registry, &names(&["a", "b"])).await;
        assert!(matches!(result, Err(Error::AggregationFailed(_))));
    }

    #[tokio::test]
    async fn test_npm_downloads_empty_list_is_zero() {
        let registry = MockNpmRegistry::new();
        let stats = npm_downloads(&registry, &[]).await.unwrap();
        assert_eq!(stats, NpmStats::default());
    }

    #[tokio::test]
    async fn test_marketplace_totals() {
        let mut marketplace = MockExtensionMarketplace::new();
        marketplace
            .expect_extension_stats()
            .returning(|publisher, id| {
                assert_eq!(publisher, "DarkPhoenix");
                match id {
                    "theme" => Ok(vec![ExtensionStats {
                        name: "Theme".into(),
                        installs: 100,
                        updates: 40,
                    }]),
                    "helper" => Ok(vec![ExtensionStats {
                        name: "Helper".into(),
                        installs: 5,
                        updates: 0,
                    }]),
                    "missing" => Ok(vec![]),
                    _ => Err(Error::TransportError("Status 503".into())),
                }
            });

        let stats = marketplace_stats(
            &marketplace,
            "DarkPhoenix",
            &names(&["theme", "helper", "missing", "flaky"]),
        )
        .await
        .unwrap();

        assert_eq!(
            stats,
            MarketplaceStats {
                extensions: 2,
                installs: 105,
                downloads: 145,
            }
        );
    }

    #[tokio::test]
    async fn test_marketplace_all_failed_is_an_error() {
        let mut marketplace = MockExtensionMarketplace::new();
        marketplace
            .expect_extension_stats()
            .returning(|_, _| Err(Error::TransportError("offline".into())));

        let result = marketplace_stats(&marketplace, "p", &names(&["a"])).await;
        assert!(matches!(result, Err(Error::AggregationFailed(_))));
    }

    #[tokio::test]
    async fn test_modrinth_totals() {
        let mut platform = MockModPlatform::new();
        platform
            .expect_user_projects()
            .with(eq("dark_phoenix_"))
            .returning(|_| {
                Ok(vec![
                    ProjectDownloads { slug: "a".into(), downloads: 10 },
                    ProjectDownloads { slug: "b".into(), downloads: 32 },
                ])
            });

        let stats = modrinth_stats(&platform, "dark_phoenix_").await.unwrap();
        assert_eq!(stats, ModrinthStats { projects: 2, downloads: 42 });
    }

    #[tokio::test]
    async fn test_modrinth_failure_propagates() {
        let mut platform = MockModPlatform::new();
        platform
            .expect_user_projects()
            .returning(|user| Err(Error::NotFound(user.to_string())));

        assert!(modrinth_stats(&platform, "nobody").await.is_err());
    }
}
