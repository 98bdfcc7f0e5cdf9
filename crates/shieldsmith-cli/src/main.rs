use anyhow::Context;
use clap::Parser;
use shieldsmith_cache::CacheStore;
use shieldsmith_core::{
    jobs,
    providers::{GitHubHost, MarketplaceProvider, ModrinthProvider, NpmProvider},
    BadgeFile, Config, ProjectType,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shieldsmith")]
#[command(version, about = "Download-count badge data for npm, VS Code and Modrinth projects", long_about = None)]
struct Cli {
    /// Config file (default: the per-user config, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub account whose repositories are scanned
    #[arg(long, global = true)]
    owner: Option<String>,

    /// GitHub token passed through as a bearer token
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    github_token: Option<String>,

    /// Classification cache file
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Badge data file
    #[arg(long, global = true)]
    badge_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Update the npm download badge
    Npm,
    /// Update the VS Code marketplace badge
    Vscode,
    /// Update the Modrinth download badge
    Modrinth,
    /// Update every badge; fails if any of them failed
    All,
    /// Inspect or edit the classification cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(clap::Subcommand)]
enum CacheCommand {
    /// Print the cache document
    Show,
    /// Drop cached classifications so the next run probes the repository again
    Forget {
        /// Repository name
        repo: String,
        /// Only forget this type (npm, npm-strict, vscode)
        #[arg(long = "type")]
        kind: Option<ProjectType>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shieldsmith=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading config")?;
    if let Some(owner) = cli.owner {
        config.github.owner = owner;
    }
    if cli.github_token.is_some() {
        config.github.token = cli.github_token;
    }
    if let Some(path) = cli.cache_file {
        config.paths.cache_file = path;
    }
    if let Some(path) = cli.badge_file {
        config.paths.badge_file = path;
    }

    let store = CacheStore::new(&config.paths.cache_file);
    let badge = BadgeFile::new(&config.paths.badge_file);

    match cli.command {
        Commands::Npm => run_npm(&config, &store, &badge).await,
        Commands::Vscode => run_vscode(&config, &store, &badge).await,
        Commands::Modrinth => run_modrinth(&config, &badge).await,
        Commands::All => {
            // Run everything even if one fails, then report
            let results = [
                ("npm", run_npm(&config, &store, &badge).await),
                ("vscode", run_vscode(&config, &store, &badge).await),
                ("modrinth", run_modrinth(&config, &badge).await),
            ];

            let failed: Vec<&str> = results
                .iter()
                .filter_map(|(name, result)| match result {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::error!("{} badge failed: {:#}", name, e);
                        Some(*name)
                    }
                })
                .collect();

            if failed.is_empty() {
                Ok(())
            } else {
                anyhow::bail!("badge update failed for: {}", failed.join(", "))
            }
        }
        Commands::Cache { action } => run_cache(action, &store),
    }
}

fn github_host(config: &Config) -> GitHubHost {
    GitHubHost::with_base_url(config.github.token.clone(), config.github.api_url.clone())
}

async fn run_npm(config: &Config, store: &CacheStore, badge: &BadgeFile) -> anyhow::Result<()> {
    let host = github_host(config);
    let registry =
        NpmProvider::with_base_urls(config.npm.registry_url.clone(), config.npm.downloads_url.clone());

    let stats = jobs::update_npm(config, &host, &registry, store, badge)
        .await
        .context("updating npm badge")?;

    println!("npm: {} packages, {} downloads", stats.packages, stats.downloads);
    Ok(())
}

async fn run_vscode(config: &Config, store: &CacheStore, badge: &BadgeFile) -> anyhow::Result<()> {
    let host = github_host(config);
    let marketplace = MarketplaceProvider::with_query_url(config.vscode.marketplace_url.clone());

    let stats = jobs::update_marketplace(config, &host, &marketplace, store, badge)
        .await
        .context("updating VS Code marketplace badge")?;

    println!(
        "vsmarketplace: {} extensions, {} installs, {} downloads",
        stats.extensions, stats.installs, stats.downloads
    );
    Ok(())
}

async fn run_modrinth(config: &Config, badge: &BadgeFile) -> anyhow::Result<()> {
    let platform = ModrinthProvider::with_base_url(config.modrinth.api_url.clone());

    let stats = jobs::update_modrinth(config, &platform, badge)
        .await
        .context("updating Modrinth badge")?;

    println!("modrinth: {} projects, {} downloads", stats.projects, stats.downloads);
    Ok(())
}

fn run_cache(action: CacheCommand, store: &CacheStore) -> anyhow::Result<()> {
    // try_load, not load: editing must never paper over a corrupt file
    let mut doc = store
        .try_load()
        .with_context(|| format!("reading {}", store.path().display()))?;

    match action {
        CacheCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        CacheCommand::Forget { repo, kind } => {
            let removed = doc.forget(&repo, kind);
            if removed > 0 {
                store.save(&mut doc)?;
            }
            println!("Removed {} record(s) for {}", removed, repo);
        }
    }

    Ok(())
}
