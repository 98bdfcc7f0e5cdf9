use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from an explicit file, the per-user config file, or defaults, in
/// that order. CLI flags override the handful of fields CI usually varies.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub npm: NpmConfig,
    #[serde(default)]
    pub vscode: VsCodeConfig,
    #[serde(default)]
    pub modrinth: ModrinthConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Load config from `path`, or from the default location if none is given
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path),
                // No config file? Use defaults
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Get the config file path
    /// Uses XDG on Linux/macOS, AppData on Windows
    /// CI runners often have no home directory, so this can be None
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shieldsmith").join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Account whose repositories are scanned
    #[serde(default = "default_github_owner")]
    pub owner: String,

    /// Personal access token; raises the rate limit from 60 to 5000 requests/hour
    pub token: Option<String>,

    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,
}

fn default_github_owner() -> String {
    "0DarkPhoenix".to_string()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: default_github_owner(),
            token: None,
            api_url: default_github_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmConfig {
    /// npm account used for the maintainer search
    #[serde(default = "default_npm_username")]
    pub username: String,

    /// Require an `.npmignore` next to `package.json` before counting a repo
    #[serde(default)]
    pub strict: bool,

    /// Used when neither the host nor the cache know any packages
    #[serde(default = "default_fallback_packages")]
    pub fallback_packages: Vec<String>,

    #[serde(default = "default_npm_registry_url")]
    pub registry_url: String,

    #[serde(default = "default_npm_downloads_url")]
    pub downloads_url: String,
}

fn default_npm_username() -> String {
    "darkphoenix".to_string()
}

fn default_fallback_packages() -> Vec<String> {
    vec!["relativedelta".to_string()]
}

fn default_npm_registry_url() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_npm_downloads_url() -> String {
    "https://api.npmjs.org".to_string()
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            username: default_npm_username(),
            strict: false,
            fallback_packages: default_fallback_packages(),
            registry_url: default_npm_registry_url(),
            downloads_url: default_npm_downloads_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VsCodeConfig {
    /// Marketplace publisher; queries go out as `publisher.extension`
    #[serde(default = "default_publisher")]
    pub publisher: String,

    #[serde(default = "default_fallback_extensions")]
    pub fallback_extensions: Vec<String>,

    #[serde(default = "default_marketplace_url")]
    pub marketplace_url: String,
}

fn default_publisher() -> String {
    "DarkPhoenix".to_string()
}

fn default_fallback_extensions() -> Vec<String> {
    [
        "dark-modern-darker",
        "quick-fix-helper",
        "codebee-tools",
        "debian-changelog-item-creator",
        "f-string-converter-plus",
        "i18n-tools-international",
        "select-pasted-text",
        "split-mui-imports",
        "template-string-formatter-plus",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_marketplace_url() -> String {
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery/".to_string()
}

impl Default for VsCodeConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
            fallback_extensions: default_fallback_extensions(),
            marketplace_url: default_marketplace_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModrinthConfig {
    #[serde(default = "default_modrinth_username")]
    pub username: String,

    #[serde(default = "default_modrinth_url")]
    pub api_url: String,
}

fn default_modrinth_username() -> String {
    "dark_phoenix_".to_string()
}

fn default_modrinth_url() -> String {
    "https://api.modrinth.com/v2".to_string()
}

impl Default for ModrinthConfig {
    fn default() -> Self {
        Self {
            username: default_modrinth_username(),
            api_url: default_modrinth_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Classification cache, relative to the working directory
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Badge data consumed by shields.io endpoint badges
    #[serde(default = "default_badge_file")]
    pub badge_file: PathBuf,
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(".cache").join("shared-projects.json")
}

fn default_badge_file() -> PathBuf {
    PathBuf::from("shields").join("downloads.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            badge_file: default_badge_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Manifest probes allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    8 // stays well clear of GitHub's secondary rate limits
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.npm.fallback_packages, vec!["relativedelta"]);
        assert_eq!(config.vscode.fallback_extensions.len(), 9);
        assert_eq!(config.reconcile.concurrency, 8);
        assert!(!config.npm.strict);
        assert_eq!(
            config.paths.cache_file,
            PathBuf::from(".cache/shared-projects.json")
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("fallback_packages"));
        assert!(toml.contains("publisher"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[github]\nowner = \"octocat\"\n\n[npm]\nstrict = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.github.owner, "octocat");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.npm.strict);
        assert_eq!(config.npm.username, "darkphoenix");
        assert_eq!(config.modrinth.username, "dark_phoenix_");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(crate::Error::ConfigError(_))));
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[github\nowner = 1").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(crate::Error::ConfigError(_))
        ));
    }
}
