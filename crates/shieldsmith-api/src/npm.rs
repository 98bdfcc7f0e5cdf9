use serde::Deserialize;
use thiserror::Error;

const NPM_REGISTRY_BASE: &str = "https://registry.npmjs.org";
const NPM_DOWNLOADS_BASE: &str = "https://api.npmjs.org";

/// Widest range the point endpoint accepts; npm clamps it to the package's lifetime
const ALL_TIME_RANGE: &str = "1000-01-01:2100-01-01";

/// Registry search returns at most 250 results per page
const SEARCH_PAGE_SIZE: u32 = 250;

#[derive(Error, Debug)]
pub enum NpmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NpmError>;

pub struct NpmClient {
    client: reqwest::Client,
    registry_url: String,
    downloads_url: String,
}

impl NpmClient {
    pub fn new() -> Self {
        Self::with_base_urls(NPM_REGISTRY_BASE.to_string(), NPM_DOWNLOADS_BASE.to_string())
    }

    pub fn with_base_urls(registry_url: String, downloads_url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("shieldsmith/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            downloads_url: downloads_url.trim_end_matches('/').to_string(),
        }
    }

    /// Names of every package the registry lists for a maintainer
    pub async fn search_by_maintainer(&self, username: &str) -> Result<Vec<String>> {
        let url = format!("{}/-/v1/search", self.registry_url);
        let text = format!("maintainer:{}", username);
        let size = SEARCH_PAGE_SIZE.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("text", text.as_str()), ("size", size.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NpmError::RequestFailed(format!("Status {}: {}", status, body)));
        }

        let results: SearchResponse = response.json().await?;
        Ok(results.objects.into_iter().map(|o| o.package.name).collect())
    }

    /// All-time download count for one package
    pub async fn all_time_downloads(&self, package: &str) -> Result<u64> {
        // Scoped names keep their slash; the endpoint expects `@scope/name` verbatim
        let url = format!(
            "{}/downloads/point/{}/{}",
            self.downloads_url, ALL_TIME_RANGE, package
        );

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(NpmError::NotFound(package.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NpmError::RequestFailed(format!("Status {}: {}", status, body)));
        }

        let point: DownloadPoint = response.json().await?;
        Ok(point.downloads)
    }
}

impl Default for NpmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Vec<SearchObject>,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: SearchPackage,
}

#[derive(Debug, Deserialize)]
struct SearchPackage {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DownloadPoint {
    #[serde(default)]
    downloads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "objects": [
                {"package": {"name": "relativedelta", "version": "1.0.0"}, "score": {}},
                {"package": {"name": "@scope/tool", "version": "0.2.1"}}
            ],
            "total": 2
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let names: Vec<_> = parsed.objects.into_iter().map(|o| o.package.name).collect();
        assert_eq!(names, vec!["relativedelta", "@scope/tool"]);
    }

    #[test]
    fn test_download_point_defaults_to_zero() {
        let parsed: DownloadPoint =
            serde_json::from_str(r#"{"start": "2015-01-10", "package": "x"}"#).unwrap();
        assert_eq!(parsed.downloads, 0);
    }
}
