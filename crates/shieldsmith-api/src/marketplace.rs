use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const MARKETPLACE_QUERY_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery/";

/// `ExtensionName` filter: matches `publisher.extension`
const FILTER_TYPE_EXTENSION_NAME: u32 = 7;

/// IncludeStatistics | IncludeLatestVersionOnly | IncludeVersions | ...
const QUERY_FLAGS: u32 = 402;

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;

pub struct MarketplaceClient {
    client: reqwest::Client,
    query_url: String,
}

impl MarketplaceClient {
    pub fn new() -> Self {
        Self::with_query_url(MARKETPLACE_QUERY_URL.to_string())
    }

    pub fn with_query_url(query_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json;api-version=3.0-preview.1"),
        );

        let client = reqwest::Client::builder()
            .user_agent("shieldsmith/0.1.0")
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, query_url }
    }

    /// Look up one extension by `publisher.extension`.
    ///
    /// An empty vec means the marketplace does not know the extension.
    pub async fn query_extension(
        &self,
        publisher: &str,
        extension: &str,
    ) -> Result<Vec<MarketplaceExtension>> {
        let body = query_body(publisher, extension);

        let response = self.client.post(&self.query_url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MarketplaceError::RequestFailed(format!(
                "Status {}: {}",
                status, text
            )));
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.extensions)
            .unwrap_or_default())
    }
}

impl Default for MarketplaceClient {
    fn default() -> Self {
        Self::new()
    }
}

fn query_body(publisher: &str, extension: &str) -> serde_json::Value {
    json!({
        "filters": [{
            "pageNumber": 1,
            "pageSize": 100,
            "criteria": [{
                "filterType": FILTER_TYPE_EXTENSION_NAME,
                "value": format!("{}.{}", publisher, extension),
            }],
        }],
        "flags": QUERY_FLAGS,
    })
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    extensions: Vec<MarketplaceExtension>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceExtension {
    pub extension_name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub statistics: Vec<ExtensionStatistic>,
}

impl MarketplaceExtension {
    /// Value of a named statistic, 0 when the marketplace omits it
    pub fn statistic(&self, name: &str) -> u64 {
        self.statistics
            .iter()
            .find(|s| s.statistic_name == name)
            .map(|s| s.value.max(0.0) as u64)
            .unwrap_or(0)
    }

    pub fn installs(&self) -> u64 {
        self.statistic("install")
    }

    pub fn updates(&self) -> u64 {
        self.statistic("updateCount")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionStatistic {
    pub statistic_name: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_targets_qualified_name() {
        let body = query_body("DarkPhoenix", "split-mui-imports");
        assert_eq!(
            body["filters"][0]["criteria"][0]["value"],
            "DarkPhoenix.split-mui-imports"
        );
        assert_eq!(body["filters"][0]["criteria"][0]["filterType"], 7);
        assert_eq!(body["flags"], 402);
    }

    #[test]
    fn test_statistics_lookup() {
        let json = r#"{
            "results": [{
                "extensions": [{
                    "extensionName": "select-pasted-text",
                    "displayName": "Select Pasted Text",
                    "statistics": [
                        {"statisticName": "install", "value": 120},
                        {"statisticName": "updateCount", "value": 30.0},
                        {"statisticName": "averagerating", "value": 4.5}
                    ]
                }]
            }]
        }"#;

        let parsed: QueryResponse = serde_json::from_str(json).unwrap();
        let ext = &parsed.results[0].extensions[0];
        assert_eq!(ext.installs(), 120);
        assert_eq!(ext.updates(), 30);
        assert_eq!(ext.statistic("missing"), 0);
    }

    #[test]
    fn test_empty_results_parse() {
        let parsed: QueryResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(parsed.results.is_empty());
    }
}
