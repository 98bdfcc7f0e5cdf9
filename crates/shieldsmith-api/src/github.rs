use base64::Engine;
use reqwest::{header::HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// GitHub caps `per_page` at 100
const PER_PAGE: usize = 100;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Could not decode file contents: {0}")]
    DecodeError(String),
}

impl GitHubError {
    /// Only a 404 proves the thing is absent; everything else might go away on its own
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;

pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise or a local stub server
    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        // GitHub rejects requests without a User-Agent
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("shieldsmith/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List every public repository owned by a user, following pagination
    pub async fn list_user_repositories(&self, owner: &str) -> Result<Vec<GitHubRepo>> {
        let url = format!(
            "{}/users/{}/repos",
            self.base_url,
            urlencoding::encode(owner)
        );

        let mut repos = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .get(&url)
                .query(&[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            let response = check_status(response, owner).await?;
            let batch: Vec<GitHubRepo> = response.json().await?;
            let batch_len = batch.len();
            repos.extend(batch);

            debug!("Fetched page {} of repositories for {} ({} repos)", page, owner, batch_len);

            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(repos)
    }

    /// Fetch a single file from the default branch of a repository
    pub async fn get_file_contents(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            path.trim_start_matches('/')
        );

        let response = self.get(&url).send().await?;
        let what = format!("{} in {}/{}", path, owner, repo);
        let response = check_status(response, &what).await?;

        let body = response.text().await?;
        let body = parse_contents(&body, &what)?;

        match (body.encoding.as_deref(), body.content) {
            (Some("base64"), Some(content)) => decode_content(&content),
            (encoding, _) => Err(GitHubError::DecodeError(format!(
                "{} has unsupported encoding {:?}",
                what, encoding
            ))),
        }
    }
}

/// Pass successful responses through, turn the rest into errors
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &headers, what, &body))
}

/// Map a non-success status onto an error variant.
///
/// Only a 404 may become `NotFound`; callers cache that as a permanent answer.
fn status_error(status: StatusCode, headers: &HeaderMap, what: &str, body: &str) -> GitHubError {
    if status == StatusCode::NOT_FOUND {
        return GitHubError::NotFound(what.to_string());
    }

    if status == StatusCode::UNAUTHORIZED {
        return GitHubError::AuthRequired;
    }

    // GitHub signals an exhausted quota with 403 + x-ratelimit-remaining: 0
    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "0")
        .unwrap_or(false);

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && quota_exhausted)
    {
        return GitHubError::RateLimitExceeded;
    }

    GitHubError::RequestFailed(format!("Status {}: {}", status, body))
}

/// The contents API wraps base64 at 60 columns, so strip whitespace first
pub fn decode_content(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| GitHubError::DecodeError(e.to_string()))
}

/// One entry of a repository listing; the name is all classification needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    kind: String,
    encoding: Option<String>,
    content: Option<String>,
}

/// Parse a contents API body that should describe a single file.
///
/// A directory comes back as an array and a symlink or submodule as an object
/// of another type. Either way the file we asked for is not there.
fn parse_contents(body: &str, what: &str) -> Result<ContentsResponse> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if value.is_array() {
        return Err(GitHubError::NotFound(format!("{} is a directory", what)));
    }

    let contents: ContentsResponse = serde_json::from_value(value)?;
    if contents.kind != "file" {
        return Err(GitHubError::NotFound(format!("{} is a {}", what, contents.kind)));
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_content() {
        // "{\"name\": \"foo\"}" split the way the API wraps it
        let wrapped = "eyJuYW1lIjog\nImZvbyJ9\n";
        let decoded = decode_content(wrapped).unwrap();
        assert_eq!(decoded, br#"{"name": "foo"}"#);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_content("!!not base64!!");
        assert!(matches!(result, Err(GitHubError::DecodeError(_))));
    }

    #[test]
    fn test_only_404_counts_as_not_found() {
        assert!(GitHubError::NotFound("package.json".into()).is_not_found());
        assert!(!GitHubError::RateLimitExceeded.is_not_found());
        assert!(!GitHubError::RequestFailed("Status 502".into()).is_not_found());
    }

    #[test]
    fn test_repo_listing_deserializes() {
        let json = r#"[
            {
                "name": "relativedelta",
                "full_name": "someone/relativedelta",
                "fork": false,
                "html_url": "https://github.com/someone/relativedelta",
                "pushed_at": "2025-01-12T10:00:00Z",
                "stargazers_count": 3
            }
        ]"#;

        let repos: Vec<GitHubRepo> = serde_json::from_str(json).unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "relativedelta");
    }

    #[test]
    fn test_status_mapping() {
        let none = HeaderMap::new();
        let mut exhausted = HeaderMap::new();
        exhausted.insert("x-ratelimit-remaining", "0".parse().unwrap());
        let mut remaining = HeaderMap::new();
        remaining.insert("x-ratelimit-remaining", "4999".parse().unwrap());

        let map = |status: u16, headers: &HeaderMap| {
            status_error(StatusCode::from_u16(status).unwrap(), headers, "package.json", "")
        };

        assert!(matches!(map(404, &none), GitHubError::NotFound(_)));
        assert!(matches!(map(401, &none), GitHubError::AuthRequired));
        assert!(matches!(map(429, &none), GitHubError::RateLimitExceeded));
        assert!(matches!(map(403, &exhausted), GitHubError::RateLimitExceeded));
        assert!(matches!(map(403, &remaining), GitHubError::RequestFailed(_)));
        assert!(matches!(map(500, &none), GitHubError::RequestFailed(_)));
        assert!(matches!(map(502, &exhausted), GitHubError::RequestFailed(_)));
    }

    #[test]
    fn test_only_404_status_is_not_found() {
        let headers = HeaderMap::new();
        for status in [401u16, 403, 429, 500, 502, 503] {
            let err = status_error(StatusCode::from_u16(status).unwrap(), &headers, "x", "");
            assert!(!err.is_not_found(), "status {} must not be NotFound", status);
        }
    }

    #[test]
    fn test_directory_listing_is_not_found() {
        let body = r#"[{"type": "file", "name": "index.js"}, {"type": "dir", "name": "lib"}]"#;
        let result = parse_contents(body, "package.json in someone/repo");
        assert!(matches!(result, Err(GitHubError::NotFound(_))));
    }

    #[test]
    fn test_submodule_is_not_found() {
        let body = r#"{"type": "submodule", "name": "package.json"}"#;
        assert!(matches!(
            parse_contents(body, "package.json"),
            Err(GitHubError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_body_parses() {
        let body = r#"{"type": "file", "encoding": "base64", "content": "e30=\n"}"#;
        let contents = parse_contents(body, "package.json").unwrap();
        assert_eq!(contents.encoding.as_deref(), Some("base64"));
        assert_eq!(decode_content(&contents.content.unwrap()).unwrap(), b"{}");
    }

    #[test]
    fn test_truncated_body_is_not_not_found() {
        let result = parse_contents(r#"{"type": "fi"#, "package.json");
        assert!(matches!(result, Err(GitHubError::ParseError(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GitHubClient::with_base_url(None, "http://localhost:8080/".to_string());
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
