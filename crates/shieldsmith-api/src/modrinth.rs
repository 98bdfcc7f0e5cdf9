use serde::{Deserialize, Serialize};
use thiserror::Error;

const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";

#[derive(Error, Debug)]
pub enum ModrinthError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ModrinthError>;

pub struct ModrinthClient {
    client: reqwest::Client,
    base_url: String,
}

impl ModrinthClient {
    pub fn new() -> Self {
        Self::with_base_url(MODRINTH_API_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        // Modrinth asks for an identifying User-Agent
        let client = reqwest::Client::builder()
            .user_agent("shieldsmith/0.1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Every project a user is a member of
    pub async fn user_projects(&self, username: &str) -> Result<Vec<ModrinthProject>> {
        let url = format!(
            "{}/user/{}/projects",
            self.base_url,
            urlencoding::encode(username)
        );

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ModrinthError::NotFound(username.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModrinthError::RequestFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let projects: Vec<ModrinthProject> = response.json().await?;
        Ok(projects)
    }
}

impl Default for ModrinthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModrinthProject {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub downloads: u64,
}
