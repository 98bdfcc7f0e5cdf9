use serde::{Deserialize, Serialize};

pub use shieldsmith_cache::ProjectType;

/// A repository on the source host. Only the name matters to classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub name: String,
}

impl RepoRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// What the classifier concluded about one repository for one project type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Publishes under this identifier
    Found(String),
    /// Checked, and definitely not a project of this type
    NotApplicable,
    /// Could not tell this time (rate limit, outage, garbled manifest)
    Deferred(String),
}

impl Classification {
    /// The id to cache, or None when nothing should be written
    pub fn cache_value(&self) -> Option<Option<String>> {
        match self {
            Classification::Found(id) => Some(Some(id.clone())),
            Classification::NotApplicable => Some(None),
            Classification::Deferred(_) => None,
        }
    }
}

/// npm totals as written to the badge file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NpmStats {
    /// Packages with at least one download
    pub packages: usize,
    pub downloads: u64,
}

/// VS Code marketplace totals as written to the badge file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketplaceStats {
    pub extensions: usize,
    pub installs: u64,
    /// Installs plus update downloads
    pub downloads: u64,
}

/// Modrinth totals as written to the badge file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModrinthStats {
    pub projects: usize,
    pub downloads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_value() {
        assert_eq!(
            Classification::Found("pkg".into()).cache_value(),
            Some(Some("pkg".to_string()))
        );
        assert_eq!(Classification::NotApplicable.cache_value(), Some(None));
        assert_eq!(Classification::Deferred("429".into()).cache_value(), None);
    }

    #[test]
    fn test_stats_serialize_like_badge_fields() {
        let stats = MarketplaceStats {
            extensions: 2,
            installs: 10,
            downloads: 15,
        };
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(value, serde_json::json!({"extensions": 2, "installs": 10, "downloads": 15}));
    }
}
