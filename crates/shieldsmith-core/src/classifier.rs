// Decides whether a repository publishes an npm package or a VS Code extension
//
// The answer is one of three things: an identifier, a definite "no", or
// "couldn't tell". Only the first two ever reach the cache.

use crate::{
    host::{FetchError, RepositoryHost},
    models::{Classification, ProjectType, RepoRef},
};
use serde_json::Value;
use tracing::debug;

/// Package descriptor both ecosystems share
pub const MANIFEST_PATH: &str = "package.json";

/// Only npm's publish tooling reads this, so its presence signals intent
pub const NPM_MARKER_PATH: &str = ".npmignore";

/// Marketplace categories; any of these in `categories` marks an extension
const EXTENSION_CATEGORIES: &[&str] = &[
    "ai",
    "azure",
    "chat",
    "data science",
    "debuggers",
    "education",
    "extension packs",
    "formatters",
    "keymaps",
    "language packs",
    "linters",
    "machine learning",
    "notebooks",
    "other",
    "programming languages",
    "scm providers",
    "snippets",
    "testing",
    "themes",
    "visualization",
];

/// The parts of `package.json` classification looks at.
///
/// Every field is a loose `Value`: real manifests carry legacy shapes
/// (`engines` as an array, `categories` as a string) and any valid JSON
/// must still classify.
#[derive(Debug, Default)]
struct PackageManifest {
    name: Value,
    private: Value,
    engines: Value,
    contributes: Value,
    categories: Value,
}

impl PackageManifest {
    /// Pick the known fields out of any JSON value; a non-object declares nothing
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => Self {
                name: fields.remove("name").unwrap_or_default(),
                private: fields.remove("private").unwrap_or_default(),
                engines: fields.remove("engines").unwrap_or_default(),
                contributes: fields.remove("contributes").unwrap_or_default(),
                categories: fields.remove("categories").unwrap_or_default(),
            },
            _ => Self::default(),
        }
    }

    /// Declared name; a non-string or blank name counts as none
    fn declared_name(&self) -> Option<&str> {
        self.name.as_str().map(str::trim).filter(|n| !n.is_empty())
    }

    /// npm treats any truthy `private` as "do not publish"
    fn is_private(&self) -> bool {
        match &self.private {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn targets_vscode(&self) -> bool {
        self.engines
            .as_object()
            .map_or(false, |engines| engines.contains_key("vscode"))
    }

    fn has_contributions(&self) -> bool {
        matches!(&self.contributes, Value::Object(_))
    }

    fn has_extension_category(&self) -> bool {
        let Some(categories) = self.categories.as_array() else {
            return false;
        };

        categories
            .iter()
            .filter_map(Value::as_str)
            .any(|c| EXTENSION_CATEGORIES.contains(&c.trim().to_lowercase().as_str()))
    }
}

/// Classifies repositories of one owner against the host's file contents
pub struct Classifier<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    owner: &'a str,
}

impl<'a, H: RepositoryHost + ?Sized> Classifier<'a, H> {
    pub fn new(host: &'a H, owner: &'a str) -> Self {
        Self { host, owner }
    }

    pub async fn classify(&self, repo: &RepoRef, kind: ProjectType) -> Classification {
        let manifest = match self.fetch_manifest(repo).await {
            Ok(manifest) => manifest,
            Err(outcome) => return outcome,
        };

        match kind {
            ProjectType::Npm => npm_candidate(&manifest),
            ProjectType::NpmStrict => match npm_candidate(&manifest) {
                Classification::Found(id) => self.confirm_marker(repo, id).await,
                other => other,
            },
            ProjectType::VsCode => extension_candidate(&manifest),
        }
    }

    /// Fetch and parse the manifest; the error side is already a final answer
    async fn fetch_manifest(
        &self,
        repo: &RepoRef,
    ) -> std::result::Result<PackageManifest, Classification> {
        let bytes = match self
            .host
            .get_file_contents(self.owner, &repo.name, MANIFEST_PATH)
            .await
        {
            Ok(bytes) => bytes,
            Err(FetchError::NotFound(_)) => {
                debug!("{}: no {}", repo.name, MANIFEST_PATH);
                return Err(Classification::NotApplicable);
            }
            Err(FetchError::Transport(e)) => return Err(Classification::Deferred(e)),
        };

        // Bytes that aren't JSON say nothing either way; try again next run
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            Classification::Deferred(format!("unparseable {}: {}", MANIFEST_PATH, e))
        })?;

        Ok(PackageManifest::from_value(value))
    }

    async fn confirm_marker(&self, repo: &RepoRef, id: String) -> Classification {
        match self
            .host
            .get_file_contents(self.owner, &repo.name, NPM_MARKER_PATH)
            .await
        {
            Ok(_) => Classification::Found(id),
            Err(FetchError::NotFound(_)) => {
                debug!("{}: {} present but no {}", repo.name, MANIFEST_PATH, NPM_MARKER_PATH);
                Classification::NotApplicable
            }
            Err(FetchError::Transport(e)) => Classification::Deferred(e),
        }
    }
}

fn npm_candidate(manifest: &PackageManifest) -> Classification {
    match manifest.declared_name() {
        Some(name) if !manifest.is_private() => Classification::Found(name.to_string()),
        _ => Classification::NotApplicable,
    }
}

fn extension_candidate(manifest: &PackageManifest) -> Classification {
    let is_extension = manifest.targets_vscode()
        || manifest.has_contributions()
        || manifest.has_extension_category();

    match manifest.declared_name() {
        Some(name) if is_extension => Classification::Found(name.to_string()),
        _ => Classification::NotApplicable,
    }
}
