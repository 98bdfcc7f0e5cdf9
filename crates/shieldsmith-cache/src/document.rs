use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which kind of published project a classification is about.
///
/// Strict and lenient npm classification get separate tags: a strict negative
/// ("no .npmignore") says something different from a lenient one ("no
/// package.json"), so they must never answer for each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "npm")]
    Npm,
    #[serde(rename = "npm-strict")]
    NpmStrict,
    #[serde(rename = "vscode")]
    VsCode,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Npm => "npm",
            ProjectType::NpmStrict => "npm-strict",
            ProjectType::VsCode => "vscode",
        }
    }

    pub fn all() -> [ProjectType; 3] {
        [ProjectType::Npm, ProjectType::NpmStrict, ProjectType::VsCode]
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectType::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown project type '{}'", s))
    }
}

/// One classification of one repository for one project type.
///
/// `id: None` is a negative entry: the repository was checked and is not a
/// project of this type. Unknown keys are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "type")]
    pub kind: ProjectType,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClassificationRecord {
    pub fn new(kind: ProjectType, id: Option<String>) -> Self {
        Self {
            kind,
            id,
            extra: Map::new(),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.id.is_none()
    }
}

/// All records held for one repository name, at most one per type.
///
/// On disk a single record is written as a plain object, which is the common
/// case; a repository classified for several types becomes an array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "EntryRepr", into = "EntryRepr")]
pub struct RepositoryEntry {
    records: Vec<ClassificationRecord>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    One(ClassificationRecord),
    Many(Vec<ClassificationRecord>),
}

impl From<EntryRepr> for RepositoryEntry {
    fn from(repr: EntryRepr) -> Self {
        let mut entry = RepositoryEntry::default();
        let records = match repr {
            EntryRepr::One(record) => vec![record],
            EntryRepr::Many(records) => records,
        };
        // First record of a type wins if a hand-edited file repeats one
        for record in records {
            if entry.get(record.kind).is_none() {
                entry.records.push(record);
            }
        }
        entry
    }
}

impl From<RepositoryEntry> for EntryRepr {
    fn from(mut entry: RepositoryEntry) -> Self {
        if entry.records.len() == 1 {
            EntryRepr::One(entry.records.remove(0))
        } else {
            EntryRepr::Many(entry.records)
        }
    }
}

impl RepositoryEntry {
    pub fn get(&self, kind: ProjectType) -> Option<&ClassificationRecord> {
        self.records.iter().find(|r| r.kind == kind)
    }

    pub fn records(&self) -> &[ClassificationRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if the stored id for `kind` changed
    fn upsert(&mut self, kind: ProjectType, id: Option<String>) -> bool {
        match self.records.iter_mut().find(|r| r.kind == kind) {
            Some(existing) if existing.id == id => false,
            Some(existing) => {
                existing.id = id;
                true
            }
            None => {
                self.records.push(ClassificationRecord::new(kind, id));
                true
            }
        }
    }

    fn remove(&mut self, kind: Option<ProjectType>) -> usize {
        let before = self.records.len();
        match kind {
            Some(kind) => self.records.retain(|r| r.kind != kind),
            None => self.records.clear(),
        }
        before - self.records.len()
    }
}

/// The whole persisted cache
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, repo: &str, kind: ProjectType) -> Option<&ClassificationRecord> {
        self.repositories.get(repo).and_then(|e| e.get(kind))
    }

    /// A negative record counts: it was classified, the answer was "no"
    pub fn is_classified(&self, repo: &str, kind: ProjectType) -> bool {
        self.record(repo, kind).is_some()
    }

    /// Merge one classification in, returning whether anything changed.
    ///
    /// Extra fields on an existing record survive. An identical `(type, id)`
    /// leaves the document untouched so callers can skip the save.
    pub fn upsert(&mut self, repo: &str, kind: ProjectType, id: Option<String>) -> bool {
        self.repositories
            .entry(repo.to_string())
            .or_default()
            .upsert(kind, id)
    }

    /// Drop records for a repository (all types when `kind` is None).
    /// Returns how many records were removed.
    pub fn forget(&mut self, repo: &str, kind: Option<ProjectType>) -> usize {
        let Some(entry) = self.repositories.get_mut(repo) else {
            return 0;
        };
        let removed = entry.remove(kind);
        if entry.is_empty() {
            self.repositories.remove(repo);
        }
        removed
    }

    /// Published identifiers of one type, sorted and deduplicated
    pub fn identifiers(&self, kind: ProjectType) -> Vec<String> {
        self.repositories
            .values()
            .filter_map(|e| e.get(kind))
            .filter_map(|r| r.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of records across all repositories
    pub fn record_count(&self) -> usize {
        self.repositories.values().map(|e| e.records().len()).sum()
    }
}
