// JSON-backed classification cache
// Remembers which repositories publish what, so runs only probe new repos

pub mod cache;
pub mod document;

pub use cache::{CacheError, CacheStore};
pub use document::{CacheDocument, ClassificationRecord, ProjectType, RepositoryEntry};
