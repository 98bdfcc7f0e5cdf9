// Core logic: classify repositories, keep the cache honest, count downloads
pub mod aggregate;
pub mod badge;
pub mod classifier;
pub mod config;
pub mod error;
pub mod host;
pub mod jobs;
pub mod models;
pub mod providers;
pub mod reconcile;
pub mod registries;

pub use badge::BadgeFile;
pub use classifier::Classifier;
pub use config::Config;
pub use error::Error;
pub use host::{FetchError, RepositoryHost};
pub use models::{Classification, ProjectType, RepoRef};
pub use reconcile::{IdentifierSource, ReconcileReport, Reconciler};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
