// Reconciliation pass: list repos, classify the unknown ones, fold results into the cache
use crate::{
    classifier::Classifier,
    host::RepositoryHost,
    models::{Classification, ProjectType, RepoRef},
};
use futures::stream::{self, StreamExt};
use shieldsmith_cache::{CacheDocument, CacheStore};
use tracing::{debug, error, info, warn};

/// Where the final identifier list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierSource {
    /// Fresh reconciliation against the host
    Reconciled,
    /// Listing failed; the persisted cache answered instead
    CacheFallback,
    /// Nothing known at all; the configured defaults were used
    Defaults,
}

/// Summary of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub identifiers: Vec<String>,
    pub source: IdentifierSource,
    /// Repositories answered from the cache without a network call
    pub skipped: usize,
    /// New records written (positive or negative)
    pub classified: usize,
    /// Repositories left unclassified because of an ambiguous error
    pub deferred: usize,
    pub write_failures: usize,
}

impl ReconcileReport {
    fn new(source: IdentifierSource) -> Self {
        Self {
            identifiers: Vec::new(),
            source,
            skipped: 0,
            classified: 0,
            deferred: 0,
            write_failures: 0,
        }
    }
}

/// Walks one owner's repositories and keeps the classification cache current.
///
/// The cache store is owned for the duration of a pass. Classification
/// requests run concurrently, but every merge into the document happens
/// here, one at a time, followed by a save.
pub struct Reconciler<'a, H: RepositoryHost + ?Sized> {
    host: &'a H,
    store: &'a CacheStore,
    owner: String,
    concurrency: usize,
}

impl<'a, H: RepositoryHost + ?Sized> Reconciler<'a, H> {
    pub fn new(host: &'a H, store: &'a CacheStore, owner: impl Into<String>) -> Self {
        Self {
            host,
            store,
            owner: owner.into(),
            concurrency: 8,
        }
    }

    /// How many classifications may be in flight at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one pass for `kind`, falling back to `defaults` if nothing is known
    pub async fn run(&self, kind: ProjectType, defaults: &[String]) -> ReconcileReport {
        info!("Fetching repositories from host for owner: {}", self.owner);
        let repos = match self.host.list_repositories(&self.owner).await {
            Ok(repos) => repos,
            Err(e) => {
                warn!("Could not list repositories ({}); using cached {} results", e, kind);
                let report = ReconcileReport::new(IdentifierSource::CacheFallback);
                return finish(report, &self.store.load(), kind, defaults);
            }
        };
        info!("Found {} repositories", repos.len());

        let mut doc = self.store.load();

        let mut report = ReconcileReport::new(IdentifierSource::Reconciled);

        let (known, pending): (Vec<RepoRef>, Vec<RepoRef>) = repos
            .into_iter()
            .partition(|repo| doc.is_classified(&repo.name, kind));

        for repo in &known {
            debug!("Using cached {} classification for {}", kind, repo.name);
        }
        report.skipped = known.len();

        let classifier = Classifier::new(self.host, &self.owner);
        let mut outcomes = stream::iter(pending)
            .map(|repo| {
                let classifier = &classifier;
                async move {
                    let outcome = classifier.classify(&repo, kind).await;
                    (repo, outcome)
                }
            })
            .buffer_unordered(self.concurrency);

        while let Some((repo, outcome)) = outcomes.next().await {
            match &outcome {
                Classification::Found(id) => {
                    info!("Found {} project {} in repo {}", kind, id, repo.name)
                }
                Classification::NotApplicable => {
                    debug!("{} is not a {} project", repo.name, kind)
                }
                Classification::Deferred(reason) => {
                    warn!("Skipping {}: {}", repo.name, reason);
                    report.deferred += 1;
                }
            }

            let Some(id) = outcome.cache_value() else {
                continue;
            };

            if doc.upsert(&repo.name, kind, id) {
                report.classified += 1;
                self.persist(&mut doc, &mut report);
            }
        }

        finish(report, &doc, kind, defaults)
    }

    /// Save after every change so a crash mid-pass loses at most one result
    fn persist(&self, doc: &mut CacheDocument, report: &mut ReconcileReport) {
        if let Err(e) = self.store.save(doc) {
            error!("Error saving cache: {}", e);
            report.write_failures += 1;
        }
    }
}

fn finish(
    mut report: ReconcileReport,
    doc: &CacheDocument,
    kind: ProjectType,
    defaults: &[String],
) -> ReconcileReport {
    report.identifiers = doc.identifiers(kind);

    if report.identifiers.is_empty() {
        info!("No {} identifiers known, using {} defaults", kind, defaults.len());
        report.identifiers = defaults.to_vec();
        report.source = IdentifierSource::Defaults;
    } else {
        info!("Found {} {} identifiers total", report.identifiers.len(), kind);
    }

    report
}
