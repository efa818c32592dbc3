//! Sync engine.
//!
//! Runs one pass over a configured entity list:
//! 1. Fetch each entity's record from its upstream source
//! 2. Merge successes into a fresh store, carrying forward the previous
//!    record for entities whose fetch failed
//! 3. Persist the store if anything succeeded
//!
//! Entities are fetched sequentially with a fixed delay in between to stay
//! under upstream rate limits.

pub mod primebot;
pub mod riot;

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

use crate::fetch::FetchError;
use crate::storage::{StorageError, SyncStore};

/// Failure to obtain one entity's record. Never aborts a run.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure, timeout, bad status or malformed body
    #[error("Upstream unavailable: {0}")]
    Unavailable(#[from] FetchError),

    #[error("Upstream response missing {0}")]
    MissingField(&'static str),
}

/// Errors that end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Something the engine can sync, identified by its store key.
pub trait SyncEntity {
    fn key(&self) -> &str;

    /// Entities that return false are not fetched this run.
    fn is_syncable(&self) -> bool {
        true
    }
}

/// Values fixed for the duration of one run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    /// Wall-clock time captured once at the start of the run
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An upstream API that yields one record per entity.
#[async_trait]
pub trait SyncSource: Send + Sync {
    type Entity: SyncEntity + Send + Sync;
    type Record: Clone + Send + Sync;

    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch and compute the record for a single entity.
    async fn fetch(&self, entity: &Self::Entity, ctx: &RunContext) -> Result<Self::Record, UpstreamError>;
}

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Every attempted entity synced
    Completed,
    /// Some entities failed, the rest were persisted
    Partial,
    /// Entities were attempted and none succeeded; nothing persisted
    Failed,
    /// Nothing to sync
    Idle,
}

/// In-memory outcome of merging one run into the previous store.
#[derive(Debug, Clone)]
pub struct SyncOutcome<R> {
    pub store: SyncStore<R>,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

impl<R> SyncOutcome<R> {
    pub fn status(&self) -> SyncStatus {
        match (self.succeeded, self.failed) {
            (0, 0) => SyncStatus::Idle,
            (0, _) => SyncStatus::Failed,
            (_, 0) => SyncStatus::Completed,
            _ => SyncStatus::Partial,
        }
    }
}

/// Summary of a run against a store file.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub source: &'static str,
    pub status: SyncStatus,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
    pub persisted: bool,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Exit code when every source synced something or had nothing to do.
pub const EXIT_OK: u8 = 0;

/// Exit code when a source attempted entities and none succeeded.
pub const EXIT_NOTHING_SYNCED: u8 = 2;

/// Map the reports of one invocation to the process exit code.
pub fn exit_code(reports: &[SyncReport]) -> u8 {
    if reports.iter().any(|r| r.status == SyncStatus::Failed) {
        EXIT_NOTHING_SYNCED
    } else {
        EXIT_OK
    }
}

/// Sequential sync engine.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    request_delay: Duration,
}

impl SyncEngine {
    pub fn new(request_delay: Duration) -> Self {
        Self { request_delay }
    }

    /// Sync every entity and merge the results over `previous`.
    ///
    /// The returned store holds exactly the configured keys that either
    /// succeeded now or had a previous record.
    pub async fn run<S: SyncSource>(
        &self,
        source: &S,
        entities: &[S::Entity],
        previous: &SyncStore<S::Record>,
        ctx: &RunContext,
    ) -> SyncOutcome<S::Record> {
        let mut store = SyncStore::new();
        let mut succeeded = 0u32;
        let mut failed = 0u32;
        let mut skipped = 0u32;
        let mut errors = Vec::new();
        let mut fetched_any = false;

        for entity in entities {
            let key = entity.key();

            if !entity.is_syncable() {
                info!("Skipping {}: not syncable", key);
                skipped += 1;
                if let Some(old) = previous.get(key) {
                    store.insert(key, old.clone());
                }
                continue;
            }

            if fetched_any && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            fetched_any = true;

            let span = info_span!("entity", source = source.name(), key);
            match source.fetch(entity, ctx).instrument(span).await {
                Ok(record) => {
                    info!("Synced {}", key);
                    store.insert(key, record);
                    succeeded += 1;
                }
                Err(e) => {
                    warn!("Failed to sync {}: {}", key, e);
                    errors.push(format!("{}: {}", key, e));
                    failed += 1;
                    if let Some(old) = previous.get(key) {
                        store.insert(key, old.clone());
                    }
                }
            }
        }

        SyncOutcome {
            store,
            succeeded,
            failed,
            skipped,
            errors,
        }
    }

    /// Load the store at `path`, run the sync and persist if anything succeeded.
    ///
    /// Only storage errors are returned; upstream failures are reported in
    /// the `SyncReport`.
    pub async fn sync_file<S>(
        &self,
        source: &S,
        entities: &[S::Entity],
        path: &Path,
        ctx: &RunContext,
    ) -> Result<SyncReport, SyncError>
    where
        S: SyncSource,
        S::Record: Serialize + DeserializeOwned,
    {
        let start = Instant::now();
        info!("Starting {} sync of {} entities", source.name(), entities.len());

        let previous: SyncStore<S::Record> = SyncStore::load(path)?;
        let outcome = self.run(source, entities, &previous, ctx).await;
        let status = outcome.status();

        let persisted = outcome.succeeded > 0;
        if persisted {
            outcome.store.save(path)?;
        } else if status == SyncStatus::Failed {
            warn!("No {} entity synced, leaving {:?} untouched", source.name(), path);
        }

        let duration = start.elapsed();
        info!(
            "{} sync finished: {} synced, {} failed, {} skipped in {:?}",
            source.name(),
            outcome.succeeded,
            outcome.failed,
            outcome.skipped,
            duration
        );

        Ok(SyncReport {
            source: source.name(),
            status,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            skipped: outcome.skipped,
            persisted,
            errors: outcome.errors,
            duration,
        })
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(1200))
    }
}
