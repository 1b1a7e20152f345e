//! Registry coordinator.
//!
//! Every mutating intent has the same shape: validate, apply to the canonical
//! set, mirror the set to the local cache, then ask the remote store. A remote
//! failure never rolls the local change back; it flips the mode to
//! [`SyncMode::Degraded`] and comes back to the caller as a warning.
//!
//! Mutations on one id are serialized by a per-id lock held across the remote
//! call. The canonical set itself sits behind an async mutex that is never
//! held while waiting on the store.

mod locks;
pub mod outcome;
pub mod state;

pub use outcome::{Operation, Outcome, Refresh, SyncWarning};
pub use state::{Phase, RegistryState, SyncMode};

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cache::LocalCache;
use crate::error::RegistryError;
use crate::model::{NewRecord, Record, Status};
use crate::store::{FieldUpdate, RemoteStore, StoreFailure, StoreResult};
use crate::validate::{Rejection, validate};
use crate::view::ViewParams;
use locks::IdLocks;

/// Bound on a single remote call when none is configured.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(20);

/// The orchestration core, generic over the store and cache it reconciles.
pub struct Registry<S, C> {
    store: S,
    cache: C,
    state: Mutex<RegistryState>,
    locks: IdLocks,
    timeout: Duration,
}

impl<S: RemoteStore, C: LocalCache> Registry<S, C> {
    /// Create a registry in the `Loading` phase. Call [`Registry::start`]
    /// before issuing intents.
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            state: Mutex::new(RegistryState::default()),
            locks: IdLocks::default(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Bound every remote call; an expired call counts as `Unreachable`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Initial load: adopt the store listing, or fall back to the local cache.
    ///
    /// Always ends in the `Ready` phase. Calling it again is a no-op that
    /// reports the current size; of two overlapping calls only the first to
    /// finish listing adopts anything. Cached records the listing lacks are
    /// reported as discarded local changes.
    pub async fn start(&self) -> Outcome<usize> {
        {
            let state = self.state.lock().await;
            if state.phase == Phase::Ready {
                return Outcome { value: state.len(), mode: state.mode, warnings: Vec::new() };
            }
        }

        let listing = self.remote(Operation::Load, self.store.list_all()).await;
        let cached = self.cache.load().await;

        let mut state = self.state.lock().await;
        if state.phase == Phase::Ready {
            tracing::debug!("concurrent start already loaded the registry");
            return Outcome { value: state.len(), mode: state.mode, warnings: Vec::new() };
        }

        let mut warnings = Vec::new();
        match listing {
            Ok(records) => {
                let cache_only: Vec<String> = cached
                    .iter()
                    .filter(|c| !records.iter().any(|r| r.id == c.id))
                    .map(|c| c.id.clone())
                    .collect();
                let dropped = state.adopt(records);
                if dropped > 0 {
                    tracing::warn!(dropped, "store listing contained invalid or repeated records");
                }
                state.mode = SyncMode::Synced;
                if !cache_only.is_empty() {
                    tracing::warn!(ids = ?cache_only, "cached records absent from the store were dropped");
                    warnings.push(SyncWarning::LocalChangesDiscarded { ids: cache_only });
                }
                warnings.extend(self.persist(&state).await);
                tracing::info!(count = state.len(), "registry loaded from store");
            }
            Err(failure) => {
                state.adopt(cached);
                state.mode = SyncMode::Degraded;
                self.log_failure(Operation::Load, None, &failure);
                warnings.push(SyncWarning::Remote { operation: Operation::Load, failure });
                tracing::info!(count = state.len(), "registry loaded from local cache");
            }
        }
        state.phase = Phase::Ready;

        Outcome { value: state.len(), mode: state.mode, warnings }
    }

    /// Re-list the store and adopt the result.
    ///
    /// The listing is discarded if any mutating intent was in flight when it
    /// started or was issued while it ran, so a slow listing cannot undo a
    /// newer local change.
    pub async fn refresh(&self) -> Result<Outcome<Refresh>, RegistryError> {
        let (started_at, quiet) = {
            let state = self.state.lock().await;
            ensure_ready(&state)?;
            (state.generation, state.pending == 0)
        };

        let listing = self.remote(Operation::Refresh, self.store.list_all()).await;

        let mut state = self.state.lock().await;
        let mut warnings = Vec::new();
        let value = match listing {
            Ok(_) if !quiet || state.generation != started_at => {
                tracing::debug!("listing overlapped a mutation; discarded");
                Refresh::Superseded
            }
            Ok(records) => {
                let local_only: Vec<String> = state
                    .ids()
                    .filter(|id| !records.iter().any(|r| r.id == *id))
                    .map(str::to_string)
                    .collect();
                state.adopt(records);
                state.mode = SyncMode::Synced;
                if !local_only.is_empty() {
                    tracing::warn!(ids = ?local_only, "refresh dropped records absent from the store");
                    warnings.push(SyncWarning::LocalChangesDiscarded { ids: local_only });
                }
                warnings.extend(self.persist(&state).await);
                Refresh::Adopted { count: state.len() }
            }
            Err(failure) => {
                state.mode = SyncMode::Degraded;
                self.log_failure(Operation::Refresh, None, &failure);
                warnings.push(SyncWarning::Remote { operation: Operation::Refresh, failure });
                Refresh::Failed
            }
        };

        Ok(Outcome { value, mode: state.mode, warnings })
    }

    /// Admit a new record.
    ///
    /// Rejected candidates leave the registry untouched. An accepted record
    /// stays in the canonical set even if the store refuses it.
    pub async fn add(&self, draft: NewRecord) -> Result<Outcome<Record>, RegistryError> {
        let key = draft.id.as_deref().map(str::trim).unwrap_or_default().to_string();
        let _guard = self.locks.acquire(&key).await;

        let (record, mut warnings) = {
            let mut state = self.state.lock().await;
            ensure_ready(&state)?;
            let admitted = validate(draft, state.ids())?;
            let record = admitted.into_record(state.next_stamp());
            state.begin_intent();
            state.push(record.clone());
            (record, self.persist(&state).await.into_iter().collect::<Vec<_>>())
        };

        let result = self.remote(Operation::Add, self.store.put(&record)).await.map(drop);
        let mode = self.settle(Operation::Add, &record.id, result, &mut warnings).await;

        Ok(Outcome { value: record, mode, warnings })
    }

    /// Remove a record by id.
    ///
    /// Deleting an id the store does not know is a success; the returned value
    /// is the record removed from the canonical set, if it was there.
    pub async fn delete(&self, id: &str) -> Result<Outcome<Option<Record>>, RegistryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Rejection::MissingField("id").into());
        }
        let _guard = self.locks.acquire(id).await;

        let (removed, mut warnings) = {
            let mut state = self.state.lock().await;
            ensure_ready(&state)?;
            state.begin_intent();
            let removed = state.remove(id);
            let warnings: Vec<SyncWarning> = match removed {
                Some(_) => self.persist(&state).await.into_iter().collect(),
                None => Vec::new(),
            };
            (removed, warnings)
        };

        let result = match self.remote(Operation::Delete, self.store.delete(id)).await {
            Err(StoreFailure::NotFound(_)) => {
                tracing::debug!(id, "store had no such record; delete treated as done");
                Ok(())
            }
            other => other,
        };
        let mode = self.settle(Operation::Delete, id, result, &mut warnings).await;

        Ok(Outcome { value: removed, mode, warnings })
    }

    /// Move a record to a new status.
    ///
    /// The id must be in the canonical set. The store is asked afterwards; a
    /// failure there, including the store not knowing the id, keeps the local
    /// change.
    pub async fn update_status(&self, id: &str, status: Status) -> Result<Outcome<Record>, RegistryError> {
        let id = id.trim();
        let update = FieldUpdate::Status(status);
        let _guard = self.locks.acquire(id).await;

        let (updated, mut warnings) = {
            let mut state = self.state.lock().await;
            ensure_ready(&state)?;
            let current = state.get(id).ok_or_else(|| RegistryError::UnknownRecord(id.to_string()))?;
            let updated = update.apply(current);
            state.begin_intent();
            state.replace(updated.clone());
            (updated, self.persist(&state).await.into_iter().collect::<Vec<_>>())
        };

        let result = self
            .remote(Operation::UpdateStatus, self.store.update_field(id, update))
            .await
            .map(drop);
        let mode = self.settle(Operation::UpdateStatus, id, result, &mut warnings).await;

        Ok(Outcome { value: updated, mode, warnings })
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> RegistryState {
        self.state.lock().await.clone()
    }

    /// Current canonical set.
    pub async fn records(&self) -> Vec<Record> {
        self.state.lock().await.records().to_vec()
    }

    /// Projected copy of the canonical set.
    pub async fn view(&self, params: &ViewParams) -> Vec<Record> {
        let state = self.state.lock().await;
        state.project(params).into_iter().cloned().collect()
    }

    pub async fn mode(&self) -> SyncMode {
        self.state.lock().await.mode
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    async fn remote<T>(&self, operation: Operation, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tracing::debug!(%operation, "calling remote store");
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreFailure::Unreachable(format!("{operation} timed out after {:?}", self.timeout))),
        }
    }

    /// Mirror the canonical set to the local cache.
    async fn persist(&self, state: &RegistryState) -> Option<SyncWarning> {
        match self.cache.save(state.records()).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "local cache save failed");
                Some(SyncWarning::Cache { message: e.to_string() })
            }
        }
    }

    /// Record the remote outcome of a mutating intent.
    async fn settle(
        &self, operation: Operation, id: &str, result: StoreResult<()>, warnings: &mut Vec<SyncWarning>,
    ) -> SyncMode {
        let mode = match result {
            Ok(()) => SyncMode::Synced,
            Err(failure) => {
                self.log_failure(operation, Some(id), &failure);
                warnings.push(SyncWarning::Remote { operation, failure });
                SyncMode::Degraded
            }
        };

        let mut state = self.state.lock().await;
        state.end_intent();
        state.mode = mode;
        mode
    }

    fn log_failure(&self, operation: Operation, id: Option<&str>, failure: &StoreFailure) {
        match failure {
            StoreFailure::Malformed(_) => {
                tracing::error!(%operation, id, error = %failure, "remote store returned a malformed payload")
            }
            _ => tracing::warn!(
                %operation,
                id,
                kind = failure.kind(),
                error = %failure,
                "remote store call failed; keeping local state"
            ),
        }
    }
}

fn ensure_ready(state: &RegistryState) -> Result<(), RegistryError> {
    match state.phase {
        Phase::Ready => Ok(()),
        Phase::Loading => Err(RegistryError::NotReady),
    }
}
