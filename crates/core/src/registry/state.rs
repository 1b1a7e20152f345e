//! Canonical in-memory view owned by the coordinator.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::Record;
use crate::view::ViewParams;

/// Lifecycle of a registry session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Loading,
    Ready,
}

/// Whether the last operation was confirmed by the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Synced,
    Degraded,
}

/// The canonical set plus the bookkeeping the coordinator needs to
/// reconcile it.
#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    records: Vec<Record>,
    pub(crate) phase: Phase,
    pub(crate) mode: SyncMode,
    /// Bumped once per accepted mutating intent.
    pub(crate) generation: u64,
    /// Mutating intents applied locally whose remote call has not settled.
    pub(crate) pending: usize,
    last_stamp: Option<DateTime<Utc>>,
}

impl RegistryState {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// Project the canonical set for display.
    pub fn project(&self, params: &ViewParams) -> Vec<&Record> {
        params.apply(&self.records)
    }

    pub(crate) fn begin_intent(&mut self) {
        self.generation += 1;
        self.pending += 1;
    }

    pub(crate) fn end_intent(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// Replace the canonical set wholesale.
    ///
    /// Records without an id or description and repeated ids are dropped so
    /// the set invariants hold whatever the source delivered. Returns the
    /// number of records dropped.
    pub(crate) fn adopt(&mut self, incoming: Vec<Record>) -> usize {
        let total = incoming.len();
        let mut seen = HashSet::new();
        self.records = incoming
            .into_iter()
            .filter(|r| !r.id.trim().is_empty() && !r.description.trim().is_empty())
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        if let Some(latest) = self.records.iter().map(|r| r.date_added).max() {
            self.last_stamp = self.last_stamp.max(Some(latest));
        }
        total - self.records.len()
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Record> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub(crate) fn replace(&mut self, record: Record) -> bool {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Next `dateAdded` value, strictly later than any stamp seen so far.
    pub(crate) fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(prev) if prev >= now => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}
