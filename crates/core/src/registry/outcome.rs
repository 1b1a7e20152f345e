//! What a caller gets back from an intent.

use std::fmt;

use super::state::SyncMode;
use crate::store::StoreFailure;

/// The intent a warning belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Refresh,
    Add,
    Delete,
    UpdateStatus,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Load => "load",
            Operation::Refresh => "refresh",
            Operation::Add => "add",
            Operation::Delete => "delete",
            Operation::UpdateStatus => "update_status",
        })
    }
}

/// A non-fatal problem the display layer should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWarning {
    /// The remote store did not confirm the operation; the local change stands.
    Remote { operation: Operation, failure: StoreFailure },

    /// The local cache could not be written and now lags the canonical set.
    Cache { message: String },

    /// A refresh replaced records that only existed locally.
    LocalChangesDiscarded { ids: Vec<String> },
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWarning::Remote { operation: Operation::Load, failure } => {
                write!(f, "could not load records from the store ({failure}); showing the local cache")
            }
            SyncWarning::Remote { operation: Operation::Refresh, failure } => {
                write!(f, "could not refresh records from the store ({failure}); keeping the current view")
            }
            SyncWarning::Remote { operation, failure } => {
                write!(f, "{operation} was not saved to the store ({failure}); the change is applied locally only")
            }
            SyncWarning::Cache { message } => write!(f, "local cache not updated: {message}"),
            SyncWarning::LocalChangesDiscarded { ids } => {
                write!(f, "records missing from the store were dropped: {}", ids.join(", "))
            }
        }
    }
}

/// Result of an accepted intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub mode: SyncMode,
    pub warnings: Vec<SyncWarning>,
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        self.mode == SyncMode::Degraded
    }
}

/// What a refresh did with the listing it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The listing replaced the canonical set.
    Adopted { count: usize },
    /// A mutation overlapped the listing, which was discarded.
    Superseded,
    /// The store could not be listed.
    Failed,
}
