//! Route handlers.

pub mod cves;
pub mod health;
