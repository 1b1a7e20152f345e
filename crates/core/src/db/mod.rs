//! SQLite plumbing shared by the table store and the local cache.
//!
//! A single database file may hold both the authoritative `records` table
//! (server side) and the `local_cache` table (client side); each consumer
//! only touches its own table.

pub mod connection;
pub mod migrations;

pub use connection::Db;
