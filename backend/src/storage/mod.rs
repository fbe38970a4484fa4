//! # Storage Module
//!
//! Handles all data persistence for the savings ledger.
//!
//! The domain layer only sees the traits in `traits.rs`; the SQLite
//! implementation lives in `sqlite/`. Call time-boxing and read retries are
//! in `call_policy.rs`.
//!
//! ## Key Responsibilities
//!
//! - **Accounts**: one record per savings account, holding the balance projection
//! - **Transaction Log**: append-only deposit and withdrawal requests
//! - **Atomic Decisions**: state transition plus balance change as one unit
//! - **Queries**: per-account history, per-group queues and reporting ranges

pub mod call_policy;
#[cfg(test)]
pub(crate) mod scripted;
pub mod sqlite;
pub mod traits;

pub use sqlite::DbConnection;
pub use traits::*;
