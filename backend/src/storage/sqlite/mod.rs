//! # SQLite Storage Module
//!
//! SQLite-backed implementations of the storage traits.
//!
//! ## Components
//!
//! - **connection.rs** - pool management and schema setup
//! - **account_repository.rs** - account records and status changes
//! - **transaction_repository.rs** - the transaction log and atomic decisions
//!
//! ## Atomic Decisions
//!
//! `apply_decision` runs inside one SQL transaction. The state change is
//! guarded by `state = 'PENDING'` and the balance change by
//! `balance + delta >= 0`; if either guard fails the whole unit rolls back.

pub mod account_repository;
pub mod connection;
pub mod transaction_repository;

pub use account_repository::AccountRepository;
pub use connection::DbConnection;
pub use transaction_repository::TransactionRepository;
