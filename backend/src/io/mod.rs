//! # IO Module
//!
//! Adapter layer between HTTP clients and the ledger domain.
//!
//! Handlers translate `shared` DTOs into domain commands, call the services
//! held in [`AppState`](crate::AppState) and translate results and
//! [`LedgerError`](crate::domain::LedgerError)s back into JSON responses.
//! No business rule lives here.

pub mod rest;

pub use rest::*;
