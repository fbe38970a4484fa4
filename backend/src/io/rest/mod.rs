//! # REST API Interface Layer
//!
//! HTTP JSON endpoints for the savings ledger.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: one handler per route, grouped by resource
//! - **Identity**: the caller's [`Actor`](crate::domain::models::actor::Actor)
//!   is extracted from the `x-actor-id` / `x-actor-role` headers
//! - **Error Handling**: ledger errors become status codes with a JSON
//!   [`ErrorResponse`](shared::ErrorResponse) body
//! - **Logging**: every request is logged on entry, every failure on exit

pub mod account_apis;
pub mod approval_apis;
pub mod errors;
pub mod identity;
pub mod mappers;
pub mod report_apis;
pub mod transaction_apis;

pub use account_apis::*;
pub use approval_apis::*;
pub use report_apis::*;
pub use transaction_apis::*;
