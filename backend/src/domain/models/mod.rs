pub mod account;
pub mod actor;
pub mod period;
pub mod transaction;
