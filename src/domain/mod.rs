//! Core domain types and logic.

pub mod aggregate;
pub mod company_stats;
pub mod config_validation;
pub mod country_code;
pub mod country_stats;
pub mod directory;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod map_summary;
pub mod transaction;
