//! Data ingestion and storage
//!
//! CSV loading and cleaning, SQLite storage and CSV export.

pub mod database;
pub mod export;
pub mod loader;

pub use database::Database;
