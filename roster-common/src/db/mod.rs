//! SQLite persistence: schema, roster, availability, shifts and summary

pub mod availability;
pub mod init;
pub mod members;
pub mod runs;
pub mod schema_sync;
pub mod shifts;
pub mod summary;
pub mod table_schemas;

pub use init::{create_schema, init_database, init_memory_database};
