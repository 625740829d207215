//! # Roster Common Library
//!
//! Volunteer duty-shift scheduling:
//! - Holiday calendar (weekday vs. holiday staffing regime)
//! - Availability resolution and the daily fairness selector
//! - Season driver and payment-tier partitioning
//! - Workload summary
//! - SQLite persistence and the generation service

pub mod availability;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod models;
pub mod payment;
pub mod season;
pub mod seed;
pub mod selector;
pub mod summary;

pub use config::RosterConfig;
pub use error::{Error, Result};
pub use generator::{GenerationReport, ShiftGenerator};
