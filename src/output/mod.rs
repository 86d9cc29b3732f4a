//! Output module for store reports
//!
//! This module handles reading aggregate counts from the store and
//! rendering them for the `stats` task.

pub mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, IndexStatistics};
