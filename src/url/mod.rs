//! URL handling module for Trawl
//!
//! This module provides URL normalization, host comparison and blacklist
//! matching. Canonical URLs produced here are the deduplication key for the
//! whole system.

mod blacklist;
mod host;
mod normalize;

pub use blacklist::Blacklist;
pub use host::{extract_host, same_site};
pub use normalize::{canonicalize, normalize_url};
