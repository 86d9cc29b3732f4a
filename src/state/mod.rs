//! State module for tracking crawl and index progress
//!
//! # Components
//!
//! - `UrlStatus`: crawl status of a URL (pending, processed)
//! - `IndexState`: per-page indexing state machine (pending, indexing, indexed, failed)

mod index_state;
mod url_status;

pub use index_state::IndexState;
pub use url_status::UrlStatus;
