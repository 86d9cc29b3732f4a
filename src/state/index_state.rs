//! Index state definitions for the per-page indexing state machine
//!
//! ```text
//! pending -> indexing -> indexed | failed
//! indexed -> indexing            (reindex)
//! failed  -> indexing            (retried on a later run)
//! ```
use std::fmt;

/// Represents the indexing state of a crawled page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexState {
    /// Status record exists but the page has not been considered yet
    Pending,

    /// Page is being fetched and its keywords extracted
    Indexing,

    /// Keywords for the page are in the inverted index
    Indexed,

    /// Indexing failed; the reason is kept in the `error` column
    Failed,
}

impl IndexState {
    /// Returns true if the state machine allows moving from `self` to `next`
    ///
    /// `Indexing -> Indexing` is allowed so that a page left mid-indexing by an
    /// interrupted run can be picked up again.
    pub fn can_transition_to(&self, next: IndexState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Indexing)
                | (Self::Indexing, Self::Indexing)
                | (Self::Indexing, Self::Indexed)
                | (Self::Indexing, Self::Failed)
                | (Self::Indexed, Self::Indexing)
                | (Self::Failed, Self::Indexing)
        )
    }

    /// Returns true if the page needs no further work unless reindexing
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Indexed)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Indexing => "indexing",
            Self::Indexed => "indexed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "indexing" => Some(Self::Indexing),
            "indexed" => Some(Self::Indexed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all index states
    pub fn all() -> [Self; 4] {
        [Self::Pending, Self::Indexing, Self::Indexed, Self::Failed]
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
