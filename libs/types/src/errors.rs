//! Error types shared by the merge engine and the update service
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Precondition violations detected before two records are merged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("identifier mismatch: left {left}, right {right}")]
    IdentifierMismatch { left: String, right: String },
}

/// Rejections of a caller-supplied partial update
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event id must not be empty")]
    EmptyEventId,

    #[error("market id must not be empty in event {event_id}")]
    EmptyMarketId { event_id: String },

    #[error("duplicate market {market_id} in event {event_id}")]
    DuplicateMarket { event_id: String, market_id: String },

    #[error("duplicate selection {selection_id} in market {market_id}")]
    DuplicateSelection {
        market_id: String,
        selection_id: String,
    },

    #[error("no filter specified")]
    NoFilter,

    #[error("start date cannot be after end date")]
    InvertedDateRange,

    #[error(transparent)]
    Merge(#[from] MergeError),
}
