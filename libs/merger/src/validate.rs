//! Merge preconditions
//!
//! The merge itself is total: it copies the right-hand identifier without
//! looking at the left one. Callers that merge records of the same logical
//! entity check the identifiers first.

use types::errors::MergeError;
use types::event::Event;

use crate::merge::Merge;

/// Both sides must describe the same event.
pub fn validate_identifiers(left: &Event, right: &Event) -> Result<(), MergeError> {
    if left.id != right.id {
        return Err(MergeError::IdentifierMismatch {
            left: left.id.to_string(),
            right: right.id.to_string(),
        });
    }
    Ok(())
}

/// Merge `right` over `left` after checking the identifiers match.
pub fn try_merge_event(left: &Event, right: &Event) -> Result<Event, MergeError> {
    validate_identifiers(left, right)?;
    Ok(left.merge_with(right))
}
