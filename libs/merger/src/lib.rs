//! Merge engine for event records
//!
//! Pure, total functions that combine two instances of each record type.
//! The right-hand argument wins field by field; repeated collections are
//! joined by identifier and returned in canonical (ascending id) order.
//!
//! ```text
//!   existing ──┐
//!              ├─ merge ──► merged ──┐
//!   partial ───┘                     ├─ merge ──► merged' ...
//!                      delta[0] ─────┘
//! ```
//!
//! # Modules
//! - `merge`: the `Merge` trait, scalar-field rule and per-entity impls
//! - `slices`: ID-keyed merge-join over repeated collections
//! - `validate`: identifier precondition checked before merging records

pub mod merge;
pub mod slices;
pub mod validate;

pub use merge::{merge, merge_event, merge_field, Merge};
pub use slices::merge_keyed;
pub use validate::{try_merge_event, validate_identifiers};
