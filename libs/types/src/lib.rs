//! Types library for the event merge service
//!
//! Record types shared by the merge engine, the transform pipeline and the
//! storage layer.
//!
//! # Modules
//! - `ids`: String identifiers (EventId, MarketId, SelectionId) and the `Keyed` trait
//! - `optional`: Present/tombstoned scalar field wrapper
//! - `event`: Event, Market, Selection, SportData, RaceData and their enums
//! - `errors`: Error taxonomy

pub mod ids;
pub mod optional;
pub mod event;
pub mod errors;
