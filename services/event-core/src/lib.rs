//! Event update service
//!
//! Loads the stored record for a partial update, merges the update in,
//! runs the derivation pipeline over the result and persists it.
//!
//! # Modules
//! - `service`: update orchestration and read paths
//! - `transforms`: derivation passes (sport name, race jurisdiction, market close)
//! - `store`: `EventStore` trait with in-memory and journal backends
//! - `projection`: sport and race views
//! - `http`: axum router and handlers
//! - `config`, `telemetry`: environment configuration and logging setup

pub mod config;
pub mod error;
pub mod http;
pub mod projection;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod transforms;
pub mod validation;

pub use error::CoreError;
pub use service::{EventService, SearchRequest, UpdateResponse};
