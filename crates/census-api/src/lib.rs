//! JSON REST API for the census import store.
//!
//! Exposes an axum [`Router`] backed by any [`census_core::store::CensusStore`].
//! This layer is thin glue: handlers translate JSON bodies and path params
//! into store calls, run the explicit validation checks, and map absence
//! to 404. TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(census_api::api_router(store.clone()))
//! ```

pub mod citizens;
pub mod error;
pub mod imports;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use census_core::store::CensusStore;
use serde::Serialize;

pub use error::ApiError;

/// Envelope every success response is wrapped in: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub data: T,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CensusStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Imports
    .route("/imports", post(imports::create::<S>))
    .route("/imports/{import_id}/citizens", get(imports::citizens::<S>))
    // Citizens
    .route(
      "/imports/{import_id}/citizens/{citizen_id}",
      patch(citizens::update::<S>),
    )
    // Statistics
    .route(
      "/imports/{import_id}/citizens/birthdays",
      get(stats::birthdays::<S>),
    )
    .route(
      "/imports/{import_id}/towns/stat/percentile/age",
      get(stats::age_percentiles::<S>),
    )
    .with_state(store)
}
