//! Handler for `PATCH /imports/:import_id/citizens/:citizen_id`.
//!
//! The body is a partial update; a `relatives` array, when present, is the
//! citizen's final desired relative set and is pre-checked against the
//! import before the store rewrites the graph.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use census_core::{
  citizen::CitizenPatch,
  store::CensusStore,
  view::CitizenView,
};

use crate::{Data, error::ApiError};

/// `PATCH /imports/:import_id/citizens/:citizen_id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path((import_id, citizen_id)): Path<(i64, i64)>,
  Json(patch): Json<CitizenPatch>,
) -> Result<Json<Data<CitizenView>>, ApiError>
where
  S: CensusStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if patch.is_empty() {
    return Err(census_core::Error::EmptyPatch.into());
  }

  // Referential check before mutating: every target id must name a
  // distinct citizen of this import.
  if let Some(target) = &patch.relatives {
    let ids: Vec<i64> = target.iter().copied().collect();
    let ok = store
      .check_relatives(import_id, &ids)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    if !ok {
      return Err(ApiError::BadRequest(format!(
        "relatives reference citizens outside import {import_id}"
      )));
    }
  }

  let view = store
    .update_citizen(import_id, citizen_id, patch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "citizen {citizen_id} not found in import {import_id}"
      ))
    })?;

  Ok(Json(Data { data: view }))
}
