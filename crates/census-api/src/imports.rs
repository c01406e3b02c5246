//! Handlers for `/imports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/imports` | Body: [`ImportBody`]; 201 + new import id |
//! | `GET`  | `/imports/:import_id/citizens` | 404 if the import is unknown |

use std::{
  collections::BTreeSet,
  sync::Arc,
};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use census_core::{
  citizen::NewCitizen,
  import::NewImport,
  store::CensusStore,
  view::CitizenView,
};
use serde::{Deserialize, Serialize};

use crate::{Data, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// One citizen of an upload, with their relative list embedded the way the
/// wire format declares it.
#[derive(Debug, Deserialize)]
pub struct CitizenEntry {
  #[serde(flatten)]
  pub citizen:   NewCitizen,
  #[serde(default)]
  pub relatives: BTreeSet<i64>,
}

/// JSON body accepted by `POST /imports`.
#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub citizens: Vec<CitizenEntry>,
}

impl From<ImportBody> for NewImport {
  fn from(body: ImportBody) -> Self {
    let relatives = body
      .citizens
      .iter()
      .map(|e| (e.citizen.citizen_id, e.relatives.clone()))
      .collect();
    NewImport {
      citizens: body.citizens.into_iter().map(|e| e.citizen).collect(),
      relatives,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ImportCreated {
  pub import_id: i64,
}

/// `POST /imports` — validates the payload (referential integrity and
/// declared-list symmetry), then loads it atomically. Returns 201 +
/// `{"data":{"import_id":N}}`.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ImportBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CensusStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let batch = NewImport::from(body);
  batch.validate()?;

  let import_id = store
    .insert_import(batch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(Data { data: ImportCreated { import_id } })))
}

// ─── List citizens ────────────────────────────────────────────────────────────

/// `GET /imports/:import_id/citizens`
pub async fn citizens<S>(
  State(store): State<Arc<S>>,
  Path(import_id): Path<i64>,
) -> Result<Json<Data<Vec<CitizenView>>>, ApiError>
where
  S: CensusStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let views = store
    .get_import(import_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("import {import_id} not found")))?;
  Ok(Json(Data { data: views }))
}
