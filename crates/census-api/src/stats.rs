//! Handlers for the derived-statistics endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/imports/:id/citizens/birthdays` | presents per citizen per month |
//! | `GET` | `/imports/:id/towns/stat/percentile/age` | p50/p75/p99 ages per town |

use std::{
  collections::BTreeMap,
  sync::Arc,
};

use axum::{
  Json,
  extract::{Path, State},
};
use census_core::{
  stats::{self, MonthPresents},
  store::CensusStore,
};
use serde::Serialize;

use crate::{Data, error::ApiError};

// ─── Birthdays ────────────────────────────────────────────────────────────────

/// `GET /imports/:import_id/citizens/birthdays`
///
/// Response data is an object keyed `"1"`–`"12"`; each month lists the
/// citizens with at least one relative born then, with the present count.
pub async fn birthdays<S>(
  State(store): State<Arc<S>>,
  Path(import_id): Path<i64>,
) -> Result<Json<Data<BTreeMap<u32, Vec<MonthPresents>>>>, ApiError>
where
  S: CensusStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .citizen_birthdays(import_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("import {import_id} not found")))?;

  let months = stats::presents_by_month(&rows);
  let data = months
    .into_iter()
    .enumerate()
    .map(|(idx, entries)| (idx as u32 + 1, entries))
    .collect();

  Ok(Json(Data { data }))
}

// ─── Age percentiles ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TownPercentiles {
  pub town: String,
  pub p50:  f64,
  pub p75:  f64,
  pub p99:  f64,
}

/// `GET /imports/:import_id/towns/stat/percentile/age`
pub async fn age_percentiles<S>(
  State(store): State<Arc<S>>,
  Path(import_id): Path<i64>,
) -> Result<Json<Data<Vec<TownPercentiles>>>, ApiError>
where
  S: CensusStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let towns = store
    .town_ages(import_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("import {import_id} not found")))?;

  // A town only appears with at least one citizen, so the percentiles
  // below are always defined.
  let data = towns
    .into_iter()
    .filter_map(|t| {
      let p50 = stats::percentile(&t.ages, 50.0)?;
      let p75 = stats::percentile(&t.ages, 75.0)?;
      let p99 = stats::percentile(&t.ages, 99.0)?;
      Some(TownPercentiles { town: t.town, p50, p75, p99 })
    })
    .collect();

  Ok(Json(Data { data }))
}
