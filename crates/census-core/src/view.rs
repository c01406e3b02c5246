//! Typed read models, one struct per query result shape.
//!
//! The store never hands back dynamically-shaped rows; every aggregate
//! query folds into one of these.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::citizen::Gender;

/// A citizen plus the batch-local ids of their relatives — the denormalized
/// shape returned by single-citizen and whole-import reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenView {
  pub citizen_id: i64,
  pub town:       String,
  pub street:     String,
  pub building:   String,
  pub apartment:  i64,
  pub name:       String,
  pub birth_date: NaiveDate,
  pub gender:     Gender,
  /// Batch-local ids of everyone related to this citizen. Unordered set
  /// semantics; the store returns them sorted for determinism.
  pub relatives:  Vec<i64>,
}

/// Per citizen, the birth months (1–12) of each of their relatives, one
/// entry per relative. Citizens with no relatives appear with an empty
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdaysView {
  pub citizen_id:            i64,
  pub relative_birth_months: Vec<u32>,
}

/// Per town, the ages of its citizens. Age is current year minus birth
/// year — a deliberate approximation that ignores month and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownAges {
  pub town: String,
  pub ages: Vec<i64>,
}
