//! Citizen input and update types.
//!
//! A citizen is addressed by callers through the pair
//! `(import_id, citizen_id)` — the batch-local `citizen_id` is unique only
//! within one import. The storage-internal surrogate key never appears in
//! these types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Gender as recorded in the census upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

/// One citizen row as supplied to the import loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCitizen {
  /// Batch-local identifier; unique per import, not globally.
  pub citizen_id: i64,
  pub town:       String,
  pub street:     String,
  pub building:   String,
  pub apartment:  i64,
  pub name:       String,
  pub birth_date: NaiveDate,
  pub gender:     Gender,
}

/// A partial update to one citizen. Absent fields keep their stored value.
///
/// `relatives` is the citizen's *final desired* relative set, not a delta.
/// Leaving it `None` leaves the relatives graph untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitizenPatch {
  pub town:       Option<String>,
  pub street:     Option<String>,
  pub building:   Option<String>,
  pub apartment:  Option<i64>,
  pub name:       Option<String>,
  pub birth_date: Option<NaiveDate>,
  pub gender:     Option<Gender>,
  pub relatives:  Option<BTreeSet<i64>>,
}

impl CitizenPatch {
  /// True when at least one scalar column would be written.
  pub fn has_scalar_fields(&self) -> bool {
    self.town.is_some()
      || self.street.is_some()
      || self.building.is_some()
      || self.apartment.is_some()
      || self.name.is_some()
      || self.birth_date.is_some()
      || self.gender.is_some()
  }

  /// True when the patch would change nothing at all.
  pub fn is_empty(&self) -> bool {
    !self.has_scalar_fields() && self.relatives.is_none()
  }
}
