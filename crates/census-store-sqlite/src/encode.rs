//! Encoding and decoding helpers between Rust domain types and the plain
//! column values stored in SQLite, plus the raw row structs that aggregate
//! queries fold into typed views.
//!
//! Dates are stored as `YYYY-MM-DD` strings; gender as lowercase text.

use census_core::{
  citizen::Gender,
  view::{BirthdaysView, CitizenView, TownAges},
};
use chrono::NaiveDate;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str {
  match g {
    Gender::Male => "male",
    Gender::Female => "female",
  }
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  match s {
    "male" => Ok(Gender::Male),
    "female" => Ok(Gender::Female),
    other => Err(Error::UnknownGender(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// One row of the citizen/relatives LEFT JOIN, ordered by surrogate id.
/// `relative` is `NULL` exactly once for a citizen with no relatives; the
/// fold below filters that placeholder out.
pub struct RawCitizenRow {
  pub citizen_id: i64,
  pub town:       String,
  pub street:     String,
  pub building:   String,
  pub apartment:  i64,
  pub name:       String,
  pub birth_date: String,
  pub gender:     String,
  pub relative:   Option<i64>,
}

/// Fold join rows into one [`CitizenView`] per citizen. Rows must be
/// grouped by citizen (the queries order by surrogate id).
pub fn fold_citizen_rows(rows: Vec<RawCitizenRow>) -> Result<Vec<CitizenView>> {
  let mut views: Vec<CitizenView> = Vec::new();

  for row in rows {
    match views.last_mut() {
      Some(view) if view.citizen_id == row.citizen_id => {
        if let Some(relative) = row.relative {
          view.relatives.push(relative);
        }
      }
      _ => {
        views.push(CitizenView {
          citizen_id: row.citizen_id,
          town:       row.town,
          street:     row.street,
          building:   row.building,
          apartment:  row.apartment,
          name:       row.name,
          birth_date: decode_date(&row.birth_date)?,
          gender:     decode_gender(&row.gender)?,
          relatives:  row.relative.into_iter().collect(),
        });
      }
    }
  }

  Ok(views)
}

/// One row of the birthdays join: a citizen plus one relative's birth
/// month, or `NULL` for the no-relatives placeholder.
pub struct RawMonthRow {
  pub citizen_id: i64,
  pub month:      Option<i64>,
}

pub fn fold_month_rows(rows: Vec<RawMonthRow>) -> Vec<BirthdaysView> {
  let mut views: Vec<BirthdaysView> = Vec::new();

  for row in rows {
    match views.last_mut() {
      Some(view) if view.citizen_id == row.citizen_id => {
        if let Some(month) = row.month {
          view.relative_birth_months.push(month as u32);
        }
      }
      _ => {
        views.push(BirthdaysView {
          citizen_id:            row.citizen_id,
          relative_birth_months: row.month.into_iter().map(|m| m as u32).collect(),
        });
      }
    }
  }

  views
}

/// One citizen's town and approximate age, ordered by town.
pub struct RawAgeRow {
  pub town: String,
  pub age:  i64,
}

pub fn fold_age_rows(rows: Vec<RawAgeRow>) -> Vec<TownAges> {
  let mut views: Vec<TownAges> = Vec::new();

  for row in rows {
    match views.last_mut() {
      Some(view) if view.town == row.town => view.ages.push(row.age),
      _ => views.push(TownAges { town: row.town, ages: vec![row.age] }),
    }
  }

  views
}
