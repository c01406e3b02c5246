//! [`SqliteStore`] — the SQLite implementation of [`CensusStore`].

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
  time::Duration,
};

use chrono::{Datelike, Utc};
use rusqlite::OptionalExtension as _;

use census_core::{
  citizen::CitizenPatch,
  import::NewImport,
  store::CensusStore,
  view::{BirthdaysView, CitizenView, TownAges},
};

use crate::{
  Error, Result,
  encode::{
    RawAgeRow, RawCitizenRow, RawMonthRow, encode_date, encode_gender,
    fold_age_rows, fold_citizen_rows, fold_month_rows,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A census store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// access funnels through one dedicated database thread, so concurrent
/// relative edits serialise there; combined with per-call transactions
/// this rules out lost updates between overlapping edge rewrites.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// How long SQLite waits on a locked database before a statement fails.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Shared SQL ──────────────────────────────────────────────────────────────

/// The one join pattern behind every read shape: for each citizen, gather
/// the citizens who declared them as a relative. Under the symmetry
/// invariant that is exactly their relative set.
const CITIZEN_VIEW_SQL: &str = "
  SELECT c.citizen_id, c.town, c.street, c.building, c.apartment,
         c.name, c.birth_date, c.gender,
         c2.citizen_id AS relative
  FROM citizens c
  LEFT JOIN relatives r  ON c.id  = r.relative_id
  LEFT JOIN citizens  c2 ON c2.id = r.citizen_id
  WHERE c.import_id = ?1";

fn import_exists(
  conn: &rusqlite::Connection,
  import_id: i64,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM imports WHERE id = ?1", [import_id], |_| {
        Ok(true)
      })
      .optional()?
      .unwrap_or(false),
  )
}

/// Batch-local citizen id → surrogate id for one import.
fn surrogate_map(
  conn: &rusqlite::Connection,
  import_id: i64,
) -> rusqlite::Result<HashMap<i64, i64>> {
  let mut stmt =
    conn.prepare("SELECT citizen_id, id FROM citizens WHERE import_id = ?1")?;
  let rows =
    stmt.query_map([import_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
  rows.collect()
}

fn citizen_view_rows(
  conn: &rusqlite::Connection,
  import_id: i64,
  citizen_id: Option<i64>,
) -> rusqlite::Result<Vec<RawCitizenRow>> {
  let sql = match citizen_id {
    Some(_) => format!(
      "{CITIZEN_VIEW_SQL} AND c.citizen_id = ?2 ORDER BY c.id, relative"
    ),
    None => format!("{CITIZEN_VIEW_SQL} ORDER BY c.id, relative"),
  };

  let map_row = |row: &rusqlite::Row<'_>| {
    Ok(RawCitizenRow {
      citizen_id: row.get(0)?,
      town:       row.get(1)?,
      street:     row.get(2)?,
      building:   row.get(3)?,
      apartment:  row.get(4)?,
      name:       row.get(5)?,
      birth_date: row.get(6)?,
      gender:     row.get(7)?,
      relative:   row.get(8)?,
    })
  };

  let mut stmt = conn.prepare(&sql)?;
  match citizen_id {
    Some(id) => stmt
      .query_map([import_id, id], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>(),
    None => stmt
      .query_map([import_id], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>(),
  }
}

/// Apply the supplied scalar fields to one citizen row, returning the
/// surrogate id of the updated row, or `None` when `(import_id,
/// citizen_id)` matched nothing.
fn update_scalar_fields(
  conn: &rusqlite::Connection,
  import_id: i64,
  citizen_id: i64,
  patch: &CitizenPatch,
) -> rusqlite::Result<Option<i64>> {
  let mut sets: Vec<&'static str> = Vec::new();
  let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

  if let Some(town) = &patch.town {
    sets.push("town = ?");
    params.push(Box::new(town.clone()));
  }
  if let Some(street) = &patch.street {
    sets.push("street = ?");
    params.push(Box::new(street.clone()));
  }
  if let Some(building) = &patch.building {
    sets.push("building = ?");
    params.push(Box::new(building.clone()));
  }
  if let Some(apartment) = patch.apartment {
    sets.push("apartment = ?");
    params.push(Box::new(apartment));
  }
  if let Some(name) = &patch.name {
    sets.push("name = ?");
    params.push(Box::new(name.clone()));
  }
  if let Some(birth_date) = patch.birth_date {
    sets.push("birth_date = ?");
    params.push(Box::new(encode_date(birth_date)));
  }
  if let Some(gender) = patch.gender {
    sets.push("gender = ?");
    params.push(Box::new(encode_gender(gender)));
  }

  let sql = format!(
    "UPDATE citizens SET {} WHERE import_id = ? AND citizen_id = ? RETURNING id",
    sets.join(", ")
  );
  params.push(Box::new(import_id));
  params.push(Box::new(citizen_id));

  conn
    .query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))
    .optional()
}

/// Rewrite one citizen's relative set to exactly `target`, preserving edge
/// symmetry: deletions remove both directions in one disjunctive DELETE,
/// insertions write both directed rows. Target ids that do not resolve
/// within the import are silently omitted, matching the loader.
fn apply_relative_diff(
  conn: &rusqlite::Connection,
  import_id: i64,
  citizen: i64,
  target: &BTreeSet<i64>,
) -> rusqlite::Result<()> {
  // Current relative set, batch-local id → surrogate id. The join is
  // scoped to the import so a cross-batch edge could never be considered.
  let current: HashMap<i64, i64> = {
    let mut stmt = conn.prepare(
      "SELECT c2.citizen_id, c2.id
       FROM relatives r
       JOIN citizens c2 ON c2.id = r.relative_id
       WHERE r.citizen_id = ?1 AND c2.import_id = ?2",
    )?;
    stmt
      .query_map([citizen, import_id], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<_>>()?
  };

  // deleted = current − target
  {
    let mut stmt = conn.prepare(
      "DELETE FROM relatives
       WHERE (citizen_id = ?1 AND relative_id = ?2)
          OR (citizen_id = ?2 AND relative_id = ?1)",
    )?;
    for (batch_id, surrogate) in &current {
      if !target.contains(batch_id) {
        stmt.execute([citizen, *surrogate])?;
      }
    }
  }

  // added = target − current
  {
    let mut resolve = conn.prepare(
      "SELECT id FROM citizens WHERE import_id = ?1 AND citizen_id = ?2",
    )?;
    let mut insert = conn.prepare(
      "INSERT OR IGNORE INTO relatives (citizen_id, relative_id)
       VALUES (?1, ?2)",
    )?;
    for &batch_id in target {
      if current.contains_key(&batch_id) {
        continue;
      }
      let other: Option<i64> = resolve
        .query_row([import_id, batch_id], |row| row.get(0))
        .optional()?;
      let Some(other) = other else { continue };
      insert.execute([citizen, other])?;
      insert.execute([other, citizen])?;
    }
  }

  Ok(())
}

// ─── CensusStore impl ────────────────────────────────────────────────────────

impl CensusStore for SqliteStore {
  type Error = Error;

  // ── Mutations ─────────────────────────────────────────────────────────

  async fn insert_import(&self, batch: NewImport) -> Result<i64> {
    let import_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute("INSERT INTO imports DEFAULT VALUES", [])?;
        let import_id = tx.last_insert_rowid();

        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO citizens
               (citizen_id, town, street, building, apartment,
                name, birth_date, gender, import_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for c in &batch.citizens {
            stmt.execute(rusqlite::params![
              c.citizen_id,
              c.town,
              c.street,
              c.building,
              c.apartment,
              c.name,
              encode_date(c.birth_date),
              encode_gender(c.gender),
              import_id,
            ])?;
          }
        }

        // Translate the declared batch-local lists into directed surrogate
        // edges. Exactly the declared directions are inserted — callers
        // are trusted to have declared both.
        let surrogates = surrogate_map(&tx, import_id)?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO relatives (citizen_id, relative_id)
             VALUES (?1, ?2)",
          )?;
          for c in &batch.citizens {
            let Some(&from) = surrogates.get(&c.citizen_id) else {
              continue;
            };
            let Some(declared) = batch.relatives.get(&c.citizen_id) else {
              continue;
            };
            for relative in declared {
              // References outside the batch are silently omitted.
              if let Some(&to) = surrogates.get(relative) {
                stmt.execute([from, to])?;
              }
            }
          }
        }

        tx.commit()?;
        Ok(import_id)
      })
      .await?;

    Ok(import_id)
  }

  async fn update_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
    patch: CitizenPatch,
  ) -> Result<Option<CitizenView>> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let surrogate: Option<i64> = if patch.has_scalar_fields() {
          update_scalar_fields(&tx, import_id, citizen_id, &patch)?
        } else {
          tx.query_row(
            "SELECT id FROM citizens WHERE import_id = ?1 AND citizen_id = ?2",
            [import_id, citizen_id],
            |row| row.get(0),
          )
          .optional()?
        };

        let Some(surrogate) = surrogate else {
          return Ok(None);
        };

        if let Some(target) = &patch.relatives {
          apply_relative_diff(&tx, import_id, surrogate, target)?;
        }

        // Read back inside the same transaction so the returned view can
        // never mix in a concurrent writer's changes.
        let rows = citizen_view_rows(&tx, import_id, Some(citizen_id))?;
        tx.commit()?;
        Ok(Some(rows))
      })
      .await?;

    match raw {
      None => Ok(None),
      Some(rows) => Ok(fold_citizen_rows(rows)?.into_iter().next()),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  async fn get_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
  ) -> Result<Option<CitizenView>> {
    let rows = self
      .conn
      .call(move |conn| {
        Ok(citizen_view_rows(conn, import_id, Some(citizen_id))?)
      })
      .await?;

    Ok(fold_citizen_rows(rows)?.into_iter().next())
  }

  async fn get_import(&self, import_id: i64) -> Result<Option<Vec<CitizenView>>> {
    let rows = self
      .conn
      .call(move |conn| {
        if !import_exists(conn, import_id)? {
          return Ok(None);
        }
        Ok(Some(citizen_view_rows(conn, import_id, None)?))
      })
      .await?;

    rows.map(fold_citizen_rows).transpose()
  }

  async fn citizen_birthdays(
    &self,
    import_id: i64,
  ) -> Result<Option<Vec<BirthdaysView>>> {
    let rows = self
      .conn
      .call(move |conn| {
        if !import_exists(conn, import_id)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(
          "SELECT c.citizen_id,
                  CAST(strftime('%m', c2.birth_date) AS INTEGER) AS month
           FROM citizens c
           LEFT JOIN relatives r  ON c.id  = r.relative_id
           LEFT JOIN citizens  c2 ON c2.id = r.citizen_id
           WHERE c.import_id = ?1
           ORDER BY c.id, month",
        )?;
        let rows = stmt
          .query_map([import_id], |row| {
            Ok(RawMonthRow { citizen_id: row.get(0)?, month: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    Ok(rows.map(fold_month_rows))
  }

  async fn town_ages(&self, import_id: i64) -> Result<Option<Vec<TownAges>>> {
    // Age is current year minus birth year, ignoring month and day.
    let year = i64::from(Utc::now().year());

    let rows = self
      .conn
      .call(move |conn| {
        if !import_exists(conn, import_id)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(
          "SELECT c.town,
                  ?2 - CAST(strftime('%Y', c.birth_date) AS INTEGER) AS age
           FROM citizens c
           WHERE c.import_id = ?1
           ORDER BY c.town, c.id",
        )?;
        let rows = stmt
          .query_map([import_id, year], |row| {
            Ok(RawAgeRow { town: row.get(0)?, age: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    Ok(rows.map(fold_age_rows))
  }

  // ── Existence checks ──────────────────────────────────────────────────

  async fn check_import(&self, import_id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| Ok(import_exists(conn, import_id)?))
      .await?;
    Ok(exists)
  }

  async fn check_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
  ) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM citizens
               WHERE import_id = ?1 AND citizen_id = ?2",
              [import_id, citizen_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn check_relatives(
    &self,
    import_id: i64,
    relative_ids: &[i64],
  ) -> Result<bool> {
    if relative_ids.is_empty() {
      return Ok(true);
    }

    let ids = relative_ids.to_vec();
    let expected = ids.len() as i64;

    let count = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
          "SELECT COUNT(*) FROM citizens
           WHERE import_id = ? AND citizen_id IN ({placeholders})"
        );
        let mut params = Vec::with_capacity(ids.len() + 1);
        params.push(import_id);
        params.extend(ids);
        let count: i64 = conn.query_row(
          &sql,
          rusqlite::params_from_iter(params),
          |row| row.get(0),
        )?;
        Ok(count)
      })
      .await?;

    // COUNT collapses duplicates, so a duplicated input id can never reach
    // `expected`, and cross-batch ids never match the import filter.
    Ok(count == expected)
  }
}
