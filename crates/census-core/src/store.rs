//! The `CensusStore` trait.
//!
//! Implemented by storage backends (e.g. `census-store-sqlite`). Higher
//! layers (`census-api`, `census-server`) depend on this abstraction, not
//! on any concrete backend.
//!
//! "Not found" is always signalled by absence (`None`, or `false` from the
//! existence predicates), never by a dedicated error variant; error values
//! are reserved for storage failures.

use std::future::Future;

use crate::{
  citizen::CitizenPatch,
  import::NewImport,
  view::{BirthdaysView, CitizenView, TownAges},
};

/// Abstraction over a census import store backend.
///
/// Every multi-statement mutation (`insert_import`, `update_citizen`) runs
/// in one storage transaction; partial writes are never visible.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CensusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Atomically create one import batch with all its citizens and declared
  /// relative edges, returning the new import id.
  ///
  /// Duplicate batch-local citizen ids are dropped first-write-wins, and
  /// relative references that do not resolve within the batch are silently
  /// omitted — run [`NewImport::validate`] first to reject those loudly.
  /// Declared lists are inserted exactly as given; the loader does not
  /// auto-symmetrize.
  fn insert_import(
    &self,
    batch: NewImport,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Apply a partial update to one citizen and, when `patch.relatives` is
  /// set, rewrite their relative set to exactly that target (deleting and
  /// inserting edges in both directions). Returns the refreshed view, or
  /// `None` if `(import_id, citizen_id)` does not exist.
  fn update_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
    patch: CitizenPatch,
  ) -> impl Future<Output = Result<Option<CitizenView>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// One citizen's denormalized view. `None` if not found.
  fn get_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
  ) -> impl Future<Output = Result<Option<CitizenView>, Self::Error>> + Send + '_;

  /// Denormalized views for every citizen in a batch. `None` if the import
  /// itself does not exist.
  fn get_import(
    &self,
    import_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<CitizenView>>, Self::Error>> + Send + '_;

  /// Per citizen, the birth months of their relatives. `None` if the
  /// import does not exist.
  fn citizen_birthdays(
    &self,
    import_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<BirthdaysView>>, Self::Error>> + Send + '_;

  /// Per town, the ages of its citizens. `None` if the import does not
  /// exist.
  fn town_ages(
    &self,
    import_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<TownAges>>, Self::Error>> + Send + '_;

  // ── Existence checks ──────────────────────────────────────────────────

  fn check_import(
    &self,
    import_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn check_citizen(
    &self,
    import_id: i64,
    citizen_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// True only when every id in `relative_ids` names a distinct citizen of
  /// this import: the matching-citizen count must equal the list length,
  /// so duplicated inputs and cross-batch ids always fail.
  fn check_relatives<'a>(
    &'a self,
    import_id: i64,
    relative_ids: &'a [i64],
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
