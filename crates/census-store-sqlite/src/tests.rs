//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use census_core::{
  citizen::{CitizenPatch, Gender, NewCitizen},
  import::NewImport,
  store::CensusStore,
};
use chrono::{Datelike, NaiveDate, Utc};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn citizen(id: i64, name: &str, birth: (i32, u32, u32)) -> NewCitizen {
  NewCitizen {
    citizen_id: id,
    town:       "Springfield".into(),
    street:     "Evergreen Terrace".into(),
    building:   "742".into(),
    apartment:  id,
    name:       name.into(),
    birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2).unwrap(),
    gender:     Gender::Female,
  }
}

fn batch(citizens: Vec<NewCitizen>, relatives: &[(i64, &[i64])]) -> NewImport {
  NewImport {
    citizens,
    relatives: relatives
      .iter()
      .map(|(id, rels)| (*id, rels.iter().copied().collect()))
      .collect(),
  }
}

/// The Alice/Bob/Carol batch: 1↔2, 1↔3.
async fn family_import(s: &SqliteStore) -> i64 {
  s.insert_import(batch(
    vec![
      citizen(1, "Alice", (1986, 3, 14)),
      citizen(2, "Bob", (1997, 12, 2)),
      citizen(3, "Carol", (1960, 3, 1)),
    ],
    &[(1, &[2, 3]), (2, &[1]), (3, &[1])],
  ))
  .await
  .unwrap()
}

fn relatives(patch: &[i64]) -> CitizenPatch {
  CitizenPatch {
    relatives: Some(patch.iter().copied().collect::<BTreeSet<i64>>()),
    ..CitizenPatch::default()
  }
}

async fn relative_ids(s: &SqliteStore, import_id: i64, citizen_id: i64) -> Vec<i64> {
  s.get_citizen(import_id, citizen_id)
    .await
    .unwrap()
    .expect("citizen exists")
    .relatives
}

// ─── Import loader ───────────────────────────────────────────────────────────

#[tokio::test]
async fn import_round_trip() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let views = s.get_import(import_id).await.unwrap().unwrap();
  assert_eq!(views.len(), 3);

  let alice = views.iter().find(|v| v.citizen_id == 1).unwrap();
  assert_eq!(alice.name, "Alice");
  assert_eq!(alice.birth_date, NaiveDate::from_ymd_opt(1986, 3, 14).unwrap());
  assert_eq!(alice.relatives, vec![2, 3]);

  assert_eq!(relative_ids(&s, import_id, 2).await, vec![1]);
  assert_eq!(relative_ids(&s, import_id, 3).await, vec![1]);
}

#[tokio::test]
async fn get_import_missing_returns_none() {
  let s = store().await;
  assert!(s.get_import(42).await.unwrap().is_none());
}

#[tokio::test]
async fn get_citizen_missing_returns_none() {
  let s = store().await;
  let import_id = family_import(&s).await;
  assert!(s.get_citizen(import_id, 99).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_batch_local_id_first_wins() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(
      vec![
        citizen(1, "First", (1980, 1, 1)),
        citizen(1, "Second", (1990, 6, 6)),
      ],
      &[],
    ))
    .await
    .unwrap();

  let views = s.get_import(import_id).await.unwrap().unwrap();
  assert_eq!(views.len(), 1);
  assert_eq!(views[0].name, "First");
}

#[tokio::test]
async fn dangling_relative_reference_is_omitted() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(
      vec![citizen(1, "Alice", (1986, 3, 14)), citizen(2, "Bob", (1997, 12, 2))],
      &[(1, &[2, 99]), (2, &[1])],
    ))
    .await
    .unwrap();

  assert_eq!(relative_ids(&s, import_id, 1).await, vec![2]);
}

#[tokio::test]
async fn loader_trusts_caller_symmetry() {
  // Only 1→2 declared: the loader inserts exactly that directed edge, so
  // the read view (which gathers declarers) is one-sided.
  let s = store().await;
  let import_id = s
    .insert_import(batch(
      vec![citizen(1, "Alice", (1986, 3, 14)), citizen(2, "Bob", (1997, 12, 2))],
      &[(1, &[2])],
    ))
    .await
    .unwrap();

  assert_eq!(relative_ids(&s, import_id, 1).await, Vec::<i64>::new());
  assert_eq!(relative_ids(&s, import_id, 2).await, vec![1]);
}

#[tokio::test]
async fn imports_get_distinct_ids() {
  let s = store().await;
  let a = family_import(&s).await;
  let b = family_import(&s).await;
  assert_ne!(a, b);
}

// ─── Relative graph editor ───────────────────────────────────────────────────

#[tokio::test]
async fn example_scenario_shrinking_alices_relatives() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let view = s
    .update_citizen(import_id, 1, relatives(&[2]))
    .await
    .unwrap()
    .unwrap();

  assert_eq!(view.relatives, vec![2]);
  assert_eq!(relative_ids(&s, import_id, 2).await, vec![1]);
  assert_eq!(relative_ids(&s, import_id, 3).await, Vec::<i64>::new());
}

#[tokio::test]
async fn diff_touches_only_changed_edges() {
  // current {2,3} → target {3,4}: 2 deleted, 4 added, 3 untouched, in
  // both directions.
  let s = store().await;
  let import_id = s
    .insert_import(batch(
      vec![
        citizen(1, "A", (1980, 1, 1)),
        citizen(2, "B", (1981, 2, 2)),
        citizen(3, "C", (1982, 3, 3)),
        citizen(4, "D", (1983, 4, 4)),
      ],
      &[(1, &[2, 3]), (2, &[1]), (3, &[1])],
    ))
    .await
    .unwrap();

  let view = s
    .update_citizen(import_id, 1, relatives(&[3, 4]))
    .await
    .unwrap()
    .unwrap();

  assert_eq!(view.relatives, vec![3, 4]);
  assert_eq!(relative_ids(&s, import_id, 2).await, Vec::<i64>::new());
  assert_eq!(relative_ids(&s, import_id, 3).await, vec![1]);
  assert_eq!(relative_ids(&s, import_id, 4).await, vec![1]);
}

#[tokio::test]
async fn editor_inserts_both_directions() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(
      vec![citizen(1, "A", (1980, 1, 1)), citizen(2, "B", (1981, 2, 2))],
      &[],
    ))
    .await
    .unwrap();

  s.update_citizen(import_id, 1, relatives(&[2]))
    .await
    .unwrap()
    .unwrap();

  // Symmetric: each side sees the other.
  assert_eq!(relative_ids(&s, import_id, 1).await, vec![2]);
  assert_eq!(relative_ids(&s, import_id, 2).await, vec![1]);
}

#[tokio::test]
async fn editor_is_idempotent_on_current_set() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let before = s.get_import(import_id).await.unwrap().unwrap();
  let view = s
    .update_citizen(import_id, 1, relatives(&[2, 3]))
    .await
    .unwrap()
    .unwrap();
  let after = s.get_import(import_id).await.unwrap().unwrap();

  assert_eq!(view.relatives, vec![2, 3]);
  assert_eq!(before, after);
}

#[tokio::test]
async fn editor_can_clear_all_relatives() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let view = s
    .update_citizen(import_id, 1, relatives(&[]))
    .await
    .unwrap()
    .unwrap();

  assert_eq!(view.relatives, Vec::<i64>::new());
  assert_eq!(relative_ids(&s, import_id, 2).await, Vec::<i64>::new());
  assert_eq!(relative_ids(&s, import_id, 3).await, Vec::<i64>::new());
}

#[tokio::test]
async fn editor_supports_self_relationship() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(vec![citizen(1, "A", (1980, 1, 1))], &[]))
    .await
    .unwrap();

  let view = s
    .update_citizen(import_id, 1, relatives(&[1]))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.relatives, vec![1]);

  let view = s
    .update_citizen(import_id, 1, relatives(&[]))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.relatives, Vec::<i64>::new());
}

#[tokio::test]
async fn unresolvable_target_id_is_omitted() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(vec![citizen(1, "A", (1980, 1, 1))], &[]))
    .await
    .unwrap();

  let view = s
    .update_citizen(import_id, 1, relatives(&[5]))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(view.relatives, Vec::<i64>::new());
}

// ─── Citizen updater ─────────────────────────────────────────────────────────

#[tokio::test]
async fn scalar_update_leaves_graph_untouched() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let patch = CitizenPatch {
    town: Some("Shelbyville".into()),
    name: Some("Alice B.".into()),
    ..CitizenPatch::default()
  };
  let view = s
    .update_citizen(import_id, 1, patch)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(view.town, "Shelbyville");
  assert_eq!(view.name, "Alice B.");
  // Untouched fields and relatives survive.
  assert_eq!(view.street, "Evergreen Terrace");
  assert_eq!(view.relatives, vec![2, 3]);
}

#[tokio::test]
async fn update_all_scalar_fields() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let patch = CitizenPatch {
    town:       Some("Ogdenville".into()),
    street:     Some("Main St".into()),
    building:   Some("1a".into()),
    apartment:  Some(17),
    name:       Some("Alicia".into()),
    birth_date: NaiveDate::from_ymd_opt(1987, 4, 15),
    gender:     Some(Gender::Male),
    relatives:  None,
  };
  let view = s
    .update_citizen(import_id, 1, patch)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(view.town, "Ogdenville");
  assert_eq!(view.street, "Main St");
  assert_eq!(view.building, "1a");
  assert_eq!(view.apartment, 17);
  assert_eq!(view.name, "Alicia");
  assert_eq!(view.birth_date, NaiveDate::from_ymd_opt(1987, 4, 15).unwrap());
  assert_eq!(view.gender, Gender::Male);
}

#[tokio::test]
async fn update_missing_citizen_returns_none() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let result = s
    .update_citizen(import_id, 99, relatives(&[1]))
    .await
    .unwrap();
  assert!(result.is_none());

  let result = s
    .update_citizen(import_id + 1, 1, relatives(&[1]))
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Cross-batch scoping ─────────────────────────────────────────────────────

#[tokio::test]
async fn batches_never_leak_into_each_other() {
  let s = store().await;
  let first = family_import(&s).await;
  let second = s
    .insert_import(batch(
      vec![citizen(1, "Other Alice", (1970, 7, 7)), citizen(2, "Other Bob", (1971, 8, 8))],
      &[],
    ))
    .await
    .unwrap();

  // Editing in the second batch resolves ids within that batch only.
  s.update_citizen(second, 1, relatives(&[2]))
    .await
    .unwrap()
    .unwrap();

  // First batch is unchanged, numerically identical ids notwithstanding.
  assert_eq!(relative_ids(&s, first, 1).await, vec![2, 3]);
  assert_eq!(relative_ids(&s, first, 2).await, vec![1]);
  assert_eq!(relative_ids(&s, second, 2).await, vec![1]);

  // check_relatives is scoped the same way: 3 exists only in the first.
  assert!(s.check_relatives(first, &[3]).await.unwrap());
  assert!(!s.check_relatives(second, &[3]).await.unwrap());
}

// ─── Existence checks ────────────────────────────────────────────────────────

#[tokio::test]
async fn check_import_and_citizen() {
  let s = store().await;
  let import_id = family_import(&s).await;

  assert!(s.check_import(import_id).await.unwrap());
  assert!(!s.check_import(import_id + 1).await.unwrap());

  assert!(s.check_citizen(import_id, 2).await.unwrap());
  assert!(!s.check_citizen(import_id, 99).await.unwrap());
  assert!(!s.check_citizen(import_id + 1, 2).await.unwrap());
}

#[tokio::test]
async fn check_relatives_counts_distinct_matches() {
  let s = store().await;
  let import_id = family_import(&s).await;

  assert!(s.check_relatives(import_id, &[1, 2, 3]).await.unwrap());
  assert!(s.check_relatives(import_id, &[]).await.unwrap());
  // Unknown id.
  assert!(!s.check_relatives(import_id, &[1, 42]).await.unwrap());
  // Duplicates can never reach the expected count.
  assert!(!s.check_relatives(import_id, &[1, 1]).await.unwrap());
}

// ─── Aggregations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn birthdays_aggregate_relative_birth_months() {
  let s = store().await;
  let import_id = family_import(&s).await;

  let views = s.citizen_birthdays(import_id).await.unwrap().unwrap();
  assert_eq!(views.len(), 3);

  // Alice's relatives: Bob (December) and Carol (March).
  let alice = views.iter().find(|v| v.citizen_id == 1).unwrap();
  assert_eq!(alice.relative_birth_months, vec![3, 12]);

  // Bob's only relative is Alice (March).
  let bob = views.iter().find(|v| v.citizen_id == 2).unwrap();
  assert_eq!(bob.relative_birth_months, vec![3]);
}

#[tokio::test]
async fn birthdays_include_citizens_without_relatives() {
  let s = store().await;
  let import_id = s
    .insert_import(batch(vec![citizen(1, "Loner", (1990, 5, 5))], &[]))
    .await
    .unwrap();

  let views = s.citizen_birthdays(import_id).await.unwrap().unwrap();
  assert_eq!(views, vec![census_core::view::BirthdaysView {
    citizen_id:            1,
    relative_birth_months: vec![],
  }]);
}

#[tokio::test]
async fn birthdays_missing_import_returns_none() {
  let s = store().await;
  assert!(s.citizen_birthdays(7).await.unwrap().is_none());
}

#[tokio::test]
async fn town_ages_group_by_town() {
  let s = store().await;

  let mut shelbyville = citizen(3, "Sid", (2000, 11, 30));
  shelbyville.town = "Shelbyville".into();
  let import_id = s
    .insert_import(batch(
      vec![
        citizen(1, "Alice", (1986, 3, 14)),
        citizen(2, "Bob", (1997, 12, 2)),
        shelbyville,
      ],
      &[],
    ))
    .await
    .unwrap();

  let year = i64::from(Utc::now().year());
  let towns = s.town_ages(import_id).await.unwrap().unwrap();

  assert_eq!(towns.len(), 2);
  let shelbyville = towns.iter().find(|t| t.town == "Shelbyville").unwrap();
  assert_eq!(shelbyville.ages, vec![year - 2000]);
  let springfield = towns.iter().find(|t| t.town == "Springfield").unwrap();
  assert_eq!(springfield.ages, vec![year - 1986, year - 1997]);
}

#[tokio::test]
async fn town_ages_missing_import_returns_none() {
  let s = store().await;
  assert!(s.town_ages(7).await.unwrap().is_none());
}
