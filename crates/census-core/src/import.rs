//! Import batch input and its payload-level validation.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;

use crate::{Error, Result, citizen::NewCitizen};

/// One upload: a set of citizens plus their declared relative lists, keyed
/// by batch-local citizen id. Citizens missing from `relatives` default to
/// an empty list.
///
/// The loader itself trusts this input (unresolvable references are
/// silently omitted, duplicate ids are dropped first-write-wins);
/// [`NewImport::validate`] is the explicit check callers run beforehand
/// when they want referential violations rejected loudly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewImport {
  pub citizens:  Vec<NewCitizen>,
  #[serde(default)]
  pub relatives: HashMap<i64, BTreeSet<i64>>,
}

impl NewImport {
  /// Reject batches that are empty, reference unknown citizens, or declare
  /// one-sided relationships. Declared relative lists must already be
  /// symmetric — the loader inserts exactly the directed edges declared.
  pub fn validate(&self) -> Result<()> {
    if self.citizens.is_empty() {
      return Err(Error::EmptyImport);
    }

    let known: HashSet<i64> =
      self.citizens.iter().map(|c| c.citizen_id).collect();

    for (&citizen_id, declared) in &self.relatives {
      if !known.contains(&citizen_id) {
        return Err(Error::UnknownCitizen(citizen_id));
      }
      for &relative_id in declared {
        if !known.contains(&relative_id) {
          return Err(Error::UnknownRelative { citizen_id, relative_id });
        }
        let mutual = self
          .relatives
          .get(&relative_id)
          .is_some_and(|back| back.contains(&citizen_id));
        if !mutual {
          return Err(Error::AsymmetricRelative { citizen_id, relative_id });
        }
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::citizen::Gender;

  fn citizen(id: i64) -> NewCitizen {
    NewCitizen {
      citizen_id: id,
      town:       "Springfield".into(),
      street:     "Evergreen Terrace".into(),
      building:   "742".into(),
      apartment:  1,
      name:       format!("Citizen {id}"),
      birth_date: NaiveDate::from_ymd_opt(1980, 3, 17).unwrap(),
      gender:     Gender::Female,
    }
  }

  fn batch(ids: &[i64], relatives: &[(i64, &[i64])]) -> NewImport {
    NewImport {
      citizens:  ids.iter().copied().map(citizen).collect(),
      relatives: relatives
        .iter()
        .map(|(id, rels)| (*id, rels.iter().copied().collect()))
        .collect(),
    }
  }

  #[test]
  fn symmetric_batch_is_valid() {
    let b = batch(&[1, 2, 3], &[(1, &[2, 3]), (2, &[1]), (3, &[1])]);
    assert_eq!(b.validate(), Ok(()));
  }

  #[test]
  fn missing_relative_lists_default_to_empty() {
    let b = batch(&[1, 2], &[]);
    assert_eq!(b.validate(), Ok(()));
  }

  #[test]
  fn empty_batch_is_rejected() {
    let b = batch(&[], &[]);
    assert_eq!(b.validate(), Err(Error::EmptyImport));
  }

  #[test]
  fn unknown_citizen_key_is_rejected() {
    let b = batch(&[1], &[(9, &[1])]);
    assert_eq!(b.validate(), Err(Error::UnknownCitizen(9)));
  }

  #[test]
  fn unknown_relative_is_rejected() {
    let b = batch(&[1, 2], &[(1, &[2, 7]), (2, &[1])]);
    assert_eq!(
      b.validate(),
      Err(Error::UnknownRelative { citizen_id: 1, relative_id: 7 })
    );
  }

  #[test]
  fn one_sided_relationship_is_rejected() {
    let b = batch(&[1, 2], &[(1, &[2])]);
    assert_eq!(
      b.validate(),
      Err(Error::AsymmetricRelative { citizen_id: 1, relative_id: 2 })
    );
  }

  #[test]
  fn self_relationship_is_valid() {
    let b = batch(&[1], &[(1, &[1])]);
    assert_eq!(b.validate(), Ok(()));
  }
}
