//! Pure statistics helpers computed over store aggregates.
//!
//! The store returns raw value lists ([`TownAges`](crate::view::TownAges),
//! [`BirthdaysView`]); the reductions below are kept out of SQL so their
//! exact semantics are pinned down in one place.

use serde::Serialize;

use crate::view::BirthdaysView;

/// The `p`-th percentile of `values` (0–100), using linear interpolation
/// between closest ranks — the same convention as numpy's default.
///
/// Returns `None` for an empty slice or a `p` outside `[0, 100]`.
pub fn percentile(values: &[i64], p: f64) -> Option<f64> {
  if values.is_empty() || !(0.0..=100.0).contains(&p) {
    return None;
  }

  let mut sorted = values.to_vec();
  sorted.sort_unstable();

  let rank = p / 100.0 * (sorted.len() - 1) as f64;
  let lo = rank.floor() as usize;
  let hi = rank.ceil() as usize;
  let frac = rank - lo as f64;

  Some(sorted[lo] as f64 + (sorted[hi] - sorted[lo]) as f64 * frac)
}

/// How many presents one citizen buys in one month — i.e. how many of
/// their relatives celebrate a birthday then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthPresents {
  pub citizen_id: i64,
  pub presents:   u32,
}

/// Fold per-citizen relative birth months into twelve monthly buckets
/// (index 0 = January). A citizen appears in a bucket only when at least
/// one of their relatives has a birthday that month.
pub fn presents_by_month(rows: &[BirthdaysView]) -> [Vec<MonthPresents>; 12] {
  let mut months: [Vec<MonthPresents>; 12] =
    std::array::from_fn(|_| Vec::new());

  for row in rows {
    let mut counts = [0u32; 12];
    for &month in &row.relative_birth_months {
      if (1..=12).contains(&month) {
        counts[(month - 1) as usize] += 1;
      }
    }
    for (idx, &presents) in counts.iter().enumerate() {
      if presents > 0 {
        months[idx].push(MonthPresents { citizen_id: row.citizen_id, presents });
      }
    }
  }

  months
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percentile_interpolates_between_ranks() {
    let ages = [1, 2, 3, 4];
    assert_eq!(percentile(&ages, 50.0), Some(2.5));
    assert_eq!(percentile(&ages, 0.0), Some(1.0));
    assert_eq!(percentile(&ages, 100.0), Some(4.0));
  }

  #[test]
  fn percentile_is_order_independent() {
    assert_eq!(percentile(&[30, 10, 20], 50.0), Some(20.0));
  }

  #[test]
  fn percentile_of_single_value_is_that_value() {
    assert_eq!(percentile(&[42], 99.0), Some(42.0));
  }

  #[test]
  fn percentile_rejects_empty_and_out_of_range() {
    assert_eq!(percentile(&[], 50.0), None);
    assert_eq!(percentile(&[1], -1.0), None);
    assert_eq!(percentile(&[1], 100.5), None);
  }

  #[test]
  fn presents_counted_per_citizen_per_month() {
    let rows = [
      BirthdaysView { citizen_id: 1, relative_birth_months: vec![3, 3, 12] },
      BirthdaysView { citizen_id: 2, relative_birth_months: vec![3] },
      BirthdaysView { citizen_id: 3, relative_birth_months: vec![] },
    ];

    let months = presents_by_month(&rows);

    assert_eq!(months[2], vec![
      MonthPresents { citizen_id: 1, presents: 2 },
      MonthPresents { citizen_id: 2, presents: 1 },
    ]);
    assert_eq!(months[11], vec![MonthPresents {
      citizen_id: 1,
      presents:   1,
    }]);
    // Citizen 3 has no relatives and appears in no bucket.
    assert!(months.iter().all(|m| m.iter().all(|e| e.citizen_id != 3)));
  }
}
