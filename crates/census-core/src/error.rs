//! Error types for `census-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("import contains no citizens")]
  EmptyImport,

  #[error("relative list given for unknown citizen {0}")]
  UnknownCitizen(i64),

  #[error("citizen {citizen_id} declares unknown relative {relative_id}")]
  UnknownRelative { citizen_id: i64, relative_id: i64 },

  #[error(
    "citizen {citizen_id} declares relative {relative_id}, but not the reverse"
  )]
  AsymmetricRelative { citizen_id: i64, relative_id: i64 },

  #[error("update contains no fields")]
  EmptyPatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
