//! Server configuration, deserialised from `config.toml` and `CENSUS_*`
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,

  #[serde(default = "default_port")]
  pub port: u16,

  /// Path to the SQLite database file.
  #[serde(default = "default_db_path")]
  pub db_path: PathBuf,

  /// How long a statement waits on a locked database before failing.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_db_path() -> PathBuf { PathBuf::from("census.db") }

fn default_busy_timeout_ms() -> u64 { 5_000 }
