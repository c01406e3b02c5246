//! Core types and trait definitions for the census import store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod citizen;
pub mod error;
pub mod import;
pub mod stats;
pub mod store;
pub mod view;

pub use error::{Error, Result};
