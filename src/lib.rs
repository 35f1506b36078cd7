//! Cricket match ETL and analytics.
//!
//! Raw per-match JSON documents are flattened by [`extract`], partitioned by
//! format in [`corpus`], persisted to SQLite by [`db`], and analyzed with the
//! fixed catalog in [`queries`].

pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod extract;
pub mod queries;
pub mod report;

pub use corpus::{MatchFormat, MatchRecord, Partitions};
pub use error::PipelineError;
pub use extract::MatchRow;
