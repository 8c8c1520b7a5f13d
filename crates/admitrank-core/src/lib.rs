//! admitrank-core: scoring, ranking, explanation and evaluation.
//!
//! This crate holds the data model, the hybrid scorer, the explainer and
//! the evaluation metrics that the rest of admitrank builds on. Everything
//! except [`engine`] is synchronous and free of I/O; loading lives in
//! [`parser`] and persistence in [`report`].

pub mod analytics;
pub mod cost;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod explain;
pub mod model;
pub mod parser;
pub mod ranking;
pub mod report;
pub mod scholarships;
pub mod scoring;
pub mod traits;

pub use error::{AdvisorError, AdvisorResult};
