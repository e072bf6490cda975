//! Core engines for tax-case analysis.
//!
//! The crate turns inconsistently-shaped raw case documents (account
//! transcripts, wage and income forms, financial interviews) into typed,
//! rule-enriched records, then recomputes normalized entities carrying the
//! derived financial values: collection statute dates with tolling, bracketed
//! tax projections, and resolution-option eligibility.
//!
//! Fetching documents, persisting results, and deciding *when* to run are the
//! caller's concerns; everything here is a short, deterministic, synchronous
//! transformation over in-memory state.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod reference;
pub mod store;
pub mod telemetry;

pub use error::EngineError;
pub use pipeline::CasePipeline;
