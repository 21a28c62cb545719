// SPDX-License-Identifier: MIT OR Apache-2.0

//! # PII Pseudonymization
//!
//! Replaces personally identifying values in event records with deterministic hex
//! digests and records every replacement in an audit document on the event.
//!
//! ## Pipeline
//!
//! - **strategy**: the hash function every value is scrambled with
//! - **field**: mutator registry and resolved field specifications
//! - **schema** / **json_path**: locate values inside self-describing context documents
//! - **transform**: per-field scrambling, producing [`ModifiedField`] entries
//! - **modified**: the audit record built from those entries
//! - **enrichment**: [`PiiPseudonymizer`], the per-event entry point
//!
//! Configuration is resolved by [`crate::core::config::PiiEnrichmentConfig`].

pub mod enrichment;
pub mod field;
pub mod json_path;
pub mod modified;
pub mod schema;
pub mod strategy;
pub mod transform;

pub use enrichment::PiiPseudonymizer;
pub use field::{FieldMutator, FieldSpec, MutatorRegistry};
pub use json_path::JsonPath;
pub use modified::{
    AuditRecord, JsonModifiedField, ModifiedField, ScalarModifiedField, PII_TRANSFORMATION_SCHEMA,
};
pub use schema::{SchemaCriterion, SchemaKey, SchemaVer};
pub use strategy::{HashFunction, PiiStrategy, StrategyConfig};
