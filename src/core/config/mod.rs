// SPDX-License-Identifier: MIT OR Apache-2.0

//! Enrichment configuration loading and validation.

pub mod pii_config;

pub use pii_config::{load_document, PiiEnrichmentConfig, Validated};
