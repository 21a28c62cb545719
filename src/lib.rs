// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII pseudonymization enrichment for enriched pipeline events.
//!
//! ```no_run
//! use eventflux_pii::core::event::EnrichedEvent;
//! use eventflux_pii::core::pii::{MutatorRegistry, PiiPseudonymizer};
//!
//! # fn main() -> Result<(), eventflux_pii::core::PiiError> {
//! let registry = MutatorRegistry::<EnrichedEvent>::enriched_event();
//! let enrichment = PiiPseudonymizer::from_file("pii.yaml", &registry)?;
//!
//! let mut event = EnrichedEvent {
//!     user_ipaddress: Some("10.0.0.1".to_string()),
//!     ..EnrichedEvent::default()
//! };
//! enrichment.transform(&mut event)?;
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use crate::core::config::PiiEnrichmentConfig;
pub use crate::core::error::{ConfigProblem, PiiError, PiiResult};
pub use crate::core::event::EnrichedEvent;
pub use crate::core::pii::PiiPseudonymizer;
