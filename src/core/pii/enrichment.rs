// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII pseudonymization enrichment.
//!
//! [`PiiPseudonymizer`] is the single entry point hosts call per event. It is
//! immutable after construction and may be shared across worker threads.

use log::debug;
use serde_json::Value as JsonValue;
use std::path::Path;

use super::field::{FieldMutator, MutatorRegistry};
use super::modified::{AuditRecord, ModifiedField};
use super::strategy::PiiStrategy;
use super::transform;
use crate::core::config::pii_config::PiiEnrichmentConfig;
use crate::core::error::{PiiError, PiiResult};

/// A write waiting for every field specification of the event to succeed
///
/// Scalar and JSON names live in separate registry namespaces, so a staged write is
/// keyed by both.
struct StagedWrite<'s, E> {
    field: &'s str,
    json: bool,
    mutator: FieldMutator<E>,
    value: String,
}

/// Scrubs the configured PII fields of events and records what changed
pub struct PiiPseudonymizer<E> {
    config: PiiEnrichmentConfig<E>,
}

impl<E> std::fmt::Debug for PiiPseudonymizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiPseudonymizer")
            .field("config", &self.config)
            .finish()
    }
}

impl<E> PiiPseudonymizer<E> {
    pub fn new(config: PiiEnrichmentConfig<E>) -> Self {
        Self { config }
    }

    /// Resolve a configuration document and build the enrichment from it
    pub fn from_json_value(config: &JsonValue, registry: &MutatorRegistry<E>) -> PiiResult<Self> {
        PiiEnrichmentConfig::from_json_value(config, registry).map(Self::new)
    }

    /// Load a configuration file and build the enrichment from it
    pub fn from_file(path: impl AsRef<Path>, registry: &MutatorRegistry<E>) -> PiiResult<Self> {
        PiiEnrichmentConfig::from_file(path, registry).map(Self::new)
    }

    pub fn config(&self) -> &PiiEnrichmentConfig<E> {
        &self.config
    }

    pub fn strategy(&self) -> &PiiStrategy {
        &self.config.strategy
    }

    pub fn emits_identification_event(&self) -> bool {
        self.config.emit_identification_event
    }

    /// Scrub every configured field of `event` and write the audit record
    ///
    /// Field specifications run in order, and a later one on the same attribute sees
    /// the earlier one's output. If any attribute fails to parse the event is left
    /// exactly as it was. Running this twice scrambles the already scrambled values.
    pub fn transform(&self, event: &mut E) -> PiiResult<()> {
        let strategy = &self.config.strategy;
        let (staged, modified) = self.config.fields.iter().try_fold(
            (Vec::<StagedWrite<'_, E>>::new(), Vec::<ModifiedField>::new()),
            |(mut staged, mut modified), spec| {
                let current = staged
                    .iter()
                    .rev()
                    .find(|write| write.field == spec.field() && write.json == spec.is_json())
                    .map(|write| write.value.as_str())
                    .or_else(|| (spec.mutator().get)(event));

                if let Some(change) = transform::apply(spec, current, strategy)? {
                    staged.push(StagedWrite {
                        field: spec.field(),
                        json: spec.is_json(),
                        mutator: spec.mutator(),
                        value: change.value,
                    });
                    modified.extend(change.modified);
                }
                Ok::<_, PiiError>((staged, modified))
            },
        )?;

        for write in staged {
            (write.mutator.set)(event, Some(write.value));
        }

        debug!("[PiiPseudonymizer] Scrubbed {} value(s)", modified.len());
        let record = AuditRecord::new(modified, *strategy);
        let audit = (!record.is_empty()).then(|| record.to_json());
        (self.config.audit.set)(event, audit);
        Ok(())
    }

    /// Audit document to emit as a separate identification event, if configured
    ///
    /// Returns `None` when emission is disabled or the event carries no audit record.
    pub fn identification_event(&self, event: &E) -> Option<JsonValue> {
        if !self.config.emit_identification_event {
            return None;
        }
        let raw = (self.config.audit.get)(event)?;
        match serde_json::from_str(raw) {
            Ok(document) => Some(document),
            Err(e) => {
                debug!("[PiiPseudonymizer] Ignoring unreadable audit attribute: {}", e);
                None
            }
        }
    }
}
