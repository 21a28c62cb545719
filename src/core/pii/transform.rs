// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-field transforms.
//!
//! Each transform takes the current attribute value and returns the replacement value
//! plus the audit entries for it, or `None` when nothing changed. Nothing is written
//! to the event here; the enrichment facade stages and applies the results.

use log::debug;
use serde_json::Value as JsonValue;

use super::field::FieldSpec;
use super::json_path::JsonPath;
use super::modified::{JsonModifiedField, ModifiedField, ScalarModifiedField};
use super::schema::{SchemaCriterion, SchemaKey};
use super::strategy::PiiStrategy;
use crate::core::error::{PiiError, PiiResult};

/// New attribute value and every entry produced while computing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub value: String,
    pub modified: Vec<ModifiedField>,
}

/// Apply one field specification to the attribute's current value
pub fn apply<E>(
    spec: &FieldSpec<E>,
    current: Option<&str>,
    strategy: &PiiStrategy,
) -> PiiResult<Option<FieldChange>> {
    match spec {
        FieldSpec::Scalar { field, .. } => Ok(scramble_scalar(field, current, strategy)),
        FieldSpec::Json {
            field,
            criterion,
            json_path,
            ..
        } => scramble_json(field, current, criterion, json_path, strategy),
    }
}

pub fn scramble_scalar(field: &str, current: Option<&str>, strategy: &PiiStrategy) -> Option<FieldChange> {
    let original = current?;
    let modified = strategy.scramble(original);
    Some(FieldChange {
        value: modified.clone(),
        modified: vec![ModifiedField::Scalar(ScalarModifiedField {
            field_name: field.to_string(),
            original_value: original.to_string(),
            modified_value: modified,
        })],
    })
}

/// Scramble `json_path` inside every context of the document that matches `criterion`
///
/// The document holds its contexts under `data`, either as an array (contexts) or a
/// single object (self-describing event). A document with nothing to change is left
/// untouched rather than re-serialized.
pub fn scramble_json(
    field: &str,
    current: Option<&str>,
    criterion: &SchemaCriterion,
    json_path: &JsonPath,
    strategy: &PiiStrategy,
) -> PiiResult<Option<FieldChange>> {
    let Some(raw) = current else {
        return Ok(None);
    };
    let document: JsonValue =
        serde_json::from_str(raw).map_err(|e| PiiError::malformed_event_field(field, e))?;

    let scope = ContextScope {
        field,
        criterion,
        json_path,
        strategy,
    };
    let (document, modified) = scope.rewrite_document(document);

    if modified.is_empty() {
        return Ok(None);
    }
    Ok(Some(FieldChange {
        value: document.to_string(),
        modified,
    }))
}

struct ContextScope<'a> {
    field: &'a str,
    criterion: &'a SchemaCriterion,
    json_path: &'a JsonPath,
    strategy: &'a PiiStrategy,
}

impl ContextScope<'_> {
    fn rewrite_document(&self, document: JsonValue) -> (JsonValue, Vec<ModifiedField>) {
        let JsonValue::Object(mut top) = document else {
            return (document, Vec::new());
        };
        let Some(slot) = top.get_mut("data") else {
            return (JsonValue::Object(top), Vec::new());
        };

        let (contexts, is_array) = match slot.take() {
            JsonValue::Array(items) => (items, true),
            single @ JsonValue::Object(_) => (vec![single], false),
            other => {
                *slot = other;
                return (JsonValue::Object(top), Vec::new());
            }
        };

        let (rewritten, modified) = contexts.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut rewritten, mut modified), context| {
                let (context, entries) = self.rewrite_context(context);
                rewritten.push(context);
                modified.extend(entries);
                (rewritten, modified)
            },
        );

        *slot = if is_array {
            JsonValue::Array(rewritten)
        } else {
            rewritten.into_iter().next().unwrap_or_default()
        };
        (JsonValue::Object(top), modified)
    }

    fn rewrite_context(&self, context: JsonValue) -> (JsonValue, Vec<ModifiedField>) {
        let JsonValue::Object(mut context) = context else {
            return (context, Vec::new());
        };

        let schema = match context.get("schema").and_then(JsonValue::as_str) {
            Some(uri) => match SchemaKey::parse(uri) {
                Ok(key) => key,
                Err(e) => {
                    debug!("[PiiPseudonymizer] Skipping context in '{}': {}", self.field, e);
                    return (JsonValue::Object(context), Vec::new());
                }
            },
            None => return (JsonValue::Object(context), Vec::new()),
        };
        if !self.criterion.matches(&schema) {
            return (JsonValue::Object(context), Vec::new());
        }
        let Some(slot) = context.get_mut("data") else {
            return (JsonValue::Object(context), Vec::new());
        };

        let (data, replaced) = self
            .json_path
            .scramble_strings(slot.take(), |s| self.strategy.scramble(s));
        *slot = data;

        let schema = schema.to_uri();
        let modified = replaced
            .into_iter()
            .map(|r| {
                ModifiedField::Json(JsonModifiedField {
                    field_name: self.field.to_string(),
                    original_value: r.original,
                    modified_value: r.modified,
                    json_path: self.json_path.as_str().to_string(),
                    schema: schema.clone(),
                })
            })
            .collect();
        (JsonValue::Object(context), modified)
    }
}
