// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit records of the values changed while pseudonymizing one event.
//!
//! ## Serialized form
//! ```json
//! {
//!   "schema": "iglu:com.snowplowanalytics.snowplow/pii_transformation/jsonschema/1-0-0",
//!   "data": {
//!     "pii": {
//!       "pojo": [{"fieldName": "user_id", "originalValue": "...", "modifiedValue": "..."}],
//!       "json": [{"fieldName": "contexts", "originalValue": "...", "modifiedValue": "...",
//!                 "jsonPath": "$.email", "schema": "iglu:com.acme/user/jsonschema/1-0-0"}]
//!     },
//!     "strategy": {"pseudonymize": {"hashFunction": "SHA-256"}}
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::strategy::{PiiStrategy, StrategyConfig};
use crate::core::error::{PiiError, PiiResult};

/// Schema tag of every serialized audit record
pub const PII_TRANSFORMATION_SCHEMA: &str =
    "iglu:com.snowplowanalytics.snowplow/pii_transformation/jsonschema/1-0-0";

/// A scalar attribute that was scrambled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarModifiedField {
    pub field_name: String,
    pub original_value: String,
    pub modified_value: String,
}

/// A value inside a context document that was scrambled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonModifiedField {
    pub field_name: String,
    pub original_value: String,
    pub modified_value: String,
    pub json_path: String,
    pub schema: String,
}

/// One changed value; an array of N scrambled strings yields N of these
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifiedField {
    Scalar(ScalarModifiedField),
    Json(JsonModifiedField),
}

impl ModifiedField {
    pub fn field_name(&self) -> &str {
        match self {
            ModifiedField::Scalar(f) => &f.field_name,
            ModifiedField::Json(f) => &f.field_name,
        }
    }

    pub fn original_value(&self) -> &str {
        match self {
            ModifiedField::Scalar(f) => &f.original_value,
            ModifiedField::Json(f) => &f.original_value,
        }
    }

    pub fn modified_value(&self) -> &str {
        match self {
            ModifiedField::Scalar(f) => &f.modified_value,
            ModifiedField::Json(f) => &f.modified_value,
        }
    }
}

/// Every value changed in one event, plus the strategy that changed them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub fields: Vec<ModifiedField>,
    pub strategy: PiiStrategy,
}

#[derive(Deserialize)]
struct AuditEnvelope {
    schema: String,
    data: AuditData,
}

#[derive(Deserialize)]
struct AuditData {
    pii: PiiGroups,
    strategy: StrategyConfig,
}

#[derive(Deserialize)]
struct PiiGroups {
    #[serde(default)]
    pojo: Vec<ScalarModifiedField>,
    #[serde(default)]
    json: Vec<JsonModifiedField>,
}

impl AuditRecord {
    pub fn new(fields: Vec<ModifiedField>, strategy: PiiStrategy) -> Self {
        Self { fields, strategy }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entries split by kind, each group in its original order
    pub fn grouped(&self) -> (Vec<&ScalarModifiedField>, Vec<&JsonModifiedField>) {
        self.fields.iter().fold(
            (Vec::new(), Vec::new()),
            |(mut pojo, mut json), field| {
                match field {
                    ModifiedField::Scalar(f) => pojo.push(f),
                    ModifiedField::Json(f) => json.push(f),
                }
                (pojo, json)
            },
        )
    }

    /// Self-describing JSON document for this record; empty groups are omitted
    pub fn to_json_value(&self) -> JsonValue {
        let (pojo, json) = self.grouped();
        let mut pii = serde_json::Map::new();
        if !pojo.is_empty() {
            pii.insert(
                "pojo".to_string(),
                pojo.iter().map(|f| scalar_to_json(f)).collect(),
            );
        }
        if !json.is_empty() {
            pii.insert(
                "json".to_string(),
                json.iter().map(|f| json_to_json(f)).collect(),
            );
        }
        json!({
            "schema": PII_TRANSFORMATION_SCHEMA,
            "data": {
                "pii": pii,
                "strategy": strategy_to_json(&self.strategy.to_config()),
            }
        })
    }

    /// Compact serialized form, as stored in the event's audit attribute
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Parse a serialized record back; entries come back grouped (pojo first)
    pub fn from_json(input: &str) -> PiiResult<Self> {
        let envelope: AuditEnvelope = serde_json::from_str(input)
            .map_err(|e| PiiError::malformed_audit_record(format!("JSON parse error: {}", e)))?;

        if envelope.schema != PII_TRANSFORMATION_SCHEMA {
            return Err(PiiError::malformed_audit_record(format!(
                "unexpected schema '{}'",
                envelope.schema
            )));
        }

        let strategy = PiiStrategy::from_config(&envelope.data.strategy).map_err(|name| {
            PiiError::malformed_audit_record(format!("unsupported hash function '{}'", name))
        })?;

        let PiiGroups { pojo, json } = envelope.data.pii;
        let fields = pojo
            .into_iter()
            .map(ModifiedField::Scalar)
            .chain(json.into_iter().map(ModifiedField::Json))
            .collect();

        Ok(Self { fields, strategy })
    }
}

fn scalar_to_json(field: &ScalarModifiedField) -> JsonValue {
    json!({
        "fieldName": field.field_name,
        "originalValue": field.original_value,
        "modifiedValue": field.modified_value,
    })
}

fn json_to_json(field: &JsonModifiedField) -> JsonValue {
    json!({
        "fieldName": field.field_name,
        "originalValue": field.original_value,
        "modifiedValue": field.modified_value,
        "jsonPath": field.json_path,
        "schema": field.schema,
    })
}

fn strategy_to_json(config: &StrategyConfig) -> JsonValue {
    match config {
        StrategyConfig::Pseudonymize(p) => json!({
            "pseudonymize": {"hashFunction": p.hash_function}
        }),
    }
}
