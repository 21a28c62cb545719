// SPDX-License-Identifier: MIT OR Apache-2.0

//! # PII Enrichment Configuration
//!
//! Resolves a raw enrichment configuration into validated field specifications.
//!
//! ## Example
//! ```json
//! {
//!   "enabled": true,
//!   "emitIdentificationEvent": true,
//!   "parameters": {
//!     "pii": [
//!       {"pojo": {"field": "user_ipaddress"}},
//!       {"json": {"field": "contexts",
//!                 "schemaCriterion": "iglu:com.acme/user/jsonschema/1-*-*",
//!                 "jsonPath": "$.email"}}
//!     ],
//!     "strategy": {"pseudonymize": {"hashFunction": "SHA-256"}}
//!   }
//! }
//! ```
//!
//! The same document may be wrapped as `{"schema": ..., "data": {...}}`, and may be
//! loaded from JSON, YAML or TOML files.
//!
//! ## Validation
//! Every problem is collected before reporting, so one failed load lists everything
//! that needs fixing. When `enabled` is false the `pii` entries are not resolved at
//! all, but the strategy still is.

use log::{info, warn};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::core::error::{ConfigProblem, PiiError, PiiResult};
use crate::core::pii::field::{FieldMutator, FieldSpec, MutatorRegistry};
use crate::core::pii::json_path::JsonPath;
use crate::core::pii::schema::SchemaCriterion;
use crate::core::pii::strategy::{PiiStrategy, PseudonymizeConfig, StrategyConfig};

/// Either a value or every problem found while producing it
pub type Validated<T> = Result<T, Vec<ConfigProblem>>;

/// Combine two validations, keeping the problems of both
pub fn zip<A, B>(a: Validated<A>, b: Validated<B>) -> Validated<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => Err(a
            .err()
            .unwrap_or_default()
            .into_iter()
            .chain(b.err().unwrap_or_default())
            .collect()),
    }
}

/// Collect validations, keeping every problem from every item
pub fn sequence<T>(items: impl IntoIterator<Item = Validated<T>>) -> Validated<Vec<T>> {
    items
        .into_iter()
        .fold(Ok(Vec::new()), |acc, item| match (acc, item) {
            (Ok(mut values), Ok(value)) => {
                values.push(value);
                Ok(values)
            }
            (Ok(_), Err(problems)) => Err(problems),
            (Err(problems), Ok(_)) => Err(problems),
            (Err(mut problems), Err(more)) => {
                problems.extend(more);
                Err(problems)
            }
        })
}

/// Resolved, immutable PII enrichment configuration
pub struct PiiEnrichmentConfig<E> {
    pub enabled: bool,
    pub emit_identification_event: bool,
    pub fields: Vec<FieldSpec<E>>,
    pub strategy: PiiStrategy,
    /// Accessor of the attribute receiving the audit record
    pub audit: FieldMutator<E>,
}

impl<E> std::fmt::Debug for PiiEnrichmentConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiEnrichmentConfig")
            .field("enabled", &self.enabled)
            .field("emit_identification_event", &self.emit_identification_event)
            .field("fields", &self.fields)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl<E> PiiEnrichmentConfig<E> {
    /// Resolve a configuration document against the host's mutator registry
    pub fn from_json_value(config: &JsonValue, registry: &MutatorRegistry<E>) -> PiiResult<Self> {
        let data = match (config.get("schema"), config.get("data")) {
            (Some(_), Some(data)) => data,
            _ => config,
        };

        let enabled = bool_attribute(data, &["enabled"], true);
        let emit = bool_attribute(data, &["emitIdentificationEvent", "emitEvent"], false);
        let parameters = data
            .get("parameters")
            .ok_or_else(|| vec![ConfigProblem::missing(None, "parameters")]);

        let strategy = parameters.clone().and_then(resolve_strategy);
        let fields = match (&parameters, &enabled) {
            (Ok(parameters), Ok(true)) => resolve_fields(parameters, registry),
            // nothing to resolve, or the problem is already reported above
            _ => Ok(Vec::new()),
        };

        let ((enabled, emit_identification_event), (strategy, fields)) =
            zip(zip(enabled, emit), zip(strategy, fields)).map_err(PiiError::configuration)?;

        if enabled && fields.is_empty() {
            warn!("[PiiEnrichment] Enabled with no PII fields configured; events pass through unchanged");
        }
        info!(
            "[PiiEnrichment] Resolved {} PII field(s) using {} (enabled={}, emitIdentificationEvent={})",
            fields.len(),
            strategy_name(&strategy),
            enabled,
            emit_identification_event
        );

        Ok(Self {
            enabled,
            emit_identification_event,
            fields,
            strategy,
            audit: registry.audit(),
        })
    }

    /// Resolve a JSON configuration string
    pub fn from_json_str(input: &str, registry: &MutatorRegistry<E>) -> PiiResult<Self> {
        let config: JsonValue = serde_json::from_str(input).map_err(|e| {
            PiiError::configuration(vec![ConfigProblem::invalid("document", e.to_string())])
        })?;
        Self::from_json_value(&config, registry)
    }

    /// Load and resolve a `.json`, `.yaml`/`.yml` or `.toml` configuration file
    pub fn from_file(path: impl AsRef<Path>, registry: &MutatorRegistry<E>) -> PiiResult<Self> {
        let config = load_document(path.as_ref())?;
        Self::from_json_value(&config, registry)
    }
}

/// Read a configuration file into a JSON document, whatever its format
pub fn load_document(path: &Path) -> PiiResult<JsonValue> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PiiError::config_file(&display, e.to_string()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    let parsed = match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str::<JsonValue>(&contents).map_err(|e| e.to_string())
        }
        Some("toml") => toml::from_str::<JsonValue>(&contents).map_err(|e| e.to_string()),
        _ => serde_json::from_str::<JsonValue>(&contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| PiiError::config_file(display, message))
}

fn strategy_name(strategy: &PiiStrategy) -> &'static str {
    match strategy {
        PiiStrategy::Pseudonymize { hash_function } => hash_function.as_str(),
    }
}

fn bool_attribute(data: &JsonValue, names: &[&str], default: bool) -> Validated<bool> {
    match names.iter().find_map(|name| data.get(*name).map(|v| (*name, v))) {
        None => Ok(default),
        Some((_, JsonValue::Bool(b))) => Ok(*b),
        Some((name, _)) => Err(vec![ConfigProblem::invalid(name, "expected a boolean")]),
    }
}

fn resolve_strategy(parameters: &JsonValue) -> Validated<PiiStrategy> {
    let strategy = object_attribute(parameters, "strategy", "parameters.strategy")?;
    let pseudonymize =
        object_attribute(strategy, "pseudonymize", "parameters.strategy.pseudonymize")?;
    let hash_function = match pseudonymize.get("hashFunction") {
        None | Some(JsonValue::Null) => {
            return Err(vec![ConfigProblem::missing(
                None,
                "parameters.strategy.pseudonymize.hashFunction",
            )])
        }
        Some(JsonValue::String(name)) => name.clone(),
        Some(_) => {
            return Err(vec![ConfigProblem::invalid(
                "parameters.strategy.pseudonymize.hashFunction",
                "expected a string",
            )])
        }
    };
    let config = StrategyConfig::Pseudonymize(PseudonymizeConfig { hash_function });
    PiiStrategy::from_config(&config)
        .map_err(|name| vec![ConfigProblem::UnsupportedAlgorithm { name }])
}

fn object_attribute<'a>(parent: &'a JsonValue, key: &str, path: &str) -> Validated<&'a JsonValue> {
    match parent.get(key) {
        None | Some(JsonValue::Null) => Err(vec![ConfigProblem::missing(None, path)]),
        Some(value @ JsonValue::Object(_)) => Ok(value),
        Some(_) => Err(vec![ConfigProblem::invalid(path, "expected an object")]),
    }
}

fn resolve_fields<E>(parameters: &JsonValue, registry: &MutatorRegistry<E>) -> Validated<Vec<FieldSpec<E>>> {
    let entries = match parameters.get("pii") {
        None => return Err(vec![ConfigProblem::missing(None, "parameters.pii")]),
        Some(JsonValue::Array(entries)) => entries,
        Some(_) => {
            return Err(vec![ConfigProblem::invalid(
                "parameters.pii",
                "expected an array",
            )])
        }
    };
    sequence(
        entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| resolve_entry(idx, entry, registry)),
    )
}

fn resolve_entry<E>(idx: usize, entry: &JsonValue, registry: &MutatorRegistry<E>) -> Validated<FieldSpec<E>> {
    if entry.get("pojo").is_some() && entry.get("json").is_some() {
        return Err(vec![ConfigProblem::UnknownEntryKind { entry: idx }]);
    }
    if let Some(pojo) = entry.get("pojo") {
        let field = required_str(idx, pojo, "field")?;
        let mutator = registry.scalar(field).ok_or_else(|| {
            vec![ConfigProblem::UnknownScalarField {
                entry: idx,
                field: field.to_string(),
            }]
        })?;
        Ok(FieldSpec::Scalar {
            field: field.to_string(),
            mutator,
        })
    } else if let Some(json) = entry.get("json") {
        let field = required_str(idx, json, "field").and_then(|field| {
            registry
                .json(field)
                .map(|mutator| (field.to_string(), mutator))
                .ok_or_else(|| {
                    vec![ConfigProblem::UnknownJsonField {
                        entry: idx,
                        field: field.to_string(),
                    }]
                })
        });
        let criterion = required_str(idx, json, "schemaCriterion").and_then(|raw| {
            SchemaCriterion::parse(raw).map_err(|reason| {
                vec![ConfigProblem::InvalidSchemaCriterion {
                    entry: idx,
                    criterion: raw.to_string(),
                    reason,
                }]
            })
        });
        let json_path = required_str(idx, json, "jsonPath").and_then(|raw| {
            JsonPath::parse(raw).map_err(|reason| {
                vec![ConfigProblem::InvalidJsonPath {
                    entry: idx,
                    path: raw.to_string(),
                    reason,
                }]
            })
        });

        let ((field, mutator), (criterion, json_path)) =
            zip(field, zip(criterion, json_path))?;
        Ok(FieldSpec::Json {
            field,
            mutator,
            criterion,
            json_path,
        })
    } else {
        Err(vec![ConfigProblem::UnknownEntryKind { entry: idx }])
    }
}

fn required_str<'a>(idx: usize, entry: &'a JsonValue, attribute: &str) -> Validated<&'a str> {
    match entry.get(attribute) {
        None | Some(JsonValue::Null) => Err(vec![ConfigProblem::missing(Some(idx), attribute)]),
        Some(JsonValue::String(s)) => Ok(s),
        Some(_) => Err(vec![ConfigProblem::invalid(
            format!("parameters.pii[{}].{}", idx, attribute),
            "expected a string",
        )]),
    }
}
