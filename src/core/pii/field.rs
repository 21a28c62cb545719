// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field mutators and PII field specifications.
//!
//! The enrichment never touches an event directly. The host registers a
//! [`FieldMutator`] for every attribute the configuration may reference, and field
//! specifications are resolved against that registry once, at load time.
//! Absent and null attribute values are the same thing here: `None`.

use std::collections::HashMap;
use std::fmt;

use super::json_path::JsonPath;
use super::schema::SchemaCriterion;

/// Get/set accessor pair for one named attribute of an event record
pub struct FieldMutator<E> {
    pub get: fn(&E) -> Option<&str>,
    pub set: fn(&mut E, Option<String>),
}

impl<E> FieldMutator<E> {
    pub const fn new(get: fn(&E) -> Option<&str>, set: fn(&mut E, Option<String>)) -> Self {
        Self { get, set }
    }
}

// Not derived: `E` need not be Clone or Debug.
impl<E> Clone for FieldMutator<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FieldMutator<E> {}

impl<E> fmt::Debug for FieldMutator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldMutator")
    }
}

/// Every attribute a PII configuration is allowed to reference, by kind
pub struct MutatorRegistry<E> {
    scalar: HashMap<String, FieldMutator<E>>,
    json: HashMap<String, FieldMutator<E>>,
    audit: FieldMutator<E>,
}

impl<E> MutatorRegistry<E> {
    /// Create a registry whose audit record is written through `audit`
    pub fn new(audit: FieldMutator<E>) -> Self {
        Self {
            scalar: HashMap::new(),
            json: HashMap::new(),
            audit,
        }
    }

    pub fn register_scalar(&mut self, name: impl Into<String>, mutator: FieldMutator<E>) -> &mut Self {
        self.scalar.insert(name.into(), mutator);
        self
    }

    pub fn register_json(&mut self, name: impl Into<String>, mutator: FieldMutator<E>) -> &mut Self {
        self.json.insert(name.into(), mutator);
        self
    }

    pub fn scalar(&self, name: &str) -> Option<FieldMutator<E>> {
        self.scalar.get(name).copied()
    }

    pub fn json(&self, name: &str) -> Option<FieldMutator<E>> {
        self.json.get(name).copied()
    }

    pub fn audit(&self) -> FieldMutator<E> {
        self.audit
    }

    /// Registered scalar field names, sorted
    pub fn scalar_names(&self) -> Vec<&str> {
        sorted_names(&self.scalar)
    }

    /// Registered JSON field names, sorted
    pub fn json_names(&self) -> Vec<&str> {
        sorted_names(&self.json)
    }
}

impl<E> fmt::Debug for MutatorRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutatorRegistry")
            .field("scalar", &self.scalar_names())
            .field("json", &self.json_names())
            .finish()
    }
}

fn sorted_names<M>(map: &HashMap<String, M>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Where the scramble strategy is applied
pub enum FieldSpec<E> {
    /// A plain scalar attribute
    Scalar {
        field: String,
        mutator: FieldMutator<E>,
    },
    /// Values inside the context documents held by a JSON attribute
    Json {
        field: String,
        mutator: FieldMutator<E>,
        criterion: SchemaCriterion,
        json_path: JsonPath,
    },
}

impl<E> FieldSpec<E> {
    /// Name of the event attribute this specification reads and writes
    pub fn field(&self) -> &str {
        match self {
            FieldSpec::Scalar { field, .. } | FieldSpec::Json { field, .. } => field,
        }
    }

    /// Whether the attribute is resolved from the JSON namespace of the registry
    pub fn is_json(&self) -> bool {
        matches!(self, FieldSpec::Json { .. })
    }

    pub fn mutator(&self) -> FieldMutator<E> {
        match self {
            FieldSpec::Scalar { mutator, .. } | FieldSpec::Json { mutator, .. } => *mutator,
        }
    }
}

impl<E> Clone for FieldSpec<E> {
    fn clone(&self) -> Self {
        match self {
            FieldSpec::Scalar { field, mutator } => FieldSpec::Scalar {
                field: field.clone(),
                mutator: *mutator,
            },
            FieldSpec::Json {
                field,
                mutator,
                criterion,
                json_path,
            } => FieldSpec::Json {
                field: field.clone(),
                mutator: *mutator,
                criterion: criterion.clone(),
                json_path: json_path.clone(),
            },
        }
    }
}

impl<E> fmt::Debug for FieldSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Scalar { field, .. } => f.debug_struct("Scalar").field("field", field).finish(),
            FieldSpec::Json {
                field,
                criterion,
                json_path,
                ..
            } => f
                .debug_struct("Json")
                .field("field", field)
                .field("criterion", &criterion.to_string())
                .field("json_path", &json_path.as_str())
                .finish(),
        }
    }
}
