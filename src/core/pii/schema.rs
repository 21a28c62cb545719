// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema identities of self-describing context documents, and the criteria used to
//! decide which of them a JSON field specification applies to.
//!
//! ```text
//! SchemaKey        iglu:com.acme/example/jsonschema/1-0-2
//! SchemaCriterion  iglu:com.acme/example/jsonschema/1-*-*   (prefix optional)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Regex to match a concrete schema URI: iglu:vendor/name/format/M-R-A
static SCHEMA_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^iglu:([a-zA-Z0-9_.\-]+)/([a-zA-Z0-9_\-]+)/([a-zA-Z0-9_\-]+)/([0-9]+)-([0-9]+)-([0-9]+)$",
    )
    .expect("Invalid schema key regex")
});

/// Regex to match a schema criterion, `iglu:` prefix optional and `*` allowed per version slot
static SCHEMA_CRITERION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:iglu:)?([a-zA-Z0-9_.\-]+)/([a-zA-Z0-9_\-]+)/([a-zA-Z0-9_\-]+)/([0-9]+|\*)-([0-9]+|\*)-([0-9]+|\*)$",
    )
    .expect("Invalid schema criterion regex")
});

/// MODEL-REVISION-ADDITION version of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaVer {
    pub model: u32,
    pub revision: u32,
    pub addition: u32,
}

impl fmt::Display for SchemaVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.model, self.revision, self.addition)
    }
}

/// Concrete schema identity declared by a context document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    pub vendor: String,
    pub name: String,
    pub format: String,
    pub version: SchemaVer,
}

impl SchemaKey {
    /// Parse an `iglu:vendor/name/format/M-R-A` URI
    pub fn parse(uri: &str) -> Result<Self, String> {
        let caps = SCHEMA_KEY_RE
            .captures(uri)
            .ok_or_else(|| format!("'{}' is not a valid schema URI", uri))?;
        Ok(Self {
            vendor: caps[1].to_string(),
            name: caps[2].to_string(),
            format: caps[3].to_string(),
            version: SchemaVer {
                model: parse_component(&caps[4], "model")?,
                revision: parse_component(&caps[5], "revision")?,
                addition: parse_component(&caps[6], "addition")?,
            },
        })
    }

    pub fn to_uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iglu:{}/{}/{}/{}",
            self.vendor, self.name, self.format, self.version
        )
    }
}

/// Vendor/name/format plus independently wildcardable version components
///
/// `None` in a version slot is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaCriterion {
    pub vendor: String,
    pub name: String,
    pub format: String,
    pub model: Option<u32>,
    pub revision: Option<u32>,
    pub addition: Option<u32>,
}

impl SchemaCriterion {
    pub fn new(
        vendor: impl Into<String>,
        name: impl Into<String>,
        format: impl Into<String>,
        model: Option<u32>,
        revision: Option<u32>,
        addition: Option<u32>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
            format: format.into(),
            model,
            revision,
            addition,
        }
    }

    /// Parse `[iglu:]vendor/name/format/M-R-A` where any of M, R, A may be `*`
    pub fn parse(criterion: &str) -> Result<Self, String> {
        let caps = SCHEMA_CRITERION_RE.captures(criterion).ok_or_else(|| {
            "expected 'vendor/name/format/model-revision-addition' with '*' wildcards"
                .to_string()
        })?;
        Ok(Self {
            vendor: caps[1].to_string(),
            name: caps[2].to_string(),
            format: caps[3].to_string(),
            model: parse_wildcard(&caps[4], "model")?,
            revision: parse_wildcard(&caps[5], "revision")?,
            addition: parse_wildcard(&caps[6], "addition")?,
        })
    }

    pub fn matches(&self, key: &SchemaKey) -> bool {
        self.vendor == key.vendor
            && self.name == key.name
            && self.format == key.format
            && version_matches(self.model, key.version.model)
            && version_matches(self.revision, key.version.revision)
            && version_matches(self.addition, key.version.addition)
    }
}

impl fmt::Display for SchemaCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = |v: Option<u32>| v.map_or_else(|| "*".to_string(), |n| n.to_string());
        write!(
            f,
            "iglu:{}/{}/{}/{}-{}-{}",
            self.vendor,
            self.name,
            self.format,
            slot(self.model),
            slot(self.revision),
            slot(self.addition)
        )
    }
}

#[inline]
fn version_matches(expected: Option<u32>, actual: u32) -> bool {
    expected.map_or(true, |v| v == actual)
}

fn parse_component(raw: &str, component: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|_| format!("{} version '{}' is out of range", component, raw))
}

fn parse_wildcard(raw: &str, component: &str) -> Result<Option<u32>, String> {
    if raw == "*" {
        Ok(None)
    } else {
        parse_component(raw, component).map(Some)
    }
}
