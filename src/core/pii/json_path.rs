// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSONPath subset used to address PII inside context `data` payloads.
//!
//! **Supported JSONPath Syntax**:
//! - `$` - The payload itself
//! - `$.field` / `$['field']` / `$["field"]` - Object member
//! - `$.array[0]` / `$.array[-1]` - Array element (negative counts from the end)
//! - `$.array[*]` / `$.object.*` - Every element / member
//! - `$..field` / `$..*` / `$..[0]` - Recursive descent
//!
//! Evaluation never fails: a path that addresses nothing simply selects nothing.

use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

/// Maximum number of path segments accepted (DoS protection)
pub const MAX_PATH_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Member(String),
    Index(i64),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    selector: Selector,
    recursive: bool,
}

/// One concrete step from a value to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// A string that was replaced while rewriting a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub original: String,
    pub modified: String,
}

/// Compiled path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self, String> {
        let segments = Parser::new(expression).parse()?;
        if segments.len() > MAX_PATH_DEPTH {
            return Err(format!(
                "JSONPath nesting depth {} exceeds maximum allowed {}",
                segments.len(),
                MAX_PATH_DEPTH
            ));
        }
        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    /// The expression as originally written
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Concrete locations selected by this path, in document order
    pub fn locate(&self, root: &JsonValue) -> Vec<Vec<Step>> {
        locate(root, &self.segments, &[])
    }

    /// Replace every selected string, and every string element of every selected
    /// array, with `scramble(value)`.
    ///
    /// Returns the rewritten document together with one [`Replacement`] per string
    /// changed. A location reached through more than one route is changed once.
    pub fn scramble_strings<F>(&self, root: JsonValue, scramble: F) -> (JsonValue, Vec<Replacement>)
    where
        F: Fn(&str) -> String,
    {
        let targets = string_targets(&root, self.locate(&root));
        targets
            .into_iter()
            .fold((root, Vec::new()), |(mut root, mut replaced), target| {
                if let Some(JsonValue::String(s)) = resolve_mut(&mut root, &target) {
                    let modified = scramble(s);
                    let original = std::mem::replace(s, modified.clone());
                    replaced.push(Replacement { original, modified });
                }
                (root, replaced)
            })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn child_path(parent: &[Step], step: Step) -> Vec<Step> {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(step);
    path
}

fn children<'a>(value: &'a JsonValue, selector: &Selector) -> Vec<(Step, &'a JsonValue)> {
    match (selector, value) {
        (Selector::Member(name), JsonValue::Object(map)) => map
            .get(name)
            .map(|child| vec![(Step::Key(name.clone()), child)])
            .unwrap_or_default(),
        (Selector::Index(index), JsonValue::Array(items)) => resolve_index(*index, items.len())
            .map(|i| vec![(Step::Index(i), &items[i])])
            .unwrap_or_default(),
        (Selector::Wildcard, JsonValue::Object(map)) => map
            .iter()
            .map(|(k, v)| (Step::Key(k.clone()), v))
            .collect(),
        (Selector::Wildcard, JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Step::Index(i), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    } else {
        usize::try_from(index).ok()?
    };
    (resolved < len).then_some(resolved)
}

fn locate(value: &JsonValue, segments: &[Segment], here: &[Step]) -> Vec<Vec<Step>> {
    let Some((segment, rest)) = segments.split_first() else {
        return vec![here.to_vec()];
    };

    let direct = children(value, &segment.selector)
        .into_iter()
        .flat_map(|(step, child)| locate(child, rest, &child_path(here, step)));

    if !segment.recursive {
        return direct.collect();
    }

    let deeper = children(value, &Selector::Wildcard)
        .into_iter()
        .flat_map(|(step, child)| locate(child, segments, &child_path(here, step)));

    direct.chain(deeper).collect()
}

fn resolve<'a>(root: &'a JsonValue, path: &[Step]) -> Option<&'a JsonValue> {
    path.iter().try_fold(root, |current, step| match step {
        Step::Key(key) => current.get(key.as_str()),
        Step::Index(i) => current.get(*i),
    })
}

fn resolve_mut<'a>(root: &'a mut JsonValue, path: &[Step]) -> Option<&'a mut JsonValue> {
    path.iter().try_fold(root, |current, step| match step {
        Step::Key(key) => current.get_mut(key.as_str()),
        Step::Index(i) => current.get_mut(*i),
    })
}

/// Expand located values into the string locations that will be scrambled
fn string_targets(root: &JsonValue, located: Vec<Vec<Step>>) -> Vec<Vec<Step>> {
    let mut seen = HashSet::new();
    located
        .into_iter()
        .flat_map(|path| match resolve(root, &path) {
            Some(JsonValue::String(_)) => vec![path],
            Some(JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_string())
                .map(|(i, _)| child_path(&path, Step::Index(i)))
                .collect(),
            _ => Vec::new(),
        })
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

// ============================================================================
// Parsing
// ============================================================================

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn parse(mut self) -> Result<Vec<Segment>, String> {
        if !self.rest().starts_with('$') {
            return Err(format!("Invalid JSONPath '{}'. Must start with '$'", self.input));
        }
        self.pos += 1;

        let mut segments = Vec::new();
        while !self.rest().is_empty() {
            let recursive = self.rest().starts_with("..");
            let selector = if recursive {
                self.pos += 2;
                if self.rest().starts_with('[') {
                    self.bracket()?
                } else {
                    self.dotted()?
                }
            } else if self.rest().starts_with('.') {
                self.pos += 1;
                self.dotted()?
            } else if self.rest().starts_with('[') {
                self.bracket()?
            } else {
                return Err(format!(
                    "Unexpected '{}' at position {} in '{}'",
                    self.rest().chars().next().unwrap_or_default(),
                    self.pos,
                    self.input
                ));
            };
            segments.push(Segment {
                selector,
                recursive,
            });
        }
        Ok(segments)
    }

    /// Member name or `*` following a dot
    fn dotted(&mut self) -> Result<Selector, String> {
        let rest = self.rest();
        let end = rest.find(['.', '[', ']']).unwrap_or(rest.len());
        let name = &rest[..end];
        if name.is_empty() {
            return Err(format!(
                "Empty member name at position {} in '{}'",
                self.pos, self.input
            ));
        }
        self.pos += end;
        Ok(if name == "*" {
            Selector::Wildcard
        } else {
            Selector::Member(name.to_string())
        })
    }

    /// `[*]`, `[n]`, `['name']` or `["name"]`
    fn bracket(&mut self) -> Result<Selector, String> {
        let start = self.pos;
        self.pos += 1;
        let rest = self.rest();

        let (selector, consumed) = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let body = &rest[1..];
                let close = body
                    .find(quote)
                    .ok_or_else(|| format!("Unterminated quoted name in '{}'", self.input))?;
                (Selector::Member(body[..close].to_string()), close + 2)
            }
            Some('*') => (Selector::Wildcard, 1),
            Some(_) => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| format!("Unclosed '[' at position {} in '{}'", start, self.input))?;
                let raw = rest[..close].trim();
                let index = raw
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid array index '{}' in '{}'", raw, self.input))?;
                (Selector::Index(index), close)
            }
            None => return Err(format!("Unclosed '[' at position {} in '{}'", start, self.input)),
        };

        self.pos += consumed;
        if !self.rest().starts_with(']') {
            return Err(format!("Unclosed '[' at position {} in '{}'", start, self.input));
        }
        self.pos += 1;
        Ok(selector)
    }
}
