//! Advisory checks over model output.
//!
//! Nothing here rejects a form. The only hard requirement on a generated
//! schema is that it parses as JSON; these findings are logged so a user
//! can see when the model drifted from the blueprint.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde_json::Value;

use super::form::{Blueprint, FormSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    TooFewFields(usize),
    NotCamelCase(String),
    DuplicateKey(String),
    UnrequestedComponent(String),
    MissingComponent(String),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::TooFewFields(n) => write!(f, "blueprint has {n} field(s), expected at least 2"),
            Finding::NotCamelCase(key) => write!(f, "key '{key}' is not camelCase"),
            Finding::DuplicateKey(key) => write!(f, "key '{key}' appears more than once"),
            Finding::UnrequestedComponent(key) => {
                write!(f, "schema contains '{key}' which the blueprint did not ask for")
            }
            Finding::MissingComponent(key) => write!(f, "blueprint field '{key}' is missing from the schema"),
        }
    }
}

pub fn is_camel_case(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

pub fn check_blueprint(blueprint: &Blueprint) -> Vec<Finding> {
    let mut findings = Vec::new();
    if blueprint.fields.len() < 2 {
        findings.push(Finding::TooFewFields(blueprint.fields.len()));
    }

    let mut seen = HashSet::new();
    for field in &blueprint.fields {
        if !is_camel_case(&field.key) {
            findings.push(Finding::NotCamelCase(field.key.clone()));
        }
        if !seen.insert(field.key.as_str()) {
            findings.push(Finding::DuplicateKey(field.key.clone()));
        }
    }
    findings
}

/// Compares the built schema against the blueprint it came from.
///
/// Buttons are ignored since Form.io renderers commonly expect a submit
/// component that no blueprint names.
pub fn check_schema_against_blueprint(schema: &FormSchema, blueprint: &Blueprint) -> Vec<Finding> {
    let requested: BTreeSet<&str> = blueprint.fields.iter().map(|f| f.key.as_str()).collect();
    let buttons: HashSet<&str> = schema
        .components()
        .iter()
        .filter(|c| c.get("type").and_then(Value::as_str) == Some("button"))
        .filter_map(|c| c.get("key").and_then(Value::as_str))
        .collect();
    let built: BTreeSet<&str> = schema
        .component_keys()
        .into_iter()
        .filter(|k| !buttons.contains(k))
        .collect();

    let mut findings: Vec<Finding> = built
        .difference(&requested)
        .map(|k| Finding::UnrequestedComponent(k.to_string()))
        .collect();
    findings.extend(
        requested
            .difference(&built)
            .map(|k| Finding::MissingComponent(k.to_string())),
    );
    findings
}

/// Keys of top-level components that differ between two schemas.
///
/// Includes keys that were added, removed, or whose component changed.
pub fn changed_component_keys(before: &FormSchema, after: &FormSchema) -> BTreeSet<String> {
    let index = |schema: &FormSchema| -> Vec<(String, Value)> {
        schema
            .components()
            .iter()
            .filter_map(|c| {
                c.get("key")
                    .and_then(Value::as_str)
                    .map(|k| (k.to_string(), c.clone()))
            })
            .collect()
    };
    let before = index(before);
    let after = index(after);

    let mut changed = BTreeSet::new();
    for (key, component) in &before {
        match after.iter().find(|(k, _)| k == key) {
            Some((_, other)) if other == component => {}
            _ => {
                changed.insert(key.clone());
            }
        }
    }
    for (key, _) in &after {
        if !before.iter().any(|(k, _)| k == key) {
            changed.insert(key.clone());
        }
    }
    changed
}
