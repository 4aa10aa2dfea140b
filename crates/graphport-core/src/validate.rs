//! Input constraints enforced before any statement is compiled.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::EntityKind;
use crate::types::{Properties, PropertyValue};

/// Reserved property carrying the port-level id on every stored node and
/// relationship.
pub const IDENTITY_KEY: &str = "_id_";

pub const MAX_NUM_NODE_LABELS: usize = 1_000;
pub const MAX_LEN_NODE_LABEL: usize = 1_000;
pub const MAX_LEN_PROP_ARRAY_VAL: usize = 1_000;

/// Errors raised when input fails the port's constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{entity} id must not be empty")]
    EmptyId { entity: EntityKind },

    #[error("Node label {label:?} contains disallowed characters")]
    InvalidNodeLabel { label: String },

    #[error("Node label is {len} characters long, maximum is {max}")]
    NodeLabelTooLong { len: usize, max: usize },

    #[error("Node has {count} labels, maximum is {max}")]
    TooManyNodeLabels { count: usize, max: usize },

    #[error("Link label {label:?} is not a valid relationship type")]
    InvalidLinkLabel { label: String },

    #[error("Property key {key:?} is not a valid identifier")]
    InvalidPropertyKey { key: String },

    #[error("Property key {key:?} is reserved")]
    ReservedPropertyKey { key: String },

    #[error("Property {key:?} holds {len} items, maximum is {max}")]
    PropertyListTooLong { key: String, len: usize, max: usize },
}

fn node_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Za-z !#%&*+<=>?@_|~-]+$").expect("valid regex"))
}

fn property_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]+$").expect("valid regex"))
}

fn link_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

pub fn validate_id(entity: EntityKind, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId { entity });
    }
    Ok(())
}

/// Check a node label set: count, per-label length, and character class.
pub fn validate_node_labels(labels: &[String]) -> Result<(), ValidationError> {
    if labels.len() > MAX_NUM_NODE_LABELS {
        return Err(ValidationError::TooManyNodeLabels {
            count: labels.len(),
            max: MAX_NUM_NODE_LABELS,
        });
    }
    for label in labels {
        let len = label.chars().count();
        if len > MAX_LEN_NODE_LABEL {
            return Err(ValidationError::NodeLabelTooLong {
                len,
                max: MAX_LEN_NODE_LABEL,
            });
        }
        if !node_label_pattern().is_match(label) {
            return Err(ValidationError::InvalidNodeLabel {
                label: label.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_link_label(label: &str) -> Result<(), ValidationError> {
    if !link_label_pattern().is_match(label) {
        return Err(ValidationError::InvalidLinkLabel {
            label: label.to_string(),
        });
    }
    Ok(())
}

/// Check caller-supplied properties: key pattern, reserved key, list bounds.
///
/// List bounds apply at every nesting depth.
pub fn validate_properties(properties: &Properties) -> Result<(), ValidationError> {
    for (key, value) in properties {
        if key == IDENTITY_KEY {
            return Err(ValidationError::ReservedPropertyKey { key: key.clone() });
        }
        if !property_key_pattern().is_match(key) {
            return Err(ValidationError::InvalidPropertyKey { key: key.clone() });
        }
        check_list_bounds(key, value)?;
    }
    Ok(())
}

fn check_list_bounds(key: &str, value: &PropertyValue) -> Result<(), ValidationError> {
    match value {
        PropertyValue::List(items) => {
            if items.len() > MAX_LEN_PROP_ARRAY_VAL {
                return Err(ValidationError::PropertyListTooLong {
                    key: key.to_string(),
                    len: items.len(),
                    max: MAX_LEN_PROP_ARRAY_VAL,
                });
            }
            items.iter().try_for_each(|item| check_list_bounds(key, item))
        }
        PropertyValue::Map(map) => map.values().try_for_each(|item| check_list_bounds(key, item)),
        _ => Ok(()),
    }
}
