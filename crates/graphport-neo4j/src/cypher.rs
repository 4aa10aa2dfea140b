//! Pure string transforms for Cypher label clauses and literals.

use graphport_core::{Properties, PropertyValue};

/// Render a label set as `:`A`:`B``. Empty input renders as "".
pub fn labels_clause(labels: &[String]) -> String {
    labels.iter().map(|l| label_token(l)).collect()
}

/// Render a single label or relationship type as a colon-prefixed,
/// backtick-quoted token.
pub fn label_token(label: &str) -> String {
    format!(":`{}`", label.replace('`', "``"))
}

/// Render properties as a Cypher map literal with unquoted identifier keys.
pub fn properties_literal(properties: &Properties) -> String {
    let entries: Vec<String> = properties
        .iter()
        .map(|(k, v)| format!("{}: {}", map_key(k), literal(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Render one value in Cypher literal syntax.
pub fn literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(f) => float_literal(*f),
        PropertyValue::String(s) => string_literal(s),
        PropertyValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        PropertyValue::Map(map) => properties_literal(map),
    }
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "0.0 / 0.0".to_string()
    } else if f == f64::INFINITY {
        "1.0 / 0.0".to_string()
    } else if f == f64::NEG_INFINITY {
        "-1.0 / 0.0".to_string()
    } else {
        // Debug keeps a trailing ".0" on whole numbers so they stay floats.
        format!("{f:?}")
    }
}

fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn map_key(key: &str) -> String {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        key.to_string()
    } else {
        format!("`{}`", key.replace('`', "``"))
    }
}
