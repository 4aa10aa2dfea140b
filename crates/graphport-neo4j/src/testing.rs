//! Test support: raw fragment builders and a scripted in-process transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use graphport_core::{Properties, PropertyValue, IDENTITY_KEY};

use crate::compiler::Statement;
use crate::transport::{RawNode, RawRelationship, RawRow, RawValue, Transport, TransportError};

fn stored(id: &str, props: &[(&str, PropertyValue)]) -> Properties {
    let mut properties: Properties = props
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    properties.insert(IDENTITY_KEY.to_string(), PropertyValue::from(id));
    properties
}

pub fn raw_node(element_id: i64, id: &str, labels: &[&str], props: &[(&str, PropertyValue)]) -> RawValue {
    RawValue::Node(RawNode {
        element_id,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        properties: stored(id, props),
    })
}

pub fn raw_link(
    element_id: i64,
    start_id: i64,
    end_id: i64,
    id: &str,
    rel_type: &str,
    props: &[(&str, PropertyValue)],
) -> RawValue {
    RawValue::Relationship(RawRelationship {
        element_id,
        start_id,
        end_id,
        rel_type: rel_type.to_string(),
        properties: stored(id, props),
    })
}

pub fn flag_row(found: bool) -> Vec<RawRow> {
    vec![RawRow::new().with("found", RawValue::Scalar(PropertyValue::Boolean(found)))]
}

pub fn count_row(deleted: i64) -> Vec<RawRow> {
    vec![RawRow::new().with("deleted", RawValue::Scalar(PropertyValue::Integer(deleted)))]
}

/// Replays queued responses in order and records every statement it runs.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Vec<RawRow>, TransportError>>>,
    executed: Mutex<Vec<Statement>>,
    closed: Mutex<bool>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, rows: Vec<RawRow>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Statement(message.to_string())));
        self
    }

    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, statement: &Statement) -> Result<Vec<RawRow>, TransportError> {
        self.executed.lock().unwrap().push(statement.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Statement(format!("no scripted reply for: {}", statement.text))))
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}
