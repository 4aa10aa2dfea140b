use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assembly::AssemblyError;
use crate::validate::ValidationError;

/// Boxed driver failure carried by read/write errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Link,
    Graph,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Link => f.write_str("link"),
            Self::Graph => f.write_str("graph"),
        }
    }
}

/// Errors shared by every graph store adapter.
#[derive(Debug, thiserror::Error)]
pub enum GraphPortError {
    #[error("Connection is closed, cannot {operation}")]
    ConnectionClosed { operation: &'static str },

    #[error("Write error during {operation}: {source}")]
    Write {
        operation: &'static str,
        id: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("Read error during {operation}: {source}")]
    Read {
        operation: &'static str,
        id: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("Failed to parse {entity} from raw data: {reason}")]
    Parse { entity: EntityKind, reason: String },

    #[error("Could not retrieve expected {entity} with id {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl GraphPortError {
    pub fn parse(entity: EntityKind, reason: impl Into<String>) -> Self {
        Self::Parse {
            entity,
            reason: reason.into(),
        }
    }

    /// Short message suitable for end users. Driver detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConnectionClosed { .. } => "Connection is closed.".to_string(),
            Self::Write { .. } => "Write error, see log.".to_string(),
            Self::Read { .. } => "Read error, see log.".to_string(),
            Self::Parse { entity, .. } => format!("Failed to parse raw data as {entity}."),
            Self::NotFound { entity, .. } => format!("Could not retrieve expected {entity}."),
            Self::Validation(_) => "Invalid input.".to_string(),
        }
    }

    /// Developer-facing message: the user message followed by full detail.
    pub fn dev_message(&self) -> String {
        format!("{} {}", self.user_message().to_lowercase(), self)
    }
}

impl From<AssemblyError> for GraphPortError {
    fn from(err: AssemblyError) -> Self {
        Self::parse(EntityKind::Graph, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphPortError>;
