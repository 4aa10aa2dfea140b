//! graphport-core: the backend-agnostic graph-storage port.
//!
//! This crate provides everything an adapter shares with its callers:
//! - Domain values (`Node`, `Link`, `Graph`, `PropertyValue`) and update deltas
//! - Input constraints checked before any statement reaches a database
//! - The error vocabulary common to all adapters
//! - Graph assembly from flat node/link fragments
//! - The `GraphStore` trait every adapter implements

pub mod assembly;
pub mod error;
pub mod ids;
pub mod port;
pub mod types;
pub mod validate;

pub use assembly::{EndpointPolicy, GraphAssembler};
pub use error::{EntityKind, GraphPortError, Result};
pub use port::{GraphStore, RawQuery};
pub use types::{Graph, Link, LinkDelta, Node, NodeDelta, Properties, PropertyValue};
pub use validate::{ValidationError, IDENTITY_KEY};
