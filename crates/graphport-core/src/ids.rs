//! Identifier candidates for new nodes and links.
//!
//! Candidates are only unique with overwhelming probability; adapters verify
//! each one against the store before handing it out
//! (see [`GraphStore::generate_node_id`](crate::port::GraphStore::generate_node_id)).

use uuid::Uuid;

pub const NODE_ID_PREFIX: &str = "node#";
pub const LINK_ID_PREFIX: &str = "link#";

pub fn node_id_candidate() -> String {
    format!("{NODE_ID_PREFIX}{}", Uuid::new_v4())
}

pub fn link_id_candidate() -> String {
    format!("{LINK_ID_PREFIX}{}", Uuid::new_v4())
}
