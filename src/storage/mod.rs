//! Storage collaborator surface
//!
//! The transaction core never touches disk itself. It asks storage for the
//! node ids matching an attribute interval, for node materialization, and
//! hands over its pending changes on flush and commit.

use crate::constants::{INITIAL_EDGE_ID, INITIAL_ETYPE_ID, INITIAL_NODE_ID};
use crate::error::Result;
use crate::graph::{Edge, Node};
use crate::schema::{EdgeType, PropertyType};
use crate::types::{ETypeId, EdgeId, Interval, NodeId};

mod memory;

pub use memory::MemoryStorage;

/// Changes accumulated by a transaction since its last flush
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
  pub defined_types: Vec<EdgeType>,
  pub created_nodes: Vec<Node>,
  pub added_edges: Vec<Edge>,
  pub deleted_edges: Vec<Edge>,
}

impl ChangeSet {
  pub fn is_empty(&self) -> bool {
    self.defined_types.is_empty()
      && self.created_nodes.is_empty()
      && self.added_edges.is_empty()
      && self.deleted_edges.is_empty()
  }

  pub fn len(&self) -> usize {
    self.defined_types.len()
      + self.created_nodes.len()
      + self.added_edges.len()
      + self.deleted_edges.len()
  }
}

/// First ids not yet used by anything a storage holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextIds {
  pub node: NodeId,
  pub edge: EdgeId,
  pub etype: ETypeId,
}

impl Default for NextIds {
  fn default() -> Self {
    Self {
      node: INITIAL_NODE_ID,
      edge: INITIAL_EDGE_ID,
      etype: INITIAL_ETYPE_ID,
    }
  }
}

impl NextIds {
  pub fn observe_node(&mut self, id: NodeId) {
    self.node = self.node.max(id + 1);
  }

  pub fn observe_edge(&mut self, id: EdgeId) {
    self.edge = self.edge.max(id + 1);
  }

  pub fn observe_etype(&mut self, id: ETypeId) {
    self.etype = self.etype.max(id + 1);
  }
}

/// Storage query and persistence surface consumed by a transaction
///
/// All calls are synchronous and may block; timeouts and cancellation belong
/// to the implementation.
pub trait TxStorage: Send + Sync {
  /// Ids of nodes holding a property of `ptype` whose value lies in `interval`
  fn attribute_index_scan(&self, ptype: &PropertyType, interval: &Interval) -> Result<Vec<NodeId>>;

  /// Materialize a stored node with its stored edges attached in the loaded state
  fn resolve_node(&self, id: NodeId) -> Result<Node>;

  /// Edge types already persisted; registered when a transaction opens
  fn edge_types(&self) -> Result<Vec<EdgeType>>;

  /// Durably apply a batch of changes
  fn persist(&self, changes: &ChangeSet) -> Result<()>;

  /// Where id allocation continues for a context opened over this storage
  fn next_ids(&self) -> NextIds;
}
