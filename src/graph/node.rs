//! Node handles
//!
//! A node owns its adjacency (the live edges attached to it). Edges point back
//! at their endpoints weakly, so a node and its edges never form a cycle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::schema::PropertyType;
use crate::types::{EdgeId, NodeId};

use super::edge::{Edge, Property, Relationship};

struct NodeData {
  id: NodeId,
  /// Created in the current transaction (as opposed to loaded from storage)
  new: bool,
  edges: RwLock<Vec<Edge>>,
}

/// Graph vertex handle; equality and hashing use the node id
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
  /// Handle for a node created in the current transaction
  pub fn new_node(id: NodeId) -> Self {
    Self::with_state(id, true)
  }

  /// Handle for a node materialized from storage
  pub fn loaded(id: NodeId) -> Self {
    Self::with_state(id, false)
  }

  fn with_state(id: NodeId, new: bool) -> Self {
    Self(Arc::new(NodeData {
      id,
      new,
      edges: RwLock::new(Vec::new()),
    }))
  }

  pub fn id(&self) -> NodeId {
    self.0.id
  }

  pub fn is_new(&self) -> bool {
    self.0.new
  }

  /// Snapshot of the live edges attached to this node
  pub fn edges(&self) -> Vec<Edge> {
    self.0.edges.read().clone()
  }

  pub fn edge_count(&self) -> usize {
    self.0.edges.read().len()
  }

  pub fn properties(&self) -> Vec<Property> {
    self
      .0
      .edges
      .read()
      .iter()
      .filter_map(|e| e.as_property().cloned())
      .collect()
  }

  /// Live properties of one type
  pub fn properties_of(&self, ptype: &PropertyType) -> Vec<Property> {
    self
      .0
      .edges
      .read()
      .iter()
      .filter_map(Edge::as_property)
      .filter(|p| p.property_type() == ptype && !p.is_removed())
      .cloned()
      .collect()
  }

  pub fn relationships(&self) -> Vec<Relationship> {
    self
      .0
      .edges
      .read()
      .iter()
      .filter_map(|e| e.as_relationship().cloned())
      .collect()
  }

  /// Attach an edge to this node's adjacency
  pub fn attach(&self, edge: Edge) {
    self.0.edges.write().push(edge);
  }

  /// Detach an edge; returns false if it was not attached
  pub fn detach(&self, edge_id: EdgeId) -> bool {
    let mut edges = self.0.edges.write();
    match edges.iter().position(|e| e.id() == edge_id) {
      Some(pos) => {
        edges.remove(pos);
        true
      }
      None => false,
    }
  }

  pub fn downgrade(&self) -> WeakNode {
    WeakNode(Arc::downgrade(&self.0))
  }
}

impl PartialEq for Node {
  fn eq(&self, other: &Self) -> bool {
    self.0.id == other.0.id
  }
}

impl Eq for Node {}

impl Hash for Node {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.id.hash(state);
  }
}

impl fmt::Debug for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Node")
      .field("id", &self.0.id)
      .field("new", &self.0.new)
      .finish()
  }
}

/// Non-owning node reference held by edges
#[derive(Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
  pub fn upgrade(&self) -> Option<Node> {
    self.0.upgrade().map(Node)
  }
}

impl fmt::Debug for WeakNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.upgrade() {
      Some(node) => write!(f, "WeakNode({})", node.id()),
      None => f.write_str("WeakNode(<dropped>)"),
    }
  }
}
