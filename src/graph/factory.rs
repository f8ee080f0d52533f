//! Node and edge factories
//!
//! Factories allocate identities for new entities and wire edges into their
//! endpoints' adjacency. The transaction decides when they are called and
//! runs the lifecycle hooks afterwards.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::{INITIAL_EDGE_ID, INITIAL_NODE_ID};
use crate::error::Result;
use crate::schema::{PropertyType, RelationshipType};
use crate::tx::GraphTx;
use crate::types::{AttrValue, EdgeId, NodeId};

use super::edge::{Edge, Property, Relationship};
use super::node::Node;

// ============================================================================
// Factory Traits
// ============================================================================

pub trait NodeFactory: Send + Sync {
  /// Allocate a new node for `tx`
  fn create_new_node(&self, tx: &GraphTx) -> Result<Node>;
}

pub trait EdgeFactory: Send + Sync {
  /// Create a new property and attach it to `start`
  fn create_new_property(
    &self,
    ptype: &PropertyType,
    start: &Node,
    attribute: AttrValue,
  ) -> Result<Property>;

  /// Create a new relationship and attach it to both endpoints
  fn create_new_relationship(
    &self,
    rtype: &RelationshipType,
    start: &Node,
    end: &Node,
  ) -> Result<Relationship>;
}

// ============================================================================
// Standard Factories
// ============================================================================

/// Node factory backed by an atomic id counter
#[derive(Debug)]
pub struct StandardNodeFactory {
  next_node_id: AtomicU64,
}

impl StandardNodeFactory {
  pub fn new() -> Self {
    Self::starting_at(INITIAL_NODE_ID)
  }

  pub fn starting_at(next: NodeId) -> Self {
    Self {
      next_node_id: AtomicU64::new(next),
    }
  }

  /// Get current next node ID (without incrementing)
  pub fn peek_next_node_id(&self) -> NodeId {
    self.next_node_id.load(Ordering::SeqCst)
  }
}

impl Default for StandardNodeFactory {
  fn default() -> Self {
    Self::new()
  }
}

impl NodeFactory for StandardNodeFactory {
  fn create_new_node(&self, _tx: &GraphTx) -> Result<Node> {
    let id = self.next_node_id.fetch_add(1, Ordering::SeqCst);
    Ok(Node::new_node(id))
  }
}

/// Edge factory backed by an atomic id counter
#[derive(Debug)]
pub struct StandardEdgeFactory {
  next_edge_id: AtomicU64,
}

impl StandardEdgeFactory {
  pub fn new() -> Self {
    Self::starting_at(INITIAL_EDGE_ID)
  }

  pub fn starting_at(next: EdgeId) -> Self {
    Self {
      next_edge_id: AtomicU64::new(next),
    }
  }

  fn alloc_edge_id(&self) -> EdgeId {
    self.next_edge_id.fetch_add(1, Ordering::SeqCst)
  }
}

impl Default for StandardEdgeFactory {
  fn default() -> Self {
    Self::new()
  }
}

impl EdgeFactory for StandardEdgeFactory {
  fn create_new_property(
    &self,
    ptype: &PropertyType,
    start: &Node,
    attribute: AttrValue,
  ) -> Result<Property> {
    let property = Property::new_edge(self.alloc_edge_id(), ptype.clone(), start, attribute);
    start.attach(Edge::Property(property.clone()));
    Ok(property)
  }

  fn create_new_relationship(
    &self,
    rtype: &RelationshipType,
    start: &Node,
    end: &Node,
  ) -> Result<Relationship> {
    let relationship = Relationship::new_edge(self.alloc_edge_id(), rtype.clone(), start, end);
    start.attach(Edge::Relationship(relationship.clone()));
    end.attach(Edge::Relationship(relationship.clone()));
    Ok(relationship)
  }
}
