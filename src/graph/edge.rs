//! Edge handles: properties and relationships
//!
//! `Edge` is a closed variant exposing the capability queries the transaction
//! hooks branch on (`is_property`, `is_inline`, `is_new`, ...).

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::schema::{EdgeType, PropertyType, RelationshipType};
use crate::types::{AttrValue, EdgeId, NodeId};

use super::node::{Node, WeakNode};

// ============================================================================
// Lifecycle State
// ============================================================================

/// Lifecycle state of an edge within a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityState {
  /// Created in this transaction
  New = 0,
  /// Materialized from storage
  Loaded = 1,
  /// Deleted in this transaction
  Removed = 2,
}

impl EntityState {
  fn from_u8(value: u8) -> Self {
    match value {
      0 => EntityState::New,
      1 => EntityState::Loaded,
      _ => EntityState::Removed,
    }
  }
}

struct StateCell(AtomicU8);

impl StateCell {
  fn new(state: EntityState) -> Self {
    Self(AtomicU8::new(state as u8))
  }

  fn get(&self) -> EntityState {
    EntityState::from_u8(self.0.load(Ordering::Acquire))
  }

  /// Returns false if the edge was already removed
  fn mark_removed(&self) -> bool {
    self.0.swap(EntityState::Removed as u8, Ordering::AcqRel) != EntityState::Removed as u8
  }
}

// ============================================================================
// Property
// ============================================================================

struct PropertyData {
  id: EdgeId,
  ptype: PropertyType,
  start: WeakNode,
  start_id: NodeId,
  attribute: AttrValue,
  state: StateCell,
}

/// Edge from a node to an attribute value
#[derive(Clone)]
pub struct Property(Arc<PropertyData>);

impl Property {
  /// Property created in the current transaction (not attached)
  pub fn new_edge(id: EdgeId, ptype: PropertyType, start: &Node, attribute: AttrValue) -> Self {
    Self::with_state(id, ptype, start, attribute, EntityState::New)
  }

  /// Property materialized from storage (not attached)
  pub fn loaded(id: EdgeId, ptype: PropertyType, start: &Node, attribute: AttrValue) -> Self {
    Self::with_state(id, ptype, start, attribute, EntityState::Loaded)
  }

  fn with_state(
    id: EdgeId,
    ptype: PropertyType,
    start: &Node,
    attribute: AttrValue,
    state: EntityState,
  ) -> Self {
    Self(Arc::new(PropertyData {
      id,
      ptype,
      start: start.downgrade(),
      start_id: start.id(),
      attribute,
      state: StateCell::new(state),
    }))
  }

  pub fn id(&self) -> EdgeId {
    self.0.id
  }

  pub fn property_type(&self) -> &PropertyType {
    &self.0.ptype
  }

  pub fn attribute(&self) -> &AttrValue {
    &self.0.attribute
  }

  pub fn start(&self) -> Option<Node> {
    self.0.start.upgrade()
  }

  pub fn start_id(&self) -> NodeId {
    self.0.start_id
  }

  pub fn state(&self) -> EntityState {
    self.0.state.get()
  }

  pub fn is_new(&self) -> bool {
    self.state() == EntityState::New
  }

  pub fn is_loaded(&self) -> bool {
    self.state() == EntityState::Loaded
  }

  pub fn is_removed(&self) -> bool {
    self.state() == EntityState::Removed
  }

  pub fn is_inline(&self) -> bool {
    self.0.ptype.is_inline()
  }

  /// Participates in the index overlay
  pub fn is_indexable(&self) -> bool {
    self.0.ptype.has_index() && !self.is_inline()
  }
}

impl PartialEq for Property {
  fn eq(&self, other: &Self) -> bool {
    self.0.id == other.0.id
  }
}

impl Eq for Property {}

impl fmt::Debug for Property {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Property")
      .field("id", &self.0.id)
      .field("type", &self.0.ptype.name())
      .field("start", &self.0.start_id)
      .field("attribute", &self.0.attribute)
      .field("state", &self.state())
      .finish()
  }
}

// ============================================================================
// Relationship
// ============================================================================

struct RelationshipData {
  id: EdgeId,
  rtype: RelationshipType,
  start: WeakNode,
  start_id: NodeId,
  end: WeakNode,
  end_id: NodeId,
  state: StateCell,
}

/// Edge between two nodes
#[derive(Clone)]
pub struct Relationship(Arc<RelationshipData>);

impl Relationship {
  /// Relationship created in the current transaction (not attached)
  pub fn new_edge(id: EdgeId, rtype: RelationshipType, start: &Node, end: &Node) -> Self {
    Self::with_state(id, rtype, start, end, EntityState::New)
  }

  /// Relationship materialized from storage (not attached)
  pub fn loaded(id: EdgeId, rtype: RelationshipType, start: &Node, end: &Node) -> Self {
    Self::with_state(id, rtype, start, end, EntityState::Loaded)
  }

  fn with_state(
    id: EdgeId,
    rtype: RelationshipType,
    start: &Node,
    end: &Node,
    state: EntityState,
  ) -> Self {
    Self(Arc::new(RelationshipData {
      id,
      rtype,
      start: start.downgrade(),
      start_id: start.id(),
      end: end.downgrade(),
      end_id: end.id(),
      state: StateCell::new(state),
    }))
  }

  pub fn id(&self) -> EdgeId {
    self.0.id
  }

  pub fn relationship_type(&self) -> &RelationshipType {
    &self.0.rtype
  }

  pub fn start(&self) -> Option<Node> {
    self.0.start.upgrade()
  }

  pub fn start_id(&self) -> NodeId {
    self.0.start_id
  }

  pub fn end(&self) -> Option<Node> {
    self.0.end.upgrade()
  }

  pub fn end_id(&self) -> NodeId {
    self.0.end_id
  }

  pub fn state(&self) -> EntityState {
    self.0.state.get()
  }

  pub fn is_new(&self) -> bool {
    self.state() == EntityState::New
  }

  pub fn is_removed(&self) -> bool {
    self.state() == EntityState::Removed
  }
}

impl PartialEq for Relationship {
  fn eq(&self, other: &Self) -> bool {
    self.0.id == other.0.id
  }
}

impl Eq for Relationship {}

impl fmt::Debug for Relationship {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Relationship")
      .field("id", &self.0.id)
      .field("type", &self.0.rtype.name())
      .field("start", &self.0.start_id)
      .field("end", &self.0.end_id)
      .field("state", &self.state())
      .finish()
  }
}

// ============================================================================
// Edge
// ============================================================================

/// Any edge: a property or a relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
  Property(Property),
  Relationship(Relationship),
}

impl Edge {
  pub fn id(&self) -> EdgeId {
    match self {
      Edge::Property(p) => p.id(),
      Edge::Relationship(r) => r.id(),
    }
  }

  pub fn edge_type(&self) -> &EdgeType {
    match self {
      Edge::Property(p) => p.property_type().edge_type(),
      Edge::Relationship(r) => r.relationship_type().edge_type(),
    }
  }

  pub fn is_property(&self) -> bool {
    matches!(self, Edge::Property(_))
  }

  pub fn is_relationship(&self) -> bool {
    matches!(self, Edge::Relationship(_))
  }

  pub fn is_inline(&self) -> bool {
    self.edge_type().is_inline()
  }

  pub fn state(&self) -> EntityState {
    match self {
      Edge::Property(p) => p.state(),
      Edge::Relationship(r) => r.state(),
    }
  }

  pub fn is_new(&self) -> bool {
    self.state() == EntityState::New
  }

  pub fn is_loaded(&self) -> bool {
    self.state() == EntityState::Loaded
  }

  pub fn is_removed(&self) -> bool {
    self.state() == EntityState::Removed
  }

  pub fn as_property(&self) -> Option<&Property> {
    match self {
      Edge::Property(p) => Some(p),
      Edge::Relationship(_) => None,
    }
  }

  pub fn as_relationship(&self) -> Option<&Relationship> {
    match self {
      Edge::Relationship(r) => Some(r),
      Edge::Property(_) => None,
    }
  }

  pub fn start_id(&self) -> NodeId {
    match self {
      Edge::Property(p) => p.start_id(),
      Edge::Relationship(r) => r.start_id(),
    }
  }

  /// Flip to `Removed`; returns false if it already was
  pub(crate) fn mark_removed(&self) -> bool {
    match self {
      Edge::Property(p) => p.0.state.mark_removed(),
      Edge::Relationship(r) => r.0.state.mark_removed(),
    }
  }

  /// Detach from every endpoint that is still alive
  pub(crate) fn detach(&self) {
    let id = self.id();
    match self {
      Edge::Property(p) => {
        if let Some(start) = p.start() {
          start.detach(id);
        }
      }
      Edge::Relationship(r) => {
        if let Some(start) = r.start() {
          start.detach(id);
        }
        if let Some(end) = r.end() {
          end.detach(id);
        }
      }
    }
  }
}

impl From<Property> for Edge {
  fn from(value: Property) -> Self {
    Edge::Property(value)
  }
}

impl From<Relationship> for Edge {
  fn from(value: Relationship) -> Self {
    Edge::Relationship(value)
  }
}
