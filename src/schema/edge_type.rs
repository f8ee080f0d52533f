//! Edge type definitions
//!
//! An edge type classifies an edge as a property (node -> attribute value) or
//! a relationship (node -> node) and carries the keyed/index/inline policy the
//! index overlay acts on.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{AttrKind, ETypeId};

// ============================================================================
// Policies
// ============================================================================

/// Whether an edge type is a property type or a relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeCategory {
  Property,
  Relationship,
}

/// Index policy of a property type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
  #[default]
  None,
  Standard,
}

impl IndexType {
  pub fn has_index(self) -> bool {
    matches!(self, IndexType::Standard)
  }
}

// ============================================================================
// Edge Type
// ============================================================================

/// Immutable definition backing an [`EdgeType`] handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTypeDef {
  pub id: ETypeId,
  pub name: String,
  pub category: EdgeCategory,
  /// At most one node per attribute value
  pub keyed: bool,
  pub index: IndexType,
  /// Inline edges are never indexed, whatever the index policy says
  pub inline: bool,
  /// Declared attribute kind (property types only)
  pub data_type: Option<AttrKind>,
}

/// Shared handle to an edge type; equality and hashing use the type id
#[derive(Clone)]
pub struct EdgeType(Arc<EdgeTypeDef>);

impl EdgeType {
  pub fn new(def: EdgeTypeDef) -> Self {
    Self(Arc::new(def))
  }

  pub fn id(&self) -> ETypeId {
    self.0.id
  }

  pub fn name(&self) -> &str {
    &self.0.name
  }

  pub fn category(&self) -> EdgeCategory {
    self.0.category
  }

  pub fn definition(&self) -> &EdgeTypeDef {
    &self.0
  }

  pub fn is_property_type(&self) -> bool {
    self.0.category == EdgeCategory::Property
  }

  pub fn is_relationship_type(&self) -> bool {
    self.0.category == EdgeCategory::Relationship
  }

  pub fn is_keyed(&self) -> bool {
    self.0.keyed
  }

  pub fn index_type(&self) -> IndexType {
    self.0.index
  }

  pub fn has_index(&self) -> bool {
    self.0.index.has_index()
  }

  pub fn is_inline(&self) -> bool {
    self.0.inline
  }

  pub fn data_type(&self) -> Option<AttrKind> {
    self.0.data_type
  }

  pub fn as_property_type(&self) -> Option<PropertyType> {
    self
      .is_property_type()
      .then(|| PropertyType(self.clone()))
  }

  pub fn as_relationship_type(&self) -> Option<RelationshipType> {
    self
      .is_relationship_type()
      .then(|| RelationshipType(self.clone()))
  }
}

impl PartialEq for EdgeType {
  fn eq(&self, other: &Self) -> bool {
    self.0.id == other.0.id
  }
}

impl Eq for EdgeType {}

impl Hash for EdgeType {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.id.hash(state);
  }
}

impl fmt::Debug for EdgeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EdgeType")
      .field("id", &self.0.id)
      .field("name", &self.0.name)
      .field("category", &self.0.category)
      .finish()
  }
}

impl fmt::Display for EdgeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.name)
  }
}

// ============================================================================
// Typed Wrappers
// ============================================================================

/// Edge type known to be a property type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyType(EdgeType);

impl PropertyType {
  pub fn edge_type(&self) -> &EdgeType {
    &self.0
  }

  pub fn into_edge_type(self) -> EdgeType {
    self.0
  }
}

impl Deref for PropertyType {
  type Target = EdgeType;

  fn deref(&self) -> &EdgeType {
    &self.0
  }
}

impl fmt::Display for PropertyType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

/// Edge type known to be a relationship type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipType(EdgeType);

impl RelationshipType {
  pub fn edge_type(&self) -> &EdgeType {
    &self.0
  }

  pub fn into_edge_type(self) -> EdgeType {
    self.0
  }
}

impl Deref for RelationshipType {
  type Target = EdgeType;

  fn deref(&self) -> &EdgeType {
    &self.0
  }
}

impl fmt::Display for RelationshipType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn def(id: ETypeId, name: &str, category: EdgeCategory) -> EdgeTypeDef {
    EdgeTypeDef {
      id,
      name: name.to_string(),
      category,
      keyed: false,
      index: IndexType::None,
      inline: false,
      data_type: None,
    }
  }

  #[test]
  fn test_capability_queries() {
    let prop = EdgeType::new(def(1, "age", EdgeCategory::Property));
    let rel = EdgeType::new(def(2, "knows", EdgeCategory::Relationship));

    assert!(prop.as_property_type().is_some());
    assert!(prop.as_relationship_type().is_none());
    assert!(rel.as_relationship_type().is_some());
    assert!(rel.as_property_type().is_none());
  }

  #[test]
  fn test_identity_is_type_id() {
    let a = EdgeType::new(def(7, "tag", EdgeCategory::Property));
    let b = EdgeType::new(def(7, "renamed", EdgeCategory::Property));
    let c = EdgeType::new(def(8, "tag", EdgeCategory::Property));
    assert_eq!(a, b);
    assert_ne!(a, c);
  }
}
