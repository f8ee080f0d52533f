//! Automatic edge type creation policy

use std::fmt;

use crate::error::Result;

use super::builder::EdgeTypeBuilder;
use super::edge_type::{PropertyType, RelationshipType};

/// Policy used by the resolver to synthesize edge types for unknown names
///
/// The builder handed in is freshly opened on the requesting transaction; the
/// policy names it and chooses the keyed/index/inline policy.
pub trait AutoEdgeTypeMaker: fmt::Debug + Send + Sync {
  fn make_property_type(&self, name: &str, builder: EdgeTypeBuilder<'_>) -> Result<PropertyType>;

  fn make_relationship_type(
    &self,
    name: &str,
    builder: EdgeTypeBuilder<'_>,
  ) -> Result<RelationshipType>;
}

/// Non-keyed, non-indexed, non-inline property types and plain relationship types
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAutoEdgeTypes;

impl AutoEdgeTypeMaker for DefaultAutoEdgeTypes {
  fn make_property_type(&self, name: &str, builder: EdgeTypeBuilder<'_>) -> Result<PropertyType> {
    builder.name(name).make_property_type()
  }

  fn make_relationship_type(
    &self,
    name: &str,
    builder: EdgeTypeBuilder<'_>,
  ) -> Result<RelationshipType> {
    builder.name(name).make_relationship_type()
  }
}

/// Auto-created property types are indexed, so attribute lookups work on them
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexedAutoEdgeTypes;

impl AutoEdgeTypeMaker for IndexedAutoEdgeTypes {
  fn make_property_type(&self, name: &str, builder: EdgeTypeBuilder<'_>) -> Result<PropertyType> {
    builder.name(name).indexed().make_property_type()
  }

  fn make_relationship_type(
    &self,
    name: &str,
    builder: EdgeTypeBuilder<'_>,
  ) -> Result<RelationshipType> {
    builder.name(name).make_relationship_type()
  }
}
