//! Edge type builder scoped to one transaction

use tracing::debug;

use crate::constants::SYSTEM_NAME_PREFIX;
use crate::error::{Result, TxError};
use crate::tx::GraphTx;
use crate::types::AttrKind;

use super::edge_type::{
  EdgeCategory, EdgeType, EdgeTypeDef, IndexType, PropertyType, RelationshipType,
};
use super::EdgeTypeManager;

/// Builder for property and relationship types
///
/// Obtained from [`GraphTx::create_edge_type`]. Making a type allocates an id
/// from the edge type manager and registers the name in the transaction's
/// reserved name index.
pub struct EdgeTypeBuilder<'a> {
  tx: &'a GraphTx,
  manager: &'a dyn EdgeTypeManager,
  name: Option<String>,
  keyed: bool,
  index: IndexType,
  inline: bool,
  data_type: Option<AttrKind>,
}

impl<'a> EdgeTypeBuilder<'a> {
  pub fn new(tx: &'a GraphTx, manager: &'a dyn EdgeTypeManager) -> Self {
    Self {
      tx,
      manager,
      name: None,
      keyed: false,
      index: IndexType::None,
      inline: false,
      data_type: None,
    }
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// At most one node per attribute value; implies an index
  pub fn keyed(mut self) -> Self {
    self.keyed = true;
    self.index = IndexType::Standard;
    self
  }

  pub fn indexed(mut self) -> Self {
    self.index = IndexType::Standard;
    self
  }

  pub fn inline(mut self) -> Self {
    self.inline = true;
    self
  }

  pub fn data_type(mut self, kind: AttrKind) -> Self {
    self.data_type = Some(kind);
    self
  }

  pub fn make_property_type(self) -> Result<PropertyType> {
    let et = self.make(EdgeCategory::Property)?;
    et.as_property_type()
      .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a property type")))
  }

  pub fn make_relationship_type(self) -> Result<RelationshipType> {
    let et = self.make(EdgeCategory::Relationship)?;
    et.as_relationship_type()
      .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a relationship type")))
  }

  fn make(self, category: EdgeCategory) -> Result<EdgeType> {
    let name = self
      .name
      .filter(|n| !n.is_empty())
      .ok_or_else(|| TxError::InvalidSchema("Edge type name is required".to_string()))?;

    if name.starts_with(SYSTEM_NAME_PREFIX) {
      return Err(TxError::InvalidSchema(format!(
        "Edge type names starting with '{SYSTEM_NAME_PREFIX}' are reserved: {name}"
      )));
    }

    if category == EdgeCategory::Relationship
      && (self.keyed || self.index.has_index() || self.data_type.is_some())
    {
      return Err(TxError::InvalidSchema(format!(
        "Relationship type {name} cannot be keyed, indexed or typed"
      )));
    }

    if self.keyed && self.inline {
      return Err(TxError::InvalidSchema(format!(
        "Keyed property type {name} cannot be inline"
      )));
    }

    let et = EdgeType::new(EdgeTypeDef {
      id: self.manager.alloc_etype_id(),
      name,
      category,
      keyed: self.keyed,
      index: self.index,
      inline: self.inline,
      data_type: self.data_type,
    });

    self.tx.define_edge_type(&et)?;
    debug!(etype = %et, id = et.id(), category = ?category, "defined edge type");
    Ok(et)
  }
}
