//! Edge type resolution by name
//!
//! Names resolve through the overlay's reserved type name index. Unknown names
//! are synthesized by the configured auto-creation policy when enabled.

use tracing::{debug, warn};

use crate::error::{Result, TxError};
use crate::schema::{EdgeType, PropertyType, RelationshipType};

use super::GraphTx;

impl GraphTx {
  pub fn contains_edge_type(&self, name: &str) -> Result<bool> {
    Ok(self.state()?.overlay.contains_type(name))
  }

  pub fn get_edge_type(&self, name: &str) -> Result<Option<EdgeType>> {
    Ok(self.state()?.overlay.get_type(name))
  }

  /// Resolve a property type, auto-creating it if allowed
  pub fn get_property_type(&self, name: &str) -> Result<PropertyType> {
    if let Some(et) = self.get_edge_type(name)? {
      return expect_property_type(&et);
    }
    if !self.config.auto_create_edge_types {
      return Err(TxError::UnknownEdgeType(name.to_string()));
    }

    let maker = self.config.auto_edge_type_maker.clone();
    match maker.make_property_type(name, self.create_edge_type()?) {
      Ok(ptype) => {
        debug!(txid = self.txid, etype = name, "auto-created property type");
        Ok(ptype)
      }
      Err(TxError::DuplicateKey { .. }) => {
        let et = self.lost_race(name)?;
        expect_property_type(&et)
      }
      Err(err) => Err(err),
    }
  }

  /// Resolve a relationship type, auto-creating it if allowed
  pub fn get_relationship_type(&self, name: &str) -> Result<RelationshipType> {
    if let Some(et) = self.get_edge_type(name)? {
      return expect_relationship_type(&et);
    }
    if !self.config.auto_create_edge_types {
      return Err(TxError::UnknownEdgeType(name.to_string()));
    }

    let maker = self.config.auto_edge_type_maker.clone();
    match maker.make_relationship_type(name, self.create_edge_type()?) {
      Ok(rtype) => {
        debug!(txid = self.txid, etype = name, "auto-created relationship type");
        Ok(rtype)
      }
      Err(TxError::DuplicateKey { .. }) => {
        let et = self.lost_race(name)?;
        expect_relationship_type(&et)
      }
      Err(err) => Err(err),
    }
  }

  /// Register a type made in this transaction under its name
  pub fn define_edge_type(&self, et: &EdgeType) -> Result<()> {
    self.verify_write_access()?;
    let state = self.state()?;
    if state.overlay.define_type(et)? {
      state.pending.lock().defined_types.push(et.clone());
    }
    Ok(())
  }

  /// Register a type that storage already holds
  pub fn loaded_edge_type(&self, et: &EdgeType) -> Result<()> {
    self.state()?.overlay.define_type(et)?;
    Ok(())
  }

  /// Another caller defined `name` first; use its type
  fn lost_race(&self, name: &str) -> Result<EdgeType> {
    warn!(txid = self.txid, etype = name, "edge type defined concurrently");
    self
      .get_edge_type(name)?
      .ok_or_else(|| TxError::UnknownEdgeType(name.to_string()))
  }
}

fn expect_property_type(et: &EdgeType) -> Result<PropertyType> {
  et.as_property_type()
    .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a property type")))
}

fn expect_relationship_type(et: &EdgeType) -> Result<RelationshipType> {
  et.as_relationship_type()
    .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a relationship type")))
}
