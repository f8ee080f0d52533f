//! Key and attribute index lookups
//!
//! Key lookups only consult the overlay. Attribute lookups merge a storage
//! scan with the overlay; both sides resolve to the transaction's own node
//! handles, so the union has one entry per node. A storage hit is kept only
//! while the node still holds a live matching property.

use std::collections::HashSet;

use crate::error::{Result, TxError};
use crate::graph::Node;
use crate::schema::PropertyType;
use crate::types::{AttrValue, Interval};

use super::GraphTx;

impl GraphTx {
  pub fn get_node_by_key(
    &self,
    ptype: &PropertyType,
    key: impl Into<AttrValue>,
  ) -> Result<Option<Node>> {
    if !ptype.is_keyed() {
      return Err(TxError::TypeMismatch(format!(
        "property type {ptype} is not keyed"
      )));
    }
    Ok(self.state()?.overlay.get_key(ptype, &key.into()))
  }

  /// Key lookup by type name; unknown names find nothing
  pub fn get_node_by_key_name(&self, name: &str, key: impl Into<AttrValue>) -> Result<Option<Node>> {
    match self.get_edge_type(name)? {
      Some(et) => {
        let ptype = et
          .as_property_type()
          .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a property type")))?;
        self.get_node_by_key(&ptype, key)
      }
      None => Ok(None),
    }
  }

  pub fn get_nodes_by_attribute(
    &self,
    ptype: &PropertyType,
    value: impl Into<AttrValue>,
  ) -> Result<HashSet<Node>> {
    self.get_nodes_in_interval(ptype, &Interval::point(value))
  }

  pub fn get_nodes_by_attribute_name(
    &self,
    name: &str,
    value: impl Into<AttrValue>,
  ) -> Result<HashSet<Node>> {
    self.get_nodes_in_interval_by_name(name, &Interval::point(value))
  }

  /// Nodes holding a `ptype` property whose value lies in `interval`
  pub fn get_nodes_in_interval(
    &self,
    ptype: &PropertyType,
    interval: &Interval,
  ) -> Result<HashSet<Node>> {
    if !ptype.has_index() {
      return Err(TxError::TypeMismatch(format!(
        "property type {ptype} is not indexed"
      )));
    }
    let state = self.state()?;
    let mut nodes = HashSet::new();
    if interval.is_empty() {
      return Ok(nodes);
    }

    // Storage has not seen this transaction's deletions
    for id in self.ctx.storage.attribute_index_scan(ptype, interval)? {
      let node = self
        .node_in(&state, id)?
        .ok_or(TxError::NodeNotFound(id))?;
      let live = node
        .properties_of(ptype)
        .iter()
        .any(|p| interval.contains(p.attribute()));
      if live {
        nodes.insert(node);
      }
    }
    nodes.extend(state.overlay.nodes_in_interval(ptype, interval));
    Ok(nodes)
  }

  pub fn get_nodes_in_interval_by_name(
    &self,
    name: &str,
    interval: &Interval,
  ) -> Result<HashSet<Node>> {
    match self.get_edge_type(name)? {
      Some(et) => {
        let ptype = et
          .as_property_type()
          .ok_or_else(|| TxError::TypeMismatch(format!("{et} is not a property type")))?;
        self.get_nodes_in_interval(&ptype, interval)
      }
      None => Ok(HashSet::new()),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crate::error::TxError;
  use crate::storage::MemoryStorage;
  use crate::tx::{begin_tx, GraphTx, TxContext};
  use crate::types::Interval;

  fn tx() -> GraphTx {
    begin_tx(&TxContext::new(Arc::new(MemoryStorage::new()))).unwrap()
  }

  #[test]
  fn test_key_lookup_requires_keyed_type() {
    let tx = tx();
    let tag = tx
      .create_edge_type()
      .unwrap()
      .name("tag")
      .indexed()
      .make_property_type()
      .unwrap();
    assert!(matches!(
      tx.get_node_by_key(&tag, "x"),
      Err(TxError::TypeMismatch(_))
    ));
  }

  #[test]
  fn test_attribute_lookup_requires_index() {
    let tx = tx();
    let plain = tx.get_property_type("plain").unwrap();
    assert!(matches!(
      tx.get_nodes_by_attribute(&plain, 1),
      Err(TxError::TypeMismatch(_))
    ));
  }

  #[test]
  fn test_unknown_names_find_nothing() {
    let tx = tx();
    assert_eq!(tx.get_node_by_key_name("missing", 1).unwrap(), None);
    assert!(tx.get_nodes_by_attribute_name("missing", 1).unwrap().is_empty());
    assert!(!tx.contains_edge_type("missing").unwrap());
  }

  #[test]
  fn test_range_lookup_in_overlay() {
    let tx = tx();
    let score = tx
      .create_edge_type()
      .unwrap()
      .name("score")
      .indexed()
      .make_property_type()
      .unwrap();
    let low = tx.create_node().unwrap();
    let mid = tx.create_node().unwrap();
    let high = tx.create_node().unwrap();
    tx.create_property(&score, &low, 1).unwrap();
    tx.create_property(&score, &mid, 5).unwrap();
    tx.create_property(&score, &high, 9).unwrap();

    let found = tx
      .get_nodes_in_interval_by_name("score", &Interval::between(2, 9))
      .unwrap();
    assert_eq!(found.len(), 1);
    assert!(found.contains(&mid));

    let found = tx
      .get_nodes_in_interval(&score, &Interval::closed(1, 9))
      .unwrap();
    assert_eq!(found.len(), 3);
  }
}
