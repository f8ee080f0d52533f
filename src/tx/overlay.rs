//! Index overlay
//!
//! Transaction-local in-memory indexes layered above storage:
//!
//! - key index: keyed property type -> (value -> node), at most one node per value
//! - attribute index: indexed property type -> (value -> set of nodes)
//! - type name index: reserved system index from edge type name to edge type
//!
//! Per-type sub-indexes are created on first use through an atomic
//! get-or-insert on the outer map, then used without holding the outer shard.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::constants::{
  ATTRIBUTE_INDEX_CAPACITY, KEY_INDEX_CAPACITY, SYSTEM_EDGE_TYPE_NAME, TYPE_INDEX_CAPACITY,
};
use crate::error::{Result, TxError};
use crate::graph::{Node, Property};
use crate::schema::{EdgeType, PropertyType};
use crate::types::{AttrValue, ETypeId, Interval, NodeId};

type KeySubIndex = Arc<DashMap<AttrValue, Node>>;
type AttributeSubIndex = Arc<RwLock<HashMap<AttrValue, HashMap<NodeId, Node>>>>;

/// Outcome of [`IndexOverlay::remove_from_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRemoval {
  Removed,
  /// Another live property of the same node, type and value keeps the entry
  Retained,
}

/// Outcome of [`IndexOverlay::add_key_unchecked`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInsert {
  Inserted,
  AlreadyOwned,
  /// The value already belongs to another node, which keeps it
  Shadowed(Node),
}

#[derive(Debug)]
pub struct IndexOverlay {
  key_index: DashMap<ETypeId, KeySubIndex>,
  attribute_index: DashMap<ETypeId, AttributeSubIndex>,
  type_names: DashMap<String, EdgeType>,
}

impl Default for IndexOverlay {
  fn default() -> Self {
    Self::new()
  }
}

impl IndexOverlay {
  pub fn new() -> Self {
    Self {
      key_index: DashMap::with_capacity(TYPE_INDEX_CAPACITY),
      attribute_index: DashMap::with_capacity(TYPE_INDEX_CAPACITY),
      type_names: DashMap::with_capacity(TYPE_INDEX_CAPACITY),
    }
  }

  // ========================================================================
  // Sub-index access
  // ========================================================================

  fn key_subindex(&self, etype: ETypeId) -> KeySubIndex {
    self
      .key_index
      .entry(etype)
      .or_insert_with(|| Arc::new(DashMap::with_capacity(KEY_INDEX_CAPACITY)))
      .clone()
  }

  fn attribute_subindex(&self, etype: ETypeId) -> AttributeSubIndex {
    self
      .attribute_index
      .entry(etype)
      .or_insert_with(|| {
        Arc::new(RwLock::new(HashMap::with_capacity(ATTRIBUTE_INDEX_CAPACITY)))
      })
      .clone()
  }

  fn existing_key_subindex(&self, etype: ETypeId) -> Option<KeySubIndex> {
    self.key_index.get(&etype).map(|sub| sub.clone())
  }

  fn existing_attribute_subindex(&self, etype: ETypeId) -> Option<AttributeSubIndex> {
    self.attribute_index.get(&etype).map(|sub| sub.clone())
  }

  // ========================================================================
  // Insert
  // ========================================================================

  /// Index `(attribute, node)` under `ptype`
  ///
  /// Keyed types insert atomically if absent and fail if the value already
  /// belongs to a different node. Non-keyed types add the node to the value's
  /// node set; many nodes may share a value.
  ///
  /// Returns true when a new entry was inserted, false when the node already
  /// held it.
  pub fn add_to_index(&self, ptype: &PropertyType, attribute: &AttrValue, node: &Node) -> Result<bool> {
    require_index(ptype)?;

    if ptype.is_keyed() {
      match self.add_key_unchecked(ptype, attribute, node) {
        KeyInsert::Shadowed(_) => Err(TxError::DuplicateKey {
          etype: ptype.name().to_string(),
          attribute: attribute.to_string(),
        }),
        KeyInsert::Inserted => Ok(true),
        KeyInsert::AlreadyOwned => Ok(false),
      }
    } else {
      let previous = self
        .attribute_subindex(ptype.id())
        .write()
        .entry(attribute.clone())
        .or_default()
        .insert(node.id(), node.clone());
      Ok(previous.is_none())
    }
  }

  /// Keyed insert-if-absent that reports a conflict instead of failing
  pub fn add_key_unchecked(&self, ptype: &PropertyType, attribute: &AttrValue, node: &Node) -> KeyInsert {
    match self.key_subindex(ptype.id()).entry(attribute.clone()) {
      Entry::Occupied(owner) if owner.get() == node => KeyInsert::AlreadyOwned,
      Entry::Occupied(owner) => KeyInsert::Shadowed(owner.get().clone()),
      Entry::Vacant(slot) => {
        slot.insert(node.clone());
        KeyInsert::Inserted
      }
    }
  }

  // ========================================================================
  // Remove
  // ========================================================================

  /// Retract the index entry of a deleted property
  ///
  /// Nothing is removed while another live property on the same start node
  /// carries the same type and value. Otherwise the entry must exist and name
  /// the start node; anything else means the overlay diverged from the live
  /// edge set and is reported as [`TxError::OverlayCorruption`].
  pub fn remove_from_index(&self, property: &Property) -> Result<IndexRemoval> {
    let ptype = property.property_type();
    require_index(ptype)?;

    if has_identical_sibling(property) {
      debug!(
        etype = %ptype,
        node = property.start_id(),
        attribute = %property.attribute(),
        "index entry retained by identical property"
      );
      return Ok(IndexRemoval::Retained);
    }

    let attribute = property.attribute();
    let node_id = property.start_id();

    if ptype.is_keyed() {
      let sub = self.existing_key_subindex(ptype.id()).ok_or_else(|| {
        TxError::OverlayCorruption(format!("no key index for property type {ptype}"))
      })?;
      if sub.remove_if(attribute, |_, owner| owner.id() == node_id).is_some() {
        return Ok(IndexRemoval::Removed);
      }
      let msg = match sub.get(attribute) {
        Some(owner) => format!(
          "key {attribute} of {ptype} belongs to node {} instead of node {node_id}",
          owner.id()
        ),
        None => format!("key {attribute} of {ptype} is missing for node {node_id}"),
      };
      Err(TxError::OverlayCorruption(msg))
    } else {
      let sub = self.existing_attribute_subindex(ptype.id()).ok_or_else(|| {
        TxError::OverlayCorruption(format!("no attribute index for property type {ptype}"))
      })?;
      let mut map = sub.write();
      let removed = match map.get_mut(attribute) {
        Some(nodes) => {
          let removed = nodes.remove(&node_id).is_some();
          if nodes.is_empty() {
            map.remove(attribute);
          }
          removed
        }
        None => false,
      };
      if removed {
        Ok(IndexRemoval::Removed)
      } else {
        Err(TxError::OverlayCorruption(format!(
          "attribute {attribute} of {ptype} has no entry for node {node_id}"
        )))
      }
    }
  }

  /// Undo the entry a loaded property inserted during a failed materialization
  ///
  /// The entry stays if a live property created in this transaction on the
  /// same node carries the same type and value.
  pub fn retract_loaded(&self, property: &Property) {
    let ptype = property.property_type();
    let attribute = property.attribute();
    let node_id = property.start_id();

    let held_by_new = property.start().is_some_and(|start| {
      start.properties_of(ptype).iter().any(|other| {
        other != property && other.is_new() && other.attribute() == attribute
      })
    });
    if held_by_new {
      return;
    }

    if ptype.is_keyed() {
      if let Some(sub) = self.existing_key_subindex(ptype.id()) {
        sub.remove_if(attribute, |_, owner| owner.id() == node_id);
      }
    } else if let Some(sub) = self.existing_attribute_subindex(ptype.id()) {
      let mut map = sub.write();
      if let Some(nodes) = map.get_mut(attribute) {
        nodes.remove(&node_id);
        if nodes.is_empty() {
          map.remove(attribute);
        }
      }
    }
  }

  // ========================================================================
  // Lookup
  // ========================================================================

  pub fn get_key(&self, ptype: &PropertyType, key: &AttrValue) -> Option<Node> {
    self
      .existing_key_subindex(ptype.id())
      .and_then(|sub| sub.get(key).map(|owner| owner.clone()))
  }

  /// Overlay matches for an interval
  ///
  /// Point intervals are a direct lookup; ranges test every distinct value of
  /// the type, so they cost O(distinct values).
  pub fn nodes_in_interval(&self, ptype: &PropertyType, interval: &Interval) -> Vec<Node> {
    if ptype.is_keyed() {
      let Some(sub) = self.existing_key_subindex(ptype.id()) else {
        return Vec::new();
      };
      return match interval {
        Interval::Point(value) => sub.get(value).map(|n| vec![n.clone()]).unwrap_or_default(),
        Interval::Range { .. } => sub
          .iter()
          .filter(|entry| interval.contains(entry.key()))
          .map(|entry| entry.value().clone())
          .collect(),
      };
    }

    let Some(sub) = self.existing_attribute_subindex(ptype.id()) else {
      return Vec::new();
    };
    let map = sub.read();
    match interval {
      Interval::Point(value) => map
        .get(value)
        .map(|nodes| nodes.values().cloned().collect())
        .unwrap_or_default(),
      Interval::Range { .. } => map
        .iter()
        .filter(|(value, _)| interval.contains(value))
        .flat_map(|(_, nodes)| nodes.values().cloned())
        .collect(),
    }
  }

  /// Number of `(value, node)` entries held for a type
  pub fn entry_count(&self, ptype: &PropertyType) -> usize {
    if ptype.is_keyed() {
      self
        .existing_key_subindex(ptype.id())
        .map(|sub| sub.len())
        .unwrap_or(0)
    } else {
      self
        .existing_attribute_subindex(ptype.id())
        .map(|sub| sub.read().values().map(|nodes| nodes.len()).sum::<usize>())
        .unwrap_or(0)
    }
  }

  // ========================================================================
  // Reserved type name index
  // ========================================================================

  /// Bind `name -> et` if the name is free
  ///
  /// Returns false when the name was already bound to the same type.
  pub fn define_type(&self, et: &EdgeType) -> Result<bool> {
    match self.type_names.entry(et.name().to_string()) {
      Entry::Occupied(existing) if existing.get().id() == et.id() => Ok(false),
      Entry::Occupied(_) => Err(TxError::DuplicateKey {
        etype: SYSTEM_EDGE_TYPE_NAME.to_string(),
        attribute: AttrValue::from(et.name()).to_string(),
      }),
      Entry::Vacant(slot) => {
        slot.insert(et.clone());
        Ok(true)
      }
    }
  }

  pub fn get_type(&self, name: &str) -> Option<EdgeType> {
    self.type_names.get(name).map(|et| et.clone())
  }

  pub fn contains_type(&self, name: &str) -> bool {
    self.type_names.contains_key(name)
  }

  pub fn type_count(&self) -> usize {
    self.type_names.len()
  }
}

fn require_index(ptype: &PropertyType) -> Result<()> {
  if ptype.has_index() {
    Ok(())
  } else {
    Err(TxError::TypeMismatch(format!(
      "property type {ptype} is not indexed"
    )))
  }
}

/// Another live property on the same start node with the same type and value
fn has_identical_sibling(property: &Property) -> bool {
  let Some(start) = property.start() else {
    return false;
  };
  start
    .properties_of(property.property_type())
    .iter()
    .any(|other| other != property && !other.is_removed() && other.attribute() == property.attribute())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::{EdgeFactory, StandardEdgeFactory};
  use crate::schema::{EdgeCategory, EdgeTypeDef, IndexType};

  fn ptype(id: ETypeId, keyed: bool) -> PropertyType {
    EdgeType::new(EdgeTypeDef {
      id,
      name: format!("p{id}"),
      category: EdgeCategory::Property,
      keyed,
      index: IndexType::Standard,
      inline: false,
      data_type: None,
    })
    .as_property_type()
    .unwrap()
  }

  #[test]
  fn test_keyed_insert_conflict() {
    let overlay = IndexOverlay::new();
    let age = ptype(1, true);
    let n1 = Node::new_node(1);
    let n2 = Node::new_node(2);

    assert!(overlay.add_to_index(&age, &30.into(), &n1).unwrap());
    assert!(!overlay.add_to_index(&age, &30.into(), &n1).unwrap());
    assert!(matches!(
      overlay.add_to_index(&age, &30.into(), &n2),
      Err(TxError::DuplicateKey { .. })
    ));
    assert_eq!(overlay.get_key(&age, &30.into()), Some(n1));
  }

  #[test]
  fn test_unchecked_insert_reports_shadowing() {
    let overlay = IndexOverlay::new();
    let age = ptype(1, true);
    let n1 = Node::new_node(1);
    let n2 = Node::new_node(2);

    assert_eq!(overlay.add_key_unchecked(&age, &1.into(), &n1), KeyInsert::Inserted);
    assert_eq!(
      overlay.add_key_unchecked(&age, &1.into(), &n2),
      KeyInsert::Shadowed(n1.clone())
    );
    assert_eq!(overlay.get_key(&age, &1.into()), Some(n1));
  }

  #[test]
  fn test_unindexed_type_rejected() {
    let overlay = IndexOverlay::new();
    let plain = EdgeType::new(EdgeTypeDef {
      id: 3,
      name: "plain".into(),
      category: EdgeCategory::Property,
      keyed: false,
      index: IndexType::None,
      inline: false,
      data_type: None,
    })
    .as_property_type()
    .unwrap();
    assert!(matches!(
      overlay.add_to_index(&plain, &1.into(), &Node::new_node(1)),
      Err(TxError::TypeMismatch(_))
    ));
  }

  #[test]
  fn test_removal_retained_by_identical_sibling() {
    let overlay = IndexOverlay::new();
    let factory = StandardEdgeFactory::new();
    let tag = ptype(2, false);
    let node = Node::new_node(1);

    let p1 = factory.create_new_property(&tag, &node, "x".into()).unwrap();
    let p2 = factory.create_new_property(&tag, &node, "x".into()).unwrap();
    overlay.add_to_index(&tag, p1.attribute(), &node).unwrap();
    overlay.add_to_index(&tag, p2.attribute(), &node).unwrap();

    let e1 = crate::graph::Edge::Property(p1.clone());
    e1.mark_removed();
    e1.detach();
    assert_eq!(overlay.remove_from_index(&p1).unwrap(), IndexRemoval::Retained);
    assert_eq!(overlay.nodes_in_interval(&tag, &Interval::point("x")), vec![node.clone()]);

    let e2 = crate::graph::Edge::Property(p2.clone());
    e2.mark_removed();
    e2.detach();
    assert_eq!(overlay.remove_from_index(&p2).unwrap(), IndexRemoval::Removed);
    assert!(overlay.nodes_in_interval(&tag, &Interval::point("x")).is_empty());
    assert_eq!(overlay.entry_count(&tag), 0);
  }

  #[test]
  fn test_retract_loaded_keeps_entries_of_new_properties() {
    let overlay = IndexOverlay::new();
    let factory = StandardEdgeFactory::new();
    let tag = ptype(2, false);
    let node = Node::loaded(7);

    let stored = Property::loaded(70, tag.clone(), &node, "x".into());
    node.attach(crate::graph::Edge::Property(stored.clone()));
    let other = Property::loaded(71, tag.clone(), &node, "y".into());
    node.attach(crate::graph::Edge::Property(other.clone()));
    overlay.add_to_index(&tag, stored.attribute(), &node).unwrap();
    overlay.add_to_index(&tag, other.attribute(), &node).unwrap();
    factory.create_new_property(&tag, &node, "x".into()).unwrap();

    overlay.retract_loaded(&stored);
    overlay.retract_loaded(&other);
    assert_eq!(overlay.nodes_in_interval(&tag, &Interval::point("x")), vec![node]);
    assert!(overlay.nodes_in_interval(&tag, &Interval::point("y")).is_empty());
  }

  #[test]
  fn test_missing_entry_is_corruption() {
    let overlay = IndexOverlay::new();
    let factory = StandardEdgeFactory::new();
    let tag = ptype(2, false);
    let node = Node::new_node(1);
    let p = factory.create_new_property(&tag, &node, "x".into()).unwrap();

    let err = overlay.remove_from_index(&p).unwrap_err();
    assert!(err.is_fatal());
  }

  #[test]
  fn test_keyed_removal_of_foreign_owner_is_corruption() {
    let overlay = IndexOverlay::new();
    let factory = StandardEdgeFactory::new();
    let email = ptype(4, true);
    let n1 = Node::new_node(1);
    let n2 = Node::new_node(2);

    overlay.add_to_index(&email, &"a".into(), &n1).unwrap();
    let p = factory.create_new_property(&email, &n2, "a".into()).unwrap();

    assert!(overlay.remove_from_index(&p).unwrap_err().is_fatal());
    assert_eq!(overlay.get_key(&email, &"a".into()), Some(n1));
  }

  #[test]
  fn test_range_scan_over_distinct_values() {
    let overlay = IndexOverlay::new();
    let score = ptype(5, false);
    for (id, value) in [(1, 10), (2, 20), (3, 30), (4, 20)] {
      overlay
        .add_to_index(&score, &value.into(), &Node::new_node(id))
        .unwrap();
    }
    let mut ids: Vec<_> = overlay
      .nodes_in_interval(&score, &Interval::closed(15, 25))
      .iter()
      .map(Node::id)
      .collect();
    ids.sort();
    assert_eq!(ids, vec![2, 4]);
  }

  #[test]
  fn test_type_name_index() {
    let overlay = IndexOverlay::new();
    let a = ptype(1, false).into_edge_type();
    let same_name = EdgeType::new(EdgeTypeDef {
      id: 99,
      name: a.name().to_string(),
      category: EdgeCategory::Relationship,
      keyed: false,
      index: IndexType::None,
      inline: false,
      data_type: None,
    });

    assert!(overlay.define_type(&a).unwrap());
    assert!(!overlay.define_type(&a).unwrap());
    assert!(overlay.define_type(&same_name).is_err());
    assert_eq!(overlay.get_type(a.name()), Some(a.clone()));
    assert!(overlay.contains_type(a.name()));
    assert!(!overlay.contains_type("missing"));
  }
}
