//! In-memory storage
//!
//! Keeps persisted properties per node plus an ordered attribute index per
//! property type, so interval scans are real range scans. Relationships are
//! not retained: only the property side of a change set is persisted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, TxError};
use crate::graph::{Edge, Node, Property};
use crate::schema::{EdgeType, PropertyType};
use crate::types::{AttrValue, ETypeId, EdgeId, Interval, NodeId};

use super::{ChangeSet, NextIds, TxStorage};

type AttributeIndex = HashMap<ETypeId, BTreeMap<AttrValue, Vec<NodeId>>>;

#[derive(Debug, Clone)]
struct StoredProperty {
  edge_id: EdgeId,
  ptype: PropertyType,
  attribute: AttrValue,
}

/// Storage kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
  nodes: RwLock<HashMap<NodeId, Vec<StoredProperty>>>,
  attribute_index: RwLock<AttributeIndex>,
  edge_types: RwLock<IndexMap<String, EdgeType>>,
  /// Highest edge id ever stored, including removed and unretained edges
  max_edge_id: AtomicU64,
  persist_calls: AtomicU64,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store a node with no properties
  pub fn insert_node(&self, id: NodeId) {
    self.nodes.write().entry(id).or_default();
  }

  /// Store a property directly, bypassing any transaction
  pub fn insert_property(
    &self,
    node_id: NodeId,
    edge_id: EdgeId,
    ptype: &PropertyType,
    attribute: impl Into<AttrValue>,
  ) {
    let attribute = attribute.into();
    self.max_edge_id.fetch_max(edge_id, Ordering::SeqCst);
    let mut nodes = self.nodes.write();
    let mut index = self.attribute_index.write();
    Self::store_property(
      &mut nodes,
      &mut index,
      node_id,
      StoredProperty {
        edge_id,
        ptype: ptype.clone(),
        attribute,
      },
    );
  }

  /// Store an edge type definition directly
  pub fn insert_edge_type(&self, et: &EdgeType) {
    self
      .edge_types
      .write()
      .insert(et.name().to_string(), et.clone());
  }

  pub fn contains_node(&self, id: NodeId) -> bool {
    self.nodes.read().contains_key(&id)
  }

  pub fn node_count(&self) -> usize {
    self.nodes.read().len()
  }

  /// Number of stored properties on a node
  pub fn property_count(&self, id: NodeId) -> usize {
    self.nodes.read().get(&id).map(Vec::len).unwrap_or(0)
  }

  /// Number of `persist` calls that carried changes
  pub fn persist_count(&self) -> u64 {
    self.persist_calls.load(Ordering::SeqCst)
  }

  fn store_property(
    nodes: &mut HashMap<NodeId, Vec<StoredProperty>>,
    index: &mut AttributeIndex,
    node_id: NodeId,
    stored: StoredProperty,
  ) {
    if stored.ptype.has_index() && !stored.ptype.is_inline() {
      index
        .entry(stored.ptype.id())
        .or_default()
        .entry(stored.attribute.clone())
        .or_default()
        .push(node_id);
    }
    nodes.entry(node_id).or_default().push(stored);
  }

  fn unstore_property(
    nodes: &mut HashMap<NodeId, Vec<StoredProperty>>,
    index: &mut AttributeIndex,
    property: &Property,
  ) {
    let node_id = property.start_id();
    let Some(stored) = nodes.get_mut(&node_id) else {
      return;
    };
    let Some(pos) = stored.iter().position(|s| s.edge_id == property.id()) else {
      return;
    };
    let removed = stored.remove(pos);

    if !property.is_indexable() {
      return;
    }
    if let Some(by_value) = index.get_mut(&removed.ptype.id()) {
      if let Some(ids) = by_value.get_mut(&removed.attribute) {
        if let Some(i) = ids.iter().position(|&id| id == node_id) {
          ids.swap_remove(i);
        }
        if ids.is_empty() {
          by_value.remove(&removed.attribute);
        }
      }
    }
  }
}

impl TxStorage for MemoryStorage {
  fn attribute_index_scan(&self, ptype: &PropertyType, interval: &Interval) -> Result<Vec<NodeId>> {
    if interval.is_empty() {
      return Ok(Vec::new());
    }

    let index = self.attribute_index.read();
    let Some(by_value) = index.get(&ptype.id()) else {
      return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (value, nodes) in by_value.range::<AttrValue, _>(interval.bounds()) {
      if !interval.contains(value) {
        continue;
      }
      for &id in nodes {
        if seen.insert(id) {
          ids.push(id);
        }
      }
    }
    Ok(ids)
  }

  fn resolve_node(&self, id: NodeId) -> Result<Node> {
    let nodes = self.nodes.read();
    let stored = nodes.get(&id).ok_or(TxError::NodeNotFound(id))?;

    let node = Node::loaded(id);
    for sp in stored {
      let property = Property::loaded(sp.edge_id, sp.ptype.clone(), &node, sp.attribute.clone());
      node.attach(Edge::Property(property));
    }
    Ok(node)
  }

  fn edge_types(&self) -> Result<Vec<EdgeType>> {
    Ok(self.edge_types.read().values().cloned().collect())
  }

  fn persist(&self, changes: &ChangeSet) -> Result<()> {
    if changes.is_empty() {
      return Ok(());
    }

    {
      let mut edge_types = self.edge_types.write();
      for et in &changes.defined_types {
        edge_types.insert(et.name().to_string(), et.clone());
      }
    }

    let mut nodes = self.nodes.write();
    let mut index = self.attribute_index.write();

    for node in &changes.created_nodes {
      nodes.entry(node.id()).or_default();
    }

    for edge in &changes.added_edges {
      self.max_edge_id.fetch_max(edge.id(), Ordering::SeqCst);
      match edge {
        Edge::Property(p) => Self::store_property(
          &mut nodes,
          &mut index,
          p.start_id(),
          StoredProperty {
            edge_id: p.id(),
            ptype: p.property_type().clone(),
            attribute: p.attribute().clone(),
          },
        ),
        Edge::Relationship(r) => {
          debug!(edge = r.id(), "memory storage does not retain relationships");
        }
      }
    }

    for edge in &changes.deleted_edges {
      if let Edge::Property(p) = edge {
        Self::unstore_property(&mut nodes, &mut index, p);
      }
    }

    self.persist_calls.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  fn next_ids(&self) -> NextIds {
    let mut next = NextIds::default();
    for &id in self.nodes.read().keys() {
      next.observe_node(id);
    }
    let max_edge_id = self.max_edge_id.load(Ordering::SeqCst);
    if max_edge_id > 0 {
      next.observe_edge(max_edge_id);
    }
    for et in self.edge_types.read().values() {
      next.observe_etype(et.id());
    }
    next
  }
}
