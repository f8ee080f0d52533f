//! Entity creation, deletion and node resolution

use dashmap::mapref::entry::Entry;
use tracing::warn;

use crate::error::{Result, TxError};
use crate::graph::{Edge, Node, Property, Relationship};
use crate::schema::{EdgeTypeBuilder, PropertyType, RelationshipType};
use crate::types::{AttrValue, NodeId};

use super::{GraphTx, TxState};

impl GraphTx {
  // ========================================================================
  // Nodes
  // ========================================================================

  pub fn create_node(&self) -> Result<Node> {
    self.verify_write_access()?;
    let state = self.state()?;

    let node = self.ctx.node_factory.create_new_node(self)?;
    state.local_nodes.insert(node.id(), node.clone());
    if let Some(new_nodes) = &state.new_nodes {
      new_nodes.lock().insert(node.clone());
    }
    state.pending.lock().created_nodes.push(node.clone());

    self.stats.node_created();
    Ok(node)
  }

  /// Node by id: the transaction's own handle if it has one, else from storage
  pub fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
    let state = self.state()?;
    self.node_in(&state, id)
  }

  /// Like [`get_node`](Self::get_node) but a missing node is an error
  pub fn get_existing_node(&self, id: NodeId) -> Result<Node> {
    self.get_node(id)?.ok_or(TxError::NodeNotFound(id))
  }

  pub(crate) fn node_in(&self, state: &TxState, id: NodeId) -> Result<Option<Node>> {
    if let Some(node) = state.local_nodes.get(&id) {
      return Ok(Some(node.clone()));
    }
    match self.ctx.storage.resolve_node(id) {
      Ok(node) => self.adopt(state, node).map(Some),
      Err(TxError::NodeNotFound(_)) => Ok(None),
      Err(err) => Err(err),
    }
  }

  /// Make a storage-resolved node the transaction's handle for its id
  ///
  /// Only the first materialization runs the loaded hook for its edges; a
  /// concurrent resolution of the same id gets the winner's handle. If any
  /// loaded edge is rejected the node is unregistered and the overlay entries
  /// its edges inserted are retracted, so a later resolution starts clean.
  fn adopt(&self, state: &TxState, node: Node) -> Result<Node> {
    let node = match state.local_nodes.entry(node.id()) {
      Entry::Occupied(existing) => return Ok(existing.get().clone()),
      Entry::Vacant(slot) => {
        slot.insert(node.clone());
        node
      }
    };

    let mut inserted = Vec::new();
    for edge in node.edges() {
      match self.loaded_edge_in(state, &edge) {
        Ok(true) => inserted.extend(edge.as_property().cloned()),
        Ok(false) => {}
        Err(err) => {
          for property in &inserted {
            state.overlay.retract_loaded(property);
          }
          state.local_nodes.remove(&node.id());
          warn!(
            txid = self.txid,
            node = node.id(),
            error = %err,
            "stored node rejected by the index overlay"
          );
          return Err(err);
        }
      }
    }
    Ok(node)
  }

  // ========================================================================
  // Edges
  // ========================================================================

  /// Create a property of `ptype` on `node`
  ///
  /// Keyed types hold the uniqueness guard from the ownership check until the
  /// property is indexed.
  pub fn create_property(
    &self,
    ptype: &PropertyType,
    node: &Node,
    attribute: impl Into<AttrValue>,
  ) -> Result<Property> {
    self.verify_write_access()?;
    let attribute = attribute.into();
    if let Some(kind) = ptype.data_type() {
      if attribute.kind() != kind {
        return Err(TxError::TypeMismatch(format!(
          "property type {ptype} holds {kind:?} values, got {attribute}"
        )));
      }
    }

    let state = self.state()?;
    let _guard = ptype.is_keyed().then(|| self.key_guard.lock(ptype));

    if ptype.is_keyed() && self.config.verify_key_uniqueness {
      if let Some(owner) = state.overlay.get_key(ptype, &attribute) {
        if owner != *node {
          self.stats.key_conflict();
          return Err(TxError::DuplicateKey {
            etype: ptype.name().to_string(),
            attribute: attribute.to_string(),
          });
        }
      }
    }

    let property = self
      .ctx
      .edge_factory
      .create_new_property(ptype, node, attribute)?;
    self.run_added(&state, Edge::Property(property.clone()))?;

    self.stats.property_created();
    Ok(property)
  }

  pub fn create_property_by_name(
    &self,
    name: &str,
    node: &Node,
    attribute: impl Into<AttrValue>,
  ) -> Result<Property> {
    let ptype = self.get_property_type(name)?;
    self.create_property(&ptype, node, attribute)
  }

  pub fn create_relationship(
    &self,
    rtype: &RelationshipType,
    start: &Node,
    end: &Node,
  ) -> Result<Relationship> {
    self.verify_write_access()?;
    let state = self.state()?;

    let relationship = self
      .ctx
      .edge_factory
      .create_new_relationship(rtype, start, end)?;
    self.run_added(&state, Edge::Relationship(relationship.clone()))?;

    self.stats.relationship_created();
    Ok(relationship)
  }

  pub fn create_relationship_by_name(
    &self,
    name: &str,
    start: &Node,
    end: &Node,
  ) -> Result<Relationship> {
    let rtype = self.get_relationship_type(name)?;
    self.create_relationship(&rtype, start, end)
  }

  /// Run the added hook; a rejected edge is detached again
  fn run_added(&self, state: &TxState, edge: Edge) -> Result<()> {
    if let Err(err) = self.added_edge_in(state, &edge) {
      edge.mark_removed();
      edge.detach();
      return Err(err);
    }
    Ok(())
  }

  /// Delete an edge; returns false if it was already removed
  pub fn delete_edge(&self, edge: &Edge) -> Result<bool> {
    self.verify_write_access()?;
    let result = {
      let state = self.state()?;
      if !edge.mark_removed() {
        return Ok(false);
      }
      edge.detach();
      self.deleted_edge_in(&state, edge).map(|()| true)
    };
    self.escalate(result)
  }

  // ========================================================================
  // Edge types
  // ========================================================================

  /// Builder for a new edge type bound to this transaction
  pub fn create_edge_type(&self) -> Result<EdgeTypeBuilder<'_>> {
    self.verify_write_access()?;
    Ok(self.ctx.edge_types.open_builder(self))
  }
}
