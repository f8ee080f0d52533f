//! Transaction configuration

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{AutoEdgeTypeMaker, DefaultAutoEdgeTypes};

use super::guard::KeyLockMode;

/// Immutable configuration of one transaction
///
/// Everything except the auto-creation policy object can be loaded from JSON:
///
/// ```
/// use kitetx::tx::TxConfig;
///
/// let config = TxConfig::from_json(r#"{ "read_only": true }"#).unwrap();
/// assert!(config.read_only);
/// assert!(config.verify_key_uniqueness);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
  /// Reject every mutation
  pub read_only: bool,
  /// Fail keyed property creation whose value belongs to another node
  pub verify_key_uniqueness: bool,
  /// Synthesize unknown edge types on name lookup
  pub auto_create_edge_types: bool,
  /// Keep a registry of nodes created in the transaction
  pub track_new_nodes: bool,
  /// Granularity of the uniqueness guard
  pub key_lock: KeyLockMode,
  /// Policy used when auto-creating edge types
  #[serde(skip)]
  pub auto_edge_type_maker: Arc<dyn AutoEdgeTypeMaker>,
}

impl Default for TxConfig {
  fn default() -> Self {
    Self {
      read_only: false,
      verify_key_uniqueness: true,
      auto_create_edge_types: true,
      track_new_nodes: true,
      key_lock: KeyLockMode::Global,
      auto_edge_type_maker: Arc::new(DefaultAutoEdgeTypes),
    }
  }
}

impl TxConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse the serializable part of a configuration
  pub fn from_json(json: &str) -> Result<Self> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn read_only(mut self, value: bool) -> Self {
    self.read_only = value;
    self
  }

  pub fn verify_key_uniqueness(mut self, value: bool) -> Self {
    self.verify_key_uniqueness = value;
    self
  }

  pub fn auto_create_edge_types(mut self, value: bool) -> Self {
    self.auto_create_edge_types = value;
    self
  }

  pub fn track_new_nodes(mut self, value: bool) -> Self {
    self.track_new_nodes = value;
    self
  }

  pub fn key_lock(mut self, mode: KeyLockMode) -> Self {
    self.key_lock = mode;
    self
  }

  pub fn auto_edge_type_maker(mut self, maker: Arc<dyn AutoEdgeTypeMaker>) -> Self {
    self.auto_edge_type_maker = maker;
    self
  }
}

impl fmt::Debug for TxConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TxConfig")
      .field("read_only", &self.read_only)
      .field("verify_key_uniqueness", &self.verify_key_uniqueness)
      .field("auto_create_edge_types", &self.auto_create_edge_types)
      .field("track_new_nodes", &self.track_new_nodes)
      .field("key_lock", &self.key_lock)
      .field("auto_edge_type_maker", &self.auto_edge_type_maker)
      .finish()
  }
}
