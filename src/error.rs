//! Error types for the transaction core

use thiserror::Error;

use crate::types::NodeId;

/// Errors raised by a graph transaction
#[derive(Debug, Error)]
pub enum TxError {
  /// Mutation attempted on a read-only transaction
  #[error("Cannot create or modify entities in a read-only transaction")]
  ReadOnly,

  /// Operation attempted after commit or abort
  #[error("Transaction is closed")]
  TransactionClosed,

  /// Keyed attribute value is already owned by another node
  #[error("Attribute {attribute} is already used as a key for property type {etype}")]
  DuplicateKey { etype: String, attribute: String },

  /// Edge type name lookup missed and auto-creation is disabled
  #[error("Edge type does not exist: {0}")]
  UnknownEdgeType(String),

  /// Edge type is of the wrong kind or lacks the required index policy
  #[error("Type mismatch: {0}")]
  TypeMismatch(String),

  /// Operation not available for this transaction's configuration
  #[error("Unsupported operation: {0}")]
  Unsupported(String),

  /// Hook called with an edge in the wrong lifecycle state
  #[error("Invalid edge state: {0}")]
  InvalidEdgeState(String),

  /// Edge type definition rejected by the builder
  #[error("Invalid schema: {0}")]
  InvalidSchema(String),

  /// The index overlay diverged from the live edge set
  #[error("Index overlay corrupted: {0}")]
  OverlayCorruption(String),

  #[error("Node not found: {0}")]
  NodeNotFound(NodeId),

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Invalid configuration: {0}")]
  Config(#[from] serde_json::Error),
}

impl TxError {
  /// Fatal errors leave the transaction unusable and are never retryable
  pub fn is_fatal(&self) -> bool {
    matches!(self, TxError::OverlayCorruption(_))
  }
}

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TxError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_only_corruption_is_fatal() {
    assert!(TxError::OverlayCorruption("x".into()).is_fatal());
    assert!(!TxError::ReadOnly.is_fatal());
    assert!(!TxError::DuplicateKey {
      etype: "age".into(),
      attribute: "30".into()
    }
    .is_fatal());
  }

  #[test]
  fn test_duplicate_key_message() {
    let err = TxError::DuplicateKey {
      etype: "email".into(),
      attribute: "\"a@b.c\"".into(),
    };
    assert_eq!(
      err.to_string(),
      "Attribute \"a@b.c\" is already used as a key for property type email"
    );
  }
}
