//! Uniqueness guard
//!
//! Serializes the check-then-insert sequence of keyed property creation. The
//! global mode uses one mutex for every keyed type; the per-type mode shards
//! the mutex by property type so unrelated types do not wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, MutexGuard, RawMutex};
use serde::{Deserialize, Serialize};

use crate::schema::PropertyType;
use crate::types::ETypeId;

/// Granularity of the uniqueness guard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLockMode {
  #[default]
  Global,
  PerType,
}

/// Held for the duration of a keyed property creation
pub enum KeyGuard<'a> {
  Global(MutexGuard<'a, ()>),
  PerType(ArcMutexGuard<RawMutex, ()>),
}

#[derive(Debug)]
pub struct UniquenessGuard {
  mode: KeyLockMode,
  global: Mutex<()>,
  shards: DashMap<ETypeId, Arc<Mutex<()>>>,
}

impl UniquenessGuard {
  pub fn new(mode: KeyLockMode) -> Self {
    Self {
      mode,
      global: Mutex::new(()),
      shards: DashMap::new(),
    }
  }

  pub fn mode(&self) -> KeyLockMode {
    self.mode
  }

  pub fn lock(&self, ptype: &PropertyType) -> KeyGuard<'_> {
    match self.mode {
      KeyLockMode::Global => KeyGuard::Global(self.global.lock()),
      KeyLockMode::PerType => {
        // Clone the shard out before locking so the map shard is not held
        let shard = self
          .shards
          .entry(ptype.id())
          .or_insert_with(|| Arc::new(Mutex::new(())))
          .clone();
        KeyGuard::PerType(shard.lock_arc())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{EdgeCategory, EdgeType, EdgeTypeDef, IndexType};

  fn keyed(id: ETypeId) -> PropertyType {
    EdgeType::new(EdgeTypeDef {
      id,
      name: format!("k{id}"),
      category: EdgeCategory::Property,
      keyed: true,
      index: IndexType::Standard,
      inline: false,
      data_type: None,
    })
    .as_property_type()
    .unwrap()
  }

  #[test]
  fn test_global_mode_is_shared_across_types() {
    let guard = UniquenessGuard::new(KeyLockMode::Global);
    let _held = guard.lock(&keyed(1));
    assert!(guard.global.try_lock().is_none());
  }

  #[test]
  fn test_per_type_mode_shards() {
    let guard = UniquenessGuard::new(KeyLockMode::PerType);
    let _a = guard.lock(&keyed(1));
    let _b = guard.lock(&keyed(2));

    let shard = guard.shards.get(&1).unwrap().clone();
    assert!(shard.try_lock().is_none());
    assert!(guard.global.try_lock().is_some());
  }
}
