use std::collections::HashSet;
use std::sync::Arc;

use kitetx::graph::Edge;
use kitetx::schema::{EdgeCategory, EdgeType, EdgeTypeDef, IndexType};
use kitetx::{begin_read_tx, begin_tx, GraphTx, MemoryStorage, Node, TxConfig, TxContext, TxError};

fn writable() -> GraphTx {
  begin_tx(&TxContext::new(Arc::new(MemoryStorage::new()))).expect("begin tx")
}

fn ids(nodes: &HashSet<Node>) -> Vec<u64> {
  let mut ids: Vec<_> = nodes.iter().map(Node::id).collect();
  ids.sort();
  ids
}

#[test]
fn keyed_and_indexed_properties_end_to_end() {
  let tx = writable();
  let age = tx
    .create_edge_type()
    .expect("builder")
    .name("age")
    .keyed()
    .make_property_type()
    .expect("age type");
  let tag = tx
    .create_edge_type()
    .expect("builder")
    .name("tag")
    .indexed()
    .make_property_type()
    .expect("tag type");

  let n1 = tx.create_node().expect("n1");
  tx.create_property(&age, &n1, 30).expect("age on n1");

  let n2 = tx.create_node().expect("n2");
  let err = tx
    .create_property(&age, &n2, 30)
    .expect_err("duplicate key");
  assert!(matches!(err, TxError::DuplicateKey { .. }));
  assert!(n2.properties().is_empty());
  assert_eq!(tx.get_node_by_key(&age, 30).expect("key lookup"), Some(n1.clone()));

  let n1_tag = tx.create_property(&tag, &n1, "x").expect("tag on n1");
  tx.create_property(&tag, &n2, "x").expect("tag on n2");
  let found = tx.get_nodes_by_attribute(&tag, "x").expect("lookup");
  assert_eq!(ids(&found), vec![n1.id(), n2.id()]);

  assert!(tx.delete_edge(&Edge::Property(n1_tag)).expect("delete"));
  let found = tx.get_nodes_by_attribute(&tag, "x").expect("lookup");
  assert_eq!(ids(&found), vec![n2.id()]);

  tx.abort().expect("abort");
  assert!(tx.is_closed());
  assert!(matches!(tx.create_node(), Err(TxError::TransactionClosed)));
  assert!(matches!(
    tx.get_nodes_by_attribute(&tag, "x"),
    Err(TxError::TransactionClosed)
  ));
  assert!(matches!(
    tx.get_edge_type("tag"),
    Err(TxError::TransactionClosed)
  ));
}

#[test]
fn deleting_one_of_two_identical_properties_keeps_the_entry() {
  let tx = writable();
  let tag = tx
    .create_edge_type()
    .expect("builder")
    .name("tag")
    .indexed()
    .make_property_type()
    .expect("tag type");

  let n = tx.create_node().expect("node");
  let first = tx.create_property(&tag, &n, "x").expect("first");
  let second = tx.create_property(&tag, &n, "x").expect("second");

  tx.delete_edge(&Edge::Property(first)).expect("delete first");
  let found = tx.get_nodes_by_attribute(&tag, "x").expect("lookup");
  assert!(found.contains(&n));

  tx.delete_edge(&Edge::Property(second)).expect("delete second");
  let found = tx.get_nodes_by_attribute(&tag, "x").expect("lookup");
  assert!(!found.contains(&n));

  let stats = tx.stats();
  assert_eq!(stats.index_removals_skipped, 1);
  assert_eq!(stats.index_removals, 1);
  assert_eq!(stats.edges_deleted, 2);
}

#[test]
fn keyed_retraction_waits_for_every_identical_property() {
  let tx = writable();
  let email = tx
    .create_edge_type()
    .expect("builder")
    .name("email")
    .keyed()
    .make_property_type()
    .expect("email type");

  let n = tx.create_node().expect("node");
  let first = tx.create_property(&email, &n, "a@b.c").expect("first");
  let second = tx.create_property(&email, &n, "a@b.c").expect("second");

  tx.delete_edge(&Edge::Property(first)).expect("delete first");
  assert_eq!(tx.get_node_by_key(&email, "a@b.c").expect("lookup"), Some(n.clone()));

  tx.delete_edge(&Edge::Property(second)).expect("delete second");
  assert_eq!(tx.get_node_by_key(&email, "a@b.c").expect("lookup"), None);

  // the value is free again
  let other = tx.create_node().expect("other");
  tx.create_property(&email, &other, "a@b.c").expect("reuse key");
}

#[test]
fn read_only_transaction_rejects_mutation() {
  let storage = Arc::new(MemoryStorage::new());
  let age = EdgeType::new(EdgeTypeDef {
    id: 100,
    name: "age".to_string(),
    category: EdgeCategory::Property,
    keyed: true,
    index: IndexType::Standard,
    inline: false,
    data_type: None,
  });
  let knows = EdgeType::new(EdgeTypeDef {
    id: 101,
    name: "knows".to_string(),
    category: EdgeCategory::Relationship,
    keyed: false,
    index: IndexType::None,
    inline: false,
    data_type: None,
  });
  storage.insert_edge_type(&age);
  storage.insert_edge_type(&knows);
  storage.insert_node(10);
  storage.insert_node(11);

  let tx = begin_read_tx(&TxContext::new(storage)).expect("begin read tx");
  let age = tx.get_property_type("age").expect("stored type");
  let knows = tx.get_relationship_type("knows").expect("stored type");
  let a = tx.get_existing_node(10).expect("node 10");
  let b = tx.get_existing_node(11).expect("node 11");

  assert!(matches!(tx.create_node(), Err(TxError::ReadOnly)));
  assert!(matches!(tx.create_property(&age, &a, 1), Err(TxError::ReadOnly)));
  assert!(matches!(
    tx.create_relationship(&knows, &a, &b),
    Err(TxError::ReadOnly)
  ));
  assert!(matches!(tx.create_edge_type(), Err(TxError::ReadOnly)));
  assert!(matches!(
    tx.get_property_type("unknown"),
    Err(TxError::ReadOnly)
  ));
  assert!(tx.get_all_nodes().expect("enumerate").is_empty());
  assert!(!tx.has_modifications());
  assert!(a.edges().is_empty());

  tx.commit().expect("commit read tx");
}

#[test]
fn disabled_verification_lets_conflicting_keys_through() {
  let ctx = TxContext::new(Arc::new(MemoryStorage::new()));
  let tx = GraphTx::open(ctx, TxConfig::new().verify_key_uniqueness(false)).expect("open");
  let email = tx
    .create_edge_type()
    .expect("builder")
    .name("email")
    .keyed()
    .make_property_type()
    .expect("email type");

  let n1 = tx.create_node().expect("n1");
  let n2 = tx.create_node().expect("n2");
  tx.create_property(&email, &n1, "a@b.c").expect("first owner");
  let shadowed = tx
    .create_property(&email, &n2, "a@b.c")
    .expect("conflict is not checked");

  assert_eq!(n2.properties_of(&email).len(), 1);
  assert_eq!(tx.get_node_by_key(&email, "a@b.c").expect("lookup"), Some(n1.clone()));
  assert_eq!(tx.stats().key_conflicts, 1);

  // removing the shadowed property leaves the first owner indexed
  tx.delete_edge(&Edge::Property(shadowed)).expect("delete shadowed");
  assert!(tx.is_open());
  assert_eq!(tx.get_node_by_key(&email, "a@b.c").expect("lookup"), Some(n1));
}

#[test]
fn overlay_corruption_aborts_the_transaction() {
  let tx = writable();
  let tag = tx
    .create_edge_type()
    .expect("builder")
    .name("tag")
    .indexed()
    .make_property_type()
    .expect("tag type");
  let n = tx.create_node().expect("node");
  let edge = Edge::Property(tx.create_property(&tag, &n, "x").expect("tag"));
  tx.delete_edge(&edge).expect("delete");

  // the entry is already gone; retracting it again means the overlay diverged
  let err = tx.deleted_edge(&edge).expect_err("corruption");
  assert!(err.is_fatal());
  assert!(tx.is_closed());
  assert!(matches!(tx.create_node(), Err(TxError::TransactionClosed)));
}

#[test]
fn added_hook_rejects_loaded_edges() {
  let storage = Arc::new(MemoryStorage::new());
  let tag = EdgeType::new(EdgeTypeDef {
    id: 100,
    name: "tag".to_string(),
    category: EdgeCategory::Property,
    keyed: false,
    index: IndexType::Standard,
    inline: false,
    data_type: None,
  });
  storage.insert_edge_type(&tag);
  storage.insert_property(500, 9000, &tag.as_property_type().expect("property type"), "x");

  let tx = begin_tx(&TxContext::new(storage)).expect("begin tx");
  let node = tx.get_existing_node(500).expect("stored node");
  let loaded = node.edges().pop().expect("loaded edge");
  assert!(loaded.is_loaded());
  assert!(matches!(
    tx.added_edge(&loaded),
    Err(TxError::InvalidEdgeState(_))
  ));
}

#[test]
fn inline_properties_are_never_indexed() {
  let tx = writable();
  let note = tx
    .create_edge_type()
    .expect("builder")
    .name("note")
    .indexed()
    .inline()
    .make_property_type()
    .expect("note type");
  let n = tx.create_node().expect("node");
  tx.create_property(&note, &n, "hello").expect("note");

  assert!(tx.get_nodes_by_attribute(&note, "hello").expect("lookup").is_empty());
  assert_eq!(tx.stats().index_inserts, 0);
}
