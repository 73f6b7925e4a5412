//! Integration tests for Wikiscope
//!
//! These tests drive the core engine, the graph view and the CLI together.

use serde_json::{json, Value};
use std::process::Command;
use std::sync::{Arc, Mutex};
use wikiscope_core::{
    EntityId, EventHandler, GraphSnapshot, GraphTransform, HandlerMap, HierarchyTransform, Store,
    SurfaceEvent,
};
use wikiscope_view::{channel, Accessors, GraphView, MemorySurface, QueuePolicy, ViewConfig};

fn query_result(rows: &[(&str, Option<&str>)]) -> Value {
    let bindings: Vec<Value> = rows
        .iter()
        .map(|(item, child)| {
            let mut row = json!({ "itemLabel": { "type": "literal", "value": item } });
            if let Some(child) = child {
                row["child1Label"] = json!({ "type": "literal", "value": child });
            }
            row
        })
        .collect();
    json!({ "head": { "vars": ["itemLabel", "child1Label"] }, "results": { "bindings": bindings } })
}

fn wikiscope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wikiscope"))
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = wikiscope().arg("--help").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wikiscope"));
    assert!(stdout.contains("Incremental graph reconciliation"));
}

/// Two query results in a row only touch what actually changed
#[test]
fn test_query_results_reconcile_incrementally() {
    let transform = HierarchyTransform::new("mammal", "subclass of");
    let first = transform
        .transform(&query_result(&[("cat", Some("lion")), ("dog", None)]))
        .unwrap();
    let second = transform
        .transform(&query_result(&[("cat", Some("tiger")), ("dog", None)]))
        .unwrap();

    let mut view = GraphView::new(&ViewConfig::default(), Accessors::new());
    view.mount(MemorySurface::new(), first, &HandlerMap::new())
        .unwrap();
    let applied = view.apply(second).unwrap();

    assert_eq!(applied.nodes.removed_ids, vec![EntityId::from("lion")]);
    assert_eq!(applied.nodes.added_ids, vec![EntityId::from("tiger")]);
    assert!(applied.nodes.changed_ids.is_empty());
    assert_eq!(applied.edges.removed_ids, vec![EntityId::from("lion->cat")]);
    assert_eq!(applied.edges.added_ids, vec![EntityId::from("tiger->cat")]);

    let surface = view.surface().unwrap();
    let node_ids: Vec<_> = surface.store(Store::Nodes).keys().cloned().collect();
    let view_ids: Vec<_> = {
        let mut ids: Vec<_> = view.nodes().ids().cloned().collect();
        ids.sort();
        ids
    };
    assert_eq!(node_ids, view_ids);
}

/// Handlers see events until the view is unmounted
#[test]
fn test_events_reach_handlers_until_unmount() {
    let selected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&selected);
    let mut handlers = HandlerMap::new();
    handlers.insert(
        "select".to_string(),
        EventHandler::new(move |event| sink.lock().unwrap().push(event.payload.clone())),
    );

    let mut view = GraphView::new(&ViewConfig::default(), Accessors::new());
    view.mount(MemorySurface::new(), GraphSnapshot::default(), &handlers)
        .unwrap();
    view.surface()
        .unwrap()
        .emit(&SurfaceEvent::new("select", json!({ "nodes": ["cat"] })));

    let surface = view.unmount().unwrap();
    surface.emit(&SurfaceEvent::new("select", json!({ "nodes": ["dog"] })));

    assert_eq!(*selected.lock().unwrap(), vec![json!({ "nodes": ["cat"] })]);
}

/// A feed producer running on another task drives the view
#[tokio::test]
async fn test_feed_from_spawned_producer() {
    let config = ViewConfig {
        policy: QueuePolicy::Strict,
        ..Default::default()
    };
    let mut view = GraphView::new(&config, Accessors::new());
    view.mount(MemorySurface::new(), GraphSnapshot::default(), &HandlerMap::new())
        .unwrap();

    let (handle, feed) = channel();
    let producer = tokio::spawn(async move {
        let transform = HierarchyTransform::new("root", "part of");
        for item in ["a", "b", "c"] {
            let snapshot = transform.transform(&query_result(&[(item, None)])).unwrap();
            handle.publish(snapshot).unwrap();
        }
    });

    let stats = feed.run(&mut view).await;
    producer.await.unwrap();

    assert_eq!(stats.received, 3);
    assert_eq!(stats.applied, 3);
    let ids: Vec<_> = view.nodes().ids().cloned().collect();
    assert_eq!(ids, vec![EntityId::from("root"), EntityId::from("c")]);
}

/// The diff command prints a graph diff for two snapshot files
#[test]
fn test_diff_command() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.json");
    let new = dir.path().join("new.json");
    std::fs::write(
        &old,
        json!({ "nodes": [{ "id": 1, "label": "A" }, { "id": 2, "label": "B" }] }).to_string(),
    )
    .unwrap();
    std::fs::write(
        &new,
        json!({ "nodes": [{ "id": 1, "label": "A" }, { "id": 3, "label": "C" }] }).to_string(),
    )
    .unwrap();

    let output = wikiscope()
        .args(["diff", "--old"])
        .arg(&old)
        .arg("--new")
        .arg(&new)
        .output()
        .unwrap();
    assert!(output.status.success());

    let diff: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diff["sequence"], json!(1));
    assert_eq!(diff["nodes"]["removed"], json!([{ "id": 2, "label": "B" }]));
    assert_eq!(diff["nodes"]["added"], json!([{ "id": 3, "label": "C" }]));
    assert_eq!(diff["edges"]["changed"], json!([]));
}

/// The diff command fails on snapshots with duplicate identities
#[test]
fn test_diff_command_rejects_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("old.json");
    let new = dir.path().join("new.json");
    std::fs::write(&old, r#"{"nodes": []}"#).unwrap();
    std::fs::write(&new, r#"{"nodes": [{"id": 1}, {"id": 1}]}"#).unwrap();

    let output = wikiscope()
        .args(["diff", "--old"])
        .arg(&old)
        .arg("--new")
        .arg(&new)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate identity"));
}

/// The replay command prints surface commands followed by a summary
#[test]
fn test_replay_command() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = dir.path().join("snapshots.json");
    let config = dir.path().join("view.toml");
    std::fs::write(
        &snapshots,
        json!([
            { "nodes": [{ "id": 1, "label": "A" }] },
            { "nodes": [{ "id": 1, "label": "B" }] },
            { "nodes": [{ "id": 1, "label": "B" }] }
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(&config, "policy = \"strict\"\n").unwrap();

    let output = wikiscope()
        .arg("replay")
        .arg(&snapshots)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = lines.iter().map(|l| l["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["add", "update", "destroy", "summary"]);
    assert_eq!(lines[1]["entities"], json!([{ "id": 1, "label": "B" }]));
    assert_eq!(lines[3]["stats"]["applied"], json!(1));
    assert_eq!(lines[3]["stats"]["unchanged"], json!(1));
}

/// The transform command prints the graph built from a query result
#[test]
fn test_transform_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("results.json");
    std::fs::write(&input, query_result(&[("cat", Some("lion"))]).to_string()).unwrap();

    let output = wikiscope()
        .arg("transform")
        .arg(&input)
        .args(["--root", "mammal", "--relation", "subclass of"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let snapshot: GraphSnapshot = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.edges.len(), 2);
    assert_eq!(snapshot.edges[0].attr_str("label"), Some("subclass of"));
}
