//! CLI command implementations

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;
use wikiscope_core::{DiffEngine, GraphSnapshot, GraphTransform, HandlerMap, HierarchyTransform};
use wikiscope_view::{channel, Accessors, GraphView, MemorySurface, ViewConfig};

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn diff(old: &Path, new: &Path) -> anyhow::Result<()> {
    let old: GraphSnapshot = read_json(old)?;
    let new: GraphSnapshot = read_json(new)?;

    let diff = DiffEngine::new().compute_snapshots(&old, &new)?;
    tracing::info!(
        nodes = diff.nodes.len(),
        edges = diff.edges.len(),
        "Computed snapshot diff"
    );

    println!("{}", serde_json::to_string_pretty(&diff)?);
    Ok(())
}

pub fn transform(input: &Path, root: String, relation: String) -> anyhow::Result<()> {
    let rows: serde_json::Value = read_json(input)?;
    let snapshot = HierarchyTransform::new(root, relation).transform(&rows)?;

    tracing::info!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "Transformed query result"
    );

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Mount the first snapshot, feed the rest through a snapshot feed, and
/// print every command the surface received as one JSON object per line,
/// followed by the feed counters.
pub async fn replay(snapshots: &Path, config: &Path) -> anyhow::Result<()> {
    let config = ViewConfig::load(config)?;
    let mut snapshots: Vec<GraphSnapshot> = read_json(snapshots)?;
    if snapshots.is_empty() {
        anyhow::bail!("no snapshots to replay");
    }
    let initial = snapshots.remove(0);

    tracing::info!(
        snapshots = snapshots.len() + 1,
        policy = ?config.policy,
        "Replaying snapshots"
    );

    let mut view = GraphView::new(&config, Accessors::new());
    view.mount(MemorySurface::new(), initial, &HandlerMap::new())?;

    let (handle, feed) = channel();
    for snapshot in snapshots {
        handle.publish(snapshot)?;
    }
    drop(handle);

    let stats = feed.run(&mut view).await;

    let surface = view
        .unmount()
        .context("view was not mounted at the end of the replay")?;
    for command in surface.commands() {
        println!("{}", serde_json::to_string(command)?);
    }
    println!("{}", serde_json::json!({ "type": "summary", "stats": stats }));
    Ok(())
}
