use std::collections::{BTreeMap, BTreeSet};

use crate::{
    composition::model::Timeline,
    composition::node::{NodeId, PropValue},
    foundation::error::{MontageError, MontageResult},
};

#[derive(Clone, Debug, Default, serde::Serialize)]
/// Output of the ownership resolver.
pub struct ResolvedForest {
    /// Every node reachable through a child slot; excluded from top-level
    /// serialization.
    pub owned: BTreeSet<NodeId>,
    /// Every distinct type tag reachable from the placed forest, nested
    /// nodes included.
    pub type_tags: BTreeSet<String>,
}

/// Walk every top-level node's child slots, computing the transitively
/// nested set and the distinct type tags.
///
/// Ownership violations surface as structural errors: a node referenced
/// from two parents, a node both placed and nested, or a cycle through
/// child slots. The timeline is left unmodified either way.
pub(crate) fn resolve_forest(timeline: &Timeline) -> MontageResult<ResolvedForest> {
    let mut forest = ResolvedForest::default();
    let mut owners: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let top_level: BTreeSet<NodeId> = timeline
        .tracks()
        .flat_map(|t| t.nodes.iter().copied())
        .collect();

    let mut path = Vec::new();
    for track in timeline.tracks() {
        for &id in &track.nodes {
            visit(timeline, id, &top_level, &mut owners, &mut path, &mut forest)?;
        }
    }
    Ok(forest)
}

fn visit(
    timeline: &Timeline,
    id: NodeId,
    top_level: &BTreeSet<NodeId>,
    owners: &mut BTreeMap<NodeId, NodeId>,
    path: &mut Vec<NodeId>,
    forest: &mut ResolvedForest,
) -> MontageResult<()> {
    let node = timeline
        .node(id)
        .ok_or_else(|| MontageError::structural(format!("unknown node id {}", id.0)))?;
    forest.type_tags.insert(node.type_tag.clone());

    // Unregistered tags terminate the recursion, whatever their props hold.
    let slots = timeline.slot_registry().slots_for(&node.type_tag);
    if slots.is_empty() {
        return Ok(());
    }

    path.push(id);
    for decl in slots {
        let children: Vec<NodeId> = match node.prop(&decl.name) {
            Some(PropValue::Child(child)) => vec![*child],
            Some(PropValue::Children(children)) => children.clone(),
            _ => continue,
        };
        for child in children {
            if path.contains(&child) {
                path.pop();
                return Err(MontageError::structural(format!(
                    "cycle through child slots at node {}",
                    child.0
                )));
            }
            if top_level.contains(&child) {
                path.pop();
                return Err(MontageError::structural(format!(
                    "multi-owned node {}: placed on a track and nested under node {}",
                    child.0, id.0
                )));
            }
            if let Some(previous) = owners.insert(child, id) {
                path.pop();
                return Err(MontageError::structural(format!(
                    "multi-owned node {}: referenced from nodes {} and {}",
                    child.0, previous.0, id.0
                )));
            }
            forest.owned.insert(child);
            if let Err(err) = visit(timeline, child, top_level, owners, path, forest) {
                path.pop();
                return Err(err);
            }
        }
    }
    path.pop();
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/ownership.rs"]
mod tests;
