use std::collections::BTreeSet;

use crate::{
    composition::model::Timeline,
    composition::node::{ComponentNode, NodeId, PropValue},
    composition::registry::{SlotCardinality, SlotDecl},
    foundation::error::{MontageError, MontageResult},
    render::hooks::RenderVerdict,
    resolve::ownership::ResolvedForest,
};

const INDENT: &str = "  ";

/// Serialize the ownership forest into nested structured text.
///
/// Top-level nodes are every track node not in the owned set, sorted by
/// layer ascending with arena-id (global append) order breaking ties.
/// Fragments are joined by newlines; the result is newline-terminated when
/// non-empty. Rendering the same finalized forest twice is byte-identical:
/// every ordering derives from explicit fields.
pub(crate) fn render_forest(
    timeline: &Timeline,
    forest: &ResolvedForest,
) -> MontageResult<String> {
    let mut top: Vec<(i32, NodeId)> = Vec::new();
    for track in timeline.tracks() {
        for &id in &track.nodes {
            if forest.owned.contains(&id) {
                continue;
            }
            let node = timeline
                .node(id)
                .ok_or_else(|| MontageError::render(format!("unknown node id {}", id.0)))?;
            top.push((node.z(), id));
        }
    }
    top.sort_unstable_by_key(|&(layer, id)| (layer, id));

    let ctx = RenderCtx { timeline };
    let mut fragments = Vec::with_capacity(top.len());
    for (_, id) in top {
        fragments.push(ctx.render_node(id, 0)?);
    }
    let mut text = fragments.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Ok(text)
}

/// Recursion and formatting callbacks handed to override renderers.
pub struct RenderCtx<'a> {
    pub(crate) timeline: &'a Timeline,
}

impl RenderCtx<'_> {
    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> Option<&ComponentNode> {
        self.timeline.node(id)
    }

    /// Render one node as a fragment at the given indent level.
    ///
    /// Tries the override hook for the node's tag first; `Defer` or a hook
    /// error falls back to the generic registry-driven path (the error is
    /// logged, never propagated).
    pub fn render_node(&self, id: NodeId, indent: usize) -> MontageResult<String> {
        let node = self
            .timeline
            .node(id)
            .ok_or_else(|| MontageError::render(format!("unknown node id {}", id.0)))?;

        if let Some(hook) = self.timeline.renderers().get(&node.type_tag) {
            match hook(node, self, indent) {
                Ok(RenderVerdict::Rendered(text)) => return Ok(text),
                Ok(RenderVerdict::Defer) => {}
                Err(err) => {
                    tracing::warn!(
                        tag = %node.type_tag,
                        error = %err,
                        "override renderer failed, falling back to generic rendering"
                    );
                }
            }
        }
        self.render_generic(node, indent)
    }

    /// Tag-casing helper shared with override renderers.
    pub fn tag_name(&self, tag: &str) -> String {
        pascal_case(tag)
    }

    /// Scalar formatting helper: canonical compact JSON (strings quoted and
    /// escaped, numbers and bools literal, structured data as JSON text).
    pub fn format_scalar(&self, value: &serde_json::Value) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
    }

    /// Indentation prefix for the given nesting level.
    pub fn indent(&self, level: usize) -> String {
        INDENT.repeat(level)
    }

    fn render_generic(&self, node: &ComponentNode, indent: usize) -> MontageResult<String> {
        let slots = self.timeline.slot_registry().slots_for(&node.type_tag);
        let slot_names: BTreeSet<&str> = slots.iter().map(|d| d.name.as_str()).collect();

        // Slots render in declaration order; a slot whose value is missing,
        // empty, or shape-mismatched renders nothing.
        let mut active: Vec<(&SlotDecl, Vec<NodeId>)> = Vec::new();
        for decl in slots {
            match (decl.cardinality, node.prop(&decl.name)) {
                (SlotCardinality::Single, Some(PropValue::Child(child))) => {
                    active.push((decl, vec![*child]));
                }
                (SlotCardinality::List, Some(PropValue::Children(children)))
                    if !children.is_empty() =>
                {
                    active.push((decl, children.clone()));
                }
                _ => {}
            }
        }

        let mut attrs = format!(
            "start_frame={} duration_frames={}",
            node.start_frame, node.duration_frames
        );
        for (key, value) in &node.props {
            if slot_names.contains(key.as_str()) {
                continue;
            }
            let PropValue::Scalar(scalar) = value else {
                continue;
            };
            if scalar.is_null() {
                continue;
            }
            attrs.push(' ');
            attrs.push_str(key);
            attrs.push('=');
            attrs.push_str(&self.format_scalar(scalar));
        }

        let pad = self.indent(indent);
        let tag = self.tag_name(&node.type_tag);
        if active.is_empty() {
            return Ok(format!("{pad}<{tag} {attrs} />"));
        }

        let inner = self.indent(indent + 1);
        let mut out = format!("{pad}<{tag} {attrs}>");
        for (decl, children) in active {
            match decl.cardinality {
                SlotCardinality::Single => {
                    out.push_str(&format!("\n{inner}{}={{\n", decl.name));
                    out.push_str(&self.render_node(children[0], indent + 2)?);
                    out.push_str(&format!("\n{inner}}}"));
                }
                SlotCardinality::List => {
                    out.push_str(&format!("\n{inner}{}=[\n", decl.name));
                    for (i, &child) in children.iter().enumerate() {
                        if i > 0 {
                            out.push('\n');
                        }
                        out.push_str(&self.render_node(child, indent + 2)?);
                    }
                    out.push_str(&format!("\n{inner}]"));
                }
            }
        }
        out.push_str(&format!("\n{pad}</{tag}>"));
        Ok(out)
    }
}

fn pascal_case(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut upper_next = true;
    for ch in tag.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/serializer.rs"]
mod tests;
