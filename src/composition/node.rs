use crate::foundation::error::{MontageError, MontageResult};

/// Stable arena identifier for a [`ComponentNode`].
///
/// Ids are assigned in insertion order and never reused; every reference
/// between nodes (track membership, child slots, owner back-pointers) is a
/// `NodeId`, never a Rust reference.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A property value attached to a [`ComponentNode`].
///
/// Scalar payloads are arbitrary JSON, matching what the downstream emitter
/// accepts as attribute values. Child references are arena ids validated
/// against the slot registry when the node enters a timeline.
pub enum PropValue {
    /// Plain data: string, number, bool, null, or structured JSON.
    Scalar(serde_json::Value),
    /// A single nested child node.
    Child(NodeId),
    /// An ordered list of nested child nodes.
    Children(Vec<NodeId>),
}

impl PropValue {
    /// Whether this value carries child node references.
    pub fn is_child_ref(&self) -> bool {
        matches!(self, PropValue::Child(_) | PropValue::Children(_))
    }

    /// Whether this value renders nothing (null scalar or empty child list).
    pub fn is_empty(&self) -> bool {
        match self {
            PropValue::Scalar(v) => v.is_null(),
            PropValue::Child(_) => false,
            PropValue::Children(ids) => ids.is_empty(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// The placed-or-nested unit of a composition.
///
/// A node is either appended to exactly one track ("top-level", with timing
/// resolved by the placement engine) or referenced from exactly one parent
/// node's child slot ("nested", where frame fields are opaque payload).
pub struct ComponentNode {
    /// Open type identifier; a tag absent from the slot registry is a leaf.
    pub type_tag: String,
    /// Absolute start frame (resolved at placement for top-level nodes).
    pub start_frame: u64,
    /// Duration in frames.
    pub duration_frames: u64,
    /// Z-order override; `None` inherits the owning track's layer.
    pub layer: Option<i32>,
    /// Insertion-ordered property map.
    pub props: Vec<(String, PropValue)>,
}

impl ComponentNode {
    /// Effective z-order: the node's own layer, or 0 when unset.
    pub fn z(&self) -> i32 {
        self.layer.unwrap_or(0)
    }

    /// Look up a property value by key.
    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Fluent constructor for detached [`ComponentNode`]s.
///
/// Built nodes carry no arena id; they are registered through
/// [`crate::Timeline::insert`] (nested) or [`crate::Timeline::place`]
/// (top-level), which is where slot cardinality and ownership are checked.
pub struct NodeBuilder {
    type_tag: String,
    start_frame: u64,
    duration_frames: u64,
    layer: Option<i32>,
    props: Vec<(String, PropValue)>,
}

impl NodeBuilder {
    /// Start a node with the given type tag.
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            start_frame: 0,
            duration_frames: 0,
            layer: None,
            props: Vec::new(),
        }
    }

    /// Override the z-order instead of inheriting the track layer.
    pub fn layer(mut self, z: i32) -> Self {
        self.layer = Some(z);
        self
    }

    /// Set frame payload on a node that will be nested rather than placed.
    pub fn frames(mut self, start_frame: u64, duration_frames: u64) -> Self {
        self.start_frame = start_frame;
        self.duration_frames = duration_frames;
        self
    }

    /// Attach a scalar property.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(key.into(), PropValue::Scalar(value.into()));
        self
    }

    /// Attach a single-child slot value.
    pub fn child(mut self, slot: impl Into<String>, id: NodeId) -> Self {
        self.set(slot.into(), PropValue::Child(id));
        self
    }

    /// Attach a list-child slot value.
    pub fn children(mut self, slot: impl Into<String>, ids: Vec<NodeId>) -> Self {
        self.set(slot.into(), PropValue::Children(ids));
        self
    }

    fn set(&mut self, key: String, value: PropValue) {
        // Re-setting a key keeps its original position.
        if let Some(entry) = self.props.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.props.push((key, value));
        }
    }

    /// Finish the node.
    pub fn build(self) -> MontageResult<ComponentNode> {
        if self.type_tag.trim().is_empty() {
            return Err(MontageError::configuration("node type_tag must be non-empty"));
        }
        Ok(ComponentNode {
            type_tag: self.type_tag,
            start_frame: self.start_frame,
            duration_frames: self.duration_frames,
            layer: self.layer,
            props: self.props,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Who holds a node: a track (top-level) or a parent node's slot (nested).
pub enum Owner {
    /// Appended to the named track.
    Track(String),
    /// Referenced from a child slot of the given parent.
    Parent(NodeId),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct ArenaEntry {
    node: ComponentNode,
    owner: Option<Owner>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Backing store for every node of one timeline.
///
/// The arena only grows; nodes are never removed. Owner back-pointers make
/// the "at most one owner" invariant a cheap insertion-time check instead of
/// an incidental property of object identity.
pub struct NodeArena {
    nodes: Vec<ArenaEntry>,
}

impl NodeArena {
    /// Register a detached node and return its id.
    pub(crate) fn push(&mut self, node: ComponentNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ArenaEntry { node, owner: None });
        id
    }

    /// Borrow a node by id.
    pub fn get(&self, id: NodeId) -> Option<&ComponentNode> {
        self.nodes.get(id.0 as usize).map(|e| &e.node)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut ComponentNode> {
        self.nodes.get_mut(id.0 as usize).map(|e| &mut e.node)
    }

    /// Current owner of a node, if any.
    pub fn owner(&self, id: NodeId) -> Option<&Owner> {
        self.nodes.get(id.0 as usize).and_then(|e| e.owner.as_ref())
    }

    /// Claim ownership of a node, rejecting nodes that are already owned.
    pub(crate) fn claim(&mut self, id: NodeId, owner: Owner) -> MontageResult<()> {
        let entry = self
            .nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| MontageError::structural(format!("unknown node id {}", id.0)))?;
        if let Some(existing) = &entry.owner {
            return Err(MontageError::structural(format!(
                "node {} already owned by {existing:?}",
                id.0
            )));
        }
        entry.owner = Some(owner);
        Ok(())
    }

    /// Whether the arena holds the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.nodes.len()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/node.rs"]
mod tests;
