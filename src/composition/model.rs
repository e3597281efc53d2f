use std::collections::{BTreeMap, BTreeSet};

use crate::{
    composition::node::{ComponentNode, NodeArena, NodeId, Owner, PropValue},
    composition::registry::{ChildSlotRegistry, SlotCardinality},
    foundation::core::{Canvas, Fps},
    foundation::error::{MontageError, MontageResult},
    render::hooks::RendererRegistry,
    render::serializer,
    resolve::ownership::{self, ResolvedForest},
};

/// Name of the track every timeline starts with.
pub const MAIN_TRACK: &str = "main";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A named sequencing lane holding top-level nodes in append order.
pub struct Track {
    /// Track name, unique within a timeline.
    pub name: String,
    /// Default z-order for nodes placed on this track.
    pub layer: i32,
    /// Frames inserted between sequential default placements.
    pub default_gap: u64,
    /// End frame of the most recently placed node; starts at 0.
    pub cursor: u64,
    /// Top-level node ids in append order (not necessarily chronological).
    pub nodes: Vec<NodeId>,
}

impl Track {
    pub(crate) fn new(name: impl Into<String>, layer: i32, default_gap: u64) -> MontageResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MontageError::configuration("track name must be non-empty"));
        }
        Ok(Self {
            name,
            layer,
            default_gap,
            cursor: 0,
            nodes: Vec::new(),
        })
    }

    /// Id of the most recently appended node, if any.
    pub fn last_placed(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
/// A complete composition session: tracks, the node arena, and the
/// registries consulted during resolution and serialization.
///
/// A timeline is mutable shared state with no interior synchronization;
/// placement takes `&mut self` and the resolve/render pipeline takes
/// `&self`, so single-writer discipline is required of callers sharing one
/// instance across threads.
pub struct Timeline {
    fps: Fps,
    canvas: Canvas,
    theme: String,
    tracks: BTreeMap<String, Track>,
    arena: NodeArena,
    slot_registry: ChildSlotRegistry,
    #[serde(skip, default)]
    renderers: RendererRegistry,
}

impl Timeline {
    /// Create a timeline with the standard slot registry and a "main" track
    /// (layer 0, no default gap).
    pub fn new(fps: u32, canvas: Canvas, theme: impl Into<String>) -> MontageResult<Self> {
        TimelineBuilder::new(fps).canvas(canvas).theme(theme).build()
    }

    /// Start a [`TimelineBuilder`].
    pub fn builder(fps: u32) -> TimelineBuilder {
        TimelineBuilder::new(fps)
    }

    /// Timeline frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Opaque canvas dimensions, forwarded to the emitter.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Opaque theme key, forwarded to the emitter.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Borrow the node arena.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Borrow the child-slot registry.
    pub fn slot_registry(&self) -> &ChildSlotRegistry {
        &self.slot_registry
    }

    /// Borrow the override renderer registry.
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> Option<&ComponentNode> {
        self.arena.get(id)
    }

    /// Borrow a track by name.
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.get(name)
    }

    /// Iterate tracks in name order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Register a new sequencing lane.
    pub fn add_track(
        &mut self,
        name: impl Into<String>,
        layer: i32,
        default_gap: u64,
    ) -> MontageResult<()> {
        let track = Track::new(name, layer, default_gap)?;
        if self.tracks.contains_key(&track.name) {
            return Err(MontageError::configuration(format!(
                "duplicate track name '{}'",
                track.name
            )));
        }
        self.tracks.insert(track.name.clone(), track);
        Ok(())
    }

    /// Register a node in the arena without placing it on a track.
    ///
    /// This is how children are created before being referenced from a
    /// parent's slot. Child-reference properties are validated against the
    /// slot registry and claimed here; the node itself stays unowned until a
    /// parent adopts it or [`Timeline::place`] appends it to a track.
    pub fn insert(&mut self, node: ComponentNode) -> MontageResult<NodeId> {
        let child_ids = self.check_child_props(&node)?;
        let id = self.arena.push(node);
        for child in child_ids {
            self.arena.claim(child, Owner::Parent(id))?;
        }
        Ok(id)
    }

    /// Validate a detached node's child-reference properties against the
    /// slot registry and the arena, returning the referenced ids.
    ///
    /// No mutation happens here; callers claim the returned ids afterwards.
    pub(crate) fn check_child_props(&self, node: &ComponentNode) -> MontageResult<Vec<NodeId>> {
        let mut referenced = Vec::new();
        let mut seen = BTreeSet::new();
        for (key, value) in &node.props {
            let decl = self.slot_registry.slot(&node.type_tag, key);
            match (value, decl) {
                (PropValue::Scalar(_), _) => continue,
                (_, None) => {
                    return Err(MontageError::structural(format!(
                        "type '{}' does not declare child slot '{key}'",
                        node.type_tag
                    )));
                }
                (PropValue::Child(id), Some(d)) => {
                    if d.cardinality != SlotCardinality::Single {
                        return Err(MontageError::structural(format!(
                            "slot '{key}' of '{}' holds a list, not a single child",
                            node.type_tag
                        )));
                    }
                    referenced.push(*id);
                }
                (PropValue::Children(ids), Some(d)) => {
                    if d.cardinality != SlotCardinality::List {
                        return Err(MontageError::structural(format!(
                            "slot '{key}' of '{}' holds a single child, not a list",
                            node.type_tag
                        )));
                    }
                    referenced.extend(ids.iter().copied());
                }
            }
        }
        for &id in &referenced {
            if !self.arena.contains(id) {
                return Err(MontageError::structural(format!(
                    "child reference to unknown node id {}",
                    id.0
                )));
            }
            if let Some(owner) = self.arena.owner(id) {
                return Err(MontageError::structural(format!(
                    "node {} already owned by {owner:?}",
                    id.0
                )));
            }
            if !seen.insert(id) {
                return Err(MontageError::structural(format!(
                    "node {} referenced twice from the same parent",
                    id.0
                )));
            }
        }
        Ok(referenced)
    }

    pub(crate) fn track_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.tracks.get_mut(name)
    }

    pub(crate) fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    /// Compute the transitively nested node set and the distinct type tags.
    pub fn resolve_forest(&self) -> MontageResult<ResolvedForest> {
        ownership::resolve_forest(self)
    }

    /// Read-only inspection snapshot of the timeline state.
    pub fn summarize(&self) -> Summary {
        let mut tracks = Vec::new();
        let mut nodes = Vec::new();
        let mut total_duration_frames = 0u64;

        for track in self.tracks.values() {
            tracks.push(TrackSummary {
                name: track.name.clone(),
                layer: track.layer,
                cursor: track.cursor,
                node_count: track.nodes.len(),
            });
            for &id in &track.nodes {
                let Some(node) = self.arena.get(id) else {
                    continue;
                };
                total_duration_frames =
                    total_duration_frames.max(node.start_frame + node.duration_frames);
                nodes.push(NodeSummary {
                    id,
                    track: track.name.clone(),
                    type_tag: node.type_tag.clone(),
                    start_frame: node.start_frame,
                    duration_frames: node.duration_frames,
                    layer: node.z(),
                });
            }
        }

        Summary {
            fps: self.fps.0,
            tracks,
            total_duration_frames,
            total_duration_seconds: self.fps.frames_to_secs(total_duration_frames),
            nodes,
        }
    }

    /// Validate timeline invariants: track/arena consistency, ownership
    /// back-pointers, and slot declarations.
    ///
    /// Placement and insertion keep these invariants by construction; this
    /// re-checks them for timelines deserialized from JSON.
    pub fn validate(&self) -> MontageResult<()> {
        if self.fps.0 == 0 {
            return Err(MontageError::configuration("fps must be > 0"));
        }
        if !self.tracks.contains_key(MAIN_TRACK) {
            return Err(MontageError::configuration("timeline must have a 'main' track"));
        }
        for (key, track) in &self.tracks {
            if track.name.trim().is_empty() {
                return Err(MontageError::configuration("track name must be non-empty"));
            }
            if *key != track.name {
                return Err(MontageError::configuration(format!(
                    "track map key '{key}' does not match track name '{}'",
                    track.name
                )));
            }
            for &id in &track.nodes {
                if self.arena.get(id).is_none() {
                    return Err(MontageError::structural(format!(
                        "track '{}' references unknown node id {}",
                        track.name, id.0
                    )));
                }
                if self.arena.owner(id) != Some(&Owner::Track(track.name.clone())) {
                    return Err(MontageError::structural(format!(
                        "node {} on track '{}' has inconsistent owner",
                        id.0, track.name
                    )));
                }
            }
        }
        for id in self.arena.ids() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            for (key, value) in &node.props {
                match value {
                    PropValue::Scalar(_) => {}
                    PropValue::Child(child) => {
                        self.validate_child_edge(id, &node.type_tag, key, *child)?;
                    }
                    PropValue::Children(children) => {
                        for &child in children {
                            self.validate_child_edge(id, &node.type_tag, key, child)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_child_edge(
        &self,
        parent: NodeId,
        tag: &str,
        slot: &str,
        child: NodeId,
    ) -> MontageResult<()> {
        if self.slot_registry.slot(tag, slot).is_none() {
            return Err(MontageError::structural(format!(
                "type '{tag}' does not declare child slot '{slot}'"
            )));
        }
        if self.arena.get(child).is_none() {
            return Err(MontageError::structural(format!(
                "child reference to unknown node id {}",
                child.0
            )));
        }
        if self.arena.owner(child) != Some(&Owner::Parent(parent)) {
            return Err(MontageError::structural(format!(
                "node {} has inconsistent owner for slot '{slot}'",
                child.0
            )));
        }
        Ok(())
    }

    /// Run the ownership resolver and the tree serializer, producing the
    /// final structured text plus the distinct type tags the downstream
    /// emitter must resolve.
    #[tracing::instrument(skip(self))]
    pub fn build(&self) -> MontageResult<BuildOutput> {
        self.validate()?;
        let forest = ownership::resolve_forest(self)?;
        let text = serializer::render_forest(self, &forest)?;
        Ok(BuildOutput {
            text,
            type_tags: forest.type_tags,
        })
    }

    /// Serialize the timeline model to JSON (override renderers excluded).
    pub fn to_json(&self) -> MontageResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MontageError::serde(format!("timeline serialization failed: {e}")))
    }

    /// Deserialize and validate a timeline model from JSON.
    pub fn from_json(json: &str) -> MontageResult<Self> {
        let timeline: Timeline = serde_json::from_str(json)
            .map_err(|e| MontageError::serde(format!("invalid timeline JSON: {e}")))?;
        timeline.validate()?;
        Ok(timeline)
    }
}

#[derive(Clone, Debug, serde::Serialize)]
/// Result of [`Timeline::build`].
pub struct BuildOutput {
    /// Nested structured text for the downstream emitter.
    pub text: String,
    /// Every distinct type tag reachable from the placed forest.
    pub type_tags: BTreeSet<String>,
}

#[derive(Clone, Debug, serde::Serialize)]
/// Read-only snapshot returned by [`Timeline::summarize`].
pub struct Summary {
    /// Timeline frame rate.
    pub fps: u32,
    /// Per-track state in name order.
    pub tracks: Vec<TrackSummary>,
    /// `max(start_frame + duration_frames)` over all top-level nodes.
    pub total_duration_frames: u64,
    /// Total duration converted to seconds.
    pub total_duration_seconds: f64,
    /// Per-node rows for all top-level nodes, grouped by track.
    pub nodes: Vec<NodeSummary>,
}

#[derive(Clone, Debug, serde::Serialize)]
/// One track's state within a [`Summary`].
pub struct TrackSummary {
    /// Track name.
    pub name: String,
    /// Track base layer.
    pub layer: i32,
    /// Current cursor position in frames.
    pub cursor: u64,
    /// Number of nodes appended to the track.
    pub node_count: usize,
}

#[derive(Clone, Debug, serde::Serialize)]
/// One placed node's timing within a [`Summary`].
pub struct NodeSummary {
    /// Arena id.
    pub id: NodeId,
    /// Owning track name.
    pub track: String,
    /// Node type tag.
    pub type_tag: String,
    /// Resolved start frame.
    pub start_frame: u64,
    /// Duration in frames.
    pub duration_frames: u64,
    /// Effective z-order.
    pub layer: i32,
}

/// Fluent constructor for [`Timeline`]s.
pub struct TimelineBuilder {
    fps: u32,
    canvas: Canvas,
    theme: String,
    slot_registry: ChildSlotRegistry,
    renderers: RendererRegistry,
    tracks: Vec<(String, i32, u64)>,
}

impl TimelineBuilder {
    /// Start a builder with a 1920x1080 canvas and the standard slot registry.
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            canvas: Canvas {
                width: 1920,
                height: 1080,
            },
            theme: "default".to_string(),
            slot_registry: ChildSlotRegistry::standard(),
            renderers: RendererRegistry::new(),
            tracks: Vec::new(),
        }
    }

    /// Set the pass-through canvas dimensions.
    pub fn canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Set the pass-through theme key.
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Replace the slot registry.
    pub fn slot_registry(mut self, registry: ChildSlotRegistry) -> Self {
        self.slot_registry = registry;
        self
    }

    /// Inject the override renderer registry.
    pub fn renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = renderers;
        self
    }

    /// Add a track beyond the implicit "main" one.
    pub fn track(mut self, name: impl Into<String>, layer: i32, default_gap: u64) -> Self {
        self.tracks.push((name.into(), layer, default_gap));
        self
    }

    /// Finish the timeline; the "main" track always exists.
    pub fn build(self) -> MontageResult<Timeline> {
        let fps = Fps::new(self.fps)?;
        let mut timeline = Timeline {
            fps,
            canvas: self.canvas,
            theme: self.theme,
            tracks: BTreeMap::new(),
            arena: NodeArena::default(),
            slot_registry: self.slot_registry,
            renderers: self.renderers,
        };
        timeline
            .tracks
            .insert(MAIN_TRACK.to_string(), Track::new(MAIN_TRACK, 0, 0)?);
        for (name, layer, default_gap) in self.tracks {
            timeline.add_track(name, layer, default_gap)?;
        }
        Ok(timeline)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
