//! Montage is a programmatic video timeline and composition-tree builder.
//!
//! Montage turns a sequence of placement calls into nested structured scene
//! markup consumable by a downstream code emitter. It owns the time
//! arithmetic, the track model, and the ownership tree; it knows nothing
//! about pixels, styling, or file IO.
//!
//! # Pipeline overview
//!
//! 1. **Place**: [`Timeline::place`] resolves each node's absolute frame
//!    timing onto a named track (explicit, aligned, gapped, or sequential).
//! 2. **Resolve**: [`Timeline::resolve_forest`] walks declared child slots to
//!    compute the nested node set and the distinct type tags.
//! 3. **Serialize**: [`Timeline::build`] renders the non-nested top-level
//!    nodes depth-first into the final text artifact.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: building the same finalized timeline twice
//!   produces byte-identical text; all ordering derives from explicit fields.
//! - **Arena identity**: every node reference is a stable [`NodeId`] into one
//!   arena, and each node has at most one owner (a track or a parent slot),
//!   checked at insertion time.
//! - **No global override state**: per-type render overrides live in a
//!   [`RendererRegistry`] value injected into each timeline.
#![forbid(unsafe_code)]

mod composition;
mod foundation;
mod render;
mod resolve;

pub use composition::model::{
    BuildOutput, MAIN_TRACK, NodeSummary, Summary, Timeline, TimelineBuilder, Track, TrackSummary,
};
pub use composition::node::{ComponentNode, NodeArena, NodeBuilder, NodeId, Owner, PropValue};
pub use composition::place::PlaceOpts;
pub use composition::registry::{ChildSlotRegistry, SlotCardinality, SlotDecl};
pub use foundation::core::{Canvas, Fps};
pub use foundation::error::{MontageError, MontageResult};
pub use render::hooks::{RenderHook, RenderVerdict, RendererRegistry};
pub use render::serializer::RenderCtx;
pub use resolve::ownership::ResolvedForest;
