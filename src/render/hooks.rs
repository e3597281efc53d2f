use std::collections::BTreeMap;
use std::fmt;

use crate::composition::node::ComponentNode;
use crate::foundation::error::MontageResult;
use crate::render::serializer::RenderCtx;

/// Outcome of an override renderer.
pub enum RenderVerdict {
    /// A finished fragment, used verbatim.
    Rendered(String),
    /// Defer to the generic registry-driven rendering.
    Defer,
}

/// Per-type override renderer.
///
/// Hooks receive the node, a [`RenderCtx`] exposing recursive child
/// rendering and the shared formatting helpers, and the indent level of the
/// fragment being produced. Returning [`RenderVerdict::Defer`] or an error
/// hands the node back to the generic path; an error is logged but never
/// aborts the overall build.
pub type RenderHook = Box<
    dyn Fn(&ComponentNode, &RenderCtx<'_>, usize) -> MontageResult<RenderVerdict> + Send + Sync,
>;

#[derive(Default)]
/// Injectable registry of per-type override renderers.
///
/// The registry is a plain value owned by each timeline, so overrides never
/// leak between instances or tests.
pub struct RendererRegistry {
    hooks: BTreeMap<String, RenderHook>,
}

impl RendererRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override renderer for a type tag, replacing any existing
    /// one.
    pub fn register<F>(&mut self, tag: impl Into<String>, hook: F)
    where
        F: Fn(&ComponentNode, &RenderCtx<'_>, usize) -> MontageResult<RenderVerdict>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.insert(tag.into(), Box::new(hook));
    }

    /// Fluent variant of [`RendererRegistry::register`].
    pub fn with<F>(mut self, tag: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&ComponentNode, &RenderCtx<'_>, usize) -> MontageResult<RenderVerdict>
            + Send
            + Sync
            + 'static,
    {
        self.register(tag, hook);
        self
    }

    pub(crate) fn get(&self, tag: &str) -> Option<&RenderHook> {
        self.hooks.get(tag)
    }

    /// Registered type tags, in order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }

    /// Whether any override is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("tags", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
