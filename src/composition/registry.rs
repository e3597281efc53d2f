use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// How many children a declared slot holds.
pub enum SlotCardinality {
    /// Exactly one child node.
    Single,
    /// An ordered list of child nodes.
    List,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// A child-bearing property declared for a node type.
pub struct SlotDecl {
    /// Property key holding the child reference(s).
    pub name: String,
    /// Single child or ordered list.
    pub cardinality: SlotCardinality,
}

impl SlotDecl {
    /// Declare a single-child slot.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: SlotCardinality::Single,
        }
    }

    /// Declare a list-child slot.
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: SlotCardinality::List,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Static table mapping a node type tag to its recognized child slots.
///
/// Pure lookup data: the ownership resolver and the serializer are the only
/// consumers. A tag with no entry has no child slots and is treated as a
/// leaf, whatever its actual property contents.
pub struct ChildSlotRegistry {
    slots: BTreeMap<String, Vec<SlotDecl>>,
}

impl ChildSlotRegistry {
    /// An empty registry (every tag is a leaf).
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table covering the standard composite shapes.
    pub fn standard() -> Self {
        let mut reg = Self::new();
        for tag in ["Sequence", "Stack", "Row", "Column", "Grid"] {
            reg.declare(tag, vec![SlotDecl::list("children")]);
        }
        reg.declare("Slideshow", vec![SlotDecl::list("slides")]);
        reg.declare(
            "Overlay",
            vec![SlotDecl::single("base"), SlotDecl::list("layers")],
        );
        reg.declare(
            "SplitScreen",
            vec![SlotDecl::single("left"), SlotDecl::single("right")],
        );
        reg.declare(
            "PictureInPicture",
            vec![SlotDecl::single("main"), SlotDecl::single("inset")],
        );
        reg.declare(
            "Comparison",
            vec![SlotDecl::single("before"), SlotDecl::single("after")],
        );
        reg
    }

    /// Declare (or replace) the slots recognized for a tag.
    pub fn declare(&mut self, tag: impl Into<String>, slots: Vec<SlotDecl>) {
        self.slots.insert(tag.into(), slots);
    }

    /// Declared slots for a tag, empty for leaves.
    pub fn slots_for(&self, tag: &str) -> &[SlotDecl] {
        self.slots.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up one declared slot by tag and property key.
    pub fn slot(&self, tag: &str, name: &str) -> Option<&SlotDecl> {
        self.slots_for(tag).iter().find(|s| s.name == name)
    }

    /// Whether the tag declares any child slots.
    pub fn is_composite(&self, tag: &str) -> bool {
        !self.slots_for(tag).is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/registry.rs"]
mod tests;
