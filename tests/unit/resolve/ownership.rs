use super::*;
use crate::composition::node::NodeBuilder;
use crate::composition::place::PlaceOpts;
use crate::foundation::core::Canvas;

fn timeline() -> Timeline {
    Timeline::new(30, Canvas { width: 1920, height: 1080 }, "default").unwrap()
}

#[test]
fn grid_children_are_owned_in_full() {
    let mut timeline = timeline();
    let mut children = Vec::new();
    for tag in ["Card", "Quote", "Image", "Chart"] {
        children.push(timeline.insert(NodeBuilder::new(tag).build().unwrap()).unwrap());
    }
    let grid = NodeBuilder::new("Grid")
        .children("children", children.clone())
        .build()
        .unwrap();
    timeline.place(grid, 4.0, "main", PlaceOpts::new()).unwrap();

    let forest = timeline.resolve_forest().unwrap();
    assert_eq!(forest.owned, children.iter().copied().collect());
    let tags: Vec<&str> = forest.type_tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["Card", "Chart", "Grid", "Image", "Quote"]);
}

#[test]
fn resolution_descends_transitively() {
    let mut timeline = timeline();
    let left = timeline.insert(NodeBuilder::new("Card").build().unwrap()).unwrap();
    let right = timeline.insert(NodeBuilder::new("Quote").build().unwrap()).unwrap();
    let split = timeline
        .insert(
            NodeBuilder::new("SplitScreen")
                .child("left", left)
                .child("right", right)
                .build()
                .unwrap(),
        )
        .unwrap();
    let badge = timeline.insert(NodeBuilder::new("Badge").build().unwrap()).unwrap();
    let overlay = NodeBuilder::new("Overlay")
        .child("base", split)
        .children("layers", vec![badge])
        .build()
        .unwrap();
    timeline.place(overlay, 6.0, "main", PlaceOpts::new()).unwrap();

    let forest = timeline.resolve_forest().unwrap();
    assert_eq!(forest.owned, [left, right, split, badge].into_iter().collect());
    assert!(forest.type_tags.contains("Overlay"));
    assert!(forest.type_tags.contains("SplitScreen"));
    assert!(forest.type_tags.contains("Badge"));
    assert!(forest.type_tags.contains("Card"));
    assert!(forest.type_tags.contains("Quote"));
}

#[test]
fn unregistered_tags_terminate_the_walk() {
    let mut timeline = timeline();
    // "children" here is scalar payload, not a slot: Mystery has no registry
    // entry, so nothing beneath it is traversed.
    let node = NodeBuilder::new("Mystery")
        .prop("children", serde_json::json!([1, 2, 3]))
        .build()
        .unwrap();
    timeline.place(node, 1.0, "main", PlaceOpts::new()).unwrap();

    let forest = timeline.resolve_forest().unwrap();
    assert!(forest.owned.is_empty());
    assert_eq!(forest.type_tags.len(), 1);
    assert!(forest.type_tags.contains("Mystery"));
}

// Placement and insertion refuse to create shared or cyclic ownership, so
// the resolver's own detection is exercised on deserialized timelines.

#[test]
fn resolver_detects_a_multi_owned_node() {
    let json = r#"{
        "fps": 30,
        "canvas": {"width": 640, "height": 360},
        "theme": "default",
        "tracks": {
            "main": {"name": "main", "layer": 0, "default_gap": 0, "cursor": 0, "nodes": [1, 2]}
        },
        "arena": {"nodes": [
            {"node": {"type_tag": "Card", "start_frame": 0, "duration_frames": 0, "layer": null, "props": []},
             "owner": {"Parent": 1}},
            {"node": {"type_tag": "Grid", "start_frame": 0, "duration_frames": 30, "layer": 0,
                      "props": [["children", {"Children": [0]}]]},
             "owner": {"Track": "main"}},
            {"node": {"type_tag": "Grid", "start_frame": 30, "duration_frames": 30, "layer": 0,
                      "props": [["children", {"Children": [0]}]]},
             "owner": {"Track": "main"}}
        ]},
        "slot_registry": {"slots": {"Grid": [{"name": "children", "cardinality": "List"}]}}
    }"#;
    let timeline: Timeline = serde_json::from_str(json).unwrap();
    let err = timeline.resolve_forest().unwrap_err();
    assert!(matches!(err, MontageError::Structural(_)));
    assert!(err.to_string().contains("multi-owned"));
}

#[test]
fn resolver_detects_a_child_slot_cycle() {
    let json = r#"{
        "fps": 30,
        "canvas": {"width": 640, "height": 360},
        "theme": "default",
        "tracks": {
            "main": {"name": "main", "layer": 0, "default_gap": 0, "cursor": 0, "nodes": [0]}
        },
        "arena": {"nodes": [
            {"node": {"type_tag": "Overlay", "start_frame": 0, "duration_frames": 30, "layer": 0,
                      "props": [["base", {"Child": 1}]]},
             "owner": {"Track": "main"}},
            {"node": {"type_tag": "Overlay", "start_frame": 0, "duration_frames": 0, "layer": null,
                      "props": [["base", {"Child": 0}]]},
             "owner": {"Parent": 0}}
        ]},
        "slot_registry": {"slots": {"Overlay": [{"name": "base", "cardinality": "Single"}]}}
    }"#;
    let timeline: Timeline = serde_json::from_str(json).unwrap();
    let err = timeline.resolve_forest().unwrap_err();
    assert!(matches!(err, MontageError::Structural(_)));
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn resolver_rejects_a_node_both_placed_and_nested() {
    let json = r#"{
        "fps": 30,
        "canvas": {"width": 640, "height": 360},
        "theme": "default",
        "tracks": {
            "main": {"name": "main", "layer": 0, "default_gap": 0, "cursor": 0, "nodes": [0, 1]}
        },
        "arena": {"nodes": [
            {"node": {"type_tag": "Card", "start_frame": 0, "duration_frames": 30, "layer": 0, "props": []},
             "owner": {"Track": "main"}},
            {"node": {"type_tag": "Grid", "start_frame": 30, "duration_frames": 30, "layer": 0,
                      "props": [["children", {"Children": [0]}]]},
             "owner": {"Track": "main"}}
        ]},
        "slot_registry": {"slots": {"Grid": [{"name": "children", "cardinality": "List"}]}}
    }"#;
    let timeline: Timeline = serde_json::from_str(json).unwrap();
    let err = timeline.resolve_forest().unwrap_err();
    assert!(err.to_string().contains("multi-owned"));
}
