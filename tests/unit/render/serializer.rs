use super::*;
use crate::composition::model::{MAIN_TRACK, TimelineBuilder};
use crate::composition::node::NodeBuilder;
use crate::composition::place::PlaceOpts;
use crate::foundation::core::Canvas;
use crate::render::hooks::RendererRegistry;

fn timeline() -> Timeline {
    Timeline::new(30, Canvas { width: 1920, height: 1080 }, "default").unwrap()
}

fn leaf(tag: &str, label: &str) -> ComponentNode {
    NodeBuilder::new(tag).prop("label", label).build().unwrap()
}

#[test]
fn grid_renders_children_in_list_order() {
    let mut timeline = timeline();
    let mut children = Vec::new();
    for label in ["A", "B", "C", "D"] {
        children.push(timeline.insert(leaf("Card", label)).unwrap());
    }
    let grid = NodeBuilder::new("Grid")
        .prop("columns", 2)
        .children("children", children)
        .build()
        .unwrap();
    timeline.place(grid, 4.0, MAIN_TRACK, PlaceOpts::new()).unwrap();

    let out = timeline.build().unwrap();
    let expected = "\
<Grid start_frame=0 duration_frames=120 columns=2>
  children=[
    <Card start_frame=0 duration_frames=0 label=\"A\" />
    <Card start_frame=0 duration_frames=0 label=\"B\" />
    <Card start_frame=0 duration_frames=0 label=\"C\" />
    <Card start_frame=0 duration_frames=0 label=\"D\" />
  ]
</Grid>
";
    assert_eq!(out.text, expected);
    let tags: Vec<&str> = out.type_tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["Card", "Grid"]);
}

#[test]
fn single_slots_render_as_named_bindings() {
    let mut timeline = timeline();
    let left = timeline.insert(leaf("Card", "L")).unwrap();
    let right = timeline.insert(leaf("Card", "R")).unwrap();
    let split = NodeBuilder::new("SplitScreen")
        .child("left", left)
        .child("right", right)
        .build()
        .unwrap();
    timeline.place(split, 3.0, MAIN_TRACK, PlaceOpts::new()).unwrap();

    let expected = "\
<SplitScreen start_frame=0 duration_frames=90>
  left={
    <Card start_frame=0 duration_frames=0 label=\"L\" />
  }
  right={
    <Card start_frame=0 duration_frames=0 label=\"R\" />
  }
</SplitScreen>
";
    assert_eq!(timeline.build().unwrap().text, expected);
}

#[test]
fn top_level_order_is_layer_then_append() {
    let mut timeline = timeline();
    for (tag, layer) in [("Back", 5), ("Base", 0), ("Front", 5)] {
        timeline
            .place(
                NodeBuilder::new(tag).layer(layer).build().unwrap(),
                1.0,
                MAIN_TRACK,
                PlaceOpts::new().start_frame(0),
            )
            .unwrap();
    }

    let text = timeline.build().unwrap().text;
    let order: Vec<&str> = text
        .lines()
        .map(|l| l.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(order, vec!["<Base", "<Back", "<Front"]);
}

#[test]
fn scalar_attributes_format_by_type() {
    let mut timeline = timeline();
    let node = NodeBuilder::new("Terminal")
        .prop("title", "say \"hi\"")
        .prop("lines", 3)
        .prop("blink", true)
        .prop("palette", serde_json::json!({"bg": "black", "fg": "green"}))
        .prop("note", serde_json::Value::Null)
        .build()
        .unwrap();
    timeline.place(node, 1.0, MAIN_TRACK, PlaceOpts::new()).unwrap();

    let text = timeline.build().unwrap().text;
    assert_eq!(
        text,
        "<Terminal start_frame=0 duration_frames=30 title=\"say \\\"hi\\\"\" lines=3 blink=true palette={\"bg\":\"black\",\"fg\":\"green\"} />\n"
    );
}

#[test]
fn snake_case_tags_are_pascal_cased() {
    let mut timeline = timeline();
    timeline
        .place(leaf("lower_third", "x"), 1.0, MAIN_TRACK, PlaceOpts::new())
        .unwrap();
    assert!(timeline.build().unwrap().text.starts_with("<LowerThird "));
}

#[test]
fn build_is_deterministic() {
    let mut timeline = timeline();
    timeline.add_track("overlay", 10, 0).unwrap();
    let a = timeline.insert(leaf("Card", "A")).unwrap();
    let grid = NodeBuilder::new("Grid")
        .children("children", vec![a])
        .build()
        .unwrap();
    timeline.place(grid, 4.0, MAIN_TRACK, PlaceOpts::new()).unwrap();
    timeline
        .place(leaf("LowerThird", "credit"), 2.0, "overlay", PlaceOpts::new())
        .unwrap();

    let first = timeline.build().unwrap();
    let second = timeline.build().unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.type_tags, second.type_tags);
}

#[test]
fn override_hook_replaces_the_generic_fragment() {
    let renderers = RendererRegistry::new().with("TitleScene", |node, ctx, indent| {
        let title = node
            .prop("title")
            .and_then(|v| match v {
                PropValue::Scalar(s) => s.as_str(),
                _ => None,
            })
            .unwrap_or("untitled");
        Ok(RenderVerdict::Rendered(format!(
            "{}<AnimatedTitle text={} />",
            ctx.indent(indent),
            ctx.format_scalar(&serde_json::json!(title))
        )))
    });
    let mut timeline = TimelineBuilder::new(30).renderers(renderers).build().unwrap();
    timeline
        .place(
            NodeBuilder::new("TitleScene").prop("title", "Intro").build().unwrap(),
            1.0,
            MAIN_TRACK,
            PlaceOpts::new(),
        )
        .unwrap();

    assert_eq!(
        timeline.build().unwrap().text,
        "<AnimatedTitle text=\"Intro\" />\n"
    );
}

#[test]
fn deferring_override_falls_back_to_generic() {
    let renderers =
        RendererRegistry::new().with("TitleScene", |_, _, _| Ok(RenderVerdict::Defer));
    let mut timeline = TimelineBuilder::new(30).renderers(renderers).build().unwrap();
    timeline
        .place(leaf("TitleScene", "x"), 1.0, MAIN_TRACK, PlaceOpts::new())
        .unwrap();

    assert_eq!(
        timeline.build().unwrap().text,
        "<TitleScene start_frame=0 duration_frames=30 label=\"x\" />\n"
    );
}

#[test]
fn failing_override_never_aborts_the_build() {
    let renderers = RendererRegistry::new().with("TitleScene", |_, _, _| {
        Err(MontageError::render("template exploded"))
    });
    let mut timeline = TimelineBuilder::new(30).renderers(renderers).build().unwrap();
    timeline
        .place(leaf("TitleScene", "x"), 1.0, MAIN_TRACK, PlaceOpts::new())
        .unwrap();
    timeline
        .place(leaf("CodeBlock", "y"), 1.0, MAIN_TRACK, PlaceOpts::new())
        .unwrap();

    let out = timeline.build().unwrap();
    assert_eq!(
        out.text,
        "<TitleScene start_frame=0 duration_frames=30 label=\"x\" />\n\
         <CodeBlock start_frame=30 duration_frames=30 label=\"y\" />\n"
    );
}

#[test]
fn empty_timeline_renders_empty_text() {
    let timeline = timeline();
    let out = timeline.build().unwrap();
    assert!(out.text.is_empty());
    assert!(out.type_tags.is_empty());
}

#[test]
fn empty_slot_values_render_as_a_leaf() {
    let mut timeline = timeline();
    let node = NodeBuilder::new("Grid")
        .prop("columns", 3)
        .children("children", vec![])
        .build()
        .unwrap();
    timeline.place(node, 1.0, MAIN_TRACK, PlaceOpts::new()).unwrap();

    assert_eq!(
        timeline.build().unwrap().text,
        "<Grid start_frame=0 duration_frames=30 columns=3 />\n"
    );
}
