mod common;

use std::rc::Rc;

use common::{Harness, chain_graph, data_message};
use depviz_view::error::ViewError;
use depviz_view::render::{REHEAT_DELAY_MS, RenderMode, Vec3};
use depviz_view::view::{FOCUS_RETRY_MS, Inbound, NodeRef, Outbound};
use serde_json::json;

fn loaded() -> Harness {
	let mut harness = Harness::new();
	harness.send(data_message(&chain_graph()));
	harness
}

fn close(a: f64, b: f64) -> bool {
	(a - b).abs() < 1e-9
}

#[test]
fn data_pushes_topology_and_reheats_after_delay() {
	let mut h = loaded();
	let backend = h.backend();
	assert_eq!(backend.borrow().mode, RenderMode::TwoD);
	assert_eq!(backend.borrow().set_data_calls, 1);
	assert_eq!(backend.borrow().node_ids(), ["a", "b", "c", "d", "e"]);
	assert_eq!(backend.borrow().data.links.len(), 3);
	assert_eq!(backend.borrow().background, "#1a1a1a");

	h.advance(REHEAT_DELAY_MS - 1.0);
	assert_eq!(backend.borrow().reheats, 0);
	h.advance(1.0);
	assert_eq!(backend.borrow().reheats, 1);
}

#[test]
fn renderer_is_created_lazily() {
	let mut h = Harness::new();
	h.send(json!({ "type": "clearFocus" }));
	h.send(json!({ "type": "controls", "controls": { "showNames": false } }));
	assert!(h.backends.borrow().is_empty());
	assert!(!h.view.render().is_active());

	h.send(data_message(&chain_graph()));
	assert_eq!(h.backends.borrow().len(), 1);
}

#[test]
fn cosmetic_refresh_is_idempotent() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "controls", "controls": { "showNames": false } }));
	let first: Vec<_> = (0..5).map(|i| backend.borrow().node(i)).collect();
	h.send(json!({ "type": "controls", "controls": { "showNames": false } }));
	let second: Vec<_> = (0..5).map(|i| backend.borrow().node(i)).collect();

	assert_eq!(first, second);
	assert!(first.iter().flatten().all(|style| style.label.is_none()));
	assert_eq!(backend.borrow().set_data_calls, 1);
}

#[test]
fn focus_dims_everything_outside_the_neighbourhood() {
	let mut h = loaded();
	let backend = h.backend();
	backend.borrow_mut().place_all();
	h.send(json!({ "type": "focusNodeById", "nodeId": "b" }));

	let b = backend.borrow();
	for neighbour in [0, 1, 2] {
		assert_eq!(b.node(neighbour).map(|s| s.color), Some("#157df4ff".to_string()));
	}
	let d = b.node(3).map(|s| s.color).unwrap_or_default();
	assert!(d.ends_with(", 0.2)"), "{d}");

	let focused_edge = b.link(0).expect("a-b styled");
	assert_eq!(focused_edge.particles, 3);
	assert!(close(focused_edge.width, 0.5 * 1.5));
	let far_edge = b.link(2).map(|s| s.color).unwrap_or_default();
	assert!(far_edge.ends_with(", 0.1)"), "{far_edge}");

	assert_eq!(b.centers, [(10.0, 5.0, 1000.0)]);
	assert_eq!(b.zooms, [(3.0, 1000.0)]);
	assert_eq!(h.view.model().ui.focused.as_deref(), Some("b"));
}

#[test]
fn focus_by_path_resolves_through_suffix_match() {
	let mut h = loaded();
	h.backend().borrow_mut().place_all();
	h.send(json!({ "type": "focusNode", "filePath": "/home/dev/project/src/pkg/c.java" }));
	assert_eq!(h.view.model().ui.focused.as_deref(), Some("c"));

	h.send(json!({ "type": "focusNode", "filePath": "/elsewhere/missing.java" }));
	assert_eq!(h.view.model().ui.focused.as_deref(), Some("c"));
}

#[test]
fn focus_retries_until_the_node_has_a_position() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "focusNodeById", "nodeId": "c" }));
	assert!(backend.borrow().centers.is_empty());

	h.advance(FOCUS_RETRY_MS);
	assert!(backend.borrow().centers.is_empty());

	backend.borrow_mut().place_all();
	h.advance(FOCUS_RETRY_MS);
	assert_eq!(backend.borrow().centers.len(), 1);

	h.advance(FOCUS_RETRY_MS * 5.0);
	assert_eq!(backend.borrow().centers.len(), 1);
}

#[test]
fn cleared_focus_cancels_the_retry() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "focusNodeById", "nodeId": "c" }));
	h.send(json!({ "type": "clearFocus" }));
	backend.borrow_mut().place_all();
	h.advance(FOCUS_RETRY_MS * 2.0);

	assert!(backend.borrow().centers.is_empty());
	assert_eq!(h.view.model().ui.focused, None);
}

#[test]
fn focus_on_unknown_id_is_ignored() {
	let mut h = loaded();
	h.send(json!({ "type": "focusNodeById", "nodeId": "zzz" }));
	assert_eq!(h.view.model().ui.focused, None);
	assert_eq!(h.view.pending_tasks(), 1);
}

#[test]
fn layout_controls_keep_adjacency_and_skip_reheat() {
	let mut h = loaded();
	let backend = h.backend();
	let adjacency = Rc::clone(h.view.model().adjacency());
	let generation = h.view.model().generation();

	h.send(json!({ "type": "controls", "controls": { "linkDistance": 80.0 } }));
	assert!(Rc::ptr_eq(&adjacency, h.view.model().adjacency()));
	assert_eq!(h.view.model().generation(), generation);
	assert_eq!(backend.borrow().set_data_calls, 2);
	assert_eq!(backend.borrow().link_distance, 80.0);

	h.advance(REHEAT_DELAY_MS * 3.0);
	assert_eq!(backend.borrow().reheats, 1);
}

#[test]
fn search_filters_pushed_topology() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "controls", "controls": { "search": "type:Interface" } }));
	assert_eq!(backend.borrow().node_ids(), ["e"]);
	assert!(backend.borrow().data.links.is_empty());

	h.send(json!({ "type": "controls", "controls": { "search": "" } }));
	assert_eq!(backend.borrow().node_ids().len(), 5);
}

#[test]
fn toggle_3d_reinitializes_in_the_other_mode() {
	let mut h = loaded();
	let first = h.backend();
	h.send(json!({ "type": "toggle3DMode" }));

	assert_eq!(h.backends.borrow().len(), 2);
	assert_eq!(h.view.render_mode(), RenderMode::ThreeD);
	let second = h.backend();
	assert_eq!(second.borrow().mode, RenderMode::ThreeD);
	assert_eq!(second.borrow().node_ids().len(), 5);

	h.advance(REHEAT_DELAY_MS);
	assert_eq!(first.borrow().reheats, 0);
	assert_eq!(second.borrow().reheats, 1);

	h.send(json!({ "type": "toggle3DMode" }));
	assert_eq!(h.backends.borrow().len(), 3);
	assert_eq!(h.backend().borrow().mode, RenderMode::TwoD);
	assert!(!h.view.controls().is_3d_mode);
}

#[test]
fn mode_control_switches_renderer_and_clears_focus_but_not_stack() {
	let mut h = loaded();
	h.backend().borrow_mut().place_all();
	h.send(json!({ "type": "stackTrace", "paths": ["src/pkg/c.java", "src/pkg/b.java"] }));
	h.send(json!({ "type": "focusNodeById", "nodeId": "b" }));

	h.send(json!({ "type": "controls", "controls": { "is3DMode": true } }));
	assert_eq!(h.backend().borrow().mode, RenderMode::ThreeD);
	assert_eq!(h.view.model().ui.focused, None);
	assert!(!h.view.model().ui.stack_trace_edges.is_empty());
}

#[test]
fn stack_trace_paths_restyle_consecutive_frames() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "stackTrace", "paths": ["src/pkg/c.java", "src/pkg/b.java"] }));

	let overlay = backend.borrow().link(1).expect("b-c styled");
	assert_eq!(overlay.color, "#51cf66");
	assert_eq!(overlay.particles, 5);
	assert!(close(overlay.width, 2.5 * 0.5));
	assert_eq!(backend.borrow().link(0).map(|s| s.particles), Some(0));
	assert_eq!(backend.borrow().set_data_calls, 1);
}

#[test]
fn call_stack_replaces_the_overlay() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "stackTrace", "paths": ["src/pkg/c.java", "src/pkg/b.java"] }));
	h.send(json!({
		"type": "callStack",
		"sessionId": "s1",
		"frames": [
			{ "source": { "path": "/ws/src/pkg/d.java" } },
			{ "source": null },
			{ "source": { "path": "/ws/src/pkg/c.java" } }
		]
	}));

	let b = backend.borrow();
	assert_eq!(b.link(2).map(|s| s.color), Some("#51cf66".to_string()));
	assert_eq!(b.link(1).map(|s| s.color), Some("#fdba74".to_string()));
}

#[test]
fn stack_trace_accepts_explicit_links() {
	let mut h = loaded();
	h.send(json!({
		"type": "stackTrace",
		"paths": [{ "link": { "source": "a", "target": "b", "type": "StackTrace" } }]
	}));
	assert_eq!(h.backend().borrow().link(0).map(|s| s.particles), Some(5));
}

#[test]
fn highlight_path_marks_consecutive_names() {
	let mut h = loaded();
	let backend = h.backend();
	h.send(json!({ "type": "highlightPath", "nodeNames": ["pkg.a", "pkg.b", "c"] }));

	for index in [0, 1] {
		let style = backend.borrow().link(index).expect("styled");
		assert_eq!(style.particles, 4);
		assert!(close(style.width, 2.0 * 0.5));
	}
	assert_eq!(backend.borrow().link(2).map(|s| s.particles), Some(0));
}

#[test]
fn forward_slice_highlights_dependencies_of_focus() {
	let mut h = loaded();
	let backend = h.backend();
	backend.borrow_mut().place_all();
	h.send(json!({ "type": "controls", "controls": { "enableForwardSlice": true, "sliceDepth": 2 } }));
	h.send(json!({ "type": "focusNodeById", "nodeId": "a" }));

	let b = backend.borrow();
	assert_eq!(b.link(1).map(|s| s.particles), Some(4));
	assert_eq!(b.link(2).map(|s| s.particles), Some(0));
	assert_eq!(h.view.model().ui.highlight_edges.len(), 2);
}

#[test]
fn unknown_and_malformed_messages_leave_state_alone() {
	let mut h = loaded();
	let generation = h.view.model().generation();
	h.view.handle_json(r#"{ "type": "bogus", "data": 1 }"#);
	h.view.handle_json("not json");
	h.view.handle_json(r#"{ "type": "controls", "controls": { "nodeSize": "huge" } }"#);

	assert_eq!(h.view.model().generation(), generation);
	assert_eq!(h.view.controls().node_size, 3.0);
	assert!(matches!(
		Inbound::from_json(r#"{ "type": "bogus" }"#),
		Err(ViewError::UnknownMessage(kind)) if kind == "bogus"
	));
}

#[test]
fn update_skips_data_with_unchanged_version() {
	let mut h = Harness::new();
	let data = chain_graph();
	h.send(json!({ "type": "update", "data": data, "dataVersion": 7 }));
	let backend = h.backend();
	assert_eq!(backend.borrow().set_data_calls, 1);
	let generation = h.view.model().generation();

	h.send(json!({
		"type": "update",
		"data": data,
		"dataVersion": 7,
		"controls": { "showNames": false }
	}));
	assert_eq!(h.view.model().generation(), generation);
	assert_eq!(backend.borrow().set_data_calls, 1);
	assert!(!h.view.controls().show_names);

	h.send(json!({ "type": "update", "data": data, "dataVersion": 8 }));
	assert_eq!(backend.borrow().set_data_calls, 2);
	assert_eq!(h.view.model().version(), Some(8));
}

#[test]
fn resize_before_first_render_is_applied_on_init() {
	let mut h = Harness::new();
	h.send(json!({ "type": "resize", "width": 640.0, "height": 480.0 }));
	h.send(data_message(&chain_graph()));
	assert_eq!(h.backend().borrow().size, Some((640.0, 480.0)));
}

#[test]
fn clicks_and_readiness_go_to_the_host() {
	let h = loaded();
	h.view.announce_ready();
	h.view.node_clicked("b");
	h.view.node_clicked("nope");

	assert_eq!(
		*h.sent.borrow(),
		[
			Outbound::Ready,
			Outbound::FocusNode {
				node: NodeRef {
					id: "b".into(),
					file_path: Some("src/pkg/b.java".into()),
					name: Some("pkg.b".into()),
				},
			},
		]
	);
}

fn rotating() -> Harness {
	let mut h = Harness::new();
	h.send(json!({
		"type": "controls",
		"controls": { "is3DMode": true, "autoRotate": true, "rotateSpeed": 1.0 }
	}));
	h.send(data_message(&chain_graph()));
	h
}

#[test]
fn auto_rotation_orbits_at_constant_distance() {
	let mut h = rotating();
	let backend = h.backend();
	h.advance(500.0);

	let (position, look_at, ms) = *backend.borrow().camera_moves.last().expect("moved");
	assert_eq!(ms, 0.0);
	assert_eq!(look_at, Some(Vec3::ZERO));
	assert!(close(position.x, 300.0 * 0.5f64.sin()));
	assert!(close(position.z, 300.0 * 0.5f64.cos()));
	assert!(close(position.x.hypot(position.z), 300.0));
}

#[test]
fn interaction_pauses_rotation_until_delay_passes() {
	let mut h = rotating();
	let backend = h.backend();
	h.advance(16.0);
	h.view.set_user_interacting(true);
	let moves = backend.borrow().camera_moves.len();

	h.advance(16.0);
	h.view.set_user_interacting(false);
	h.advance(500.0);
	assert_eq!(backend.borrow().camera_moves.len(), moves);

	h.advance(500.0);
	h.advance(16.0);
	assert_eq!(backend.borrow().camera_moves.len(), moves + 1);
}

#[test]
fn focus_in_3d_places_camera_at_focus_distance() {
	let mut h = Harness::new();
	h.send(json!({ "type": "controls", "controls": { "is3DMode": true } }));
	h.send(data_message(&chain_graph()));
	let backend = h.backend();
	backend.borrow_mut().place_all();
	h.send(json!({ "type": "focusNodeById", "nodeId": "b" }));

	let b = backend.borrow();
	let node = Vec3::new(10.0, 5.0, 0.0);
	let (position, look_at, ms) = *b.camera_moves.last().expect("moved");
	assert_eq!(ms, 1000.0);
	assert_eq!(look_at, Some(node));
	assert!(close((position - node).length(), 120.0));
	assert_eq!(b.target, node);
}

#[test]
fn clearing_focus_restores_base_opacity() {
	let mut h = loaded();
	let backend = h.backend();
	backend.borrow_mut().place_all();
	let nodes_before: Vec<_> = (0..5).map(|i| backend.borrow().node(i)).collect();
	let links_before: Vec<_> = (0..3).map(|i| backend.borrow().link(i)).collect();

	h.send(json!({ "type": "focusNodeById", "nodeId": "b" }));
	h.send(json!({ "type": "clearFocus" }));

	let b = backend.borrow();
	assert_eq!(b.node(3).map(|s| s.color), Some("#157df4ff".to_string()));
	assert_eq!(b.link(2).map(|s| s.color), Some("#ff83c5ff".to_string()));
	assert_eq!((0..5).map(|i| b.node(i)).collect::<Vec<_>>(), nodes_before);
	assert_eq!((0..3).map(|i| b.link(i)).collect::<Vec<_>>(), links_before);
}

#[test]
fn update_with_bad_controls_changes_nothing() {
	let mut h = loaded();
	let backend = h.backend();
	let generation = h.view.model().generation();
	h.send(json!({
		"type": "update",
		"data": {
			"nodes": [{ "id": "x", "name": "pkg.x" }, { "id": "y", "name": "pkg.y" }],
			"links": []
		},
		"controls": { "nodeSize": "huge" }
	}));
	h.send(json!({ "type": "stackTrace", "paths": [] }));

	let model_ids: Vec<_> = h.view.model().nodes().iter().map(|n| n.id.clone()).collect();
	assert_eq!(h.view.model().generation(), generation);
	assert_eq!(backend.borrow().node_ids(), model_ids);
	assert_eq!(backend.borrow().set_data_calls, 1);
	let label = backend.borrow().node(0).and_then(|s| s.label).map(|l| l.text);
	assert_eq!(label.as_deref(), Some("a"));
}

#[test]
fn pending_focus_holds_rotation_until_cleared() {
	let mut h = rotating();
	let backend = h.backend();
	h.advance(16.0);
	let moves = backend.borrow().camera_moves.len();

	h.send(json!({ "type": "focusNodeById", "nodeId": "b" }));
	h.advance(16.0);
	h.advance(16.0);
	h.send(json!({ "type": "controls", "controls": { "showNames": false } }));
	h.advance(16.0);
	assert_eq!(backend.borrow().camera_moves.len(), moves);

	h.send(json!({ "type": "clearFocus" }));
	h.advance(16.0);
	assert_eq!(backend.borrow().camera_moves.len(), moves + 1);
}
