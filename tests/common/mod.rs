#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use depviz_view::error::Result;
use depviz_view::graph::{Edge, EdgeKind, GraphData, Node, NodeKind};
use depviz_view::render::{
	LayoutData, LinkStyle, ManualClock, NodeStyle, RenderCapability, RenderMode, SharedCapability,
	StyleFn, Vec3,
};
use depviz_view::view::{GraphView, Outbound};

/// Backend that records every verb it receives.
pub struct RecordingCapability {
	pub mode: RenderMode,
	pub data: LayoutData,
	pub set_data_calls: usize,
	pub style_installs: usize,
	pub reheats: usize,
	pub link_distance: f64,
	pub arrow_length: f64,
	pub background: String,
	pub positions: HashMap<String, Vec3>,
	pub camera: Vec3,
	pub target: Vec3,
	pub camera_moves: Vec<(Vec3, Option<Vec3>, f64)>,
	pub centers: Vec<(f64, f64, f64)>,
	pub zooms: Vec<(f64, f64)>,
	pub size: Option<(f64, f64)>,
	node_style: StyleFn<NodeStyle>,
	link_style: StyleFn<LinkStyle>,
}

impl RecordingCapability {
	pub fn new(mode: RenderMode) -> Self {
		Self {
			mode,
			data: LayoutData::default(),
			set_data_calls: 0,
			style_installs: 0,
			reheats: 0,
			link_distance: 0.0,
			arrow_length: 0.0,
			background: String::new(),
			positions: HashMap::new(),
			camera: Vec3::new(0.0, 0.0, 300.0),
			target: Vec3::ZERO,
			camera_moves: Vec::new(),
			centers: Vec::new(),
			zooms: Vec::new(),
			size: None,
			node_style: Box::new(|_| None),
			link_style: Box::new(|_| None),
		}
	}

	/// Gives every pushed node a position, as a layout tick would.
	pub fn place_all(&mut self) {
		for (i, node) in self.data.nodes.iter().enumerate() {
			let position = Vec3::new(10.0 * i as f64, 5.0, 0.0);
			self.positions.insert(node.id.clone(), position);
		}
	}

	/// Style of the node with model index `index`.
	pub fn node(&self, index: usize) -> Option<NodeStyle> {
		(self.node_style)(index)
	}

	/// Style of the edge with model index `index`.
	pub fn link(&self, index: usize) -> Option<LinkStyle> {
		(self.link_style)(index)
	}

	pub fn node_ids(&self) -> Vec<String> {
		self.data.nodes.iter().map(|node| node.id.clone()).collect()
	}
}

impl RenderCapability for RecordingCapability {
	fn set_data(&mut self, data: LayoutData) {
		self.positions.retain(|id, _| data.nodes.iter().any(|node| node.id == *id));
		self.data = data;
		self.set_data_calls += 1;
	}

	fn set_node_style(&mut self, style: StyleFn<NodeStyle>) {
		self.node_style = style;
		self.style_installs += 1;
	}

	fn set_link_style(&mut self, style: StyleFn<LinkStyle>) {
		self.link_style = style;
	}

	fn set_link_distance(&mut self, distance: f64) {
		self.link_distance = distance;
	}

	fn set_arrow_length(&mut self, length: f64) {
		self.arrow_length = length;
	}

	fn set_background(&mut self, color: &str) {
		self.background = color.to_owned();
	}

	fn reheat(&mut self) {
		self.reheats += 1;
	}

	fn node_position(&self, id: &str) -> Option<Vec3> {
		self.positions.get(id).copied()
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.size = Some((width, height));
	}

	fn camera_position(&self) -> Vec3 {
		self.camera
	}

	fn set_camera_position(&mut self, position: Vec3, look_at: Option<Vec3>, transition_ms: f64) {
		self.camera = position;
		if let Some(target) = look_at {
			self.target = target;
		}
		self.camera_moves.push((position, look_at, transition_ms));
	}

	fn controls_target(&self) -> Vec3 {
		self.target
	}

	fn set_controls_target(&mut self, target: Vec3) {
		self.target = target;
	}

	fn center_at(&mut self, x: f64, y: f64, transition_ms: f64) {
		self.centers.push((x, y, transition_ms));
	}

	fn zoom(&mut self, scale: f64, transition_ms: f64) {
		self.zooms.push((scale, transition_ms));
	}
}

pub type Backends = Rc<RefCell<Vec<Rc<RefCell<RecordingCapability>>>>>;

/// A view wired to recording backends, a manual clock and a message log.
pub struct Harness {
	pub view: GraphView,
	pub clock: ManualClock,
	pub backends: Backends,
	pub sent: Rc<RefCell<Vec<Outbound>>>,
}

impl Harness {
	pub fn new() -> Self {
		let backends: Backends = Rc::default();
		let created = backends.clone();
		let factory = move |mode: RenderMode| -> Result<SharedCapability> {
			let backend = Rc::new(RefCell::new(RecordingCapability::new(mode)));
			created.borrow_mut().push(backend.clone());
			let shared: SharedCapability = backend;
			Ok(shared)
		};
		let clock = ManualClock::starting_at(1_000.0);
		let sent: Rc<RefCell<Vec<Outbound>>> = Rc::default();
		let log = sent.clone();
		let view = GraphView::new(factory, clock.clone(), move |message: &Outbound| {
			log.borrow_mut().push(message.clone())
		});
		Self {
			view,
			clock,
			backends,
			sent,
		}
	}

	/// Most recently created backend.
	pub fn backend(&self) -> Rc<RefCell<RecordingCapability>> {
		let backends = self.backends.borrow();
		backends.last().cloned().expect("no backend created yet")
	}

	pub fn send(&mut self, raw: serde_json::Value) {
		self.view.handle_json(&raw.to_string());
	}

	/// Advances the clock and runs whatever came due.
	pub fn advance(&mut self, ms: f64) {
		self.clock.advance(ms);
		self.view.tick();
	}
}

/// Four classes in a chain plus one isolated interface:
/// `a -> b -> c -> d`, `e` alone.
pub fn chain_graph() -> GraphData {
	let node = |id: &str| {
		Node::new(id, format!("pkg.{id}"))
			.with_kind(NodeKind::Class)
			.with_path(format!("src/pkg/{id}.java"))
	};
	GraphData {
		nodes: vec![
			node("a"),
			node("b"),
			node("c"),
			node("d"),
			Node::new("e", "pkg.e").with_kind(NodeKind::Interface),
		],
		links: vec![
			Edge::new("a", "b", EdgeKind::MethodCall),
			Edge::new("b", "c", EdgeKind::TypeUse),
			Edge::new("c", "d", EdgeKind::Extends),
		],
	}
}

pub fn data_message(data: &GraphData) -> serde_json::Value {
	serde_json::json!({ "type": "data", "data": data })
}
