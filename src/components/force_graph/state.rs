use std::collections::HashMap;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::graph::NodeId;
use crate::render::{LayoutData, LinkStyle, NodeStyle, RenderCapability, StyleFn, Vec3};

/// Hit radius around a node centre, in world units.
pub const HIT_RADIUS: f64 = 8.0;
/// Spring stiffness at the default link distance.
const BASE_SPRING: f32 = 0.05;
const BASE_LINK_DISTANCE: f64 = 50.0;
/// Energy lost per tick once reheated.
const COOLING: f64 = 0.985;
const MIN_ENERGY: f64 = 0.005;

/// Per-node payload stored in the simulation.
#[derive(Clone, Debug, Default)]
pub struct NodeSlot {
	/// Node id.
	pub id: NodeId,
	/// Model index, the key style accessors use.
	pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Animated move of the viewport towards a graph-space point and zoom.
#[derive(Clone, Debug)]
struct Transition {
	from_center: (f64, f64),
	from_k: f64,
	center: (f64, f64),
	k: f64,
	elapsed_ms: f64,
	duration_ms: f64,
}

/// 2D backend: a `force_graph` simulation plus pan/zoom state.
pub struct ForceCanvas {
	pub graph: ForceGraph<NodeSlot, usize>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	pub background: String,
	pub arrow_length: f64,
	node_style: StyleFn<NodeStyle>,
	link_style: StyleFn<LinkStyle>,
	idx_by_id: HashMap<NodeId, DefaultNodeIdx>,
	link_distance: f64,
	energy: f64,
	placed: bool,
	transition: Option<Transition>,
}

fn simulation(link_distance: f64) -> ForceGraph<NodeSlot, usize> {
	let spring = BASE_SPRING * (BASE_LINK_DISTANCE / link_distance.max(1.0)) as f32;
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: spring,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl ForceCanvas {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: simulation(BASE_LINK_DISTANCE),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			flow_time: 0.0,
			background: "#1a1a1a".into(),
			arrow_length: 3.0,
			node_style: Box::new(|_| None),
			link_style: Box::new(|_| None),
			idx_by_id: HashMap::new(),
			link_distance: BASE_LINK_DISTANCE,
			energy: 1.0,
			placed: false,
			transition: None,
		}
	}

	/// Style of the node with model index `index`.
	pub fn node_style(&self, index: usize) -> Option<NodeStyle> {
		(self.node_style)(index)
	}

	/// Style of the edge with model index `index`.
	pub fn link_style(&self, index: usize) -> Option<LinkStyle> {
		(self.link_style)(index)
	}

	fn positions(&self) -> HashMap<NodeId, (f32, f32)> {
		let mut positions = HashMap::with_capacity(self.idx_by_id.len());
		self.graph.visit_nodes(|node| {
			positions.insert(node.data.user_data.id.clone(), (node.x(), node.y()));
		});
		positions
	}

	/// Rebuilds the simulation, keeping positions of nodes seen before.
	fn rebuild(&mut self, data: LayoutData) {
		let previous = self.positions();
		let mut graph = simulation(self.link_distance);
		let mut idx_by_id = HashMap::with_capacity(data.nodes.len());
		let count = data.nodes.len().max(1) as f64;
		let mut added = false;

		for (i, node) in data.nodes.into_iter().enumerate() {
			let (x, y) = previous.get(&node.id).copied().unwrap_or_else(|| {
				added = true;
				let angle = i as f64 * std::f64::consts::TAU / count;
				let radius = 10.0 * count.sqrt();
				((radius * angle.cos()) as f32, (radius * angle.sin()) as f32)
			});
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeSlot {
					id: node.id.clone(),
					index: node.index,
				},
			});
			idx_by_id.insert(node.id, idx);
		}

		for link in data.links {
			if let (Some(&source), Some(&target)) =
				(idx_by_id.get(&link.source), idx_by_id.get(&link.target))
			{
				graph.add_edge(source, target, EdgeData { user_data: link.index });
			}
		}

		self.graph = graph;
		self.idx_by_id = idx_by_id;
		self.placed &= !added;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Node under the screen point, as simulation index and node id.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<(DefaultNodeIdx, NodeId)> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let radius = self
				.node_style(node.data.user_data.index)
				.map_or(HIT_RADIUS, |style| style.size.max(HIT_RADIUS));
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < radius {
				found = Some((node.index(), node.data.user_data.id.clone()));
			}
		});
		found
	}

	/// Zoom around a screen point, cancelling any running transition.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.transition = None;
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Stops any running viewport transition.
	pub fn cancel_transition(&mut self) {
		self.transition = None;
	}

	fn screen_center(&self) -> (f64, f64) {
		self.screen_to_graph(self.width / 2.0, self.height / 2.0)
	}

	fn start_transition(&mut self, center: Option<(f64, f64)>, k: Option<f64>, duration_ms: f64) {
		let current = self.transition.take();
		let center = center
			.or(current.as_ref().map(|t| t.center))
			.unwrap_or_else(|| self.screen_center());
		let k = k.or(current.as_ref().map(|t| t.k)).unwrap_or(self.transform.k);
		self.transition = Some(Transition {
			from_center: self.screen_center(),
			from_k: self.transform.k,
			center,
			k,
			elapsed_ms: 0.0,
			duration_ms: duration_ms.max(current.map_or(0.0, |t| t.duration_ms)),
		});
		self.step_transition(0.0);
	}

	fn step_transition(&mut self, dt_ms: f64) {
		let Some(transition) = self.transition.as_mut() else {
			return;
		};
		transition.elapsed_ms += dt_ms;
		let t = if transition.duration_ms <= 0.0 {
			1.0
		} else {
			(transition.elapsed_ms / transition.duration_ms).min(1.0)
		};
		let eased = 1.0 - (1.0 - t).powi(3);
		let lerp = |a: f64, b: f64| a + (b - a) * eased;

		let k = lerp(transition.from_k, transition.k);
		let cx = lerp(transition.from_center.0, transition.center.0);
		let cy = lerp(transition.from_center.1, transition.center.1);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		if t >= 1.0 {
			self.transition = None;
		}
	}

	/// Advances the simulation and viewport animation by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		if self.energy > MIN_ENERGY {
			self.graph.update(dt * self.energy as f32);
			self.energy *= COOLING;
		}
		self.placed = true;
		self.flow_time += dt as f64;
		self.step_transition(dt as f64 * 1000.0);
	}
}

impl RenderCapability for ForceCanvas {
	fn set_data(&mut self, data: LayoutData) {
		self.rebuild(data);
	}

	fn set_node_style(&mut self, style: StyleFn<NodeStyle>) {
		self.node_style = style;
	}

	fn set_link_style(&mut self, style: StyleFn<LinkStyle>) {
		self.link_style = style;
	}

	fn set_link_distance(&mut self, distance: f64) {
		if distance != self.link_distance {
			self.link_distance = distance;
			let mut graph = simulation(distance);
			let mut idx_by_id = HashMap::with_capacity(self.idx_by_id.len());
			let mut remap = HashMap::new();
			self.graph.visit_nodes(|node| {
				let slot = node.data.user_data.clone();
				let idx = graph.add_node(NodeData {
					x: node.x(),
					y: node.y(),
					mass: node.data.mass,
					is_anchor: node.data.is_anchor,
					user_data: slot.clone(),
				});
				remap.insert(node.index(), idx);
				idx_by_id.insert(slot.id, idx);
			});
			self.graph.visit_edges(|source, target, edge| {
				if let (Some(&s), Some(&t)) = (remap.get(&source.index()), remap.get(&target.index())) {
					graph.add_edge(s, t, EdgeData { user_data: edge.user_data });
				}
			});
			self.graph = graph;
			self.idx_by_id = idx_by_id;
		}
	}

	fn set_arrow_length(&mut self, length: f64) {
		self.arrow_length = length;
	}

	fn set_background(&mut self, color: &str) {
		self.background = color.to_owned();
	}

	fn reheat(&mut self) {
		self.energy = 1.0;
	}

	fn node_position(&self, id: &str) -> Option<Vec3> {
		if !self.placed {
			return None;
		}
		let idx = *self.idx_by_id.get(id)?;
		let mut position = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				position = Some(Vec3::new(node.x() as f64, node.y() as f64, 0.0));
			}
		});
		position
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn center_at(&mut self, x: f64, y: f64, transition_ms: f64) {
		self.start_transition(Some((x, y)), None, transition_ms);
	}

	fn zoom(&mut self, scale: f64, transition_ms: f64) {
		self.start_transition(None, Some(scale.clamp(0.1, 10.0)), transition_ms);
	}
}
