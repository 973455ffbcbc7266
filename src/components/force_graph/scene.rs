use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::graph::NodeId;
use crate::render::{LayoutData, LinkStyle, NodeStyle, RenderCapability, StyleFn, Vec3};

/// Vertical field of view.
const FOV_Y: f64 = 0.9;
const NEAR: f64 = 1.0;
const REPULSION: f64 = 900.0;
const SPRING: f64 = 0.04;
const CENTER_PULL: f64 = 0.002;
const DAMPING: f64 = 0.85;
const MAX_SPEED: f64 = 40.0;
const COOLING: f64 = 0.985;
const MIN_ENERGY: f64 = 0.005;

#[derive(Clone, Debug)]
pub struct SceneNode {
	pub id: NodeId,
	pub index: usize,
	pub position: Vec3,
	velocity: Vec3,
}

#[derive(Clone, Copy, Debug)]
pub struct SceneLink {
	pub source: usize,
	pub target: usize,
	pub index: usize,
}

/// A point projected onto the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Pixels per world unit at this depth.
	pub scale: f64,
	pub depth: f64,
}

#[derive(Clone, Debug)]
struct CameraMove {
	from: Vec3,
	to: Vec3,
	look_from: Vec3,
	look_to: Vec3,
	elapsed_ms: f64,
	duration_ms: f64,
}

/// 3D backend: a small force simulation and an orbiting perspective camera.
pub struct OrbitScene {
	pub nodes: Vec<SceneNode>,
	pub links: Vec<SceneLink>,
	pub width: f64,
	pub height: f64,
	pub background: String,
	pub arrow_length: f64,
	pub flow_time: f64,
	camera: Vec3,
	target: Vec3,
	camera_move: Option<CameraMove>,
	node_style: StyleFn<NodeStyle>,
	link_style: StyleFn<LinkStyle>,
	slot_by_id: HashMap<NodeId, usize>,
	link_distance: f64,
	energy: f64,
	placed: bool,
}

/// Deterministic start position on a sphere, so reloads lay out the same way.
fn seed_position(id: &str, radius: f64) -> Vec3 {
	let hash = id
		.bytes()
		.fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
	let u = (hash & 0xffff) as f64 / 65535.0;
	let v = ((hash >> 16) & 0xffff) as f64 / 65535.0;
	let theta = u * TAU;
	let phi = (2.0 * v - 1.0).acos();
	Vec3::new(
		radius * phi.sin() * theta.cos(),
		radius * phi.sin() * theta.sin(),
		radius * phi.cos(),
	)
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
	Vec3::new(a.y * b.z - a.z * b.y, a.z * b.x - a.x * b.z, a.x * b.y - a.y * b.x)
}

fn dot(a: Vec3, b: Vec3) -> f64 {
	a.x * b.x + a.y * b.y + a.z * b.z
}

impl OrbitScene {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			nodes: Vec::new(),
			links: Vec::new(),
			width,
			height,
			background: "#1a1a1a".into(),
			arrow_length: 3.0,
			flow_time: 0.0,
			camera: Vec3::new(0.0, 0.0, 400.0),
			target: Vec3::ZERO,
			camera_move: None,
			node_style: Box::new(|_| None),
			link_style: Box::new(|_| None),
			slot_by_id: HashMap::new(),
			link_distance: 50.0,
			energy: 1.0,
			placed: false,
		}
	}

	pub fn node_style(&self, index: usize) -> Option<NodeStyle> {
		(self.node_style)(index)
	}

	pub fn link_style(&self, index: usize) -> Option<LinkStyle> {
		(self.link_style)(index)
	}

	/// Projects a world point, `None` when it is behind the camera.
	pub fn project(&self, point: Vec3) -> Option<Projected> {
		let forward = (self.target - self.camera).normalized()?;
		let right = cross(forward, Vec3::new(0.0, 1.0, 0.0))
			.normalized()
			.unwrap_or(Vec3::new(1.0, 0.0, 0.0));
		let up = cross(right, forward);

		let relative = point - self.camera;
		let depth = dot(relative, forward);
		if depth < NEAR {
			return None;
		}
		let focal = (self.height / 2.0) / (FOV_Y / 2.0).tan();
		let scale = focal / depth;
		Some(Projected {
			x: self.width / 2.0 + dot(relative, right) * scale,
			y: self.height / 2.0 - dot(relative, up) * scale,
			scale,
			depth,
		})
	}

	/// Node under the screen point; the nearest one wins.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		self.nodes
			.iter()
			.filter_map(|node| {
				let projected = self.project(node.position)?;
				let radius = self.node_style(node.index).map_or(4.0, |style| style.size) * projected.scale;
				let (dx, dy) = (projected.x - sx, projected.y - sy);
				((dx * dx + dy * dy).sqrt() < radius.max(6.0)).then_some((projected.depth, node))
			})
			.min_by(|a, b| a.0.total_cmp(&b.0))
			.map(|(_, node)| node.id.clone())
	}

	/// Rotates the camera around the orbit target by screen-space drag deltas.
	pub fn orbit(&mut self, dx: f64, dy: f64) {
		self.camera_move = None;
		let offset = self.camera - self.target;
		let radius = offset.length().max(NEAR);
		let azimuth = offset.x.atan2(offset.z) - dx * 0.005;
		let elevation = ((offset.y / radius).asin() + dy * 0.005).clamp(-1.5, 1.5);
		self.camera = self.target
			+ Vec3::new(
				radius * elevation.cos() * azimuth.sin(),
				radius * elevation.sin(),
				radius * elevation.cos() * azimuth.cos(),
			);
	}

	/// Moves the camera towards (`factor < 1`) or away from the target.
	pub fn dolly(&mut self, factor: f64) {
		self.camera_move = None;
		let offset = self.camera - self.target;
		let length = (offset.length() * factor).clamp(10.0, 5000.0);
		if let Some(direction) = offset.normalized() {
			self.camera = self.target + direction * length;
		}
	}

	fn step_physics(&mut self, dt: f64) {
		let count = self.nodes.len();
		let mut forces = vec![Vec3::ZERO; count];

		for i in 0..count {
			for j in (i + 1)..count {
				let delta = self.nodes[i].position - self.nodes[j].position;
				let distance_sq = dot(delta, delta).max(1.0);
				let direction = delta.normalized().unwrap_or_else(|| {
					let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214) * TAU;
					Vec3::new(angle.cos(), angle.sin(), 0.0)
				});
				let push = direction * (REPULSION / distance_sq);
				forces[i] = forces[i] + push;
				forces[j] = forces[j] - push;
			}
		}

		for link in &self.links {
			if link.source == link.target {
				continue;
			}
			let delta = self.nodes[link.target].position - self.nodes[link.source].position;
			let Some(direction) = delta.normalized() else {
				continue;
			};
			let pull = direction * ((delta.length() - self.link_distance) * SPRING);
			forces[link.source] = forces[link.source] + pull;
			forces[link.target] = forces[link.target] - pull;
		}

		let step = dt * 60.0 * self.energy;
		for (node, force) in self.nodes.iter_mut().zip(forces) {
			let force = force - node.position * CENTER_PULL;
			let mut velocity = (node.velocity + force * step) * DAMPING;
			let speed = velocity.length();
			if speed > MAX_SPEED {
				velocity = velocity * (MAX_SPEED / speed);
			}
			node.velocity = velocity;
			node.position = node.position + velocity * step;
		}
	}

	fn step_camera(&mut self, dt_ms: f64) {
		let Some(camera_move) = self.camera_move.as_mut() else {
			return;
		};
		camera_move.elapsed_ms += dt_ms;
		let t = if camera_move.duration_ms <= 0.0 {
			1.0
		} else {
			(camera_move.elapsed_ms / camera_move.duration_ms).min(1.0)
		};
		let eased = 1.0 - (1.0 - t).powi(3);
		let camera = camera_move.from + (camera_move.to - camera_move.from) * eased;
		let target = camera_move.look_from + (camera_move.look_to - camera_move.look_from) * eased;
		if t >= 1.0 {
			self.camera_move = None;
		}
		self.camera = camera;
		self.target = target;
	}

	/// Advances the simulation and camera animation by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		if self.energy > MIN_ENERGY {
			self.step_physics(dt);
			self.energy *= COOLING;
		}
		self.placed = true;
		self.flow_time += dt;
		self.step_camera(dt * 1000.0);
	}
}

impl RenderCapability for OrbitScene {
	fn set_data(&mut self, data: LayoutData) {
		let previous: HashMap<NodeId, SceneNode> = self
			.nodes
			.drain(..)
			.map(|node| (node.id.clone(), node))
			.collect();
		let radius = 10.0 * (data.nodes.len().max(1) as f64).sqrt();
		let mut added = false;

		self.slot_by_id.clear();
		for node in data.nodes {
			let scene_node = match previous.get(&node.id) {
				Some(old) => SceneNode {
					index: node.index,
					..old.clone()
				},
				None => {
					added = true;
					SceneNode {
						position: seed_position(&node.id, radius),
						id: node.id.clone(),
						index: node.index,
						velocity: Vec3::ZERO,
					}
				}
			};
			self.slot_by_id.insert(node.id, self.nodes.len());
			self.nodes.push(scene_node);
		}

		self.links = data
			.links
			.iter()
			.filter_map(|link| {
				Some(SceneLink {
					source: *self.slot_by_id.get(&link.source)?,
					target: *self.slot_by_id.get(&link.target)?,
					index: link.index,
				})
			})
			.collect();
		self.placed &= !added;
	}

	fn set_node_style(&mut self, style: StyleFn<NodeStyle>) {
		self.node_style = style;
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
		self.energy = 1.0;
	}

	fn node_position(&self, id: &str) -> Option<Vec3> {
		if !self.placed {
			return None;
		}
		self.slot_by_id.get(id).map(|&slot| self.nodes[slot].position)
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn camera_position(&self) -> Vec3 {
		self.camera
	}

	fn set_camera_position(&mut self, position: Vec3, look_at: Option<Vec3>, transition_ms: f64) {
		let look_to = look_at.unwrap_or(self.target);
		if transition_ms <= 0.0 {
			self.camera_move = None;
			self.camera = position;
			self.target = look_to;
			return;
		}
		self.camera_move = Some(CameraMove {
			from: self.camera,
			to: position,
			look_from: self.target,
			look_to,
			elapsed_ms: 0.0,
			duration_ms: transition_ms,
		});
	}

	fn controls_target(&self) -> Vec3 {
		self.camera_move.as_ref().map_or(self.target, |camera_move| camera_move.look_to)
	}

	fn set_controls_target(&mut self, target: Vec3) {
		match self.camera_move.as_mut() {
			Some(camera_move) => camera_move.look_to = target,
			None => self.target = target,
		}
	}
}
