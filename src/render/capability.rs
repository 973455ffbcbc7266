//! The verb set every rendering backend exposes.
//!
//! Adapters only ever talk to a backend through [`RenderCapability`], so the layout
//! and drawing code can be swapped for a recording fake in tests.

use std::cell::RefCell;
use std::ops::{Add, Mul, Sub};
use std::rc::Rc;

use crate::error::Result;
use crate::graph::NodeId;

use super::adapter::RenderMode;

/// Point or offset in layout space. 2D backends leave `z` at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
	/// Horizontal.
	pub x: f64,
	/// Vertical.
	pub y: f64,
	/// Depth.
	pub z: f64,
}

impl Vec3 {
	/// Origin.
	pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

	/// Point from its coordinates.
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
	}

	/// Unit vector, or `None` for a (near) zero vector.
	pub fn normalized(self) -> Option<Self> {
		let len = self.length();
		(len > 1e-9).then(|| self * (1.0 / len))
	}
}

impl Add for Vec3 {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Vec3 {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Self;

	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

/// Node entry of the pushed topology.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	/// Node id.
	pub id: NodeId,
	/// Position in the model, the key style accessors are called with.
	pub index: usize,
}

/// Edge entry of the pushed topology.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLink {
	/// Source node id.
	pub source: NodeId,
	/// Target node id.
	pub target: NodeId,
	/// Position in the model, the key style accessors are called with.
	pub index: usize,
}

/// The filtered node/edge set a backend lays out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutData {
	/// Visible nodes.
	pub nodes: Vec<LayoutNode>,
	/// Visible edges.
	pub links: Vec<LayoutLink>,
}

/// Text drawn next to a node.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
	/// Text.
	pub text: String,
	/// CSS colour, opacity folded in.
	pub color: String,
	/// Font size in pixels.
	pub font_px: f64,
	/// Offset from the node centre.
	pub offset: Vec3,
}

/// Resolved style of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	/// CSS colour, opacity folded in.
	pub color: String,
	/// Radius.
	pub size: f64,
	/// Label, when names are shown.
	pub label: Option<LabelStyle>,
}

/// Resolved style of one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	/// CSS colour, opacity folded in.
	pub color: String,
	/// Stroke width.
	pub width: f64,
	/// Directional particles.
	pub particles: u32,
}

/// Per-entity style accessor, keyed by model index.
pub type StyleFn<T> = Box<dyn Fn(usize) -> Option<T>>;

/// A rendering backend.
///
/// Camera verbs default to no-ops so a 2D backend only implements what it has, and
/// the same goes for `center_at`/`zoom` on a 3D backend.
pub trait RenderCapability {
	/// Replaces the laid-out topology. Positions of ids present before are kept.
	fn set_data(&mut self, data: LayoutData);
	/// Installs the node style accessor.
	fn set_node_style(&mut self, style: StyleFn<NodeStyle>);
	/// Installs the edge style accessor.
	fn set_link_style(&mut self, style: StyleFn<LinkStyle>);
	/// Rest length of the link force.
	fn set_link_distance(&mut self, distance: f64);
	/// Arrow head length.
	fn set_arrow_length(&mut self, length: f64);
	/// Background colour.
	fn set_background(&mut self, color: &str);
	/// Restarts the force simulation.
	fn reheat(&mut self);
	/// Layout position of a node, `None` until the simulation has placed it.
	fn node_position(&self, id: &str) -> Option<Vec3>;
	/// Viewport size in pixels.
	fn resize(&mut self, width: f64, height: f64);

	/// Camera position.
	fn camera_position(&self) -> Vec3 {
		Vec3::ZERO
	}
	/// Moves the camera, optionally turning it towards `look_at`, over `transition_ms`.
	fn set_camera_position(&mut self, _position: Vec3, _look_at: Option<Vec3>, _transition_ms: f64) {}
	/// Point the orbit controls revolve around.
	fn controls_target(&self) -> Vec3 {
		Vec3::ZERO
	}
	/// Moves the orbit controls pivot.
	fn set_controls_target(&mut self, _target: Vec3) {}
	/// Pans so `(x, y)` is in the viewport centre over `transition_ms`.
	fn center_at(&mut self, _x: f64, _y: f64, _transition_ms: f64) {}
	/// Zooms to `scale` over `transition_ms`.
	fn zoom(&mut self, _scale: f64, _transition_ms: f64) {}
}

/// Backend handle shared between the adapter and the host's draw loop.
pub type SharedCapability = Rc<RefCell<dyn RenderCapability>>;

/// Creates a fresh backend per renderer initialization.
pub trait CapabilityFactory {
	/// Backend for `mode`; a failure leaves the view without a renderer.
	fn create(&mut self, mode: RenderMode) -> Result<SharedCapability>;
}

impl<F> CapabilityFactory for F
where
	F: FnMut(RenderMode) -> Result<SharedCapability>,
{
	fn create(&mut self, mode: RenderMode) -> Result<SharedCapability> {
		self(mode)
	}
}
