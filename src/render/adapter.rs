use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::graph::{GraphModel, visible_set};
use crate::visual::color::with_opacity;
use crate::visual::{Controls, RuleEngine};

use super::capability::{
	LabelStyle, LayoutData, LayoutLink, LayoutNode, LinkStyle, NodeStyle, SharedCapability, StyleFn,
	Vec3,
};
use super::schedule::{Deferred, TaskId, TaskQueue};

/// Delay between a topology push and the physics reheat.
pub const REHEAT_DELAY_MS: f64 = 100.0;
/// Label colour before opacity is folded in.
const LABEL_COLOR: &str = "#ffffff";

/// Which renderer is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
	/// Flat canvas layout.
	#[default]
	TwoD,
	/// Perspective layout with an orbiting camera.
	ThreeD,
}

impl RenderMode {
	/// Mode matching the `is3DMode` control.
	pub fn from_3d(is_3d: bool) -> Self {
		if is_3d { Self::ThreeD } else { Self::TwoD }
	}
}

impl fmt::Display for RenderMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::TwoD => "2D",
			Self::ThreeD => "3D",
		})
	}
}

/// What a focus request achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusOutcome {
	/// The camera is moving to the node.
	Moved,
	/// The node has no position yet; ask again later.
	Pending,
	/// No renderer is active.
	NoRenderer,
}

/// Everything an adapter reads or schedules during one call.
pub struct RenderContext<'a> {
	/// Current model.
	pub model: &'a GraphModel,
	/// Current controls snapshot.
	pub controls: &'a Controls,
	/// Visual rules.
	pub rules: &'a RuleEngine,
	/// Deferred work queue.
	pub tasks: &'a mut TaskQueue<Deferred>,
	/// Clock reading for this call, in milliseconds.
	pub now: f64,
}

/// A mode-specific renderer driving one [`RenderCapability`](super::RenderCapability).
pub trait RenderAdapter {
	/// Mode this adapter renders.
	fn mode(&self) -> RenderMode;

	/// Pushes the filtered topology and restyles everything. With `reheat`, the
	/// physics is restarted [`REHEAT_DELAY_MS`] later.
	fn update(&mut self, ctx: &mut RenderContext<'_>, reheat: bool);

	/// Reinstalls style accessors only. Topology and physics are left alone.
	fn refresh(&mut self, ctx: &mut RenderContext<'_>);

	/// Moves the camera to `node_id`.
	fn focus_node(&mut self, ctx: &mut RenderContext<'_>, node_id: &str) -> FocusOutcome;

	/// Runs a task this adapter queued. The epoch has already been checked.
	fn on_deferred(&mut self, ctx: &mut RenderContext<'_>, task: Deferred);

	/// The user started or stopped dragging the camera.
	fn on_interaction(&mut self, _ctx: &mut RenderContext<'_>, _interacting: bool) {}

	/// Viewport size changed.
	fn resize(&mut self, width: f64, height: f64);
}

/// Pushes the visible node/edge set and the layout forces.
pub(crate) fn push_topology(capability: &SharedCapability, ctx: &RenderContext<'_>) {
	let visible = visible_set(ctx.model, ctx.controls);
	let nodes: Vec<LayoutNode> = visible
		.nodes
		.iter()
		.map(|&index| LayoutNode {
			id: ctx.model.nodes()[index].id.clone(),
			index,
		})
		.collect();
	let links: Vec<LayoutLink> = visible
		.edges
		.iter()
		.map(|&index| {
			let edge = &ctx.model.edges()[index];
			LayoutLink {
				source: edge.source.clone(),
				target: edge.target.clone(),
				index,
			}
		})
		.collect();
	debug!(
		"pushing {} of {} nodes, {} of {} edges",
		nodes.len(),
		ctx.model.nodes().len(),
		links.len(),
		ctx.model.edges().len()
	);

	let mut capability = capability.borrow_mut();
	capability.set_data(LayoutData { nodes, links });
	capability.set_link_distance(ctx.controls.link_distance);
	capability.set_arrow_length(ctx.controls.arrow_size);
}

/// Builds the visual cache once and installs accessors reading from it.
pub(crate) fn install_styles(capability: &SharedCapability, ctx: &RenderContext<'_>, label_offset: Vec3) {
	let cache = Rc::new(ctx.rules.build_cache(ctx.model, ctx.controls));
	let generation = ctx.model.generation();
	let show_names = ctx.controls.show_names;
	let font_px = ctx.controls.text_size;

	let node_cache = Rc::clone(&cache);
	let node_style: StyleFn<NodeStyle> = Box::new(move |index| {
		let props = node_cache.node(generation, index)?;
		Some(NodeStyle {
			color: with_opacity(&props.color, props.opacity),
			size: props.size,
			label: show_names.then(|| LabelStyle {
				text: props.label.clone(),
				color: with_opacity(LABEL_COLOR, props.opacity),
				font_px,
				offset: label_offset,
			}),
		})
	});

	let link_style: StyleFn<LinkStyle> = Box::new(move |index| {
		let props = cache.edge(generation, index)?;
		Some(LinkStyle {
			color: with_opacity(&props.color, props.opacity),
			width: props.width,
			particles: props.particles,
		})
	});

	let mut capability = capability.borrow_mut();
	capability.set_background(&ctx.controls.colors.background_dark);
	capability.set_node_style(node_style);
	capability.set_link_style(link_style);
}

/// Queues a reheat for `epoch`, replacing one still pending.
pub(crate) fn schedule_reheat(ctx: &mut RenderContext<'_>, epoch: u64, pending: &mut Option<TaskId>) {
	if let Some(id) = pending.take() {
		ctx.tasks.cancel(id);
	}
	*pending = Some(ctx.tasks.after_delay(ctx.now, REHEAT_DELAY_MS, Deferred::Reheat { epoch }));
}
