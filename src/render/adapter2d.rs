use log::debug;

use super::adapter::{
	FocusOutcome, RenderAdapter, RenderContext, RenderMode, install_styles, push_topology,
	schedule_reheat,
};
use super::capability::{SharedCapability, Vec3};
use super::schedule::{Deferred, TaskId};

const FOCUS_TRANSITION_MS: f64 = 1000.0;
const FOCUS_ZOOM: f64 = 3.0;

/// Flat canvas renderer. Labels are drawn by the backend right after each node.
pub struct Adapter2d {
	capability: SharedCapability,
	epoch: u64,
	reheat: Option<TaskId>,
}

impl Adapter2d {
	/// Adapter driving `capability`, tagging its tasks with `epoch`.
	pub fn new(capability: SharedCapability, epoch: u64) -> Self {
		Self {
			capability,
			epoch,
			reheat: None,
		}
	}
}

impl RenderAdapter for Adapter2d {
	fn mode(&self) -> RenderMode {
		RenderMode::TwoD
	}

	fn update(&mut self, ctx: &mut RenderContext<'_>, reheat: bool) {
		push_topology(&self.capability, ctx);
		install_styles(&self.capability, ctx, Vec3::ZERO);
		if reheat {
			schedule_reheat(ctx, self.epoch, &mut self.reheat);
		}
	}

	fn refresh(&mut self, ctx: &mut RenderContext<'_>) {
		install_styles(&self.capability, ctx, Vec3::ZERO);
	}

	fn focus_node(&mut self, _ctx: &mut RenderContext<'_>, node_id: &str) -> FocusOutcome {
		let mut capability = self.capability.borrow_mut();
		let Some(position) = capability.node_position(node_id) else {
			return FocusOutcome::Pending;
		};
		capability.center_at(position.x, position.y, FOCUS_TRANSITION_MS);
		capability.zoom(FOCUS_ZOOM, FOCUS_TRANSITION_MS);
		FocusOutcome::Moved
	}

	fn on_deferred(&mut self, _ctx: &mut RenderContext<'_>, task: Deferred) {
		match task {
			Deferred::Reheat { .. } => {
				self.reheat = None;
				self.capability.borrow_mut().reheat();
			}
			other => debug!("2D renderer ignoring {other:?}"),
		}
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.capability.borrow_mut().resize(width, height);
	}
}
