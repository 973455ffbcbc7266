use log::debug;

use super::adapter::{
	FocusOutcome, RenderAdapter, RenderContext, RenderMode, install_styles, push_topology,
	schedule_reheat,
};
use super::capability::{SharedCapability, Vec3};
use super::schedule::{Deferred, TaskId};

const FOCUS_TRANSITION_MS: f64 = 1000.0;
/// Label sprites hang below their node.
const LABEL_OFFSET: Vec3 = Vec3::new(0.0, -8.0, 0.0);
/// Direction used when the camera sits exactly on the focused node.
const FALLBACK_VIEW: Vec3 = Vec3::new(0.0, 0.0, 1.0);

#[derive(Debug, Default)]
struct RotationState {
	frame: Option<TaskId>,
	resume: Option<TaskId>,
	start_time: f64,
	start_angle: f64,
}

/// Perspective renderer with an idle auto-rotating camera.
pub struct Adapter3d {
	capability: SharedCapability,
	epoch: u64,
	reheat: Option<TaskId>,
	settle: Option<TaskId>,
	/// A focus request is waiting for its node to get a position.
	awaiting_focus: bool,
	rotation: RotationState,
}

impl Adapter3d {
	/// Adapter driving `capability`, tagging its tasks with `epoch`.
	pub fn new(capability: SharedCapability, epoch: u64) -> Self {
		Self {
			capability,
			epoch,
			reheat: None,
			settle: None,
			awaiting_focus: false,
			rotation: RotationState::default(),
		}
	}

	fn wants_rotation(&self, ctx: &RenderContext<'_>) -> bool {
		let focus_pending = self.awaiting_focus && ctx.model.ui.focused.is_some();
		ctx.controls.auto_rotate
			&& !ctx.model.ui.is_user_interacting
			&& self.settle.is_none()
			&& !focus_pending
	}

	/// Starts or stops rotation to match the controls.
	fn sync_rotation(&mut self, ctx: &mut RenderContext<'_>) {
		if !self.wants_rotation(ctx) {
			self.stop_rotation(ctx);
		} else if self.rotation.frame.is_none() && self.rotation.resume.is_none() {
			self.start_rotation(ctx);
		}
	}

	fn start_rotation(&mut self, ctx: &mut RenderContext<'_>) {
		let capability = self.capability.borrow();
		let offset = capability.camera_position() - capability.controls_target();
		drop(capability);

		self.rotation.start_angle = offset.x.atan2(offset.z);
		self.rotation.start_time = ctx.now;
		self.rotation.frame = Some(ctx.tasks.next_frame(Deferred::RotationFrame { epoch: self.epoch }));
		debug!("auto-rotation started at {:.2} rad", self.rotation.start_angle);
	}

	fn stop_rotation(&mut self, ctx: &mut RenderContext<'_>) {
		for id in [self.rotation.frame.take(), self.rotation.resume.take()]
			.into_iter()
			.flatten()
		{
			ctx.tasks.cancel(id);
		}
	}

	fn rotation_frame(&mut self, ctx: &mut RenderContext<'_>) {
		self.rotation.frame = None;
		if !self.wants_rotation(ctx) {
			return;
		}

		let elapsed_seconds = (ctx.now - self.rotation.start_time) / 1000.0;
		let angle = self.rotation.start_angle + elapsed_seconds * ctx.controls.rotate_speed;

		let mut capability = self.capability.borrow_mut();
		let target = capability.controls_target();
		let offset = capability.camera_position() - target;
		let horizontal = offset.x.hypot(offset.z);
		let position = target + Vec3::new(horizontal * angle.sin(), offset.y, horizontal * angle.cos());
		capability.set_camera_position(position, Some(target), 0.0);
		drop(capability);

		self.rotation.frame = Some(ctx.tasks.next_frame(Deferred::RotationFrame { epoch: self.epoch }));
	}
}

impl RenderAdapter for Adapter3d {
	fn mode(&self) -> RenderMode {
		RenderMode::ThreeD
	}

	fn update(&mut self, ctx: &mut RenderContext<'_>, reheat: bool) {
		push_topology(&self.capability, ctx);
		install_styles(&self.capability, ctx, LABEL_OFFSET);
		if reheat {
			schedule_reheat(ctx, self.epoch, &mut self.reheat);
		}
		self.sync_rotation(ctx);
	}

	fn refresh(&mut self, ctx: &mut RenderContext<'_>) {
		install_styles(&self.capability, ctx, LABEL_OFFSET);
		self.sync_rotation(ctx);
	}

	fn focus_node(&mut self, ctx: &mut RenderContext<'_>, node_id: &str) -> FocusOutcome {
		self.stop_rotation(ctx);
		let Some(node) = self.capability.borrow().node_position(node_id) else {
			self.awaiting_focus = true;
			return FocusOutcome::Pending;
		};
		self.awaiting_focus = false;

		let mut capability = self.capability.borrow_mut();
		let direction = (capability.camera_position() - node)
			.normalized()
			.unwrap_or(FALLBACK_VIEW);
		let position = node + direction * ctx.controls.focus_distance;
		capability.set_camera_position(position, Some(node), FOCUS_TRANSITION_MS);
		capability.set_controls_target(node);
		drop(capability);

		if let Some(id) = self.settle.take() {
			ctx.tasks.cancel(id);
		}
		self.settle = Some(ctx.tasks.after_delay(
			ctx.now,
			FOCUS_TRANSITION_MS,
			Deferred::FocusSettled { epoch: self.epoch },
		));
		FocusOutcome::Moved
	}

	fn on_deferred(&mut self, ctx: &mut RenderContext<'_>, task: Deferred) {
		match task {
			Deferred::Reheat { .. } => {
				self.reheat = None;
				self.capability.borrow_mut().reheat();
			}
			Deferred::RotationFrame { .. } => self.rotation_frame(ctx),
			Deferred::ResumeRotation { .. } => {
				self.rotation.resume = None;
				self.sync_rotation(ctx);
			}
			Deferred::FocusSettled { .. } => {
				self.settle = None;
				self.sync_rotation(ctx);
			}
			Deferred::RetryFocus { .. } => {}
		}
	}

	fn on_interaction(&mut self, ctx: &mut RenderContext<'_>, interacting: bool) {
		self.stop_rotation(ctx);
		if !interacting && ctx.controls.auto_rotate {
			self.rotation.resume = Some(ctx.tasks.after_delay(
				ctx.now,
				ctx.controls.auto_rotate_delay,
				Deferred::ResumeRotation { epoch: self.epoch },
			));
		}
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.capability.borrow_mut().resize(width, height);
	}
}
