use log::{error, info};

use super::adapter::{FocusOutcome, RenderAdapter, RenderContext, RenderMode};
use super::adapter2d::Adapter2d;
use super::adapter3d::Adapter3d;
use super::capability::CapabilityFactory;
use super::schedule::{Deferred, TaskQueue};

/// Owns the active adapter and swaps it on mode changes.
///
/// The adapter is created lazily on the first [`update`](Self::update) after
/// construction or a mode switch. A discarded adapter and its backend are never
/// reused; every new adapter gets a fresh epoch so tasks queued by its predecessor
/// are dropped.
pub struct RenderManager {
	factory: Box<dyn CapabilityFactory>,
	mode: RenderMode,
	adapter: Option<Box<dyn RenderAdapter>>,
	epoch: u64,
	viewport: Option<(f64, f64)>,
}

impl RenderManager {
	/// Manager creating backends through `factory`, starting in `mode`.
	pub fn new(factory: impl CapabilityFactory + 'static, mode: RenderMode) -> Self {
		Self {
			factory: Box::new(factory),
			mode,
			adapter: None,
			epoch: 0,
			viewport: None,
		}
	}

	/// Mode the next or current adapter renders.
	pub fn mode(&self) -> RenderMode {
		self.mode
	}

	/// True once an adapter is live.
	pub fn is_active(&self) -> bool {
		self.adapter.is_some()
	}

	/// Epoch of the current adapter.
	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	/// Switches to `mode`, discarding the current adapter and its queued work.
	pub fn set_mode(&mut self, mode: RenderMode, tasks: &mut TaskQueue<Deferred>) {
		info!("switching renderer {} -> {mode}", self.mode);
		self.mode = mode;
		self.reset(tasks);
	}

	/// Discards the current adapter without changing mode.
	pub fn reset(&mut self, tasks: &mut TaskQueue<Deferred>) {
		self.adapter = None;
		let epoch = self.epoch;
		tasks.cancel_where(|task| task.epoch() == Some(epoch));
	}

	fn ensure_adapter(&mut self) -> Option<&mut Box<dyn RenderAdapter>> {
		if self.adapter.is_none() {
			let capability = match self.factory.create(self.mode) {
				Ok(capability) => capability,
				Err(err) => {
					error!("{err}");
					return None;
				}
			};
			self.epoch += 1;
			let mut adapter: Box<dyn RenderAdapter> = match self.mode {
				RenderMode::TwoD => Box::new(Adapter2d::new(capability, self.epoch)),
				RenderMode::ThreeD => Box::new(Adapter3d::new(capability, self.epoch)),
			};
			if let Some((width, height)) = self.viewport {
				adapter.resize(width, height);
			}
			info!("{} renderer initialized (epoch {})", self.mode, self.epoch);
			self.adapter = Some(adapter);
		}
		self.adapter.as_mut()
	}

	/// Full update, initializing the adapter first if needed.
	pub fn update(&mut self, ctx: &mut RenderContext<'_>, reheat: bool) {
		if let Some(adapter) = self.ensure_adapter() {
			adapter.update(ctx, reheat);
		}
	}

	/// Style-only refresh. Does nothing without a live adapter.
	pub fn refresh(&mut self, ctx: &mut RenderContext<'_>) {
		if let Some(adapter) = self.adapter.as_mut() {
			adapter.refresh(ctx);
		}
	}

	/// Moves the camera to `node_id`.
	pub fn focus_node(&mut self, ctx: &mut RenderContext<'_>, node_id: &str) -> FocusOutcome {
		match self.adapter.as_mut() {
			Some(adapter) => adapter.focus_node(ctx, node_id),
			None => FocusOutcome::NoRenderer,
		}
	}

	/// Forwards a renderer task, dropping it if it belongs to an older adapter.
	pub fn on_deferred(&mut self, ctx: &mut RenderContext<'_>, task: Deferred) {
		if task.epoch() != Some(self.epoch) {
			log::debug!("dropping stale {task:?}");
			return;
		}
		if let Some(adapter) = self.adapter.as_mut() {
			adapter.on_deferred(ctx, task);
		}
	}

	/// Forwards a camera interaction change.
	pub fn on_interaction(&mut self, ctx: &mut RenderContext<'_>, interacting: bool) {
		if let Some(adapter) = self.adapter.as_mut() {
			adapter.on_interaction(ctx, interacting);
		}
	}

	/// Records the viewport size and forwards it to the live adapter.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = Some((width, height));
		if let Some(adapter) = self.adapter.as_mut() {
			adapter.resize(width, height);
		}
	}
}
