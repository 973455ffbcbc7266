use std::collections::HashSet;

use log::{debug, info, warn};

use crate::error::{Result, ViewError};
use crate::graph::stack_trace::{correlate, frame_paths, stack_links};
use crate::graph::{GraphData, GraphModel, LinkKey, NodeId, SliceDirection, slice_edges};
use crate::render::{
	CapabilityFactory, Clock, Deferred, FocusOutcome, RenderContext, RenderManager, RenderMode,
	TaskId, TaskQueue,
};
use crate::visual::{Controls, RuleEngine};

use super::message::{Inbound, NodeRef, Outbound, OutboundSink, StackTraceEntry};

/// Delay before retrying a camera move to a node without a position.
pub const FOCUS_RETRY_MS: f64 = 100.0;

/// How far-reaching a controls change is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ControlsChange {
	/// Styles only.
	Cosmetic,
	/// Filters or layout forces changed; push topology without reheating.
	Layout,
	/// The render mode flipped; rebuild from scratch.
	Mode,
}

/// The rendering work a handled message asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Work {
	rebuild: bool,
	reheat: bool,
}

/// The embedded graph panel: model, controls, renderer and deferred work.
///
/// All mutation happens inside one call on this type. Deferred work is queued and
/// run by [`tick`](Self::tick), which the host calls once per animation frame.
pub struct GraphView {
	model: GraphModel,
	controls: Controls,
	rules: RuleEngine,
	tasks: TaskQueue<Deferred>,
	render: RenderManager,
	clock: Box<dyn Clock>,
	outbound: Box<dyn OutboundSink>,
	path_highlight: HashSet<LinkKey>,
	focus_retry: Option<TaskId>,
}

impl GraphView {
	/// View with default controls and rules.
	pub fn new(
		factory: impl CapabilityFactory + 'static,
		clock: impl Clock + 'static,
		outbound: impl OutboundSink + 'static,
	) -> Self {
		let controls = Controls::default();
		Self {
			render: RenderManager::new(factory, RenderMode::from_3d(controls.is_3d_mode)),
			model: GraphModel::new(),
			controls,
			rules: RuleEngine::default(),
			tasks: TaskQueue::new(),
			clock: Box::new(clock),
			outbound: Box::new(outbound),
			path_highlight: HashSet::new(),
			focus_retry: None,
		}
	}

	/// Replaces the visual rules.
	pub fn with_rules(mut self, rules: RuleEngine) -> Self {
		self.rules = rules;
		self
	}

	/// Current model.
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// Current controls snapshot.
	pub fn controls(&self) -> &Controls {
		&self.controls
	}

	/// Active or pending render mode.
	pub fn render_mode(&self) -> RenderMode {
		self.render.mode()
	}

	/// Renderer manager, for inspection.
	pub fn render(&self) -> &RenderManager {
		&self.render
	}

	/// Number of queued deferred tasks.
	pub fn pending_tasks(&self) -> usize {
		self.tasks.len()
	}

	/// Tells the host the view is listening.
	pub fn announce_ready(&self) {
		self.outbound.send(&Outbound::Ready);
	}

	/// Decodes and handles one raw message. Failures are logged, never raised.
	pub fn handle_json(&mut self, raw: &str) {
		let result = Inbound::from_json(raw).and_then(|message| self.handle_message(message));
		match result {
			Ok(()) => {}
			Err(ViewError::UnknownMessage(kind)) => warn!("unknown message type `{kind}`"),
			Err(err) => warn!("{err}"),
		}
	}

	/// Handles one decoded message.
	pub fn handle_message(&mut self, message: Inbound) -> Result<()> {
		match message {
			Inbound::Data { data } => {
				self.replace_data(data, None);
				self.apply(Work {
					rebuild: true,
					reheat: true,
				});
			}
			Inbound::Controls { controls } => {
				let next = self.controls.merged(&controls)?;
				let work = self.install_controls(next);
				self.apply(work);
			}
			Inbound::StackTrace { paths } => {
				self.set_stack_trace(&paths);
				self.apply(Work::default());
			}
			Inbound::FocusNode { file_path, node } => {
				let path = file_path.or_else(|| node.and_then(|node| node.file_path));
				match path.as_deref().and_then(|path| self.model.find_by_path(path)) {
					Some(node) => {
						let id = node.id.clone();
						self.focus(id);
					}
					None => debug!("no node matches {path:?}"),
				}
			}
			Inbound::FocusNodeById { node_id, node } => {
				match node_id.or_else(|| node.map(|node| node.id)) {
					Some(id) if self.model.find_by_id(&id).is_some() => self.focus(id),
					other => debug!("cannot focus unknown node {other:?}"),
				}
			}
			Inbound::Update {
				data,
				controls,
				stack_trace_paths,
				data_version,
			} => {
				// a bad patch rejects the whole batch before anything changes
				let next = controls
					.map(|patch| self.controls.merged(&patch))
					.transpose()?;
				let mut work = Work::default();
				if let Some(data) = data {
					if data_version.is_some() && data_version == self.model.version() {
						debug!("data version {data_version:?} unchanged, skipping replace");
					} else {
						self.replace_data(data, data_version);
						work.rebuild = true;
						work.reheat = true;
					}
				}
				if let Some(next) = next {
					let change = self.install_controls(next);
					work.rebuild |= change.rebuild;
					work.reheat |= change.reheat;
				}
				if let Some(paths) = stack_trace_paths {
					self.set_stack_trace(&paths);
				}
				self.apply(work);
			}
			Inbound::Toggle3DMode => {
				self.controls.is_3d_mode = !self.controls.is_3d_mode;
				self.switch_mode();
				self.apply(Work {
					rebuild: true,
					reheat: true,
				});
			}
			Inbound::ClearFocus => {
				self.clear_focus();
				self.apply(Work::default());
			}
			Inbound::Resize { width, height } => self.render.resize(width, height),
			Inbound::HighlightPath { node_names } => {
				self.path_highlight = self.path_edges(&node_names);
				self.sync_highlight();
				self.apply(Work::default());
			}
			Inbound::CallStack(session) => {
				let paths = frame_paths(&session.frames);
				debug!("call stack {} with {} frames", session.session_id, paths.len());
				self.set_stack_trace_paths(&paths, &[]);
				self.apply(Work::default());
			}
		}
		Ok(())
	}

	/// Runs every deferred task that came due.
	pub fn tick(&mut self) {
		let now = self.clock.now();
		for task in self.tasks.take_due(now) {
			match task {
				Deferred::RetryFocus { node_id } => self.retry_focus(node_id),
				task => {
					let mut ctx = RenderContext {
						model: &self.model,
						controls: &self.controls,
						rules: &self.rules,
						tasks: &mut self.tasks,
						now,
					};
					self.render.on_deferred(&mut ctx, task);
				}
			}
		}
	}

	/// Reports a node click to the host. The host answers with a focus message.
	pub fn node_clicked(&self, id: &str) {
		match self.model.find_by_id(id) {
			Some(node) => self.outbound.send(&Outbound::FocusNode {
				node: NodeRef::from(node),
			}),
			None => debug!("click on unknown node {id}"),
		}
	}

	/// The user started or stopped dragging the camera.
	pub fn set_user_interacting(&mut self, interacting: bool) {
		if self.model.ui.is_user_interacting == interacting {
			return;
		}
		self.model.ui.is_user_interacting = interacting;
		let mut ctx = RenderContext {
			model: &self.model,
			controls: &self.controls,
			rules: &self.rules,
			tasks: &mut self.tasks,
			now: self.clock.now(),
		};
		self.render.on_interaction(&mut ctx, interacting);
	}

	fn apply(&mut self, work: Work) {
		let mut ctx = RenderContext {
			model: &self.model,
			controls: &self.controls,
			rules: &self.rules,
			tasks: &mut self.tasks,
			now: self.clock.now(),
		};
		if work.rebuild {
			self.render.update(&mut ctx, work.reheat);
		} else {
			self.render.refresh(&mut ctx);
		}
	}

	fn replace_data(&mut self, data: GraphData, version: Option<u64>) {
		info!("graph data: {} nodes, {} links", data.nodes.len(), data.links.len());
		self.model.replace(data);
		self.model.set_version(version);
		self.sync_highlight();
	}

	/// Installs a merged controls snapshot and classifies what it changed.
	fn install_controls(&mut self, next: Controls) -> Work {
		let change = if next.is_3d_mode != self.controls.is_3d_mode {
			ControlsChange::Mode
		} else if self.controls.layout_differs(&next) {
			ControlsChange::Layout
		} else {
			ControlsChange::Cosmetic
		};
		debug!("controls change: {change:?}");
		self.controls = next;

		match change {
			ControlsChange::Mode => {
				self.switch_mode();
				Work {
					rebuild: true,
					reheat: true,
				}
			}
			ControlsChange::Layout => {
				self.sync_highlight();
				Work {
					rebuild: true,
					reheat: false,
				}
			}
			ControlsChange::Cosmetic => {
				self.sync_highlight();
				Work::default()
			}
		}
	}

	/// Moves the renderer to the mode in `controls`, resetting focus and highlights.
	fn switch_mode(&mut self) {
		self.clear_focus();
		self.render
			.set_mode(RenderMode::from_3d(self.controls.is_3d_mode), &mut self.tasks);
	}

	fn clear_focus(&mut self) {
		self.cancel_focus_retry();
		self.path_highlight.clear();
		self.model.clear_focus_state();
	}

	fn cancel_focus_retry(&mut self) {
		if let Some(id) = self.focus_retry.take() {
			self.tasks.cancel(id);
		}
	}

	/// Sets focus on a resolved node, restyles, then moves the camera.
	fn focus(&mut self, id: NodeId) {
		self.cancel_focus_retry();
		self.model.set_focus(Some(id.clone()));
		self.sync_highlight();
		self.apply(Work::default());
		self.move_camera(id);
	}

	fn move_camera(&mut self, id: NodeId) {
		let now = self.clock.now();
		let mut ctx = RenderContext {
			model: &self.model,
			controls: &self.controls,
			rules: &self.rules,
			tasks: &mut self.tasks,
			now,
		};
		if self.render.focus_node(&mut ctx, &id) == FocusOutcome::Pending {
			debug!("{id} has no position yet, retrying");
			self.focus_retry = Some(self.tasks.after_delay(
				now,
				FOCUS_RETRY_MS,
				Deferred::RetryFocus { node_id: id },
			));
		}
	}

	fn retry_focus(&mut self, node_id: NodeId) {
		self.focus_retry = None;
		let still_focused = self.model.ui.focused.as_ref() == Some(&node_id);
		if still_focused && self.model.find_by_id(&node_id).is_some() {
			self.move_camera(node_id);
		}
	}

	/// Recomputes the highlight set from the explicit path and the dependency slice.
	fn sync_highlight(&mut self) {
		let mut edges = self.path_highlight.clone();
		if let Some(focused) = self.model.focused_index() {
			let depth = self.controls.slice_depth;
			if self.controls.enable_forward_slice {
				edges.extend(slice_edges(&self.model, focused, SliceDirection::Forward, depth));
			}
			if self.controls.enable_backward_slice {
				edges.extend(slice_edges(&self.model, focused, SliceDirection::Backward, depth));
			}
		}
		self.model.set_highlight_edges(edges);
	}

	/// Edges between consecutive resolvable names.
	fn path_edges(&self, names: &[String]) -> HashSet<LinkKey> {
		let ids: Vec<&str> = names
			.iter()
			.filter_map(|name| {
				self.model
					.nodes()
					.iter()
					.find(|node| node.name.as_deref() == Some(name) || node.id == *name)
					.map(|node| node.id.as_str())
			})
			.collect();
		ids.windows(2).map(|pair| LinkKey::new(pair[0], pair[1])).collect()
	}

	fn set_stack_trace(&mut self, entries: &[StackTraceEntry]) {
		let mut links = Vec::new();
		let mut paths = Vec::new();
		for entry in entries {
			match entry {
				StackTraceEntry::Link { link } => links.push(link.key()),
				StackTraceEntry::Path(path) => paths.push(path.clone()),
			}
		}
		self.set_stack_trace_paths(&paths, &links);
	}

	fn set_stack_trace_paths(&mut self, paths: &[String], links: &[LinkKey]) {
		let frame_nodes = correlate(&self.model, paths);
		let mut edges: HashSet<LinkKey> = links.iter().cloned().collect();
		edges.extend(stack_links(&frame_nodes).iter().map(|edge| edge.key()));
		debug!("stack trace overlay: {} edges", edges.len());
		self.model.set_stack_trace_edges(edges);
	}
}
