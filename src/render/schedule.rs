//! Cooperative frame/delay scheduling.
//!
//! Nothing here runs on its own: the host calls [`crate::view::GraphView::tick`] once
//! per animation frame and every task that came due is handed back to the view. Frame
//! tasks queued while a tick is running wait for the next tick.

use std::cell::Cell;
use std::rc::Rc;

use crate::graph::NodeId;

/// Millisecond time source.
pub trait Clock {
	/// Current time in milliseconds.
	fn now(&self) -> f64;
}

/// `Date.now()` of the hosting page.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
	fn now(&self) -> f64 {
		js_sys::Date::now()
	}
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
	/// Clock starting at `ms`.
	pub fn starting_at(ms: f64) -> Self {
		Self(Rc::new(Cell::new(ms)))
	}

	/// Moves time forward by `ms`.
	pub fn advance(&self, ms: f64) {
		self.0.set(self.0.get() + ms);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> f64 {
		self.0.get()
	}
}

/// Handle of a queued task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Due {
	NextFrame,
	At(f64),
}

#[derive(Debug)]
struct Pending<T> {
	id: TaskId,
	due: Due,
	task: T,
}

/// Queue of deferred tasks.
#[derive(Debug)]
pub struct TaskQueue<T> {
	next_id: u64,
	pending: Vec<Pending<T>>,
}

impl<T> Default for TaskQueue<T> {
	fn default() -> Self {
		Self {
			next_id: 0,
			pending: Vec::new(),
		}
	}
}

impl<T> TaskQueue<T> {
	/// Empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&mut self, due: Due, task: T) -> TaskId {
		let id = TaskId(self.next_id);
		self.next_id += 1;
		self.pending.push(Pending { id, due, task });
		id
	}

	/// Runs `task` on the next tick.
	pub fn next_frame(&mut self, task: T) -> TaskId {
		self.push(Due::NextFrame, task)
	}

	/// Runs `task` on the first tick at or after `now + delay_ms`.
	pub fn after_delay(&mut self, now: f64, delay_ms: f64, task: T) -> TaskId {
		self.push(Due::At(now + delay_ms.max(0.0)), task)
	}

	/// Drops the task, returning whether it was still queued.
	pub fn cancel(&mut self, id: TaskId) -> bool {
		let before = self.pending.len();
		self.pending.retain(|pending| pending.id != id);
		self.pending.len() != before
	}

	/// Drops every task matching `predicate`.
	pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) {
		self.pending.retain(|pending| !predicate(&pending.task));
	}

	/// Number of queued tasks.
	pub fn len(&self) -> usize {
		self.pending.len()
	}

	/// True when nothing is queued.
	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Removes and returns every task due at `now`: frame tasks first, then timers
	/// by due time, ties in scheduling order.
	pub fn take_due(&mut self, now: f64) -> Vec<T> {
		let (mut due, rest): (Vec<_>, Vec<_>) =
			self.pending.drain(..).partition(|pending| match pending.due {
				Due::NextFrame => true,
				Due::At(at) => at <= now,
			});
		self.pending = rest;

		due.sort_by(|a, b| {
			let key = |pending: &Pending<T>| match pending.due {
				Due::NextFrame => f64::NEG_INFINITY,
				Due::At(at) => at,
			};
			key(a).total_cmp(&key(b)).then(a.id.0.cmp(&b.id.0))
		});
		due.into_iter().map(|pending| pending.task).collect()
	}
}

/// Work the view defers to a later tick.
///
/// Renderer tasks carry the epoch of the renderer that queued them; a task whose
/// renderer has since been replaced is dropped when it comes due.
#[derive(Clone, Debug, PartialEq)]
pub enum Deferred {
	/// Restart the physics simulation.
	Reheat {
		/// Renderer epoch.
		epoch: u64,
	},
	/// Try again to move the camera to a node that had no position yet.
	RetryFocus {
		/// Node that was focused when the retry was queued.
		node_id: NodeId,
	},
	/// Advance the 3D auto-rotation by one frame.
	RotationFrame {
		/// Renderer epoch.
		epoch: u64,
	},
	/// Restart auto-rotation after the user stopped interacting.
	ResumeRotation {
		/// Renderer epoch.
		epoch: u64,
	},
	/// The 3D focus camera transition has finished.
	FocusSettled {
		/// Renderer epoch.
		epoch: u64,
	},
}

impl Deferred {
	/// Epoch of the renderer the task belongs to, if any.
	pub fn epoch(&self) -> Option<u64> {
		match self {
			Self::Reheat { epoch }
			| Self::RotationFrame { epoch }
			| Self::ResumeRotation { epoch }
			| Self::FocusSettled { epoch } => Some(*epoch),
			Self::RetryFocus { .. } => None,
		}
	}
}
