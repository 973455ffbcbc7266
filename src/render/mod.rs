//! Mode-specific renderers and the backend verb set they drive.

mod adapter;
mod adapter2d;
mod adapter3d;
pub mod capability;
mod manager;
pub mod schedule;

pub use adapter::{FocusOutcome, REHEAT_DELAY_MS, RenderAdapter, RenderContext, RenderMode};
pub use adapter2d::Adapter2d;
pub use adapter3d::Adapter3d;
pub use capability::{
	CapabilityFactory, LabelStyle, LayoutData, LayoutLink, LayoutNode, LinkStyle, NodeStyle,
	RenderCapability, SharedCapability, StyleFn, Vec3,
};
pub use manager::RenderManager;
pub use schedule::{BrowserClock, Clock, Deferred, ManualClock, TaskId, TaskQueue};
