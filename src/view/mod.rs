//! Message dispatch: the entry point the host page talks to.

mod dispatch;
pub mod message;

pub use dispatch::{FOCUS_RETRY_MS, GraphView};
pub use message::{Inbound, NodeRef, Outbound, OutboundSink, StackTraceEntry};
