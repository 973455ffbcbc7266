//! Graph data, derived structure and queries over it.

pub mod filter;
mod model;
pub mod path;
mod query;
pub mod slice;
pub mod stack_trace;
mod types;

pub use filter::{VisibleSet, visible_set};
pub use model::{Adjacency, GraphModel, UiState};
pub use query::SearchQuery;
pub use slice::{SliceDirection, slice_edges};
pub use types::{Edge, EdgeKind, GraphData, LinkKey, Node, NodeId, NodeKind};
