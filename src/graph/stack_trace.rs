//! Debugger call-stack correlation.
//!
//! The debugger collaborator hands over raw frames; the view only needs the ordered,
//! de-duplicated list of source paths and the synthetic edges pairing consecutive
//! frames.

use std::collections::HashSet;

use serde::Deserialize;

use super::model::GraphModel;
use super::types::{Edge, EdgeKind, NodeId};

/// One captured debugger session.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSession {
	/// Session id assigned by the debugger.
	#[serde(default)]
	pub session_id: String,
	/// Frames, innermost first.
	#[serde(default)]
	pub frames: Vec<StackFrame>,
}

/// A single stack frame.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StackFrame {
	/// Source location, absent for native frames.
	#[serde(default)]
	pub source: Option<FrameSource>,
}

/// Source location of a frame.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FrameSource {
	/// File path, absent for generated code.
	#[serde(default)]
	pub path: Option<String>,
}

impl StackFrame {
	/// Frame located in `path`.
	pub fn at(path: impl Into<String>) -> Self {
		Self {
			source: Some(FrameSource {
				path: Some(path.into()),
			}),
		}
	}
}

/// Frame paths in stack order with blanks and repeats removed.
pub fn frame_paths(frames: &[StackFrame]) -> Vec<String> {
	let mut seen = HashSet::new();
	frames
		.iter()
		.filter_map(|frame| frame.source.as_ref()?.path.as_deref())
		.filter(|path| !path.trim().is_empty())
		.filter(|path| seen.insert(*path))
		.map(str::to_owned)
		.collect()
}

/// Synthetic edges pairing consecutive frames, from the later frame to the earlier
/// one. Fewer than two frames produce no edges.
pub fn stack_links(frame_nodes: &[NodeId]) -> Vec<Edge> {
	frame_nodes
		.windows(2)
		.map(|pair| Edge {
			source: pair[1].clone(),
			target: pair[0].clone(),
			kind: EdgeKind::StackTrace,
			is_stack_trace_link: true,
		})
		.collect()
}

/// Resolves `paths` to node ids through the model's path matching, skipping paths
/// that match no node and collapsing consecutive repeats.
pub fn correlate(model: &GraphModel, paths: &[String]) -> Vec<NodeId> {
	let mut ids: Vec<NodeId> = Vec::with_capacity(paths.len());
	for path in paths {
		let Some(node) = model.find_by_path(path) else {
			continue;
		};
		if ids.last() != Some(&node.id) {
			ids.push(node.id.clone());
		}
	}
	ids
}
