//! Host <-> view message protocol.
//!
//! Every message is a JSON object tagged by `type`. Unknown fields are ignored and
//! missing optional fields default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ViewError};
use crate::graph::stack_trace::DebugSession;
use crate::graph::{Edge, GraphData, Node, NodeId};

/// Node reference as exchanged with the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeRef {
	/// Node id.
	pub id: NodeId,
	/// Source file.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_path: Option<String>,
	/// Qualified name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl From<&Node> for NodeRef {
	fn from(node: &Node) -> Self {
		Self {
			id: node.id.clone(),
			file_path: node.file_path.clone(),
			name: node.name.clone(),
		}
	}
}

/// One entry of a `stackTrace` path list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StackTraceEntry {
	/// An edge of the current data to overlay.
	Link {
		/// The edge.
		link: Edge,
	},
	/// A frame's source file, correlated against node paths.
	Path(String),
}

/// Messages from the host.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
	/// Replace the graph.
	#[serde(rename = "data")]
	Data {
		/// New nodes and edges.
		#[serde(default)]
		data: GraphData,
	},
	/// Shallow-merge a controls patch.
	#[serde(rename = "controls")]
	Controls {
		/// Keys to replace.
		#[serde(default)]
		controls: Map<String, Value>,
	},
	/// Replace the call-stack overlay.
	#[serde(rename = "stackTrace")]
	StackTrace {
		/// Overlay entries, innermost frame first.
		#[serde(default)]
		paths: Vec<StackTraceEntry>,
	},
	/// Focus the node whose file matches a path.
	#[serde(rename = "focusNode")]
	FocusNode {
		/// Path to match.
		#[serde(default, rename = "filePath")]
		file_path: Option<String>,
		/// Fallback carrier of `filePath`.
		#[serde(default)]
		node: Option<NodeRef>,
	},
	/// Focus a node by id.
	#[serde(rename = "focusNodeById")]
	FocusNodeById {
		/// Id to focus.
		#[serde(default, rename = "nodeId")]
		node_id: Option<NodeId>,
		/// Fallback carrier of the id.
		#[serde(default)]
		node: Option<NodeRef>,
	},
	/// Any combination of data, controls and overlay in one go.
	#[serde(rename = "update")]
	Update {
		/// New graph, if any.
		#[serde(default)]
		data: Option<GraphData>,
		/// Controls patch, if any.
		#[serde(default)]
		controls: Option<Map<String, Value>>,
		/// New call-stack overlay, if any.
		#[serde(default, rename = "stackTracePaths")]
		stack_trace_paths: Option<Vec<StackTraceEntry>>,
		/// Producer version of `data`; an unchanged version skips the replacement.
		#[serde(default, rename = "dataVersion")]
		data_version: Option<u64>,
	},
	/// Switch between 2D and 3D.
	#[serde(rename = "toggle3DMode")]
	Toggle3DMode,
	/// Drop focus and highlights.
	#[serde(rename = "clearFocus")]
	ClearFocus,
	/// Viewport size changed.
	#[serde(rename = "resize")]
	Resize {
		/// Width in pixels.
		#[serde(default)]
		width: f64,
		/// Height in pixels.
		#[serde(default)]
		height: f64,
	},
	/// Highlight a chain of nodes given by name or id.
	#[serde(rename = "highlightPath")]
	HighlightPath {
		/// Names in chain order; empty clears.
		#[serde(default, rename = "nodeNames")]
		node_names: Vec<String>,
	},
	/// Raw debugger frames.
	#[serde(rename = "callStack")]
	CallStack(DebugSession),
}

const INBOUND_TYPES: &[&str] = &[
	"data",
	"controls",
	"stackTrace",
	"focusNode",
	"focusNodeById",
	"update",
	"toggle3DMode",
	"clearFocus",
	"resize",
	"highlightPath",
	"callStack",
];

impl Inbound {
	/// Decodes a raw message.
	///
	/// A `type` this view does not handle is reported as
	/// [`ViewError::UnknownMessage`] rather than as a decode failure.
	pub fn from_json(raw: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(raw)?;
		let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
		if !INBOUND_TYPES.contains(&kind) {
			return Err(ViewError::UnknownMessage(kind.to_owned()));
		}
		Ok(serde_json::from_value(value)?)
	}
}

/// Messages to the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
	/// The user clicked a node.
	FocusNode {
		/// Clicked node.
		node: NodeRef,
	},
	/// The view is listening.
	Ready,
}

/// Where outbound messages go.
pub trait OutboundSink {
	/// Delivers `message` to the host.
	fn send(&self, message: &Outbound);
}

impl<F> OutboundSink for F
where
	F: Fn(&Outbound),
{
	fn send(&self, message: &Outbound) {
		self(message)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn unknown_type_is_reported_as_such() {
		let err = Inbound::from_json(r#"{ "type": "explode" }"#).unwrap_err();
		assert!(matches!(err, ViewError::UnknownMessage(kind) if kind == "explode"));
		assert!(matches!(Inbound::from_json("not json"), Err(ViewError::Message(_))));
	}

	#[test]
	fn stack_trace_accepts_links_and_paths() {
		let message = Inbound::from_json(
			&json!({
				"type": "stackTrace",
				"paths": [
					{ "link": { "source": "a", "target": "b" } },
					"/src/p/A.java"
				]
			})
			.to_string(),
		)
		.unwrap();
		let Inbound::StackTrace { paths } = message else {
			panic!("wrong variant");
		};
		assert!(matches!(&paths[0], StackTraceEntry::Link { link } if link.source == "a"));
		assert_eq!(paths[1], StackTraceEntry::Path("/src/p/A.java".into()));
	}

	#[test]
	fn missing_paths_default_to_empty() {
		let message = Inbound::from_json(r#"{ "type": "stackTrace" }"#).unwrap();
		assert!(matches!(message, Inbound::StackTrace { paths } if paths.is_empty()));
	}

	#[test]
	fn update_fields_are_optional() {
		let message =
			Inbound::from_json(r#"{ "type": "update", "dataVersion": 4, "extra": 1 }"#).unwrap();
		assert!(matches!(
			message,
			Inbound::Update {
				data: None,
				controls: None,
				stack_trace_paths: None,
				data_version: Some(4),
			}
		));
	}

	#[test]
	fn call_stack_carries_frames() {
		let message = Inbound::from_json(
			&json!({
				"type": "callStack",
				"sessionId": "s1",
				"frames": [{ "source": { "path": "/p/A.java" } }, { "source": null }]
			})
			.to_string(),
		)
		.unwrap();
		let Inbound::CallStack(session) = message else {
			panic!("wrong variant");
		};
		assert_eq!(session.session_id, "s1");
		assert_eq!(session.frames.len(), 2);
	}

	#[test]
	fn outbound_focus_uses_camel_case() {
		let message = Outbound::FocusNode {
			node: NodeRef {
				id: "a".into(),
				file_path: Some("/p/A.java".into()),
				name: None,
			},
		};
		assert_eq!(
			serde_json::to_value(&message).unwrap(),
			json!({ "type": "focusNode", "node": { "id": "a", "filePath": "/p/A.java" } })
		);
	}
}
