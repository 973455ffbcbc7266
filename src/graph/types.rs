use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Stable node identity as produced by the analyzer.
pub type NodeId = String;

/// Category tag of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
	/// Concrete class.
	Class,
	/// Abstract class.
	AbstractClass,
	/// Interface.
	Interface,
	/// Analyzer could not classify the unit.
	#[default]
	Unknown,
	/// Any other tag, kept verbatim.
	Other(String),
}

impl NodeKind {
	/// Tag as it appears on the wire and in control tables.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Class => "Class",
			Self::AbstractClass => "AbstractClass",
			Self::Interface => "Interface",
			Self::Unknown => "Unknown",
			Self::Other(tag) => tag,
		}
	}
}

impl From<String> for NodeKind {
	fn from(tag: String) -> Self {
		match tag.as_str() {
			"Class" => Self::Class,
			"AbstractClass" => Self::AbstractClass,
			"Interface" => Self::Interface,
			"Unknown" | "" => Self::Unknown,
			_ => Self::Other(tag),
		}
	}
}

impl From<NodeKind> for String {
	fn from(kind: NodeKind) -> Self {
		kind.as_str().to_owned()
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Category tag of an edge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeKind {
	/// `new T()` inside the source unit.
	ObjectCreate,
	/// Inheritance.
	Extends,
	/// Interface implementation.
	Implements,
	/// The source mentions the target type.
	TypeUse,
	/// The source calls into the target.
	MethodCall,
	/// Synthetic edge derived from a debugger call stack.
	StackTrace,
	/// Any other tag, kept verbatim.
	Other(String),
	/// No tag at all.
	#[default]
	Untyped,
}

impl EdgeKind {
	/// Tag as it appears on the wire and in control tables.
	pub fn as_str(&self) -> &str {
		match self {
			Self::ObjectCreate => "ObjectCreate",
			Self::Extends => "Extends",
			Self::Implements => "Implements",
			Self::TypeUse => "TypeUse",
			Self::MethodCall => "MethodCall",
			Self::StackTrace => "StackTrace",
			Self::Other(tag) => tag,
			Self::Untyped => "",
		}
	}
}

impl From<String> for EdgeKind {
	fn from(tag: String) -> Self {
		match tag.as_str() {
			"ObjectCreate" => Self::ObjectCreate,
			"Extends" => Self::Extends,
			"Implements" => Self::Implements,
			"TypeUse" => Self::TypeUse,
			"MethodCall" => Self::MethodCall,
			"StackTrace" => Self::StackTrace,
			"" => Self::Untyped,
			_ => Self::Other(tag),
		}
	}
}

impl From<EdgeKind> for String {
	fn from(kind: EdgeKind) -> Self {
		kind.as_str().to_owned()
	}
}

/// A code unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	/// Unique id. Nodes arriving without one are dropped by the model.
	#[serde(default, deserialize_with = "lenient_id")]
	pub id: NodeId,
	/// Qualified name, e.g. `com.example.Service`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Category tag.
	#[serde(default, rename = "type")]
	pub kind: NodeKind,
	/// Source file, absolute or workspace-relative.
	#[serde(default, alias = "file", skip_serializing_if = "Option::is_none")]
	pub file_path: Option<String>,
	/// Size metric used by the size-by-LOC rule.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lines_of_code: Option<u32>,
}

impl Node {
	/// Node with an id and a name, everything else defaulted.
	pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: Some(name.into()),
			..Self::default()
		}
	}

	/// Sets the kind.
	pub fn with_kind(mut self, kind: NodeKind) -> Self {
		self.kind = kind;
		self
	}

	/// Sets the file path.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.file_path = Some(path.into());
		self
	}

	/// Sets the lines-of-code metric.
	pub fn with_loc(mut self, loc: u32) -> Self {
		self.lines_of_code = Some(loc);
		self
	}
}

/// A relation between two nodes.
///
/// Endpoints may arrive either as raw ids or as embedded node objects; both
/// decode to the plain id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
	/// Source node id.
	#[serde(default, deserialize_with = "endpoint_id")]
	pub source: NodeId,
	/// Target node id.
	#[serde(default, deserialize_with = "endpoint_id")]
	pub target: NodeId,
	/// Category tag.
	#[serde(default, rename = "type")]
	pub kind: EdgeKind,
	/// Set on synthetic call-stack edges.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub is_stack_trace_link: bool,
}

impl Edge {
	/// Edge between two ids.
	pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: EdgeKind) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
			is_stack_trace_link: false,
		}
	}

	/// Endpoint pair used to key this edge in highlight sets.
	pub fn key(&self) -> LinkKey {
		LinkKey::new(&self.source, &self.target)
	}
}

/// Direction-insensitive endpoint pair.
///
/// Highlight and stack-trace sets outlive a single data generation, so edges are
/// keyed by their endpoints rather than by position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
	low: NodeId,
	high: NodeId,
}

impl LinkKey {
	/// Key for the pair `a`/`b`, in either order.
	pub fn new(a: &str, b: &str) -> Self {
		let (low, high) = if a <= b { (a, b) } else { (b, a) };
		Self {
			low: low.to_owned(),
			high: high.to_owned(),
		}
	}

	/// True when `id` is one of the endpoints.
	pub fn touches(&self, id: &str) -> bool {
		self.low == id || self.high == id
	}
}

/// Node and edge lists as sent by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes in producer order.
	#[serde(default)]
	pub nodes: Vec<Node>,
	/// Edges in producer order.
	#[serde(default, alias = "edges")]
	pub links: Vec<Edge>,
}

fn id_from_value(value: &Value) -> NodeId {
	match value {
		Value::String(id) => id.clone(),
		Value::Number(n) => n.to_string(),
		Value::Object(map) => map.get("id").map(id_from_value).unwrap_or_default(),
		_ => NodeId::new(),
	}
}

fn lenient_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;
	Ok(match value {
		Value::Object(_) => NodeId::new(),
		other => id_from_value(&other),
	})
}

fn endpoint_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(|value| id_from_value(&value))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoints_normalize_to_ids() {
		let edge: Edge = serde_json::from_value(serde_json::json!({
			"source": { "id": "a", "x": 3.0 },
			"target": 7,
			"type": "MethodCall"
		}))
		.unwrap();
		assert_eq!(edge.source, "a");
		assert_eq!(edge.target, "7");
		assert_eq!(edge.kind, EdgeKind::MethodCall);
	}

	#[test]
	fn unknown_kinds_survive() {
		let node: Node =
			serde_json::from_value(serde_json::json!({ "id": "n", "type": "Enum" })).unwrap();
		assert_eq!(node.kind, NodeKind::Other("Enum".into()));
		assert_eq!(String::from(node.kind), "Enum");
	}

	#[test]
	fn file_alias_is_accepted() {
		let node: Node =
			serde_json::from_value(serde_json::json!({ "id": "n", "file": "src/A.java" })).unwrap();
		assert_eq!(node.file_path.as_deref(), Some("src/A.java"));
	}

	#[test]
	fn link_key_ignores_direction() {
		assert_eq!(LinkKey::new("a", "b"), LinkKey::new("b", "a"));
		assert!(LinkKey::new("a", "b").touches("b"));
	}
}
