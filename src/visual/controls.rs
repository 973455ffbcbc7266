use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ViewError};

/// Per-category lookup table, split by entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeTable<T> {
	/// Keyed by node type tag.
	pub node: HashMap<String, T>,
	/// Keyed by edge type tag.
	pub edge: HashMap<String, T>,
}

/// Fallback colours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Palette {
	/// Call-stack overlay edges.
	pub stack_trace_link: String,
	/// Canvas background.
	pub background_dark: String,
	/// Nodes without a type colour.
	pub node_default: String,
	/// Edges without a type colour.
	pub edge_default: String,
}

impl Default for Palette {
	fn default() -> Self {
		Self {
			stack_trace_link: "#51cf66".into(),
			background_dark: "#1a1a1a".into(),
			node_default: "#187bebff".into(),
			edge_default: "#4b5563".into(),
		}
	}
}

/// Flat view settings pushed by the host.
///
/// Treated as an immutable snapshot per update cycle; every `controls` message is
/// shallow-merged over the current snapshot with [`Controls::merged`]. Keys this
/// crate does not know are kept in `extra` so merges round-trip them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Controls {
	/// Search query, see [`crate::graph::SearchQuery`].
	pub search: String,
	/// Render in 3D instead of 2D.
	#[serde(rename = "is3DMode")]
	pub is_3d_mode: bool,
	/// Scale nodes by lines of code.
	pub node_size_by_loc: bool,
	/// Hide nodes without any edge.
	pub hide_isolated_nodes: bool,
	/// Draw name labels.
	pub show_names: bool,
	/// Label with the text after the last `.` of the name.
	pub short_names: bool,
	/// Base node size.
	pub node_size: f64,
	/// Base edge width.
	pub link_width: f64,
	/// Base node opacity.
	pub node_opacity: f64,
	/// Base edge opacity.
	pub edge_opacity: f64,
	/// Rest length of the link force.
	pub link_distance: f64,
	/// Camera distance when focusing a node in 3D.
	pub focus_distance: f64,
	/// Arrow head length.
	pub arrow_size: f64,
	/// Label font size in pixels.
	pub text_size: f64,
	/// Hops followed by dependency slicing.
	pub slice_depth: u32,
	/// Highlight what the focused node depends on.
	pub enable_forward_slice: bool,
	/// Highlight what depends on the focused node.
	pub enable_backward_slice: bool,
	/// Orbit the 3D camera while idle.
	pub auto_rotate: bool,
	/// Radians per second.
	pub rotate_speed: f64,
	/// Quiet period, in milliseconds, before auto-rotation resumes.
	pub auto_rotate_delay: f64,
	/// Visibility per type tag.
	pub type_filters: TypeTable<bool>,
	/// Colour per type tag.
	pub type_colors: TypeTable<String>,
	/// Fallback colours.
	#[serde(rename = "COLORS")]
	pub colors: Palette,
	/// Keys this crate does not interpret.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Default for Controls {
	fn default() -> Self {
		Self {
			search: String::new(),
			is_3d_mode: false,
			node_size_by_loc: false,
			hide_isolated_nodes: false,
			show_names: true,
			short_names: true,
			node_size: 3.0,
			link_width: 0.5,
			node_opacity: 1.0,
			edge_opacity: 1.0,
			link_distance: 50.0,
			focus_distance: 120.0,
			arrow_size: 3.0,
			text_size: 12.0,
			slice_depth: 3,
			enable_forward_slice: false,
			enable_backward_slice: false,
			auto_rotate: false,
			rotate_speed: 0.1,
			auto_rotate_delay: 1000.0,
			type_filters: TypeTable::default(),
			type_colors: default_type_colors(),
			colors: Palette::default(),
			extra: Map::new(),
		}
	}
}

fn default_type_colors() -> TypeTable<String> {
	let table = |pairs: &[(&str, &str)]| {
		pairs
			.iter()
			.map(|(tag, color)| (tag.to_string(), color.to_string()))
			.collect()
	};
	TypeTable {
		node: table(&[
			("Class", "#157df4ff"),
			("AbstractClass", "#f03e9dff"),
			("Interface", "#26f9a5ff"),
			("Unknown", "#9ca3af"),
		]),
		edge: table(&[
			("ObjectCreate", "#fde047"),
			("Extends", "#ff83c5ff"),
			("Implements", "#26f9a5ff"),
			("TypeUse", "#fdba74"),
			("MethodCall", "#fda4af"),
		]),
	}
}

impl Controls {
	/// Applies `patch` key by key over this snapshot.
	///
	/// Top-level keys in the patch replace the current value wholesale; nested tables
	/// are not merged. Fails when a patched value has the wrong shape, in which case
	/// the caller keeps the old snapshot.
	pub fn merged(&self, patch: &Map<String, Value>) -> Result<Self> {
		let mut current = match serde_json::to_value(self)? {
			Value::Object(map) => map,
			other => return Err(ViewError::Controls(format!("not an object: {other}"))),
		};
		for (key, value) in patch {
			current.insert(key.clone(), value.clone());
		}
		serde_json::from_value(Value::Object(current))
			.map_err(|error| ViewError::Controls(error.to_string()))
	}

	/// True when switching from `self` to `next` changes which entities are pushed
	/// to the renderer or how the layout forces are set up.
	pub fn layout_differs(&self, next: &Self) -> bool {
		self.search != next.search
			|| self.hide_isolated_nodes != next.hide_isolated_nodes
			|| self.type_filters != next.type_filters
			|| self.link_distance != next.link_distance
			|| self.arrow_size != next.arrow_size
	}

	/// Whether nodes of type `tag` are shown. Unlisted types are shown.
	pub fn shows_node_type(&self, tag: &str) -> bool {
		self.type_filters.node.get(tag).copied().unwrap_or(true)
	}

	/// Whether edges of type `tag` are shown. Unlisted types are shown.
	pub fn shows_edge_type(&self, tag: &str) -> bool {
		self.type_filters.edge.get(tag).copied().unwrap_or(true)
	}
}
