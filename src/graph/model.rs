use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use super::path::paths_match;
use super::types::{Edge, GraphData, LinkKey, Node, NodeId};

/// Undirected adjacency derived from the edge list.
///
/// Indexed by node position. Rebuilt wholesale on every data replacement and shared
/// behind an `Rc`, so callers can tell whether a rebuild happened with
/// [`Rc::ptr_eq`].
#[derive(Debug, Default)]
pub struct Adjacency {
	/// Neighbor node indices per node.
	pub neighbors: Vec<Vec<usize>>,
	/// Incident edge indices per node.
	pub incident_edges: Vec<Vec<usize>>,
}

/// Transient view state. Survives control-only and focus-only updates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiState {
	/// The focused node, if any.
	pub focused: Option<NodeId>,
	/// Edges emphasized by slicing or an explicit path highlight.
	pub highlight_edges: HashSet<LinkKey>,
	/// Edges derived from the live debugger call stack.
	pub stack_trace_edges: HashSet<LinkKey>,
	/// The user is currently dragging the 3D camera.
	pub is_user_interacting: bool,
}

/// Nodes, edges, derived adjacency and UI state of one graph view.
#[derive(Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	endpoints: Vec<(usize, usize)>,
	index_by_id: HashMap<NodeId, usize>,
	adjacency: Rc<Adjacency>,
	generation: u64,
	version: Option<u64>,
	/// Transient view state.
	pub ui: UiState,
}

impl GraphModel {
	/// Empty model at generation 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs a new node/edge set and rebuilds every derived structure.
	///
	/// Nodes without an id, or repeating an earlier id, are dropped. Edges whose
	/// endpoints do not resolve are dropped; the producer may reference nodes an
	/// upstream display policy filtered out. UI state is kept.
	pub fn replace(&mut self, data: GraphData) {
		let GraphData { nodes, links } = data;

		let mut index_by_id = HashMap::with_capacity(nodes.len());
		let mut kept_nodes = Vec::with_capacity(nodes.len());
		for node in nodes {
			if node.id.is_empty() || index_by_id.contains_key(&node.id) {
				debug!("dropping node without unique id: {:?}", node.name);
				continue;
			}
			index_by_id.insert(node.id.clone(), kept_nodes.len());
			kept_nodes.push(node);
		}

		let mut adjacency = Adjacency {
			neighbors: vec![Vec::new(); kept_nodes.len()],
			incident_edges: vec![Vec::new(); kept_nodes.len()],
		};
		let mut kept_edges = Vec::with_capacity(links.len());
		let mut endpoints = Vec::with_capacity(links.len());
		for edge in links {
			let (Some(&a), Some(&b)) = (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
			else {
				debug!("dropping edge {} -> {}: unresolved endpoint", edge.source, edge.target);
				continue;
			};

			let edge_index = kept_edges.len();
			adjacency.neighbors[a].push(b);
			adjacency.incident_edges[a].push(edge_index);
			if a != b {
				adjacency.neighbors[b].push(a);
				adjacency.incident_edges[b].push(edge_index);
			}
			endpoints.push((a, b));
			kept_edges.push(edge);
		}

		self.nodes = kept_nodes;
		self.edges = kept_edges;
		self.endpoints = endpoints;
		self.index_by_id = index_by_id;
		self.adjacency = Rc::new(adjacency);
		self.generation += 1;
	}

	/// Counter bumped on every [`replace`](Self::replace). Visual caches are only
	/// valid for the generation they were built from.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Producer-assigned data version of the current data, if one was sent.
	pub fn version(&self) -> Option<u64> {
		self.version
	}

	/// Records the producer-assigned data version.
	pub fn set_version(&mut self, version: Option<u64>) {
		self.version = version;
	}

	/// All nodes.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// All resolved edges.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Derived adjacency of the current generation.
	pub fn adjacency(&self) -> &Rc<Adjacency> {
		&self.adjacency
	}

	/// Node indices of both endpoints of edge `edge`.
	pub fn endpoints(&self, edge: usize) -> Option<(usize, usize)> {
		self.endpoints.get(edge).copied()
	}

	/// Neighbor node indices of node `index`.
	pub fn neighbors(&self, index: usize) -> &[usize] {
		self.adjacency.neighbors.get(index).map_or(&[], Vec::as_slice)
	}

	/// Incident edge indices of node `index`.
	pub fn incident_edges(&self, index: usize) -> &[usize] {
		self.adjacency.incident_edges.get(index).map_or(&[], Vec::as_slice)
	}

	/// Position of the node with `id`.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index_by_id.get(id).copied()
	}

	/// Node with `id`.
	pub fn find_by_id(&self, id: &str) -> Option<&Node> {
		self.index_of(id).map(|index| &self.nodes[index])
	}

	/// First node, in producer order, whose file path matches `path`.
	pub fn find_by_path(&self, path: &str) -> Option<&Node> {
		self.nodes.iter().find(|node| {
			node.file_path
				.as_deref()
				.is_some_and(|file| paths_match(file, path))
		})
	}

	/// Index of the focused node, when the focus still resolves in this generation.
	pub fn focused_index(&self) -> Option<usize> {
		self.ui.focused.as_deref().and_then(|id| self.index_of(id))
	}

	/// Sets or clears the focus.
	pub fn set_focus(&mut self, id: Option<NodeId>) {
		self.ui.focused = id;
	}

	/// Replaces the highlight edge set.
	pub fn set_highlight_edges(&mut self, edges: HashSet<LinkKey>) {
		self.ui.highlight_edges = edges;
	}

	/// Replaces the stack-trace edge set.
	pub fn set_stack_trace_edges(&mut self, edges: HashSet<LinkKey>) {
		self.ui.stack_trace_edges = edges;
	}

	/// Drops focus and highlights. Used on explicit clears and mode switches.
	pub fn clear_focus_state(&mut self) {
		self.ui.focused = None;
		self.ui.highlight_edges.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::EdgeKind;

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![
				Node::new("a", "pkg.A").with_path("/ws/src/pkg/A.java"),
				Node::new("b", "pkg.B").with_path("/ws/src/pkg/B.java"),
				Node::new("c", "pkg.C"),
			],
			links: vec![
				Edge::new("a", "b", EdgeKind::MethodCall),
				Edge::new("b", "c", EdgeKind::Extends),
				Edge::new("c", "missing", EdgeKind::TypeUse),
			],
		}
	}

	#[test]
	fn replace_builds_undirected_adjacency() {
		let mut model = GraphModel::new();
		model.replace(sample());

		assert_eq!(model.edges().len(), 2);
		assert_eq!(model.neighbors(1), &[0, 2]);
		assert_eq!(model.incident_edges(1), &[0, 1]);
		assert_eq!(model.neighbors(2), &[1]);
	}

	#[test]
	fn replace_drops_duplicate_and_empty_ids() {
		let mut model = GraphModel::new();
		model.replace(GraphData {
			nodes: vec![Node::new("a", "first"), Node::new("a", "second"), Node::new("", "anon")],
			links: vec![],
		});
		assert_eq!(model.nodes().len(), 1);
		assert_eq!(model.find_by_id("a").and_then(|n| n.name.as_deref()), Some("first"));
	}

	#[test]
	fn self_loops_are_kept_once() {
		let mut model = GraphModel::new();
		model.replace(GraphData {
			nodes: vec![Node::new("a", "A")],
			links: vec![Edge::new("a", "a", EdgeKind::MethodCall)],
		});
		assert_eq!(model.neighbors(0), &[0]);
		assert_eq!(model.incident_edges(0), &[0]);
	}

	#[test]
	fn replace_rebuilds_adjacency_and_bumps_generation() {
		let mut model = GraphModel::new();
		model.replace(sample());
		let before = Rc::clone(model.adjacency());
		model.replace(sample());
		assert!(!Rc::ptr_eq(&before, model.adjacency()));
		assert_eq!(model.generation(), 2);
	}

	#[test]
	fn find_by_path_uses_fuzzy_match() {
		let mut model = GraphModel::new();
		model.replace(sample());
		let node = model.find_by_path(r"D:\checkout\src\pkg\B.java").unwrap();
		assert_eq!(node.id, "b");
		assert!(model.find_by_path("/elsewhere/B.java").is_none());
	}

	#[test]
	fn focus_survives_replace_but_resolves_per_generation() {
		let mut model = GraphModel::new();
		model.replace(sample());
		model.set_focus(Some("c".into()));
		assert_eq!(model.focused_index(), Some(2));

		model.replace(GraphData {
			nodes: vec![Node::new("a", "A")],
			links: vec![],
		});
		assert_eq!(model.ui.focused.as_deref(), Some("c"));
		assert_eq!(model.focused_index(), None);
	}
}
