use std::collections::{HashSet, VecDeque};

use super::model::GraphModel;
use super::types::LinkKey;

/// Direction a dependency slice follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceDirection {
	/// From a node to what it depends on (source to target).
	Forward,
	/// From a node to what depends on it (target to source).
	Backward,
}

/// Edges reachable from node `start` within `depth` hops in `direction`.
///
/// Edges are followed along their declared direction even though the model's
/// adjacency is undirected.
pub fn slice_edges(
	model: &GraphModel,
	start: usize,
	direction: SliceDirection,
	depth: u32,
) -> HashSet<LinkKey> {
	let mut edges = HashSet::new();
	let mut visited = HashSet::from([start]);
	let mut queue = VecDeque::from([(start, 0u32)]);

	while let Some((index, hops)) = queue.pop_front() {
		if hops >= depth {
			continue;
		}
		for &edge_index in model.incident_edges(index) {
			let Some((source, target)) = model.endpoints(edge_index) else {
				continue;
			};
			let next = match direction {
				SliceDirection::Forward if source == index => target,
				SliceDirection::Backward if target == index => source,
				_ => continue,
			};
			edges.insert(model.edges()[edge_index].key());
			if visited.insert(next) {
				queue.push_back((next, hops + 1));
			}
		}
	}
	edges
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, EdgeKind, GraphData, Node};

	fn chain() -> GraphModel {
		let mut model = GraphModel::new();
		model.replace(GraphData {
			nodes: ["a", "b", "c", "d"].map(|id| Node::new(id, id)).to_vec(),
			links: vec![
				Edge::new("a", "b", EdgeKind::MethodCall),
				Edge::new("b", "c", EdgeKind::MethodCall),
				Edge::new("c", "d", EdgeKind::MethodCall),
			],
		});
		model
	}

	#[test]
	fn forward_slice_respects_depth() {
		let model = chain();
		let edges = slice_edges(&model, 0, SliceDirection::Forward, 2);
		assert_eq!(edges, HashSet::from([LinkKey::new("a", "b"), LinkKey::new("b", "c")]));
	}

	#[test]
	fn backward_slice_follows_reverse_edges() {
		let model = chain();
		let edges = slice_edges(&model, 2, SliceDirection::Backward, 5);
		assert_eq!(edges, HashSet::from([LinkKey::new("a", "b"), LinkKey::new("b", "c")]));
		assert!(slice_edges(&model, 0, SliceDirection::Backward, 5).is_empty());
	}

	#[test]
	fn zero_depth_is_empty() {
		assert!(slice_edges(&chain(), 1, SliceDirection::Forward, 0).is_empty());
	}
}
