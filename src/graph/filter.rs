use std::collections::HashSet;

use crate::visual::Controls;

use super::model::GraphModel;
use super::query::SearchQuery;

/// Node and edge positions that survive the current controls, in model order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleSet {
	/// Visible node indices.
	pub nodes: Vec<usize>,
	/// Visible edge indices; both endpoints are always visible.
	pub edges: Vec<usize>,
}

/// Applies type filters, isolated-node hiding and the search query.
pub fn visible_set(model: &GraphModel, controls: &Controls) -> VisibleSet {
	let query = SearchQuery::parse(&controls.search);

	let nodes: Vec<usize> = model
		.nodes()
		.iter()
		.enumerate()
		.filter(|(_, node)| controls.shows_node_type(node.kind.as_str()))
		.filter(|(index, _)| !controls.hide_isolated_nodes || !model.neighbors(*index).is_empty())
		.filter(|(_, node)| query.matches(node))
		.map(|(index, _)| index)
		.collect();

	let shown: HashSet<usize> = nodes.iter().copied().collect();
	let edges = model
		.edges()
		.iter()
		.enumerate()
		.filter(|(_, edge)| controls.shows_edge_type(edge.kind.as_str()))
		.filter(|(index, _)| {
			model
				.endpoints(*index)
				.is_some_and(|(a, b)| shown.contains(&a) && shown.contains(&b))
		})
		.map(|(index, _)| index)
		.collect();

	VisibleSet { nodes, edges }
}
