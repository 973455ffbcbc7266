//! Rule-based visual property resolution.
//!
//! Each entity starts from defaults, then every rule in list order may return a
//! patch whose set fields overwrite the accumulated record. The focus pass runs
//! after the rule loop so dimming always wins over rule-derived opacity. Rules are
//! plain functions and never mutate the entity.

use std::collections::HashSet;

use crate::graph::{Edge, EdgeKind, GraphModel, Node};

use super::controls::Controls;

/// Opacity factor for nodes outside the focus neighbourhood.
pub const FOCUS_NODE_DIM: f64 = 0.2;
/// Opacity factor for edges not touching the focused node.
pub const FOCUS_EDGE_DIM: f64 = 0.1;
/// Particle count on edges touching the focused node.
pub const FOCUS_EDGE_PARTICLES: u32 = 3;
/// Width factor on edges touching the focused node.
pub const FOCUS_EDGE_WIDTH: f64 = 1.5;

/// Partial node record returned by a rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
	/// Fill colour.
	pub color: Option<String>,
	/// Factor on the base node size.
	pub size_multiplier: Option<f64>,
	/// Opacity in `0..=1`.
	pub opacity: Option<f64>,
	/// Label text.
	pub label: Option<String>,
}

/// Partial edge record returned by a rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgePatch {
	/// Stroke colour.
	pub color: Option<String>,
	/// Factor on the base link width.
	pub width_multiplier: Option<f64>,
	/// Directional particles travelling along the edge.
	pub particles: Option<u32>,
	/// Opacity in `0..=1`.
	pub opacity: Option<f64>,
}

/// Resolved node properties for one render pass.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisuals {
	pub color: String,
	pub size_multiplier: f64,
	pub opacity: f64,
	pub label: String,
	/// `size_multiplier * controls.node_size`.
	pub size: f64,
}

/// Resolved edge properties for one render pass.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeVisuals {
	pub color: String,
	pub width_multiplier: f64,
	pub particles: u32,
	pub opacity: f64,
	pub arrow_size: f64,
	/// `width_multiplier * controls.link_width`.
	pub width: f64,
}

/// Inputs every rule can read.
pub struct RuleContext<'a> {
	/// Model being styled.
	pub model: &'a GraphModel,
	/// Current controls snapshot.
	pub controls: &'a Controls,
	focus: Option<FocusScope>,
}

struct FocusScope {
	index: usize,
	neighbors: HashSet<usize>,
}

impl<'a> RuleContext<'a> {
	/// Context for the model's current generation and focus.
	pub fn new(model: &'a GraphModel, controls: &'a Controls) -> Self {
		let focus = model.focused_index().map(|index| FocusScope {
			index,
			neighbors: model.neighbors(index).iter().copied().collect(),
		});
		Self {
			model,
			controls,
			focus,
		}
	}

	/// Index of the focused node in this generation.
	pub fn focused(&self) -> Option<usize> {
		self.focus.as_ref().map(|scope| scope.index)
	}
}

/// Node rule: `None` means "no opinion".
pub type NodeRule = fn(&Node, &RuleContext<'_>) -> Option<NodePatch>;
/// Edge rule: `None` means "no opinion".
pub type EdgeRule = fn(&Edge, &RuleContext<'_>) -> Option<EdgePatch>;

fn type_color(node: &Node, ctx: &RuleContext<'_>) -> Option<NodePatch> {
	let color = ctx.controls.type_colors.node.get(node.kind.as_str())?;
	(!color.is_empty()).then(|| NodePatch {
		color: Some(color.clone()),
		..NodePatch::default()
	})
}

fn size_by_loc(node: &Node, ctx: &RuleContext<'_>) -> Option<NodePatch> {
	let loc = node.lines_of_code.filter(|&loc| loc > 0)?;
	ctx.controls.node_size_by_loc.then(|| NodePatch {
		size_multiplier: Some(f64::from(loc).powf(0.7).max(1.0)),
		..NodePatch::default()
	})
}

fn edge_type_color(edge: &Edge, ctx: &RuleContext<'_>) -> Option<EdgePatch> {
	let color = ctx.controls.type_colors.edge.get(edge.kind.as_str())?;
	(!color.is_empty()).then(|| EdgePatch {
		color: Some(color.clone()),
		..EdgePatch::default()
	})
}

fn stack_trace(edge: &Edge, ctx: &RuleContext<'_>) -> Option<EdgePatch> {
	let overlay = edge.is_stack_trace_link
		|| edge.kind == EdgeKind::StackTrace
		|| ctx.model.ui.stack_trace_edges.contains(&edge.key());
	overlay.then(|| EdgePatch {
		color: Some(ctx.controls.colors.stack_trace_link.clone()),
		width_multiplier: Some(2.5),
		particles: Some(5),
		opacity: None,
	})
}

fn highlight(edge: &Edge, ctx: &RuleContext<'_>) -> Option<EdgePatch> {
	ctx.model.ui.highlight_edges.contains(&edge.key()).then(|| EdgePatch {
		width_multiplier: Some(2.0),
		particles: Some(4),
		..EdgePatch::default()
	})
}

/// Default node rules, in evaluation order.
pub const NODE_RULES: &[NodeRule] = &[type_color, size_by_loc];
/// Default edge rules, in evaluation order.
pub const EDGE_RULES: &[EdgeRule] = &[edge_type_color, stack_trace, highlight];

/// Label text for `node` under the current controls.
pub fn node_label(node: &Node, controls: &Controls) -> String {
	match node.name.as_deref() {
		None | Some("") => node.id.clone(),
		Some(name) if controls.short_names => {
			name.rsplit_once('.').map_or(name, |(_, short)| short).to_owned()
		}
		Some(name) => name.to_owned(),
	}
}

/// Ordered rule lists plus the fixed focus pass.
#[derive(Clone, Debug)]
pub struct RuleEngine {
	node_rules: Vec<NodeRule>,
	edge_rules: Vec<EdgeRule>,
}

impl Default for RuleEngine {
	fn default() -> Self {
		Self::with_rules(NODE_RULES.to_vec(), EDGE_RULES.to_vec())
	}
}

impl RuleEngine {
	/// Engine with custom rule lists.
	pub fn with_rules(node_rules: Vec<NodeRule>, edge_rules: Vec<EdgeRule>) -> Self {
		Self {
			node_rules,
			edge_rules,
		}
	}

	/// Resolves node `index` of the context's model.
	pub fn node_visuals(&self, index: usize, ctx: &RuleContext<'_>) -> Option<NodeVisuals> {
		let node = ctx.model.nodes().get(index)?;
		let controls = ctx.controls;

		let mut color = controls.colors.node_default.clone();
		let mut size_multiplier = 1.0;
		let mut opacity = controls.node_opacity;
		let mut label = node_label(node, controls);

		for patch in self.node_rules.iter().filter_map(|rule| rule(node, ctx)) {
			color = patch.color.unwrap_or(color);
			size_multiplier = patch.size_multiplier.unwrap_or(size_multiplier);
			opacity = patch.opacity.unwrap_or(opacity);
			label = patch.label.unwrap_or(label);
		}

		if let Some(scope) = &ctx.focus {
			if index != scope.index && !scope.neighbors.contains(&index) {
				opacity *= FOCUS_NODE_DIM;
			}
		}

		Some(NodeVisuals {
			color,
			size_multiplier,
			opacity,
			label,
			size: size_multiplier * controls.node_size,
		})
	}

	/// Resolves edge `index` of the context's model.
	pub fn edge_visuals(&self, index: usize, ctx: &RuleContext<'_>) -> Option<EdgeVisuals> {
		let edge = ctx.model.edges().get(index)?;
		let controls = ctx.controls;

		let mut color = controls.colors.edge_default.clone();
		let mut width_multiplier = 1.0;
		let mut particles = 0;
		let mut opacity = controls.edge_opacity;

		for patch in self.edge_rules.iter().filter_map(|rule| rule(edge, ctx)) {
			color = patch.color.unwrap_or(color);
			width_multiplier = patch.width_multiplier.unwrap_or(width_multiplier);
			particles = patch.particles.unwrap_or(particles);
			opacity = patch.opacity.unwrap_or(opacity);
		}

		if let Some(scope) = &ctx.focus {
			let touches_focus = ctx
				.model
				.endpoints(index)
				.is_some_and(|(a, b)| a == scope.index || b == scope.index);
			if touches_focus {
				particles = FOCUS_EDGE_PARTICLES;
				width_multiplier *= FOCUS_EDGE_WIDTH;
			} else {
				opacity *= FOCUS_EDGE_DIM;
			}
		}

		Some(EdgeVisuals {
			color,
			width_multiplier,
			particles,
			opacity,
			arrow_size: controls.arrow_size,
			width: width_multiplier * controls.link_width,
		})
	}

	/// Resolves every entity of the model once.
	pub fn build_cache(&self, model: &GraphModel, controls: &Controls) -> VisualCache {
		let ctx = RuleContext::new(model, controls);
		VisualCache {
			generation: model.generation(),
			nodes: (0..model.nodes().len())
				.filter_map(|index| self.node_visuals(index, &ctx))
				.collect(),
			edges: (0..model.edges().len())
				.filter_map(|index| self.edge_visuals(index, &ctx))
				.collect(),
		}
	}
}

/// Visual properties of one render pass, valid for a single model generation.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualCache {
	generation: u64,
	nodes: Vec<NodeVisuals>,
	edges: Vec<EdgeVisuals>,
}

impl VisualCache {
	/// Generation the cache was built from.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Node props, or `None` when asked about another generation.
	pub fn node(&self, generation: u64, index: usize) -> Option<&NodeVisuals> {
		(generation == self.generation).then(|| self.nodes.get(index)).flatten()
	}

	/// Edge props, or `None` when asked about another generation.
	pub fn edge(&self, generation: u64, index: usize) -> Option<&EdgeVisuals> {
		(generation == self.generation).then(|| self.edges.get(index)).flatten()
	}

	/// All node props in model order.
	pub fn nodes(&self) -> &[NodeVisuals] {
		&self.nodes
	}

	/// All edge props in model order.
	pub fn edges(&self) -> &[EdgeVisuals] {
		&self.edges
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphData, LinkKey, NodeKind};

	fn model() -> GraphModel {
		let mut model = GraphModel::new();
		model.replace(GraphData {
			nodes: vec![
				Node::new("a", "com.example.A").with_kind(NodeKind::Class),
				Node::new("b", "com.example.B").with_kind(NodeKind::Interface).with_loc(300),
				Node {
					id: "c".into(),
					..Node::default()
				},
			],
			links: vec![
				Edge::new("a", "b", EdgeKind::Implements),
				Edge::new("b", "c", EdgeKind::MethodCall),
			],
		});
		model
	}

	#[test]
	fn labels_shorten_and_fall_back_to_id() {
		let model = model();
		let mut controls = Controls::default();
		assert_eq!(node_label(&model.nodes()[0], &controls), "A");
		assert_eq!(node_label(&model.nodes()[2], &controls), "c");
		controls.short_names = false;
		assert_eq!(node_label(&model.nodes()[0], &controls), "com.example.A");
	}

	#[test]
	fn type_colour_applies_before_defaults_fall_through() {
		let model = model();
		let controls = Controls::default();
		let cache = RuleEngine::default().build_cache(&model, &controls);
		assert_eq!(cache.nodes()[0].color, controls.type_colors.node["Class"]);
		assert_eq!(cache.nodes()[2].color, controls.type_colors.node["Unknown"]);
	}

	#[test]
	fn size_by_loc_scales_size() {
		let model = model();
		let mut controls = Controls::default();
		controls.node_size_by_loc = true;
		let cache = RuleEngine::default().build_cache(&model, &controls);
		let expected = 300f64.powf(0.7);
		assert!((cache.nodes()[1].size_multiplier - expected).abs() < 1e-9);
		assert!((cache.nodes()[1].size - expected * controls.node_size).abs() < 1e-9);
		assert_eq!(cache.nodes()[0].size, controls.node_size);
	}

	#[test]
	fn stack_trace_colour_beats_type_colour_and_highlight_beats_width() {
		let mut model = model();
		let key = LinkKey::new("a", "b");
		model.set_stack_trace_edges([key.clone()].into());
		let controls = Controls::default();
		let engine = RuleEngine::default();

		let edge = engine.build_cache(&model, &controls).edges()[0].clone();
		assert_eq!(edge.color, controls.colors.stack_trace_link);
		assert_eq!(edge.particles, 5);
		assert_eq!(edge.width, 2.5 * controls.link_width);

		model.set_highlight_edges([key].into());
		let edge = engine.build_cache(&model, &controls).edges()[0].clone();
		assert_eq!(edge.color, controls.colors.stack_trace_link);
		assert_eq!(edge.particles, 4);
		assert_eq!(edge.width_multiplier, 2.0);
	}

	#[test]
	fn custom_rules_override_in_order() {
		fn red(_: &Node, _: &RuleContext<'_>) -> Option<NodePatch> {
			Some(NodePatch {
				color: Some("red".into()),
				opacity: Some(0.5),
				..NodePatch::default()
			})
		}
		fn blue(_: &Node, _: &RuleContext<'_>) -> Option<NodePatch> {
			Some(NodePatch {
				color: Some("blue".into()),
				..NodePatch::default()
			})
		}
		let model = model();
		let controls = Controls::default();
		let engine = RuleEngine::with_rules(vec![red, blue], Vec::new());
		let cache = engine.build_cache(&model, &controls);
		let props = &cache.nodes()[0];
		assert_eq!(props.color, "blue");
		assert_eq!(props.opacity, 0.5);
	}

	#[test]
	fn focus_keeps_rule_opacity_for_focus_and_neighbours() {
		fn translucent(_: &Node, _: &RuleContext<'_>) -> Option<NodePatch> {
			Some(NodePatch {
				opacity: Some(0.5),
				..NodePatch::default()
			})
		}
		let mut model = model();
		let controls = Controls::default();
		let engine = RuleEngine::with_rules(vec![translucent], Vec::new());

		let unfocused = engine.build_cache(&model, &controls);
		assert!(unfocused.nodes().iter().all(|props| props.opacity == 0.5));

		model.set_focus(Some("a".into()));
		let focused = engine.build_cache(&model, &controls);
		assert_eq!(focused.nodes()[0].opacity, 0.5);
		assert_eq!(focused.nodes()[1].opacity, 0.5);
		assert!((focused.nodes()[2].opacity - 0.5 * FOCUS_NODE_DIM).abs() < 1e-12);

		model.set_focus(None);
		let cleared = engine.build_cache(&model, &controls);
		assert_eq!(cleared.nodes(), unfocused.nodes());
	}

	#[test]
	fn cache_rejects_other_generations() {
		let model = model();
		let cache = RuleEngine::default().build_cache(&model, &Controls::default());
		assert_eq!(cache.generation(), model.generation());
		assert!(cache.node(model.generation(), 0).is_some());
		assert!(cache.node(model.generation() + 1, 0).is_none());
		assert!(cache.edge(model.generation() - 1, 0).is_none());
	}
}
