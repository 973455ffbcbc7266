use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use crate::render::{LinkStyle, NodeStyle, Vec3};

use super::scene::OrbitScene;
use super::state::ForceCanvas;

/// Particle travel speed, edge lengths per second.
const PARTICLE_SPEED: f64 = 0.4;

fn draw_arrow(ctx: &CanvasRenderingContext2d, tip: (f64, f64), dir: (f64, f64), size: f64) {
	if size <= 0.0 {
		return;
	}
	let (ux, uy) = dir;
	let (back_x, back_y) = (tip.0 - ux * size, tip.1 - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip.0, tip.1);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

/// Straight edge between two circles, with arrow head and travelling particles.
fn draw_link(
	ctx: &CanvasRenderingContext2d,
	style: &LinkStyle,
	from: (f64, f64, f64),
	to: (f64, f64, f64),
	arrow: f64,
	flow_time: f64,
) {
	let (x1, y1, r1) = from;
	let (x2, y2, r2) = to;
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);

	ctx.set_stroke_style_str(&style.color);
	ctx.set_fill_style_str(&style.color);
	ctx.set_line_width(style.width);
	ctx.begin_path();
	ctx.move_to(x1 + ux * r1, y1 + uy * r1);
	ctx.line_to(x2 - ux * (r2 + arrow), y2 - uy * (r2 + arrow));
	ctx.stroke();
	draw_arrow(ctx, (x2 - ux * r2, y2 - uy * r2), (ux, uy), arrow);

	let radius = (style.width * 2.0).max(1.0);
	for p in 0..style.particles {
		let t = (flow_time * PARTICLE_SPEED + p as f64 / style.particles as f64).fract();
		ctx.begin_path();
		let _ = ctx.arc(x1 + dx * t, y1 + dy * t, radius, 0.0, 2.0 * PI);
		ctx.fill();
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, style: &NodeStyle, x: f64, y: f64, radius: f64) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&style.color);
	ctx.fill();
}

fn draw_label(ctx: &CanvasRenderingContext2d, style: &NodeStyle, x: f64, y: f64, font_scale: f64) {
	let Some(label) = &style.label else {
		return;
	};
	ctx.set_fill_style_str(&label.color);
	ctx.set_font(&format!("{}px sans-serif", label.font_px * font_scale));
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&label.text, x, y);
}

/// Draws the 2D backend: edges first, each node followed by its label.
pub fn render_canvas(state: &ForceCanvas, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&state.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	state.graph.visit_edges(|n1, n2, edge| {
		let Some(style) = state.link_style(edge.user_data) else {
			return;
		};
		let radius = |index| state.node_style(index).map_or(0.0, |node| node.size);
		draw_link(
			ctx,
			&style,
			(n1.x() as f64, n1.y() as f64, radius(n1.data.user_data.index)),
			(n2.x() as f64, n2.y() as f64, radius(n2.data.user_data.index)),
			state.arrow_length,
			state.flow_time,
		);
	});

	// label size stays readable when zoomed out
	let font_scale = 1.0 / state.transform.k.max(0.5);
	state.graph.visit_nodes(|node| {
		let Some(style) = state.node_style(node.data.user_data.index) else {
			return;
		};
		let (x, y) = (node.x() as f64, node.y() as f64);
		draw_node(ctx, &style, x, y, style.size);
		if let Some(label) = &style.label {
			let (lx, ly) = (x + label.offset.x, y + style.size + label.font_px * font_scale);
			draw_label(ctx, &style, lx, ly, font_scale);
		}
	});
	ctx.restore();
}

/// Draws the 3D backend back to front.
pub fn render_scene(scene: &OrbitScene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&scene.background);
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);

	let projected: Vec<_> = scene
		.nodes
		.iter()
		.map(|node| {
			let style = scene.node_style(node.index)?;
			let point = scene.project(node.position)?;
			Some((style, point))
		})
		.collect();

	for link in &scene.links {
		let (Some((source_style, a)), Some((target_style, b))) =
			(&projected[link.source], &projected[link.target])
		else {
			continue;
		};
		let Some(mut style) = scene.link_style(link.index) else {
			continue;
		};
		let depth_scale = (a.scale + b.scale) / 2.0;
		style.width = (style.width * depth_scale).max(0.5);
		draw_link(
			ctx,
			&style,
			(a.x, a.y, source_style.size * a.scale),
			(b.x, b.y, target_style.size * b.scale),
			scene.arrow_length * depth_scale,
			scene.flow_time,
		);
	}

	let mut order: Vec<usize> = (0..scene.nodes.len())
		.filter(|&slot| projected[slot].is_some())
		.collect();
	order.sort_by(|&a, &b| {
		let depth = |slot: usize| projected[slot].as_ref().map_or(0.0, |(_, p)| p.depth);
		depth(b).total_cmp(&depth(a))
	});

	for slot in order {
		let Some((style, point)) = &projected[slot] else {
			continue;
		};
		draw_node(ctx, style, point.x, point.y, (style.size * point.scale).max(1.0));
		if let Some(label) = &style.label {
			let anchor = scene.nodes[slot].position - Vec3::new(0.0, style.size, 0.0) + label.offset;
			if let Some(at) = scene.project(anchor) {
				draw_label(ctx, style, at.x, at.y, (at.scale * 0.5).clamp(0.5, 1.5));
			}
		}
	}
}
