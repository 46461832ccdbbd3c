use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];
const ROOT_COLOR: &str = "#f5c542";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn node_color(idx: usize, group: Option<u32>) -> &'static str {
	if idx == 0 {
		return ROOT_COLOR;
	}
	COLORS[group.unwrap_or(0) as usize % COLORS.len()]
}

/// Draws the scene. Links, nodes and labels share one viewport transform
/// applied to the whole group, never per element.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	if let Some(err) = &state.error {
		draw_placeholder(state, ctx, &err.to_string());
		return;
	}

	let t = &state.viewport.transform;
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	ctx.restore();
}

fn draw_placeholder(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, message: &str) {
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.7)");
	ctx.set_font("14px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text("Unable to draw this network", state.width / 2.0, state.height / 2.0);
	ctx.set_fill_style_str("rgba(255, 120, 120, 0.8)");
	ctx.set_font("11px sans-serif");
	let _ = ctx.fill_text(message, state.width / 2.0, state.height / 2.0 + 20.0);
	ctx.set_text_align("start");
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let scene = &state.scene;
	let k = state.viewport.transform.k;
	let t = ease_out_cubic(scene.hover.highlight_t);

	for link in &scene.links {
		let is_highlighted = scene.is_highlighted(link.source) && scene.is_highlighted(link.target);
		// t=0: every link at 0.6; t=1: highlighted at 0.9, the rest at 0.15
		let (alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 1.5 / k * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 1.5 / k * (1.0 - 0.3 * t))
		};
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", alpha));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(link.x1, link.y1);
		ctx.line_to(link.x2, link.y2);
		ctx.stroke();
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let scene = &state.scene;
	let (has_highlight, t, k) = (
		scene.has_active_highlight(),
		ease_out_cubic(scene.hover.highlight_t),
		state.viewport.transform.k,
	);
	let base = state.config.node_radius;

	for (idx, prim) in scene.nodes.iter().enumerate() {
		let (x, y) = (prim.x, prim.y);
		let color = node_color(idx, prim.node.group);
		let lit = has_highlight && scene.is_highlighted(idx);

		let (alpha, radius) = if !has_highlight || lit {
			let grow = if scene.is_hovered(idx) { 0.2 * t } else { 0.0 };
			(1.0, base * (1.0 + grow))
		} else {
			(1.0 - 0.7 * t, base * (1.0 - 0.15 * t))
		};

		if lit && scene.is_hovered(idx) && t > 0.01 {
			let glow = base * (1.4 + 0.6 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow) {
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", 0.3 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(color);
		ctx.fill();
		if idx == 0 {
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}
		ctx.set_global_alpha(1.0);
	}
}

fn draw_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.viewport.transform.k;
	let offset = state.config.node_radius + 12.0;
	ctx.set_text_align("center");
	ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
	for label in &state.scene.labels {
		let _ = ctx.fill_text(&label.text, label.x, label.y + offset);
	}
	ctx.set_text_align("start");
}
