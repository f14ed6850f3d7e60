use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::layout::Point;
use super::state::{NetworkState, ViewTransform};
use super::style::{
	COLLAPSED_COLOR, EXPANDED_COLOR, LABEL_MIN_SCREEN_RADIUS, Palette, RING_WIDTH, label_font_size, node_color,
	node_radius,
};
use super::types::ReferralNode;

const ARROW_LENGTH: f64 = 6.0;
const ARROW_PADDING: f64 = 2.0;
const EDGE_WIDTH: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Baseline {
	Top,
	Middle,
	Bottom,
}

impl Baseline {
	fn as_str(self) -> &'static str {
		match self {
			Baseline::Top => "top",
			Baseline::Middle => "middle",
			Baseline::Bottom => "bottom",
		}
	}
}

/// The 2D drawing calls the renderer needs.
pub trait Surface {
	fn clear(&self, color: &str, width: f64, height: f64);
	fn push_transform(&self, transform: &ViewTransform);
	fn pop_transform(&self);
	fn stroke_circle(&self, x: f64, y: f64, radius: f64, color: &str, line_width: f64);
	fn stroke_line(&self, from: Point, to: Point, color: &str, line_width: f64);
	fn fill_triangle(&self, points: [Point; 3], color: &str);
	fn fill_text(&self, text: &str, x: f64, y: f64, font: &str, color: &str, baseline: Baseline);
}

impl Surface for CanvasRenderingContext2d {
	fn clear(&self, color: &str, width: f64, height: f64) {
		self.clear_rect(0.0, 0.0, width, height);
		self.set_fill_style_str(color);
		self.fill_rect(0.0, 0.0, width, height);
	}

	fn push_transform(&self, transform: &ViewTransform) {
		self.save();
		let _ = self.translate(transform.x, transform.y);
		let _ = self.scale(transform.k, transform.k);
	}

	fn pop_transform(&self) {
		self.restore();
	}

	fn stroke_circle(&self, x: f64, y: f64, radius: f64, color: &str, line_width: f64) {
		self.begin_path();
		let _ = self.arc(x, y, radius, 0.0, 2.0 * PI);
		self.set_stroke_style_str(color);
		self.set_line_width(line_width);
		self.stroke();
	}

	fn stroke_line(&self, from: Point, to: Point, color: &str, line_width: f64) {
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.set_stroke_style_str(color);
		self.set_line_width(line_width);
		self.stroke();
	}

	fn fill_triangle(&self, [a, b, c]: [Point; 3], color: &str) {
		self.begin_path();
		self.move_to(a.x, a.y);
		self.line_to(b.x, b.y);
		self.line_to(c.x, c.y);
		self.close_path();
		self.set_fill_style_str(color);
		self.fill();
	}

	fn fill_text(&self, text: &str, x: f64, y: f64, font: &str, color: &str, baseline: Baseline) {
		self.set_font(font);
		self.set_fill_style_str(color);
		self.set_text_align("center");
		self.set_text_baseline(baseline.as_str());
		let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
	}
}

/// A directed edge trimmed to the node borders, with its arrowhead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeGeometry {
	pub start: Point,
	pub end: Point,
	pub arrow: [Point; 3],
}

/// `None` when an endpoint is not a finite position or both coincide.
pub fn edge_geometry(from: Point, from_radius: f64, to: Point, to_radius: f64, k: f64) -> Option<EdgeGeometry> {
	if !(from.is_finite() && to.is_finite()) {
		return None;
	}
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 1e-9 {
		return None;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (arrow, padding) = (ARROW_LENGTH / k, ARROW_PADDING / k);
	let start = Point::new(from.x + ux * from_radius, from.y + uy * from_radius);
	let end = Point::new(to.x - ux * (to_radius + padding), to.y - uy * (to_radius + padding));
	let angle = uy.atan2(ux);
	let wing = |offset: f64| {
		Point::new(
			end.x - arrow * (angle + offset).cos(),
			end.y - arrow * (angle + offset).sin(),
		)
	};
	Some(EdgeGeometry {
		start,
		end,
		arrow: [end, wing(-PI / 6.0), wing(PI / 6.0)],
	})
}

pub fn render<S: Surface>(state: &NetworkState, surface: &S) {
	let palette = state.palette();
	surface.clear(palette.background, state.width, state.height);
	if state.is_empty() {
		return;
	}
	surface.push_transform(&state.transform);
	draw_edges(state, surface, &palette);
	draw_nodes(state, surface, &palette);
	surface.pop_transform();
}

fn draw_edges<S: Surface>(state: &NetworkState, surface: &S, palette: &Palette) {
	let k = state.transform.k;
	let visible = state.visible();
	for link in &visible.links {
		let (Some(source), Some(target)) = (state.node(link.source), state.node(link.target)) else {
			continue;
		};
		let (Some(from), Some(to)) = (state.layout.position(source.id), state.layout.position(target.id)) else {
			continue;
		};
		let Some(edge) = edge_geometry(from, node_radius(source), to, node_radius(target), k) else {
			continue;
		};
		surface.stroke_line(edge.start, edge.end, palette.edge, EDGE_WIDTH / k);
		surface.fill_triangle(edge.arrow, palette.edge);
	}
}

fn draw_nodes<S: Surface>(state: &NetworkState, surface: &S, palette: &Palette) {
	let k = state.transform.k;
	for node in &state.visible().nodes {
		let Some(p) = state.layout.position(node.id) else {
			continue;
		};
		let r = node_radius(node);
		surface.stroke_circle(p.x, p.y, r, node_color(node), RING_WIDTH / k);
		if r * k < LABEL_MIN_SCREEN_RADIUS {
			continue;
		}
		draw_label(state, surface, palette, node, p, r);
	}
}

fn draw_label<S: Surface>(
	state: &NetworkState,
	surface: &S,
	palette: &Palette,
	node: &ReferralNode,
	p: Point,
	r: f64,
) {
	let size = label_font_size(r);
	let (bold, plain) = (format!("bold {size}px Sans-Serif"), format!("{size}px Sans-Serif"));

	surface.fill_text(node.first_given_name(), p.x, p.y - size * 0.1, &bold, palette.label, Baseline::Bottom);
	surface.fill_text(node.first_family_name(), p.x, p.y + size * 0.1, &plain, palette.label, Baseline::Top);
	surface.fill_text(
		&format!("({})", node.referrals_count),
		p.x,
		p.y + size * 1.3,
		&bold,
		palette.label,
		Baseline::Top,
	);

	if state.is_collapsible(node.id) {
		let (glyph, color) = if state.is_collapsed(node.id) {
			("+", COLLAPSED_COLOR)
		} else {
			("\u{2212}", EXPANDED_COLOR)
		};
		surface.fill_text(glyph, p.x, p.y + size * 2.5, &bold, color, Baseline::Top);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use super::super::state::tests::settled;
	use super::super::types::fixtures::tree;
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	enum Call {
		Clear(String),
		Push,
		Pop,
		Circle { color: String },
		Line,
		Triangle,
		Text { text: String, color: String },
	}

	#[derive(Default)]
	struct Recorder {
		calls: RefCell<Vec<Call>>,
	}

	impl Recorder {
		fn texts(&self) -> Vec<String> {
			self.calls
				.borrow()
				.iter()
				.filter_map(|c| match c {
					Call::Text { text, .. } => Some(text.clone()),
					_ => None,
				})
				.collect()
		}

		fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
			self.calls.borrow().iter().filter(|c| pred(c)).count()
		}
	}

	impl Surface for Recorder {
		fn clear(&self, color: &str, _: f64, _: f64) {
			self.calls.borrow_mut().push(Call::Clear(color.into()));
		}
		fn push_transform(&self, _: &ViewTransform) {
			self.calls.borrow_mut().push(Call::Push);
		}
		fn pop_transform(&self) {
			self.calls.borrow_mut().push(Call::Pop);
		}
		fn stroke_circle(&self, _: f64, _: f64, _: f64, color: &str, _: f64) {
			self.calls.borrow_mut().push(Call::Circle { color: color.into() });
		}
		fn stroke_line(&self, _: Point, _: Point, _: &str, _: f64) {
			self.calls.borrow_mut().push(Call::Line);
		}
		fn fill_triangle(&self, _: [Point; 3], _: &str) {
			self.calls.borrow_mut().push(Call::Triangle);
		}
		fn fill_text(&self, text: &str, _: f64, _: f64, _: &str, color: &str, _: Baseline) {
			self.calls.borrow_mut().push(Call::Text {
				text: text.into(),
				color: color.into(),
			});
		}
	}

	#[test]
	fn edge_is_trimmed_to_borders() {
		let edge = edge_geometry(Point::new(0.0, 0.0), 20.0, Point::new(100.0, 0.0), 30.0, 1.0).unwrap();
		assert_eq!(edge.start, Point::new(20.0, 0.0));
		assert_eq!(edge.end, Point::new(68.0, 0.0));
		assert_eq!(edge.arrow[0], edge.end);
		for wing in &edge.arrow[1..] {
			assert!(wing.x < edge.end.x);
			assert!((((wing.x - edge.end.x).powi(2) + (wing.y - edge.end.y).powi(2)).sqrt() - 6.0).abs() < 1e-9);
		}
		assert!(edge.arrow[1].y * edge.arrow[2].y < 0.0);
	}

	#[test]
	fn arrow_scales_with_zoom() {
		let edge = edge_geometry(Point::new(0.0, 0.0), 10.0, Point::new(0.0, 100.0), 10.0, 2.0).unwrap();
		assert_eq!(edge.end, Point::new(0.0, 89.0));
		let wing = edge.arrow[1];
		assert!((((wing.x).powi(2) + (wing.y - 89.0).powi(2)).sqrt() - 3.0).abs() < 1e-9);
	}

	#[test]
	fn unresolved_or_coincident_edges_are_skipped() {
		let origin = Point::new(0.0, 0.0);
		assert!(edge_geometry(Point::new(f64::NAN, 0.0), 10.0, origin, 10.0, 1.0).is_none());
		assert!(edge_geometry(origin, 10.0, origin, 10.0, 1.0).is_none());
	}

	#[test]
	fn draws_every_visible_node_and_edge() {
		let mut state = settled(tree());
		state.transform.k = 1.0;
		let rec = Recorder::default();
		render(&state, &rec);
		let visible = state.visible();
		assert_eq!(rec.count(|c| matches!(c, Call::Circle { .. })), visible.nodes.len());
		assert_eq!(rec.count(|c| matches!(c, Call::Line)), visible.links.len());
		assert_eq!(rec.count(|c| matches!(c, Call::Triangle)), visible.links.len());
		assert_eq!(rec.calls.borrow()[0], Call::Clear(Palette::LIGHT.background.into()));
	}

	#[test]
	fn labels_only_when_legible() {
		let mut state = settled(tree());
		state.transform.k = 1.0;
		let rec = Recorder::default();
		render(&state, &rec);
		let texts = rec.texts();
		assert!(texts.contains(&"Ana1".to_string()));
		assert!(texts.contains(&"Perez1".to_string()));
		assert!(texts.contains(&"(2)".to_string()));

		state.transform.k = 0.5;
		let rec = Recorder::default();
		render(&state, &rec);
		assert!(rec.texts().is_empty());
		assert_eq!(rec.count(|c| matches!(c, Call::Circle { .. })), state.visible().nodes.len());
	}

	#[test]
	fn collapse_glyph_reflects_state() {
		let mut state = settled(tree());
		state.transform.k = 1.0;
		let rec = Recorder::default();
		render(&state, &rec);
		let glyphs: Vec<_> = rec
			.calls
			.borrow()
			.iter()
			.filter_map(|c| match c {
				Call::Text { text, color } if text == "+" || text == "\u{2212}" => Some((text.clone(), color.clone())),
				_ => None,
			})
			.collect();
		// 2 and 3 are expanded, 4 is collapsed by default.
		assert_eq!(glyphs.len(), 3);
		assert_eq!(glyphs.iter().filter(|(t, _)| t == "+").count(), 1);
		assert!(glyphs.iter().all(|(t, c)| (t == "+") == (c == COLLAPSED_COLOR)));
	}

	#[test]
	fn dark_palette_in_fullscreen() {
		let mut state = settled(tree());
		state.set_fullscreen(true);
		let rec = Recorder::default();
		render(&state, &rec);
		assert_eq!(rec.calls.borrow()[0], Call::Clear(Palette::DARK.background.into()));
	}

	#[test]
	fn empty_network_only_clears() {
		let state = settled(Default::default());
		let rec = Recorder::default();
		render(&state, &rec);
		assert_eq!(*rec.calls.borrow(), vec![Call::Clear(Palette::LIGHT.background.into())]);
	}
}
