use std::collections::HashMap;
use std::rc::Rc;

use log::info;

use crate::config::GraphConfig;

use super::hit::{HitDisc, HitLayer};
use super::layout::{Bounds, Layout, Point};
use super::style::{Palette, node_radius};
use super::transform::{CollapsedSet, Projection, VisibleGraph, default_collapsed};
use super::types::{NetworkData, NodeId, ReferralNode};

/// Graph-to-screen mapping: `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal screen offset.
	pub x: f64,
	/// Vertical screen offset.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Eased camera move between two transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraTween {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

impl CameraTween {
	pub fn target(&self) -> ViewTransform {
		self.to
	}

	/// Advance and return the transform to show plus whether the move is over.
	fn advance(&mut self, dt: f64) -> (ViewTransform, bool) {
		self.elapsed += dt;
		if self.duration <= 0.0 || self.elapsed >= self.duration {
			return (self.to, true);
		}
		(self.from.lerp(&self.to, ease_out_cubic(self.elapsed / self.duration)), false)
	}
}

/// Everything one graph instance owns between frames.
pub struct NetworkState {
	projection: Projection,
	node_index: HashMap<NodeId, usize>,
	pub(super) collapsed: CollapsedSet,
	visible: Rc<VisibleGraph>,
	/// Layout of the visible graph.
	pub layout: Layout,
	/// Current camera.
	pub transform: ViewTransform,
	pub(super) camera: Option<CameraTween>,
	pub(super) pan: PanState,
	/// Node under the pointer.
	pub hover: Option<NodeId>,
	/// Node shown in the detail panel.
	pub selected: Option<NodeId>,
	/// Mirrors the document fullscreen state; picks the palette.
	pub fullscreen: bool,
	/// Canvas width in CSS pixels.
	pub width: f64,
	/// Canvas height in CSS pixels.
	pub height: f64,
	hit: HitLayer,
	hit_dirty: bool,
	pub(super) refit_in: Option<f64>,
	repaint: bool,
	pub(super) config: GraphConfig,
}

impl NetworkState {
	/// State for `data` with the default collapse policy applied and the layout started.
	pub fn new(data: Rc<NetworkData>, width: f64, height: f64, config: GraphConfig) -> Self {
		let mut projection = Projection::new(data.clone());
		let collapsed = default_collapsed(&data.nodes, &config.collapse);
		let visible = projection.visible(&collapsed);
		let layout = Layout::new(&visible, &HashMap::new(), config.layout.clone());
		info!(
			"network loaded: {} nodes, {} collapsed, {} visible",
			data.nodes.len(),
			collapsed.len(),
			visible.nodes.len()
		);

		Self {
			node_index: index_nodes(&data.nodes),
			projection,
			collapsed,
			visible,
			layout,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			camera: None,
			pan: PanState::default(),
			hover: None,
			selected: None,
			fullscreen: false,
			width,
			height,
			hit: HitLayer::new(width, height),
			hit_dirty: true,
			refit_in: None,
			repaint: true,
			config,
		}
	}

	/// Swap in freshly fetched data. The default collapse policy is applied
	/// again and the layout starts over.
	pub fn set_data(&mut self, data: Rc<NetworkData>) {
		if self.projection.is_source(&data) || *self.data() == *data {
			return;
		}
		let (width, height, fullscreen, transform) = (self.width, self.height, self.fullscreen, self.transform);
		let config = self.config.clone();
		*self = Self::new(data, width, height, config);
		self.fullscreen = fullscreen;
		self.transform = transform;
	}

	/// The full network.
	pub fn data(&self) -> &NetworkData {
		self.projection.data()
	}

	/// True when the network has no nodes.
	pub fn is_empty(&self) -> bool {
		self.data().is_empty()
	}

	/// The part of the network currently drawn.
	pub fn visible(&self) -> &VisibleGraph {
		&self.visible
	}

	/// Any node of the full network by id.
	pub fn node(&self, id: NodeId) -> Option<&ReferralNode> {
		self.node_index.get(&id).and_then(|&i| self.data().nodes.get(i))
	}

	/// Ids whose subtrees are hidden.
	pub fn collapsed(&self) -> &CollapsedSet {
		&self.collapsed
	}

	/// True if `id` is collapsed.
	pub fn is_collapsed(&self, id: NodeId) -> bool {
		self.collapsed.contains(id)
	}

	/// True if clicking `id` toggles its subtree.
	pub fn is_collapsible(&self, id: NodeId) -> bool {
		self.node(id).is_some_and(|n| self.projection.is_collapsible(n))
	}

	/// True once the layout settled.
	pub fn layout_ready(&self) -> bool {
		self.layout.is_ready()
	}

	/// Colors for the current fullscreen state.
	pub fn palette(&self) -> Palette {
		Palette::for_fullscreen(self.fullscreen)
	}

	/// Ask for a repaint on the next frame.
	pub fn request_repaint(&mut self) {
		self.repaint = true;
	}

	/// Whether a repaint was requested since the last call.
	pub fn take_repaint(&mut self) -> bool {
		std::mem::take(&mut self.repaint)
	}

	/// Recompute the visible graph after the collapsed set changed and restart
	/// the layout from the current positions if the node set moved.
	pub(super) fn refresh_visible(&mut self) {
		let visible = self.projection.visible(&self.collapsed);
		if Rc::ptr_eq(&visible, &self.visible) {
			return;
		}
		self.layout = Layout::new(&visible, self.layout.positions(), self.config.layout.clone());
		self.visible = visible;
		if self.hover.is_some_and(|id| !self.visible.contains(id)) {
			self.hover = None;
		}
		if self.selected.is_some_and(|id| self.visible.hidden.contains(&id)) {
			self.selected = None;
		}
		self.mark_moved();
	}

	fn mark_moved(&mut self) {
		self.hit_dirty = true;
		self.repaint = true;
	}

	/// Advance layout, camera and pending re-fit by one frame of `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		if !self.layout.is_ready() {
			if self.layout.step_frame() {
				self.fit_view(self.config.camera.fit_duration);
			}
			self.mark_moved();
		}

		if let Some(tween) = self.camera.as_mut() {
			let (transform, done) = tween.advance(dt);
			self.transform = transform;
			if done {
				self.camera = None;
			}
			self.mark_moved();
		}

		if let Some(left) = self.refit_in.as_mut() {
			*left -= dt;
			if *left <= 0.0 {
				self.refit_in = None;
				self.fit_view(self.config.camera.fit_duration);
			}
		}
	}

	/// New canvas size in CSS pixels.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.hit.resize(width, height);
		self.mark_moved();
	}

	/// Screen point to graph space.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Graph point to screen space.
	pub fn graph_to_screen(&self, p: Point) -> (f64, f64) {
		(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	/// Jump straight to `target`, dropping any running camera move.
	pub fn set_transform(&mut self, target: ViewTransform) {
		self.camera = None;
		self.transform = target;
		self.mark_moved();
	}

	/// Ease the camera to `target` over `duration` seconds.
	pub fn animate_to(&mut self, target: ViewTransform, duration: f64) {
		let target = ViewTransform {
			k: self.clamp_zoom(target.k),
			..target
		};
		self.camera = Some(CameraTween {
			from: self.transform,
			to: target,
			elapsed: 0.0,
			duration,
		});
		self.repaint = true;
	}

	pub(super) fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.config.camera.min_zoom, self.config.camera.max_zoom)
	}

	/// Transform that frames every visible node with padding.
	pub fn fit_target(&self) -> Option<ViewTransform> {
		let bounds = self.layout.bounds()?;
		Some(fit_transform(
			&bounds,
			self.width,
			self.height,
			self.config.camera.fit_padding,
			(self.config.camera.min_zoom, self.config.camera.max_zoom),
		))
	}

	/// Ease the camera to frame every visible node.
	pub fn fit_view(&mut self, duration: f64) {
		if let Some(target) = self.fit_target() {
			self.animate_to(target, duration);
		}
	}

	/// Node whose disc is under the given screen point.
	pub fn node_at_position(&mut self, sx: f64, sy: f64) -> Option<NodeId> {
		if self.hit_dirty {
			let discs: Vec<HitDisc> = self
				.visible
				.nodes
				.iter()
				.filter_map(|node| {
					let p = self.layout.position(node.id)?;
					let (x, y) = self.graph_to_screen(p);
					Some(HitDisc {
						id: node.id,
						x,
						y,
						radius: node_radius(node) * self.transform.k,
					})
				})
				.collect();
			self.hit.paint(discs);
			self.hit_dirty = false;
		}
		self.hit.pick(sx, sy)
	}
}

fn index_nodes(nodes: &[ReferralNode]) -> HashMap<NodeId, usize> {
	nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect()
}

pub fn fit_transform(bounds: &Bounds, width: f64, height: f64, padding: f64, zoom: (f64, f64)) -> ViewTransform {
	let avail_w = (width - 2.0 * padding).max(1.0);
	let avail_h = (height - 2.0 * padding).max(1.0);
	let k = (avail_w / bounds.width().max(1.0))
		.min(avail_h / bounds.height().max(1.0))
		.clamp(zoom.0, zoom.1);
	let c = bounds.center();
	ViewTransform {
		x: width / 2.0 - c.x * k,
		y: height / 2.0 - c.y * k,
		k,
	}
}
