//! Layered force layout.
//!
//! `force_graph` integrates repulsion, edge attraction and damping. After each
//! integration step a set of position constraints is applied on top, scaled
//! by a cooling `alpha`: edges relax toward a rest length, nodes sharing a
//! band spread apart within a bounded reach, overlapping discs are separated,
//! and finally every node is pinned to the band of its depth so that referrals
//! always flow top to bottom.

use std::collections::{HashMap, VecDeque};

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, warn};

use crate::config::LayoutConfig;

use super::style::node_radius;
use super::transform::VisibleGraph;
use super::types::NodeId;

/// Position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, grows downward.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// False if either coordinate is NaN or infinite.
	pub fn is_finite(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// Axis-aligned box in graph space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Left edge.
	pub min_x: f64,
	/// Top edge.
	pub min_y: f64,
	/// Right edge.
	pub max_x: f64,
	/// Bottom edge.
	pub max_y: f64,
}

impl Bounds {
	fn around(p: Point, r: f64) -> Self {
		Self {
			min_x: p.x - r,
			min_y: p.y - r,
			max_x: p.x + r,
			max_y: p.y + r,
		}
	}

	fn include(&mut self, other: Bounds) {
		self.min_x = self.min_x.min(other.min_x);
		self.min_y = self.min_y.min(other.min_y);
		self.max_x = self.max_x.max(other.max_x);
		self.max_y = self.max_y.max(other.max_y);
	}

	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	/// Midpoint of the box.
	pub fn center(&self) -> Point {
		Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
	}
}

#[derive(Clone, Debug, Default)]
pub(crate) struct NodeInfo {
	pub id: NodeId,
	pub depth: u32,
	pub radius: f32,
}

/// Snapshot of one node while constraints are applied.
#[derive(Clone, Copy, Debug)]
struct Body {
	id: NodeId,
	x: f32,
	y: f32,
	depth: u32,
	radius: f32,
}

/// Running or settled layout of one visible graph.
pub struct Layout {
	graph: ForceGraph<NodeInfo, ()>,
	links: Vec<(NodeId, NodeId)>,
	seeds: HashMap<NodeId, (f32, f32)>,
	positions: HashMap<NodeId, Point>,
	radii: HashMap<NodeId, f64>,
	config: LayoutConfig,
	alpha: f32,
	ticks: u32,
	ready: bool,
}

impl Layout {
	/// Start a simulation for `visible`, keeping `previous` positions for nodes
	/// that were already on screen.
	pub fn new(visible: &VisibleGraph, previous: &HashMap<NodeId, Point>, config: LayoutConfig) -> Self {
		let depths = depths(visible);
		let seeds = seed_positions(visible, &depths, previous, &config);
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: config.charge_strength,
			force_spring: config.spring_strength,
			force_max: config.force_max,
			node_speed: config.node_speed,
			damping_factor: 1.0 - config.velocity_decay,
		});

		let mut index = HashMap::new();
		let mut radii = HashMap::new();
		let mut positions = HashMap::new();
		for node in &visible.nodes {
			let radius = node_radius(node);
			let (x, y) = seeds.get(&node.id).copied().unwrap_or_default();
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id,
					depth: depths.get(&node.id).copied().unwrap_or(0),
					radius: radius as f32,
				},
			});
			index.insert(node.id, idx);
			radii.insert(node.id, radius);
			positions.insert(node.id, Point::new(x as f64, y as f64));
		}

		let mut links = Vec::with_capacity(visible.links.len());
		for link in &visible.links {
			if let (Some(&src), Some(&tgt)) = (index.get(&link.source), index.get(&link.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
				links.push((link.source, link.target));
			}
		}

		debug!(
			"layout restarted with {} nodes, {} links ({} kept positions)",
			visible.nodes.len(),
			links.len(),
			visible.nodes.iter().filter(|n| previous.contains_key(&n.id)).count()
		);

		Self {
			graph,
			links,
			seeds,
			positions,
			radii,
			alpha: 1.0,
			ticks: 0,
			ready: visible.nodes.is_empty(),
			config,
		}
	}

	/// True once the simulation stopped.
	pub fn is_ready(&self) -> bool {
		self.ready
	}

	/// Simulation steps run so far.
	pub fn ticks(&self) -> u32 {
		self.ticks
	}

	/// Current position of `id`, if it has a finite one.
	pub fn position(&self, id: NodeId) -> Option<Point> {
		self.positions.get(&id).copied().filter(Point::is_finite)
	}

	/// Every node position, used to seed the next layout.
	pub fn positions(&self) -> &HashMap<NodeId, Point> {
		&self.positions
	}

	/// Disc radius of `id` in graph units.
	pub fn radius(&self, id: NodeId) -> Option<f64> {
		self.radii.get(&id).copied()
	}

	/// Vertical coordinate of the band for `depth`.
	pub fn band_y(&self, depth: u32) -> f64 {
		(depth as f32 * self.config.level_distance) as f64
	}

	/// Box around every node disc, `None` for an empty graph.
	pub fn bounds(&self) -> Option<Bounds> {
		self.positions
			.iter()
			.filter(|(_, p)| p.is_finite())
			.map(|(id, p)| Bounds::around(*p, self.radii.get(id).copied().unwrap_or(0.0)))
			.reduce(|mut acc, b| {
				acc.include(b);
				acc
			})
	}

	/// Advance by at most one frame's worth of ticks. Returns true on the frame
	/// the layout settles.
	pub fn step_frame(&mut self) -> bool {
		if self.ready {
			return false;
		}
		let (warmup, limit) = (
			self.config.warmup_ticks,
			self.config.warmup_ticks + self.config.cooldown_ticks,
		);
		for _ in 0..self.config.ticks_per_frame.max(1) {
			let moved = self.tick();
			if self.ticks >= limit || (self.ticks >= warmup && moved < self.config.settle_threshold) {
				self.ready = true;
				debug!("layout settled after {} ticks", self.ticks);
				return true;
			}
		}
		false
	}

	/// Run until settled.
	#[cfg(test)]
	pub(crate) fn settle(&mut self) {
		while !self.ready {
			self.step_frame();
		}
	}

	/// One integration step plus constraints; returns the largest displacement.
	fn tick(&mut self) -> f32 {
		self.graph.update(self.config.time_step);

		let mut bodies = Vec::with_capacity(self.positions.len());
		self.graph.visit_nodes(|node| {
			bodies.push(Body {
				id: node.data.user_data.id,
				x: node.x(),
				y: node.y(),
				depth: node.data.user_data.depth,
				radius: node.data.user_data.radius,
			});
		});
		let slot: HashMap<NodeId, usize> = bodies.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

		self.relax_links(&mut bodies, &slot);
		self.spread_bands(&mut bodies);
		self.separate(&mut bodies);

		for body in &mut bodies {
			body.y = body.depth as f32 * self.config.level_distance;
			if !body.x.is_finite() {
				warn!("node {} left the plane, reseeding", body.id);
				body.x = self.seeds.get(&body.id).map(|s| s.0).unwrap_or(0.0);
			}
		}
		clear_bands(&mut bodies, self.config.collide_padding);

		let mut moved = 0.0f32;
		for body in &mut bodies {
			if let Some(prev) = self.positions.get(&body.id) {
				let (dx, dy) = (body.x - prev.x as f32, body.y - prev.y as f32);
				moved = moved.max((dx * dx + dy * dy).sqrt());
			}
			self.positions
				.insert(body.id, Point::new(body.x as f64, body.y as f64));
		}

		self.graph.visit_nodes_mut(|node| {
			if let Some(&i) = slot.get(&node.data.user_data.id) {
				node.data.x = bodies[i].x;
				node.data.y = bodies[i].y;
			}
		});

		self.alpha *= 1.0 - self.config.alpha_decay;
		self.ticks += 1;
		moved
	}

	fn relax_links(&self, bodies: &mut [Body], slot: &HashMap<NodeId, usize>) {
		let strength = self.config.link_strength * self.alpha;
		for (source, target) in &self.links {
			let (Some(&s), Some(&t)) = (slot.get(source), slot.get(target)) else {
				continue;
			};
			let (dx, dy) = (bodies[t].x - bodies[s].x, bodies[t].y - bodies[s].y);
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < 1e-3 {
				continue;
			}
			let k = (dist - self.config.link_distance) / dist * strength * 0.5;
			bodies[t].x -= dx * k;
			bodies[t].y -= dy * k;
			bodies[s].x += dx * k;
			bodies[s].y += dy * k;
		}
	}

	fn spread_bands(&self, bodies: &mut [Body]) {
		let reach = self.config.charge_distance_max;
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				if bodies[i].depth != bodies[j].depth {
					continue;
				}
				let dx = bodies[j].x - bodies[i].x;
				if dx.abs() > reach {
					continue;
				}
				let dir = if dx >= 0.0 { 1.0 } else { -1.0 };
				let push = self.config.charge_strength / dx.abs().max(1.0) * self.alpha * 0.5;
				bodies[i].x -= dir * push;
				bodies[j].x += dir * push;
			}
		}
	}

	fn separate(&self, bodies: &mut [Body]) {
		let (pad, strength) = (self.config.collide_padding, self.config.collide_strength);
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let min_dist = bodies[i].radius + bodies[j].radius + 2.0 * pad;
				let (dx, dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
				let dist = (dx * dx + dy * dy).sqrt();
				if dist >= min_dist {
					continue;
				}
				let (ux, uy) = if dist < 1e-6 { (1.0, 0.0) } else { (dx / dist, dy / dist) };
				let shift = (min_dist - dist) * strength * 0.5;
				bodies[i].x -= ux * shift;
				bodies[i].y -= uy * shift;
				bodies[j].x += ux * shift;
				bodies[j].y += uy * shift;
			}
		}
	}
}

/// Push discs sharing a band apart along x until every neighbouring pair keeps
/// `2 * pad` between borders. Each band keeps its mean x.
fn clear_bands(bodies: &mut [Body], pad: f32) {
	let mut bands: HashMap<u32, Vec<usize>> = HashMap::new();
	for (i, body) in bodies.iter().enumerate() {
		bands.entry(body.depth).or_default().push(i);
	}
	for mut band in bands.into_values() {
		if band.len() < 2 {
			continue;
		}
		band.sort_by(|&a, &b| bodies[a].x.total_cmp(&bodies[b].x).then(bodies[a].id.cmp(&bodies[b].id)));
		let before: f32 = band.iter().map(|&i| bodies[i].x).sum();
		for w in 1..band.len() {
			let (left, right) = (band[w - 1], band[w]);
			let min_x = bodies[left].x + bodies[left].radius + bodies[right].radius + 2.0 * pad;
			if bodies[right].x < min_x {
				bodies[right].x = min_x;
			}
		}
		let after: f32 = band.iter().map(|&i| bodies[i].x).sum();
		let shift = (after - before) / band.len() as f32;
		for &i in &band {
			bodies[i].x -= shift;
		}
	}
}

/// Longest path from a node without referrer, per visible node.
fn depths(visible: &VisibleGraph) -> HashMap<NodeId, u32> {
	let mut indegree: HashMap<NodeId, usize> = visible.nodes.iter().map(|n| (n.id, 0)).collect();
	let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
	for link in &visible.links {
		*indegree.entry(link.target).or_default() += 1;
		children.entry(link.source).or_default().push(link.target);
	}

	let mut depth = HashMap::new();
	let mut queue = VecDeque::new();
	for node in &visible.nodes {
		if indegree.get(&node.id) == Some(&0) {
			depth.insert(node.id, 0u32);
			queue.push_back(node.id);
		}
	}
	while let Some(id) = queue.pop_front() {
		let d = depth.get(&id).copied().unwrap_or(0);
		for &child in children.get(&id).into_iter().flatten() {
			let entry = depth.entry(child).or_insert(0);
			*entry = (*entry).max(d + 1);
			if let Some(deg) = indegree.get_mut(&child) {
				*deg -= 1;
				if *deg == 0 {
					queue.push_back(child);
				}
			}
		}
	}

	for node in &visible.nodes {
		if indegree.get(&node.id).is_some_and(|&d| d > 0) {
			warn!("node {} sits on a referral cycle", node.id);
		}
		depth.entry(node.id).or_insert(0);
	}
	depth
}

/// Initial coordinates: kept nodes stay put, revealed children fan out under
/// their parent, everything else spreads along its band.
fn seed_positions(
	visible: &VisibleGraph,
	depths: &HashMap<NodeId, u32>,
	previous: &HashMap<NodeId, Point>,
	config: &LayoutConfig,
) -> HashMap<NodeId, (f32, f32)> {
	let parent_of: HashMap<NodeId, NodeId> = visible.links.iter().map(|l| (l.target, l.source)).collect();
	let mut fresh_children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
	for link in &visible.links {
		if !previous.contains_key(&link.target) {
			fresh_children.entry(link.source).or_default().push(link.target);
		}
	}

	let mut order: Vec<_> = visible.nodes.iter().collect();
	order.sort_by_key(|n| depths.get(&n.id).copied().unwrap_or(0));

	let spacing = config.link_distance;
	let mut band_slots: HashMap<u32, usize> = HashMap::new();
	let mut seeds = HashMap::with_capacity(order.len());
	for (i, node) in order.into_iter().enumerate() {
		let depth = depths.get(&node.id).copied().unwrap_or(0);
		let y = depth as f32 * config.level_distance;
		let placed_parent = parent_of.get(&node.id).and_then(|p| seeds.get(p).map(|s: &(f32, f32)| (*p, s.0)));
		let x = if let Some(p) = previous.get(&node.id).filter(|p| p.is_finite()) {
			p.x as f32
		} else if let Some((parent, px)) = placed_parent {
			let fresh = fresh_children.get(&parent).map(Vec::as_slice).unwrap_or(&[]);
			let rank = fresh.iter().position(|&c| c == node.id).unwrap_or(0);
			px + (rank as f32 - (fresh.len().max(1) - 1) as f32 / 2.0) * spacing
		} else {
			let slot = band_slots.entry(depth).or_insert(0);
			let side = if *slot % 2 == 1 { 1.0 } else { -1.0 };
			let x = ((*slot + 1) / 2) as f32 * spacing * side;
			*slot += 1;
			x
		};
		seeds.insert(node.id, (x + jitter(i), y));
	}
	seeds
}

/// Small deterministic offset so no two seeds coincide.
fn jitter(i: usize) -> f32 {
	((i as f32 + 1.0) * 0.618_034).fract()
}
