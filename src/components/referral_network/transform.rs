//! Projection of the full referral network onto the subset that is drawn.
//!
//! Collapsing a node hides every node reachable from it through outgoing
//! referral links. Reachability is always computed on the full link list, so
//! collapsing a node inside an already hidden subtree still records the right
//! closure for when its ancestor is expanded again.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::config::CollapsePolicy;

use super::types::{NetworkData, NodeId, ReferralLink, ReferralNode};

/// Source id to the ids it referred, built in one pass over the links.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
	children: HashMap<NodeId, Vec<NodeId>>,
}

impl Adjacency {
	/// Index `links` by source.
	pub fn from_links(links: &[ReferralLink]) -> Self {
		let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
		for link in links {
			children.entry(link.source).or_default().push(link.target);
		}
		Self { children }
	}

	/// Direct referrals of `id`, empty for unknown ids.
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// True if `id` referred anybody.
	pub fn has_children(&self, id: NodeId) -> bool {
		!self.children(id).is_empty()
	}

	/// Breadth-first closure below `id`, excluding `id` itself.
	pub fn descendants(&self, id: NodeId) -> HashSet<NodeId> {
		let mut seen = HashSet::new();
		let mut queue: VecDeque<NodeId> = self.children(id).iter().copied().collect();
		while let Some(next) = queue.pop_front() {
			if next == id || !seen.insert(next) {
				continue;
			}
			queue.extend(self.children(next).iter().copied());
		}
		seen
	}
}

/// Ids whose subtrees are hidden. The revision only moves on real changes,
/// which makes it usable as a memo key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapsedSet {
	ids: HashSet<NodeId>,
	revision: u64,
}

impl CollapsedSet {
	/// Set holding exactly `ids`, at revision 0.
	pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
		Self {
			ids: ids.into_iter().collect(),
			revision: 0,
		}
	}

	/// True if `id` is collapsed.
	pub fn contains(&self, id: NodeId) -> bool {
		self.ids.contains(&id)
	}

	/// Number of collapsed ids.
	pub fn len(&self) -> usize {
		self.ids.len()
	}

	/// True when nothing is collapsed.
	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	/// Collapsed ids in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.ids.iter().copied()
	}

	/// Bumped on every membership change.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Returns whether anything changed.
	pub fn collapse(&mut self, id: NodeId) -> bool {
		let changed = self.ids.insert(id);
		self.bump(changed)
	}

	/// Returns whether anything changed.
	pub fn expand(&mut self, id: NodeId) -> bool {
		let changed = self.ids.remove(&id);
		self.bump(changed)
	}

	/// Flips membership and returns whether `id` is now collapsed.
	pub fn toggle(&mut self, id: NodeId) -> bool {
		if self.expand(id) {
			false
		} else {
			self.collapse(id);
			true
		}
	}

	/// Expand everything; returns whether anything changed.
	pub fn clear(&mut self) -> bool {
		let changed = !self.ids.is_empty();
		self.ids.clear();
		self.bump(changed)
	}

	/// Swap in a new membership, bumping the revision if it differs.
	pub fn replace(&mut self, other: CollapsedSet) -> bool {
		let changed = self.ids != other.ids;
		if changed {
			self.ids = other.ids;
		}
		self.bump(changed)
	}

	fn bump(&mut self, changed: bool) -> bool {
		if changed {
			self.revision += 1;
		}
		changed
	}
}

/// Ids collapsed when a network is first shown.
pub fn default_collapsed(nodes: &[ReferralNode], policy: &CollapsePolicy) -> CollapsedSet {
	CollapsedSet::from_ids(
		nodes
			.iter()
			.filter(|n| n.level >= policy.min_level && n.referrals_count >= policy.min_referrals)
			.map(|n| n.id),
	)
}

/// Union of the descendants of every collapsed id.
pub fn hidden_set(adjacency: &Adjacency, collapsed: &CollapsedSet) -> HashSet<NodeId> {
	let mut hidden = HashSet::new();
	for id in collapsed.iter() {
		hidden.extend(adjacency.descendants(id));
	}
	hidden
}

/// The part of the network handed to layout and rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleGraph {
	/// Nodes left after hiding collapsed subtrees.
	pub nodes: Vec<ReferralNode>,
	/// Links whose both ends are visible.
	pub links: Vec<ReferralLink>,
	/// Ids removed by collapsing.
	pub hidden: HashSet<NodeId>,
}

impl VisibleGraph {
	/// True if `id` is drawn.
	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	/// Ids of the drawn nodes.
	pub fn node_ids(&self) -> HashSet<NodeId> {
		self.nodes.iter().map(|n| n.id).collect()
	}
}

/// Drop the descendants of collapsed nodes and the links touching them.
pub fn project(data: &NetworkData, adjacency: &Adjacency, collapsed: &CollapsedSet) -> VisibleGraph {
	let hidden = hidden_set(adjacency, collapsed);
	let nodes: Vec<ReferralNode> = data
		.nodes
		.iter()
		.filter(|n| !hidden.contains(&n.id))
		.cloned()
		.collect();
	let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
	let links = data
		.links
		.iter()
		.filter(|l| ids.contains(&l.source) && ids.contains(&l.target))
		.copied()
		.collect();
	VisibleGraph {
		nodes,
		links,
		hidden,
	}
}

/// Source data plus its adjacency, with the visible graph memoized against the
/// collapsed-set revision.
#[derive(Debug)]
pub struct Projection {
	data: Rc<NetworkData>,
	adjacency: Adjacency,
	cached: Option<(u64, Rc<VisibleGraph>)>,
}

impl Projection {
	/// Wrap `data` and index its links.
	pub fn new(data: Rc<NetworkData>) -> Self {
		let adjacency = Adjacency::from_links(&data.links);
		Self {
			data,
			adjacency,
			cached: None,
		}
	}

	/// The full network.
	pub fn data(&self) -> &Rc<NetworkData> {
		&self.data
	}

	/// Children index over the full link list.
	pub fn adjacency(&self) -> &Adjacency {
		&self.adjacency
	}

	/// True if `data` is the very allocation this projection was built from.
	pub fn is_source(&self, data: &Rc<NetworkData>) -> bool {
		Rc::ptr_eq(&self.data, data)
	}

	/// Nodes past the root level with at least one child can be collapsed.
	pub fn is_collapsible(&self, node: &ReferralNode) -> bool {
		node.level >= 1 && self.adjacency.has_children(node.id)
	}

	/// Visible graph for `collapsed`, recomputed only when its revision moved.
	pub fn visible(&mut self, collapsed: &CollapsedSet) -> Rc<VisibleGraph> {
		if let Some((revision, graph)) = &self.cached {
			if *revision == collapsed.revision() {
				return graph.clone();
			}
		}
		let graph = Rc::new(project(&self.data, &self.adjacency, collapsed));
		self.cached = Some((collapsed.revision(), graph.clone()));
		graph
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::Role;
	use super::super::types::fixtures::{chain, link, node, tree};
	use super::*;

	fn visible_ids(data: &NetworkData, collapsed: &CollapsedSet) -> Vec<NodeId> {
		let adjacency = Adjacency::from_links(&data.links);
		let mut ids: Vec<_> = project(data, &adjacency, collapsed).nodes.iter().map(|n| n.id).collect();
		ids.sort();
		ids
	}

	#[test]
	fn chain_scenario() {
		let data = chain();
		let policy = CollapsePolicy::default();
		let collapsed = default_collapsed(&data.nodes, &policy);
		assert!(collapsed.is_empty());
		assert_eq!(visible_ids(&data, &collapsed), vec![1, 2, 3]);

		let leaf = CollapsedSet::from_ids([3]);
		assert_eq!(visible_ids(&data, &leaf), vec![1, 2, 3]);

		let mid = CollapsedSet::from_ids([2]);
		let adjacency = Adjacency::from_links(&data.links);
		let graph = project(&data, &adjacency, &mid);
		assert_eq!(visible_ids(&data, &mid), vec![1, 2]);
		assert_eq!(graph.links, vec![link(1, 2)]);
	}

	#[test]
	fn collapse_is_idempotent() {
		let data = tree();
		let mut collapsed = CollapsedSet::default();
		assert!(collapsed.collapse(2));
		let once = visible_ids(&data, &collapsed);
		let revision = collapsed.revision();
		assert!(!collapsed.collapse(2));
		assert_eq!(collapsed.revision(), revision);
		assert_eq!(visible_ids(&data, &collapsed), once);
	}

	#[test]
	fn collapse_hides_whole_closure_but_not_the_node() {
		let data = tree();
		let collapsed = CollapsedSet::from_ids([2]);
		let ids = visible_ids(&data, &collapsed);
		assert!(ids.contains(&2));
		assert!(!ids.contains(&4));
		assert!(!ids.contains(&6));
		assert_eq!(ids, vec![1, 2, 3, 5]);
	}

	#[test]
	fn expand_restores_exactly_what_it_hid() {
		let data = tree();
		let mut collapsed = CollapsedSet::from_ids([3]);
		let before = visible_ids(&data, &collapsed);
		collapsed.collapse(2);
		assert_eq!(visible_ids(&data, &collapsed), vec![1, 2, 3]);
		collapsed.expand(2);
		assert_eq!(visible_ids(&data, &collapsed), before);
	}

	#[test]
	fn nested_collapse_keeps_inner_state() {
		let data = tree();
		let mut collapsed = CollapsedSet::from_ids([2, 4]);
		assert_eq!(visible_ids(&data, &collapsed), vec![1, 2, 3, 5]);
		collapsed.expand(2);
		assert_eq!(visible_ids(&data, &collapsed), vec![1, 2, 3, 4, 5]);
	}

	#[test]
	fn visible_links_never_dangle() {
		let data = tree();
		for ids in [vec![], vec![1], vec![2], vec![3], vec![2, 3], vec![4]] {
			let collapsed = CollapsedSet::from_ids(ids);
			let adjacency = Adjacency::from_links(&data.links);
			let graph = project(&data, &adjacency, &collapsed);
			let visible = graph.node_ids();
			for l in &graph.links {
				assert!(visible.contains(&l.source) && visible.contains(&l.target));
			}
		}
	}

	#[test]
	fn default_policy_ignores_order() {
		let mut data = tree();
		let policy = CollapsePolicy::default();
		let forward = default_collapsed(&data.nodes, &policy);
		data.nodes.reverse();
		let backward = default_collapsed(&data.nodes, &policy);
		assert_eq!(forward, backward);
		let mut ids: Vec<_> = forward.iter().collect();
		ids.sort();
		assert_eq!(ids, vec![4]);
	}

	#[test]
	fn default_policy_respects_configured_level() {
		let data = tree();
		let policy = CollapsePolicy {
			min_level: 1,
			min_referrals: 1,
		};
		let mut ids: Vec<_> = default_collapsed(&data.nodes, &policy).iter().collect();
		ids.sort();
		assert_eq!(ids, vec![2, 3, 4]);
	}

	#[test]
	fn unknown_and_childless_ids_are_no_ops() {
		let data = tree();
		let collapsed = CollapsedSet::from_ids([5, 99]);
		assert_eq!(visible_ids(&data, &collapsed).len(), data.nodes.len());
	}

	#[test]
	fn descendants_survive_cycles() {
		let adjacency = Adjacency::from_links(&[link(1, 2), link(2, 3), link(3, 1)]);
		let mut d: Vec<_> = adjacency.descendants(1).into_iter().collect();
		d.sort();
		assert_eq!(d, vec![2, 3]);
	}

	#[test]
	fn projection_memoizes_on_revision() {
		let mut projection = Projection::new(Rc::new(tree()));
		let mut collapsed = CollapsedSet::default();
		let a = projection.visible(&collapsed);
		let b = projection.visible(&collapsed);
		assert!(Rc::ptr_eq(&a, &b));
		collapsed.collapse(2);
		let c = projection.visible(&collapsed);
		assert!(!Rc::ptr_eq(&a, &c));
		assert_eq!(c.nodes.len(), 4);
	}

	#[test]
	fn collapsible_needs_level_and_children() {
		let projection = Projection::new(Rc::new(tree()));
		let data = projection.data().clone();
		let root = data.node(1).unwrap();
		let mid = data.node(2).unwrap();
		let leaf = data.node(5).unwrap();
		assert!(!projection.is_collapsible(root));
		assert!(projection.is_collapsible(mid));
		assert!(!projection.is_collapsible(leaf));
		assert!(!projection.is_collapsible(&node(42, Role::Referral, 3, 0)));
	}
}
