use std::collections::HashMap;
use std::rc::Rc;

use referral_network_graph::components::referral_network::layout::Layout;
use referral_network_graph::components::referral_network::transform::{
	Adjacency, CollapsedSet, Projection, default_collapsed, project,
};
use referral_network_graph::components::referral_network::{
	ClickOutcome, NetworkData, NetworkState, NodeId, ReferralLink, ReferralNode, Role,
};
use referral_network_graph::config::{CollapsePolicy, GraphConfig, LayoutConfig};

fn node(id: NodeId, role: Role, level: u32, referrals_count: u32) -> ReferralNode {
	ReferralNode {
		id,
		given_names: format!("Nodo{id}"),
		family_names: "Prueba".to_string(),
		national_id: id.to_string(),
		phone: "0999999999".to_string(),
		email: None,
		referrals_count,
		role,
		level,
	}
}

fn link(source: NodeId, target: NodeId) -> ReferralLink {
	ReferralLink { source, target }
}

fn chain() -> NetworkData {
	NetworkData {
		nodes: vec![
			node(1, Role::Me, 0, 2),
			node(2, Role::Referral, 1, 1),
			node(3, Role::Referral, 2, 0),
		],
		links: vec![link(1, 2), link(2, 3)],
	}
}

fn ids(nodes: &[ReferralNode]) -> Vec<NodeId> {
	let mut ids: Vec<_> = nodes.iter().map(|n| n.id).collect();
	ids.sort();
	ids
}

#[test]
fn chain_collapses_only_below_the_collapsed_node() {
	let data = Rc::new(chain());
	let mut projection = Projection::new(data.clone());
	let mut collapsed = default_collapsed(&data.nodes, &CollapsePolicy::default());
	assert!(collapsed.is_empty());
	assert_eq!(ids(&projection.visible(&collapsed).nodes), vec![1, 2, 3]);

	collapsed.collapse(3);
	let visible = projection.visible(&collapsed);
	assert_eq!(ids(&visible.nodes), vec![1, 2, 3]);
	assert_eq!(visible.links.len(), 2);

	collapsed.collapse(2);
	let visible = projection.visible(&collapsed);
	assert_eq!(ids(&visible.nodes), vec![1, 2]);
	assert_eq!(visible.links, vec![link(1, 2)]);

	collapsed.clear();
	assert_eq!(ids(&projection.visible(&collapsed).nodes), vec![1, 2, 3]);
}

#[test]
fn default_policy_ignores_input_order() {
	let mut data = chain();
	data.nodes.push(node(4, Role::Referral, 2, 3));
	data.nodes.push(node(5, Role::Referral, 3, 1));
	let forward = default_collapsed(&data.nodes, &CollapsePolicy::default());
	data.nodes.reverse();
	let backward = default_collapsed(&data.nodes, &CollapsePolicy::default());

	let mut a: Vec<_> = forward.iter().collect();
	let mut b: Vec<_> = backward.iter().collect();
	a.sort();
	b.sort();
	assert_eq!(a, vec![4, 5]);
	assert_eq!(a, b);
}

#[test]
fn collapse_policy_is_configurable() {
	let data = chain();
	let policy = CollapsePolicy {
		min_level: 1,
		min_referrals: 1,
	};
	let collapsed = default_collapsed(&data.nodes, &policy);
	let visible = project(&data, &Adjacency::from_links(&data.links), &collapsed);
	assert_eq!(ids(&visible.nodes), vec![1, 2]);
}

#[test]
fn layout_settles_into_level_bands() {
	let data = chain();
	let visible = project(&data, &Adjacency::from_links(&data.links), &CollapsedSet::default());
	let config = LayoutConfig::default();
	let limit = config.warmup_ticks + config.cooldown_ticks;
	let mut layout = Layout::new(&visible, &HashMap::new(), config);
	while !layout.is_ready() {
		layout.step_frame();
	}
	assert!(layout.ticks() <= limit);
	for (id, depth) in [(1, 0), (2, 1), (3, 2)] {
		let p = layout.position(id).unwrap();
		assert!((p.y - layout.band_y(depth)).abs() < 1e-3, "node {id} off its band");
	}
}

#[test]
fn clicking_a_collapsible_node_hides_its_subtree() {
	let mut state = NetworkState::new(Rc::new(chain()), 800.0, 600.0, GraphConfig::default());
	while !state.layout_ready() {
		state.tick(0.016);
	}
	if let Some(fit) = state.fit_target() {
		state.set_transform(fit);
	}
	let p = state.layout.position(2).unwrap();
	let (sx, sy) = state.graph_to_screen(p);

	assert_eq!(
		state.click_at(sx, sy),
		ClickOutcome::Toggled {
			id: 2,
			collapsed: true
		}
	);
	assert!(!state.visible().contains(3));
	assert!(state.node(3).is_some());
}
