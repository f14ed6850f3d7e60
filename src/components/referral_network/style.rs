use super::types::{ReferralNode, Role};

const BASE_RADIUS: f64 = 20.0;
const RADIUS_SCALE: f64 = 4.0;
const ME_MIN_RADIUS: f64 = 28.0;
const SPONSOR_MIN_RADIUS: f64 = 24.0;

/// Labels are skipped when a node is smaller than this on screen.
pub const LABEL_MIN_SCREEN_RADIUS: f64 = 15.0;
pub const RING_WIDTH: f64 = 3.0;

const ME_COLOR: &str = "#FF1053";
const SPONSOR_COLOR: &str = "#119DA4";
const FALLBACK_COLOR: &str = "#15F287";
/// Referral colors for levels 1 through 6+.
const LEVEL_COLORS: &[&str] = &["#FFD700", "#FFA500", "#FF4500", "#32CD32", "#1E90FF", "#9370DB"];

pub const COLLAPSED_COLOR: &str = "#119DA4";
pub const EXPANDED_COLOR: &str = "#FF4500";

/// Grows with the square root of the referral count so large recruiters do not
/// swamp the canvas.
pub fn node_radius(node: &ReferralNode) -> f64 {
	let size = BASE_RADIUS + (node.referrals_count as f64).sqrt() * RADIUS_SCALE;
	match node.role {
		Role::Me => size.max(ME_MIN_RADIUS),
		Role::Sponsor => size.max(SPONSOR_MIN_RADIUS),
		Role::Referral => size,
	}
}

pub fn node_color(node: &ReferralNode) -> &'static str {
	match node.role {
		Role::Me => ME_COLOR,
		Role::Sponsor => SPONSOR_COLOR,
		Role::Referral => match node.level {
			0 => FALLBACK_COLOR,
			level => LEVEL_COLORS[(level as usize).min(LEVEL_COLORS.len()) - 1],
		},
	}
}

pub fn label_font_size(radius: f64) -> f64 {
	radius / 3.2
}

/// Colors that change between the embedded and the fullscreen view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
	pub background: &'static str,
	pub edge: &'static str,
	pub label: &'static str,
}

impl Palette {
	pub const LIGHT: Palette = Palette {
		background: "#FFFFFF",
		edge: "#000000",
		label: "#1e1b4b",
	};
	pub const DARK: Palette = Palette {
		background: "rgba(0, 0, 0, 0.6)",
		edge: "#FFFFFF",
		label: "#FFFFFF",
	};

	pub fn for_fullscreen(fullscreen: bool) -> Self {
		if fullscreen { Self::DARK } else { Self::LIGHT }
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::fixtures::node;
	use super::*;

	#[test]
	fn radius_never_shrinks_with_more_referrals() {
		for role in [Role::Me, Role::Sponsor, Role::Referral] {
			let mut last = 0.0;
			for count in 0..200 {
				let r = node_radius(&node(1, role, 1, count));
				assert!(r >= last, "{role:?} shrank at {count}");
				last = r;
			}
		}
	}

	#[test]
	fn role_floors() {
		assert_eq!(node_radius(&node(1, Role::Me, 0, 0)), 28.0);
		assert_eq!(node_radius(&node(1, Role::Sponsor, 0, 0)), 24.0);
		assert_eq!(node_radius(&node(1, Role::Referral, 1, 0)), 20.0);
		assert_eq!(node_radius(&node(1, Role::Referral, 1, 4)), 28.0);
		assert_eq!(node_radius(&node(1, Role::Me, 0, 9)), 32.0);
	}

	#[test]
	fn colors_follow_role_then_level() {
		assert_eq!(node_color(&node(1, Role::Me, 3, 0)), "#FF1053");
		assert_eq!(node_color(&node(1, Role::Sponsor, 0, 0)), "#119DA4");
		assert_eq!(node_color(&node(1, Role::Referral, 0, 0)), "#15F287");
		assert_eq!(node_color(&node(1, Role::Referral, 1, 0)), "#FFD700");
		assert_eq!(node_color(&node(1, Role::Referral, 2, 0)), "#FFA500");
		assert_eq!(node_color(&node(1, Role::Referral, 3, 0)), "#FF4500");
		assert_eq!(node_color(&node(1, Role::Referral, 4, 0)), "#32CD32");
		assert_eq!(node_color(&node(1, Role::Referral, 5, 0)), "#1E90FF");
		assert_eq!(node_color(&node(1, Role::Referral, 6, 0)), "#9370DB");
		assert_eq!(node_color(&node(1, Role::Referral, 40, 0)), "#9370DB");
	}

	#[test]
	fn palette_switches_with_fullscreen() {
		assert_eq!(Palette::for_fullscreen(false), Palette::LIGHT);
		assert_eq!(Palette::for_fullscreen(true).edge, "#FFFFFF");
	}
}
