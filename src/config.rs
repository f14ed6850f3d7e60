//! Deployment-tunable settings for the API endpoint and the network graph.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Base URL of the backend REST API, fixed at build time through
/// `REFERRAL_API_URL`.
pub fn api_url() -> &'static str {
	option_env!("REFERRAL_API_URL").unwrap_or(DEFAULT_API_URL)
}

/// Everything the graph component can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Force layout parameters.
	pub layout: LayoutConfig,
	/// Zoom and camera animation.
	pub camera: CameraConfig,
	/// Nodes collapsed on load.
	pub collapse: CollapsePolicy,
}

impl GraphConfig {
	/// Parse a (possibly partial) JSON document; missing keys keep defaults.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Config baked in through `REFERRAL_GRAPH_CONFIG`, or defaults.
	pub fn from_env() -> Self {
		let Some(json) = option_env!("REFERRAL_GRAPH_CONFIG") else {
			return Self::default();
		};
		Self::from_json(json).unwrap_or_else(|err| {
			warn!("ignoring REFERRAL_GRAPH_CONFIG: {err}");
			Self::default()
		})
	}
}

/// Simulation and constraint parameters for the layered force layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Vertical distance between depth bands.
	pub level_distance: f32,
	/// Repulsion between nodes.
	pub charge_strength: f32,
	/// Same-band pairs farther apart than this get no extra spread.
	pub charge_distance_max: f32,
	/// Per-pair force clamp inside the base simulation.
	pub force_max: f32,
	/// Edge attraction inside the base simulation.
	pub spring_strength: f32,
	/// Velocity scale of the base simulation.
	pub node_speed: f32,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f32,
	/// Rest length of an edge.
	pub link_distance: f32,
	/// How hard edges pull toward their rest length.
	pub link_strength: f32,
	/// Gap kept around every disc.
	pub collide_padding: f32,
	/// Share of an overlap resolved per tick.
	pub collide_strength: f32,
	/// Cooling rate of the constraint passes.
	pub alpha_decay: f32,
	/// Ticks run before the layout may settle early.
	pub warmup_ticks: u32,
	/// Ticks after warm-up before the layout is stopped.
	pub cooldown_ticks: u32,
	/// Ticks run per animation frame.
	pub ticks_per_frame: u32,
	/// Largest per-tick displacement under which the layout counts as settled.
	pub settle_threshold: f32,
	/// Integration step of the base simulation.
	pub time_step: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			level_distance: 120.0,
			charge_strength: 150.0,
			charge_distance_max: 400.0,
			force_max: 100.0,
			spring_strength: 0.05,
			node_speed: 3000.0,
			velocity_decay: 0.4,
			link_distance: 80.0,
			link_strength: 0.5,
			collide_padding: 15.0,
			collide_strength: 0.8,
			alpha_decay: 0.02,
			warmup_ticks: 100,
			cooldown_ticks: 200,
			ticks_per_frame: 5,
			settle_threshold: 0.5,
			time_step: 0.016,
		}
	}
}

/// Zoom, fit and camera-animation parameters. Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
	/// Zoom factor of the zoom buttons.
	pub zoom_step: f64,
	/// Zoom button animation.
	pub zoom_duration: f64,
	/// Screen margin kept around the graph when fitting.
	pub fit_padding: f64,
	/// Fit animation.
	pub fit_duration: f64,
	/// Zoom used when flying to a selected node.
	pub focus_zoom: f64,
	/// Fly-to animation.
	pub focus_duration: f64,
	/// Wait after an expand/collapse before re-framing the graph.
	pub refit_delay: f64,
	/// Smallest zoom factor.
	pub min_zoom: f64,
	/// Largest zoom factor.
	pub max_zoom: f64,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			zoom_step: 1.2,
			zoom_duration: 0.4,
			fit_padding: 50.0,
			fit_duration: 0.4,
			focus_zoom: 4.0,
			focus_duration: 1.0,
			refit_delay: 0.6,
			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

/// Which nodes start collapsed when a network is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapsePolicy {
	/// Only nodes at this level or deeper start collapsed.
	pub min_level: u32,
	/// Only nodes with at least this many referrals start collapsed.
	pub min_referrals: u32,
}

impl Default for CollapsePolicy {
	fn default() -> Self {
		Self {
			min_level: 2,
			min_referrals: 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_other_defaults() {
		let cfg = GraphConfig::from_json(r#"{"collapse": {"min_level": 3}, "layout": {"link_distance": 100}}"#)
			.unwrap();
		assert_eq!(cfg.collapse.min_level, 3);
		assert_eq!(cfg.collapse.min_referrals, 1);
		assert_eq!(cfg.layout.link_distance, 100.0);
		assert_eq!(cfg.layout.level_distance, 120.0);
		assert_eq!(cfg.camera, CameraConfig::default());
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(GraphConfig::from_json("{\"layout\": 5}").is_err());
	}

	#[test]
	fn empty_object_is_default() {
		assert_eq!(GraphConfig::from_json("{}").unwrap(), GraphConfig::default());
	}
}
