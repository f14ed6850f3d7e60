//! Pointer and control-button handling.

use log::debug;

use super::platform::Platform;
use super::state::{NetworkState, ViewTransform};
use super::transform::default_collapsed;
use super::types::NodeId;

/// Screen distance after which a press counts as a pan rather than a click.
const CLICK_SLOP: f64 = 4.0;

/// What a click on the canvas did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	/// A collapsible node changed state.
	Toggled { id: NodeId, collapsed: bool },
	/// Any other node was opened in the detail panel.
	Selected(NodeId),
	/// Nothing under the pointer.
	Missed,
}

/// Hover card contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tooltip {
	/// Full name.
	pub name: String,
	/// Contact phone.
	pub phone: String,
	/// Direct referrals.
	pub referrals_count: u32,
	/// Expand or collapse hint for collapsible nodes.
	pub hint: Option<&'static str>,
}

/// Detail panel contents for the selected node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDetail {
	/// Selected node.
	pub id: NodeId,
	/// Full name.
	pub full_name: String,
	/// National identity document number.
	pub national_id: String,
	/// Contact phone.
	pub phone: String,
	/// Email or the missing-email placeholder.
	pub email: String,
	/// Direct referrals.
	pub referrals_count: u32,
}

impl NetworkState {
	/// Toggle the collapsible node under the pointer, or select any other node.
	pub fn click_at(&mut self, sx: f64, sy: f64) -> ClickOutcome {
		let Some(id) = self.node_at_position(sx, sy) else {
			return ClickOutcome::Missed;
		};
		if self.is_collapsible(id) {
			let collapsed = self.collapsed.toggle(id);
			debug!("node {id} {}", if collapsed { "collapsed" } else { "expanded" });
			self.refresh_visible();
			self.refit_in = Some(self.config.camera.refit_delay);
			ClickOutcome::Toggled { id, collapsed }
		} else {
			self.select(id);
			ClickOutcome::Selected(id)
		}
	}

	/// Open the detail view for `id` and fly the camera to it.
	pub fn select(&mut self, id: NodeId) {
		self.selected = Some(id);
		if let Some(p) = self.layout.position(id) {
			let k = self.clamp_zoom(self.config.camera.focus_zoom);
			self.animate_to(
				ViewTransform {
					x: self.width / 2.0 - p.x * k,
					y: self.height / 2.0 - p.y * k,
					k,
				},
				self.config.camera.focus_duration,
			);
		}
		self.request_repaint();
	}

	/// Close the detail panel.
	pub fn close_detail(&mut self) {
		self.selected = None;
		self.request_repaint();
	}

	/// Track the node under the pointer.
	pub fn hover_at(&mut self, sx: f64, sy: f64, platform: &dyn Platform) {
		let hovered = self.node_at_position(sx, sy);
		self.set_hover(hovered, platform);
	}

	/// Set the hovered node and switch the pointer cursor.
	pub fn set_hover(&mut self, node: Option<NodeId>, platform: &dyn Platform) {
		if self.hover == node {
			return;
		}
		self.hover = node;
		platform.set_pointer_cursor(node.is_some());
	}

	/// Tooltip for the hovered node, hidden while a node is selected.
	pub fn tooltip(&self) -> Option<Tooltip> {
		if self.selected.is_some() {
			return None;
		}
		let id = self.hover?;
		let node = self.node(id)?;
		let hint = self.is_collapsible(id).then(|| {
			if self.is_collapsed(id) {
				"Clic para expandir"
			} else {
				"Clic para contraer"
			}
		});
		Some(Tooltip {
			name: node.full_name(),
			phone: node.phone.clone(),
			referrals_count: node.referrals_count,
			hint,
		})
	}

	/// Detail panel contents for the selected node.
	pub fn detail(&self) -> Option<NodeDetail> {
		let node = self.node(self.selected?)?;
		Some(NodeDetail {
			id: node.id,
			full_name: node.full_name(),
			national_id: node.national_id.clone(),
			phone: node.phone.clone(),
			email: node.email_or_default().to_string(),
			referrals_count: node.referrals_count,
		})
	}

	/// Zoom in one step around the viewport center.
	pub fn zoom_in(&mut self) {
		self.zoom_by(self.config.camera.zoom_step);
	}

	/// Zoom out one step around the viewport center.
	pub fn zoom_out(&mut self) {
		self.zoom_by(1.0 / self.config.camera.zoom_step);
	}

	/// Zoom around the viewport center, eased.
	fn zoom_by(&mut self, factor: f64) {
		let base = self.camera_target();
		let k = self.clamp_zoom(base.k * factor);
		let ratio = k / base.k;
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		self.animate_to(
			ViewTransform {
				x: cx - (cx - base.x) * ratio,
				y: cy - (cy - base.y) * ratio,
				k,
			},
			self.config.camera.zoom_duration,
		);
	}

	/// Where the camera is heading, so repeated clicks compound.
	fn camera_target(&self) -> ViewTransform {
		self.camera.as_ref().map(|c| c.target()).unwrap_or(self.transform)
	}

	/// Immediate zoom around a screen point, used by the wheel.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let k = self.clamp_zoom(self.transform.k * factor);
		let ratio = k / self.transform.k;
		self.set_transform(ViewTransform {
			x: sx - (sx - self.transform.x) * ratio,
			y: sy - (sy - self.transform.y) * ratio,
			k,
		});
	}

	/// Frame every visible node.
	pub fn fit(&mut self) {
		self.fit_view(self.config.camera.fit_duration);
	}

	/// Show the whole network.
	pub fn expand_all(&mut self) {
		if self.collapsed.clear() {
			self.refresh_visible();
			self.refit_in = Some(self.config.camera.refit_delay);
		}
	}

	/// Reapply the default collapse policy.
	pub fn collapse_default(&mut self) {
		let defaults = default_collapsed(&self.data().nodes, &self.config.collapse);
		if self.collapsed.replace(defaults) {
			self.refresh_visible();
			self.refit_in = Some(self.config.camera.refit_delay);
		}
	}

	/// Enter or leave fullscreen through `platform`.
	pub fn toggle_fullscreen(&self, platform: &dyn Platform) {
		if platform.is_fullscreen() {
			platform.exit_fullscreen();
		} else {
			platform.request_fullscreen();
		}
	}

	/// Called from the `fullscreenchange` observer.
	pub fn set_fullscreen(&mut self, fullscreen: bool) {
		if self.fullscreen != fullscreen {
			self.fullscreen = fullscreen;
			self.request_repaint();
		}
	}

	/// Pointer pressed on the canvas.
	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan.active = true;
		self.pan.moved = false;
		self.pan.start_x = sx;
		self.pan.start_y = sy;
		self.pan.transform_start_x = self.transform.x;
		self.pan.transform_start_y = self.transform.y;
	}

	/// Pointer moved while pressed.
	pub fn drag_pan(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if !self.pan.moved && dx.hypot(dy) < CLICK_SLOP {
			return;
		}
		self.pan.moved = true;
		self.set_transform(ViewTransform {
			x: self.pan.transform_start_x + dx,
			y: self.pan.transform_start_y + dy,
			k: self.transform.k,
		});
	}

	/// Ends a press; a press that never moved is treated as a click.
	pub fn end_pan(&mut self, sx: f64, sy: f64) -> ClickOutcome {
		let was_click = self.pan.active && !self.pan.moved;
		self.pan.active = false;
		self.pan.moved = false;
		if was_click {
			self.click_at(sx, sy)
		} else {
			ClickOutcome::Missed
		}
	}

	/// Pointer left the canvas.
	pub fn cancel_pan(&mut self, platform: &dyn Platform) {
		self.pan.active = false;
		self.pan.moved = false;
		self.set_hover(None, platform);
	}
}
