//! Off-screen pointer-hit layer.
//!
//! Every visible node is painted as a filled disc of its exact screen radius
//! using a unique 24-bit color key. Resolving the pointer is a single read of
//! the key under it, so picking is independent of how nodes are styled.

use super::types::NodeId;

/// Packed `0xRRGGBB` key; 0 is the background.
pub type ColorKey = u32;

const MAX_KEYS: usize = 0x00FF_FFFF;

/// A disc to paint, in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitDisc {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HitLayer {
	width: usize,
	height: usize,
	pixels: Vec<ColorKey>,
	owners: Vec<NodeId>,
}

impl HitLayer {
	pub fn new(width: f64, height: f64) -> Self {
		let mut layer = Self::default();
		layer.resize(width, height);
		layer
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width.max(0.0) as usize;
		self.height = height.max(0.0) as usize;
		self.pixels = vec![0; self.width * self.height];
		self.owners.clear();
	}

	/// Repaint from scratch; later discs win where they overlap.
	pub fn paint(&mut self, discs: impl IntoIterator<Item = HitDisc>) {
		self.pixels.fill(0);
		self.owners.clear();
		for disc in discs {
			if self.owners.len() >= MAX_KEYS {
				break;
			}
			self.owners.push(disc.id);
			let key = self.owners.len() as ColorKey;
			self.fill_disc(disc, key);
		}
	}

	fn fill_disc(&mut self, disc: HitDisc, key: ColorKey) {
		if !(disc.x.is_finite() && disc.y.is_finite() && disc.radius > 0.0) {
			return;
		}
		let (w, h) = (self.width as f64, self.height as f64);
		let y0 = (disc.y - disc.radius).floor().max(0.0);
		let y1 = (disc.y + disc.radius).ceil().min(h - 1.0);
		let mut y = y0;
		while y <= y1 {
			// Sample at pixel centers.
			let dy = y + 0.5 - disc.y;
			let span = disc.radius * disc.radius - dy * dy;
			if span >= 0.0 {
				let half = span.sqrt();
				let x0 = (disc.x - half - 0.5).ceil().max(0.0);
				let x1 = (disc.x + half - 0.5).floor().min(w - 1.0);
				if x0 <= x1 {
					let row = y as usize * self.width;
					self.pixels[row + x0 as usize..=row + x1 as usize].fill(key);
				}
			}
			y += 1.0;
		}
	}

	pub fn key_at(&self, x: f64, y: f64) -> ColorKey {
		if !(x >= 0.0 && y >= 0.0) {
			return 0;
		}
		let (px, py) = (x as usize, y as usize);
		if px >= self.width || py >= self.height {
			return 0;
		}
		self.pixels[py * self.width + px]
	}

	pub fn pick(&self, x: f64, y: f64) -> Option<NodeId> {
		match self.key_at(x, y) {
			0 => None,
			key => self.owners.get(key as usize - 1).copied(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn disc(id: NodeId, x: f64, y: f64, radius: f64) -> HitDisc {
		HitDisc { id, x, y, radius }
	}

	#[test]
	fn picks_inside_and_misses_outside() {
		let mut layer = HitLayer::new(200.0, 100.0);
		layer.paint([disc(7, 50.0, 50.0, 10.0)]);
		assert_eq!(layer.pick(50.0, 50.0), Some(7));
		assert_eq!(layer.pick(57.0, 50.0), Some(7));
		assert_eq!(layer.pick(50.0, 58.0), Some(7));
		assert_eq!(layer.pick(62.0, 50.0), None);
		assert_eq!(layer.pick(58.0, 58.0), None);
		assert_eq!(layer.pick(-1.0, 50.0), None);
		assert_eq!(layer.pick(500.0, 50.0), None);
	}

	#[test]
	fn later_disc_wins_overlap() {
		let mut layer = HitLayer::new(100.0, 100.0);
		layer.paint([disc(1, 40.0, 50.0, 15.0), disc(2, 55.0, 50.0, 15.0)]);
		assert_eq!(layer.pick(30.0, 50.0), Some(1));
		assert_eq!(layer.pick(48.0, 50.0), Some(2));
		assert_eq!(layer.pick(65.0, 50.0), Some(2));
	}

	#[test]
	fn repaint_forgets_old_discs() {
		let mut layer = HitLayer::new(100.0, 100.0);
		layer.paint([disc(1, 20.0, 20.0, 5.0)]);
		layer.paint([disc(2, 80.0, 80.0, 5.0)]);
		assert_eq!(layer.pick(20.0, 20.0), None);
		assert_eq!(layer.pick(80.0, 80.0), Some(2));
	}

	#[test]
	fn clipped_and_degenerate_discs_are_safe() {
		let mut layer = HitLayer::new(50.0, 50.0);
		layer.paint([
			disc(1, -5.0, -5.0, 12.0),
			disc(2, f64::NAN, 10.0, 5.0),
			disc(3, 49.0, 49.0, 100.0),
		]);
		assert_eq!(layer.pick(0.0, 0.0), Some(3));
		assert_eq!(layer.pick(25.0, 25.0), Some(3));
	}
}
