//! Pan and zoom, kept apart from the simulated coordinates.

/// Affine screen mapping: `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug)]
pub struct Viewport {
	pub transform: ViewTransform,
	pub pan: PanState,
	min_zoom: f64,
	max_zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self::new(1.0, 3.0)
	}
}

impl Viewport {
	pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			pan: PanState::default(),
			min_zoom,
			max_zoom,
		}
	}

	/// Allowed scale range, `(min, max)`.
	pub fn extent(&self) -> (f64, f64) {
		(self.min_zoom, self.max_zoom)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		let t = &self.transform;
		((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		let t = &self.transform;
		(gx * t.k + t.x, gy * t.k + t.y)
	}

	/// Sets the scale, clamped to the extent, keeping the graph point under
	/// `(ax, ay)` on screen where it is.
	pub fn zoom_to(&mut self, k: f64, ax: f64, ay: f64) {
		let (lo, hi) = self.extent();
		let new_k = k.clamp(lo, hi);
		let ratio = new_k / self.transform.k;
		self.transform.x = ax - (ax - self.transform.x) * ratio;
		self.transform.y = ay - (ay - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Wheel handling: one notch in or out around the pointer.
	pub fn zoom_wheel(&mut self, delta_y: f64, ax: f64, ay: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.zoom_to(self.transform.k * factor, ax, ay);
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
	}

	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn move_pan(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scale_is_clamped_to_extent() {
		let mut v = Viewport::default();
		assert_eq!(v.extent(), (1.0, 3.0));
		v.zoom_to(5.0, 0.0, 0.0);
		assert_eq!(v.transform.k, 3.0);
		v.zoom_to(0.2, 0.0, 0.0);
		assert_eq!(v.transform.k, 1.0);
		for _ in 0..100 {
			v.zoom_wheel(-1.0, 10.0, 10.0);
		}
		assert_eq!(v.transform.k, 3.0);
		for _ in 0..100 {
			v.zoom_wheel(1.0, 10.0, 10.0);
		}
		assert_eq!(v.transform.k, 1.0);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut v = Viewport::default();
		v.pan_by(30.0, -20.0);
		let before = v.screen_to_graph(200.0, 150.0);
		v.zoom_to(2.5, 200.0, 150.0);
		let after = v.screen_to_graph(200.0, 150.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn pan_gesture_follows_pointer() {
		let mut v = Viewport::default();
		v.begin_pan(10.0, 10.0);
		v.move_pan(25.0, 5.0);
		v.end_pan();
		v.move_pan(500.0, 500.0);
		assert_eq!((v.transform.x, v.transform.y), (15.0, -5.0));
	}

	#[test]
	fn mapping_round_trips() {
		let mut v = Viewport::default();
		v.zoom_to(2.0, 100.0, 100.0);
		let (sx, sy) = v.graph_to_screen(12.0, 34.0);
		assert_eq!(v.screen_to_graph(sx, sy), (12.0, 34.0));
	}
}
