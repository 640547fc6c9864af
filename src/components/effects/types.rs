//! Small value types shared by the effect engine.

/// Surface dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Bounds {
	/// Non-finite or negative dimensions become zero.
	pub fn new(width: f64, height: f64) -> Self {
		let sanitize = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
		Self {
			width: sanitize(width),
			height: sanitize(height),
		}
	}

	/// A surface with no area cannot host particles.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	/// Width times height.
	pub fn area(&self) -> f64 {
		self.width * self.height
	}

	/// Midpoint of the surface.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// The shorter of width and height.
	pub fn min_side(&self) -> f64 {
		self.width.min(self.height)
	}

	/// Whether `(x, y)` lies within the surface grown by `margin` on every side.
	pub fn contains_with_margin(&self, x: f64, y: f64, margin: f64) -> bool {
		x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
	}

	/// Per-axis factors mapping coordinates in `self` onto `to`.
	/// Returns `(1.0, 1.0)` when `self` has no area.
	pub fn scale_to(&self, to: Bounds) -> (f64, f64) {
		if self.is_empty() {
			(1.0, 1.0)
		} else {
			(to.width / self.width, to.height / self.height)
		}
	}
}

/// Timing information handed to the simulation and renderer for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
	/// Host timestamp in milliseconds.
	pub now: f64,
	/// Number of frames this surface has completed before this one.
	pub frame: u64,
}

/// External input routed to an effect's emitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trigger {
	/// Pointer (mouse or first touch point) moved to `(x, y)` at time `at` (ms).
	PointerMove { x: f64, y: f64, at: f64 },
	/// Click or tap at surface coordinates `(x, y)`.
	Click { x: f64, y: f64 },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn non_finite_dimensions_collapse_to_empty() {
		assert!(Bounds::new(f64::NAN, 10.0).is_empty());
		assert!(Bounds::new(-5.0, 10.0).is_empty());
		assert!(!Bounds::new(1.0, 1.0).is_empty());
	}

	#[test]
	fn scale_from_empty_is_identity() {
		assert_eq!(Bounds::default().scale_to(Bounds::new(100.0, 50.0)), (1.0, 1.0));
		assert_eq!(
			Bounds::new(100.0, 50.0).scale_to(Bounds::new(200.0, 25.0)),
			(2.0, 0.5)
		);
	}
}
