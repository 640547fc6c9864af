//! Pointer comet trail: short-lived bluish sparks dropped behind the cursor.

use fastrand::Rng;

use super::emitter::PointerTrailEmitter;
use super::particle::ParticleSet;
use super::render::{Painter, render_comet_trail};
use super::surface::Effect;
use super::theme::CometStyle;
use super::types::{Bounds, FrameContext, Trigger};

/// Sparks emitted from pointer travel, fading out over a few dozen frames.
pub struct CometTrail {
	style: CometStyle,
	emitter: PointerTrailEmitter,
	particles: ParticleSet,
}

impl CometTrail {
	/// An empty trail; nothing is emitted until the pointer has moved twice.
	pub fn new(style: CometStyle) -> Self {
		Self {
			style,
			emitter: PointerTrailEmitter::new(),
			particles: ParticleSet::new(),
		}
	}

	/// Tuning in use.
	pub fn style(&self) -> &CometStyle {
		&self.style
	}

	/// Live sparks.
	pub fn particles(&self) -> &ParticleSet {
		&self.particles
	}
}

impl Effect for CometTrail {
	fn init(&mut self, _bounds: Bounds, _rng: &mut Rng) {
		self.particles.clear();
		self.emitter.reset();
	}

	fn resize(&mut self, _from: Bounds, _to: Bounds) {
		// Sparks are transient; a stale displacement would fire a burst across the new surface.
		self.particles.clear();
		self.emitter.reset();
	}

	fn trigger(&mut self, trigger: Trigger, bounds: Bounds, rng: &mut Rng) {
		if let Trigger::PointerMove { x, y, at } = trigger {
			self.emitter
				.on_pointer_move(&self.style, (x, y), at, bounds, rng, &mut self.particles);
		}
	}

	fn step(&mut self, _frame: &FrameContext, _bounds: Bounds, _rng: &mut Rng) {
		self.particles.advance(self.style.friction);
	}

	fn render(&self, painter: &mut dyn Painter, _frame: &FrameContext, bounds: Bounds) {
		render_comet_trail(painter, self, bounds);
	}

	fn live_particles(&self) -> usize {
		self.particles.len()
	}
}
