//! Ambient particle field: a fixed population of slow white motes that wander,
//! wrap around the edges, and lean towards a recently moved pointer.

use fastrand::Rng;

use super::emitter::populate_field;
use super::particle::{Particle, ParticleSet};
use super::render::{Painter, render_particle_field};
use super::surface::Effect;
use super::theme::FieldStyle;
use super::types::{Bounds, FrameContext, Trigger};

/// Last accepted pointer sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Pointer {
	x: f64,
	y: f64,
	accepted_at: Option<f64>,
	active_until: f64,
}

impl Pointer {
	fn is_active(&self, now: f64) -> bool {
		self.accepted_at.is_some() && now < self.active_until
	}
}

/// Ambient motes that are never culled.
pub struct ParticleField {
	style: FieldStyle,
	particles: ParticleSet,
	pointer: Pointer,
}

impl ParticleField {
	/// An unpopulated field; particles appear on the first non-empty resize.
	pub fn new(style: FieldStyle) -> Self {
		Self {
			style,
			particles: ParticleSet::new(),
			pointer: Pointer::default(),
		}
	}

	/// Tuning in use.
	pub fn style(&self) -> &FieldStyle {
		&self.style
	}

	/// The ambient population.
	pub fn particles(&self) -> &ParticleSet {
		&self.particles
	}

	/// Whether pointer attraction applies at `now`.
	pub fn pointer_active(&self, now: f64) -> bool {
		self.pointer.is_active(now)
	}

	fn on_pointer_move(&mut self, x: f64, y: f64, at: f64) {
		if let Some(last) = self.pointer.accepted_at {
			if at - last <= self.style.pointer_throttle {
				return;
			}
		}
		self.pointer = Pointer {
			x,
			y,
			accepted_at: Some(at),
			active_until: at + self.style.pointer_timeout,
		};
	}

	fn attract(&self, p: &mut Particle) {
		let dx = self.pointer.x - p.x;
		let dy = self.pointer.y - p.y;
		let distance = (dx * dx + dy * dy).sqrt();
		if distance < self.style.attraction_radius {
			let force = self.style.attraction_strength / distance.max(self.style.attraction_min_distance);
			p.vx += dx * force;
			p.vy += dy * force;
		}
	}
}

/// Toroidal wrap: leaving one edge re-enters at the opposite one.
fn wrap(p: &mut Particle, bounds: Bounds) {
	if p.x < 0.0 {
		p.x = bounds.width;
	} else if p.x > bounds.width {
		p.x = 0.0;
	}
	if p.y < 0.0 {
		p.y = bounds.height;
	} else if p.y > bounds.height {
		p.y = 0.0;
	}
}

impl Effect for ParticleField {
	fn init(&mut self, bounds: Bounds, rng: &mut Rng) {
		self.particles = populate_field(&self.style, bounds, rng);
	}

	fn resize(&mut self, from: Bounds, to: Bounds) {
		let (sx, sy) = from.scale_to(to);
		self.particles.rescale(sx, sy);
	}

	fn trigger(&mut self, trigger: Trigger, _bounds: Bounds, _rng: &mut Rng) {
		if let Trigger::PointerMove { x, y, at } = trigger {
			self.on_pointer_move(x, y, at);
		}
	}

	fn step(&mut self, frame: &FrameContext, bounds: Bounds, rng: &mut Rng) {
		let active = self.pointer.is_active(frame.now);
		let max = self.style.max_speed;
		let wander = self.style.wander;

		let mut particles = std::mem::take(&mut self.particles);
		for p in particles.iter_mut() {
			p.vx += (rng.f64() - 0.5) * wander;
			p.vy += (rng.f64() - 0.5) * wander;
			p.vx = p.vx.clamp(-max, max);
			p.vy = p.vy.clamp(-max, max);

			if active {
				self.attract(p);
			}

			p.integrate();
			wrap(p, bounds);
			p.life.tick();
		}
		self.particles = particles;
	}

	fn render(&self, painter: &mut dyn Painter, _frame: &FrameContext, bounds: Bounds) {
		render_particle_field(painter, self, bounds);
	}

	fn live_particles(&self) -> usize {
		self.particles.len()
	}
}
