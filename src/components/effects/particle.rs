//! Transient visual particles and the collection each surface owns.

use std::collections::VecDeque;

use super::theme::Color;

/// How long a particle lives, counted in simulation steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lifetime {
	/// Removed once `age >= max`.
	Frames { age: u32, max: f64 },
	/// Never removed by age.
	Infinite { age: u32 },
}

impl Lifetime {
	/// A fresh frame-limited lifetime.
	pub fn frames(max: f64) -> Self {
		Self::Frames { age: 0, max }
	}

	/// Steps survived so far.
	pub fn age(&self) -> u32 {
		match *self {
			Self::Frames { age, .. } | Self::Infinite { age } => age,
		}
	}

	/// Count one simulation step.
	pub fn tick(&mut self) {
		match self {
			Self::Frames { age, .. } | Self::Infinite { age } => *age = age.saturating_add(1),
		}
	}

	/// Whether the particle should be culled.
	pub fn is_expired(&self) -> bool {
		match *self {
			Self::Frames { age, max } => f64::from(age) >= max,
			Self::Infinite { .. } => false,
		}
	}

	/// Linear fade factor in `[0, 1]`: 1 at birth, 0 at expiry.
	pub fn fade(&self) -> f64 {
		match *self {
			Self::Frames { age, max } if max > 0.0 => (1.0 - f64::from(age) / max).clamp(0.0, 1.0),
			Self::Frames { .. } => 0.0,
			Self::Infinite { .. } => 1.0,
		}
	}
}

/// A single free-moving particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Horizontal position (px).
	pub x: f64,
	/// Vertical position (px).
	pub y: f64,
	/// Horizontal velocity (px per frame).
	pub vx: f64,
	/// Vertical velocity (px per frame).
	pub vy: f64,
	/// Radius (px).
	pub size: f64,
	/// Fill color; its alpha is ignored in favour of [`Particle::opacity`].
	pub color: Color,
	/// Base opacity before lifetime fading.
	pub alpha: f64,
	/// Age and expiry.
	pub life: Lifetime,
}

impl Particle {
	/// Opacity actually drawn this frame.
	pub fn opacity(&self) -> f64 {
		self.alpha * self.life.fade()
	}

	/// Move by one step of velocity.
	pub fn integrate(&mut self) {
		self.x += self.vx;
		self.y += self.vy;
	}

	/// Multiply velocity by `friction`.
	pub fn apply_friction(&mut self, friction: f64) {
		self.vx *= friction;
		self.vy *= friction;
	}

	fn has_finite_geometry(&self) -> bool {
		[self.x, self.y, self.vx, self.vy, self.size, self.alpha]
			.iter()
			.all(|v| v.is_finite())
	}
}

/// Live particle collection. Insertion order carries no meaning.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
	particles: Vec<Particle>,
}

impl ParticleSet {
	/// An empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a particle, silently dropping it if any of its geometry is NaN or infinite.
	pub fn push(&mut self, particle: Particle) -> bool {
		if particle.has_finite_geometry() {
			self.particles.push(particle);
			true
		} else {
			false
		}
	}

	/// Number of live particles.
	pub fn len(&self) -> usize {
		self.particles.len()
	}

	/// Whether no particle is alive.
	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	/// Drop every particle.
	pub fn clear(&mut self) {
		self.particles.clear();
	}

	/// Iterate live particles.
	pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
		self.particles.iter()
	}

	/// Iterate live particles mutably.
	pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
		self.particles.iter_mut()
	}

	/// Age, move, and slow every particle, then drop the expired ones.
	/// Returns how many particles were removed.
	pub fn advance(&mut self, friction: f64) -> usize {
		for p in &mut self.particles {
			p.life.tick();
			p.integrate();
			p.apply_friction(friction);
		}
		let before = self.particles.len();
		self.particles.retain(|p| !p.life.is_expired());
		before - self.particles.len()
	}

	/// Scale particle positions proportionally.
	pub fn rescale(&mut self, scale_x: f64, scale_y: f64) {
		for p in &mut self.particles {
			p.x *= scale_x;
			p.y *= scale_y;
		}
	}
}

impl Extend<Particle> for ParticleSet {
	fn extend<T: IntoIterator<Item = Particle>>(&mut self, iter: T) {
		for p in iter {
			self.push(p);
		}
	}
}

/// A previous meteor position, newest first in [`Meteor::trail`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
	/// Horizontal position (px).
	pub x: f64,
	/// Vertical position (px).
	pub y: f64,
	/// Opacity of the meteor when it passed here.
	pub opacity: f64,
}

/// A shooting star: a directional particle dragging a short tail of past positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Meteor {
	/// Head position (px).
	pub x: f64,
	/// Head position (px).
	pub y: f64,
	/// Heading in radians.
	pub angle: f64,
	/// Distance covered per frame (px).
	pub speed: f64,
	/// Length of the bright head streak (px).
	pub length: f64,
	/// Line width of the head (px).
	pub width: f64,
	/// Peak opacity.
	pub opacity: f64,
	/// Frames since spawn.
	pub age: u32,
	/// Past positions, newest first.
	pub trail: VecDeque<TrailPoint>,
}

impl Meteor {
	/// Remember the current position, then move one step along the heading.
	pub fn advance(&mut self, max_trail: usize) {
		self.trail.push_front(TrailPoint {
			x: self.x,
			y: self.y,
			opacity: self.opacity,
		});
		self.trail.truncate(max_trail);

		self.x += self.angle.cos() * self.speed;
		self.y += self.angle.sin() * self.speed;
		self.age = self.age.saturating_add(1);
	}

	/// End point of the head streak, behind the meteor.
	pub fn tail(&self) -> (f64, f64) {
		(
			self.x - self.angle.cos() * self.length,
			self.y - self.angle.sin() * self.length,
		)
	}

	pub(crate) fn has_finite_geometry(&self) -> bool {
		[self.x, self.y, self.angle, self.speed, self.length, self.width]
			.iter()
			.all(|v| v.is_finite())
	}
}
