//! Emission policies: turning triggers into new particles.
//!
//! All randomness flows through a caller-provided [`fastrand::Rng`] so a fixed
//! seed reproduces the exact same emissions. Every emitter is a no-op on an
//! empty surface.

use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

use fastrand::Rng;

use super::particle::{Lifetime, Meteor, Particle, ParticleSet};
use super::theme::{Color, CometStyle, FieldStyle, MeteorStyle, StarfieldStyle};
use super::types::Bounds;

/// Uniform sample in `[min, min + spread)`.
pub(crate) fn uniform(rng: &mut Rng, min: f64, spread: f64) -> f64 {
	min + rng.f64() * spread
}

/// Spawns a short burst of particles behind a moving pointer.
#[derive(Clone, Debug, Default)]
pub struct PointerTrailEmitter {
	last_position: Option<(f64, f64)>,
	last_emission: Option<f64>,
}

impl PointerTrailEmitter {
	/// An emitter that has not yet seen the pointer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forget the last pointer position, e.g. after the surface was resized.
	pub fn reset(&mut self) {
		self.last_position = None;
		self.last_emission = None;
	}

	/// Record a pointer move and emit into `out`. Returns the number of particles emitted.
	///
	/// The first observed position only seeds the displacement tracking.
	pub fn on_pointer_move(
		&mut self,
		style: &CometStyle,
		(x, y): (f64, f64),
		at: f64,
		bounds: Bounds,
		rng: &mut Rng,
		out: &mut ParticleSet,
	) -> usize {
		if bounds.is_empty() || !x.is_finite() || !y.is_finite() {
			return 0;
		}
		let Some((last_x, last_y)) = self.last_position.replace((x, y)) else {
			return 0;
		};

		let (dx, dy) = (x - last_x, y - last_y);
		let distance = (dx * dx + dy * dy).sqrt();
		if distance <= 0.0 {
			return 0;
		}
		if let Some(last) = self.last_emission {
			if at - last <= style.min_emit_interval {
				return 0;
			}
		}
		self.last_emission = Some(at);

		let soft = (distance * style.count_per_px).min(style.count_soft_cap);
		let count = (soft.floor() as usize).clamp(1, style.max_batch.max(1));

		let mut emitted = 0;
		for _ in 0..count {
			let offset_x = (rng.f64() - 0.5) * style.jitter;
			let offset_y = (rng.f64() - 0.5) * style.jitter;
			let vx = (dx / style.velocity_divisor) * uniform(rng, -style.velocity_spread, 2.0 * style.velocity_spread);
			let vy = (dy / style.velocity_divisor) * uniform(rng, -style.velocity_spread, 2.0 * style.velocity_spread);
			let size = uniform(rng, style.size_min, style.size_max - style.size_min);
			let hue = uniform(rng, style.hue_min, style.hue_spread);
			let alpha = uniform(rng, style.opacity_min, style.opacity_spread);
			let max_life = style.life_base
				+ rng.f64() * style.life_spread * (distance / style.life_speed_divisor);

			let pushed = out.push(Particle {
				x: x + offset_x,
				y: y + offset_y,
				vx,
				vy,
				size,
				color: Color::hsl(hue, style.saturation, style.lightness),
				alpha,
				life: Lifetime::frames(max_life),
			});
			if pushed {
				emitted += 1;
			}
		}
		emitted
	}
}

/// Creates the fixed ambient population once, when the surface is first sized.
pub fn populate_field(style: &FieldStyle, bounds: Bounds, rng: &mut Rng) -> ParticleSet {
	let mut set = ParticleSet::new();
	if bounds.is_empty() {
		return set;
	}

	let count = ((bounds.area() * style.density).floor() as usize).min(style.max_count);
	for _ in 0..count {
		let x = rng.f64() * bounds.width;
		let y = rng.f64() * bounds.height;
		let size = uniform(rng, style.radius_min, style.radius_spread);
		let vx = uniform(rng, -style.initial_speed, 2.0 * style.initial_speed);
		let vy = uniform(rng, -style.initial_speed, 2.0 * style.initial_speed);
		let alpha = uniform(rng, style.opacity_min, style.opacity_spread);

		set.push(Particle {
			x,
			y,
			vx,
			vy,
			size,
			color: style.color,
			alpha,
			life: Lifetime::Infinite { age: 0 },
		});
	}
	set
}

/// Spawns shooting stars at random intervals, or on demand at a click.
#[derive(Clone, Debug, Default)]
pub struct MeteorEmitter {
	next_at: Option<f64>,
}

impl MeteorEmitter {
	/// An emitter whose first tick schedules the first random spawn.
	pub fn new() -> Self {
		Self::default()
	}

	/// Timestamp (ms) of the next random spawn, once the first tick scheduled it.
	pub fn next_at(&self) -> Option<f64> {
		self.next_at
	}

	fn schedule(&mut self, style: &StarfieldStyle, now: f64, rng: &mut Rng) {
		let (min, max) = style.meteor_interval;
		self.next_at = Some(now + uniform(rng, min, (max - min).max(0.0)));
	}

	/// Called every frame; returns a meteor when the current random interval has elapsed.
	pub fn tick(
		&mut self,
		style: &StarfieldStyle,
		now: f64,
		bounds: Bounds,
		rng: &mut Rng,
	) -> Option<Meteor> {
		if bounds.is_empty() {
			return None;
		}
		match self.next_at {
			None => {
				self.schedule(style, now, rng);
				None
			}
			Some(at) if now >= at => {
				self.schedule(style, now, rng);
				Self::from_edge(style, bounds, rng)
			}
			Some(_) => None,
		}
	}

	/// Meteor entering from the top edge, or from the upper half of a side edge.
	fn from_edge(style: &StarfieldStyle, bounds: Bounds, rng: &mut Rng) -> Option<Meteor> {
		let from_top = rng.f64() > 0.5;
		let (x, y, angle) = if from_top {
			let x = rng.f64() * bounds.width;
			(x, 0.0, PI / 4.0 + rng.f64() * PI / 2.0)
		} else {
			let from_left = rng.f64() > 0.5;
			let y = rng.f64() * (bounds.height / 2.0);
			if from_left {
				(0.0, y, PI / 6.0 + rng.f64() * PI / 3.0)
			} else {
				(bounds.width, y, PI - PI / 6.0 - rng.f64() * PI / 3.0)
			}
		};
		Self::build(&style.random_meteor, x, y, angle, rng)
	}

	/// Meteor launched from a click, heading away from the surface centre.
	pub fn at_click(
		&self,
		style: &StarfieldStyle,
		(x, y): (f64, f64),
		bounds: Bounds,
		rng: &mut Rng,
	) -> Option<Meteor> {
		if bounds.is_empty() {
			return None;
		}
		let (cx, cy) = bounds.center();
		let angle = (y - cy).atan2(x - cx) + (rng.f64() - 0.5) * style.click_angle_jitter;
		Self::build(&style.click_meteor, x, y, angle.rem_euclid(TAU), rng)
	}

	fn build(style: &MeteorStyle, x: f64, y: f64, angle: f64, rng: &mut Rng) -> Option<Meteor> {
		let meteor = Meteor {
			x,
			y,
			angle,
			length: uniform(rng, style.length_min, style.length_spread),
			speed: uniform(rng, style.speed_min, style.speed_spread),
			opacity: uniform(rng, style.opacity_min, style.opacity_spread),
			width: uniform(rng, style.width_min, style.width_spread),
			age: 0,
			trail: VecDeque::new(),
		};
		meteor.has_finite_geometry().then_some(meteor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bounds() -> Bounds {
		Bounds::new(800.0, 600.0)
	}

	#[test]
	fn first_pointer_sample_emits_nothing() {
		let style = CometStyle::default();
		let mut emitter = PointerTrailEmitter::new();
		let mut rng = Rng::with_seed(1);
		let mut out = ParticleSet::new();

		assert_eq!(emitter.on_pointer_move(&style, (10.0, 10.0), 0.0, bounds(), &mut rng, &mut out), 0);
		assert!(out.is_empty());
	}

	#[test]
	fn trail_batch_size_follows_pointer_travel() {
		let style = CometStyle::default();
		let mut emitter = PointerTrailEmitter::new();
		let mut rng = Rng::with_seed(2);
		let mut out = ParticleSet::new();

		emitter.on_pointer_move(&style, (0.0, 0.0), 0.0, bounds(), &mut rng, &mut out);
		// 3px of travel: 0.6 rounds down but at least one particle is emitted.
		assert_eq!(emitter.on_pointer_move(&style, (3.0, 0.0), 20.0, bounds(), &mut rng, &mut out), 1);
		// 100px of travel: capped at three.
		assert_eq!(emitter.on_pointer_move(&style, (103.0, 0.0), 40.0, bounds(), &mut rng, &mut out), 3);
		assert_eq!(out.len(), 4);

		for p in out.iter() {
			assert!(p.x >= 0.0 - 2.5 && p.x <= 103.0 + 2.5);
			assert!(p.size >= 1.0 && p.size < 3.0);
			assert!(p.alpha >= 0.7 && p.alpha < 1.0);
			assert!(matches!(p.life, Lifetime::Frames { max, .. } if max >= 20.0));
		}
	}

	#[test]
	fn trail_emission_is_rate_limited() {
		let style = CometStyle::default();
		let mut emitter = PointerTrailEmitter::new();
		let mut rng = Rng::with_seed(3);
		let mut out = ParticleSet::new();

		emitter.on_pointer_move(&style, (0.0, 0.0), 0.0, bounds(), &mut rng, &mut out);
		assert!(emitter.on_pointer_move(&style, (10.0, 0.0), 100.0, bounds(), &mut rng, &mut out) > 0);
		assert_eq!(emitter.on_pointer_move(&style, (20.0, 0.0), 110.0, bounds(), &mut rng, &mut out), 0);
		assert_eq!(emitter.on_pointer_move(&style, (30.0, 0.0), 116.0, bounds(), &mut rng, &mut out), 0);
		assert!(emitter.on_pointer_move(&style, (40.0, 0.0), 117.0, bounds(), &mut rng, &mut out) > 0);
	}

	#[test]
	fn trail_velocity_follows_a_fraction_of_displacement() {
		let style = CometStyle::default();
		let mut emitter = PointerTrailEmitter::new();
		let mut rng = Rng::with_seed(4);
		let mut out = ParticleSet::new();

		emitter.on_pointer_move(&style, (0.0, 0.0), 0.0, bounds(), &mut rng, &mut out);
		emitter.on_pointer_move(&style, (50.0, 0.0), 20.0, bounds(), &mut rng, &mut out);

		for p in out.iter() {
			assert!(p.vx.abs() <= 50.0 / 10.0 * 0.25);
			assert_eq!(p.vy, 0.0);
		}
	}

	#[test]
	fn emitters_ignore_empty_surfaces() {
		let empty = Bounds::new(0.0, 600.0);
		let mut rng = Rng::with_seed(5);
		let mut out = ParticleSet::new();

		let mut trail = PointerTrailEmitter::new();
		trail.on_pointer_move(&CometStyle::default(), (0.0, 0.0), 0.0, empty, &mut rng, &mut out);
		trail.on_pointer_move(&CometStyle::default(), (50.0, 0.0), 20.0, empty, &mut rng, &mut out);
		assert!(out.is_empty());

		assert!(populate_field(&FieldStyle::default(), empty, &mut rng).is_empty());

		let style = StarfieldStyle::default();
		let mut meteors = MeteorEmitter::new();
		assert!(meteors.tick(&style, 0.0, empty, &mut rng).is_none());
		assert!(meteors.tick(&style, 1e9, empty, &mut rng).is_none());
		assert!(meteors.at_click(&style, (1.0, 1.0), empty, &mut rng).is_none());
	}

	#[test]
	fn field_population_scales_with_area_and_is_capped() {
		let style = FieldStyle::default();
		let mut rng = Rng::with_seed(6);

		// 800 * 600 * 0.00005 = 24
		let small = populate_field(&style, bounds(), &mut rng);
		assert_eq!(small.len(), 24);
		assert!(small.iter().all(|p| matches!(p.life, Lifetime::Infinite { .. })));
		assert!(small.iter().all(|p| p.vx.abs() <= 0.1 && p.vy.abs() <= 0.1));

		let huge = populate_field(&style, Bounds::new(4000.0, 4000.0), &mut rng);
		assert_eq!(huge.len(), 150);
	}

	#[test]
	fn random_meteors_respect_the_interval() {
		let style = StarfieldStyle::default();
		let mut emitter = MeteorEmitter::new();
		let mut rng = Rng::with_seed(7);

		assert!(emitter.tick(&style, 1000.0, bounds(), &mut rng).is_none());
		let next = emitter.next_at().unwrap();
		assert!((6000.0..16000.0).contains(&next));

		assert!(emitter.tick(&style, next - 1.0, bounds(), &mut rng).is_none());
		let meteor = emitter.tick(&style, next, bounds(), &mut rng).unwrap();
		assert!(meteor.y == 0.0 || meteor.x == 0.0 || meteor.x == 800.0);
		assert!(meteor.y <= 300.0);
		assert!(meteor.angle > 0.0 && meteor.angle < PI);
		assert!(meteor.speed >= 3.0 && meteor.speed < 10.0);

		let following = emitter.next_at().unwrap();
		assert!(following >= next + 5000.0 && following < next + 15000.0);
	}

	#[test]
	fn clicked_meteors_head_away_from_the_centre() {
		let style = StarfieldStyle::default();
		let emitter = MeteorEmitter::new();
		let mut rng = Rng::with_seed(8);

		// Right of centre: heading stays within 0.25 rad of due east.
		let meteor = emitter.at_click(&style, (700.0, 300.0), bounds(), &mut rng).unwrap();
		let deviation = if meteor.angle > PI { meteor.angle - TAU } else { meteor.angle };
		assert!(deviation.abs() <= 0.25);
		assert!(meteor.speed >= 5.0 && meteor.speed < 13.0);
		assert_eq!((meteor.x, meteor.y), (700.0, 300.0));
	}
}
