//! Deep-space backdrop: twinkling stars, slowly turning named constellations,
//! faint nebulae, and shooting stars (random, or launched by a click).

use std::f64::consts::TAU;

use fastrand::Rng;

use super::emitter::{MeteorEmitter, uniform};
use super::particle::Meteor;
use super::render::{Painter, render_starfield};
use super::surface::Effect;
use super::theme::StarfieldStyle;
use super::types::{Bounds, FrameContext, Trigger};

/// A fixed background star.
#[derive(Clone, Debug, PartialEq)]
pub struct Star {
	/// Position (px).
	pub x: f64,
	/// Position (px).
	pub y: f64,
	/// Radius (px).
	pub radius: f64,
	/// Base opacity before twinkling.
	pub opacity: f64,
	/// Oscillation speed of the twinkle.
	pub twinkle_speed: f64,
	/// Oscillation offset, so stars don't pulse in unison.
	pub phase: f64,
}

impl Star {
	/// Opacity at the given frame: oscillates between 40% and 100% of the base.
	pub fn twinkle_alpha(&self, frame: u64) -> f64 {
		let t = frame as f64 * self.twinkle_speed * 10.0 + self.phase;
		self.opacity * (t.sin() * 0.3 + 0.7)
	}
}

/// Named polyline in local pattern coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstellationPattern {
	/// Label drawn next to the pattern.
	pub name: &'static str,
	/// Polyline vertices, unscaled and unrotated.
	pub points: &'static [(f64, f64)],
}

/// The shapes background constellations are drawn from.
pub const PATTERNS: [ConstellationPattern; 4] = [
	ConstellationPattern {
		name: "Celestial Compass",
		points: &[
			(0.0, 0.0),
			(30.0, 10.0),
			(60.0, 15.0),
			(80.0, 0.0),
			(100.0, 20.0),
			(90.0, 50.0),
			(110.0, 70.0),
		],
	},
	ConstellationPattern {
		name: "Digital Voyager",
		points: &[
			(0.0, 0.0),
			(20.0, 30.0),
			(10.0, 60.0),
			(30.0, 80.0),
			(50.0, 70.0),
			(40.0, 40.0),
			(60.0, 20.0),
			(50.0, 0.0),
		],
	},
	ConstellationPattern {
		name: "Code Weaver",
		points: &[(0.0, 30.0), (25.0, 0.0), (50.0, 30.0), (75.0, 0.0), (100.0, 30.0)],
	},
	ConstellationPattern {
		name: "Triad Nexus",
		points: &[(0.0, 0.0), (50.0, 80.0), (100.0, 0.0), (0.0, 0.0)],
	},
];

const LABEL_STEP: f64 = 0.002;
const LABEL_MIN: f64 = 0.2;
const LABEL_MAX: f64 = 0.7;
const LABEL_OFFSET: f64 = 20.0;

/// A decorative constellation drifting in the background.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundConstellation {
	/// Label text.
	pub name: &'static str,
	/// Polyline vertices in pattern space.
	pub points: &'static [(f64, f64)],
	/// Pattern origin on the surface (px).
	pub x: f64,
	/// Pattern origin on the surface (px).
	pub y: f64,
	/// Pattern-to-surface scale.
	pub scale: f64,
	/// Current rotation (radians).
	pub rotation: f64,
	/// Rotation per frame (radians).
	pub rotation_speed: f64,
	/// Line opacity.
	pub opacity: f64,
	/// Label opacity, pulsing between 0.2 and 0.7.
	pub label_opacity: f64,
	label_rising: bool,
}

impl BackgroundConstellation {
	fn random(pattern: &ConstellationPattern, bounds: Bounds, rng: &mut Rng) -> Self {
		Self {
			name: pattern.name,
			points: pattern.points,
			x: rng.f64() * bounds.width,
			y: rng.f64() * bounds.height,
			scale: uniform(rng, 0.5, 0.5),
			rotation: rng.f64() * TAU,
			rotation_speed: uniform(rng, -0.0001, 0.0002),
			opacity: uniform(rng, 0.05, 0.15),
			label_opacity: 0.0,
			label_rising: true,
		}
	}

	fn to_world(&self, (px, py): (f64, f64)) -> (f64, f64) {
		let (sin, cos) = self.rotation.sin_cos();
		let (sx, sy) = (px * self.scale, py * self.scale);
		(self.x + sx * cos - sy * sin, self.y + sx * sin + sy * cos)
	}

	/// Vertices in surface coordinates.
	pub fn world_points(&self) -> Vec<(f64, f64)> {
		self.points.iter().map(|&p| self.to_world(p)).collect()
	}

	/// Label position: just below the pattern centroid, in pattern space.
	pub fn label_anchor(&self) -> (f64, f64) {
		let n = self.points.len().max(1) as f64;
		let (sum_x, sum_y) = self
			.points
			.iter()
			.fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
		self.to_world((sum_x / n, sum_y / n + LABEL_OFFSET))
	}

	fn advance(&mut self) {
		self.rotation += self.rotation_speed;

		let direction = if self.label_rising { 1.0 } else { -1.0 };
		self.label_opacity += LABEL_STEP * direction;
		if self.label_opacity > LABEL_MAX {
			self.label_rising = false;
		} else if self.label_opacity < LABEL_MIN {
			self.label_rising = true;
		}
		self.label_opacity = self.label_opacity.clamp(LABEL_MIN, LABEL_MAX);
	}
}

/// A soft radial glow behind the stars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nebula {
	/// Centre (px).
	pub x: f64,
	/// Centre (px).
	pub y: f64,
	/// Glow radius (px).
	pub radius: f64,
}

/// Night sky backdrop: stars, nebulae, drifting constellations, and shooting stars.
pub struct Starfield {
	style: StarfieldStyle,
	stars: Vec<Star>,
	constellations: Vec<BackgroundConstellation>,
	nebulae: Vec<Nebula>,
	meteors: Vec<Meteor>,
	emitter: MeteorEmitter,
	/// Highlighted point in percent of the surface size.
	focus: Option<(f64, f64)>,
}

impl Starfield {
	/// An empty sky, filled on the first non-empty resize.
	pub fn new(style: StarfieldStyle) -> Self {
		Self {
			style,
			stars: Vec::new(),
			constellations: Vec::new(),
			nebulae: Vec::new(),
			meteors: Vec::new(),
			emitter: MeteorEmitter::new(),
			focus: None,
		}
	}

	/// Tuning in use.
	pub fn style(&self) -> &StarfieldStyle {
		&self.style
	}

	/// Background stars.
	pub fn stars(&self) -> &[Star] {
		&self.stars
	}

	/// Drifting constellations.
	pub fn constellations(&self) -> &[BackgroundConstellation] {
		&self.constellations
	}

	/// Nebula glows.
	pub fn nebulae(&self) -> &[Nebula] {
		&self.nebulae
	}

	/// Live shooting stars.
	pub fn meteors(&self) -> &[Meteor] {
		&self.meteors
	}

	/// Highlight the stars around `(x%, y%)` of the surface, or clear the highlight.
	pub fn set_focus(&mut self, focus: Option<(f64, f64)>) {
		self.focus = focus.filter(|(x, y)| x.is_finite() && y.is_finite());
	}

	/// Current focus point in percent, if any.
	pub fn focus(&self) -> Option<(f64, f64)> {
		self.focus
	}

	/// Closed path through up to a handful of stars near the focus point, ending at the focus itself.
	pub fn focus_path(&self, bounds: Bounds) -> Vec<(f64, f64)> {
		let Some((px, py)) = self.focus else {
			return Vec::new();
		};
		let center = (px / 100.0 * bounds.width, py / 100.0 * bounds.height);
		let reach = bounds.min_side() * self.style.focus_radius;

		let mut path: Vec<(f64, f64)> = self
			.stars
			.iter()
			.filter(|s| (s.x - center.0).hypot(s.y - center.1) < reach)
			.take(self.style.focus_max_stars)
			.map(|s| (s.x, s.y))
			.collect();
		path.push(center);
		if path.len() > 2 {
			path.push(path[0]);
		}
		path
	}

	fn spawn(&mut self, meteor: Option<Meteor>) {
		if let Some(meteor) = meteor {
			self.meteors.push(meteor);
		}
	}
}

impl Effect for Starfield {
	fn init(&mut self, bounds: Bounds, rng: &mut Rng) {
		let style = &self.style;
		let count = ((bounds.area() * style.star_density).floor() as usize).min(style.max_stars);
		self.stars = (0..count)
			.map(|_| Star {
				x: rng.f64() * bounds.width,
				y: rng.f64() * bounds.height,
				radius: rng.f64() * style.star_radius_max,
				opacity: uniform(rng, style.star_opacity_min, style.star_opacity_spread),
				twinkle_speed: uniform(rng, style.twinkle_speed_min, style.twinkle_speed_spread),
				phase: rng.f64() * TAU,
			})
			.collect();

		self.constellations = (0..style.constellation_count)
			.map(|i| BackgroundConstellation::random(&PATTERNS[i % PATTERNS.len()], bounds, rng))
			.collect();

		self.nebulae = (0..style.nebula_count)
			.map(|_| Nebula {
				x: rng.f64() * bounds.width,
				y: rng.f64() * bounds.height,
				radius: bounds.min_side() * uniform(rng, 0.1, 0.2),
			})
			.collect();

		self.meteors.clear();
	}

	fn resize(&mut self, from: Bounds, to: Bounds) {
		let (sx, sy) = from.scale_to(to);
		let radius_scale = if from.min_side() > 0.0 {
			to.min_side() / from.min_side()
		} else {
			1.0
		};

		for star in &mut self.stars {
			star.x *= sx;
			star.y *= sy;
		}
		for constellation in &mut self.constellations {
			constellation.x *= sx;
			constellation.y *= sy;
		}
		for nebula in &mut self.nebulae {
			nebula.x *= sx;
			nebula.y *= sy;
			nebula.radius *= radius_scale;
		}
		self.meteors.clear();
	}

	fn trigger(&mut self, trigger: Trigger, bounds: Bounds, rng: &mut Rng) {
		if let Trigger::Click { x, y } = trigger {
			let meteor = self.emitter.at_click(&self.style, (x, y), bounds, rng);
			self.spawn(meteor);
		}
	}

	fn step(&mut self, frame: &FrameContext, bounds: Bounds, rng: &mut Rng) {
		for constellation in &mut self.constellations {
			constellation.advance();
		}

		let trail = self.style.trail_length;
		let margin = self.style.cull_margin;
		self.meteors.retain_mut(|meteor| {
			meteor.advance(trail);
			bounds.contains_with_margin(meteor.x, meteor.y, margin)
		});

		let meteor = self.emitter.tick(&self.style, frame.now, bounds, rng);
		self.spawn(meteor);
	}

	fn render(&self, painter: &mut dyn Painter, frame: &FrameContext, bounds: Bounds) {
		render_starfield(painter, self, frame, bounds);
	}

	fn live_particles(&self) -> usize {
		self.meteors.len()
	}
}
