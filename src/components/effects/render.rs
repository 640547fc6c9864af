//! Drawing for the canvas effects.
//!
//! Effects never talk to the canvas directly. They describe a frame through the
//! [`Painter`] trait, which the browser implements on top of
//! `CanvasRenderingContext2d`. Rendering is a read-only pass: every function
//! here takes effect state by shared reference.
//!
//! Draw order per surface:
//! 1. Background policy (clear, translucent overlay, or gradient)
//! 2. Persistent background entities (nebulae, constellations, stars)
//! 3. Live particles and meteors
//! 4. Focus overlay (active constellation lines)

use std::f64::consts::PI;

use log::warn;
use web_sys::CanvasRenderingContext2d;

use super::comet::CometTrail;
use super::field::ParticleField;
use super::particle::{Meteor, ParticleSet};
use super::starfield::Starfield;
use super::theme::{BackgroundPolicy, Color};
use super::types::{Bounds, FrameContext};

/// Fill or stroke source.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
	/// One flat color.
	Solid(Color),
	/// Linear gradient between two points.
	Linear {
		/// Gradient start.
		from: (f64, f64),
		/// Gradient end.
		to: (f64, f64),
		/// `(offset, color)` pairs, offsets in `0..=1`.
		stops: Vec<(f64, Color)>,
	},
	/// Radial gradient between two concentric circles.
	Radial {
		/// Shared centre of both circles.
		center: (f64, f64),
		/// Inner radius.
		inner: f64,
		/// Outer radius.
		outer: f64,
		/// `(offset, color)` pairs, offsets in `0..=1`.
		stops: Vec<(f64, Color)>,
	},
}

/// Minimal drawing surface the effects render onto.
pub trait Painter {
	/// Reset every pixel of the surface to transparent.
	fn clear(&mut self, bounds: Bounds);
	/// Fill an axis-aligned rectangle.
	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint);
	/// Fill a circle.
	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, paint: &Paint);
	/// Stroke an open polyline through `points`.
	fn stroke_polyline(&mut self, points: &[(f64, f64)], width: f64, paint: &Paint);
	/// Draw `text` horizontally centred on `x`.
	fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, paint: &Paint);
}

/// Prepare the surface according to `policy`.
pub fn apply_background(painter: &mut dyn Painter, bounds: Bounds, policy: &BackgroundPolicy) {
	match policy {
		BackgroundPolicy::Clear => painter.clear(bounds),
		BackgroundPolicy::Overlay(color) => {
			painter.fill_rect(0.0, 0.0, bounds.width, bounds.height, &Paint::Solid(*color));
		}
		BackgroundPolicy::VerticalGradient(stops) => {
			painter.clear(bounds);
			let paint = Paint::Linear {
				from: (0.0, 0.0),
				to: (0.0, bounds.height),
				stops: stops.clone(),
			};
			painter.fill_rect(0.0, 0.0, bounds.width, bounds.height, &paint);
		}
	}
}

/// Draw every live particle at its lifetime-faded opacity.
pub fn draw_particles(painter: &mut dyn Painter, particles: &ParticleSet) {
	for p in particles.iter() {
		if p.life.is_expired() {
			continue;
		}
		let paint = Paint::Solid(p.color.with_alpha(p.opacity()));
		painter.fill_circle(p.x, p.y, p.size, &paint);
	}
}

/// Draw one comet-trail frame.
pub fn render_comet_trail(painter: &mut dyn Painter, trail: &CometTrail, bounds: Bounds) {
	apply_background(painter, bounds, &trail.style().background);
	draw_particles(painter, trail.particles());
}

/// Draw one ambient-field frame.
pub fn render_particle_field(painter: &mut dyn Painter, field: &ParticleField, bounds: Bounds) {
	apply_background(painter, bounds, &field.style().background);
	draw_particles(painter, field.particles());
}

/// Draw one starfield frame: sky, nebulae, constellations, stars, meteors, then the focus path.
pub fn render_starfield(
	painter: &mut dyn Painter,
	starfield: &Starfield,
	frame: &FrameContext,
	bounds: Bounds,
) {
	let style = starfield.style();
	apply_background(painter, bounds, &style.background);

	for nebula in starfield.nebulae() {
		let paint = Paint::Radial {
			center: (nebula.x, nebula.y),
			inner: 0.0,
			outer: nebula.radius,
			stops: vec![
				(0.0, style.nebula_color.with_alpha(style.nebula_color.a * 0.05)),
				(1.0, Color::rgba(20, 10, 40, 0.0)),
			],
		};
		painter.fill_circle(nebula.x, nebula.y, nebula.radius, &paint);
	}

	for constellation in starfield.constellations() {
		let points = constellation.world_points();
		let line = Paint::Solid(Color::WHITE.with_alpha(constellation.opacity));
		painter.stroke_polyline(&points, 0.5 * constellation.scale, &line);

		let dot = Paint::Solid(Color::WHITE.with_alpha((constellation.opacity * 1.5).min(1.0)));
		for &(x, y) in &points {
			painter.fill_circle(x, y, constellation.scale, &dot);
		}

		let (lx, ly) = constellation.label_anchor();
		let label = Paint::Solid(Color::WHITE.with_alpha(constellation.label_opacity));
		painter.fill_text(constellation.name, lx, ly, style.label_font, &label);
	}

	for star in starfield.stars() {
		let paint = Paint::Solid(Color::WHITE.with_alpha(star.twinkle_alpha(frame.frame)));
		painter.fill_circle(star.x, star.y, star.radius, &paint);
	}

	for meteor in starfield.meteors() {
		draw_meteor(painter, meteor);
	}

	let path = starfield.focus_path(bounds);
	if path.len() > 1 {
		let paint = Paint::Solid(Color::rgba(255, 255, 255, 0.3));
		painter.stroke_polyline(&path, 0.5, &paint);
	}
}

fn draw_meteor(painter: &mut dyn Painter, meteor: &Meteor) {
	let tail = meteor.tail();
	let head = Paint::Linear {
		from: (meteor.x, meteor.y),
		to: tail,
		stops: vec![
			(0.0, Color::WHITE.with_alpha(meteor.opacity)),
			(1.0, Color::WHITE.with_alpha(0.0)),
		],
	};
	painter.stroke_polyline(&[(meteor.x, meteor.y), tail], meteor.width, &head);

	let len = meteor.trail.len() as f64;
	for (i, point) in meteor.trail.iter().enumerate() {
		let opacity = point.opacity * (1.0 - i as f64 / len);
		let paint = Paint::Solid(Color::WHITE.with_alpha(opacity * 0.3));
		painter.fill_circle(point.x, point.y, meteor.width / 2.0, &paint);
	}
}

fn apply_gradient_stops(gradient: &web_sys::CanvasGradient, stops: &[(f64, Color)]) {
	for (offset, color) in stops {
		if let Err(err) = gradient.add_color_stop(*offset as f32, &color.to_css()) {
			warn!("orbit-folio: invalid gradient stop {offset}: {err:?}");
		}
	}
}

fn make_gradient(
	ctx: &CanvasRenderingContext2d,
	paint: &Paint,
) -> Option<web_sys::CanvasGradient> {
	match paint {
		Paint::Solid(_) => None,
		Paint::Linear { from, to, stops } => {
			let gradient = ctx.create_linear_gradient(from.0, from.1, to.0, to.1);
			apply_gradient_stops(&gradient, stops);
			Some(gradient)
		}
		Paint::Radial {
			center,
			inner,
			outer,
			stops,
		} => match ctx.create_radial_gradient(center.0, center.1, *inner, center.0, center.1, *outer) {
			Ok(gradient) => {
				apply_gradient_stops(&gradient, stops);
				Some(gradient)
			}
			Err(err) => {
				warn!("orbit-folio: radial gradient rejected: {err:?}");
				None
			}
		},
	}
}

fn set_fill(ctx: &CanvasRenderingContext2d, paint: &Paint) {
	match (paint, make_gradient(ctx, paint)) {
		(Paint::Solid(color), _) => ctx.set_fill_style_str(&color.to_css()),
		(_, Some(gradient)) => {
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		(_, None) => ctx.set_fill_style_str("rgba(0, 0, 0, 0)"),
	}
}

fn set_stroke(ctx: &CanvasRenderingContext2d, paint: &Paint) {
	match (paint, make_gradient(ctx, paint)) {
		(Paint::Solid(color), _) => ctx.set_stroke_style_str(&color.to_css()),
		(_, Some(gradient)) => {
			#[allow(deprecated)]
			ctx.set_stroke_style(&gradient);
		}
		(_, None) => ctx.set_stroke_style_str("rgba(0, 0, 0, 0)"),
	}
}

impl Painter for CanvasRenderingContext2d {
	fn clear(&mut self, bounds: Bounds) {
		self.clear_rect(0.0, 0.0, bounds.width, bounds.height);
	}

	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) {
		set_fill(self, paint);
		CanvasRenderingContext2d::fill_rect(self, x, y, width, height);
	}

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, paint: &Paint) {
		set_fill(self, paint);
		self.begin_path();
		let _ = self.arc(x, y, radius.max(0.0), 0.0, PI * 2.0);
		self.fill();
	}

	fn stroke_polyline(&mut self, points: &[(f64, f64)], width: f64, paint: &Paint) {
		let Some((&(x0, y0), rest)) = points.split_first() else {
			return;
		};
		set_stroke(self, paint);
		self.set_line_width(width);
		self.begin_path();
		self.move_to(x0, y0);
		for &(x, y) in rest {
			self.line_to(x, y);
		}
		self.stroke();
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, paint: &Paint) {
		set_fill(self, paint);
		self.set_font(font);
		self.set_text_align("center");
		let _ = CanvasRenderingContext2d::fill_text(self, text, x, y);
	}
}


#[cfg(test)]
mod tests {
	use super::recording::{Op, RecordingPainter};
	use super::*;
	use crate::components::effects::particle::{Lifetime, Particle};

	#[test]
	fn overlay_policy_paints_translucent_rect_without_clearing() {
		let mut painter = RecordingPainter::default();
		let overlay = Color::rgba(0, 0, 0, 0.1);
		apply_background(&mut painter, Bounds::new(10.0, 10.0), &BackgroundPolicy::Overlay(overlay));
		assert_eq!(painter.ops, vec![Op::Rect(Paint::Solid(overlay))]);
	}

	#[test]
	fn particles_are_drawn_at_faded_opacity() {
		let mut set = ParticleSet::new();
		set.push(Particle {
			x: 5.0,
			y: 6.0,
			vx: 0.0,
			vy: 0.0,
			size: 2.0,
			color: Color::WHITE,
			alpha: 1.0,
			life: Lifetime::Frames { age: 1, max: 4.0 },
		});

		let mut painter = RecordingPainter::default();
		draw_particles(&mut painter, &set);

		let circles: Vec<_> = painter.circles().collect();
		assert_eq!(circles.len(), 1);
		assert_eq!(circles[0].2, &Paint::Solid(Color::WHITE.with_alpha(0.75)));
	}
}
