//! Visual styling and tuning for the canvas effects.
//!
//! Every effect reads its emission, motion, and colour parameters from one of
//! the style structs below. The `Default` impls carry the tuned values the site
//! has always shipped with.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha in `0..=1`.
	pub a: f64,
}

impl Color {
	/// Opaque color from 8-bit channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color from 8-bit channels and an alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Opaque white.
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	/// Build an opaque color from hue (degrees), saturation and lightness (0..1).
	pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
		let h = hue.rem_euclid(360.0) / 60.0;
		let s = saturation.clamp(0.0, 1.0);
		let l = lightness.clamp(0.0, 1.0);

		let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
		let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
		let (r, g, b) = match h as u32 {
			0 => (chroma, x, 0.0),
			1 => (x, chroma, 0.0),
			2 => (0.0, chroma, x),
			3 => (0.0, x, chroma),
			4 => (x, 0.0, chroma),
			_ => (chroma, 0.0, x),
		};
		let m = l - chroma / 2.0;
		let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

		Self::rgb(channel(r), channel(g), channel(b))
	}

	/// Same color with alpha replaced.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// CSS color string: `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// How a surface is prepared before particles are drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundPolicy {
	/// Wipe the whole surface every frame.
	Clear,
	/// Paint a translucent layer over the previous frame, leaving motion trails.
	Overlay(Color),
	/// Repaint a vertical gradient (offset, color) every frame.
	VerticalGradient(Vec<(f64, Color)>),
}

/// Pointer-trail ("comet cursor") configuration.
#[derive(Clone, Debug)]
pub struct CometStyle {
	/// Surface preparation before each frame.
	pub background: BackgroundPolicy,
	/// Minimum time between two emissions (ms).
	pub min_emit_interval: f64,
	/// Emission count per pixel of pointer travel, before capping.
	pub count_per_px: f64,
	/// Upper bound on the fractional count derived from travel.
	pub count_soft_cap: f64,
	/// Hard bound on particles per emission.
	pub max_batch: usize,
	/// Positional jitter around the pointer (total width, px).
	pub jitter: f64,
	/// Divisor applied to pointer displacement to get particle velocity.
	pub velocity_divisor: f64,
	/// Half-width of the random velocity factor.
	pub velocity_spread: f64,
	/// Particle radius range start (px).
	pub size_min: f64,
	/// Particle radius range end (px).
	pub size_max: f64,
	/// Hue range start (degrees).
	pub hue_min: f64,
	/// Hue range width (degrees).
	pub hue_spread: f64,
	/// HSL saturation, `0..=1`.
	pub saturation: f64,
	/// HSL lightness, `0..=1`.
	pub lightness: f64,
	/// Base opacity range start.
	pub opacity_min: f64,
	/// Base opacity range width.
	pub opacity_spread: f64,
	/// Minimum lifetime in frames.
	pub life_base: f64,
	/// Extra lifetime in frames, scaled by pointer speed / `life_speed_divisor`.
	pub life_spread: f64,
	/// Pointer travel (px) that scales `life_spread` by one.
	pub life_speed_divisor: f64,
	/// Per-frame velocity multiplier.
	pub friction: f64,
}

impl Default for CometStyle {
	fn default() -> Self {
		Self {
			background: BackgroundPolicy::Clear,
			min_emit_interval: 16.0,
			count_per_px: 0.2,
			count_soft_cap: 3.0,
			max_batch: 5,
			jitter: 5.0,
			velocity_divisor: 10.0,
			velocity_spread: 0.25,
			size_min: 1.0,
			size_max: 3.0,
			hue_min: 210.0,
			hue_spread: 40.0,
			saturation: 0.8,
			lightness: 0.7,
			opacity_min: 0.7,
			opacity_spread: 0.3,
			life_base: 20.0,
			life_spread: 20.0,
			life_speed_divisor: 10.0,
			friction: 0.97,
		}
	}
}

/// Ambient drifting particle field configuration.
#[derive(Clone, Debug)]
pub struct FieldStyle {
	/// Surface preparation before each frame.
	pub background: BackgroundPolicy,
	/// Particle color; alpha comes from each particle.
	pub color: Color,
	/// Particles per square pixel of surface.
	pub density: f64,
	/// Population cap.
	pub max_count: usize,
	/// Radius range start (px).
	pub radius_min: f64,
	/// Radius range width (px).
	pub radius_spread: f64,
	/// Initial velocity components are drawn from `±initial_speed`.
	pub initial_speed: f64,
	/// Opacity range start.
	pub opacity_min: f64,
	/// Opacity range width.
	pub opacity_spread: f64,
	/// Per-frame random walk applied to each velocity component.
	pub wander: f64,
	/// Velocity components are clamped to `±max_speed`.
	pub max_speed: f64,
	/// Pointer moves closer together than this are ignored (ms).
	pub pointer_throttle: f64,
	/// How long the pointer stays "active" after its last move (ms).
	pub pointer_timeout: f64,
	/// Maximum distance at which the pointer attracts particles (px).
	pub attraction_radius: f64,
	/// Numerator of the attraction force.
	pub attraction_strength: f64,
	/// Distances below this are clamped when computing the force.
	pub attraction_min_distance: f64,
}

impl Default for FieldStyle {
	fn default() -> Self {
		Self {
			background: BackgroundPolicy::Overlay(Color::rgba(0, 0, 0, 0.1)),
			color: Color::WHITE,
			density: 0.00005,
			max_count: 150,
			radius_min: 0.5,
			radius_spread: 1.5,
			initial_speed: 0.1,
			opacity_min: 0.3,
			opacity_spread: 0.5,
			wander: 0.01,
			max_speed: 0.5,
			pointer_throttle: 16.0,
			pointer_timeout: 100.0,
			attraction_radius: 150.0,
			attraction_strength: 0.5,
			attraction_min_distance: 10.0,
		}
	}
}

/// Shooting star parameters for one spawn source.
#[derive(Clone, Debug)]
pub struct MeteorStyle {
	/// Head length range start (px).
	pub length_min: f64,
	/// Head length range width (px).
	pub length_spread: f64,
	/// Speed range start (px per frame).
	pub speed_min: f64,
	/// Speed range width (px per frame).
	pub speed_spread: f64,
	/// Opacity range start.
	pub opacity_min: f64,
	/// Opacity range width.
	pub opacity_spread: f64,
	/// Line width range start (px).
	pub width_min: f64,
	/// Line width range width (px).
	pub width_spread: f64,
}

/// Starfield ("constellation background") configuration.
#[derive(Clone, Debug)]
pub struct StarfieldStyle {
	/// Sky gradient repainted every frame.
	pub background: BackgroundPolicy,
	/// Stars per square pixel of surface.
	pub star_density: f64,
	/// Star count cap.
	pub max_stars: usize,
	/// Stars get a radius in `[0, star_radius_max)`.
	pub star_radius_max: f64,
	/// Base star opacity range start.
	pub star_opacity_min: f64,
	/// Base star opacity range width.
	pub star_opacity_spread: f64,
	/// Twinkle speed range start.
	pub twinkle_speed_min: f64,
	/// Twinkle speed range width.
	pub twinkle_speed_spread: f64,
	/// Background constellations placed at init.
	pub constellation_count: usize,
	/// Nebulae placed at init.
	pub nebula_count: usize,
	/// Inner color of each nebula glow.
	pub nebula_color: Color,
	/// Random shooting star delay range (ms).
	pub meteor_interval: (f64, f64),
	/// Shooting stars spawned by the timer.
	pub random_meteor: MeteorStyle,
	/// Shooting stars spawned by clicks.
	pub click_meteor: MeteorStyle,
	/// Random deviation added to the outward angle of clicked meteors (total width, radians).
	pub click_angle_jitter: f64,
	/// Number of previous positions each meteor remembers.
	pub trail_length: usize,
	/// Meteors are culled once they leave the surface by more than this (px).
	pub cull_margin: f64,
	/// Stars within this fraction of `min(width, height)` of the focus point join it.
	pub focus_radius: f64,
	/// At most this many stars join the focus path.
	pub focus_max_stars: usize,
	/// CSS font of constellation labels.
	pub label_font: &'static str,
}

impl Default for StarfieldStyle {
	fn default() -> Self {
		Self {
			background: BackgroundPolicy::VerticalGradient(vec![
				(0.0, Color::rgb(10, 10, 26)),
				(0.5, Color::rgb(13, 13, 42)),
				(1.0, Color::rgb(0, 0, 0)),
			]),
			star_density: 0.00015,
			max_stars: 200,
			star_radius_max: 1.5,
			star_opacity_min: 0.2,
			star_opacity_spread: 0.8,
			twinkle_speed_min: 0.003,
			twinkle_speed_spread: 0.01,
			constellation_count: 4,
			nebula_count: 2,
			nebula_color: Color::rgba(120, 100, 200, 0.2),
			meteor_interval: (5000.0, 15000.0),
			random_meteor: MeteorStyle {
				length_min: 20.0,
				length_spread: 30.0,
				speed_min: 3.0,
				speed_spread: 7.0,
				opacity_min: 0.7,
				opacity_spread: 0.3,
				width_min: 1.0,
				width_spread: 2.0,
			},
			click_meteor: MeteorStyle {
				length_min: 20.0,
				length_spread: 30.0,
				speed_min: 5.0,
				speed_spread: 8.0,
				opacity_min: 0.8,
				opacity_spread: 0.2,
				width_min: 1.5,
				width_spread: 2.0,
			},
			click_angle_jitter: 0.5,
			trail_length: 10,
			cull_margin: 100.0,
			focus_radius: 0.15,
			focus_max_stars: 5,
			label_font: "10px 'Arial', sans-serif",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hsl_matches_css_reference_values() {
		assert_eq!(Color::hsl(0.0, 1.0, 0.5), Color::rgb(255, 0, 0));
		assert_eq!(Color::hsl(120.0, 1.0, 0.5), Color::rgb(0, 255, 0));
		assert_eq!(Color::hsl(240.0, 1.0, 0.5), Color::rgb(0, 0, 255));
		assert_eq!(Color::hsl(0.0, 0.0, 1.0), Color::WHITE);
	}

	#[test]
	fn to_css_uses_hex_when_opaque() {
		assert_eq!(Color::rgb(10, 10, 26).to_css(), "#0a0a1a");
		assert_eq!(
			Color::rgba(0, 0, 0, 0.1).to_css(),
			"rgba(0, 0, 0, 0.1)"
		);
	}
}
