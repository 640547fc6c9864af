//! Surface ownership: one drawing surface, one effect, one particle lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use fastrand::Rng;
use log::debug;

use super::render::Painter;
use super::scheduler::{FrameHost, FrameScheduler};
use super::types::{Bounds, FrameContext, Trigger};

/// A particle effect: emission policy, simulation step, and renderer.
///
/// The owning [`SurfaceOwner`] guarantees that `step` and `render` are only
/// called on a non-empty surface, that `init` runs exactly once before the
/// first `step`, and that within one frame `step` always completes before
/// `render`.
pub trait Effect {
	/// Build persistent state for a freshly sized surface.
	fn init(&mut self, bounds: Bounds, rng: &mut Rng);
	/// The surface changed size after `init`.
	fn resize(&mut self, from: Bounds, to: Bounds);
	/// Route an input event to the emitter.
	fn trigger(&mut self, trigger: Trigger, bounds: Bounds, rng: &mut Rng);
	/// Advance the simulation by one frame.
	fn step(&mut self, frame: &FrameContext, bounds: Bounds, rng: &mut Rng);
	/// Draw the current state. Must not change it.
	fn render(&self, painter: &mut dyn Painter, frame: &FrameContext, bounds: Bounds);
	/// Number of transient particles currently alive.
	fn live_particles(&self) -> usize;
}

/// Owns one effect instance together with its surface size and random source.
pub struct SurfaceOwner<E> {
	effect: E,
	bounds: Bounds,
	/// Last non-empty size, the reference for proportional rescaling.
	sized: Bounds,
	rng: Rng,
	frames: u64,
	initialized: bool,
}

impl<E: Effect> SurfaceOwner<E> {
	/// Owner of an unsized surface; `effect` is initialized on the first non-empty resize.
	pub fn new(effect: E, seed: u64) -> Self {
		Self {
			effect,
			bounds: Bounds::default(),
			sized: Bounds::default(),
			rng: Rng::with_seed(seed),
			frames: 0,
			initialized: false,
		}
	}

	/// Current surface size, possibly empty.
	pub fn bounds(&self) -> Bounds {
		self.bounds
	}

	/// The effect state.
	pub fn effect(&self) -> &E {
		&self.effect
	}

	/// The effect state, for external updates such as a new focus point.
	pub fn effect_mut(&mut self) -> &mut E {
		&mut self.effect
	}

	/// Frames simulated so far.
	pub fn frames(&self) -> u64 {
		self.frames
	}

	/// Adopt new surface dimensions. The first non-empty size initializes the effect.
	pub fn resize(&mut self, width: f64, height: f64) {
		let to = Bounds::new(width, height);
		if to.is_empty() {
			self.bounds = to;
			return;
		}
		if !self.initialized {
			self.effect.init(to, &mut self.rng);
			self.initialized = true;
			debug!("orbit-folio: surface initialized at {}x{}", to.width, to.height);
		} else if to != self.sized {
			self.effect.resize(self.sized, to);
		}
		self.bounds = to;
		self.sized = to;
	}

	/// Route an input event to the effect. Ignored while the surface is unsized.
	pub fn trigger(&mut self, trigger: Trigger) {
		if !self.initialized || self.bounds.is_empty() {
			return;
		}
		self.effect.trigger(trigger, self.bounds, &mut self.rng);
	}

	/// Simulate one frame without drawing it.
	pub fn step(&mut self, now: f64) -> Option<FrameContext> {
		if !self.initialized || self.bounds.is_empty() {
			return None;
		}
		let frame = FrameContext {
			now,
			frame: self.frames,
		};
		self.effect.step(&frame, self.bounds, &mut self.rng);
		self.frames += 1;
		Some(frame)
	}

	/// Simulate then render one frame.
	pub fn frame(&mut self, now: f64, painter: &mut dyn Painter) {
		if let Some(frame) = self.step(now) {
			self.effect.render(painter, &frame, self.bounds);
		}
	}
}

/// Drive `owner` on `host`, rendering into `painter` every accepted frame.
pub fn animate<E, H, P>(
	owner: Rc<RefCell<SurfaceOwner<E>>>,
	mut painter: P,
	host: H,
	target_fps: Option<f64>,
) -> FrameScheduler<H>
where
	E: Effect + 'static,
	H: FrameHost,
	P: Painter + 'static,
{
	FrameScheduler::start(host, target_fps, move |now| {
		owner.borrow_mut().frame(now, &mut painter);
	})
}
