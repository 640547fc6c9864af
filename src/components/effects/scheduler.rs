//! Cancellable per-frame callback chain.
//!
//! A [`FrameScheduler`] asks its [`FrameHost`] for one frame at a time and
//! re-requests after every callback, so cancelling only needs to revoke the
//! single pending request. Throttling skips the handler but keeps the chain
//! alive.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::Window;

/// Host-assigned identifier of a pending frame request.
pub type FrameId = i32;

/// One-shot frame callback receiving the host timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Source of frame callbacks (the browser's animation frames, or a manual pump).
pub trait FrameHost: 'static {
	/// Schedule `callback` for the next frame. `None` if the host refused.
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameId>;
	/// Revoke a pending request. Unknown ids are ignored.
	fn cancel_frame(&self, id: FrameId);
}

/// Host timestamps jitter around the refresh interval; frames this close to
/// the target interval still count as due.
const FRAME_TOLERANCE_MS: f64 = 1.0;

/// Minimum-interval frame limiter.
#[derive(Clone, Debug, Default)]
pub struct Throttle {
	min_interval: f64,
	last: Option<f64>,
}

impl Throttle {
	/// `None` or a non-positive rate disables throttling.
	pub fn new(target_fps: Option<f64>) -> Self {
		let mut throttle = Self::default();
		throttle.set_target_fps(target_fps);
		throttle
	}

	/// Change the rate limit; see [`Throttle::new`].
	pub fn set_target_fps(&mut self, target_fps: Option<f64>) {
		self.min_interval = match target_fps {
			Some(fps) if fps > 0.0 && fps.is_finite() => 1000.0 / fps,
			_ => 0.0,
		};
	}

	/// Whether a frame at `now` should run. Accepted frames become the new reference point.
	pub fn accept(&mut self, now: f64) -> bool {
		if let Some(last) = self.last {
			if now - last + FRAME_TOLERANCE_MS < self.min_interval {
				return false;
			}
		}
		self.last = Some(now);
		true
	}
}

struct Shared<H> {
	host: H,
	handler: RefCell<Box<dyn FnMut(f64)>>,
	throttle: RefCell<Throttle>,
	pending: Cell<Option<FrameId>>,
	cancelled: Cell<bool>,
}

/// Runs a handler once per accepted frame until cancelled or dropped.
pub struct FrameScheduler<H: FrameHost> {
	shared: Rc<Shared<H>>,
}

impl<H: FrameHost> FrameScheduler<H> {
	/// Request the first frame and keep calling `handler` until cancelled.
	pub fn start(host: H, target_fps: Option<f64>, handler: impl FnMut(f64) + 'static) -> Self {
		let shared = Rc::new(Shared {
			host,
			handler: RefCell::new(Box::new(handler)),
			throttle: RefCell::new(Throttle::new(target_fps)),
			pending: Cell::new(None),
			cancelled: Cell::new(false),
		});
		request(&shared);
		Self { shared }
	}

	/// Change the rate limit of a running chain.
	pub fn set_target_fps(&self, target_fps: Option<f64>) {
		self.shared.throttle.borrow_mut().set_target_fps(target_fps);
	}

	/// Stop the chain. No handler invocation happens after this returns.
	pub fn cancel(&self) {
		if self.shared.cancelled.replace(true) {
			return;
		}
		if let Some(id) = self.shared.pending.take() {
			self.shared.host.cancel_frame(id);
		}
		debug!("orbit-folio: frame scheduler cancelled");
	}

	/// Whether [`FrameScheduler::cancel`] has run.
	pub fn is_cancelled(&self) -> bool {
		self.shared.cancelled.get()
	}
}

impl<H: FrameHost> Drop for FrameScheduler<H> {
	fn drop(&mut self) {
		self.cancel();
	}
}

fn request<H: FrameHost>(shared: &Rc<Shared<H>>) {
	let weak: Weak<Shared<H>> = Rc::downgrade(shared);
	let id = shared.host.request_frame(Box::new(move |now| {
		if let Some(shared) = weak.upgrade() {
			on_frame(&shared, now);
		}
	}));
	if id.is_none() {
		warn!("orbit-folio: host refused a frame request, animation stopped");
	}
	shared.pending.set(id);
}

fn on_frame<H: FrameHost>(shared: &Rc<Shared<H>>, now: f64) {
	shared.pending.set(None);
	if shared.cancelled.get() {
		return;
	}
	if shared.throttle.borrow_mut().accept(now) {
		(shared.handler.borrow_mut())(now);
	}
	if !shared.cancelled.get() {
		request(shared);
	}
}

/// Browser animation frames via `requestAnimationFrame`.
pub struct BrowserHost {
	window: Window,
}

impl BrowserHost {
	/// `None` outside a browser window.
	pub fn new() -> Option<Self> {
		web_sys::window().map(|window| Self { window })
	}
}

impl FrameHost for BrowserHost {
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameId> {
		let closure = Closure::once_into_js(move |now: f64| callback(now));
		match self
			.window
			.request_animation_frame(closure.unchecked_ref())
		{
			Ok(id) => Some(id),
			Err(err) => {
				warn!("orbit-folio: requestAnimationFrame failed: {err:?}");
				None
			}
		}
	}

	fn cancel_frame(&self, id: FrameId) {
		let _ = self.window.cancel_animation_frame(id);
	}
}

/// Headless host whose frames run only when [`ManualHost::pump`] is called.
#[derive(Clone, Default)]
pub struct ManualHost {
	queue: Rc<RefCell<Vec<(FrameId, FrameCallback)>>>,
	next_id: Rc<Cell<FrameId>>,
}

impl ManualHost {
	/// A host with nothing pending.
	pub fn new() -> Self {
		Self::default()
	}

	/// Run every callback that was pending when this was called. Returns how many ran.
	pub fn pump(&self, now: f64) -> usize {
		let due = std::mem::take(&mut *self.queue.borrow_mut());
		let count = due.len();
		for (_, callback) in due {
			callback(now);
		}
		count
	}

	/// Number of outstanding frame requests.
	pub fn pending(&self) -> usize {
		self.queue.borrow().len()
	}
}

impl FrameHost for ManualHost {
	fn request_frame(&self, callback: FrameCallback) -> Option<FrameId> {
		let id = self.next_id.get().wrapping_add(1);
		self.next_id.set(id);
		self.queue.borrow_mut().push((id, callback));
		Some(id)
	}

	fn cancel_frame(&self, id: FrameId) {
		self.queue.borrow_mut().retain(|(pending, _)| *pending != id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn counter() -> (Rc<Cell<usize>>, impl FnMut(f64) + 'static) {
		let count = Rc::new(Cell::new(0));
		let inner = count.clone();
		(count, move |_| inner.set(inner.get() + 1))
	}

	#[test]
	fn one_invocation_per_frame_without_throttle() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let _scheduler = FrameScheduler::start(host.clone(), None, handler);

		for i in 0..10 {
			assert_eq!(host.pump(f64::from(i) * 16.0), 1);
		}
		assert_eq!(count.get(), 10);
		assert_eq!(host.pending(), 1);
	}

	#[test]
	fn throttle_skips_frames_but_keeps_scheduling() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let _scheduler = FrameScheduler::start(host.clone(), Some(30.0), handler);

		// 50 Hz host, 30 fps target: frames at 0, 40, 80, ... pass.
		for i in 0..10 {
			host.pump(f64::from(i) * 20.0);
		}
		assert_eq!(count.get(), 5);
		assert_eq!(host.pending(), 1);
	}

	#[test]
	fn half_rate_on_a_60hz_host_takes_every_other_frame() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let _scheduler = FrameScheduler::start(host.clone(), Some(30.0), handler);

		for i in 0..60 {
			host.pump(f64::from(i) * (1000.0 / 60.0));
		}
		assert_eq!(count.get(), 30);
	}

	#[test]
	fn jittery_host_at_full_rate_keeps_every_frame() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let _scheduler = FrameScheduler::start(host.clone(), Some(60.0), handler);

		let mut now = 0.0;
		for i in 0..60 {
			host.pump(now);
			now += if i % 2 == 0 { 16.2 } else { 17.1 };
		}
		assert_eq!(count.get(), 60);
	}

	#[test]
	fn target_rate_can_change_while_running() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let scheduler = FrameScheduler::start(host.clone(), Some(60.0), handler);

		for i in 0..4 {
			host.pump(f64::from(i) * 20.0);
		}
		assert_eq!(count.get(), 4);

		scheduler.set_target_fps(Some(30.0));
		for i in 4..8 {
			host.pump(f64::from(i) * 20.0);
		}
		assert_eq!(count.get(), 6);
	}

	#[test]
	fn cancel_is_final() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let scheduler = FrameScheduler::start(host.clone(), None, handler);

		host.pump(0.0);
		scheduler.cancel();
		assert!(scheduler.is_cancelled());
		assert_eq!(host.pending(), 0);

		for i in 1..5 {
			assert_eq!(host.pump(f64::from(i) * 16.0), 0);
		}
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn dropping_the_scheduler_cancels_it() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		drop(FrameScheduler::start(host.clone(), None, handler));

		assert_eq!(host.pending(), 0);
		host.pump(0.0);
		assert_eq!(count.get(), 0);
	}

	#[test]
	fn callback_already_dequeued_does_not_fire_after_cancel() {
		let host = ManualHost::new();
		let (count, handler) = counter();
		let scheduler = FrameScheduler::start(host.clone(), None, handler);

		// Grab the pending callback as a host would just before dispatching it.
		let stale = std::mem::take(&mut *host.queue.borrow_mut());
		scheduler.cancel();
		for (_, callback) in stale {
			callback(0.0);
		}
		assert_eq!(count.get(), 0);
	}

	#[test]
	fn throttle_accepts_first_frame_and_respects_interval() {
		let mut throttle = Throttle::new(Some(10.0));
		assert!(throttle.accept(5.0));
		assert!(!throttle.accept(103.0));
		assert!(throttle.accept(104.0));
		assert!(!throttle.accept(150.0));
		assert!(Throttle::new(Some(0.0)).accept(0.0));
	}
}
