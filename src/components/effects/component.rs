//! Leptos components mounting the canvas effects.
//!
//! Each component owns one full-viewport canvas. Once the canvas exists, a
//! [`MountedSurface`] is built from it: the 2d context, a [`SurfaceOwner`], the
//! window listeners feeding it, and the frame chain drawing it. Unmounting
//! drops the `MountedSurface`, which stops frames before detaching listeners.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use leptos::html::Canvas;
use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent, Window,
};

use super::comet::CometTrail;
use super::field::ParticleField;
use super::scheduler::{BrowserHost, FrameScheduler};
use super::starfield::Starfield;
use super::surface::{Effect as SurfaceEffect, SurfaceOwner, animate};
use super::theme::{CometStyle, FieldStyle, StarfieldStyle};
use super::types::Trigger;

const INITIAL_FPS: f64 = 60.0;
const SETTLED_FPS: f64 = 30.0;

/// A live effect bound to a canvas.
struct MountedSurface<E: SurfaceEffect> {
	// Field order is drop order: frames stop before listeners detach.
	scheduler: FrameScheduler<BrowserHost>,
	listeners: Vec<EventListener>,
	owner: Rc<RefCell<SurfaceOwner<E>>>,
}

impl<E: SurfaceEffect + 'static> MountedSurface<E> {
	fn mount(canvas: HtmlCanvasElement, effect: E, target_fps: Option<f64>) -> Option<Self> {
		let window = web_sys::window()?;
		let Some(ctx) = context_2d(&canvas) else {
			warn!("orbit-folio: canvas has no 2d context, effect disabled");
			return None;
		};
		let host = BrowserHost::new()?;

		let owner = Rc::new(RefCell::new(SurfaceOwner::new(effect, random_seed())));
		fit_to_viewport(&window, &canvas, &owner);

		let scheduler = animate(owner.clone(), ctx, host, target_fps);
		let mut mounted = Self {
			scheduler,
			listeners: Vec::new(),
			owner,
		};

		let (resize_window, resize_canvas) = (window.clone(), canvas.clone());
		mounted.listen(&window, "resize", move |owner, _| {
			let (w, h) = viewport_size(&resize_window);
			resize_canvas.set_width(w as u32);
			resize_canvas.set_height(h as u32);
			owner.resize(w, h);
		});
		Some(mounted)
	}

	/// Forward events of `kind` on `target` to the surface owner.
	fn listen(
		&mut self,
		target: &EventTarget,
		kind: &'static str,
		mut handler: impl FnMut(&mut SurfaceOwner<E>, &Event) + 'static,
	) {
		let owner = self.owner.clone();
		self.listeners.push(EventListener::new(target, kind, move |event| {
			if let Ok(mut owner) = owner.try_borrow_mut() {
				handler(&mut owner, event);
			}
		}));
	}

	/// Route pointer moves on `target` to the effect as [`Trigger::PointerMove`].
	fn forward_pointer(&mut self, target: &EventTarget, kind: &'static str) {
		self.listen(target, kind, |owner, event| {
			if let Some((x, y)) = pointer_position(event) {
				owner.trigger(Trigger::PointerMove {
					x,
					y,
					at: event.time_stamp(),
				});
			}
		});
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	(dimension(window.inner_width()), dimension(window.inner_height()))
}

fn fit_to_viewport<E: SurfaceEffect>(
	window: &Window,
	canvas: &HtmlCanvasElement,
	owner: &RefCell<SurfaceOwner<E>>,
) {
	let (w, h) = viewport_size(window);
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	owner.borrow_mut().resize(w, h);
	debug!("orbit-folio: canvas sized to {w}x{h}");
}

fn random_seed() -> u64 {
	(js_sys::Math::random() * u64::MAX as f64) as u64
}

/// Viewport position of a mouse event or the first touch point.
fn pointer_position(event: &Event) -> Option<(f64, f64)> {
	if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
		return Some((f64::from(mouse.client_x()), f64::from(mouse.client_y())));
	}
	let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;
	Some((f64::from(touch.client_x()), f64::from(touch.client_y())))
}

type Slot<E> = Rc<RefCell<Option<MountedSurface<E>>>>;

/// Mount an effect on `canvas_ref` once it renders, and tear it down on unmount.
fn use_surface<E: SurfaceEffect + 'static>(
	canvas_ref: NodeRef<Canvas>,
	make: impl Fn() -> E + 'static,
	target_fps: impl Fn() -> Option<f64> + 'static,
	wire: impl Fn(&mut MountedSurface<E>, &Window) + 'static,
) -> Slot<E> {
	let slot: Slot<E> = Rc::new(RefCell::new(None));
	let slot_mount = slot.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let mounted = MountedSurface::mount(canvas, make(), target_fps()).map(|mut mounted| {
			wire(&mut mounted, &window);
			mounted
		});
		*slot_mount.borrow_mut() = mounted;
	});

	let slot_cleanup = SendWrapper::new(slot.clone());
	on_cleanup(move || {
		if slot_cleanup.borrow_mut().take().is_some() {
			debug!("orbit-folio: effect surface unmounted");
		}
	});

	slot
}

const OVERLAY_STYLE: &str =
	"position: fixed; inset: 0; width: 100vw; height: 100vh; pointer-events: none;";

/// Bluish comet trail following the mouse or the first touch point.
#[component]
pub fn CometCursor() -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	use_surface(
		canvas_ref,
		|| CometTrail::new(CometStyle::default()),
		|| None,
		|mounted, window| {
			mounted.forward_pointer(window, "mousemove");
			mounted.forward_pointer(window, "touchmove");
		},
	);

	view! { <canvas node_ref=canvas_ref class="comet-cursor" style=format!("{OVERLAY_STYLE} z-index: 50;") /> }
}

/// Slowly drifting white motes, drawn towards the pointer.
#[component]
pub fn AmbientParticles() -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	use_surface(
		canvas_ref,
		|| ParticleField::new(FieldStyle::default()),
		|| None,
		|mounted, window| mounted.forward_pointer(window, "mousemove"),
	);

	view! { <canvas node_ref=canvas_ref class="ambient-particles" style=format!("{OVERLAY_STYLE} z-index: 1;") /> }
}

/// Starfield backdrop with clickable shooting stars.
///
/// `initial_load` selects the frame rate (60 fps while true, 30 fps after).
/// `focus` highlights stars around a point given in percent of the viewport.
#[component]
pub fn StarfieldBackground(
	#[prop(into)] initial_load: Signal<bool>,
	#[prop(into)] focus: Signal<Option<(f64, f64)>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	let fps = move |initial: bool| Some(if initial { INITIAL_FPS } else { SETTLED_FPS });

	let slot = use_surface(
		canvas_ref,
		move || {
			let mut starfield = Starfield::new(StarfieldStyle::default());
			starfield.set_focus(focus.get_untracked());
			starfield
		},
		move || fps(initial_load.get_untracked()),
		|_, _| {},
	);

	let slot_fps = slot.clone();
	Effect::new(move |_| {
		let target = fps(initial_load.get());
		if let Some(mounted) = slot_fps.borrow().as_ref() {
			mounted.scheduler.set_target_fps(target);
		}
	});

	let slot_focus = slot.clone();
	Effect::new(move |_| {
		let focus = focus.get();
		if let Some(mounted) = slot_focus.borrow().as_ref() {
			mounted.owner.borrow_mut().effect_mut().set_focus(focus);
		}
	});

	let on_click = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			f64::from(ev.client_x()) - rect.left(),
			f64::from(ev.client_y()) - rect.top(),
		);
		if let Some(mounted) = slot.borrow().as_ref() {
			mounted.owner.borrow_mut().trigger(Trigger::Click { x, y });
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="starfield"
			on:click=on_click
			style="position: absolute; inset: 0; z-index: 0; cursor: pointer;"
		/>
	}
}
