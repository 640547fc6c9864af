//! orbit-folio: a space-themed portfolio page.
//!
//! A starfield backdrop with drifting constellations and shooting stars, an
//! ambient particle layer, a comet trail behind the pointer, navigation
//! "stars" that light up nearby sky when hovered, and a chat widget that talks
//! to the `/api/chat` proxy.

use std::time::Duration;

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod components;

pub use components::chat::ChatWidget;
pub use components::effects::{AmbientParticles, CometCursor, StarfieldBackground};

/// How long the backdrop runs at the full frame rate after load.
const INITIAL_LOAD: Duration = Duration::from_millis(3000);

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("orbit-folio: logging initialized");
}

/// A navigation anchor placed on the sky, in percent of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Section {
	/// Anchor id, also the section route.
	pub id: &'static str,
	/// Label under the star.
	pub name: &'static str,
	/// Horizontal position (percent of the viewport).
	pub x: f64,
	/// Vertical position (percent of the viewport).
	pub y: f64,
}

/// Navigation stars, in display order.
pub const SECTIONS: [Section; 7] = [
	Section { id: "about", name: "About", x: 20.0, y: 30.0 },
	Section { id: "work", name: "Work", x: 50.0, y: 30.0 },
	Section { id: "skills", name: "Skills", x: 80.0, y: 30.0 },
	Section { id: "blog", name: "Blog", x: 20.0, y: 70.0 },
	Section { id: "social", name: "Social", x: 50.0, y: 70.0 },
	Section { id: "side-projects", name: "Side-Projects", x: 20.0, y: 50.0 },
	Section { id: "contact", name: "Contact", x: 80.0, y: 70.0 },
];

/// Sky position of the section with `id`.
pub fn section_position(id: &str) -> Option<(f64, f64)> {
	SECTIONS.iter().find(|s| s.id == id).map(|s| (s.x, s.y))
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let (initial_load, set_initial_load) = signal(true);
	let (hovered, set_hovered) = signal(None::<&'static str>);
	let (active, set_active) = signal(None::<&'static str>);

	set_timeout(move || set_initial_load.set(false), INITIAL_LOAD);

	// Hover wins over the selected section.
	let focus = Signal::derive(move || hovered.get().or(active.get()).and_then(section_position));
	let is_lit = move |id: &'static str| hovered.get() == Some(id) || active.get() == Some(id);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Orbit Folio" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<main class="sky">
			<StarfieldBackground initial_load=initial_load focus=focus />
			<AmbientParticles />
			<CometCursor />

			<nav class="sky-nav">
				{SECTIONS
					.into_iter()
					.map(|section| {
						view! {
							<div
								class="nav-star"
								style=format!("left: {}%; top: {}%;", section.x, section.y)
								on:mouseenter=move |_| set_hovered.set(Some(section.id))
								on:mouseleave=move |_| set_hovered.set(None)
								on:click=move |_| {
									set_active.update(|a| {
										*a = if *a == Some(section.id) { None } else { Some(section.id) };
									})
								}
							>
								<div class="nav-star-dot" class:lit=move || is_lit(section.id) />
								<p class="nav-star-label">{section.name}</p>
							</div>
						}
					})
					.collect_view()}
			</nav>

			<ChatWidget />
		</main>
	}
}
