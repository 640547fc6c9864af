//! Canvas particle effects.
//!
//! Three full-viewport effects share one small engine:
//! - a surface owner holding the effect state, its size, and a seeded RNG
//! - emitters turning pointer moves, clicks, and timers into particles
//! - a per-frame simulation step followed by a read-only render pass
//! - a cancellable, optionally throttled frame scheduler
//!
//! # Example
//!
//! ```ignore
//! use orbit_folio::components::effects::{CometCursor, StarfieldBackground};
//!
//! let (focus, _) = signal(None::<(f64, f64)>);
//! view! {
//!     <StarfieldBackground initial_load=true focus=focus />
//!     <CometCursor />
//! }
//! ```

mod comet;
mod component;
mod emitter;
mod field;
mod particle;
mod render;
pub mod scheduler;
mod starfield;
pub mod surface;
pub mod theme;
pub mod types;

pub use comet::CometTrail;
pub use component::{AmbientParticles, CometCursor, StarfieldBackground};
pub use field::ParticleField;
pub use particle::{Lifetime, Meteor, Particle, ParticleSet};
pub use render::{Paint, Painter};
pub use starfield::Starfield;
pub use surface::{Effect, SurfaceOwner};
pub use types::{Bounds, FrameContext, Trigger};
