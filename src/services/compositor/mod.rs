//! Compositor backends: the host side of the dimming engine.
//!
//! The engine only talks to the [`Compositor`] trait. `sway` drives a real
//! session through `swaymsg`, `simulated` keeps an in-memory window table
//! for dry runs and tests.

mod simulated;
mod sway;
mod r#trait;

pub use self::r#trait::{Compositor, DIM_EFFECT_NAME};
pub use simulated::{AttachedEffect, SimulatedCompositor};
pub use sway::{SwayCompositor, SwayTree};
