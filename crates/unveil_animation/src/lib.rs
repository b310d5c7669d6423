//! Unveil Animation
//!
//! Timing primitives for scroll reveals.
//!
//! # Features
//!
//! - **Easing**: CSS-style named curves and custom cubic beziers
//! - **Delay Queue**: Deterministic scheduling of delayed transitions, with cancellation
//! - **Entrance Transitions**: Fade, slide and scale presets sampled into visual frames
//! - **Count-Up**: Eased numeric counters for stat sections

pub mod counter;
pub mod delay_queue;
pub mod easing;
pub mod transition;

pub use counter::CountUp;
pub use delay_queue::{DelayQueue, TimerId};
pub use easing::Easing;
pub use transition::{
    EntrancePreset, EntranceTransition, Interpolate, SlideDirection, VisualFrame,
};
