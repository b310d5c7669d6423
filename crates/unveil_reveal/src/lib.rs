//! Unveil Reveal
//!
//! Scroll-triggered reveals: elements register for viewport observation and,
//! once visible, move from hidden to revealed independently of one another.
//!
//! # Features
//!
//! - **Visibility Tracker**: registry of observed elements, grouped onto one
//!   intersection observer per threshold, margin and root
//! - **Reveal State Machines**: `Hidden -> Revealing -> Revealed` per element,
//!   once-only or repeatable
//! - **Lifecycle**: attach on mount, release on drop, with parking for views
//!   that have not rendered yet
//! - **Cascades**: list items reveal one after another
//! - **Coordinator**: a single frame-driven entry point with reveal listeners
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use unveil_core::{ElementRef, ElementSlot, Rect};
//! use unveil_reveal::{RevealConfig, RevealCoordinator, RevealState};
//!
//! let coordinator = RevealCoordinator::new();
//! let config = RevealConfig::builder().threshold(0.3).build().unwrap();
//!
//! // Four team cards, 100ms apart
//! let slots: Vec<ElementSlot> = (0..4).map(|_| ElementSlot::new()).collect();
//! let handles: Vec<_> = slots
//!     .iter()
//!     .enumerate()
//!     .map(|(i, slot)| coordinator.attach_item(slot, &config, i, 4))
//!     .collect();
//!
//! // The view renders
//! for (i, slot) in slots.iter().enumerate() {
//!     slot.set(ElementRef::new(i as u64));
//! }
//!
//! let layout = |e: ElementRef| Some(Rect::new(e.to_raw() as f32 * 300.0, 100.0, 280.0, 400.0));
//! let viewport = Rect::new(0.0, 0.0, 1280.0, 800.0);
//!
//! coordinator.update(viewport, &layout, Duration::ZERO);
//! assert_eq!(coordinator.state_of(&handles[0]), Some(RevealState::Revealed));
//! assert_eq!(coordinator.state_of(&handles[3]), Some(RevealState::Revealing));
//!
//! coordinator.advance(Duration::from_millis(300));
//! assert_eq!(coordinator.state_of(&handles[3]), Some(RevealState::Revealed));
//! ```

pub mod cascade;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod machine;
pub mod observer;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use cascade::{cascade_delay, cascade_delays};
pub use config::{
    CascadeConfig, RevealConfig, RevealConfigBuilder, RevealConfigSpec, StaggerDirection,
    DEFAULT_CASCADE_STEP_MS, DEFAULT_THRESHOLD,
};
pub use coordinator::{CoordinatorHandle, ListenerId, RevealCoordinator};
pub use error::ConfigError;
pub use lifecycle::{AttachmentId, CascadePosition, LifecycleManager, RevealHandle};
pub use machine::{RevealMachine, RevealMachines, RevealState, RevealTransition};
pub use observer::{IntersectionObserver, ObserverEntry, ObserverKey};
pub use tracker::{ObservedElement, ObservedId, VisibilityEvent, VisibilityTracker};
