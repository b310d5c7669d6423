//! Unveil Core
//!
//! Foundational types shared by the Unveil crates:
//!
//! - **Geometry**: points, sizes and rectangles in viewport space, with
//!   intersection ratios
//! - **Root Margins**: CSS-style offsets that grow or shrink the intersection root
//! - **Element Handles**: non-owning references to the host's elements and the
//!   [`BoundsSource`] trait used to measure them
//!
//! # Example
//!
//! ```rust
//! use unveil_core::{Rect, RootMargin};
//!
//! let viewport = Rect::new(0.0, 0.0, 1280.0, 800.0);
//! let card = Rect::new(0.0, 720.0, 400.0, 160.0);
//!
//! // Half of the card is above the fold
//! assert_eq!(card.intersection_ratio(&viewport), 0.5);
//!
//! // Shrinking the root by 100px at the bottom hides it completely
//! let margin: RootMargin = "0px 0px -100px 0px".parse().unwrap();
//! assert_eq!(card.intersection_ratio(&margin.apply(viewport)), 0.0);
//! ```

pub mod element;
pub mod geometry;
pub mod margin;

pub use element::{BoundsSource, ElementRef, ElementSlot};
pub use geometry::{Point, Rect, Size};
pub use margin::{MarginParseError, MarginValue, RootMargin};
