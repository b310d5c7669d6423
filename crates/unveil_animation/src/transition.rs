//! Entrance transitions
//!
//! Describes how an element moves from its hidden pre-reveal look to its
//! final look once its reveal starts. Each preset defines a starting
//! [`VisualFrame`]; the end frame is always [`VisualFrame::IDENTITY`].
//!
//! # Example
//!
//! ```rust
//! use unveil_animation::{EntranceTransition, VisualFrame};
//!
//! // The team cards: fade in while rising 50px over half a second
//! let enter = EntranceTransition::fade_up(50.0);
//!
//! assert_eq!(enter.sample_at(0), enter.hidden_frame());
//! assert_eq!(enter.sample_at(500), VisualFrame::IDENTITY);
//! ```

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Default entrance duration (ms)
pub const DEFAULT_DURATION_MS: u32 = 500;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// The visual treatment applied to an element at one instant
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualFrame {
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl VisualFrame {
    /// Fully visible, untransformed
    pub const IDENTITY: VisualFrame = VisualFrame {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for VisualFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Interpolate for VisualFrame {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        VisualFrame {
            opacity: self.opacity.lerp(&other.opacity, t),
            translate_x: self.translate_x.lerp(&other.translate_x, t),
            translate_y: self.translate_y.lerp(&other.translate_y, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

/// Edge an element slides in from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideDirection {
    Left,
    Right,
    Top,
    Bottom,
}

/// Starting pose of an entrance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "kebab-case")]
pub enum EntrancePreset {
    /// Opacity only
    FadeIn,
    /// Fade while rising from `distance` px below
    FadeUp { distance: f32 },
    /// Fade while sliding in from an edge
    SlideIn {
        direction: SlideDirection,
        distance: f32,
    },
    /// Fade while growing from `from` scale
    ScaleIn { from: f32 },
    /// Appear without animating
    Instant,
}

impl EntrancePreset {
    fn start_frame(&self) -> VisualFrame {
        let hidden = VisualFrame {
            opacity: 0.0,
            ..VisualFrame::IDENTITY
        };
        match *self {
            EntrancePreset::FadeIn => hidden,
            EntrancePreset::FadeUp { distance } => VisualFrame {
                translate_y: distance,
                ..hidden
            },
            EntrancePreset::SlideIn {
                direction,
                distance,
            } => match direction {
                SlideDirection::Left => VisualFrame {
                    translate_x: -distance,
                    ..hidden
                },
                SlideDirection::Right => VisualFrame {
                    translate_x: distance,
                    ..hidden
                },
                SlideDirection::Top => VisualFrame {
                    translate_y: -distance,
                    ..hidden
                },
                SlideDirection::Bottom => VisualFrame {
                    translate_y: distance,
                    ..hidden
                },
            },
            EntrancePreset::ScaleIn { from } => VisualFrame {
                scale: from,
                ..hidden
            },
            EntrancePreset::Instant => hidden,
        }
    }
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MS
}

/// A preset plus its timing
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntranceTransition {
    #[serde(flatten)]
    pub preset: EntrancePreset,
    #[serde(default = "default_duration")]
    pub duration_ms: u32,
    #[serde(default)]
    pub easing: Easing,
}

impl EntranceTransition {
    pub fn new(preset: EntrancePreset) -> Self {
        Self {
            preset,
            duration_ms: DEFAULT_DURATION_MS,
            easing: Easing::default(),
        }
    }

    pub fn fade_in() -> Self {
        Self::new(EntrancePreset::FadeIn)
    }

    pub fn fade_up(distance: f32) -> Self {
        Self::new(EntrancePreset::FadeUp { distance })
    }

    pub fn slide_in(direction: SlideDirection, distance: f32) -> Self {
        Self::new(EntrancePreset::SlideIn {
            direction,
            distance,
        })
    }

    pub fn scale_in(from: f32) -> Self {
        Self::new(EntrancePreset::ScaleIn { from })
    }

    pub fn instant() -> Self {
        Self {
            preset: EntrancePreset::Instant,
            duration_ms: 0,
            easing: Easing::Linear,
        }
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// The look before the reveal starts
    pub fn hidden_frame(&self) -> VisualFrame {
        self.preset.start_frame()
    }

    /// Sample at linear progress `t` in `[0, 1]`
    pub fn sample(&self, t: f32) -> VisualFrame {
        let eased = self.easing.apply(t);
        self.hidden_frame().lerp(&VisualFrame::IDENTITY, eased)
    }

    /// Sample `elapsed_ms` after the reveal started
    pub fn sample_at(&self, elapsed_ms: u64) -> VisualFrame {
        if elapsed_ms >= self.duration_ms as u64 {
            return VisualFrame::IDENTITY;
        }
        self.sample(elapsed_ms as f32 / self.duration_ms as f32)
    }

    /// Whether the entrance has finished `elapsed_ms` after it started
    pub fn is_complete(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.duration_ms as u64
    }
}

impl Default for EntranceTransition {
    fn default() -> Self {
        Self::fade_up(30.0)
    }
}
