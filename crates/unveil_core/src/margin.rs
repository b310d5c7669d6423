//! Root margins
//!
//! A root margin grows or shrinks the intersection root before visibility is
//! measured. It is written with the same shorthand as a CSS margin:
//!
//! ```rust
//! use unveil_core::{Rect, RootMargin};
//!
//! // Trigger 100px before an element scrolls into view
//! let margin: RootMargin = "0px 0px 100px 0px".parse().unwrap();
//! let root = margin.apply(Rect::new(0.0, 0.0, 800.0, 600.0));
//! assert_eq!(root.height(), 700.0);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::Rect;

/// Errors produced while parsing a root margin
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarginParseError {
    #[error("root margin is empty")]
    Empty,
    #[error("root margin takes 1 to 4 values, got {0}")]
    TooManyValues(usize),
    #[error("invalid root margin value '{0}': expected a length in px or %")]
    InvalidValue(String),
}

/// One side of a root margin
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginValue {
    /// Absolute offset in pixels
    Px(f32),
    /// Offset as a percentage of the root's extent along that axis
    Percent(f32),
}

impl MarginValue {
    pub const ZERO: MarginValue = MarginValue::Px(0.0);

    /// Resolve to pixels against the root's width or height
    pub fn resolve(&self, extent: f32) -> f32 {
        match *self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => extent * pct / 100.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            MarginValue::Px(v) | MarginValue::Percent(v) => v.is_finite(),
        }
    }

    fn key_bits(&self) -> (u8, u32) {
        match *self {
            MarginValue::Px(v) => (0, normalize_zero(v).to_bits()),
            MarginValue::Percent(v) => (1, normalize_zero(v).to_bits()),
        }
    }
}

fn normalize_zero(v: f32) -> f32 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl FromStr for MarginValue {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MarginParseError::InvalidValue(s.to_string());

        let (number, percent) = if let Some(n) = s.strip_suffix("px") {
            (n, false)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, true)
        } else if s == "0" {
            return Ok(MarginValue::ZERO);
        } else {
            return Err(invalid());
        };

        let value: f32 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }

        Ok(if percent {
            MarginValue::Percent(value)
        } else {
            MarginValue::Px(value)
        })
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(v) => write!(f, "{}px", v),
            MarginValue::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// Signed offsets applied to each edge of the intersection root
///
/// Positive values grow the root (elements count as visible earlier),
/// negative values shrink it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: MarginValue::ZERO,
        right: MarginValue::ZERO,
        bottom: MarginValue::ZERO,
        left: MarginValue::ZERO,
    };

    /// Same pixel offset on every edge
    pub fn uniform_px(px: f32) -> Self {
        let v = MarginValue::Px(px);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Apply the margin to a root rectangle
    pub fn apply(&self, root: Rect) -> Rect {
        let w = root.width();
        let h = root.height();
        root.outset(
            self.top.resolve(h),
            self.right.resolve(w),
            self.bottom.resolve(h),
            self.left.resolve(w),
        )
    }

    /// Parsed margins are always finite; hand-built ones may not be
    pub fn is_finite(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(MarginValue::is_finite)
    }

    pub fn is_zero(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.resolve(1.0) == 0.0)
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(str::parse::<MarginValue>)
            .collect::<Result<Vec<_>, _>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [] => return Err(MarginParseError::Empty),
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            more => return Err(MarginParseError::TooManyValues(more.len())),
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

// Margins key observer pools, so equality has to be total. Compare bit
// patterns with -0.0 folded into 0.0.
impl Eq for RootMargin {}

impl Hash for RootMargin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.top.key_bits().hash(state);
        self.right.key_bits().hash(state);
        self.bottom.key_bits().hash(state);
        self.left.key_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let one: RootMargin = "10px".parse().unwrap();
        assert_eq!(one, RootMargin::uniform_px(10.0));

        let two: RootMargin = "-10% 0px".parse().unwrap();
        assert_eq!(two.top, MarginValue::Percent(-10.0));
        assert_eq!(two.bottom, MarginValue::Percent(-10.0));
        assert_eq!(two.left, MarginValue::Px(0.0));

        let three: RootMargin = "1px 2px 3px".parse().unwrap();
        assert_eq!(three.top, MarginValue::Px(1.0));
        assert_eq!(three.right, MarginValue::Px(2.0));
        assert_eq!(three.bottom, MarginValue::Px(3.0));
        assert_eq!(three.left, MarginValue::Px(2.0));

        let four: RootMargin = "1px 2px 3px 4px".parse().unwrap();
        assert_eq!(four.left, MarginValue::Px(4.0));

        let bare_zero: RootMargin = "0".parse().unwrap();
        assert!(bare_zero.is_zero());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<RootMargin>(), Err(MarginParseError::Empty));
        assert_eq!("   ".parse::<RootMargin>(), Err(MarginParseError::Empty));
        assert_eq!(
            "1px 2px 3px 4px 5px".parse::<RootMargin>(),
            Err(MarginParseError::TooManyValues(5))
        );
        assert!(matches!(
            "10em".parse::<RootMargin>(),
            Err(MarginParseError::InvalidValue(v)) if v == "10em"
        ));
        assert!("px".parse::<RootMargin>().is_err());
        assert!("NaNpx".parse::<RootMargin>().is_err());
    }

    #[test]
    fn test_apply_percent_uses_axis_extent() {
        let margin: RootMargin = "-10% -5%".parse().unwrap();
        let root = margin.apply(Rect::new(0.0, 0.0, 1000.0, 500.0));

        // 10% of height off top and bottom, 5% of width off left and right
        assert_eq!(root, Rect::new(50.0, 50.0, 900.0, 400.0));
    }

    #[test]
    fn test_negative_zero_hashes_equal() {
        use std::collections::hash_map::DefaultHasher;

        let a = RootMargin::uniform_px(0.0);
        let b = RootMargin::uniform_px(-0.0);
        assert_eq!(a, b);

        let hash = |m: &RootMargin| {
            let mut h = DefaultHasher::new();
            m.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_hand_built_margins_can_be_non_finite() {
        assert!(RootMargin::uniform_px(10.0).is_finite());
        assert!(!RootMargin::uniform_px(f32::NAN).is_finite());

        let mut margin = RootMargin::ZERO;
        margin.bottom = MarginValue::Percent(f32::NEG_INFINITY);
        assert!(!margin.is_finite());
    }

    #[test]
    fn test_display_round_trips() {
        let margin: RootMargin = "0px 0px -20% 0px".parse().unwrap();
        let again: RootMargin = margin.to_string().parse().unwrap();
        assert_eq!(margin, again);
    }
}
