//! Viewport geometry
//!
//! Points, sizes and rectangles in the viewport's coordinate space, plus the
//! intersection math the visibility observers are built on.

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn area(&self) -> f32 {
        self.size.area()
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Grow each edge outward by the given amounts (negative values shrink)
    ///
    /// The resulting size is clamped at zero so a heavily shrunk root never
    /// turns inside out.
    pub fn outset(&self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x - left, self.origin.y - top),
            size: Size::new(
                (self.size.width + left + right).max(0.0),
                (self.size.height + top + bottom).max(0.0),
            ),
        }
    }

    /// Overlapping region of two rects
    ///
    /// Returns `Some` for rects that merely touch along an edge (zero-area
    /// intersection), `None` when they are apart.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.origin.x.max(other.origin.x);
        let top = self.origin.y.max(other.origin.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Fraction of this rect's area that lies inside `root`, in `[0, 1]`
    ///
    /// A zero-area rect counts as fully inside when it touches the root at
    /// all, so empty placeholders still report as visible.
    pub fn intersection_ratio(&self, root: &Rect) -> f32 {
        match self.intersection(root) {
            None => 0.0,
            Some(overlap) => {
                let area = self.area();
                if area <= 0.0 {
                    1.0
                } else {
                    (overlap.area() / area).clamp(0.0, 1.0)
                }
            }
        }
    }
}
