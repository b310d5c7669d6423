//! Element handles owned by the presentation layer
//!
//! The reveal machinery never owns UI elements. Views hand it an
//! [`ElementRef`] (typically a layout node id) and answer bounds queries for
//! it through [`BoundsSource`].

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;

use crate::geometry::Rect;

/// Opaque, copyable reference to an element in the host's render tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(u64);

impl ElementRef {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Answers "where is this element right now?"
///
/// Returns `None` for elements that are not laid out (unmounted, collapsed,
/// or unknown to the host). Such elements are treated as not intersecting.
pub trait BoundsSource {
    fn bounds(&self, element: ElementRef) -> Option<Rect>;
}

impl<F> BoundsSource for F
where
    F: Fn(ElementRef) -> Option<Rect>,
{
    fn bounds(&self, element: ElementRef) -> Option<Rect> {
        self(element)
    }
}

impl<S: BuildHasher> BoundsSource for HashMap<ElementRef, Rect, S> {
    fn bounds(&self, element: ElementRef) -> Option<Rect> {
        self.get(&element).copied()
    }
}

/// A view's reference cell for its element
///
/// Empty until the view renders, then filled with the element it produced.
/// Cloning shares the same cell, so a view can keep one clone and hand
/// another to the reveal coordinator before it has rendered.
#[derive(Clone, Default)]
pub struct ElementSlot {
    inner: Rc<Cell<Option<ElementRef>>>,
}

impl ElementSlot {
    /// An empty slot (view not rendered yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds an element
    pub fn filled(element: ElementRef) -> Self {
        let slot = Self::new();
        slot.set(element);
        slot
    }

    pub fn set(&self, element: ElementRef) {
        self.inner.set(Some(element));
    }

    pub fn clear(&self) {
        self.inner.set(None);
    }

    pub fn get(&self) -> Option<ElementRef> {
        self.inner.get()
    }

    pub fn is_filled(&self) -> bool {
        self.get().is_some()
    }
}

impl fmt::Debug for ElementSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementSlot").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_slot_shared_between_clones() {
        let slot = ElementSlot::new();
        let view_side = slot.clone();
        assert!(!slot.is_filled());

        view_side.set(ElementRef::new(7));
        assert_eq!(slot.get(), Some(ElementRef::new(7)));

        view_side.clear();
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_bounds_from_map_and_closure() {
        let mut map = FxHashMap::default();
        map.insert(ElementRef::new(1), Rect::new(0.0, 10.0, 100.0, 50.0));

        assert_eq!(
            map.bounds(ElementRef::new(1)),
            Some(Rect::new(0.0, 10.0, 100.0, 50.0))
        );
        assert_eq!(map.bounds(ElementRef::new(2)), None);

        let fixed = |_: ElementRef| Some(Rect::ZERO);
        assert_eq!(fixed.bounds(ElementRef::new(99)), Some(Rect::ZERO));
    }
}
