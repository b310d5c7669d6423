//! Intersection observers
//!
//! An [`IntersectionObserver`] watches a set of targets against one root
//! (the viewport or a scroll container) with one threshold and one root
//! margin. Each [`check`](IntersectionObserver::check) measures every target
//! and reports the ones whose intersecting state changed.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use smallvec::SmallVec;
use unveil_core::{BoundsSource, ElementRef, Rect, RootMargin};

use crate::tracker::ObservedId;

/// Identity of an observer: targets with equal keys share one observer
#[derive(Clone, Copy, Debug)]
pub struct ObserverKey {
    threshold: f32,
    root_margin: RootMargin,
    root: Option<ElementRef>,
}

impl ObserverKey {
    pub fn new(threshold: f32, root_margin: RootMargin, root: Option<ElementRef>) -> Self {
        Self {
            threshold: threshold + 0.0,
            root_margin,
            root,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn root_margin(&self) -> RootMargin {
        self.root_margin
    }

    pub fn root(&self) -> Option<ElementRef> {
        self.root
    }
}

impl PartialEq for ObserverKey {
    fn eq(&self, other: &Self) -> bool {
        self.threshold.to_bits() == other.threshold.to_bits()
            && self.root_margin == other.root_margin
            && self.root == other.root
    }
}

impl Eq for ObserverKey {}

impl Hash for ObserverKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.threshold.to_bits().hash(state);
        self.root_margin.hash(state);
        self.root.hash(state);
    }
}

/// One intersection change reported by a check
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverEntry {
    pub id: ObservedId,
    pub is_intersecting: bool,
    pub ratio: f32,
}

/// Batch of entries from one check; most checks change only a few targets
pub type EntryBatch = SmallVec<[ObserverEntry; 8]>;

#[derive(Clone, Copy, Debug)]
struct Target {
    element: ElementRef,
    /// Last reported state, `None` until the first check
    last: Option<bool>,
}

#[derive(Debug)]
pub struct IntersectionObserver {
    key: ObserverKey,
    targets: IndexMap<ObservedId, Target>,
}

impl IntersectionObserver {
    pub fn new(key: ObserverKey) -> Self {
        Self {
            key,
            targets: IndexMap::new(),
        }
    }

    pub fn key(&self) -> &ObserverKey {
        &self.key
    }

    pub fn observe(&mut self, id: ObservedId, element: ElementRef) {
        self.targets.insert(
            id,
            Target {
                element,
                last: None,
            },
        );
    }

    /// Stop watching a target; returns whether it was watched
    pub fn unobserve(&mut self, id: ObservedId) -> bool {
        self.targets.shift_remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The root rectangle after the margin, or `None` when the root element
    /// is not laid out
    pub fn root_rect(&self, viewport: Rect, bounds: &dyn BoundsSource) -> Option<Rect> {
        let root = match self.key.root {
            Some(element) => bounds.bounds(element)?,
            None => viewport,
        };
        Some(self.key.root_margin.apply(root))
    }

    /// Measure every target and return the ones whose state changed
    ///
    /// The first measurement of a target is reported only when it is
    /// intersecting. Targets (or a root) without bounds count as not
    /// intersecting.
    pub fn check(&mut self, viewport: Rect, bounds: &dyn BoundsSource) -> EntryBatch {
        let root = self.root_rect(viewport, bounds);
        let threshold = self.key.threshold;
        let mut entries = EntryBatch::new();

        for (id, target) in self.targets.iter_mut() {
            let (is_intersecting, ratio) = match (root, bounds.bounds(target.element)) {
                (Some(root), Some(rect)) => measure(&rect, &root, threshold),
                _ => (false, 0.0),
            };

            let report = match target.last {
                None => is_intersecting,
                Some(last) => last != is_intersecting,
            };
            target.last = Some(is_intersecting);

            if report {
                entries.push(ObserverEntry {
                    id: *id,
                    is_intersecting,
                    ratio,
                });
            }
        }

        entries
    }
}

/// Threshold zero accepts edge contact; any other threshold needs that
/// fraction of the target inside the root.
fn measure(target: &Rect, root: &Rect, threshold: f32) -> (bool, f32) {
    if target.intersection(root).is_none() {
        return (false, 0.0);
    }
    let ratio = target.intersection_ratio(root);
    let is_intersecting = if threshold <= 0.0 {
        true
    } else {
        ratio >= threshold
    };
    (is_intersecting, ratio)
}
