//! Visibility tracker
//!
//! Keeps the registry of observed elements and their current visibility.
//! Elements are grouped onto one [`IntersectionObserver`] per distinct
//! [`ObserverKey`]; changes found by [`VisibilityTracker::check`] are queued
//! as [`VisibilityEvent`]s and handed out by
//! [`VisibilityTracker::drain_events`].

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use unveil_core::{BoundsSource, ElementRef, Rect};

use crate::config::RevealConfig;
use crate::observer::{IntersectionObserver, ObserverKey};

/// Identifier of one registration
///
/// Allocated from a counter that only moves forward, so an identifier is
/// never handed out twice within a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservedId(u64);

impl ObservedId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scroll-element-{}", self.0)
    }
}

/// A registered element
#[derive(Clone, Copy, Debug)]
pub struct ObservedElement {
    pub id: ObservedId,
    pub element: ElementRef,
    pub visible: bool,
    pub registered_at: Duration,
    pub observer: ObserverKey,
}

/// Intersecting state change of one registration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityEvent {
    pub id: ObservedId,
    pub is_intersecting: bool,
    pub ratio: f32,
}

#[derive(Debug, Default)]
pub struct VisibilityTracker {
    next_id: u64,
    elements: FxHashMap<ObservedId, ObservedElement>,
    by_element: FxHashMap<ElementRef, ObservedId>,
    observers: IndexMap<ObserverKey, IntersectionObserver>,
    events: VecDeque<VisibilityEvent>,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `element` with `config`'s threshold and root
    ///
    /// Returns `None` without doing anything when there is no element yet or
    /// the element is already registered.
    pub fn register(
        &mut self,
        element: Option<ElementRef>,
        config: &RevealConfig,
        now: Duration,
    ) -> Option<ObservedId> {
        let Some(element) = element else {
            tracing::trace!("register skipped: no element");
            return None;
        };

        if let Some(existing) = self.by_element.get(&element) {
            tracing::debug!("register skipped: {} already observed as {}", element, existing);
            return None;
        }

        let id = ObservedId(self.next_id);
        self.next_id += 1;

        let key = config.observer_key();
        self.observers
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(
                    "creating observer (threshold {}, margin {})",
                    key.threshold(),
                    key.root_margin()
                );
                IntersectionObserver::new(key)
            })
            .observe(id, element);

        self.elements.insert(
            id,
            ObservedElement {
                id,
                element,
                visible: false,
                registered_at: now,
                observer: key,
            },
        );
        self.by_element.insert(element, id);

        tracing::trace!("registered {} for {}", id, element);
        Some(id)
    }

    /// Stop observing `id` and forget it
    ///
    /// Undelivered events for `id` are discarded. Unknown ids are ignored, so
    /// calling this twice is the same as calling it once.
    pub fn unregister(&mut self, id: ObservedId) -> bool {
        let Some(entry) = self.elements.remove(&id) else {
            return false;
        };
        self.by_element.remove(&entry.element);

        if let Some(observer) = self.observers.get_mut(&entry.observer) {
            observer.unobserve(id);
            if observer.is_empty() {
                self.observers.shift_remove(&entry.observer);
                tracing::debug!("dropped observer with no targets");
            }
        }

        self.events.retain(|event| event.id != id);

        tracing::trace!("unregistered {}", id);
        true
    }

    /// Run every observer and queue an event for each change
    ///
    /// Returns the number of events queued.
    pub fn check(&mut self, viewport: Rect, bounds: &dyn BoundsSource) -> usize {
        let mut queued = 0;

        for observer in self.observers.values_mut() {
            for entry in observer.check(viewport, bounds) {
                let Some(element) = self.elements.get_mut(&entry.id) else {
                    continue;
                };
                element.visible = entry.is_intersecting;
                self.events.push_back(VisibilityEvent {
                    id: entry.id,
                    is_intersecting: entry.is_intersecting,
                    ratio: entry.ratio,
                });
                queued += 1;
            }
        }

        queued
    }

    /// Take all queued events, oldest first
    pub fn drain_events(&mut self) -> impl Iterator<Item = VisibilityEvent> + '_ {
        self.events.drain(..)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn is_visible(&self, id: ObservedId) -> bool {
        self.elements.get(&id).is_some_and(|e| e.visible)
    }

    pub fn get(&self, id: ObservedId) -> Option<&ObservedElement> {
        self.elements.get(&id)
    }

    pub fn id_for(&self, element: ElementRef) -> Option<ObservedId> {
        self.by_element.get(&element).copied()
    }

    pub fn contains(&self, id: ObservedId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
