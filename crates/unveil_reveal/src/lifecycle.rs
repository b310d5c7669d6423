//! Registration lifecycle
//!
//! Views attach their element slot when they mount and drop the returned
//! [`RevealHandle`] when they unmount. The [`LifecycleManager`] keeps the
//! tracker's registrations in step with the live handles:
//!
//! - a slot that is still empty is parked and retried on every update
//! - attaching an element that is already attached hands back a clone of the
//!   existing handle
//! - when the last clone of a handle is dropped the registration, its state
//!   machine and any scheduled reveal go away with it

use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use unveil_core::{ElementRef, ElementSlot};

use crate::config::RevealConfig;
use crate::machine::RevealMachines;
use crate::tracker::{ObservedId, VisibilityTracker};

new_key_type! {
    /// Identifies one attachment (one live handle family)
    pub struct AttachmentId;
}

/// Position of an element within a revealed list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadePosition {
    pub index: usize,
    pub total: usize,
}

impl CascadePosition {
    /// A standalone element (first and only item)
    pub const SINGLE: CascadePosition = CascadePosition { index: 0, total: 1 };

    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}

/// Receives releases from dropped handles
pub(crate) trait ReleaseSink {
    fn release(&self, attachment: AttachmentId);
}

struct HandleInner {
    attachment: AttachmentId,
    sink: Weak<dyn ReleaseSink>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        // Coordinator already gone: nothing left to release
        if let Some(sink) = self.sink.upgrade() {
            sink.release(self.attachment);
        }
    }
}

/// Keeps an element's reveal registration alive
///
/// Clones share one registration, which is released when the last clone is
/// dropped (or passed to [`release`](Self::release)).
#[derive(Clone)]
pub struct RevealHandle {
    inner: Rc<HandleInner>,
}

impl RevealHandle {
    pub fn attachment(&self) -> AttachmentId {
        self.inner.attachment
    }

    /// Give up this clone of the handle
    pub fn release(self) {
        drop(self);
    }

    /// Whether both handles share one registration
    pub fn ptr_eq(&self, other: &RevealHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live clones of this handle
    pub fn clone_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl fmt::Debug for RevealHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealHandle")
            .field("attachment", &self.inner.attachment)
            .field("clones", &Rc::strong_count(&self.inner))
            .finish()
    }
}

/// Bookkeeping for one attached slot
#[derive(Debug)]
pub struct Attachment {
    slot: ElementSlot,
    config: RevealConfig,
    position: CascadePosition,
    /// Element the registration was made for, fixed once registered
    element: Option<ElementRef>,
    observed: Option<ObservedId>,
    handle: Weak<HandleInner>,
}

impl Attachment {
    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn position(&self) -> CascadePosition {
        self.position
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.element
    }

    pub fn observed(&self) -> Option<ObservedId> {
        self.observed
    }

    pub fn is_parked(&self) -> bool {
        self.observed.is_none()
    }
}

#[derive(Debug, Default)]
pub struct LifecycleManager {
    attachments: SlotMap<AttachmentId, Attachment>,
    by_element: FxHashMap<ElementRef, AttachmentId>,
    by_observed: FxHashMap<ObservedId, AttachmentId>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a slot, registering it now if it is filled
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn attach(
        &mut self,
        slot: &ElementSlot,
        config: &RevealConfig,
        position: CascadePosition,
        sink: Weak<dyn ReleaseSink>,
        tracker: &mut VisibilityTracker,
        machines: &mut RevealMachines,
        now: Duration,
    ) -> RevealHandle {
        if let Some(element) = slot.get() {
            if let Some(existing) = self.live_handle_for(element) {
                tracing::debug!("{} already attached, sharing its handle", element);
                return existing;
            }
        }

        // An element still held by a dead handle whose release is queued
        // parks below until that release lands
        let attachment = self.attachments.insert(Attachment {
            slot: slot.clone(),
            config: *config,
            position,
            element: None,
            observed: None,
            handle: Weak::new(),
        });

        let inner = Rc::new(HandleInner { attachment, sink });
        if let Some(entry) = self.attachments.get_mut(attachment) {
            entry.handle = Rc::downgrade(&inner);
        }

        if !self.try_register(attachment, tracker, machines, now) {
            tracing::trace!("slot not rendered yet, parking {:?}", attachment);
        }

        RevealHandle { inner }
    }

    /// Register every parked attachment whose slot has since been filled
    ///
    /// Returns the number of new registrations.
    pub(crate) fn retry_parked(
        &mut self,
        tracker: &mut VisibilityTracker,
        machines: &mut RevealMachines,
        now: Duration,
    ) -> usize {
        let parked: Vec<AttachmentId> = self
            .attachments
            .iter()
            .filter(|(_, a)| a.is_parked())
            .map(|(id, _)| id)
            .collect();

        let mut registered = 0;
        for id in parked {
            if self.try_register(id, tracker, machines, now) {
                registered += 1;
            }
        }
        registered
    }

    fn try_register(
        &mut self,
        attachment: AttachmentId,
        tracker: &mut VisibilityTracker,
        machines: &mut RevealMachines,
        now: Duration,
    ) -> bool {
        let Some(entry) = self.attachments.get(attachment) else {
            return false;
        };
        let Some(element) = entry.slot.get() else {
            return false;
        };
        // Another attachment owns this element; wait until it lets go
        if self.by_element.contains_key(&element) {
            return false;
        }

        let Some(observed) = tracker.register(Some(element), &entry.config, now) else {
            return false;
        };
        machines.insert(observed, entry.config.trigger_once());

        if let Some(entry) = self.attachments.get_mut(attachment) {
            entry.element = Some(element);
            entry.observed = Some(observed);
        }
        self.by_element.insert(element, attachment);
        self.by_observed.insert(observed, attachment);
        true
    }

    /// Remove an attachment and its registration
    ///
    /// Returns the registration that was removed, if the attachment had one.
    /// Unknown attachments are ignored.
    pub(crate) fn release(
        &mut self,
        attachment: AttachmentId,
        tracker: &mut VisibilityTracker,
        machines: &mut RevealMachines,
    ) -> Option<ObservedId> {
        let entry = self.attachments.remove(attachment)?;

        if let Some(element) = entry.element {
            self.by_element.remove(&element);
        }

        let observed = entry.observed?;
        self.by_observed.remove(&observed);
        tracker.unregister(observed);
        machines.remove(observed);

        tracing::trace!("released {}", observed);
        Some(observed)
    }

    fn live_handle_for(&self, element: ElementRef) -> Option<RevealHandle> {
        let attachment = self.by_element.get(&element)?;
        let inner = self.attachments.get(*attachment)?.handle.upgrade()?;
        Some(RevealHandle { inner })
    }

    pub fn get(&self, attachment: AttachmentId) -> Option<&Attachment> {
        self.attachments.get(attachment)
    }

    pub fn attachment_for(&self, observed: ObservedId) -> Option<&Attachment> {
        let id = self.by_observed.get(&observed)?;
        self.attachments.get(*id)
    }

    pub fn observed_for(&self, attachment: AttachmentId) -> Option<ObservedId> {
        self.attachments.get(attachment)?.observed
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn parked_count(&self) -> usize {
        self.attachments.values().filter(|a| a.is_parked()).count()
    }
}
