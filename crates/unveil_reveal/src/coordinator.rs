//! Reveal coordinator
//!
//! Ties the tracker, the state machines, the lifecycle manager and the delay
//! queue together behind one frame-driven entry point.
//!
//! ```rust
//! use std::time::Duration;
//! use rustc_hash::FxHashMap;
//! use unveil_core::{ElementRef, ElementSlot, Rect};
//! use unveil_reveal::{RevealConfig, RevealCoordinator, RevealState};
//!
//! let coordinator = RevealCoordinator::new();
//! let card = ElementRef::new(1);
//! let handle = coordinator.attach(&ElementSlot::filled(card), &RevealConfig::default());
//!
//! let mut layout = FxHashMap::default();
//! layout.insert(card, Rect::new(0.0, 200.0, 300.0, 200.0));
//!
//! let viewport = Rect::new(0.0, 0.0, 1280.0, 800.0);
//! coordinator.update(viewport, &layout, Duration::ZERO);
//! assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
//! ```
//!
//! Listeners are called after the coordinator's own state has been unlocked,
//! so they may attach, release or query freely. A handle dropped while the
//! coordinator is mid-update is released as soon as the update unwinds.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use unveil_animation::{DelayQueue, TimerId, VisualFrame};
use unveil_core::{BoundsSource, ElementSlot, Rect};

use crate::cascade::cascade_delay;
use crate::config::RevealConfig;
use crate::lifecycle::{
    AttachmentId, CascadePosition, LifecycleManager, ReleaseSink, RevealHandle,
};
use crate::machine::{RevealMachines, RevealState, RevealTransition};
use crate::tracker::{ObservedId, VisibilityEvent, VisibilityTracker};

new_key_type! {
    /// Identifies a reveal listener
    pub struct ListenerId;
}

type Listener = Rc<dyn Fn(&RevealTransition)>;

// ============================================================================
// Internal state
// ============================================================================

#[derive(Default)]
struct CoordinatorState {
    tracker: VisibilityTracker,
    machines: RevealMachines,
    lifecycle: LifecycleManager,
    timers: DelayQueue<ObservedId>,
    scheduled: FxHashMap<ObservedId, TimerId>,
    notifications: VecDeque<RevealTransition>,
}

impl CoordinatorState {
    fn release(&mut self, attachment: AttachmentId) {
        let Some(observed) =
            self.lifecycle
                .release(attachment, &mut self.tracker, &mut self.machines)
        else {
            return;
        };
        self.cancel_reveal(observed);
        self.notifications.retain(|t| t.id != observed);
    }

    fn process_events(&mut self, now: Duration) {
        let events: SmallVec<[VisibilityEvent; 8]> = self.tracker.drain_events().collect();

        for event in events {
            let Some(transition) = self.machines.handle_visibility(&event) else {
                continue;
            };
            match transition.to {
                RevealState::Revealing => self.schedule_reveal(transition.id, now),
                RevealState::Hidden => self.cancel_reveal(transition.id),
                RevealState::Revealed => {}
            }
            tracing::debug!(
                "{}: {:?} -> {:?} (ratio {:.2})",
                transition.id,
                transition.from,
                transition.to,
                event.ratio
            );
            self.notifications.push_back(transition);
        }
    }

    fn schedule_reveal(&mut self, id: ObservedId, now: Duration) {
        let Some(attachment) = self.lifecycle.attachment_for(id) else {
            return;
        };
        let position = attachment.position();
        let delay = cascade_delay(position.index, position.total, attachment.config().cascade());

        let timer = self
            .timers
            .schedule(now, Duration::from_millis(delay as u64), id);
        if let Some(previous) = self.scheduled.insert(id, timer) {
            self.timers.cancel(previous);
        }
        tracing::trace!("{} reveals in {}ms", id, delay);
    }

    fn cancel_reveal(&mut self, id: ObservedId) {
        if let Some(timer) = self.scheduled.remove(&id) {
            self.timers.cancel(timer);
            tracing::trace!("cancelled pending reveal of {}", id);
        }
    }

    fn fire_due(&mut self, now: Duration) {
        let due: SmallVec<[(TimerId, ObservedId); 8]> = self.timers.pop_due(now).collect();

        for (timer, id) in due {
            if self.scheduled.get(&id) != Some(&timer) {
                continue;
            }
            self.scheduled.remove(&id);

            if let Some(transition) = self.machines.start_animation(id, now) {
                tracing::debug!("{}: revealed at {:?}", id, now);
                self.notifications.push_back(transition);
            }
        }
    }

    fn state_of(&self, attachment: AttachmentId) -> Option<RevealState> {
        let entry = self.lifecycle.get(attachment)?;
        match entry.observed() {
            Some(id) => self.machines.state(id),
            None => Some(RevealState::Hidden),
        }
    }
}

struct Shared {
    state: RefCell<CoordinatorState>,
    listeners: RefCell<SlotMap<ListenerId, Listener>>,
    deferred_releases: RefCell<Vec<AttachmentId>>,
    dispatching: Cell<bool>,
}

impl ReleaseSink for Shared {
    fn release(&self, attachment: AttachmentId) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.release(attachment),
            Err(_) => {
                tracing::trace!("coordinator busy, deferring release of {:?}", attachment);
                self.deferred_releases.borrow_mut().push(attachment);
            }
        }
    }
}

impl Shared {
    fn apply_deferred_releases(&self) {
        let pending = std::mem::take(&mut *self.deferred_releases.borrow_mut());
        if pending.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        for attachment in pending {
            state.release(attachment);
        }
    }

    fn is_registered(&self, id: ObservedId) -> bool {
        self.state.borrow().machines.contains(id)
    }

    fn next_notification(&self) -> Option<RevealTransition> {
        let mut state = self.state.borrow_mut();
        while let Some(transition) = state.notifications.pop_front() {
            if state.machines.contains(transition.id) {
                return Some(transition);
            }
        }
        None
    }

    /// Deliver queued transitions to listeners
    ///
    /// Re-entrant calls (a listener driving the coordinator) only queue; the
    /// outermost call delivers everything.
    fn dispatch(&self) {
        if self.dispatching.replace(true) {
            return;
        }
        let _guard = DispatchGuard(&self.dispatching);

        loop {
            self.apply_deferred_releases();
            let Some(transition) = self.next_notification() else {
                break;
            };

            let listeners: SmallVec<[Listener; 4]> =
                self.listeners.borrow().values().cloned().collect();
            for listener in listeners {
                // An earlier listener may have released it
                if !self.is_registered(transition.id) {
                    break;
                }
                listener(&transition);
            }
        }

        self.apply_deferred_releases();
    }
}

struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Coordinates scroll reveals for one page or scroll container
///
/// Not `Clone`: listeners that need to reach back into the coordinator should
/// capture a [`CoordinatorHandle`] instead, so no reference cycle forms.
pub struct RevealCoordinator {
    shared: Rc<Shared>,
}

impl RevealCoordinator {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(CoordinatorState::default()),
                listeners: RefCell::new(SlotMap::with_key()),
                deferred_releases: RefCell::new(Vec::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Weak handle for listeners and other long-lived observers
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            inner: Rc::downgrade(&self.shared),
        }
    }

    /// Attach a standalone element
    pub fn attach(&self, slot: &ElementSlot, config: &RevealConfig) -> RevealHandle {
        self.attach_at(slot, config, CascadePosition::SINGLE, Duration::ZERO)
    }

    /// Attach item `index` of a list of `total`, staggered by the config's cascade
    pub fn attach_item(
        &self,
        slot: &ElementSlot,
        config: &RevealConfig,
        index: usize,
        total: usize,
    ) -> RevealHandle {
        self.attach_at(slot, config, CascadePosition::new(index, total), Duration::ZERO)
    }

    /// Attach with an explicit position and registration timestamp
    pub fn attach_at(
        &self,
        slot: &ElementSlot,
        config: &RevealConfig,
        position: CascadePosition,
        now: Duration,
    ) -> RevealHandle {
        self.shared.apply_deferred_releases();

        let sink: Weak<Shared> = Rc::downgrade(&self.shared);
        let sink: Weak<dyn ReleaseSink> = sink;
        let mut state = self.shared.state.borrow_mut();
        let state = &mut *state;
        state.lifecycle.attach(
            slot,
            config,
            position,
            sink,
            &mut state.tracker,
            &mut state.machines,
            now,
        )
    }

    /// Release a handle clone; same as dropping it
    pub fn release(&self, handle: RevealHandle) {
        handle.release();
        self.shared.apply_deferred_releases();
    }

    /// Run one frame: register newly rendered elements, measure, advance
    /// state machines, fire due reveals and notify listeners
    pub fn update(&self, viewport: Rect, bounds: &dyn BoundsSource, now: Duration) {
        self.shared.apply_deferred_releases();
        {
            let mut state = self.shared.state.borrow_mut();
            let state = &mut *state;

            let registered =
                state
                    .lifecycle
                    .retry_parked(&mut state.tracker, &mut state.machines, now);
            if registered > 0 {
                tracing::trace!("registered {} parked elements", registered);
            }

            state.tracker.check(viewport, bounds);
            state.process_events(now);
            state.fire_due(now);
        }
        self.shared.dispatch();
    }

    /// Fire due reveals without measuring
    pub fn advance(&self, now: Duration) {
        self.shared.apply_deferred_releases();
        self.shared.state.borrow_mut().fire_due(now);
        self.shared.dispatch();
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RevealTransition) + 'static,
    {
        self.shared.listeners.borrow_mut().insert(Rc::new(listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.listeners.borrow_mut().remove(id).is_some()
    }

    pub fn state(&self, id: ObservedId) -> Option<RevealState> {
        self.shared.state.borrow().machines.state(id)
    }

    /// State behind a handle; parked handles report `Hidden`
    pub fn state_of(&self, handle: &RevealHandle) -> Option<RevealState> {
        self.shared.state.borrow().state_of(handle.attachment())
    }

    /// Registration behind a handle, once its element has rendered
    pub fn observed_id(&self, handle: &RevealHandle) -> Option<ObservedId> {
        self.shared
            .state
            .borrow()
            .lifecycle
            .observed_for(handle.attachment())
    }

    pub fn is_visible(&self, id: ObservedId) -> bool {
        self.shared.state.borrow().tracker.is_visible(id)
    }

    /// Number of elements currently observed
    pub fn live_registrations(&self) -> usize {
        self.shared.state.borrow().tracker.len()
    }

    /// Number of live attachments, parked ones included
    pub fn attachments(&self) -> usize {
        self.shared.state.borrow().lifecycle.len()
    }

    pub fn observer_count(&self) -> usize {
        self.shared.state.borrow().tracker.observer_count()
    }

    /// Number of reveals waiting for their cascade delay
    pub fn pending_reveals(&self) -> usize {
        self.shared.state.borrow().scheduled.len()
    }

    /// When the next pending reveal is due
    pub fn next_reveal_due(&self) -> Option<Duration> {
        self.shared.state.borrow().timers.next_due()
    }

    /// The frame to draw for a handle's element at `now`
    ///
    /// Hidden and waiting elements get their transition's starting frame;
    /// revealed ones are sampled from the moment their animation started.
    /// Released or unknown handles draw as fully visible.
    pub fn visual_frame(&self, handle: &RevealHandle, now: Duration) -> VisualFrame {
        let state = self.shared.state.borrow();
        let Some(entry) = state.lifecycle.get(handle.attachment()) else {
            return VisualFrame::IDENTITY;
        };
        let transition = entry.config().transition();

        let started = entry
            .observed()
            .and_then(|id| state.machines.get(id))
            .and_then(|machine| machine.animation_started());

        match started {
            Some(started) => {
                let elapsed = now.saturating_sub(started);
                transition.sample_at(elapsed.as_millis() as u64)
            }
            None => transition.hidden_frame(),
        }
    }
}

impl Default for RevealCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to a [`RevealCoordinator`]
///
/// Safe to capture in listeners. Queries return `None` once the coordinator
/// is gone, or while it is in the middle of an update.
#[derive(Clone)]
pub struct CoordinatorHandle {
    inner: Weak<Shared>,
}

impl CoordinatorHandle {
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn state(&self, id: ObservedId) -> Option<RevealState> {
        let shared = self.inner.upgrade()?;
        let state = shared.state.try_borrow().ok()?;
        state.machines.state(id)
    }

    pub fn state_of(&self, handle: &RevealHandle) -> Option<RevealState> {
        let shared = self.inner.upgrade()?;
        let state = shared.state.try_borrow().ok()?;
        state.state_of(handle.attachment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unveil_core::ElementRef;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 800.0)
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_zero_delay_reveals_in_one_update() {
        let coordinator = RevealCoordinator::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        coordinator.subscribe(move |t| sink.borrow_mut().push(t.to));

        let handle = coordinator.attach(
            &ElementSlot::filled(ElementRef::new(1)),
            &RevealConfig::default(),
        );
        let on_screen = |_: ElementRef| Some(Rect::new(0.0, 0.0, 100.0, 100.0));
        coordinator.update(viewport(), &on_screen, ms(0));

        assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
        assert_eq!(
            *seen.borrow(),
            vec![RevealState::Revealing, RevealState::Revealed]
        );
    }

    #[test]
    fn test_delayed_item_waits() {
        let coordinator = RevealCoordinator::new();
        let config = RevealConfig::builder().cascade_step_ms(200).build().unwrap();
        let handle = coordinator.attach_item(
            &ElementSlot::filled(ElementRef::new(1)),
            &config,
            2,
            3,
        );

        let on_screen = |_: ElementRef| Some(Rect::new(0.0, 0.0, 100.0, 100.0));
        coordinator.update(viewport(), &on_screen, ms(1000));
        assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealing));
        assert_eq!(coordinator.pending_reveals(), 1);
        assert_eq!(coordinator.next_reveal_due(), Some(ms(1400)));

        coordinator.advance(ms(1399));
        assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealing));

        coordinator.advance(ms(1400));
        assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
        assert_eq!(coordinator.pending_reveals(), 0);
    }

    #[test]
    fn test_visual_frame_follows_state() {
        let coordinator = RevealCoordinator::new();
        let config = RevealConfig::builder().cascade_step_ms(0).build().unwrap();
        let handle = coordinator.attach(&ElementSlot::filled(ElementRef::new(1)), &config);

        let hidden = coordinator.visual_frame(&handle, ms(0));
        assert_eq!(hidden, config.transition().hidden_frame());
        assert_eq!(hidden.opacity, 0.0);

        let on_screen = |_: ElementRef| Some(Rect::new(0.0, 0.0, 100.0, 100.0));
        coordinator.update(viewport(), &on_screen, ms(100));

        assert_eq!(coordinator.visual_frame(&handle, ms(100)).opacity, 0.0);
        let mid = coordinator.visual_frame(&handle, ms(350));
        assert!(mid.opacity > 0.0 && mid.opacity < 1.0);
        assert!(coordinator.visual_frame(&handle, ms(600)).is_identity());
    }

    #[test]
    fn test_handle_queries_after_drop() {
        let coordinator = RevealCoordinator::new();
        let weak = coordinator.handle();
        let handle = coordinator.attach(&ElementSlot::new(), &RevealConfig::default());

        assert!(weak.is_alive());
        assert_eq!(weak.state_of(&handle), Some(RevealState::Hidden));

        drop(coordinator);
        assert!(!weak.is_alive());
        assert_eq!(weak.state_of(&handle), None);
    }

    #[test]
    fn test_unsubscribe() {
        let coordinator = RevealCoordinator::new();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let id = coordinator.subscribe(move |_| counter.set(counter.get() + 1));
        assert!(coordinator.unsubscribe(id));
        assert!(!coordinator.unsubscribe(id));

        let _handle = coordinator.attach(
            &ElementSlot::filled(ElementRef::new(1)),
            &RevealConfig::default(),
        );
        let on_screen = |_: ElementRef| Some(Rect::new(0.0, 0.0, 100.0, 100.0));
        coordinator.update(viewport(), &on_screen, ms(0));
        assert_eq!(count.get(), 0);
    }
}
