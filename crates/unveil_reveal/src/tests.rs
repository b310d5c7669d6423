//! End-to-end reveal scenarios driven through the coordinator

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use unveil_core::{ElementRef, ElementSlot, Rect};

use crate::{RevealConfig, RevealCoordinator, RevealHandle, RevealState, RevealTransition};

const VIEWPORT_HEIGHT: f32 = 800.0;

fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// A page of elements at fixed document positions, scrolled by moving the
/// viewport
struct Page {
    layout: FxHashMap<ElementRef, Rect>,
}

impl Page {
    fn new() -> Self {
        Self {
            layout: FxHashMap::default(),
        }
    }

    fn place(&mut self, id: u64, y: f32, height: f32) -> ElementSlot {
        let element = ElementRef::new(id);
        self.layout.insert(element, Rect::new(0.0, y, 400.0, height));
        ElementSlot::filled(element)
    }

    fn viewport(scroll_y: f32) -> Rect {
        Rect::new(0.0, scroll_y, 1280.0, VIEWPORT_HEIGHT)
    }

    fn scroll_to(&self, coordinator: &RevealCoordinator, scroll_y: f32, now: Duration) {
        coordinator.update(Self::viewport(scroll_y), &self.layout, now);
    }
}

fn record(coordinator: &RevealCoordinator) -> Rc<RefCell<Vec<RevealTransition>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    coordinator.subscribe(move |t| sink.borrow_mut().push(*t));
    seen
}

#[test]
fn test_release_before_first_update_never_notifies() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();

    let slot = page.place(1, 100.0, 200.0);
    let handle = coordinator.attach(&slot, &RevealConfig::default());
    assert_eq!(coordinator.live_registrations(), 1);
    drop(handle);
    assert_eq!(coordinator.live_registrations(), 0);

    page.scroll_to(&coordinator, 0.0, ms(0));
    coordinator.advance(ms(10_000));
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_trigger_once_stays_revealed() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let slot = page.place(1, 1000.0, 200.0);
    let handle = coordinator.attach(&slot, &RevealConfig::default());

    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));

    page.scroll_to(&coordinator, 600.0, ms(16));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));

    // Scroll away and back, repeatedly
    for (i, y) in [0.0, 3000.0, 600.0, 0.0, 900.0].into_iter().enumerate() {
        page.scroll_to(&coordinator, y, ms(32 + i as u64 * 16));
        assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
    }
}

#[test]
fn test_fast_scroll_past_still_reveals_when_trigger_once() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::builder().base_delay_ms(200).build().unwrap();
    let slot = page.place(1, 1000.0, 200.0);
    let handle = coordinator.attach(&slot, &config);

    page.scroll_to(&coordinator, 600.0, ms(0));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealing));

    // Gone again before the delay elapsed
    page.scroll_to(&coordinator, 5000.0, ms(50));
    assert_eq!(coordinator.pending_reveals(), 1);

    coordinator.advance(ms(200));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
}

#[test]
fn test_repeatable_reveal_hides_again() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();
    let config = RevealConfig::builder().trigger_once(false).build().unwrap();
    let slot = page.place(1, 1000.0, 200.0);
    let handle = coordinator.attach(&slot, &config);

    page.scroll_to(&coordinator, 600.0, ms(0));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));

    page.scroll_to(&coordinator, 0.0, ms(16));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));

    page.scroll_to(&coordinator, 600.0, ms(32));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));

    let states: Vec<_> = seen.borrow().iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![
            RevealState::Revealing,
            RevealState::Revealed,
            RevealState::Hidden,
            RevealState::Revealing,
            RevealState::Revealed,
        ]
    );
}

#[test]
fn test_repeatable_cancels_pending_reveal() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::builder()
        .trigger_once(false)
        .base_delay_ms(300)
        .build()
        .unwrap();
    let slot = page.place(1, 1000.0, 200.0);
    let handle = coordinator.attach(&slot, &config);

    page.scroll_to(&coordinator, 600.0, ms(0));
    assert_eq!(coordinator.pending_reveals(), 1);

    page.scroll_to(&coordinator, 0.0, ms(100));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));
    assert_eq!(coordinator.pending_reveals(), 0);

    coordinator.advance(ms(1000));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));
}

#[test]
fn test_never_intersecting_stays_hidden() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();
    let slot = page.place(1, 10_000.0, 200.0);
    let handle = coordinator.attach(&slot, &RevealConfig::default());

    for frame in 0..20u64 {
        page.scroll_to(&coordinator, frame as f32 * 100.0, ms(frame * 16));
    }

    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_below_threshold_stays_hidden() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::builder().threshold(0.3).build().unwrap();

    // 20% of the element peeks above the fold
    let slot = page.place(1, 760.0, 200.0);
    let handle = coordinator.attach(&slot, &config);
    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));

    // 40%
    page.scroll_to(&coordinator, 40.0, ms(16));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
}

#[test]
fn test_release_before_scheduled_reveal() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();
    let config = RevealConfig::builder().base_delay_ms(400).build().unwrap();
    let slot = page.place(1, 100.0, 200.0);
    let handle = coordinator.attach(&slot, &config);

    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.pending_reveals(), 1);
    assert_eq!(seen.borrow().len(), 1);

    coordinator.release(handle);
    assert_eq!(coordinator.pending_reveals(), 0);
    assert_eq!(coordinator.live_registrations(), 0);

    coordinator.advance(ms(1000));
    page.scroll_to(&coordinator, 0.0, ms(1016));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_shared_observer_independent_machines() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::default();

    let near = page.place(1, 100.0, 200.0);
    let far = page.place(2, 2000.0, 200.0);
    let near_handle = coordinator.attach(&near, &config);
    let far_handle = coordinator.attach(&far, &config);
    assert_eq!(coordinator.observer_count(), 1);

    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.state_of(&near_handle), Some(RevealState::Revealed));
    assert_eq!(coordinator.state_of(&far_handle), Some(RevealState::Hidden));

    page.scroll_to(&coordinator, 1600.0, ms(16));
    assert_eq!(coordinator.state_of(&far_handle), Some(RevealState::Revealed));
}

#[test]
fn test_distinct_configs_get_distinct_observers() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let stats = RevealConfig::builder().threshold(0.3).build().unwrap();
    let faq = RevealConfig::builder().root_margin("-10%").build().unwrap();

    let _a = coordinator.attach(&page.place(1, 0.0, 100.0), &RevealConfig::default());
    let _b = coordinator.attach(&page.place(2, 0.0, 100.0), &stats);
    let c = coordinator.attach(&page.place(3, 0.0, 100.0), &faq);
    assert_eq!(coordinator.observer_count(), 3);

    drop(c);
    assert_eq!(coordinator.observer_count(), 2);
}

#[test]
fn test_listener_releases_own_handle() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();
    let slot = page.place(1, 100.0, 200.0);

    let holder: Rc<RefCell<Option<RevealHandle>>> = Rc::new(RefCell::new(None));
    *holder.borrow_mut() = Some(coordinator.attach(&slot, &RevealConfig::default()));

    let own = holder.clone();
    coordinator.subscribe(move |t| {
        if t.to == RevealState::Revealing {
            let handle = own.borrow_mut().take();
            drop(handle);
        }
    });

    page.scroll_to(&coordinator, 0.0, ms(0));

    assert!(holder.borrow().is_none());
    assert_eq!(coordinator.live_registrations(), 0);
    // Revealed was queued in the same frame but the element is gone
    let states: Vec<_> = seen.borrow().iter().map(|t| t.to).collect();
    assert_eq!(states, vec![RevealState::Revealing]);
}

#[test]
fn test_listener_can_attach_during_dispatch() {
    let coordinator = Rc::new(RevealCoordinator::new());
    let mut page = Page::new();
    let first = page.place(1, 100.0, 200.0);
    let second = page.place(2, 150.0, 200.0);

    let _first = coordinator.attach(&first, &RevealConfig::default());

    let late: Rc<RefCell<Vec<RevealHandle>>> = Rc::new(RefCell::new(Vec::new()));
    let weak = Rc::downgrade(&coordinator);
    let store = late.clone();
    coordinator.subscribe(move |t| {
        if t.to != RevealState::Revealed {
            return;
        }
        if let Some(coordinator) = weak.upgrade() {
            if store.borrow().is_empty() {
                let handle = coordinator.attach(&second, &RevealConfig::default());
                store.borrow_mut().push(handle);
            }
        }
    });

    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.live_registrations(), 2);

    page.scroll_to(&coordinator, 0.0, ms(16));
    let handle = late.borrow()[0].clone();
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
}

#[test]
fn test_handle_dropped_inside_bounds_query() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let slot = ElementSlot::filled(ElementRef::new(1));

    let holder = Rc::new(RefCell::new(Some(
        coordinator.attach(&slot, &RevealConfig::default()),
    )));
    let inside = holder.clone();
    let bounds = move |_: ElementRef| {
        let handle = inside.borrow_mut().take();
        drop(handle);
        Some(Rect::new(0.0, 0.0, 100.0, 100.0))
    };

    coordinator.update(Page::viewport(0.0), &bounds, ms(0));

    assert_eq!(coordinator.live_registrations(), 0);
    assert_eq!(coordinator.attachments(), 0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_reattach_after_deferred_release_cancels_pending_reveal() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::builder().base_delay_ms(400).build().unwrap();
    let slot = page.place(1, 100.0, 200.0);

    let holder = Rc::new(RefCell::new(Some(coordinator.attach(&slot, &config))));
    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.pending_reveals(), 1);

    // The view unmounts mid-measure; its release waits for the update
    let layout = page.layout.clone();
    let inside = holder.clone();
    let bounds = move |e: ElementRef| {
        drop(inside.borrow_mut().take());
        layout.get(&e).copied()
    };
    coordinator.update(Page::viewport(0.0), &bounds, ms(16));
    assert_eq!(coordinator.pending_reveals(), 0);
    assert_eq!(coordinator.attachments(), 0);

    // Remounting the same element starts over
    let handle = coordinator.attach(&slot, &config);
    assert_eq!(coordinator.live_registrations(), 1);
    assert_eq!(coordinator.pending_reveals(), 0);
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));

    page.scroll_to(&coordinator, 0.0, ms(32));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealing));
    assert_eq!(coordinator.pending_reveals(), 1);

    coordinator.advance(ms(432));
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
    assert_eq!(coordinator.pending_reveals(), 0);
}

#[test]
fn test_parked_slot_reveals_after_render() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let slot = ElementSlot::new();
    let handle = coordinator.attach(&slot, &RevealConfig::default());
    assert_eq!(coordinator.live_registrations(), 0);
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Hidden));

    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.live_registrations(), 0);

    // View renders
    let rendered = page.place(7, 100.0, 200.0);
    slot.set(rendered.get().unwrap());

    page.scroll_to(&coordinator, 0.0, ms(16));
    assert_eq!(coordinator.live_registrations(), 1);
    assert_eq!(coordinator.state_of(&handle), Some(RevealState::Revealed));
}

#[test]
fn test_double_attach_and_double_release() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let slot = page.place(1, 100.0, 200.0);

    let a = coordinator.attach(&slot, &RevealConfig::default());
    let b = coordinator.attach(&slot, &RevealConfig::default());
    assert!(a.ptr_eq(&b));
    assert_eq!(coordinator.live_registrations(), 1);

    coordinator.release(a);
    assert_eq!(coordinator.live_registrations(), 1);
    coordinator.release(b);
    assert_eq!(coordinator.live_registrations(), 0);

    // Fresh attach after full release gets a new registration
    let c = coordinator.attach(&slot, &RevealConfig::default());
    assert_eq!(coordinator.live_registrations(), 1);
    assert_eq!(
        coordinator.observed_id(&c).map(|id| id.to_string()),
        Some("scroll-element-1".to_string())
    );
}

#[test]
fn test_registrations_track_live_handles() {
    let coordinator = RevealCoordinator::new();
    let mut page = Page::new();
    let config = RevealConfig::default();

    let mut handles: Vec<RevealHandle> = (0..6)
        .map(|i| {
            let slot = page.place(i, i as f32 * 300.0, 200.0);
            coordinator.attach_item(&slot, &config, i as usize, 6)
        })
        .collect();
    page.scroll_to(&coordinator, 0.0, ms(0));
    assert_eq!(coordinator.live_registrations(), 6);

    handles.truncate(2);
    page.scroll_to(&coordinator, 0.0, ms(16));
    assert_eq!(coordinator.live_registrations(), 2);
    assert_eq!(coordinator.pending_reveals(), 1);

    handles.clear();
    assert_eq!(coordinator.live_registrations(), 0);
    assert_eq!(coordinator.pending_reveals(), 0);
}

#[test]
fn test_cascade_order_across_list() {
    let coordinator = RevealCoordinator::new();
    let seen = record(&coordinator);
    let mut page = Page::new();
    let config = RevealConfig::builder()
        .cascade_step_ms(100)
        .cascade_max_ms(250)
        .build()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let slot = page.place(i, 100.0, 200.0);
            coordinator.attach_item(&slot, &config, i as usize, 4)
        })
        .collect();

    page.scroll_to(&coordinator, 0.0, ms(0));
    for t in [100, 200, 250] {
        coordinator.advance(ms(t));
    }

    let revealed: Vec<_> = seen
        .borrow()
        .iter()
        .filter(|t| t.to == RevealState::Revealed)
        .map(|t| t.id)
        .collect();
    let expected: Vec<_> = handles
        .iter()
        .filter_map(|h| coordinator.observed_id(h))
        .collect();
    assert_eq!(revealed, expected);
}

#[test]
fn test_coordinator_dropped_before_handles() {
    let coordinator = RevealCoordinator::new();
    let handle = coordinator.attach(
        &ElementSlot::filled(ElementRef::new(1)),
        &RevealConfig::default(),
    );
    drop(coordinator);
    drop(handle);
}
