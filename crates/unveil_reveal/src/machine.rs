//! Reveal state machines
//!
//! ```text
//! Hidden --(intersecting)--> Revealing --(animation start)--> Revealed
//! ```
//!
//! With `trigger_once` the reveal is committed as soon as it enters
//! `Revealing`: later visibility changes are ignored. Without it, leaving the
//! viewport sends `Revealing` or `Revealed` back to `Hidden`.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::tracker::{ObservedId, VisibilityEvent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RevealState {
    /// Not yet seen (or scrolled away again when repeatable)
    #[default]
    Hidden,
    /// Seen, waiting for its cascade delay
    Revealing,
    /// Entrance animation started
    Revealed,
}

impl RevealState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, RevealState::Hidden)
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self, RevealState::Revealed)
    }
}

/// An accepted state change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTransition {
    pub id: ObservedId,
    pub from: RevealState,
    pub to: RevealState,
}

/// State of one element
#[derive(Clone, Copy, Debug)]
pub struct RevealMachine {
    state: RevealState,
    trigger_once: bool,
    animation_started: Option<Duration>,
}

impl RevealMachine {
    pub fn new(trigger_once: bool) -> Self {
        Self {
            state: RevealState::Hidden,
            trigger_once,
            animation_started: None,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn trigger_once(&self) -> bool {
        self.trigger_once
    }

    /// When the entrance animation started, if it has
    pub fn animation_started(&self) -> Option<Duration> {
        self.animation_started
    }

    /// Feed an intersecting change; returns `(from, to)` when the state moved
    pub fn on_visibility(&mut self, is_intersecting: bool) -> Option<(RevealState, RevealState)> {
        let from = self.state;
        let to = match (from, is_intersecting) {
            (RevealState::Hidden, true) => RevealState::Revealing,
            (RevealState::Revealing | RevealState::Revealed, false) if !self.trigger_once => {
                RevealState::Hidden
            }
            _ => return None,
        };

        self.state = to;
        if to == RevealState::Hidden {
            self.animation_started = None;
        }
        Some((from, to))
    }

    /// Move `Revealing` to `Revealed`; anything else is left alone
    pub fn start_animation(&mut self, now: Duration) -> Option<(RevealState, RevealState)> {
        if self.state != RevealState::Revealing {
            return None;
        }
        self.state = RevealState::Revealed;
        self.animation_started = Some(now);
        Some((RevealState::Revealing, RevealState::Revealed))
    }
}

/// One machine per registration
#[derive(Debug, Default)]
pub struct RevealMachines {
    machines: FxHashMap<ObservedId, RevealMachine>,
}

impl RevealMachines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ObservedId, trigger_once: bool) {
        self.machines.insert(id, RevealMachine::new(trigger_once));
    }

    pub fn remove(&mut self, id: ObservedId) -> Option<RevealMachine> {
        self.machines.remove(&id)
    }

    pub fn get(&self, id: ObservedId) -> Option<&RevealMachine> {
        self.machines.get(&id)
    }

    pub fn state(&self, id: ObservedId) -> Option<RevealState> {
        self.machines.get(&id).map(RevealMachine::state)
    }

    /// Apply a visibility event; events for unknown ids are dropped
    pub fn handle_visibility(&mut self, event: &VisibilityEvent) -> Option<RevealTransition> {
        let machine = self.machines.get_mut(&event.id)?;
        let (from, to) = machine.on_visibility(event.is_intersecting)?;
        Some(RevealTransition {
            id: event.id,
            from,
            to,
        })
    }

    pub fn start_animation(&mut self, id: ObservedId, now: Duration) -> Option<RevealTransition> {
        let machine = self.machines.get_mut(&id)?;
        let (from, to) = machine.start_animation(now)?;
        Some(RevealTransition { id, from, to })
    }

    pub fn contains(&self, id: ObservedId) -> bool {
        self.machines.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}
