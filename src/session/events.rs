//! Session lifecycle events and the observer list that delivers them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use super::SessionState;
use crate::audio::ToneError;
use crate::core::ear::{Cell, Ear};
use crate::core::result::{TestResult, Threshold};

/// Where a response came from. The staircase treats both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Explicit,
    Timeout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Any observable field of [`SessionState`] changed.
    StateChange(SessionState),
    ToneStarted { cell: Cell, level: f32 },
    ToneEnded { cell: Cell, level: f32 },
    Response {
        cell: Cell,
        level: f32,
        heard: bool,
        source: ResponseSource,
    },
    ThresholdFound(Threshold),
    /// Moving on to the next frequency of the same ear.
    FrequencyComplete(Cell),
    /// Every frequency of this ear is done.
    EarComplete(Ear),
    PresentationFailed(ToneError),
    Completed(TestResult),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StateChange(_) => "state_change",
            SessionEvent::ToneStarted { .. } => "tone_start",
            SessionEvent::ToneEnded { .. } => "tone_end",
            SessionEvent::Response { .. } => "response",
            SessionEvent::ThresholdFound(_) => "threshold_found",
            SessionEvent::FrequencyComplete(_) => "frequency_complete",
            SessionEvent::EarComplete(_) => "ear_complete",
            SessionEvent::PresentationFailed(_) => "presentation_failed",
            SessionEvent::Completed(_) => "completed",
        }
    }
}

pub type EventListener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

type ListenerList = Mutex<Vec<(u64, EventListener)>>;

#[derive(Default)]
pub struct EventBus {
    listeners: Arc<ListenerList>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: EventListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, listener));
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver to a snapshot of the current listeners, so a listener may
    /// unsubscribe (itself or others) while being called.
    pub fn publish(&self, event: &SessionEvent) {
        let snapshot: Vec<EventListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by `subscribe`; dropping it keeps the listener attached.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    /// Stop delivery to this listener. Returns false if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let Ok(mut listeners) = listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        listeners.len() != before
    }
}
