//! User-facing PVR events and the broadcast bus delivering them.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// User-facing event raised by the coordination layer.
///
/// Every event is meant for the persistent event log. `notify_user` also
/// asks for a transient notification (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvrEvent {
    pub notify_user: bool,
    pub severity: EventSeverity,
    /// Nom de l'add-on concerné
    pub label: String,
    pub message: String,
    pub icon: String,
    pub display_ms: u64,
}

/// Destination of [`PvrEvent`]s.
pub trait EventSink: Send + Sync {
    fn post(&self, event: PvrEvent);
}

/// Broadcasts events to every live subscriber.
#[derive(Clone, Default)]
pub struct PvrEventBus {
    subscribers: Arc<Mutex<Vec<Sender<PvrEvent>>>>,
}

impl PvrEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<PvrEvent> {
        let (tx, rx) = unbounded::<PvrEvent>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub fn broadcast(&self, event: PvrEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl EventSink for PvrEventBus {
    fn post(&self, event: PvrEvent) {
        self.broadcast(event);
    }
}
