//! In-process notification event source.
//!
//! Delivers notifications and responses to registered handlers on the
//! calling thread. The local reminder scheduler and the CLI inject events
//! here; on a device this role belongs to the platform push SDK.

use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use dc_core::error::DcResult;

use crate::platform::{
    EventSubscription, IncomingNotification, NotificationEventSource, NotificationResponse,
    ReceivedHandler, ResponseHandler,
};
use crate::state::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Received,
    Response,
}

#[derive(Default)]
struct Listeners {
    next_id: Mutex<u64>,
    received: Mutex<Vec<(u64, ReceivedHandler)>>,
    response: Mutex<Vec<(u64, ResponseHandler)>>,
}

impl Listeners {
    fn allocate_id(&self) -> u64 {
        let mut next = lock(&self.next_id);
        let id = *next;
        *next += 1;
        id
    }

    fn remove(&self, stream: Stream, id: u64) {
        match stream {
            Stream::Received => lock(&self.received).retain(|(entry, _)| *entry != id),
            Stream::Response => lock(&self.response).retain(|(entry, _)| *entry != id),
        }
    }
}

/// Cloneable handle to a shared set of listeners.
#[derive(Clone, Default)]
pub struct LocalEventSource {
    listeners: Arc<Listeners>,
}

impl LocalEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `notification` to every "received" listener. Returns how many ran.
    pub fn deliver(&self, notification: &IncomingNotification) -> usize {
        let handlers: Vec<ReceivedHandler> = lock(&self.listeners.received)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        debug!("local events: delivering {} to {} listener(s)", notification.id, handlers.len());
        for handler in &handlers {
            handler(notification);
        }
        handlers.len()
    }

    /// Hand `response` to every "response" listener. Returns how many ran.
    pub fn respond(&self, response: &NotificationResponse) -> usize {
        let handlers: Vec<ResponseHandler> = lock(&self.listeners.response)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        debug!(
            "local events: response to {} for {} listener(s)",
            response.notification.id,
            handlers.len()
        );
        for handler in &handlers {
            handler(response);
        }
        handlers.len()
    }

    /// `(received, response)` listener counts.
    pub fn listener_counts(&self) -> (usize, usize) {
        (
            lock(&self.listeners.received).len(),
            lock(&self.listeners.response).len(),
        )
    }

    fn subscription(&self, stream: Stream, id: u64) -> Box<dyn EventSubscription> {
        Box::new(LocalSubscription {
            listeners: Arc::downgrade(&self.listeners),
            stream,
            id,
        })
    }
}

impl NotificationEventSource for LocalEventSource {
    fn on_received(&self, handler: ReceivedHandler) -> DcResult<Box<dyn EventSubscription>> {
        let id = self.listeners.allocate_id();
        lock(&self.listeners.received).push((id, handler));
        Ok(self.subscription(Stream::Received, id))
    }

    fn on_response(&self, handler: ResponseHandler) -> DcResult<Box<dyn EventSubscription>> {
        let id = self.listeners.allocate_id();
        lock(&self.listeners.response).push((id, handler));
        Ok(self.subscription(Stream::Response, id))
    }
}

struct LocalSubscription {
    listeners: Weak<Listeners>,
    stream: Stream,
    id: u64,
}

impl EventSubscription for LocalSubscription {
    fn release(self: Box<Self>) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.stream, self.id);
            debug!("local events: released {:?} listener {}", self.stream, self.id);
        }
    }
}
