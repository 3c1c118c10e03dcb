//! Shared test utilities for integration tests.
//!
//! Scriptable fakes for every collaborator of the providers: a key-value
//! store whose reads and writes can fail or block, a push registrar, a
//! recording scheduler and an event source that counts releases.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use dc_core::error::{DcError, DcResult};
use dc_services::event_bus::EventBus;
use dc_services::notification::{NotificationCenter, NotificationServices};
use dc_services::platform::{
    EventSubscription, IncomingNotification, NotificationEventSource, NotificationResponse,
    PushRegistrar, PushToken, ReceivedHandler, ReminderScheduler, ReminderTime, ResponseHandler,
};
use dc_storage::KeyValueStore;

/// A latch that blocks waiters until opened.
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn closed() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

pub fn notification(id: &str, kind: Option<&str>) -> IncomingNotification {
    let data = match kind {
        Some(kind) => serde_json::json!({ "type": kind }),
        None => serde_json::json!({}),
    };
    IncomingNotification {
        id: id.to_string(),
        title: "Coach".to_string(),
        body: "Keep going".to_string(),
        data,
    }
}

// ---- Key-value store ----

#[derive(Default)]
pub struct FakeStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_gate: Option<Gate>,
    write_gate: Option<Gate>,
    first_write_delay: Option<Duration>,
    writes_started: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn gated_reads(mut self, gate: Gate) -> Self {
        self.read_gate = Some(gate);
        self
    }

    pub fn gated_writes(mut self, gate: Gate) -> Self {
        self.write_gate = Some(gate);
        self
    }

    /// Hold the first write for `delay` before applying it.
    pub fn slow_first_write(mut self, delay: Duration) -> Self {
        self.first_write_delay = Some(delay);
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for FakeStore {
    async fn get(&self, key: &str) -> DcResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.read_gate {
            gate.wait().await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DcError::Storage("read failed".into()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> DcResult<()> {
        let nth = self.writes_started.fetch_add(1, Ordering::SeqCst);
        if let (0, Some(delay)) = (nth, self.first_write_delay) {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.write_gate {
            gate.wait().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DcError::Storage("write failed".into()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---- Push registrar ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Token(String),
    Denied,
    Fails,
}

pub struct FakeRegistrar {
    outcome: Mutex<Registration>,
    supported: bool,
    calls: AtomicUsize,
    gate: Option<Gate>,
}

impl FakeRegistrar {
    pub fn granting(token: &str) -> Self {
        Self::with_outcome(Registration::Token(token.to_string()))
    }

    pub fn denying() -> Self {
        Self::with_outcome(Registration::Denied)
    }

    pub fn failing() -> Self {
        Self::with_outcome(Registration::Fails)
    }

    fn with_outcome(outcome: Registration) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            supported: true,
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_outcome(&self, outcome: Registration) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushRegistrar for FakeRegistrar {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn register(&self) -> DcResult<Option<PushToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            Registration::Token(token) => Ok(Some(token)),
            Registration::Denied => Ok(None),
            Registration::Fails => Err(DcError::Push("registration failed".into())),
        }
    }
}

// ---- Scheduler ----

#[derive(Default)]
pub struct FakeScheduler {
    calls: Mutex<Vec<ReminderTime>>,
    fail: AtomicBool,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let scheduler = Self::default();
        scheduler.fail.store(true, Ordering::SeqCst);
        scheduler
    }

    pub fn calls(&self) -> Vec<ReminderTime> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderScheduler for FakeScheduler {
    async fn schedule_daily(&self, time: ReminderTime) -> DcResult<()> {
        self.calls.lock().unwrap().push(time);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DcError::Scheduler("scheduler unavailable".into()));
        }
        Ok(())
    }
}

// ---- Event source ----

#[derive(Default)]
struct SourceInner {
    next_id: AtomicUsize,
    received: Mutex<Vec<(usize, ReceivedHandler)>>,
    response: Mutex<Vec<(usize, ResponseHandler)>>,
    attached: AtomicUsize,
    released: AtomicUsize,
    fail_response: AtomicBool,
}

/// Event source that records attaches and releases.
#[derive(Clone, Default)]
pub struct FakeEventSource {
    inner: Arc<SourceInner>,
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `on_response` fail.
    pub fn failing_response(self) -> Self {
        self.inner.fail_response.store(true, Ordering::SeqCst);
        self
    }

    pub fn emit_received(&self, notification: &IncomingNotification) -> usize {
        let handlers: Vec<ReceivedHandler> = self
            .inner
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        handlers.iter().for_each(|h| h(notification));
        handlers.len()
    }

    pub fn emit_response(&self, response: &NotificationResponse) -> usize {
        let handlers: Vec<ResponseHandler> = self
            .inner
            .response
            .lock()
            .unwrap()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        handlers.iter().for_each(|h| h(response));
        handlers.len()
    }

    pub fn attached(&self) -> usize {
        self.inner.attached.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.inner.received.lock().unwrap().len() + self.inner.response.lock().unwrap().len()
    }
}

struct FakeSubscription {
    inner: Arc<SourceInner>,
    response: bool,
    id: usize,
}

impl EventSubscription for FakeSubscription {
    fn release(self: Box<Self>) {
        if self.response {
            self.inner.response.lock().unwrap().retain(|(id, _)| *id != self.id);
        } else {
            self.inner.received.lock().unwrap().retain(|(id, _)| *id != self.id);
        }
        self.inner.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl NotificationEventSource for FakeEventSource {
    fn on_received(&self, handler: ReceivedHandler) -> DcResult<Box<dyn EventSubscription>> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.received.lock().unwrap().push((id, handler));
        self.inner.attached.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSubscription {
            inner: Arc::clone(&self.inner),
            response: false,
            id,
        }))
    }

    fn on_response(&self, handler: ResponseHandler) -> DcResult<Box<dyn EventSubscription>> {
        if self.inner.fail_response.load(Ordering::SeqCst) {
            return Err(DcError::EventSource("response stream unavailable".into()));
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.response.lock().unwrap().push((id, handler));
        self.inner.attached.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSubscription {
            inner: Arc::clone(&self.inner),
            response: true,
            id,
        }))
    }
}

// ---- Notification center harness ----

/// All collaborators of one notification center.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub registrar: Arc<FakeRegistrar>,
    pub scheduler: Arc<FakeScheduler>,
    pub events: FakeEventSource,
    pub bus: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(FakeStore::new()),
            registrar: Arc::new(FakeRegistrar::granting("token-1")),
            scheduler: Arc::new(FakeScheduler::new()),
            events: FakeEventSource::new(),
            bus: create_test_event_bus(),
        }
    }

    pub fn services(&self) -> NotificationServices {
        NotificationServices {
            store: self.store.clone(),
            registrar: self.registrar.clone(),
            scheduler: self.scheduler.clone(),
            events: Arc::new(self.events.clone()),
        }
    }

    pub fn center(&self) -> Arc<NotificationCenter> {
        Arc::new(NotificationCenter::new(
            self.services(),
            self.bus.clone(),
            ReminderTime::default(),
        ))
    }
}
