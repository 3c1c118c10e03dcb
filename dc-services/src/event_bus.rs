//! Typed event bus for intra-service communication.
//!
//! Uses tokio broadcast channels to decouple providers from the parts of the
//! app that react to them. Any provider can emit events without knowing who
//! is listening, and any number of subscribers can consume events.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::notification::NotificationSettings;
use crate::theme::ThemeMode;

/// All application-level events that flow through the event bus.
///
/// These are distinct from provider state observers: they describe what
/// happened, for consumers that do not hold a provider handle.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The theme mode changed.
    ThemeChanged {
        mode: ThemeMode,
    },
    /// Notification settings were committed.
    NotificationSettingsChanged {
        settings: NotificationSettings,
    },
    /// A push registration attempt finished.
    PushTokenChanged {
        registered: bool,
    },
    /// A provider finished its bring-up.
    ProviderReady {
        provider: String,
    },
    /// A notification arrived while the app was running.
    NotificationReceived {
        id: String,
        kind: Option<String>,
    },
    /// The user acted on a notification.
    NotificationResponded {
        id: String,
        kind: Option<String>,
        handled: bool,
    },
    /// The daily reminder was (re)scheduled.
    ReminderScheduled {
        hour: u32,
        minute: u32,
    },
    /// The daily reminder fired.
    ReminderFired {
        hour: u32,
        minute: u32,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and may miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!("event_bus: emitted {label} to {count} subscriber(s)");
            }
            Err(_) => {
                debug!("event_bus: no subscribers for {label}");
            }
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(dc_core::constants::DEFAULT_EVENT_BUS_CAPACITY)
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::ThemeChanged { .. } => "ThemeChanged",
        AppEvent::NotificationSettingsChanged { .. } => "NotificationSettingsChanged",
        AppEvent::PushTokenChanged { .. } => "PushTokenChanged",
        AppEvent::ProviderReady { .. } => "ProviderReady",
        AppEvent::NotificationReceived { .. } => "NotificationReceived",
        AppEvent::NotificationResponded { .. } => "NotificationResponded",
        AppEvent::ReminderScheduled { .. } => "ReminderScheduled",
        AppEvent::ReminderFired { .. } => "ReminderFired",
    }
}
