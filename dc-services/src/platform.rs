//! Contracts for the platform services the notification center depends on.
//!
//! Push registration, reminder scheduling and the notification event streams
//! are opaque collaborators. Local implementations live in `push`,
//! `scheduler` and `events`; tests substitute their own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use dc_core::config::NotificationConfig;
use dc_core::error::{DcError, DcResult};

/// Opaque installation identifier issued by the push service.
pub type PushToken = String;

/// Time of day for the daily reminder, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderTime {
    hour: u32,
    minute: u32,
}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> DcResult<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(DcError::InvalidInput(format!(
                "reminder time out of range: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn from_config(config: &NotificationConfig) -> DcResult<Self> {
        Self::new(config.reminder_hour, config.reminder_minute)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self {
            hour: dc_core::constants::DEFAULT_REMINDER_HOUR,
            minute: dc_core::constants::DEFAULT_REMINDER_MINUTE,
        }
    }
}

impl std::fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A notification delivered while the app is in the foreground.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Attached payload. Its `type` field selects the response route.
    pub data: Value,
}

impl IncomingNotification {
    /// The payload's `type` field, if present and a string.
    pub fn kind(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }
}

/// The user acted on a delivered notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationResponse {
    pub notification: IncomingNotification,
    /// Identifier of the chosen action; `DEFAULT_ACTION` for a plain tap.
    pub action: String,
}

impl NotificationResponse {
    pub const DEFAULT_ACTION: &'static str = "default";

    pub fn tap(notification: IncomingNotification) -> Self {
        Self {
            notification,
            action: Self::DEFAULT_ACTION.to_string(),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.notification.kind()
    }
}

/// Handler for the "received" stream.
pub type ReceivedHandler = Arc<dyn Fn(&IncomingNotification) + Send + Sync>;

/// Handler for the "response" stream.
pub type ResponseHandler = Arc<dyn Fn(&NotificationResponse) + Send + Sync>;

/// An active registration with an event source. `release` consumes the
/// handle, so a handle can only be released once.
pub trait EventSubscription: Send {
    fn release(self: Box<Self>);
}

/// Source of the two notification event streams.
pub trait NotificationEventSource: Send + Sync {
    fn on_received(&self, handler: ReceivedHandler) -> DcResult<Box<dyn EventSubscription>>;
    fn on_response(&self, handler: ResponseHandler) -> DcResult<Box<dyn EventSubscription>>;
}

/// Push permission and token registration.
#[async_trait]
pub trait PushRegistrar: Send + Sync {
    /// Whether this platform has push support at all. When false, the
    /// notification center attaches no event listeners.
    fn is_supported(&self) -> bool;

    /// Request permission and register. `Ok(None)` on denial or an
    /// unsupported platform. Safe to call repeatedly.
    async fn register(&self) -> DcResult<Option<PushToken>>;
}

/// Daily reminder scheduling. Must be idempotent: scheduling the same
/// time twice leaves exactly one reminder.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule_daily(&self, time: ReminderTime) -> DcResult<()>;
}
