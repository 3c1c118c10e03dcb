//! drillcoach Services - Reactive state providers and their collaborators.
//!
//! This crate provides the observable state cell, the provider trait, and the
//! two process-wide providers:
//! - Theme store (persisted dark/light mode, derived palette)
//! - Notification center (push token, notification settings, daily reminder,
//!   incoming and response event streams)
//! - Platform collaborator contracts and their local implementations
//! - Response routing by notification payload type
//! - Event bus (typed intra-service communication)
//! - Application context (construction, mount and teardown order)

pub mod state;
pub mod provider;
pub mod event_bus;
pub mod platform;
pub mod theme;
pub mod notification;
pub mod push;
pub mod scheduler;
pub mod events;
pub mod response_router;
pub mod context;

// Re-export key types
pub use state::{ReactiveState, Subscription};
pub use provider::{PhaseCell, ProviderPhase, ReactiveProvider};
pub use event_bus::{AppEvent, EventBus};
pub use platform::{
    EventSubscription, IncomingNotification, NotificationEventSource, NotificationResponse,
    PushRegistrar, PushToken, ReminderScheduler, ReminderTime,
};
pub use theme::{ThemeColors, ThemeMode, ThemeState, ThemeStore};
pub use notification::{
    NotificationCenter, NotificationServices, NotificationSettings, NotificationSettingsPatch,
    NotificationState,
};
pub use push::LocalPushRegistrar;
pub use scheduler::LocalReminderScheduler;
pub use events::LocalEventSource;
pub use response_router::{ResponseRoute, ResponseRouter};
pub use context::AppContext;
