//! Application context: owns the providers and their lifecycle.
//!
//! The context constructs each provider once, mounts them together and
//! tears them down in reverse order. It is the only place providers are
//! created; consumers get `Arc` handles from it. One context per process.

use std::sync::Arc;

use tracing::{info, warn};

use dc_core::config::AppConfig;
use dc_core::error::DcResult;
use dc_storage::KeyValueStore;

use crate::event_bus::EventBus;
use crate::events::LocalEventSource;
use crate::notification::{NotificationCenter, NotificationServices};
use crate::platform::ReminderTime;
use crate::provider::{ProviderPhase, ReactiveProvider};
use crate::push::LocalPushRegistrar;
use crate::scheduler::LocalReminderScheduler;
use crate::theme::ThemeStore;

/// Root owner of the theme store and the notification center.
pub struct AppContext {
    event_bus: EventBus,
    theme: Arc<ThemeStore>,
    notifications: Arc<NotificationCenter>,
    local_events: Option<LocalEventSource>,
}

impl AppContext {
    /// Build a context from explicit collaborators.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        services: NotificationServices,
        event_bus: EventBus,
        reminder_time: ReminderTime,
    ) -> Self {
        let theme = Arc::new(ThemeStore::new(store, event_bus.clone()));
        let notifications = Arc::new(NotificationCenter::new(
            services,
            event_bus.clone(),
            reminder_time,
        ));
        Self {
            event_bus,
            theme,
            notifications,
            local_events: None,
        }
    }

    /// Build a context with the local push, scheduler and event-source
    /// implementations, persisting to `store`.
    pub fn from_config(config: &AppConfig, store: Arc<dyn KeyValueStore>) -> DcResult<Self> {
        let notification_config = &config.notifications;
        let reminder_time = ReminderTime::from_config(notification_config)?;
        let event_bus = EventBus::new(notification_config.event_bus_capacity);
        let local_events = LocalEventSource::new();

        let scheduler = LocalReminderScheduler::new(event_bus.clone())
            .with_event_source(local_events.clone());
        let services = NotificationServices {
            store: Arc::clone(&store),
            registrar: Arc::new(LocalPushRegistrar::from_config(notification_config)),
            scheduler: Arc::new(scheduler),
            events: Arc::new(local_events.clone()),
        };

        let mut context = Self::new(store, services, event_bus, reminder_time);
        context.local_events = Some(local_events);
        Ok(context)
    }

    /// Bring both providers up. Returns once both have committed.
    pub async fn mount(&self) {
        info!("context: mounting providers");
        let bring_up = self.notifications.mount();
        let (_, joined) = tokio::join!(self.theme.load(), bring_up);
        if let Err(e) = joined {
            warn!("context: notification bring-up task failed: {e}");
        }
        info!("context: providers mounted");
    }

    /// Tear the providers down in reverse order of construction.
    pub fn teardown(&self) {
        self.notifications.unmount();
        self.theme.teardown();
        info!("context: providers torn down");
    }

    pub fn theme(&self) -> &Arc<ThemeStore> {
        &self.theme
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// The in-process event source, when built by `from_config`.
    pub fn local_events(&self) -> Option<&LocalEventSource> {
        self.local_events.as_ref()
    }

    /// `(provider name, phase)` for every provider.
    pub fn phases(&self) -> Vec<(String, ProviderPhase)> {
        vec![
            (self.theme.name().to_string(), self.theme.phase()),
            (self.notifications.name().to_string(), self.notifications.phase()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::constants::keys;
    use dc_storage::MemoryKeyValueStore;

    use crate::theme::ThemeMode;

    #[tokio::test]
    async fn test_from_config_mount_and_teardown() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([(keys::THEME_MODE, "light")]));
        let mut config = AppConfig::default();
        config.notifications.push_enabled = false;

        let context = AppContext::from_config(&config, store).unwrap();
        assert!(context
            .phases()
            .iter()
            .all(|(_, phase)| *phase == ProviderPhase::Created));

        context.mount().await;
        assert_eq!(context.theme().mode(), ThemeMode::Light);
        assert!(context.notifications().is_initialized());
        assert_eq!(context.notifications().push_token(), None);
        assert!(context.phases().iter().all(|(_, phase)| *phase == ProviderPhase::Ready));

        context.teardown();
        assert!(!context.notifications().has_listeners());
        assert!(context
            .phases()
            .iter()
            .all(|(_, phase)| *phase == ProviderPhase::TornDown));
        if let Some(events) = context.local_events() {
            assert_eq!(events.listener_counts(), (0, 0));
        }
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_reminder_time() {
        let mut config = AppConfig::default();
        config.notifications.reminder_hour = 25;
        let store = Arc::new(MemoryKeyValueStore::new());
        assert!(AppContext::from_config(&config, store).is_err());
    }
}
