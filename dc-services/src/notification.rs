//! Notification center: push token, notification settings and the daily
//! drill reminder.
//!
//! Bring-up registers for push and reads the stored settings concurrently,
//! then commits both together with `is_initialized`. Every collaborator
//! failure is logged and replaced by a default. While mounted, the center
//! holds two event-source subscriptions ("received" and "response") and
//! releases them exactly once on unmount or drop.
//!
//! Settings writes are serialized. Each one stores the record as it stands
//! when the write runs, so the last write always matches memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dc_core::constants::keys;
use dc_core::error::DcResult;
use dc_storage::KeyValueStore;

use crate::event_bus::{AppEvent, EventBus};
use crate::platform::{
    EventSubscription, IncomingNotification, NotificationEventSource, NotificationResponse,
    PushRegistrar, PushToken, ReceivedHandler, ReminderScheduler, ReminderTime, ResponseHandler,
};
use crate::provider::{PhaseCell, ProviderPhase, ReactiveProvider};
use crate::response_router::{ResponseRoute, ResponseRouter};
use crate::state::{lock, ReactiveState, Subscription};

/// Which kinds of notifications the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub drill_reminders: bool,
    pub progress_updates: bool,
    pub coach_tips: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            drill_reminders: true,
            progress_updates: true,
            coach_tips: true,
        }
    }
}

impl NotificationSettings {
    /// Copy of `self` with every field present in `patch` replaced.
    pub fn merged(&self, patch: &NotificationSettingsPatch) -> Self {
        Self {
            enabled: patch.enabled.unwrap_or(self.enabled),
            drill_reminders: patch.drill_reminders.unwrap_or(self.drill_reminders),
            progress_updates: patch.progress_updates.unwrap_or(self.progress_updates),
            coach_tips: patch.coach_tips.unwrap_or(self.coach_tips),
        }
    }

    /// Whether the daily drill reminder should be scheduled.
    pub fn wants_drill_reminders(&self) -> bool {
        self.enabled && self.drill_reminders
    }

    /// Parse a stored record. Missing fields take their default.
    pub fn from_json(raw: &str) -> DcResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> DcResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Partial update of `NotificationSettings`. `None` leaves a field as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationSettingsPatch {
    pub enabled: Option<bool>,
    pub drill_reminders: Option<bool>,
    pub progress_updates: Option<bool>,
    pub coach_tips: Option<bool>,
}

impl NotificationSettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, value: bool) -> Self {
        self.enabled = Some(value);
        self
    }

    pub fn with_drill_reminders(mut self, value: bool) -> Self {
        self.drill_reminders = Some(value);
        self
    }

    pub fn with_progress_updates(mut self, value: bool) -> Self {
        self.progress_updates = Some(value);
        self
    }

    pub fn with_coach_tips(mut self, value: bool) -> Self {
        self.coach_tips = Some(value);
        self
    }

    /// Combine with a later patch. Fields set in `later` win.
    pub fn overlay(&self, later: &Self) -> Self {
        Self {
            enabled: later.enabled.or(self.enabled),
            drill_reminders: later.drill_reminders.or(self.drill_reminders),
            progress_updates: later.progress_updates.or(self.progress_updates),
            coach_tips: later.coach_tips.or(self.coach_tips),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Observable state of the notification center.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationState {
    pub push_token: Option<PushToken>,
    pub settings: NotificationSettings,
    pub is_initialized: bool,
}

/// External collaborators of the notification center.
#[derive(Clone)]
pub struct NotificationServices {
    pub store: Arc<dyn KeyValueStore>,
    pub registrar: Arc<dyn PushRegistrar>,
    pub scheduler: Arc<dyn ReminderScheduler>,
    pub events: Arc<dyn NotificationEventSource>,
}

struct EventSubscriptions {
    received: Box<dyn EventSubscription>,
    response: Box<dyn EventSubscription>,
}

impl EventSubscriptions {
    fn release(self) {
        self.received.release();
        self.response.release();
    }
}

/// Process-wide notification provider.
pub struct NotificationCenter {
    state: ReactiveState<NotificationState>,
    phase: PhaseCell,
    services: NotificationServices,
    router: Arc<ResponseRouter>,
    event_bus: EventBus,
    reminder_time: ReminderTime,
    /// Updates made before bring-up committed, replayed over the stored record.
    pending: Mutex<Option<NotificationSettingsPatch>>,
    /// Set once `request_permission` commits, so a late bring-up keeps its token.
    token_override: AtomicBool,
    write_lock: AsyncMutex<()>,
    subscriptions: Mutex<Option<EventSubscriptions>>,
}

impl NotificationCenter {
    pub fn new(services: NotificationServices, event_bus: EventBus, reminder_time: ReminderTime) -> Self {
        Self::with_router(
            services,
            Arc::new(ResponseRouter::with_default_routes()),
            event_bus,
            reminder_time,
        )
    }

    pub fn with_router(
        services: NotificationServices,
        router: Arc<ResponseRouter>,
        event_bus: EventBus,
        reminder_time: ReminderTime,
    ) -> Self {
        Self {
            state: ReactiveState::new(NotificationState::default()),
            phase: PhaseCell::new(),
            services,
            router,
            event_bus,
            reminder_time,
            pending: Mutex::new(None),
            token_override: AtomicBool::new(false),
            write_lock: AsyncMutex::new(()),
            subscriptions: Mutex::new(None),
        }
    }

    /// Attach the event listeners and start bring-up in the background.
    ///
    /// Listeners are attached before this returns. The returned handle
    /// completes when bring-up has committed or discarded its results.
    pub fn mount(self: &Arc<Self>) -> JoinHandle<()> {
        self.attach_listeners();
        let center = Arc::clone(self);
        tokio::spawn(async move { center.bring_up().await })
    }

    /// Release the event listeners. Bring-up results arriving afterwards
    /// are discarded.
    pub fn unmount(&self) {
        let previous = self.phase.tear_down();
        let released = self.release_listeners();
        info!("notifications: unmounted (was {previous}, released listeners: {released})");
    }

    fn attach_listeners(&self) {
        if self.phase.get() == ProviderPhase::TornDown {
            debug!("notifications: not attaching listeners after teardown");
            return;
        }
        if !self.services.registrar.is_supported() {
            info!("notifications: push unsupported on this platform, no listeners attached");
            return;
        }
        if lock(&self.subscriptions).is_some() {
            debug!("notifications: listeners already attached");
            return;
        }

        let received = match self.services.events.on_received(self.received_handler()) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("notifications: failed to attach received listener: {e}");
                return;
            }
        };
        let response = match self.services.events.on_response(self.response_handler()) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("notifications: failed to attach response listener: {e}");
                received.release();
                return;
            }
        };

        *lock(&self.subscriptions) = Some(EventSubscriptions { received, response });
        debug!("notifications: listeners attached");

        // Teardown may have run while we were attaching.
        if self.phase.get() == ProviderPhase::TornDown {
            self.release_listeners();
        }
    }

    fn release_listeners(&self) -> bool {
        let taken = lock(&self.subscriptions).take();
        match taken {
            Some(subscriptions) => {
                subscriptions.release();
                true
            }
            None => false,
        }
    }

    fn received_handler(&self) -> ReceivedHandler {
        let bus = self.event_bus.clone();
        Arc::new(move |notification: &IncomingNotification| {
            debug!(
                "notifications: received {} ({:?}): {}",
                notification.id,
                notification.kind(),
                notification.title
            );
            bus.emit(AppEvent::NotificationReceived {
                id: notification.id.clone(),
                kind: notification.kind().map(str::to_string),
            });
        })
    }

    fn response_handler(&self) -> ResponseHandler {
        let bus = self.event_bus.clone();
        let router = Arc::clone(&self.router);
        Arc::new(move |response: &NotificationResponse| {
            let route = router.dispatch(response);
            bus.emit(AppEvent::NotificationResponded {
                id: response.notification.id.clone(),
                kind: response.kind().map(str::to_string),
                handled: matches!(route, ResponseRoute::Handled(_)),
            });
        })
    }

    async fn register_token(&self) -> Option<PushToken> {
        match self.services.registrar.register().await {
            Ok(token) => token,
            Err(e) => {
                warn!("notifications: push registration failed: {e}");
                None
            }
        }
    }

    /// Stored record. An unreadable record counts as absent.
    async fn load_stored(&self) -> DcResult<Option<NotificationSettings>> {
        let raw = self.services.store.get(keys::NOTIFICATION_SETTINGS).await?;
        Ok(raw.and_then(|raw| match NotificationSettings::from_json(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("notifications: ignoring unreadable stored settings: {e}");
                None
            }
        }))
    }

    async fn read_settings(&self) -> NotificationSettings {
        self.load_stored()
            .await
            .unwrap_or_else(|e| {
                warn!("notifications: failed to read stored settings: {e}");
                None
            })
            .unwrap_or_default()
    }

    /// Persist the settings as they stand now and return the written record.
    ///
    /// Before bring-up commits, memory holds defaults for the fields the user
    /// has not touched, so the pending patch is applied to the stored record
    /// instead. Returns `None` when that stored record could not be read.
    async fn persist_current(&self) -> Option<NotificationSettings> {
        let _write = self.write_lock.lock().await;
        let pending = *lock(&self.pending);
        let record = match pending {
            None => self.settings(),
            Some(patch) => match self.load_stored().await {
                Ok(stored) => stored.unwrap_or_default().merged(&patch),
                Err(e) => {
                    warn!("notifications: not persisting early update, stored settings unreadable: {e}");
                    return None;
                }
            },
        };

        let raw = match record.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("notifications: failed to encode settings: {e}");
                return Some(record);
            }
        };
        match self.services.store.set(keys::NOTIFICATION_SETTINGS, &raw).await {
            Ok(()) => debug!("notifications: persisted settings"),
            Err(e) => warn!("notifications: failed to persist settings: {e}"),
        }
        Some(record)
    }

    async fn schedule_reminder(&self) {
        let time = self.reminder_time;
        match self.services.scheduler.schedule_daily(time).await {
            Ok(()) => {
                debug!("notifications: daily reminder scheduled for {time}");
                self.event_bus.emit(AppEvent::ReminderScheduled {
                    hour: time.hour(),
                    minute: time.minute(),
                });
            }
            Err(e) => warn!("notifications: failed to schedule daily reminder: {e}"),
        }
    }

    /// Merge `patch` onto the current settings and return the result.
    ///
    /// Observers see the merged record immediately, then the record is
    /// persisted and, when drill reminders are wanted, the reminder is
    /// (re)scheduled. An update made before bring-up commits is also kept as
    /// a pending patch and replayed over the stored record at commit.
    pub async fn update_settings(&self, patch: NotificationSettingsPatch) -> NotificationSettings {
        let state = self.state.update(|s| {
            s.settings = s.settings.merged(&patch);
            if !s.is_initialized {
                let mut pending = lock(&self.pending);
                *pending = Some(pending.map_or(patch, |earlier| earlier.overlay(&patch)));
            }
        });
        let settings = state.settings;
        self.event_bus.emit(AppEvent::NotificationSettingsChanged { settings });

        let written = self.persist_current().await;
        if written.unwrap_or(settings).wants_drill_reminders() {
            self.schedule_reminder().await;
        }
        settings
    }

    /// Ask for push permission again. Returns whether a token was obtained.
    pub async fn request_permission(&self) -> bool {
        let token = self.register_token().await;
        let granted = token.is_some();
        self.state.update(|s| {
            s.push_token = token;
            self.token_override.store(true, Ordering::Release);
        });
        self.event_bus.emit(AppEvent::PushTokenChanged { registered: granted });
        info!("notifications: permission request {}", if granted { "granted" } else { "denied" });
        granted
    }

    pub fn settings(&self) -> NotificationSettings {
        self.state.read(|s| s.settings)
    }

    pub fn push_token(&self) -> Option<PushToken> {
        self.state.read(|s| s.push_token.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read(|s| s.is_initialized)
    }

    pub fn reminder_time(&self) -> ReminderTime {
        self.reminder_time
    }

    /// Router used for notification responses; register extra routes here.
    pub fn router(&self) -> &Arc<ResponseRouter> {
        &self.router
    }

    /// Whether the event listeners are currently attached.
    pub fn has_listeners(&self) -> bool {
        lock(&self.subscriptions).is_some()
    }

    /// Register an observer of notification state changes.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&NotificationState) + Send + Sync + 'static,
    {
        self.state.subscribe(observer)
    }

    pub fn watch(&self) -> watch::Receiver<NotificationState> {
        self.state.watch()
    }
}

#[async_trait]
impl ReactiveProvider for NotificationCenter {
    type State = NotificationState;

    fn name(&self) -> &str {
        "notifications"
    }

    fn state(&self) -> &ReactiveState<NotificationState> {
        &self.state
    }

    fn phase(&self) -> ProviderPhase {
        self.phase.get()
    }

    async fn bring_up(&self) {
        if !self.phase.begin() {
            debug!("notifications: bring-up skipped ({})", self.phase.get());
            return;
        }

        let (token, stored) = tokio::join!(self.register_token(), self.read_settings());

        if !self.phase.finish() {
            debug!("notifications: discarding bring-up results after teardown");
            return;
        }

        let mut replayed = false;
        let state = self.state.update(|s| {
            let pending = lock(&self.pending).take();
            replayed = pending.is_some();
            s.settings = match pending {
                Some(patch) => stored.merged(&patch),
                None => stored,
            };
            if !self.token_override.load(Ordering::Acquire) {
                s.push_token = token;
            }
            s.is_initialized = true;
        });
        info!(
            "notifications: initialized (push token: {}, reminders: {})",
            if state.push_token.is_some() { "registered" } else { "none" },
            state.settings.wants_drill_reminders()
        );

        if replayed {
            self.persist_current().await;
        }
        if state.settings.wants_drill_reminders() {
            self.schedule_reminder().await;
        }

        self.event_bus.emit(AppEvent::PushTokenChanged {
            registered: state.push_token.is_some(),
        });
        self.event_bus.emit(AppEvent::ProviderReady {
            provider: self.name().to_string(),
        });
    }

    fn teardown(&self) {
        self.unmount();
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        let remaining = self
            .subscriptions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscriptions) = remaining {
            debug!("notifications: releasing listeners on drop");
            subscriptions.release();
        }
    }
}
