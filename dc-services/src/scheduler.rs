//! Local daily reminder scheduling.
//!
//! One tokio task per schedule sleeps until the next local occurrence of the
//! reminder time, fires, and repeats. Scheduling the time already active is
//! a no-op; a different time replaces the running task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Days, Local, TimeZone};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[allow(unused_imports)]
use dc_core::error::DcError;
use dc_core::error::DcResult;
use dc_core::constants::{notification_types, APP_NAME};

use crate::event_bus::{AppEvent, EventBus};
use crate::events::LocalEventSource;
use crate::platform::{IncomingNotification, ReminderScheduler, ReminderTime};
use crate::state::lock;

struct ActiveReminder {
    time: ReminderTime,
    task: JoinHandle<()>,
}

/// `ReminderScheduler` backed by a tokio task.
pub struct LocalReminderScheduler {
    active: Mutex<Option<ActiveReminder>>,
    events: Option<LocalEventSource>,
    event_bus: EventBus,
    desktop_alerts: bool,
    tasks_started: AtomicUsize,
}

impl LocalReminderScheduler {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            active: Mutex::new(None),
            events: None,
            event_bus,
            desktop_alerts: true,
            tasks_started: AtomicUsize::new(0),
        }
    }

    /// Also deliver each fired reminder to `events` as a `drill_reminder`.
    pub fn with_event_source(mut self, events: LocalEventSource) -> Self {
        self.events = Some(events);
        self
    }

    /// Whether fired reminders show a desktop notification.
    pub fn with_desktop_alerts(mut self, enabled: bool) -> Self {
        self.desktop_alerts = enabled;
        self
    }

    /// Time of the running reminder, if any.
    pub fn scheduled_time(&self) -> Option<ReminderTime> {
        lock(&self.active)
            .as_ref()
            .filter(|active| !active.task.is_finished())
            .map(|active| active.time)
    }

    /// Number of reminder tasks started so far.
    pub fn tasks_started(&self) -> usize {
        self.tasks_started.load(Ordering::Relaxed)
    }

    /// Stop the running reminder. Returns true if one was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.active).take() {
            Some(active) => {
                active.task.abort();
                info!("reminder: cancelled daily reminder at {}", active.time);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ReminderScheduler for LocalReminderScheduler {
    async fn schedule_daily(&self, time: ReminderTime) -> DcResult<()> {
        let mut active = lock(&self.active);
        if let Some(current) = active.as_ref() {
            if current.time == time && !current.task.is_finished() {
                debug!("reminder: {time} already scheduled");
                return Ok(());
            }
        }
        if let Some(previous) = active.take() {
            previous.task.abort();
            debug!("reminder: replacing reminder at {}", previous.time);
        }

        let task = tokio::spawn(run_daily(
            time,
            self.events.clone(),
            self.event_bus.clone(),
            self.desktop_alerts,
        ));
        self.tasks_started.fetch_add(1, Ordering::Relaxed);
        *active = Some(ActiveReminder { time, task });
        info!("reminder: daily drill reminder scheduled at {time}");
        Ok(())
    }
}

impl Drop for LocalReminderScheduler {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().unwrap_or_else(|e| e.into_inner()).take() {
            active.task.abort();
        }
    }
}

/// The first instant strictly after `now` whose local wall-clock time is
/// `time`. Wall-clock times skipped by a DST transition move to the next day.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, time: &ReminderTime) -> Option<DateTime<Tz>> {
    let zone = now.timezone();
    let today = now.date_naive();
    for offset in 0..=2 {
        let date = today.checked_add_days(Days::new(offset))?;
        let wall = date.and_hms_opt(time.hour(), time.minute(), 0)?;
        if let Some(candidate) = zone.from_local_datetime(&wall).earliest() {
            if candidate > *now {
                return Some(candidate);
            }
        }
    }
    None
}

async fn run_daily(
    time: ReminderTime,
    events: Option<LocalEventSource>,
    event_bus: EventBus,
    desktop_alerts: bool,
) {
    loop {
        let now = Local::now();
        let Some(next) = next_occurrence(&now, &time) else {
            warn!("reminder: no upcoming occurrence of {time}, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        debug!("reminder: next drill reminder at {next}");
        tokio::time::sleep(wait).await;
        fire(time, events.as_ref(), &event_bus, desktop_alerts);
    }
}

fn fire(time: ReminderTime, events: Option<&LocalEventSource>, event_bus: &EventBus, desktop_alerts: bool) {
    let notification = reminder_notification(time);
    info!("reminder: firing daily drill reminder ({time})");

    if desktop_alerts {
        if let Err(e) = show_desktop_alert(&notification.title, &notification.body) {
            warn!("reminder: failed to show desktop notification: {e}");
        }
    }
    if let Some(events) = events {
        events.deliver(&notification);
    }
    event_bus.emit(AppEvent::ReminderFired {
        hour: time.hour(),
        minute: time.minute(),
    });
}

fn reminder_notification(time: ReminderTime) -> IncomingNotification {
    IncomingNotification {
        id: format!("reminder-{}", uuid::Uuid::new_v4()),
        title: "Time to train".to_string(),
        body: "Your daily drill is waiting.".to_string(),
        data: json!({
            "type": notification_types::DRILL_REMINDER,
            "scheduledFor": time.to_string(),
        }),
    }
}

fn show_desktop_alert(title: &str, body: &str) -> DcResult<()> {
    #[cfg(not(test))]
    {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname(APP_NAME)
            .show()
            .map_err(|e| DcError::Notification(e.to_string()))?;
    }

    let _ = (title, body, APP_NAME);
    Ok(())
}
