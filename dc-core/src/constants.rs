//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "drillcoach";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default hour (local time) for the daily drill reminder.
pub const DEFAULT_REMINDER_HOUR: u32 = 18;

/// Default minute for the daily drill reminder.
pub const DEFAULT_REMINDER_MINUTE: u32 = 0;

/// Default capacity of the application event bus.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Keys used in the persistent key-value store.
pub mod keys {
    /// Persisted theme mode, stored as `"dark"` or `"light"`.
    pub const THEME_MODE: &str = "themeMode";
    /// Persisted notification settings record, stored as JSON.
    pub const NOTIFICATION_SETTINGS: &str = "notificationSettings";
}

/// Values of the `type` field carried by notification payloads.
pub mod notification_types {
    pub const DRILL_REMINDER: &str = "drill_reminder";
    pub const PROGRESS_UPDATE: &str = "progress_update";
    pub const COACH_TIP: &str = "coach_tip";

    /// All payload types with a built-in response route.
    pub const ALL: &[&str] = &[DRILL_REMINDER, PROGRESS_UPDATE, COACH_TIP];
}
