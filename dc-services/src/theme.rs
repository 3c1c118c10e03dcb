//! Theme store: the persisted dark/light mode and its derived palette.
//!
//! The mode is loaded once at startup. Until the load completes the store
//! reports `is_loading` and the default mode (dark). Changes are applied in
//! memory first and persisted afterwards; a failed write leaves the
//! in-memory mode standing. Writes are serialized and always store the mode
//! current at the time of the write, so the last write matches memory.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use dc_core::constants::keys;
use dc_core::error::DcError;
use dc_storage::KeyValueStore;

use crate::event_bus::{AppEvent, EventBus};
use crate::provider::{PhaseCell, ProviderPhase, ReactiveProvider};
use crate::state::{ReactiveState, Subscription};

/// Light or dark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// The persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Interpret a stored value. Only the exact strings `"dark"` and
    /// `"light"` are recognized.
    pub fn parse_stored(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }
}

impl FromStr for ThemeMode {
    type Err = DcError;

    /// Lenient parse for user input: surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        Self::parse_stored(&value)
            .ok_or_else(|| DcError::InvalidInput(format!("unknown theme mode: {s}")))
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named palette derived from a `ThemeMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub background: &'static str,
    pub surface: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub border: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
}

const DARK_COLORS: ThemeColors = ThemeColors {
    background: "#0B0F14",
    surface: "#141A22",
    card: "#1C2430",
    text: "#F2F5F8",
    text_secondary: "#9AA6B2",
    primary: "#3DDC84",
    accent: "#FFB020",
    border: "#2A3441",
    success: "#34C759",
    warning: "#FF9F0A",
    error: "#FF453A",
};

const LIGHT_COLORS: ThemeColors = ThemeColors {
    background: "#FFFFFF",
    surface: "#F4F6F8",
    card: "#FFFFFF",
    text: "#11181F",
    text_secondary: "#5B6773",
    primary: "#1FA463",
    accent: "#E08E00",
    border: "#D9DEE3",
    success: "#248A3D",
    warning: "#C93400",
    error: "#D70015",
};

impl ThemeColors {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => DARK_COLORS,
            ThemeMode::Light => LIGHT_COLORS,
        }
    }

    /// `(name, value)` pairs in a fixed order, for display.
    pub fn entries(&self) -> [(&'static str, &'static str); 11] {
        [
            ("background", self.background),
            ("surface", self.surface),
            ("card", self.card),
            ("text", self.text),
            ("textSecondary", self.text_secondary),
            ("primary", self.primary),
            ("accent", self.accent),
            ("border", self.border),
            ("success", self.success),
            ("warning", self.warning),
            ("error", self.error),
        ]
    }
}

/// Observable state of the theme store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub is_loading: bool,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            mode: ThemeMode::default(),
            is_loading: true,
        }
    }
}

/// Process-wide theme provider.
pub struct ThemeStore {
    state: ReactiveState<ThemeState>,
    phase: PhaseCell,
    store: Arc<dyn KeyValueStore>,
    event_bus: EventBus,
    /// Set once the user picks a mode, so a slower load does not override it.
    user_override: AtomicBool,
    write_lock: Mutex<()>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>, event_bus: EventBus) -> Self {
        Self {
            state: ReactiveState::new(ThemeState::default()),
            phase: PhaseCell::new(),
            store,
            event_bus,
            user_override: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the persisted mode. Runs once; later calls are no-ops.
    ///
    /// Unknown values, absence and read failures all leave the default mode.
    /// `is_loading` becomes false however the read went, unless the store
    /// was torn down in the meantime.
    pub async fn load(&self) {
        if !self.phase.begin() {
            debug!("theme: load skipped ({})", self.phase.get());
            return;
        }

        let loaded = match self.store.get(keys::THEME_MODE).await {
            Ok(Some(value)) => {
                let mode = ThemeMode::parse_stored(&value);
                if mode.is_none() {
                    debug!("theme: ignoring unrecognized stored mode {value:?}");
                }
                mode
            }
            Ok(None) => None,
            Err(e) => {
                warn!("theme: failed to read stored mode: {e}");
                None
            }
        };

        if !self.phase.finish() {
            debug!("theme: discarding load result after teardown");
            return;
        }

        let state = self.state.update(|s| {
            if !self.user_override.load(Ordering::Acquire) {
                s.mode = loaded.unwrap_or_default();
            }
            s.is_loading = false;
        });
        info!("theme: loaded mode {}", state.mode);
        self.event_bus.emit(AppEvent::ProviderReady {
            provider: self.name().to_string(),
        });
    }

    pub fn mode(&self) -> ThemeMode {
        self.state.read(|s| s.mode)
    }

    pub fn is_loading(&self) -> bool {
        self.state.read(|s| s.is_loading)
    }

    /// Palette for the current mode.
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::for_mode(self.mode())
    }

    /// Switch to `mode`. Observers see the change before the write starts.
    pub async fn set_theme(&self, mode: ThemeMode) {
        self.user_override.store(true, Ordering::Release);
        self.state.update(|s| s.mode = mode);
        self.event_bus.emit(AppEvent::ThemeChanged { mode });

        let _write = self.write_lock.lock().await;
        let current = self.mode();
        match self.store.set(keys::THEME_MODE, current.as_str()).await {
            Ok(()) => debug!("theme: persisted mode {current}"),
            Err(e) => warn!("theme: failed to persist mode {current}: {e}"),
        }
    }

    /// Switch to the opposite of the current mode and return the new mode.
    pub async fn toggle_theme(&self) -> ThemeMode {
        let next = self.mode().opposite();
        self.set_theme(next).await;
        next
    }

    /// Register an observer of theme state changes.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ThemeState) + Send + Sync + 'static,
    {
        self.state.subscribe(observer)
    }

    pub fn watch(&self) -> watch::Receiver<ThemeState> {
        self.state.watch()
    }
}

#[async_trait]
impl ReactiveProvider for ThemeStore {
    type State = ThemeState;

    fn name(&self) -> &str {
        "theme"
    }

    fn state(&self) -> &ReactiveState<ThemeState> {
        &self.state
    }

    fn phase(&self) -> ProviderPhase {
        self.phase.get()
    }

    async fn bring_up(&self) {
        self.load().await;
    }

    fn teardown(&self) {
        let previous = self.phase.tear_down();
        debug!("theme: torn down (was {previous})");
    }
}
