//! Provider trait and lifecycle tracking.
//!
//! A provider owns one `ReactiveState<S>`, brings itself up once from
//! external services, and is torn down by its owner. Every provider is
//! created by `AppContext`, one instance per process.

use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;

use crate::state::{ReactiveState, Subscription};

/// Lifecycle phase of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPhase {
    /// Constructed, bring-up not started.
    Created,
    /// Bring-up is waiting on external services.
    BringingUp,
    /// Bring-up committed its results.
    Ready,
    /// Owner released the provider. Late bring-up results are discarded.
    TornDown,
}

impl ProviderPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::BringingUp,
            2 => Self::Ready,
            _ => Self::TornDown,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::BringingUp => 1,
            Self::Ready => 2,
            Self::TornDown => 3,
        }
    }
}

impl std::fmt::Display for ProviderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::BringingUp => write!(f, "bringing_up"),
            Self::Ready => write!(f, "ready"),
            Self::TornDown => write!(f, "torn_down"),
        }
    }
}

/// Atomic phase holder with the transitions providers rely on.
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(ProviderPhase::Created.as_u8()))
    }

    pub fn get(&self) -> ProviderPhase {
        ProviderPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Created -> BringingUp`. False if bring-up already started or the
    /// provider was torn down first.
    pub fn begin(&self) -> bool {
        self.transition(ProviderPhase::Created, ProviderPhase::BringingUp)
    }

    /// `BringingUp -> Ready`. False when teardown won the race.
    pub fn finish(&self) -> bool {
        self.transition(ProviderPhase::BringingUp, ProviderPhase::Ready)
    }

    /// Move to `TornDown` from any phase, returning the previous phase.
    pub fn tear_down(&self) -> ProviderPhase {
        ProviderPhase::from_u8(self.0.swap(ProviderPhase::TornDown.as_u8(), Ordering::AcqRel))
    }

    fn transition(&self, from: ProviderPhase, to: ProviderPhase) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared shape of the theme and notification providers.
#[async_trait]
pub trait ReactiveProvider: Send + Sync {
    /// State exposed to consumers.
    type State: Clone + Send + Sync + 'static;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// The observable state cell.
    fn state(&self) -> &ReactiveState<Self::State>;

    /// Current lifecycle phase.
    fn phase(&self) -> ProviderPhase;

    /// One-time asynchronous initialization. Never fails outwardly; repeated
    /// calls are no-ops.
    async fn bring_up(&self);

    /// Release everything bound to the provider's lifetime.
    fn teardown(&self);

    /// Clone of the current state.
    fn snapshot(&self) -> Self::State {
        self.state().get()
    }

    /// Register a synchronous observer of state changes.
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Self::State) + Send + Sync + 'static,
        Self: Sized,
    {
        self.state().subscribe(observer)
    }

    /// Whether bring-up has committed.
    fn is_ready(&self) -> bool {
        self.phase() == ProviderPhase::Ready
    }
}
