//! Notification center integration tests.
//!
//! Bring-up with failing collaborators, partial settings merges, reminder
//! scheduling, listener lifetime, permission requests, and the races
//! between bring-up, user updates and unmount.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{settle, FakeEventSource, FakeRegistrar, FakeScheduler, FakeStore, Gate, Harness, Registration};
use dc_core::constants::keys;
use dc_services::event_bus::AppEvent;
use dc_services::notification::{NotificationSettings, NotificationSettingsPatch};
use dc_services::platform::{NotificationResponse, ReminderTime};
use dc_services::provider::{ProviderPhase, ReactiveProvider};

fn stored(settings: &NotificationSettings) -> String {
    settings.to_json().unwrap()
}

fn persisted(harness: &Harness) -> Option<NotificationSettings> {
    harness
        .store
        .value(keys::NOTIFICATION_SETTINGS)
        .map(|raw| NotificationSettings::from_json(&raw).unwrap())
}

// ---- Bring-up ----

#[tokio::test]
async fn bring_up_adopts_token_and_stored_settings() {
    let saved = NotificationSettings {
        coach_tips: false,
        ..NotificationSettings::default()
    };
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, &stored(&saved))),
        ..Harness::new()
    };
    let center = harness.center();

    center.mount().await.unwrap();

    assert!(center.is_initialized());
    assert_eq!(center.push_token().as_deref(), Some("token-1"));
    assert_eq!(center.settings(), saved);
    assert_eq!(harness.scheduler.calls(), vec![ReminderTime::new(18, 0).unwrap()]);
    assert_eq!(center.phase(), ProviderPhase::Ready);
}

#[tokio::test]
async fn bring_up_survives_every_collaborator_failing() {
    let harness = Harness {
        store: Arc::new(FakeStore::new().failing_reads()),
        registrar: Arc::new(FakeRegistrar::failing()),
        scheduler: Arc::new(FakeScheduler::failing()),
        ..Harness::new()
    };
    let center = harness.center();

    let flips = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&flips);
    let _sub = center.subscribe(move |state| sink.lock().unwrap().push(state.is_initialized));

    center.bring_up().await;
    center.bring_up().await;

    assert!(center.is_initialized());
    assert_eq!(center.push_token(), None);
    assert_eq!(center.settings(), NotificationSettings::default());
    assert_eq!(*flips.lock().unwrap(), vec![true]);
    assert_eq!(harness.registrar.calls(), 1);
    assert_eq!(harness.store.read_count(), 1);
}

#[tokio::test]
async fn unreadable_stored_settings_use_defaults() {
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, "{broken")),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;
    assert_eq!(center.settings(), NotificationSettings::default());
    assert!(center.is_initialized());
}

#[tokio::test]
async fn stored_record_missing_fields_fills_defaults() {
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, r#"{"drillReminders":false}"#)),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;

    let settings = center.settings();
    assert!(!settings.drill_reminders);
    assert!(settings.enabled && settings.progress_updates && settings.coach_tips);
    assert!(harness.scheduler.calls().is_empty());
}

#[tokio::test]
async fn disabled_notifications_never_schedule() {
    let saved = NotificationSettings {
        enabled: false,
        ..NotificationSettings::default()
    };
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, &stored(&saved))),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;

    center
        .update_settings(NotificationSettingsPatch::new().with_drill_reminders(true))
        .await;
    center
        .update_settings(NotificationSettingsPatch::new().with_coach_tips(false))
        .await;

    assert!(harness.scheduler.calls().is_empty());
    assert!(!center.settings().enabled);
}

#[tokio::test]
async fn bring_up_announces_readiness() {
    let harness = Harness::new();
    let mut rx = harness.bus.subscribe();
    let center = harness.center();
    center.bring_up().await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&AppEvent::PushTokenChanged { registered: true }));
    assert!(events.contains(&AppEvent::ReminderScheduled { hour: 18, minute: 0 }));
    assert_eq!(
        events.last(),
        Some(&AppEvent::ProviderReady {
            provider: "notifications".into()
        })
    );
}

// ---- Settings updates ----

#[tokio::test]
async fn update_settings_is_a_partial_merge() {
    let saved = NotificationSettings {
        progress_updates: false,
        ..NotificationSettings::default()
    };
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, &stored(&saved))),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;

    let merged = center
        .update_settings(NotificationSettingsPatch::new().with_drill_reminders(false))
        .await;

    let expected = NotificationSettings {
        enabled: true,
        drill_reminders: false,
        progress_updates: false,
        coach_tips: true,
    };
    assert_eq!(merged, expected);
    assert_eq!(center.settings(), expected);
    assert_eq!(persisted(&harness), Some(expected));
    // Only the bring-up scheduled; disabling reminders does not.
    assert_eq!(harness.scheduler.calls().len(), 1);
}

#[tokio::test]
async fn disjoint_updates_combine() {
    let harness = Harness::new();
    let center = harness.center();
    center.bring_up().await;

    center
        .update_settings(NotificationSettingsPatch::new().with_progress_updates(false))
        .await;
    center
        .update_settings(NotificationSettingsPatch::new().with_coach_tips(false))
        .await;

    let settings = center.settings();
    assert!(!settings.progress_updates);
    assert!(!settings.coach_tips);
    assert!(settings.enabled && settings.drill_reminders);
    assert_eq!(persisted(&harness), Some(settings));
}

#[tokio::test]
async fn concurrent_updates_keep_both_fields() {
    let harness = Harness::new();
    let center = harness.center();
    center.bring_up().await;

    let a = center.update_settings(NotificationSettingsPatch::new().with_progress_updates(false));
    let b = center.update_settings(NotificationSettingsPatch::new().with_coach_tips(false));
    tokio::join!(a, b);

    let settings = center.settings();
    assert!(!settings.progress_updates && !settings.coach_tips);
}

#[tokio::test]
async fn overlapping_updates_leave_store_matching_memory() {
    let harness = Harness {
        store: Arc::new(FakeStore::new().slow_first_write(Duration::from_millis(50))),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;

    let a = center.update_settings(NotificationSettingsPatch::new().with_progress_updates(false));
    let b = center.update_settings(NotificationSettingsPatch::new().with_coach_tips(false));
    tokio::join!(a, b);

    let settings = center.settings();
    assert!(!settings.progress_updates && !settings.coach_tips);
    assert_eq!(persisted(&harness), Some(settings));
}

#[tokio::test]
async fn reenabling_reminders_reschedules() {
    let harness = Harness::new();
    let center = harness.center();
    center.bring_up().await;

    center
        .update_settings(NotificationSettingsPatch::new().with_enabled(false))
        .await;
    center
        .update_settings(NotificationSettingsPatch::new().with_enabled(true))
        .await;

    assert_eq!(harness.scheduler.calls().len(), 2);
}

#[tokio::test]
async fn persistence_failure_keeps_memory() {
    let harness = Harness {
        store: Arc::new(FakeStore::new().failing_writes()),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;

    let merged = center
        .update_settings(NotificationSettingsPatch::new().with_coach_tips(false))
        .await;
    assert!(!merged.coach_tips);
    assert!(!center.settings().coach_tips);
    assert_eq!(persisted(&harness), None);
}

#[tokio::test]
async fn settings_change_is_observed_and_emitted() {
    let harness = Harness::new();
    let center = harness.center();
    center.bring_up().await;
    let mut rx = harness.bus.subscribe();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let _sub = center.subscribe(move |state| {
        assert!(!state.settings.coach_tips);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let merged = center
        .update_settings(NotificationSettingsPatch::new().with_coach_tips(false))
        .await;
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(
        rx.recv().await.unwrap(),
        AppEvent::NotificationSettingsChanged { settings: merged }
    );
}

// ---- Permission ----

#[tokio::test]
async fn request_permission_denied_returns_false() {
    let harness = Harness {
        registrar: Arc::new(FakeRegistrar::denying()),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;
    center
        .update_settings(NotificationSettingsPatch::new().with_coach_tips(false))
        .await;
    let before = center.settings();

    assert!(!center.request_permission().await);
    assert_eq!(center.push_token(), None);
    assert_eq!(center.settings(), before);
}

#[tokio::test]
async fn request_permission_granted_stores_token() {
    let harness = Harness {
        registrar: Arc::new(FakeRegistrar::denying()),
        ..Harness::new()
    };
    let center = harness.center();
    center.bring_up().await;
    assert_eq!(center.push_token(), None);

    harness.registrar.set_outcome(Registration::Token("token-2".into()));
    assert!(center.request_permission().await);
    assert_eq!(center.push_token().as_deref(), Some("token-2"));
}

#[tokio::test]
async fn late_bring_up_keeps_granted_token() {
    let gate = Gate::closed();
    let harness = Harness {
        store: Arc::new(FakeStore::new().gated_reads(gate.clone())),
        registrar: Arc::new(FakeRegistrar::denying()),
        ..Harness::new()
    };
    let center = harness.center();
    let handle = center.mount();
    settle().await;
    assert_eq!(harness.registrar.calls(), 1);

    harness.registrar.set_outcome(Registration::Token("token-2".into()));
    assert!(center.request_permission().await);

    gate.open();
    handle.await.unwrap();
    assert!(center.is_initialized());
    assert_eq!(center.push_token().as_deref(), Some("token-2"));
}

#[tokio::test]
async fn request_permission_error_clears_token() {
    let harness = Harness::new();
    let center = harness.center();
    center.bring_up().await;
    assert!(center.push_token().is_some());

    harness.registrar.set_outcome(Registration::Fails);
    assert!(!center.request_permission().await);
    assert_eq!(center.push_token(), None);
    assert_eq!(center.settings(), NotificationSettings::default());
}

// ---- Listeners ----

#[tokio::test]
async fn releasing_listeners_stops_handlers() {
    let harness = Harness::new();
    let center = harness.center();
    center.mount().await.unwrap();
    assert!(center.has_listeners());
    assert_eq!(harness.events.attached(), 2);

    let tap = NotificationResponse::tap(common::notification("n-1", Some("coach_tip")));
    assert_eq!(harness.events.emit_response(&tap), 1);
    assert_eq!(harness.events.emit_received(&common::notification("n-2", None)), 1);

    center.unmount();
    assert!(!center.has_listeners());
    assert_eq!(harness.events.released(), 2);
    assert_eq!(harness.events.emit_response(&tap), 0);
    assert_eq!(harness.events.emit_received(&common::notification("n-3", None)), 0);
}

#[tokio::test]
async fn listeners_released_exactly_once() {
    let harness = Harness::new();
    let center = harness.center();
    center.mount().await.unwrap();

    center.unmount();
    center.unmount();
    drop(center);
    assert_eq!(harness.events.released(), 2);
}

#[tokio::test]
async fn drop_without_unmount_releases_listeners() {
    let harness = Harness::new();
    {
        let center = harness.center();
        center.mount().await.unwrap();
        assert_eq!(harness.events.active(), 2);
    }
    assert_eq!(harness.events.released(), 2);
    assert_eq!(harness.events.active(), 0);
}

#[tokio::test]
async fn failed_second_listener_releases_first() {
    let harness = Harness {
        events: FakeEventSource::new().failing_response(),
        ..Harness::new()
    };
    let center = harness.center();
    center.mount().await.unwrap();

    assert_eq!(harness.events.attached(), 1);
    assert_eq!(harness.events.released(), 1);
    assert_eq!(harness.events.active(), 0);
    assert!(!center.has_listeners());
    assert!(center.is_initialized());
}

#[tokio::test]
async fn unsupported_platform_attaches_nothing() {
    let harness = Harness {
        registrar: Arc::new(FakeRegistrar::denying().unsupported()),
        ..Harness::new()
    };
    let center = harness.center();
    center.mount().await.unwrap();

    assert_eq!(harness.events.attached(), 0);
    assert!(!center.has_listeners());
    assert!(center.is_initialized());
    assert_eq!(center.push_token(), None);
}

#[tokio::test]
async fn received_notifications_are_forwarded() {
    let harness = Harness::new();
    let center = harness.center();
    center.mount().await.unwrap();
    let mut rx = harness.bus.subscribe();
    let before = center.snapshot();

    harness
        .events
        .emit_received(&common::notification("n-9", Some("progress_update")));

    assert_eq!(
        rx.recv().await.unwrap(),
        AppEvent::NotificationReceived {
            id: "n-9".into(),
            kind: Some("progress_update".into()),
        }
    );
    assert_eq!(center.snapshot(), before);
}

#[tokio::test]
async fn responses_are_routed_by_type() {
    let harness = Harness::new();
    let center = harness.center();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    center.router().register("streak", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    center.mount().await.unwrap();
    let mut rx = harness.bus.subscribe();

    harness
        .events
        .emit_response(&NotificationResponse::tap(common::notification("n-1", Some("streak"))));
    harness
        .events
        .emit_response(&NotificationResponse::tap(common::notification("n-2", Some("mystery"))));
    harness
        .events
        .emit_response(&NotificationResponse::tap(common::notification("n-3", None)));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let handled: Vec<bool> = (0..3)
        .map(|_| match rx.try_recv().unwrap() {
            AppEvent::NotificationResponded { handled, .. } => handled,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(handled, vec![true, false, false]);
}

// ---- Races ----

#[tokio::test]
async fn bring_up_after_unmount_is_discarded() {
    let gate = Gate::closed();
    let harness = Harness {
        registrar: Arc::new(FakeRegistrar::granting("late").gated(gate.clone())),
        ..Harness::new()
    };
    let center = harness.center();

    let handle = center.mount();
    tokio::task::yield_now().await;
    center.unmount();
    gate.open();
    handle.await.unwrap();

    assert!(!center.is_initialized());
    assert_eq!(center.push_token(), None);
    assert!(harness.scheduler.calls().is_empty());
    assert_eq!(center.phase(), ProviderPhase::TornDown);
    assert_eq!(harness.events.released(), 2);
}

#[tokio::test]
async fn token_is_not_adopted_before_settings_arrive() {
    let gate = Gate::closed();
    let harness = Harness {
        store: Arc::new(FakeStore::new().gated_reads(gate.clone())),
        ..Harness::new()
    };
    let center = harness.center();
    let handle = center.mount();
    settle().await;

    assert_eq!(harness.registrar.calls(), 1);
    assert_eq!(center.push_token(), None);
    assert!(!center.is_initialized());

    gate.open();
    handle.await.unwrap();
    assert_eq!(center.push_token().as_deref(), Some("token-1"));
}

#[tokio::test]
async fn settings_are_not_adopted_before_registration_finishes() {
    let saved = NotificationSettings {
        coach_tips: false,
        ..NotificationSettings::default()
    };
    let gate = Gate::closed();
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, &stored(&saved))),
        registrar: Arc::new(FakeRegistrar::granting("token-1").gated(gate.clone())),
        ..Harness::new()
    };
    let center = harness.center();
    let handle = center.mount();
    settle().await;

    assert_eq!(harness.store.read_count(), 1);
    assert_eq!(center.settings(), NotificationSettings::default());
    assert!(!center.is_initialized());

    gate.open();
    handle.await.unwrap();
    assert_eq!(center.settings(), saved);
}

#[tokio::test]
async fn update_during_stalled_registration_is_persisted() {
    let saved = NotificationSettings {
        progress_updates: false,
        coach_tips: false,
        ..NotificationSettings::default()
    };
    let gate = Gate::closed();
    let harness = Harness {
        store: Arc::new(FakeStore::new().with(keys::NOTIFICATION_SETTINGS, &stored(&saved))),
        registrar: Arc::new(FakeRegistrar::granting("token-1").gated(gate.clone())),
        ..Harness::new()
    };
    let center = harness.center();
    let handle = center.mount();

    let interim = center
        .update_settings(
            NotificationSettingsPatch::new()
                .with_drill_reminders(false)
                .with_progress_updates(true),
        )
        .await;
    assert!(!interim.drill_reminders);
    assert!(!center.is_initialized());

    // Written straight away, on top of the stored record rather than defaults.
    let expected = NotificationSettings {
        enabled: true,
        drill_reminders: false,
        progress_updates: true,
        coach_tips: false,
    };
    assert_eq!(persisted(&harness), Some(expected));

    gate.open();
    handle.await.unwrap();

    assert!(center.is_initialized());
    assert_eq!(center.settings(), expected);
    assert_eq!(persisted(&harness), Some(expected));
    assert_eq!(harness.store.writes().len(), 2);
    assert!(harness.scheduler.calls().is_empty());
    assert_eq!(center.push_token().as_deref(), Some("token-1"));
}

#[tokio::test]
async fn bring_up_runs_once_across_mount_and_direct_call() {
    let harness = Harness::new();
    let center = harness.center();
    center.mount().await.unwrap();
    center.bring_up().await;
    assert_eq!(harness.registrar.calls(), 1);
    assert_eq!(harness.scheduler.calls().len(), 1);
}
