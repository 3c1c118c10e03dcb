//! Notification commands.

use clap::Subcommand;
use console::style;

use dc_core::config::AppConfig;
use dc_core::error::{DcError, DcResult};
use dc_services::event_bus::AppEvent;
use dc_services::notification::{NotificationCenter, NotificationSettingsPatch};
use dc_services::platform::{IncomingNotification, NotificationResponse};
use crate::OutputFormat;

use super::on_off;

#[derive(Subcommand)]
pub enum NotificationsAction {
    /// Show the notification settings and push registration.
    Show,
    /// Change notification settings. Omitted flags keep their value.
    Set {
        /// Master switch for all notifications.
        #[arg(long)]
        enabled: Option<bool>,
        /// Daily drill reminder.
        #[arg(long)]
        drill_reminders: Option<bool>,
        /// Progress update notifications.
        #[arg(long)]
        progress_updates: Option<bool>,
        /// Coach tip notifications.
        #[arg(long)]
        coach_tips: Option<bool>,
    },
    /// Ask for push permission again.
    RequestPermission,
    /// Deliver a local notification and tap it, exercising the response routes.
    Simulate {
        /// Payload type (drill_reminder, progress_update, coach_tip, ...).
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
}

fn print_state(center: &NotificationCenter, format: OutputFormat) {
    let settings = center.settings();
    let token = center.push_token();
    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({
                "settings": settings,
                "pushToken": token,
                "isInitialized": center.is_initialized(),
                "reminderTime": center.reminder_time().to_string(),
            }));
        }
        OutputFormat::Text => {
            println!("{}", style("Notifications").bold().underlined());
            println!("  enabled            {}", on_off(settings.enabled));
            println!("  drill reminders    {}", on_off(settings.drill_reminders));
            println!("  progress updates   {}", on_off(settings.progress_updates));
            println!("  coach tips         {}", on_off(settings.coach_tips));
            println!("  reminder time      {}", center.reminder_time());
            match token {
                Some(token) => println!("  push token         {}", style(token).dim()),
                None => println!("  push token         {}", style("not registered").yellow()),
            }
        }
    }
}

pub async fn run(
    config: &AppConfig,
    ephemeral: bool,
    action: NotificationsAction,
    format: OutputFormat,
) -> DcResult<()> {
    let (context, _) = super::open_context(config, ephemeral).await?;
    let center = context.notifications();

    let result = match action {
        NotificationsAction::Show => {
            print_state(center, format);
            Ok(())
        }
        NotificationsAction::Set {
            enabled,
            drill_reminders,
            progress_updates,
            coach_tips,
        } => {
            let patch = NotificationSettingsPatch {
                enabled,
                drill_reminders,
                progress_updates,
                coach_tips,
            };
            if patch.is_empty() {
                println!(
                    "{} Nothing to change. Pass at least one of --enabled, --drill-reminders, --progress-updates, --coach-tips.",
                    style("WARN").yellow().bold()
                );
            } else {
                center.update_settings(patch).await;
            }
            print_state(center, format);
            Ok(())
        }
        NotificationsAction::RequestPermission => {
            let granted = center.request_permission().await;
            match format {
                OutputFormat::Json => {
                    super::print_json(&serde_json::json!({
                        "granted": granted,
                        "pushToken": center.push_token(),
                    }));
                }
                OutputFormat::Text => {
                    if granted {
                        println!("{} Push permission granted", style("OK").green().bold());
                    } else {
                        println!("{} Push permission not granted", style("DENIED").red().bold());
                    }
                }
            }
            Ok(())
        }
        NotificationsAction::Simulate { kind } => simulate(&context, kind, format),
    };

    context.teardown();
    result
}

fn simulate(context: &dc_services::AppContext, kind: Option<String>, format: OutputFormat) -> DcResult<()> {
    let events = context
        .local_events()
        .ok_or_else(|| DcError::EventSource("no local event source".into()))?;

    let data = match &kind {
        Some(kind) => serde_json::json!({ "type": kind }),
        None => serde_json::json!({}),
    };
    let notification = IncomingNotification {
        id: format!("cli-{}", std::process::id()),
        title: "drillcoach".to_string(),
        body: "Simulated notification".to_string(),
        data,
    };

    let mut rx = context.event_bus().subscribe();
    let received = events.deliver(&notification);
    let responded = events.respond(&NotificationResponse::tap(notification));

    let mut handled = false;
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::NotificationResponded { handled: routed, .. } = event {
            handled |= routed;
        }
    }

    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({
                "type": kind,
                "receivedListeners": received,
                "responseListeners": responded,
                "handled": handled,
            }));
        }
        OutputFormat::Text => {
            println!("Delivered to {received} listener(s), response to {responded} listener(s)");
            if handled {
                println!("{} Response handled by its route", style("OK").green().bold());
            } else {
                println!("{} No route for this type", style("WARN").yellow().bold());
            }
        }
    }
    Ok(())
}
