//! Status command - show provider, platform and storage status.

use console::style;

use dc_core::config::AppConfig;
use dc_core::error::DcResult;
use dc_core::platform::Platform;
use crate::OutputFormat;

use super::on_off;

/// Run the status command.
pub async fn run(config: &AppConfig, ephemeral: bool, format: OutputFormat) -> DcResult<()> {
    let start = std::time::Instant::now();
    let (context, location) = super::open_context(config, ephemeral).await?;
    let mount_ms = start.elapsed().as_millis();

    let platform = Platform::current();
    let theme = context.theme();
    let center = context.notifications();
    let settings = center.settings();
    let phases = context.phases();

    match format {
        OutputFormat::Json => {
            let providers: serde_json::Map<String, serde_json::Value> = phases
                .iter()
                .map(|(name, phase)| (name.clone(), serde_json::json!(phase.to_string())))
                .collect();
            super::print_json(&serde_json::json!({
                "version": dc_core::constants::APP_VERSION,
                "platform": platform.name(),
                "supportsNotifications": platform.supports_notifications(),
                "store": location.to_string(),
                "mountMs": mount_ms,
                "providers": providers,
                "theme": {
                    "mode": theme.mode(),
                    "isLoading": theme.is_loading(),
                },
                "notifications": {
                    "isInitialized": center.is_initialized(),
                    "pushRegistered": center.push_token().is_some(),
                    "settings": settings,
                    "reminderTime": center.reminder_time().to_string(),
                    "listenersAttached": center.has_listeners(),
                    "routes": center.router().routes(),
                },
            }));
        }
        OutputFormat::Text => {
            println!("{}", style("drillcoach status").bold().underlined());
            println!("  version            {}", dc_core::constants::APP_VERSION);
            println!("  platform           {}", platform);
            println!("  store              {}", location);
            println!("  mounted in         {} ms", mount_ms);

            println!();
            println!("{}", style("Providers").bold().underlined());
            for (name, phase) in &phases {
                println!("  {:<18} {}", name, phase);
            }

            println!();
            println!("{}", style("Theme").bold().underlined());
            println!("  mode               {}", theme.mode());

            println!();
            println!("{}", style("Notifications").bold().underlined());
            let registered = if center.push_token().is_some() {
                style("registered").green()
            } else {
                style("not registered").yellow()
            };
            println!("  push               {}", registered);
            println!("  enabled            {}", on_off(settings.enabled));
            println!(
                "  daily reminder     {} at {}",
                on_off(settings.wants_drill_reminders()),
                center.reminder_time()
            );
            println!("  listeners          {}", on_off(center.has_listeners()));
            println!("  routes             {}", center.router().routes().join(", "));
        }
    }

    context.teardown();
    Ok(())
}
