//! Theme commands.

use clap::Subcommand;
use console::style;

use dc_core::config::AppConfig;
use dc_core::error::DcResult;
use dc_services::theme::{ThemeColors, ThemeMode, ThemeStore};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Show the current mode.
    Show,
    /// Switch to a mode.
    Set {
        /// Mode to use (dark, light).
        mode: ThemeMode,
    },
    /// Switch to the opposite mode.
    Toggle,
    /// Print the palette for the current mode.
    Colors,
}

fn print_mode(theme: &ThemeStore, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({
                "mode": theme.mode(),
                "isLoading": theme.is_loading(),
            }));
        }
        OutputFormat::Text => {
            println!("Theme: {}", style(theme.mode()).cyan().bold());
        }
    }
}

fn print_colors(mode: ThemeMode, colors: &ThemeColors, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({
                "mode": mode,
                "colors": colors,
            }));
        }
        OutputFormat::Text => {
            println!("{}", style(format!("Palette ({mode})")).bold().underlined());
            for (name, value) in colors.entries() {
                println!("  {:<16} {}", name, value);
            }
        }
    }
}

pub async fn run(config: &AppConfig, ephemeral: bool, action: ThemeAction, format: OutputFormat) -> DcResult<()> {
    let (context, _) = super::open_context(config, ephemeral).await?;
    let theme = context.theme();

    match action {
        ThemeAction::Show => print_mode(theme, format),
        ThemeAction::Set { mode } => {
            theme.set_theme(mode).await;
            print_mode(theme, format);
        }
        ThemeAction::Toggle => {
            theme.toggle_theme().await;
            print_mode(theme, format);
        }
        ThemeAction::Colors => print_colors(theme.mode(), &theme.colors(), format),
    }

    context.teardown();
    Ok(())
}
