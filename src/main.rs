// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use tiny_mirror::app::AppModel;
use tiny_mirror::constants::{AspectRatio, app_info};
use tiny_mirror::terminal::TerminalOptions;

mod cli;

#[derive(Parser)]
#[command(name = "tiny-mirror")]
#[command(about = "A small webcam mirror with Picture-in-Picture")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders the mirror to the terminal)
    Terminal {
        /// Camera id to use for this run (from 'tiny-mirror list')
        #[arg(short, long)]
        device: Option<String>,

        /// Aspect ratio for this run: 1:1, 3:4, 16:9 or 4:3
        #[arg(short, long, value_parser = parse_ratio)]
        ratio: Option<AspectRatio>,
    },

    /// List available cameras
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_ratio(value: &str) -> Result<AspectRatio, String> {
    AspectRatio::from_label(value).ok_or_else(|| {
        format!(
            "unknown aspect ratio '{}', expected one of: {}",
            value,
            tiny_mirror::constants::aspect_ratio_labels().join(", ")
        )
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=tiny_mirror=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Terminal { device, ratio }) => {
            tiny_mirror::terminal::run(TerminalOptions { device, ratio })
        }
        Some(Commands::List { json }) => cli::list_cameras(json),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(360.0)
            .min_height(180.0),
    );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
