#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demo CLI for the tourist safety core.
//!
//! ```text
//! tourist_safety markers [--hide heatmap] [--show weather] [--json]
//! tourist_safety select t3 [rz2 ...] [--json]
//! tourist_safety geojson [--hide risk_zones]
//! tourist_safety panic [--hold-ms 2000] [--cancel-after 2 | --now] [--deny-mic] [--note-secs 5]
//! tourist_safety record [--seconds 30] [--stop-after 5] [--deny] [--json]
//! ```
//!
//! Running with no subcommand enters interactive mode. Every subcommand
//! accepts `--config <file.toml>`.
//!
//! Uses `indicatif-log-bridge` (via [`tourist_safety_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod interactive;
mod markers;
mod panic;
mod record;

use std::path::PathBuf;
use std::str::FromStr as _;

use clap::{Parser, Subcommand};
use tourist_safety_map::MarkerModel;
use tourist_safety_map::models::Layer;

use crate::config::AppConfig;
use crate::panic::PanicOptions;
use crate::record::RecordOptions;

#[derive(Parser)]
#[command(
    name = "tourist_safety",
    about = "Tourist safety map, panic button and voice capture"
)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List visible markers with screen positions and dashboard figures
    Markers {
        /// Hide a layer (repeatable)
        #[arg(long, value_parser = parse_layer)]
        hide: Vec<Layer>,
        /// Show a layer (repeatable)
        #[arg(long, value_parser = parse_layer)]
        show: Vec<Layer>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Select markers in order and print the resulting popup
    Select {
        /// Marker IDs; selecting the active marker again clears it
        #[arg(required = true)]
        ids: Vec<String>,
        /// Print the popup as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export visible markers as a GeoJSON feature collection
    Geojson {
        /// Hide a layer (repeatable)
        #[arg(long, value_parser = parse_layer)]
        hide: Vec<Layer>,
        /// Show a layer (repeatable)
        #[arg(long, value_parser = parse_layer)]
        show: Vec<Layer>,
    },
    /// Simulate a panic-button press
    Panic {
        /// How long to hold the control, in milliseconds
        #[arg(long)]
        hold_ms: Option<u64>,
        /// Cancel this many seconds after the confirmation opens
        #[arg(long, conflicts_with = "now")]
        cancel_after: Option<u64>,
        /// Call for help immediately once confirming
        #[arg(long)]
        now: bool,
        /// Simulate denied microphone access
        #[arg(long)]
        deny_mic: bool,
        /// Stop the post-dispatch voice note after this many seconds
        #[arg(long)]
        note_secs: Option<u64>,
    },
    /// Record a voice note
    Record {
        /// Maximum length in seconds
        #[arg(long)]
        seconds: Option<u32>,
        /// Stop early after this many seconds
        #[arg(long)]
        stop_after: Option<u64>,
        /// Simulate denied microphone access
        #[arg(long)]
        deny: bool,
        /// Print the recording handle as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_layer(value: &str) -> Result<Layer, String> {
    Layer::from_str(value).map_err(|_| {
        let names: Vec<&str> = Layer::all().iter().map(AsRef::as_ref).collect();
        format!("unknown layer {value:?} (expected one of: {})", names.join(", "))
    })
}

fn apply_layers(model: &mut MarkerModel, hide: &[Layer], show: &[Layer]) {
    for layer in hide {
        model.set_layer_visible(*layer, false);
    }
    for layer in show {
        model.set_layer_visible(*layer, true);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tourist_safety_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let Some(command) = cli.command else {
        return interactive::run(&multi, &config).await;
    };

    match command {
        Commands::Markers { hide, show, json } => {
            let mut model = config.marker_model()?;
            apply_layers(&mut model, &hide, &show);
            markers::print_markers(&model, json)?;
        }
        Commands::Select { ids, json } => {
            let mut model = config.marker_model()?;
            markers::print_selection(&mut model, &ids, json)?;
        }
        Commands::Geojson { hide, show } => {
            let mut model = config.marker_model()?;
            apply_layers(&mut model, &hide, &show);
            markers::print_geojson(&model)?;
        }
        Commands::Panic {
            hold_ms,
            cancel_after,
            now,
            deny_mic,
            note_secs,
        } => {
            panic::run(
                &multi,
                &config,
                PanicOptions {
                    hold_ms,
                    cancel_after,
                    now,
                    deny_mic,
                    note_secs,
                },
            )
            .await?;
        }
        Commands::Record {
            seconds,
            stop_after,
            deny,
            json,
        } => {
            record::run(
                &multi,
                &config,
                RecordOptions {
                    seconds,
                    stop_after,
                    deny,
                    json,
                },
            )
            .await?;
        }
    }

    Ok(())
}
