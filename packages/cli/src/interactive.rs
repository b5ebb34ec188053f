//! Interactive menu.
//!
//! Keeps one marker model alive across actions so layer toggles and
//! selections carry over, the way they do on the dashboard.

use dialoguer::{Input, Select};
use tourist_safety_cli_utils::MultiProgress;
use tourist_safety_map::models::Layer;

use crate::config::AppConfig;
use crate::markers::{print_geojson, print_markers, print_popup};
use crate::panic::{self, PanicOptions};
use crate::record::{self, RecordOptions};

/// Top-level actions in the interactive menu.
enum Action {
    ShowMarkers,
    ToggleLayer,
    SelectMarker,
    ExportGeojson,
    Panic,
    Record,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ShowMarkers,
        Self::ToggleLayer,
        Self::SelectMarker,
        Self::ExportGeojson,
        Self::Panic,
        Self::Record,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ShowMarkers => "Show visible markers",
            Self::ToggleLayer => "Toggle a map layer",
            Self::SelectMarker => "Select a marker",
            Self::ExportGeojson => "Export visible markers (GeoJSON)",
            Self::Panic => "Press the panic button",
            Self::Record => "Record a voice note",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu until the user quits.
///
/// # Errors
///
/// Returns an error if the catalogue cannot be loaded, a prompt fails, or
/// an action fails.
pub async fn run(
    multi: &MultiProgress,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut model = config.marker_model()?;

    println!("Tourist Safety: {}", model.catalogue().name);
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::ShowMarkers => print_markers(&model, false)?,
            Action::ToggleLayer => {
                let items: Vec<String> = Layer::all()
                    .iter()
                    .map(|layer| {
                        let mark = if model.layers().is_visible(*layer) {
                            "x"
                        } else {
                            " "
                        };
                        format!("[{mark}] {}", layer.title())
                    })
                    .collect();

                let idx = Select::new()
                    .with_prompt("Layer")
                    .items(&items)
                    .default(0)
                    .interact()?;

                let layer = Layer::all()[idx];
                let visible = model.toggle_layer(layer);
                println!(
                    "{} {}",
                    layer.title(),
                    if visible { "shown" } else { "hidden" }
                );
            }
            Action::SelectMarker => {
                let items: Vec<String> = model
                    .catalogue()
                    .markers()
                    .iter()
                    .map(|marker| format!("{:<5} {}", marker.id, marker.label))
                    .collect();

                let idx = Select::new()
                    .with_prompt("Marker (selecting the active marker clears it)")
                    .items(&items)
                    .default(0)
                    .interact()?;

                let id = model.catalogue().markers()[idx].id.clone();
                model.select_marker(&id);

                match model.popup()? {
                    Some(popup) => print_popup(&popup),
                    None => println!("No marker selected, or its layer is hidden."),
                }
            }
            Action::ExportGeojson => print_geojson(&model)?,
            Action::Panic => {
                let hold_ms: u64 = Input::new()
                    .with_prompt("Hold for (ms)")
                    .default(config.emergency.hold_duration_ms)
                    .interact_text()?;

                panic::run(
                    multi,
                    config,
                    PanicOptions {
                        hold_ms: Some(hold_ms),
                        ..PanicOptions::default()
                    },
                )
                .await?;
            }
            Action::Record => {
                let seconds: u32 = Input::new()
                    .with_prompt("Maximum length (s)")
                    .default(config.recorder.max_duration_secs)
                    .interact_text()?;

                record::run(
                    multi,
                    config,
                    RecordOptions {
                        seconds: Some(seconds),
                        ..RecordOptions::default()
                    },
                )
                .await?;
            }
            Action::Quit => break,
        }

        println!();
    }

    Ok(())
}
