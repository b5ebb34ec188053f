//! Map output: marker table, popups and `GeoJSON`.

use serde::Serialize;
use tourist_safety_map::{MapError, MarkerCounts, MarkerModel, MarkerPopup, RenderedMarker};

/// JSON shape of `markers --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkersReport<'a> {
    markers: &'a [RenderedMarker],
    visible_counts: &'a MarkerCounts,
    catalogue_counts: &'a MarkerCounts,
}

/// Prints the render list and the dashboard figures.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_markers(model: &MarkerModel, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let markers = model.render_list();
    let visible = model.counts();
    let totals = model.catalogue_counts();

    if json {
        let report = MarkersReport {
            markers: &markers,
            visible_counts: &visible,
            catalogue_counts: &totals,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:<6} {:<34} {:<10} {:<11} {:>7} {:>7}  STYLE",
        "ID", "LABEL", "CATEGORY", "STATUS", "LEFT%", "TOP%"
    );
    println!("{}", "-".repeat(100));

    for marker in &markers {
        let status = marker
            .status
            .map_or_else(|| "-".to_string(), |status| status.to_string());
        let mut style = format!("{} {}", marker.style.color, marker.style.icon);
        if marker.style.pulses {
            style.push_str(" pulsing");
        }
        if let Some(coverage) = marker.coverage {
            style.push_str(&format!(" ({}km {} ring)", coverage.radius_km, coverage.color));
        }
        if !marker.in_view {
            style.push_str(" [off-map]");
        }
        let active = if marker.active { "*" } else { " " };

        println!(
            "{active}{:<5} {:<34} {:<10} {:<11} {:>7.1} {:>7.1}  {style}",
            marker.id,
            marker.label,
            marker.category.to_string(),
            status,
            marker.offset.left_pct,
            marker.offset.top_pct,
        );
    }

    println!("\n{} visible marker(s)", markers.len());
    println!(
        "Active tourists: {}  Emergencies: {}  Warnings: {}",
        totals.tourists(),
        totals.emergencies(),
        totals.warnings()
    );

    Ok(())
}

/// Prints a popup card.
pub fn print_popup(popup: &MarkerPopup) {
    println!("{}", popup.label);
    if let Some(chip) = &popup.chip {
        println!("  [{}] {}", chip.variant, chip.label);
    }
    if let Some(details) = &popup.details {
        println!("  {details}");
    }
    if let Some(radius) = &popup.radius {
        println!("  {radius}");
    }
    if popup.shows_updated_at {
        println!("  Last updated: just now");
    }
}

/// Applies `ids` as successive selections and prints the resulting popup.
///
/// Unknown ids are reported, not treated as failures.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_selection(
    model: &mut MarkerModel,
    ids: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for id in ids {
        match model.select_marker(id) {
            Some(active) => log::info!("Selected {active}"),
            None => log::info!("Selection cleared"),
        }
    }

    match model.popup() {
        Ok(Some(popup)) if json => println!("{}", serde_json::to_string_pretty(&popup)?),
        Ok(Some(popup)) => print_popup(&popup),
        Ok(None) => println!("No marker selected, or its layer is hidden."),
        Err(MapError::InvalidSelection { id }) => println!("No marker with id {id:?}."),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Prints the visible markers as a `GeoJSON` feature collection.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_geojson(model: &MarkerModel) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&model.to_geojson())?);
    Ok(())
}
