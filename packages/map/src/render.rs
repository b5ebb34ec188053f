//! Render-ready projections of the marker model.
//!
//! Nothing here is cached: every value is derived from the catalogue, the
//! layer flags and the active selection at the time it is requested.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tourist_safety_map_models::{
    Marker, MarkerCategory, MarkerColor, MarkerStatus, MarkerStyle, StatusChipVariant,
};

use crate::projection::ScreenOffset;

/// A coverage circle drawn around a risk zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageCircle {
    /// Radius in kilometers.
    pub radius_km: f64,
    /// Outline color.
    pub color: MarkerColor,
}

impl CoverageCircle {
    /// Coverage circle for a marker, if it is a risk zone with a radius.
    #[must_use]
    pub fn for_marker(marker: &Marker) -> Option<Self> {
        let radius_km = marker.coverage_radius_km()?;
        let color = match marker.status {
            Some(MarkerStatus::Restricted) => MarkerColor::Danger,
            Some(MarkerStatus::Safe | MarkerStatus::Warning | MarkerStatus::Emergency) | None => {
                MarkerColor::Warning
            }
        };
        Some(Self { radius_km, color })
    }
}

/// One visible marker, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMarker {
    /// Marker identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Marker category.
    pub category: MarkerCategory,
    /// Marker status, if any.
    pub status: Option<MarkerStatus>,
    /// Position in the map view.
    pub offset: ScreenOffset,
    /// Whether the marker lies inside the view window.
    pub in_view: bool,
    /// Visual encoding.
    pub style: MarkerStyle,
    /// Whether this is the active (selected) marker.
    pub active: bool,
    /// Coverage circle for risk zones.
    pub coverage: Option<CoverageCircle>,
}

/// A status chip as shown in a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChip {
    /// Chip color variant.
    pub variant: StatusChipVariant,
    /// Capitalized status label.
    pub label: String,
}

impl From<MarkerStatus> for StatusChip {
    fn from(status: MarkerStatus) -> Self {
        Self {
            variant: status.chip_variant(),
            label: status.label().to_string(),
        }
    }
}

/// Popup content for the active marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPopup {
    /// Marker identifier.
    pub id: String,
    /// Title line.
    pub label: String,
    /// Status chip, if the marker has a status.
    pub chip: Option<StatusChip>,
    /// Free-text details.
    pub details: Option<String>,
    /// "Radius: Nkm" line for risk zones.
    pub radius: Option<String>,
    /// Whether to show the last-updated time (tourists only).
    pub shows_updated_at: bool,
}

impl MarkerPopup {
    /// Builds the popup for `marker`.
    #[must_use]
    pub fn for_marker(marker: &Marker) -> Self {
        Self {
            id: marker.id.clone(),
            label: marker.label.clone(),
            chip: marker.status.map(StatusChip::from),
            details: marker.details.clone(),
            radius: marker
                .coverage_radius_km()
                .map(|radius_km| format!("Radius: {radius_km}km")),
            shows_updated_at: marker.category == MarkerCategory::Tourist,
        }
    }
}

/// Marker counts by category, and tourists by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerCounts {
    /// Markers per category.
    pub by_category: BTreeMap<MarkerCategory, usize>,
    /// Tourists per status. Tourists without a status are not counted here.
    pub tourists_by_status: BTreeMap<MarkerStatus, usize>,
}

impl MarkerCounts {
    /// Tallies the given markers.
    pub fn tally<'a>(markers: impl IntoIterator<Item = &'a Marker>) -> Self {
        let mut counts = Self::default();
        for marker in markers {
            *counts.by_category.entry(marker.category).or_default() += 1;
            if marker.category == MarkerCategory::Tourist {
                if let Some(status) = marker.status {
                    *counts.tourists_by_status.entry(status).or_default() += 1;
                }
            }
        }
        counts
    }

    /// Number of markers in `category`.
    #[must_use]
    pub fn category(&self, category: MarkerCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    /// Number of tourists with `status`.
    #[must_use]
    pub fn tourists_with(&self, status: MarkerStatus) -> usize {
        self.tourists_by_status.get(&status).copied().unwrap_or(0)
    }

    /// "Active tourists" figure.
    #[must_use]
    pub fn tourists(&self) -> usize {
        self.category(MarkerCategory::Tourist)
    }

    /// "Emergencies" figure.
    #[must_use]
    pub fn emergencies(&self) -> usize {
        self.tourists_with(MarkerStatus::Emergency)
    }

    /// "Warnings" figure.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.tourists_with(MarkerStatus::Warning)
    }
}
