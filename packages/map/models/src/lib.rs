#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map marker, layer and visual encoding types.
//!
//! A [`Marker`] is a point of interest drawn on the monitoring map: a city,
//! a tourist, an incident or a risk zone. Its colour and icon are derived
//! from the `(category, status)` pair through [`MarkerStyle::for_parts`],
//! which is an exhaustive match so that no combination can be left without
//! a visual encoding.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors raised when a marker violates its field constraints.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkerError {
    /// The marker's category never carries a status.
    #[error("marker {id}: category {category} does not carry a status (got {status})")]
    StatusNotAllowed {
        /// Marker identifier.
        id: String,
        /// Category of the offending marker.
        category: MarkerCategory,
        /// Status that was supplied.
        status: MarkerStatus,
    },

    /// Latitude or longitude is non-finite or out of range.
    #[error("marker {id}: invalid position ({lat}, {lng})")]
    InvalidPosition {
        /// Marker identifier.
        id: String,
        /// Supplied latitude.
        lat: f64,
        /// Supplied longitude.
        lng: f64,
    },

    /// Coverage radius is negative or non-finite.
    #[error("marker {id}: invalid radius {radius_km} km")]
    InvalidRadius {
        /// Marker identifier.
        id: String,
        /// Supplied radius in kilometers.
        radius_km: f64,
    },

    /// The identifier is empty.
    #[error("marker identifier must not be empty")]
    EmptyId,
}

/// What a marker represents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerCategory {
    /// A city or town used as a geographic reference.
    City,
    /// A registered tourist's last known position.
    Tourist,
    /// A reported incident.
    Incident,
    /// An area with elevated risk (flood plain, restricted border, ...).
    RiskZone,
}

impl MarkerCategory {
    /// Whether markers of this category may carry a [`MarkerStatus`].
    #[must_use]
    pub const fn allows_status(self) -> bool {
        matches!(self, Self::Tourist | Self::RiskZone)
    }

    /// The layer that controls visibility of this category.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::City | Self::Tourist => Layer::Tourists,
            Self::Incident => Layer::Heatmap,
            Self::RiskZone => Layer::RiskZones,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::City, Self::Tourist, Self::Incident, Self::RiskZone]
    }
}

/// Safety status of a tourist or risk zone.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerStatus {
    /// No concern.
    Safe,
    /// Needs attention (missed check-in, flood warning).
    Warning,
    /// Active emergency (panic button pressed).
    Emergency,
    /// Entry restricted.
    Restricted,
}

impl MarkerStatus {
    /// Capitalized label shown in popups.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Warning => "Warning",
            Self::Emergency => "Emergency",
            Self::Restricted => "Restricted",
        }
    }

    /// The status chip variant used to display this status.
    #[must_use]
    pub const fn chip_variant(self) -> StatusChipVariant {
        match self {
            Self::Safe => StatusChipVariant::Ok,
            Self::Warning => StatusChipVariant::Urgent,
            Self::Emergency | Self::Restricted => StatusChipVariant::Critical,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Safe, Self::Warning, Self::Emergency, Self::Restricted]
    }
}

/// Toggleable map layers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Layer {
    /// Tourist positions and city references.
    Tourists,
    /// Incident heatmap.
    Heatmap,
    /// Risk zone outlines and coverage circles.
    RiskZones,
    /// Weather overlay.
    Weather,
    /// Terrain overlay.
    Terrain,
}

impl Layer {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Tourists,
            Self::Heatmap,
            Self::RiskZones,
            Self::Weather,
            Self::Terrain,
        ]
    }

    /// Human-readable name shown in the layer control.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Tourists => "Tourist Locations",
            Self::Heatmap => "Risk Heatmap",
            Self::RiskZones => "Risk Zones",
            Self::Weather => "Weather Layer",
            Self::Terrain => "Terrain Layer",
        }
    }
}

/// Status chip variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusChipVariant {
    /// Red chip.
    Critical,
    /// Amber chip.
    Urgent,
    /// Green chip.
    Ok,
}

/// Marker fill colors (theme tokens).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerColor {
    /// Emergency red.
    Danger,
    /// Amber.
    Warning,
    /// Green.
    Success,
    /// Brand blue.
    Primary,
    /// Destructive red used for restricted areas.
    Destructive,
    /// Neutral gray.
    Muted,
    /// Accent teal used for cities.
    Accent,
}

impl MarkerColor {
    /// Hex RGB value for renderers that do not resolve theme tokens.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Danger | Self::Destructive => "#e53935",
            Self::Warning => "#ffb74d",
            Self::Success => "#2e7d32",
            Self::Primary => "#1e88e5",
            Self::Muted => "#9e9e9e",
            Self::Accent => "#00897b",
        }
    }
}

/// Marker glyphs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerIcon {
    /// Map pin.
    MapPin,
    /// Warning triangle.
    AlertTriangle,
    /// Shield.
    Shield,
}

/// The complete visual encoding of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Fill color.
    pub color: MarkerColor,
    /// Glyph drawn inside the marker.
    pub icon: MarkerIcon,
    /// Whether the marker pulses to draw attention.
    pub pulses: bool,
}

impl MarkerStyle {
    /// Looks up the style for a `(category, status)` pair.
    ///
    /// Every pair maps to exactly one style. Statuses on categories that
    /// never carry one are ignored.
    #[must_use]
    pub const fn for_parts(category: MarkerCategory, status: Option<MarkerStatus>) -> Self {
        let (color, icon) = match (category, status) {
            (MarkerCategory::Tourist, Some(MarkerStatus::Emergency)) => {
                (MarkerColor::Danger, MarkerIcon::MapPin)
            }
            (MarkerCategory::Tourist, Some(MarkerStatus::Warning)) => {
                (MarkerColor::Warning, MarkerIcon::MapPin)
            }
            (MarkerCategory::Tourist, Some(MarkerStatus::Safe)) => {
                (MarkerColor::Success, MarkerIcon::MapPin)
            }
            (MarkerCategory::Tourist, Some(MarkerStatus::Restricted) | None) => {
                (MarkerColor::Primary, MarkerIcon::MapPin)
            }
            (MarkerCategory::RiskZone, Some(MarkerStatus::Restricted)) => {
                (MarkerColor::Destructive, MarkerIcon::AlertTriangle)
            }
            (MarkerCategory::RiskZone, Some(MarkerStatus::Warning)) => {
                (MarkerColor::Warning, MarkerIcon::AlertTriangle)
            }
            (
                MarkerCategory::RiskZone,
                Some(MarkerStatus::Safe | MarkerStatus::Emergency) | None,
            ) => (MarkerColor::Muted, MarkerIcon::AlertTriangle),
            (MarkerCategory::City, _) => (MarkerColor::Accent, MarkerIcon::Shield),
            (MarkerCategory::Incident, _) => (MarkerColor::Muted, MarkerIcon::MapPin),
        };

        let pulses = matches!(
            (category, status),
            (MarkerCategory::Tourist, Some(MarkerStatus::Emergency))
        );

        Self {
            color,
            icon,
            pulses,
        }
    }
}

/// A point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Marker {
    /// Unique identifier within a catalogue.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Latitude in degrees (WGS84).
    pub lat: f64,
    /// Longitude in degrees (WGS84).
    pub lng: f64,
    /// What the marker represents.
    pub category: MarkerCategory,
    /// Safety status. Only tourists and risk zones carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MarkerStatus>,
    /// Free-text detail shown in the popup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Coverage radius in kilometers (risk zones only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
}

impl Marker {
    /// Creates a marker without status, details or radius.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] if the id is empty or the position is
    /// invalid.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        lat: f64,
        lng: f64,
        category: MarkerCategory,
    ) -> Result<Self, MarkerError> {
        let marker = Self {
            id: id.into(),
            label: label.into(),
            lat,
            lng,
            category,
            status: None,
            details: None,
            radius_km: None,
        };
        marker.validate()?;
        Ok(marker)
    }

    /// Sets the status.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::StatusNotAllowed`] for categories that never
    /// carry a status.
    pub fn with_status(mut self, status: MarkerStatus) -> Result<Self, MarkerError> {
        self.status = Some(status);
        self.validate()?;
        Ok(self)
    }

    /// Sets the popup details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the coverage radius.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::InvalidRadius`] for negative or non-finite
    /// values.
    pub fn with_radius_km(mut self, radius_km: f64) -> Result<Self, MarkerError> {
        self.radius_km = Some(radius_km);
        self.validate()?;
        Ok(self)
    }

    /// Checks the field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a [`MarkerError`].
    pub fn validate(&self) -> Result<(), MarkerError> {
        if self.id.is_empty() {
            return Err(MarkerError::EmptyId);
        }

        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if !lat_ok || !lng_ok {
            return Err(MarkerError::InvalidPosition {
                id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            });
        }

        if let Some(status) = self.status {
            if !self.category.allows_status() {
                return Err(MarkerError::StatusNotAllowed {
                    id: self.id.clone(),
                    category: self.category,
                    status,
                });
            }
        }

        if let Some(radius_km) = self.radius_km {
            if !radius_km.is_finite() || radius_km < 0.0 {
                return Err(MarkerError::InvalidRadius {
                    id: self.id.clone(),
                    radius_km,
                });
            }
        }

        Ok(())
    }

    /// The visual encoding for this marker.
    #[must_use]
    pub const fn style(&self) -> MarkerStyle {
        MarkerStyle::for_parts(self.category, self.status)
    }

    /// The layer controlling this marker's visibility.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.category.layer()
    }

    /// Coverage radius, only for risk zones that declare one.
    #[must_use]
    pub fn coverage_radius_km(&self) -> Option<f64> {
        match self.category {
            MarkerCategory::RiskZone => self.radius_km.filter(|r| *r > 0.0),
            MarkerCategory::City | MarkerCategory::Tourist | MarkerCategory::Incident => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    fn all_status_options() -> Vec<Option<MarkerStatus>> {
        std::iter::once(None)
            .chain(MarkerStatus::all().iter().copied().map(Some))
            .collect()
    }

    #[test]
    fn style_lookup_is_total() {
        for category in MarkerCategory::all() {
            for status in all_status_options() {
                let style = MarkerStyle::for_parts(*category, status);
                assert!(
                    !style.color.as_ref().is_empty(),
                    "{category:?}/{status:?} has an empty color"
                );
                assert!(
                    !style.icon.as_ref().is_empty(),
                    "{category:?}/{status:?} has an empty icon"
                );
                assert!(style.color.hex().starts_with('#'));
            }
        }
    }

    #[test]
    fn tourist_styles_follow_status() {
        let style = |s| MarkerStyle::for_parts(MarkerCategory::Tourist, s);
        assert_eq!(style(Some(MarkerStatus::Emergency)).color, MarkerColor::Danger);
        assert!(style(Some(MarkerStatus::Emergency)).pulses);
        assert_eq!(style(Some(MarkerStatus::Warning)).color, MarkerColor::Warning);
        assert_eq!(style(Some(MarkerStatus::Safe)).color, MarkerColor::Success);
        assert_eq!(style(None).color, MarkerColor::Primary);
        assert!(!style(None).pulses);
    }

    #[test]
    fn risk_zone_and_city_styles() {
        let zone = MarkerStyle::for_parts(MarkerCategory::RiskZone, Some(MarkerStatus::Restricted));
        assert_eq!(zone.color, MarkerColor::Destructive);
        assert_eq!(zone.icon, MarkerIcon::AlertTriangle);

        let zone = MarkerStyle::for_parts(MarkerCategory::RiskZone, None);
        assert_eq!(zone.color, MarkerColor::Muted);

        let city = MarkerStyle::for_parts(MarkerCategory::City, None);
        assert_eq!(city.color, MarkerColor::Accent);
        assert_eq!(city.icon, MarkerIcon::Shield);
    }

    #[test]
    fn city_rejects_status() {
        let err = Marker::new("c1", "Guwahati", 26.1445, 91.7362, MarkerCategory::City)
            .unwrap()
            .with_status(MarkerStatus::Safe)
            .unwrap_err();
        assert!(matches!(err, MarkerError::StatusNotAllowed { .. }));
    }

    #[test]
    fn only_tourists_and_risk_zones_allow_status() {
        let allowed: Vec<_> = MarkerCategory::all()
            .iter()
            .copied()
            .filter(|c| c.allows_status())
            .collect();
        assert_eq!(allowed, vec![MarkerCategory::Tourist, MarkerCategory::RiskZone]);
    }

    #[test]
    fn rejects_invalid_positions() {
        assert!(Marker::new("x", "X", 91.0, 0.0, MarkerCategory::City).is_err());
        assert!(Marker::new("x", "X", 0.0, f64::NAN, MarkerCategory::City).is_err());
        assert!(Marker::new("", "X", 0.0, 0.0, MarkerCategory::City).is_err());
    }

    #[test]
    fn coverage_radius_only_for_risk_zones() {
        let zone = Marker::new("rz1", "Flood", 25.2787, 91.7110, MarkerCategory::RiskZone)
            .unwrap()
            .with_radius_km(10.0)
            .unwrap();
        assert_eq!(zone.coverage_radius_km(), Some(10.0));

        let city = Marker::new("c1", "Guwahati", 26.1445, 91.7362, MarkerCategory::City)
            .unwrap()
            .with_radius_km(10.0)
            .unwrap();
        assert_eq!(city.coverage_radius_km(), None);

        assert!(zone.with_radius_km(-1.0).is_err());
    }

    #[test]
    fn chip_variants() {
        assert_eq!(MarkerStatus::Safe.chip_variant(), StatusChipVariant::Ok);
        assert_eq!(MarkerStatus::Warning.chip_variant(), StatusChipVariant::Urgent);
        assert_eq!(MarkerStatus::Emergency.chip_variant(), StatusChipVariant::Critical);
        assert_eq!(MarkerStatus::Restricted.chip_variant(), StatusChipVariant::Critical);
    }

    #[test]
    fn layer_names_parse() {
        for layer in Layer::all() {
            assert_eq!(Layer::from_str(layer.as_ref()).unwrap(), *layer);
        }
        assert_eq!(Layer::from_str("risk_zones").unwrap(), Layer::RiskZones);
    }
}
