//! Geographic → screen projection.
//!
//! The dashboard map is a fixed geographic window. Markers are placed by
//! linear interpolation of their coordinates across the window, expressed as
//! percentage offsets from the top-left corner so the renderer can position
//! them without knowing the viewport size.

use geo::{Intersects, Point, Rect, coord};
use serde::{Deserialize, Serialize};
use tourist_safety_map_models::Marker;

use crate::MapError;

/// Percentage offsets from the top-left corner of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenOffset {
    /// Horizontal offset; grows eastward.
    pub left_pct: f64,
    /// Vertical offset; grows southward (north is up).
    pub top_pct: f64,
}

/// Raw, unvalidated bounds as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct RawBounds {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    #[serde(default)]
    offset_pct: f64,
}

/// The geographic window shown by the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct ViewBounds {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    offset_pct: f64,
}

impl TryFrom<RawBounds> for ViewBounds {
    type Error = MapError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Self::new(raw.west, raw.south, raw.east, raw.north, raw.offset_pct)
    }
}

impl From<ViewBounds> for RawBounds {
    fn from(bounds: ViewBounds) -> Self {
        Self {
            west: bounds.west,
            south: bounds.south,
            east: bounds.east,
            north: bounds.north,
            offset_pct: bounds.offset_pct,
        }
    }
}

impl Default for ViewBounds {
    fn default() -> Self {
        Self::NORTHEAST_INDIA
    }
}

impl ViewBounds {
    /// Creates a view window. `offset_pct` is added to both screen axes.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidBounds`] if any value is non-finite or the
    /// window has zero or negative width or height.
    pub fn new(
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        offset_pct: f64,
    ) -> Result<Self, MapError> {
        let finite = [west, south, east, north, offset_pct]
            .iter()
            .all(|v| v.is_finite());

        if !finite || east <= west || north <= south {
            return Err(MapError::InvalidBounds {
                west,
                south,
                east,
                north,
            });
        }

        Ok(Self {
            west,
            south,
            east,
            north,
            offset_pct,
        })
    }

    /// The 5°×5° window over Northeast India used by the monitoring
    /// dashboard, with a 20% offset on both axes.
    pub const NORTHEAST_INDIA: Self = Self {
        west: 90.0,
        south: 23.0,
        east: 95.0,
        north: 28.0,
        offset_pct: 20.0,
    };

    /// The window as a `geo` rectangle (x = longitude, y = latitude).
    #[must_use]
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    /// Whether a coordinate falls inside the window (edges included).
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        Point::new(lng, lat).intersects(&self.rect())
    }

    /// Projects a coordinate into percentage offsets.
    #[must_use]
    pub fn project(&self, lat: f64, lng: f64) -> ScreenOffset {
        let left_pct = (lng - self.west) / (self.east - self.west) * 100.0 + self.offset_pct;
        let top_pct = (self.north - lat) / (self.north - self.south) * 100.0 + self.offset_pct;
        ScreenOffset { left_pct, top_pct }
    }
}

/// Projects a marker into the view window. Independent of the marker's
/// category.
#[must_use]
pub fn project_to_screen(marker: &Marker, bounds: &ViewBounds) -> ScreenOffset {
    bounds.project(marker.lat, marker.lng)
}

#[cfg(test)]
mod tests {
    use tourist_safety_map_models::MarkerCategory;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn matches_dashboard_formula() {
        let bounds = ViewBounds::NORTHEAST_INDIA;
        let offset = bounds.project(26.1445, 91.7362);
        assert!(approx(offset.left_pct, (91.7362 - 90.0) / 5.0 * 100.0 + 20.0));
        assert!(approx(offset.top_pct, (28.0 - 26.1445) / 5.0 * 100.0 + 20.0));
    }

    #[test]
    fn longitude_is_monotonic_left_to_right() {
        let bounds = ViewBounds::NORTHEAST_INDIA;
        let mut previous = f64::NEG_INFINITY;
        for step in 0..50 {
            let lng = 89.0 + f64::from(step) * 0.15;
            let offset = bounds.project(26.0, lng);
            assert!(offset.left_pct > previous);
            previous = offset.left_pct;
        }
    }

    #[test]
    fn latitude_is_monotonic_north_up() {
        let bounds = ViewBounds::NORTHEAST_INDIA;
        let mut previous = f64::INFINITY;
        for step in 0..50 {
            let lat = 22.0 + f64::from(step) * 0.15;
            let offset = bounds.project(lat, 92.0);
            assert!(offset.top_pct < previous);
            previous = offset.top_pct;
        }
    }

    #[test]
    fn projection_ignores_category() {
        let bounds = ViewBounds::NORTHEAST_INDIA;
        let offsets: Vec<_> = MarkerCategory::all()
            .iter()
            .map(|category| {
                let marker = Marker::new("m", "M", 25.5, 92.5, *category).unwrap();
                project_to_screen(&marker, &bounds)
            })
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn rejects_degenerate_windows() {
        assert!(ViewBounds::new(90.0, 23.0, 90.0, 28.0, 0.0).is_err());
        assert!(ViewBounds::new(90.0, 28.0, 95.0, 23.0, 0.0).is_err());
        assert!(ViewBounds::new(f64::NAN, 23.0, 95.0, 28.0, 0.0).is_err());
    }

    #[test]
    fn contains_includes_edges() {
        let bounds = ViewBounds::NORTHEAST_INDIA;
        assert!(bounds.contains(28.0, 90.0));
        assert!(bounds.contains(25.0, 92.0));
        assert!(!bounds.contains(30.0, 92.0));
    }

    #[test]
    fn deserialization_validates() {
        let ok: ViewBounds =
            toml::from_str("west = 0.0\nsouth = 0.0\neast = 10.0\nnorth = 10.0").unwrap();
        assert!(approx(ok.project(5.0, 5.0).left_pct, 50.0));

        let bad: Result<ViewBounds, _> =
            toml::from_str("west = 10.0\nsouth = 0.0\neast = 0.0\nnorth = 10.0");
        assert!(bad.is_err());
    }
}
