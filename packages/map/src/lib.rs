#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive map model for the monitoring dashboard.
//!
//! [`MarkerModel`] owns a validated [`Catalogue`], the current
//! [`LayerVisibility`] flags and the active marker selection. Everything a
//! renderer needs (the filtered render list, counts, the popup for the
//! active marker, a `GeoJSON` export) is derived on demand from those three
//! pieces of state.

pub mod catalogue;
pub mod layers;
pub mod projection;
pub mod render;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use tourist_safety_map_models::{Layer, Marker};

pub use catalogue::{Catalogue, CatalogueError};
pub use layers::LayerVisibility;
pub use projection::{ScreenOffset, ViewBounds, project_to_screen};
pub use render::{CoverageCircle, MarkerCounts, MarkerPopup, RenderedMarker, StatusChip};
pub use tourist_safety_map_models as models;

/// Errors surfaced by map queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// The active selection names a marker that is not in the catalogue.
    #[error("no marker matches '{id}'")]
    InvalidSelection {
        /// The selected identifier.
        id: String,
    },

    /// A view window has zero/negative extent or non-finite edges.
    #[error("invalid view bounds (west={west}, south={south}, east={east}, north={north})")]
    InvalidBounds {
        /// Western edge (degrees longitude).
        west: f64,
        /// Southern edge (degrees latitude).
        south: f64,
        /// Eastern edge (degrees longitude).
        east: f64,
        /// Northern edge (degrees latitude).
        north: f64,
    },
}

/// Session-local map state: catalogue, layer flags and active selection.
#[derive(Debug, Clone)]
pub struct MarkerModel {
    catalogue: Catalogue,
    layers: LayerVisibility,
    bounds: ViewBounds,
    active: Option<String>,
}

impl MarkerModel {
    /// Creates a model with the given initial layer flags and no selection.
    #[must_use]
    pub fn new(catalogue: Catalogue, layers: LayerVisibility) -> Self {
        Self {
            catalogue,
            layers,
            bounds: ViewBounds::default(),
            active: None,
        }
    }

    /// Replaces the view window used for projection.
    #[must_use]
    pub fn with_bounds(mut self, bounds: ViewBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// The underlying catalogue.
    #[must_use]
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Current layer flags.
    #[must_use]
    pub const fn layers(&self) -> &LayerVisibility {
        &self.layers
    }

    /// Current view window.
    #[must_use]
    pub const fn bounds(&self) -> &ViewBounds {
        &self.bounds
    }

    /// Shows or hides a layer.
    pub fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        log::debug!("Layer {layer} -> {visible}");
        self.layers.set(layer, visible);
    }

    /// Flips a layer and returns its new visibility.
    pub fn toggle_layer(&mut self, layer: Layer) -> bool {
        let visible = self.layers.toggle(layer);
        log::debug!("Layer {layer} toggled -> {visible}");
        visible
    }

    /// Whether `marker` belongs to a visible layer.
    #[must_use]
    pub const fn is_visible(&self, marker: &Marker) -> bool {
        self.layers.is_visible(marker.layer())
    }

    /// Visible markers in catalogue order.
    pub fn visible_markers(&self) -> impl Iterator<Item = &Marker> {
        self.catalogue
            .markers()
            .iter()
            .filter(|m| self.is_visible(m))
    }

    /// Selects `id`, or clears the selection if `id` is already active.
    ///
    /// Unknown ids are accepted; they surface as
    /// [`MapError::InvalidSelection`] when the popup is requested.
    pub fn select_marker(&mut self, id: &str) -> Option<&str> {
        if self.active.as_deref() == Some(id) {
            log::debug!("Deselected marker {id}");
            self.active = None;
        } else {
            if self.catalogue.get(id).is_none() {
                log::debug!("Selected unknown marker {id}");
            } else {
                log::debug!("Selected marker {id}");
            }
            self.active = Some(id.to_string());
        }
        self.active.as_deref()
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// The active marker id, if any.
    #[must_use]
    pub fn active_marker_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Resolves the active selection against the catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidSelection`] if the selected id is not in
    /// the catalogue.
    pub fn active_marker(&self) -> Result<Option<&Marker>, MapError> {
        let Some(id) = self.active.as_deref() else {
            return Ok(None);
        };
        self.catalogue
            .get(id)
            .map(Some)
            .ok_or_else(|| MapError::InvalidSelection { id: id.to_string() })
    }

    /// Popup content for the active marker.
    ///
    /// Returns `Ok(None)` when nothing is selected or the selected marker's
    /// layer is hidden.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidSelection`] if the selected id is not in
    /// the catalogue.
    pub fn popup(&self) -> Result<Option<MarkerPopup>, MapError> {
        Ok(self
            .active_marker()?
            .filter(|m| self.is_visible(m))
            .map(MarkerPopup::for_marker))
    }

    /// Visible markers, projected and styled.
    #[must_use]
    pub fn render_list(&self) -> Vec<RenderedMarker> {
        self.visible_markers()
            .map(|marker| RenderedMarker {
                id: marker.id.clone(),
                label: marker.label.clone(),
                category: marker.category,
                status: marker.status,
                offset: project_to_screen(marker, &self.bounds),
                in_view: self.bounds.contains(marker.lat, marker.lng),
                style: marker.style(),
                active: self.active.as_deref() == Some(marker.id.as_str()),
                coverage: CoverageCircle::for_marker(marker),
            })
            .collect()
    }

    /// Counts over visible markers.
    #[must_use]
    pub fn counts(&self) -> MarkerCounts {
        MarkerCounts::tally(self.visible_markers())
    }

    /// Counts over the whole catalogue, ignoring layer visibility.
    #[must_use]
    pub fn catalogue_counts(&self) -> MarkerCounts {
        MarkerCounts::tally(self.catalogue.markers())
    }

    /// Visible markers as a `GeoJSON` point collection.
    #[must_use]
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self.visible_markers().map(marker_feature).collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn marker_feature(marker: &Marker) -> Feature {
    let point = geo::Point::new(marker.lng, marker.lat);

    let mut properties = JsonObject::new();
    properties.insert("label".to_string(), marker.label.clone().into());
    properties.insert("category".to_string(), marker.category.as_ref().into());
    if let Some(status) = marker.status {
        properties.insert("status".to_string(), status.as_ref().into());
    }
    if let Some(details) = &marker.details {
        properties.insert("details".to_string(), details.clone().into());
    }
    if let Some(radius_km) = marker.coverage_radius_km() {
        properties.insert("radiusKm".to_string(), radius_km.into());
    }
    properties.insert("color".to_string(), marker.style().color.hex().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&point))),
        id: Some(Id::String(marker.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use tourist_safety_map_models::{MarkerCategory, MarkerStatus};

    use super::*;

    fn demo_model() -> MarkerModel {
        MarkerModel::new(Catalogue::northeast_india(), LayerVisibility::default())
    }

    #[test]
    fn selecting_twice_clears() {
        let mut model = demo_model();
        assert_eq!(model.select_marker("t1"), Some("t1"));
        assert_eq!(model.select_marker("t1"), None);
        assert_eq!(model.active_marker_id(), None);
    }

    #[test]
    fn selecting_other_replaces() {
        let mut model = demo_model();
        model.select_marker("t1");
        assert_eq!(model.select_marker("rz1"), Some("rz1"));
        assert_eq!(model.active_marker_id(), Some("rz1"));
    }

    #[test]
    fn unknown_selection_surfaces_on_popup() {
        let mut model = demo_model();
        model.select_marker("nope");
        assert_eq!(
            model.popup(),
            Err(MapError::InvalidSelection {
                id: "nope".to_string()
            })
        );
        assert!(model.render_list().iter().all(|m| !m.active));
    }

    #[test]
    fn popup_hidden_with_layer() {
        let mut model = demo_model();
        model.select_marker("t3");
        let popup = model.popup().unwrap().unwrap();
        assert_eq!(popup.label, "Tourist C");
        assert_eq!(popup.details.as_deref(), Some("Panic button activated"));
        assert!(popup.shows_updated_at);

        model.set_layer_visible(Layer::Tourists, false);
        assert_eq!(model.popup(), Ok(None));
    }

    #[test]
    fn single_emergency_tourist_follows_layer() {
        let marker = Marker::new("t", "Tourist", 26.0, 92.0, MarkerCategory::Tourist)
            .unwrap()
            .with_status(MarkerStatus::Emergency)
            .unwrap();
        let catalogue = Catalogue::new("one", vec![marker]).unwrap();
        let mut model = MarkerModel::new(catalogue, LayerVisibility::default());

        let rendered = model.render_list();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].id, "t");
        assert!(rendered[0].style.pulses);

        model.set_layer_visible(Layer::Tourists, false);
        assert!(model.render_list().is_empty());
        assert_eq!(model.counts().tourists(), 0);
    }

    #[test]
    fn hidden_layers_excluded_from_counts() {
        let mut model = demo_model();
        let all = model.counts();
        assert_eq!(all.tourists(), 4);
        assert_eq!(all.emergencies(), 1);
        assert_eq!(all.warnings(), 1);
        assert_eq!(all.category(MarkerCategory::RiskZone), 2);

        model.set_layer_visible(Layer::RiskZones, false);
        let counts = model.counts();
        assert_eq!(counts.category(MarkerCategory::RiskZone), 0);
        assert_eq!(counts.tourists(), 4);
        assert_eq!(model.catalogue_counts().category(MarkerCategory::RiskZone), 2);
    }

    #[test]
    fn render_list_marks_active_and_coverage() {
        let mut model = demo_model();
        model.select_marker("rz2");
        let rendered = model.render_list();
        assert_eq!(rendered.len(), 10);

        let active: Vec<_> = rendered.iter().filter(|m| m.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "rz2");
        assert_eq!(active[0].coverage.map(|c| c.radius_km), Some(15.0));

        let city = rendered.iter().find(|m| m.id == "c1").unwrap();
        assert!(city.coverage.is_none());
        assert!(city.in_view);
    }

    #[test]
    fn incidents_follow_heatmap_layer() {
        let incident =
            Marker::new("i1", "Theft", 26.0, 92.0, MarkerCategory::Incident).unwrap();
        let catalogue = Catalogue::new("incidents", vec![incident]).unwrap();
        let mut model = MarkerModel::new(catalogue, LayerVisibility::default());
        assert_eq!(model.render_list().len(), 1);

        assert!(!model.toggle_layer(Layer::Heatmap));
        assert!(model.render_list().is_empty());

        model.set_layer_visible(Layer::Tourists, false);
        assert!(model.toggle_layer(Layer::Heatmap));
        assert_eq!(model.render_list().len(), 1);
    }

    #[test]
    fn geojson_export_respects_layers() {
        let mut model = demo_model();
        model.set_layer_visible(Layer::Tourists, false);
        let collection = model.to_geojson();
        assert_eq!(collection.features.len(), 2);

        let json = serde_json::to_value(&collection).unwrap();
        let first = &json["features"][0];
        assert_eq!(first["id"], "rz1");
        assert_eq!(first["properties"]["category"], "risk_zone");
        assert_eq!(first["properties"]["radiusKm"], 10.0);
        assert_eq!(first["geometry"]["coordinates"][0], 91.7110);
    }
}
