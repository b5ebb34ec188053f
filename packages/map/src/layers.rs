//! Layer visibility flags.

use serde::{Deserialize, Serialize};
use tourist_safety_map_models::Layer;

/// Per-layer visibility.
///
/// Serializes as a `{layer: bool}` map. Layers are independent: changing one
/// never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct LayerVisibility {
    /// Tourist positions and city references.
    pub tourists: bool,
    /// Incident heatmap.
    pub heatmap: bool,
    /// Risk zones.
    pub risk_zones: bool,
    /// Weather overlay.
    pub weather: bool,
    /// Terrain overlay.
    pub terrain: bool,
}

impl Default for LayerVisibility {
    /// Dashboard defaults: tourists, heatmap and risk zones on.
    fn default() -> Self {
        Self {
            tourists: true,
            heatmap: true,
            risk_zones: true,
            weather: false,
            terrain: false,
        }
    }
}

impl LayerVisibility {
    /// All layers hidden.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            tourists: false,
            heatmap: false,
            risk_zones: false,
            weather: false,
            terrain: false,
        }
    }

    /// Whether `layer` is visible.
    #[must_use]
    pub const fn is_visible(&self, layer: Layer) -> bool {
        match layer {
            Layer::Tourists => self.tourists,
            Layer::Heatmap => self.heatmap,
            Layer::RiskZones => self.risk_zones,
            Layer::Weather => self.weather,
            Layer::Terrain => self.terrain,
        }
    }

    /// Sets `layer` to `visible`.
    pub const fn set(&mut self, layer: Layer, visible: bool) {
        let slot = match layer {
            Layer::Tourists => &mut self.tourists,
            Layer::Heatmap => &mut self.heatmap,
            Layer::RiskZones => &mut self.risk_zones,
            Layer::Weather => &mut self.weather,
            Layer::Terrain => &mut self.terrain,
        };
        *slot = visible;
    }

    /// Flips `layer` and returns its new visibility.
    pub const fn toggle(&mut self, layer: Layer) -> bool {
        let visible = !self.is_visible(layer);
        self.set(layer, visible);
        visible
    }

    /// Builder-style variant of [`Self::set`].
    #[must_use]
    pub const fn with(mut self, layer: Layer, visible: bool) -> Self {
        self.set(layer, visible);
        self
    }
}
