//! `--config` file handling.
//!
//! ```toml
//! catalogue = "catalogues/shillong.toml"
//! auto_record = true
//!
//! [layers]
//! weather = true
//!
//! [bounds]
//! west = 90.0
//! south = 23.0
//! east = 95.0
//! north = 28.0
//! offset_pct = 20.0
//!
//! [emergency]
//! hold_duration_ms = 2000
//! countdown_secs = 5
//!
//! [recorder]
//! max_duration_secs = 30
//! ```
//!
//! Every section is optional; missing values take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tourist_safety_emergency::models::EmergencyConfig;
use tourist_safety_flow::FlowConfig;
use tourist_safety_map::{Catalogue, CatalogueError, LayerVisibility, MarkerModel, ViewBounds};
use tourist_safety_voice::models::RecorderConfig;

/// Errors raised while loading an [`AppConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Panic-button timing is invalid.
    #[error("invalid [emergency] section: {0}")]
    Emergency(#[from] tourist_safety_emergency::models::ConfigError),
    /// Recorder settings are invalid.
    #[error("invalid [recorder] section: {0}")]
    Recorder(#[from] tourist_safety_voice::models::ConfigError),
}

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Marker catalogue file. The embedded Northeast India catalogue is used
    /// when unset.
    pub catalogue: Option<PathBuf>,
    /// Initial layer visibility.
    pub layers: LayerVisibility,
    /// Map view window.
    pub bounds: ViewBounds,
    /// Record voice while the panic button is confirming.
    pub auto_record: bool,
    /// Panic-button timing.
    pub emergency: EmergencyConfig,
    /// Voice recorder settings.
    pub recorder: RecorderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalogue: None,
            layers: LayerVisibility::default(),
            bounds: ViewBounds::default(),
            auto_record: true,
            emergency: EmergencyConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a config document. Relative catalogue paths
    /// are kept as written.
    ///
    /// # Errors
    ///
    /// * [`ConfigLoadError::Parse`] if the document is malformed
    /// * [`ConfigLoadError::Emergency`] or [`ConfigLoadError::Recorder`] if a
    ///   section fails validation
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(toml_str)?;
        config.emergency.validate()?;
        config.recorder.validate()?;
        Ok(config)
    }

    /// Loads a config file. A relative catalogue path is resolved against
    /// the config file's directory.
    ///
    /// # Errors
    ///
    /// * [`ConfigLoadError::Io`] if the file cannot be read
    /// * See [`Self::from_toml_str`]
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&contents)?;
        if let Some(catalogue) = config.catalogue.as_mut() {
            if catalogue.is_relative() {
                if let Some(dir) = path.parent() {
                    *catalogue = dir.join(&*catalogue);
                }
            }
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads the configured catalogue, or the embedded one.
    ///
    /// # Errors
    ///
    /// * If the catalogue file cannot be read or is invalid
    pub fn catalogue(&self) -> Result<Catalogue, CatalogueError> {
        self.catalogue
            .as_deref()
            .map_or_else(|| Ok(Catalogue::northeast_india()), Catalogue::load)
    }

    /// A marker model over the configured catalogue, layers and bounds.
    ///
    /// # Errors
    ///
    /// * See [`Self::catalogue`]
    pub fn marker_model(&self) -> Result<MarkerModel, CatalogueError> {
        Ok(MarkerModel::new(self.catalogue()?, self.layers).with_bounds(self.bounds))
    }

    /// Panic-button and recorder settings.
    #[must_use]
    pub const fn flow(&self) -> FlowConfig {
        FlowConfig {
            auto_record: self.auto_record,
            emergency: self.emergency,
            recorder: self.recorder,
        }
    }
}
