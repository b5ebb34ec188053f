//! Marker catalogues.
//!
//! A catalogue is the fixed set of markers a map session works with. It is
//! loaded once (from an embedded TOML document or a file on disk), validated,
//! and never mutated afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tourist_safety_map_models::{Marker, MarkerError};

/// Embedded demo catalogue.
const NORTHEAST_INDIA_TOML: &str = include_str!("../catalogues/northeast_india.toml");

/// Errors that can occur while loading a catalogue.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// The TOML document could not be parsed.
    #[error("catalogue parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The catalogue file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A marker violates its field constraints.
    #[error(transparent)]
    Marker(#[from] MarkerError),

    /// Two markers share an identifier.
    #[error("duplicate marker id: {id}")]
    DuplicateId {
        /// The repeated identifier.
        id: String,
    },
}

/// A validated, immutable set of markers.
///
/// Deserializing a catalogue validates it like [`Catalogue::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalogue", into = "RawCatalogue")]
pub struct Catalogue {
    /// Human-readable catalogue name (e.g. "Northeast India").
    pub name: String,
    markers: Vec<Marker>,
}

/// Catalogue document as written, before validation.
#[derive(Serialize, Deserialize)]
struct RawCatalogue {
    name: String,
    #[serde(default)]
    markers: Vec<Marker>,
}

impl TryFrom<RawCatalogue> for Catalogue {
    type Error = CatalogueError;

    fn try_from(raw: RawCatalogue) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.markers)
    }
}

impl From<Catalogue> for RawCatalogue {
    fn from(catalogue: Catalogue) -> Self {
        Self {
            name: catalogue.name,
            markers: catalogue.markers,
        }
    }
}

impl Catalogue {
    /// Builds a catalogue from markers.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] if a marker is invalid or an id repeats.
    pub fn new(name: impl Into<String>, markers: Vec<Marker>) -> Result<Self, CatalogueError> {
        let catalogue = Self {
            name: name.into(),
            markers,
        };
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Parses and validates a TOML catalogue document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] if parsing or validation fails.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CatalogueError> {
        let raw: RawCatalogue = toml::de::from_str(toml_str)?;
        let catalogue = Self::try_from(raw)?;
        log::debug!(
            "Loaded catalogue '{}' with {} markers",
            catalogue.name,
            catalogue.markers.len()
        );
        Ok(catalogue)
    }

    /// Reads a TOML catalogue from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// The embedded Northeast India demo catalogue.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. Since it is a
    /// compile-time constant, a failure indicates a development error and is
    /// caught by the tests below.
    #[must_use]
    pub fn northeast_india() -> Self {
        Self::from_toml_str(NORTHEAST_INDIA_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded catalogue 'northeast_india': {e}"))
    }

    /// All markers in catalogue order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Looks up a marker by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the catalogue has no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn validate(&self) -> Result<(), CatalogueError> {
        let mut seen = BTreeSet::new();
        for marker in &self.markers {
            marker.validate()?;
            if !seen.insert(marker.id.as_str()) {
                return Err(CatalogueError::DuplicateId {
                    id: marker.id.clone(),
                });
            }
        }
        Ok(())
    }
}
