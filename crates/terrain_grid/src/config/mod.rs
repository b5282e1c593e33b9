//! Configuration system
//!
//! Grid construction parameters and the design-constant caps used by the
//! grid queries. Any [`Config`] can be loaded from or saved to TOML or RON.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Most triangle indices staged into one cell while building a grid
pub const DEFAULT_CELL_CANDIDATE_LIMIT: usize = 1024;

/// Most triangles emitted by a single `create_triangles` call
pub const DEFAULT_CREATE_TRIANGLES_LIMIT: usize = 128;

/// Merged cell count above which a range query pre-sizes its result
pub const DEFAULT_MERGE_HINT_THRESHOLD: usize = 50;

/// # Grid Configuration
///
/// Cell counts for a [`GridDivider`](crate::spatial::GridDivider) plus the caps
/// that bound per-cell and per-query work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of cells along X
    pub cells_x: usize,
    /// Number of cells along Z
    pub cells_z: usize,
    /// Cap on triangle indices stored per cell during construction
    pub cell_candidate_limit: usize,
    /// Cap on triangles emitted by one `create_triangles` call
    pub create_triangles_limit: usize,
    /// Merged cell count above which range queries pre-size their result
    pub merge_hint_threshold: usize,
    /// Extra XZ margin added around each triangle footprint when assigning cells
    pub footprint_margin: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cells_x: 16,
            cells_z: 16,
            cell_candidate_limit: DEFAULT_CELL_CANDIDATE_LIMIT,
            create_triangles_limit: DEFAULT_CREATE_TRIANGLES_LIMIT,
            merge_hint_threshold: DEFAULT_MERGE_HINT_THRESHOLD,
            footprint_margin: 0.0,
        }
    }
}

impl GridConfig {
    /// Create a configuration with the given cell counts and default caps
    pub fn new(cells_x: usize, cells_z: usize) -> Self {
        Self {
            cells_x,
            cells_z,
            ..Default::default()
        }
    }

    /// Set the per-cell candidate cap
    pub fn with_cell_candidate_limit(mut self, limit: usize) -> Self {
        self.cell_candidate_limit = limit;
        self
    }

    /// Set the `create_triangles` output cap
    pub fn with_create_triangles_limit(mut self, limit: usize) -> Self {
        self.create_triangles_limit = limit;
        self
    }

    /// Set the footprint margin used during cell assignment
    pub fn with_footprint_margin(mut self, margin: f32) -> Self {
        self.footprint_margin = margin;
        self
    }
}

impl Config for GridConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_design_constants() {
        let config = GridConfig::default();
        assert_eq!(config.cell_candidate_limit, 1024);
        assert_eq!(config.create_triangles_limit, 128);
        assert_eq!(config.merge_hint_threshold, 50);
        assert_eq!(config.footprint_margin, 0.0);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("terrain_grid_cfg_{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let config = GridConfig::new(8, 4).with_cell_candidate_limit(64).with_footprint_margin(0.5);
        config.save_to_file(&path).expect("save");
        let loaded = GridConfig::load_from_file(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_document_uses_defaults() {
        let config: GridConfig = ron::from_str("(cells_x: 3, cells_z: 5)").expect("parse");
        assert_eq!(config.cells_x, 3);
        assert_eq!(config.cells_z, 5);
        assert_eq!(config.create_triangles_limit, DEFAULT_CREATE_TRIANGLES_LIMIT);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = GridConfig::default().save_to_file("grid.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
