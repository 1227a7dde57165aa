//! Engine configuration.

use std::path::{Path, PathBuf};

use meshmerizer_decode::DEFAULT_MAX_DECOMPRESSED_BYTES;
use serde::Deserialize;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for [`crate::Meshmerizer`]. Missing keys take their defaults.
///
/// ```toml
/// min_size_for_complex_mesh = 0.1
/// cache_sculpt_maps = false
/// mesh_cache_capacity = 4096
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshmerizerConfig {
    /// Smallest scale any axis is clamped to.
    pub min_scale: f32,
    /// Non-physical shapes smaller than this on every axis become boxes.
    pub min_size_for_complex_mesh: f32,
    /// Build uploaded meshes; when off they are rejected.
    pub use_mesh_physics: bool,
    /// Keep decoded sculpt textures on disk.
    pub cache_sculpt_maps: bool,
    pub sculpt_map_cache_dir: PathBuf,
    /// Compute normals and UVs for sculpted meshes.
    pub sculpt_normals_and_uvs: bool,
    /// Merge duplicate vertices of meshes without normals or UVs.
    pub weld_vertices: bool,
    /// Bound on cached meshes; unbounded when unset.
    pub mesh_cache_capacity: Option<usize>,
    /// Cap on the inflated size of one asset block.
    pub max_decompressed_bytes: usize,
}

impl Default for MeshmerizerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.01,
            min_size_for_complex_mesh: 0.2,
            use_mesh_physics: true,
            cache_sculpt_maps: true,
            sculpt_map_cache_dir: PathBuf::from("j2kDecodeCache"),
            sculpt_normals_and_uvs: false,
            weld_vertices: true,
            mesh_cache_capacity: None,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}

impl MeshmerizerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
