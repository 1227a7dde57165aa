//! Error types for the mesh engine.

use meshmerizer_decode::DecodeError;

use crate::shape::AssetId;

/// Result alias for mesh construction.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building a mesh.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The asset the shape refers to has not been supplied yet.
    #[error("asset {0} has not been loaded")]
    MissingAssetData(AssetId),

    /// Decoding the asset or sculpt map failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The sculpt texture could not be decoded into pixels.
    #[error("failed to decode texture {id}: {source}")]
    TextureDecode {
        id: AssetId,
        #[source]
        source: image::ImageError,
    },

    /// No profile mesher has been installed for primitive shapes.
    #[error("no profile mesher is available for primitive shapes")]
    ProfileMesherUnavailable,

    /// The installed profile mesher rejected the shape.
    #[error("profile mesher failed: {0}")]
    ProfileMesher(#[source] crate::profile::ProfileMesherError),

    /// Uploaded meshes are disabled by configuration.
    #[error("uploaded mesh physics is disabled")]
    MeshPhysicsDisabled,
}

impl MeshError {
    /// Whether the same request may succeed once more data has arrived.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingAssetData(_) | Self::Decode(DecodeError::MissingLod)
        )
    }
}
