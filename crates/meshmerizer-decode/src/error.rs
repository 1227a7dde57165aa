//! Error types for mesh decoding.

use meshmerizer_llsd::LlsdError;

/// Result alias for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding shape data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The LLSD container could not be parsed.
    #[error("malformed container: {0}")]
    Container(#[from] LlsdError),

    /// The asset header is not a map of named blocks.
    #[error("asset header is not a map")]
    HeaderNotMap,

    /// None of the accepted level-of-detail blocks are present.
    #[error("no usable level of detail (expected one of physics_shape, physics_mesh, medium_lod, high_lod)")]
    MissingLod,

    /// A header entry does not describe a valid byte range.
    #[error("block '{block}' has an invalid range: {reason}")]
    InvalidBlockRef { block: String, reason: &'static str },

    /// A block's zlib stream is corrupt.
    #[error("failed to decompress block '{block}': {source}")]
    Decompress {
        block: String,
        #[source]
        source: std::io::Error,
    },

    /// A block inflated past the configured limit.
    #[error("block '{block}' decompresses to more than {limit} bytes")]
    DecompressedTooLarge { block: String, limit: usize },

    /// A decompressed block is neither a map nor an array of maps.
    #[error("block '{0}' does not contain submesh maps")]
    InvalidBlock(String),

    /// A required field is absent from a block.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A hull list references more positions than were supplied.
    #[error("hull list needs {needed} positions but only {available} are present")]
    TruncatedHullPositions { needed: usize, available: usize },

    /// A hull's vertex count cannot be expressed by a one-byte size marker.
    #[error("hull has {0} vertices, a hull list describes 1 to 256")]
    InvalidHullSize(usize),

    /// A submesh has more vertices than 32-bit indices can address.
    #[error("mesh has more vertices than 32-bit indices can address")]
    TooManyVertices,

    /// A sculpt texture has no pixels.
    #[error("sculpt image is {width}x{height}, which has no data")]
    DegenerateImage { width: u32, height: u32 },

    /// A sample grid is too small to triangulate.
    #[error("sample grid is {width}x{height}, need at least 2x2")]
    DegenerateGrid { width: usize, height: usize },

    /// A sample grid's data does not match its dimensions.
    #[error("sample grid has {actual} samples, expected {expected}")]
    SampleCountMismatch { expected: usize, actual: usize },

    /// A body offset or size does not fit the header's 32-bit integers.
    #[error("asset body offset {0} does not fit a 32-bit header integer")]
    PayloadTooLarge(usize),

    /// Encoding a block failed.
    #[error("failed to encode block: {0}")]
    Encode(#[source] std::io::Error),
}
