//! Decode uploaded mesh assets and sculpt maps into triangle meshes.
//!
//! This crate provides pure synchronous functions for turning compact shape
//! data into [`Mesh`] values. Nothing here blocks on I/O or spawns threads;
//! the caller decides how to parallelize.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Best effort**: Malformed input is reported as a [`DecodeError`], never a panic
//! - **Independent parts**: Convex hulls and render geometry decode separately
//!
//! # Key functions
//!
//! - [`decode_mesh_asset`]: Decode an uploaded mesh asset (geometry and hulls)
//! - [`SculptMap::from_image`]: Sample a sculpt texture into a displacement grid
//! - [`build_sculpt_mesh`]: Assemble a sampled grid into a plane, cylinder, sphere or torus
//! - [`bounding_box_mesh`]: Cheap 12-triangle box proxy
//! - [`dequantize`]: Expand a 16-bit quantized coordinate

mod error;

pub mod asset;
pub mod bbox;
pub mod convex;
pub mod mesh;
pub mod quantize;
pub mod sculpt;
pub mod writer;

pub use asset::{
    AssetHeader, BlockRef, DecodedAsset, DecodedSubmesh, LOD_PRIORITY, decode_mesh_asset,
    decode_submesh,
};
pub use bbox::{bounding_box_mesh, box_mesh};
pub use convex::ConvexHulls;
pub use error::{DecodeError, DecodeResult};
pub use mesh::{Aabb, Mesh};
pub use quantize::{PositionDomain, dequantize, quantize};
pub use sculpt::{SculptMap, SculptOptions, SculptSample, SculptTopology, build_sculpt_mesh};
pub use writer::{ConvexData, MeshAssetWriter, SubmeshData};

/// Name of the header entry holding the convex decomposition.
pub const CONVEX_BLOCK: &str = "physics_convex";

/// Default cap on the decompressed size of a single asset block (16 MiB).
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 16 << 20;
