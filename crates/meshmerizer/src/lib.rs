//! Build collision meshes from primitive, sculpted and uploaded mesh shapes.
//!
//! [`Meshmerizer`] takes a [`ShapeDescriptor`] and produces a shared
//! [`Mesh`]. Identical shapes are built once and shared through a
//! [`MeshCache`].
//!
//! # Example
//!
//! ```no_run
//! use glam::Vec3;
//! use meshmerizer::{AssetId, MeshShape, Meshmerizer, MeshmerizerConfig, ShapeDescriptor};
//!
//! let engine = Meshmerizer::new(MeshmerizerConfig::default());
//! let payload = std::fs::read("asset.mesh").unwrap();
//! let shape = ShapeDescriptor::uploaded_mesh(
//!     MeshShape { asset: AssetId::default(), data: Some(payload) },
//!     Vec3::new(2.0, 1.0, 0.5),
//! );
//!
//! if let Some(mesh) = engine.create_mesh(&shape, true) {
//!     println!("{} triangles", mesh.triangle_count());
//! }
//! ```
//!
//! # Shape kinds
//!
//! - Uploaded meshes are decoded from their asset payload
//! - Sculpts are sampled from a texture and stitched into a surface
//! - Primitives are extruded by a host-supplied [`ProfileMesher`]
//!
//! Small non-physical shapes of any kind become a 12-triangle box.

mod cache;
mod config;
mod engine;
mod error;
mod key;
mod profile;
mod sculpt_cache;
mod shape;
mod texture;

pub use cache::{CacheStats, MeshCache};
pub use config::{ConfigError, MeshmerizerConfig};
pub use engine::Meshmerizer;
pub use error::{MeshError, Result};
pub use key::{BuildSettings, MeshKey};
pub use profile::{
    Extrusion, HOLLOW_CIRCLE, HOLLOW_SAME, HOLLOW_SQUARE, HOLLOW_TRIANGLE, PATH_CURVE_CIRCLE,
    PATH_CURVE_CIRCLE_2, PATH_CURVE_FLEXIBLE, PATH_CURVE_LINE, PATH_CURVE_TEST, PROFILE_CIRCLE,
    PROFILE_EQUILATERAL_TRIANGLE, PROFILE_HALF_CIRCLE, PROFILE_ISOMETRIC_TRIANGLE,
    PROFILE_RIGHT_TRIANGLE, PROFILE_SQUARE, ProfileMesher, ProfileMesherError, ProfileParams,
};
pub use sculpt_cache::SculptMapCache;
pub use shape::{
    AssetId, LevelOfDetail, MeshShape, ParseAssetIdError, PrimShape, SculptShape, ShapeDescriptor,
    ShapeKind,
};
pub use texture::{ImageTextureDecoder, TextureDecoder};

// Re-export the mesh type so callers do not need the decode crate.
pub use meshmerizer_decode::{Aabb, ConvexHulls, Mesh};
