//! The mesh engine entry point.

use std::sync::Arc;

use glam::Vec3;
use image::RgbImage;
use meshmerizer_decode::{
    Mesh, SculptMap, SculptOptions, bounding_box_mesh, build_sculpt_mesh, decode_mesh_asset,
};

use crate::cache::MeshCache;
use crate::config::MeshmerizerConfig;
use crate::error::{MeshError, Result};
use crate::key::{BuildSettings, MeshKey};
use crate::profile::{ProfileMesher, ProfileParams};
use crate::sculpt_cache::SculptMapCache;
use crate::shape::{LevelOfDetail, MeshShape, PrimShape, SculptShape, ShapeDescriptor, ShapeKind};
use crate::texture::{ImageTextureDecoder, TextureDecoder};

/// Scale and box fallback decision for one request.
#[derive(Debug, Clone, Copy)]
struct Plan {
    scale: Vec3,
    fallback: bool,
    key: MeshKey,
}

/// Builds meshes for shape descriptors, sharing results through a
/// [`MeshCache`].
///
/// Safe to use from many threads at once; only the cache is shared state.
pub struct Meshmerizer {
    config: MeshmerizerConfig,
    cache: Arc<MeshCache>,
    sculpt_maps: Option<SculptMapCache>,
    texture_decoder: Arc<dyn TextureDecoder>,
    profile_mesher: Option<Arc<dyn ProfileMesher>>,
}

impl std::fmt::Debug for Meshmerizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meshmerizer")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("profile_mesher", &self.profile_mesher.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Meshmerizer {
    fn default() -> Self {
        Self::new(MeshmerizerConfig::default())
    }
}

impl Meshmerizer {
    /// Engine with its own cache, sized by `config.mesh_cache_capacity`.
    #[must_use]
    pub fn new(config: MeshmerizerConfig) -> Self {
        let cache = match config.mesh_cache_capacity {
            Some(capacity) => MeshCache::with_capacity(capacity),
            None => MeshCache::new(),
        };
        Self::with_cache(config, Arc::new(cache))
    }

    /// Engine sharing an existing cache.
    #[must_use]
    pub fn with_cache(config: MeshmerizerConfig, cache: Arc<MeshCache>) -> Self {
        let sculpt_maps = config
            .cache_sculpt_maps
            .then(|| SculptMapCache::new(config.sculpt_map_cache_dir.clone()));
        Self {
            config,
            cache,
            sculpt_maps,
            texture_decoder: Arc::new(ImageTextureDecoder),
            profile_mesher: None,
        }
    }

    #[must_use]
    pub fn with_texture_decoder(mut self, decoder: impl TextureDecoder + 'static) -> Self {
        self.texture_decoder = Arc::new(decoder);
        self
    }

    /// Install the extruder used for primitive shapes. Without one,
    /// primitives fail with [`MeshError::ProfileMesherUnavailable`] unless
    /// they fall back to a box.
    #[must_use]
    pub fn with_profile_mesher(mut self, mesher: impl ProfileMesher + 'static) -> Self {
        self.profile_mesher = Some(Arc::new(mesher));
        self
    }

    #[must_use]
    pub fn config(&self) -> &MeshmerizerConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<MeshCache> {
        &self.cache
    }

    /// Key under which the mesh for `descriptor` is cached.
    #[must_use]
    pub fn mesh_key(&self, descriptor: &ShapeDescriptor) -> MeshKey {
        self.plan(descriptor).key
    }

    /// Build or fetch the mesh for `descriptor`.
    ///
    /// Returns `None` when no mesh can be produced; the reason is logged.
    /// Use [`Self::try_create_mesh`] to inspect it.
    #[must_use]
    pub fn create_mesh(
        &self,
        descriptor: &ShapeDescriptor,
        should_cache: bool,
    ) -> Option<Arc<Mesh>> {
        match self.try_create_mesh(descriptor, should_cache) {
            Ok(mesh) => Some(mesh),
            Err(e) if e.is_retryable() => {
                tracing::debug!("No {} mesh yet: {e}", descriptor.kind.name());
                None
            }
            Err(e) => {
                tracing::warn!("Failed to build {} mesh: {e}", descriptor.kind.name());
                None
            }
        }
    }

    /// Build or fetch the mesh for `descriptor`, reporting why none could be
    /// produced.
    pub fn try_create_mesh(
        &self,
        descriptor: &ShapeDescriptor,
        should_cache: bool,
    ) -> Result<Arc<Mesh>> {
        let plan = self.plan(descriptor);
        if should_cache {
            self.cache
                .get_or_build(plan.key, || self.build(descriptor, &plan))
        } else {
            self.build(descriptor, &plan).map(Arc::new)
        }
    }

    fn plan(&self, descriptor: &ShapeDescriptor) -> Plan {
        let min = self.config.min_scale;
        // `!(v >= min)` also catches NaN.
        let scale = Vec3::from_array(
            descriptor
                .scale
                .to_array()
                .map(|v| if v >= min { v } else { min }),
        );
        let fallback = !descriptor.physical
            && scale
                .cmplt(Vec3::splat(self.config.min_size_for_complex_mesh))
                .all();
        Plan {
            scale,
            fallback,
            key: MeshKey::new(
                &descriptor.kind,
                scale,
                descriptor.lod,
                fallback,
                &BuildSettings::from(&self.config),
            ),
        }
    }

    fn build(&self, descriptor: &ShapeDescriptor, plan: &Plan) -> Result<Mesh> {
        if plan.fallback {
            tracing::debug!(
                "Using box for small {} shape of size {}",
                descriptor.kind.name(),
                plan.scale
            );
            return Ok(bounding_box_mesh(plan.scale));
        }

        let mesh = match &descriptor.kind {
            ShapeKind::UploadedMesh(shape) => self.uploaded_mesh(shape, plan.scale)?,
            ShapeKind::Sculpt(shape) => self.sculpt_mesh(shape, descriptor.lod, plan.scale)?,
            ShapeKind::Primitive(shape) => {
                self.primitive_mesh(shape, descriptor.lod, plan.scale)?
            }
        };

        if self.config.weld_vertices && mesh.normals.is_none() && mesh.uvs.is_none() {
            Ok(mesh.welded())
        } else {
            Ok(mesh)
        }
    }

    fn uploaded_mesh(&self, shape: &MeshShape, scale: Vec3) -> Result<Mesh> {
        if !self.config.use_mesh_physics {
            return Err(MeshError::MeshPhysicsDisabled);
        }
        let payload = shape
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or(MeshError::MissingAssetData(shape.asset))?;

        let decoded = decode_mesh_asset(payload, scale, self.config.max_decompressed_bytes)?;
        if let Some(lod) = decoded.lod {
            tracing::debug!("Decoding '{lod}' of mesh {}", shape.asset);
        }
        Ok(decoded.into_mesh()?)
    }

    fn sculpt_mesh(&self, shape: &SculptShape, lod: LevelOfDetail, scale: Vec3) -> Result<Mesh> {
        let image = self.sculpt_image(shape)?;
        let map = SculptMap::from_image(&image, lod.samples())?;

        let options = SculptOptions {
            normals_and_uvs: self.config.sculpt_normals_and_uvs,
            ..SculptOptions::from_sculpt_type(shape.sculpt_type)
        };
        let mut mesh = build_sculpt_mesh(map.to_sample(options.mirror), &options)?;
        mesh.scale(scale);
        Ok(mesh)
    }

    /// Pixels of a sculpt texture, from the disk cache when possible.
    fn sculpt_image(&self, shape: &SculptShape) -> Result<RgbImage> {
        let id = shape.texture;
        if let Some(image) = self.sculpt_maps.as_ref().and_then(|cache| cache.load(id)) {
            return Ok(image);
        }

        let bytes = shape
            .texture_data
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or(MeshError::MissingAssetData(id))?;
        let image = self
            .texture_decoder
            .decode(bytes)
            .map_err(|source| MeshError::TextureDecode { id, source })?
            .into_rgb8();

        if let Some(cache) = &self.sculpt_maps {
            if let Err(e) = cache.store(id, &image) {
                tracing::warn!(
                    "Failed to cache sculpt map {id} in {}: {e}",
                    cache.dir().display()
                );
            }
        }
        Ok(image)
    }

    fn primitive_mesh(&self, shape: &PrimShape, lod: LevelOfDetail, scale: Vec3) -> Result<Mesh> {
        let mesher = self
            .profile_mesher
            .as_ref()
            .ok_or(MeshError::ProfileMesherUnavailable)?;
        let params = ProfileParams::new(shape, lod);
        let mut mesh = mesher.extrude(&params).map_err(MeshError::ProfileMesher)?;
        mesh.scale(scale);
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::AssetId;

    fn engine() -> Meshmerizer {
        Meshmerizer::new(MeshmerizerConfig {
            cache_sculpt_maps: false,
            ..MeshmerizerConfig::default()
        })
    }

    #[test]
    fn scale_is_clamped_before_keying() {
        let engine = engine();
        let prim = |scale| ShapeDescriptor::primitive(PrimShape::default(), scale);
        let tiny = engine.plan(&prim(Vec3::new(0.001, f32::NAN, -4.0)));
        assert_eq!(tiny.scale, Vec3::splat(0.01));
        assert_eq!(
            tiny.key,
            engine.mesh_key(&prim(Vec3::new(0.01, 0.0, 0.005)))
        );
    }

    #[test]
    fn fallback_needs_every_axis_small() {
        let engine = engine();
        let plan = |scale, physical| {
            let shape = ShapeDescriptor::primitive(PrimShape::default(), scale);
            engine.plan(&shape.with_physical(physical)).fallback
        };
        assert!(plan(Vec3::splat(0.1), false));
        assert!(!plan(Vec3::splat(0.1), true));
        assert!(!plan(Vec3::new(0.1, 0.1, 0.2), false));
        assert!(!plan(Vec3::new(5.0, 0.1, 0.1), false));
    }

    #[test]
    fn fallback_changes_the_key() {
        let engine = engine();
        let shape = ShapeDescriptor::primitive(PrimShape::default(), Vec3::splat(0.1));
        assert_ne!(
            engine.mesh_key(&shape),
            engine.mesh_key(&shape.clone().with_physical(true))
        );
    }

    #[test]
    fn missing_payload_is_retryable() {
        let engine = engine();
        let shape = ShapeDescriptor::uploaded_mesh(
            MeshShape {
                asset: AssetId::new([3; 16]),
                data: Some(Vec::new()),
            },
            Vec3::ONE,
        );
        let err = engine.try_create_mesh(&shape, true).unwrap_err();
        assert!(matches!(err, MeshError::MissingAssetData(_)));
        assert!(err.is_retryable());
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn mesh_physics_can_be_disabled() {
        let engine = Meshmerizer::new(MeshmerizerConfig {
            use_mesh_physics: false,
            cache_sculpt_maps: false,
            ..MeshmerizerConfig::default()
        });
        let shape = ShapeDescriptor::uploaded_mesh(MeshShape::default(), Vec3::ONE);
        assert!(matches!(
            engine.try_create_mesh(&shape, false),
            Err(MeshError::MeshPhysicsDisabled)
        ));
    }

    #[test]
    fn primitives_need_a_mesher() {
        let shape = ShapeDescriptor::primitive(PrimShape::default(), Vec3::ONE);
        assert!(matches!(
            engine().try_create_mesh(&shape, false),
            Err(MeshError::ProfileMesherUnavailable)
        ));
        assert!(engine().create_mesh(&shape, false).is_none());
    }
}
