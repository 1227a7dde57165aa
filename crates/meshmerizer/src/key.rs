//! Mesh identity.

use std::fmt;

use glam::Vec3;
use xxhash_rust::xxh3::Xxh3;

use crate::config::MeshmerizerConfig;
use crate::shape::{LevelOfDetail, PrimShape, ShapeKind};

const TAG_PRIMITIVE: u8 = 1;
const TAG_SCULPT: u8 = 2;
const TAG_MESH: u8 = 3;

/// Engine settings that change the mesh built for a shape.
///
/// Engines sharing a [`crate::MeshCache`] may be configured differently, so
/// these are folded into every [`MeshKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSettings {
    pub weld_vertices: bool,
    pub sculpt_normals_and_uvs: bool,
    pub use_mesh_physics: bool,
    pub max_decompressed_bytes: usize,
}

impl From<&MeshmerizerConfig> for BuildSettings {
    fn from(config: &MeshmerizerConfig) -> Self {
        Self {
            weld_vertices: config.weld_vertices,
            sculpt_normals_and_uvs: config.sculpt_normals_and_uvs,
            use_mesh_physics: config.use_mesh_physics,
            max_decompressed_bytes: config.max_decompressed_bytes,
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from(&MeshmerizerConfig::default())
    }
}

/// 64-bit fingerprint of everything that determines a mesh.
///
/// Covers the shape fields, the effective scale, the level of detail,
/// whether the box fallback applies and the [`BuildSettings`] the shape's
/// kind depends on. Fetched asset payloads are not part of the key; the
/// asset id stands in for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshKey(pub u64);

impl MeshKey {
    #[must_use]
    pub fn new(
        kind: &ShapeKind,
        scale: Vec3,
        lod: LevelOfDetail,
        fallback: bool,
        settings: &BuildSettings,
    ) -> Self {
        let mut hasher = Xxh3::new();
        match kind {
            ShapeKind::Primitive(shape) => {
                hasher.update(&[TAG_PRIMITIVE]);
                hash_prim(&mut hasher, shape);
            }
            ShapeKind::Sculpt(shape) => {
                hasher.update(&[TAG_SCULPT, shape.sculpt_type]);
                hasher.update(shape.texture.as_bytes());
            }
            ShapeKind::UploadedMesh(shape) => {
                hasher.update(&[TAG_MESH]);
                hasher.update(shape.asset.as_bytes());
            }
        }
        for component in scale.to_array() {
            hasher.update(&component.to_bits().to_le_bytes());
        }
        hasher.update(&(lod as u32).to_le_bytes());
        hasher.update(&[u8::from(fallback)]);
        // Boxes ignore every setting.
        if !fallback {
            hash_settings(&mut hasher, kind, settings);
        }
        Self(hasher.digest())
    }
}

fn hash_settings(hasher: &mut Xxh3, kind: &ShapeKind, settings: &BuildSettings) {
    hasher.update(&[u8::from(settings.weld_vertices)]);
    match kind {
        ShapeKind::Primitive(_) => {}
        ShapeKind::Sculpt(_) => hasher.update(&[u8::from(settings.sculpt_normals_and_uvs)]),
        ShapeKind::UploadedMesh(_) => {
            hasher.update(&[u8::from(settings.use_mesh_physics)]);
            hasher.update(&settings.max_decompressed_bytes.to_le_bytes());
        }
    }
}

fn hash_prim(hasher: &mut Xxh3, shape: &PrimShape) {
    let bytes = [
        shape.path_curve,
        shape.profile_curve,
        shape.path_scale_x,
        shape.path_scale_y,
        shape.path_shear_x,
        shape.path_shear_y,
        shape.path_twist.to_le_bytes()[0],
        shape.path_twist_begin.to_le_bytes()[0],
        shape.path_radius_offset.to_le_bytes()[0],
        shape.path_taper_x.to_le_bytes()[0],
        shape.path_taper_y.to_le_bytes()[0],
        shape.path_revolutions,
        shape.path_skew.to_le_bytes()[0],
    ];
    hasher.update(&bytes);
    for word in [
        shape.path_begin,
        shape.path_end,
        shape.profile_begin,
        shape.profile_end,
        shape.profile_hollow,
    ] {
        hasher.update(&word.to_le_bytes());
    }
}

impl fmt::Display for MeshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{AssetId, MeshShape, SculptShape};

    fn key(kind: &ShapeKind) -> MeshKey {
        MeshKey::new(
            kind,
            Vec3::ONE,
            LevelOfDetail::High,
            false,
            &BuildSettings::default(),
        )
    }

    #[test]
    fn equal_shapes_share_a_key() {
        let a = ShapeKind::Primitive(PrimShape::default());
        let b = ShapeKind::Primitive(PrimShape::default());
        assert_eq!(key(&a), key(&b));
    }

    #[test]
    fn payload_does_not_affect_key() {
        let id = AssetId::new([7; 16]);
        let empty = ShapeKind::UploadedMesh(MeshShape {
            asset: id,
            data: None,
        });
        let loaded = ShapeKind::UploadedMesh(MeshShape {
            asset: id,
            data: Some(vec![1, 2, 3]),
        });
        assert_eq!(key(&empty), key(&loaded));
    }

    #[test]
    fn every_input_distinguishes() {
        let prim = ShapeKind::Primitive(PrimShape::default());
        let base = key(&prim);

        let hollow = ShapeKind::Primitive(PrimShape {
            profile_hollow: 1,
            ..PrimShape::default()
        });
        assert_ne!(base, key(&hollow));
        let settings = BuildSettings::default();
        assert_ne!(
            base,
            MeshKey::new(
                &prim,
                Vec3::new(1.0, 1.0, 2.0),
                LevelOfDetail::High,
                false,
                &settings,
            )
        );
        assert_ne!(
            base,
            MeshKey::new(&prim, Vec3::ONE, LevelOfDetail::Low, false, &settings)
        );
        assert_ne!(
            base,
            MeshKey::new(&prim, Vec3::ONE, LevelOfDetail::High, true, &settings)
        );

        let sculpt = |sculpt_type| {
            ShapeKind::Sculpt(SculptShape {
                texture: AssetId::new([1; 16]),
                sculpt_type,
                texture_data: None,
            })
        };
        let (sphere, torus) = (sculpt(1), sculpt(2));
        assert_ne!(key(&sphere), key(&torus));

        let mesh = ShapeKind::UploadedMesh(MeshShape {
            asset: AssetId::new([1; 16]),
            data: None,
        });
        assert_ne!(key(&sphere), key(&mesh));
    }

    #[test]
    fn settings_distinguish_only_the_kinds_they_affect() {
        let keyed = |kind: &ShapeKind, fallback, settings: BuildSettings| {
            MeshKey::new(kind, Vec3::ONE, LevelOfDetail::High, fallback, &settings)
        };
        let defaults = BuildSettings::default();
        let normals = BuildSettings {
            sculpt_normals_and_uvs: true,
            ..defaults
        };
        let unwelded = BuildSettings {
            weld_vertices: false,
            ..defaults
        };
        let capped = BuildSettings {
            max_decompressed_bytes: 1024,
            ..defaults
        };

        let sculpt = ShapeKind::Sculpt(SculptShape::default());
        let prim = ShapeKind::Primitive(PrimShape::default());
        let mesh = ShapeKind::UploadedMesh(MeshShape::default());

        let sculpt_key = keyed(&sculpt, false, defaults);
        assert_ne!(sculpt_key, keyed(&sculpt, false, normals));
        assert_eq!(sculpt_key, keyed(&sculpt, false, capped));

        let prim_key = keyed(&prim, false, defaults);
        assert_eq!(prim_key, keyed(&prim, false, normals));
        assert_ne!(prim_key, keyed(&prim, false, unwelded));

        let mesh_key = keyed(&mesh, false, defaults);
        assert_ne!(mesh_key, keyed(&mesh, false, capped));

        // Boxes look the same under any settings.
        let sculpt_box = keyed(&sculpt, true, defaults);
        assert_eq!(sculpt_box, keyed(&sculpt, true, normals));
        assert_eq!(sculpt_box, keyed(&sculpt, true, unwelded));
    }
}
