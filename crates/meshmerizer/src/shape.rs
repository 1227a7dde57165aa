//! Shape descriptors supplied by the scene.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

/// 16-byte identity of a texture or mesh asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId([u8; 16]);

impl AssetId {
    #[must_use]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == [0; 16]
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error parsing an [`AssetId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset id '{0}'")]
pub struct ParseAssetIdError(String);

impl FromStr for AssetId {
    type Err = ParseAssetIdError;

    /// Accepts 32 hex digits, with or without the usual dashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAssetIdError(s.to_owned());
        let digits: Vec<u8> = s.bytes().filter(|&b| b != b'-').collect();
        if digits.len() != 32 || !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(err());
        }
        let mut bytes = [0; 16];
        for (byte, pair) in bytes.iter_mut().zip(digits.chunks_exact(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| err())?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| err())?;
        }
        Ok(Self(bytes))
    }
}

/// Sample density of a generated mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LevelOfDetail {
    VeryLow = 4,
    Low = 8,
    Medium = 16,
    #[default]
    High = 32,
}

impl LevelOfDetail {
    /// Samples per side for sculpt maps.
    #[must_use]
    pub fn samples(self) -> u32 {
        self as u32
    }
}

/// Raw quantized profile and path parameters of a primitive.
///
/// Field encodings follow the object update wire format; see
/// [`crate::ProfileParams`] for the decoded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::struct_field_names)]
pub struct PrimShape {
    pub path_curve: u8,
    /// Low nibble is the profile shape, high nibble the hollow shape.
    pub profile_curve: u8,
    pub path_begin: u16,
    pub path_end: u16,
    pub path_scale_x: u8,
    pub path_scale_y: u8,
    pub path_shear_x: u8,
    pub path_shear_y: u8,
    pub path_twist: i8,
    pub path_twist_begin: i8,
    pub path_radius_offset: i8,
    pub path_taper_x: i8,
    pub path_taper_y: i8,
    pub path_revolutions: u8,
    pub path_skew: i8,
    pub profile_begin: u16,
    pub profile_end: u16,
    pub profile_hollow: u16,
}

impl Default for PrimShape {
    /// An uncut, untwisted box.
    fn default() -> Self {
        Self {
            path_curve: crate::profile::PATH_CURVE_LINE,
            profile_curve: crate::profile::PROFILE_SQUARE,
            path_begin: 0,
            path_end: 0,
            path_scale_x: 100,
            path_scale_y: 100,
            path_shear_x: 0,
            path_shear_y: 0,
            path_twist: 0,
            path_twist_begin: 0,
            path_radius_offset: 0,
            path_taper_x: 0,
            path_taper_y: 0,
            path_revolutions: 0,
            path_skew: 0,
            profile_begin: 0,
            profile_end: 0,
            profile_hollow: 0,
        }
    }
}

/// A shape whose surface is encoded in a texture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SculptShape {
    pub texture: AssetId,
    /// Low three bits select the topology; see [`meshmerizer_decode::sculpt`].
    pub sculpt_type: u8,
    /// Compressed texture bytes, once fetched.
    pub texture_data: Option<Vec<u8>>,
}

/// A shape backed by an uploaded mesh asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshShape {
    pub asset: AssetId,
    /// Raw asset payload, once fetched.
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Primitive(PrimShape),
    Sculpt(SculptShape),
    UploadedMesh(MeshShape),
}

impl ShapeKind {
    /// Short label for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Sculpt(_) => "sculpt",
            Self::UploadedMesh(_) => "mesh",
        }
    }
}

/// Everything needed to build one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub scale: Vec3,
    pub lod: LevelOfDetail,
    /// Physical objects always get a full mesh, however small.
    pub physical: bool,
}

impl ShapeDescriptor {
    /// A non-physical shape at full detail.
    #[must_use]
    pub fn new(kind: ShapeKind, scale: Vec3) -> Self {
        Self {
            kind,
            scale,
            lod: LevelOfDetail::High,
            physical: false,
        }
    }

    #[must_use]
    pub fn primitive(shape: PrimShape, scale: Vec3) -> Self {
        Self::new(ShapeKind::Primitive(shape), scale)
    }

    #[must_use]
    pub fn sculpt(shape: SculptShape, scale: Vec3) -> Self {
        Self::new(ShapeKind::Sculpt(shape), scale)
    }

    #[must_use]
    pub fn uploaded_mesh(shape: MeshShape, scale: Vec3) -> Self {
        Self::new(ShapeKind::UploadedMesh(shape), scale)
    }

    #[must_use]
    pub fn with_lod(mut self, lod: LevelOfDetail) -> Self {
        self.lod = lod;
        self
    }

    #[must_use]
    pub fn with_physical(mut self, physical: bool) -> Self {
        self.physical = physical;
        self
    }
}
