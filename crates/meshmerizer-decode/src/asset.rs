//! Uploaded mesh asset decoding.
//!
//! # Format
//!
//! ```text
//! [LLSD map header]  name -> { offset: int, size: int }
//! [body]             zlib streams, each inflating to LLSD
//! ```
//!
//! Offsets are relative to the first byte after the header. A level of
//! detail block inflates to one submesh map or an array of them:
//!
//! - `NoGeometry`: boolean, the block is valid but empty
//! - `PositionDomain`: `{ Min, Max }`, defaults to the unit cube at the origin
//! - `Position`: packed little-endian `u16×3` per vertex
//! - `TriangleList`: packed little-endian `u16×3` per triangle

use std::io::Read;

use flate2::read::ZlibDecoder;
use glam::Vec3;
use meshmerizer_llsd::{Map, Value};

use crate::CONVEX_BLOCK;
use crate::convex::ConvexHulls;
use crate::error::{DecodeError, DecodeResult};
use crate::mesh::Mesh;
use crate::quantize::{PositionDomain, dequantize_positions, u16_triples};

/// Level of detail blocks usable as collision geometry, most preferred first.
pub const LOD_PRIORITY: [&str; 4] = ["physics_shape", "physics_mesh", "medium_lod", "high_lod"];

/// Byte range of one block, relative to the body start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub offset: usize,
    pub size: usize,
}

/// Parsed asset header.
#[derive(Debug, Clone)]
pub struct AssetHeader {
    entries: Map,
    body_start: usize,
}

impl AssetHeader {
    /// Parse the header at the front of `payload`.
    pub fn parse(payload: &[u8]) -> DecodeResult<Self> {
        let (value, body_start) = meshmerizer_llsd::from_slice(payload)?;
        match value {
            Value::Map(entries) => Ok(Self {
                entries,
                body_start,
            }),
            _ => Err(DecodeError::HeaderNotMap),
        }
    }

    /// Offset of the first body byte within the payload.
    #[must_use]
    pub fn body_start(&self) -> usize {
        self.body_start
    }

    /// Names of all header entries.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_block(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The first present entry from [`LOD_PRIORITY`].
    #[must_use]
    pub fn select_lod(&self) -> Option<&'static str> {
        LOD_PRIORITY.into_iter().find(|name| self.has_block(name))
    }

    /// Look up the byte range of block `name`.
    pub fn block(&self, name: &str) -> DecodeResult<Option<BlockRef>> {
        let Some(entry) = self.entries.get(name) else {
            return Ok(None);
        };
        let invalid = |reason| DecodeError::InvalidBlockRef {
            block: name.to_owned(),
            reason,
        };
        let field = |key| {
            entry
                .get(key)
                .and_then(Value::as_integer)
                .ok_or_else(|| invalid("missing offset or size"))
                .and_then(|v| usize::try_from(v).map_err(|_| invalid("negative offset or size")))
        };
        Ok(Some(BlockRef {
            offset: field("offset")?,
            size: field("size")?,
        }))
    }

    /// Slice, inflate and parse block `name`.
    ///
    /// Returns `Ok(None)` when the header has no such entry.
    pub fn read_block(
        &self,
        payload: &[u8],
        name: &str,
        max_decompressed: usize,
    ) -> DecodeResult<Option<Value>> {
        let Some(block) = self.block(name)? else {
            return Ok(None);
        };
        let start = self
            .body_start
            .checked_add(block.offset)
            .filter(|&s| s <= payload.len());
        let end = start
            .and_then(|s| s.checked_add(block.size))
            .filter(|&e| e <= payload.len());
        let (Some(start), Some(end)) = (start, end) else {
            return Err(DecodeError::InvalidBlockRef {
                block: name.to_owned(),
                reason: "range extends past the end of the payload",
            });
        };

        let inflated = decompress(&payload[start..end], name, max_decompressed)?;
        let (value, _) = meshmerizer_llsd::from_slice(&inflated)?;
        Ok(Some(value))
    }
}

/// Inflate a zlib stream, refusing output larger than `limit` bytes.
pub fn decompress(bytes: &[u8], block: &str, limit: usize) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes)
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Decompress {
            block: block.to_owned(),
            source,
        })?;
    if out.len() > limit {
        return Err(DecodeError::DecompressedTooLarge {
            block: block.to_owned(),
            limit,
        });
    }
    Ok(out)
}

/// Geometry of one submesh map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSubmesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// Decode one submesh map.
///
/// Positions are de-quantized into the block's domain and multiplied by
/// `size`. Triangle indices are offset by `index_offset`; triangles that
/// reference a vertex outside this submesh are dropped.
pub fn decode_submesh(
    block: &Value,
    size: Vec3,
    index_offset: u32,
) -> DecodeResult<DecodedSubmesh> {
    if block.get("NoGeometry").is_some_and(Value::as_bool) {
        return Ok(DecodedSubmesh::default());
    }

    let mut domain = PositionDomain::default();
    if let Some(pd) = block.get("PositionDomain") {
        if let Some(min) = pd.get("Min").and_then(Value::as_vec3) {
            domain.min = Vec3::from_array(min);
        }
        if let Some(max) = pd.get("Max").and_then(Value::as_vec3) {
            domain.max = Vec3::from_array(max);
        }
    }

    let positions = block
        .get("Position")
        .and_then(Value::as_binary)
        .ok_or(DecodeError::MissingField("Position"))?;
    let triangle_bytes = block
        .get("TriangleList")
        .and_then(Value::as_binary)
        .ok_or(DecodeError::MissingField("TriangleList"))?;

    if positions.len() % 6 != 0 || triangle_bytes.len() % 6 != 0 {
        tracing::warn!(
            "Ignoring trailing bytes in submesh (Position={}, TriangleList={})",
            positions.len(),
            triangle_bytes.len()
        );
    }

    let vertices: Vec<Vec3> = dequantize_positions(positions, &domain)
        .into_iter()
        .map(|p| p * size)
        .collect();
    let local_count = u32::try_from(vertices.len()).map_err(|_| DecodeError::TooManyVertices)?;
    index_offset
        .checked_add(local_count)
        .ok_or(DecodeError::TooManyVertices)?;

    let mut dropped = 0usize;
    let triangles = u16_triples(triangle_bytes)
        .filter_map(|tri| {
            let tri = tri.map(u32::from);
            if tri.iter().all(|&i| i < local_count) {
                Some(tri.map(|i| i + index_offset))
            } else {
                dropped += 1;
                None
            }
        })
        .collect();
    if dropped > 0 {
        tracing::warn!(
            "Dropped {dropped} triangles referencing vertices outside a {local_count}-vertex submesh"
        );
    }

    Ok(DecodedSubmesh {
        vertices,
        triangles,
    })
}

/// Decode an inflated level of detail block into one mesh.
///
/// Submeshes are concatenated; each one's indices are offset by the number
/// of vertices decoded before it.
pub fn decode_lod_block(block: &Value, name: &str, size: Vec3) -> DecodeResult<Mesh> {
    let submeshes: Vec<&Value> = match block {
        Value::Map(_) => vec![block],
        Value::Array(items) => items.iter().filter(|v| v.as_map().is_some()).collect(),
        _ => return Err(DecodeError::InvalidBlock(name.to_owned())),
    };

    let mut mesh = Mesh::default();
    for submesh in submeshes {
        let offset = u32::try_from(mesh.vertices.len()).map_err(|_| DecodeError::TooManyVertices)?;
        let decoded = decode_submesh(submesh, size, offset)?;
        mesh.vertices.extend(decoded.vertices);
        mesh.triangles.extend(decoded.triangles);
    }
    Ok(mesh)
}

/// Render geometry and convex hulls of one asset, decoded independently.
#[derive(Debug)]
pub struct DecodedAsset {
    /// Which level of detail the geometry came from.
    pub lod: Option<&'static str>,
    /// Collision geometry, or why it could not be produced.
    pub geometry: DecodeResult<Mesh>,
    /// Convex decomposition, if the asset has one.
    pub hulls: Option<DecodeResult<ConvexHulls>>,
}

impl DecodedAsset {
    /// Merge into one mesh carrying any successfully decoded hulls.
    pub fn into_mesh(self) -> DecodeResult<Mesh> {
        let mut mesh = self.geometry?;
        mesh.hulls = self.hulls.and_then(Result::ok);
        Ok(mesh)
    }
}

/// Decode an uploaded mesh asset.
///
/// Fails only when the header itself is unreadable. Problems with the level
/// of detail block or the convex block are reported in the respective field
/// of [`DecodedAsset`], so one can succeed while the other fails.
pub fn decode_mesh_asset(
    payload: &[u8],
    size: Vec3,
    max_decompressed: usize,
) -> DecodeResult<DecodedAsset> {
    let header = AssetHeader::parse(payload)?;

    let hulls = header.has_block(CONVEX_BLOCK).then(|| {
        let hulls = header
            .read_block(payload, CONVEX_BLOCK, max_decompressed)
            .and_then(|block| {
                block
                    .as_ref()
                    .map_or(Ok(ConvexHulls::default()), ConvexHulls::decode)
            });
        if let Err(e) = &hulls {
            tracing::warn!("Failed to decode convex hulls: {e}");
        }
        hulls
    });

    let lod = header.select_lod();
    let geometry = match lod {
        None => {
            tracing::warn!(
                "No recognized physics mesh in asset (blocks: {:?})",
                header.block_names().collect::<Vec<_>>()
            );
            Err(DecodeError::MissingLod)
        }
        Some(name) => header
            .read_block(payload, name, max_decompressed)
            .and_then(|block| block.ok_or(DecodeError::MissingLod))
            .and_then(|block| decode_lod_block(&block, name, size)),
    };
    if let (Some(name), Err(e)) = (lod, &geometry) {
        tracing::warn!("Failed to decode mesh block '{name}': {e}");
    }

    Ok(DecodedAsset {
        lod,
        geometry,
        hulls,
    })
}
