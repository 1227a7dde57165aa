//! Mesh asset encoding.
//!
//! Produces payloads in the layout [`crate::asset`] decodes. Used by asset
//! tooling and to build fixtures.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use glam::Vec3;
use meshmerizer_llsd::{Map, Value};

use crate::CONVEX_BLOCK;
use crate::error::{DecodeError, DecodeResult};
use crate::quantize::{PositionDomain, quantize_positions};

/// Geometry of one submesh to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmeshData {
    pub domain: PositionDomain,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u16; 3]>,
}

impl SubmeshData {
    /// Submesh quantized against the smallest domain enclosing `positions`.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u16; 3]>) -> Self {
        Self {
            domain: PositionDomain::enclosing(&positions),
            positions,
            triangles,
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: PositionDomain) -> Self {
        self.domain = domain;
        self
    }

    pub(crate) fn to_llsd(&self) -> Value {
        let mut domain = Map::new();
        domain.insert("Min".into(), Value::vec3(self.domain.min.to_array()));
        domain.insert("Max".into(), Value::vec3(self.domain.max.to_array()));

        let mut triangles = Vec::with_capacity(self.triangles.len() * 6);
        for index in self.triangles.iter().flatten() {
            triangles.extend_from_slice(&index.to_le_bytes());
        }

        let mut block = Map::new();
        block.insert("PositionDomain".into(), Value::Map(domain));
        block.insert(
            "Position".into(),
            Value::Binary(quantize_positions(&self.positions, &self.domain)),
        );
        block.insert("TriangleList".into(), Value::Binary(triangles));
        Value::Map(block)
    }
}

/// Convex decomposition to encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexData {
    pub bounding_hull: Vec<Vec3>,
    pub hulls: Vec<Vec<Vec3>>,
}

impl ConvexData {
    fn to_llsd(&self) -> DecodeResult<Value> {
        let all: Vec<Vec3> = self
            .bounding_hull
            .iter()
            .chain(self.hulls.iter().flatten())
            .copied()
            .collect();
        let domain = PositionDomain::enclosing(&all);

        let mut hull_list = Vec::with_capacity(self.hulls.len());
        let mut positions = Vec::new();
        for hull in &self.hulls {
            hull_list.push(match hull.len() {
                256 => 0,
                n @ 1..=255 => u8::try_from(n).map_err(|_| DecodeError::InvalidHullSize(n))?,
                n => return Err(DecodeError::InvalidHullSize(n)),
            });
            positions.extend(quantize_positions(hull, &domain));
        }

        let mut block = Map::new();
        block.insert("Min".into(), Value::vec3(domain.min.to_array()));
        block.insert("Max".into(), Value::vec3(domain.max.to_array()));
        block.insert(
            "BoundingVerts".into(),
            Value::Binary(quantize_positions(&self.bounding_hull, &domain)),
        );
        if !self.hulls.is_empty() {
            block.insert("HullList".into(), Value::Binary(hull_list));
            block.insert("Positions".into(), Value::Binary(positions));
        }
        Ok(Value::Map(block))
    }
}

enum Block {
    Llsd(Value),
    Convex(ConvexData),
    Raw(Vec<u8>),
}

/// Builder for uploaded mesh asset payloads.
#[derive(Default)]
pub struct MeshAssetWriter {
    blocks: Vec<(String, Block)>,
}

impl MeshAssetWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level of detail block. One submesh is written as a map, several
    /// as an array.
    #[must_use]
    pub fn lod(mut self, name: &str, submeshes: &[SubmeshData]) -> Self {
        let value = match submeshes {
            [single] => single.to_llsd(),
            _ => Value::Array(submeshes.iter().map(SubmeshData::to_llsd).collect()),
        };
        self.blocks.push((name.to_owned(), Block::Llsd(value)));
        self
    }

    /// Add a level of detail block flagged `NoGeometry`.
    #[must_use]
    pub fn no_geometry_lod(mut self, name: &str) -> Self {
        let mut block = Map::new();
        block.insert("NoGeometry".into(), Value::Boolean(true));
        let entry = Block::Llsd(Value::Map(block));
        self.blocks.push((name.to_owned(), entry));
        self
    }

    /// Add the `physics_convex` block.
    #[must_use]
    pub fn convex(mut self, convex: &ConvexData) -> Self {
        self.blocks
            .push((CONVEX_BLOCK.to_owned(), Block::Convex(convex.clone())));
        self
    }

    /// Add a block whose body bytes are stored exactly as given.
    #[must_use]
    pub fn raw_block(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.blocks.push((name.to_owned(), Block::Raw(bytes)));
        self
    }

    /// Serialize the header followed by the body.
    pub fn finish(self) -> DecodeResult<Vec<u8>> {
        let mut header = Map::new();
        let mut body = Vec::new();
        for (name, block) in self.blocks {
            let bytes = match block {
                Block::Llsd(value) => compress(&value)?,
                Block::Convex(convex) => compress(&convex.to_llsd()?)?,
                Block::Raw(bytes) => bytes,
            };
            let mut entry = Map::new();
            entry.insert("offset".into(), Value::Integer(header_int(body.len())?));
            entry.insert("size".into(), Value::Integer(header_int(bytes.len())?));
            header.insert(name, Value::Map(entry));
            body.extend(bytes);
        }

        let mut out = meshmerizer_llsd::to_vec(&Value::Map(header))?;
        out.extend(body);
        Ok(out)
    }
}

fn compress(value: &Value) -> DecodeResult<Vec<u8>> {
    let raw = meshmerizer_llsd::to_vec(value)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).map_err(DecodeError::Encode)?;
    encoder.finish().map_err(DecodeError::Encode)
}

fn header_int(len: usize) -> DecodeResult<i32> {
    i32::try_from(len).map_err(|_| DecodeError::PayloadTooLarge(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetHeader;

    #[test]
    fn header_offsets_are_contiguous() {
        let payload = MeshAssetWriter::new()
            .raw_block("a", vec![1, 2, 3])
            .raw_block("b", vec![4, 5])
            .finish()
            .unwrap();
        let header = AssetHeader::parse(&payload).unwrap();
        let a = header.block("a").unwrap().unwrap();
        let b = header.block("b").unwrap().unwrap();
        assert_eq!((a.offset, a.size), (0, 3));
        assert_eq!((b.offset, b.size), (3, 2));
        assert_eq!(&payload[header.body_start() + b.offset..], &[4, 5]);
    }

    #[test]
    fn oversized_hull_is_rejected() {
        let convex = ConvexData {
            bounding_hull: Vec::new(),
            hulls: vec![vec![Vec3::ZERO; 257]],
        };
        assert!(matches!(
            MeshAssetWriter::new().convex(&convex).finish(),
            Err(DecodeError::InvalidHullSize(257))
        ));
    }

    #[test]
    fn hull_of_256_uses_zero_marker() {
        let convex = ConvexData {
            bounding_hull: Vec::new(),
            hulls: vec![vec![Vec3::ONE; 256]],
        };
        let value = convex.to_llsd().unwrap();
        assert_eq!(value.get("HullList"), Some(&Value::Binary(vec![0])));
    }
}
