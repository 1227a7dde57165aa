//! Convex decomposition decoding.
//!
//! The `physics_convex` block carries two independent pieces:
//!
//! - `BoundingVerts`: one convex hull around the whole object
//! - `HullList` + `Positions`: a decomposition into convex sub-hulls. Each
//!   `HullList` byte is a hull's vertex count (`0` meaning 256); the hulls'
//!   points are read back to back from the single `Positions` stream.
//!
//! All points are quantized against the block's `Min`/`Max` domain.

use glam::Vec3;
use meshmerizer_llsd::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::quantize::{PositionDomain, dequantize_positions, u16_triples};

/// Bounding hull and sub-hull list of an uploaded mesh, in domain units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexHulls {
    pub bounding_hull: Option<Vec<Vec3>>,
    pub hulls: Option<Vec<Vec<Vec3>>>,
}

/// Vertex count encoded by one `HullList` byte.
#[must_use]
pub fn hull_vertex_count(marker: u8) -> usize {
    if marker == 0 { 256 } else { usize::from(marker) }
}

impl ConvexHulls {
    /// Decode a decompressed `physics_convex` block.
    pub fn decode(block: &Value) -> DecodeResult<Self> {
        if block.as_map().is_none() {
            return Err(DecodeError::InvalidBlock(crate::CONVEX_BLOCK.to_owned()));
        }
        let default = PositionDomain::default();
        let domain = PositionDomain::new(
            block
                .get("Min")
                .and_then(Value::as_vec3)
                .map_or(default.min, Vec3::from_array),
            block
                .get("Max")
                .and_then(Value::as_vec3)
                .map_or(default.max, Vec3::from_array),
        );

        let bounding_hull = block
            .get("BoundingVerts")
            .and_then(Value::as_binary)
            .map(|bytes| dequantize_positions(bytes, &domain));

        let hulls = match block.get("HullList").and_then(Value::as_binary) {
            Some(list) => {
                let positions = block
                    .get("Positions")
                    .and_then(Value::as_binary)
                    .ok_or(DecodeError::MissingField("Positions"))?;
                Some(decode_hull_list(list, positions, &domain)?)
            }
            None => None,
        };

        Ok(Self {
            bounding_hull,
            hulls,
        })
    }

    /// Number of sub-hulls in the decomposition.
    #[must_use]
    pub fn hull_count(&self) -> usize {
        self.hulls.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn scaled_bounding_hull(&self, size: Vec3) -> Option<Vec<Vec3>> {
        self.bounding_hull
            .as_ref()
            .map(|hull| hull.iter().map(|p| *p * size).collect())
    }

    #[must_use]
    pub fn scaled_hulls(&self, size: Vec3) -> Option<Vec<Vec<Vec3>>> {
        self.hulls.as_ref().map(|hulls| {
            hulls
                .iter()
                .map(|hull| hull.iter().map(|p| *p * size).collect())
                .collect()
        })
    }
}

fn decode_hull_list(
    list: &[u8],
    positions: &[u8],
    domain: &PositionDomain,
) -> DecodeResult<Vec<Vec<Vec3>>> {
    let needed: usize = list.iter().map(|&m| hull_vertex_count(m)).sum();
    let available = positions.len() / 6;
    if needed > available {
        return Err(DecodeError::TruncatedHullPositions { needed, available });
    }

    let mut points = u16_triples(positions).map(|q| domain.dequantize(q));
    Ok(list
        .iter()
        .map(|&marker| points.by_ref().take(hull_vertex_count(marker)).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::quantize_positions;
    use meshmerizer_llsd::Map;

    fn block(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<Map>(),
        )
    }

    #[test]
    fn zero_marker_means_256() {
        assert_eq!(hull_vertex_count(0), 256);
        assert_eq!(hull_vertex_count(1), 1);
        assert_eq!(hull_vertex_count(255), 255);
    }

    #[test]
    fn sentinel_hull_consumes_256_points() {
        let domain = PositionDomain::default();
        let big: Vec<Vec3> = (0..256u16)
            .map(|i| Vec3::new(f32::from(i) / 512.0, 0.25, -0.25))
            .collect();
        let small = vec![Vec3::splat(0.5), Vec3::splat(-0.5), Vec3::ZERO];
        let mut all = big.clone();
        all.extend(&small);

        let block = block(vec![
            ("HullList", Value::Binary(vec![0, 3])),
            ("Positions", Value::Binary(quantize_positions(&all, &domain))),
        ]);
        let hulls = ConvexHulls::decode(&block).unwrap();
        let list = hulls.hulls.as_ref().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].len(), 256);
        assert_eq!(list[1].len(), 3);
        assert!((list[1][0] - Vec3::splat(0.5)).abs().max_element() < 1e-4);
        assert!((list[0][255] - big[255]).abs().max_element() < 1e-4);
        assert_eq!(hulls.bounding_hull, None);
    }

    #[test]
    fn bounding_hull_uses_min_max() {
        let domain = PositionDomain::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let points = vec![Vec3::new(2.0, -2.0, 1.0), Vec3::new(-1.0, 0.0, 2.0)];
        let block = block(vec![
            ("Min", Value::vec3([-2.0; 3])),
            ("Max", Value::vec3([2.0; 3])),
            (
                "BoundingVerts",
                Value::Binary(quantize_positions(&points, &domain)),
            ),
        ]);
        let hulls = ConvexHulls::decode(&block).unwrap();
        let hull = hulls.bounding_hull.as_ref().unwrap();
        assert_eq!(hull.len(), 2);
        assert!((hull[0] - points[0]).abs().max_element() < 1e-3);
        assert_eq!(hulls.hull_count(), 0);

        let size = Vec3::new(1.0, 2.0, 3.0);
        let scaled = hulls.scaled_bounding_hull(size).unwrap();
        assert!((scaled[0] - Vec3::new(2.0, -4.0, 3.0)).abs().max_element() < 1e-2);
    }

    #[test]
    fn truncated_positions_are_rejected() {
        let block = block(vec![
            ("HullList", Value::Binary(vec![4])),
            ("Positions", Value::Binary(vec![0; 6 * 3])),
        ]);
        assert!(matches!(
            ConvexHulls::decode(&block),
            Err(DecodeError::TruncatedHullPositions {
                needed: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn hull_list_requires_positions() {
        let block = block(vec![("HullList", Value::Binary(vec![4]))]);
        assert!(matches!(
            ConvexHulls::decode(&block),
            Err(DecodeError::MissingField("Positions"))
        ));
    }
}
