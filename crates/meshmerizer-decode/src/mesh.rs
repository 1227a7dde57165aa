//! The mesh produced by every construction path.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::convex::ConvexHulls;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A triangle mesh.
///
/// Triangles index into `vertices`; winding is counter-clockwise when seen
/// from outside, so `(b - a).cross(c - a)` points outward. Normals and UVs,
/// when present, have one entry per vertex. Convex hull data is kept in its
/// own domain units and scaled on request through [`Mesh::bounding_hull`]
/// and [`Mesh::convex_hulls`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    pub hulls: Option<ConvexHulls>,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when there is nothing to collide with.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        let first = *self.vertices.first()?;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        Some(Aabb { min, max })
    }

    /// Mean of all vertex positions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<Vec3> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum: Vec3 = self.vertices.iter().copied().sum();
        Some(sum / self.vertices.len() as f32)
    }

    /// Positions as a flat `[x0, y0, z0, x1, ...]` buffer.
    #[must_use]
    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }

    /// Triangle indices as a flat buffer.
    #[must_use]
    pub fn indices_flat(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    /// Scale positions component-wise. Normals are corrected for non-uniform
    /// scale; hulls are untouched since they are scaled on access.
    pub fn scale(&mut self, size: Vec3) {
        for v in &mut self.vertices {
            *v *= size;
        }
        if let Some(normals) = &mut self.normals {
            let inverse = size.recip();
            for n in normals {
                *n = (*n * inverse).normalize_or_zero();
            }
        }
    }

    /// Copy with bit-identical positions merged and degenerate triangles
    /// dropped. Only meaningful without per-vertex attributes, which are
    /// not carried over.
    #[must_use]
    pub fn welded(&self) -> Self {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(self.vertices.len());
        let mut vertices = Vec::with_capacity(self.vertices.len());
        let mut remap = Vec::with_capacity(self.vertices.len());
        for v in &self.vertices {
            // Adding zero folds -0.0 into 0.0.
            let key = (*v + Vec3::ZERO).to_array().map(f32::to_bits);
            let next = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
            let index = *lookup.entry(key).or_insert_with(|| {
                vertices.push(*v);
                next
            });
            remap.push(index);
        }

        let triangles = self
            .triangles
            .iter()
            .filter_map(|tri| {
                let [a, b, c] = tri.map(|i| remap.get(i as usize).copied());
                let (a, b, c) = (a?, b?, c?);
                (a != b && b != c && a != c).then_some([a, b, c])
            })
            .collect();

        Self {
            vertices,
            triangles,
            normals: None,
            uvs: None,
            hulls: self.hulls.clone(),
        }
    }

    /// Bounding hull points scaled by `size`, if the mesh carries one.
    #[must_use]
    pub fn bounding_hull(&self, size: Vec3) -> Option<Vec<Vec3>> {
        self.hulls.as_ref()?.scaled_bounding_hull(size)
    }

    /// Convex sub-hulls scaled by `size`, if the mesh carries them.
    #[must_use]
    pub fn convex_hulls(&self, size: Vec3) -> Option<Vec<Vec<Vec3>>> {
        self.hulls.as_ref()?.scaled_hulls(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn bounds_and_centroid() {
        let mesh = quad();
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(bounds.center(), Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(mesh.centroid(), Some(Vec3::new(0.5, 0.5, 0.0)));

        assert_eq!(Mesh::default().bounds(), None);
        assert_eq!(Mesh::default().centroid(), None);
    }

    #[test]
    fn flat_buffers() {
        let mesh = quad();
        assert_eq!(mesh.positions_flat().len(), 12);
        assert_eq!(&mesh.positions_flat()[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(mesh.indices_flat(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn scale_is_component_wise() {
        let mut mesh = quad();
        mesh.normals = Some(vec![Vec3::new(1.0, 1.0, 0.0).normalize(); 4]);
        mesh.scale(Vec3::new(2.0, 4.0, 1.0));
        assert_eq!(mesh.vertices[2], Vec3::new(2.0, 4.0, 0.0));
        let n = mesh.normals.as_ref().unwrap()[0];
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!(n.x > n.y, "normal should lean toward the less stretched axis");
    }

    #[test]
    fn weld_merges_duplicates_and_drops_degenerates() {
        let mesh = Mesh::new(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::new(-0.0, 0.0, 0.0),
                Vec3::X,
            ],
            vec![[0, 1, 2], [3, 4, 2], [0, 3, 1], [0, 1, 9]],
        );
        let welded = mesh.welded();
        assert_eq!(welded.vertices, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(welded.triangles, vec![[0, 1, 2], [0, 1, 2]]);
    }
}
