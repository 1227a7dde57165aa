//! Box proxies for shapes too small to be worth a full mesh.

use glam::Vec3;

use crate::mesh::Mesh;

/// Which axes take the max value: the bottom face walked from the min
/// corner, then the top face in the same order.
const CORNERS: [[bool; 3]; 8] = [
    [false, false, false],
    [true, false, false],
    [true, true, false],
    [false, true, false],
    [false, false, true],
    [true, false, true],
    [true, true, true],
    [false, true, true],
];

/// Two outward-facing triangles per side.
const BOX_TRIANGLES: [[u32; 3]; 12] = [
    // -Z
    [0, 2, 1],
    [0, 3, 2],
    // +Z
    [4, 5, 6],
    [4, 6, 7],
    // -Y
    [0, 1, 5],
    [0, 5, 4],
    // +Y
    [3, 7, 6],
    [3, 6, 2],
    // -X
    [0, 4, 7],
    [0, 7, 3],
    // +X
    [1, 2, 6],
    [1, 6, 5],
];

/// Axis-aligned box centered on the origin with the given extent.
#[must_use]
pub fn bounding_box_mesh(size: Vec3) -> Mesh {
    let half = size * 0.5;
    box_mesh(-half, half)
}

/// Axis-aligned box spanning `min..max`: 8 vertices, 12 triangles.
#[must_use]
pub fn box_mesh(min: Vec3, max: Vec3) -> Mesh {
    let vertices = CORNERS
        .iter()
        .map(|&[x, y, z]| Vec3::select(glam::BVec3::new(x, y, z), max, min))
        .collect();
    Mesh::new(vertices, BOX_TRIANGLES.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_eight_corners_and_twelve_triangles() {
        let mesh = bounding_box_mesh(Vec3::new(0.1, 0.2, 0.05));
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-0.05, -0.1, -0.025));
        assert_eq!(bounds.max, Vec3::new(0.05, 0.1, 0.025));
        assert_eq!(bounds.center(), Vec3::ZERO);
    }

    #[test]
    fn faces_point_outward() {
        let mesh = box_mesh(Vec3::splat(1.0), Vec3::new(2.0, 3.0, 4.0));
        let center = mesh.bounds().unwrap().center();
        for &[a, b, c] in &mesh.triangles {
            let [a, b, c] = [a, b, c].map(|i| mesh.vertices[i as usize]);
            let normal = (b - a).cross(c - a);
            let face_center = (a + b + c) / 3.0;
            assert!(
                normal.dot(face_center - center) > 0.0,
                "triangle {a} {b} {c} faces inward"
            );
        }
    }

    #[test]
    fn every_corner_is_used() {
        let mesh = bounding_box_mesh(Vec3::ONE);
        let mut used = [0; 8];
        for index in mesh.triangles.iter().flatten() {
            used[*index as usize] += 1;
        }
        assert!(used.iter().all(|&n| n >= 3));
    }
}
