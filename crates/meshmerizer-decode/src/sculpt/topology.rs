//! Assembling sampled sculpt grids into surfaces.

use glam::{Vec2, Vec3};

use super::map::SculptSample;
use super::{SculptOptions, SculptTopology};
use crate::error::{DecodeError, DecodeResult};
use crate::mesh::Mesh;

/// Build a surface from a sampled grid.
///
/// Wrapping topologies close the horizontal seam, spheres collapse their
/// first and last rows to poles, and tori repeat the first row at the end.
/// Mirroring reverses the winding in addition to flipping X, so a mirrored
/// and inverted sculpt keeps its original orientation.
pub fn build_sculpt_mesh(sample: SculptSample, options: &SculptOptions) -> DecodeResult<Mesh> {
    if sample.width() < 2 || sample.height() < 2 {
        return Err(DecodeError::DegenerateGrid {
            width: sample.width(),
            height: sample.height(),
        });
    }
    let invert = options.invert != options.mirror;
    let width = sample.width();

    let rows = sample.into_rows();
    let rows = match options.topology {
        SculptTopology::Plane => plane(rows),
        SculptTopology::Cylinder => cylinder(rows),
        SculptTopology::Sphere => sphere(rows, width),
        SculptTopology::Torus => torus(rows),
    };

    let down = rows.len();
    let across = rows[0].len();
    let vertices: Vec<Vec3> = rows.into_iter().flatten().collect();
    let triangles = grid_triangles(across, down, invert)?;

    let mut mesh = Mesh::new(vertices, triangles);
    if options.normals_and_uvs {
        mesh.normals = Some(vertex_normals(
            &mesh.vertices,
            &mesh.triangles,
            across,
            down,
            options.topology.wraps(),
        ));
        mesh.uvs = Some(grid_uvs(across, down));
    }
    tracing::trace!(
        "Built {:?} sculpt: {across}x{down} grid, {} triangles",
        options.topology,
        mesh.triangle_count()
    );
    Ok(mesh)
}

type Rows = Vec<Vec<Vec3>>;

/// Open sheet, used as sampled.
fn plane(rows: Rows) -> Rows {
    rows
}

/// Tube closed along its vertical seam.
fn cylinder(mut rows: Rows) -> Rows {
    close_seam(&mut rows);
    rows
}

/// Tube whose top and bottom collapse to poles. `width` is the sampled row
/// length before the seam was closed.
fn sphere(rows: Rows, width: usize) -> Rows {
    let mut rows = cylinder(rows);
    add_poles(&mut rows, width);
    rows
}

/// Tube bent into a ring by repeating its first row.
fn torus(rows: Rows) -> Rows {
    let mut rows = cylinder(rows);
    let first = rows[0].clone();
    rows.push(first);
    rows
}

/// Make the first and last column of every row coincide.
fn close_seam(rows: &mut [Vec<Vec3>]) {
    if rows.len().is_multiple_of(2) {
        for row in rows.iter_mut() {
            let first = row[0];
            row.push(first);
        }
    } else {
        for row in rows.iter_mut() {
            let last = row[row.len() - 1];
            row[0] = last;
        }
    }
}

/// Collapse the top and bottom of the grid to single points.
///
/// Poles are sampled at the middle of the unstitched first and last rows.
fn add_poles(rows: &mut Rows, width: usize) {
    let across = rows[0].len();
    let last = rows.len() - 1;
    let top = rows[0][width / 2];
    let bottom = rows[last][width / 2];

    if rows.len().is_multiple_of(2) {
        rows.insert(0, vec![top; across]);
        rows.push(vec![bottom; across]);
    } else {
        rows[0] = vec![top; across];
        rows[last] = vec![bottom; across];
    }
}

#[allow(clippy::cast_possible_truncation)]
fn grid_triangles(across: usize, down: usize, invert: bool) -> DecodeResult<Vec<[u32; 3]>> {
    if u32::try_from(across * down).is_err() {
        return Err(DecodeError::TooManyVertices);
    }
    let index = |i: usize| i as u32;

    let mut triangles = Vec::with_capacity((across - 1) * (down - 1) * 2);
    for y in 1..down {
        for x in 1..across {
            let p4 = y * across + x;
            let p3 = p4 - 1;
            let p2 = p4 - across;
            let p1 = p3 - across;
            let [p1, p2, p3, p4] = [p1, p2, p3, p4].map(index);
            if invert {
                triangles.push([p1, p4, p3]);
                triangles.push([p1, p2, p4]);
            } else {
                triangles.push([p1, p3, p4]);
                triangles.push([p1, p4, p2]);
            }
        }
    }
    Ok(triangles)
}

fn vertex_normals(
    vertices: &[Vec3],
    triangles: &[[u32; 3]],
    across: usize,
    down: usize,
    wraps: bool,
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for &[a, b, c] in triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let face = (vertices[b] - vertices[a])
            .cross(vertices[c] - vertices[a])
            .normalize_or_zero();
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }

    // Seam vertices share one normal so lighting is continuous across it.
    if wraps {
        for row in 0..down {
            let first = row * across;
            let last = first + across - 1;
            let blended = (normals[first] + normals[last]).normalize_or_zero();
            normals[first] = blended;
            normals[last] = blended;
        }
    }
    normals
}

#[allow(clippy::cast_precision_loss)]
fn grid_uvs(across: usize, down: usize) -> Vec<Vec2> {
    let u_step = 1.0 / (across - 1) as f32;
    let v_step = 1.0 / (down - 1) as f32;
    (0..down)
        .flat_map(|y| (0..across).map(move |x| Vec2::new(x as f32 * u_step, y as f32 * v_step)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn options(topology: SculptTopology) -> SculptOptions {
        SculptOptions {
            topology,
            mirror: false,
            invert: false,
            normals_and_uvs: false,
        }
    }

    /// Grid whose samples are all distinct.
    #[allow(clippy::cast_precision_loss)]
    fn distinct(width: usize, height: usize) -> SculptSample {
        let offsets = (0..height)
            .flat_map(|y| (0..width).map(move |x| Vec3::new(x as f32, y as f32, (x * y) as f32)))
            .collect();
        SculptSample::new(width, height, offsets).unwrap()
    }

    /// Flat grid in the XY plane.
    #[allow(clippy::cast_precision_loss)]
    fn flat(width: usize, height: usize) -> SculptSample {
        let offsets = (0..height)
            .flat_map(|y| (0..width).map(move |x| Vec3::new(x as f32, y as f32, 0.0)))
            .collect();
        SculptSample::new(width, height, offsets).unwrap()
    }

    #[test]
    fn each_topology_reshapes_the_rows() {
        let rows = || distinct(4, 3).into_rows();
        assert_eq!(plane(rows()), rows());
        // Three rows: the seam overwrites the first column.
        let seamed = cylinder(rows());
        assert!(seamed.iter().all(|row| row.len() == 4 && row[0] == row[3]));
        assert_eq!(sphere(rows(), 4).len(), 3);
        let ring = torus(rows());
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[3], ring[0]);
    }

    #[test]
    fn plane_is_a_plain_grid() {
        let mesh = build_sculpt_mesh(distinct(3, 3), &options(SculptTopology::Plane)).unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.triangles[0], [0, 3, 4]);
        assert_eq!(mesh.triangles[1], [0, 4, 1]);
        assert!(mesh.normals.is_none());
        assert!(mesh.uvs.is_none());
    }

    #[test]
    fn tiny_grid_is_rejected() {
        assert!(matches!(
            build_sculpt_mesh(distinct(1, 4), &options(SculptTopology::Plane)),
            Err(DecodeError::DegenerateGrid {
                width: 1,
                height: 4
            })
        ));
    }

    #[test]
    fn even_rows_append_seam_column() {
        let mesh = build_sculpt_mesh(distinct(4, 4), &options(SculptTopology::Cylinder)).unwrap();
        assert_eq!(mesh.vertex_count(), 5 * 4);
        assert_eq!(mesh.vertices[4], mesh.vertices[0]);
    }

    #[test]
    fn odd_rows_overwrite_first_column() {
        let mesh = build_sculpt_mesh(distinct(4, 3), &options(SculptTopology::Cylinder)).unwrap();
        assert_eq!(mesh.vertex_count(), 4 * 3);
        assert_eq!(mesh.vertices[4], Vec3::new(3.0, 1.0, 3.0));
        assert_eq!(mesh.vertices[4], mesh.vertices[7]);
    }

    #[test]
    fn sphere_with_even_rows_gains_pole_rows() {
        let mesh = build_sculpt_mesh(distinct(4, 4), &options(SculptTopology::Sphere)).unwrap();
        // 4 rows + 2 pole rows, each stitched to 5 columns.
        assert_eq!(mesh.vertex_count(), 5 * 6);
        let top = Vec3::new(2.0, 0.0, 0.0);
        let bottom = Vec3::new(2.0, 3.0, 6.0);
        assert!(mesh.vertices[..5].iter().all(|&v| v == top));
        assert!(mesh.vertices[25..].iter().all(|&v| v == bottom));
        // The original first row survives below the pole.
        assert_eq!(mesh.vertices[5], Vec3::ZERO);
    }

    #[test]
    fn sphere_with_odd_rows_overwrites_end_rows() {
        let mesh = build_sculpt_mesh(distinct(5, 5), &options(SculptTopology::Sphere)).unwrap();
        assert_eq!(mesh.vertex_count(), 25);
        let (top, bottom) = (&mesh.vertices[..5], &mesh.vertices[20..]);
        assert!(top.iter().all(|&v| v == Vec3::new(2.0, 0.0, 0.0)));
        assert!(bottom.iter().all(|&v| v == Vec3::new(2.0, 4.0, 8.0)));
    }

    #[test]
    fn torus_repeats_first_row() {
        let mesh = build_sculpt_mesh(distinct(3, 3), &options(SculptTopology::Torus)).unwrap();
        assert_eq!(mesh.vertex_count(), 3 * 4);
        assert_eq!(mesh.vertices[9..], mesh.vertices[..3]);
    }

    #[test]
    fn invert_reverses_winding_and_mirror_cancels_it() {
        let plain = build_sculpt_mesh(distinct(3, 3), &options(SculptTopology::Plane)).unwrap();
        let inverted = build_sculpt_mesh(
            distinct(3, 3),
            &SculptOptions {
                invert: true,
                ..options(SculptTopology::Plane)
            },
        )
        .unwrap();
        for (a, b) in plain.triangles.iter().zip(&inverted.triangles) {
            assert_eq!([a[0], a[2], a[1]], *b);
        }

        let both = build_sculpt_mesh(
            distinct(3, 3),
            &SculptOptions {
                invert: true,
                mirror: true,
                ..options(SculptTopology::Plane)
            },
        )
        .unwrap();
        assert_eq!(both.triangles, plain.triangles);
    }

    #[test]
    fn flat_plane_normals_and_uvs() {
        let build = |invert| {
            build_sculpt_mesh(
                flat(3, 3),
                &SculptOptions {
                    invert,
                    normals_and_uvs: true,
                    ..options(SculptTopology::Plane)
                },
            )
            .unwrap()
        };
        let mesh = build(false);
        let normals = mesh.normals.as_ref().unwrap();
        assert!(normals.iter().all(|n| (*n - Vec3::NEG_Z).length() < 1e-5));

        let flipped = build(true).normals.unwrap();
        assert!(flipped.iter().all(|n| (*n - Vec3::Z).length() < 1e-5));

        let uvs = mesh.uvs.unwrap();
        assert_eq!(uvs[0], Vec2::ZERO);
        assert_eq!(uvs[4], Vec2::new(0.5, 0.5));
        assert_eq!(uvs[8], Vec2::ONE);
    }

    proptest! {
        #[test]
        fn wrapped_seams_close(
            width in 2usize..12,
            height in 2usize..12,
            topology in prop_oneof![
                Just(SculptTopology::Cylinder),
                Just(SculptTopology::Sphere),
                Just(SculptTopology::Torus),
            ],
        ) {
            let mesh = build_sculpt_mesh(
                distinct(width, height),
                &SculptOptions { normals_and_uvs: true, ..options(topology) },
            ).unwrap();
            let uvs = mesh.uvs.as_ref().unwrap();
            let across = uvs.iter().filter(|uv| uv.y == 0.0).count();
            let down = mesh.vertex_count() / across;
            prop_assert_eq!(across * down, mesh.vertex_count());
            prop_assert_eq!(mesh.triangle_count(), (across - 1) * (down - 1) * 2);

            let normals = mesh.normals.as_ref().unwrap();
            for row in 0..down {
                let first = row * across;
                let last = first + across - 1;
                prop_assert_eq!(mesh.vertices[first], mesh.vertices[last]);
                prop_assert_eq!(normals[first], normals[last]);
            }
            let max_index = mesh.triangles.iter().flatten().copied().max().unwrap();
            prop_assert!((max_index as usize) < mesh.vertex_count());
        }
    }
}
