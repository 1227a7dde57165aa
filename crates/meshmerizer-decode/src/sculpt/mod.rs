//! Sculpted shapes: a texture whose pixels encode vertex positions.
//!
//! [`SculptMap`] samples the texture into a [`SculptSample`] grid, and
//! [`build_sculpt_mesh`] stitches the grid into one of four closed or open
//! surfaces.

mod map;
mod topology;

pub use map::{SculptMap, SculptSample};
pub use topology::build_sculpt_mesh;

/// Sculpt-type bit that flips the surface inside out.
pub const SCULPT_INVERT: u8 = 0x40;
/// Sculpt-type bit that mirrors the surface along X.
pub const SCULPT_MIRROR: u8 = 0x80;
/// Sculpt-type bits that select the topology.
pub const SCULPT_TYPE_MASK: u8 = 0x07;

/// Surface a sculpt grid is assembled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SculptTopology {
    Sphere,
    Torus,
    Plane,
    Cylinder,
}

impl SculptTopology {
    /// Topology encoded in the low bits of a sculpt-type byte. Unknown values
    /// fall back to a plane.
    #[must_use]
    pub fn from_sculpt_type(sculpt_type: u8) -> Self {
        match sculpt_type & SCULPT_TYPE_MASK {
            1 => Self::Sphere,
            2 => Self::Torus,
            4 => Self::Cylinder,
            _ => Self::Plane,
        }
    }

    /// Whether the grid wraps around horizontally.
    #[must_use]
    pub fn wraps(self) -> bool {
        self != Self::Plane
    }
}

/// How to assemble a sculpt grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SculptOptions {
    pub topology: SculptTopology,
    pub mirror: bool,
    pub invert: bool,
    /// Also produce per-vertex normals and UVs.
    pub normals_and_uvs: bool,
}

impl SculptOptions {
    /// Options decoded from a raw sculpt-type byte.
    #[must_use]
    pub fn from_sculpt_type(sculpt_type: u8) -> Self {
        Self {
            topology: SculptTopology::from_sculpt_type(sculpt_type),
            mirror: sculpt_type & SCULPT_MIRROR != 0,
            invert: sculpt_type & SCULPT_INVERT != 0,
            normals_and_uvs: false,
        }
    }
}
