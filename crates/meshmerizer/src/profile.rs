//! Extrusion parameters for primitive shapes.
//!
//! Primitives arrive as quantized integers. [`ProfileParams::new`] turns them
//! into the profile and path values a [`ProfileMesher`] extrudes. The
//! extrusion itself is supplied by the host.

use glam::Vec2;
use meshmerizer_decode::Mesh;

use crate::shape::{LevelOfDetail, PrimShape};

pub const PATH_CURVE_LINE: u8 = 0x10;
pub const PATH_CURVE_CIRCLE: u8 = 0x20;
pub const PATH_CURVE_CIRCLE_2: u8 = 0x30;
pub const PATH_CURVE_TEST: u8 = 0x40;
pub const PATH_CURVE_FLEXIBLE: u8 = 0x80;

pub const PROFILE_CIRCLE: u8 = 0;
pub const PROFILE_SQUARE: u8 = 1;
pub const PROFILE_ISOMETRIC_TRIANGLE: u8 = 2;
pub const PROFILE_EQUILATERAL_TRIANGLE: u8 = 3;
pub const PROFILE_RIGHT_TRIANGLE: u8 = 4;
pub const PROFILE_HALF_CIRCLE: u8 = 5;

pub const HOLLOW_SAME: u8 = 0x00;
pub const HOLLOW_CIRCLE: u8 = 0x10;
pub const HOLLOW_SQUARE: u8 = 0x20;
pub const HOLLOW_TRIANGLE: u8 = 0x30;

const PROFILE_SHAPE_MASK: u8 = 0x07;
const HOLLOW_SHAPE_MASK: u8 = 0xF0;
const CUT_QUANTUM: f32 = 2.0e-5;
const MAX_HOLLOW: f32 = 0.95;

/// How the profile is swept along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extrusion {
    /// Straight sweep, used by boxes, cylinders and prisms.
    Linear {
        /// Twist at each end, in degrees.
        twist_begin: i32,
        twist_end: i32,
        /// Top scale relative to the bottom, per axis.
        taper: Vec2,
    },
    /// Revolution around an axis, used by spheres, tori, tubes and rings.
    Circular {
        hole_size: Vec2,
        radius: f32,
        revolutions: f32,
        skew: f32,
        /// Twist at each end, in degrees.
        twist_begin: i32,
        twist_end: i32,
        taper: Vec2,
    },
}

/// Decoded extrusion parameters for one primitive at one level of detail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    pub sides: u32,
    pub hollow_sides: u32,
    pub profile_begin: f32,
    pub profile_end: f32,
    pub hollow: f32,
    pub path_begin: f32,
    pub path_end: f32,
    pub top_shear: Vec2,
    pub extrusion: Extrusion,
}

fn circle_sides(lod: LevelOfDetail) -> u32 {
    match lod {
        LevelOfDetail::High => 24,
        LevelOfDetail::Medium => 12,
        LevelOfDetail::Low => 6,
        LevelOfDetail::VeryLow => 3,
    }
}

/// Shear is stored as a signed byte in an unsigned field.
fn shear(value: u8) -> f32 {
    f32::from(i8::from_ne_bytes([value])) * 0.01
}

impl ProfileParams {
    #[must_use]
    pub fn new(shape: &PrimShape, lod: LevelOfDetail) -> Self {
        let profile_shape = shape.profile_curve & PROFILE_SHAPE_MASK;
        let hollow_shape = shape.profile_curve & HOLLOW_SHAPE_MASK;

        let mut profile_begin = f32::from(shape.profile_begin) * CUT_QUANTUM;
        let mut profile_end = 1.0 - f32::from(shape.profile_end) * CUT_QUANTUM;
        let hollow = (f32::from(shape.profile_hollow) * CUT_QUANTUM).min(MAX_HOLLOW);

        let sides = match profile_shape {
            PROFILE_EQUILATERAL_TRIANGLE => 3,
            PROFILE_CIRCLE => circle_sides(lod),
            PROFILE_HALF_CIRCLE => {
                profile_begin = 0.5 * profile_begin + 0.5;
                profile_end = 0.5 * profile_end + 0.5;
                circle_sides(lod)
            }
            _ => 4,
        };

        let hollow_sides = match hollow_shape {
            HOLLOW_CIRCLE => circle_sides(lod),
            HOLLOW_SQUARE => 4,
            HOLLOW_TRIANGLE if profile_shape == PROFILE_HALF_CIRCLE => 6,
            HOLLOW_TRIANGLE => 3,
            _ => sides,
        };

        if profile_begin < 0.0 || profile_begin >= profile_end || profile_end > 1.0 {
            tracing::warn!(
                "Corrupt prim: profile cut {profile_begin}..{profile_end} is out of range"
            );
            profile_begin = profile_begin.max(0.0);
            profile_end = profile_end.min(1.0);
        }

        let extrusion = if matches!(shape.path_curve, PATH_CURVE_LINE | PATH_CURVE_FLEXIBLE) {
            Extrusion::Linear {
                twist_begin: i32::from(shape.path_twist_begin) * 18 / 10,
                twist_end: i32::from(shape.path_twist) * 18 / 10,
                taper: Vec2::new(
                    (f32::from(shape.path_scale_x) - 100.0) * 0.01,
                    (f32::from(shape.path_scale_y) - 100.0) * 0.01,
                ),
            }
        } else {
            Extrusion::Circular {
                hole_size: Vec2::new(
                    (200.0 - f32::from(shape.path_scale_x)) * 0.01,
                    (200.0 - f32::from(shape.path_scale_y)) * 0.01,
                ),
                radius: f32::from(shape.path_radius_offset) * 0.01,
                revolutions: 1.0 + f32::from(shape.path_revolutions) * 0.015,
                skew: f32::from(shape.path_skew) * 0.01,
                twist_begin: i32::from(shape.path_twist_begin) * 36 / 10,
                twist_end: i32::from(shape.path_twist) * 36 / 10,
                taper: Vec2::new(
                    f32::from(shape.path_taper_x) * 0.01,
                    f32::from(shape.path_taper_y) * 0.01,
                ),
            }
        };

        Self {
            sides,
            hollow_sides,
            profile_begin,
            profile_end,
            hollow,
            path_begin: f32::from(shape.path_begin) * CUT_QUANTUM,
            path_end: 1.0 - f32::from(shape.path_end) * CUT_QUANTUM,
            top_shear: Vec2::new(shear(shape.path_shear_x), shear(shape.path_shear_y)),
            extrusion,
        }
    }
}

/// Error type returned by a [`ProfileMesher`].
pub type ProfileMesherError = Box<dyn std::error::Error + Send + Sync>;

/// Host-supplied extruder for primitive shapes.
///
/// Implementations return a mesh of unit size; the caller applies the
/// object's scale.
pub trait ProfileMesher: Send + Sync {
    fn extrude(&self, params: &ProfileParams) -> Result<Mesh, ProfileMesherError>;
}

impl<F> ProfileMesher for F
where
    F: Fn(&ProfileParams) -> Result<Mesh, ProfileMesherError> + Send + Sync,
{
    fn extrude(&self, params: &ProfileParams) -> Result<Mesh, ProfileMesherError> {
        self(params)
    }
}
