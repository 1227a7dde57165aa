//! 16-bit fixed-point coordinate quantization.
//!
//! Uploaded mesh assets store every coordinate as a `u16` spread evenly over
//! a per-block domain `[min, max]`. Decoding is lossy: a value comes back
//! within one quantization step, `(max - min) / 65535`, of what was encoded.

use glam::Vec3;

const U16_MAX: f32 = 65535.0;

/// Axis-aligned range a block's quantized positions are spread over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionDomain {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for PositionDomain {
    /// The unit cube centered at the origin.
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl PositionDomain {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest domain containing all `points`, or the default for none.
    #[must_use]
    pub fn enclosing(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Self { min, max }
    }

    /// Expand one quantized triple into this domain.
    #[must_use]
    pub fn dequantize(&self, q: [u16; 3]) -> Vec3 {
        Vec3::new(
            dequantize(q[0], self.min.x, self.max.x),
            dequantize(q[1], self.min.y, self.max.y),
            dequantize(q[2], self.min.z, self.max.z),
        )
    }

    /// Quantize one point into this domain.
    #[must_use]
    pub fn quantize(&self, p: Vec3) -> [u16; 3] {
        [
            quantize(p.x, self.min.x, self.max.x),
            quantize(p.y, self.min.y, self.max.y),
            quantize(p.z, self.min.z, self.max.z),
        ]
    }
}

/// Expand a quantized value: `lower + (q / 65535) * (upper - lower)`.
///
/// Results closer to zero than one quantization step are snapped to exactly
/// zero, so a domain symmetric about the origin reproduces zero faithfully.
#[must_use]
pub fn dequantize(q: u16, lower: f32, upper: f32) -> f32 {
    let delta = upper - lower;
    let value = f32::from(q) / U16_MAX * delta + lower;
    let max_error = delta / U16_MAX;
    if value.abs() < max_error.abs() {
        0.0
    } else {
        value
    }
}

/// Quantize `value` to the nearest step of `[lower, upper]`, clamping.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(value: f32, lower: f32, upper: f32) -> u16 {
    let delta = upper - lower;
    if delta == 0.0 || !delta.is_finite() {
        return 0;
    }
    let t = ((value - lower) / delta).clamp(0.0, 1.0);
    if t.is_nan() {
        return 0;
    }
    (t * U16_MAX).round() as u16
}

/// Iterate packed little-endian `u16×3` triples. Trailing bytes that do not
/// form a whole triple are ignored.
pub fn u16_triples(bytes: &[u8]) -> impl Iterator<Item = [u16; 3]> + '_ {
    bytes.chunks_exact(6).map(|chunk| {
        [
            u16::from_le_bytes([chunk[0], chunk[1]]),
            u16::from_le_bytes([chunk[2], chunk[3]]),
            u16::from_le_bytes([chunk[4], chunk[5]]),
        ]
    })
}

/// Decode a packed position array against `domain`.
#[must_use]
pub fn dequantize_positions(bytes: &[u8], domain: &PositionDomain) -> Vec<Vec3> {
    u16_triples(bytes).map(|q| domain.dequantize(q)).collect()
}

/// Pack `points` as little-endian `u16×3` triples quantized against `domain`.
#[must_use]
pub fn quantize_positions(points: &[Vec3], domain: &PositionDomain) -> Vec<u8> {
    let mut out = Vec::with_capacity(points.len() * 6);
    for point in points {
        for q in domain.quantize(*point) {
            out.extend_from_slice(&q.to_le_bytes());
        }
    }
    out
}
