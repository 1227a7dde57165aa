//! Sculpt texture sampling.

use glam::Vec3;
use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::{DecodeError, DecodeResult};

const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// A sculpt texture reduced to the sample resolution of one LOD.
///
/// Holds `width × height` color samples; both dimensions are one more than
/// the number of grid cells across and down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SculptMap {
    width: u32,
    height: u32,
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
}

impl SculptMap {
    /// Sample `image` for a level of detail of `lod` (32 for full detail).
    ///
    /// Images larger than `(2·lod)²` pixels are halved with nearest-neighbour
    /// resampling until they fit. Images still larger than `lod²` are read
    /// at every other pixel. Small images are sampled pixel for pixel, with
    /// the last row and column repeated to close the grid.
    pub fn from_image(image: &RgbImage, lod: u32) -> DecodeResult<Self> {
        let (image_width, image_height) = image.dimensions();
        if image_width == 0 || image_height == 0 {
            return Err(DecodeError::DegenerateImage {
                width: image_width,
                height: image_height,
            });
        }

        let lod = u64::from(lod.max(1));
        let lod_pixels = (lod * 2) * (lod * 2);
        let area = |w: u32, h: u32| u64::from(w) * u64::from(h);
        let small_map = area(image_width, image_height) <= lod * lod;

        let (mut width, mut height) = (image_width, image_height);
        let mut needs_scaling = false;
        while area(width, height) > lod_pixels {
            width = (width >> 1).max(1);
            height = (height >> 1).max(1);
            needs_scaling = true;
        }

        let scaled;
        let source = if needs_scaling {
            tracing::debug!(
                "Resampling {image_width}x{image_height} sculpt map to {width}x{height}"
            );
            scaled = imageops::resize(image, width, height, FilterType::Nearest);
            &scaled
        } else {
            image
        };

        if area(width, height) > lod * lod {
            width = (width >> 1).max(1);
            height = (height >> 1).max(1);
        }

        let (source_width, source_height) = source.dimensions();
        let pick = |i: u32, extent: u32| match (small_map, i < extent) {
            (true, true) => i,
            (true, false) => i - 1,
            (false, true) => i * 2,
            (false, false) => i * 2 - 1,
        };

        let count = (width as usize + 1) * (height as usize + 1);
        let mut red = Vec::with_capacity(count);
        let mut green = Vec::with_capacity(count);
        let mut blue = Vec::with_capacity(count);
        for y in 0..=height {
            let py = pick(y, height).min(source_height - 1);
            for x in 0..=width {
                let px = pick(x, width).min(source_width - 1);
                let [r, g, b] = source.get_pixel(px, py).0;
                red.push(r);
                green.push(g);
                blue.push(b);
            }
        }

        Ok(Self {
            width: width + 1,
            height: height + 1,
            red,
            green,
            blue,
        })
    }

    /// Samples across.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Samples down.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Convert colors to offsets in `[-0.5, 0.5]`, negating X when mirrored.
    #[must_use]
    pub fn to_sample(&self, mirror: bool) -> SculptSample {
        let x_sign = if mirror { -1.0 } else { 1.0 };
        let offsets = self
            .red
            .iter()
            .zip(&self.green)
            .zip(&self.blue)
            .map(|((&r, &g), &b)| {
                Vec3::new(
                    x_sign * (f32::from(r) * PIXEL_SCALE - 0.5),
                    f32::from(g) * PIXEL_SCALE - 0.5,
                    f32::from(b) * PIXEL_SCALE - 0.5,
                )
            })
            .collect();
        SculptSample {
            width: self.width as usize,
            height: self.height as usize,
            offsets,
        }
    }
}

/// Row-major grid of displacement vectors sampled from a sculpt map.
#[derive(Debug, Clone, PartialEq)]
pub struct SculptSample {
    width: usize,
    height: usize,
    offsets: Vec<Vec3>,
}

impl SculptSample {
    /// Wrap a row-major grid; `offsets` must hold exactly `width × height`.
    pub fn new(width: usize, height: usize, offsets: Vec<Vec3>) -> DecodeResult<Self> {
        let expected = width * height;
        if offsets.len() != expected {
            return Err(DecodeError::SampleCountMismatch {
                expected,
                actual: offsets.len(),
            });
        }
        Ok(Self {
            width,
            height,
            offsets,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.offsets.get(y * self.width + x).copied()
    }

    #[must_use]
    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    /// Split into rows, consuming the grid.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<Vec3>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.offsets
            .chunks_exact(self.width)
            .map(<[Vec3]>::to_vec)
            .collect()
    }
}
