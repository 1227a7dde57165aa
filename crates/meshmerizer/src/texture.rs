//! Texture decoding for sculpted shapes.

use image::{DynamicImage, ImageResult};

/// Turns compressed texture bytes into pixels.
///
/// The default [`ImageTextureDecoder`] handles the formats the `image` crate
/// is built with. Hosts that receive other codecs install their own.
pub trait TextureDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> ImageResult<DynamicImage>;
}

/// Decoder that guesses the format from the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTextureDecoder;

impl TextureDecoder for ImageTextureDecoder {
    fn decode(&self, bytes: &[u8]) -> ImageResult<DynamicImage> {
        image::load_from_memory(bytes)
    }
}
