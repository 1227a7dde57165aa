//! On-disk cache of decoded sculpt textures.

use std::io;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;

use crate::shape::AssetId;

/// Directory of decoded sculpt textures, one PNG per texture id.
///
/// Files are written to a temporary file and renamed into place without
/// replacing an existing entry, so readers never see a partial image.
#[derive(Debug, Clone)]
pub struct SculptMapCache {
    dir: PathBuf,
}

impl SculptMapCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the image for `id` is stored.
    #[must_use]
    pub fn path(&self, id: AssetId) -> PathBuf {
        self.dir.join(format!("smap_{id}.png"))
    }

    /// Load a cached image. Missing or unreadable files yield `None`.
    #[must_use]
    pub fn load(&self, id: AssetId) -> Option<RgbImage> {
        let path = self.path(id);
        if !path.exists() {
            return None;
        }
        match image::open(&path) {
            Ok(image) => {
                tracing::debug!("Loaded sculpt map {id} from {}", path.display());
                Some(image.into_rgb8())
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable sculpt map cache file {}: {e}",
                    path.display()
                );
                None
            }
        }
    }

    /// Store `image` for `id` unless an entry already exists.
    pub fn store(&self, id: AssetId, image: &RgbImage) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(id);
        if path.exists() {
            return Ok(());
        }

        let mut file = NamedTempFile::new_in(&self.dir)?;
        image
            .write_to(file.as_file_mut(), ImageFormat::Png)
            .map_err(io::Error::other)?;
        match file.persist_noclobber(&path) {
            Ok(_) => {
                tracing::debug!("Cached sculpt map {id} at {}", path.display());
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn id() -> AssetId {
        AssetId::new([0xab; 16])
    }

    #[test]
    fn file_name_uses_asset_id() {
        let cache = SculptMapCache::new("maps");
        assert_eq!(
            cache.path(id()),
            Path::new("maps").join("smap_abababab-abab-abab-abab-abababababab.png")
        );
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SculptMapCache::new(dir.path().join("nested"));
        assert!(cache.load(id()).is_none());

        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        cache.store(id(), &image).unwrap();
        assert_eq!(cache.load(id()), Some(image.clone()));

        // A second store keeps the first entry.
        cache.store(id(), &RgbImage::new(1, 1)).unwrap();
        assert_eq!(cache.load(id()), Some(image));
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SculptMapCache::new(dir.path());
        std::fs::write(cache.path(id()), b"not a png").unwrap();
        assert!(cache.load(id()).is_none());
    }
}
