//! Filesystem adapter: image loading with EXIF orientation correction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

use faceprofile_core::normalize::{correct_orientation, Orientation};

/// Supported image extensions.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp"];

/// A decoded photo ready for the pipeline: upright, non-mirrored.
pub struct LoadedPhoto {
    /// Source path as given.
    pub path: String,
    /// Width after orientation correction.
    pub width: u32,
    /// Height after orientation correction.
    pub height: u32,
    /// Decoded, orientation-corrected pixels.
    pub image: DynamicImage,
}

/// Checks whether a path has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}

/// Loads a photo and applies its EXIF orientation.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or decoded. A missing
/// or unreadable orientation tag is not an error; the image is assumed
/// upright.
pub fn load_photo(path: &Path) -> Result<LoadedPhoto> {
    let image =
        image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;

    let orientation = read_orientation(path).unwrap_or_default();
    if orientation != Orientation::Normal {
        debug!(
            "applying orientation {orientation:?} to {}",
            path.display()
        );
    }
    let image = correct_orientation(image, orientation);
    let (width, height) = image.dimensions();

    Ok(LoadedPhoto {
        path: path.to_string_lossy().into_owned(),
        width,
        height,
        image,
    })
}

/// Reads the EXIF orientation tag for an image file, if any.
#[must_use]
pub fn read_orientation(path: &Path) -> Option<Orientation> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0)?;
    let value = u16::try_from(value).ok()?;

    let orientation = Orientation::from_exif(value);
    if orientation.is_none() {
        warn!("unknown EXIF orientation value {value} in {}", path.display());
    }
    orientation
}
