//! Image decode boundary
//!
//! The loader never decodes pixels itself; it hands a path to an
//! [`ImageDecoder`] and stores whatever comes back.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::errors::DecodeError;
use crate::resource::Image;

pub trait ImageDecoder {
    /// Decode the file at `path` into 3- or 4-channel rows, bottom row first
    fn decode(&self, path: &Path) -> Result<Image, DecodeError>;
}

/// Decodes from disk with the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &Path) -> Result<Image, DecodeError> {
        let img = image::open(path).map_err(|source| DecodeError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        image_from_dynamic(img, path)
    }
}

/// Decode an in-memory encoded image (PNG, JPEG, BMP)
pub fn decode_bytes(bytes: &[u8], name: &Path) -> Result<Image, DecodeError> {
    let img = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
        path: name.to_path_buf(),
        source,
    })?;
    image_from_dynamic(img, name)
}

/// Flip so row 0 is the bottom of the picture and keep RGB or RGBA.
/// Grey images are widened to RGB.
pub fn image_from_dynamic(img: DynamicImage, name: &Path) -> Result<Image, DecodeError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty {
            path: name.to_path_buf(),
            width,
            height,
        });
    }

    let has_alpha = img.color().has_alpha();
    let img = img.flipv();
    let (channels, data) = if has_alpha {
        (4, img.to_rgba8().into_raw())
    } else {
        (3, img.to_rgb8().into_raw())
    };

    Ok(Image::new(
        name.to_string_lossy(),
        width as usize,
        height as usize,
        channels,
        data,
    ))
}
