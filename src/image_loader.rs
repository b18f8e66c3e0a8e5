//! Image loading and letterboxing

use crate::{Error, Resolution, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader, Rgba, RgbaImage};
use std::path::Path;

/// Canvas color behind letterboxed slides (opaque black)
pub const LETTERBOX_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Loaded image in RGBA format
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// RGBA pixel data
    pub data: Vec<u8>,
}

/// Placement of a scaled image inside the output frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitGeometry {
    /// Uniform scale factor applied to the source
    pub scale: f64,
    /// Scaled width
    pub width: u32,
    /// Scaled height
    pub height: u32,
    /// Left bar width
    pub offset_x: u32,
    /// Top bar height
    pub offset_y: u32,
}

impl FitGeometry {
    /// Largest aspect-preserving size that fits `target`, centered
    pub fn compute(src_width: u32, src_height: u32, target: Resolution) -> Self {
        let scale_x = target.width as f64 / src_width as f64;
        let scale_y = target.height as f64 / src_height as f64;
        let scale = scale_x.min(scale_y);

        // Rounding can overshoot by a pixel on the constrained axis
        let width = ((src_width as f64 * scale).round() as u32).clamp(1, target.width);
        let height = ((src_height as f64 * scale).round() as u32).clamp(1, target.height);

        Self {
            scale,
            width,
            height,
            offset_x: (target.width - width) / 2,
            offset_y: (target.height - height) / 2,
        }
    }
}

impl LoadedImage {
    /// Load an image from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image_error = |source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        };

        let img = ImageReader::open(path)
            .map_err(|e| image_error(image::ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| image_error(image::ImageError::IoError(e)))?
            .decode()
            .map_err(image_error)?;

        Ok(Self::from_dynamic_image(img))
    }

    /// Create from a DynamicImage
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        let data = rgba.into_raw();

        Self {
            width,
            height,
            data,
        }
    }

    /// Scale to fit `target` preserving aspect ratio, centered on an opaque
    /// black canvas of exactly `target` size
    pub fn letterbox(&self, target: Resolution) -> Result<Self> {
        let source = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Image buffer does not match {}x{}",
                    self.width, self.height
                ))
            })?;

        let fit = FitGeometry::compute(self.width, self.height, target);
        tracing::trace!(?fit, src_width = self.width, src_height = self.height, "letterbox");

        let scaled = if (fit.width, fit.height) == (self.width, self.height) {
            source
        } else {
            imageops::resize(&source, fit.width, fit.height, FilterType::Lanczos3)
        };

        let mut canvas = RgbaImage::from_pixel(target.width, target.height, Rgba(LETTERBOX_COLOR));
        // Alpha-blends, so transparent slide regions show the canvas color
        imageops::overlay(
            &mut canvas,
            &scaled,
            fit.offset_x as i64,
            fit.offset_y as i64,
        );

        Ok(Self {
            width: target.width,
            height: target.height,
            data: canvas.into_raw(),
        })
    }
}
