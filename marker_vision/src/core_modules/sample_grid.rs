// THEORY:
// The sample grid is the read-only canvas every analysis in this crate runs over.
// It is addressed by `(x, y)` with `0 <= x < width` and `0 <= y < height`, and
// nothing in the library ever mutates it.
//
// Key architectural principles:
// 1.  **Trait at the seam**: Algorithms are written against `SampleSource`, not a
//     concrete buffer. The crate ships `PixelGrid` (an owned row-major grid) and
//     an implementation for `image::RgbImage`, so decoded images can be analyzed
//     without another copy.
// 2.  **Buffer slicing**: Raw RGB/RGBA frame buffers are validated once at
//     construction and sliced into `ColorSample`s, the same "bytes in, pixels out"
//     step the rest of the pipeline relies on.
// 3.  **Bounds are a precondition**: `sample` assumes in-bounds coordinates.
//     Callers that cannot guarantee that use `get`, which returns `None` instead.

use crate::core_modules::pixel::ColorSample;
use crate::error::{Result, VisionError};

const RGB_CHANNELS: usize = 3;
const RGBA_CHANNELS: usize = 4;

/// Read-only access to a 2-D grid of color samples.
pub trait SampleSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Returns the sample at `(x, y)`. The coordinate must lie inside the grid.
    fn sample(&self, x: u32, y: u32) -> ColorSample;

    fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height()
    }

    fn get(&self, x: u32, y: u32) -> Option<ColorSample> {
        self.contains(x, y).then(|| self.sample(x, y))
    }

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl<T: SampleSource + ?Sized> SampleSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn sample(&self, x: u32, y: u32) -> ColorSample {
        (**self).sample(x, y)
    }
}

/// An owned, row-major grid of RGB samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    samples: Vec<ColorSample>,
}

impl PixelGrid {
    /// Builds a grid from a tightly packed RGB buffer.
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        Self::from_packed(width, height, bytes, RGB_CHANNELS)
    }

    /// Builds a grid from a tightly packed RGBA buffer. Alpha is dropped.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        Self::from_packed(width, height, bytes, RGBA_CHANNELS)
    }

    fn from_packed(width: u32, height: u32, bytes: &[u8], channels: usize) -> Result<Self> {
        let expected = width as usize * height as usize * channels;
        if bytes.len() != expected {
            return Err(VisionError::BufferLength {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        let samples = bytes
            .chunks_exact(channels)
            .map(ColorSample::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Builds a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> ColorSample,
    {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn filled(width: u32, height: u32, color: ColorSample) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn samples(&self) -> &[ColorSample] {
        &self.samples
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl SampleSource for PixelGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample(&self, x: u32, y: u32) -> ColorSample {
        debug_assert!(self.contains(x, y), "({x}, {y}) outside {}x{}", self.width, self.height);
        self.samples[self.index(x, y)]
    }
}

impl From<&image::RgbImage> for PixelGrid {
    fn from(image: &image::RgbImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| {
            ColorSample::from(*image.get_pixel(x, y))
        })
    }
}

/// Normalizes any decoded color mode down to three 8-bit channels.
impl From<&image::DynamicImage> for PixelGrid {
    fn from(image: &image::DynamicImage) -> Self {
        Self::from(&image.to_rgb8())
    }
}

impl SampleSource for image::RgbImage {
    fn width(&self) -> u32 {
        image::RgbImage::width(self)
    }

    fn height(&self) -> u32 {
        image::RgbImage::height(self)
    }

    fn sample(&self, x: u32, y: u32) -> ColorSample {
        ColorSample::from(*self.get_pixel(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_buffer_is_row_major() {
        let bytes = [
            1, 1, 1, 2, 2, 2, 3, 3, 3, //
            4, 4, 4, 5, 5, 5, 6, 6, 6,
        ];
        let grid = PixelGrid::from_rgb_bytes(3, 2, &bytes).unwrap();

        assert_eq!(grid.sample(2, 0), ColorSample::new(3, 3, 3));
        assert_eq!(grid.sample(0, 1), ColorSample::new(4, 4, 4));
        assert_eq!(grid.samples().len(), 6);
    }

    #[test]
    fn rgba_buffer_drops_alpha() {
        let bytes = [10, 20, 30, 0, 40, 50, 60, 255];
        let grid = PixelGrid::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(grid.sample(1, 0), ColorSample::new(40, 50, 60));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = PixelGrid::from_rgb_bytes(2, 2, &[0; 11]).unwrap_err();
        assert_eq!(
            err,
            VisionError::BufferLength {
                width: 2,
                height: 2,
                expected: 12,
                actual: 11
            }
        );
    }

    #[test]
    fn get_checks_bounds() {
        let grid = PixelGrid::filled(4, 3, ColorSample::new(7, 7, 7));
        assert_eq!(grid.get(3, 2), Some(ColorSample::new(7, 7, 7)));
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(grid.get(0, 3), None);
    }

    #[test]
    fn zero_sized_grid_is_empty() {
        let grid = PixelGrid::from_rgb_bytes(0, 5, &[]).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.get(0, 0), None);
    }

    #[test]
    fn rgb_image_and_pixel_grid_agree() {
        let image = image::RgbImage::from_fn(5, 4, |x, y| image::Rgb([x as u8, y as u8, 9]));
        let grid = PixelGrid::from(&image);

        assert_eq!(SampleSource::width(&image), grid.width());
        for y in 0..4 {
            for x in 0..5 {
                assert_eq!(image.sample(x, y), grid.sample(x, y));
            }
        }
    }

    #[test]
    fn dynamic_image_is_normalized_to_rgb() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 10, 20, 128]));
        let grid = PixelGrid::from(&image::DynamicImage::ImageRgba8(rgba));
        assert_eq!(grid.sample(1, 1), ColorSample::new(200, 10, 20));
    }
}
