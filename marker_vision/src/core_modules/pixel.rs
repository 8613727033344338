// THEORY:
// `ColorSample` is the most fundamental unit of the system: one pixel reduced to
// three 8-bit channels. It is a "dumb" value type. Anything that needs more than
// one pixel (marker classification, clustering, neighborhood checks) lives in the
// modules built on top of it.
//
// Alpha is not carried. Sources with an alpha channel (RGBA frame buffers) have
// it dropped on conversion, matching how the acquisition step flattens every
// image mode down to plain RGB before analysis.

use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Channel = u8;
pub type Luminance = f64;
pub type ColorDelta = u16;

/// A single RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSample {
    /// The red channel value (0-255).
    pub red: Channel,
    /// The green channel value (0-255).
    pub green: Channel,
    /// The blue channel value (0-255).
    pub blue: Channel,
}

impl ColorSample {
    pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { red, green, blue }
    }

    pub const fn to_array(self) -> [Channel; 3] {
        [self.red, self.green, self.blue]
    }

    /// Rec. 601 luma approximation.
    pub fn luminance(&self) -> Luminance {
        0.299 * self.red as f64 + 0.587 * self.green as f64 + 0.114 * self.blue as f64
    }

    /// Sum of the absolute per-channel differences, in `0..=765`.
    pub fn color_difference(&self, other: &ColorSample) -> ColorDelta {
        self.red.abs_diff(other.red) as ColorDelta
            + self.green.abs_diff(other.green) as ColorDelta
            + self.blue.abs_diff(other.blue) as ColorDelta
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.red, self.green, self.blue)
    }
}

impl From<[Channel; 3]> for ColorSample {
    fn from([red, green, blue]: [Channel; 3]) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<ColorSample> for [Channel; 3] {
    fn from(sample: ColorSample) -> Self {
        sample.to_array()
    }
}

impl From<image::Rgb<u8>> for ColorSample {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Self::from(pixel.0)
    }
}

impl From<ColorSample> for image::Rgb<u8> {
    fn from(sample: ColorSample) -> Self {
        image::Rgb(sample.to_array())
    }
}

/// Accepts RGB or RGBA byte slices; alpha is discarded.
impl TryFrom<&[u8]> for ColorSample {
    type Error = VisionError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [red, green, blue] | [red, green, blue, _] => Ok(Self::new(*red, *green, *blue)),
            _ => Err(VisionError::ChannelCount(bytes.len())),
        }
    }
}
