// THEORY:
// The palette layer is the consumer of the colors read from swatch centers. Given
// a palette, every pixel of an image is snapped to the closest palette color, so a
// photo or a noisy render can be redrawn with exactly the swatch colors.
//
// Key architectural principles:
// 1.  **Weighted distance**: Closeness is a weighted Euclidean distance in RGB. The
//     weights model channel sensitivity; the default leans on green the way human
//     vision does.
// 2.  **Optional background**: A quantizer may carry a background color with a
//     preference factor. A pixel whose distance to the background, divided by the
//     preference, beats the best palette distance is reported as background instead
//     of being recolored. A preference above 1.0 favours the background.
// 3.  **Ties go to the earlier color**: Palette order is swatch order, and only a
//     strictly smaller distance replaces the current best.

use crate::core_modules::pixel::ColorSample;
use crate::core_modules::sample_grid::{PixelGrid, SampleSource};
use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};

/// Per-channel weights for the RGB distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelWeights {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ChannelWeights {
    /// Luma-like weights.
    pub const HUMAN: ChannelWeights = ChannelWeights {
        red: 0.3,
        green: 0.59,
        blue: 0.11,
    };

    pub const BALANCED: ChannelWeights = ChannelWeights {
        red: 0.33,
        green: 0.33,
        blue: 0.33,
    };

    pub const GREEN: ChannelWeights = ChannelWeights {
        red: 0.15,
        green: 0.7,
        blue: 0.15,
    };

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("red", self.red), ("green", self.green), ("blue", self.blue)] {
            if !value.is_finite() || value < 0.0 {
                return Err(VisionError::InvalidConfig {
                    field: "weights",
                    reason: format!("{field} weight must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self::HUMAN
    }
}

/// Weighted Euclidean distance between two colors.
pub fn weighted_distance(a: &ColorSample, b: &ColorSample, weights: &ChannelWeights) -> f64 {
    let dr = f64::from(a.red) - f64::from(b.red);
    let dg = f64::from(a.green) - f64::from(b.green);
    let db = f64::from(a.blue) - f64::from(b.blue);
    (weights.red * dr * dr + weights.green * dg * dg + weights.blue * db * db).sqrt()
}

/// Index and value of the palette color closest to `color`. `None` for an empty palette.
pub fn nearest(
    color: &ColorSample,
    palette: &[ColorSample],
    weights: &ChannelWeights,
) -> Option<(usize, ColorSample)> {
    nearest_with_distance(color, palette, weights).map(|(index, candidate, _)| (index, candidate))
}

fn nearest_with_distance(
    color: &ColorSample,
    palette: &[ColorSample],
    weights: &ChannelWeights,
) -> Option<(usize, ColorSample, f64)> {
    let mut best: Option<(usize, ColorSample, f64)> = None;
    for (index, candidate) in palette.iter().enumerate() {
        let distance = weighted_distance(color, candidate, weights);
        match best {
            Some((_, _, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, *candidate, distance)),
        }
    }
    best
}

/// The outcome of quantizing a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantized {
    Palette { index: usize, color: ColorSample },
    Background,
}

/// A background color that competes with the palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: ColorSample,
    /// Distances to the background are divided by this factor. Must be positive.
    pub preference: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantizer {
    palette: Vec<ColorSample>,
    weights: ChannelWeights,
    background: Option<Background>,
}

impl Quantizer {
    pub fn new(palette: Vec<ColorSample>, weights: ChannelWeights) -> Result<Self> {
        if palette.is_empty() {
            return Err(VisionError::InvalidConfig {
                field: "palette",
                reason: "at least one color is required".to_string(),
            });
        }
        weights.validate()?;
        Ok(Self {
            palette,
            weights,
            background: None,
        })
    }

    pub fn with_background(mut self, background: Background) -> Result<Self> {
        if !background.preference.is_finite() || background.preference <= 0.0 {
            return Err(VisionError::InvalidConfig {
                field: "background.preference",
                reason: format!("must be positive, got {}", background.preference),
            });
        }
        self.background = Some(background);
        Ok(self)
    }

    pub fn palette(&self) -> &[ColorSample] {
        &self.palette
    }

    pub fn quantize(&self, color: &ColorSample) -> Quantized {
        let Some((index, nearest_color, distance)) =
            nearest_with_distance(color, &self.palette, &self.weights)
        else {
            return Quantized::Background;
        };

        if let Some(background) = &self.background {
            let adjusted = weighted_distance(color, &background.color, &self.weights) / background.preference;
            if adjusted < distance {
                return Quantized::Background;
            }
        }

        Quantized::Palette {
            index,
            color: nearest_color,
        }
    }
}

/// A quantized image. Background pixels keep their original color and are flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedGrid {
    pub grid: PixelGrid,
    background: Vec<bool>,
}

impl QuantizedGrid {
    pub fn is_background(&self, x: u32, y: u32) -> bool {
        self.grid.contains(x, y) && self.background[y as usize * self.grid.width() as usize + x as usize]
    }

    pub fn background_count(&self) -> usize {
        self.background.iter().filter(|&&flag| flag).count()
    }
}

/// Snaps every pixel of `grid` to the quantizer's palette.
pub fn quantize_grid<G>(grid: &G, quantizer: &Quantizer) -> QuantizedGrid
where
    G: SampleSource + ?Sized,
{
    let mut background = Vec::with_capacity(grid.width() as usize * grid.height() as usize);
    let quantized = PixelGrid::from_fn(grid.width(), grid.height(), |x, y| {
        let original = grid.sample(x, y);
        match quantizer.quantize(&original) {
            Quantized::Palette { color, .. } => {
                background.push(false);
                color
            }
            Quantized::Background => {
                background.push(true);
                original
            }
        }
    });
    QuantizedGrid {
        grid: quantized,
        background,
    }
}
