// THEORY:
// A marker predicate decides whether a single sample is a "marker" (for the
// rectangles this crate hunts for, a red border pixel). It is kept separate from
// the clustering algorithm so strictness can be tuned without touching the
// clusterer: a loose definition catches anti-aliased border pixels, a strict one
// only accepts near-pure red.

use crate::core_modules::pixel::{Channel, ColorSample};
use serde::{Deserialize, Serialize};

/// Classifies a single sample as marker or background. Must be pure.
pub trait MarkerPredicate {
    fn is_marker(&self, sample: &ColorSample) -> bool;
}

impl<F> MarkerPredicate for F
where
    F: Fn(&ColorSample) -> bool,
{
    fn is_marker(&self, sample: &ColorSample) -> bool {
        self(sample)
    }
}

/// "Looks red": a high red channel with both other channels held low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedThreshold {
    /// Minimum red channel value (inclusive).
    pub red_min: Channel,
    /// Maximum green and blue channel value (inclusive).
    pub other_max: Channel,
}

impl RedThreshold {
    /// Accepts most visibly red pixels, including slightly blended border pixels.
    pub const LOOSE: RedThreshold = RedThreshold {
        red_min: 200,
        other_max: 50,
    };

    /// Accepts only near-pure red, for images whose content may itself be reddish.
    pub const STRICT: RedThreshold = RedThreshold {
        red_min: 250,
        other_max: 20,
    };
}

impl Default for RedThreshold {
    fn default() -> Self {
        Self::LOOSE
    }
}

impl MarkerPredicate for RedThreshold {
    fn is_marker(&self, sample: &ColorSample) -> bool {
        sample.red >= self.red_min && sample.green <= self.other_max && sample.blue <= self.other_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_accepts_blended_red() {
        let blended = ColorSample::new(210, 40, 45);
        assert!(RedThreshold::LOOSE.is_marker(&blended));
        assert!(!RedThreshold::STRICT.is_marker(&blended));
    }

    #[test]
    fn strict_accepts_pure_red() {
        let pure = ColorSample::new(255, 0, 0);
        assert!(RedThreshold::STRICT.is_marker(&pure));
        assert!(RedThreshold::LOOSE.is_marker(&pure));
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert!(RedThreshold::LOOSE.is_marker(&ColorSample::new(200, 50, 50)));
        assert!(!RedThreshold::LOOSE.is_marker(&ColorSample::new(199, 50, 50)));
        assert!(!RedThreshold::LOOSE.is_marker(&ColorSample::new(200, 51, 50)));
        assert!(!RedThreshold::LOOSE.is_marker(&ColorSample::new(200, 50, 51)));
    }

    #[test]
    fn non_red_colors_are_background() {
        for color in [
            ColorSample::new(255, 255, 255),
            ColorSample::new(0, 0, 0),
            ColorSample::new(255, 200, 0),
            ColorSample::new(255, 0, 255),
        ] {
            assert!(!RedThreshold::LOOSE.is_marker(&color), "{color}");
        }
    }

    #[test]
    fn closures_are_predicates() {
        let blue = |s: &ColorSample| s.blue > 200 && s.red < 50;
        assert!(blue.is_marker(&ColorSample::new(0, 0, 255)));
        assert!(!blue.is_marker(&ColorSample::new(255, 0, 0)));
    }

    #[test]
    fn partial_config_falls_back_to_loose() {
        let threshold: RedThreshold = serde_json::from_str(r#"{ "red_min": 240 }"#).unwrap();
        assert_eq!(threshold.red_min, 240);
        assert_eq!(threshold.other_max, RedThreshold::LOOSE.other_max);
    }
}
