use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

/// 8-bit sRGB colour shared by the PNG and GUI back-ends.
pub type Rgb8 = Srgb<u8>;

pub const BLACK: Rgb8 = Srgb::new(0, 0, 0);
pub const WHITE: Rgb8 = Srgb::new(255, 255, 255);

// ---------------------------------------------------------------------------
// Continuous colour maps
// ---------------------------------------------------------------------------

/// Colour map applied to normalised counts in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Purple → blue → green → yellow → red.
    #[default]
    Rainbow,
    Jet,
    Hot,
    Gray,
    /// Evenly spaced hues from blue to red at constant lightness.
    Hue,
}

impl Colormap {
    pub const ALL: [Colormap; 5] = [
        Colormap::Rainbow,
        Colormap::Jet,
        Colormap::Hot,
        Colormap::Gray,
        Colormap::Hue,
    ];

    /// Colour for `t`, clamped into `[0, 1]`.
    pub fn sample(self, t: f64) -> Rgb8 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (r, g, b) = match self {
            Colormap::Rainbow => (
                (2.0 * t - 0.5).abs(),
                (std::f64::consts::PI * t).sin(),
                (std::f64::consts::FRAC_PI_2 * t).cos(),
            ),
            Colormap::Jet => (
                1.5 - (4.0 * t - 3.0).abs(),
                1.5 - (4.0 * t - 2.0).abs(),
                1.5 - (4.0 * t - 1.0).abs(),
            ),
            Colormap::Hot => (3.0 * t, 3.0 * t - 1.0, 3.0 * t - 2.0),
            Colormap::Gray => (t, t, t),
            Colormap::Hue => {
                let hsl = Hsl::new(240.0 * (1.0 - t as f32), 0.85, 0.5);
                let rgb: Srgb = hsl.into_color();
                (f64::from(rgb.red), f64::from(rgb.green), f64::from(rgb.blue))
            }
        };
        Srgb::new(channel(r), channel(g), channel(b))
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::Rainbow => "rainbow",
            Colormap::Jet => "jet",
            Colormap::Hot => "hot",
            Colormap::Gray => "gray",
            Colormap::Hue => "hue",
        };
        f.write_str(name)
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colormap::ALL
            .into_iter()
            .find(|c| c.to_string() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                let known: Vec<String> = Colormap::ALL.iter().map(ToString::to_string).collect();
                format!("unknown colormap '{s}', expected one of {}", known.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Normalisation: count → [0, 1]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorNorm {
    #[default]
    Log,
    Linear,
}

/// Maps values between `vmin` and `vmax` onto `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    norm: ColorNorm,
    vmin: f64,
    vmax: f64,
}

impl Normalizer {
    /// Autoscale over the given values. Non-positive values do not take part
    /// in a log scale.
    pub fn autoscale(norm: ColorNorm, values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (vmin, vmax) = values
            .into_iter()
            .filter(|v| v.is_finite() && (norm == ColorNorm::Linear || *v > 0.0))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        (vmin <= vmax).then_some(Normalizer { norm, vmin, vmax })
    }

    /// `None` when the value cannot be shown on this scale.
    pub fn scale(&self, v: f64) -> Option<f64> {
        match self.norm {
            ColorNorm::Log => {
                if v <= 0.0 {
                    return None;
                }
                let span = self.vmax.ln() - self.vmin.ln();
                if span <= 0.0 {
                    return Some(0.0);
                }
                Some(((v.ln() - self.vmin.ln()) / span).clamp(0.0, 1.0))
            }
            ColorNorm::Linear => {
                let span = self.vmax - self.vmin;
                if span <= 0.0 {
                    return Some(0.0);
                }
                Some(((v - self.vmin) / span).clamp(0.0, 1.0))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Two-colour map for acceptance masks
// ---------------------------------------------------------------------------

/// Colours for `[rejected, accepted]` bins.
pub fn acceptance_colors(inverted: bool) -> [Rgb8; 2] {
    if inverted {
        [WHITE, BLACK]
    } else {
        [BLACK, WHITE]
    }
}
