//! Palette derivation: base colour to {primary, secondary, contrast}.
//!
//! - `primary` is the override when present, otherwise the base colour.
//! - `secondary` keeps the primary hue with saturation and lightness each
//!   scaled by 0.66.
//! - `contrast` is `black` when the BT.709 luma of the primary
//!   (`0.2126 R + 0.7152 G + 0.0722 B`, channels in `[0, 1]`) is above 0.5,
//!   `white` otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::HexColor;
use crate::DomainError;

const SECONDARY_SCALE: f64 = 0.66;
const LUMA_THRESHOLD: f64 = 0.5;

/// Text colour that stays readable on top of the primary colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Black,
    White,
}

impl Contrast {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl fmt::Display for Contrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub contrast: Contrast,
}

impl Palette {
    /// Derive a palette from already-validated colours.
    pub fn from_colors(base: HexColor, override_color: Option<HexColor>) -> Self {
        let primary = override_color.unwrap_or(base);
        Self {
            primary,
            secondary: secondary_of(primary),
            contrast: contrast_of(primary),
        }
    }
}

/// Derive a palette from hex strings.
///
/// # Errors
///
/// `DomainError::InvalidColor` when either string is not a hex colour.
pub fn derive_palette(base: &str, override_color: Option<&str>) -> Result<Palette, DomainError> {
    let base = HexColor::parse(base)?;
    let override_color = override_color.map(HexColor::parse).transpose()?;
    Ok(Palette::from_colors(base, override_color))
}

/// Relative luma of a colour, in `[0, 1]`.
pub fn luma(color: HexColor) -> f64 {
    let (r, g, b) = color.rgb();
    let unit = |c: u8| f64::from(c) / 255.0;
    0.2126 * unit(r) + 0.7152 * unit(g) + 0.0722 * unit(b)
}

fn contrast_of(color: HexColor) -> Contrast {
    if luma(color) > LUMA_THRESHOLD {
        Contrast::Black
    } else {
        Contrast::White
    }
}

fn secondary_of(color: HexColor) -> HexColor {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, s * SECONDARY_SCALE, l * SECONDARY_SCALE)
}

fn rgb_to_hsl(color: HexColor) -> (f64, f64, f64) {
    let (r, g, b) = color.rgb();
    let (r, g, b) = (f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> HexColor {
    let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    if s == 0.0 {
        let v = to_byte(l);
        return HexColor::from_rgb(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    HexColor::from_rgb(
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
