//! Colour value objects: validated hex colours and the eight stat slots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// A validated `#rrggbb` colour, stored lowercase.
///
/// Accepts `#rgb`, `#rrggbb` and the same forms without the leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    r: u8,
    g: u8,
    b: u8,
}

impl HexColor {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::invalid_color(input));
        }

        let channel =
            |s: &str| u8::from_str_radix(s, 16).map_err(|_| DomainError::invalid_color(input));
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..=i].repeat(2));
                Ok(Self::from_rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::from_rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(DomainError::invalid_color(input)),
        }
    }

    /// Red, green and blue channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for HexColor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

/// One of the eight colour slots a character can assign stats to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

impl StatColor {
    /// All slots in display order.
    pub const ALL: [StatColor; 8] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Teal,
        Self::Blue,
        Self::Purple,
        Self::Pink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Teal => "teal",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }

    /// Default swatch used when the configuration does not override it.
    pub fn default_hex(&self) -> HexColor {
        match self {
            Self::Red => HexColor::from_rgb(0xc0, 0x39, 0x2b),
            Self::Orange => HexColor::from_rgb(0xe6, 0x7e, 0x22),
            Self::Yellow => HexColor::from_rgb(0xf1, 0xc4, 0x0f),
            Self::Green => HexColor::from_rgb(0x27, 0xae, 0x60),
            Self::Teal => HexColor::from_rgb(0x16, 0xa0, 0x85),
            Self::Blue => HexColor::from_rgb(0x29, 0x80, 0xb9),
            Self::Purple => HexColor::from_rgb(0x8e, 0x44, 0xad),
            Self::Pink => HexColor::from_rgb(0xe8, 0x43, 0x93),
        }
    }
}

impl fmt::Display for StatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatColor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == key)
            .ok_or_else(|| DomainError::parse(format!("Unknown stat color: {}", s)))
    }
}
