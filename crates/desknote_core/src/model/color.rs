//! Background color value type.
//!
//! # Invariants
//! - A `Color` always renders as uppercase `#RRGGBB`.
//! - Parsing accepts `#RGB` and `#RRGGBB`, case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// Opaque RGB color used as a note background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Rejected color input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl Display for ColorParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color `{}`; expected #RGB or #RRGGBB", self.0)
    }
}

impl Error for ColorParseError {}

impl Color {
    /// Light yellow sticky-note default.
    pub const DEFAULT_BACKGROUND: Color = Color::rgb(0xFF, 0xFF, 0xE0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_BACKGROUND
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let caps = HEX_COLOR_RE
            .captures(trimmed)
            .ok_or_else(|| ColorParseError(value.to_string()))?;
        let digits = &caps[1];

        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16).map_err(|_| ColorParseError(value.to_string()))
        };

        if digits.len() == 3 {
            // #abc expands to #aabbcc
            let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
            return Ok(Self::rgb(
                channel(&expanded[0..2])?,
                channel(&expanded[2..4])?,
                channel(&expanded[4..6])?,
            ));
        }

        Ok(Self::rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ))
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
