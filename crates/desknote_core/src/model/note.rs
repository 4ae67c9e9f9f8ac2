//! Note entity and typed partial payloads.
//!
//! # Responsibility
//! - Define the canonical persisted record for one desktop note.
//! - Provide field-scoped partial updates without string-keyed maps.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused for another note.
//! - `size.width >= MIN_WIDTH`, `size.height >= MIN_HEIGHT`.
//! - `style.transparency` is within `[0.0, 1.0]`, `style.margin <= MAX_MARGIN`.

use crate::model::color::Color;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;

pub const MIN_WIDTH: i32 = 50;
pub const MIN_HEIGHT: i32 = 30;
pub const MAX_MARGIN: u32 = 50;

pub const DEFAULT_POSITION: Position = Position { x: 50, y: 50 };
pub const DEFAULT_SIZE: Size = Size {
    width: 200,
    height: 150,
};
pub const DEFAULT_TRANSPARENCY: f64 = 1.0;
pub const DEFAULT_MARGIN: u32 = 5;

/// Stable store-issued note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for NoteId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse().map(NoteId)
    }
}

/// Whether the bound widget is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    #[default]
    Shown,
    Hidden,
}

impl NoteStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Shown => Self::Hidden,
            Self::Hidden => Self::Shown,
        }
    }

    pub fn is_shown(self) -> bool {
        self == Self::Shown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shown => "shown",
            Self::Hidden => "hidden",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shown" => Some(Self::Shown),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }
}

impl Display for NoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Desktop coordinates of a note's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns this size raised to the minimum note dimensions.
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_width(self.width),
            height: clamp_height(self.height),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        DEFAULT_SIZE
    }
}

/// Visual style of one note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteStyle {
    /// 1.0 is fully opaque.
    pub transparency: f64,
    #[serde(rename = "backgroundColor")]
    pub background_color: Color,
    pub margin: u32,
}

impl NoteStyle {
    pub fn clamped(self) -> Self {
        Self {
            transparency: clamp_transparency(self.transparency),
            background_color: self.background_color,
            margin: clamp_margin(self.margin),
        }
    }
}

impl Default for NoteStyle {
    fn default() -> Self {
        Self {
            transparency: DEFAULT_TRANSPARENCY,
            background_color: Color::DEFAULT_BACKGROUND,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Canonical persisted note record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub status: NoteStatus,
    /// `None` means unbound; the widget shows a placeholder.
    pub filepath: Option<PathBuf>,
    pub position: Position,
    pub size: Size,
    pub style: NoteStyle,
}

impl Note {
    /// Applies a partial update in memory with the same clamping the store uses.
    pub fn apply(&mut self, fields: &PartialFields) {
        let fields = fields.clamped();
        if let Some(status) = fields.status {
            self.status = status;
        }
        if let Some(filepath) = fields.filepath {
            self.filepath = filepath;
        }
        if let Some(patch) = fields.position {
            self.position.x = patch.x.unwrap_or(self.position.x);
            self.position.y = patch.y.unwrap_or(self.position.y);
        }
        if let Some(patch) = fields.size {
            self.size.width = patch.width.unwrap_or(self.size.width);
            self.size.height = patch.height.unwrap_or(self.size.height);
        }
        if let Some(patch) = fields.style {
            self.style.transparency = patch.transparency.unwrap_or(self.style.transparency);
            self.style.background_color = patch
                .background_color
                .unwrap_or(self.style.background_color);
            self.style.margin = patch.margin.unwrap_or(self.style.margin);
        }
    }

    pub fn is_shown(&self) -> bool {
        self.status.is_shown()
    }
}

/// Create payload; unset fields take documented defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialNote {
    pub status: Option<NoteStatus>,
    pub filepath: Option<PathBuf>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub style: Option<NoteStyle>,
}

impl PartialNote {
    pub fn at(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Resolves defaults and clamps every numeric field.
    pub fn resolve(&self) -> ResolvedNote {
        ResolvedNote {
            status: self.status.unwrap_or_default(),
            filepath: self.filepath.clone(),
            position: self.position.unwrap_or(DEFAULT_POSITION),
            size: self.size.unwrap_or(DEFAULT_SIZE).clamped(),
            style: self.style.unwrap_or_default().clamped(),
        }
    }
}

/// Fully-populated note body that has not been issued an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNote {
    pub status: NoteStatus,
    pub filepath: Option<PathBuf>,
    pub position: Position,
    pub size: Size,
    pub style: NoteStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionPatch {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl From<Position> for PositionPatch {
    fn from(value: Position) -> Self {
        Self {
            x: Some(value.x),
            y: Some(value.y),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizePatch {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl From<Size> for SizePatch {
    fn from(value: Size) -> Self {
        Self {
            width: Some(value.width),
            height: Some(value.height),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StylePatch {
    pub transparency: Option<f64>,
    pub background_color: Option<Color>,
    pub margin: Option<u32>,
}

impl From<NoteStyle> for StylePatch {
    fn from(value: NoteStyle) -> Self {
        Self {
            transparency: Some(value.transparency),
            background_color: Some(value.background_color),
            margin: Some(value.margin),
        }
    }
}

/// Field-scoped update payload. `None` groups and sub-fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFields {
    pub status: Option<NoteStatus>,
    /// `Some(None)` unbinds the file.
    pub filepath: Option<Option<PathBuf>>,
    pub position: Option<PositionPatch>,
    pub size: Option<SizePatch>,
    pub style: Option<StylePatch>,
}

impl PartialFields {
    pub fn status(status: NoteStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn filepath(filepath: Option<PathBuf>) -> Self {
        Self {
            filepath: Some(filepath),
            ..Self::default()
        }
    }

    pub fn position(position: impl Into<PositionPatch>) -> Self {
        Self {
            position: Some(position.into()),
            ..Self::default()
        }
    }

    pub fn size(size: impl Into<SizePatch>) -> Self {
        Self {
            size: Some(size.into()),
            ..Self::default()
        }
    }

    pub fn style(style: impl Into<StylePatch>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: impl Into<PositionPatch>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<SizePatch>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<StylePatch>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.filepath.is_none()
            && self.position.is_none()
            && self.size.is_none()
            && self.style.is_none()
    }

    /// Returns a copy with every present numeric sub-field clamped into range.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        if let Some(size) = out.size.as_mut() {
            size.width = size.width.map(clamp_width);
            size.height = size.height.map(clamp_height);
        }
        if let Some(style) = out.style.as_mut() {
            style.transparency = style.transparency.map(clamp_transparency);
            style.margin = style.margin.map(clamp_margin);
        }
        out
    }
}

pub fn clamp_width(width: i32) -> i32 {
    width.max(MIN_WIDTH)
}

pub fn clamp_height(height: i32) -> i32 {
    height.max(MIN_HEIGHT)
}

/// Non-finite input falls back to fully opaque.
pub fn clamp_transparency(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_TRANSPARENCY
    }
}

pub fn clamp_margin(margin: u32) -> u32 {
    margin.min(MAX_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        let body = PartialNote::default().resolve();
        Note {
            id: NoteId(1),
            status: body.status,
            filepath: body.filepath,
            position: body.position,
            size: body.size,
            style: body.style,
        }
    }

    #[test]
    fn resolve_fills_documented_defaults() {
        let body = PartialNote::default().resolve();
        assert_eq!(body.status, NoteStatus::Shown);
        assert_eq!(body.filepath, None);
        assert_eq!(body.position, Position::new(50, 50));
        assert_eq!(body.size, Size::new(200, 150));
        assert_eq!(body.style.transparency, 1.0);
        assert_eq!(body.style.background_color.to_string(), "#FFFFE0");
        assert_eq!(body.style.margin, 5);
    }

    #[test]
    fn apply_touches_only_present_sub_fields() {
        let mut note = sample();
        note.apply(&PartialFields {
            style: Some(StylePatch {
                margin: Some(12),
                ..StylePatch::default()
            }),
            position: Some(PositionPatch {
                y: Some(300),
                ..PositionPatch::default()
            }),
            ..PartialFields::default()
        });
        assert_eq!(note.style.margin, 12);
        assert_eq!(note.style.transparency, 1.0);
        assert_eq!(note.position, Position::new(50, 300));
        assert_eq!(note.size, Size::new(200, 150));
    }

    #[test]
    fn clamped_raises_size_and_bounds_style() {
        let fields = PartialFields::size(Size::new(10, -4)).with_style(NoteStyle {
            transparency: 3.5,
            background_color: Color::rgb(0, 0, 0),
            margin: 400,
        });
        let clamped = fields.clamped();
        let size = clamped.size.unwrap();
        assert_eq!((size.width, size.height), (Some(MIN_WIDTH), Some(MIN_HEIGHT)));
        let style = clamped.style.unwrap();
        assert_eq!(style.transparency, Some(1.0));
        assert_eq!(style.margin, Some(MAX_MARGIN));
    }

    #[test]
    fn non_finite_transparency_becomes_opaque() {
        assert_eq!(clamp_transparency(f64::NAN), 1.0);
        assert_eq!(clamp_transparency(-0.5), 0.0);
    }

    #[test]
    fn status_toggles_and_parses() {
        assert_eq!(NoteStatus::Shown.toggled(), NoteStatus::Hidden);
        assert_eq!(NoteStatus::parse("hidden"), Some(NoteStatus::Hidden));
        assert_eq!(NoteStatus::parse("Hidden"), None);
    }
}
