//! Live presentation surface of one note widget.

use crate::external::files::ContentError;
use crate::model::note::{NoteStyle, Position, Size};
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_TEXT: &str = "Select File...";

/// What the widget body should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    /// No file bound yet.
    Placeholder,
    PlainText(String),
    /// Raw markdown source; rendering belongs to the surface.
    Markdown(String),
    Unsupported(PathBuf),
    FileNotFound(PathBuf),
    LoadError(String),
    /// The instance could not resolve or create its note.
    Failed(String),
}

impl NoteContent {
    /// Maps a file read result to displayable content by extension.
    pub fn for_file(path: &Path, read: Result<String, ContentError>) -> Self {
        let text = match read {
            Ok(text) => text,
            Err(ContentError::FileNotFound(path)) => return Self::FileNotFound(path),
            Err(err) => return Self::LoadError(err.to_string()),
        };

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("md") | Some("markdown") => Self::Markdown(text),
            Some("txt") => Self::PlainText(text),
            _ => Self::Unsupported(path.to_path_buf()),
        }
    }

    /// Text a plain surface would show for this content.
    pub fn display_text(&self) -> String {
        match self {
            Self::Placeholder => PLACEHOLDER_TEXT.to_string(),
            Self::PlainText(text) | Self::Markdown(text) => text.clone(),
            Self::Unsupported(path) => format!("Unsupported file type: {}", path.display()),
            Self::FileNotFound(path) => format!("Error: File not found.\n{}", path.display()),
            Self::LoadError(message) => format!("Error loading file: {message}"),
            Self::Failed(message) => format!("Note unavailable: {message}"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::LoadError(_) | Self::Failed(_)
        )
    }
}

/// Pointer cursor shown over the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Arrow,
    Move,
    ResizeHorizontal,
    ResizeVertical,
    /// Top-left / bottom-right diagonal.
    ResizeDiagonalDown,
    /// Top-right / bottom-left diagonal.
    ResizeDiagonalUp,
}

/// The live widget a controller drives.
pub trait NoteSurface {
    fn apply_geometry(&mut self, position: Position, size: Size);
    fn apply_style(&mut self, style: &NoteStyle);
    fn show_content(&mut self, content: NoteContent);
    /// Hidden surfaces stay resident but render nothing.
    fn set_visible(&mut self, visible: bool);
    /// Highlights the widget while geometry interaction is armed.
    fn set_interactive(&mut self, active: bool);
    fn set_cursor(&mut self, cursor: CursorHint);
    /// Irreversible; the surface is never used again afterwards.
    fn teardown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::NoteContent;
    use crate::external::files::ContentError;
    use std::path::Path;

    #[test]
    fn classifies_by_extension() {
        let md = NoteContent::for_file(Path::new("/n/a.MD"), Ok("# hi".into()));
        assert_eq!(md, NoteContent::Markdown("# hi".into()));

        let txt = NoteContent::for_file(Path::new("/n/a.txt"), Ok("hi".into()));
        assert_eq!(txt, NoteContent::PlainText("hi".into()));

        let other = NoteContent::for_file(Path::new("/n/a.rs"), Ok("fn".into()));
        assert_eq!(other, NoteContent::Unsupported("/n/a.rs".into()));
    }

    #[test]
    fn missing_file_maps_to_error_content() {
        let path = Path::new("/n/gone.txt");
        let content =
            NoteContent::for_file(path, Err(ContentError::FileNotFound(path.to_path_buf())));
        assert!(content.is_error());
        assert!(content.display_text().contains("File not found"));
    }
}
