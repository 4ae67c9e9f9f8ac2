#![allow(dead_code)]

use desknote_core::config::AppConfig;
use desknote_core::external::{
    CursorHint, EditorLauncher, FilePicker, FsFileSource, LaunchError, NoteContent, NoteSurface,
};
use desknote_core::service::host::SurfaceFactory;
use desknote_core::{Collaborators, NoteContext, NoteStyle, Position, Size};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Surface that records the last value of every presentation call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub geometry: Option<(Position, Size)>,
    pub style: Option<NoteStyle>,
    pub content: Option<NoteContent>,
    pub visible: Option<bool>,
    pub interactive: bool,
    pub cursor: CursorHint,
    pub torn_down: bool,
    pub style_applies: usize,
}

impl NoteSurface for RecordingSurface {
    fn apply_geometry(&mut self, position: Position, size: Size) {
        assert!(!self.torn_down, "surface used after teardown");
        self.geometry = Some((position, size));
    }

    fn apply_style(&mut self, style: &NoteStyle) {
        assert!(!self.torn_down, "surface used after teardown");
        self.style = Some(*style);
        self.style_applies += 1;
    }

    fn show_content(&mut self, content: NoteContent) {
        assert!(!self.torn_down, "surface used after teardown");
        self.content = Some(content);
    }

    fn set_visible(&mut self, visible: bool) {
        assert!(!self.torn_down, "surface used after teardown");
        self.visible = Some(visible);
    }

    fn set_interactive(&mut self, active: bool) {
        assert!(!self.torn_down, "surface used after teardown");
        self.interactive = active;
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        self.cursor = cursor;
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

/// Editor that records launches instead of spawning processes.
#[derive(Debug, Clone, Default)]
pub struct RecordingEditor {
    pub launched: Arc<Mutex<Vec<PathBuf>>>,
    pub reap_calls: Arc<AtomicUsize>,
}

impl RecordingEditor {
    pub fn launches(&self) -> Vec<PathBuf> {
        self.launched.lock().unwrap().clone()
    }
}

impl EditorLauncher for RecordingEditor {
    fn launch(&self, path: &Path) -> Result<(), LaunchError> {
        if !path.exists() {
            return Err(LaunchError::MissingFile(path.to_path_buf()));
        }
        self.launched.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn reap_finished(&self) -> usize {
        self.reap_calls.fetch_add(1, Ordering::SeqCst);
        0
    }
}

/// Picker that returns a fixed answer.
pub struct FixedPicker(pub Option<PathBuf>);

impl FilePicker for FixedPicker {
    fn pick(&mut self, _start_dir: Option<&Path>) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub fn collaborators(editor: &RecordingEditor) -> Collaborators {
    Collaborators {
        files: Box::new(FsFileSource),
        editor: Box::new(editor.clone()),
    }
}

pub fn memory_context() -> NoteContext {
    NoteContext::open_in_memory().unwrap()
}

/// Context over a file database, so several contexts can share one store.
pub fn file_context(db_path: &Path) -> NoteContext {
    let config = AppConfig {
        db_path: db_path.to_path_buf(),
        ..AppConfig::default()
    };
    NoteContext::open(config).unwrap()
}

#[derive(Default)]
pub struct RecordingFactory {
    pub editor: RecordingEditor,
}

impl SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create_surface(&mut self) -> RecordingSurface {
        RecordingSurface::default()
    }

    fn collaborators(&mut self, _config: &AppConfig) -> Collaborators {
        collaborators(&self.editor)
    }
}
