//! File content provider and file picker contracts.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ContentError {
    FileNotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for ContentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileNotFound(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Reads the raw text a note is bound to.
pub trait FileSource {
    fn read(&self, path: &Path) -> Result<String, ContentError>;
}

/// Reads UTF-8 text straight from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileSource;

impl FileSource for FsFileSource {
    fn read(&self, path: &Path) -> Result<String, ContentError> {
        std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ContentError::FileNotFound(path.to_path_buf()),
            _ => ContentError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }
}

/// Failure to prepare a picked path for binding.
#[derive(Debug)]
pub enum PickError {
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for PickError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create { path, source } => {
                write!(f, "failed to create `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for PickError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Create { source, .. } => Some(source),
        }
    }
}

/// Native "select or create file" dialog.
pub trait FilePicker {
    /// Returns the chosen path, or `None` when the user cancelled.
    fn pick(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
}

/// Creates an empty file at `path` unless something already exists there.
pub fn ensure_file_exists(path: &Path) -> Result<(), PickError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(PickError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}
