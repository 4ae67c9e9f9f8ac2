//! External editor launcher.

use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};

const FILEPATH_TOKEN: &str = "{filepath}";

#[derive(Debug)]
pub enum LaunchError {
    MissingFile(PathBuf),
    EmptyCommand,
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile(path) => write!(f, "file does not exist: {}", path.display()),
            Self::EmptyCommand => write!(f, "editor command is empty"),
            Self::Spawn { program, source } => write!(f, "failed to start `{program}`: {source}"),
        }
    }
}

impl Error for LaunchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::MissingFile(_) | Self::EmptyCommand => None,
        }
    }
}

/// Fire-and-forget launch of an editor for one file.
pub trait EditorLauncher {
    fn launch(&self, path: &Path) -> Result<(), LaunchError>;

    /// Collects editors that have exited. Returns how many were collected.
    fn reap_finished(&self) -> usize {
        0
    }
}

/// Spawns a command built from a whitespace-separated template.
///
/// Spawned editors are kept until they exit and are collected on the next
/// launch or `reap_finished`. Editors still running when the launcher is
/// dropped are handed to a background waiter.
#[derive(Debug)]
pub struct CommandEditorLauncher {
    template: String,
    children: Mutex<Vec<Child>>,
}

impl CommandEditorLauncher {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            children: Mutex::new(Vec::new()),
        }
    }

    /// Editors spawned by this launcher that have not been collected yet.
    pub fn pending_children(&self) -> usize {
        self.children().len()
    }

    fn children(&self) -> MutexGuard<'_, Vec<Child>> {
        self.children
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Expands the template into argv for `path`.
    ///
    /// Every `{filepath}` token is replaced; without one the path is appended.
    pub fn argv(&self, path: &Path) -> Vec<String> {
        let path_text = path.to_string_lossy();
        let mut argv: Vec<String> = self
            .template
            .split_whitespace()
            .map(|part| part.replace(FILEPATH_TOKEN, &path_text))
            .collect();
        if !self.template.contains(FILEPATH_TOKEN) && !argv.is_empty() {
            argv.push(path_text.into_owned());
        }
        argv
    }
}

impl EditorLauncher for CommandEditorLauncher {
    fn launch(&self, path: &Path) -> Result<(), LaunchError> {
        if !path.exists() {
            return Err(LaunchError::MissingFile(path.to_path_buf()));
        }

        let argv = self.argv(path);
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;

        info!(
            "event=editor_launch module=external status=ok program={program} pid={}",
            child.id()
        );
        let mut children = self.children();
        reap(&mut children);
        children.push(child);
        Ok(())
    }

    fn reap_finished(&self) -> usize {
        reap(&mut self.children())
    }
}

impl Drop for CommandEditorLauncher {
    fn drop(&mut self) {
        let children = std::mem::take(
            self.children
                .get_mut()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if children.is_empty() {
            return;
        }
        let count = children.len();
        let spawned = std::thread::Builder::new()
            .name("editor-waiter".to_string())
            .spawn(move || {
                for mut child in children {
                    let _ = child.wait();
                }
            });
        match spawned {
            Ok(_) => debug!("event=editor_handoff module=external status=ok pending={count}"),
            Err(err) => warn!("event=editor_handoff module=external status=error error={err}"),
        }
    }
}

/// Drops children that have exited.
fn reap(children: &mut Vec<Child>) -> usize {
    let before = children.len();
    children.retain_mut(|child| match child.try_wait() {
        Ok(Some(status)) => {
            debug!(
                "event=editor_exit module=external status=ok pid={} exit={status}",
                child.id()
            );
            false
        }
        Ok(None) => true,
        Err(err) => {
            warn!(
                "event=editor_exit module=external status=error pid={} error={err}",
                child.id()
            );
            false
        }
    });
    before - children.len()
}

#[cfg(test)]
mod tests {
    use super::{CommandEditorLauncher, EditorLauncher, LaunchError};
    use std::path::Path;

    #[test]
    fn argv_substitutes_filepath_token() {
        let launcher = CommandEditorLauncher::new("konsole -e nvim {filepath}");
        assert_eq!(
            launcher.argv(Path::new("/tmp/a.md")),
            vec!["konsole", "-e", "nvim", "/tmp/a.md"]
        );
    }

    #[test]
    fn argv_appends_path_without_token() {
        let launcher = CommandEditorLauncher::new("gedit --new-window");
        assert_eq!(
            launcher.argv(Path::new("/tmp/a.txt")),
            vec!["gedit", "--new-window", "/tmp/a.txt"]
        );
    }

    #[test]
    fn launch_rejects_missing_file_and_empty_command() {
        let launcher = CommandEditorLauncher::new("kate {filepath}");
        assert!(matches!(
            launcher.launch(Path::new("/definitely/not/here.txt")),
            Err(LaunchError::MissingFile(_))
        ));

        let file = tempfile::NamedTempFile::new().unwrap();
        let empty = CommandEditorLauncher::new("   ");
        assert!(matches!(
            empty.launch(file.path()),
            Err(LaunchError::EmptyCommand)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exited_editors_are_collected() {
        use std::time::{Duration, Instant};

        let file = tempfile::NamedTempFile::new().unwrap();
        let launcher = CommandEditorLauncher::new("true {filepath}");
        launcher.launch(file.path()).unwrap();
        launcher.launch(file.path()).unwrap();
        assert!(launcher.pending_children() >= 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut reaped = 0;
        while launcher.pending_children() > 0 && Instant::now() < deadline {
            reaped += launcher.reap_finished();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(launcher.pending_children(), 0);
        assert!((1..=2).contains(&reaped));
    }
}
