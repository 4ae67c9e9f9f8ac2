//! Lifecycle controller for one running note widget.
//!
//! # Responsibility
//! - Resolve or create the bound note and present it on a `NoteSurface`.
//! - Route user actions to the store, the geometry controller, style
//!   sessions and external collaborators.
//! - React to bus events addressed to its own note id.
//!
//! # Invariants
//! - An instance that cannot resolve its note still presents a failed state.
//! - Status and delete changes made here are always published on the bus.
//! - Once torn down, the surface is never touched again.

use crate::config::AppConfig;
use crate::context::NoteContext;
use crate::external::editor::{CommandEditorLauncher, EditorLauncher, LaunchError};
use crate::external::files::{ensure_file_exists, FilePicker, FileSource, FsFileSource, PickError};
use crate::external::surface::{CursorHint, NoteContent, NoteSurface};
use crate::model::note::{Note, NoteId, NoteStatus, NoteStyle, PartialFields, PartialNote};
use crate::repo::note_store::{StoreError, StoreResult};
use crate::service::geometry::{
    GeometryCommit, GeometryInteractionController, Point, PressOutcome,
};
use crate::service::placement::next_position;
use crate::service::style_session::{StyleChange, StyleEditSession, StyleSessionError};
use crate::sync::{NoteEvent, Subscription};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// External collaborators an instance delegates to.
pub struct Collaborators {
    pub files: Box<dyn FileSource>,
    pub editor: Box<dyn EditorLauncher>,
}

impl Collaborators {
    /// File system reader plus the configured editor command.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            files: Box::new(FsFileSource),
            editor: Box::new(CommandEditorLauncher::new(config.editor_command.clone())),
        }
    }
}

#[derive(Debug)]
pub enum InstanceError {
    /// The instance is failed or torn down and has no usable note.
    Unavailable,
    /// Editor requested but no file is bound.
    NoFileBound,
    /// No style session is open on this instance.
    NoStyleSession,
    Store(StoreError),
    Style(StyleSessionError),
    Pick(PickError),
    Launch(LaunchError),
}

impl Display for InstanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "note instance is not available"),
            Self::NoFileBound => write!(f, "no file is bound to this note"),
            Self::NoStyleSession => write!(f, "no style session is open"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Style(err) => write!(f, "{err}"),
            Self::Pick(err) => write!(f, "{err}"),
            Self::Launch(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InstanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Style(err) => Some(err),
            Self::Pick(err) => Some(err),
            Self::Launch(err) => Some(err),
            Self::Unavailable | Self::NoFileBound | Self::NoStyleSession => None,
        }
    }
}

impl From<StoreError> for InstanceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<StyleSessionError> for InstanceError {
    fn from(value: StyleSessionError) -> Self {
        Self::Style(value)
    }
}

impl From<PickError> for InstanceError {
    fn from(value: PickError) -> Self {
        Self::Pick(value)
    }
}

impl From<LaunchError> for InstanceError {
    fn from(value: LaunchError) -> Self {
        Self::Launch(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Active(NoteId),
    /// Startup could not resolve or create a note.
    Failed(String),
    TornDown,
}

/// Result of an action the host may need to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    Cancelled,
    /// Ask the host to spawn a sibling instance for a new note.
    SpawnRequested,
}

/// What a pointer press turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Not in interactive mode; call `activate`.
    Activate,
    GestureStarted,
    Ignored,
}

pub struct NoteInstanceController<S: NoteSurface> {
    ctx: NoteContext,
    surface: S,
    collaborators: Collaborators,
    state: InstanceState,
    note: Option<Note>,
    geometry: Option<GeometryInteractionController>,
    style_session: Option<StyleEditSession>,
    subscription: Option<Subscription>,
}

impl<S: NoteSurface> NoteInstanceController<S> {
    /// Binds to `bound`, or creates a placed note when it is `None` or gone.
    ///
    /// Never fails: storage errors leave the instance in `Failed` with an
    /// error shown on the surface.
    pub fn initialize(
        ctx: NoteContext,
        surface: S,
        collaborators: Collaborators,
        bound: Option<NoteId>,
    ) -> Self {
        let mut controller = Self {
            ctx,
            surface,
            collaborators,
            state: InstanceState::TornDown,
            note: None,
            geometry: None,
            style_session: None,
            subscription: None,
        };

        match resolve_note(&controller.ctx, bound) {
            Ok(note) => controller.adopt(note),
            Err(err) => {
                error!(
                    "event=instance_init module=service status=error bound={} error={err}",
                    bound.map_or_else(|| "none".to_string(), |id| id.to_string())
                );
                let message = err.to_string();
                controller.surface.show_content(NoteContent::Failed(message.clone()));
                controller.surface.set_visible(true);
                controller.state = InstanceState::Failed(message);
            }
        }
        controller
    }

    fn adopt(&mut self, note: Note) {
        let id = note.id;
        self.subscription = Some(self.ctx.bus().subscribe(id));
        self.geometry = Some(GeometryInteractionController::new(note.position, note.size));
        self.state = InstanceState::Active(id);
        self.note = Some(note);
        self.present();
        info!("event=instance_init module=service status=ok note_id={id}");
    }

    /// Pushes the whole cached note to the surface.
    fn present(&mut self) {
        let Some(note) = self.note.as_ref() else {
            return;
        };
        let content = self.load_content(note);
        self.surface.apply_geometry(note.position, note.size);
        self.surface.apply_style(&note.style);
        self.surface.show_content(content);
        self.surface.set_interactive(false);
        self.surface.set_visible(note.is_shown());
    }

    fn load_content(&self, note: &Note) -> NoteContent {
        match note.filepath.as_deref() {
            None => NoteContent::Placeholder,
            Some(path) => NoteContent::for_file(path, self.collaborators.files.read(path)),
        }
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    pub fn note_id(&self) -> Option<NoteId> {
        match self.state {
            InstanceState::Active(id) => Some(id),
            InstanceState::Failed(_) | InstanceState::TornDown => None,
        }
    }

    /// Last known note state as seen by this instance.
    pub fn note(&self) -> Option<&Note> {
        self.note.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state == InstanceState::TornDown
    }

    pub fn is_interactive(&self) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(GeometryInteractionController::is_interactive)
    }

    pub fn has_style_session(&self) -> bool {
        self.style_session.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn active_id(&self) -> Result<NoteId, InstanceError> {
        self.note_id().ok_or(InstanceError::Unavailable)
    }

    fn update_cached(&mut self, fields: &PartialFields) {
        if let Some(note) = self.note.as_mut() {
            note.apply(fields);
        }
    }

    /// Re-reads the note from the store and re-presents it.
    ///
    /// A note that disappeared from the store tears the instance down.
    pub fn refresh(&mut self) -> Result<(), InstanceError> {
        let id = self.active_id()?;
        match self.ctx.store().get(id)? {
            Some(note) => {
                if let Some(geometry) = self.geometry.as_mut() {
                    geometry.sync_geometry(note.position, note.size);
                }
                self.note = Some(note);
                self.present();
            }
            None => self.teardown(),
        }
        Ok(())
    }

    /// Primary click: open the bound file, or pick one when unbound.
    pub fn activate(
        &mut self,
        picker: &mut dyn FilePicker,
    ) -> Result<ActionOutcome, InstanceError> {
        let has_file = self
            .note
            .as_ref()
            .is_some_and(|note| note.filepath.is_some());
        if has_file {
            self.open_in_editor()
        } else {
            self.select_file(picker)
        }
    }

    /// Picks a file, creating it empty when missing, and binds it.
    ///
    /// Creation failure is returned and the binding is left unchanged.
    pub fn select_file(
        &mut self,
        picker: &mut dyn FilePicker,
    ) -> Result<ActionOutcome, InstanceError> {
        let id = self.active_id()?;
        let start_dir = self
            .note
            .as_ref()
            .and_then(|note| note.filepath.as_deref())
            .and_then(|path| path.parent())
            .map(|dir| dir.to_path_buf());

        let Some(path) = picker.pick(start_dir.as_deref()) else {
            return Ok(ActionOutcome::Cancelled);
        };

        if let Err(err) = ensure_file_exists(&path) {
            warn!("event=select_file module=service status=error note_id={id} error={err}");
            return Err(err.into());
        }

        let fields = PartialFields::filepath(Some(path));
        self.ctx.store().update(id, &fields)?;
        self.update_cached(&fields);
        if let Some(note) = self.note.as_ref() {
            let content = self.load_content(note);
            self.surface.show_content(content);
        }
        info!("event=select_file module=service status=ok note_id={id}");
        Ok(ActionOutcome::Done)
    }

    /// Launches the external editor for the bound file.
    pub fn open_in_editor(&mut self) -> Result<ActionOutcome, InstanceError> {
        let id = self.active_id()?;
        let path = self
            .note
            .as_ref()
            .and_then(|note| note.filepath.clone())
            .ok_or(InstanceError::NoFileBound)?;

        if let Err(err) = self.collaborators.editor.launch(&path) {
            warn!("event=open_editor module=service status=error note_id={id} error={err}");
            return Err(err.into());
        }
        Ok(ActionOutcome::Done)
    }

    /// Reloads and re-displays the bound file's content.
    pub fn reload_content(&mut self) {
        if let Some(note) = self.note.as_ref() {
            let content = self.load_content(note);
            self.surface.show_content(content);
        }
    }

    pub fn request_new_note(&self) -> ActionOutcome {
        ActionOutcome::SpawnRequested
    }

    /// Arms or disarms geometry editing. Disarming mid-gesture persists it.
    pub fn toggle_interactive(&mut self) -> Result<bool, InstanceError> {
        self.active_id()?;
        let Some(geometry) = self.geometry.as_mut() else {
            return Err(InstanceError::Unavailable);
        };
        let commit = geometry.toggle_interactive();
        let interactive = geometry.is_interactive();

        self.surface.set_interactive(interactive);
        if !interactive {
            self.surface.set_cursor(CursorHint::Arrow);
        }
        self.persist_geometry(commit)?;
        Ok(interactive)
    }

    pub fn pointer_hover(&mut self, local: Point) {
        if let Some(geometry) = self.geometry.as_ref() {
            let cursor = geometry.hover(local);
            self.surface.set_cursor(cursor);
        }
    }

    pub fn pointer_press(&mut self, local: Point, global: Point) -> PointerOutcome {
        let Some(geometry) = self.geometry.as_mut() else {
            return PointerOutcome::Ignored;
        };
        match geometry.press(local, global) {
            PressOutcome::PrimaryAction => PointerOutcome::Activate,
            PressOutcome::GestureStarted(zone) => {
                self.surface.set_cursor(zone.cursor());
                PointerOutcome::GestureStarted
            }
            PressOutcome::Ignored => PointerOutcome::Ignored,
        }
    }

    pub fn pointer_motion(&mut self, global: Point) {
        let Some(geometry) = self.geometry.as_mut() else {
            return;
        };
        if let Some((position, size)) = geometry.motion(global) {
            self.surface.apply_geometry(position, size);
        }
    }

    pub fn pointer_release(&mut self) -> Result<(), InstanceError> {
        let commit = self.geometry.as_mut().and_then(|geometry| geometry.release());
        self.persist_geometry(commit)
    }

    /// Focus loss: implicit release, then interactive mode is exited.
    pub fn focus_lost(&mut self) -> Result<(), InstanceError> {
        let Some(geometry) = self.geometry.as_mut() else {
            return Ok(());
        };
        let was_interactive = geometry.is_interactive();
        let commit = geometry.focus_lost();
        if was_interactive {
            self.surface.set_interactive(false);
            self.surface.set_cursor(CursorHint::Arrow);
        }
        self.persist_geometry(commit)
    }

    /// The pointer leaving the widget is handled like focus loss.
    pub fn pointer_left(&mut self) -> Result<(), InstanceError> {
        self.focus_lost()
    }

    fn persist_geometry(&mut self, commit: Option<GeometryCommit>) -> Result<(), InstanceError> {
        let Some(commit) = commit else {
            return Ok(());
        };
        let id = self.active_id()?;
        if commit.persist(self.ctx.store(), id)? {
            self.update_cached(&commit.fields());
        }
        Ok(())
    }

    pub fn open_style_session(&mut self) -> Result<NoteStyle, InstanceError> {
        let id = self.active_id()?;
        let session = StyleEditSession::open(self.ctx.store(), self.ctx.sessions(), id)?;
        let original = session.original();
        self.style_session = Some(session);
        Ok(original)
    }

    pub fn preview_style(&mut self, change: StyleChange) -> Result<NoteStyle, InstanceError> {
        let session = self
            .style_session
            .as_mut()
            .ok_or(InstanceError::NoStyleSession)?;
        Ok(session.preview_change(change, &mut self.surface)?)
    }

    pub fn commit_style(&mut self) -> Result<NoteStyle, InstanceError> {
        let session = self
            .style_session
            .take()
            .ok_or(InstanceError::NoStyleSession)?;
        let style = session.commit(self.ctx.store())?;
        self.update_cached(&PartialFields::style(style));
        Ok(style)
    }

    pub fn cancel_style(&mut self) -> Result<NoteStyle, InstanceError> {
        let session = self
            .style_session
            .take()
            .ok_or(InstanceError::NoStyleSession)?;
        let style = session.cancel(self.ctx.store(), &mut self.surface)?;
        self.update_cached(&PartialFields::style(style));
        Ok(style)
    }

    /// Flips visibility in the store, locally, and for every subscriber.
    ///
    /// The flip is based on the stored status; the cached note may be stale
    /// when another process changed it. A note gone from the store tears
    /// this instance down and reports `NotFound`.
    pub fn toggle_visibility(&mut self) -> Result<NoteStatus, InstanceError> {
        let id = self.active_id()?;
        let Some(stored) = self.ctx.store().get(id)? else {
            self.teardown();
            return Err(StoreError::NotFound(id).into());
        };
        let next = stored.status.toggled();

        if let Err(err) = self.ctx.store().update(id, &PartialFields::status(next)) {
            if err.is_not_found() {
                self.teardown();
            }
            return Err(err.into());
        }
        self.apply_status(next);
        self.ctx.publish(NoteEvent::StatusChanged {
            note_id: id,
            status: next,
        });
        info!("event=toggle_visibility module=service status=ok note_id={id} visibility={next}");
        Ok(next)
    }

    /// Deletes the note, announces it, and tears this instance down. No undo.
    pub fn delete(&mut self) -> Result<(), InstanceError> {
        let id = self.active_id()?;
        match self.ctx.store().delete(id) {
            Ok(()) => {
                self.ctx.publish(NoteEvent::NoteDeleted { note_id: id });
            }
            Err(StoreError::NotFound(_)) => {
                warn!("event=note_delete module=service status=already_deleted note_id={id}");
            }
            Err(err) => return Err(err.into()),
        }
        self.teardown();
        Ok(())
    }

    /// Collects exited editor processes launched for this note.
    pub fn reap_editors(&self) -> usize {
        self.collaborators.editor.reap_finished()
    }

    /// Handles every queued bus event for this note. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let events = match self.subscription.as_ref() {
            Some(subscription) => subscription.drain(),
            None => return 0,
        };

        let mut handled = 0;
        for event in events {
            if self.is_torn_down() {
                break;
            }
            match event {
                NoteEvent::StatusChanged { status, .. } => self.apply_status(status),
                NoteEvent::NoteDeleted { note_id } => {
                    info!(
                        "event=instance_teardown module=service status=remote_delete note_id={note_id}"
                    );
                    self.teardown();
                }
            }
            handled += 1;
        }
        handled
    }

    fn apply_status(&mut self, status: NoteStatus) {
        self.update_cached(&PartialFields::status(status));
        self.surface.set_visible(status.is_shown());
    }

    /// Irreversibly releases the surface. Open sessions are dropped unsaved.
    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.style_session = None;
        self.subscription = None;
        self.geometry = None;
        self.surface.teardown();
        self.state = InstanceState::TornDown;
    }
}

fn resolve_note(ctx: &NoteContext, bound: Option<NoteId>) -> StoreResult<Note> {
    let store = ctx.store();
    if let Some(id) = bound {
        if let Some(note) = store.get(id)? {
            return Ok(note);
        }
        warn!("event=instance_init module=service status=not_found note_id={id}");
    }

    let existing = store.list_all()?;
    let initial = PartialNote {
        position: Some(next_position(&existing)),
        style: Some(ctx.config().default_style),
        ..PartialNote::default()
    };
    let id = store.create(&initial)?;
    store.get(id)?.ok_or(StoreError::NotFound(id))
}
