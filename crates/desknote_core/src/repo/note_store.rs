//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide durable CRUD over `notes` addressed by `NoteId`.
//! - Keep the durable change log (`note_changes`) used for cross-process sync.
//!
//! # Invariants
//! - Writes clamp numeric fields into range before SQL mutations.
//! - `update` only touches columns present in the `PartialFields` payload.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Ids come from `AUTOINCREMENT` and are never reused after deletion.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{
    Note, NoteId, NoteStatus, NoteStyle, PartialFields, PartialNote, Position, Size, MAX_MARGIN,
    MIN_HEIGHT, MIN_WIDTH,
};
use crate::sync::NoteEvent;
use log::{debug, error, info};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    status,
    filepath,
    position_x,
    position_y,
    width,
    height,
    transparency,
    background_color,
    margin
FROM notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for note persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// Operation referenced an id that does not exist. Recoverable.
    NotFound(NoteId),
    /// I/O-level storage failure. Callers must not assume the write landed.
    Db(DbError),
    /// Persisted row could not be decoded into a valid note.
    InvalidData(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Db(err) => write!(f, "storage error: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One entry of the durable change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub seq: i64,
    pub event: NoteEvent,
    /// Origin id of the context that published the change.
    pub origin: String,
}

/// Append-only log of note events, shared across processes through the store.
pub trait ChangeLog {
    /// Appends one event and returns its sequence number.
    fn append_change(&self, event: &NoteEvent, origin: &str) -> StoreResult<i64>;
    /// Returns records with `seq > after`, oldest first.
    fn changes_after(&self, after: i64) -> StoreResult<Vec<ChangeRecord>>;
    /// Returns the newest sequence number, or 0 when the log is empty.
    fn latest_change_seq(&self) -> StoreResult<i64>;
    /// Deletes records created before `cutoff_ms` (Unix millis). Returns how
    /// many were removed.
    fn prune_changes(&self, cutoff_ms: i64) -> StoreResult<usize>;
}

/// Repository interface for note CRUD operations.
pub trait NoteStore: ChangeLog + Send + Sync {
    /// Fills unset fields with defaults, persists, returns the new id.
    fn create(&self, initial: &PartialNote) -> StoreResult<NoteId>;
    /// Returns `Ok(None)` when `id` does not exist.
    fn get(&self, id: NoteId) -> StoreResult<Option<Note>>;
    /// All notes in insertion order.
    fn list_all(&self) -> StoreResult<Vec<Note>>;
    /// Applies only the fields present in `fields`.
    fn update(&self, id: NoteId, fields: &PartialFields) -> StoreResult<()>;
    fn delete(&self, id: NoteId) -> StoreResult<()>;
}

/// SQLite-backed note store; one serialized connection per store handle.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Wraps a migrated/ready connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement cannot leave SQLite half-written, so a
        // poisoned lock still guards a consistent connection.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NoteStore for SqliteNoteStore {
    fn create(&self, initial: &PartialNote) -> StoreResult<NoteId> {
        let body = initial.resolve();
        let filepath = body.filepath.as_deref().map(path_to_db).transpose()?;
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO notes (
                status,
                filepath,
                position_x,
                position_y,
                width,
                height,
                transparency,
                background_color,
                margin
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                body.status.as_str(),
                filepath,
                body.position.x,
                body.position.y,
                body.size.width,
                body.size.height,
                body.style.transparency,
                body.style.background_color.to_string(),
                body.style.margin,
            ],
        );

        if let Err(err) = result {
            error!("event=note_create module=repo status=error error={err}");
            return Err(err.into());
        }

        let id = NoteId(conn.last_insert_rowid());
        info!("event=note_create module=repo status=ok note_id={id}");
        Ok(id)
    }

    fn get(&self, id: NoteId) -> StoreResult<Option<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.0])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn list_all(&self) -> StoreResult<Vec<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn update(&self, id: NoteId, fields: &PartialFields) -> StoreResult<()> {
        let fields = fields.clamped();
        let (assignments, mut bind_values) = update_assignments(&fields)?;
        let conn = self.conn();

        if assignments.is_empty() {
            // Nothing to write; still report whether the id exists.
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
                [id.0],
                |row| row.get(0),
            )?;
            return if exists == 1 {
                Ok(())
            } else {
                Err(StoreError::NotFound(id))
            };
        }

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
        bind_values.push(Value::Integer(id.0));

        let changed = match conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(changed) => changed,
            Err(err) => {
                error!("event=note_update module=repo status=error note_id={id} error={err}");
                return Err(err.into());
            }
        };

        if changed == 0 {
            debug!("event=note_update module=repo status=not_found note_id={id}");
            return Err(StoreError::NotFound(id));
        }

        debug!(
            "event=note_update module=repo status=ok note_id={id} columns={}",
            assignments.len()
        );
        Ok(())
    }

    fn delete(&self, id: NoteId) -> StoreResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM notes WHERE id = ?1;", [id.0])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("event=note_delete module=repo status=ok note_id={id}");
        Ok(())
    }
}

impl ChangeLog for SqliteNoteStore {
    fn append_change(&self, event: &NoteEvent, origin: &str) -> StoreResult<i64> {
        let (kind, status) = match event {
            NoteEvent::StatusChanged { status, .. } => ("status_changed", Some(status.as_str())),
            NoteEvent::NoteDeleted { .. } => ("note_deleted", None),
        };
        let conn = self.conn();
        conn.execute(
            "INSERT INTO note_changes (note_id, kind, status, origin)
             VALUES (?1, ?2, ?3, ?4);",
            params![event.note_id().0, kind, status, origin],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn changes_after(&self, after: i64) -> StoreResult<Vec<ChangeRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT seq, note_id, kind, status, origin
             FROM note_changes
             WHERE seq > ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([after])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_change_row(row)?);
        }
        Ok(records)
    }

    fn latest_change_seq(&self) -> StoreResult<i64> {
        let seq = self.conn().query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM note_changes;",
            [],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    fn prune_changes(&self, cutoff_ms: i64) -> StoreResult<usize> {
        let removed = self.conn().execute(
            "DELETE FROM note_changes WHERE created_at < ?1;",
            [cutoff_ms],
        )?;
        debug!("event=change_prune module=repo status=ok removed={removed} cutoff_ms={cutoff_ms}");
        Ok(removed)
    }
}

/// Builds `column = ?` fragments for every present sub-field.
fn update_assignments(fields: &PartialFields) -> StoreResult<(Vec<&'static str>, Vec<Value>)> {
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    let mut push = |column: &'static str, value: Value| {
        assignments.push(column);
        values.push(value);
    };

    if let Some(status) = fields.status {
        push("status = ?", Value::Text(status.as_str().to_string()));
    }
    if let Some(filepath) = fields.filepath.as_ref() {
        let value = match filepath {
            Some(path) => path_to_db(path)?,
            None => Value::Null,
        };
        push("filepath = ?", value);
    }
    if let Some(position) = fields.position {
        if let Some(x) = position.x {
            push("position_x = ?", Value::Integer(i64::from(x)));
        }
        if let Some(y) = position.y {
            push("position_y = ?", Value::Integer(i64::from(y)));
        }
    }
    if let Some(size) = fields.size {
        if let Some(width) = size.width {
            push("width = ?", Value::Integer(i64::from(width)));
        }
        if let Some(height) = size.height {
            push("height = ?", Value::Integer(i64::from(height)));
        }
    }
    if let Some(style) = fields.style {
        if let Some(transparency) = style.transparency {
            push("transparency = ?", Value::Real(transparency));
        }
        if let Some(color) = style.background_color {
            push("background_color = ?", Value::Text(color.to_string()));
        }
        if let Some(margin) = style.margin {
            push("margin = ?", Value::Integer(i64::from(margin)));
        }
    }

    Ok((assignments, values))
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let id = NoteId(row.get("id")?);

    let status_text: String = row.get("status")?;
    let status = NoteStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` for note {id}"))
    })?;

    let width: i32 = row.get("width")?;
    let height: i32 = row.get("height")?;
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(StoreError::InvalidData(format!(
            "size {width}x{height} below minimum for note {id}"
        )));
    }

    let transparency: f64 = row.get("transparency")?;
    if !(0.0..=1.0).contains(&transparency) {
        return Err(StoreError::InvalidData(format!(
            "transparency {transparency} out of range for note {id}"
        )));
    }

    let color_text: String = row.get("background_color")?;
    let background_color = color_text.parse().map_err(|_| {
        StoreError::InvalidData(format!("invalid color `{color_text}` for note {id}"))
    })?;

    let margin_raw: i64 = row.get("margin")?;
    let margin = u32::try_from(margin_raw)
        .ok()
        .filter(|margin| *margin <= MAX_MARGIN)
        .ok_or_else(|| {
            StoreError::InvalidData(format!("margin {margin_raw} out of range for note {id}"))
        })?;

    Ok(Note {
        id,
        status,
        filepath: path_from_db(row.get_ref("filepath")?, id)?,
        position: Position::new(row.get("position_x")?, row.get("position_y")?),
        size: Size::new(width, height),
        style: NoteStyle {
            transparency,
            background_color,
            margin,
        },
    })
}

fn parse_change_row(row: &Row<'_>) -> StoreResult<ChangeRecord> {
    let seq: i64 = row.get("seq")?;
    let note_id = NoteId(row.get("note_id")?);
    let kind: String = row.get("kind")?;
    let event = match kind.as_str() {
        "status_changed" => {
            let status_text: Option<String> = row.get("status")?;
            let status = status_text
                .as_deref()
                .and_then(NoteStatus::parse)
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("change {seq} has no valid status"))
                })?;
            NoteEvent::StatusChanged { note_id, status }
        }
        "note_deleted" => NoteEvent::NoteDeleted { note_id },
        other => {
            return Err(StoreError::InvalidData(format!(
                "unknown change kind `{other}` at seq {seq}"
            )));
        }
    };

    Ok(ChangeRecord {
        seq,
        event,
        origin: row.get("origin")?,
    })
}

/// Unicode paths are stored as TEXT. Anything else keeps its raw OS bytes
/// in a BLOB so the exact file is reopened later.
fn path_to_db(path: &Path) -> StoreResult<Value> {
    if let Some(text) = path.to_str() {
        return Ok(Value::Text(text.to_string()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(Value::Blob(path.as_os_str().as_bytes().to_vec()))
    }
    #[cfg(not(unix))]
    {
        Err(StoreError::InvalidData(format!(
            "file path `{}` is not valid unicode",
            path.display()
        )))
    }
}

fn path_from_db(value: ValueRef<'_>, id: NoteId) -> StoreResult<Option<PathBuf>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes_to_path(bytes)
            .map(Some)
            .ok_or_else(|| StoreError::InvalidData(format!("undecodable filepath for note {id}"))),
        ValueRef::Integer(_) | ValueRef::Real(_) => Err(StoreError::InvalidData(format!(
            "filepath for note {id} is not text"
        ))),
    }
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}
