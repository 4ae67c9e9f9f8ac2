use std::path::PathBuf;

use desknote_core::external::ensure_file_exists;
use desknote_core::model::note::{PositionPatch, SizePatch, StylePatch};
use desknote_core::repo::note_store::ChangeLog;
use desknote_core::{
    next_position, AppConfig, Color, NoteContext, NoteEvent, NoteId, NoteStatus, NotesOverview,
    PartialFields, PartialNote, Position, Size, StoreError,
};
use serde_json::json;

use crate::cli::CliError;

/// Loads config, applies CLI overrides, starts logging and opens the store.
pub fn open_context(
    db: Option<PathBuf>,
    config_path: Option<PathBuf>,
    log_level: Option<String>,
) -> Result<NoteContext, CliError> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    };
    if let Some(db) = db {
        config.db_path = db;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }

    if let Err(err) = desknote_core::init_logging_from(&config) {
        eprintln!("Warning: logging disabled: {err}");
    }

    Ok(NoteContext::open(config)?)
}

fn parse_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse()
        .map_err(|_| CliError::Invalid(format!("not a note id: `{raw}`")))
}

pub fn handle_list(ctx: &NoteContext, json: bool) -> Result<(), CliError> {
    let notes = ctx.store().list_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes.");
        return Ok(());
    }
    for note in notes {
        let file = note
            .filepath
            .as_deref()
            .map_or_else(|| "(no file)".to_string(), |path| path.display().to_string());
        println!(
            "{:>4}  {:<6}  {:>5},{:<5}  {}x{}  {}",
            note.id,
            note.status,
            note.position.x,
            note.position.y,
            note.size.width,
            note.size.height,
            file
        );
    }
    Ok(())
}

pub fn handle_add(ctx: &NoteContext, file: Option<PathBuf>) -> Result<(), CliError> {
    if let Some(path) = file.as_deref() {
        ensure_file_exists(path)?;
    }

    let existing = ctx.store().list_all()?;
    let initial = PartialNote {
        filepath: file,
        position: Some(next_position(&existing)),
        style: Some(ctx.config().default_style),
        ..PartialNote::default()
    };
    let id = ctx.store().create(&initial)?;
    println!("Created note {id}");
    Ok(())
}

pub fn handle_set_status(ctx: &NoteContext, id: &str, status: NoteStatus) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let mut overview = NotesOverview::open(ctx.clone())?;
    overview.set_status(id, status)?;
    println!("Note {id} is now {status}");
    Ok(())
}

pub fn handle_toggle(ctx: &NoteContext, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let mut overview = NotesOverview::open(ctx.clone())?;
    let status = overview.toggle_status(id)?;
    println!("Note {id} is now {status}");
    Ok(())
}

pub fn handle_delete(ctx: &NoteContext, id: &str) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let mut overview = NotesOverview::open(ctx.clone())?;
    overview.delete(id)?;
    println!("Deleted note {id}");
    Ok(())
}

pub fn handle_move(ctx: &NoteContext, id: &str, x: i32, y: i32) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let fields = PartialFields::position(PositionPatch::from(Position::new(x, y)));
    ctx.store().update(id, &fields)?;
    println!("Moved note {id} to {x},{y}");
    Ok(())
}

pub fn handle_resize(ctx: &NoteContext, id: &str, width: i32, height: i32) -> Result<(), CliError> {
    let id = parse_id(id)?;
    let size = Size::new(width, height).clamped();
    ctx.store()
        .update(id, &PartialFields::size(SizePatch::from(size)))?;
    println!("Resized note {id} to {}x{}", size.width, size.height);
    Ok(())
}

pub fn handle_style(
    ctx: &NoteContext,
    id: &str,
    transparency: Option<f64>,
    color: Option<String>,
    margin: Option<u32>,
) -> Result<(), CliError> {
    let id = parse_id(id)?;
    if transparency.is_some_and(|value| !value.is_finite()) {
        return Err(CliError::Invalid("transparency must be a number".to_string()));
    }
    let background_color = color
        .map(|raw| raw.parse::<Color>())
        .transpose()
        .map_err(|err| CliError::Invalid(err.to_string()))?;

    let patch = StylePatch {
        transparency,
        background_color,
        margin,
    };
    if patch == StylePatch::default() {
        return Err(CliError::Invalid(
            "nothing to change; pass --transparency, --color or --margin".to_string(),
        ));
    }

    ctx.store().update(id, &PartialFields::style(patch))?;
    let style = ctx
        .store()
        .get(id)?
        .ok_or(StoreError::NotFound(id))?
        .style;
    println!(
        "Note {id}: transparency={} color={} margin={}",
        style.transparency, style.background_color, style.margin
    );
    Ok(())
}

pub fn handle_changes(ctx: &NoteContext, after: i64, json: bool) -> Result<(), CliError> {
    let records = ctx.store().changes_after(after)?;

    if json {
        let items: Vec<_> = records
            .iter()
            .map(|record| {
                let status = match record.event {
                    NoteEvent::StatusChanged { status, .. } => Some(status.as_str()),
                    NoteEvent::NoteDeleted { .. } => None,
                };
                json!({
                    "seq": record.seq,
                    "kind": record.event.kind(),
                    "note_id": record.event.note_id(),
                    "status": status,
                    "origin": record.origin,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for record in records {
        match record.event {
            NoteEvent::StatusChanged { note_id, status } => {
                println!("{:>6}  note {note_id} {status}", record.seq);
            }
            NoteEvent::NoteDeleted { note_id } => {
                println!("{:>6}  note {note_id} deleted", record.seq);
            }
        }
    }
    Ok(())
}
