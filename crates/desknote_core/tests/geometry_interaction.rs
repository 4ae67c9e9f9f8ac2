mod common;

use common::{collaborators, memory_context, RecordingEditor, RecordingSurface};
use desknote_core::external::CursorHint;
use desknote_core::service::geometry::GeometryCommit;
use desknote_core::{
    NoteId, NoteInstanceController, NoteStyle, PartialNote, Point, PointerOutcome, Position, Size,
};

fn instance() -> NoteInstanceController<RecordingSurface> {
    let editor = RecordingEditor::default();
    NoteInstanceController::initialize(
        memory_context(),
        RecordingSurface::default(),
        collaborators(&editor),
        None,
    )
}

#[test]
fn resize_below_minimum_persists_minimum_size() {
    let ctx = memory_context();
    let editor = RecordingEditor::default();
    let mut note = NoteInstanceController::initialize(
        ctx.clone(),
        RecordingSurface::default(),
        collaborators(&editor),
        None,
    );
    let id = note.note_id().unwrap();
    let stored = ctx.store().get(id).unwrap().unwrap();
    assert_eq!(stored.style, NoteStyle::default());
    assert_eq!(stored.size, Size::new(200, 150));

    note.toggle_interactive().unwrap();
    // Grab the bottom-right corner and pull it to 40x20.
    let origin = stored.position;
    let press_global = Point::new(origin.x + 199, origin.y + 149);
    assert_eq!(
        note.pointer_press(Point::new(199, 149), press_global),
        PointerOutcome::GestureStarted
    );
    note.pointer_motion(Point::new(press_global.x - 160, press_global.y - 130));
    assert_eq!(note.surface().geometry.unwrap().1, Size::new(50, 30));
    note.pointer_release().unwrap();

    let stored = ctx.store().get(id).unwrap().unwrap();
    assert_eq!(stored.size, Size::new(50, 30));
    assert_eq!(stored.position, origin);
}

#[test]
fn drag_moves_and_persists_on_release() {
    let ctx = memory_context();
    let editor = RecordingEditor::default();
    let mut note = NoteInstanceController::initialize(
        ctx.clone(),
        RecordingSurface::default(),
        collaborators(&editor),
        None,
    );
    let id = note.note_id().unwrap();

    note.toggle_interactive().unwrap();
    note.pointer_press(Point::new(100, 75), Point::new(150, 125));
    note.pointer_motion(Point::new(170, 135));
    note.pointer_motion(Point::new(250, 325));
    assert_eq!(
        note.surface().geometry,
        Some((Position::new(150, 250), Size::new(200, 150)))
    );
    // Nothing is written until release.
    assert_eq!(
        ctx.store().get(id).unwrap().unwrap().position,
        Position::new(50, 50)
    );

    note.pointer_release().unwrap();
    assert_eq!(
        ctx.store().get(id).unwrap().unwrap().position,
        Position::new(150, 250)
    );
}

#[test]
fn focus_loss_mid_gesture_persists_and_exits_interactive_mode() {
    let ctx = memory_context();
    let editor = RecordingEditor::default();
    let mut note = NoteInstanceController::initialize(
        ctx.clone(),
        RecordingSurface::default(),
        collaborators(&editor),
        None,
    );
    let id = note.note_id().unwrap();

    note.toggle_interactive().unwrap();
    assert!(note.surface().interactive);
    note.pointer_press(Point::new(1, 75), Point::new(51, 125));
    note.pointer_motion(Point::new(21, 125));
    note.pointer_left().unwrap();

    assert!(!note.is_interactive());
    assert!(!note.surface().interactive);
    assert_eq!(note.surface().cursor, CursorHint::Arrow);
    let stored = ctx.store().get(id).unwrap().unwrap();
    assert_eq!(stored.size, Size::new(230, 150));
    assert_eq!(stored.position, Position::new(20, 50));
}

#[test]
fn leaving_interactive_mode_while_idle_writes_nothing() {
    let ctx = memory_context();
    let id = ctx.store().create(&PartialNote::default()).unwrap();
    let editor = RecordingEditor::default();
    let mut note = NoteInstanceController::initialize(
        ctx.clone(),
        RecordingSurface::default(),
        collaborators(&editor),
        Some(id),
    );

    note.toggle_interactive().unwrap();
    ctx.store()
        .update(
            id,
            &desknote_core::PartialFields::position(Position::new(999, 999)),
        )
        .unwrap();
    assert!(!note.toggle_interactive().unwrap());
    assert_eq!(
        ctx.store().get(id).unwrap().unwrap().position,
        Position::new(999, 999)
    );
}

#[test]
fn press_outside_interactive_mode_requests_activation() {
    let mut note = instance();
    assert_eq!(
        note.pointer_press(Point::new(100, 75), Point::new(150, 125)),
        PointerOutcome::Activate
    );
}

#[test]
fn hover_updates_cursor_hint() {
    let mut note = instance();
    note.pointer_hover(Point::new(1, 1));
    assert_eq!(note.surface().cursor, CursorHint::Arrow);

    note.toggle_interactive().unwrap();
    note.pointer_hover(Point::new(199, 1));
    assert_eq!(note.surface().cursor, CursorHint::ResizeDiagonalUp);
    note.pointer_hover(Point::new(0, 75));
    assert_eq!(note.surface().cursor, CursorHint::ResizeHorizontal);
    note.pointer_hover(Point::new(100, 75));
    assert_eq!(note.surface().cursor, CursorHint::Move);
}

#[test]
fn commit_for_deleted_note_is_discarded_silently() {
    let ctx = memory_context();
    let id = ctx.store().create(&PartialNote::default()).unwrap();
    ctx.store().delete(id).unwrap();

    let commit = GeometryCommit {
        position: Some(Position::new(1, 1)),
        size: None,
    };
    assert!(!commit.persist(ctx.store(), id).unwrap());
    assert!(!commit.persist(ctx.store(), NoteId(999)).unwrap());
}

#[test]
fn release_after_concurrent_delete_does_not_fail() {
    let ctx = memory_context();
    let editor = RecordingEditor::default();
    let mut note = NoteInstanceController::initialize(
        ctx.clone(),
        RecordingSurface::default(),
        collaborators(&editor),
        None,
    );
    let id = note.note_id().unwrap();

    note.toggle_interactive().unwrap();
    note.pointer_press(Point::new(100, 75), Point::new(100, 75));
    note.pointer_motion(Point::new(130, 75));
    ctx.store().delete(id).unwrap();

    note.pointer_release().unwrap();
    assert!(ctx.store().get(id).unwrap().is_none());
}
