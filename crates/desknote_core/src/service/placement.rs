//! Cascade placement for newly created notes.
//!
//! # Invariants
//! - Pure: only the note count and the last note in store order are consulted.
//! - This is a heuristic, not a packing algorithm; it does not avoid overlap
//!   with anything but the reference note.

use crate::model::note::{Note, Position};

pub const DEFAULT_ORIGIN: Position = Position::new(50, 50);
pub const PLACEMENT_OFFSET: i32 = 20;
/// Every `ROW_LENGTH`-th note starts a new row.
pub const ROW_LENGTH: usize = 3;
/// Above this many notes the dense modular cascade takes over.
pub const DENSE_THRESHOLD: usize = 5;
const DENSE_COLUMNS: usize = 5;
const AVERAGE_HEIGHT: i32 = 150;

/// Suggests the top-left corner for the next note given all existing notes.
pub fn next_position(existing: &[Note]) -> Position {
    let Some(reference) = existing.last() else {
        return DEFAULT_ORIGIN;
    };
    let count = existing.len();

    if count > DENSE_THRESHOLD {
        let column = (count % DENSE_COLUMNS) as i32;
        let row = (count / DENSE_COLUMNS) as i32;
        return Position::new(
            DEFAULT_ORIGIN.x + column * 2 * PLACEMENT_OFFSET,
            DEFAULT_ORIGIN.y + row * (AVERAGE_HEIGHT + PLACEMENT_OFFSET),
        );
    }

    if count % ROW_LENGTH == 0 {
        return Position::new(
            DEFAULT_ORIGIN.x,
            reference
                .position
                .y
                .saturating_add(reference.size.height)
                .saturating_add(PLACEMENT_OFFSET),
        );
    }

    Position::new(
        reference
            .position
            .x
            .saturating_add(reference.size.width)
            .saturating_add(PLACEMENT_OFFSET),
        reference.position.y,
    )
}

#[cfg(test)]
mod tests {
    use super::{next_position, DEFAULT_ORIGIN};
    use crate::model::note::{Note, NoteId, NoteStatus, NoteStyle, Position, Size};

    fn note(id: i64, x: i32, y: i32, width: i32, height: i32) -> Note {
        Note {
            id: NoteId(id),
            status: NoteStatus::Shown,
            filepath: None,
            position: Position::new(x, y),
            size: Size::new(width, height),
            style: NoteStyle::default(),
        }
    }

    #[test]
    fn empty_store_uses_default_origin() {
        assert_eq!(next_position(&[]), DEFAULT_ORIGIN);
    }

    #[test]
    fn second_note_goes_right_of_the_first() {
        let existing = [note(1, 50, 50, 200, 150)];
        assert_eq!(next_position(&existing), Position::new(270, 50));
    }

    #[test]
    fn every_third_note_starts_a_new_row() {
        let existing = [
            note(1, 50, 50, 200, 150),
            note(2, 270, 50, 200, 150),
            note(3, 490, 50, 100, 120),
        ];
        assert_eq!(next_position(&existing), Position::new(50, 190));
    }

    #[test]
    fn many_notes_switch_to_dense_cascade() {
        let existing: Vec<Note> = (1..=7).map(|id| note(id, 900, 900, 200, 150)).collect();
        // 7 notes: column 2, row 1
        assert_eq!(next_position(&existing), Position::new(50 + 2 * 40, 50 + 170));
    }

    #[test]
    fn far_edge_reference_saturates() {
        let existing = vec![note(1, i32::MAX - 5, 10, 200, 150)];
        assert_eq!(next_position(&existing), Position::new(i32::MAX, 10));
    }
}
