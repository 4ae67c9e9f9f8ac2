//! Pointer-driven move/resize state machine for one note widget.
//!
//! # Responsibility
//! - Classify pointer positions into resize zones or the interior.
//! - Turn press/motion/release into live geometry and a final commit.
//!
//! # Invariants
//! - Geometry only changes while interactive mode is armed.
//! - Live and committed sizes never fall below `MIN_WIDTH` x `MIN_HEIGHT`.
//! - Resizing from a left/top zone keeps the opposite edge fixed.
//! - Focus loss or disarming mid-gesture finalizes exactly like a release.

use crate::external::surface::CursorHint;
use crate::model::note::{clamp_height, clamp_width, NoteId, PartialFields, Position, Size};
use crate::repo::note_store::{NoteStore, StoreError, StoreResult};
use log::debug;

/// Width of the resize band along each edge, in pixels.
pub const HANDLE_MARGIN: i32 = 8;

/// Pointer coordinates (widget-local or desktop-global depending on use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }

    pub fn cursor(self) -> CursorHint {
        match self {
            Self::Top | Self::Bottom => CursorHint::ResizeVertical,
            Self::Left | Self::Right => CursorHint::ResizeHorizontal,
            Self::TopLeft | Self::BottomRight => CursorHint::ResizeDiagonalDown,
            Self::TopRight | Self::BottomLeft => CursorHint::ResizeDiagonalUp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Interior,
    Edge(ResizeEdge),
}

impl Zone {
    pub fn cursor(self) -> CursorHint {
        match self {
            Self::Interior => CursorHint::Move,
            Self::Edge(edge) => edge.cursor(),
        }
    }
}

/// Classifies a widget-local pointer position. Returns `None` outside the widget.
///
/// Corner zones win over single edges when both bands match.
pub fn classify_zone(local: Point, size: Size, margin: i32) -> Option<Zone> {
    if local.x < 0 || local.y < 0 || local.x >= size.width || local.y >= size.height {
        return None;
    }

    let top = local.y < margin;
    let bottom = local.y >= size.height.saturating_sub(margin);
    let left = local.x < margin;
    let right = local.x >= size.width.saturating_sub(margin);

    let edge = match (top, bottom, left, right) {
        (true, _, true, _) => ResizeEdge::TopLeft,
        (true, _, _, true) => ResizeEdge::TopRight,
        (_, true, true, _) => ResizeEdge::BottomLeft,
        (_, true, _, true) => ResizeEdge::BottomRight,
        (true, _, _, _) => ResizeEdge::Top,
        (_, true, _, _) => ResizeEdge::Bottom,
        (_, _, true, _) => ResizeEdge::Left,
        (_, _, _, true) => ResizeEdge::Right,
        _ => return Some(Zone::Interior),
    };
    Some(Zone::Edge(edge))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    pointer: Point,
    position: Position,
    size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Dragging,
    Resizing(ResizeEdge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Interactive mode is off; the caller runs the primary click action.
    PrimaryAction,
    GestureStarted(Zone),
    /// Pointer was outside the widget or a gesture is already running.
    Ignored,
}

/// Final geometry of a finished gesture, ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryCommit {
    pub position: Option<Position>,
    pub size: Option<Size>,
}

impl GeometryCommit {
    pub fn fields(&self) -> PartialFields {
        PartialFields {
            position: self.position.map(Into::into),
            size: self.size.map(Into::into),
            ..PartialFields::default()
        }
    }

    /// Writes the commit. Returns `Ok(false)` when the note was deleted
    /// concurrently; that case is discarded silently.
    pub fn persist(&self, store: &dyn NoteStore, id: NoteId) -> StoreResult<bool> {
        match store.update(id, &self.fields()) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound(_)) => {
                debug!("event=geometry_commit module=service status=discarded note_id={id}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

pub struct GeometryInteractionController {
    interactive: bool,
    gesture: Option<(GestureState, Anchor)>,
    position: Position,
    size: Size,
    handle_margin: i32,
}

impl GeometryInteractionController {
    pub fn new(position: Position, size: Size) -> Self {
        Self {
            interactive: false,
            gesture: None,
            position,
            size: size.clamped(),
            handle_margin: HANDLE_MARGIN,
        }
    }

    pub fn with_handle_margin(mut self, margin: i32) -> Self {
        self.handle_margin = margin.max(1);
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn state(&self) -> GestureState {
        self.gesture
            .map_or(GestureState::Idle, |(state, _)| state)
    }

    /// Current live geometry.
    pub fn geometry(&self) -> (Position, Size) {
        (self.position, self.size)
    }

    /// Adopts geometry from outside (store refresh). Ignored mid-gesture.
    pub fn sync_geometry(&mut self, position: Position, size: Size) {
        if self.gesture.is_none() {
            self.position = position;
            self.size = size.clamped();
        }
    }

    /// Arms or disarms interactive mode. Disarming mid-gesture finalizes it.
    pub fn set_interactive(&mut self, interactive: bool) -> Option<GeometryCommit> {
        let commit = if interactive { None } else { self.finish() };
        self.interactive = interactive;
        commit
    }

    pub fn toggle_interactive(&mut self) -> Option<GeometryCommit> {
        self.set_interactive(!self.interactive)
    }

    /// Cursor for a hovering pointer at widget-local `local`.
    pub fn hover(&self, local: Point) -> CursorHint {
        if !self.interactive {
            return CursorHint::Arrow;
        }
        if let Some((GestureState::Resizing(edge), _)) = self.gesture {
            return edge.cursor();
        }
        if self.gesture.is_some() {
            return CursorHint::Move;
        }
        classify_zone(local, self.size, self.handle_margin)
            .map_or(CursorHint::Arrow, Zone::cursor)
    }

    /// Pointer pressed at widget-local `local` / desktop-global `global`.
    pub fn press(&mut self, local: Point, global: Point) -> PressOutcome {
        if !self.interactive {
            return PressOutcome::PrimaryAction;
        }
        if self.gesture.is_some() {
            return PressOutcome::Ignored;
        }
        let Some(zone) = classify_zone(local, self.size, self.handle_margin) else {
            return PressOutcome::Ignored;
        };

        let anchor = Anchor {
            pointer: global,
            position: self.position,
            size: self.size,
        };
        let state = match zone {
            Zone::Interior => GestureState::Dragging,
            Zone::Edge(edge) => GestureState::Resizing(edge),
        };
        self.gesture = Some((state, anchor));
        PressOutcome::GestureStarted(zone)
    }

    /// Pointer moved to desktop-global `global`.
    ///
    /// Returns the new live geometry to apply, or `None` when no gesture runs.
    pub fn motion(&mut self, global: Point) -> Option<(Position, Size)> {
        let (state, anchor) = self.gesture?;
        // Pointer coordinates come from the windowing system unchecked.
        let dx = global.x.saturating_sub(anchor.pointer.x);
        let dy = global.y.saturating_sub(anchor.pointer.y);

        match state {
            GestureState::Idle => return None,
            GestureState::Dragging => {
                self.position = Position::new(
                    anchor.position.x.saturating_add(dx),
                    anchor.position.y.saturating_add(dy),
                );
            }
            GestureState::Resizing(edge) => {
                let (position, size) = resize_from(anchor, edge, dx, dy);
                self.position = position;
                self.size = size;
            }
        }
        Some((self.position, self.size))
    }

    /// Pointer released; ends the gesture and returns what to persist.
    pub fn release(&mut self) -> Option<GeometryCommit> {
        self.finish()
    }

    /// Focus loss or pointer leaving the widget: implicit release, then
    /// interactive mode is exited.
    pub fn focus_lost(&mut self) -> Option<GeometryCommit> {
        let commit = self.finish();
        self.interactive = false;
        commit
    }

    fn finish(&mut self) -> Option<GeometryCommit> {
        let (state, anchor) = self.gesture.take()?;
        let commit = match state {
            GestureState::Idle => return None,
            GestureState::Dragging => GeometryCommit {
                position: Some(self.position),
                size: None,
            },
            GestureState::Resizing(_) => GeometryCommit {
                position: (self.position != anchor.position).then_some(self.position),
                size: Some(self.size),
            },
        };
        Some(commit)
    }
}

fn resize_from(anchor: Anchor, edge: ResizeEdge, dx: i32, dy: i32) -> (Position, Size) {
    let mut position = anchor.position;
    let mut size = anchor.size;

    if edge.moves_left() {
        size.width = clamp_width(anchor.size.width.saturating_sub(dx));
        position.x = anchor
            .position
            .x
            .saturating_add(anchor.size.width.saturating_sub(size.width));
    } else if edge.moves_right() {
        size.width = clamp_width(anchor.size.width.saturating_add(dx));
    }

    if edge.moves_top() {
        size.height = clamp_height(anchor.size.height.saturating_sub(dy));
        position.y = anchor
            .position
            .y
            .saturating_add(anchor.size.height.saturating_sub(size.height));
    } else if edge.moves_bottom() {
        size.height = clamp_height(anchor.size.height.saturating_add(dy));
    }

    (position, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> Size {
        Size::new(200, 150)
    }

    #[test]
    fn classify_detects_all_eight_zones_and_interior() {
        let cases = [
            (Point::new(2, 2), Zone::Edge(ResizeEdge::TopLeft)),
            (Point::new(197, 2), Zone::Edge(ResizeEdge::TopRight)),
            (Point::new(2, 147), Zone::Edge(ResizeEdge::BottomLeft)),
            (Point::new(197, 147), Zone::Edge(ResizeEdge::BottomRight)),
            (Point::new(100, 0), Zone::Edge(ResizeEdge::Top)),
            (Point::new(100, 149), Zone::Edge(ResizeEdge::Bottom)),
            (Point::new(0, 75), Zone::Edge(ResizeEdge::Left)),
            (Point::new(199, 75), Zone::Edge(ResizeEdge::Right)),
            (Point::new(100, 75), Zone::Interior),
            (Point::new(8, 8), Zone::Interior),
        ];
        for (point, expected) in cases {
            assert_eq!(
                classify_zone(point, size(), HANDLE_MARGIN),
                Some(expected),
                "{point:?}"
            );
        }
    }

    #[test]
    fn classify_rejects_points_outside_widget() {
        assert_eq!(classify_zone(Point::new(-1, 10), size(), 8), None);
        assert_eq!(classify_zone(Point::new(200, 10), size(), 8), None);
        assert_eq!(classify_zone(Point::new(10, 150), size(), 8), None);
    }

    #[test]
    fn press_outside_interactive_mode_is_primary_action() {
        let mut geometry = GeometryInteractionController::new(Position::new(0, 0), size());
        assert_eq!(
            geometry.press(Point::new(100, 75), Point::new(100, 75)),
            PressOutcome::PrimaryAction
        );
        assert_eq!(geometry.motion(Point::new(300, 300)), None);
        assert_eq!(geometry.release(), None);
    }

    #[test]
    fn hover_reports_zone_cursor_only_when_armed() {
        let mut geometry = GeometryInteractionController::new(Position::new(0, 0), size());
        assert_eq!(geometry.hover(Point::new(1, 1)), CursorHint::Arrow);
        geometry.set_interactive(true);
        assert_eq!(geometry.hover(Point::new(1, 1)), CursorHint::ResizeDiagonalDown);
        assert_eq!(geometry.hover(Point::new(100, 1)), CursorHint::ResizeVertical);
        assert_eq!(geometry.hover(Point::new(100, 75)), CursorHint::Move);
    }

    #[test]
    fn left_edge_resize_keeps_right_edge_fixed() {
        let mut geometry = GeometryInteractionController::new(Position::new(100, 100), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(1, 75), Point::new(101, 175));
        let (position, new_size) = geometry.motion(Point::new(71, 175)).unwrap();
        assert_eq!(new_size, Size::new(230, 150));
        assert_eq!(position, Position::new(70, 100));
        assert_eq!(position.x + new_size.width, 300);
    }

    #[test]
    fn top_left_shrink_clamps_and_anchors_bottom_right() {
        let mut geometry = GeometryInteractionController::new(Position::new(100, 100), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(1, 1), Point::new(101, 101));
        let (position, new_size) = geometry.motion(Point::new(900, 900)).unwrap();
        assert_eq!(new_size, Size::new(50, 30));
        assert_eq!(position, Position::new(250, 220));

        let commit = geometry.release().unwrap();
        assert_eq!(commit.size, Some(Size::new(50, 30)));
        assert_eq!(commit.position, Some(Position::new(250, 220)));
        assert_eq!(geometry.state(), GestureState::Idle);
    }

    #[test]
    fn bottom_right_resize_commits_size_only() {
        let mut geometry = GeometryInteractionController::new(Position::new(10, 10), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(199, 149), Point::new(209, 159));
        geometry.motion(Point::new(239, 149));
        let commit = geometry.release().unwrap();
        assert_eq!(commit.size, Some(Size::new(230, 140)));
        assert_eq!(commit.position, None);
    }

    #[test]
    fn disarming_mid_gesture_finalizes() {
        let mut geometry = GeometryInteractionController::new(Position::new(0, 0), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(100, 75), Point::new(100, 75));
        geometry.motion(Point::new(130, 95));
        let commit = geometry.set_interactive(false).unwrap();
        assert_eq!(commit.position, Some(Position::new(30, 20)));
        assert!(!geometry.is_interactive());
    }

    #[test]
    fn extreme_pointer_coordinates_saturate() {
        let mut geometry = GeometryInteractionController::new(Position::new(0, 0), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(199, 149), Point::new(199, 149));

        let (_, shrunk) = geometry.motion(Point::new(i32::MIN, i32::MIN)).unwrap();
        assert_eq!(shrunk, Size::new(50, 30));
        let (position, grown) = geometry.motion(Point::new(i32::MAX, i32::MAX)).unwrap();
        assert_eq!(grown, Size::new(i32::MAX, i32::MAX));
        assert_eq!(position, Position::new(0, 0));
        geometry.release().unwrap();

        geometry.sync_geometry(Position::new(-100, -100), size());
        geometry.press(Point::new(1, 1), Point::new(-99, -99));
        let (position, grown) = geometry.motion(Point::new(i32::MIN, i32::MIN)).unwrap();
        assert!(grown.width >= 50 && grown.height >= 30);
        assert!(position.x <= -100 && position.y <= -100);
        let (position, shrunk) = geometry.motion(Point::new(i32::MAX, i32::MAX)).unwrap();
        assert_eq!(shrunk, Size::new(50, 30));
        assert_eq!(position, Position::new(50, 20));
    }

    #[test]
    fn extreme_drag_saturates_position() {
        let mut geometry = GeometryInteractionController::new(Position::new(10, 10), size());
        geometry.set_interactive(true);
        geometry.press(Point::new(100, 75), Point::new(-1000, 1000));
        let (position, _) = geometry.motion(Point::new(i32::MAX, i32::MIN)).unwrap();
        assert_eq!(position, Position::new(i32::MAX, i32::MIN + 10));
    }

    #[test]
    fn negative_handle_margin_does_not_overflow() {
        assert_eq!(
            classify_zone(Point::new(10, 10), size(), i32::MIN),
            Some(Zone::Interior)
        );
    }
}
