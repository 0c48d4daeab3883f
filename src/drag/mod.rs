//! Pointer dragging of note cards across the canvas.
//!
//! The machine never touches the note list itself. It turns pointer events
//! into positions; the caller writes those into the working set and persists
//! the final one when the drag ends.

use crate::models::Point;
use tracing::debug;

/// Rendered size of a note card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CardSize {
    pub width: f64,
    pub height: f64,
}

pub(crate) const CARD_SIZE: CardSize = CardSize {
    width: 100.0,
    height: 100.0,
};

/// Canvas bounds in client (viewport) coordinates, as `getBoundingClientRect` reports them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Client coordinates to canvas coordinates.
    pub fn to_canvas(&self, client: Point) -> Point {
        client - self.origin()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) enum DragState {
    #[default]
    Idle,
    Dragging {
        note_id: i64,
        /// Pointer position minus the card's top-left corner, in canvas space.
        offset: Point,
        pointer: PointerKind,
    },
}

/// New position for a note while it is being dragged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DragMove {
    pub note_id: i64,
    pub position: Point,
}

/// Keep a card fully inside the canvas. A canvas smaller than the card pins it to 0.
pub(crate) fn clamp_to_canvas(p: Point, canvas: &CanvasRect, card: CardSize) -> Point {
    let max_x = (canvas.width - card.width).max(0.0);
    let max_y = (canvas.height - card.height).max(0.0);
    Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct DragMachine {
    state: DragState,
    card: CardSize,
}

impl Default for DragMachine {
    fn default() -> Self {
        Self::new(CARD_SIZE)
    }
}

impl DragMachine {
    pub fn new(card: CardSize) -> Self {
        Self {
            state: DragState::Idle,
            card,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn dragging_id(&self) -> Option<i64> {
        match self.state {
            DragState::Dragging { note_id, .. } => Some(note_id),
            DragState::Idle => None,
        }
    }

    /// Start dragging `note_id`, whose card currently sits at `note_pos`.
    /// A press while another drag is live replaces it.
    pub fn pointer_down(
        &mut self,
        note_id: i64,
        note_pos: Point,
        client: Point,
        canvas: &CanvasRect,
        pointer: PointerKind,
    ) {
        let offset = canvas.to_canvas(client) - note_pos;
        debug!(note_id, ?pointer, "drag start");
        self.state = DragState::Dragging {
            note_id,
            offset,
            pointer,
        };
    }

    /// Position for the dragged card under the pointer, clamped to the canvas.
    /// `None` when idle or when the event comes from a different pointer kind.
    pub fn pointer_move(
        &self,
        client: Point,
        canvas: &CanvasRect,
        pointer: PointerKind,
    ) -> Option<DragMove> {
        let DragState::Dragging {
            note_id,
            offset,
            pointer: active,
        } = self.state
        else {
            return None;
        };
        if active != pointer {
            return None;
        }

        let raw = canvas.to_canvas(client) - offset;
        Some(DragMove {
            note_id,
            position: clamp_to_canvas(raw, canvas, self.card),
        })
    }

    /// End the drag. Returns the id whose final position should be persisted.
    pub fn pointer_up(&mut self) -> Option<i64> {
        let id = self.dragging_id();
        if let Some(note_id) = id {
            debug!(note_id, "drag end");
        }
        self.state = DragState::Idle;
        id
    }

    /// Abandon the drag without persisting anything.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Abandon the drag if it is moving `note_id` (e.g. the note was deleted).
    pub fn cancel_if(&mut self, note_id: i64) -> bool {
        if self.dragging_id() == Some(note_id) {
            self.cancel();
            return true;
        }
        false
    }
}
