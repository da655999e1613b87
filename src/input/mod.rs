//! Pointer and touch input.
//!
//! The orchestrator only cares about two raw events: a pointer going down and
//! a touch starting. Both carry viewport (client) coordinates. Touch drags are
//! tracked separately so the shell can scroll with a finger without every
//! drag also being a click.

/// One finger on the screen, client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    PointerDown { client_x: f32, client_y: f32 },
    /// Every touch active at the moment a new one started
    TouchStart { touches: Vec<TouchPoint> },
}

impl PointerEvent {
    pub fn pointer_down(client_x: f32, client_y: f32) -> Self {
        PointerEvent::PointerDown { client_x, client_y }
    }

    /// The point a repair should target: the pointer itself, or the first
    /// touch. A touch event with no touches has no target.
    pub fn primary_point(&self) -> Option<crate::render::Point> {
        match self {
            PointerEvent::PointerDown { client_x, client_y } => {
                Some(crate::render::Point::new(*client_x, *client_y))
            }
            PointerEvent::TouchStart { touches } => touches
                .first()
                .map(|t| crate::render::Point::new(t.x, t.y)),
        }
    }
}

/// Drop pointer presses when a touch started in the same batch.
///
/// Touch screens report a tap twice, once as a touch and once as an emulated
/// mouse press at the same spot; only the touch is kept.
pub fn coalesce_pointer_events(events: Vec<PointerEvent>) -> Vec<PointerEvent> {
    let touched = events
        .iter()
        .any(|e| matches!(e, PointerEvent::TouchStart { .. }));
    if !touched {
        return events;
    }
    events
        .into_iter()
        .filter(|e| matches!(e, PointerEvent::TouchStart { .. }))
        .collect()
}

/// Drag distance after which a touch is a scroll rather than a tap
const DRAG_THRESHOLD: f32 = 10.0;

/// Active-touch bookkeeping.
///
/// `touch_start` yields the event to hand to the orchestrator; `touch_move`
/// yields a vertical scroll delta once the finger has moved far enough.
#[derive(Debug, Default)]
pub struct TouchTracker {
    touches: Vec<TouchPoint>,
    drag_distance: f32,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            touches: Vec::with_capacity(4),
            drag_distance: 0.0,
        }
    }

    pub fn active(&self) -> &[TouchPoint] {
        &self.touches
    }

    pub fn touch_start(&mut self, x: f32, y: f32, id: u64) -> PointerEvent {
        self.touches.retain(|t| t.id != id);
        self.touches.push(TouchPoint { x, y, id });
        if self.touches.len() == 1 {
            self.drag_distance = 0.0;
        }
        PointerEvent::TouchStart {
            touches: self.touches.clone(),
        }
    }

    /// Returns the scroll delta (finger movement inverted) for a drag.
    pub fn touch_move(&mut self, x: f32, y: f32, id: u64) -> Option<f32> {
        let touch = self.touches.iter_mut().find(|t| t.id == id)?;
        let dx = x - touch.x;
        let dy = y - touch.y;
        touch.x = x;
        touch.y = y;
        self.drag_distance += (dx * dx + dy * dy).sqrt();

        if self.drag_distance > DRAG_THRESHOLD {
            Some(-dy)
        } else {
            None
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        self.touches.retain(|t| t.id != id);
        if self.touches.is_empty() {
            self.drag_distance = 0.0;
        }
    }
}
