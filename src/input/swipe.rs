use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::game::Direction;

/// Turns a left-button drag across the terminal into a direction.
///
/// The longer axis of the drag decides; drags no longer than `threshold`
/// cells along that axis are ignored.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: u16,
    origin: Option<(u16, u16)>,
}

impl SwipeTracker {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            origin: None,
        }
    }

    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> Option<Direction> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some((event.column, event.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let (x0, y0) = self.origin.take()?;
                swipe_direction(
                    event.column as i32 - x0 as i32,
                    event.row as i32 - y0 as i32,
                    self.threshold,
                )
            }
            _ => None,
        }
    }

    /// Forget a drag in progress, e.g. when the round ends mid-gesture
    pub fn cancel(&mut self) {
        self.origin = None;
    }
}

/// Direction of a displacement, or `None` if it is too short
pub fn swipe_direction(dx: i32, dy: i32, threshold: u16) -> Option<Direction> {
    let threshold = threshold as i32;

    if dx.abs() > dy.abs() {
        if dx.abs() <= threshold {
            return None;
        }
        Some(if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        })
    } else {
        if dy.abs() <= threshold {
            return None;
        }
        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}
