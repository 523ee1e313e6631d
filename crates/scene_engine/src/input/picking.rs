//! Pointer state for picking operations
//!
//! Converts device coordinates to Normalized Device Coordinates (NDC) for
//! ray construction.

use super::{InputEvent, PointerEventKind};

/// Pointer position and button state tracked across events
#[derive(Debug, Clone, PartialEq)]
pub struct PointerState {
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
    /// Surface width in pixels
    pub width: f32,
    /// Surface height in pixels
    pub height: f32,
    /// Whether the primary button is held
    pub button_down: bool,
}

impl PointerState {
    /// Pointer at the top-left corner of a surface
    pub fn new(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height, button_down: false }
    }

    /// Convert the position to NDC
    ///
    /// NDC range: [-1, 1] where:
    /// - X: -1 = left, +1 = right
    /// - Y: -1 = bottom, +1 = top
    pub fn to_ndc(&self) -> (f32, f32) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return (0.0, 0.0);
        }
        let ndc_x = (self.x / self.width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (self.y / self.height) * 2.0;
        (ndc_x, ndc_y)
    }

    /// Track an event
    pub fn update(&mut self, event: &InputEvent) {
        self.x = event.x;
        self.y = event.y;
        match event.kind {
            PointerEventKind::Down => self.button_down = true,
            PointerEventKind::Up => self.button_down = false,
            PointerEventKind::Move | PointerEventKind::Wheel(_) => {}
        }
    }

    /// Update surface size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
