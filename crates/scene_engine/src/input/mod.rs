//! Pointer input fed to picking
//!
//! Positions are in device pixels with the origin at the top-left corner of
//! the surface, the way windowing systems report them.

pub mod picking;

use bitflags::bitflags;

pub use picking::PointerState;

bitflags! {
    /// Keyboard modifiers held during a pointer event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Shift key
        const SHIFT = 1 << 0;
        /// Control key
        const CTRL = 1 << 1;
        /// Alt key
        const ALT = 1 << 2;
    }
}

/// What happened to the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEventKind {
    /// Primary button pressed
    Down,
    /// Pointer moved
    Move,
    /// Primary button released
    Up,
    /// Wheel scrolled by the given amount
    Wheel(f32),
}

/// One pointer event in device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// Event kind
    pub kind: PointerEventKind,
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
    /// Modifiers held
    pub modifiers: Modifiers,
}

impl InputEvent {
    /// Event without modifiers
    pub fn new(kind: PointerEventKind, x: f32, y: f32) -> Self {
        Self { kind, x, y, modifiers: Modifiers::empty() }
    }

    /// Pointer press
    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    /// Pointer move
    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    /// Pointer release
    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    /// Add modifiers
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
