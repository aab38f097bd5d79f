//! Input snapshot
//!
//! The host translates its devices into one snapshot per tic; the
//! machine turns it into the register values the program reads.

use bitflags::bitflags;

bitflags! {
    /// Bit layout of the movement-mask registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementMask: u8 {
        const RIGHT = 0x01;
        const LEFT = 0x02;
        const DOWN = 0x04;
        const UP = 0x08;
    }
}

/// Input state for one tic.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub action: bool,
    /// Jump straight to the password screen.
    pub show_password_screen: bool,
    /// ASCII code of a key typed this tic, for the password screen.
    pub last_pressed_character: Option<u8>,
}

impl InputSnapshot {
    pub(crate) fn movement_mask(&self) -> MovementMask {
        let mut mask = MovementMask::empty();
        mask.set(MovementMask::RIGHT, self.right);
        mask.set(MovementMask::LEFT, self.left);
        mask.set(MovementMask::DOWN, self.down);
        mask.set(MovementMask::UP, self.up);
        mask
    }
}
