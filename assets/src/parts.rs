//! Game parts
//!
//! The program is split into a closed set of sections, each bound to a
//! fixed tuple of resource IDs. Bytecode refers to parts by magic words
//! starting at 0x3E80.

use crate::descriptor::ResourceId;
use crate::error::ResourceError;

/// First raw word that names a game part.
pub const FIRST_GAME_PART_VALUE: u16 = 0x3E80;

/// Last raw word that names a game part.
pub const LAST_GAME_PART_VALUE: u16 = 0x3E88;

/// Resource IDs making up one game part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartResourceIds {
    pub palettes: ResourceId,
    pub bytecode: ResourceId,
    pub polygons: ResourceId,
    /// Shared sprite polygon bank; only the gameplay chapters carry one.
    pub animations: Option<ResourceId>,
}

/// One section of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePart {
    CopyProtection,
    IntroCinematic,
    Gameplay1,
    Gameplay2,
    Gameplay3,
    ArenaCinematic,
    Gameplay4,
    Gameplay5,
    PasswordEntry,
}

impl GamePart {
    /// Decode a raw bytecode word into a part.
    pub fn from_raw(raw: u16) -> Result<Self, ResourceError> {
        match raw {
            0x3E80 => Ok(GamePart::CopyProtection),
            0x3E81 => Ok(GamePart::IntroCinematic),
            0x3E82 => Ok(GamePart::Gameplay1),
            0x3E83 => Ok(GamePart::Gameplay2),
            0x3E84 => Ok(GamePart::Gameplay3),
            0x3E85 => Ok(GamePart::ArenaCinematic),
            0x3E86 => Ok(GamePart::Gameplay4),
            0x3E87 => Ok(GamePart::Gameplay5),
            0x3E88 => Ok(GamePart::PasswordEntry),
            _ => Err(ResourceError::InvalidGamePart(raw)),
        }
    }

    /// The fixed resource tuple backing this part.
    pub fn resource_ids(self) -> PartResourceIds {
        let (palettes, bytecode, polygons, animations) = match self {
            GamePart::CopyProtection => (0x14, 0x15, 0x16, None),
            GamePart::IntroCinematic => (0x17, 0x18, 0x19, None),
            GamePart::Gameplay1 => (0x1A, 0x1B, 0x1C, Some(0x11)),
            GamePart::Gameplay2 => (0x1D, 0x1E, 0x1F, Some(0x11)),
            GamePart::Gameplay3 => (0x20, 0x21, 0x22, Some(0x11)),
            GamePart::ArenaCinematic => (0x23, 0x24, 0x25, None),
            GamePart::Gameplay4 => (0x26, 0x27, 0x28, Some(0x11)),
            GamePart::Gameplay5 => (0x29, 0x2A, 0x2B, Some(0x11)),
            GamePart::PasswordEntry => (0x7D, 0x7E, 0x7F, None),
        };
        PartResourceIds {
            palettes,
            bytecode,
            polygons,
            animations,
        }
    }
}
