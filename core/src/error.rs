//! Machine error type
//!
//! Every failure bubbles up to the tic boundary; the machine never
//! recovers mid-instruction. Program and resource errors wrap their
//! own enums, instruction-level validation failures are flat variants.

use thiserror::Error;

use vesper_assets::ResourceError;

use crate::video::VideoError;
use crate::vm::ProgramError;

#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Video(#[from] VideoError),

    /// Opcode byte with no handler and neither polygon bit set.
    #[error("invalid opcode {0:#04X}")]
    InvalidOpcode(u8),

    #[error("invalid thread id {0}")]
    InvalidThreadId(u8),

    #[error("invalid thread range {start}..={end}")]
    InvalidThreadRange { start: u8, end: u8 },

    #[error("invalid thread operation {0}")]
    InvalidThreadOperation(u8),

    #[error("invalid video buffer id {0:#04X}")]
    InvalidBufferId(u8),

    #[error("invalid color id {0:#04X}")]
    InvalidColorId(u8),

    #[error("invalid palette id {0:#04X}")]
    InvalidPaletteId(u8),

    #[error("invalid sound frequency id {0}")]
    InvalidFrequencyId(u8),

    #[error("invalid sound channel id {0}")]
    InvalidChannelId(u8),

    #[error("invalid jump comparison {0:#04X}")]
    InvalidJumpComparison(u8),

    /// Playing a sample or track that was never loaded.
    #[error("resource {0:#06X} is not loaded")]
    ResourceNotLoaded(u16),

    /// Drawing from the animation bank in a part that has none.
    #[error("the current game part has no animation polygons")]
    NoAnimationPolygons,
}
