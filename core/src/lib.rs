//! Vesper engine core
//!
//! The simulation engine for a polygon-cinematic adventure game that
//! ships as bytecode plus packed resource banks: a cooperative
//! 64-thread virtual machine, a planar software renderer, and the
//! machine facade that wires them to the resource system and a host.
//!
//! Everything platform-facing — window, mixer, input devices, the run
//! loop — lives behind the [`Host`] trait; the machine itself is pure
//! simulation. A minimal host:
//!
//! ```no_run
//! use std::time::Duration;
//! use vesper_core::{FrameView, GamePart, Host, InputSnapshot, Machine};
//!
//! struct Headless;
//! impl Host for Headless {
//!     fn buffer_ready(&mut self, frame: FrameView<'_>, delay: Duration) {
//!         // paint frame, then sleep for `delay`
//!         let _ = (frame, delay);
//!     }
//! }
//!
//! # fn main() -> Result<(), vesper_core::MachineError> {
//! let mut machine =
//!     Machine::from_game_directory("game/", Headless, GamePart::CopyProtection)?;
//! loop {
//!     machine.run_tic(&InputSnapshot::default())?;
//! }
//! # }
//! ```

mod error;
mod host;
mod input;
mod instructions;
mod machine;
pub mod test_utils;
mod video;
mod vm;

pub use error::MachineError;
pub use host::{FrameView, Host, NullHost};
pub use input::{InputSnapshot, MovementMask};
pub use instructions::{
    Comparison, CoordinateSource, CopySource, Flow, Instruction, Operand, PolygonBank,
    ResourceAction, ScaleSource, ThreadOperation,
};
pub use machine::Machine;
pub use video::{
    BUFFER_COUNT, Buffer, BufferSelector, Color, DEFAULT_SCALE, DrawOperation, Palette, PaletteId,
    Point, Rgb, Video, VideoError,
};
pub use vm::{
    CALL_STACK_DEPTH, CallStack, Program, ProgramAddress, ProgramError, REGISTER_COUNT,
    RegisterId, Registers, THREAD_COUNT, Thread, ThreadId, named,
};

// The resource layer is part of the public surface: hosts pick parts
// and may provide their own resource sources.
pub use vesper_assets::{
    GameDirectory, GamePart, IndividualResource, MemoryManager, MemorySource, ResourceDescriptor,
    ResourceError, ResourceId, ResourceSource, ResourceType,
};
