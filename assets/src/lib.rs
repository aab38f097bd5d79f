//! Resource system for the Vesper engine
//!
//! A game ships as one descriptor table (`MEMLIST.BIN`) plus a set of
//! bank files holding the actual payloads, most of them compressed with
//! the vesper-rle codec. This crate resolves logical resource IDs to
//! byte ranges inside the banks, reads and decompresses payloads, and
//! owns the loaded blobs:
//!
//! - [`ResourceDescriptor`] / [`parse_descriptor_table`]: the on-disk
//!   table format.
//! - [`ResourceSource`]: where payloads come from, with the filesystem
//!   implementation [`GameDirectory`] and the in-memory
//!   [`MemorySource`] for tests.
//! - [`GamePart`]: the closed set of game sections, each bound to a
//!   fixed tuple of resource IDs.
//! - [`MemoryManager`]: owns loaded blobs, distinguishing
//!   game-part-scoped from individually loaded resources.

mod descriptor;
mod error;
mod memory;
mod parts;
mod source;

pub use descriptor::{
    DESCRIPTOR_FILE_NAME, MAX_DESCRIPTORS, ResourceDescriptor, ResourceId, ResourceType,
    parse_descriptor_table,
};
pub use error::ResourceError;
pub use memory::{IndividualResource, MemoryManager, PartBlobs};
pub use parts::{FIRST_GAME_PART_VALUE, GamePart, LAST_GAME_PART_VALUE, PartResourceIds};
pub use source::{GameDirectory, MemorySource, ResourceSource};
