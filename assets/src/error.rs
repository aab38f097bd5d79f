//! Resource error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use vesper_rle::UnpackError;

use crate::descriptor::{ResourceId, ResourceType};

/// Everything that can go wrong between a logical resource ID and a
/// usable blob in memory.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No descriptor with this ID in the table.
    #[error("invalid resource id {0:#06X}")]
    InvalidResourceId(ResourceId),

    /// The descriptor's declared type disagrees with what the caller
    /// asked for.
    #[error("resource {id:#06X} is {actual:?}, expected {expected:?}")]
    WrongResourceType {
        id: ResourceId,
        expected: ResourceType,
        actual: ResourceType,
    },

    /// Individually loading a type that only loads with a game part.
    #[error("resource {id:#06X} has type {resource_type:?}, which only loads with a game part")]
    GamePartOnly {
        id: ResourceId,
        resource_type: ResourceType,
    },

    /// A raw game-part value outside the closed set.
    #[error("invalid game part {0:#06X}")]
    InvalidGamePart(u16),

    /// A descriptor record with an unknown type byte.
    #[error("descriptor {id:#06X} has invalid resource type {raw:#04X}")]
    InvalidResourceType { id: ResourceId, raw: u8 },

    /// A descriptor record with a bank ID outside 0..16.
    #[error("descriptor {id:#06X} has invalid bank id {raw:#04X}")]
    InvalidBankId { id: ResourceId, raw: u8 },

    /// A descriptor declaring a compressed payload larger than its
    /// uncompressed form.
    #[error(
        "descriptor {id:#06X} declares compressed size {compressed} \
         larger than uncompressed size {uncompressed}"
    )]
    InvalidResourceSize {
        id: ResourceId,
        compressed: usize,
        uncompressed: usize,
    },

    /// The descriptor table ended mid-record without a terminator.
    #[error("descriptor table ends mid-record")]
    TruncatedDescriptorTable,

    /// The caller's buffer cannot hold the unpacked resource.
    #[error("destination buffer holds {actual} bytes, resource needs {needed}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// The payload failed to decompress.
    #[error("failed to decompress resource")]
    Unpack(#[from] UnpackError),

    /// Reading the descriptor table or a bank file failed.
    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
