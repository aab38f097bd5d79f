//! On-disk resource descriptor table
//!
//! The descriptor file is a flat array of 20-byte records terminated by
//! a type byte of 0xFF. A record's position in the table is its logical
//! resource ID; the record tells us which bank file holds the payload,
//! where, and how large it is packed and unpacked.

use crate::error::ResourceError;

/// Name of the descriptor table inside the game directory.
pub const DESCRIPTOR_FILE_NAME: &str = "MEMLIST.BIN";

/// Hard cap on table length; the retail file holds 146 records.
pub const MAX_DESCRIPTORS: usize = 1000;

/// Type byte that terminates the descriptor table.
const END_OF_TABLE: u8 = 0xFF;

/// Size of one on-disk record.
const DESCRIPTOR_SIZE: usize = 20;

/// Logical resource ID: the record's position in the descriptor table.
pub type ResourceId = u16;

/// Declared content type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Sound effect sample, or an empty placeholder record.
    SoundOrEmpty,
    Music,
    /// Polygon data for the current game part.
    Polygons,
    /// A bank of 32 palettes.
    Palettes,
    Bytecode,
    /// Shared polygon data for sprite animations.
    Animations,
    /// Full-screen planar bitmap.
    Bitmap,
}

impl ResourceType {
    fn from_raw(id: ResourceId, raw: u8) -> Result<Self, ResourceError> {
        match raw {
            0 => Ok(ResourceType::SoundOrEmpty),
            1 => Ok(ResourceType::Music),
            2 => Ok(ResourceType::Polygons),
            3 => Ok(ResourceType::Palettes),
            4 => Ok(ResourceType::Bytecode),
            5 => Ok(ResourceType::Animations),
            6 => Ok(ResourceType::Bitmap),
            _ => Err(ResourceError::InvalidResourceType { id, raw }),
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            ResourceType::SoundOrEmpty => 0,
            ResourceType::Music => 1,
            ResourceType::Polygons => 2,
            ResourceType::Palettes => 3,
            ResourceType::Bytecode => 4,
            ResourceType::Animations => 5,
            ResourceType::Bitmap => 6,
        }
    }

}

/// One parsed descriptor record.
///
/// Invariant: `compressed_size <= uncompressed_size`; equality means the
/// payload is stored verbatim in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub id: ResourceId,
    pub resource_type: ResourceType,
    pub bank_id: u8,
    pub bank_offset: u32,
    pub compressed_size: usize,
    pub uncompressed_size: usize,
}

impl ResourceDescriptor {
    /// Whether the payload needs the run-length decoder.
    pub fn is_packed(&self) -> bool {
        self.compressed_size < self.uncompressed_size
    }

    /// Record layout: type, 6 unused bytes, bank id, big-endian bank
    /// offset, then big-endian packed and unpacked sizes padded to two
    /// words each.
    fn parse(id: ResourceId, record: &[u8]) -> Result<Self, ResourceError> {
        let resource_type = ResourceType::from_raw(id, record[0])?;
        let bank_id = record[7];
        if bank_id > 0x0F {
            return Err(ResourceError::InvalidBankId { id, raw: bank_id });
        }
        let bank_offset = u32::from_be_bytes([record[8], record[9], record[10], record[11]]);
        let compressed_size = u16::from_be_bytes([record[14], record[15]]) as usize;
        let uncompressed_size = u16::from_be_bytes([record[18], record[19]]) as usize;
        if compressed_size > uncompressed_size {
            return Err(ResourceError::InvalidResourceSize {
                id,
                compressed: compressed_size,
                uncompressed: uncompressed_size,
            });
        }

        Ok(ResourceDescriptor {
            id,
            resource_type,
            bank_id,
            bank_offset,
            compressed_size,
            uncompressed_size,
        })
    }

    /// Serialize back to the on-disk record layout. Used by tests and
    /// asset tooling; unused record bytes are written as zero.
    pub fn to_record(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut record = [0u8; DESCRIPTOR_SIZE];
        record[0] = self.resource_type.to_raw();
        record[7] = self.bank_id;
        record[8..12].copy_from_slice(&self.bank_offset.to_be_bytes());
        record[14..16].copy_from_slice(&(self.compressed_size as u16).to_be_bytes());
        record[18..20].copy_from_slice(&(self.uncompressed_size as u16).to_be_bytes());
        record
    }
}

/// Parse a descriptor table, consuming records until the 0xFF terminator
/// or [`MAX_DESCRIPTORS`], whichever comes first.
pub fn parse_descriptor_table(bytes: &[u8]) -> Result<Vec<ResourceDescriptor>, ResourceError> {
    let mut descriptors = Vec::new();
    let mut cursor = 0;

    while descriptors.len() < MAX_DESCRIPTORS {
        if cursor >= bytes.len() {
            return Err(ResourceError::TruncatedDescriptorTable);
        }
        if bytes[cursor] == END_OF_TABLE {
            break;
        }
        if bytes.len() - cursor < DESCRIPTOR_SIZE {
            return Err(ResourceError::TruncatedDescriptorTable);
        }

        let id = descriptors.len() as ResourceId;
        descriptors.push(ResourceDescriptor::parse(
            id,
            &bytes[cursor..cursor + DESCRIPTOR_SIZE],
        )?);
        cursor += DESCRIPTOR_SIZE;
    }

    Ok(descriptors)
}
