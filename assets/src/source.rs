//! Resource payload sources
//!
//! `ResourceSource` is the seam between the memory manager and wherever
//! payloads actually live: `GameDirectory` reads the retail bank files,
//! `MemorySource` serves synthetic resources for tests.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use log::debug;

use crate::descriptor::{
    DESCRIPTOR_FILE_NAME, ResourceDescriptor, ResourceId, ResourceType, parse_descriptor_table,
};
use crate::error::ResourceError;

/// Where resource payloads come from.
pub trait ResourceSource {
    /// Every descriptor in table order; a descriptor's index is its ID.
    fn descriptors(&self) -> &[ResourceDescriptor];

    /// Read and unpack one resource into `dest`, which must hold at
    /// least `uncompressed_size` bytes; the payload lands in its prefix.
    fn read_into(
        &self,
        descriptor: &ResourceDescriptor,
        dest: &mut [u8],
    ) -> Result<(), ResourceError>;

    /// Look up a descriptor by logical ID.
    fn descriptor(&self, id: ResourceId) -> Result<&ResourceDescriptor, ResourceError> {
        self.descriptors()
            .get(id as usize)
            .ok_or(ResourceError::InvalidResourceId(id))
    }

    /// Allocating variant of [`ResourceSource::read_into`].
    fn read(&self, descriptor: &ResourceDescriptor) -> Result<Vec<u8>, ResourceError> {
        let mut data = vec![0; descriptor.uncompressed_size];
        self.read_into(descriptor, &mut data)?;
        Ok(data)
    }
}

/// Slice off the exact destination a descriptor unpacks into.
fn unpack_region<'a>(
    descriptor: &ResourceDescriptor,
    dest: &'a mut [u8],
) -> Result<&'a mut [u8], ResourceError> {
    if dest.len() < descriptor.uncompressed_size {
        return Err(ResourceError::BufferTooSmall {
            needed: descriptor.uncompressed_size,
            actual: dest.len(),
        });
    }
    Ok(&mut dest[..descriptor.uncompressed_size])
}

/// A game directory on disk: the descriptor table plus bank files named
/// `BANK00`..`BANK0F` by uppercase hex bank ID.
pub struct GameDirectory {
    path: PathBuf,
    descriptors: Vec<ResourceDescriptor>,
}

impl GameDirectory {
    /// Open a game directory and parse its descriptor table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let path = path.into();
        let table_path = path.join(DESCRIPTOR_FILE_NAME);
        let bytes = fs::read(&table_path).map_err(|source| ResourceError::Io {
            path: table_path,
            source,
        })?;
        let descriptors = parse_descriptor_table(&bytes)?;
        debug!("{}: {} resource descriptors", path.display(), descriptors.len());
        Ok(GameDirectory { path, descriptors })
    }

    fn bank_path(&self, bank_id: u8) -> PathBuf {
        self.path.join(format!("BANK{bank_id:02X}"))
    }
}

impl ResourceSource for GameDirectory {
    fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    fn read_into(
        &self,
        descriptor: &ResourceDescriptor,
        dest: &mut [u8],
    ) -> Result<(), ResourceError> {
        let dest = unpack_region(descriptor, dest)?;
        let path = self.bank_path(descriptor.bank_id);
        let io_err = |source| ResourceError::Io { path: path.clone(), source };

        let mut bank = File::open(&path).map_err(io_err)?;
        bank.seek(SeekFrom::Start(descriptor.bank_offset as u64))
            .map_err(io_err)?;
        bank.read_exact(&mut dest[..descriptor.compressed_size])
            .map_err(io_err)?;

        if descriptor.is_packed() {
            vesper_rle::unpack_in_place(dest, descriptor.compressed_size)?;
        }
        Ok(())
    }
}

/// In-memory resource source for tests: payloads are stored unpacked
/// and served verbatim.
#[derive(Default)]
pub struct MemorySource {
    descriptors: Vec<ResourceDescriptor>,
    payloads: Vec<Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource, returning its ID.
    pub fn add(&mut self, resource_type: ResourceType, data: Vec<u8>) -> ResourceId {
        let id = self.descriptors.len() as ResourceId;
        self.set(id, resource_type, data);
        id
    }

    /// Place a resource at a specific ID, padding any gap with empty
    /// sound records (the retail table does the same).
    pub fn set(&mut self, id: ResourceId, resource_type: ResourceType, data: Vec<u8>) {
        while self.descriptors.len() <= id as usize {
            let filler_id = self.descriptors.len() as ResourceId;
            self.descriptors.push(ResourceDescriptor {
                id: filler_id,
                resource_type: ResourceType::SoundOrEmpty,
                bank_id: 0,
                bank_offset: 0,
                compressed_size: 0,
                uncompressed_size: 0,
            });
            self.payloads.push(Vec::new());
        }

        self.descriptors[id as usize] = ResourceDescriptor {
            id,
            resource_type,
            bank_id: 0,
            bank_offset: 0,
            compressed_size: data.len(),
            uncompressed_size: data.len(),
        };
        self.payloads[id as usize] = data;
    }
}

impl ResourceSource for MemorySource {
    fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    fn read_into(
        &self,
        descriptor: &ResourceDescriptor,
        dest: &mut [u8],
    ) -> Result<(), ResourceError> {
        let dest = unpack_region(descriptor, dest)?;
        let payload = self
            .payloads
            .get(descriptor.id as usize)
            .ok_or(ResourceError::InvalidResourceId(descriptor.id))?;
        dest.copy_from_slice(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_round_trips() {
        let mut source = MemorySource::new();
        let id = source.add(ResourceType::Bytecode, vec![1, 2, 3, 4]);
        let descriptor = *source.descriptor(id).unwrap();
        assert_eq!(source.read(&descriptor).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_memory_source_pads_gaps_with_empty_sounds() {
        let mut source = MemorySource::new();
        source.set(3, ResourceType::Music, vec![9]);
        assert_eq!(source.descriptors().len(), 4);
        assert_eq!(source.descriptors()[1].resource_type, ResourceType::SoundOrEmpty);
        assert_eq!(source.descriptors()[3].resource_type, ResourceType::Music);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let source = MemorySource::new();
        assert!(matches!(
            source.descriptor(7),
            Err(ResourceError::InvalidResourceId(7))
        ));
    }

    #[test]
    fn test_too_small_destination_rejected() {
        let mut source = MemorySource::new();
        let id = source.add(ResourceType::Bytecode, vec![1, 2, 3, 4]);
        let descriptor = *source.descriptor(id).unwrap();
        let mut dest = [0u8; 2];
        assert!(matches!(
            source.read_into(&descriptor, &mut dest),
            Err(ResourceError::BufferTooSmall { needed: 4, actual: 2 })
        ));
    }
}
