//! Memory manager: owner of loaded resource blobs
//!
//! Blobs come in two scopes. Game-part blobs (palettes, bytecode,
//! polygons, animations) live until the next part switch. Individual
//! blobs are either persistent audio samples, freed in bulk when the
//! program asks, or the single bitmap scratch region, which holds only
//! the most recently loaded bitmap.
//!
//! Blobs are handed out as `Arc<[u8]>` and never mutated after loading,
//! so a part switch cannot invalidate slices the machine still holds;
//! the old blob simply dies when its last reference does. The bitmap
//! scratch is the exception: it is overwritten by every bitmap load and
//! consumers must blit it into a video buffer before the next one.

use std::sync::Arc;

use log::debug;

use vesper_shared::PACKED_SCREEN_SIZE;

use crate::descriptor::{ResourceDescriptor, ResourceId, ResourceType};
use crate::error::ResourceError;
use crate::parts::GamePart;
use crate::source::ResourceSource;

/// Lifetime class of a loaded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    GamePart,
    Individual,
}

struct LoadedResource {
    data: Arc<[u8]>,
    scope: Scope,
}

/// The blobs backing one loaded game part.
#[derive(Clone)]
pub struct PartBlobs {
    pub palettes: Arc<[u8]>,
    pub bytecode: Arc<[u8]>,
    pub polygons: Arc<[u8]>,
    pub animations: Option<Arc<[u8]>>,
}

/// Outcome of an individual resource load.
pub enum IndividualResource<'a> {
    /// An audio sample or music track is now (or was already) resident.
    AudioResident,
    /// A bitmap was unpacked into the shared scratch region; blit it
    /// before the next bitmap load overwrites it.
    TemporaryBitmap(&'a [u8]),
}

/// Owns every loaded resource blob plus the bitmap scratch region.
pub struct MemoryManager {
    source: Box<dyn ResourceSource>,
    slots: Vec<Option<LoadedResource>>,
    bitmap_scratch: Box<[u8]>,
}

impl MemoryManager {
    pub fn new(source: Box<dyn ResourceSource>) -> Self {
        let slots = source.descriptors().iter().map(|_| None).collect();
        MemoryManager {
            source,
            slots,
            bitmap_scratch: vec![0; PACKED_SCREEN_SIZE].into_boxed_slice(),
        }
    }

    /// Unload everything, then load the part's resource tuple.
    pub fn load_game_part(&mut self, part: GamePart) -> Result<PartBlobs, ResourceError> {
        debug!("loading game part {part:?}");
        for slot in &mut self.slots {
            *slot = None;
        }

        let ids = part.resource_ids();
        Ok(PartBlobs {
            palettes: self.load_slot(ids.palettes, ResourceType::Palettes, Scope::GamePart)?,
            bytecode: self.load_slot(ids.bytecode, ResourceType::Bytecode, Scope::GamePart)?,
            polygons: self.load_slot(ids.polygons, ResourceType::Polygons, Scope::GamePart)?,
            animations: match ids.animations {
                Some(id) => {
                    Some(self.load_slot(id, ResourceType::Animations, Scope::GamePart)?)
                }
                None => None,
            },
        })
    }

    /// Load one resource outside a part switch: audio becomes resident,
    /// bitmaps land in the scratch region, anything else is refused.
    pub fn load_individual(
        &mut self,
        id: ResourceId,
    ) -> Result<IndividualResource<'_>, ResourceError> {
        let descriptor = *self.source.descriptor(id)?;
        match descriptor.resource_type {
            ResourceType::SoundOrEmpty | ResourceType::Music => {
                if self.slots[id as usize].is_none() {
                    let data: Arc<[u8]> = self.source.read(&descriptor)?.into();
                    self.slots[id as usize] = Some(LoadedResource {
                        data,
                        scope: Scope::Individual,
                    });
                    debug!("loaded audio resource {id:#06X}");
                }
                Ok(IndividualResource::AudioResident)
            }
            ResourceType::Bitmap => {
                self.source
                    .read_into(&descriptor, &mut self.bitmap_scratch)?;
                debug!("loaded bitmap resource {id:#06X} into scratch");
                Ok(IndividualResource::TemporaryBitmap(
                    &self.bitmap_scratch[..descriptor.uncompressed_size],
                ))
            }
            resource_type => Err(ResourceError::GamePartOnly { id, resource_type }),
        }
    }

    /// Free the persistent audio blobs, leaving part blobs resident.
    pub fn unload_all_individual(&mut self) {
        for slot in &mut self.slots {
            if matches!(slot, Some(loaded) if loaded.scope == Scope::Individual) {
                *slot = None;
            }
        }
    }

    /// Current location of a loaded resource, or `None` if not resident.
    /// Fails when the descriptor's declared type disagrees with
    /// `expected`.
    pub fn location(
        &self,
        id: ResourceId,
        expected: ResourceType,
    ) -> Result<Option<&[u8]>, ResourceError> {
        let descriptor = self.source.descriptor(id)?;
        if descriptor.resource_type != expected {
            return Err(ResourceError::WrongResourceType {
                id,
                expected,
                actual: descriptor.resource_type,
            });
        }
        Ok(self.slots[id as usize].as_ref().map(|loaded| &*loaded.data))
    }

    /// Descriptor lookup, for callers that need sizes or types.
    pub fn descriptor(&self, id: ResourceId) -> Result<&ResourceDescriptor, ResourceError> {
        self.source.descriptor(id)
    }

    fn load_slot(
        &mut self,
        id: ResourceId,
        expected: ResourceType,
        scope: Scope,
    ) -> Result<Arc<[u8]>, ResourceError> {
        let descriptor = *self.source.descriptor(id)?;
        if descriptor.resource_type != expected {
            return Err(ResourceError::WrongResourceType {
                id,
                expected,
                actual: descriptor.resource_type,
            });
        }
        if let Some(loaded) = &self.slots[id as usize] {
            return Ok(loaded.data.clone());
        }
        let data: Arc<[u8]> = self.source.read(&descriptor)?.into();
        self.slots[id as usize] = Some(LoadedResource {
            data: data.clone(),
            scope,
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn part_source() -> MemorySource {
        let mut source = MemorySource::new();
        source.set(0x14, ResourceType::Palettes, vec![0xAA; 64]);
        source.set(0x15, ResourceType::Bytecode, vec![0x06]);
        source.set(0x16, ResourceType::Polygons, vec![0xC0, 0, 1, 4]);
        source
    }

    #[test]
    fn test_load_game_part_returns_part_blobs() {
        let mut memory = MemoryManager::new(Box::new(part_source()));
        let blobs = memory.load_game_part(GamePart::CopyProtection).unwrap();
        assert_eq!(&blobs.palettes[..2], &[0xAA, 0xAA]);
        assert_eq!(&blobs.bytecode[..], &[0x06]);
        assert!(blobs.animations.is_none());
        assert!(
            memory
                .location(0x15, ResourceType::Bytecode)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_part_switch_unloads_previous_part() {
        let mut source = part_source();
        source.set(0x17, ResourceType::Palettes, vec![1]);
        source.set(0x18, ResourceType::Bytecode, vec![2]);
        source.set(0x19, ResourceType::Polygons, vec![3]);

        let mut memory = MemoryManager::new(Box::new(source));
        memory.load_game_part(GamePart::CopyProtection).unwrap();
        memory.load_game_part(GamePart::IntroCinematic).unwrap();

        assert!(
            memory
                .location(0x15, ResourceType::Bytecode)
                .unwrap()
                .is_none()
        );
        assert!(
            memory
                .location(0x18, ResourceType::Bytecode)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_individual_audio_is_resident_until_bulk_unload() {
        let mut source = part_source();
        source.set(0x30, ResourceType::SoundOrEmpty, vec![5, 6, 7]);

        let mut memory = MemoryManager::new(Box::new(source));
        memory.load_game_part(GamePart::CopyProtection).unwrap();

        assert!(matches!(
            memory.load_individual(0x30).unwrap(),
            IndividualResource::AudioResident
        ));
        // A second load is a no-op, not a re-read.
        assert!(matches!(
            memory.load_individual(0x30).unwrap(),
            IndividualResource::AudioResident
        ));
        assert_eq!(
            memory.location(0x30, ResourceType::SoundOrEmpty).unwrap(),
            Some(&[5u8, 6, 7][..])
        );

        memory.unload_all_individual();
        assert!(
            memory
                .location(0x30, ResourceType::SoundOrEmpty)
                .unwrap()
                .is_none()
        );
        // Part blobs survive the bulk unload.
        assert!(
            memory
                .location(0x15, ResourceType::Bytecode)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_bitmap_load_fills_the_scratch_region() {
        let mut source = part_source();
        source.set(0x12, ResourceType::Bitmap, vec![0x5A; PACKED_SCREEN_SIZE]);

        let mut memory = MemoryManager::new(Box::new(source));
        match memory.load_individual(0x12).unwrap() {
            IndividualResource::TemporaryBitmap(bitmap) => {
                assert_eq!(bitmap.len(), PACKED_SCREEN_SIZE);
                assert!(bitmap.iter().all(|&b| b == 0x5A));
            }
            IndividualResource::AudioResident => panic!("expected a bitmap"),
        }
    }

    #[test]
    fn test_part_scoped_types_refuse_individual_loads() {
        let mut memory = MemoryManager::new(Box::new(part_source()));
        assert!(matches!(
            memory.load_individual(0x15),
            Err(ResourceError::GamePartOnly { id: 0x15, resource_type: ResourceType::Bytecode })
        ));
    }

    #[test]
    fn test_location_checks_the_declared_type() {
        let mut memory = MemoryManager::new(Box::new(part_source()));
        memory.load_game_part(GamePart::CopyProtection).unwrap();
        assert!(matches!(
            memory.location(0x15, ResourceType::Music),
            Err(ResourceError::WrongResourceType {
                id: 0x15,
                expected: ResourceType::Music,
                actual: ResourceType::Bytecode,
            })
        ));
    }

    #[test]
    fn test_part_with_missing_resources_fails() {
        let mut memory = MemoryManager::new(Box::new(part_source()));
        assert!(matches!(
            memory.load_game_part(GamePart::PasswordEntry),
            Err(ResourceError::InvalidResourceId(0x7D))
        ));
    }
}
