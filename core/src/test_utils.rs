//! Shared machine fixtures for unit and integration tests

use vesper_assets::{GamePart, MemorySource, ResourceType};
use vesper_shared::PACKED_SCREEN_SIZE;

use crate::host::NullHost;
use crate::machine::Machine;

/// Polygon blob with a single solid color-1 2x2 square at address 0.
pub const TEST_POLYGONS: [u8; 12] = [0xC1, 2, 2, 4, 2, 0, 2, 2, 0, 2, 0, 0];

/// Resource IDs the fixtures add on top of the game parts.
pub const TEST_SOUND_ID: u16 = 0x30;
pub const TEST_MUSIC_ID: u16 = 0x31;
pub const TEST_BITMAP_ID: u16 = 0x12;

/// A resource source with the copy-protection, intro and password
/// parts plus loadable audio and a bitmap. The given bytecode becomes
/// the copy-protection program; the other parts just kill thread 0.
pub fn test_source(bytecode: Vec<u8>) -> MemorySource {
    let mut source = MemorySource::new();
    source.set(0x14, ResourceType::Palettes, test_palettes());
    source.set(0x15, ResourceType::Bytecode, bytecode);
    source.set(0x16, ResourceType::Polygons, TEST_POLYGONS.to_vec());

    source.set(0x17, ResourceType::Palettes, test_palettes());
    source.set(0x18, ResourceType::Bytecode, vec![0x11]);
    source.set(0x19, ResourceType::Polygons, TEST_POLYGONS.to_vec());

    source.set(0x7D, ResourceType::Palettes, test_palettes());
    source.set(0x7E, ResourceType::Bytecode, vec![0x11]);
    source.set(0x7F, ResourceType::Polygons, TEST_POLYGONS.to_vec());

    // Gameplay chapter 1, whose program draws polygon 0 of the shared
    // animation bank at (50, 50) and dies.
    source.set(0x11, ResourceType::Animations, TEST_POLYGONS.to_vec());
    source.set(0x1A, ResourceType::Palettes, test_palettes());
    source.set(
        0x1B,
        ResourceType::Bytecode,
        vec![0x43, 0x00, 0x00, 0x00, 50, 0x00, 50, 0x11],
    );
    source.set(0x1C, ResourceType::Polygons, TEST_POLYGONS.to_vec());

    source.set(TEST_SOUND_ID, ResourceType::SoundOrEmpty, vec![1, 2, 3, 4]);
    source.set(TEST_MUSIC_ID, ResourceType::Music, vec![9, 9, 9]);

    // Bitmap with only its top-left pixel set, in plane 0.
    let mut bitmap = vec![0u8; PACKED_SCREEN_SIZE];
    bitmap[0] = 0x80;
    source.set(TEST_BITMAP_ID, ResourceType::Bitmap, bitmap);

    source
}

/// 32 palettes of which palette 3 is all white.
fn test_palettes() -> Vec<u8> {
    let mut palettes = vec![0u8; 1024];
    for color in 0..16 {
        palettes[3 * 32 + color * 2] = 0x0F;
        palettes[3 * 32 + color * 2 + 1] = 0xFF;
    }
    palettes
}

/// A machine booted into the copy-protection part with the given
/// program and a host that ignores everything.
pub fn test_machine(bytecode: Vec<u8>) -> Machine<NullHost> {
    Machine::new(Box::new(test_source(bytecode)), NullHost, GamePart::CopyProtection)
        .expect("test machine boots")
}
