//! End-to-end: a game directory on disk, through the bank reader and
//! decompressor, into a running machine.

use std::fs;

use anyhow::Result;
use tempfile::TempDir;

use vesper_core::{
    GamePart, InputSnapshot, Machine, NullHost, ResourceDescriptor, ResourceType,
};

/// Copy-protection part resources: palettes stored packed, bytecode
/// and polygons verbatim; IDs below the part tuple are empty sounds.
fn write_game_directory() -> Result<TempDir> {
    let dir = TempDir::new()?;

    let palettes = vec![0x11u8; 1024];
    let packed_palettes = vesper_rle::pack(&palettes);
    assert!(packed_palettes.len() < palettes.len());

    // r5 = 0x1234, fill buffer 0 with color 9, kill.
    let bytecode = vec![0x00, 0x05, 0x12, 0x34, 0x0E, 0x00, 0x09, 0x11];
    // One 2x2 color-1 square.
    let polygons = vec![0xC1, 2, 2, 4, 2, 0, 2, 2, 0, 2, 0, 0];

    let mut bank = Vec::new();
    let mut table = Vec::new();
    let mut add = |id: u16, resource_type: ResourceType, stored: &[u8], uncompressed: usize| {
        table.extend_from_slice(
            &ResourceDescriptor {
                id,
                resource_type,
                bank_id: 1,
                bank_offset: bank.len() as u32,
                compressed_size: stored.len(),
                uncompressed_size: uncompressed,
            }
            .to_record(),
        );
        bank.extend_from_slice(stored);
    };

    for id in 0..0x14 {
        add(id, ResourceType::SoundOrEmpty, &[], 0);
    }
    add(0x14, ResourceType::Palettes, &packed_palettes, palettes.len());
    add(0x15, ResourceType::Bytecode, &bytecode, bytecode.len());
    add(0x16, ResourceType::Polygons, &polygons, polygons.len());
    table.push(0xFF);

    fs::write(dir.path().join("MEMLIST.BIN"), table)?;
    fs::write(dir.path().join("BANK01"), bank)?;
    Ok(dir)
}

#[test]
fn test_machine_boots_and_runs_from_disk() -> Result<()> {
    let dir = write_game_directory()?;
    let mut machine =
        Machine::from_game_directory(dir.path(), NullHost, GamePart::CopyProtection)?;

    machine.run_tic(&InputSnapshot::default())?;

    assert_eq!(machine.registers().signed(0x05), 0x1234);
    assert_eq!(machine.video().buffer(0).pixel(160, 100), 9);
    Ok(())
}
