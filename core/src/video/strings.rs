//! Built-in string table for DrawString
//!
//! The program draws text by 16-bit string ID; the strings themselves
//! were baked into the original interpreter, not the resource bundle.
//! This table carries the entries for the screens the engine itself
//! drives (protection, password entry, level select, disk prompts).
//! Unknown IDs are reported by the caller and skipped.

/// Sorted by ID for binary search.
static STRINGS: &[(u16, &str)] = &[
    (0x001, "P E A N U T  3000"),
    (0x002, "Copyright  } 1990 Peanut Computer, Inc.\nAll rights reserved."),
    (0x003, "2"),
    (0x004, "3"),
    (0x005, "."),
    (0x006, "A"),
    (0x007, "@"),
    (0x008, "PEANUT 3000"),
    (0x00A, "R"),
    (0x00B, "U"),
    (0x00C, "N"),
    (0x00D, "P"),
    (0x00E, "R"),
    (0x00F, "O"),
    (0x010, "J"),
    (0x011, "E"),
    (0x012, "C"),
    (0x013, "T"),
    (0x097, "          ACCESS CODE:"),
    (0x098, "PRESS BUTTON OR RETURN TO CONTINUE"),
    (0x099, "   ENTER ACCESS CODE"),
    (0x09A, "   INVALID PASSWORD !"),
    (0x09B, "ANNULER"),
    (0x09C, "      INSERT DISK ?\n\n\n\n\n\n\n\n\nPRESS ANY KEY TO CONTINUE"),
    (0x09D, " SELECT A LEVEL"),
];

/// Look up a string by ID.
pub fn string(id: u16) -> Option<&'static str> {
    STRINGS
        .binary_search_by_key(&id, |(key, _)| *key)
        .ok()
        .map(|index| STRINGS[index].1)
}
