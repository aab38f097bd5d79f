//! Virtual-screen constants shared by the asset and engine crates
//!
//! The original hardware target renders a fixed 320x200 virtual screen
//! at 4 bits per pixel. Both the bitmap resource format (vesper-assets)
//! and the video buffers (vesper-core) are sized from these values.

/// Width of the virtual screen in pixels.
pub const SCREEN_WIDTH: usize = 320;

/// Height of the virtual screen in pixels.
pub const SCREEN_HEIGHT: usize = 200;

/// Total pixels on the virtual screen.
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Bytes per row with two 4-bit pixels packed per byte.
pub const PACKED_BYTES_PER_ROW: usize = SCREEN_WIDTH / 2;

/// Size in bytes of one packed full-screen buffer (and of one planar
/// bitmap resource: four 1-bit planes covering the whole screen).
pub const PACKED_SCREEN_SIZE: usize = SCREEN_PIXELS / 2;

/// Size in bytes of a single 1-bit plane of a planar bitmap.
pub const BITMAP_PLANE_SIZE: usize = SCREEN_PIXELS / 8;
