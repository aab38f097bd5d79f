//! Video subsystem
//!
//! Four packed full-screen buffers plus the state the bytecode drives
//! them with: a front/back assignment, a write-target selector, and the
//! staged palette. Polygon records and strings draw into the current
//! target buffer; masks always source buffer 0, which the program keeps
//! as the scene background.

mod buffer;
mod font;
mod palette;
mod polygon;
mod strings;

pub use buffer::{Buffer, Color, DrawOperation};
pub use palette::{COLORS_PER_PALETTE, PALETTE_COUNT, Palette, PaletteId, Rgb};
pub use polygon::DEFAULT_SCALE;

use log::warn;
use thiserror::Error;

use vesper_shared::SCREEN_PIXELS;

use crate::video::font::{GLYPH_HEIGHT, GLYPH_WIDTH, glyph};
use crate::video::polygon::{DrawMode, Polygon, PolygonStream, Vertex, rasterize, scaled};

/// Number of full-screen buffers.
pub const BUFFER_COUNT: usize = 4;

/// Groups may nest, but not unboundedly; past this depth the data is
/// taken to be cyclic.
const MAX_GROUP_DEPTH: u8 = 16;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VideoError {
    #[error("polygon data ended unexpectedly")]
    PolygonDataOutOfRange,

    #[error("malformed polygon header {0:#04X}")]
    MalformedPolygon(u8),

    #[error("polygon vertex count {0} is invalid")]
    InvalidVertexCount(u8),

    #[error("polygon groups nest deeper than {MAX_GROUP_DEPTH}")]
    GroupNestingTooDeep,

    #[error("palette {0} lies outside the palette resource")]
    PaletteOutOfRange(PaletteId),
}

/// A screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

/// How the bytecode names a buffer: directly, or through the current
/// front/back assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSelector {
    Specific(u8),
    Front,
    Back,
}

impl BufferSelector {
    /// Raw encoding: 0..=3 direct, 0xFE front, 0xFF back.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0..=3 => Some(BufferSelector::Specific(raw)),
            0xFE => Some(BufferSelector::Front),
            0xFF => Some(BufferSelector::Back),
            _ => None,
        }
    }
}

pub struct Video {
    buffers: [Buffer; BUFFER_COUNT],
    front: usize,
    back: usize,
    target: usize,
    active_palette: Option<Palette>,
    staged_palette: Option<PaletteId>,
}

impl Default for Video {
    fn default() -> Self {
        Video {
            buffers: [Buffer::new(), Buffer::new(), Buffer::new(), Buffer::new()],
            front: 1,
            back: 2,
            target: 2,
            active_palette: None,
            staged_palette: None,
        }
    }
}

impl Video {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a selector to a concrete buffer index.
    pub fn resolve(&self, selector: BufferSelector) -> usize {
        match selector {
            BufferSelector::Specific(index) => index as usize,
            BufferSelector::Front => self.front,
            BufferSelector::Back => self.back,
        }
    }

    /// The buffer currently presented to the host.
    pub fn front(&self) -> usize {
        self.front
    }

    pub fn buffer(&self, index: usize) -> &Buffer {
        &self.buffers[index]
    }

    pub fn buffer_mut(&mut self, index: usize) -> &mut Buffer {
        &mut self.buffers[index]
    }

    /// Point subsequent draws at a buffer.
    pub fn select_target(&mut self, selector: BufferSelector) {
        self.target = self.resolve(selector);
    }

    /// Fill a buffer with a solid color; returns the resolved index.
    pub fn fill_buffer(&mut self, selector: BufferSelector, color: Color) -> usize {
        let index = self.resolve(selector);
        self.buffers[index].fill(color);
        index
    }

    /// Copy between buffers with an optional vertical scroll; copying a
    /// buffer onto itself is a no-op. Returns the destination index.
    pub fn copy_buffer(&mut self, source: usize, destination: usize, y_offset: i16) -> usize {
        if source == destination {
            return destination;
        }
        let (from, to) = two_buffers(&mut self.buffers, source, destination);
        to.copy_from(from, y_offset);
        destination
    }

    /// Latch a palette choice; it takes effect at the next present.
    pub fn stage_palette(&mut self, id: PaletteId) {
        self.staged_palette = Some(id);
    }

    /// Decode and activate the latched palette, if any.
    pub fn apply_staged_palette(&mut self, resource: &[u8]) -> Result<(), VideoError> {
        if let Some(id) = self.staged_palette.take() {
            self.active_palette = Some(Palette::from_resource(resource, id)?);
        }
        Ok(())
    }

    pub fn active_palette(&self) -> Option<&Palette> {
        self.active_palette.as_ref()
    }

    /// Resolve a present request: a direct buffer becomes the front,
    /// the back selector swaps front and back first. Returns the buffer
    /// to hand to the host.
    pub fn present(&mut self, selector: BufferSelector) -> usize {
        match selector {
            BufferSelector::Front => {}
            BufferSelector::Back => std::mem::swap(&mut self.front, &mut self.back),
            BufferSelector::Specific(index) => self.front = index as usize,
        }
        self.front
    }

    /// Convert a buffer through the active palette into a 24-bit
    /// surface. Before the program selects its first palette there is
    /// nothing sensible to show, so the surface is left untouched.
    pub fn render_to_surface(&self, buffer_index: usize, surface: &mut [Rgb]) {
        assert_eq!(surface.len(), SCREEN_PIXELS);
        let Some(palette) = &self.active_palette else {
            warn!("presenting before any palette was selected");
            return;
        };

        let packed = self.buffers[buffer_index].packed_bytes();
        for (index, byte) in packed.iter().enumerate() {
            surface[index * 2] = palette.colors[(byte >> 4) as usize];
            surface[index * 2 + 1] = palette.colors[(byte & 0x0F) as usize];
        }
    }

    /// Draw the polygon record at `address` into the target buffer.
    pub fn draw_polygons(
        &mut self,
        data: &[u8],
        address: u16,
        origin: Point,
        scale: u16,
    ) -> Result<(), VideoError> {
        let origin = Vertex { x: origin.x as i32, y: origin.y as i32 };
        self.draw_record(data, address, origin, scale, None, 0)
    }

    /// Draw a string from the built-in table: `x` is an 8-pixel column,
    /// `y` a pixel row. Unknown IDs draw nothing.
    pub fn draw_string(&mut self, id: u16, x: u8, y: u8, color: Color) {
        let Some(text) = strings::string(id) else {
            warn!("unknown string id {id:#06X}");
            return;
        };

        let buffer = &mut self.buffers[self.target];
        let op = DrawOperation::SolidColor(color);
        let start_column = x as i16;
        let (mut column, mut row) = (start_column, y as i16);
        for character in text.chars() {
            if character == '\n' {
                column = start_column;
                row += GLYPH_HEIGHT as i16;
                continue;
            }
            if let Some(rows) = glyph(character as u8) {
                for (line, bits) in rows.iter().enumerate() {
                    for pixel in 0..GLYPH_WIDTH {
                        if bits & (0x80 >> pixel) != 0 {
                            buffer.draw_pixel(
                                column * GLYPH_WIDTH as i16 + pixel as i16,
                                row + line as i16,
                                &op,
                            );
                        }
                    }
                }
            }
            column += 1;
        }
    }

    fn draw_record(
        &mut self,
        data: &[u8],
        address: u16,
        origin: Vertex,
        scale: u16,
        color: Option<u8>,
        depth: u8,
    ) -> Result<(), VideoError> {
        if depth > MAX_GROUP_DEPTH {
            return Err(VideoError::GroupNestingTooDeep);
        }
        let mut stream = PolygonStream::new(data);
        stream.seek(address)?;

        let header = stream.read_u8()?;
        if header >= 0xC0 {
            // A leaf's own color is used unless a parent pinned one.
            let code = color.unwrap_or(header & 0x3F);
            let polygon = Polygon::parse(&mut stream, scale)?;
            self.fill_polygon(&polygon, origin, DrawMode::from_color_code(code));
            Ok(())
        } else if header & 0x3F == 2 {
            self.draw_group(data, &mut stream, origin, scale, color, depth)
        } else {
            Err(VideoError::MalformedPolygon(header))
        }
    }

    fn draw_group(
        &mut self,
        data: &[u8],
        stream: &mut PolygonStream<'_>,
        origin: Vertex,
        scale: u16,
        color: Option<u8>,
        depth: u8,
    ) -> Result<(), VideoError> {
        let origin = Vertex {
            x: origin.x - scaled(stream.read_u8()?, scale),
            y: origin.y - scaled(stream.read_u8()?, scale),
        };
        let child_count = stream.read_u8()? as usize + 1;

        for _ in 0..child_count {
            let word = stream.read_u16()?;
            let child_address = (word & 0x7FFF).wrapping_mul(2);
            let child_origin = Vertex {
                x: origin.x + scaled(stream.read_u8()?, scale),
                y: origin.y + scaled(stream.read_u8()?, scale),
            };
            let child_color = if word & 0x8000 != 0 {
                let code = stream.read_u8()? & 0x7F;
                stream.read_u8()?;
                Some(code)
            } else {
                color
            };
            self.draw_record(data, child_address, child_origin, scale, child_color, depth + 1)?;
        }
        Ok(())
    }

    fn fill_polygon(&mut self, polygon: &Polygon, origin: Vertex, mode: DrawMode) {
        let target = self.target;
        match mode {
            DrawMode::Solid(color) => {
                let op = DrawOperation::SolidColor(color);
                let buffer = &mut self.buffers[target];
                rasterize(polygon, origin, |y, x0, x1| buffer.draw_span(y, x0, x1, &op));
            }
            DrawMode::Highlight => {
                let op = DrawOperation::Highlight;
                let buffer = &mut self.buffers[target];
                rasterize(polygon, origin, |y, x0, x1| buffer.draw_span(y, x0, x1, &op));
            }
            DrawMode::Mask => {
                // Masking the mask source onto itself is an identity.
                if target == 0 {
                    return;
                }
                let [mask_source, rest @ ..] = &mut self.buffers;
                let buffer = &mut rest[target - 1];
                let op = DrawOperation::Mask(mask_source);
                rasterize(polygon, origin, |y, x0, x1| buffer.draw_span(y, x0, x1, &op));
            }
        }
    }
}

/// Disjoint borrows of two different buffers.
fn two_buffers(buffers: &mut [Buffer; BUFFER_COUNT], a: usize, b: usize) -> (&Buffer, &mut Buffer) {
    debug_assert_ne!(a, b);
    if a < b {
        let (head, tail) = buffers.split_at_mut(b);
        (&head[a], &mut tail[0])
    } else {
        let (head, tail) = buffers.split_at_mut(a);
        (&tail[0], &mut head[b])
    }
}
