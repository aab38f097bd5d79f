//! Decoder: backward chunk reader plus back-to-front writer
//!
//! The reader and writer share one buffer so that decompression can run
//! in place. `src_cursor` counts packed bytes not yet consumed (from the
//! head of the buffer), `dst_cursor` counts bytes not yet written (from
//! the tail). For valid streams every output byte costs at least one
//! packed byte worth of bits, so the write cursor stays at or above the
//! read cursor; the decoder still checks on every write because it may
//! be handed corrupt data.

use crate::{FOOTER_SIZE, UnpackError};

/// Sentinel re-armed at bit 31 of every chunk after the first.
const CHUNK_SENTINEL: u32 = 0x8000_0000;

struct Unpacker<'a> {
    buffer: &'a mut [u8],
    /// Packed bytes not yet consumed; pops walk down toward zero.
    src_cursor: usize,
    /// Chunk currently being drained, low bit first.
    chunk: u32,
    /// XOR of the seed and every chunk loaded so far; zero at a clean end.
    checksum: u32,
    /// Unpacked size recorded in the stream footer.
    declared_size: u32,
    /// Destination bytes not yet written; writes walk down toward zero.
    dst_cursor: usize,
}

impl<'a> Unpacker<'a> {
    fn new(buffer: &'a mut [u8], packed_len: usize) -> Result<Self, UnpackError> {
        if packed_len < FOOTER_SIZE || packed_len % 4 != 0 {
            return Err(UnpackError::SourceExhausted);
        }

        let dst_cursor = buffer.len();
        let mut unpacker = Unpacker {
            buffer,
            src_cursor: packed_len,
            chunk: 0,
            checksum: 0,
            declared_size: 0,
            dst_cursor,
        };

        unpacker.declared_size = unpacker.pop_chunk()?;
        unpacker.checksum = unpacker.pop_chunk()?;
        // The first data chunk keeps the sentinel wherever the encoder
        // embedded it; only later chunks are re-armed at bit 31.
        unpacker.chunk = unpacker.pop_chunk()?;
        unpacker.checksum ^= unpacker.chunk;

        Ok(unpacker)
    }

    fn pop_chunk(&mut self) -> Result<u32, UnpackError> {
        if self.src_cursor < 4 {
            return Err(UnpackError::SourceExhausted);
        }
        self.src_cursor -= 4;
        let bytes = &self.buffer[self.src_cursor..self.src_cursor + 4];
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Pop one payload bit.
    ///
    /// When the shift leaves the chunk empty, the bit just popped was
    /// the sentinel, not data: load the next chunk, take a real bit from
    /// it, and re-arm the sentinel above the 31 bits that remain.
    fn next_bit(&mut self) -> Result<u32, UnpackError> {
        let bit = self.chunk & 1;
        self.chunk >>= 1;
        if self.chunk == 0 {
            let loaded = self.pop_chunk()?;
            self.checksum ^= loaded;
            let bit = loaded & 1;
            self.chunk = (loaded >> 1) | CHUNK_SENTINEL;
            return Ok(bit);
        }
        Ok(bit)
    }

    /// Pop `count` bits, most significant first.
    fn read_bits(&mut self, count: u32) -> Result<u32, UnpackError> {
        let mut value = 0;
        for _ in 0..count {
            value = (value << 1) | self.next_bit()?;
        }
        Ok(value)
    }

    /// All packed bytes consumed and only the sentinel left in the chunk.
    fn is_at_end(&self) -> bool {
        self.src_cursor == 0 && self.chunk == 1
    }

    fn write(&mut self, byte: u8) -> Result<(), UnpackError> {
        if self.dst_cursor == 0 {
            return Err(UnpackError::DestinationOverrun);
        }
        self.dst_cursor -= 1;
        if self.dst_cursor < self.src_cursor {
            // In-place: this write would clobber packed bytes we have
            // not read yet. Only corrupt data can get here.
            return Err(UnpackError::DestinationOverrun);
        }
        self.buffer[self.dst_cursor] = byte;
        Ok(())
    }

    /// Emit `count` raw bytes from the bit stream.
    fn copy_literal(&mut self, count: usize) -> Result<(), UnpackError> {
        for _ in 0..count {
            let byte = self.read_bits(8)? as u8;
            self.write(byte)?;
        }
        Ok(())
    }

    /// Re-emit `count` bytes already written, `offset` bytes ahead of
    /// the write cursor. Overlapping copies repeat their own output,
    /// which is how the format encodes runs.
    fn copy_reference(&mut self, offset: usize, count: usize) -> Result<(), UnpackError> {
        if offset == 0 {
            return Err(UnpackError::CopyOutOfRange);
        }
        for _ in 0..count {
            if self.dst_cursor == 0 {
                return Err(UnpackError::DestinationOverrun);
            }
            let source = self.dst_cursor - 1 + offset;
            if source >= self.buffer.len() {
                return Err(UnpackError::CopyOutOfRange);
            }
            let byte = self.buffer[source];
            self.write(byte)?;
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), UnpackError> {
        if self.declared_size as usize != self.buffer.len() {
            return Err(UnpackError::SizeMismatch {
                declared: self.declared_size,
                expected: self.buffer.len() as u32,
            });
        }

        while self.dst_cursor > 0 {
            if self.next_bit()? == 1 {
                match self.read_bits(2)? {
                    3 => {
                        let count = self.read_bits(8)? as usize + 9;
                        self.copy_literal(count)?;
                    }
                    2 => {
                        let count = self.read_bits(8)? as usize + 1;
                        let offset = self.read_bits(12)? as usize;
                        self.copy_reference(offset, count)?;
                    }
                    1 => {
                        let offset = self.read_bits(10)? as usize;
                        self.copy_reference(offset, 4)?;
                    }
                    _ => {
                        let offset = self.read_bits(9)? as usize;
                        self.copy_reference(offset, 3)?;
                    }
                }
            } else if self.next_bit()? == 1 {
                let offset = self.read_bits(8)? as usize;
                self.copy_reference(offset, 2)?;
            } else {
                let count = self.read_bits(3)? as usize + 1;
                self.copy_literal(count)?;
            }
        }

        if !self.is_at_end() || self.checksum != 0 {
            return Err(UnpackError::InvalidCompressedData);
        }
        Ok(())
    }
}

/// Decompress in place: `buffer[..packed_len]` holds the packed stream
/// and the whole buffer is the destination.
///
/// # Panics
/// Panics if `packed_len` exceeds the buffer length; packed data is
/// never larger than its unpacked form.
pub fn unpack_in_place(buffer: &mut [u8], packed_len: usize) -> Result<(), UnpackError> {
    assert!(packed_len <= buffer.len());
    Unpacker::new(buffer, packed_len)?.run()
}

/// Decompress `source` into `dest`, which must be exactly the unpacked
/// size recorded in the stream.
pub fn unpack(source: &[u8], dest: &mut [u8]) -> Result<(), UnpackError> {
    if source.len() > dest.len() {
        return Err(UnpackError::SizeMismatch {
            declared: source.len() as u32,
            expected: dest.len() as u32,
        });
    }
    dest[..source.len()].copy_from_slice(source);
    unpack_in_place(dest, source.len())
}
