//! Bit-reversed run-length codec for Vesper resource banks
//!
//! Resource payloads are packed as a bit stream that is read *backwards*:
//! the decoder pops big-endian 32-bit chunks from the tail of the packed
//! data and fills the destination buffer back-to-front. Because the
//! packed payload is never larger than the unpacked one, decompression
//! can run in place: the packed bytes sit at the head of the destination
//! buffer and the write cursor never catches up with the read cursor.
//!
//! The stream ends with three 32-bit words (reading from the tail):
//! the unpacked size, a checksum seed, and the first data chunk. The
//! first chunk carries an embedded sentinel bit above its payload bits
//! so that streams need not be a multiple of 32 bits; every later chunk
//! is re-armed with a sentinel at bit 31 as it is loaded. XORing every
//! data chunk into the seed must leave zero.
//!
//! This crate is a pure codec: no file headers, no resource directory.
//! The caller (vesper-assets) knows the packed and unpacked sizes from
//! the resource descriptor.

mod decode;
mod encode;

pub use decode::{unpack, unpack_in_place};
pub use encode::pack;

use core::fmt;

/// Size of the stream footer: unpacked size, checksum seed, first chunk.
pub const FOOTER_SIZE: usize = 12;

/// Decompression error kinds.
///
/// Any of these means the packed data cannot be trusted; there is no
/// partial-output recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackError {
    /// The packed stream ran out before the destination was filled.
    SourceExhausted,
    /// An instruction produced more bytes than the destination can hold,
    /// or an in-place write would have clobbered unread packed bytes.
    DestinationOverrun,
    /// A back-reference pointed outside the already-written region.
    CopyOutOfRange,
    /// The declared unpacked size does not match the destination buffer.
    SizeMismatch { declared: u32, expected: u32 },
    /// The stream terminated without exactly filling the destination,
    /// left packed bytes unconsumed, or failed its checksum.
    InvalidCompressedData,
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnpackError::SourceExhausted => write!(f, "packed stream exhausted before destination was filled"),
            UnpackError::DestinationOverrun => write!(f, "decoded data overran the destination buffer"),
            UnpackError::CopyOutOfRange => write!(f, "back-reference outside the written region"),
            UnpackError::SizeMismatch { declared, expected } => write!(
                f,
                "declared unpacked size {declared} does not match destination size {expected}"
            ),
            UnpackError::InvalidCompressedData => write!(f, "invalid compressed data"),
        }
    }
}

impl std::error::Error for UnpackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_literals() {
        let data: Vec<u8> = (0u16..200).map(|n| (n * 7 + 3) as u8).collect();
        let packed = pack(&data);
        let mut out = vec![0u8; data.len()];
        unpack(&packed, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_roundtrip_repetitive() {
        let mut data = Vec::new();
        for _ in 0..50 {
            data.extend_from_slice(b"TIDAL POOL ");
        }
        let packed = pack(&data);
        // Repetitive input must actually compress.
        assert!(packed.len() < data.len());
        let mut out = vec![0u8; data.len()];
        unpack(&packed, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_roundtrip_in_place() {
        let mut data = Vec::new();
        for n in 0u16..300 {
            data.push((n / 9) as u8);
        }
        let packed = pack(&data);
        assert!(packed.len() <= data.len());

        let mut buffer = vec![0u8; data.len()];
        buffer[..packed.len()].copy_from_slice(&packed);
        unpack_in_place(&mut buffer, packed.len()).unwrap();
        assert_eq!(buffer, data);
    }

    #[test]
    fn test_roundtrip_empty() {
        let packed = pack(&[]);
        assert_eq!(packed.len(), FOOTER_SIZE);
        let mut out = [0u8; 0];
        unpack(&packed, &mut out).unwrap();
    }

    #[test]
    fn test_roundtrip_single_byte() {
        let packed = pack(&[0x42]);
        let mut out = [0u8; 1];
        unpack(&packed, &mut out).unwrap();
        assert_eq!(out, [0x42]);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let packed = pack(b"four");
        let mut out = [0u8; 5];
        assert_eq!(
            unpack(&packed, &mut out),
            Err(UnpackError::SizeMismatch { declared: 4, expected: 5 })
        );
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let data = b"checksummed payload".repeat(4);
        let mut packed = pack(&data);
        // Flip a bit in the checksum seed word (third word from the end).
        let n = packed.len();
        packed[n - 8] ^= 0x01;
        let mut out = vec![0u8; data.len()];
        assert_eq!(unpack(&packed, &mut out), Err(UnpackError::InvalidCompressedData));
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let data = b"checksummed payload".repeat(4);
        let mut packed = pack(&data);
        packed[0] ^= 0x80;
        let mut out = vec![0u8; data.len()];
        assert!(unpack(&packed, &mut out).is_err());
    }

    #[test]
    fn test_truncated_source_rejected() {
        let data = b"truncate me please".repeat(8);
        let packed = pack(&data);
        // Drop the leading chunk: the declared size survives (it lives at
        // the tail) but the stream runs dry partway through.
        let mut out = vec![0u8; data.len()];
        assert_eq!(unpack(&packed[4..], &mut out), Err(UnpackError::SourceExhausted));
    }
}
