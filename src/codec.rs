//! Versioned binary encoding of register-array state.
//!
//! Byte layout:
//! - byte 0: format version, currently `1`
//! - byte 1: `bucket_bits`
//! - byte 2: register width in bits, currently `6`
//! - byte 3: hash version tag
//! - bytes 4..: registers packed 6 bits each, `m * 6 / 8` bytes, words
//!   little-endian
//!
//! The payload is bit-exact with the in-memory packed words minus the pad
//! word, so encoding is a header plus a dump and decoding a parse plus
//! validation. Decode rejects anything it does not understand; it never
//! guesses.

use crate::error::{DecodeError, Error};
use crate::registers::{RegisterArray, MAX_BUCKET_BITS, MIN_BUCKET_BITS, REGISTER_WIDTH};

/// Format version written by [`encode`] and required by [`decode`].
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4;

/// Encodes register state and the producing hash version into bytes.
pub fn encode(registers: &RegisterArray, hash_version: u8) -> Vec<u8> {
    let words = registers.words();
    let payload_words = &words[..words.len() - 1];

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload_words.len() * 4);
    bytes.push(FORMAT_VERSION);
    bytes.push(registers.bucket_bits());
    bytes.push(REGISTER_WIDTH as u8);
    bytes.push(hash_version);
    for word in payload_words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Decodes bytes produced by [`encode`] back into register state and the
/// hash version tag recorded by the producer.
pub fn decode(bytes: &[u8]) -> Result<(RegisterArray, u8), Error> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::TooShort {
            expected: HEADER_LEN,
            found: bytes.len(),
        }
        .into());
    }

    let version = bytes[0];
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version).into());
    }
    let bucket_bits = bytes[1];
    if !(MIN_BUCKET_BITS..=MAX_BUCKET_BITS).contains(&bucket_bits) {
        return Err(DecodeError::InvalidBucketBits(bucket_bits).into());
    }
    let width = bytes[2];
    if usize::from(width) != REGISTER_WIDTH {
        return Err(DecodeError::UnsupportedWidth(width).into());
    }
    let hash_version = bytes[3];

    let num_buckets = 1usize << bucket_bits;
    let payload_len = num_buckets * REGISTER_WIDTH / 8;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != payload_len {
        return Err(DecodeError::LengthMismatch {
            expected: payload_len,
            found: payload.len(),
        }
        .into());
    }

    let mut words = Vec::with_capacity(payload_len / 4 + 1);
    for chunk in payload.chunks_exact(4) {
        words.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    words.push(0);

    let registers = RegisterArray::from_words(bucket_bits, words);
    for (bucket, value) in registers.iter().enumerate() {
        if value > registers.max_rank() {
            return Err(DecodeError::RegisterOutOfRange { bucket, value }.into());
        }
    }

    Ok((registers, hash_version))
}
