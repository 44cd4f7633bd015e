//! Error types for construction, merging and decoding.
//!
//! `insert` and `estimate` never fail: a poorly distributing hash degrades
//! accuracy, it does not raise an error. Only operations with a wrong
//! configuration or wrong bytes report one.

use std::fmt;

/// Error returned by estimator construction, merge and decode operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `bucket_bits` outside the supported `[4, 16]` range at construction.
    InvalidConfiguration {
        /// The rejected value.
        bucket_bits: u8,
    },
    /// Merge attempted between estimators of different bucket count or
    /// hash version. No partial merge is performed.
    IncompatibleMerge { expected: String, found: String },
    /// Malformed or unsupported bytes passed to the codec.
    Decode(DecodeError),
}

/// Detail of a codec rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input shorter than the fixed header.
    TooShort { expected: usize, found: usize },
    /// Unknown format version byte.
    UnsupportedVersion(u8),
    /// Register width this build does not pack.
    UnsupportedWidth(u8),
    /// `bucket_bits` byte outside the supported range.
    InvalidBucketBits(u8),
    /// Payload length does not match the declared bucket count.
    LengthMismatch { expected: usize, found: usize },
    /// A register value no 64-bit hash stream could produce.
    RegisterOutOfRange { bucket: usize, value: u8 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration { bucket_bits } => {
                write!(f, "bucket_bits {bucket_bits} outside supported range [4, 16]")
            }
            Error::IncompatibleMerge { expected, found } => {
                write!(f, "incompatible merge: expected {expected}, found {found}")
            }
            Error::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TooShort { expected, found } => {
                write!(f, "input too short: expected at least {expected} bytes, found {found}")
            }
            DecodeError::UnsupportedVersion(v) => write!(f, "unsupported format version {v}"),
            DecodeError::UnsupportedWidth(w) => write!(f, "unsupported register width {w}"),
            DecodeError::InvalidBucketBits(b) => {
                write!(f, "bucket_bits {b} outside supported range [4, 16]")
            }
            DecodeError::LengthMismatch { expected, found } => {
                write!(f, "payload length mismatch: expected {expected} bytes, found {found}")
            }
            DecodeError::RegisterOutOfRange { bucket, value } => {
                write!(f, "register {bucket} holds impossible value {value}")
            }
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}
