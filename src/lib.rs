//! `cardinality-sketch` estimates the number of distinct elements in a stream
//! or dataset in a single pass, using a small fixed amount of memory and no
//! buffering of seen items.
//!
//! The estimator is a HyperLogLog register array: `2^bucket_bits` six-bit
//! counters updated from a 64-bit hash of each item. State from independent
//! estimators merges losslessly by register-wise maximum, so streams can be
//! sharded across threads or machines and reduced afterwards, and a compact
//! versioned binary codec moves that state between instances.
//!
//! # Accuracy and memory
//!
//! Expected relative error is about `1.04 / sqrt(2^bucket_bits)`:
//!
//! | `bucket_bits` | registers | memory | error |
//! |---------------|-----------|--------|-------|
//! | 10 | 1024 | 768 B | 3.25% |
//! | 12 | 4096 | 3 KiB | 1.62% |
//! | 14 | 16384 | 12 KiB | 0.81% |
//! | 16 | 65536 | 48 KiB | 0.41% |
//!
//! # Example
//!
//! ```
//! use cardinality_sketch::CardinalityEstimator;
//!
//! let mut shard1 = CardinalityEstimator::<str>::new(12).unwrap();
//! let mut shard2 = CardinalityEstimator::<str>::new(12).unwrap();
//!
//! shard1.insert("alpha");
//! shard2.insert("beta");
//! shard2.insert("alpha");
//!
//! shard1.merge(&shard2).unwrap();
//! assert_eq!(shard1.estimate().round() as u64, 2);
//! ```

pub mod codec;
pub mod error;
pub mod estimator;
mod registers;
#[cfg(feature = "with_serde")]
mod serde;

pub use crate::error::{DecodeError, Error};
pub use crate::estimator::{CardinalityEstimator, HASH_VERSION_WYHASH_V1};
pub use crate::registers::{RegisterArray, MAX_BUCKET_BITS, MIN_BUCKET_BITS, REGISTER_WIDTH};
