//! Streaming cardinality estimator.
//!
//! An estimator owns one [`RegisterArray`] and is defined by `bucket_bits`
//! in the `[4, 16]` range: memory is `2^bucket_bits` packed 6-bit registers
//! and the expected relative error is about `1.04 / sqrt(2^bucket_bits)`.
//!
//! Each inserted item is hashed to 64 bits; the low `bucket_bits` bits pick
//! a register (stochastic averaging: one hash function stands in for
//! `2^bucket_bits` independent ones) and the trailing-zero run of the
//! remaining bits, plus one, is the rank the register keeps the maximum of.
//! Ranks grow like `log2` of the per-bucket item count, which is what makes
//! a 6-bit register enough for any input size.
//!
//! Estimation uses the harmonic-mean formula of Flajolet et al. 2007 with
//! its alpha bias constants, switching to linear counting over the number of
//! never-hit registers while the array is sparse. Both the constants and the
//! threshold come from that one derivation; see [`CardinalityEstimator::estimate`].

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::marker::PhantomData;

use wyhash::WyHash;

use crate::codec;
use crate::error::Error;
use crate::registers::RegisterArray;

/// Hash identity tag of the default `WyHash` adapter.
///
/// Estimators refuse to merge, and blobs refuse to decode into an estimator,
/// across different tags. Callers plugging in their own `H` should pick a
/// distinct tag via [`CardinalityEstimator::with_hash_version`] so that
/// distributed instances cannot silently combine incompatible register
/// state.
pub const HASH_VERSION_WYHASH_V1: u8 = 1;

/// Streaming estimator of the number of distinct items in a sequence.
///
/// Items of type `T` are hashed with `H`; the default `WyHash` gives the
/// uniform, avalanching 64-bit values the accuracy analysis assumes. An
/// identity hash (or any hash that maps structured inputs to structured
/// outputs) silently invalidates the error bound without ever producing an
/// error, which is why the hasher is an explicit type parameter and not an
/// ambient choice.
///
/// `insert` and `estimate` never fail. Mutation requires `&mut self`; for
/// concurrent streams, run one estimator per shard over a disjoint partition
/// of the input and fold the shards together with [`CardinalityEstimator::merge`].
pub struct CardinalityEstimator<T: Hash + ?Sized, H: Hasher + Default = WyHash> {
    registers: RegisterArray,
    hash_version: u8,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
    _item: PhantomData<T>,
}

impl<T: Hash + ?Sized, H: Hasher + Default> CardinalityEstimator<T, H> {
    /// Creates an empty estimator with `2^bucket_bits` registers and the
    /// default hash version tag.
    pub fn new(bucket_bits: u8) -> Result<Self, Error> {
        Self::with_hash_version(bucket_bits, HASH_VERSION_WYHASH_V1)
    }

    /// Creates an empty estimator carrying an explicit hash version tag.
    pub fn with_hash_version(bucket_bits: u8, hash_version: u8) -> Result<Self, Error> {
        Ok(Self {
            registers: RegisterArray::new(bucket_bits)?,
            hash_version,
            build_hasher: BuildHasherDefault::default(),
            _item: PhantomData,
        })
    }

    /// Observes one item. Observing the same item again is a no-op.
    #[inline]
    pub fn insert(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        self.insert_hash(hasher.finish());
    }

    /// Observes a pre-computed 64-bit hash.
    ///
    /// The hash must come from the same function on every estimator that
    /// will later be merged; the caller owns that guarantee.
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let bucket_bits = self.registers.bucket_bits();
        let bucket = (hash as usize) & (self.registers.num_buckets() - 1);
        let remainder = hash >> bucket_bits;
        // trailing_zeros(0) is 64; capping to the remainder's own width keeps
        // the all-zero remainder a legal, maximal rank rather than an error.
        let rank = remainder.trailing_zeros().min(u32::from(64 - bucket_bits)) + 1;
        self.registers.update_max(bucket, rank as u8);
    }

    /// Point estimate of the number of distinct items observed so far.
    ///
    /// While `alpha * m^2 / sum(2^-register)` stays at or below `2.5 * m`
    /// and zero registers remain, the linear-counting estimate
    /// `m * ln(m / zero_registers)` is used instead: with many buckets still
    /// empty the harmonic estimator is not yet reliable. An empty estimator
    /// reports exactly 0 through that branch.
    ///
    /// The hash is 64 bits wide, so the large-range collision correction for
    /// narrow hashes is omitted: it would only engage past `2^64 / 30`
    /// distinct items.
    pub fn estimate(&self) -> f64 {
        let m = self.registers.num_buckets() as f64;
        let mut harmonic_sum = 0.0;
        let mut zero_registers = 0u64;
        for rank in self.registers.iter() {
            harmonic_sum += 1.0 / (1u64 << rank) as f64;
            zero_registers += u64::from(rank == 0);
        }

        let raw = alpha(self.registers.num_buckets()) * m * m / harmonic_sum;
        if raw <= 2.5 * m && zero_registers > 0 {
            m * (m / zero_registers as f64).ln()
        } else {
            raw
        }
    }

    /// Merges `rhs` into `self` by register-wise maximum.
    ///
    /// The result is identical, register for register and therefore estimate
    /// for estimate, to a single estimator fed both item streams in any
    /// order. Fails with [`Error::IncompatibleMerge`] on a bucket count or
    /// hash version mismatch, leaving `self` untouched.
    pub fn merge(&mut self, rhs: &Self) -> Result<(), Error> {
        if self.hash_version != rhs.hash_version {
            return Err(Error::IncompatibleMerge {
                expected: format!("hash_version={}", self.hash_version),
                found: format!("hash_version={}", rhs.hash_version),
            });
        }
        self.registers.try_merge(&rhs.registers)
    }

    /// Encodes the estimator into the compact versioned byte format.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(&self.registers, self.hash_version)
    }

    /// Decodes an estimator from bytes produced by [`CardinalityEstimator::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (registers, hash_version) = codec::decode(bytes)?;
        Ok(Self {
            registers,
            hash_version,
            build_hasher: BuildHasherDefault::default(),
            _item: PhantomData,
        })
    }

    /// Number of low hash bits used for bucket selection.
    pub fn bucket_bits(&self) -> u8 {
        self.registers.bucket_bits()
    }

    /// Number of registers, `2^bucket_bits`.
    pub fn num_buckets(&self) -> usize {
        self.registers.num_buckets()
    }

    /// Hash identity tag this estimator was created with.
    pub fn hash_version(&self) -> u8 {
        self.hash_version
    }

    /// Read-only view of the register state.
    pub fn registers(&self) -> &RegisterArray {
        &self.registers
    }

    /// Expected relative standard error, about `1.04 / sqrt(2^bucket_bits)`.
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.num_buckets() as f64).sqrt()
    }

    /// Memory footprint of the estimator in bytes.
    pub fn size_bytes(&self) -> usize {
        self.registers.size_bytes()
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Clone for CardinalityEstimator<T, H> {
    fn clone(&self) -> Self {
        Self {
            registers: self.registers.clone(),
            hash_version: self.hash_version,
            build_hasher: BuildHasherDefault::default(),
            _item: PhantomData,
        }
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> PartialEq for CardinalityEstimator<T, H> {
    fn eq(&self, rhs: &Self) -> bool {
        self.hash_version == rhs.hash_version && self.registers == rhs.registers
    }
}

impl<T: Hash + ?Sized, H: Hasher + Default> Debug for CardinalityEstimator<T, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ bucket_bits: {}, estimate: {:.1}, size: {} }}",
            self.bucket_bits(),
            self.estimate(),
            self.size_bytes()
        )
    }
}

/// Bias-correction constant for `m` buckets; tabulated below 128, closed
/// form above.
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
