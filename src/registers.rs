//! Packed register storage.
//!
//! Each bucket owns a 6-bit register holding the maximum rank observed for
//! that bucket. Registers are packed into `u32` words, so a register may
//! straddle a word boundary; every access therefore reads a two-word window.
//! One zero pad word at the end keeps that window in bounds for the last
//! register, and the pad is never written.

use crate::error::Error;

/// Width of a single register in bits. Six bits hold ranks up to 63, enough
/// for any remainder of a 64-bit hash.
pub const REGISTER_WIDTH: usize = 6;

/// Smallest supported `bucket_bits`.
pub const MIN_BUCKET_BITS: u8 = 4;
/// Largest supported `bucket_bits`.
pub const MAX_BUCKET_BITS: u8 = 16;

/// Fixed-size array of per-bucket maximum rank counters.
///
/// Values are monotonically non-decreasing: [`RegisterArray::update_max`] is
/// the only mutation and it never lowers a register. Two arrays compare equal
/// exactly when every register matches, which is the identity the merge
/// operator relies on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterArray {
    bucket_bits: u8,
    words: Vec<u32>,
}

impl RegisterArray {
    /// Creates an all-zero array with `2^bucket_bits` registers.
    pub fn new(bucket_bits: u8) -> Result<Self, Error> {
        if !(MIN_BUCKET_BITS..=MAX_BUCKET_BITS).contains(&bucket_bits) {
            return Err(Error::InvalidConfiguration { bucket_bits });
        }
        let num_buckets = 1usize << bucket_bits;
        // 6-bit registers fill whole words for every supported bucket count;
        // the extra word pads the two-word access window.
        let words = vec![0u32; num_buckets * REGISTER_WIDTH / 32 + 1];
        Ok(Self { bucket_bits, words })
    }

    /// Rebuilds an array from packed words produced by the codec.
    pub(crate) fn from_words(bucket_bits: u8, words: Vec<u32>) -> Self {
        debug_assert!((MIN_BUCKET_BITS..=MAX_BUCKET_BITS).contains(&bucket_bits));
        debug_assert_eq!(words.len(), (1usize << bucket_bits) * REGISTER_WIDTH / 32 + 1);
        Self { bucket_bits, words }
    }

    /// Packed words backing the registers, pad word included.
    pub(crate) fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of low hash bits used for bucket selection.
    pub fn bucket_bits(&self) -> u8 {
        self.bucket_bits
    }

    /// Number of registers, `2^bucket_bits`.
    pub fn num_buckets(&self) -> usize {
        1 << self.bucket_bits
    }

    /// Largest rank a register can legally hold: the remainder width of a
    /// 64-bit hash plus one for the all-zero remainder.
    pub fn max_rank(&self) -> u8 {
        64 - self.bucket_bits + 1
    }

    /// Current value of register `bucket`.
    pub fn get(&self, bucket: usize) -> u8 {
        let bit_idx = bucket * REGISTER_WIDTH;
        let word_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let lo_bits = REGISTER_WIDTH.min(32 - bit_pos);
        let hi_bits = REGISTER_WIDTH - lo_bits;
        let lo_mask = (1u32 << lo_bits) - 1;
        let hi_mask = (1u32 << hi_bits) - 1;

        let lo = (self.words[word_idx] >> bit_pos) & lo_mask;
        let hi = (self.words[word_idx + 1] & hi_mask) << lo_bits;
        (lo | hi) as u8
    }

    /// Raises register `bucket` to `rank` if larger; never lowers it.
    pub fn update_max(&mut self, bucket: usize, rank: u8) {
        if rank > self.get(bucket) {
            self.set(bucket, rank);
        }
    }

    fn set(&mut self, bucket: usize, rank: u8) {
        let bit_idx = bucket * REGISTER_WIDTH;
        let word_idx = bit_idx / 32;
        let bit_pos = bit_idx % 32;
        let lo_bits = REGISTER_WIDTH.min(32 - bit_pos);
        let hi_bits = REGISTER_WIDTH - lo_bits;
        let lo_mask = (1u32 << lo_bits) - 1;
        let hi_mask = (1u32 << hi_bits) - 1;
        let rank = u32::from(rank);

        // Unconditionally rewrite both words of the window; when the register
        // does not straddle, hi_mask is 0 and the second word is untouched.
        self.words[word_idx] &= !(lo_mask << bit_pos);
        self.words[word_idx] |= (rank & lo_mask) << bit_pos;
        self.words[word_idx + 1] &= !hi_mask;
        self.words[word_idx + 1] |= (rank >> lo_bits) & hi_mask;
    }

    /// Iterates registers in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.num_buckets()).map(move |bucket| self.get(bucket))
    }

    /// Register-wise maximum of `self` and `rhs`, written into `self`.
    ///
    /// Fails before touching any register when the shapes differ, so a
    /// rejected merge leaves `self` unchanged.
    pub fn try_merge(&mut self, rhs: &Self) -> Result<(), Error> {
        if self.bucket_bits != rhs.bucket_bits {
            return Err(Error::IncompatibleMerge {
                expected: format!("bucket_bits={}", self.bucket_bits),
                found: format!("bucket_bits={}", rhs.bucket_bits),
            });
        }
        for bucket in 0..self.num_buckets() {
            self.update_max(bucket, rhs.get(bucket));
        }
        Ok(())
    }

    /// Memory footprint of the array in bytes.
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(self.words.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0)]
    #[test_case(3)]
    #[test_case(17)]
    #[test_case(255)]
    fn rejects_bucket_bits_outside_range(bucket_bits: u8) {
        let result = RegisterArray::new(bucket_bits);
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test_case(4, 16)]
    #[test_case(10, 1024)]
    #[test_case(16, 65536)]
    fn starts_all_zero(bucket_bits: u8, num_buckets: usize) {
        let registers = RegisterArray::new(bucket_bits).unwrap();
        assert_eq!(registers.num_buckets(), num_buckets);
        assert_eq!(registers.iter().count(), num_buckets);
        assert!(registers.iter().all(|r| r == 0));
    }

    #[test]
    fn set_and_get_round_trip_across_word_boundaries() {
        // 6-bit registers straddle a u32 boundary at buckets 5, 10, 15, ...
        let mut registers = RegisterArray::new(6).unwrap();
        for bucket in 0..registers.num_buckets() {
            let rank = (bucket * 7 % 59 + 1) as u8;
            registers.update_max(bucket, rank);
        }
        for bucket in 0..registers.num_buckets() {
            let rank = (bucket * 7 % 59 + 1) as u8;
            assert_eq!(registers.get(bucket), rank, "bucket {bucket}");
        }
    }

    #[test]
    fn neighbors_stay_untouched() {
        let mut registers = RegisterArray::new(4).unwrap();
        registers.update_max(5, 61);
        for bucket in 0..16 {
            let expected = if bucket == 5 { 61 } else { 0 };
            assert_eq!(registers.get(bucket), expected, "bucket {bucket}");
        }
    }

    #[test]
    fn update_max_never_lowers() {
        let mut registers = RegisterArray::new(4).unwrap();
        registers.update_max(3, 30);
        registers.update_max(3, 10);
        assert_eq!(registers.get(3), 30);
        registers.update_max(3, 31);
        assert_eq!(registers.get(3), 31);
    }

    #[test]
    fn merge_takes_register_wise_max() {
        let mut lhs = RegisterArray::new(4).unwrap();
        let mut rhs = RegisterArray::new(4).unwrap();
        lhs.update_max(0, 5);
        lhs.update_max(1, 9);
        rhs.update_max(1, 4);
        rhs.update_max(2, 7);

        lhs.try_merge(&rhs).unwrap();

        assert_eq!(lhs.get(0), 5);
        assert_eq!(lhs.get(1), 9);
        assert_eq!(lhs.get(2), 7);
        assert_eq!(lhs.get(3), 0);
    }

    #[test]
    fn merge_rejects_shape_mismatch_without_mutating() {
        let mut lhs = RegisterArray::new(4).unwrap();
        lhs.update_max(0, 3);
        let snapshot = lhs.clone();

        let rhs = RegisterArray::new(5).unwrap();
        let result = lhs.try_merge(&rhs);

        assert!(matches!(result, Err(Error::IncompatibleMerge { .. })));
        assert_eq!(lhs, snapshot);
    }

    #[test]
    fn max_rank_fits_register_width() {
        for bucket_bits in MIN_BUCKET_BITS..=MAX_BUCKET_BITS {
            let registers = RegisterArray::new(bucket_bits).unwrap();
            assert!(usize::from(registers.max_rank()) < (1 << REGISTER_WIDTH));
        }
    }
}
