//! AVX2 gather duplicate-distance probe
//!
//! Eight 32-bit distances are converted to 64-bit word indices, the
//! corresponding bitset words are fetched with two 4-wide gathers, and a
//! scalar per-lane bit test finishes the job (AVX2 lacks a 64-bit variable
//! shift cheap enough to beat the store-and-test).
//!
//! Gathers may read the guard words at the end of the bitset; the data read
//! there never survives the per-lane mask.

use crate::simd::platform_detection;
use crate::types::BITSET_WORDS;

/// Test whether any of the eight distances indexes a set bit.
///
/// Must only be selected after AVX2 has been detected at runtime; the
/// dispatcher guarantees this.
#[inline]
pub fn any_dup8(words: &[u64; BITSET_WORDS], dist8: &[u32; 8]) -> bool {
    debug_assert!(platform_detection::get_platform_capabilities().has_avx2);
    unsafe { any_dup8_impl(words, dist8) }
}

#[target_feature(enable = "avx2")]
unsafe fn any_dup8_impl(words: &[u64; BITSET_WORDS], dist8: &[u32; 8]) -> bool {
    use std::arch::x86_64::*;

    // load 8 distances
    let vdist = _mm256_loadu_si256(dist8.as_ptr().cast::<__m256i>());

    // word indices = dist >> 6
    let vword_idx = _mm256_srli_epi32::<6>(vdist);

    // AVX2 gather works on 4 indices at a time; split the vector
    let idx_lo = _mm256_castsi256_si128(vword_idx);
    let idx_hi = _mm256_extracti128_si256::<1>(vword_idx);

    // gather the corresponding bitset words (scale = 8 bytes)
    let base = words.as_ptr().cast::<i64>();
    let words_lo = _mm256_i32gather_epi64::<8>(base, idx_lo);
    let words_hi = _mm256_i32gather_epi64::<8>(base, idx_hi);

    // spill and finish with a scalar bit test, early-out on first hit
    let mut gathered = [0u64; 8];
    _mm256_storeu_si256(gathered.as_mut_ptr().cast::<__m256i>(), words_lo);
    _mm256_storeu_si256(gathered.as_mut_ptr().add(4).cast::<__m256i>(), words_hi);

    for i in 0..8 {
        let mask = 1u64 << (dist8[i] & 63);
        if gathered[i] & mask != 0 {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::distance_bitset::DistanceBitset;
    use crate::simd::scalar;

    fn avx2_available() -> bool {
        platform_detection::get_platform_capabilities().has_avx2
    }

    #[test]
    fn test_matches_scalar_on_fixed_patterns() {
        if !avx2_available() {
            return;
        }
        let mut bs = DistanceBitset::new();
        for d in [1u32, 63, 64, 127, 128, 300, 599, 600] {
            bs.set(d);
        }
        let batches: [[u32; 8]; 4] = [
            [1, 2, 3, 4, 5, 6, 7, 8],
            [63, 64, 65, 126, 127, 128, 129, 130],
            [599, 600, 598, 0, 0, 0, 0, 0],
            [9, 10, 11, 12, 13, 14, 15, 16],
        ];
        for batch in &batches {
            assert_eq!(
                any_dup8(bs.words(), batch),
                scalar::any_dup8(bs.words(), batch),
                "mismatch on {:?}",
                batch
            );
        }
    }

    #[test]
    fn test_guard_words_are_masked() {
        if !avx2_available() {
            return;
        }
        // Distances landing in the guard words must not report a hit even
        // if stale data were present there; the bitset is zeroed so this
        // exercises the in-bounds-but-beyond-live-range path.
        let bs = DistanceBitset::new();
        assert!(!any_dup8(bs.words(), &[640, 650, 660, 670, 680, 690, 700, 703]));
    }
}
