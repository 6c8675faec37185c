//! AVX-512 gather duplicate-distance probe
//!
//! The widest backend: one 8-wide 64-bit gather, per-lane masks built with
//! the variable shift `vpsllvq`, and a vector non-zero test. No scalar loop
//! at all. Opt-in via `GOLOMB_USE_AVX512` because downclocking can make it
//! slower than the AVX2 path on some parts.

use crate::simd::platform_detection;
use crate::types::BITSET_WORDS;

/// Test whether any of the eight distances indexes a set bit.
///
/// Must only be selected after AVX-512F has been detected at runtime; the
/// dispatcher guarantees this.
#[inline]
pub fn any_dup8(words: &[u64; BITSET_WORDS], dist8: &[u32; 8]) -> bool {
    debug_assert!(platform_detection::get_platform_capabilities().has_avx512);
    unsafe { any_dup8_impl(words, dist8) }
}

#[target_feature(enable = "avx512f,avx2")]
unsafe fn any_dup8_impl(words: &[u64; BITSET_WORDS], dist8: &[u32; 8]) -> bool {
    use std::arch::x86_64::*;

    // load 8 distances
    let vdist32 = _mm256_loadu_si256(dist8.as_ptr().cast::<__m256i>());

    // word indices = dist >> 6
    let vword_idx = _mm256_srli_epi32::<6>(vdist32);

    // gather 8 words (64-bit each, scale = 8 bytes)
    let gathered = _mm512_i32gather_epi64::<8>(vword_idx, words.as_ptr().cast::<i64>());

    // bit offsets = dist & 63, widened to 64-bit shift counts
    let vbit_off32 = _mm256_and_si256(vdist32, _mm256_set1_epi32(63));
    let vbit_off64 = _mm512_cvtepu32_epi64(vbit_off32);

    // per-lane mask = 1 << bit, then AND and reduce
    let masks = _mm512_sllv_epi64(_mm512_set1_epi64(1), vbit_off64);
    let dup = _mm512_and_epi64(gathered, masks);

    _mm512_test_epi64_mask(dup, dup) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::distance_bitset::DistanceBitset;
    use crate::simd::scalar;

    fn avx512_available() -> bool {
        platform_detection::get_platform_capabilities().has_avx512
    }

    #[test]
    fn test_matches_scalar_on_fixed_patterns() {
        if !avx512_available() {
            return;
        }
        let mut bs = DistanceBitset::new();
        for d in [1u32, 2, 62, 63, 64, 191, 192, 511, 600] {
            bs.set(d);
        }
        let batches: [[u32; 8]; 4] = [
            [1, 2, 3, 4, 5, 6, 7, 8],
            [62, 63, 64, 65, 190, 191, 192, 193],
            [510, 511, 512, 600, 0, 0, 0, 0],
            [20, 21, 22, 23, 24, 25, 26, 27],
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
}
