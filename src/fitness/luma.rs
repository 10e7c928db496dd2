/// luminance SAD: both pixels collapse to one weighted luma value before differencing.
/// coarser than RGB, and one channel instead of three.
use rayon::prelude::*;

use super::{band_rows, PartialSum};

/// Rec. 601 luma, integer weights out of 1000
#[inline(always)]
pub fn luma(p: &[u8]) -> i32 {
    (299 * p[0] as i32 + 587 * p[1] as i32 + 114 * p[2] as i32) / 1000
}

#[inline(always)]
fn pixel_sad(t: &[u8], c: &[u8], alpha: bool) -> u64 {
    let l = (luma(t) - luma(c)).unsigned_abs();
    let a = if alpha { (t[3] as i32 - c[3] as i32).unsigned_abs() } else { 0 };
    (l + a) as u64
}

#[inline]
pub fn sad_luma_span(target: &[u8], current: &[u8], alpha: bool) -> u64 {
    target
        .chunks_exact(4)
        .zip(current.chunks_exact(4))
        .map(|(t, c)| pixel_sad(t, c, alpha))
        .sum()
}

/// row-wise luma SAD with the same early-exit contract as `sad_rgb_rows`
pub fn sad_luma_rows(
    target: &[u8],
    current: &[u8],
    row_bytes: usize,
    alpha: bool,
    threshold: Option<f64>,
) -> PartialSum {
    profiling::scope!("sad_luma_rows");
    debug_assert_eq!(target.len(), current.len());

    match threshold {
        Some(limit) => {
            let mut acc = 0u64;
            for (t_row, c_row) in target.chunks_exact(row_bytes).zip(current.chunks_exact(row_bytes)) {
                acc += sad_luma_span(t_row, c_row, alpha);
                if acc as f64 > limit {
                    return PartialSum { sum: acc, exited: true };
                }
            }
            PartialSum { sum: acc, exited: false }
        }
        None => {
            let band = band_rows(row_bytes) * row_bytes;
            let sum = target
                .par_chunks(band)
                .zip(current.par_chunks(band))
                .map(|(t, c)| sad_luma_span(t, c, alpha))
                .sum();
            PartialSum { sum, exited: false }
        }
    }
}
