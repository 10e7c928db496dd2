/// Sum of Absolute Differences (SAD) / Manhattan distance on RGB, optionally RGBA.
/// both buffers are premultiplied RGBA8 of identical size.
use rayon::prelude::*;

use super::{band_rows, PartialSum};

/// SAD of one pixel
#[inline(always)]
fn pixel_sad(t: &[u8], c: &[u8], alpha: bool) -> u64 {
    let r = (t[0] as i32 - c[0] as i32).unsigned_abs();
    let g = (t[1] as i32 - c[1] as i32).unsigned_abs();
    let b = (t[2] as i32 - c[2] as i32).unsigned_abs();
    let a = if alpha { (t[3] as i32 - c[3] as i32).unsigned_abs() } else { 0 };
    (r + g + b + a) as u64
}

/// SAD over a run of whole pixels (the compiler vectorizes this loop)
#[inline]
pub fn sad_rgb_span(target: &[u8], current: &[u8], alpha: bool) -> u64 {
    target
        .chunks_exact(4)
        .zip(current.chunks_exact(4))
        .map(|(t, c)| pixel_sad(t, c, alpha))
        .sum()
}

/// row-wise SAD.
/// early-exit optimization: if `threshold` is given, checks after every row and stops
/// as soon as the accumulated sum exceeds it. without a threshold, bands of rows
/// are summed in parallel with rayon.
pub fn sad_rgb_rows(
    target: &[u8],
    current: &[u8],
    row_bytes: usize,
    alpha: bool,
    threshold: Option<f64>,
) -> PartialSum {
    profiling::scope!("sad_rgb_rows");
    debug_assert_eq!(target.len(), current.len());
    debug_assert_eq!(target.len() % row_bytes, 0);

    match threshold {
        Some(limit) => {
            let mut acc = 0u64;
            for (t_row, c_row) in target.chunks_exact(row_bytes).zip(current.chunks_exact(row_bytes)) {
                acc += sad_rgb_span(t_row, c_row, alpha);
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
                .map(|(t, c)| sad_rgb_span(t, c, alpha))
                .sum();
            PartialSum { sum, exited: false }
        }
    }
}
