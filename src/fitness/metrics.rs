//─────────────────────────────────────────────────────────────────────────────
// resolution-invariant metrics (fitness %, PSNR)
//─────────────────────────────────────────────────────────────────────────────

/// peak value for 8-bit channels
pub const PSNR_PEAK: f64 = 255.0;

/// PSNR (peak signal-to-noise ratio) in decibels.
/// - `mse`: mean squared error (or pseudo-MSE from SAD)
/// - `peak`: 255.0 for 8-bit images, 1.0 for normalized [0,1] range
/// higher PSNR = better quality. typical ranges:
///   - 30 dB = acceptable
///   - 35 dB = good
///   - 40+ dB = very good
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// `100 - divergence * 100`, the number shown to the user
#[inline]
pub fn fitness_percent(divergence: f64) -> f64 {
    100.0 - divergence * 100.0
}

/// cached snapshot of resolution-invariant metrics for one divergence value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub fitness_percent: f64,
    /// mean absolute error per channel, in 8-bit units
    pub sad_per_channel: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    /// divergence is already normalized per pixel and channel, so it scales straight
    /// back to 8-bit units. pseudo-MSE convention: treat L1/px/channel as if MSE.
    #[inline]
    pub fn from_divergence(divergence: f64) -> Self {
        let sad_per_channel = divergence * PSNR_PEAK;
        Self {
            fitness_percent: fitness_percent(divergence),
            sad_per_channel,
            psnr: psnr_from_mse(sad_per_channel, PSNR_PEAK),
        }
    }
}
