// Fitness module organization
// the target image, the evaluator variants and the per-channel sums they dispatch to

pub mod luma;
pub mod metrics;
pub mod sad;

pub use metrics::MetricsSnapshot;

use serde::{Deserialize, Serialize};
use tiny_skia as sk;

use crate::dna::Candidate;
use crate::error::EngineError;
use crate::render::{premultiply, render_candidate};

/// the image being approximated. stored premultiplied to match the canvas format.
#[derive(Clone, Debug)]
pub struct TargetImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>, // premultiplied RGBA
}

impl TargetImage {
    /// build from un-premultiplied RGBA8 (the format image loaders hand out)
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyTarget { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(EngineError::TargetLengthMismatch { expected, actual: rgba.len() });
        }
        Ok(Self { width, height, rgba: premultiply(&rgba) })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn rgba_premul(&self) -> &[u8] {
        &self.rgba
    }
}

/// running total of a (possibly early-exited) divergence sum
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialSum {
    pub sum: u64,
    /// true if accumulation stopped before the last row
    pub exited: bool,
}

/// evaluator variants. fixed for the lifetime of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evaluator {
    /// absolute difference per R, G, B (and A) channel
    Rgb { alpha: bool },
    /// absolute difference of weighted luminance (and A)
    Luma { alpha: bool },
}

impl Evaluator {
    pub fn name(&self) -> &'static str {
        match self {
            Evaluator::Rgb { alpha: false } => "RGB",
            Evaluator::Rgb { alpha: true } => "RGB+alpha",
            Evaluator::Luma { alpha: false } => "Luma",
            Evaluator::Luma { alpha: true } => "Luma+alpha",
        }
    }

    /// channels contributing to the sum (for normalization)
    pub fn channels(&self) -> u32 {
        match *self {
            Evaluator::Rgb { alpha } => 3 + alpha as u32,
            Evaluator::Luma { alpha } => 1 + alpha as u32,
        }
    }

    /// Render `candidate` onto `scratch` and score it against `target`, in [0,1].
    ///
    /// With `bound = Some(b)` accumulation may stop once the partial score exceeds `b`;
    /// the result is then only guaranteed to be `>= b`. A result below `b` is always exact.
    pub fn divergence(
        &self,
        scratch: &mut sk::Pixmap,
        candidate: &Candidate,
        target: &TargetImage,
        bound: Option<f64>,
    ) -> f64 {
        profiling::scope!("Evaluator::divergence");
        debug_assert_eq!((scratch.width(), scratch.height()), (target.width(), target.height()));
        render_candidate(scratch, candidate);
        self.score(scratch.data(), target, bound)
    }

    /// score an already rendered premultiplied RGBA buffer
    pub fn score(&self, rendered: &[u8], target: &TargetImage, bound: Option<f64>) -> f64 {
        profiling::scope!("Evaluator::score");
        debug_assert_eq!(rendered.len(), target.rgba_premul().len());

        let norm = target.pixel_count() as f64 * self.channels() as f64 * 255.0;
        let threshold = bound.map(|b| b * norm);
        let row_bytes = target.width() as usize * 4;

        let partial = match *self {
            Evaluator::Rgb { alpha } => sad::sad_rgb_rows(target.rgba_premul(), rendered, row_bytes, alpha, threshold),
            Evaluator::Luma { alpha } => luma::sad_luma_rows(target.rgba_premul(), rendered, row_bytes, alpha, threshold),
        };

        let divergence = partial.sum as f64 / norm;
        match bound {
            Some(b) if partial.exited => divergence.max(b),
            _ => divergence,
        }
    }
}

/// rows per rayon task in the unbounded path (roughly 64k pixels per task)
#[inline]
pub(crate) fn band_rows(row_bytes: usize) -> usize {
    const PIXELS_PER_BAND: usize = 64 * 1024;
    (PIXELS_PER_BAND / (row_bytes / 4).max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Shape;
    use crate::initializer::Initializer;
    use crate::mutation_config::Mutator;
    use crate::render::new_scratch;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    /// 4x4, white except two red pixels
    fn mostly_white() -> TargetImage {
        let mut rgba = Vec::with_capacity(64);
        for i in 0..16 {
            rgba.extend_from_slice(if i == 5 || i == 10 { &RED } else { &WHITE });
        }
        TargetImage::from_rgba(4, 4, rgba).unwrap()
    }

    fn gradient_target(width: u32, height: u32) -> TargetImage {
        let mut rgba = Vec::new();
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255]);
            }
        }
        TargetImage::from_rgba(width, height, rgba).unwrap()
    }

    const ALL: [Evaluator; 4] = [
        Evaluator::Rgb { alpha: false },
        Evaluator::Rgb { alpha: true },
        Evaluator::Luma { alpha: false },
        Evaluator::Luma { alpha: true },
    ];

    #[test]
    fn test_target_validation() {
        assert_eq!(
            TargetImage::from_rgba(0, 4, Vec::new()).unwrap_err(),
            EngineError::EmptyTarget { width: 0, height: 4 }
        );
        assert_eq!(
            TargetImage::from_rgba(2, 2, vec![0; 15]).unwrap_err(),
            EngineError::TargetLengthMismatch { expected: 16, actual: 15 }
        );
    }

    #[test]
    fn test_solid_black_divergence_by_hand() {
        let target = mostly_white();
        let mut scratch = new_scratch(4, 4).unwrap();
        let start = Initializer::SolidColor { rgba: [0, 0, 0, 255] }.initialize(&mut Pcg32::seed_from_u64(0), 1, 3, 4, 4);

        // 14 white pixels cost 3*255 each, 2 red pixels cost 255 each
        let expected = (14.0 * 765.0 + 2.0 * 255.0) / (16.0 * 3.0 * 255.0);
        let rgb = Evaluator::Rgb { alpha: false }.divergence(&mut scratch, &start, &target, None);
        assert!((rgb - expected).abs() < 1e-12, "{rgb} != {expected}");

        // alpha matches everywhere, so only the normalization changes
        let rgba = Evaluator::Rgb { alpha: true }.divergence(&mut scratch, &start, &target, None);
        assert!((rgba - expected * 3.0 / 4.0).abs() < 1e-12);

        // luma: white = 255, red = 299*255/1000 = 76
        let luma_expected = (14.0 * 255.0 + 2.0 * 76.0) / (16.0 * 255.0);
        let luma = Evaluator::Luma { alpha: false }.divergence(&mut scratch, &start, &target, None);
        assert!((luma - luma_expected).abs() < 1e-12);
    }

    #[test]
    fn test_white_recolor_improves_mostly_white_target() {
        let target = mostly_white();
        let mut scratch = new_scratch(4, 4).unwrap();
        let eval = Evaluator::Rgb { alpha: false };
        let start = Initializer::SolidColor { rgba: [0, 0, 0, 255] }.initialize(&mut Pcg32::seed_from_u64(0), 1, 3, 4, 4);
        let initial = eval.divergence(&mut scratch, &start, &target, None);

        let mut recolored = start.clone();
        recolored.shapes[0].rgba = WHITE;
        recolored.last_mutation = Some(crate::dna::MutationKind::ReplaceColor);
        let after = eval.divergence(&mut scratch, &recolored, &target, Some(initial));
        assert!(after < initial, "{after} !< {initial}");
    }

    #[test]
    fn test_identical_render_scores_zero() {
        let target = TargetImage::from_rgba(3, 2, [0, 0, 0, 255].repeat(6)).unwrap();
        let mut scratch = new_scratch(3, 2).unwrap();
        for eval in ALL {
            assert_eq!(eval.divergence(&mut scratch, &Candidate::new(Vec::new()), &target, None), 0.0);
        }
    }

    #[test]
    fn test_idempotent() {
        let target = gradient_target(37, 23);
        let mut scratch = new_scratch(37, 23).unwrap();
        let c = Initializer::Segmented { rgba: [200, 40, 90, 140] }.initialize(&mut Pcg32::seed_from_u64(4), 10, 4, 37, 23);
        for eval in ALL {
            let a = eval.divergence(&mut scratch, &c, &target, None);
            let b = eval.divergence(&mut scratch, &c, &target, None);
            assert!((0.0..=1.0).contains(&a));
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bounded_matches_unbounded_below_bound() {
        let target = gradient_target(50, 40);
        let mut scratch = new_scratch(50, 40).unwrap();
        let c = Initializer::Segmented { rgba: [90, 90, 90, 255] }.initialize(&mut Pcg32::seed_from_u64(4), 6, 3, 50, 40);
        for eval in ALL {
            let exact = eval.divergence(&mut scratch, &c, &target, None);
            let bounded = eval.divergence(&mut scratch, &c, &target, Some(exact + 0.01));
            assert!((exact - bounded).abs() < 1e-12);
        }
    }

    #[test]
    fn test_early_exit_never_reports_false_improvement() {
        let target = gradient_target(64, 48);
        let mut scratch = new_scratch(64, 48).unwrap();
        let mut rng = Pcg32::seed_from_u64(77);
        let mut c = Initializer::Segmented { rgba: [0, 0, 0, 255] }.initialize(&mut rng, 20, 4, 64, 48);
        for eval in ALL {
            for _ in 0..100 {
                c = Mutator::Hard.mutate(&mut rng, &c, 64, 48);
                let exact = eval.divergence(&mut scratch, &c, &target, None);
                for bound in [0.0, exact * 0.25, exact * 0.9, exact] {
                    let bounded = eval.divergence(&mut scratch, &c, &target, Some(bound));
                    assert!(bounded >= bound, "{} reported {bounded} < bound {bound}", eval.name());
                }
            }
        }
    }

    #[test]
    fn test_shape_over_background_changes_score() {
        let target = TargetImage::from_rgba(6, 6, WHITE.repeat(36)).unwrap();
        let mut scratch = new_scratch(6, 6).unwrap();
        let eval = Evaluator::Rgb { alpha: false };
        let empty = eval.divergence(&mut scratch, &Candidate::new(Vec::new()), &target, None);
        let half = Candidate::new(vec![Shape::new(vec![(0, 0), (5, 0), (5, 5), (0, 5)], [255, 255, 255, 128])]);
        let covered = eval.divergence(&mut scratch, &half, &target, None);
        assert_eq!(empty, 1.0);
        assert!(covered < empty);
    }
}
