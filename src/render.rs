use tiny_skia as sk;
use crate::dna::{Candidate, Shape};
use std::sync::atomic::{AtomicBool, Ordering};

// Global anti-aliasing setting (set once from settings before a task starts)
static POLYGON_ANTIALIASING: AtomicBool = AtomicBool::new(true);

/// Update the polygon anti-aliasing setting
pub fn set_polygon_antialiasing(enabled: bool) {
    POLYGON_ANTIALIASING.store(enabled, Ordering::Relaxed);
}

pub fn polygon_antialiasing() -> bool {
    POLYGON_ANTIALIASING.load(Ordering::Relaxed)
}

/// default canvas color under the first shape (opaque black)
pub const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// allocate a worker-local scratch canvas. None if the dimensions are zero or too large.
pub fn new_scratch(width: u32, height: u32) -> Option<sk::Pixmap> {
    sk::Pixmap::new(width, height)
}

/// Full-frame render into `pix`, in paint order, over the candidate's opaque background.
/// The result is premultiplied RGBA (tiny-skia's native format); since the
/// background is opaque every pixel ends up opaque, so it equals the unpremultiplied image.
pub fn render_candidate(pix: &mut sk::Pixmap, candidate: &Candidate) {
    profiling::scope!("render_candidate");
    let [r, g, b, _] = candidate.background;
    pix.fill(sk::Color::from_rgba8(r, g, b, 255));

    let anti_alias = polygon_antialiasing();
    for shape in &candidate.shapes {
        draw_shape(pix, shape, anti_alias);
    }
}

/// render to a fresh RGBA buffer (used by exporters, not the hot path)
pub fn render_rgba(candidate: &Candidate, width: u32, height: u32) -> Option<Vec<u8>> {
    profiling::scope!("render_rgba");
    let mut pix = new_scratch(width, height)?;
    render_candidate(&mut pix, candidate);
    Some(pix.take())
}

fn draw_shape(pix: &mut sk::Pixmap, shape: &Shape, anti_alias: bool) {
    profiling::scope!("draw_shape");
    // fully transparent shapes leave the canvas untouched
    if shape.points.len() < 3 || shape.rgba[3] == 0 {
        return;
    }

    let mut pb = sk::PathBuilder::new();
    let (x0, y0) = shape.points[0];
    pb.move_to(x0 as f32 + 0.5, y0 as f32 + 0.5);
    for &(x, y) in &shape.points[1..] {
        pb.line_to(x as f32 + 0.5, y as f32 + 0.5);
    }
    pb.close();

    // zero-area outlines are skipped by tiny-skia itself; None only for invalid bounds
    let Some(path) = pb.finish() else {
        return;
    };

    let [r, g, b, a] = shape.rgba;
    let mut paint = sk::Paint::default();
    paint.anti_alias = anti_alias;
    paint.set_color_rgba8(r, g, b, a);

    pix.fill_path(&path, &paint, sk::FillRule::Winding, sk::Transform::identity(), None);
}

/// Premultiply RGBA - optimized scalar implementation (compiler will auto-vectorize)
#[inline(always)]
pub fn premultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("premultiply");

    let mut out = vec![0u8; p.len()];
    for (dst, src) in out.chunks_exact_mut(4).zip(p.chunks_exact(4)) {
        let a = src[3] as u16;
        // (x * a + 127) / 255 is a fast rounded divide-by-255
        dst[0] = ((src[0] as u16 * a + 127) / 255) as u8;
        dst[1] = ((src[1] as u16 * a + 127) / 255) as u8;
        dst[2] = ((src[2] as u16 * a + 127) / 255) as u8;
        dst[3] = a as u8;
    }

    out
}
