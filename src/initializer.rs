use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dna::{Candidate, Shape};
use crate::render::BACKGROUND;

/// how the first candidate of a task is built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initializer {
    /// uniform canvas in one fixed color, with shapes of that color stretched over
    /// its corners (no detail, no randomness)
    SolidColor { rgba: [u8; 4] },
    /// one shape per grid cell, vertices confined near the cell, fixed starting color
    Segmented { rgba: [u8; 4] },
}

impl Initializer {
    /// Build the starting candidate: exactly `shape_count` shapes of `vertex_count`
    /// vertices each, every vertex in [0,width)x[0,height).
    /// Bit-reproducible for a given rng state.
    pub fn initialize<R: Rng>(
        &self,
        rng: &mut R,
        shape_count: usize,
        vertex_count: usize,
        width: u32,
        height: u32,
    ) -> Candidate {
        profiling::scope!("Initializer::initialize");
        match *self {
            Initializer::SolidColor { rgba } => {
                // the canvas carries the color, so shape edges and seams blend into it
                let fill = over_background(rgba);
                let shapes = (0..shape_count).map(|i| corner_shape(i, vertex_count, width, height, fill)).collect();
                Candidate::with_background(shapes, fill)
            }
            Initializer::Segmented { rgba } => {
                Candidate::new(segmented_shapes(rng, shape_count, vertex_count, width, height, rgba))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Initializer::SolidColor { .. } => "SolidColor",
            Initializer::Segmented { .. } => "Segmented",
        }
    }
}

/// `rgba` composited over the default background, as an opaque color
fn over_background(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a = a as u16;
    let keep = 255 - a;
    let mix = |c: u8, under: u8| ((c as u16 * a + under as u16 * keep + 127) / 255) as u8;
    let [r0, g0, b0, _] = BACKGROUND;
    [mix(r, r0), mix(g, g0), mix(b, b0), 255]
}

/// Shape `index` walks the canvas corners starting at corner 2*index (mod 4),
/// so shapes 0 and 1 are complementary triangles (c0,c1,c2) and (c2,c3,c0).
/// Vertices past the fourth repeat the last corner.
fn corner_shape(index: usize, vertex_count: usize, width: u32, height: u32, rgba: [u8; 4]) -> Shape {
    let (r, b) = (width - 1, height - 1);
    let corners = [(0, 0), (r, 0), (r, b), (0, b)];
    let start = (index * 2) % 4;
    let points = (0..vertex_count)
        .map(|v| corners[(start + v.min(3)) % 4])
        .collect();
    Shape::new(points, rgba)
}

/// grid dimensions (cols, rows) for `shape_count` cells with roughly square cells
fn grid_dims(shape_count: usize, width: u32, height: u32) -> (usize, usize) {
    let aspect = width as f64 / height as f64;
    let cols = ((shape_count as f64 * aspect).sqrt().ceil() as usize).clamp(1, shape_count.max(1));
    let rows = shape_count.div_ceil(cols).max(1);
    (cols, rows)
}

fn segmented_shapes<R: Rng>(
    rng: &mut R,
    shape_count: usize,
    vertex_count: usize,
    width: u32,
    height: u32,
    rgba: [u8; 4],
) -> Vec<Shape> {
    let (cols, rows) = grid_dims(shape_count, width, height);
    let cell_w = width as f64 / cols as f64;
    let cell_h = height as f64 / rows as f64;

    (0..shape_count)
        .map(|i| {
            let (col, row) = ((i % cols) as f64, (i / cols) as f64);

            // cell expanded by half a cell on every side, clamped to the canvas
            let x_min = ((col - 0.5) * cell_w).max(0.0) as u32;
            let y_min = ((row - 0.5) * cell_h).max(0.0) as u32;
            let x_max = (((col + 1.5) * cell_w) as u32).clamp(x_min + 1, width);
            let y_max = (((row + 1.5) * cell_h) as u32).clamp(y_min + 1, height);

            let points = (0..vertex_count)
                .map(|_| (rng.random_range(x_min..x_max), rng.random_range(y_min..y_max)))
                .collect();
            Shape::new(points, rgba)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_segmented_is_deterministic() {
        let init = Initializer::Segmented { rgba: BLACK };
        let a = init.initialize(&mut Pcg32::seed_from_u64(42), 50, 5, 320, 200);
        let b = init.initialize(&mut Pcg32::seed_from_u64(42), 50, 5, 320, 200);
        assert!(a.same_shapes(&b));

        let c = init.initialize(&mut Pcg32::seed_from_u64(43), 50, 5, 320, 200);
        assert!(!a.same_shapes(&c));
    }

    #[test]
    fn test_solid_color_pairs_tile_canvas() {
        let init = Initializer::SolidColor { rgba: BLACK };
        let c = init.initialize(&mut Pcg32::seed_from_u64(1), 3, 3, 10, 6);
        assert_eq!(c.shapes[0].points, vec![(0, 0), (9, 0), (9, 5)]);
        assert_eq!(c.shapes[1].points, vec![(9, 5), (0, 5), (0, 0)]);
        assert_eq!(c.shapes[2].points, c.shapes[0].points);
        assert!(c.shapes.iter().all(|s| s.rgba == BLACK));
    }

    #[test]
    fn test_solid_color_renders_uniformly() {
        use crate::render::render_rgba;
        for (rgba, expected) in [
            ([255, 255, 255, 255], [255, 255, 255, 255]),
            ([200, 100, 50, 255], [200, 100, 50, 255]),
            ([200, 100, 50, 128], [100, 50, 25, 255]),
        ] {
            for (w, h, shapes, vertices) in [(4, 4, 2, 3), (4, 4, 1, 3), (7, 5, 3, 4), (1, 1, 2, 5)] {
                let c = Initializer::SolidColor { rgba }.initialize(&mut Pcg32::seed_from_u64(0), shapes, vertices, w, h);
                let pixels = render_rgba(&c, w, h).unwrap();
                let off = pixels.chunks_exact(4).filter(|px| *px != expected).count();
                assert_eq!(off, 0, "{rgba:?} on {w}x{h}: {off} pixels differ from {expected:?}");
            }
        }
    }

    #[test]
    fn test_solid_color_extra_vertices_repeat_last_corner() {
        let init = Initializer::SolidColor { rgba: BLACK };
        let c = init.initialize(&mut Pcg32::seed_from_u64(1), 1, 6, 4, 4);
        assert_eq!(c.shapes[0].points, vec![(0, 0), (3, 0), (3, 3), (0, 3), (0, 3), (0, 3)]);
    }

    #[test]
    fn test_segmented_spreads_over_grid() {
        let init = Initializer::Segmented { rgba: BLACK };
        let c = init.initialize(&mut Pcg32::seed_from_u64(7), 4, 3, 100, 100);
        // 2x2 grid: first shape stays in the top-left, last in the bottom-right
        assert!(c.shapes[0].points.iter().all(|&(x, y)| x < 75 && y < 75));
        assert!(c.shapes[3].points.iter().all(|&(x, y)| x >= 25 && y >= 25));
    }

    #[test]
    fn test_grid_dims_cover_all_shapes() {
        for n in 1..40 {
            let (cols, rows) = grid_dims(n, 300, 100);
            assert!(cols * rows >= n, "n={n} cols={cols} rows={rows}");
        }
    }

    proptest! {
        #[test]
        fn prop_initializers_respect_counts_and_bounds(
            seed in any::<u64>(),
            shapes in 1usize..60,
            vertices in 3usize..8,
            width in 1u32..300,
            height in 1u32..300,
            segmented in any::<bool>(),
        ) {
            let init = if segmented {
                Initializer::Segmented { rgba: BLACK }
            } else {
                Initializer::SolidColor { rgba: BLACK }
            };
            let c = init.initialize(&mut Pcg32::seed_from_u64(seed), shapes, vertices, width, height);
            prop_assert_eq!(c.shapes.len(), shapes);
            for s in &c.shapes {
                prop_assert_eq!(s.points.len(), vertices);
                prop_assert!(s.within(width, height));
            }
        }
    }
}
