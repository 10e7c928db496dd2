use serde::{Deserialize, Serialize};
use std::fmt;

/// which local edit produced a candidate. closed set, one tag per mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    ReplaceShape,
    ReplaceColor,
    ReplacePoint,
    ReplacePoints,
    AdjustColor,
    AdjustPoint,
    AdjustPoints,
    SwapShapes,
}

impl MutationKind {
    pub const COUNT: usize = 8;

    /// every kind, in declaration order (also the order used by status reports)
    pub const ALL: [MutationKind; Self::COUNT] = [
        MutationKind::ReplaceShape,
        MutationKind::ReplaceColor,
        MutationKind::ReplacePoint,
        MutationKind::ReplacePoints,
        MutationKind::AdjustColor,
        MutationKind::AdjustPoint,
        MutationKind::AdjustPoints,
        MutationKind::SwapShapes,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// a polygon with a fixed number of integer vertices and an un-premultiplied RGBA color.
/// vertices address pixel centers and always lie inside the canvas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub points: Vec<(u32, u32)>,
    pub rgba: [u8; 4],
}

impl Shape {
    pub fn new(points: Vec<(u32, u32)>, rgba: [u8; 4]) -> Self {
        Self { points, rgba }
    }

    /// true if every vertex lies in [0,width)x[0,height)
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.points.iter().all(|&(x, y)| x < width && y < height)
    }
}

/// one approximation of the target: an opaque canvas color, shapes in paint order
/// (first = bottom), the divergence from the last evaluation, and the mutation
/// that produced it.
///
/// `Clone` is a deep copy. published candidates live behind an `Arc` and are
/// never modified again; workers mutate private clones only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    /// opaque fill under the first shape; mutations never change it
    #[serde(default = "default_background")]
    pub background: [u8; 4],
    pub shapes: Vec<Shape>,
    pub divergence: f64,
    /// `None` for the initializer's output
    pub last_mutation: Option<MutationKind>,
}

fn default_background() -> [u8; 4] {
    crate::render::BACKGROUND
}

impl Candidate {
    /// unevaluated candidate; divergence starts at the worst possible score
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { background: crate::render::BACKGROUND, shapes, divergence: 1.0, last_mutation: None }
    }

    /// same, over a different canvas color (alpha is forced to opaque)
    pub fn with_background(shapes: Vec<Shape>, background: [u8; 4]) -> Self {
        let [r, g, b, _] = background;
        Self { background: [r, g, b, 255], ..Self::new(shapes) }
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// vertex count of the first shape (all shapes of a task share it)
    pub fn vertex_count(&self) -> usize {
        self.shapes.first().map_or(0, |s| s.points.len())
    }

    /// structural equality: same canvas and shapes in the same order, ignoring score and tag
    pub fn same_shapes(&self, other: &Candidate) -> bool {
        self.background == other.background && self.shapes == other.shapes
    }
}
