use std::collections::HashMap;

use crate::edge_map::EdgeMap;
use crate::error::DetectError;

use super::unionfind::UnionFind;

/// An integer pixel coordinate, image-space (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Which quarter of an ellipse an arc could plausibly belong to.
///
/// Screen convention: y grows downward, quadrants labeled counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    /// The quadrant that cyclically follows this one (Q1->Q2->Q3->Q4->Q1).
    pub fn next(self) -> Quadrant {
        match self {
            Quadrant::Q1 => Quadrant::Q2,
            Quadrant::Q2 => Quadrant::Q3,
            Quadrant::Q3 => Quadrant::Q4,
            Quadrant::Q4 => Quadrant::Q1,
        }
    }
}

/// An ordered sequence of connected edge points hypothesized to lie on one
/// quarter of an ellipse.
#[derive(Debug, Clone)]
pub struct Arc {
    /// Sorted by (x ascending, y ascending on tie).
    pub points: Vec<Point>,
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
    /// sign(gx)*sign(gy), inverted for screen-y-down convention, taken from
    /// the arc's first (lowest-x) point.
    pub gradient_sign: i8,
}

impl Arc {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn midpoint_by_index(&self) -> Point {
        self.points[self.points.len() / 2]
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        *self.points.last().expect("arc has at least one point")
    }
}

/// The gradient sign used throughout the pipeline: `-sign(gx)*sign(gy)`.
///
/// The inversion by -1 accounts for screen-space y growing downward; it
/// must be applied everywhere a gradient sign is derived, never only in
/// some call sites.
pub fn oriented_gradient_sign(gx: f32, gy: f32) -> i8 {
    let sx = gx.signum() as i8;
    let sy = gy.signum() as i8;
    -(sx * sy)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentCounts {
    pub total_line_segment_count: usize,
    pub short_line_count: usize,
    pub straight_line_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ArcSegmenterConfig {
    pub min_arc_pixel_count: usize,
    pub min_bounding_box_size: i32,
    pub check_all_arc_points_for_straight_line: bool,
}

impl Default for ArcSegmenterConfig {
    fn default() -> Self {
        Self {
            min_arc_pixel_count: 16,
            min_bounding_box_size: 3,
            check_all_arc_points_for_straight_line: false,
        }
    }
}

const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(-1, -1), (0, -1), (1, -1), (-1, 0)];

/// Segment an edge map into arcs by connected-components keyed on gradient
/// sign, filtering out runs that are too short or too straight.
///
/// Fails fast with `DetectError::CorruptEdgeMap` if an edge pixel's gradient
/// is undefined (NaN), violating the `EdgeMap` contract; the border itself is
/// skipped by construction (the loop bounds below never reach it) rather than
/// checked at runtime.
pub fn segment_arcs(
    em: &dyn EdgeMap,
    config: &ArcSegmenterConfig,
) -> Result<(Vec<Arc>, SegmentCounts), DetectError> {
    let w = em.width();
    let h = em.height();
    if w < 2 || h < 2 {
        return Ok((Vec::new(), SegmentCounts::default()));
    }

    let mut uf = UnionFind::new((w * h) as usize);
    let mut valid = vec![false; (w * h) as usize];
    let mut gsign = vec![0i8; (w * h) as usize];

    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            if !em.is_edge(x, y) {
                continue;
            }
            let gx = em.grad_x(x, y);
            let gy = em.grad_y(x, y);
            if gx.is_nan() || gy.is_nan() {
                return Err(DetectError::CorruptEdgeMap { x, y });
            }
            if gx == 0.0 || gy == 0.0 {
                continue;
            }
            let g = oriented_gradient_sign(gx, gy);
            let id = y * w + x;
            valid[id as usize] = true;
            gsign[id as usize] = g;
            uf.find(id);

            for &(dx, dy) in &NEIGHBOR_OFFSETS {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                let nid = ny * w + nx;
                if valid[nid as usize] && gsign[nid as usize] == g {
                    uf.union(id, nid);
                }
            }
        }
    }

    let mut groups: HashMap<u32, Vec<Point>> = HashMap::new();
    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            let id = y * w + x;
            if !valid[id as usize] {
                continue;
            }
            let root = uf.find(id);
            groups
                .entry(root)
                .or_default()
                .push(Point::new(x as i32, y as i32));
        }
    }

    let mut roots: Vec<u32> = groups.keys().copied().collect();
    roots.sort_unstable();

    let mut counts = SegmentCounts {
        total_line_segment_count: roots.len(),
        ..Default::default()
    };
    let mut arcs = Vec::new();

    for root in roots {
        let mut points = groups.remove(&root).unwrap();
        if points.len() < config.min_arc_pixel_count {
            counts.short_line_count += 1;
            continue;
        }

        points.sort_by(|a, b| a.x.cmp(&b.x).then(a.y.cmp(&b.y)));

        let left = points.iter().map(|p| p.x).min().unwrap();
        let right = points.iter().map(|p| p.x).max().unwrap();
        let top = points.iter().map(|p| p.y).min().unwrap();
        let bottom = points.iter().map(|p| p.y).max().unwrap();

        let first = points[0];
        let g = gsign[(first.y as u32 * w + first.x as u32) as usize];

        if is_straight(&points, top, bottom, left, right, g, config) {
            counts.straight_line_count += 1;
            continue;
        }

        arcs.push(Arc {
            points,
            top,
            bottom,
            left,
            right,
            gradient_sign: g,
        });
    }

    Ok((arcs, counts))
}

fn is_straight(
    points: &[Point],
    top: i32,
    bottom: i32,
    left: i32,
    right: i32,
    gradient_sign: i8,
    config: &ArcSegmenterConfig,
) -> bool {
    let width = right - left;
    let height = bottom - top;
    if width < config.min_bounding_box_size || height < config.min_bounding_box_size {
        return true;
    }

    let (x1, y1, x2, y2) = if gradient_sign > 0 {
        (left, top, right, bottom)
    } else {
        (left, bottom, right, top)
    };

    let n = points.len();
    let sample_indices: Vec<usize> = if config.check_all_arc_points_for_straight_line {
        (0..n).collect()
    } else {
        vec![n / 4, n / 2, (3 * n) / 4]
    };

    for idx in sample_indices {
        let p = points[idx];
        let dist = perpendicular_distance(p, x1, y1, x2, y2);
        if dist * 2.0 > config.min_bounding_box_size as f64 {
            return false;
        }
    }
    true
}

fn perpendicular_distance(p: Point, x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
    let (px, py) = (p.x as f64, p.y as f64);
    let num = ((y2 - y1) * px - (x2 - x1) * py + x2 * y1 - y2 * x1).abs();
    let den = ((y2 - y1).powi(2) + (x2 - x1).powi(2)).sqrt();
    if den < 1e-9 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_map::OwnedEdgeMap;

    #[test]
    fn oriented_gradient_sign_inverts_product() {
        assert_eq!(oriented_gradient_sign(1.0, 1.0), -1);
        assert_eq!(oriented_gradient_sign(1.0, -1.0), 1);
        assert_eq!(oriented_gradient_sign(-1.0, 1.0), 1);
        assert_eq!(oriented_gradient_sign(-1.0, -1.0), -1);
    }

    #[test]
    fn empty_edge_map_yields_no_arcs() {
        let em = OwnedEdgeMap::new(20, 20);
        let (arcs, counts) = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap();
        assert!(arcs.is_empty());
        assert_eq!(counts.total_line_segment_count, 0);
    }

    #[test]
    fn zero_gradient_pixels_produce_no_arcs() {
        let mut em = OwnedEdgeMap::new(20, 20);
        for i in 2..18 {
            em.set_edge(i, 10, 0.0, 0.0);
        }
        let (arcs, _) = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap();
        assert!(arcs.is_empty());
    }

    #[test]
    fn nan_gradient_on_an_edge_pixel_is_corrupt() {
        let mut em = OwnedEdgeMap::new(20, 20);
        em.set_edge(10, 10, f32::NAN, 1.0);
        let err = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap_err();
        assert!(matches!(err, DetectError::CorruptEdgeMap { x: 10, y: 10 }));
    }

    #[test]
    fn straight_diagonal_line_is_rejected() {
        let mut em = OwnedEdgeMap::new(30, 30);
        for i in 2..28 {
            em.set_edge(i, i, 1.0, 1.0);
        }
        let (arcs, counts) = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap();
        assert!(arcs.is_empty());
        assert!(counts.straight_line_count >= 1);
    }

    #[test]
    fn curved_arc_survives_and_sorts_by_x_then_y() {
        let mut em = OwnedEdgeMap::new(60, 60);
        // A quarter-circle-like curve, convex, with consistent gradient sign.
        for x in 5..40 {
            let fx = (x - 5) as f64 / 35.0;
            let y = 5 + (30.0 * (1.0 - (1.0 - fx * fx).sqrt())) as i32;
            em.set_edge(x, y as u32, 1.0, -1.0);
        }
        let (arcs, counts) = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap();
        assert!(!arcs.is_empty(), "expected at least one curved arc");
        assert_eq!(counts.straight_line_count, 0);
        let arc = &arcs[0];
        for w in arc.points.windows(2) {
            assert!(w[0].x < w[1].x || (w[0].x == w[1].x && w[0].y <= w[1].y));
        }
    }

    #[test]
    fn short_run_is_dropped() {
        let mut em = OwnedEdgeMap::new(30, 30);
        for i in 10..14 {
            em.set_edge(i, 10 + (i % 2), 1.0, -1.0);
        }
        let (arcs, counts) = segment_arcs(&em, &ArcSegmenterConfig::default()).unwrap();
        assert!(arcs.is_empty());
        assert!(counts.short_line_count >= 1);
    }
}
