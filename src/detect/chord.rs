use super::arc::{Arc, Point, Quadrant};
use super::params::median_of;

/// A family of chords joining two adjacent arcs, mutually parallel to a
/// reference chord, together with the Theil-Sen centroid/slope line their
/// midpoints imply.
#[derive(Debug, Clone)]
pub struct ParallelChords {
    pub reference_slope: f32,
    pub midpoints: Vec<(f32, f32)>,
    pub slopes: Vec<f32>,
    pub perpendicular_slopes: Vec<f32>,
    pub median_centroid: (f32, f32),
    pub median_slope: f32,
}

const DEFAULT_NUMBER_OF_PARALLEL_CHORDS: usize = 16;

/// Compute a family of chords between `arc1` and `arc2`, sampling along
/// `arc1` and bisecting along `arc2` for a point whose chord to the sample
/// is parallel to a reference chord through `arc1`'s midpoint.
///
/// `arc2_quadrant` is `arc2`'s classified quadrant (needed for the
/// start/end endpoint flip); `arc1_quadrant` is `arc1`'s own classified
/// quadrant (needed for the sampling walk direction, a distinct decision
/// from the endpoint flip); `start_of_arc2` selects which of `arc2`'s two
/// endpoints anchors the reference chord.
pub fn get_parallel_chords(
    arc2: &Arc,
    arc2_quadrant: Quadrant,
    arc1: &Arc,
    arc1_quadrant: Quadrant,
    start_of_arc2: bool,
    number_of_parallel_chords: usize,
) -> Option<ParallelChords> {
    let upper = matches!(arc2_quadrant, Quadrant::Q1 | Quadrant::Q2);
    let reference_point = if upper == start_of_arc2 {
        arc2.first()
    } else {
        arc2.last()
    };

    let middle1 = arc1.midpoint_by_index();
    let dx_ref = (reference_point.x - middle1.x) as f32;
    let mut dy_ref = (reference_point.y - middle1.y) as f32;
    if dy_ref.abs() < 1e-5 {
        dy_ref = if dy_ref < 0.0 { -1e-5 } else { 1e-5 };
    }
    let slope_ref = safe_slope(dy_ref, dx_ref);

    let arc1_half = arc1.point_count() / 2;
    if arc1_half < 1 {
        return None;
    }

    // direction: walk away from the arc1 midpoint, toward the endpoint
    // nearer to arc2's reference point. Depends on arc1's own quadrant, not
    // arc2's (distinct from the reference-point flip above).
    let arc1_upper = matches!(arc1_quadrant, Quadrant::Q1 | Quadrant::Q2);
    let forward = arc1_upper == start_of_arc2;

    let sample_indices: Vec<usize> = if number_of_parallel_chords < arc1_half {
        let n = number_of_parallel_chords.max(1);
        let step = arc1_half as f32 / n as f32;
        let mut start = arc1_half as f32 + step / 2.0;
        let half_base = arc1.point_count() / 2;
        (0..n)
            .filter_map(|_| {
                let idx = if forward {
                    half_base as f32 + (start - arc1_half as f32)
                } else {
                    half_base as f32 - (start - arc1_half as f32)
                };
                start += step;
                let idx = idx.round();
                if idx < 0.0 || idx as usize >= arc1.point_count() {
                    None
                } else {
                    Some(idx as usize)
                }
            })
            .collect()
    } else if forward {
        (arc1_half..arc1.point_count()).collect()
    } else {
        (0..=arc1_half).collect()
    };

    let mut midpoints = Vec::with_capacity(sample_indices.len());
    let mut slopes = Vec::with_capacity(sample_indices.len());

    for idx in sample_indices {
        let p1 = arc1.points[idx];
        if let Some((mx, my, slope)) = find_parallel_chord(p1, dx_ref, dy_ref, arc2) {
            midpoints.push((mx, my));
            slopes.push(slope);
        }
    }

    if midpoints.len() < 2 {
        return None;
    }

    let (median_centroid, median_slope, perpendicular_slopes) =
        set_median_slope_and_centroid(&midpoints);

    Some(ParallelChords {
        reference_slope: slope_ref,
        midpoints,
        slopes,
        perpendicular_slopes,
        median_centroid,
        median_slope,
    })
}

fn safe_slope(dy: f32, dx: f32) -> f32 {
    if dx.abs() < 1e-5 {
        let dx = if dx < 0.0 { -1e-5 } else { 1e-5 };
        dy / dx
    } else {
        dy / dx
    }
}

/// Bisect `arc2`'s point list for the exact intersection of the line through
/// `p1` with direction `(dx_ref, dy_ref)` and `arc2`'s polyline, then return
/// the chord's midpoint and slope.
fn find_parallel_chord(
    p1: Point,
    dx_ref: f32,
    dy_ref: f32,
    arc2: &Arc,
) -> Option<(f32, f32, f32)> {
    let cross = |p: Point| -> f32 {
        (p.x - p1.x) as f32 * dy_ref - (p.y - p1.y) as f32 * dx_ref
    };

    let n = arc2.point_count();
    if n < 2 {
        return None;
    }

    let mut lo = 0usize;
    let mut hi = n - 1;
    let c_lo = cross(arc2.points[lo]);
    let c_hi = cross(arc2.points[hi]);
    if c_lo == 0.0 || c_hi == 0.0 || c_lo.signum() == c_hi.signum() {
        return None;
    }

    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        let c_mid = cross(arc2.points[mid]);
        if c_mid == 0.0 {
            lo = mid;
            hi = mid;
            break;
        }
        if c_mid.signum() == c_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let (qx, qy) = if lo == hi {
        (arc2.points[lo].x as f32, arc2.points[lo].y as f32)
    } else {
        let q1 = arc2.points[lo];
        let q2 = arc2.points[hi];
        let c1 = cross(q1);
        let c2 = cross(q2);
        let denom = c1 - c2;
        if denom.abs() < 1e-9 {
            (q1.x as f32, q1.y as f32)
        } else {
            let t = c1 / denom;
            (
                q1.x as f32 + t * (q2.x - q1.x) as f32,
                q1.y as f32 + t * (q2.y - q1.y) as f32,
            )
        }
    };

    let mx = (p1.x as f32 + qx) / 2.0;
    let my = (p1.y as f32 + qy) / 2.0;
    let slope = safe_slope(qy - p1.y as f32, qx - p1.x as f32);

    Some((mx, my, slope))
}

/// Split the chord midpoints in half, pair the i-th with the (i+N/2)-th to
/// get N/2 "perpendicular" slopes, then take medians for a Theil-Sen
/// centroid/slope line through the ellipse center.
fn set_median_slope_and_centroid(midpoints: &[(f32, f32)]) -> ((f32, f32), f32, Vec<f32>) {
    let n = midpoints.len();
    let half = n / 2;

    let mut perpendicular_slopes = Vec::with_capacity(half);
    for i in 0..half {
        let (x1, y1) = midpoints[i];
        let (x2, y2) = midpoints[i + half];
        perpendicular_slopes.push(safe_slope(y2 - y1, x2 - x1));
    }

    let median_slope = if perpendicular_slopes.is_empty() {
        0.0
    } else {
        let mut buf = perpendicular_slopes.clone();
        median_of(&mut buf)
    };

    let mut xs: Vec<f32> = midpoints.iter().map(|p| p.0).collect();
    let mut ys: Vec<f32> = midpoints.iter().map(|p| p.1).collect();
    let median_x = median_of(&mut xs);
    let median_y = median_of(&mut ys);

    ((median_x, median_y), median_slope, perpendicular_slopes)
}

/// Intersect two Theil-Sen lines (median slope + centroid) to estimate the
/// ellipse center.
pub fn estimate_center(chord1: &ParallelChords, chord2: &ParallelChords) -> Option<(f32, f32)> {
    let (m1, (x1, y1)) = (chord1.median_slope, chord1.median_centroid);
    let (m2, (x2, y2)) = (chord2.median_slope, chord2.median_centroid);

    let denom = m2 - m1;
    if denom.abs() < 1e-6 {
        return None;
    }

    let cx = (y1 - m1 * x1 - y2 + m2 * x2) / denom;
    let cy = (m2 * y1 - m1 * y2 + m2 * m1 * (x2 - x1)) / denom;
    Some((cx, cy))
}

/// Compute the two chord families between an outer arc and an inner arc and
/// the center their Theil-Sen lines imply.
///
/// Returns `(chord_outer_to_inner, chord_inner_to_outer, center)`.
pub fn get_parallel_chords_and_estimate_center(
    outer: &Arc,
    outer_quadrant: Quadrant,
    inner: &Arc,
    inner_quadrant: Quadrant,
    number_of_parallel_chords: usize,
) -> Option<(ParallelChords, ParallelChords, (f32, f32))> {
    let chord_a = get_parallel_chords(
        outer,
        outer_quadrant,
        inner,
        inner_quadrant,
        true,
        number_of_parallel_chords,
    )?;
    let chord_b = get_parallel_chords(
        inner,
        inner_quadrant,
        outer,
        outer_quadrant,
        false,
        number_of_parallel_chords,
    )?;
    let center = estimate_center(&chord_a, &chord_b)?;
    Some((chord_a, chord_b, center))
}

pub const NUMBER_OF_PARALLEL_CHORDS_DEFAULT: usize = DEFAULT_NUMBER_OF_PARALLEL_CHORDS;
