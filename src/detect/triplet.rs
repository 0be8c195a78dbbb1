use super::arc::{Arc, Quadrant};
use super::chord::{get_parallel_chords_and_estimate_center, ParallelChords};
use super::convexity::QuadrantArc;

/// An ellipse hypothesis: three quadrant-distinct arcs, their two interim
/// center estimates and four chord families, and (once filled by the
/// parameter estimator) the fitted center/rho/axes/score.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    /// Index into the arc arena, counter-clockwise by quadrant.
    pub arc1: usize,
    pub arc2: usize,
    pub arc3: usize,

    pub center32: (f32, f32),
    pub center21: (f32, f32),

    pub chord3start2mid: ParallelChords,
    pub chord3mid2end: ParallelChords,
    pub chord2start1mid: ParallelChords,
    pub chord2mid1end: ParallelChords,

    pub center: (f32, f32),
    pub rho: f32,
    pub a: f32,
    pub b: f32,
    pub score: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct TripletFinderConfig {
    pub mutual_position_bounding_box_pixel_tolerance: i32,
    pub center_distance_percent: f32,
    pub number_of_parallel_chords: usize,
}

/// For each cyclic quadrant ordering (Q1Q2Q3, Q2Q3Q4, Q3Q4Q1, Q4Q1Q2), find
/// arc triples whose mutual bounding-box positions are consistent with a
/// single ellipse and whose two chord-implied centers agree.
pub fn find_triplets(
    arcs: &[QuadrantArc],
    image_diagonal: f32,
    config: &TripletFinderConfig,
) -> Vec<Hypothesis> {
    let mut buckets: [Vec<usize>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for (i, qa) in arcs.iter().enumerate() {
        buckets[quadrant_index(qa.quadrant)].push(i);
    }

    let max_center_dist2 =
        (config.center_distance_percent * image_diagonal) * (config.center_distance_percent * image_diagonal);

    let mut hypotheses = Vec::new();
    for s in 0..4 {
        let bucket_a = &buckets[s];
        let bucket_b = &buckets[(s + 1) % 4];
        let bucket_c = &buckets[(s + 2) % 4];

        for &ia in bucket_a {
            for &ib in bucket_b {
                if !mutual_position_ok(
                    s,
                    &arcs[ia].arc,
                    &arcs[ib].arc,
                    config.mutual_position_bounding_box_pixel_tolerance,
                ) {
                    continue;
                }

                for &ic in bucket_c {
                    if !mutual_position_ok(
                        (s + 1) % 4,
                        &arcs[ib].arc,
                        &arcs[ic].arc,
                        config.mutual_position_bounding_box_pixel_tolerance,
                    ) {
                        continue;
                    }

                    if let Some(h) = try_build_hypothesis(arcs, ia, ib, ic, max_center_dist2, config) {
                        hypotheses.push(h);
                    }
                }
            }
        }
    }

    hypotheses
}

fn try_build_hypothesis(
    arcs: &[QuadrantArc],
    ia: usize,
    ib: usize,
    ic: usize,
    max_center_dist2: f32,
    config: &TripletFinderConfig,
) -> Option<Hypothesis> {
    let arc1 = &arcs[ia];
    let arc2 = &arcs[ib];
    let arc3 = &arcs[ic];

    let (chord3start2mid, chord3mid2end, center32) = get_parallel_chords_and_estimate_center(
        &arc3.arc,
        arc3.quadrant,
        &arc2.arc,
        arc2.quadrant,
        config.number_of_parallel_chords,
    )?;
    let (chord2start1mid, chord2mid1end, center21) = get_parallel_chords_and_estimate_center(
        &arc2.arc,
        arc2.quadrant,
        &arc1.arc,
        arc1.quadrant,
        config.number_of_parallel_chords,
    )?;

    let dx = center32.0 - center21.0;
    let dy = center32.1 - center21.1;
    if dx * dx + dy * dy >= max_center_dist2 {
        return None;
    }

    Some(Hypothesis {
        arc1: ia,
        arc2: ib,
        arc3: ic,
        center32,
        center21,
        chord3start2mid,
        chord3mid2end,
        chord2start1mid,
        chord2mid1end,
        center: (0.0, 0.0),
        rho: 0.0,
        a: 0.0,
        b: 0.0,
        score: 0.0,
    })
}

fn quadrant_index(q: Quadrant) -> usize {
    match q {
        Quadrant::Q1 => 0,
        Quadrant::Q2 => 1,
        Quadrant::Q3 => 2,
        Quadrant::Q4 => 3,
    }
}

/// The four mutual-position predicates, cyclic over quadrant pairs
/// (Q1,Q2), (Q2,Q3), (Q3,Q4), (Q4,Q1).
fn mutual_position_ok(idx: usize, a: &Arc, b: &Arc, tol: i32) -> bool {
    match idx {
        0 => b.right < a.left + tol,
        1 => b.top > a.bottom - tol,
        2 => b.left > a.right - tol,
        3 => b.bottom < a.top + tol,
        _ => unreachable!("quadrant index is always 0..4"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::arc::Point;

    fn make_quadrant_arc(points: Vec<(i32, i32)>, gradient_sign: i8, quadrant: Quadrant) -> QuadrantArc {
        let points: Vec<Point> = points.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        let left = points.iter().map(|p| p.x).min().unwrap();
        let right = points.iter().map(|p| p.x).max().unwrap();
        let top = points.iter().map(|p| p.y).min().unwrap();
        let bottom = points.iter().map(|p| p.y).max().unwrap();
        QuadrantArc {
            arc: Arc {
                points,
                top,
                bottom,
                left,
                right,
                gradient_sign,
            },
            quadrant,
        }
    }

    #[test]
    fn mutual_position_q1q2_requires_separation() {
        let a = make_quadrant_arc(vec![(10, 0), (11, 1)], 1, Quadrant::Q1).arc;
        let b_ok = make_quadrant_arc(vec![(0, 0), (1, 1)], -1, Quadrant::Q2).arc;
        let b_bad = make_quadrant_arc(vec![(20, 0), (21, 1)], -1, Quadrant::Q2).arc;
        assert!(mutual_position_ok(0, &a, &b_ok, 1));
        assert!(!mutual_position_ok(0, &a, &b_bad, 1));
    }

    #[test]
    fn no_triplets_from_empty_arena() {
        let hyps = find_triplets(
            &[],
            100.0,
            &TripletFinderConfig {
                mutual_position_bounding_box_pixel_tolerance: 1,
                center_distance_percent: 0.05,
                number_of_parallel_chords: 16,
            },
        );
        assert!(hyps.is_empty());
    }

    #[test]
    fn single_quadrant_arena_yields_no_triplets() {
        let arcs = vec![
            make_quadrant_arc(vec![(0, 0), (1, 1), (2, 2)], 1, Quadrant::Q1),
            make_quadrant_arc(vec![(3, 3), (4, 4), (5, 5)], 1, Quadrant::Q1),
        ];
        let hyps = find_triplets(
            &arcs,
            100.0,
            &TripletFinderConfig {
                mutual_position_bounding_box_pixel_tolerance: 1,
                center_distance_percent: 0.05,
                number_of_parallel_chords: 16,
            },
        );
        assert!(hyps.is_empty());
    }
}
