use super::arc::{Arc, Point};
use super::triplet::Hypothesis;

#[derive(Debug, Clone, Copy)]
pub struct ValidatorConfig {
    pub distance_to_ellipse_contour: f32,
    pub distance_to_ellipse_contour_score_cutoff: f32,
    pub reliability_cutoff: f32,
}

/// Score a hypothesis by the fraction of its source-arc points lying on the
/// fitted ellipse contour and by an angular-coverage reliability term.
/// Returns `None` if either threshold rejects the hypothesis.
pub fn validate(hyp: &Hypothesis, arcs: [&Arc; 3], config: &ValidatorConfig) -> Option<f32> {
    let (cx, cy) = hyp.center;
    let (sin_r, cos_r) = hyp.rho.sin_cos();
    let a2 = hyp.a * hyp.a;
    let b2 = hyp.b * hyp.b;
    if a2 < 1e-6 || b2 < 1e-6 {
        return None;
    }

    let mut on_contour = 0usize;
    let mut total_points = 0usize;
    for arc in arcs {
        total_points += arc.point_count();
        for p in &arc.points {
            let dx = p.x as f32 - cx;
            let dy = p.y as f32 - cy;
            // calculatePointsOnEllipse's rotation convention.
            let rx = dx * cos_r - dy * sin_r;
            let ry = dx * sin_r - dy * cos_r;
            let h = rx * rx / a2 + ry * ry / b2;
            if (h - 1.0).abs() < config.distance_to_ellipse_contour {
                on_contour += 1;
            }
        }
    }

    if total_points == 0 {
        return None;
    }

    let score = on_contour as f32 / total_points as f32;
    if score <= config.distance_to_ellipse_contour_score_cutoff {
        return None;
    }

    let reliability = calculate_reliability(arcs, cx, cy, sin_r, cos_r, hyp.a, hyp.b);
    if reliability <= config.reliability_cutoff {
        return None;
    }

    Some((score + reliability) / 2.0)
}

/// Angular-coverage proxy: rotate each arc's endpoints into the ellipse
/// frame and accumulate their displacement, normalized by the perimeter
/// proxy `3*(a+b)`, clamped to 1.
///
/// Uses `calculateReliability`'s rotation convention, which differs from
/// `calculatePointsOnEllipse`'s by a sign on the y term. The asymmetry is
/// preserved verbatim per the source rather than "fixed".
fn calculate_reliability(arcs: [&Arc; 3], cx: f32, cy: f32, sin_r: f32, cos_r: f32, a: f32, b: f32) -> f32 {
    let mut accum = 0.0f32;
    for arc in arcs {
        let (r1x, r1y) = rotate_for_reliability(arc.first(), cx, cy, sin_r, cos_r);
        let (r2x, r2y) = rotate_for_reliability(arc.last(), cx, cy, sin_r, cos_r);
        accum += (r2x - r1x).abs() + (r2y - r1y).abs();
    }

    let denom = 3.0 * (a + b);
    if denom.abs() < 1e-6 {
        return 0.0;
    }
    (accum / denom).min(1.0)
}

fn rotate_for_reliability(p: Point, cx: f32, cy: f32, sin_r: f32, cos_r: f32) -> (f32, f32) {
    let dx = p.x as f32 - cx;
    let dy = p.y as f32 - cy;
    let rx = dx * cos_r - dy * sin_r;
    let ry = dx * sin_r + dy * cos_r;
    (rx, ry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::arc::Point as Pt;

    fn circle_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Pt> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                Pt::new((cx + r * t.cos()).round() as i32, (cy + r * t.sin()).round() as i32)
            })
            .collect()
    }

    fn make_arc(points: Vec<Pt>) -> Arc {
        let left = points.iter().map(|p| p.x).min().unwrap();
        let right = points.iter().map(|p| p.x).max().unwrap();
        let top = points.iter().map(|p| p.y).min().unwrap();
        let bottom = points.iter().map(|p| p.y).max().unwrap();
        Arc {
            points,
            top,
            bottom,
            left,
            right,
            gradient_sign: 1,
        }
    }

    fn base_hypothesis(center: (f32, f32), rho: f32, a: f32, b: f32) -> Hypothesis {
        use crate::detect::chord::ParallelChords;
        let empty_chord = ParallelChords {
            reference_slope: 0.0,
            midpoints: Vec::new(),
            slopes: Vec::new(),
            perpendicular_slopes: Vec::new(),
            median_centroid: (0.0, 0.0),
            median_slope: 0.0,
        };
        Hypothesis {
            arc1: 0,
            arc2: 1,
            arc3: 2,
            center32: center,
            center21: center,
            chord3start2mid: empty_chord.clone(),
            chord3mid2end: empty_chord.clone(),
            chord2start1mid: empty_chord.clone(),
            chord2mid1end: empty_chord,
            center,
            rho,
            a,
            b,
            score: 0.0,
        }
    }

    #[test]
    fn circle_points_pass_validation() {
        let pts = circle_points(100.0, 100.0, 50.0, 60);
        let arc1 = make_arc(pts[0..20].to_vec());
        let arc2 = make_arc(pts[20..40].to_vec());
        let arc3 = make_arc(pts[40..60].to_vec());
        let hyp = base_hypothesis((100.0, 100.0), 0.0, 50.0, 50.0);
        let config = ValidatorConfig {
            distance_to_ellipse_contour: 0.5,
            distance_to_ellipse_contour_score_cutoff: 0.4,
            reliability_cutoff: 0.0,
        };
        let score = validate(&hyp, [&arc1, &arc2, &arc3], &config);
        assert!(score.is_some());
        assert!(score.unwrap() > 0.4);
    }

    #[test]
    fn wildly_wrong_axes_are_rejected() {
        let pts = circle_points(100.0, 100.0, 50.0, 60);
        let arc1 = make_arc(pts[0..20].to_vec());
        let arc2 = make_arc(pts[20..40].to_vec());
        let arc3 = make_arc(pts[40..60].to_vec());
        let hyp = base_hypothesis((100.0, 100.0), 0.0, 5.0, 5.0);
        let config = ValidatorConfig {
            distance_to_ellipse_contour: 0.5,
            distance_to_ellipse_contour_score_cutoff: 0.4,
            reliability_cutoff: 0.4,
        };
        assert!(validate(&hyp, [&arc1, &arc2, &arc3], &config).is_none());
    }

    #[test]
    fn degenerate_zero_axis_rejected() {
        let pts = circle_points(100.0, 100.0, 50.0, 12);
        let arc1 = make_arc(pts[0..4].to_vec());
        let arc2 = make_arc(pts[4..8].to_vec());
        let arc3 = make_arc(pts[8..12].to_vec());
        let hyp = base_hypothesis((100.0, 100.0), 0.0, 0.0, 0.0);
        let config = ValidatorConfig {
            distance_to_ellipse_contour: 0.5,
            distance_to_ellipse_contour_score_cutoff: 0.4,
            reliability_cutoff: 0.4,
        };
        assert!(validate(&hyp, [&arc1, &arc2, &arc3], &config).is_none());
    }
}
