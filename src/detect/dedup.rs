use super::detector::Ellipse;

/// Sort hypotheses by score descending, normalize rho to [0, pi), and keep
/// only ellipses that differ enough from every already-retained one.
pub fn cluster(mut ellipses: Vec<Ellipse>) -> Vec<Ellipse> {
    for e in &mut ellipses {
        e.rho = normalize_rho(e.rho);
    }
    ellipses.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut retained: Vec<Ellipse> = Vec::new();
    'candidates: for e in ellipses {
        for r in &retained {
            if !differs_enough(&e, r) {
                continue 'candidates;
            }
        }
        retained.push(e);
    }
    retained
}

fn normalize_rho(rho: f32) -> f32 {
    rho.rem_euclid(std::f32::consts::PI)
}

fn angular_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    d.min(std::f32::consts::PI - d)
}

/// True if `e1` is distinguishable from `e2` by at least one clustering
/// predicate (i.e. they are NOT duplicates of each other).
fn differs_enough(e1: &Ellipse, e2: &Ellipse) -> bool {
    let dx = e1.center.0 - e2.center.0;
    let dy = e1.center.1 - e2.center.1;
    let center_dist2 = dx * dx + dy * dy;
    let min_b = e1.b_axis.min(e2.b_axis);
    if center_dist2 > (0.1 * min_b) * (0.1 * min_b) {
        return true;
    }

    let max_a = e1.a_axis.max(e2.a_axis);
    if max_a > 0.0 && (e1.a_axis - e2.a_axis).abs() / max_a > 1.0 {
        return true;
    }

    let max_b = e1.b_axis.max(e2.b_axis);
    if max_b > 0.0 && (e1.b_axis - e2.b_axis).abs() / max_b > 1.0 {
        return true;
    }

    let rho_dist = angular_distance(e1.rho, e2.rho);
    let elongated = |e: &Ellipse| e.a_axis > 0.0 && e.b_axis / e.a_axis < 0.9;
    if rho_dist / std::f32::consts::PI > 0.1 && elongated(e1) && elongated(e2) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse(center: (f32, f32), rho: f32, a: f32, b: f32, score: f32) -> Ellipse {
        Ellipse {
            center,
            rho,
            a_axis: a,
            b_axis: b,
            score,
        }
    }

    #[test]
    fn identical_ellipses_collapse_to_one() {
        let e1 = ellipse((100.0, 100.0), 0.1, 50.0, 30.0, 0.9);
        let e2 = ellipse((100.5, 100.5), 0.1, 50.2, 30.1, 0.8);
        let result = cluster(vec![e1, e2]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 0.9);
    }

    #[test]
    fn far_apart_ellipses_both_kept() {
        let e1 = ellipse((50.0, 50.0), 0.0, 40.0, 40.0, 0.9);
        let e2 = ellipse((300.0, 300.0), 0.0, 40.0, 40.0, 0.8);
        let result = cluster(vec![e1, e2]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn higher_score_wins_among_duplicates() {
        let e1 = ellipse((100.0, 100.0), 0.0, 50.0, 30.0, 0.5);
        let e2 = ellipse((100.0, 100.0), 0.0, 50.0, 30.0, 0.95);
        let result = cluster(vec![e1, e2]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 0.95);
    }

    #[test]
    fn rho_normalized_to_0_pi() {
        let e1 = ellipse((10.0, 10.0), std::f32::consts::PI + 0.2, 5.0, 5.0, 0.9);
        let result = cluster(vec![e1]);
        assert!(result[0].rho >= 0.0 && result[0].rho < std::f32::consts::PI);
    }

    #[test]
    fn elongated_ellipses_at_different_angles_are_distinct() {
        let e1 = ellipse((100.0, 100.0), 0.0, 80.0, 20.0, 0.9);
        let e2 = ellipse((100.0, 100.0), std::f32::consts::FRAC_PI_2, 80.0, 20.0, 0.8);
        let result = cluster(vec![e1, e2]);
        assert_eq!(result.len(), 2);
    }
}
