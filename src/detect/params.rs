use std::collections::BTreeMap;

use super::arc::{Arc, Point};
use super::chord::{estimate_center, ParallelChords};

/// Partition-based quickselect (mid-pivot), used instead of sorting for the
/// small arrays (N <= 16) that show up throughout the voting stages.
fn quickselect(values: &mut [f32], k: usize) {
    let mut lo = 0usize;
    let mut hi = values.len() - 1;
    loop {
        if lo >= hi {
            return;
        }
        let pivot_idx = lo + (hi - lo) / 2;
        let final_idx = partition(values, lo, hi, pivot_idx);
        if k == final_idx {
            return;
        } else if k < final_idx {
            hi = final_idx - 1;
        } else {
            lo = final_idx + 1;
        }
    }
}

fn partition(values: &mut [f32], lo: usize, hi: usize, pivot_idx: usize) -> usize {
    values.swap(pivot_idx, hi);
    let pivot = values[hi];
    let mut store = lo;
    for i in lo..hi {
        if values[i] < pivot {
            values.swap(i, store);
            store += 1;
        }
    }
    values.swap(store, hi);
    store
}

/// Median of a small `f32` slice via quickselect; for even-length slices,
/// the mean of the two middle order statistics.
pub fn median_of(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    quickselect(values, mid);
    if n % 2 == 1 {
        values[mid]
    } else {
        let upper = values[mid];
        let lower = values[..mid]
            .iter()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        (upper + lower) / 2.0
    }
}

/// Mean of the keys among the accumulator's maximum-count bins (ties
/// resolved by averaging), i.e. the argmax of a discretized histogram.
fn argmax_mean(acc: &BTreeMap<i32, u32>) -> Option<f32> {
    let max_count = *acc.values().max()?;
    let (sum, count) = acc
        .iter()
        .filter(|&(_, &c)| c == max_count)
        .fold((0i64, 0i64), |(s, c), (&k, _)| (s + k as i64, c + 1));
    Some(sum as f32 / count as f32)
}

#[derive(Debug, Clone, Copy)]
pub struct RhoN {
    pub rho: f32,
    pub n: f32,
}

/// Estimate rotation (rho, radians in [0, pi)) and axis ratio n via
/// integer-binned accumulator voting over the four chord families' slopes.
pub fn estimate_rho_n(
    chord3start2mid: &ParallelChords,
    chord3mid2end: &ParallelChords,
    chord2start1mid: &ParallelChords,
    chord2mid1end: &ParallelChords,
) -> Option<RhoN> {
    let mut rho_acc: BTreeMap<i32, u32> = BTreeMap::new();
    let mut n_acc: BTreeMap<i32, u32> = BTreeMap::new();

    for chord2 in [chord3start2mid, chord3mid2end] {
        for chord1 in [chord2start1mid, chord2mid1end] {
            let q1 = chord2.reference_slope;
            let q3 = chord1.reference_slope;
            for &q2 in &chord2.perpendicular_slopes {
                for &q4 in &chord1.perpendicular_slopes {
                    let gamma = q1 * q2 - q3 * q4;
                    if gamma.abs() < 1e-9 {
                        continue;
                    }
                    let beta = (q3 * q4 + 1.0) * (q1 + q2) - (q1 * q2 + 1.0) * (q3 + q4);
                    let disc = beta * beta + 4.0 * gamma * gamma;
                    if disc < 0.0 {
                        continue;
                    }
                    let k = (-beta + disc.sqrt()) / (2.0 * gamma);

                    let denom1 = 1.0 + q1 * k;
                    let denom2 = 1.0 + q2 * k;
                    if denom1.abs() < 1e-9 || denom2.abs() < 1e-9 {
                        continue;
                    }
                    let z = ((q1 - k) * (q2 - k)) / (denom1 * denom2);
                    if z >= 0.0 {
                        continue;
                    }

                    let n_prime = (-z).sqrt();
                    let mut rho_prime = k.atan();
                    let n_final = if n_prime <= 1.0 {
                        n_prime
                    } else {
                        rho_prime += std::f32::consts::FRAC_PI_2;
                        1.0 / n_prime
                    };

                    let rho_bin = (rho_prime.to_degrees() + 180.0).round() as i32;
                    let rho_bin = rho_bin.rem_euclid(180);
                    let n_bin = (n_final * 100.0).round() as i32;
                    if !(1..=100).contains(&n_bin) {
                        continue;
                    }

                    *rho_acc.entry(rho_bin).or_insert(0) += 1;
                    *n_acc.entry(n_bin).or_insert(0) += 1;
                }
            }
        }
    }

    let rho_deg = argmax_mean(&rho_acc)?;
    let n_pct = argmax_mean(&n_acc)?;

    Some(RhoN {
        rho: rho_deg.to_radians(),
        n: n_pct / 100.0,
    })
}

/// Collect the 6 (or 7, with `useMedianCenter`) candidate centers and reduce
/// them to a single estimate.
#[allow(clippy::too_many_arguments)]
pub fn estimate_center_final(
    chord3start2mid: &ParallelChords,
    chord3mid2end: &ParallelChords,
    chord2start1mid: &ParallelChords,
    chord2mid1end: &ParallelChords,
    center32: (f32, f32),
    center21: (f32, f32),
    use_median_center: bool,
) -> (f32, f32) {
    let mut candidates: Vec<(f32, f32)> = Vec::with_capacity(7);
    for outer in [chord3start2mid, chord3mid2end] {
        for inner in [chord2start1mid, chord2mid1end] {
            if let Some(c) = estimate_center(outer, inner) {
                candidates.push(c);
            }
        }
    }
    candidates.push(center32);
    candidates.push(center21);

    if use_median_center {
        candidates.push(((center32.0 + center21.0) / 2.0, (center32.1 + center21.1) / 2.0));
        let mut xs: Vec<f32> = candidates.iter().map(|c| c.0).collect();
        let mut ys: Vec<f32> = candidates.iter().map(|c| c.1).collect();
        (median_of(&mut xs), median_of(&mut ys))
    } else {
        let n = candidates.len().max(1) as f32;
        let sx: f32 = candidates.iter().map(|c| c.0).sum();
        let sy: f32 = candidates.iter().map(|c| c.1).sum();
        (sx / n, sy / n)
    }
}

/// Estimate the major semi-axis `a` via a third integer-binned accumulator
/// over all points of the three source arcs.
pub fn estimate_a(arcs: [&Arc; 3], center: (f32, f32), rho: f32, n: f32) -> Option<f32> {
    let k = rho.tan();
    let denom_recip = 1.0 / (k * k + 1.0).sqrt();
    let cos_rho = rho.cos();
    if cos_rho.abs() < 1e-6 || n.abs() < 1e-6 {
        return None;
    }

    let mut acc: BTreeMap<i32, u32> = BTreeMap::new();
    for arc in arcs {
        for p in arc_points(arc) {
            let dx = p.x as f32 - center.0;
            let dy = p.y as f32 - center.1;
            let x0 = (dx + dy * k) * denom_recip;
            let y0 = (-dx * k + dy) * denom_recip;
            let inner = (x0 * x0 * n * n + y0 * y0) / (n * n);
            if inner < 0.0 {
                continue;
            }
            let a_x = inner.sqrt() * denom_recip;
            let a_point = (a_x / cos_rho).abs();
            let bin = a_point.round() as i32;
            if bin < 1 {
                continue;
            }
            *acc.entry(bin).or_insert(0) += 1;
        }
    }

    argmax_mean(&acc)
}

fn arc_points(arc: &Arc) -> impl Iterator<Item = Point> + '_ {
    arc.points.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_length() {
        let mut v = [3.0, 1.0, 2.0];
        assert_eq!(median_of(&mut v), 2.0);
    }

    #[test]
    fn median_of_even_length() {
        let mut v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(median_of(&mut v), 2.5);
    }

    #[test]
    fn median_of_single_element() {
        let mut v = [42.0];
        assert_eq!(median_of(&mut v), 42.0);
    }

    #[test]
    fn median_of_empty_is_zero() {
        let mut v: [f32; 0] = [];
        assert_eq!(median_of(&mut v), 0.0);
    }

    #[test]
    fn argmax_mean_picks_majority_bin() {
        let mut acc = BTreeMap::new();
        acc.insert(10, 5);
        acc.insert(20, 1);
        assert_eq!(argmax_mean(&acc), Some(10.0));
    }

    #[test]
    fn argmax_mean_averages_ties() {
        let mut acc = BTreeMap::new();
        acc.insert(10, 3);
        acc.insert(20, 3);
        assert_eq!(argmax_mean(&acc), Some(15.0));
    }

    #[test]
    fn argmax_mean_empty_is_none() {
        let acc: BTreeMap<i32, u32> = BTreeMap::new();
        assert_eq!(argmax_mean(&acc), None);
    }
}
