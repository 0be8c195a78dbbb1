use crate::edge_map::EdgeMap;
use crate::error::DetectError;

use super::arc::{segment_arcs, ArcSegmenterConfig};
use super::chord::NUMBER_OF_PARALLEL_CHORDS_DEFAULT;
use super::convexity::{classify, QuadrantArc};
use super::dedup::cluster;
use super::params::{estimate_a, estimate_center_final, estimate_rho_n};
use super::triplet::{find_triplets, Hypothesis, TripletFinderConfig};
use super::validate::{validate, ValidatorConfig};

/// Detector configuration; see `spec.md` section 6 for the meaning of each
/// option.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorConfig {
    pub min_arc_pixel_count: usize,
    pub min_bounding_box_size: i32,
    pub check_all_arc_points_for_straight_line: bool,
    pub mutual_position_bounding_box_pixel_tolerance: i32,
    pub number_of_parallel_chords: usize,
    pub center_distance_percent: f32,
    pub distance_to_ellipse_contour: f32,
    pub distance_to_ellipse_contour_score_cutoff: f32,
    pub reliability_cutoff: f32,
    pub use_median_center: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_arc_pixel_count: 16,
            min_bounding_box_size: 3,
            check_all_arc_points_for_straight_line: false,
            mutual_position_bounding_box_pixel_tolerance: 1,
            number_of_parallel_chords: NUMBER_OF_PARALLEL_CHORDS_DEFAULT,
            center_distance_percent: 0.05,
            distance_to_ellipse_contour: 0.5,
            distance_to_ellipse_contour_score_cutoff: 0.4,
            reliability_cutoff: 0.4,
            use_median_center: true,
        }
    }
}

/// A validated, deduplicated ellipse hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipse {
    pub center: (f32, f32),
    pub rho: f32,
    pub a_axis: f32,
    pub b_axis: f32,
    pub score: f32,
}

/// The ellipse-hypothesis pipeline: segment arcs, classify quadrants, find
/// triplets, estimate parameters, validate, and deduplicate.
///
/// Borrows its edge map for the duration of detection; a fresh `Detector`
/// (or a fresh `set_edge_map` call) is the documented pattern between runs.
pub struct Detector<'a> {
    pub config: DetectorConfig,
    edge_map: Option<&'a dyn EdgeMap>,
    total_line_segment_count: usize,
    short_line_count: usize,
    straight_line_count: usize,
}

impl<'a> Detector<'a> {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            edge_map: None,
            total_line_segment_count: 0,
            short_line_count: 0,
            straight_line_count: 0,
        }
    }

    pub fn set_edge_map(&mut self, edge_map: &'a dyn EdgeMap) {
        self.edge_map = Some(edge_map);
    }

    pub fn total_line_segment_count(&self) -> usize {
        self.total_line_segment_count
    }

    pub fn short_line_count(&self) -> usize {
        self.short_line_count
    }

    pub fn straight_line_count(&self) -> usize {
        self.straight_line_count
    }

    /// Run the full pipeline over the currently set edge map.
    pub fn detect(&mut self) -> Result<Vec<Ellipse>, DetectError> {
        let em = self.edge_map.ok_or(DetectError::NoEdgeMap)?;

        let arc_config = ArcSegmenterConfig {
            min_arc_pixel_count: self.config.min_arc_pixel_count,
            min_bounding_box_size: self.config.min_bounding_box_size,
            check_all_arc_points_for_straight_line: self.config.check_all_arc_points_for_straight_line,
        };
        let (arcs, counts) = segment_arcs(em, &arc_config)?;
        self.total_line_segment_count = counts.total_line_segment_count;
        self.short_line_count = counts.short_line_count;
        self.straight_line_count = counts.straight_line_count;

        let quadrant_arcs = classify(arcs);

        let image_diagonal =
            ((em.width() as f32).powi(2) + (em.height() as f32).powi(2)).sqrt();

        let triplet_config = TripletFinderConfig {
            mutual_position_bounding_box_pixel_tolerance: self
                .config
                .mutual_position_bounding_box_pixel_tolerance,
            center_distance_percent: self.config.center_distance_percent,
            number_of_parallel_chords: self.config.number_of_parallel_chords,
        };
        let mut hypotheses = find_triplets(&quadrant_arcs, image_diagonal, &triplet_config);

        let validator_config = ValidatorConfig {
            distance_to_ellipse_contour: self.config.distance_to_ellipse_contour,
            distance_to_ellipse_contour_score_cutoff: self
                .config
                .distance_to_ellipse_contour_score_cutoff,
            reliability_cutoff: self.config.reliability_cutoff,
        };

        let mut ellipses = Vec::new();
        for hyp in hypotheses.iter_mut() {
            if !fill_parameters(hyp, &quadrant_arcs, self.config.use_median_center) {
                continue;
            }

            let arc1 = &quadrant_arcs[hyp.arc1].arc;
            let arc2 = &quadrant_arcs[hyp.arc2].arc;
            let arc3 = &quadrant_arcs[hyp.arc3].arc;

            if let Some(score) = validate(hyp, [arc1, arc2, arc3], &validator_config) {
                ellipses.push(Ellipse {
                    center: hyp.center,
                    rho: hyp.rho,
                    a_axis: hyp.a,
                    b_axis: hyp.b,
                    score,
                });
            }
        }

        Ok(cluster(ellipses))
    }
}

/// Fill in a hypothesis's center/rho/a/b from its chord families. Returns
/// `false` (leaving the hypothesis untouched) on any numerical degeneracy.
fn fill_parameters(hyp: &mut Hypothesis, arcs: &[QuadrantArc], use_median_center: bool) -> bool {
    let Some(rho_n) = estimate_rho_n(
        &hyp.chord3start2mid,
        &hyp.chord3mid2end,
        &hyp.chord2start1mid,
        &hyp.chord2mid1end,
    ) else {
        return false;
    };

    let center = estimate_center_final(
        &hyp.chord3start2mid,
        &hyp.chord3mid2end,
        &hyp.chord2start1mid,
        &hyp.chord2mid1end,
        hyp.center32,
        hyp.center21,
        use_median_center,
    );

    let arc1 = &arcs[hyp.arc1].arc;
    let arc2 = &arcs[hyp.arc2].arc;
    let arc3 = &arcs[hyp.arc3].arc;

    let Some(a) = estimate_a([arc1, arc2, arc3], center, rho_n.rho, rho_n.n) else {
        return false;
    };
    let b = a * rho_n.n;
    if !(b > 0.0 && b <= a) {
        return false;
    }

    hyp.center = center;
    hyp.rho = rho_n.rho.rem_euclid(std::f32::consts::PI);
    hyp.a = a;
    hyp.b = b;
    true
}
