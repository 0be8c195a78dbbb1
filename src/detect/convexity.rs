use super::arc::{Arc, Quadrant};

/// An arc paired with the quadrant it was classified into.
#[derive(Debug, Clone)]
pub struct QuadrantArc {
    pub arc: Arc,
    pub quadrant: Quadrant,
}

/// Classify each arc's convexity (area above vs. below the curve inside its
/// bounding box) and combine it with the arc's gradient sign to assign a
/// quadrant. Arcs with perfectly balanced area (neither convex up nor down)
/// are dropped.
pub fn classify(arcs: Vec<Arc>) -> Vec<QuadrantArc> {
    arcs.into_iter().filter_map(classify_one).collect()
}

fn classify_one(arc: Arc) -> Option<QuadrantArc> {
    let bbox_width = (arc.right - arc.left + 1) as i64;
    let bbox_height = (arc.bottom - arc.top + 1) as i64;
    let bbox_area = bbox_width * bbox_height;

    let mut area_over: i64 = 0;
    let mut last_x: Option<i32> = None;
    for p in &arc.points {
        if last_x == Some(p.x) {
            continue;
        }
        last_x = Some(p.x);
        area_over += (p.y - arc.top).unsigned_abs() as i64;
    }

    let area_under = bbox_area - arc.point_count() as i64 - area_over;

    let convex_up = match area_under.cmp(&area_over) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => return None,
    };

    let quadrant = match (arc.gradient_sign > 0, convex_up) {
        (true, true) => Quadrant::Q1,
        (false, true) => Quadrant::Q2,
        (true, false) => Quadrant::Q3,
        (false, false) => Quadrant::Q4,
    };

    Some(QuadrantArc { arc, quadrant })
}
