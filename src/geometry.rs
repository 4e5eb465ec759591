//! Basic geometric types and utilities.
//!
//! All positions are `glam::DVec2` in map units; the generator works in f64
//! end to end so clipped vertices land exactly on the bounding box planes.

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: DVec2,
    /// Maximum corner.
    pub max: DVec2,
}

impl BoundingBox {
    /// The normalized map box `[-1, 1] x [-1, 1]` every provided pipeline
    /// defaults to.
    pub const NORMALIZED: BoundingBox = BoundingBox {
        min: DVec2::new(-1.0, -1.0),
        max: DVec2::new(1.0, 1.0),
    };

    /// Create a bounding box from its extents.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: DVec2::new(min_x, min_y),
            max: DVec2::new(max_x, max_y),
        }
    }

    /// Width of the box.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether a point lies inside the box (boundary inclusive).
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether a point lies on the box boundary, within `epsilon`.
    pub fn is_on_boundary(&self, p: DVec2, epsilon: f64) -> bool {
        if !self.contains(p.clamp(self.min, self.max)) {
            return false;
        }
        (p.x - self.min.x).abs() < epsilon
            || (p.x - self.max.x).abs() < epsilon
            || (p.y - self.min.y).abs() < epsilon
            || (p.y - self.max.y).abs() < epsilon
    }

    /// Map a point into normalized `[-1, 1]` coordinates relative to this box.
    #[inline]
    pub fn normalize(&self, p: DVec2) -> DVec2 {
        let c = self.center();
        DVec2::new(
            (p.x - c.x) / (self.width() * 0.5),
            (p.y - c.y) / (self.height() * 0.5),
        )
    }
}

/// Compute the circumcenter of a triangle.
///
/// The circumcenter is equidistant from all three vertices. Degenerate
/// (near-collinear) triangles fall back to the centroid so callers never
/// see non-finite coordinates.
pub fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    let d = b - a;
    let e = c - a;

    let bl = d.length_squared();
    let cl = e.length_squared();
    let det = d.x * e.y - d.y * e.x;

    if det.abs() < 1e-10 {
        return (a + b + c) / 3.0;
    }

    let det = 0.5 / det;
    DVec2::new(
        a.x + (e.y * bl - d.y * cl) * det,
        a.y + (d.x * cl - e.x * bl) * det,
    )
}

/// Clip a segment to a bounding box using the Liang-Barsky algorithm.
///
/// Returns the clipped endpoints, or `None` when the segment lies entirely
/// outside the box. Clipped endpoints are snapped onto the box planes so
/// border vertices compare exactly.
pub fn clip_segment(bounds: &BoundingBox, a: DVec2, b: DVec2) -> Option<(DVec2, DVec2)> {
    let d = b - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let planes = [
        (-d.x, a.x - bounds.min.x),
        (d.x, bounds.max.x - a.x),
        (-d.y, a.y - bounds.min.y),
        (d.y, bounds.max.y - a.y),
    ];

    for (p, q) in planes {
        if p == 0.0 {
            // Segment parallel to this plane: outside means rejected.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    let p0 = (a + d * t0).clamp(bounds.min, bounds.max);
    let p1 = (a + d * t1).clamp(bounds.min, bounds.max);
    Some((p0, p1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circumcenter_right_triangle() {
        // Circumcenter of a right triangle sits at the hypotenuse midpoint.
        let cc = circumcenter(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 2.0),
        );
        assert!((cc.x - 1.0).abs() < 1e-12);
        assert!((cc.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circumcenter_degenerate_falls_back_to_centroid() {
        let cc = circumcenter(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
        );
        assert!(cc.is_finite());
        assert!((cc.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_queries() {
        let bounds = BoundingBox::NORMALIZED;
        assert_eq!(bounds.width(), 2.0);
        assert_eq!(bounds.center(), DVec2::ZERO);
        assert!(bounds.contains(DVec2::new(0.5, -0.5)));
        assert!(!bounds.contains(DVec2::new(1.5, 0.0)));
        assert!(bounds.is_on_boundary(DVec2::new(1.0, 0.3), 1e-9));
        assert!(!bounds.is_on_boundary(DVec2::new(0.9, 0.3), 1e-9));
    }

    #[test]
    fn test_normalize_maps_into_unit_square() {
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
        let n = bounds.normalize(DVec2::new(10.0, 0.0));
        assert!((n.x - 1.0).abs() < 1e-12);
        assert!((n.y + 1.0).abs() < 1e-12);
        assert_eq!(bounds.normalize(bounds.center()), DVec2::ZERO);
    }

    #[test]
    fn test_clip_segment_inside_unchanged() {
        let bounds = BoundingBox::NORMALIZED;
        let (p0, p1) = clip_segment(
            &bounds,
            DVec2::new(-0.5, -0.5),
            DVec2::new(0.5, 0.5),
        )
        .unwrap();
        assert_eq!(p0, DVec2::new(-0.5, -0.5));
        assert_eq!(p1, DVec2::new(0.5, 0.5));
    }

    #[test]
    fn test_clip_segment_crossing_is_clamped() {
        let bounds = BoundingBox::NORMALIZED;
        let (p0, p1) = clip_segment(
            &bounds,
            DVec2::new(-2.0, 0.0),
            DVec2::new(2.0, 0.0),
        )
        .unwrap();
        assert_eq!(p0, DVec2::new(-1.0, 0.0));
        assert_eq!(p1, DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_clip_segment_outside_rejected() {
        let bounds = BoundingBox::NORMALIZED;
        assert!(clip_segment(&bounds, DVec2::new(2.0, 2.0), DVec2::new(3.0, 2.0)).is_none());
        // Parallel to a side but beyond it.
        assert!(clip_segment(&bounds, DVec2::new(-2.0, 1.5), DVec2::new(2.0, 1.5)).is_none());
    }

    #[test]
    fn test_clip_segment_endpoints_snap_to_planes() {
        let bounds = BoundingBox::NORMALIZED;
        let (_, p1) = clip_segment(
            &bounds,
            DVec2::new(0.1, 0.1),
            DVec2::new(5.3, 2.9),
        )
        .unwrap();
        assert_eq!(p1.x, 1.0);
    }
}
