//! Infinite-edge resolution and per-cell clipping.

use glam::DVec2;

use crate::geometry::{self, BoundingBox};

use super::{Chain, VertexArena};

/// Direction of the Voronoi edge dual to the hull edge `site`-`other`,
/// pointing away from the triangulation.
///
/// `third` is the remaining vertex of the hull triangle; the open half of
/// the perpendicular bisector is the one facing away from it.
pub(super) fn outward_direction(site: DVec2, other: DVec2, third: DVec2) -> DVec2 {
    let mid = (site + other) * 0.5;
    let mut dir = (other - site).perp();
    if dir.dot(third - mid) > 0.0 {
        dir = -dir;
    }
    dir.normalize()
}

/// A point far enough along `dir` that the segment `origin`..`far` covers
/// every possible box crossing, even when the origin circumcenter lies far
/// outside the box.
pub(super) fn far_point(origin: DVec2, dir: DVec2, bounds: &BoundingBox) -> DVec2 {
    let reach = (origin - bounds.center()).length() + 4.0 * (bounds.width() + bounds.height());
    origin + dir * reach
}

/// Clip a cell's boundary chain to the box and intern the surviving
/// endpoints.
///
/// Segments entirely outside the box, or collapsing to a single vertex
/// after clipping, are dropped; the resulting gaps are closed later by the
/// border walk. Returns directed `(start, end)` vertex pairs in chain order.
pub(super) fn clip_chain(
    bounds: &BoundingBox,
    arena: &mut VertexArena,
    chain: &Chain,
) -> Vec<(usize, usize)> {
    let count = chain.points.len();
    if count < 2 {
        return Vec::new();
    }
    let pairs = if chain.closed { count } else { count - 1 };

    let mut edges = Vec::with_capacity(pairs);
    for k in 0..pairs {
        let a = chain.points[k];
        let b = chain.points[(k + 1) % count];
        let (p0, p1) = match geometry::clip_segment(bounds, a, b) {
            Some(segment) => segment,
            None => continue,
        };
        let v0 = arena.intern(p0);
        let v1 = arena.intern(p1);
        if v0 == v1 {
            continue;
        }
        edges.push((v0, v1));
    }
    edges
}
