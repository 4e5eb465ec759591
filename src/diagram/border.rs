//! Border stitching for clipped cells.
//!
//! Clipping can leave a cell's boundary with gaps along the bounding box.
//! The walker keeps every box-boundary vertex in clockwise perimeter order
//! and fills each gap with synthetic edges by walking that list from the
//! gap's start to its end.

use glam::DVec2;

use crate::geometry::BoundingBox;

use super::VertexArena;

pub(super) struct BorderWalker {
    /// Border vertex indices in clockwise perimeter order.
    order: Vec<usize>,
    /// Position of each vertex in `order`; `usize::MAX` for interior
    /// vertices.
    slot: Vec<usize>,
}

impl BorderWalker {
    pub(super) fn new(arena: &VertexArena) -> Self {
        let mut entries: Vec<(f64, usize)> = arena
            .iter_border()
            .map(|(idx, pos)| (perimeter_position(arena.bounds(), pos), idx))
            .collect();
        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let order: Vec<usize> = entries.into_iter().map(|(_, idx)| idx).collect();
        let mut slot = vec![usize::MAX; arena.len()];
        for (k, &idx) in order.iter().enumerate() {
            slot[idx] = k;
        }
        Self { order, slot }
    }

    /// Walk clockwise from `from` to `to`.
    ///
    /// Returns the vertices after `from`, up to and including `to`. Fails
    /// when either endpoint is not a border vertex or the walk wraps all
    /// the way around without reaching the target.
    pub(super) fn walk(&self, from: usize, to: usize) -> Result<Vec<usize>, String> {
        let start = match self.slot.get(from) {
            Some(&s) if s != usize::MAX => s,
            _ => return Err(format!("gap endpoint {} is not on the border", from)),
        };
        if self.slot.get(to).map_or(true, |&s| s == usize::MAX) {
            return Err(format!("gap endpoint {} is not on the border", to));
        }

        let mut path = Vec::new();
        let mut k = start;
        loop {
            k = (k + 1) % self.order.len();
            if k == start {
                return Err("border walk returned to its start without reaching the target"
                    .to_string());
            }
            let v = self.order[k];
            path.push(v);
            if v == to {
                return Ok(path);
            }
        }
    }
}

/// Clockwise perimeter parameter in `[0, 4)`.
///
/// Left side ascending, top side rightward, right side descending, bottom
/// side leftward; each box corner belongs to exactly one parameter value.
/// Callers must pass points whose boundary coordinates are exact (the
/// vertex arena snaps them).
fn perimeter_position(bounds: &BoundingBox, p: DVec2) -> f64 {
    let w = bounds.width();
    let h = bounds.height();
    if p.x == bounds.min.x {
        return (p.y - bounds.min.y) / h;
    }
    if p.y == bounds.max.y {
        return 1.0 + (p.x - bounds.min.x) / w;
    }
    if p.x == bounds.max.x {
        return 2.0 + (bounds.max.y - p.y) / h;
    }
    3.0 + (bounds.max.x - p.x) / w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perimeter_order_of_corners() {
        let bounds = BoundingBox::NORMALIZED;
        let t0 = perimeter_position(&bounds, DVec2::new(-1.0, -1.0));
        let t1 = perimeter_position(&bounds, DVec2::new(-1.0, 1.0));
        let t2 = perimeter_position(&bounds, DVec2::new(1.0, 1.0));
        let t3 = perimeter_position(&bounds, DVec2::new(1.0, -1.0));
        assert_eq!(t0, 0.0);
        assert_eq!(t1, 1.0);
        assert_eq!(t2, 2.0);
        assert_eq!(t3, 3.0);
    }

    #[test]
    fn test_perimeter_positions_increase_clockwise() {
        let bounds = BoundingBox::NORMALIZED;
        // Left side going up, then the top going right.
        let a = perimeter_position(&bounds, DVec2::new(-1.0, -0.2));
        let b = perimeter_position(&bounds, DVec2::new(-1.0, 0.7));
        let c = perimeter_position(&bounds, DVec2::new(-0.3, 1.0));
        let d = perimeter_position(&bounds, DVec2::new(1.0, 0.4));
        assert!(a < b && b < c && c < d);
    }
}
