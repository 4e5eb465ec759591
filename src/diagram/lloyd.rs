//! Lloyd relaxation for uniform site distribution.
//!
//! Each pass replaces every site with the arithmetic mean of its cell's
//! ordered boundary vertices and recomputes the tessellation from scratch.
//! A fixed-point smoothing with a fixed pass count; no convergence
//! guarantee is enforced.

use glam::DVec2;

use super::VoronoiDiagram;

/// Compute the relaxed site positions for the next construction pass.
pub(super) fn relaxed_sites(diagram: &VoronoiDiagram) -> Vec<DVec2> {
    diagram
        .cells()
        .iter()
        .map(|cell| {
            if cell.edges.is_empty() {
                return cell.site;
            }
            // Every boundary vertex is the start of exactly one edge of the
            // closed loop, so averaging the starts averages the vertices.
            let sum: DVec2 = cell
                .edges
                .iter()
                .map(|e| diagram.vertices()[e.start])
                .sum();
            sum / cell.edges.len() as f64
        })
        .collect()
}
