//! Bounded Voronoi tessellation of point sites.
//!
//! Cells derive from the Delaunay triangulation: every triangle's
//! circumcenter is a Voronoi vertex, and walking the triangles incident to
//! a site in rotational order yields that site's cell boundary. Hull cells
//! have two unbounded edges, resolved against the bounding box with a
//! ray-box intersection; every boundary segment is clipped to the box, and
//! cells that lose geometry to clipping are stitched closed along the box
//! border.

mod border;
mod clip;
mod lloyd;

use std::collections::{HashMap, HashSet};

use glam::DVec2;

use crate::error::{MapError, Result};
use crate::geometry::{self, BoundingBox};

use border::BorderWalker;

/// Integer grid steps per axis used for site snapping.
///
/// Sites are mapped onto this grid before triangulation so the tessellation
/// works on exact coordinates and identical inputs tessellate identically.
/// The round-trip displacement is at most half a step, about 5e-7 of the
/// box extent, well inside the documented 1e-4 tolerance.
const GRID_STEPS: f64 = 1_048_576.0;

/// Quantization steps for vertex deduplication (box-relative).
const DEDUP_STEPS: f64 = 1_048_576.0;

/// A tessellation input site.
///
/// Only point sites are supported; segment sites exist in the input
/// vocabulary so callers get a typed rejection instead of silent misuse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Site {
    /// A point site.
    Point(DVec2),
    /// A line-segment site; rejected with [`MapError::UnsupportedSite`].
    Segment {
        /// Segment start position.
        start: DVec2,
        /// Segment end position.
        end: DVec2,
    },
}

/// One directed boundary edge of a diagram cell.
#[derive(Debug, Clone, Copy)]
pub struct CellEdge {
    /// Start vertex index into [`VoronoiDiagram::vertices`].
    pub start: usize,
    /// End vertex index.
    pub end: usize,
    /// Cell on the other side of this edge, `None` for synthetic border
    /// edges along the bounding box.
    pub neighbor: Option<usize>,
}

/// A single Voronoi cell clipped to the bounding box.
#[derive(Debug, Clone)]
pub struct DiagramCell {
    /// Site position this cell belongs to (after relaxation, if any).
    pub site: DVec2,
    /// Boundary edges in clockwise order; always a closed loop.
    pub edges: Vec<CellEdge>,
}

/// A Voronoi tessellation clipped to an axis-aligned bounding box.
///
/// Every cell's boundary is a closed clockwise loop, shared vertices are
/// deduplicated, and two cells are neighbors exactly when they share a
/// twin-edge pair.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    bounds: BoundingBox,
    cells: Vec<DiagramCell>,
    vertices: Vec<DVec2>,
    border: Vec<bool>,
}

impl VoronoiDiagram {
    /// Compute the bounded Voronoi diagram of point sites.
    ///
    /// `iterations` is the total number of construction passes; passes
    /// beyond the first apply Lloyd relaxation (each site moves to the mean
    /// of its cell's boundary vertices before the recompute).
    ///
    /// # Errors
    ///
    /// `InvalidInput` for empty input, sites outside the box, duplicate
    /// sites, or collinear site sets; `Closure` when a clipped cell cannot
    /// be stitched back into a loop.
    pub fn compute(points: &[DVec2], bounds: &BoundingBox, iterations: usize) -> Result<Self> {
        let mut sites = points.to_vec();
        let mut diagram = Self::compute_once(&sites, bounds)?;
        for pass in 1..iterations.max(1) {
            sites = lloyd::relaxed_sites(&diagram);
            log::debug!(
                "[voronoi] relaxation pass {}/{}: recomputing {} cells",
                pass + 1,
                iterations,
                sites.len()
            );
            diagram = Self::compute_once(&sites, bounds)?;
        }
        Ok(diagram)
    }

    /// Compute the diagram from typed sites.
    ///
    /// # Errors
    ///
    /// `UnsupportedSite` when any site is a segment, plus everything
    /// [`compute`](Self::compute) can return.
    pub fn compute_sites(sites: &[Site], bounds: &BoundingBox, iterations: usize) -> Result<Self> {
        let mut points = Vec::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            match site {
                Site::Point(p) => points.push(*p),
                Site::Segment { .. } => {
                    return Err(MapError::UnsupportedSite(format!(
                        "site {} is a segment; only point sites are supported",
                        i
                    )));
                }
            }
        }
        Self::compute(&points, bounds, iterations)
    }

    /// Get the bounding box the diagram was clipped to.
    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Get all cells, one per input site in input order.
    #[inline]
    pub fn cells(&self) -> &[DiagramCell] {
        &self.cells
    }

    /// Get the deduplicated vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Whether a vertex lies on the bounding box border.
    #[inline]
    pub fn is_border_vertex(&self, index: usize) -> bool {
        self.border.get(index).copied().unwrap_or(false)
    }

    fn compute_once(points: &[DVec2], bounds: &BoundingBox) -> Result<Self> {
        if points.is_empty() {
            return Err(MapError::InvalidInput("no sites provided".to_string()));
        }
        for (i, p) in points.iter().enumerate() {
            if !bounds.contains(*p) {
                return Err(MapError::InvalidInput(format!(
                    "site {} lies outside the bounding box",
                    i
                )));
            }
        }
        if points.len() == 1 {
            return Ok(Self::single_cell(points[0], bounds));
        }

        // Snap sites onto the integer grid the tessellation runs on.
        let mut grid_keys = HashSet::new();
        let mut snapped = Vec::with_capacity(points.len());
        let mut scaled = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            let gx = ((p.x - bounds.min.x) / bounds.width() * GRID_STEPS).round();
            let gy = ((p.y - bounds.min.y) / bounds.height() * GRID_STEPS).round();
            if !grid_keys.insert((gx as i64, gy as i64)) {
                return Err(MapError::InvalidInput(format!(
                    "duplicate site at index {}",
                    i
                )));
            }
            scaled.push(delaunator::Point { x: gx, y: gy });
            snapped.push(DVec2::new(
                bounds.min.x + gx / GRID_STEPS * bounds.width(),
                bounds.min.y + gy / GRID_STEPS * bounds.height(),
            ));
        }

        let triangulation = delaunator::triangulate(&scaled);
        if triangulation.triangles.is_empty() {
            return Err(MapError::InvalidInput(
                "at least three non-collinear sites are required".to_string(),
            ));
        }

        // Circumcenter of every triangle, mapped back to world coordinates.
        let num_triangles = triangulation.triangles.len() / 3;
        let mut circumcenters = Vec::with_capacity(num_triangles);
        for t in 0..num_triangles {
            let a = snapped[triangulation.triangles[3 * t]];
            let b = snapped[triangulation.triangles[3 * t + 1]];
            let c = snapped[triangulation.triangles[3 * t + 2]];
            circumcenters.push(geometry::circumcenter(a, b, c));
        }

        let leftmost = leftmost_incoming_halfedge(&triangulation, points.len());

        let mut arena = VertexArena::new(*bounds);
        // The box corners participate in every border walk.
        arena.intern(bounds.min);
        arena.intern(DVec2::new(bounds.min.x, bounds.max.y));
        arena.intern(bounds.max);
        arena.intern(DVec2::new(bounds.max.x, bounds.min.y));

        // Pass 1: clipped boundary chains, possibly with gaps where edges
        // fell outside the box or collapsed.
        let mut clipped = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let chain = cell_chain(i, &triangulation, &leftmost, &circumcenters, &snapped, bounds)?;
            clipped.push(clip::clip_chain(bounds, &mut arena, &chain));
        }

        // Pass 2: stitch every gap closed along the ordered border vertices.
        let walker = BorderWalker::new(&arena);
        let mut cell_edges = Vec::with_capacity(points.len());
        for (i, edges) in clipped.iter().enumerate() {
            cell_edges.push(close_cell(i, edges, &walker)?);
        }

        // Twin matching: an edge's reversed endpoint pair identifies the
        // neighboring cell.
        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for (i, edges) in cell_edges.iter().enumerate() {
            for edge in edges {
                directed.insert((edge.start, edge.end), i);
            }
        }
        for edges in cell_edges.iter_mut() {
            for edge in edges.iter_mut() {
                edge.neighbor = directed.get(&(edge.end, edge.start)).copied();
            }
        }

        let cells = snapped
            .into_iter()
            .zip(cell_edges)
            .map(|(site, edges)| DiagramCell { site, edges })
            .collect();
        let (vertices, border) = arena.into_parts();

        Ok(Self {
            bounds: *bounds,
            cells,
            vertices,
            border,
        })
    }

    /// The trivial diagram of a single site: its cell is the box itself.
    fn single_cell(site: DVec2, bounds: &BoundingBox) -> Self {
        let vertices = vec![
            bounds.min,
            DVec2::new(bounds.min.x, bounds.max.y),
            bounds.max,
            DVec2::new(bounds.max.x, bounds.min.y),
        ];
        let edges = (0..4)
            .map(|k| CellEdge {
                start: k,
                end: (k + 1) % 4,
                neighbor: None,
            })
            .collect();
        Self {
            bounds: *bounds,
            cells: vec![DiagramCell { site, edges }],
            vertices,
            border: vec![true; 4],
        }
    }
}

/// Deduplicating vertex store shared by all cells of one construction pass.
struct VertexArena {
    bounds: BoundingBox,
    boundary_eps: f64,
    lookup: HashMap<(i64, i64), usize>,
    positions: Vec<DVec2>,
    border: Vec<bool>,
}

impl VertexArena {
    fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            boundary_eps: (bounds.width() + bounds.height()) * 1e-9,
            lookup: HashMap::new(),
            positions: Vec::new(),
            border: Vec::new(),
        }
    }

    /// Intern a position, returning its stable vertex index.
    ///
    /// Near-boundary coordinates are snapped exactly onto the box planes so
    /// border vertices compare and sort exactly.
    fn intern(&mut self, p: DVec2) -> usize {
        let p = self.snap(p);
        let key = self.key(p);
        if let Some(&idx) = self.lookup.get(&key) {
            return idx;
        }
        let idx = self.positions.len();
        self.positions.push(p);
        self.border.push(self.bounds.is_on_boundary(p, self.boundary_eps));
        self.lookup.insert(key, idx);
        idx
    }

    fn key(&self, p: DVec2) -> (i64, i64) {
        let nx = (p.x - self.bounds.min.x) / self.bounds.width() * DEDUP_STEPS;
        let ny = (p.y - self.bounds.min.y) / self.bounds.height() * DEDUP_STEPS;
        (nx.round() as i64, ny.round() as i64)
    }

    fn snap(&self, mut p: DVec2) -> DVec2 {
        if (p.x - self.bounds.min.x).abs() < self.boundary_eps {
            p.x = self.bounds.min.x;
        } else if (p.x - self.bounds.max.x).abs() < self.boundary_eps {
            p.x = self.bounds.max.x;
        }
        if (p.y - self.bounds.min.y).abs() < self.boundary_eps {
            p.y = self.bounds.min.y;
        } else if (p.y - self.bounds.max.y).abs() < self.boundary_eps {
            p.y = self.bounds.max.y;
        }
        p
    }

    fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    fn len(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over `(index, position)` of all border vertices.
    fn iter_border(&self) -> impl Iterator<Item = (usize, DVec2)> + '_ {
        self.positions
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, _)| self.border[i])
    }

    fn into_parts(self) -> (Vec<DVec2>, Vec<bool>) {
        (self.positions, self.border)
    }
}

/// Pre-clip boundary chain of one cell.
///
/// Open chains belong to hull cells; their first and last points are the
/// far endpoints of the two resolved infinite edges.
struct Chain {
    points: Vec<DVec2>,
    closed: bool,
}

/// Build the raw (unclipped) boundary chain of one cell, oriented clockwise.
fn cell_chain(
    site_idx: usize,
    triangulation: &delaunator::Triangulation,
    leftmost: &[usize],
    circumcenters: &[DVec2],
    sites: &[DVec2],
    bounds: &BoundingBox,
) -> Result<Chain> {
    let start = leftmost[site_idx];
    if start == delaunator::EMPTY {
        // Unreachable once duplicates are rejected, but a dropped site must
        // not panic downstream.
        return Err(MapError::InvalidInput(format!(
            "site {} is not part of the triangulation",
            site_idx
        )));
    }

    // Walk the incoming half-edges around the site, collecting incident
    // triangles in rotational order. Hull sites terminate at the open side.
    let mut triangles = Vec::new();
    let mut incoming = start;
    let mut hull_exit = None;
    loop {
        triangles.push(incoming / 3);
        let outgoing = next_halfedge(incoming);
        let next = triangulation.halfedges[outgoing];
        if next == delaunator::EMPTY {
            hull_exit = Some(outgoing);
            break;
        }
        if next == start {
            break;
        }
        incoming = next;
    }

    let mut points: Vec<DVec2> = triangles.iter().map(|&t| circumcenters[t]).collect();
    let closed = hull_exit.is_none();

    if let Some(exit) = hull_exit {
        // Resolve the two infinite edges: each extends from the hull
        // triangle's circumcenter along the perpendicular bisector of the
        // hull edge, pointing away from the triangulation.
        let entry_other = triangulation.triangles[start];
        let entry_third = triangle_third_point(triangulation, start / 3, site_idx, entry_other);
        let dir = clip::outward_direction(sites[site_idx], sites[entry_other], sites[entry_third]);
        let first = points[0];
        points.insert(0, clip::far_point(first, dir, bounds));

        let exit_other = triangulation.triangles[next_halfedge(exit)];
        let exit_third = triangle_third_point(triangulation, exit / 3, site_idx, exit_other);
        let dir = clip::outward_direction(sites[site_idx], sites[exit_other], sites[exit_third]);
        let last = *points.last().expect("hull cell has at least one triangle");
        points.push(clip::far_point(last, dir, bounds));
    }

    // Orient clockwise around the site; the half-edge walk direction is an
    // implementation detail of the triangulation.
    let site = sites[site_idx];
    let count = points.len();
    let pairs = if closed { count } else { count - 1 };
    let mut turn = 0.0;
    for k in 0..pairs {
        let a = points[k] - site;
        let b = points[(k + 1) % count] - site;
        turn += a.x * b.y - a.y * b.x;
    }
    if turn > 0.0 {
        points.reverse();
    }

    Ok(Chain { points, closed })
}

/// Close one cell's clipped edge list into a loop, walking the border where
/// clipping left gaps.
fn close_cell(cell: usize, edges: &[(usize, usize)], walker: &BorderWalker) -> Result<Vec<CellEdge>> {
    if edges.is_empty() {
        return Err(MapError::Closure {
            cell,
            detail: "clipping removed every boundary edge".to_string(),
        });
    }

    let count = edges.len();
    let mut result = Vec::with_capacity(count + 4);
    for k in 0..count {
        let (start, end) = edges[k];
        result.push(CellEdge {
            start,
            end,
            neighbor: None,
        });
        let target = edges[(k + 1) % count].0;
        if end != target {
            let path = walker
                .walk(end, target)
                .map_err(|detail| MapError::Closure { cell, detail })?;
            let mut prev = end;
            for v in path {
                result.push(CellEdge {
                    start: prev,
                    end: v,
                    neighbor: None,
                });
                prev = v;
            }
        }
    }
    Ok(result)
}

/// Map every point to one of its incoming half-edges, preferring hull
/// half-edges so the rotational walk around hull points covers every
/// incident triangle.
fn leftmost_incoming_halfedge(
    triangulation: &delaunator::Triangulation,
    num_points: usize,
) -> Vec<usize> {
    let mut index = vec![delaunator::EMPTY; num_points];
    for e in 0..triangulation.triangles.len() {
        let endpoint = triangulation.triangles[next_halfedge(e)];
        if index[endpoint] == delaunator::EMPTY || triangulation.halfedges[e] == delaunator::EMPTY {
            index[endpoint] = e;
        }
    }
    index
}

#[inline]
fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// The vertex of triangle `t` that is neither `a` nor `b`.
fn triangle_third_point(
    triangulation: &delaunator::Triangulation,
    t: usize,
    a: usize,
    b: usize,
) -> usize {
    for k in 0..3 {
        let v = triangulation.triangles[3 * t + k];
        if v != a && v != b {
            return v;
        }
    }
    // Degenerate triangles cannot come out of the triangulation.
    unreachable!("triangle {} has duplicate vertices", t)
}
