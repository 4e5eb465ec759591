//! Core data structures for the island map graph.
//!
//! The graph uses the arena pattern: `MapGraph` owns flat vectors of
//! [`Center`], [`Corner`] and [`Edge`] records, and every relationship is a
//! stable `usize` index into those vectors. Optional relationships
//! (`downslope`, `watershed`, the second polygon of a border edge) are
//! `Option<usize>` rather than sentinel values, so a rebuilt graph can
//! never leave a dangling reference behind.

use std::collections::HashMap;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::biome::Biome;
use crate::diagram::VoronoiDiagram;
use crate::error::Result;
use crate::geometry::BoundingBox;

/// A map polygon: one Voronoi cell and its classification.
#[derive(Debug, Clone, Default)]
pub struct Center {
    /// Index in the centers arena.
    pub index: usize,
    /// Position (the originating site, post-relaxation).
    pub position: DVec2,

    /// Neighboring center indices (share an edge).
    pub neighbors: Vec<usize>,
    /// Bounding edge indices.
    pub borders: Vec<usize>,
    /// Corner indices enumerating the polygon boundary once.
    pub corners: Vec<usize>,

    /// True for water polygons (ocean or lake).
    pub water: bool,
    /// True for water polygons connected to the map border.
    pub ocean: bool,
    /// True for land polygons adjacent to the ocean.
    pub coast: bool,
    /// True for polygons touching the map border.
    pub border: bool,
    /// Elevation in `[0, 1]` (mean of the polygon's corners).
    pub elevation: f64,
    /// Moisture in `[0, 1]` (mean of the polygon's corners).
    pub moisture: f64,
    /// Classified biome.
    pub biome: Biome,
}

impl Center {
    pub(crate) fn new(index: usize, position: DVec2) -> Self {
        Self {
            index,
            position,
            ..Default::default()
        }
    }
}

/// A graph vertex shared by the polygons that meet there.
#[derive(Debug, Clone, Default)]
pub struct Corner {
    /// Index in the corners arena.
    pub index: usize,
    /// Position (a deduplicated Voronoi vertex).
    pub position: DVec2,

    /// Center indices this corner is a vertex of.
    pub touches: Vec<usize>,
    /// Edge indices protruding from this corner.
    pub protrudes: Vec<usize>,
    /// Adjacent corner indices (connected by an edge).
    pub adjacent: Vec<usize>,

    /// True for water corners.
    pub water: bool,
    /// True when every touching polygon is ocean.
    pub ocean: bool,
    /// True when both ocean and land polygons touch this corner.
    pub coast: bool,
    /// True for corners on the map border.
    pub border: bool,
    /// Elevation in `[0, 1]`.
    pub elevation: f64,
    /// Moisture value; may exceed 1.0 on heavy river corners before the
    /// polygon average clamps it.
    pub moisture: f64,
    /// River flow volume through this corner (0 = no river).
    pub river: u32,
    /// Lowest-or-equal adjacent corner (possibly this corner itself);
    /// `None` until hydrology has run.
    pub downslope: Option<usize>,
    /// Terminal corner reached by following `downslope`; `None` until
    /// hydrology has run.
    pub watershed: Option<usize>,
    /// Number of corners whose terminal watershed is this corner.
    pub watershed_size: u32,
}

impl Corner {
    pub(crate) fn new(index: usize, position: DVec2) -> Self {
        Self {
            index,
            position,
            ..Default::default()
        }
    }
}

/// A dual edge: the border between two polygons and the link between two
/// corners.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Index in the edges arena.
    pub index: usize,
    /// Polygon on one side.
    pub d0: usize,
    /// Polygon on the other side; `None` for edges along the map border.
    pub d1: Option<usize>,
    /// Corner at one end.
    pub v0: usize,
    /// Corner at the other end.
    pub v1: usize,
    /// Precomputed midpoint of the two corners.
    pub midpoint: DVec2,
    /// River flow volume along this edge.
    pub river: u32,
}

/// The deduplicated planar graph of polygons, corners and edges.
///
/// Built wholesale from a bounded Voronoi diagram; a rebuild replaces every
/// record, so indices are only meaningful against the graph that produced
/// them.
#[derive(Debug, Clone)]
pub struct MapGraph {
    pub(crate) centers: Vec<Center>,
    pub(crate) corners: Vec<Corner>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) bounds: BoundingBox,
}

impl MapGraph {
    /// Build the graph from point sites.
    ///
    /// # Errors
    ///
    /// Everything [`VoronoiDiagram::compute`] can return; on error no graph
    /// is produced.
    pub fn from_points(
        points: &[DVec2],
        bounds: &BoundingBox,
        lloyd_iterations: usize,
    ) -> Result<Self> {
        let mut graph = Self {
            centers: Vec::new(),
            corners: Vec::new(),
            edges: Vec::new(),
            bounds: *bounds,
        };
        graph.rebuild_from_points(points, bounds, lloyd_iterations)?;
        Ok(graph)
    }

    /// Build the graph from a seeded, jittered `size x size` lattice inside
    /// the normalized box.
    ///
    /// The lattice feeds the same construction path as
    /// [`from_points`](Self::from_points).
    pub fn from_grid(size: usize, seed: u64) -> Result<Self> {
        let bounds = BoundingBox::NORMALIZED;
        let points = grid_points(size, seed, &bounds);
        Self::from_points(&points, &bounds, 1)
    }

    /// Replace this graph with one built from the given points.
    ///
    /// The previous graph is cleared only after the diagram computation
    /// succeeds, so a failed rebuild leaves `self` untouched.
    pub fn rebuild_from_points(
        &mut self,
        points: &[DVec2],
        bounds: &BoundingBox,
        lloyd_iterations: usize,
    ) -> Result<()> {
        let diagram = VoronoiDiagram::compute(points, bounds, lloyd_iterations)?;
        self.reset();
        self.bounds = *bounds;
        self.populate(&diagram);

        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            log::warn!("[graph] validation failed: {}", e);
        }

        Ok(())
    }

    /// Clear every arena.
    fn reset(&mut self) {
        self.centers.clear();
        self.corners.clear();
        self.edges.clear();
    }

    /// Fill the arenas from a computed diagram.
    ///
    /// Corners are deduplicated by the diagram's vertex index; edges are
    /// created once per unique polygon pair (or polygon-border pair).
    fn populate(&mut self, diagram: &VoronoiDiagram) {
        for (i, cell) in diagram.cells().iter().enumerate() {
            self.centers.push(Center::new(i, cell.site));
        }

        let mut corner_of_vertex: HashMap<usize, usize> = HashMap::new();
        let mut edge_of_pair: HashMap<(usize, usize), usize> = HashMap::new();

        for (i, cell) in diagram.cells().iter().enumerate() {
            for cell_edge in &cell.edges {
                let c0 = self.intern_corner(&mut corner_of_vertex, diagram, cell_edge.start);
                let c1 = self.intern_corner(&mut corner_of_vertex, diagram, cell_edge.end);

                // Every vertex starts exactly one edge of the cell loop, so
                // pushing the start corner enumerates the polygon once, in
                // traversal order.
                self.centers[i].corners.push(c0);
                self.corners[c0].touches.push(i);

                match cell_edge.neighbor {
                    Some(j) => {
                        let key = (i.min(j), i.max(j));
                        if edge_of_pair.contains_key(&key) {
                            // Already created from the twin side.
                            continue;
                        }
                        let e = self.push_edge(i, Some(j), c0, c1);
                        edge_of_pair.insert(key, e);
                        self.centers[i].borders.push(e);
                        self.centers[j].borders.push(e);
                        if !self.centers[i].neighbors.contains(&j) {
                            self.centers[i].neighbors.push(j);
                        }
                        if !self.centers[j].neighbors.contains(&i) {
                            self.centers[j].neighbors.push(i);
                        }
                    }
                    None => {
                        let e = self.push_edge(i, None, c0, c1);
                        self.centers[i].borders.push(e);
                    }
                }
            }
        }

        let corners = &self.corners;
        for center in self.centers.iter_mut() {
            center.border = center.corners.iter().any(|&c| corners[c].border);
        }
    }

    fn intern_corner(
        &mut self,
        corner_of_vertex: &mut HashMap<usize, usize>,
        diagram: &VoronoiDiagram,
        vertex: usize,
    ) -> usize {
        if let Some(&c) = corner_of_vertex.get(&vertex) {
            return c;
        }
        let index = self.corners.len();
        let mut corner = Corner::new(index, diagram.vertices()[vertex]);
        corner.border = diagram.is_border_vertex(vertex);
        self.corners.push(corner);
        corner_of_vertex.insert(vertex, index);
        index
    }

    fn push_edge(&mut self, d0: usize, d1: Option<usize>, v0: usize, v1: usize) -> usize {
        let index = self.edges.len();
        let midpoint = self.corners[v0]
            .position
            .lerp(self.corners[v1].position, 0.5);
        self.edges.push(Edge {
            index,
            d0,
            d1,
            v0,
            v1,
            midpoint,
            river: 0,
        });
        self.corners[v0].protrudes.push(index);
        self.corners[v1].protrudes.push(index);
        if !self.corners[v0].adjacent.contains(&v1) {
            self.corners[v0].adjacent.push(v1);
        }
        if !self.corners[v1].adjacent.contains(&v0) {
            self.corners[v1].adjacent.push(v0);
        }
        index
    }

    // === Accessors ===

    /// All polygons, indexed by center id.
    #[inline]
    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    /// All corners, indexed by corner id.
    #[inline]
    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    /// All edges, indexed by edge id.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get a center by index.
    #[inline]
    pub fn center(&self, index: usize) -> Option<&Center> {
        self.centers.get(index)
    }

    /// Get a corner by index.
    #[inline]
    pub fn corner(&self, index: usize) -> Option<&Corner> {
        self.corners.get(index)
    }

    /// Get an edge by index.
    #[inline]
    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// The bounding box the graph was built inside.
    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Validate the graph structure.
    ///
    /// Checks index ranges and that every polygon's edge set forms a single
    /// closed loop. Used by tests and debug builds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for center in &self.centers {
            for &n in &center.neighbors {
                if n >= self.centers.len() {
                    return Err(format!("center {} has invalid neighbor {}", center.index, n));
                }
            }
            for &c in &center.corners {
                if c >= self.corners.len() {
                    return Err(format!("center {} has invalid corner {}", center.index, c));
                }
            }
            for &e in &center.borders {
                if e >= self.edges.len() {
                    return Err(format!("center {} has invalid edge {}", center.index, e));
                }
            }
            self.check_polygon_closure(center)?;
        }

        for corner in &self.corners {
            for &a in &corner.adjacent {
                if a >= self.corners.len() {
                    return Err(format!("corner {} has invalid adjacent {}", corner.index, a));
                }
            }
            for &t in &corner.touches {
                if t >= self.centers.len() {
                    return Err(format!("corner {} has invalid touches {}", corner.index, t));
                }
            }
        }

        for edge in &self.edges {
            if edge.d0 >= self.centers.len() {
                return Err(format!("edge {} has invalid d0 {}", edge.index, edge.d0));
            }
            if let Some(d1) = edge.d1 {
                if d1 >= self.centers.len() {
                    return Err(format!("edge {} has invalid d1 {}", edge.index, d1));
                }
            }
            if edge.v0 >= self.corners.len() || edge.v1 >= self.corners.len() {
                return Err(format!("edge {} has invalid corners", edge.index));
            }
        }

        Ok(())
    }

    /// Check that a polygon's unordered edge set reconstructs into one
    /// closed loop.
    fn check_polygon_closure(&self, center: &Center) -> std::result::Result<(), String> {
        let n = center.borders.len();
        if n < 3 {
            return Err(format!("center {} has only {} edges", center.index, n));
        }

        let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
        for &e in &center.borders {
            let edge = &self.edges[e];
            adjacency.entry(edge.v0).or_default().push(edge.v1);
            adjacency.entry(edge.v1).or_default().push(edge.v0);
        }
        if adjacency.len() != n {
            return Err(format!(
                "center {} has {} edges but {} distinct corners",
                center.index,
                n,
                adjacency.len()
            ));
        }
        for (&v, adj) in &adjacency {
            if adj.len() != 2 {
                return Err(format!(
                    "center {}: corner {} has degree {}",
                    center.index,
                    v,
                    adj.len()
                ));
            }
        }

        let start = self.edges[center.borders[0]].v0;
        let mut prev = start;
        let mut current = adjacency[&start][0];
        let mut steps = 1;
        while current != start {
            let adj = &adjacency[&current];
            let next = if adj[0] == prev { adj[1] } else { adj[0] };
            prev = current;
            current = next;
            steps += 1;
            if steps > n {
                return Err(format!("center {} boundary does not close", center.index));
            }
        }
        if steps != n {
            return Err(format!(
                "center {} boundary closes after {} of {} edges",
                center.index, steps, n
            ));
        }
        Ok(())
    }
}

/// Seeded, jittered `size x size` lattice of points inside `bounds`.
pub(crate) fn grid_points(size: usize, seed: u64, bounds: &BoundingBox) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let step = DVec2::new(
        bounds.width() / size.max(1) as f64,
        bounds.height() / size.max(1) as f64,
    );
    let mut points = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let jitter = DVec2::new(rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3));
            let offset = DVec2::new(col as f64 + 0.5, row as f64 + 0.5) + jitter;
            points.push(bounds.min + offset * step);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadrant_graph() -> MapGraph {
        let points = vec![
            DVec2::new(-0.5, -0.5),
            DVec2::new(0.5, -0.5),
            DVec2::new(-0.5, 0.5),
            DVec2::new(0.5, 0.5),
        ];
        MapGraph::from_points(&points, &BoundingBox::NORMALIZED, 1).unwrap()
    }

    #[test]
    fn test_quadrant_graph_counts() {
        let graph = quadrant_graph();

        assert_eq!(graph.centers().len(), 4);
        // 4 box corners + 4 side midpoints + 1 shared center vertex.
        assert_eq!(graph.corners().len(), 9);
        // 4 interior edges + 8 border edges.
        assert_eq!(graph.edges().len(), 12);

        for center in graph.centers() {
            assert_eq!(center.corners.len(), 4);
            assert_eq!(center.borders.len(), 4);
            assert_eq!(center.neighbors.len(), 2);
            assert!(center.border);
        }

        let border_corners = graph.corners().iter().filter(|c| c.border).count();
        assert_eq!(border_corners, 8);

        let border_edges = graph.edges().iter().filter(|e| e.d1.is_none()).count();
        assert_eq!(border_edges, 8);
    }

    #[test]
    fn test_quadrant_graph_validates() {
        let graph = quadrant_graph();
        graph.validate().unwrap();
    }

    #[test]
    fn test_cross_links_are_consistent() {
        let graph = quadrant_graph();

        for center in graph.centers() {
            for &c in &center.corners {
                assert!(
                    graph.corners()[c].touches.contains(&center.index),
                    "corner {} does not know center {}",
                    c,
                    center.index
                );
            }
            for &n in &center.neighbors {
                assert!(graph.centers()[n].neighbors.contains(&center.index));
            }
        }

        for corner in graph.corners() {
            for &a in &corner.adjacent {
                assert!(graph.corners()[a].adjacent.contains(&corner.index));
            }
            for &e in &corner.protrudes {
                let edge = &graph.edges()[e];
                assert!(edge.v0 == corner.index || edge.v1 == corner.index);
            }
        }

        for edge in graph.edges() {
            let mid = graph.corners()[edge.v0]
                .position
                .lerp(graph.corners()[edge.v1].position, 0.5);
            assert!(edge.midpoint.distance(mid) < 1e-12);
        }
    }

    #[test]
    fn test_single_site_graph_is_the_box() {
        let graph =
            MapGraph::from_points(&[DVec2::ZERO], &BoundingBox::NORMALIZED, 1).unwrap();

        assert_eq!(graph.centers().len(), 1);
        assert_eq!(graph.corners().len(), 4);
        assert_eq!(graph.edges().len(), 4);
        assert!(graph.corners().iter().all(|c| c.border));
        assert!(graph.edges().iter().all(|e| e.d1.is_none()));
        graph.validate().unwrap();
    }

    #[test]
    fn test_from_grid_builds_full_lattice() {
        let graph = MapGraph::from_grid(6, 42).unwrap();
        assert_eq!(graph.centers().len(), 36);
        graph.validate().unwrap();

        for corner in graph.corners() {
            assert!(!corner.adjacent.is_empty());
        }
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut graph = quadrant_graph();
        let old_count = graph.centers().len();

        let points = grid_points(5, 9, &BoundingBox::NORMALIZED);
        graph
            .rebuild_from_points(&points, &BoundingBox::NORMALIZED, 1)
            .unwrap();

        assert_eq!(graph.centers().len(), 25);
        assert_ne!(graph.centers().len(), old_count);
        graph.validate().unwrap();
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_graph() {
        let mut graph = quadrant_graph();
        let result = graph.rebuild_from_points(&[], &BoundingBox::NORMALIZED, 1);
        assert!(result.is_err());
        assert_eq!(graph.centers().len(), 4);
        graph.validate().unwrap();
    }
}
