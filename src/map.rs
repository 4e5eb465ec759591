//! IslandMap: top-level generation entry points and read-only accessors.

use std::time::Instant;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::MapConfig;
use crate::error::Result;
use crate::graph::{self, Center, Corner, Edge, MapGraph};
use crate::shape::{IslandShape, RadialShape};
use crate::simulate::{self, PipelineParams};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// A fully classified island map
///
/// Couples the configuration with the finished [`MapGraph`]. The graph is
/// exposed read-only: consumers (mesh builders, pathfinding, visualizers)
/// read polygons, corners and edges but never mutate them.
///
/// # Examples
///
/// ```rust,no_run
/// use voronoi_island_map::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .map_size(MapSize::Small)
///     .build()
///     .unwrap();
///
/// let map = IslandMap::generate(config).unwrap();
/// for center in map.centers() {
///     println!("polygon {} is {:?}", center.index, center.biome);
/// }
/// ```
#[derive(Clone)]
pub struct IslandMap {
    /// Configuration used to generate this map
    config: MapConfig,

    /// The classified planar graph
    graph: MapGraph,

    /// Spatial index over polygon centers (optional feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl IslandMap {
    /// Generate a map with the default radial island silhouette
    ///
    /// Sites are sampled uniformly inside the configured bounding box from
    /// the seeded generator, so the same configuration always produces the
    /// identical map.
    ///
    /// # Errors
    ///
    /// Everything the diagram computation can return; see
    /// [`MapError`](crate::MapError).
    pub fn generate(config: MapConfig) -> Result<Self> {
        let shape = RadialShape::new(config.seed.wrapping_add(1));
        Self::generate_with_shape(config, &shape)
    }

    /// Generate a map with a custom island silhouette
    ///
    /// The shape mask decides which corners start out as water; everything
    /// else in the pipeline derives from those flags.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use voronoi_island_map::*;
    ///
    /// let config = MapConfigBuilder::new().seed(7).build().unwrap();
    /// // No initial water: lakes disappear, the ocean still floods in
    /// // from the border.
    /// let map = IslandMap::generate_with_shape(config, &AlwaysLand).unwrap();
    /// # let _ = map;
    /// ```
    pub fn generate_with_shape<S: IslandShape>(config: MapConfig, shape: &S) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let bounds = config.bounds;
        let points: Vec<DVec2> = (0..config.point_count())
            .map(|_| {
                DVec2::new(
                    rng.gen_range(bounds.min.x..bounds.max.x),
                    rng.gen_range(bounds.min.y..bounds.max.y),
                )
            })
            .collect();
        Self::build(&points, config, shape)
    }

    /// Build a map directly from a supplied point sample
    ///
    /// Points must lie inside the configured bounding box (the default box
    /// is `[-1, 1] x [-1, 1]`).
    pub fn from_points(points: &[DVec2], config: MapConfig) -> Result<Self> {
        let shape = RadialShape::new(config.seed.wrapping_add(1));
        Self::build(points, config, &shape)
    }

    /// Build a map from a seeded, jittered `size x size` lattice
    ///
    /// Uses the default configuration with the given seed; the lattice
    /// feeds the same construction path as [`from_points`](Self::from_points).
    pub fn from_grid(size: usize, seed: u64) -> Result<Self> {
        let config = crate::config::MapConfigBuilder::new().seed(seed).build()?;
        let points = graph::grid_points(size, seed, &config.bounds);
        let shape = RadialShape::new(seed.wrapping_add(1));
        Self::build(&points, config, &shape)
    }

    /// Build the graph and run the full simulation pipeline.
    fn build<S: IslandShape>(points: &[DVec2], config: MapConfig, shape: &S) -> Result<Self> {
        let started = Instant::now();

        let mut graph = MapGraph::from_points(points, &config.bounds, config.lloyd_iterations)?;

        let params = PipelineParams {
            lake_threshold: config.lake_threshold,
            elevation_scale: config.elevation_scale,
            watershed_iterations: config.watershed_iterations,
            river_attempts: config.river_attempts,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(2));
        simulate::run(&mut graph, shape, &mut rng, &params);

        log::debug!(
            "[map] generated {} polygons, {} corners, {} edges in {:?}",
            graph.centers().len(),
            graph.corners().len(),
            graph.edges().len(),
            started.elapsed()
        );

        #[cfg(feature = "spatial-index")]
        let spatial_index = {
            let positions: Vec<DVec2> = graph.centers().iter().map(|c| c.position).collect();
            SpatialIndex::new(&positions)
        };

        Ok(Self {
            config,
            graph,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Get the configuration used to generate this map
    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Get the underlying graph
    #[inline]
    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    /// Get all polygons
    ///
    /// Mesh builders read these to assign per-polygon color and build
    /// triangle fans from `(center, corners[i], corners[i - 1])`.
    #[inline]
    pub fn centers(&self) -> &[Center] {
        self.graph.centers()
    }

    /// Get all corners
    #[inline]
    pub fn corners(&self) -> &[Corner] {
        self.graph.corners()
    }

    /// Get all edges
    ///
    /// Border and river line segments come straight from this list.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    /// Get a polygon by index
    #[inline]
    pub fn get_center(&self, index: usize) -> Option<&Center> {
        self.graph.center(index)
    }

    /// Get a corner by index
    #[inline]
    pub fn get_corner(&self, index: usize) -> Option<&Corner> {
        self.graph.corner(index)
    }

    /// Get an edge by index
    #[inline]
    pub fn get_edge(&self, index: usize) -> Option<&Edge> {
        self.graph.edge(index)
    }

    /// Find the polygon nearest to a position (requires the
    /// `spatial-index` feature)
    ///
    /// O(log n) KD-tree lookup; the polygon containing a position is the
    /// one whose site is nearest to it.
    #[cfg(feature = "spatial-index")]
    pub fn find_center_at(&self, position: DVec2) -> usize {
        self.spatial_index.find_nearest(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapConfigBuilder, MapSize};

    fn small_config(seed: u64) -> MapConfig {
        MapConfigBuilder::new()
            .seed(seed)
            .map_size(MapSize::Custom { point_count: 200 })
            .build()
            .unwrap()
    }

    #[test]
    fn test_generate_produces_a_classified_map() {
        let map = IslandMap::generate(small_config(42)).unwrap();

        assert_eq!(map.centers().len(), 200);
        assert!(!map.corners().is_empty());
        assert!(!map.edges().is_empty());
        map.graph().validate().unwrap();

        // The border flood fill always produces ocean; the radial mask
        // always leaves land near the center.
        assert!(map.centers().iter().any(|c| c.ocean));
        assert!(map.centers().iter().any(|c| !c.water));

        for center in map.centers() {
            assert!((0.0..=1.0).contains(&center.elevation));
            assert!((0.0..=1.0).contains(&center.moisture));
        }
    }

    #[test]
    fn test_same_seed_generates_identical_maps() {
        let a = IslandMap::generate(small_config(7)).unwrap();
        let b = IslandMap::generate(small_config(7)).unwrap();

        assert_eq!(a.centers().len(), b.centers().len());
        for (ca, cb) in a.centers().iter().zip(b.centers()) {
            assert_eq!(ca.position, cb.position);
            assert_eq!(ca.biome, cb.biome);
            assert_eq!(ca.elevation, cb.elevation);
        }
        for (ea, eb) in a.edges().iter().zip(b.edges()) {
            assert_eq!(ea.river, eb.river);
        }
    }

    #[test]
    fn test_different_seeds_generate_different_maps() {
        let a = IslandMap::generate(small_config(1)).unwrap();
        let b = IslandMap::generate(small_config(2)).unwrap();

        let moved = a
            .centers()
            .iter()
            .zip(b.centers())
            .any(|(ca, cb)| ca.position != cb.position);
        assert!(moved);
    }

    #[test]
    fn test_single_site_scenario() {
        // One centered site: the lone polygon is the whole box, entirely
        // border-adjacent, flooded by the border ocean at elevation zero.
        let config = MapConfigBuilder::new()
            .seed(3)
            .map_size(MapSize::Custom { point_count: 1 })
            .build()
            .unwrap();
        let map = IslandMap::from_points(&[DVec2::ZERO], config).unwrap();

        assert_eq!(map.centers().len(), 1);
        let center = &map.centers()[0];
        assert_eq!(center.borders.len(), 4);
        assert!(center.border);
        assert!(center.ocean);
        assert_eq!(center.elevation, 0.0);
        for corner in map.corners() {
            assert!(corner.border);
            assert_eq!(corner.elevation, 0.0);
        }
    }

    #[test]
    fn test_from_grid_runs_the_full_pipeline() {
        let map = IslandMap::from_grid(8, 42).unwrap();
        assert_eq!(map.centers().len(), 64);
        map.graph().validate().unwrap();
        assert!(map.centers().iter().any(|c| c.ocean));
    }

    #[test]
    fn test_always_land_shape_removes_lakes() {
        let config = small_config(9);
        let map = IslandMap::generate_with_shape(config, &crate::shape::AlwaysLand).unwrap();

        // Without mask water the only water is the border-connected ocean.
        for center in map.centers() {
            if center.water {
                assert!(center.ocean);
            }
        }
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_center_at_returns_nearest_site() {
        let map = IslandMap::generate(small_config(4)).unwrap();
        let target = map.centers()[10].position;
        assert_eq!(map.find_center_at(target), 10);
    }

    #[test]
    fn test_accessors_bounds_check() {
        let map = IslandMap::generate(small_config(5)).unwrap();
        assert!(map.get_center(map.centers().len()).is_none());
        assert!(map.get_corner(usize::MAX).is_none());
        assert!(map.get_edge(usize::MAX).is_none());
        assert!(map.get_center(0).is_some());
    }
}
