//! Map Configuration and Builder
//!
//! This module provides configuration types for deterministic island map
//! generation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::geometry::BoundingBox;

/// Map size presets
///
/// Each size maps to a site count; the bounding box stays the same, so
/// larger maps mean smaller, more detailed polygons.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapSize {
    /// Small map: ~1,000 polygons
    Small,
    /// Medium map: ~4,000 polygons (default)
    Medium,
    /// Large map: ~8,000 polygons
    Large,
    /// Custom map with a specific site count
    Custom {
        /// Number of Voronoi sites to generate
        point_count: usize,
    },
}

impl MapSize {
    /// Get the number of Voronoi sites for this map size
    pub fn point_count(self) -> usize {
        match self {
            MapSize::Small => 1_000,
            MapSize::Medium => 4_000,
            MapSize::Large => 8_000,
            MapSize::Custom { point_count } => point_count,
        }
    }

    /// Get a human-readable name for this map size
    pub fn name(self) -> &'static str {
        match self {
            MapSize::Small => "Small",
            MapSize::Medium => "Medium",
            MapSize::Large => "Large",
            MapSize::Custom { .. } => "Custom",
        }
    }
}

impl Default for MapSize {
    fn default() -> Self {
        MapSize::Medium
    }
}

/// Configuration for deterministic island map generation
///
/// The same configuration always produces the identical map: every random
/// decision (site sampling, island silhouette, river sources) derives from
/// `seed`. Only the configuration is worth persisting: the graph is
/// regenerated from it, never serialized.
///
/// # Example
///
/// ```rust
/// use voronoi_island_map::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .map_size(MapSize::Small)
///     .lloyd_iterations(2)
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(config.point_count(), 1_000);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Random seed for deterministic map generation
    pub seed: u64,

    /// Map size preset (determines the number of Voronoi sites)
    pub map_size: MapSize,

    /// Number of Voronoi construction passes
    ///
    /// Passes beyond the first apply Lloyd relaxation: each pass replaces
    /// every site with the mean of its cell's boundary vertices and
    /// recomputes the tessellation from scratch. A fixed count, no
    /// convergence check.
    ///
    /// - 1: raw Voronoi cells (irregular)
    /// - 2: decent uniformity (default)
    /// - 3-5: visibly even polygons, slower generation
    pub lloyd_iterations: usize,

    /// Bounding box the tessellation is clipped to
    ///
    /// Defaults to the normalized `[-1, 1] x [-1, 1]` box all the provided
    /// pipelines use.
    pub bounds: BoundingBox,

    /// Fraction of water corners above which a polygon counts as water
    pub lake_threshold: f64,

    /// Scale factor applied by the elevation redistribution curve
    ///
    /// Values above 1.0 push the top of the remapped range past 1.0 before
    /// clamping, flattening the highest peaks slightly.
    pub elevation_scale: f64,

    /// Iteration cap for the watershed fixed-point propagation
    ///
    /// Hitting the cap is not an error; the best-effort assignment is kept
    /// and a warning is logged.
    pub watershed_iterations: usize,

    /// Number of river tracing attempts
    ///
    /// `None` uses half the corner count of the generated graph.
    pub river_attempts: Option<usize>,
}

impl MapConfig {
    /// Get the site count for this configuration
    #[inline]
    pub fn point_count(&self) -> usize {
        self.map_size.point_count()
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfigBuilder::new().build().unwrap()
    }
}

/// Builder for creating a [`MapConfig`] with validation
///
/// # Example
///
/// ```rust
/// use voronoi_island_map::*;
///
/// // Use defaults
/// let config = MapConfigBuilder::new().build().unwrap();
///
/// // Customize
/// let config = MapConfigBuilder::new()
///     .seed(12345)
///     .map_size(MapSize::Custom { point_count: 500 })
///     .lake_threshold(0.5)
///     .unwrap()
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<u64>,
    map_size: MapSize,
    lloyd_iterations: usize,
    bounds: BoundingBox,
    lake_threshold: f64,
    elevation_scale: f64,
    watershed_iterations: usize,
    river_attempts: Option<usize>,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: random
    /// - map_size: Medium (~4,000 polygons)
    /// - lloyd_iterations: 2
    /// - bounds: `[-1, 1] x [-1, 1]`
    /// - lake_threshold: 0.3
    /// - elevation_scale: 1.1
    /// - watershed_iterations: 100
    /// - river_attempts: half the corner count
    pub fn new() -> Self {
        Self {
            seed: None,
            map_size: MapSize::default(),
            lloyd_iterations: 2,
            bounds: BoundingBox::NORMALIZED,
            lake_threshold: 0.3,
            elevation_scale: 1.1,
            watershed_iterations: 100,
            river_attempts: None,
        }
    }

    /// Set the random seed for map generation
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the map size preset
    pub fn map_size(mut self, size: MapSize) -> Self {
        self.map_size = size;
        self
    }

    /// Set the number of Voronoi construction passes
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for 0 passes or more than 20 (excessive and
    /// impractical).
    pub fn lloyd_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations == 0 || iterations > 20 {
            return Err(MapError::InvalidConfig(format!(
                "lloyd iterations must be in 1..=20 (got {})",
                iterations
            )));
        }
        self.lloyd_iterations = iterations;
        Ok(self)
    }

    /// Set the bounding box the tessellation is clipped to
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the box has non-positive extent.
    pub fn bounds(mut self, bounds: BoundingBox) -> Result<Self> {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "bounding box must have positive extent (got {} x {})",
                bounds.width(),
                bounds.height()
            )));
        }
        self.bounds = bounds;
        Ok(self)
    }

    /// Set the water-corner fraction above which a polygon counts as water
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless the threshold lies in `(0, 1]`.
    pub fn lake_threshold(mut self, threshold: f64) -> Result<Self> {
        if threshold <= 0.0 || threshold > 1.0 {
            return Err(MapError::InvalidConfig(format!(
                "lake threshold must be in (0, 1] (got {})",
                threshold
            )));
        }
        self.lake_threshold = threshold;
        Ok(self)
    }

    /// Set the elevation redistribution scale factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for factors below 1.0.
    pub fn elevation_scale(mut self, scale: f64) -> Result<Self> {
        if scale < 1.0 {
            return Err(MapError::InvalidConfig(format!(
                "elevation scale must be >= 1.0 (got {})",
                scale
            )));
        }
        self.elevation_scale = scale;
        Ok(self)
    }

    /// Set the watershed propagation iteration cap
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero cap.
    pub fn watershed_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations == 0 {
            return Err(MapError::InvalidConfig(
                "watershed iteration cap must be at least 1".to_string(),
            ));
        }
        self.watershed_iterations = iterations;
        Ok(self)
    }

    /// Set an explicit number of river tracing attempts
    ///
    /// When unset, half the corner count is used.
    pub fn river_attempts(mut self, attempts: usize) -> Self {
        self.river_attempts = Some(attempts);
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, a random one is generated.
    pub fn build(self) -> Result<MapConfig> {
        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(MapConfig {
            seed,
            map_size: self.map_size,
            lloyd_iterations: self.lloyd_iterations,
            bounds: self.bounds,
            lake_threshold: self.lake_threshold,
            elevation_scale: self.elevation_scale,
            watershed_iterations: self.watershed_iterations,
            river_attempts: self.river_attempts,
        })
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
