//! Bounded Voronoi island map-graph generation
//!
//! Turns a set of 2D sample points into a fully classified planar graph of
//! polygonal regions: a bounded Voronoi tessellation (with optional Lloyd
//! relaxation) becomes a deduplicated Center/Corner/Edge graph, and a fixed
//! pipeline of passes assigns elevation, land/water classification,
//! rivers, moisture and biomes. Engine-agnostic: consumers read the
//! finished graph through accessors to build their own meshes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voronoi_island_map::*;
//!
//! // Generate a map
//! let config = MapConfigBuilder::new()
//!     .seed(42)
//!     .map_size(MapSize::Medium)
//!     .lloyd_iterations(2).unwrap()
//!     .build().unwrap();
//!
//! let map = IslandMap::generate(config).unwrap();
//! println!("Generated {} polygons", map.centers().len());
//!
//! // Read the classified graph
//! for center in map.centers() {
//!     let _ = (center.biome, center.elevation, center.moisture);
//! }
//! for edge in map.edges().iter().filter(|e| e.river > 0) {
//!     let _ = edge.midpoint; // river segment
//! }
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-polygon lookups using
//!   a KD-tree
//! - `serde`: serialization support for configuration types

// Modules
pub mod biome;
pub mod config;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod map;
pub mod shape;

mod simulate;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use biome::{classify, Biome};
pub use config::{MapConfig, MapConfigBuilder, MapSize};
pub use diagram::{Site, VoronoiDiagram};
pub use error::{MapError, Result};
pub use geometry::BoundingBox;
pub use graph::{Center, Corner, Edge, MapGraph};
pub use map::IslandMap;
pub use shape::{AlwaysLand, IslandShape, RadialShape};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
