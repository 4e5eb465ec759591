//! The map simulation pipeline.
//!
//! A fixed sequence of full-graph passes turns the bare planar graph into a
//! classified island: water mask, elevation growth, ocean flood fill,
//! elevation redistribution, downslope/watershed construction, river
//! tracing, moisture propagation and biome assignment. Each pass sweeps the
//! whole graph; none are interleaved or resumable.

pub(crate) mod elevation;
pub(crate) mod hydrology;

use rand_chacha::ChaCha8Rng;

use crate::biome;
use crate::graph::MapGraph;
use crate::shape::IslandShape;

/// Tunables threaded from [`MapConfig`](crate::MapConfig) into the passes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineParams {
    /// Water-corner fraction above which a polygon counts as water.
    pub lake_threshold: f64,
    /// Scale factor for the elevation redistribution curve.
    pub elevation_scale: f64,
    /// Iteration cap for watershed propagation.
    pub watershed_iterations: usize,
    /// River tracing attempts; `None` uses half the corner count.
    pub river_attempts: Option<usize>,
}

/// Run every pass in order over a freshly built graph.
pub(crate) fn run<S: IslandShape + ?Sized>(
    graph: &mut MapGraph,
    shape: &S,
    rng: &mut ChaCha8Rng,
    params: &PipelineParams,
) {
    elevation::assign_corner_elevations(graph, shape);
    elevation::assign_ocean_coast_and_land(graph, params.lake_threshold);
    elevation::redistribute_elevations(graph, params.elevation_scale);
    elevation::assign_center_elevations(graph);

    hydrology::calculate_downslopes(graph);
    hydrology::calculate_watersheds(graph, params.watershed_iterations);
    let attempts = params.river_attempts.unwrap_or(graph.corners().len() / 2);
    hydrology::create_rivers(graph, rng, attempts);
    hydrology::assign_corner_moisture(graph);
    hydrology::redistribute_moisture(graph);
    hydrology::assign_center_moisture(graph);

    biome::assign_biomes(graph);
}
