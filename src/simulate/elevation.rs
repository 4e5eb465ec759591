//! Elevation and land/water classification passes.

use std::collections::VecDeque;

use crate::graph::MapGraph;
use crate::shape::IslandShape;

/// Elevation gained per BFS hop.
const ELEVATION_STEP: f64 = 0.01;
/// Extra cost of a hop between two land corners; water crossings stay
/// nearly flat, which keeps lakes level.
const LAND_STEP: f64 = 1.0;

/// Seed the water mask from the island shape and grow corner elevations
/// outward from the map border.
///
/// Border corners start at elevation 0 and feed a multi-source BFS; each
/// hop adds [`ELEVATION_STEP`], plus [`LAND_STEP`] when neither endpoint is
/// water. Updates only ever lower a corner's tentative elevation, so the
/// resulting field has no local minima away from the border.
pub(crate) fn assign_corner_elevations<S: IslandShape + ?Sized>(graph: &mut MapGraph, shape: &S) {
    let bounds = *graph.bounds();
    for i in 0..graph.corners.len() {
        let normalized = bounds.normalize(graph.corners[i].position);
        graph.corners[i].water = !shape.contains(normalized);
    }

    let mut queue = VecDeque::new();
    for i in 0..graph.corners.len() {
        if graph.corners[i].border {
            graph.corners[i].elevation = 0.0;
            queue.push_back(i);
        } else {
            graph.corners[i].elevation = f64::INFINITY;
        }
    }

    while let Some(i) = queue.pop_front() {
        for &adj in &graph.corners[i].adjacent.clone() {
            let mut new_elevation = graph.corners[i].elevation + ELEVATION_STEP;
            if !graph.corners[i].water && !graph.corners[adj].water {
                new_elevation += LAND_STEP;
            }
            if new_elevation < graph.corners[adj].elevation {
                graph.corners[adj].elevation = new_elevation;
                queue.push_back(adj);
            }
        }
    }
}

/// Classify polygons and corners into ocean, coast, lake and land.
///
/// Border-touching polygons seed an ocean flood fill that spreads through
/// water polygons; a polygon is water when the fraction of its water
/// corners reaches `lake_threshold`. Corner flags derive from the touching
/// polygons: ocean iff every toucher is ocean, coast iff both ocean and
/// land touch.
pub(crate) fn assign_ocean_coast_and_land(graph: &mut MapGraph, lake_threshold: f64) {
    let mut queue = VecDeque::new();

    for i in 0..graph.centers.len() {
        let corner_ids = graph.centers[i].corners.clone();
        let mut num_water = 0;
        for &c in &corner_ids {
            if graph.corners[c].border {
                graph.centers[i].border = true;
                graph.centers[i].ocean = true;
                graph.corners[c].water = true;
                queue.push_back(i);
            }
            if graph.corners[c].water {
                num_water += 1;
            }
        }
        let center = &mut graph.centers[i];
        center.water =
            center.ocean || num_water as f64 >= corner_ids.len() as f64 * lake_threshold;
    }

    while let Some(i) = queue.pop_front() {
        for &n in &graph.centers[i].neighbors.clone() {
            if graph.centers[n].water && !graph.centers[n].ocean {
                graph.centers[n].ocean = true;
                queue.push_back(n);
            }
        }
    }

    for i in 0..graph.centers.len() {
        let neighbors = graph.centers[i].neighbors.clone();
        let num_ocean = neighbors.iter().filter(|&&n| graph.centers[n].ocean).count();
        let num_land = neighbors.iter().filter(|&&n| !graph.centers[n].water).count();
        graph.centers[i].coast = num_ocean > 0 && num_land > 0;
    }

    for i in 0..graph.corners.len() {
        let touches = graph.corners[i].touches.clone();
        let num_ocean = touches.iter().filter(|&&t| graph.centers[t].ocean).count();
        let num_land = touches.iter().filter(|&&t| !graph.centers[t].water).count();
        let corner = &mut graph.corners[i];
        corner.ocean = !touches.is_empty() && num_ocean == touches.len();
        corner.coast = num_ocean > 0 && num_land > 0;
        corner.water = corner.border || (num_land != touches.len() && !corner.coast);
    }
}

/// Remap land corner elevations onto a rank-based curve.
///
/// Sorting land corners by elevation and solving `y = 1 - (1 - x)^2` for
/// each rank's `y` makes low elevations more common than high ones; `scale`
/// (> 1) pushes the top of the range past 1.0 before clamping. Ocean and
/// coast corners are pinned to sea level afterwards.
pub(crate) fn redistribute_elevations(graph: &mut MapGraph, scale: f64) {
    let mut land: Vec<usize> = (0..graph.corners.len())
        .filter(|&i| !graph.corners[i].ocean && !graph.corners[i].coast)
        .collect();
    land.sort_by(|&a, &b| {
        graph.corners[a]
            .elevation
            .partial_cmp(&graph.corners[b].elevation)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let denom = land.len().saturating_sub(1).max(1) as f64;
    for (rank, &i) in land.iter().enumerate() {
        let y = rank as f64 / denom;
        let x = scale.sqrt() - (scale * (1.0 - y)).sqrt();
        graph.corners[i].elevation = x.min(1.0);
    }

    for i in 0..graph.corners.len() {
        if graph.corners[i].ocean || graph.corners[i].coast {
            graph.corners[i].elevation = 0.0;
        }
    }
}

/// Polygon elevation is the mean of its finalized corner elevations.
pub(crate) fn assign_center_elevations(graph: &mut MapGraph) {
    for i in 0..graph.centers.len() {
        let corner_ids = graph.centers[i].corners.clone();
        if corner_ids.is_empty() {
            graph.centers[i].elevation = 0.0;
            continue;
        }
        let sum: f64 = corner_ids
            .iter()
            .map(|&c| graph.corners[c].elevation)
            .sum();
        graph.centers[i].elevation = sum / corner_ids.len() as f64;
    }
}
