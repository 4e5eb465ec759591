//! Downslope, watershed, river and moisture passes.

use std::collections::VecDeque;

use rand::Rng;

use crate::graph::MapGraph;

/// Moisture seeded per unit of river volume.
const RIVER_MOISTURE: f64 = 0.2;
/// Cap on seeded river moisture.
const MAX_SEED_MOISTURE: f64 = 3.0;
/// Moisture decay per BFS hop.
const MOISTURE_DECAY: f64 = 0.9;
/// River source elevation window.
const RIVER_SOURCE_MIN: f64 = 0.3;
const RIVER_SOURCE_MAX: f64 = 0.9;

/// Point every corner at its lowest-or-equal neighbor.
///
/// The corner itself is the first candidate, so a corner with no strictly
/// lower neighbor points at itself. Ties go to the first candidate
/// examined (self, then adjacency order), which is deterministic for a
/// fixed graph build.
pub(crate) fn calculate_downslopes(graph: &mut MapGraph) {
    for i in 0..graph.corners.len() {
        let mut best = i;
        for &adj in &graph.corners[i].adjacent {
            if graph.corners[adj].elevation < graph.corners[best].elevation {
                best = adj;
            }
        }
        graph.corners[i].downslope = Some(best);
    }
}

/// Propagate watershed assignments down the downslope graph.
///
/// Every corner starts as its own watershed; non-ocean, non-coast corners
/// adopt their downslope's watershed and then chase it toward the coast
/// with a bounded fixed-point iteration. Hitting the cap is best-effort,
/// not an error. Afterwards `watershed_size` counts the corners draining
/// into each terminal.
pub(crate) fn calculate_watersheds(graph: &mut MapGraph, max_iterations: usize) {
    for i in 0..graph.corners.len() {
        let corner = &graph.corners[i];
        let initial = if !corner.ocean && !corner.coast {
            corner.downslope.unwrap_or(i)
        } else {
            i
        };
        graph.corners[i].watershed = Some(initial);
        graph.corners[i].watershed_size = 0;
    }

    let mut converged = false;
    for pass in 0..max_iterations {
        let mut changed = false;
        for i in 0..graph.corners.len() {
            if graph.corners[i].ocean || graph.corners[i].coast {
                continue;
            }
            let watershed = graph.corners[i].watershed.unwrap_or(i);
            if graph.corners[watershed].coast {
                continue;
            }
            let down = graph.corners[i].downslope.unwrap_or(i);
            if let Some(candidate) = graph.corners[down].watershed {
                if candidate != watershed && !graph.corners[candidate].ocean {
                    graph.corners[i].watershed = Some(candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            log::debug!("[watershed] fixed point after {} passes", pass + 1);
            converged = true;
            break;
        }
    }
    if !converged {
        log::warn!(
            "[watershed] no fixed point within {} passes; keeping best-effort assignment",
            max_iterations
        );
    }

    for i in 0..graph.corners.len() {
        if let Some(w) = graph.corners[i].watershed {
            graph.corners[w].watershed_size += 1;
        }
    }
}

/// Trace rivers from random springs down to the coast.
///
/// Each attempt picks a random corner; non-ocean corners whose elevation
/// falls in the source window start a walk that follows `downslope` until
/// it reaches a coast corner or a self-loop, incrementing river volume on
/// every corner and edge it traverses.
pub(crate) fn create_rivers<R: Rng>(graph: &mut MapGraph, rng: &mut R, attempts: usize) {
    if graph.corners.is_empty() {
        return;
    }

    for _ in 0..attempts {
        let start = rng.gen_range(0..graph.corners.len());
        {
            let corner = &graph.corners[start];
            if corner.ocean
                || corner.elevation < RIVER_SOURCE_MIN
                || corner.elevation > RIVER_SOURCE_MAX
            {
                continue;
            }
        }

        let mut q = start;
        while !graph.corners[q].coast {
            let down = match graph.corners[q].downslope {
                Some(d) => d,
                None => break,
            };
            if down == q {
                break;
            }
            if let Some(e) = edge_between(graph, q, down) {
                graph.edges[e].river += 1;
            }
            graph.corners[q].river += 1;
            graph.corners[down].river += 1;
            q = down;
        }
    }
}

/// Find the edge connecting two adjacent corners.
fn edge_between(graph: &MapGraph, a: usize, b: usize) -> Option<usize> {
    graph.corners[a].protrudes.iter().copied().find(|&e| {
        let edge = &graph.edges[e];
        (edge.v0 == a && edge.v1 == b) || (edge.v0 == b && edge.v1 == a)
    })
}

/// Seed and spread corner moisture.
///
/// Fresh water seeds moisture (`min(3.0, 0.2 x river)` on river corners,
/// 1.0 on riverless lake corners) and a BFS spreads it with 0.9 decay per
/// hop wherever that raises a neighbor. Ocean and coast corners are then
/// forced to full moisture, overriding whatever propagation produced.
pub(crate) fn assign_corner_moisture(graph: &mut MapGraph) {
    let mut queue = VecDeque::new();
    for i in 0..graph.corners.len() {
        let corner = &graph.corners[i];
        if (corner.water || corner.river > 0) && !corner.ocean {
            graph.corners[i].moisture = if corner.river > 0 {
                (RIVER_MOISTURE * corner.river as f64).min(MAX_SEED_MOISTURE)
            } else {
                1.0
            };
            queue.push_back(i);
        } else {
            graph.corners[i].moisture = 0.0;
        }
    }

    while let Some(i) = queue.pop_front() {
        let new_moisture = graph.corners[i].moisture * MOISTURE_DECAY;
        for &adj in &graph.corners[i].adjacent.clone() {
            if new_moisture > graph.corners[adj].moisture {
                graph.corners[adj].moisture = new_moisture;
                queue.push_back(adj);
            }
        }
    }

    for i in 0..graph.corners.len() {
        if graph.corners[i].ocean || graph.corners[i].coast {
            graph.corners[i].moisture = 1.0;
        }
    }
}

/// Rank-remap land corner moisture linearly onto `[0, 1]`.
pub(crate) fn redistribute_moisture(graph: &mut MapGraph) {
    let mut land: Vec<usize> = (0..graph.corners.len())
        .filter(|&i| !graph.corners[i].ocean && !graph.corners[i].coast)
        .collect();
    land.sort_by(|&a, &b| {
        graph.corners[a]
            .moisture
            .partial_cmp(&graph.corners[b].moisture)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let denom = land.len().saturating_sub(1).max(1) as f64;
    for (rank, &i) in land.iter().enumerate() {
        graph.corners[i].moisture = rank as f64 / denom;
    }
}

/// Polygon moisture is the mean of its corners' moisture, each clamped to
/// at most 1.0 first.
pub(crate) fn assign_center_moisture(graph: &mut MapGraph) {
    for i in 0..graph.centers.len() {
        let corner_ids = graph.centers[i].corners.clone();
        if corner_ids.is_empty() {
            graph.centers[i].moisture = 0.0;
            continue;
        }
        let sum: f64 = corner_ids
            .iter()
            .map(|&c| graph.corners[c].moisture.min(1.0))
            .sum();
        graph.centers[i].moisture = sum / corner_ids.len() as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::RadialShape;
    use crate::simulate::elevation;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Grid graph with the elevation passes already run.
    fn classified_graph(size: usize) -> MapGraph {
        let mut graph = MapGraph::from_grid(size, 42).unwrap();
        let shape = RadialShape::new(7);
        elevation::assign_corner_elevations(&mut graph, &shape);
        elevation::assign_ocean_coast_and_land(&mut graph, 0.3);
        elevation::redistribute_elevations(&mut graph, 1.1);
        elevation::assign_center_elevations(&mut graph);
        graph
    }

    #[test]
    fn test_downslope_is_monotone() {
        let mut graph = classified_graph(10);
        calculate_downslopes(&mut graph);

        for corner in graph.corners() {
            let down = corner.downslope.unwrap();
            assert!(
                graph.corners()[down].elevation <= corner.elevation,
                "downslope of corner {} goes uphill",
                corner.index
            );
        }
    }

    #[test]
    fn test_downslope_walks_terminate() {
        let mut graph = classified_graph(10);
        calculate_downslopes(&mut graph);

        // Following downslope at most corner-count times reaches either a
        // fixed point or a coast corner: no cycle among distinct corners.
        let limit = graph.corners().len();
        for start in 0..graph.corners().len() {
            let mut q = start;
            let mut steps = 0;
            loop {
                let down = graph.corners()[q].downslope.unwrap();
                if down == q || graph.corners()[q].coast {
                    break;
                }
                q = down;
                steps += 1;
                assert!(steps <= limit, "downslope cycle from corner {}", start);
            }
        }
    }

    #[test]
    fn test_watershed_sizes_account_for_every_corner() {
        let mut graph = classified_graph(10);
        calculate_downslopes(&mut graph);
        calculate_watersheds(&mut graph, 100);

        let total: u32 = graph.corners().iter().map(|c| c.watershed_size).sum();
        assert_eq!(total as usize, graph.corners().len());

        for corner in graph.corners() {
            assert!(corner.watershed.is_some());
            if corner.ocean || corner.coast {
                assert_eq!(corner.watershed, Some(corner.index));
            }
        }
    }

    #[test]
    fn test_river_corridor_reaches_the_coast() {
        // Synthetic saddle: elevation is a funnel built from BFS distance
        // to a single mouth corner on the border, so every downslope walk
        // drains through the forced low corridor around the mouth.
        let mut graph = MapGraph::from_grid(5, 11).unwrap();

        let mouth = graph
            .corners()
            .iter()
            .find(|c| c.border)
            .map(|c| c.index)
            .unwrap();

        // Corner-distance BFS from the mouth.
        let mut distance = vec![usize::MAX; graph.corners().len()];
        let mut queue = VecDeque::new();
        distance[mouth] = 0;
        queue.push_back(mouth);
        while let Some(i) = queue.pop_front() {
            for &adj in &graph.corners()[i].adjacent {
                if distance[adj] == usize::MAX {
                    distance[adj] = distance[i] + 1;
                    queue.push_back(adj);
                }
            }
        }

        for i in 0..graph.corners().len() {
            let corner = &mut graph.corners[i];
            corner.ocean = false;
            corner.water = false;
            corner.coast = i == mouth;
            corner.elevation = if i == mouth {
                0.0
            } else {
                0.35 + distance[i] as f64 * 0.01
            };
        }
        calculate_downslopes(&mut graph);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let attempts = graph.corners().len() * 2;
        create_rivers(&mut graph, &mut rng, attempts);

        // Every source is in the (0.3, 0.9) window by construction; at
        // least one traced river must drain into the mouth corridor.
        assert!(graph.corners()[mouth].river > 0, "no river reached the mouth");
        let wet_neighbor = graph.corners()[mouth]
            .adjacent
            .iter()
            .any(|&a| graph.corners()[a].river > 0);
        assert!(wet_neighbor, "corridor corners stayed dry");
        let wet_edge = graph.edges().iter().any(|e| e.river > 0);
        assert!(wet_edge, "no edge carries river volume");

        // River paths are continuous: a wet corner is coast or drains into
        // another wet corner.
        for corner in graph.corners() {
            if corner.river > 0 && !corner.coast {
                let down = corner.downslope.unwrap();
                if down != corner.index {
                    assert!(graph.corners()[down].river > 0);
                }
            }
        }
    }

    #[test]
    fn test_moisture_pipeline_ranges() {
        let mut graph = classified_graph(10);
        calculate_downslopes(&mut graph);
        calculate_watersheds(&mut graph, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let attempts = graph.corners().len() / 2;
        create_rivers(&mut graph, &mut rng, attempts);
        assign_corner_moisture(&mut graph);
        redistribute_moisture(&mut graph);
        assign_center_moisture(&mut graph);

        for corner in graph.corners() {
            if corner.ocean || corner.coast {
                assert_eq!(corner.moisture, 1.0);
            } else {
                assert!((0.0..=1.0).contains(&corner.moisture));
            }
        }
        for center in graph.centers() {
            assert!((0.0..=1.0).contains(&center.moisture));
        }
    }

    #[test]
    fn test_moisture_redistribution_covers_unit_interval() {
        let mut graph = classified_graph(10);
        calculate_downslopes(&mut graph);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let attempts = graph.corners().len();
        create_rivers(&mut graph, &mut rng, attempts);
        assign_corner_moisture(&mut graph);
        redistribute_moisture(&mut graph);

        let land: Vec<f64> = graph
            .corners()
            .iter()
            .filter(|c| !c.ocean && !c.coast)
            .map(|c| c.moisture)
            .collect();
        assert!(land.len() > 1);
        let min = land.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = land.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }
}
