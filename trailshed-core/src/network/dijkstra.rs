use std::{cmp::Ordering, collections::BinaryHeap, time::Instant};

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use super::StreetNetwork;
use crate::TravelMode;

/// Pops between two deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 1024;

#[derive(Copy, Clone)]
struct State {
    cost: f64,
    node: NodeIndex,
}

// Min-heap by cost (reversed from standard Rust BinaryHeap)
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// The deadline passed before the search finished
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeadlineExceeded;

/// Dijkstra's algorithm over the edges `mode` may use.
/// Returns a map of reached node indices to travel minutes, limited to
/// nodes within `max_cost`.
pub(crate) fn dijkstra_path_weights(
    network: &StreetNetwork,
    start: NodeIndex,
    mode: &TravelMode,
    max_cost: f64,
    deadline: Option<Instant>,
) -> Result<HashMap<NodeIndex, f64>, DeadlineExceeded> {
    let graph = &network.graph;
    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    let mut pops = 0usize;
    while let Some(State { cost, node }) = heap.pop() {
        pops += 1;
        if pops % DEADLINE_CHECK_INTERVAL == 0
            && deadline.is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(DeadlineExceeded);
        }

        if settled.put(node.index()) {
            continue;
        }

        for edge in graph.edges(node) {
            let Some(minutes) = edge.weight().travel_minutes(mode) else {
                continue;
            };
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + minutes;
            if next_cost > max_cost || settled.contains(next.index()) {
                continue;
            }

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    Ok(distances)
}
