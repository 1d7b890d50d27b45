//! Shortest path queries over a [`DependencyGraph`].

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
    Direction,
};

use crate::{
    graph::{DependencyGraph, EdgeView},
    Error, Result,
};

/// Every edge costs 1
pub fn unit_weight<E>(_: EdgeView<'_, E>) -> f64 {
    1.0
}

/// Render a path as `A -> B -> C`; an empty path renders as an empty string
pub fn format_path<E>(path: &[EdgeView<'_, E>]) -> String {
    let Some(first) = path.first() else {
        return String::new();
    };

    let mut rendered = first.source.to_string();
    for edge in path {
        rendered.push_str(" -> ");
        rendered.push_str(edge.target);
    }
    rendered
}

/// Heap entry ordered so that `BinaryHeap` pops the lowest cost first
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<E> DependencyGraph<E> {
    /// Single source Dijkstra, returning the predecessor edge of every reached node
    fn shortest_path_tree<W>(&self, source: NodeIndex, weight: &mut W) -> Result<HashMap<NodeIndex, EdgeIndex>>
    where
        W: FnMut(EdgeView<'_, E>) -> f64,
    {
        let mut distances = HashMap::from([(source, 0.0_f64)]);
        let mut predecessors = HashMap::new();
        let mut heap = BinaryHeap::from([State { cost: 0.0, node: source }]);

        while let Some(State { cost, node }) = heap.pop() {
            if distances.get(&node).is_some_and(|&best| cost > best) {
                continue;
            }

            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let edge_cost = weight(self.view(edge));
                if edge_cost.is_nan() || edge_cost < 0.0 {
                    return Err(Error::GraphError(format!(
                        "invalid weight {} on edge {} -> {}",
                        edge_cost,
                        self.name(edge.source()),
                        self.name(edge.target())
                    )));
                }

                let next = cost + edge_cost;
                let improves = distances
                    .get(&edge.target())
                    .map_or(true, |&known| next < known);
                if improves {
                    distances.insert(edge.target(), next);
                    predecessors.insert(edge.target(), edge.id());
                    heap.push(State {
                        cost: next,
                        node: edge.target(),
                    });
                }
            }
        }

        Ok(predecessors)
    }

    fn recover_path(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        predecessors: &HashMap<NodeIndex, EdgeIndex>,
    ) -> Vec<EdgeView<'_, E>> {
        let mut path = Vec::new();
        let mut current = target;
        while current != source {
            let Some(&edge_id) = predecessors.get(&current) else {
                return Vec::new();
            };
            let (Some(edge), Some((previous, _))) =
                (self.edge(edge_id), self.graph.edge_endpoints(edge_id))
            else {
                return Vec::new();
            };
            path.push(edge);
            current = previous;
        }
        path.reverse();
        path
    }

    fn ordered_nodes<I>(&self, names: I) -> Vec<NodeIndex>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let wanted: HashSet<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        self.graph
            .node_indices()
            .filter(|node| wanted.contains(self.name(*node)))
            .collect()
    }

    /// Shortest paths from every source to every reachable target.
    ///
    /// Runs one Dijkstra per source. Sources and targets are visited in graph order; names
    /// not in the graph are ignored, and a target equal to the source is skipped. Each path
    /// is the sequence of edges from source to target.
    ///
    /// ## Arguments
    /// * 'sources' - Start vertices
    /// * 'targets' - End vertices
    /// * 'weight'  - Cost of an edge, must be finite and non-negative
    ///
    /// # Errors
    /// Returns [`Error::GraphError`] if `weight` yields a negative or NaN cost
    pub fn paths_between<S, T, W>(
        &self,
        sources: S,
        targets: T,
        mut weight: W,
    ) -> Result<Vec<Vec<EdgeView<'_, E>>>>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
        W: FnMut(EdgeView<'_, E>) -> f64,
    {
        let sources = self.ordered_nodes(sources);
        let targets = self.ordered_nodes(targets);

        let mut paths = Vec::new();
        for &source in &sources {
            let predecessors = self.shortest_path_tree(source, &mut weight)?;
            for &target in &targets {
                if target == source || !predecessors.contains_key(&target) {
                    continue;
                }
                let path = self.recover_path(source, target, &predecessors);
                if !path.is_empty() {
                    paths.push(path);
                }
            }
        }

        Ok(paths)
    }

    /// A new graph holding every edge of every shortest path between sources and targets,
    /// each edge once.
    ///
    /// # Errors
    /// Returns [`Error::GraphError`] if `weight` yields a negative or NaN cost
    pub fn union_of_shortest_paths<S, T, W>(&self, sources: S, targets: T, weight: W) -> Result<DependencyGraph<E>>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
        W: FnMut(EdgeView<'_, E>) -> f64,
        E: Clone,
    {
        let mut union = DependencyGraph::new();
        let mut seen = HashSet::new();
        for path in self.paths_between(sources, targets, weight)? {
            for edge in path {
                if seen.insert(edge.id) {
                    union.add_edge(edge.source, edge.target, edge.weight.clone());
                }
            }
        }
        Ok(union)
    }
}
