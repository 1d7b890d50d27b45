//! Structural reductions of a [`DependencyGraph`].

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::{stable_graph::NodeIndex, visit::{EdgeRef, IntoEdgeReferences}, Direction};

use crate::{
    graph::{DependencyGraph, EdgeView},
    Error, Result,
};

/// Endpoint of an edge synthesized while merging a partition
#[derive(Clone, Copy)]
enum Endpoint {
    Existing(NodeIndex),
    Merged,
}

impl<E> DependencyGraph<E> {
    /// Vertices reachable from the sources through out-edges, the sources included.
    ///
    /// Sources that are not part of the graph are ignored.
    pub fn reachable<I, S>(&self, sources: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reachable_nodes(sources)
            .into_iter()
            .map(|node| self.name(node).to_string())
            .collect()
    }

    fn reachable_nodes<I, S>(&self, sources: I) -> HashSet<NodeIndex>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        for source in sources {
            if let Some(node) = self.node(source.as_ref()) {
                if visited.insert(node) {
                    queue.push_back(node);
                }
            }
        }

        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Remove a vertex while keeping the paths through it.
    ///
    /// For every pair of an incoming edge `u → v` and an outgoing edge `v → w`, an edge
    /// `u → w` weighted `merge(incoming, outgoing)` is added before `v` is removed. A vertex
    /// without incoming or without outgoing edges is simply removed.
    ///
    /// # Errors
    /// Returns [`Error::VertexNotFound`] if the vertex does not exist
    pub fn contract_vertex<M>(&mut self, vertex: &str, mut merge: M) -> Result<()>
    where
        M: FnMut(EdgeView<'_, E>, EdgeView<'_, E>) -> E,
    {
        let node = self
            .node(vertex)
            .ok_or_else(|| Error::VertexNotFound(vertex.to_string()))?;
        self.contract_node(node, &mut merge);
        Ok(())
    }

    fn contract_node<M>(&mut self, node: NodeIndex, merge: &mut M)
    where
        M: FnMut(EdgeView<'_, E>, EdgeView<'_, E>) -> E,
    {
        let incoming: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| edge.id())
            .collect();
        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();

        let mut synthesized = Vec::with_capacity(incoming.len() * outgoing.len());
        for &in_id in &incoming {
            for &out_id in &outgoing {
                let (Some(in_edge), Some(out_edge)) = (self.edge(in_id), self.edge(out_id)) else {
                    continue;
                };
                let (Some((source, _)), Some((_, target))) = (
                    self.graph.edge_endpoints(in_id),
                    self.graph.edge_endpoints(out_id),
                ) else {
                    continue;
                };
                synthesized.push((source, target, merge(in_edge, out_edge)));
            }
        }

        for (source, target, weight) in synthesized {
            self.graph.add_edge(source, target, weight);
        }
        self.remove_node(node);
    }

    /// Contract every vertex matching the predicate.
    ///
    /// Matching vertices are collected first; a vertex that disappears before its turn is
    /// skipped. Returns the number of contracted vertices.
    pub fn contract_vertices<P, M>(&mut self, predicate: P, mut merge: M) -> usize
    where
        P: Fn(&str) -> bool,
        M: FnMut(EdgeView<'_, E>, EdgeView<'_, E>) -> E,
    {
        let matching: Vec<String> = self
            .vertices()
            .filter(|name| predicate(name))
            .map(str::to_string)
            .collect();

        let mut contracted = 0;
        for name in matching {
            if let Some(node) = self.node(&name) {
                self.contract_node(node, &mut merge);
                contracted += 1;
            }
        }
        contracted
    }

    /// Merge vertices that share a key into one vertex named by the key.
    ///
    /// Partitions are processed in graph order of their first member. Edges between a
    /// member and a vertex outside the partition are redirected to the merged vertex:
    /// `merge_in(edge, key)` builds the weight when the target is rewritten,
    /// `merge_out(key, edge)` when the source is. Edges between members are dropped. A
    /// partition holding a single vertex whose key is its own name is left alone.
    pub fn merge_vertices_by_key<K, I, O>(&mut self, key_fn: K, mut merge_in: I, mut merge_out: O)
    where
        K: Fn(&str) -> String,
        I: FnMut(EdgeView<'_, E>, &str) -> E,
        O: FnMut(&str, EdgeView<'_, E>) -> E,
    {
        let mut order: Vec<String> = Vec::new();
        let mut partitions: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.vertices() {
            let key = key_fn(name);
            let members = partitions.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            members.push(name.to_string());
        }

        for key in order {
            let Some(members) = partitions.remove(&key) else {
                continue;
            };
            if members.len() == 1 && members[0] == key {
                continue;
            }
            self.merge_partition(&key, &members, &mut merge_in, &mut merge_out);
        }
    }

    fn merge_partition<I, O>(&mut self, key: &str, members: &[String], merge_in: &mut I, merge_out: &mut O)
    where
        I: FnMut(EdgeView<'_, E>, &str) -> E,
        O: FnMut(&str, EdgeView<'_, E>) -> E,
    {
        let nodes: Vec<NodeIndex> = members.iter().filter_map(|name| self.node(name)).collect();
        let member_set: HashSet<NodeIndex> = nodes.iter().copied().collect();

        let mut redirected = Vec::new();
        for &node in &nodes {
            for edge in self.graph.edges_directed(node, Direction::Incoming) {
                if !member_set.contains(&edge.source()) {
                    let weight = merge_in(self.view(edge), key);
                    redirected.push((Endpoint::Existing(edge.source()), Endpoint::Merged, weight));
                }
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if !member_set.contains(&edge.target()) {
                    let weight = merge_out(key, self.view(edge));
                    redirected.push((Endpoint::Merged, Endpoint::Existing(edge.target()), weight));
                }
            }
        }

        for node in nodes {
            self.remove_node(node);
        }

        let merged = self.ensure_node(key);
        let resolve = |endpoint: Endpoint| match endpoint {
            Endpoint::Existing(node) => node,
            Endpoint::Merged => merged,
        };
        for (source, target, weight) in redirected {
            self.graph.add_edge(resolve(source), resolve(target), weight);
        }
    }

    /// Project the graph onto a subset of its vertices.
    ///
    /// The result holds the subset vertices present in this graph and an edge `u → v`
    /// whenever `v` can be reached from `u` along a path whose intermediate vertices all
    /// lie outside the subset. No self-loops are produced.
    ///
    /// ## Arguments
    /// * 'subset'       - Names of the vertices to keep
    /// * 'edge_factory' - Builds the weight of a projected edge from its endpoints
    pub fn project_subgraph<F, S, B>(&self, subset: S, mut edge_factory: B) -> DependencyGraph<F>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        B: FnMut(&str, &str) -> F,
    {
        let wanted: HashSet<String> = subset
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let kept: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| wanted.contains(self.name(*node)))
            .collect();
        let kept_set: HashSet<NodeIndex> = kept.iter().copied().collect();

        let mut projected = DependencyGraph::new();
        for &node in &kept {
            projected.add_vertex(self.name(node));
        }

        for &start in &kept {
            let mut targets = BTreeSet::new();
            let mut visited = HashSet::from([start]);
            let mut stack: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(start, Direction::Outgoing)
                .collect();

            while let Some(node) = stack.pop() {
                if !visited.insert(node) {
                    continue;
                }
                if kept_set.contains(&node) {
                    targets.insert(node);
                    continue;
                }
                stack.extend(self.graph.neighbors_directed(node, Direction::Outgoing));
            }

            let source = self.name(start);
            for target in targets {
                let target = self.name(target);
                projected.add_edge(source, target, edge_factory(source, target));
            }
        }

        projected
    }

    /// Remove every vertex that cannot be reached from the given vertices
    pub fn cut_non_reachable<I, S>(&mut self, keep: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reachable = self.reachable_nodes(keep);
        let unreachable: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| !reachable.contains(node))
            .collect();
        for node in unreachable {
            self.remove_node(node);
        }
    }

    /// A copy holding the vertices reachable from the entries and all edges between them
    pub fn connected_out_subgraph<I, S>(&self, entries: I) -> DependencyGraph<E>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        E: Clone,
    {
        let reachable = self.reachable_nodes(entries);
        let mut subgraph = DependencyGraph::new();
        for node in self.graph.node_indices() {
            if reachable.contains(&node) {
                subgraph.add_vertex(self.name(node));
            }
        }
        for edge in self.graph.edge_references() {
            if reachable.contains(&edge.source()) && reachable.contains(&edge.target()) {
                subgraph.add_edge(
                    self.name(edge.source()),
                    self.name(edge.target()),
                    edge.weight().clone(),
                );
            }
        }
        subgraph
    }
}
