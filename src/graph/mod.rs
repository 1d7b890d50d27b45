//! Dependency graph storage, reductions and path queries.
//!
//! [`DependencyGraph`] is a directed multigraph whose vertices are type full names and
//! whose edges carry an arbitrary weight, usually the [`RelationList`] that produced them.
//! Storage is a `petgraph` [`StableDiGraph`], so edge and node indices stay valid while
//! other vertices are removed, plus a name index for lookups.
//!
//! # Key Components
//!
//! - [`DependencyGraph`] - The graph and its basic operations
//! - [`EdgeView`] - Borrowed view of one edge with resolved endpoint names
//! - Reductions: contraction, key based merging, subset projection, reachability cuts
//! - Paths: Dijkstra based path enumeration and union-of-shortest-paths assembly
//!
//! # Examples
//!
//! ```rust
//! use dotmetrics::graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_edge("App.Controller", "App.Service", 2usize);
//! graph.add_edge("App.Service", "App.Repository", 1usize);
//!
//! graph.contract_vertex("App.Service", |incoming, outgoing| incoming.weight + outgoing.weight)?;
//!
//! let edge = graph.out_edges("App.Controller")[0];
//! assert_eq!((edge.target, *edge.weight), ("App.Repository", 3));
//! # Ok::<(), dotmetrics::Error>(())
//! ```
//!
//! [`RelationList`]: crate::analysis::RelationList

mod paths;
mod reduce;

pub use paths::{format_path, unit_weight};

use std::{collections::HashMap, fmt};

use petgraph::{
    stable_graph::{EdgeIndex, EdgeReference, NodeIndex, StableDiGraph},
    visit::{EdgeRef, IntoEdgeReferences},
    Direction,
};

use crate::{analysis::RelationList, Error, Result};

/// Stable identifier of an edge
pub type EdgeId = EdgeIndex;

/// A borrowed view of one edge
#[derive(Debug)]
pub struct EdgeView<'g, E> {
    /// Edge identifier, valid until the edge is removed
    pub id: EdgeId,
    /// Name of the source vertex
    pub source: &'g str,
    /// Name of the target vertex
    pub target: &'g str,
    /// The edge weight
    pub weight: &'g E,
}

impl<E> Clone for EdgeView<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EdgeView<'_, E> {}

impl<E> fmt::Display for EdgeView<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// A directed multigraph over named vertices.
///
/// Vertex names are unique. Adding an edge adds missing endpoints. Iteration follows the
/// node index order of the underlying graph ("graph order").
#[derive(Debug, Clone)]
pub struct DependencyGraph<E = RelationList> {
    graph: StableDiGraph<String, E>,
    index: HashMap<String, NodeIndex>,
}

impl<E> Default for DependencyGraph<E> {
    fn default() -> Self {
        DependencyGraph {
            graph: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }
}

impl<E> DependencyGraph<E> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex; returns `false` if it already existed
    pub fn add_vertex(&mut self, name: &str) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        self.ensure_node(name);
        true
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.index.get(name) {
            return node;
        }
        let node = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), node);
        node
    }

    /// Add an edge, creating missing endpoints. Parallel edges are allowed.
    ///
    /// ## Arguments
    /// * 'source' - Name of the source vertex
    /// * 'target' - Name of the target vertex
    /// * 'weight' - The edge weight
    pub fn add_edge(&mut self, source: &str, target: &str, weight: E) -> EdgeId {
        let source = self.ensure_node(source);
        let target = self.ensure_node(target);
        self.graph.add_edge(source, target, weight)
    }

    /// Remove a vertex and all of its edges
    ///
    /// # Errors
    /// Returns [`Error::VertexNotFound`] if the vertex does not exist
    pub fn remove_vertex(&mut self, name: &str) -> Result<()> {
        let node = self
            .node(name)
            .ok_or_else(|| Error::VertexNotFound(name.to_string()))?;
        self.remove_node(node);
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeIndex) {
        if let Some(name) = self.graph.remove_node(node) {
            self.index.remove(&name);
        }
    }

    /// Remove an edge, returning its weight
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<E> {
        self.graph.remove_edge(id)
    }

    /// True if the vertex exists
    pub fn contains_vertex(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Vertex names in graph order
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(move |node| self.name(node))
    }

    /// All edges
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_, E>> {
        self.graph.edge_references().map(move |edge| self.view(edge))
    }

    /// A single edge
    pub fn edge(&self, id: EdgeId) -> Option<EdgeView<'_, E>> {
        let (source, target) = self.graph.edge_endpoints(id)?;
        Some(EdgeView {
            id,
            source: self.name(source),
            target: self.name(target),
            weight: self.graph.edge_weight(id)?,
        })
    }

    /// Edges leaving the vertex, empty if it does not exist
    pub fn out_edges(&self, name: &str) -> Vec<EdgeView<'_, E>> {
        self.directed_edges(name, Direction::Outgoing)
    }

    /// Edges entering the vertex, empty if it does not exist
    pub fn in_edges(&self, name: &str) -> Vec<EdgeView<'_, E>> {
        self.directed_edges(name, Direction::Incoming)
    }

    /// All edges from `source` to `target`
    pub fn edges_between(&self, source: &str, target: &str) -> Vec<EdgeView<'_, E>> {
        self.out_edges(source)
            .into_iter()
            .filter(|edge| edge.target == target)
            .collect()
    }

    fn directed_edges(&self, name: &str, direction: Direction) -> Vec<EdgeView<'_, E>> {
        match self.node(name) {
            Some(node) => self
                .graph
                .edges_directed(node, direction)
                .map(|edge| self.view(edge))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn node(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub(crate) fn name(&self, node: NodeIndex) -> &str {
        self.graph[node].as_str()
    }

    fn view<'g>(&'g self, edge: EdgeReference<'g, E>) -> EdgeView<'g, E> {
        EdgeView {
            id: edge.id(),
            source: self.name(edge.source()),
            target: self.name(edge.target()),
            weight: edge.weight(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_operations() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_vertex("A"));
        assert!(!graph.add_vertex("A"));

        let first = graph.add_edge("A", "B", 1);
        graph.add_edge("A", "B", 2);
        graph.add_edge("B", "C", 3);

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.vertices().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(graph.edges_between("A", "B").len(), 2);
        assert_eq!(graph.in_edges("B").len(), 2);
        assert!(graph.out_edges("Missing").is_empty());

        let edge = graph.edge(first).unwrap();
        assert_eq!((edge.source, edge.target, *edge.weight), ("A", "B", 1));
        assert_eq!(edge.to_string(), "A -> B");

        graph.remove_vertex("B").unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains_vertex("B"));
        assert!(graph.edge(first).is_none());
        assert!(matches!(graph.remove_vertex("B"), Err(Error::VertexNotFound(name)) if name == "B"));
    }
}
