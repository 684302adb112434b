//! Generic directed graph with named vertices, stored in a petgraph
//! [`StableDiGraph`] with a name index beside it.
//!
//! [`DirectedGraph`] is write-once: vertices and edges can be added but never
//! removed.  Vertex ids are dense indices assigned in insertion order, so two
//! graphs built from the same input by the same procedure have the same ids.
//!
//! Names are indexed but **not** required to be unique;
//! [`DirectedGraph::vertices_named`] returns every vertex carrying a name and
//! [`DirectedGraph::unique_vertex`] only succeeds for exactly one match.
//!
//! # Example
//!
//! ```rust
//! use sdfgraph_frames::graph::{DirectedGraph, WalkEnd};
//!
//! let mut g: DirectedGraph<(), u32> = DirectedGraph::new();
//! let a = g.add_vertex("a", ());
//! let b = g.add_vertex("b", ());
//! g.add_edge(a, b, 7);
//!
//! let walk = g.walk_to_sink(a);
//! assert_eq!(walk.end, WalkEnd::Sink(b));
//! assert_eq!(*walk.edges[0].data(), 7);
//! ```

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};

/// Dense index of a vertex within its graph.
pub type VertexId = usize;

/// Dense index of an edge within its graph.
pub type EdgeId = usize;

/// A named vertex carrying an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex<V> {
    id: VertexId,
    name: String,
    data: V,
}

impl<V> Vertex<V> {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &V {
        &self.data
    }
}

/// A directed edge `from → to` carrying a weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    id: EdgeId,
    from: VertexId,
    to: VertexId,
    data: E,
}

impl<E> Edge<E> {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn from(&self) -> VertexId {
        self.from
    }

    pub fn to(&self) -> VertexId {
        self.to
    }

    pub fn data(&self) -> &E {
        &self.data
    }
}

/// How a [`DirectedGraph::walk_to_sink`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// Reached a vertex with no outgoing edge.
    Sink(VertexId),
    /// Reached a vertex with more than one outgoing edge.
    Fork(VertexId),
    /// Took more steps than there are vertices: the walk is in a cycle.
    StepLimit,
}

/// The edges traversed by a sink walk, in order, and how it ended.
#[derive(Debug)]
pub struct SinkWalk<'a, E> {
    pub edges: Vec<&'a Edge<E>>,
    pub end: WalkEnd,
}

/// A directed graph of named vertices (payload `V`) and weighted edges
/// (payload `E`).
///
/// Node and edge weights carry their own ids; nothing is ever removed, so a
/// petgraph index and the id it wraps always agree.
#[derive(Debug, Clone)]
pub struct DirectedGraph<V, E> {
    inner: StableDiGraph<Vertex<V>, Edge<E>>,
    names: HashMap<String, Vec<VertexId>>,
}

impl<V, E> Default for DirectedGraph<V, E> {
    fn default() -> Self {
        Self {
            inner: StableDiGraph::default(),
            names: HashMap::new(),
        }
    }
}

impl<V, E> DirectedGraph<V, E> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex and return its id.  Duplicate names are allowed.
    pub fn add_vertex(&mut self, name: impl Into<String>, data: V) -> VertexId {
        let id = self.inner.node_count();
        let name = name.into();
        self.names.entry(name.clone()).or_default().push(id);
        let index = self.inner.add_node(Vertex { id, name, data });
        debug_assert_eq!(index.index(), id);
        id
    }

    /// Insert an edge `from → to`.  Returns `None` and inserts nothing when
    /// either endpoint does not exist.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, data: E) -> Option<EdgeId> {
        let (a, b) = (NodeIndex::new(from), NodeIndex::new(to));
        if !self.inner.contains_node(a) || !self.inner.contains_node(b) {
            return None;
        }
        let id = self.inner.edge_count();
        let index = self.inner.add_edge(a, b, Edge { id, from, to, data });
        debug_assert_eq!(index.index(), id);
        Some(id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex<V>> {
        self.inner.node_weight(NodeIndex::new(id))
    }

    /// Every vertex in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<V>> {
        self.inner.node_indices().filter_map(|i| self.inner.node_weight(i))
    }

    /// Every edge in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<E>> {
        self.inner.edge_indices().filter_map(|i| self.inner.edge_weight(i))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge<E>> {
        self.inner.edge_weight(EdgeIndex::new(id))
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Every vertex carrying `name`, in insertion order.
    pub fn vertices_named(&self, name: &str) -> &[VertexId] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The vertex carrying `name` when exactly one does.
    pub fn unique_vertex(&self, name: &str) -> Option<VertexId> {
        match self.vertices_named(name) {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Names carried by more than one vertex, sorted.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = self
            .names
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, _)| name.as_str())
            .collect();
        dups.sort_unstable();
        dups
    }

    /// Edges leaving `id`, oldest first.
    pub fn out_edges(&self, id: VertexId) -> impl Iterator<Item = &Edge<E>> {
        self.adjacent(id, Direction::Outgoing).into_iter()
    }

    /// Edges entering `id`, oldest first.
    pub fn in_edges(&self, id: VertexId) -> impl Iterator<Item = &Edge<E>> {
        self.adjacent(id, Direction::Incoming).into_iter()
    }

    pub fn out_degree(&self, id: VertexId) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    pub fn in_degree(&self, id: VertexId) -> usize {
        self.degree(id, Direction::Incoming)
    }

    // petgraph yields adjacent edges newest first.
    fn adjacent(&self, id: VertexId, dir: Direction) -> Vec<&Edge<E>> {
        let node = NodeIndex::new(id);
        if !self.inner.contains_node(node) {
            return Vec::new();
        }
        let mut edges: Vec<&Edge<E>> = self.inner.edges_directed(node, dir).map(|e| e.weight()).collect();
        edges.sort_unstable_by_key(|e| e.id);
        edges
    }

    fn degree(&self, id: VertexId, dir: Direction) -> usize {
        let node = NodeIndex::new(id);
        if !self.inner.contains_node(node) {
            return 0;
        }
        self.inner.edges_directed(node, dir).count()
    }

    /// Follow the single outgoing edge from `start` until a vertex with zero
    /// or several outgoing edges is reached.
    ///
    /// At most `vertex_count` edges are followed; a longer walk must revisit a
    /// vertex and ends with [`WalkEnd::StepLimit`].
    pub fn walk_to_sink(&self, start: VertexId) -> SinkWalk<'_, E> {
        let mut edges = Vec::new();
        let mut current = start;
        loop {
            let mut out = self.out_edges(current);
            let end = match (out.next(), out.next()) {
                (None, _) => WalkEnd::Sink(current),
                (Some(_), Some(_)) => WalkEnd::Fork(current),
                (Some(edge), None) => {
                    if edges.len() >= self.vertex_count() {
                        WalkEnd::StepLimit
                    } else {
                        edges.push(edge);
                        current = edge.to;
                        continue;
                    }
                }
            };
            return SinkWalk { edges, end };
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: &[&str]) -> DirectedGraph<(), usize> {
        let mut g = DirectedGraph::new();
        let ids: Vec<_> = names.iter().map(|n| g.add_vertex(*n, ())).collect();
        for (i, pair) in ids.windows(2).enumerate() {
            g.add_edge(pair[0], pair[1], i);
        }
        g
    }

    #[test]
    fn ids_are_dense_and_monotonic() {
        let mut g: DirectedGraph<u8, ()> = DirectedGraph::new();
        assert_eq!(g.add_vertex("a", 1), 0);
        assert_eq!(g.add_vertex("b", 2), 1);
        assert_eq!(g.add_vertex("c", 3), 2);
        assert_eq!(g.vertex(1).unwrap().name(), "b");
        assert_eq!(*g.vertex(2).unwrap().data(), 3);
        assert!(g.vertex(3).is_none());
    }

    #[test]
    fn add_edge_rejects_unknown_endpoints() {
        let mut g: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = g.add_vertex("a", ());
        assert!(g.add_edge(a, 5, ()).is_none());
        assert!(g.add_edge(5, a, ()).is_none());
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.add_edge(a, a, ()), Some(0));
    }

    #[test]
    fn in_and_out_edges() {
        let mut g: DirectedGraph<(), &str> = DirectedGraph::new();
        let a = g.add_vertex("a", ());
        let b = g.add_vertex("b", ());
        let c = g.add_vertex("c", ());
        g.add_edge(a, c, "ac");
        g.add_edge(b, c, "bc");

        assert_eq!(g.out_degree(a), 1);
        assert_eq!(g.in_degree(c), 2);
        let incoming: Vec<_> = g.in_edges(c).map(|e| *e.data()).collect();
        assert_eq!(incoming, vec!["ac", "bc"]);
        assert_eq!(g.out_edges(c).count(), 0);
        assert_eq!(g.out_edges(42).count(), 0);
        assert_eq!(g.in_degree(42), 0);
        assert_eq!(g.edge(1).map(|e| (e.from(), e.to())), Some((b, c)));
    }

    #[test]
    fn duplicate_names_are_indexed_but_not_unique() {
        let mut g: DirectedGraph<(), ()> = DirectedGraph::new();
        let a1 = g.add_vertex("a", ());
        let a2 = g.add_vertex("a", ());
        g.add_vertex("b", ());

        assert_eq!(g.vertices_named("a"), &[a1, a2]);
        assert_eq!(g.unique_vertex("a"), None);
        assert_eq!(g.unique_vertex("b"), Some(2));
        assert_eq!(g.unique_vertex("missing"), None);
        assert_eq!(g.duplicate_names(), vec!["a"]);
    }

    #[test]
    fn walk_collects_edges_in_order() {
        let g = chain(&["a", "b", "c", "d"]);
        let walk = g.walk_to_sink(0);
        assert_eq!(walk.end, WalkEnd::Sink(3));
        let weights: Vec<_> = walk.edges.iter().map(|e| *e.data()).collect();
        assert_eq!(weights, vec![0, 1, 2]);
        let ids: Vec<_> = g.vertices().map(Vertex::id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn walk_from_sink_is_empty() {
        let g = chain(&["a", "b"]);
        let walk = g.walk_to_sink(1);
        assert_eq!(walk.end, WalkEnd::Sink(1));
        assert!(walk.edges.is_empty());
    }

    #[test]
    fn walk_stops_at_fork() {
        let mut g = chain(&["a", "b", "c"]);
        g.add_edge(1, 0, 99);
        let walk = g.walk_to_sink(0);
        assert_eq!(walk.end, WalkEnd::Fork(1));
        assert_eq!(walk.edges.len(), 1);
    }

    #[test]
    fn walk_detects_cycle() {
        let mut g = chain(&["a", "b", "c"]);
        g.add_edge(2, 0, 99);
        assert_eq!(g.walk_to_sink(0).end, WalkEnd::StepLimit);

        let mut g: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = g.add_vertex("a", ());
        g.add_edge(a, a, ());
        assert_eq!(g.walk_to_sink(a).end, WalkEnd::StepLimit);
    }
}
