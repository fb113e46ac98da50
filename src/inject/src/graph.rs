//! A directed graph over [`BindingKey`]s: edges run *dependency →
//! dependent* so a topological order produces dependents last
//! (spec.md §3/§4.5).
//!
//! Built on `petgraph`, the crate the wider example pack reaches for to
//! express exactly this shape of graph (see DESIGN.md); the teacher crate
//! carries no graph dependency of its own.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::key::BindingKey;

#[derive(Default)]
pub struct DependencyGraph {
    graph: DiGraph<BindingKey, ()>,
    index: HashMap<BindingKey, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Adds `key` as a vertex if it is not already present; returns
    /// whether it was newly inserted.
    pub fn add_vertex(&mut self, key: BindingKey) -> bool {
        if self.index.contains_key(&key) {
            false
        } else {
            let idx = self.graph.add_node(key.clone());
            self.index.insert(key, idx);
            true
        }
    }

    fn vertex_index(&mut self, key: &BindingKey) -> NodeIndex {
        if let Some(idx) = self.index.get(key) {
            *idx
        } else {
            let idx = self.graph.add_node(key.clone());
            self.index.insert(key.clone(), idx);
            idx
        }
    }

    /// Adds an edge `dependency -> dependent`, inserting either endpoint
    /// as a vertex first if needed.
    pub fn add_edge(&mut self, dependency: &BindingKey, dependent: &BindingKey) {
        let from = self.vertex_index(dependency);
        let to = self.vertex_index(dependent);
        self.graph.update_edge(from, to, ());
    }

    /// O(|V|) due to reverse-lookup rebuild, as spec.md §4.5 documents.
    pub fn remove_vertex(&mut self, key: &BindingKey) {
        if let Some(idx) = self.index.remove(key) {
            self.graph.remove_node(idx);
            self.index = self
                .graph
                .node_indices()
                .map(|idx| (self.graph[idx].clone(), idx))
                .collect();
        }
    }

    pub fn remove_edge(&mut self, dependency: &BindingKey, dependent: &BindingKey) {
        if let (Some(&from), Some(&to)) = (self.index.get(dependency), self.index.get(dependent)) {
            if let Some(edge) = self.graph.find_edge(from, to) {
                self.graph.remove_edge(edge);
            }
        }
    }

    /// Incoming edges of `key`: the keys `key` directly depends on.
    pub fn direct_dependencies_of(&self, key: &BindingKey) -> Vec<BindingKey> {
        let Some(&idx) = self.index.get(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| self.graph[edge.source()].clone())
            .collect()
    }

    /// A single topological order, dependents last.
    pub fn dependency_order(&self) -> Result<Vec<BindingKey>, Vec<BindingKey>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|idx| self.graph[idx].clone()).collect()),
            Err(_) => Err(self.find_cycle().unwrap_or_default()),
        }
    }

    /// Level partitioning: each vertex is assigned `1 + max(level of its
    /// predecessors)`, so vertices sharing a level depend only on vertices
    /// in strictly earlier levels (spec.md §4.5).
    pub fn parallel_dependency_order(&self) -> Result<Vec<Vec<BindingKey>>, Vec<BindingKey>> {
        let order = match toposort(&self.graph, None) {
            Ok(order) => order,
            Err(_) => return Err(self.find_cycle().unwrap_or_default()),
        };

        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut levels: Vec<Vec<BindingKey>> = Vec::new();

        for idx in order {
            let level = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .map(|edge| level_of.get(&edge.source()).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(idx, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(self.graph[idx].clone());
        }

        Ok(levels)
    }

    /// Returns the vertices forming a cycle, if any, in traversal order.
    pub fn find_cycle(&self) -> Option<Vec<BindingKey>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color = vec![Color::White; self.graph.node_count()];
        let mut stack: Vec<NodeIndex> = Vec::new();

        fn visit(
            graph: &DiGraph<BindingKey, ()>,
            node: NodeIndex,
            color: &mut [Color],
            stack: &mut Vec<NodeIndex>,
        ) -> Option<Vec<NodeIndex>> {
            color[node.index()] = Color::Gray;
            stack.push(node);

            for neighbor in graph.neighbors(node) {
                match color[neighbor.index()] {
                    Color::White => {
                        if let Some(cycle) = visit(graph, neighbor, color, stack) {
                            return Some(cycle);
                        }
                    }
                    Color::Gray => {
                        let start = stack.iter().position(|&n| n == neighbor).unwrap_or(0);
                        let mut cycle = stack[start..].to_vec();
                        cycle.push(neighbor);
                        return Some(cycle);
                    }
                    Color::Black => {}
                }
            }

            stack.pop();
            color[node.index()] = Color::Black;
            None
        }

        for node in self.graph.node_indices() {
            if color[node.index()] == Color::White {
                if let Some(cycle) = visit(&self.graph, node, &mut color, &mut stack) {
                    return Some(cycle.into_iter().map(|idx| self.graph[idx].clone()).collect());
                }
            }
        }
        None
    }

    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod tests {
    use crate::key::MetaType;

    use super::*;

    fn key(name: &str) -> BindingKey {
        BindingKey::new::<i32>(MetaType::Value, name)
    }

    #[test]
    fn dependency_order_respects_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key("a"), &key("b"));
        graph.add_edge(&key("b"), &key("c"));

        let order = graph.dependency_order().unwrap();
        let pos = |n: &str| order.iter().position(|k| k.name() == n).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn parallel_order_groups_independent_vertices() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key("a"), &key("c"));
        graph.add_edge(&key("b"), &key("c"));

        let levels = graph.parallel_dependency_order().unwrap();
        assert_eq!(levels.len(), 2);
        let mut first_level: Vec<_> = levels[0].iter().map(|k| k.name().to_string()).collect();
        first_level.sort();
        assert_eq!(first_level, vec!["a", "b"]);
        assert_eq!(levels[1][0].name(), "c");
    }

    #[test]
    fn cyclic_graph_is_detected() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key("a"), &key("b"));
        graph.add_edge(&key("b"), &key("c"));
        graph.add_edge(&key("c"), &key("a"));

        assert!(graph.has_cycles());
        assert!(graph.dependency_order().is_err());
    }

    #[test]
    fn remove_vertex_drops_its_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key("a"), &key("b"));
        graph.remove_vertex(&key("a"));
        assert!(graph.direct_dependencies_of(&key("b")).is_empty());
    }
}
