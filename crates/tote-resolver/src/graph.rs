//! Which package required which, as a petgraph directed graph.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tote_core::package::ids_match;
use tote_core::{PackageKey, PackageRecord, Version};

/// A package in the resolution graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub version: Version,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// Roots plus every resolved package, with an edge from each package to
/// the packages its dependencies resolved to.
#[derive(Debug, Default)]
pub struct ResolutionGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<PackageKey, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl ResolutionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or retrieve the node for `record`.
    pub fn add_package(&mut self, record: &PackageRecord) -> NodeIndex {
        let key = record.key();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            id: record.id.clone(),
            version: record.version.clone(),
        });
        self.index.insert(key, idx);
        idx
    }

    /// Add `record` as a root of the resolution.
    pub fn add_root(&mut self, record: &PackageRecord) -> NodeIndex {
        let idx = self.add_package(record);
        if !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
        idx
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Direct dependencies of a node, in the order they were recorded.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        // petgraph walks outgoing edges newest first.
        deps.reverse();
        deps
    }

    /// Render each root and its dependencies as an indented tree.
    ///
    /// A package reached again through a cycle is printed but not expanded.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        for &root in &self.roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            let mut visited = HashSet::from([root]);
            let deps = self.dependencies_of(root);
            let count = deps.len();
            for (i, child) in deps.into_iter().enumerate() {
                self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth, &mut visited);
            }
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if max_depth.is_some_and(|max| depth >= max) || !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, child) in deps.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Chain of packages from a root down to the first package named `id`.
    pub fn find_path(&self, id: &str) -> Option<Vec<&GraphNode>> {
        let target = self
            .graph
            .node_indices()
            .find(|&idx| ids_match(&self.graph[idx].id, id))?;
        for &root in &self.roots {
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(root, target, &mut path, &mut visited) {
                return Some(path.into_iter().map(|idx| &self.graph[idx]).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if visited.insert(current) {
            for child in self.dependencies_of(current) {
                if self.dfs_path(child, target, path, visited) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }

    /// Number of non-root packages.
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(self.roots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
