//! Dependency-closed working set of declarations

use std::borrow::Cow;
use std::collections::HashMap;
use tracing::trace;

use crate::{DeclarationGraph, DeclarationNode, Result};

/// Selects declarations from a graph and pulls in everything they depend on.
///
/// Insertion order is preserved so rendering is deterministic.
pub struct Scope<'g> {
    graph: &'g DeclarationGraph,
    current: Vec<Cow<'g, DeclarationNode>>,
    index: HashMap<String, usize>,
}

impl<'g> Scope<'g> {
    /// Any single identifier with its uniqueness suffix
    pub const CHILD: &'static str = r"\w+#\d+";

    /// Pattern for an identifier followed by its uniqueness suffix
    pub fn ident(pattern: &str) -> String {
        format!(r"{}#\d+", pattern)
    }

    pub fn new(graph: &'g DeclarationGraph) -> Self {
        Self {
            graph,
            current: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add every node matching `kind` and the id `segments`, then the
    /// transitive closure of their dependencies. Matching nothing is fine.
    pub fn add_by_pattern<S: AsRef<str>>(&mut self, kind: &str, segments: &[S]) -> Result<()> {
        let graph = self.graph;
        for node in graph.select(kind, segments)? {
            if self.index.contains_key(&node.id) {
                continue;
            }
            trace!("scope += {}.{}", node.kind, node.id);
            self.insert(Cow::Borrowed(node));

            for dependency in &node.depends_on {
                let mut parts = dependency.split('.');
                let dep_kind = parts.next().unwrap_or_default();
                let dep_segments: Vec<&str> = parts.collect();
                if dep_segments.is_empty() {
                    trace!("ignoring dependency without id: {}", dependency);
                    continue;
                }
                self.add_by_pattern(dep_kind, dep_segments.as_slice())?;
            }
        }
        Ok(())
    }

    /// Insert a node directly, without resolving its dependencies
    pub fn add_node(&mut self, node: DeclarationNode) {
        self.insert(Cow::Owned(node));
    }

    fn insert(&mut self, node: Cow<'g, DeclarationNode>) {
        match self.index.get(&node.id) {
            Some(&i) => self.current[i] = node,
            None => {
                self.index.insert(node.id.clone(), self.current.len());
                self.current.push(node);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// The closed set, in first-insertion order
    pub fn current(&self) -> Vec<&DeclarationNode> {
        self.current.iter().map(|node| node.as_ref()).collect()
    }
}
