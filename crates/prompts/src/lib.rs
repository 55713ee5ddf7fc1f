//! Declaration graph for agent prompts
//!
//! Loads the declarations emitted by the companion compiler and selects the
//! dependency-closed subset of them that describes a set of capabilities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub mod build;
pub mod scope;

pub use build::{artifact_path, build, source_url, BuildOptions};
pub use scope::Scope;

/// Declaration graph errors
#[derive(Error, Debug)]
pub enum PromptsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed declaration artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("duplicate declaration id '{0}'")]
    DuplicateId(String),

    #[error("'{0}' is neither a URL nor a file path")]
    InvalidSource(String),

    #[error("compiler failed for {source_path}: {status}")]
    Compiler { source_path: String, status: String },

    #[error("declaration graph load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("declaration graph is unavailable after a failed load")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, PromptsError>;

/// Rendering language of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeFormat {
    #[serde(rename = "ts")]
    TypeScript,
    #[serde(rename = "plaintext")]
    PlainText,
}

/// Kind of source construct a declaration was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    MethodDecl,
    ClassDecl,
    TypeAliasDecl,
    FnDecl,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::MethodDecl => "method_decl",
            NodeKind::ClassDecl => "class_decl",
            NodeKind::TypeAliasDecl => "type_alias_decl",
            NodeKind::FnDecl => "fn_decl",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declaration as emitted by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationNode {
    #[serde(rename = "type")]
    pub format: NodeFormat,
    #[serde(rename = "ast_ty")]
    pub kind: NodeKind,
    pub fmt: String,
    pub id: String,
    /// Patterns of the form `kind.seg.seg`, resolved against the graph
    #[serde(default, rename = "context", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl DeclarationNode {
    pub fn new(kind: NodeKind, id: impl Into<String>, fmt: impl Into<String>) -> Self {
        Self {
            format: NodeFormat::TypeScript,
            kind,
            fmt: fmt.into(),
            id: id.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.depends_on.push(dependency.into());
        self
    }

    pub fn with_format(mut self, format: NodeFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Artifact {
    Module { ast: Vec<DeclarationNode> },
    Nodes(Vec<DeclarationNode>),
}

/// Immutable set of declarations, indexed by id
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    nodes: Vec<DeclarationNode>,
    by_id: HashMap<String, usize>,
}

impl DeclarationGraph {
    /// Build a graph, rejecting duplicate ids
    pub fn new(nodes: Vec<DeclarationNode>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), i).is_some() {
                return Err(PromptsError::DuplicateId(node.id.clone()));
            }
        }
        Ok(Self { nodes, by_id })
    }

    /// Parse a compiler artifact.
    ///
    /// Accepts `{"ast": [...]}`, a bare array of nodes, or the compiler's
    /// module form `export const ast = [...]`.
    pub fn from_artifact(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("export const ast =")
            .map(|rest| rest.trim().trim_end_matches(';'))
            .unwrap_or(trimmed);

        let nodes = match serde_json::from_str::<Artifact>(body)? {
            Artifact::Module { ast } => ast,
            Artifact::Nodes(nodes) => nodes,
        };
        debug!("loaded {} declarations", nodes.len());
        Self::new(nodes)
    }

    /// Read and parse an artifact from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading declarations from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_artifact(&content)
    }

    /// Start loading an artifact on a background task
    pub fn spawn_load(path: impl Into<PathBuf>) -> PendingGraph {
        let path = path.into();
        PendingGraph {
            state: PendingState::Loading(tokio::spawn(async move { Self::load(path).await })),
        }
    }

    pub fn nodes(&self) -> &[DeclarationNode] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&DeclarationNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fresh, empty scope over this graph
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(self)
    }

    /// Nodes whose kind matches `kind` and whose id matches the segments
    /// joined with the path separator. Both are anchored regexes.
    pub(crate) fn select<S: AsRef<str>>(
        &self,
        kind: &str,
        segments: &[S],
    ) -> Result<Vec<&DeclarationNode>> {
        let kind_re = regex::Regex::new(&format!("^(?:{})$", kind))?;

        // Literal ids skip the scan
        if !segments.is_empty() && segments.iter().all(|s| is_literal(s.as_ref())) {
            let id = segments
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(".");
            trace!("exact lookup for {}.{}", kind, id);
            return Ok(self
                .get(&id)
                .filter(|node| kind_re.is_match(node.kind.as_str()))
                .into_iter()
                .collect());
        }

        let id_pattern = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("\\.");
        let id_re = regex::Regex::new(&format!("^(?:{})$", id_pattern))?;
        Ok(self
            .nodes
            .iter()
            .filter(|node| kind_re.is_match(node.kind.as_str()) && id_re.is_match(&node.id))
            .collect())
    }
}

fn is_literal(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '#' | '-'))
}

enum PendingState {
    Ready(Arc<DeclarationGraph>),
    Loading(JoinHandle<Result<DeclarationGraph>>),
    Failed,
}

/// A declaration graph that may still be loading
pub struct PendingGraph {
    state: PendingState,
}

impl PendingGraph {
    pub fn ready(graph: DeclarationGraph) -> Self {
        Self {
            state: PendingState::Ready(Arc::new(graph)),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PendingState::Ready(_))
    }

    /// Wait for the load to finish. A failed load is reported once, then
    /// every later call returns [`PromptsError::Unavailable`].
    pub async fn wait(&mut self) -> Result<Arc<DeclarationGraph>> {
        match std::mem::replace(&mut self.state, PendingState::Failed) {
            PendingState::Ready(graph) => {
                self.state = PendingState::Ready(graph.clone());
                Ok(graph)
            }
            PendingState::Loading(handle) => {
                let graph = Arc::new(handle.await??);
                self.state = PendingState::Ready(graph.clone());
                Ok(graph)
            }
            PendingState::Failed => Err(PromptsError::Unavailable),
        }
    }
}

impl From<DeclarationGraph> for PendingGraph {
    fn from(graph: DeclarationGraph) -> Self {
        Self::ready(graph)
    }
}
