//! Node graph model for ComfyUI workflows.
//!
//! A workflow is a map from node id to a [`Node`]. Each node names the
//! operation to run (`class_type`) and binds its named inputs either to a
//! literal value or to an output slot of another node. On the wire a link
//! is the two-element array `["<node id>", <slot>]`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One input binding of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeInput {
    /// Output slot `.1` of node `.0`.
    Link(String, u32),
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl NodeInput {
    /// Build a link to output `slot` of node `node_id`.
    pub fn link(node_id: impl Into<String>, slot: u32) -> Self {
        Self::Link(node_id.into(), slot)
    }

    /// The referenced node id, if this input is a link.
    pub fn linked_node(&self) -> Option<&str> {
        match self {
            Self::Link(id, _) => Some(id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for NodeInput {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for NodeInput {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for NodeInput {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for NodeInput {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for NodeInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for NodeInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A single processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub class_type: String,
    pub inputs: BTreeMap<String, NodeInput>,
}

impl Node {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            inputs: BTreeMap::new(),
        }
    }

    /// Bind a literal input.
    pub fn input(mut self, name: &str, value: impl Into<NodeInput>) -> Self {
        self.inputs.insert(name.to_string(), value.into());
        self
    }

    /// Bind an input to output `slot` of another node.
    pub fn link(mut self, name: &str, node_id: &str, slot: u32) -> Self {
        self.inputs
            .insert(name.to_string(), NodeInput::link(node_id, slot));
        self
    }
}

/// A complete workflow: node id -> node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeGraph {
    nodes: BTreeMap<String, Node>,
}

/// Structural problems that make a graph unsubmittable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node {node} input '{input}' links to missing node {target}")]
    DanglingLink {
        node: String,
        input: String,
        target: String,
    },

    #[error("graph contains a cycle through node {node}")]
    Cycle { node: String },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the node stored under `id`.
    pub fn insert(&mut self, id: impl Into<String>, node: Node) {
        self.nodes.insert(id.into(), node);
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    /// All nodes whose `class_type` equals `class_type`, in id order.
    pub fn nodes_of_class<'a>(
        &'a self,
        class_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.iter().filter(move |(_, n)| n.class_type == class_type)
    }

    /// Check that every link resolves and that the graph is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (id, node) in &self.nodes {
            for (input, value) in &node.inputs {
                if let Some(target) = value.linked_node() {
                    if !self.nodes.contains_key(target) {
                        return Err(GraphError::DanglingLink {
                            node: id.clone(),
                            input: input.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }

        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());
        for id in self.nodes.keys() {
            self.visit(id, &mut marks)?;
        }
        Ok(())
    }

    fn visit<'a>(&'a self, id: &'a str, marks: &mut HashMap<&'a str, Mark>) -> Result<(), GraphError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(GraphError::Cycle {
                    node: id.to_string(),
                })
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        if let Some(node) = self.nodes.get(id) {
            for target in node.inputs.values().filter_map(NodeInput::linked_node) {
                self.visit(target, marks)?;
            }
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }
}

/// Body of a workflow submission: the graph plus the session id whose
/// WebSocket should receive execution events.
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmission {
    #[serde(rename = "prompt")]
    pub graph: NodeGraph,
    #[serde(rename = "client_id")]
    pub session_id: String,
}
