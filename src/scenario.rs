pub mod node;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use node::{Choice, Media, Node, NodeKind};

/// The authored graph: node records keyed by id, in authoring order, plus the
/// entry node.
///
/// Records are stored as loose JSON so documents written by older editors load
/// untouched. Every read goes through [`Node::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub nodes: Map<String, Value>,
    #[serde(default)]
    pub start_node_id: Option<String>,
}

impl Scenario {
    /// Build a scenario from typed nodes. The first node is the entry point.
    pub fn from_nodes(nodes: &[Node]) -> serde_json::Result<Self> {
        let mut records = Map::new();
        for node in nodes {
            records.insert(node.id.clone(), serde_json::to_value(node)?);
        }
        Ok(Self {
            nodes: records,
            start_node_id: nodes.first().map(|n| n.id.clone()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Normalized copy of a node. The stored record is never modified.
    pub fn get_node(&self, id: &str) -> Option<Node> {
        self.nodes.get(id).map(|raw| Node::normalize(id, raw))
    }

    /// Every node, normalized, in authoring order.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|(id, raw)| Node::normalize(id, raw))
            .collect()
    }

    /// Storage keys paired with their normalized nodes, in authoring order.
    pub fn entries(&self) -> Vec<(String, Node)> {
        self.nodes
            .iter()
            .map(|(id, raw)| (id.clone(), Node::normalize(id, raw)))
            .collect()
    }

    pub fn start_node(&self) -> Option<Node> {
        self.start_node_id.as_deref().and_then(|id| self.get_node(id))
    }

    /// True when `id` names an existing node with no choices.
    pub fn is_end_node(&self, id: &str) -> bool {
        self.get_node(id).is_some_and(|node| node.is_terminal())
    }

    /// Check for configuration errors. All problems are reported, except
    /// that an empty scenario reports only that.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.nodes.is_empty() {
            errors.push("At least one node is required".to_string());
            return errors;
        }

        let start_ok = self
            .start_node_id
            .as_deref()
            .is_some_and(|id| self.contains(id));
        if !start_ok {
            errors.push("Start node ID does not exist".to_string());
        }

        for node in self.nodes() {
            for choice in &node.choices {
                if !self.contains(&choice.target_node_id) {
                    errors.push(format!(
                        "Invalid target {} in node {}",
                        choice.target_node_id, node.id
                    ));
                }
            }
        }

        errors
    }
}
