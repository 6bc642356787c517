//! Hierarchical outline of a report.
//!
//! A [`Document`] is an arena: it owns every [`Node`] in a map keyed by id, and
//! nodes refer to each other only through ids (`parent`, `children`). The root
//! node is created with the document and can never be removed.
//!
//! Lookups and mutations on unknown ids are *soft misses*: they return `false`,
//! `None` or `0`. Only [`Document::add_section`] treats a bad parent id as a hard
//! error.

pub mod command;
pub mod render;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by tree operations that require a valid reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Node not found: {0}")]
    InvalidReference(Uuid),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// The kind of content block a node holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[serde(alias = "raiz")]
    Root,
    #[serde(alias = "titulo")]
    Title,
    #[serde(alias = "subtitulo")]
    Subtitle,
    #[serde(alias = "parrafo")]
    Paragraph,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Paragraph => "paragraph",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "root" => Some(Self::Root),
            "title" | "titulo" => Some(Self::Title),
            "subtitle" | "subtitulo" => Some(Self::Subtitle),
            "paragraph" | "parrafo" => Some(Self::Paragraph),
            _ => None,
        }
    }
}

/// One block of the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: Uuid,
    pub kind: NodeKind,
    pub text: String,
    pub parent: Option<Uuid>,
    /// Child ids in insertion order.
    pub children: Vec<Uuid>,
}

/// Heading totals returned by [`Document::count_titles`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TitleCount {
    pub titles: usize,
    pub subtitles: usize,
}

/// A tree of content nodes with a distinguished root.
///
/// The serialized form is `{root_id, nodes: {id: {id, kind, text, parent, children}}}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Document {
    root_id: Uuid,
    nodes: HashMap<Uuid, Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only an empty root node.
    pub fn new() -> Self {
        let root_id = Uuid::new_v4();
        let root = Node {
            id: root_id,
            kind: NodeKind::Root,
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self { root_id, nodes }
    }

    pub fn root_id(&self) -> Uuid {
        self.root_id
    }

    pub fn get(&self, id: Uuid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Append a new node as the last child of `parent_id` (root when `None`).
    pub fn add_section(
        &mut self,
        kind: NodeKind,
        text: impl Into<String>,
        parent_id: Option<Uuid>,
    ) -> Result<Uuid, DocumentError> {
        let parent_id = parent_id.unwrap_or(self.root_id);
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or(DocumentError::InvalidReference(parent_id))?;

        let id = Uuid::new_v4();
        parent.children.push(id);
        self.nodes.insert(
            id,
            Node {
                id,
                kind,
                text: text.into(),
                parent: Some(parent_id),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Replace a node's text. Returns `false` when the node does not exist.
    pub fn update_text(&mut self, node_id: Uuid, new_text: impl Into<String>) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.text = new_text.into();
                true
            }
            None => false,
        }
    }

    /// Remove a node together with its whole subtree.
    ///
    /// Returns `false` for the root or an unknown id.
    pub fn delete_section(&mut self, node_id: Uuid) -> bool {
        if node_id == self.root_id || !self.nodes.contains_key(&node_id) {
            return false;
        }

        if let Some(parent_id) = self.nodes[&node_id].parent {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|child| *child != node_id);
            }
        }

        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.children);
            }
        }
        true
    }

    /// Count `title` and `subtitle` nodes across the whole tree.
    pub fn count_titles(&self) -> TitleCount {
        self.nodes
            .values()
            .fold(TitleCount::default(), |mut acc, node| {
                match node.kind {
                    NodeKind::Title => acc.titles += 1,
                    NodeKind::Subtitle => acc.subtitles += 1,
                    _ => {}
                }
                acc
            })
    }

    /// Characters in a node's text plus all of its descendants. `0` for unknown ids.
    pub fn get_character_count(&self, section_id: Uuid) -> usize {
        let mut total = 0;
        let mut stack = vec![section_id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                total += node.text.chars().count();
                stack.extend(node.children.iter().copied());
            }
        }
        total
    }

    /// First node, in document order, whose text contains `name` (case-insensitive).
    pub fn find_section_by_name(&self, name: &str) -> Option<Uuid> {
        let needle = name.to_lowercase();
        self.iter()
            .find(|node| node.text.to_lowercase().contains(&needle))
            .map(|node| node.id)
    }

    /// Depth-first pre-order walk starting at the root.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        PreOrder {
            doc: self,
            stack: vec![self.root_id],
        }
    }

    /// Depth of a node below the root (root is 0). `None` for unknown ids.
    pub fn depth(&self, node_id: Uuid) -> Option<usize> {
        let mut node = self.nodes.get(&node_id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    pub fn serialize(&self) -> serde_json::Value {
        // Serialization of plain maps with uuid keys cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild a document from its serialized form, checking the tree invariants.
    pub fn deserialize(value: serde_json::Value) -> Result<Self, DocumentError> {
        let raw: RawDocument =
            serde_json::from_value(value).map_err(|e| DocumentError::Malformed(e.to_string()))?;
        Self::from_parts(raw.root_id, raw.nodes)
    }

    fn from_parts(root_id: Uuid, nodes: HashMap<Uuid, Node>) -> Result<Self, DocumentError> {
        let root = nodes
            .get(&root_id)
            .ok_or_else(|| DocumentError::Malformed("root node missing".to_string()))?;
        if root.parent.is_some() {
            return Err(DocumentError::Malformed("root node has a parent".to_string()));
        }

        for (key, node) in &nodes {
            if *key != node.id {
                return Err(DocumentError::Malformed(format!(
                    "node stored under {} has id {}",
                    key, node.id
                )));
            }
            for child in &node.children {
                let linked = nodes.get(child).and_then(|c| c.parent) == Some(node.id);
                if !linked {
                    return Err(DocumentError::Malformed(format!(
                        "child {} of {} is missing or not linked back",
                        child, node.id
                    )));
                }
            }
        }

        let doc = Self { root_id, nodes };
        let mut seen = HashSet::new();
        for node in doc.iter() {
            if !seen.insert(node.id) {
                return Err(DocumentError::Malformed(format!(
                    "node {} is reachable twice",
                    node.id
                )));
            }
        }
        if seen.len() != doc.nodes.len() {
            return Err(DocumentError::Malformed(
                "document contains orphaned nodes".to_string(),
            ));
        }
        Ok(doc)
    }
}

#[derive(Deserialize)]
struct RawDocument {
    root_id: Uuid,
    #[serde(default)]
    nodes: HashMap<Uuid, Node>,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawDocument::deserialize(deserializer)?;
        Document::from_parts(raw.root_id, raw.nodes).map_err(serde::de::Error::custom)
    }
}

struct PreOrder<'a> {
    doc: &'a Document,
    stack: Vec<Uuid>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.doc.nodes.get(&id) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}
