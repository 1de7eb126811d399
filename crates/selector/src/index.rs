//! A flattened, identity-preserving view of a `serde_json::Value` tree.
//!
//! Every value in the document gets exactly one entry in an arena, addressed by
//! its [`NodeId`]. Parent links are stored as arena indices, so upward traversal
//! is constant-time and the graph never owns itself.
//!
//! Nodes are enumerated in document pre-order: a container precedes its
//! children, array elements follow their index and object members follow their
//! insertion order. Every selector result is reported in this order.
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The arena index of a node. Stable for the lifetime of its [`NodeIndex`].
pub type NodeId = usize;

/// The JSON type of a node, as named by the selector type clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl NodeKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
        }
    }

    /// Looks up a kind by its selector type name (e.g. `object`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(NodeKind::String),
            "number" => Some(NodeKind::Number),
            "boolean" => Some(NodeKind::Boolean),
            "null" => Some(NodeKind::Null),
            "array" => Some(NodeKind::Array),
            "object" => Some(NodeKind::Object),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
struct NodeData<'a> {
    value: &'a Value,
    kind: NodeKind,
    parent: Option<NodeId>,
    key: Option<&'a str>,
    position: usize,
    sibling_count: usize,
    children: Vec<NodeId>,
    /// One past the last id of this node's subtree.
    subtree_end: NodeId,
}

/// The arena of nodes for one document. Read-only once built.
#[derive(Debug)]
pub struct NodeIndex<'a> {
    nodes: Vec<NodeData<'a>>,
}

/// A pending visit during the pre-order build.
struct Visit<'a> {
    value: &'a Value,
    parent: Option<NodeId>,
    key: Option<&'a str>,
    position: usize,
    sibling_count: usize,
}

impl<'a> NodeIndex<'a> {
    /// Maps `root` and everything beneath it into a new index.
    pub fn new(root: &'a Value) -> Self {
        let mut index = NodeIndex { nodes: Vec::new() };
        index.build(root);
        index
    }

    fn build(&mut self, root: &'a Value) {
        // An explicit stack keeps deeply nested documents off the call stack.
        let mut stack = vec![Visit {
            value: root,
            parent: None,
            key: None,
            position: 0,
            sibling_count: 0,
        }];

        while let Some(visit) = stack.pop() {
            let id = self.nodes.len();
            if let Some(parent_id) = visit.parent {
                self.nodes[parent_id].children.push(id);
            }
            self.nodes.push(NodeData {
                value: visit.value,
                kind: NodeKind::of(visit.value),
                parent: visit.parent,
                key: visit.key,
                position: visit.position,
                sibling_count: visit.sibling_count,
                children: Vec::new(),
                subtree_end: id + 1,
            });

            // Children are pushed in reverse so they pop in document order.
            match visit.value {
                Value::Array(items) => {
                    let count = items.len();
                    for (i, item) in items.iter().enumerate().rev() {
                        stack.push(Visit {
                            value: item,
                            parent: Some(id),
                            key: None,
                            position: i + 1,
                            sibling_count: count,
                        });
                    }
                }
                Value::Object(members) => {
                    for (key, member) in members.iter().rev() {
                        stack.push(Visit {
                            value: member,
                            parent: Some(id),
                            key: Some(key.as_str()),
                            position: 0,
                            sibling_count: 0,
                        });
                    }
                }
                _ => {}
            }
        }

        // Children always carry larger ids than their parent.
        for id in (0..self.nodes.len()).rev() {
            if let Some(&last_child) = self.nodes[id].children.last() {
                self.nodes[id].subtree_end = self.nodes[last_child].subtree_end;
            }
        }
    }

    /// The number of nodes in the document. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the document root.
    pub fn root(&self) -> JsonNode<'_> {
        JsonNode { id: 0, index: self }
    }

    /// Returns the node with the given id, if it exists.
    pub fn get(&self, id: NodeId) -> Option<JsonNode<'_>> {
        (id < self.nodes.len()).then_some(JsonNode { id, index: self })
    }

    /// Iterates every node in document pre-order.
    pub fn iter(&self) -> impl Iterator<Item = JsonNode<'_>> + '_ {
        (0..self.nodes.len()).map(move |id| JsonNode { id, index: self })
    }

    /// The value wrapped by `id`, borrowed for the full document lifetime.
    ///
    /// # Panics
    /// If `id` did not come from this index.
    pub fn value(&self, id: NodeId) -> &'a Value {
        self.nodes[id].value
    }

    /// Constant-time parent lookup.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// True when `ancestor` lies strictly above `id` in the tree.
    pub fn is_proper_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor < id && id < self.nodes[ancestor].subtree_end
    }

    fn data(&self, id: NodeId) -> &NodeData<'a> {
        &self.nodes[id]
    }
}

/// A handle to one node of a [`NodeIndex`].
///
/// Equality, hashing and ordering go by identity (arena id), never by value, so
/// two structurally equal values at different places stay distinct.
#[derive(Clone, Copy)]
pub struct JsonNode<'a> {
    id: NodeId,
    index: &'a NodeIndex<'a>,
}

impl<'a> JsonNode<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &'a Value {
        self.index.data(self.id).value
    }

    pub fn kind(&self) -> NodeKind {
        self.index.data(self.id).kind
    }

    /// The member name this node was reached under. `None` for array elements
    /// and the root.
    pub fn key(&self) -> Option<&'a str> {
        self.index.data(self.id).key
    }

    /// 1-based position among array siblings, or 0 outside arrays.
    pub fn position(&self) -> usize {
        self.index.data(self.id).position
    }

    /// Length of the enclosing array, or 0 outside arrays.
    pub fn sibling_count(&self) -> usize {
        self.index.data(self.id).sibling_count
    }

    pub fn parent(&self) -> Option<JsonNode<'a>> {
        self.index.data(self.id).parent.map(|id| JsonNode {
            id,
            index: self.index,
        })
    }

    pub fn is_root(&self) -> bool {
        self.index.data(self.id).parent.is_none()
    }

    pub fn children(&self) -> impl Iterator<Item = JsonNode<'a>> + 'a {
        let index = self.index;
        index
            .data(self.id)
            .children
            .iter()
            .map(move |&id| JsonNode { id, index })
    }

    /// An empty array or an empty object.
    pub fn is_empty_container(&self) -> bool {
        match self.value() {
            Value::Array(items) => items.is_empty(),
            Value::Object(members) => members.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Debug for JsonNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonNode")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("key", &self.key())
            .field("position", &self.position())
            .field("sibling_count", &self.sibling_count())
            .finish()
    }
}

impl PartialEq for JsonNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.index, other.index)
    }
}
impl Eq for JsonNode<'_> {}

impl PartialOrd for JsonNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for JsonNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for JsonNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
