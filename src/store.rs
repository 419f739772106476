//! Storing functions as JSON.
//!
//! Several functions are stored together as one [`StoredGraph`], so the nodes they share
//! are written once and shared again when loaded:
//!
//! ```json
//! {
//!   "Return IDs": [2],
//!   "Node Data": [
//!     {"class": "VAR", "data": {"args": [], "arg_limit": null, "index": 0}},
//!     {"class": "CONST", "data": {"args": [], "arg_limit": null, "value": 1}},
//!     {"class": "XOR", "data": {"args": [0, 1], "arg_limit": null}}
//!   ]
//! }
//! ```
//!
//! Records are numbered in post-order: the children of a record always come before it.
//!
//! ```rust
//! use boolfn::{BoolNodeRef, store};
//! let x = BoolNodeRef::var(0);
//! let f = BoolNodeRef::and([x.clone(), BoolNodeRef::not(x.clone())]);
//! let g = BoolNodeRef::or([x, f.clone()]);
//!
//! let json = store::to_json(&[f, g]).unwrap();
//! let loaded = store::from_json(&json).unwrap();
//! // f is still a child of g
//! assert_eq!(loaded[1].args()[1], loaded[0]);
//! ```

use std::{collections::HashMap, fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{BoolError, BoolNode, BoolNodeRef, GateKind, Result, StoreError, traverse::PostOrder};

/// A set of functions flattened into records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGraph {
    /// Record of each stored function, in the order they were given.
    #[serde(rename = "Return IDs")]
    pub return_ids: Vec<usize>,
    #[serde(rename = "Node Data")]
    pub node_data: Vec<NodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// `VAR`, `CONST` or the name of a gate kind.
    pub class: String,
    pub data: RecordData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    /// Record ids of the children.
    #[serde(default)]
    pub args: Vec<usize>,
    #[serde(default)]
    pub arg_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StoredConstant>,
}

/// Constants are written as 0 or 1, booleans are accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredConstant {
    Bool(bool),
    Int(u64),
}

impl StoredConstant {
    fn to_bool(self, record: usize) -> std::result::Result<bool, StoreError> {
        match self {
            StoredConstant::Bool(value) => Ok(value),
            StoredConstant::Int(0) => Ok(false),
            StoredConstant::Int(1) => Ok(true),
            StoredConstant::Int(value) => Err(StoreError::InvalidConstant { record, value }),
        }
    }
}

impl NodeRecord {
    fn new(node: &BoolNode, args: Vec<usize>) -> Self {
        let (arg_limit, index, value) = match node {
            BoolNode::Var(index) => (None, Some(*index), None),
            BoolNode::Const(value) => (None, None, Some(StoredConstant::Int(*value as u64))),
            BoolNode::Gate { arg_limit, .. } => (*arg_limit, None, None),
        };
        NodeRecord {
            class: node.type_name().to_string(),
            data: RecordData {
                args,
                arg_limit,
                index,
                value,
            },
        }
    }

    /// Rebuilds the node of record `id` from the nodes of the records before it.
    fn load(&self, id: usize, loaded: &[BoolNodeRef]) -> Result<BoolNodeRef> {
        let args = self
            .data
            .args
            .iter()
            .map(|&child| {
                loaded
                    .get(child)
                    .cloned()
                    .ok_or(StoreError::DanglingChild { node: id, child })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let missing = |field| StoreError::MissingField {
            record: id,
            class: self.class.clone(),
            field,
        };

        match self.class.as_str() {
            "VAR" => Ok(BoolNodeRef::var(self.data.index.ok_or_else(|| missing("index"))?)),
            "CONST" => {
                let value = self.data.value.ok_or_else(|| missing("value"))?;
                Ok(BoolNodeRef::constant(value.to_bool(id)?))
            }
            class => match GateKind::from_name(class) {
                Some(kind) => BoolNodeRef::gate_with_limit(kind, args, self.data.arg_limit),
                None => Err(StoreError::UnknownNodeType(class.to_string()).into()),
            },
        }
    }
}

/// Flattens `roots` into a single graph, shared nodes are stored once.
pub fn store(roots: &[BoolNodeRef]) -> Result<StoredGraph> {
    let mut ids: HashMap<BoolNodeRef, usize> = HashMap::new();
    let mut node_data = Vec::new();

    for node in PostOrder::from_roots(roots) {
        let args = node
            .args()
            .iter()
            .map(|child| ids.get(child).copied())
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| {
                BoolError::InvalidState("a child was not stored before its parent".to_string())
            })?;
        node_data.push(NodeRecord::new(&node.borrow(), args));
        ids.insert(node, node_data.len() - 1);
    }

    let return_ids = roots
        .iter()
        .map(|root| ids.get(root).copied())
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| BoolError::InvalidState("a root was never stored".to_string()))?;
    debug!(
        "stored {} functions in {} records",
        return_ids.len(),
        node_data.len()
    );
    Ok(StoredGraph {
        return_ids,
        node_data,
    })
}

/// Rebuilds the stored functions, in the order of the return ids.
pub fn load(graph: &StoredGraph) -> Result<Vec<BoolNodeRef>> {
    let mut loaded: Vec<BoolNodeRef> = Vec::with_capacity(graph.node_data.len());
    for (id, record) in graph.node_data.iter().enumerate() {
        let node = record.load(id, &loaded)?;
        loaded.push(node);
    }
    debug!("loaded {} records", loaded.len());

    graph
        .return_ids
        .iter()
        .map(|&id| {
            loaded
                .get(id)
                .cloned()
                .ok_or_else(|| BoolError::from(StoreError::UnknownRoot(id)))
        })
        .collect()
}

pub fn to_json(roots: &[BoolNodeRef]) -> Result<String> {
    let graph = store(roots)?;
    let json = serde_json::to_string_pretty(&graph).map_err(StoreError::from)?;
    Ok(json)
}

pub fn from_json(json: &str) -> Result<Vec<BoolNodeRef>> {
    let graph: StoredGraph = serde_json::from_str(json).map_err(StoreError::from)?;
    load(&graph)
}

pub fn to_file<P: AsRef<Path>>(roots: &[BoolNodeRef], path: P) -> Result<()> {
    let json = to_json(roots)?;
    fs::write(path, json).map_err(StoreError::from)?;
    Ok(())
}

pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<BoolNodeRef>> {
    let json = fs::read_to_string(path).map_err(StoreError::from)?;
    from_json(&json)
}

fn single(mut functions: Vec<BoolNodeRef>) -> Result<BoolNodeRef> {
    if functions.is_empty() {
        return Err(StoreError::UnknownRoot(0).into());
    }
    Ok(functions.swap_remove(0))
}

impl BoolNodeRef {
    /// Stores this function alone, see [`store::to_json`](crate::store::to_json).
    pub fn to_json(&self) -> Result<String> {
        to_json(std::slice::from_ref(self))
    }

    /// Loads the first function of a document.
    pub fn from_json(json: &str) -> Result<BoolNodeRef> {
        single(from_json(json)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        to_file(std::slice::from_ref(self), path)
    }

    /// Loads the first function of a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BoolNodeRef> {
        single(from_file(path)?)
    }
}
