//! You can also export functions to the Graphviz dot format using [`BoolNodeRef::to_dot`].
//!
//! ```rust
//! use boolfn::BoolNodeRef;
//! use boolfn::dot::GraphvizStyle;
//!
//! let x = BoolNodeRef::var(0);
//! let f = BoolNodeRef::nand([x.clone(), BoolNodeRef::not(x)]);
//! println!("{}", f.to_dot(&GraphvizStyle::default()));
//! ```
//!
//! You can then render the graphs using the DOT engine.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    ops::Add,
};

use crate::{BoolNode, BoolNodeRef, GateKind, traverse::PostOrder};

// Definining default global style.
const DEFAULT_RANKDIR: &str = "BT";

// Defining default style for nodes.
const DEFAULT_VAR_NODE_FORMAT: &str = "[shape=box]";
const DEFAULT_CONST_NODE_FORMAT: &str = "[shape=plaintext]";
const DEFAULT_XOR_NODE_FORMAT: &str = "[shape=circle, label=\"⊕\"]";
const DEFAULT_AND_NODE_FORMAT: &str = "[shape=circle, label=\"∧\"]";
const DEFAULT_OR_NODE_FORMAT: &str = "[shape=circle, label=\"∨\"]";
const DEFAULT_NAND_NODE_FORMAT: &str = "[shape=doublecircle, label=\"∧\"]";
const DEFAULT_NOR_NODE_FORMAT: &str = "[shape=doublecircle, label=\"∨\"]";
const DEFAULT_XNOR_NODE_FORMAT: &str = "[shape=doublecircle, label=\"⊕\"]";
const DEFAULT_NOT_NODE_FORMAT: &str = "[shape=invtriangle, label=\"¬\"]";
/// See https://stackoverflow.com/questions/50822798/how-to-use-graphviz-to-draw-a-node-pointed-by-an-arrow.
const DEFAULT_OUTPUT_NODE_FORMAT: &str = "[shape=none, height=.0, width=.0, label=\"f\"]";

// Defining default style for edges.
const DEFAULT_EDGE_ALL_FORMAT: &str = "[arrowsize=0.3]";
const DEFAULT_EDGE_SHARED_FORMAT: &str = "[style=bold]";
const DEFAULT_EDGE_OUTPUT_FORMAT: &str = "[arrowhead=none]";

/// String containing the graphviz node style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of nodes can be described.
#[derive(Debug, Clone)]
pub struct GraphvizNodeStyle(String);

impl GraphvizNodeStyle {
    pub fn new(style: &str) -> Self {
        GraphvizNodeStyle(style.to_string())
    }
}

impl Display for GraphvizNodeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String containing the graphviz edge style (you must manually include square brackets).
///
/// See [`GraphvizStyle`] for what kind of edges can be described.
#[derive(Debug, Clone)]
pub struct GraphvizEdgeStyle(String);

impl GraphvizEdgeStyle {
    pub fn new(style: &str) -> Self {
        GraphvizEdgeStyle(style.to_string())
    }
}

impl Display for GraphvizEdgeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for GraphvizEdgeStyle {
    fn default() -> Self {
        GraphvizEdgeStyle("".to_string())
    }
}

impl Add for GraphvizEdgeStyle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        GraphvizEdgeStyle(format!("{}{}", self.0, rhs.0))
    }
}

/// Parameters for Graphviz rendering.
///
/// ### Global parameters
/// - `rankdir`
///
/// ### Nodes
/// The following nodes can be rendered using [`GraphvizNodeStyle`]:
/// - [`BoolNode::Var`] (labelled with its index)
/// - [`BoolNode::Const`] (labelled 0 or 1)
/// - one style per [`GateKind`]
/// - output (by default, invisible node just to get an arrow).
///
/// ### Edges
/// Edge styles are additive. All edges implement the `edge_all` style. To that can be added:
/// - `edge_shared` if the edge leaves a gate with several parents
/// - `edge_output` if the edge is directed to the output.
#[derive(Debug, Clone)]
pub struct GraphvizStyle {
    // Global
    pub rankdir: String,

    // Nodes
    pub var: GraphvizNodeStyle,
    pub constant: GraphvizNodeStyle,
    pub xor: GraphvizNodeStyle,
    pub and: GraphvizNodeStyle,
    pub or: GraphvizNodeStyle,
    pub nand: GraphvizNodeStyle,
    pub nor: GraphvizNodeStyle,
    pub xnor: GraphvizNodeStyle,
    pub not: GraphvizNodeStyle,
    pub output: GraphvizNodeStyle,

    // Edges
    pub edge_all: GraphvizEdgeStyle,
    pub edge_shared: GraphvizEdgeStyle,
    pub edge_output: GraphvizEdgeStyle,
}

impl Default for GraphvizStyle {
    fn default() -> Self {
        GraphvizStyle {
            rankdir: DEFAULT_RANKDIR.to_string(),

            var: GraphvizNodeStyle::new(DEFAULT_VAR_NODE_FORMAT),
            constant: GraphvizNodeStyle::new(DEFAULT_CONST_NODE_FORMAT),
            xor: GraphvizNodeStyle::new(DEFAULT_XOR_NODE_FORMAT),
            and: GraphvizNodeStyle::new(DEFAULT_AND_NODE_FORMAT),
            or: GraphvizNodeStyle::new(DEFAULT_OR_NODE_FORMAT),
            nand: GraphvizNodeStyle::new(DEFAULT_NAND_NODE_FORMAT),
            nor: GraphvizNodeStyle::new(DEFAULT_NOR_NODE_FORMAT),
            xnor: GraphvizNodeStyle::new(DEFAULT_XNOR_NODE_FORMAT),
            not: GraphvizNodeStyle::new(DEFAULT_NOT_NODE_FORMAT),
            output: GraphvizNodeStyle::new(DEFAULT_OUTPUT_NODE_FORMAT),

            edge_all: GraphvizEdgeStyle::new(DEFAULT_EDGE_ALL_FORMAT),
            edge_shared: GraphvizEdgeStyle::new(DEFAULT_EDGE_SHARED_FORMAT),
            edge_output: GraphvizEdgeStyle::new(DEFAULT_EDGE_OUTPUT_FORMAT),
        }
    }
}

impl GraphvizStyle {
    fn gate(&self, kind: GateKind) -> &GraphvizNodeStyle {
        match kind {
            GateKind::Xor => &self.xor,
            GateKind::And => &self.and,
            GateKind::Or => &self.or,
            GateKind::Nand => &self.nand,
            GateKind::Nor => &self.nor,
            GateKind::Xnor => &self.xnor,
            GateKind::Not => &self.not,
        }
    }
}

impl GraphvizStyle {
    fn edge(&self, from_shared: bool, to_output: bool) -> GraphvizEdgeStyle {
        let mut style = GraphvizEdgeStyle::default();
        if from_shared {
            style = style + self.edge_shared.clone();
        }
        if to_output {
            style = style + self.edge_output.clone();
        }
        style
    }
}

impl BoolNode {
    fn graphviz_decl(&self, graphviz_id: usize, graphviz_style: &GraphvizStyle) -> String {
        match self {
            BoolNode::Var(index) => {
                format!("n{} {} [label=\"x{}\"]\n", graphviz_id, graphviz_style.var, index)
            }
            BoolNode::Const(value) => format!(
                "n{} {} [label=\"{}\"]\n",
                graphviz_id, graphviz_style.constant, *value as u8
            ),
            BoolNode::Gate { kind, .. } => {
                format!("n{} {}\n", graphviz_id, graphviz_style.gate(*kind))
            }
        }
    }
}

impl BoolNodeRef {
    /// Returns a DOT representation of the function.
    ///
    /// Nodes are numbered in post-order, so the output is stable for a given graph.
    /// The graph is strict: a child used twice by the same gate is drawn with a single edge.
    pub fn to_dot(&self, graphviz_style: &GraphvizStyle) -> String {
        let mut decl_nodes = String::new();
        let mut decl_edges = String::new();
        let mut ids = HashMap::new();
        let shared: HashSet<BoolNodeRef> = self.subfunctions().into_iter().collect();

        for (graphviz_id, node) in PostOrder::from_node(self).enumerate() {
            decl_nodes.push_str(&node.borrow().graphviz_decl(graphviz_id, graphviz_style));
            for child in node.args() {
                // Children are always numbered before their parents
                if let Some(child_id) = ids.get(&child) {
                    let style = graphviz_style.edge(shared.contains(&child), false);
                    decl_edges.push_str(&format!("n{} -> n{} {}\n", child_id, graphviz_id, style));
                }
            }
            ids.insert(node, graphviz_id);
        }

        let root_id = ids.get(self).copied().unwrap_or_default();
        decl_edges.push_str(&format!(
            "n{} -> output {}\n",
            root_id,
            graphviz_style.edge(false, true)
        ));

        // Concatenating everything together
        format!(
            "
strict digraph {{
    rankdir=\"{}\"
    edge {}
    output {}
    {}
    {}
}}",
            graphviz_style.rankdir,
            graphviz_style.edge_all,
            graphviz_style.output,
            decl_nodes,
            decl_edges
        )
    }
}
