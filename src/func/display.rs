use std::{collections::HashMap, fmt};

use super::traverse::fold;
use crate::{BoolNode, BoolNodeRef};

impl BoolNode {
    /// Rendering of a leaf, [`None`] for gates.
    fn leaf_str(&self) -> Option<String> {
        match self {
            BoolNode::Var(index) => Some(format!("VAR({})", index)),
            BoolNode::Const(value) => Some(format!("CONST({})", u8::from(*value))),
            BoolNode::Gate { .. } => None,
        }
    }
}

impl BoolNodeRef {
    /// Labels `(subfunction k)` of the shared gates, numbered from 1 in topological order.
    fn subfunction_labels(&self) -> HashMap<BoolNodeRef, String> {
        self.subfunctions()
            .into_iter()
            .enumerate()
            .map(|(i, node)| (node, format!("(subfunction {})", i + 1)))
            .collect()
    }

    /// One-line rendering, e.g. `XOR(VAR(0),AND(VAR(1),VAR(2)))`.
    ///
    /// Shared gates are abbreviated as `(subfunction k)` and not expanded, which keeps the
    /// output linear in the size of the DAG. Use [`BoolNodeRef::pretty_str`] to see them.
    pub fn dense_str(&self) -> String {
        let labels = self.subfunction_labels();
        let res = fold(self, |node, children: &[&String]| {
            if let Some(label) = labels.get(node) {
                return Ok(label.clone());
            }
            let n = node.borrow();
            Ok(match n.leaf_str() {
                Some(leaf) => leaf,
                None => format!(
                    "{}({})",
                    n.type_name(),
                    children
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<&str>>()
                        .join(",")
                ),
            })
        });
        res.unwrap_or_else(|e| format!("<{}>", e))
    }

    /// Multi-line rendering: one block per shared gate then one for the whole function,
    /// children indented under their gate.
    ///
    /// ```text
    /// (subfunction 1) = (
    ///    AND (
    ///    |   VAR(0)
    ///    |   VAR(1)
    ///    )
    /// )
    /// (main function) = (
    ///    XOR (
    ///    |   (subfunction 1)
    ///    |   (subfunction 1)
    ///    )
    /// )
    /// ```
    pub fn pretty_str(&self) -> String {
        let labels = self.subfunction_labels();
        let mut blocks: Vec<(String, Vec<String>)> = Vec::new();
        let res = fold(self, |node, children: &[&Vec<String>]| {
            let n = node.borrow();
            if let Some(leaf) = n.leaf_str() {
                return Ok(vec![leaf]);
            }
            let mut lines = vec![format!("{} (", n.type_name())];
            for (child, child_lines) in n.args().iter().zip(children) {
                match labels.get(child) {
                    Some(label) => lines.push(format!("|   {}", label)),
                    None => lines.extend(child_lines.iter().map(|l| format!("|   {}", l))),
                }
            }
            lines.push(")".to_string());
            if let Some(label) = labels.get(node) {
                blocks.push((label.clone(), lines.clone()));
            }
            Ok(lines)
        });
        let main_lines = match res {
            Ok(lines) => lines,
            Err(e) => return format!("<{}>", e),
        };
        blocks.push(("(main function)".to_string(), main_lines));

        let mut out = String::new();
        for (label, lines) in blocks {
            out.push_str(&format!("{} = (\n", label));
            for line in lines {
                out.push_str(&format!("   {}\n", line));
            }
            out.push_str(")\n");
        }
        out
    }
}

impl fmt::Display for BoolNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dense_str())
    }
}
