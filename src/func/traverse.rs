//! Post-order traversal of function DAGs.
//!
//! [`PostOrder`] yields each distinct node exactly once, after all its children.
//! [`fold`] builds on it to compute one value per node from the values of its children,
//! which is how every transformation, evaluator and encoder of this crate is written.
//!
//! Both use an explicit stack: the depth of a function is only bounded by memory.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::trace;

use crate::{BoolError, BoolNode, BoolNodeRef, Result};

/// A post-order visitor over one or several roots.
///
/// Example:
///
/// ```rust
/// use boolfn::{BoolNodeRef, traverse::PostOrder};
/// let x = BoolNodeRef::var(0);
/// let f = &(&x & &x) ^ &x;
/// let order: Vec<BoolNodeRef> = PostOrder::from_node(&f).collect();
/// assert_eq!(order.len(), 3);
/// assert_eq!(order[0], x);
/// assert_eq!(order[2], f);
/// ```
///
/// The walk assumes the graph is acyclic, use [`BoolNodeRef::check_integrity`] on untrusted graphs.
pub struct PostOrder {
    /// A node is pushed with `false` when discovered, and again with `true` once
    /// its children have been pushed: popping it the second time means they are all done.
    stack: Vec<(BoolNodeRef, bool)>,
    seen: HashSet<BoolNodeRef>,
}

impl PostOrder {
    pub fn from_node(root: &BoolNodeRef) -> Self {
        PostOrder {
            stack: vec![(root.clone(), false)],
            seen: HashSet::new(),
        }
    }

    /// Visits the roots one after the other, nodes shared between roots are yielded once.
    pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a BoolNodeRef>) -> Self {
        let mut stack: Vec<(BoolNodeRef, bool)> =
            roots.into_iter().map(|root| (root.clone(), false)).collect();
        stack.reverse();
        PostOrder {
            stack,
            seen: HashSet::new(),
        }
    }
}

impl Iterator for PostOrder {
    type Item = BoolNodeRef;

    fn next(&mut self) -> Option<BoolNodeRef> {
        while let Some((node, last_time)) = self.stack.pop() {
            if last_time {
                return Some(node);
            }
            if !self.seen.insert(node.clone()) {
                continue;
            }
            self.stack.push((node.clone(), true));
            for child in node.args().into_iter().rev() {
                if !self.seen.contains(&child) {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

/// Computes a value for every node reachable from `root`, children first, and returns
/// the value of the root.
///
/// `combine` receives the node and the values of its children, in argument order
/// (a child appearing twice gets its value twice). It is called once per distinct node.
pub fn fold<T, F>(root: &BoolNodeRef, mut combine: F) -> Result<T>
where
    F: FnMut(&BoolNodeRef, &[&T]) -> Result<T>,
{
    let mut values: HashMap<BoolNodeRef, T> = HashMap::new();
    for node in PostOrder::from_node(root) {
        let value = {
            let args = node.args();
            let inputs = args
                .iter()
                .map(|arg| values.get(arg))
                .collect::<Option<Vec<&T>>>()
                .ok_or_else(|| {
                    BoolError::InvalidState(
                        "a child was not computed before its parent".to_string(),
                    )
                })?;
            combine(&node, &inputs)?
        };
        values.insert(node, value);
    }
    trace!("folded {} nodes", values.len());
    values
        .remove(root)
        .ok_or_else(|| BoolError::InvalidState("the root was never reached".to_string()))
}

impl BoolNodeRef {
    /// Distinct nodes of the function, every child before its parents, the root last.
    pub fn post_order(&self) -> Vec<BoolNodeRef> {
        PostOrder::from_node(self).collect()
    }

    /// Distinct leaves (VAR and CONST) of the function, in post-order.
    pub fn inputs(&self) -> Vec<BoolNodeRef> {
        PostOrder::from_node(self)
            .filter(|node| node.is_leaf())
            .collect()
    }

    /// Number of distinct nodes.
    pub fn num_nodes(&self) -> usize {
        PostOrder::from_node(self).count()
    }

    /// Number of distinct nodes per type tag (`VAR`, `CONST`, `XOR`, ...).
    pub fn component_count(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for node in PostOrder::from_node(self) {
            *counts.entry(node.borrow().type_name()).or_insert(0) += 1;
        }
        counts
    }

    /// Indices of the variables the function depends on.
    pub fn idxs_used(&self) -> BTreeSet<usize> {
        PostOrder::from_node(self)
            .filter_map(|node| node.index())
            .collect()
    }

    /// Largest variable index, [`None`] for a function without variables.
    pub fn max_idx(&self) -> Option<usize> {
        self.idxs_used().last().copied()
    }

    /// Number of argument slots referencing each node (a child listed twice counts twice).
    pub(crate) fn parent_slots(&self) -> HashMap<BoolNodeRef, usize> {
        let mut slots = HashMap::new();
        for node in PostOrder::from_node(self) {
            for child in node.args() {
                *slots.entry(child).or_insert(0) += 1;
            }
        }
        slots
    }

    /// Gates referenced by more than one argument slot, in topological order (children first).
    ///
    /// These are the nodes printed and emitted once and then referred to by name.
    pub fn subfunctions(&self) -> Vec<BoolNodeRef> {
        let slots = self.parent_slots();
        PostOrder::from_node(self)
            .filter(|node| {
                matches!(*node.borrow(), BoolNode::Gate { .. })
                    && slots.get(node).is_some_and(|&count| count > 1)
            })
            .collect()
    }
}
