//! Structural rewrites of functions.
//!
//! Unless stated otherwise, each transform builds a fresh graph and leaves its input untouched.
//! Sharing is preserved: every distinct node of the input is rewritten once.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use super::traverse::fold;
use crate::{BoolError, BoolNode, BoolNodeRef, GateKind, Inputs, Result};

/// Left-associated chain of binary gates over at least three arguments.
///
/// Negated kinds chain their positive counterpart, only the last link is negated:
/// NAND(a, b, c) gives NAND(AND(a, b), c).
fn binary_chain(kind: GateKind, args: Vec<BoolNodeRef>) -> Result<BoolNodeRef> {
    let last = args.len() - 1;
    let mut args = args.into_iter().enumerate();
    let mut acc = match args.next() {
        Some((_, first)) => first,
        None => {
            return Err(BoolError::InvalidState(
                "cannot chain an empty gate".to_string(),
            ));
        }
    };
    for (i, arg) in args {
        let link = if i == last { kind } else { kind.positive() };
        acc = BoolNodeRef::gate(link, [acc, arg])?;
    }
    Ok(acc)
}

fn owned(children: &[&BoolNodeRef]) -> Vec<BoolNodeRef> {
    children.iter().map(|&c| c.clone()).collect()
}

impl BoolNodeRef {
    /// Rewrites every gate with more than two children into a chain of binary gates.
    ///
    /// Every gate of the result has at most two children. Gates with 0, 1 or 2 children
    /// are copied as they are.
    pub fn binarize(&self) -> Result<BoolNodeRef> {
        let res = fold(self, |node, children: &[&BoolNodeRef]| {
            let n = node.borrow();
            match n.kind() {
                Some(kind) if children.len() > 2 => binary_chain(kind, owned(children)),
                _ => BoolNodeRef::new(n.with_args(owned(children))),
            }
        })?;
        debug!(
            "binarized function: {} nodes -> {} nodes",
            self.num_nodes(),
            res.num_nodes()
        );
        Ok(res)
    }

    /// Replaces every variable leaf whose index is mapped by `substitution` with the mapped
    /// function.
    ///
    /// Mapped functions are referenced, not copied: all the leaves of index `i` point to the
    /// same `substitution[i]`, which keeps repeated self-composition linear in size.
    /// Unmapped leaves and constants become fresh leaves.
    ///
    /// ```rust
    /// use boolfn::BoolNodeRef;
    /// use std::collections::HashMap;
    /// let f = BoolNodeRef::var(0);
    /// let g = BoolNodeRef::and([BoolNodeRef::var(1), BoolNodeRef::var(2)]);
    /// let h = f.compose(&HashMap::from([(0usize, g.clone())])).unwrap();
    /// assert_eq!(h, g);
    /// ```
    pub fn compose<M>(&self, substitution: &M) -> Result<BoolNodeRef>
    where
        M: Inputs<BoolNodeRef> + ?Sized,
    {
        fold(self, |node, children: &[&BoolNodeRef]| {
            let n = node.borrow();
            if let BoolNode::Var(index) = *n {
                if let Some(mapped) = substitution.input(index) {
                    return Ok(mapped);
                }
            }
            BoolNodeRef::new(n.with_args(owned(children)))
        })
    }

    /// A shallow local simplification pass.
    ///
    /// - XOR, AND and OR gates with a single child are replaced by that child;
    /// - NAND, NOR and XNOR gates with a single child become NOT of that child;
    /// - a child XOR, AND or OR gate of the same kind as its parent is merged into it,
    ///   unless it is shared (merging it would duplicate its children in every parent)
    ///   or the parent has an arity limit.
    ///
    /// Always returns a fresh graph.
    pub fn merge_redundant(&self) -> Result<BoolNodeRef> {
        let subfunctions: HashSet<BoolNodeRef> = self.subfunctions().into_iter().collect();
        // Results of shared nodes, which must not be merged into their parents.
        let mut shared_results: HashSet<BoolNodeRef> = HashSet::new();

        let res = fold(self, |node, children: &[&BoolNodeRef]| {
            let n = node.borrow();
            let new_node = match (n.kind(), children) {
                (None, _) => BoolNodeRef::new(n.with_args(Vec::new()))?,
                (Some(kind), [only]) if kind.is_associative() => (*only).clone(),
                (Some(kind), [only]) if kind != GateKind::Not => {
                    BoolNodeRef::not((*only).clone())
                }
                (Some(kind), _) if kind.is_associative() && n_has_no_limit(&n) => {
                    let mut args = Vec::with_capacity(children.len());
                    for &child in children {
                        let mergeable = child.kind() == Some(kind)
                            && child.arg_limit().is_none()
                            && !shared_results.contains(child);
                        if mergeable {
                            args.extend(child.args());
                        } else {
                            args.push(child.clone());
                        }
                    }
                    BoolNodeRef::gate(kind, args)?
                }
                _ => BoolNodeRef::new(n.with_args(owned(children)))?,
            };
            if subfunctions.contains(node) {
                shared_results.insert(new_node.clone());
            }
            Ok(new_node)
        })?;
        debug!(
            "merged redundant gates: {} nodes -> {} nodes",
            self.num_nodes(),
            res.num_nodes()
        );
        Ok(res)
    }

    /// The function to mutate: itself when working in place, else a deep clone.
    fn rewrite_target(&self, in_place: bool) -> Result<BoolNodeRef> {
        if in_place {
            Ok(self.clone())
        } else {
            self.deep_clone()
        }
    }

    /// Renames variables: leaf `i` becomes leaf `index_map[i]` when `i` is mapped.
    ///
    /// With `in_place`, the leaves are mutated, which is visible to every function sharing them.
    pub fn remap_indices<M>(&self, index_map: &M, in_place: bool) -> Result<BoolNodeRef>
    where
        M: Inputs<usize> + ?Sized,
    {
        let target = self.rewrite_target(in_place)?;
        for leaf in target.inputs() {
            let new_index = leaf.index().and_then(|i| index_map.input(i));
            if let Some(new_index) = new_index {
                leaf.replace(BoolNode::Var(new_index))?;
            }
        }
        Ok(target)
    }

    /// Adds `shift` to every variable index.
    ///
    /// Fails before modifying anything if an index would become negative or overflow.
    pub fn shift_indices(&self, shift: isize, in_place: bool) -> Result<BoolNodeRef> {
        let mut index_map = BTreeMap::new();
        for index in self.idxs_used() {
            let shifted = index
                .checked_add_signed(shift)
                .ok_or(BoolError::IndexOverflow { index, shift })?;
            index_map.insert(index, shifted);
        }
        self.remap_indices(&index_map, in_place)
    }

    /// Renames the variables to `0..k`, keeping their order, where `k` is the number of
    /// distinct variables.
    pub fn condense_idxs(&self, in_place: bool) -> Result<BoolNodeRef> {
        let index_map: BTreeMap<usize, usize> = self
            .idxs_used()
            .into_iter()
            .enumerate()
            .map(|(new, old)| (old, new))
            .collect();
        self.remap_indices(&index_map, in_place)
    }

    /// Replaces the value `c` of every constant leaf with `const_map[c]` when `c` is mapped.
    pub fn remap_constants(
        &self,
        const_map: &HashMap<bool, bool>,
        in_place: bool,
    ) -> Result<BoolNodeRef> {
        let target = self.rewrite_target(in_place)?;
        for leaf in target.inputs() {
            let new_value = leaf.value().and_then(|v| const_map.get(&v).copied());
            if let Some(new_value) = new_value {
                leaf.replace(BoolNode::Const(new_value))?;
            }
        }
        Ok(target)
    }
}

fn n_has_no_limit(node: &BoolNode) -> bool {
    matches!(node, BoolNode::Gate { arg_limit: None, .. })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeSet;
    use test_log::test;

    fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
        (0..1u32 << n).map(move |bits| (0..n).map(|i| bits >> i & 1 == 1).collect())
    }

    fn equivalent(f: &BoolNodeRef, g: &BoolNodeRef, n: usize) -> bool {
        assignments(n).all(|state| {
            f.eval::<bool, _>(&state).unwrap() == g.eval::<bool, _>(&state).unwrap()
        })
    }

    fn vars(n: usize) -> Vec<BoolNodeRef> {
        (0..n).map(BoolNodeRef::var).collect()
    }

    #[test]
    fn binarize_test() {
        for kind in GateKind::ALL {
            if kind == GateKind::Not {
                continue;
            }
            let f = BoolNodeRef::gate(kind, vars(5)).unwrap();
            let g = f.binarize().unwrap();
            assert!(g.post_order().iter().all(|n| n.arity() <= 2));
            assert!(equivalent(&f, &g, 5));
            assert_eq!(g.kind(), Some(kind));
            // 4 binary gates and 5 variables
            assert_eq!(g.num_nodes(), 9);
        }
    }

    #[test]
    fn binarize_chain_shape_test() {
        let f = BoolNodeRef::nand(vars(3));
        let g = f.binarize().unwrap();
        assert_eq!(g.dense_str(), "NAND(AND(VAR(0),VAR(1)),VAR(2))");
    }

    #[test]
    fn binarize_binary_test() {
        let f = BoolNodeRef::xor([
            BoolNodeRef::var(0),
            BoolNodeRef::and([BoolNodeRef::var(1), BoolNodeRef::var(2)]),
        ]);
        let g = f.binarize().unwrap();
        assert!(f.same_structure(&g));
        assert_ne!(f, g);
    }

    #[test]
    fn binarize_keeps_sharing_test() {
        let shared = BoolNodeRef::or(vars(4));
        let f = BoolNodeRef::and([shared.clone(), shared.clone(), shared]);
        let g = f.binarize().unwrap();
        // OR chain of 3 gates, AND chain of 2 gates, 4 variables
        assert_eq!(g.num_nodes(), 9);
        assert!(equivalent(&f, &g, 4));
    }

    #[test]
    fn compose_test() {
        let f = BoolNodeRef::var(0);
        let g = BoolNodeRef::and([BoolNodeRef::var(1), BoolNodeRef::var(2)]);
        let h = f.compose(&HashMap::from([(0usize, g.clone())])).unwrap();
        assert!(equivalent(&h, &g, 3));
    }

    #[test]
    fn compose_identity_test() {
        let f = BoolNodeRef::or([
            BoolNodeRef::xnor(vars(2)),
            BoolNodeRef::not(BoolNodeRef::var(2)),
            BoolNodeRef::constant(true),
        ]);
        let identity: Vec<BoolNodeRef> = vars(3);
        let g = f.compose(&identity).unwrap();
        assert!(equivalent(&f, &g, 3));
        assert!(f.same_structure(&g));
    }

    #[test]
    fn compose_unroll_test() {
        // Feedback x0 <- x1 ^ (x0 & x2), unrolled over 40 steps with linear size
        let step = BoolNodeRef::xor([
            BoolNodeRef::var(1),
            BoolNodeRef::and([BoolNodeRef::var(0), BoolNodeRef::var(2)]),
        ]);
        let mut f = step.clone();
        for _ in 0..40 {
            let substitution = HashMap::from([(0usize, f.clone())]);
            f = step.compose(&substitution).unwrap();
        }
        assert_eq!(f.idxs_used(), BTreeSet::from([0, 1, 2]));
        assert!(f.num_nodes() < 41 * 5);
        // With x1 = x2 = 1, each step negates x0
        let mut expected = false;
        for _ in 0..41 {
            expected = !expected;
        }
        assert_eq!(f.eval::<bool, _>(&[false, true, true]).unwrap(), expected);
    }

    #[test]
    fn merge_redundant_test() {
        let x = vars(4);
        let f = BoolNodeRef::xor([
            BoolNodeRef::xor([x[0].clone(), x[1].clone()]),
            BoolNodeRef::and([x[2].clone()]),
            BoolNodeRef::nor([x[3].clone()]),
        ]);
        let g = f.merge_redundant().unwrap();
        assert_eq!(g.dense_str(), "XOR(VAR(0),VAR(1),VAR(2),NOT(VAR(3)))");
        assert!(equivalent(&f, &g, 4));
        // Input untouched
        assert_eq!(f.arity(), 3);
    }

    #[test]
    fn merge_redundant_shared_test() {
        let x = vars(3);
        let shared = BoolNodeRef::and([x[0].clone(), x[1].clone()]);
        let f = BoolNodeRef::and([
            shared.clone(),
            BoolNodeRef::or([shared, BoolNodeRef::and([x[2].clone(), x[0].clone()])]),
        ]);
        let g = f.merge_redundant().unwrap();
        assert_eq!(g.arity(), 2);
        assert_eq!(g.subfunctions().len(), 1);
        assert!(equivalent(&f, &g, 3));
    }

    #[test]
    fn remap_indices_test() {
        let f = BoolNodeRef::xor([BoolNodeRef::var(0), BoolNodeRef::var(3)]);
        let g = f
            .remap_indices(&HashMap::from([(3usize, 7usize)]), false)
            .unwrap();
        assert_eq!(g.idxs_used(), BTreeSet::from([0, 7]));
        assert_eq!(f.idxs_used(), BTreeSet::from([0, 3]));

        let h = f.remap_indices(&[5usize, 6, 7, 8], true).unwrap();
        assert_eq!(h, f);
        assert_eq!(f.idxs_used(), BTreeSet::from([5, 8]));
    }

    #[test]
    fn shift_and_condense_test() {
        let f = BoolNodeRef::and([BoolNodeRef::var(4), BoolNodeRef::var(9)]);
        let g = f.shift_indices(3, false).unwrap();
        assert_eq!(g.idxs_used(), BTreeSet::from([7, 12]));
        assert!(matches!(
            f.shift_indices(-5, true),
            Err(BoolError::IndexOverflow { index: 4, shift: -5 })
        ));
        // Nothing was modified by the failed shift
        assert_eq!(f.idxs_used(), BTreeSet::from([4, 9]));

        let h = g.condense_idxs(false).unwrap();
        assert_eq!(h.dense_str(), "AND(VAR(0),VAR(1))");
    }

    #[test]
    fn remap_constants_test() {
        let f = BoolNodeRef::or([BoolNodeRef::constant(false), BoolNodeRef::var(0)]);
        let g = f
            .remap_constants(&HashMap::from([(false, true)]), false)
            .unwrap();
        assert_eq!(g.dense_str(), "OR(CONST(1),VAR(0))");
        assert_eq!(f.dense_str(), "OR(CONST(0),VAR(0))");
    }
}
