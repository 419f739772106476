use log::debug;

use super::traverse::fold;
use crate::{BoolNodeRef, Result};

impl BoolNodeRef {
    /// Performs a real clone of the function.
    ///
    /// We are not just incrementing reference counters, but instead creating
    /// brand new nodes, completely unrelated with the previous function.
    /// Sharing is preserved: a node reachable through several parents is copied once,
    /// and the new parents reference the same copy.
    pub fn deep_clone(&self) -> Result<Self> {
        let copy = fold(self, |node, children: &[&BoolNodeRef]| {
            let new_args = children.iter().map(|&c| c.clone()).collect();
            BoolNodeRef::new(node.borrow().with_args(new_args))
        })?;
        debug!("deep cloned function with {} nodes", copy.num_nodes());
        Ok(copy)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use test_log::test;

    #[test]
    fn deep_clone_test() {
        let x = BoolNodeRef::var(0);
        let shared = BoolNodeRef::and([x.clone(), BoolNodeRef::constant(true)]);
        let f = BoolNodeRef::xor([shared.clone(), BoolNodeRef::not(shared.clone())]);
        let g = f.deep_clone().unwrap();

        assert!(f.same_structure(&g));
        let old: HashSet<BoolNodeRef> = f.post_order().into_iter().collect();
        assert!(g.post_order().iter().all(|n| !old.contains(n)));

        // Still shared in the copy
        assert_eq!(g.num_nodes(), f.num_nodes());
        assert_eq!(g.subfunctions().len(), 1);

        // Mutating the copy leaves the original untouched
        g.args()[0].add_args([BoolNodeRef::var(1)]).unwrap();
        assert_eq!(shared.arity(), 2);
        assert_eq!(g.args()[1].args()[0].arity(), 3);
    }

    #[test]
    fn deep_clone_keeps_arg_limit_test() {
        let f = BoolNodeRef::gate_with_limit(
            crate::GateKind::Or,
            [BoolNodeRef::var(0)],
            Some(2),
        )
        .unwrap();
        let g = f.deep_clone().unwrap();
        assert_eq!(g.arg_limit(), Some(2));
    }
}
