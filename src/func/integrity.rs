use std::collections::HashSet;

use crate::{BoolError, BoolNodeRef, Result};

impl BoolNodeRef {
    /// Checks that the function is well-formed:
    /// - no node is its own descendant;
    /// - NOT gates have exactly one child;
    /// - no gate holds more children than its arity limit.
    ///
    /// Algorithms assume these hold and do not check them. Mutating children with
    /// [`BoolNodeRef::add_args`] can introduce a cycle, call this after such rewrites
    /// if in doubt.
    pub fn check_integrity(&self) -> Result<()> {
        // Unlike the post-order of the traversal module, a node met again while
        // its children are still being visited is reported instead of skipped.
        let mut seen = HashSet::new();
        let mut done = HashSet::new();
        let mut stack: Vec<(BoolNodeRef, bool)> = vec![(self.clone(), false)];

        while let Some((node, last_time)) = stack.pop() {
            if last_time {
                done.insert(node);
                continue;
            }
            if done.contains(&node) {
                continue;
            } else if seen.contains(&node) {
                return Err(BoolError::Cycle);
            }

            node.borrow().check()?;
            seen.insert(node.clone());
            stack.push((node.clone(), true));
            for child in node.args() {
                if !done.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn check_integrity_test() {
        let x = BoolNodeRef::var(0);
        let shared = BoolNodeRef::and([x.clone(), x.clone()]);
        let f = BoolNodeRef::or([shared.clone(), BoolNodeRef::not(shared)]);
        assert!(f.check_integrity().is_ok());
        assert!(x.check_integrity().is_ok());
    }

    #[test]
    fn check_integrity_cycle_test() {
        let x = BoolNodeRef::var(0);
        let a = BoolNodeRef::and([x.clone()]);
        let b = BoolNodeRef::xor([a.clone()]);
        a.add_args([b.clone()]).unwrap();
        assert!(matches!(b.check_integrity(), Err(BoolError::Cycle)));

        // Break the cycle, otherwise the nodes keep each other alive
        a.remove_args(&[b.clone()]).unwrap();
        assert!(b.check_integrity().is_ok());
    }

    #[test]
    fn check_integrity_self_loop_test() {
        let a = BoolNodeRef::or(Vec::new());
        a.add_args([a.clone()]).unwrap();
        assert!(matches!(a.check_integrity(), Err(BoolError::Cycle)));
        a.remove_args(&[]).unwrap();
    }

    #[test]
    fn check_integrity_diamond_test() {
        // Diamonds are joins, not cycles
        let x = BoolNodeRef::var(0);
        let l = BoolNodeRef::not(x.clone());
        let r = BoolNodeRef::nand([x.clone(), l.clone()]);
        let f = BoolNodeRef::xnor([l, r, x]);
        assert!(f.check_integrity().is_ok());
    }
}
