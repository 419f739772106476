use std::{
    cell::{Ref, RefCell},
    fmt,
    hash::{Hash, Hasher},
    mem,
    ops::{BitAnd, BitOr, BitXor, Not},
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use super::{BoolError, Result};

/// The logical operation performed by a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    Xor,
    And,
    Or,
    Nand,
    Nor,
    Xnor,
    /// Unary negation. Always has exactly one child.
    Not,
}

impl GateKind {
    pub const ALL: [GateKind; 7] = [
        GateKind::Xor,
        GateKind::And,
        GateKind::Or,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xnor,
        GateKind::Not,
    ];

    /// The type tag used when printing and storing functions.
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Xor => "XOR",
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xnor => "XNOR",
            GateKind::Not => "NOT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        GateKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// NAND, NOR, XNOR and NOT negate the result of their positive counterpart.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            GateKind::Nand | GateKind::Nor | GateKind::Xnor | GateKind::Not
        )
    }

    /// XOR, AND and OR are associative, so nested gates of the same kind can be merged.
    pub fn is_associative(&self) -> bool {
        matches!(self, GateKind::Xor | GateKind::And | GateKind::Or)
    }

    /// The non-negated counterpart of a kind (NAND gives AND, ...).
    ///
    /// NOT has no binary counterpart and is returned as is.
    pub fn positive(&self) -> GateKind {
        match self {
            GateKind::Nand => GateKind::And,
            GateKind::Nor => GateKind::Or,
            GateKind::Xnor => GateKind::Xor,
            kind => *kind,
        }
    }

    /// Arity limit a gate of this kind gets when none is given.
    pub fn default_arg_limit(&self) -> Option<usize> {
        match self {
            GateKind::Not => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A node of a boolean function DAG.
#[derive(Debug, Clone)]
pub enum BoolNode {
    /// An input variable, identified by a non-negative index.
    Var(usize),
    /// A boolean constant.
    Const(bool),
    /// A gate over an ordered list of children.
    ///
    /// The same child may appear several times in `args`. `arg_limit` bounds the arity
    /// when new children are added.
    Gate {
        kind: GateKind,
        args: Vec<BoolNodeRef>,
        arg_limit: Option<usize>,
    },
}

impl BoolNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, BoolNode::Gate { .. })
    }

    pub fn is_var(&self) -> bool {
        matches!(self, BoolNode::Var(_))
    }

    pub fn is_const(&self) -> bool {
        matches!(self, BoolNode::Const(_))
    }

    pub fn kind(&self) -> Option<GateKind> {
        match self {
            BoolNode::Gate { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Children of the node, empty for leaves.
    pub fn args(&self) -> &[BoolNodeRef] {
        match self {
            BoolNode::Gate { args, .. } => args,
            _ => &[],
        }
    }

    /// Same node with other children. Leaves are copied as they are.
    pub(crate) fn with_args(&self, new_args: Vec<BoolNodeRef>) -> BoolNode {
        match self {
            BoolNode::Gate {
                kind, arg_limit, ..
            } => BoolNode::Gate {
                kind: *kind,
                args: new_args,
                arg_limit: *arg_limit,
            },
            leaf => leaf.clone(),
        }
    }

    /// The type tag of the node: `VAR`, `CONST` or the gate kind name.
    pub fn type_name(&self) -> &'static str {
        match self {
            BoolNode::Var(_) => "VAR",
            BoolNode::Const(_) => "CONST",
            BoolNode::Gate { kind, .. } => kind.name(),
        }
    }

    /// NOT holds exactly one child whatever limit it was built with.
    fn with_fixed_not_limit(mut self) -> BoolNode {
        if let BoolNode::Gate {
            kind: GateKind::Not,
            arg_limit,
            ..
        } = &mut self
        {
            *arg_limit = Some(1);
        }
        self
    }

    /// Checks the local structural rules of a node: NOT arity and arity limit.
    pub(crate) fn check(&self) -> Result<()> {
        if let BoolNode::Gate {
            kind,
            args,
            arg_limit,
        } = self
        {
            if *kind == GateKind::Not && args.len() != 1 {
                return Err(BoolError::NotArity(args.len()));
            }
            if let Some(limit) = arg_limit {
                if args.len() > *limit {
                    return Err(BoolError::ArgLimit {
                        limit: *limit,
                        requested: args.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A shared, mutable handle to a [`BoolNode`].
///
/// Cloning a handle is cheap and yields another reference to the same node: a function is
/// simply the handle of its root node, and mutating a node through any handle is visible
/// to every parent referencing it.
///
/// Equality and hashing are by identity, so handles can be used as keys for memoization.
/// Use [`BoolNodeRef::same_structure`] for a structural comparison.
pub struct BoolNodeRef(Rc<RefCell<BoolNode>>);

impl BoolNodeRef {
    /// Wraps a node after checking its structural rules.
    ///
    /// The arity limit of a NOT is always 1, a different one is ignored.
    pub fn new(node: BoolNode) -> Result<Self> {
        let node = node.with_fixed_not_limit();
        node.check()?;
        Ok(BoolNodeRef(Rc::new(RefCell::new(node))))
    }

    pub fn var(index: usize) -> Self {
        BoolNodeRef(Rc::new(RefCell::new(BoolNode::Var(index))))
    }

    pub fn constant(value: bool) -> Self {
        BoolNodeRef(Rc::new(RefCell::new(BoolNode::Const(value))))
    }

    /// Returns a new gate with the default arity limit of its kind.
    pub fn gate<I>(kind: GateKind, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = BoolNodeRef>,
    {
        Self::gate_with_limit(kind, args, kind.default_arg_limit())
    }

    /// Returns a new gate which will refuse to hold more than `arg_limit` children.
    pub fn gate_with_limit<I>(kind: GateKind, args: I, arg_limit: Option<usize>) -> Result<Self>
    where
        I: IntoIterator<Item = BoolNodeRef>,
    {
        BoolNodeRef::new(BoolNode::Gate {
            kind,
            args: args.into_iter().collect(),
            arg_limit,
        })
    }

    /// Only NOT has a default arity limit, so these cannot fail.
    fn unbounded(kind: GateKind, args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        BoolNodeRef(Rc::new(RefCell::new(BoolNode::Gate {
            kind,
            args: args.into_iter().collect(),
            arg_limit: None,
        })))
    }

    pub fn xor(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::Xor, args)
    }

    pub fn and(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::And, args)
    }

    pub fn or(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::Or, args)
    }

    pub fn nand(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::Nand, args)
    }

    pub fn nor(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::Nor, args)
    }

    pub fn xnor(args: impl IntoIterator<Item = BoolNodeRef>) -> Self {
        Self::unbounded(GateKind::Xnor, args)
    }

    /// Returns NOT(arg).
    pub fn not(arg: BoolNodeRef) -> Self {
        BoolNodeRef(Rc::new(RefCell::new(BoolNode::Gate {
            kind: GateKind::Not,
            args: vec![arg],
            arg_limit: Some(1),
        })))
    }

    /// Immutably borrows the node.
    ///
    /// Panics if the node is currently mutably borrowed, which only happens
    /// if you hold a [`BoolNodeRef::replace`] guard.
    pub fn borrow(&self) -> Ref<'_, BoolNode> {
        self.0.borrow()
    }

    /// Replaces the content of the node, returns the previous one.
    ///
    /// Every parent of this node sees the new content.
    pub fn replace(&self, node: BoolNode) -> Result<BoolNode> {
        let node = node.with_fixed_not_limit();
        node.check()?;
        Ok(self.0.replace(node))
    }

    pub fn is_leaf(&self) -> bool {
        self.borrow().is_leaf()
    }

    pub fn is_gate(&self) -> bool {
        !self.is_leaf()
    }

    pub fn kind(&self) -> Option<GateKind> {
        self.borrow().kind()
    }

    /// Index of a VAR leaf.
    pub fn index(&self) -> Option<usize> {
        match *self.borrow() {
            BoolNode::Var(index) => Some(index),
            _ => None,
        }
    }

    /// Value of a CONST leaf.
    pub fn value(&self) -> Option<bool> {
        match *self.borrow() {
            BoolNode::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Handles to the children of the node (empty for leaves).
    pub fn args(&self) -> Vec<BoolNodeRef> {
        self.borrow().args().to_vec()
    }

    pub fn arity(&self) -> usize {
        self.borrow().args().len()
    }

    pub fn arg_limit(&self) -> Option<usize> {
        match *self.borrow() {
            BoolNode::Gate { arg_limit, .. } => arg_limit,
            _ => None,
        }
    }

    /// Appends children to a gate.
    ///
    /// Fails without modifying anything if the gate would exceed its arity limit.
    /// A NOT never grows past its single child.
    pub fn add_args(&self, new_args: impl IntoIterator<Item = BoolNodeRef>) -> Result<()> {
        let new_args: Vec<BoolNodeRef> = new_args.into_iter().collect();
        match &mut *self.0.borrow_mut() {
            BoolNode::Gate {
                kind,
                args,
                arg_limit,
            } => {
                let requested = args.len() + new_args.len();
                let limit = match kind {
                    GateKind::Not => Some(1),
                    _ => *arg_limit,
                };
                if let Some(limit) = limit {
                    if requested > limit {
                        return Err(BoolError::ArgLimit { limit, requested });
                    }
                }
                args.extend(new_args);
                Ok(())
            }
            _ => Err(BoolError::NotAGate),
        }
    }

    /// Removes children from a gate, comparing them by identity.
    ///
    /// Every occurrence of each given child is removed. An empty `to_remove` removes all
    /// the children. A NOT gate cannot be left without its child.
    pub fn remove_args(&self, to_remove: &[BoolNodeRef]) -> Result<()> {
        match &mut *self.0.borrow_mut() {
            BoolNode::Gate { kind, args, .. } => {
                let kept: Vec<BoolNodeRef> = if to_remove.is_empty() {
                    Vec::new()
                } else {
                    args.iter()
                        .filter(|arg| !to_remove.contains(arg))
                        .cloned()
                        .collect()
                };
                if *kind == GateKind::Not && kept.len() != 1 {
                    return Err(BoolError::NotArity(kept.len()));
                }
                *args = kept;
                Ok(())
            }
            _ => Err(BoolError::NotAGate),
        }
    }

    /// Structural equality: same kinds, same leaves, same children in the same order.
    ///
    /// Sharing is not taken into account, a DAG and its unfolded tree are equal.
    pub fn same_structure(&self, other: &BoolNodeRef) -> bool {
        let mut equal_pairs = std::collections::HashSet::new();
        let mut stack = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = stack.pop() {
            if a == b || equal_pairs.contains(&(a.clone(), b.clone())) {
                continue;
            }
            let (na, nb) = (a.borrow(), b.borrow());
            let local = match (&*na, &*nb) {
                (BoolNode::Var(i), BoolNode::Var(j)) => i == j,
                (BoolNode::Const(u), BoolNode::Const(v)) => u == v,
                (
                    BoolNode::Gate {
                        kind: k1, args: a1, ..
                    },
                    BoolNode::Gate {
                        kind: k2, args: a2, ..
                    },
                ) => k1 == k2 && a1.len() == a2.len(),
                _ => false,
            };
            if !local {
                return false;
            }
            stack.extend(na.args().iter().cloned().zip(nb.args().iter().cloned()));
            drop((na, nb));
            equal_pairs.insert((a, b));
        }
        true
    }

    /// Takes the children out of the node if this handle is the last one.
    fn take_args_if_unique(&mut self) -> Vec<BoolNodeRef> {
        if Rc::strong_count(&self.0) != 1 {
            return Vec::new();
        }
        match self.0.try_borrow_mut() {
            Ok(mut node) => match &mut *node {
                BoolNode::Gate { args, .. } => mem::take(args),
                _ => Vec::new(),
            },
            Err(_) => Vec::new(),
        }
    }
}

impl Clone for BoolNodeRef {
    fn clone(&self) -> Self {
        BoolNodeRef(Rc::clone(&self.0))
    }
}

impl Drop for BoolNodeRef {
    /// Releases deep chains iteratively, a recursive drop would overflow the stack.
    fn drop(&mut self) {
        let mut stack = self.take_args_if_unique();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.take_args_if_unique());
        }
    }
}

impl PartialEq for BoolNodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for BoolNodeRef {}

impl Hash for BoolNodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for BoolNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoolNodeRef({})", self.dense_str())
    }
}

impl BitXor for &BoolNodeRef {
    type Output = BoolNodeRef;

    fn bitxor(self, rhs: Self) -> BoolNodeRef {
        BoolNodeRef::xor([self.clone(), rhs.clone()])
    }
}

impl BitAnd for &BoolNodeRef {
    type Output = BoolNodeRef;

    fn bitand(self, rhs: Self) -> BoolNodeRef {
        BoolNodeRef::and([self.clone(), rhs.clone()])
    }
}

impl BitOr for &BoolNodeRef {
    type Output = BoolNodeRef;

    fn bitor(self, rhs: Self) -> BoolNodeRef {
        BoolNodeRef::or([self.clone(), rhs.clone()])
    }
}

impl Not for &BoolNodeRef {
    type Output = BoolNodeRef;

    fn not(self) -> BoolNodeRef {
        BoolNodeRef::not(self.clone())
    }
}

impl From<bool> for BoolNodeRef {
    fn from(value: bool) -> Self {
        BoolNodeRef::constant(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn gate_kind_names_test() {
        for kind in GateKind::ALL {
            assert_eq!(GateKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GateKind::from_name("MUX"), None);
        assert_eq!(GateKind::Xnor.positive(), GateKind::Xor);
        assert!(GateKind::Not.is_negated());
        assert!(!GateKind::Not.is_associative());
    }

    #[test]
    fn not_arity_test() {
        let x = BoolNodeRef::var(0);
        let y = BoolNodeRef::var(1);
        assert!(matches!(
            BoolNodeRef::gate(GateKind::Not, Vec::new()),
            Err(BoolError::NotArity(0))
        ));
        assert!(matches!(
            BoolNodeRef::gate(GateKind::Not, [x.clone(), y]),
            Err(BoolError::NotArity(2))
        ));
        let n = BoolNodeRef::gate(GateKind::Not, [x.clone()]).unwrap();
        assert_eq!(n.args(), vec![x.clone()]);
        assert!(matches!(
            n.add_args([x.clone()]),
            Err(BoolError::ArgLimit {
                limit: 1,
                requested: 2
            })
        ));
        assert!(matches!(n.remove_args(&[x]), Err(BoolError::NotArity(0))));
        assert_eq!(n.arity(), 1);
    }

    #[test]
    fn not_limit_is_fixed_test() {
        let x = BoolNodeRef::var(0);
        let n = BoolNodeRef::gate_with_limit(GateKind::Not, [x.clone()], None).unwrap();
        assert_eq!(n.arg_limit(), Some(1));
        assert!(matches!(
            n.add_args([BoolNodeRef::var(1)]),
            Err(BoolError::ArgLimit {
                limit: 1,
                requested: 2
            })
        ));
        assert_eq!(n.arity(), 1);

        let m = BoolNodeRef::gate_with_limit(GateKind::Not, [x.clone()], Some(5)).unwrap();
        assert_eq!(m.arg_limit(), Some(1));

        // Same through replace
        let g = BoolNodeRef::xor([x.clone()]);
        g.replace(BoolNode::Gate {
            kind: GateKind::Not,
            args: vec![x.clone()],
            arg_limit: None,
        })
        .unwrap();
        assert_eq!(g.arg_limit(), Some(1));
        assert!(g.add_args([x]).is_err());
        assert_eq!(g.arity(), 1);
    }

    #[test]
    fn add_args_test() {
        let x = BoolNodeRef::var(0);
        let g = BoolNodeRef::gate_with_limit(GateKind::And, [x.clone()], Some(2)).unwrap();
        g.add_args([BoolNodeRef::var(1)]).unwrap();
        assert_eq!(g.arity(), 2);
        // Nothing is added when the limit would be exceeded
        assert!(
            g.add_args([BoolNodeRef::var(2), BoolNodeRef::var(3)])
                .is_err()
        );
        assert_eq!(g.arity(), 2);
        assert!(matches!(x.add_args(Vec::new()), Err(BoolError::NotAGate)));
        assert!(BoolNodeRef::gate_with_limit(GateKind::Or, [x.clone(), x], Some(1)).is_err());
    }

    #[test]
    fn remove_args_test() {
        let x = BoolNodeRef::var(0);
        let x_bis = BoolNodeRef::var(0);
        let y = BoolNodeRef::var(1);
        let g = BoolNodeRef::xor([x.clone(), y.clone(), x.clone(), x_bis.clone()]);

        // Identity, not structure: x_bis stays
        g.remove_args(&[x.clone()]).unwrap();
        assert_eq!(g.args(), vec![y.clone(), x_bis]);

        g.remove_args(&[]).unwrap();
        assert_eq!(g.arity(), 0);
        assert!(matches!(y.remove_args(&[]), Err(BoolError::NotAGate)));
    }

    #[test]
    fn shared_mutation_test() {
        let x = BoolNodeRef::var(0);
        let shared = BoolNodeRef::and([x.clone()]);
        let p1 = BoolNodeRef::xor([shared.clone()]);
        let p2 = BoolNodeRef::or([shared.clone()]);
        shared.add_args([BoolNodeRef::var(1)]).unwrap();
        assert_eq!(p1.args()[0].arity(), 2);
        assert_eq!(p2.args()[0].arity(), 2);
    }

    #[test]
    fn identity_test() {
        let x = BoolNodeRef::var(3);
        let x_bis = BoolNodeRef::var(3);
        assert_eq!(x, x.clone());
        assert_ne!(x, x_bis);
        assert!(x.same_structure(&x_bis));
        assert_eq!(x.index(), Some(3));
        assert_eq!(x.value(), None);
        assert_eq!(BoolNodeRef::from(true).value(), Some(true));
    }

    #[test]
    fn same_structure_test() {
        let x = BoolNodeRef::var(0);
        let y = BoolNodeRef::var(1);
        let shared = &x & &y;
        let dag = &shared ^ &shared;
        let tree = &(&x & &y) ^ &(&BoolNodeRef::var(0) & &BoolNodeRef::var(1));
        assert!(dag.same_structure(&tree));
        assert!(!dag.same_structure(&(&(&x & &y) ^ &(&y & &x))));
        assert!(!(!&x).same_structure(&(&x | &x)));
    }

    #[test]
    fn replace_test() {
        let x = BoolNodeRef::var(0);
        let parent = !&x;
        let old = x.replace(BoolNode::Const(true)).unwrap();
        assert!(old.is_var());
        assert_eq!(parent.args()[0].value(), Some(true));
        assert!(
            x.replace(BoolNode::Gate {
                kind: GateKind::Not,
                args: vec![],
                arg_limit: Some(1)
            })
            .is_err()
        );
    }

    #[test]
    fn deep_chain_drop_test() {
        let mut f = BoolNodeRef::var(0);
        for _ in 0..200_000 {
            f = BoolNodeRef::not(f);
        }
        assert_eq!(f.kind(), Some(GateKind::Not));
        drop(f);
    }
}
