//! Evaluation of functions over generic value types.
//!
//! The same DAG can be evaluated on `bool`, on bit-sliced words, or on symbolic values such
//! as [`crate::Anf`]: the only requirement is the set of operators the evaluator uses.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
    ops::{BitAnd, BitOr, BitXor, Not},
};

use super::traverse::fold;
use crate::{BoolError, BoolNode, BoolNodeRef, GateKind, Result};

/// Values an ANF evaluation can run on: only AND, XOR, NOT and the two constants are used.
pub trait AnfValue:
    Clone + BitAnd<Output = Self> + BitXor<Output = Self> + Not<Output = Self> + From<bool>
{
}

impl<T> AnfValue for T where
    T: Clone + BitAnd<Output = T> + BitXor<Output = T> + Not<Output = T> + From<bool>
{
}

/// Values a direct evaluation can run on, which additionally requires OR.
pub trait LogicValue: AnfValue + BitOr<Output = Self> {}

impl<T> LogicValue for T where T: AnfValue + BitOr<Output = T> {}

/// An assignment of values to variable indices.
///
/// Any indexable container works as a state: slices, vectors and maps keyed by index.
pub trait Inputs<T> {
    /// The value of variable `index`, [`None`] if the state does not cover it.
    fn input(&self, index: usize) -> Option<T>;
}

impl<T: Clone> Inputs<T> for [T] {
    fn input(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
}

impl<T: Clone, const N: usize> Inputs<T> for [T; N] {
    fn input(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
}

impl<T: Clone> Inputs<T> for Vec<T> {
    fn input(&self, index: usize) -> Option<T> {
        self.get(index).cloned()
    }
}

impl<T: Clone, S: BuildHasher> Inputs<T> for HashMap<usize, T, S> {
    fn input(&self, index: usize) -> Option<T> {
        self.get(&index).cloned()
    }
}

impl<T: Clone> Inputs<T> for BTreeMap<usize, T> {
    fn input(&self, index: usize) -> Option<T> {
        self.get(&index).cloned()
    }
}

fn xor_all<T: AnfValue>(args: &[&T]) -> T {
    args.iter()
        .fold(T::from(false), |acc, arg| acc ^ (*arg).clone())
}

fn and_all<T: AnfValue>(args: &[&T]) -> T {
    args.iter()
        .fold(T::from(true), |acc, arg| acc & (*arg).clone())
}

fn or_all<T: LogicValue>(args: &[&T]) -> T {
    args.iter()
        .fold(T::from(false), |acc, arg| acc | (*arg).clone())
}

/// OR through De Morgan, using only the ANF operators.
fn or_all_anf<T: AnfValue>(args: &[&T]) -> T {
    !args
        .iter()
        .fold(T::from(true), |acc, arg| acc & !(*arg).clone())
}

fn single<T: Clone>(args: &[&T]) -> Result<T> {
    match args {
        [arg] => Ok((*arg).clone()),
        _ => Err(BoolError::NotArity(args.len())),
    }
}

impl GateKind {
    /// Applies the gate to the values of its children.
    ///
    /// Zero-argument gates give the identity of their operation: true for AND, false for
    /// XOR and OR, negated for the negated kinds.
    pub fn apply<T: LogicValue>(&self, args: &[&T]) -> Result<T> {
        Ok(match self {
            GateKind::Xor => xor_all(args),
            GateKind::And => and_all(args),
            GateKind::Or => or_all(args),
            GateKind::Nand => !and_all(args),
            GateKind::Nor => !or_all(args),
            GateKind::Xnor => !xor_all(args),
            GateKind::Not => !single(args)?,
        })
    }

    /// Same as [`GateKind::apply`], but OR is rewritten with AND and NOT.
    pub fn apply_anf<T: AnfValue>(&self, args: &[&T]) -> Result<T> {
        Ok(match self {
            GateKind::Xor => xor_all(args),
            GateKind::And => and_all(args),
            GateKind::Or => or_all_anf(args),
            GateKind::Nand => !and_all(args),
            GateKind::Nor => !or_all_anf(args),
            GateKind::Xnor => !xor_all(args),
            GateKind::Not => !single(args)?,
        })
    }
}

/// Value of a leaf, gates are handled by the caller.
fn leaf_value<T, I>(node: &BoolNode, state: &I) -> Result<T>
where
    T: From<bool>,
    I: Inputs<T> + ?Sized,
{
    match *node {
        BoolNode::Var(index) => state
            .input(index)
            .ok_or(BoolError::UnmappedVariable(index)),
        BoolNode::Const(value) => Ok(T::from(value)),
        BoolNode::Gate { .. } => Err(BoolError::InvalidState(
            "a gate was evaluated as a leaf".to_string(),
        )),
    }
}

impl BoolNodeRef {
    /// Evaluates the function, variable `i` taking the value `state.input(i)`.
    ///
    /// Each distinct node is evaluated once. Fails with [`BoolError::UnmappedVariable`]
    /// if the state does not cover a variable of the function.
    pub fn eval<T, I>(&self, state: &I) -> Result<T>
    where
        T: LogicValue,
        I: Inputs<T> + ?Sized,
    {
        fold(self, |node, children| {
            let node = node.borrow();
            match node.kind() {
                Some(kind) => kind.apply(children),
                None => leaf_value(&node, state),
            }
        })
    }

    /// Evaluates the function using only AND, XOR, NOT and constants.
    ///
    /// This is the evaluation used to compute the algebraic normal form of a function
    /// (see [`crate::Anf`]), and gives the same result as [`BoolNodeRef::eval`] on types
    /// supporting both.
    pub fn eval_anf<T, I>(&self, state: &I) -> Result<T>
    where
        T: AnfValue,
        I: Inputs<T> + ?Sized,
    {
        fold(self, |node, children| {
            let node = node.borrow();
            match node.kind() {
                Some(kind) => kind.apply_anf(children),
                None => leaf_value(&node, state),
            }
        })
    }
}
