//! Boolean functions as mutable DAGs of shared nodes.
//!
//! A function is the [`BoolNodeRef`] of its root. Leaves are variables ([`BoolNode::Var`]) and
//! constants ([`BoolNode::Const`]), internal nodes are gates ([`BoolNode::Gate`]).
//! Sub-graphs are shared: the same node may be the child of several gates, which keeps
//! functions produced by iterating a feedback function linear in size.
//!
//! Every algorithm walks the DAG with the explicit-stack post-order of [`traverse`],
//! so very deep functions do not overflow the call stack, and visits each distinct node once.

mod clone;
mod display;
mod error;
mod eval;
mod integrity;
mod node;
mod transform;
pub mod traverse;

pub use error::{BoolError, Result, StoreError};
pub use eval::{AnfValue, Inputs, LogicValue};
pub use node::{BoolNode, BoolNodeRef, GateKind};
