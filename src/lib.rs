pub mod anf;
pub mod cnf;
pub mod dot;
pub mod emit;
pub mod func;
pub mod miter;
pub mod store;

// Re-exporting symbols and modules.
pub use anf::{Anf, Monomial};
pub use func::traverse;
pub use func::{
    AnfValue, BoolError, BoolNode, BoolNodeRef, GateKind, Inputs, LogicValue, Result, StoreError,
};
