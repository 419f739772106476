use thiserror::Error;

/// The result of an operation on boolean function DAGs.
pub type Result<T> = std::result::Result<T, BoolError>;

/// Error returned when an operation on a boolean function failed.
#[derive(Debug, Error)]
pub enum BoolError {
    /// A NOT gate must have exactly one child.
    #[error("NOT takes exactly 1 argument, got {0}")]
    NotArity(usize),

    /// Adding arguments to a gate would exceed its configured maximum arity.
    #[error("gate supports at most {limit} arguments, {requested} requested")]
    ArgLimit { limit: usize, requested: usize },

    /// Children can only be added to or removed from gates.
    #[error("leaf nodes (VAR or CONST) have no arguments")]
    NotAGate,

    /// A variable leaf refers to an index which is not part of the supplied state.
    #[error("variable index {0} is not mapped by the supplied state")]
    UnmappedVariable(usize),

    /// Shifting a variable index would make it negative or overflow.
    #[error("cannot shift variable index {index} by {shift}")]
    IndexOverflow { index: usize, shift: isize },

    /// 0 is the clause terminator of DIMACS, not a literal.
    #[error("0 is not a valid DIMACS literal")]
    ZeroLiteral,

    /// The explicit integrity check found a node which is its own descendant.
    #[error("found a cycle")]
    Cycle,

    /// The DAG has reached an invalid state. This should never happen on acyclic graphs
    /// which are not mutated while an algorithm walks them.
    #[error("the function has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// Just forwarding a [`StoreError`].
    #[error("{0}")]
    StoreError(#[from] StoreError),
}

/// Error returned when storing or loading a function failed.
///
/// It is defined here because every fallible operation of the crate returns [`BoolError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The type tag of a record has no matching node type.
    #[error("type '{0}' is not a valid boolean function node")]
    UnknownNodeType(String),

    /// A record is missing a field required by its node type.
    #[error("record {record} ({class}) is missing field '{field}'")]
    MissingField {
        record: usize,
        class: String,
        field: &'static str,
    },

    /// Constants are stored as 0 or 1.
    #[error("record {record} holds invalid constant {value}")]
    InvalidConstant { record: usize, value: u64 },

    /// A child id must refer to a record stored before its parent.
    #[error("record {node} refers to child {child} which is not defined before it")]
    DanglingChild { node: usize, child: usize },

    /// A return id does not refer to any record.
    #[error("return id {0} does not refer to any record")]
    UnknownRoot(usize),

    /// The JSON document could not be produced or parsed.
    #[error("json error: {0}")]
    Json(String),

    /// An IO error occured (file doesn't exist, permission denied, ...).
    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value.to_string())
    }
}
