//! Emission of functions as source code.
//!
//! A function is emitted as a list of assignment statements: one per shared gate, in
//! dependency order, then one for the whole function. Shared gates are assigned to a named
//! intermediate once and referred to by name afterwards, which keeps the output linear in
//! the size of the DAG.
//!
//! ```rust
//! use boolfn::{BoolNodeRef, emit::{Dialect, EmitOptions}};
//! let shared = BoolNodeRef::and([BoolNodeRef::var(0), BoolNodeRef::var(1)]);
//! let f = BoolNodeRef::xor([shared.clone(), BoolNodeRef::not(shared)]);
//! let lines = f.emit(&Dialect::c(), &EmitOptions::default()).unwrap();
//! assert_eq!(lines, vec![
//!     "fn_1 = (array[0] & array[1]);".to_string(),
//!     "output = (fn_1 ^ (!(fn_1)));".to_string(),
//! ]);
//! ```

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{BoolNode, BoolNodeRef, GateKind, Result, traverse::fold};

/// Text of a gate: `open`, then the children separated by `separator`, then `close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateTemplate {
    pub open: String,
    pub separator: String,
    pub close: String,
}

impl GateTemplate {
    pub fn new(open: &str, separator: &str, close: &str) -> Self {
        GateTemplate {
            open: open.to_string(),
            separator: separator.to_string(),
            close: close.to_string(),
        }
    }

    fn render(&self, args: &[&String]) -> String {
        let args: Vec<&str> = args.iter().map(|a| a.as_str()).collect();
        format!("{}{}{}", self.open, args.join(&self.separator), self.close)
    }
}

/// The textual templates of a target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    pub xor: GateTemplate,
    pub and: GateTemplate,
    pub or: GateTemplate,
    pub nand: GateTemplate,
    pub nor: GateTemplate,
    pub xnor: GateTemplate,
    pub not: GateTemplate,
    /// Variable `i` is written `{array}{var_open}{i}{var_close}`.
    pub var_open: String,
    pub var_close: String,
    pub const_false: String,
    pub const_true: String,
    /// Statements are written `{name}{assign}{expression}{terminator}`.
    pub assign: String,
    pub terminator: String,
}

impl Dialect {
    /// C, variables read from an array: `output = (array[0] ^ array[1]);`.
    pub fn c() -> Self {
        Dialect {
            xor: GateTemplate::new("(", " ^ ", ")"),
            and: GateTemplate::new("(", " & ", ")"),
            or: GateTemplate::new("(", " | ", ")"),
            nand: GateTemplate::new("(!(", " & ", "))"),
            nor: GateTemplate::new("(!(", " | ", "))"),
            xnor: GateTemplate::new("(!(", " ^ ", "))"),
            not: GateTemplate::new("(!(", "", "))"),
            var_open: "[".to_string(),
            var_close: "]".to_string(),
            const_false: "0".to_string(),
            const_true: "1".to_string(),
            assign: " = ".to_string(),
            terminator: ";".to_string(),
        }
    }

    /// VHDL, variables read from a vector: `output <= (array(0) XOR array(1));`.
    pub fn vhdl() -> Self {
        Dialect {
            xor: GateTemplate::new("(", " XOR ", ")"),
            and: GateTemplate::new("(", " AND ", ")"),
            or: GateTemplate::new("(", " OR ", ")"),
            nand: GateTemplate::new("(NOT(", " AND ", "))"),
            nor: GateTemplate::new("(NOT(", " OR ", "))"),
            xnor: GateTemplate::new("(NOT(", " XOR ", "))"),
            not: GateTemplate::new("(NOT(", "", "))"),
            var_open: "(".to_string(),
            var_close: ")".to_string(),
            const_false: "'0'".to_string(),
            const_true: "'1'".to_string(),
            assign: " <= ".to_string(),
            terminator: ";".to_string(),
        }
    }

    /// Python on 0/1 integers, negation written `1-x`: `output = (array[0] ^ array[1])`.
    pub fn python() -> Self {
        Dialect {
            xor: GateTemplate::new("(", " ^ ", ")"),
            and: GateTemplate::new("(", " & ", ")"),
            or: GateTemplate::new("(", " | ", ")"),
            nand: GateTemplate::new("(1-(", " & ", "))"),
            nor: GateTemplate::new("(1-(", " | ", "))"),
            xnor: GateTemplate::new("(1-(", " ^ ", "))"),
            not: GateTemplate::new("(1-(", "", "))"),
            var_open: "[".to_string(),
            var_close: "]".to_string(),
            const_false: "0".to_string(),
            const_true: "1".to_string(),
            assign: " = ".to_string(),
            terminator: String::new(),
        }
    }

    pub fn template(&self, kind: GateKind) -> &GateTemplate {
        match kind {
            GateKind::Xor => &self.xor,
            GateKind::And => &self.and,
            GateKind::Or => &self.or,
            GateKind::Nand => &self.nand,
            GateKind::Nor => &self.nor,
            GateKind::Xnor => &self.xnor,
            GateKind::Not => &self.not,
        }
    }

    fn constant(&self, value: bool) -> String {
        if value {
            self.const_true.clone()
        } else {
            self.const_false.clone()
        }
    }
}

/// Naming of the emitted statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Name assigned the whole function.
    pub output_name: String,
    /// Shared gate `k` (from 1, in dependency order) is named `{prefix}_{k}`.
    pub subfunction_prefix: String,
    /// Name of the array variables are read from.
    pub array_name: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            output_name: "output".to_string(),
            subfunction_prefix: "fn".to_string(),
            array_name: "array".to_string(),
        }
    }
}

impl BoolNodeRef {
    /// Emits the function as a list of statements, see the [module documentation](crate::emit).
    ///
    /// Gates without children are written as the constant they evaluate to.
    pub fn emit(&self, dialect: &Dialect, options: &EmitOptions) -> Result<Vec<String>> {
        let shared: HashSet<BoolNodeRef> = self.subfunctions().into_iter().collect();
        let mut lines = Vec::new();

        let expression = fold(self, |node, children: &[&String]| {
            let text = match *node.borrow() {
                BoolNode::Var(index) => format!(
                    "{}{}{}{}",
                    options.array_name, dialect.var_open, index, dialect.var_close
                ),
                BoolNode::Const(value) => dialect.constant(value),
                BoolNode::Gate { kind, .. } if children.is_empty() => {
                    dialect.constant(kind.apply::<bool>(&[])?)
                }
                BoolNode::Gate { kind, .. } => dialect.template(kind).render(children),
            };
            if !shared.contains(node) {
                return Ok(text);
            }
            let name = format!("{}_{}", options.subfunction_prefix, lines.len() + 1);
            lines.push(format!(
                "{}{}{}{}",
                name, dialect.assign, text, dialect.terminator
            ));
            Ok(name)
        })?;

        lines.push(format!(
            "{}{}{}{}",
            options.output_name, dialect.assign, expression, dialect.terminator
        ));
        debug!("emitted {} statements", lines.len());
        Ok(lines)
    }

    /// Emits the function as C statements with the default names.
    pub fn generate_c(&self) -> Result<Vec<String>> {
        self.emit(&Dialect::c(), &EmitOptions::default())
    }

    /// Emits the function as VHDL statements with the default names.
    pub fn generate_vhdl(&self) -> Result<Vec<String>> {
        self.emit(&Dialect::vhdl(), &EmitOptions::default())
    }

    /// Emits the function as Python statements with the default names.
    pub fn generate_python(&self) -> Result<Vec<String>> {
        self.emit(&Dialect::python(), &EmitOptions::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn sample() -> BoolNodeRef {
        BoolNodeRef::xnor([
            BoolNodeRef::var(0),
            BoolNodeRef::nand([BoolNodeRef::var(1), BoolNodeRef::constant(true)]),
        ])
    }

    #[test]
    fn dialects_test() {
        let f = sample();
        assert_eq!(
            f.generate_c().unwrap(),
            vec!["output = (!(array[0] ^ (!(array[1] & 1))));"]
        );
        assert_eq!(
            f.generate_vhdl().unwrap(),
            vec!["output <= (NOT(array(0) XOR (NOT(array(1) AND '1'))));"]
        );
        assert_eq!(
            f.generate_python().unwrap(),
            vec!["output = (1-(array[0] ^ (1-(array[1] & 1))))"]
        );
    }

    #[test]
    fn shared_gates_test() {
        let x = BoolNodeRef::var(0);
        let inner = BoolNodeRef::or([x.clone(), BoolNodeRef::var(1)]);
        let outer = BoolNodeRef::and([inner.clone(), inner.clone()]);
        let f = BoolNodeRef::xor([outer.clone(), BoolNodeRef::not(outer), x]);
        let options = EmitOptions {
            output_name: "y".to_string(),
            subfunction_prefix: "t".to_string(),
            array_name: "s".to_string(),
        };
        let lines = f.emit(&Dialect::python(), &options).unwrap();
        assert_eq!(
            lines,
            vec![
                "t_1 = (s[0] | s[1])",
                "t_2 = (t_1 & t_1)",
                "y = (t_2 ^ (1-(t_2)) ^ s[0])",
            ]
        );
    }

    #[test]
    fn empty_gate_test() {
        let f = BoolNodeRef::or([BoolNodeRef::nand(Vec::new()), BoolNodeRef::var(2)]);
        assert_eq!(f.generate_c().unwrap(), vec!["output = (0 | array[2]);"]);
    }

    #[test]
    fn options_from_json_test() {
        let options: EmitOptions = serde_json::from_str(r#"{"output_name": "z"}"#).unwrap();
        assert_eq!(options.output_name, "z");
        assert_eq!(options.subfunction_prefix, "fn");

        let dialect = Dialect::vhdl();
        let json = serde_json::to_string(&dialect).unwrap();
        let back: Dialect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dialect);
    }
}
