//! Tseytin encoding of functions into CNF, ready to be passed to a SAT solver.
//!
//! To find an input on which a function `f` is true:
//! - encode `f` with [`BoolNodeRef::to_cnf`] (or incrementally with a [`Tseytin`] encoder)
//! - solve [`Tseytin::cnf`] with any SAT solver, for example by writing it with [`Cnf::to_dimacs`]
//! - read the input assignment back from the solver model with [`Tseytin::decode`].
//!
//! Variable 1 is reserved for the constant true: every CNF starts with the unit clause `1`,
//! `CONST(1)` leaves are encoded as literal `1` and `CONST(0)` leaves as literal `-1`.
//!
//! [`BoolNodeRef::to_cnf`]: crate::BoolNodeRef::to_cnf

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Write,
    ops::Not,
};

use log::{debug, trace};

use crate::{BoolError, BoolNode, BoolNodeRef, GateKind, Result, traverse::PostOrder};

/// A SAT literal: a non-zero DIMACS integer, negative when the variable is negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(i64);

/// The literal of the reserved variable 1, always true.
pub const TRUE_LIT: Lit = Lit(1);

impl Lit {
    /// The DIMACS integer.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// The variable of the literal (always positive).
    pub fn var(&self) -> i64 {
        self.0.abs()
    }

    pub fn is_negated(&self) -> bool {
        self.0 < 0
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl TryFrom<i64> for Lit {
    type Error = BoolError;

    /// 0 is not a valid literal in DIMACS format.
    fn try_from(value: i64) -> Result<Self> {
        if value == 0 {
            return Err(BoolError::ZeroLiteral);
        }
        Ok(Lit(value))
    }
}

/// A SAT clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause(Vec<Lit>);

impl Clause {
    /// A new empty clause.
    pub fn new() -> Self {
        Clause(Vec::new())
    }

    pub fn lits(&self) -> &[Lit] {
        &self.0
    }

    /// True if one of the literals is in the model (a set of true literals).
    pub fn is_satisfied_by(&self, model: &HashSet<i64>) -> bool {
        self.0.iter().any(|lit| model.contains(&lit.0))
    }
}

impl Default for Clause {
    fn default() -> Self {
        Clause::new()
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

/// A SAT CNF that can be passed to a SAT solver.
///
/// Clauses are kept in insertion order, a clause already present is not added twice.
/// It provides a method per gate kind adding the clauses which encode `z = gate(a, b)`,
/// such as [`add_xor`] and [`add_and`].
///
/// [`add_xor`]: Cnf::add_xor
/// [`add_and`]: Cnf::add_and
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    clauses: Vec<Clause>,
    seen: HashSet<Clause>,
}

impl PartialEq for Cnf {
    fn eq(&self, other: &Self) -> bool {
        self.clauses == other.clauses
    }
}

impl Eq for Cnf {}

impl Cnf {
    /// A new empty CNF.
    pub fn new() -> Self {
        Cnf::default()
    }

    /// Add the given clause to the CNF, returns false if it was already present.
    pub fn add_clause(&mut self, clause: Clause) -> bool {
        if self.seen.contains(&clause) {
            return false;
        }
        self.seen.insert(clause.clone());
        self.clauses.push(clause);
        true
    }

    /// Add the given clause to the CNF, else does nothing.
    pub fn add_clause_if(&mut self, clause: Option<Clause>) {
        if let Some(c) = clause {
            self.add_clause(c);
        }
    }

    fn add(&mut self, lits: &[Lit]) {
        self.add_clause(Clause(lits.to_vec()));
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Largest variable used by a clause.
    pub fn num_vars(&self) -> i64 {
        self.clauses
            .iter()
            .flat_map(|c| c.0.iter())
            .map(Lit::var)
            .max()
            .unwrap_or(0)
    }

    /// The clauses as lists of DIMACS integers.
    pub fn to_ints(&self) -> Vec<Vec<i64>> {
        self.clauses
            .iter()
            .map(|c| c.0.iter().map(Lit::get).collect())
            .collect()
    }

    /// The CNF in DIMACS format: a `p cnf` header then one zero-terminated clause per line.
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_vars(), self.len());
        for clause in &self.clauses {
            for lit in &clause.0 {
                let _ = write!(out, "{} ", lit.0);
            }
            out.push_str("0\n");
        }
        out
    }

    /// True if every clause is satisfied by the model, given as the list of true literals
    /// (the usual output of a SAT solver).
    pub fn is_satisfied_by(&self, model: &[i64]) -> bool {
        let model: HashSet<i64> = model.iter().copied().collect();
        self.clauses.iter().all(|c| c.is_satisfied_by(&model))
    }

    /// Add clauses that encode `z = AND(a, b)`.
    pub fn add_and(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[!a, !b, z]);
        self.add(&[a, !z]);
        self.add(&[b, !z]);
    }

    /// Add clauses that encode `z = OR(a, b)`.
    pub fn add_or(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[a, b, !z]);
        self.add(&[!a, z]);
        self.add(&[!b, z]);
    }

    /// Add clauses that encode `z = XOR(a, b)`.
    pub fn add_xor(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[!a, !b, !z]);
        self.add(&[a, b, !z]);
        self.add(&[a, !b, z]);
        self.add(&[!a, b, z]);
    }

    /// Add clauses that encode `z = NAND(a, b)`.
    pub fn add_nand(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[!a, !b, !z]);
        self.add(&[a, z]);
        self.add(&[b, z]);
    }

    /// Add clauses that encode `z = NOR(a, b)`.
    pub fn add_nor(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[a, b, z]);
        self.add(&[!a, !z]);
        self.add(&[!b, !z]);
    }

    /// Add clauses that encode `z = XNOR(a, b)`.
    pub fn add_xnor(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add(&[a, b, z]);
        self.add(&[!a, !b, z]);
        self.add(&[!a, b, !z]);
        self.add(&[a, !b, !z]);
    }

    /// Add clauses that encode `z = NOT(a)`.
    pub fn add_not(&mut self, a: Lit, z: Lit) {
        self.add(&[!a, !z]);
        self.add(&[a, z]);
    }

    /// Add clauses that encode `z = a`.
    pub fn add_equal(&mut self, a: Lit, z: Lit) {
        self.add(&[!a, z]);
        self.add(&[a, !z]);
    }

    /// Add clauses that encode `z = gate(a, b)` for a binary gate.
    pub fn add_gate(&mut self, kind: GateKind, a: Lit, b: Lit, z: Lit) -> Result<()> {
        match kind {
            GateKind::Xor => self.add_xor(a, b, z),
            GateKind::And => self.add_and(a, b, z),
            GateKind::Or => self.add_or(a, b, z),
            GateKind::Nand => self.add_nand(a, b, z),
            GateKind::Nor => self.add_nor(a, b, z),
            GateKind::Xnor => self.add_xnor(a, b, z),
            GateKind::Not => return Err(BoolError::NotArity(2)),
        }
        Ok(())
    }
}

/// An incremental Tseytin encoder.
///
/// Several functions can be encoded in the same CNF: nodes already encoded are not encoded
/// again, and every variable index is mapped to a single CNF variable whatever the number
/// of leaves referring to it.
///
/// A gate with `n >= 2` children gets `n - 1` literals and is encoded as a left-associated
/// chain of binary gates. Encoding a binarized function (see [`BoolNodeRef::binarize`])
/// gives exactly one literal per gate.
#[derive(Debug, Clone)]
pub struct Tseytin {
    cnf: Cnf,
    /// Literals of each encoded node, the output of the node being the last one.
    labels: HashMap<BoolNodeRef, Vec<Lit>>,
    /// Maps variable indices to their CNF variable.
    var_labels: BTreeMap<usize, Lit>,
    /// The index of the next literal (for internal use only).
    next_lit: i64,
}

impl Default for Tseytin {
    fn default() -> Self {
        Tseytin::new()
    }
}

impl Tseytin {
    /// A new encoder, holding only the clause asserting the reserved true variable.
    pub fn new() -> Self {
        let mut cnf = Cnf::new();
        cnf.add(&[TRUE_LIT]);
        Tseytin {
            cnf,
            labels: HashMap::new(),
            var_labels: BTreeMap::new(),
            next_lit: 2,
        }
    }

    /// Returns a new unused literal.
    pub fn fresh_lit(&mut self) -> Lit {
        let lit = Lit(self.next_lit);
        self.next_lit += 1;
        lit
    }

    /// The CNF variable of variable index `index`, allocated on first use.
    fn var_lit(&mut self, index: usize) -> Lit {
        if let Some(lit) = self.var_labels.get(&index) {
            return *lit;
        }
        let lit = self.fresh_lit();
        self.var_labels.insert(index, lit);
        lit
    }

    /// The output literal of an encoded node.
    pub fn output(&self, node: &BoolNodeRef) -> Option<Lit> {
        self.labels.get(node).and_then(|lits| lits.last().copied())
    }

    /// Encodes the function and returns its output literal.
    ///
    /// The output is not asserted, use [`Tseytin::assert_lit`] for that.
    pub fn encode(&mut self, function: &BoolNodeRef) -> Result<Lit> {
        let order: Vec<BoolNodeRef> = PostOrder::from_node(function)
            .filter(|node| !self.labels.contains_key(node))
            .collect();

        // Label pass
        for node in &order {
            let labels = match *node.borrow() {
                BoolNode::Var(index) => vec![self.var_lit(index)],
                BoolNode::Const(value) => vec![if value { TRUE_LIT } else { !TRUE_LIT }],
                BoolNode::Gate { ref args, .. } => {
                    let count = args.len().saturating_sub(1).max(1);
                    (0..count).map(|_| self.fresh_lit()).collect()
                }
            };
            self.labels.insert(node.clone(), labels);
        }

        // Clause pass
        let clauses_before = self.cnf.len();
        for node in &order {
            let n = node.borrow();
            let Some(kind) = n.kind() else {
                continue;
            };
            let inputs = n
                .args()
                .iter()
                .map(|arg| {
                    self.output(arg).ok_or_else(|| {
                        BoolError::InvalidState("a child was not labelled".to_string())
                    })
                })
                .collect::<Result<Vec<Lit>>>()?;
            let gates = self.labels.get(node).cloned().unwrap_or_default();
            trace!("encoding {} gate {:?} over {:?}", kind, gates, inputs);
            self.encode_gate(kind, &inputs, &gates)?;
        }
        debug!(
            "encoded {} new nodes into {} clauses",
            order.len(),
            self.cnf.len() - clauses_before
        );

        self.output(function)
            .ok_or_else(|| BoolError::InvalidState("the root was not labelled".to_string()))
    }

    fn encode_gate(&mut self, kind: GateKind, inputs: &[Lit], gates: &[Lit]) -> Result<()> {
        let Some(&out) = gates.last() else {
            return Err(BoolError::InvalidState("a gate has no literal".to_string()));
        };
        match inputs {
            // An empty gate used as a real gate makes the formula unsatisfiable
            [] => {
                self.cnf.add(&[out]);
                self.cnf.add(&[!out]);
            }
            [a] if kind.is_negated() => self.cnf.add_not(*a, out),
            [a] => self.cnf.add_equal(*a, out),
            [first, rest @ ..] => {
                let mut prev = *first;
                for (i, (&b, &z)) in rest.iter().zip(gates).enumerate() {
                    let link = if i + 1 == gates.len() {
                        kind
                    } else {
                        kind.positive()
                    };
                    self.cnf.add_gate(link, prev, b, z)?;
                    prev = z;
                }
            }
        }
        Ok(())
    }

    /// Asserts the literal with a unit clause.
    pub fn assert_lit(&mut self, lit: Lit) {
        self.cnf.add(&[lit]);
    }

    /// Asserts that `root` is true, encoding it first if needed.
    pub fn assert_output(&mut self, root: &BoolNodeRef) -> Result<Lit> {
        let out = match self.output(root) {
            Some(out) => out,
            None => self.encode(root)?,
        };
        self.assert_lit(out);
        Ok(out)
    }

    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Gives access to the CNF, to add clauses relating encoded literals.
    pub fn cnf_mut(&mut self) -> &mut Cnf {
        &mut self.cnf
    }

    pub fn into_cnf(self) -> Cnf {
        self.cnf
    }

    /// Maps variable indices to their CNF variable.
    pub fn var_labels(&self) -> &BTreeMap<usize, Lit> {
        &self.var_labels
    }

    /// Number of CNF variables allocated so far, the reserved one included.
    pub fn num_vars(&self) -> i64 {
        self.next_lit - 1
    }

    /// Reads the input assignment back from a model given as the list of true literals.
    ///
    /// Variables absent from the model are false.
    pub fn decode(&self, model: &[i64]) -> BTreeMap<usize, bool> {
        let model: HashSet<i64> = model.iter().copied().collect();
        self.var_labels
            .iter()
            .map(|(&index, lit)| (index, model.contains(&lit.0)))
            .collect()
    }
}

impl BoolNodeRef {
    /// Binarizes then encodes the function in a new encoder, returns the encoder and the
    /// output literal.
    pub fn tseytin(&self) -> Result<(Tseytin, Lit)> {
        let mut encoder = Tseytin::new();
        let out = encoder.encode(&self.binarize()?)?;
        Ok((encoder, out))
    }

    /// A CNF satisfiable exactly by the inputs on which the function is true.
    pub fn to_cnf(&self) -> Result<Tseytin> {
        let mut encoder = Tseytin::new();
        encoder.assert_output(&self.binarize()?)?;
        Ok(encoder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    /// Every model of the CNF over its first `num_vars` variables.
    fn models(cnf: &Cnf, num_vars: i64) -> Vec<Vec<i64>> {
        (0..1u64 << num_vars)
            .map(|bits| {
                (1..=num_vars)
                    .map(|v| if bits >> (v - 1) & 1 == 1 { v } else { -v })
                    .collect::<Vec<i64>>()
            })
            .filter(|model| cnf.is_satisfied_by(model))
            .collect()
    }

    #[test]
    fn not_lit_test() {
        let l1 = Lit(1);
        assert_eq!(!l1, Lit(-1));
        assert_eq!(Lit(-4).var(), 4);
        assert!(Lit(-4).is_negated());
    }

    #[test]
    fn lit_try_from_test() {
        assert_eq!(Lit::try_from(-3).unwrap(), Lit(-3));
        assert!(matches!(Lit::try_from(0), Err(BoolError::ZeroLiteral)));
    }

    #[test]
    fn add_clause_test() {
        let c = Clause::from(vec![Lit(1), Lit(-2)]);
        let mut cnf = Cnf::new();

        assert!(cnf.add_clause(c.clone()));
        assert!(!cnf.add_clause(c.clone()));
        assert_eq!(cnf.clauses(), &[c.clone()]);

        cnf.add_clause_if(None);
        cnf.add_clause_if(Some(Clause::from(vec![Lit(3)])));
        assert_eq!(cnf.to_ints(), vec![vec![1, -2], vec![3]]);
        assert_eq!(cnf.to_dimacs(), "p cnf 3 2\n1 -2 0\n3 0\n");
    }

    #[test]
    fn gadgets_test() {
        // Models of the gadget over (a, b, z) = (1, 2, 3) must be exactly z = gate(a, b)
        for kind in GateKind::ALL {
            if kind == GateKind::Not {
                continue;
            }
            let mut cnf = Cnf::new();
            cnf.add_gate(kind, Lit(1), Lit(2), Lit(3)).unwrap();
            let found = models(&cnf, 3);
            assert_eq!(found.len(), 4);
            for model in found {
                let (a, b, z) = (model[0] > 0, model[1] > 0, model[2] > 0);
                let a_ref = BoolNodeRef::constant(a);
                let b_ref = BoolNodeRef::constant(b);
                let gate = BoolNodeRef::gate(kind, [a_ref, b_ref]).unwrap();
                let none: &[bool] = &[];
                assert_eq!(gate.eval::<bool, _>(none).unwrap(), z);
            }
        }
        let mut cnf = Cnf::new();
        assert!(cnf.add_gate(GateKind::Not, Lit(1), Lit(2), Lit(3)).is_err());
    }

    #[test]
    fn reserved_true_test() {
        let encoder = Tseytin::new();
        assert_eq!(encoder.cnf().to_ints(), vec![vec![1]]);

        let f = BoolNodeRef::and([BoolNodeRef::constant(true), BoolNodeRef::constant(false)]);
        let (encoder, out) = f.tseytin().unwrap();
        assert_eq!(out, Lit(2));
        assert_eq!(
            encoder.cnf().to_ints(),
            vec![vec![1], vec![-1, 1, 2], vec![1, -2], vec![-1, -2]]
        );
    }

    #[test]
    fn tseytin_scenario_test() {
        // XOR(x0, AND(x1, x2)) asserted true
        let f = BoolNodeRef::xor([
            BoolNodeRef::var(0),
            BoolNodeRef::and([BoolNodeRef::var(1), BoolNodeRef::var(2)]),
        ]);
        let encoder = f.to_cnf().unwrap();
        // 1 reserved, 3 variables, 2 gates
        assert_eq!(encoder.num_vars(), 6);
        let mut solutions: Vec<BTreeMap<usize, bool>> = models(encoder.cnf(), 6)
            .iter()
            .map(|m| encoder.decode(m))
            .collect();
        solutions.sort();
        assert_eq!(solutions.len(), 4);
        for solution in solutions {
            assert_ne!(solution[&0], solution[&1] && solution[&2]);
        }
    }

    #[test]
    fn same_index_same_var_test() {
        let f = BoolNodeRef::or([BoolNodeRef::var(7), BoolNodeRef::var(7)]);
        let (encoder, _) = f.tseytin().unwrap();
        assert_eq!(encoder.var_labels().len(), 1);
        assert_eq!(encoder.var_labels()[&7], Lit(2));
    }

    #[test]
    fn unrolled_gate_test() {
        // Encoded without binarization: 3 literals for a 4-ary gate
        let f = BoolNodeRef::nor((0..4).map(BoolNodeRef::var));
        let mut encoder = Tseytin::new();
        let out = encoder.encode(&f).unwrap();
        assert_eq!(out, Lit(8));
        encoder.assert_lit(out);
        let found = models(encoder.cnf(), 8);
        assert_eq!(found.len(), 1);
        assert!(encoder.decode(&found[0]).values().all(|v| !v));
    }

    #[test]
    fn single_and_empty_gates_test() {
        let x = BoolNodeRef::var(0);
        let xnor = BoolNodeRef::xnor([x.clone()]);
        let encoder = xnor.to_cnf().unwrap();
        let found = models(encoder.cnf(), encoder.num_vars());
        assert_eq!(found.len(), 1);
        assert!(!encoder.decode(&found[0])[&0]);

        let and = BoolNodeRef::and([x]);
        let encoder = and.to_cnf().unwrap();
        let found = models(encoder.cnf(), encoder.num_vars());
        assert_eq!(found.len(), 1);
        assert!(encoder.decode(&found[0])[&0]);

        let empty = BoolNodeRef::or(Vec::new());
        let encoder = empty.to_cnf().unwrap();
        assert!(models(encoder.cnf(), encoder.num_vars()).is_empty());
    }

    #[test]
    fn incremental_encoding_test() {
        let shared = BoolNodeRef::and([BoolNodeRef::var(0), BoolNodeRef::var(1)]);
        let f = BoolNodeRef::not(shared.clone());
        let g = BoolNodeRef::or([shared.clone(), BoolNodeRef::var(2)]);
        let mut encoder = Tseytin::new();
        encoder.encode(&f).unwrap();
        let before = encoder.cnf().len();
        let shared_lit = encoder.output(&shared).unwrap();
        encoder.encode(&g).unwrap();
        // Only the OR gate is new
        assert_eq!(encoder.cnf().len(), before + 3);
        assert_eq!(encoder.output(&shared), Some(shared_lit));

        // Asserting an encoded root adds a single unit clause
        let out = encoder.assert_output(&g).unwrap();
        assert_eq!(encoder.output(&g), Some(out));
        assert_eq!(encoder.cnf().len(), before + 4);
    }
}
