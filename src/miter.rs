use std::collections::BTreeMap;

use log::debug;

use crate::{
    BoolNodeRef, Result,
    cnf::{Cnf, Lit, Tseytin},
};

/// The CNF used to check the equivalence of two functions.
///
/// For background on what is a miter, please check
/// [Verification of large synthesized designs](https://doi.org/10.1109/ICCAD.1993.580110) by D. Brand.
///
/// Both functions are encoded in the same CNF, variables with the same index sharing the
/// same CNF variable, and the XOR of their outputs is asserted:
/// - if the CNF is **UNSAT**, the functions are equivalent
/// - else any model gives an input on which they differ, see [`Miter::counterexample`].
pub struct Miter {
    encoder: Tseytin,
    /// Output literals of the two functions.
    outputs: (Lit, Lit),
}

impl Miter {
    /// Encodes the miter between `a` and `b`.
    pub fn new(a: &BoolNodeRef, b: &BoolNodeRef) -> Result<Self> {
        let mut encoder = Tseytin::new();
        let out_a = encoder.encode(&a.binarize()?)?;
        let out_b = encoder.encode(&b.binarize()?)?;
        let diff = encoder.fresh_lit();
        encoder.cnf_mut().add_xor(out_a, out_b, diff);
        encoder.assert_lit(diff);
        debug!(
            "miter encoded: {} variables, {} clauses",
            encoder.num_vars(),
            encoder.cnf().len()
        );
        Ok(Miter {
            encoder,
            outputs: (out_a, out_b),
        })
    }

    pub fn cnf(&self) -> &Cnf {
        self.encoder.cnf()
    }

    /// Output literals of the two functions.
    pub fn outputs(&self) -> (Lit, Lit) {
        self.outputs
    }

    /// Maps variable indices to their CNF variable.
    pub fn var_labels(&self) -> &BTreeMap<usize, Lit> {
        self.encoder.var_labels()
    }

    /// Reads the input on which the functions differ from a model of the CNF.
    pub fn counterexample(&self, model: &[i64]) -> BTreeMap<usize, bool> {
        self.encoder.decode(model)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    /// Every model of the CNF over its first `num_vars` variables.
    fn models(cnf: &Cnf) -> Vec<Vec<i64>> {
        let num_vars = cnf.num_vars();
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
    fn equivalent_functions_test() {
        // De Morgan
        let a = BoolNodeRef::or((0..3).map(BoolNodeRef::var));
        let b = BoolNodeRef::nand([
            BoolNodeRef::not(BoolNodeRef::var(0)),
            BoolNodeRef::not(BoolNodeRef::var(1)),
            BoolNodeRef::not(BoolNodeRef::var(2)),
        ]);
        let miter = Miter::new(&a, &b).unwrap();
        assert_eq!(miter.var_labels().len(), 3);
        assert!(models(miter.cnf()).is_empty());
    }

    #[test]
    fn different_functions_test() {
        let a = BoolNodeRef::or([BoolNodeRef::var(0), BoolNodeRef::var(1)]);
        let b = BoolNodeRef::xor([BoolNodeRef::var(0), BoolNodeRef::var(1)]);
        let miter = Miter::new(&a, &b).unwrap();
        let found = models(miter.cnf());
        assert_eq!(found.len(), 1);
        let input = miter.counterexample(&found[0]);
        assert!(input[&0] && input[&1]);
        let state: Vec<bool> = input.values().copied().collect();
        assert_ne!(
            a.eval::<bool, _>(&state).unwrap(),
            b.eval::<bool, _>(&state).unwrap()
        );
    }
}
