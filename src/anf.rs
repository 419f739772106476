//! Algebraic normal form of boolean functions.
//!
//! A function is a sum (XOR) of monomials over GF(2), each monomial being a product (AND) of
//! distinct variables. This representation is canonical: two functions are equal if and
//! only if their sets of monomials are equal.
//!
//! ```rust
//! use boolfn::{Anf, BoolNodeRef};
//! let f = BoolNodeRef::xor([
//!     BoolNodeRef::var(0),
//!     BoolNodeRef::and([BoolNodeRef::var(1), BoolNodeRef::var(2)]),
//! ]);
//! let anf = f.translate_anf().unwrap();
//! assert_eq!(anf, Anf::from_terms([vec![0], vec![1, 2]]));
//! assert_eq!(anf.degree(), 2);
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::{BitAnd, BitOr, BitXor, Not},
};

use log::debug;

use crate::{BoolNodeRef, Inputs, Result};

/// A product of distinct variables. The empty monomial is the constant 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Monomial(BTreeSet<usize>);

impl Monomial {
    /// The constant monomial 1.
    pub fn one() -> Self {
        Monomial(BTreeSet::new())
    }

    pub fn var(index: usize) -> Self {
        Monomial(BTreeSet::from([index]))
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of variables of the monomial.
    pub fn degree(&self) -> usize {
        self.0.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Product of two monomials. Variables are idempotent: x * x = x.
    pub fn product(&self, other: &Monomial) -> Monomial {
        Monomial(self.0.union(&other.0).copied().collect())
    }
}

impl FromIterator<usize> for Monomial {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Monomial(iter.into_iter().collect())
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }
        let vars: Vec<String> = self.vars().map(|i| format!("x{}", i)).collect();
        write!(f, "{}", vars.join("*"))
    }
}

/// A boolean function in algebraic normal form: a set of monomials.
///
/// The empty set is the constant 0. Supports the ring operations of GF(2) through the
/// operators: `^` is addition, `&` is multiplication, `!` adds 1 and `|` is a ^ b ^ ab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Anf {
    terms: BTreeSet<Monomial>,
}

impl Anf {
    pub fn zero() -> Self {
        Anf::default()
    }

    pub fn one() -> Self {
        Anf {
            terms: BTreeSet::from([Monomial::one()]),
        }
    }

    pub fn var(index: usize) -> Self {
        Anf {
            terms: BTreeSet::from([Monomial::var(index)]),
        }
    }

    /// Builds a polynomial from monomials given as lists of variables.
    ///
    /// A monomial listed twice cancels out.
    pub fn from_terms<I, M>(terms: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = usize>,
    {
        let mut anf = Anf::zero();
        for term in terms {
            anf.toggle(term.into_iter().collect());
        }
        anf
    }

    /// Adds a monomial: inserts it when absent, removes it when present.
    fn toggle(&mut self, monomial: Monomial) {
        if !self.terms.remove(&monomial) {
            self.terms.insert(monomial);
        }
    }

    /// Number of monomials.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True for the constant 0.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, monomial: &Monomial) -> bool {
        self.terms.contains(monomial)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monomial> {
        self.terms.iter()
    }

    /// Largest degree of a monomial, 0 for constants.
    pub fn degree(&self) -> usize {
        self.terms.iter().map(Monomial::degree).max().unwrap_or(0)
    }

    /// Computes the ANF of a function by evaluating it with each variable `i` seeded
    /// as the polynomial `x_i`.
    pub fn from_function(function: &BoolNodeRef) -> Result<Self> {
        let anf: Anf = function.eval_anf(&Symbolic)?;
        debug!(
            "translated function to ANF: {} monomials, degree {}",
            anf.len(),
            anf.degree()
        );
        Ok(anf)
    }

    /// Builds the function XOR(m_1, ..., m_k), each monomial being CONST(1) or the AND of
    /// its variables.
    ///
    /// The zero polynomial gives XOR(CONST(0)). Variable leaves are shared between monomials.
    pub fn to_function(&self) -> BoolNodeRef {
        if self.is_empty() {
            return BoolNodeRef::xor([BoolNodeRef::constant(false)]);
        }
        let mut leaves: BTreeMap<usize, BoolNodeRef> = BTreeMap::new();
        let terms = self.terms.iter().map(|monomial| {
            if monomial.is_one() {
                BoolNodeRef::constant(true)
            } else {
                BoolNodeRef::and(monomial.vars().map(|i| {
                    leaves
                        .entry(i)
                        .or_insert_with(|| BoolNodeRef::var(i))
                        .clone()
                }))
            }
        });
        BoolNodeRef::xor(terms.collect::<Vec<BoolNodeRef>>())
    }
}

/// Seeds variable `i` with the polynomial `x_i`.
struct Symbolic;

impl Inputs<Anf> for Symbolic {
    fn input(&self, index: usize) -> Option<Anf> {
        Some(Anf::var(index))
    }
}

impl<'a> IntoIterator for &'a Anf {
    type Item = &'a Monomial;
    type IntoIter = std::collections::btree_set::Iter<'a, Monomial>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl From<bool> for Anf {
    fn from(value: bool) -> Self {
        if value { Anf::one() } else { Anf::zero() }
    }
}

impl BitXor for Anf {
    type Output = Anf;

    fn bitxor(mut self, rhs: Anf) -> Anf {
        for monomial in rhs.terms {
            self.toggle(monomial);
        }
        self
    }
}

impl BitAnd for Anf {
    type Output = Anf;

    fn bitand(self, rhs: Anf) -> Anf {
        let mut product = Anf::zero();
        for a in &self.terms {
            for b in &rhs.terms {
                product.toggle(a.product(b));
            }
        }
        product
    }
}

impl BitOr for Anf {
    type Output = Anf;

    fn bitor(self, rhs: Anf) -> Anf {
        let both = self.clone() & rhs.clone();
        self ^ rhs ^ both
    }
}

impl Not for Anf {
    type Output = Anf;

    fn not(self) -> Anf {
        self ^ Anf::one()
    }
}

impl fmt::Display for Anf {
    /// Constant term first, then the other monomials by increasing degree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        let mut terms: Vec<&Monomial> = self.terms.iter().collect();
        terms.sort_by_key(|m| m.degree());
        let terms: Vec<String> = terms.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", terms.join(" + "))
    }
}

impl BoolNodeRef {
    /// The algebraic normal form of the function.
    pub fn translate_anf(&self) -> Result<Anf> {
        Anf::from_function(self)
    }

    /// Builds a function from its algebraic normal form, see [`Anf::to_function`].
    pub fn from_anf(anf: &Anf) -> BoolNodeRef {
        anf.to_function()
    }

    /// Algebraic degree of the function.
    pub fn degree(&self) -> Result<usize> {
        Ok(self.translate_anf()?.degree())
    }

    /// Number of monomials of the algebraic normal form.
    pub fn monomial_count(&self) -> Result<usize> {
        Ok(self.translate_anf()?.len())
    }

    /// True if both functions compute the same boolean function, compared through their
    /// algebraic normal forms.
    pub fn anf_equivalent(&self, other: &BoolNodeRef) -> Result<bool> {
        Ok(self.translate_anf()? == other.translate_anf()?)
    }
}
