//! Scopes, hypotheses, disjoint pairs and mandatory frames (spec §3, §4.5).
//!
//! Grounded on the teacher's `scopeck::ScopeResult` (referenced from
//! `database.rs`'s `scope_pass`/`scope_result`), generalized here from "one
//! result indexed by segment" to "one `Scope` snapshot per frozen
//! assertion", since this spec's parser has no segment list to index by
//! (spec.md's single forward pass assembles one `Database`, not a
//! recomputable set of segments).

use crate::nameck::{Label, Symbol, TypeCode};
use crate::proof::RawProof;
use crate::util::{new_set, HashMap, HashSet};

/// `$f typecode variable $.` — declares the syntactic type of a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatingHyp {
    pub label: Label,
    pub typecode: TypeCode,
    pub variable: Symbol,
}

/// `$e typecode symbols... $.` — a logical premise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EssentialHyp {
    pub label: Label,
    pub typecode: TypeCode,
    pub symbols: Vec<Symbol>,
}

/// An unordered pair of distinct variables, stored canonically (smaller
/// [`crate::nameck::Atom`] id first) so that equal pairs compare equal
/// regardless of declaration order (spec §3).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DisjointPair(pub Symbol, pub Symbol);

impl DisjointPair {
    #[must_use]
    pub fn new(a: Symbol, b: Symbol) -> Self {
        if a.raw() <= b.raw() {
            DisjointPair(a, b)
        } else {
            DisjointPair(b, a)
        }
    }
}

/// The currently active set of variables, floatings, essentials and
/// disjoint pairs. `${` pushes a clone of this; `$}` discards it and
/// restores the clone underneath, per spec §3/§4.2's scope discipline.
#[derive(Clone, Default, Debug)]
pub struct Scope {
    pub variables: HashSet<Symbol>,
    pub floatings: HashMap<Label, FloatingHyp>,
    pub essentials: HashMap<Label, EssentialHyp>,
    pub disjoints: HashSet<DisjointPair>,
    /// Active floating-hypothesis label for each active variable; kept
    /// alongside `floatings` purely as a variable→label index so
    /// [`MandatoryFrame::compute`] doesn't need to scan `floatings` by value.
    pub float_of: HashMap<Symbol, Label>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// The minimal set of hypotheses and disjoint restrictions required to
/// state and apply an assertion (spec §4.5), derived once when the
/// assertion's scope is frozen.
#[derive(Clone, Default, Debug)]
pub struct MandatoryFrame {
    pub variables: HashSet<Symbol>,
    /// Mandatory hypothesis labels, in global declaration order (spec
    /// §4.5's "equivalently" reading: floatings and essentials of the
    /// mandatory variables/scope, combined and sorted by declaration
    /// order, rather than concatenated as two separately-sorted runs --
    /// the spec states the two are equivalent).
    pub hyps: Vec<Label>,
    pub disjoints: HashSet<DisjointPair>,
}

impl MandatoryFrame {
    #[must_use]
    pub fn compute(scope: &Scope, conclusion: &[Symbol]) -> Self {
        let mut variables: HashSet<Symbol> = new_set();
        for &sym in conclusion {
            if scope.variables.contains(&sym) {
                variables.insert(sym);
            }
        }
        for hyp in scope.essentials.values() {
            for &sym in &hyp.symbols {
                if scope.variables.contains(&sym) {
                    variables.insert(sym);
                }
            }
        }

        let mut hyps: Vec<Label> = Vec::new();
        for &v in &variables {
            if let Some(&label) = scope.float_of.get(&v) {
                hyps.push(label);
            }
        }
        hyps.extend(scope.essentials.keys().copied());
        hyps.sort_by_key(crate::nameck::Atom::raw);
        hyps.dedup();

        let disjoints = scope
            .disjoints
            .iter()
            .filter(|p| variables.contains(&p.0) && variables.contains(&p.1))
            .copied()
            .collect();

        MandatoryFrame {
            variables,
            hyps,
            disjoints,
        }
    }
}

/// Which kind of statement an [`Assertion`] came from. Axioms have no
/// proof; provables carry the raw, not-yet-decoded proof from the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssertionKind {
    Axiom,
    Provable,
}

/// A frozen axiom or provable (spec §3): its conclusion, the scope active
/// at its declaration (never mutated afterward), and the mandatory frame
/// derived from that scope.
#[derive(Clone, Debug)]
pub struct Assertion {
    pub label: Label,
    pub kind: AssertionKind,
    pub typecode: TypeCode,
    pub conclusion: Vec<Symbol>,
    pub scope: Scope,
    pub frame: MandatoryFrame,
    pub proof: Option<RawProof>,
}

impl Assertion {
    #[must_use]
    pub fn new(
        label: Label,
        kind: AssertionKind,
        typecode: TypeCode,
        conclusion: Vec<Symbol>,
        scope: Scope,
        proof: Option<RawProof>,
    ) -> Self {
        let frame = MandatoryFrame::compute(&scope, &conclusion);
        Assertion {
            label,
            kind,
            typecode,
            conclusion,
            scope,
            frame,
            proof,
        }
    }
}

#[cfg(test)]
#[path = "scopeck_tests.rs"]
mod scopeck_tests;
