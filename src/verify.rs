//! The proof verifier: stack machine, unification, substitution, and
//! disjoint-restriction checking (spec §4.4, §4.5).
//!
//! `apply_subst` is grounded on `formula.rs`'s `Formula::substitute` /
//! `sub_substitute`: the teacher walks a parse tree node by node, appending
//! either the node's own label (a constant) or the bound replacement for a
//! variable node, into a `FormulaBuilder`, preserving left-to-right order.
//! This module does the flat-sequence equivalent -- walk `&[Symbol]` left
//! to right, appending the symbol itself or splicing in its substitution --
//! which is exactly `formula.rs`'s discipline adapted from tree nodes to a
//! `Vec<Symbol>` (this spec's verifier has no parse tree to walk; spec §4.4
//! works entirely on token-level symbol sequences).

use std::sync::Arc;

use crate::diag::{ProofError, ProofOutcome};
use crate::nameck::{Label, Symbol, TypeCode};
use crate::proof::{self, RawProof, Step};
use crate::scopeck::{Assertion, DisjointPair, Scope};
use crate::util::{new_map, HashMap};

/// A typed expression on the verifier's operand stack: a typecode paired
/// with its flattened symbol sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub typecode: TypeCode,
    pub symbols: Vec<Symbol>,
}

/// Substitution built while unifying the stack against an assertion's
/// mandatory hypotheses: variable → bound symbol sequence.
///
/// Mirrors `formula.rs`'s `Substitutions(HashMap<Label, Box<Formula>>)`
/// newtype directly, down to indexing by reference.
#[derive(Default)]
pub struct Substitutions(HashMap<Symbol, Vec<Symbol>>);

impl std::ops::Index<&Symbol> for Substitutions {
    type Output = Vec<Symbol>;

    fn index(&self, var: &Symbol) -> &Vec<Symbol> {
        &self.0[var]
    }
}

/// Accumulated results of a verify pass: which provables checked out,
/// which were skipped as incomplete, and which failed.
#[derive(Default, Debug)]
pub struct VerifyResult {
    outcomes: HashMap<Label, ProofOutcome>,
}

impl VerifyResult {
    #[must_use]
    pub fn outcome(&self, label: Label) -> Option<&ProofOutcome> {
        self.outcomes.get(&label)
    }

    pub(crate) fn set(&mut self, label: Label, outcome: ProofOutcome) {
        self.outcomes.insert(label, outcome);
    }

    /// True iff every recorded outcome is `Verified` or `Incomplete` --
    /// i.e. nothing outright failed (spec §7: an incomplete proof must
    /// never be reported as success, but it also isn't a hard failure).
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.outcomes.values().all(ProofOutcome::is_ok)
    }

    #[must_use]
    pub fn failures(&self) -> Vec<(Label, &ProofError)> {
        self.outcomes
            .iter()
            .filter_map(|(&l, o)| match o {
                ProofOutcome::Failed(e) => Some((l, e)),
                _ => None,
            })
            .collect()
    }
}

/// Verifies a single provable's proof and returns the outcome (never
/// panics on a malformed proof; every failure mode from spec §4.4/§4.3/§7
/// is returned as data).
pub fn verify_one(
    assertion: &Assertion,
    label_name: &str,
    lookup: &dyn Fn(Label) -> Option<Arc<Assertion>>,
) -> ProofOutcome {
    let Some(raw) = &assertion.proof else {
        return ProofOutcome::Verified; // axioms have nothing to replay
    };
    match run(assertion, raw, label_name, lookup) {
        Ok(Outcome::Verified) => ProofOutcome::Verified,
        Ok(Outcome::Incomplete) => ProofOutcome::Incomplete,
        Err(e) => ProofOutcome::Failed(e),
    }
}

enum Outcome {
    Verified,
    Incomplete,
}

fn run(
    assertion: &Assertion,
    raw: &RawProof,
    label_name: &str,
    lookup: &dyn Fn(Label) -> Option<Arc<Assertion>>,
) -> Result<Outcome, ProofError> {
    let steps = proof::decode(raw, &assertion.frame.hyps, label_name)?;

    let mut stack: Vec<Expr> = Vec::new();
    let mut saved: Vec<Expr> = Vec::new();
    let mut incomplete = false;

    for step in steps {
        match step {
            Step::Unknown => {
                incomplete = true;
            }
            Step::Save => {
                let top = stack.last().cloned().ok_or_else(|| ProofError::StackUnderflow {
                    label: label_name.to_owned(),
                })?;
                saved.push(top);
            }
            Step::Load(k) => {
                if k < 0 || (k as usize) >= saved.len() {
                    return Err(ProofError::StepOutOfRange {
                        label: label_name.to_owned(),
                    });
                }
                stack.push(saved[k as usize].clone());
            }
            Step::Label(l) => {
                if let Some(hyp) = assertion.scope.floatings.get(&l) {
                    stack.push(Expr {
                        typecode: hyp.typecode,
                        symbols: vec![hyp.variable],
                    });
                } else if let Some(hyp) = assertion.scope.essentials.get(&l) {
                    stack.push(Expr {
                        typecode: hyp.typecode,
                        symbols: hyp.symbols.clone(),
                    });
                } else if let Some(applied) = lookup(l) {
                    let result = apply(&applied, &mut stack, label_name, &assertion.scope)?;
                    stack.push(result);
                } else {
                    return Err(ProofError::UnrecognizedLabel {
                        label: label_name.to_owned(),
                        referenced: format!("#{}", l.raw()),
                    });
                }
            }
        }
    }

    if incomplete {
        return Ok(Outcome::Incomplete);
    }

    if stack.len() == 1 && stack[0].typecode == assertion.typecode && stack[0].symbols == assertion.conclusion {
        Ok(Outcome::Verified)
    } else {
        Err(ProofError::WrongConclusion {
            label: label_name.to_owned(),
        })
    }
}

/// `apply(A)` from spec §4.4: pop `A`'s mandatory hypotheses off the stack,
/// unify them into a substitution, check disjoint restrictions, and push
/// the substituted conclusion.
fn apply(
    a: &Assertion,
    stack: &mut Vec<Expr>,
    label_name: &str,
    enclosing: &Scope,
) -> Result<Expr, ProofError> {
    let n = a.frame.hyps.len();
    if stack.len() < n {
        return Err(ProofError::StackUnderflow {
            label: label_name.to_owned(),
        });
    }
    let args: Vec<Expr> = stack.split_off(stack.len() - n);

    let mut subst = Substitutions(new_map());
    for (hyp_label, arg) in a.frame.hyps.iter().zip(args.iter()) {
        if let Some(hyp) = a.scope.floatings.get(hyp_label) {
            if arg.typecode != hyp.typecode {
                return Err(ProofError::TypeMismatch {
                    label: label_name.to_owned(),
                    applied: format!("#{}", a.label.raw()),
                });
            }
            if let Some(existing) = subst.0.get(&hyp.variable) {
                if existing != &arg.symbols {
                    return Err(ProofError::IncompatibleSubstitution {
                        label: label_name.to_owned(),
                        applied: format!("#{}", a.label.raw()),
                    });
                }
            } else {
                subst.0.insert(hyp.variable, arg.symbols.clone());
            }
        } else if let Some(hyp) = a.scope.essentials.get(hyp_label) {
            if arg.typecode != hyp.typecode {
                return Err(ProofError::TypeMismatch {
                    label: label_name.to_owned(),
                    applied: format!("#{}", a.label.raw()),
                });
            }
            let expected = apply_subst(&subst, &hyp.symbols, &a.scope);
            if expected != arg.symbols {
                return Err(ProofError::EssentialMismatch {
                    label: label_name.to_owned(),
                    applied: format!("#{}", a.label.raw()),
                });
            }
        }
    }

    check_disjoints(a, &subst, enclosing, label_name)?;

    let symbols = apply_subst(&subst, &a.conclusion, &a.scope);
    Ok(Expr {
        typecode: a.typecode,
        symbols,
    })
}

/// `apply_subst(σ, sequence)` from spec §4.4: left-to-right homomorphic
/// expansion of a symbol sequence under a substitution.
fn apply_subst(subst: &Substitutions, sequence: &[Symbol], scope: &Scope) -> Vec<Symbol> {
    let mut out = Vec::with_capacity(sequence.len());
    for &sym in sequence {
        if scope.variables.contains(&sym) {
            if let Some(bound) = subst.0.get(&sym) {
                out.extend(bound.iter().copied());
                continue;
            }
        }
        out.push(sym);
    }
    out
}

/// The disjoint-restriction check from spec §4.5: for each mandatory
/// disjoint pair of the applied assertion, every pair of variables drawn
/// from the two substituted sides (restricted to variables mandatory in
/// the *enclosing* provable) must itself be a disjoint pair of the
/// enclosing provable.
fn check_disjoints(
    a: &Assertion,
    subst: &Substitutions,
    enclosing: &Scope,
    label_name: &str,
) -> Result<(), ProofError> {
    for &DisjointPair(x, y) in &a.frame.disjoints {
        let (Some(sx), Some(sy)) = (subst.0.get(&x), subst.0.get(&y)) else {
            continue;
        };
        for &vx in sx.iter().filter(|s| enclosing.variables.contains(s)) {
            for &vy in sy.iter().filter(|s| enclosing.variables.contains(s)) {
                if vx == vy || !enclosing.disjoints.contains(&DisjointPair::new(vx, vy)) {
                    return Err(ProofError::DisjointViolation {
                        label: label_name.to_owned(),
                        applied: format!("#{}", a.label.raw()),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod verify_tests;
