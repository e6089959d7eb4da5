//! Proof representation and compressed-proof decoding (spec §4.3).
//!
//! The decode state machine is new to this spec (the teacher's own proof
//! replay lives in a `verify` module this pack did not retrieve), but the
//! `Step` vocabulary and the left-to-right, single-pass accumulation style
//! mirror `formula.rs`'s `FormulaBuilder::reduce`: one pass over the input,
//! an explicit small piece of mutable state (`acc` here, the builder's
//! `stack` there), emitting one resolved item at a time.

use crate::diag::ProofError;
use crate::nameck::Label;

/// A single proof token as written in the source, before resolution against
/// a particular assertion's mandatory/extra label lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofTok {
    Label(Label),
    /// `?` — an incomplete step (spec §7).
    Unknown,
}

/// The proof attached to a provable, exactly as read from the source
/// (spec §4.3): either a flat list of labels/`?`, or a compressed body with
/// its own list of "extra" referenced labels plus a run of `[A-Z?]` digits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawProof {
    Uncompressed(Vec<ProofTok>),
    Compressed { extra: Vec<Label>, chars: Vec<u8> },
}

/// A fully decoded proof step, ready for the verifier's stack machine
/// (spec §4.4). Unlike [`ProofTok`], `Save`/`Load`/`Unknown` are distinct
/// from `Label` rather than being folded into it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Label(Label),
    Save,
    /// 0-indexed reference into the saved-steps list; signed because the
    /// compressed encoding can produce an out-of-range (including negative)
    /// index for malformed input (spec §8, scenario 4), which the verifier
    /// must reject rather than panic on.
    Load(i64),
    Unknown,
}

/// Decodes a [`RawProof`] into the sequence of [`Step`]s the verifier
/// replays, resolving compressed digit runs against `mandatory` (the
/// assertion's own mandatory hypothesis labels, in order) and `extra` (the
/// parenthesized label list) per spec §4.3.
pub fn decode(proof: &RawProof, mandatory: &[Label], label: &str) -> Result<Vec<Step>, ProofError> {
    match proof {
        RawProof::Uncompressed(toks) => Ok(toks
            .iter()
            .map(|t| match t {
                ProofTok::Label(l) => Step::Label(*l),
                ProofTok::Unknown => Step::Unknown,
            })
            .collect()),
        RawProof::Compressed { extra, chars } => decode_compressed(mandatory, extra, chars, label),
    }
}

fn decode_compressed(
    mandatory: &[Label],
    extra: &[Label],
    chars: &[u8],
    label: &str,
) -> Result<Vec<Step>, ProofError> {
    let mut steps = Vec::new();
    let mut acc: i64 = 0;
    for &b in chars {
        match b {
            b'A'..=b'T' => {
                let n = acc * 20 + i64::from(b - b'A' + 1);
                steps.push(step_from_number(n, mandatory, extra)?);
                acc = 0;
            }
            b'U'..=b'Y' => {
                acc = acc * 5 + i64::from(b - b'T');
            }
            b'Z' => {
                steps.push(Step::Save);
                acc = 0;
            }
            b'?' => {
                steps.push(Step::Unknown);
                acc = 0;
            }
            _ => {
                return Err(ProofError::MalformedCompressedProof {
                    label: label.to_owned(),
                })
            }
        }
    }
    Ok(steps)
}

fn step_from_number(x: i64, mandatory: &[Label], extra: &[Label]) -> Result<Step, ProofError> {
    let m = mandatory.len() as i64;
    let l = extra.len() as i64;
    if x >= 1 && x <= m {
        Ok(Step::Label(mandatory[(x - 1) as usize]))
    } else if x > m && x <= m + l {
        Ok(Step::Label(extra[(x - m - 1) as usize]))
    } else {
        // Load index may legitimately be computed as negative or otherwise
        // out of range here; the verifier rejects it when it tries to
        // resolve against the saved-steps list (spec §8, scenario 4).
        Ok(Step::Load(x - m - l - 1))
    }
}

#[cfg(test)]
#[path = "proof_tests.rs"]
mod proof_tests;
