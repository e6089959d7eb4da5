//! Diagnostics: the two fatal error kinds from spec §7, plus the rendering
//! used by the `mm-verify` binary to print them to standard error.
//!
//! Grounded on the teacher's own `diag` module, referenced throughout
//! `database.rs` (`diag::to_annotations`, `DiagnosticClass`, `Notation`).
//! The teacher's version accumulates a `Vec<Notation>` across whole passes
//! for incremental re-display; this spec's error model is "first error
//! aborts the run" (spec §7), so `Diagnostic` here renders a single
//! [`MmError`] rather than a batch.

use std::fmt;

use thiserror::Error;

/// Errors raised while loading, tokenizing or scoping a database (spec §4.1, §4.2).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("comments may not be nested (byte offset {offset})")]
    NestedComment { offset: usize },

    #[error("malformed comment: unterminated at byte offset {offset}")]
    MalformedComment { offset: usize },

    #[error("malformed inclusion directive at byte offset {offset}")]
    MalformedInclusion { offset: usize },

    #[error("inclusion only at top level (byte offset {offset})")]
    InclusionInsideBlock { offset: usize },

    #[error("could not read included file {path}: {message}")]
    Io { path: String, message: String },

    #[error("unexpected end of input at byte offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid byte in input at offset {offset}")]
    InvalidByte { offset: usize },

    #[error("empty symbol at byte offset {offset}")]
    EmptySymbol { offset: usize },

    #[error("unexpected introducer '${introducer}' at byte offset {offset}")]
    UnexpectedIntroducer { offset: usize, introducer: String },

    #[error("'$c' not permitted inside a block (byte offset {offset})")]
    ConstantInBlock { offset: usize },

    #[error("unmatched '$}}' at byte offset {offset}")]
    UnmatchedCloseBlock { offset: usize },

    #[error("unterminated block: missing '$}}' (byte offset {offset})")]
    UnterminatedBlock { offset: usize },

    #[error("missing statement terminator '$.' at byte offset {offset}")]
    MissingTerminator { offset: usize },

    #[error("'{spelling}' is already defined as a {kind} (byte offset {offset})")]
    AlreadyDefined {
        spelling: String,
        kind: &'static str,
        offset: usize,
    },

    #[error("variable '{spelling}' is already active in this scope (byte offset {offset})")]
    VariableAlreadyActive { spelling: String, offset: usize },

    #[error("undefined symbol '{spelling}' (byte offset {offset})")]
    UndefinedSymbol { spelling: String, offset: usize },

    #[error("'{spelling}' is not a declared constant (byte offset {offset})")]
    NotAConstant { spelling: String, offset: usize },

    #[error("variable '{spelling}' is not active (byte offset {offset})")]
    VariableNotActive { spelling: String, offset: usize },

    #[error(
        "variable '{spelling}' was already typed '{previous}', cannot retype as '{attempted}' \
         (byte offset {offset})"
    )]
    VariableTypeConflict {
        spelling: String,
        previous: String,
        attempted: String,
        offset: usize,
    },

    #[error("variable '{spelling}' has no active floating hypothesis (byte offset {offset})")]
    VariableMissingFloat { spelling: String, offset: usize },

    #[error("'{spelling}' appears more than once in a disjoint statement (byte offset {offset})")]
    DuplicateDisjointVariable { spelling: String, offset: usize },

    #[error("a disjoint statement needs at least two variables (byte offset {offset})")]
    DisjointTooFew { offset: usize },

    #[error("undefined label '{label}' referenced in proof (byte offset {offset})")]
    UndefinedLabel { label: String, offset: usize },
}

/// Errors raised while replaying a proof (spec §4.3, §4.4).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("proof for '{label}': stack underflow")]
    StackUnderflow { label: String },

    #[error("proof for '{label}': unrecognized label '{referenced}'")]
    UnrecognizedLabel { label: String, referenced: String },

    #[error("proof for '{label}': save/load index out of range")]
    StepOutOfRange { label: String },

    #[error("proof for '{label}': malformed compressed proof")]
    MalformedCompressedProof { label: String },

    #[error("proof for '{label}': type mismatch applying '{applied}'")]
    TypeMismatch { label: String, applied: String },

    #[error("proof for '{label}': incompatible substitution for variable while applying '{applied}'")]
    IncompatibleSubstitution { label: String, applied: String },

    #[error("proof for '{label}': essential hypothesis mismatch while applying '{applied}'")]
    EssentialMismatch { label: String, applied: String },

    #[error("proof for '{label}': disjoint restriction violated while applying '{applied}'")]
    DisjointViolation { label: String, applied: String },

    #[error("proof for '{label}': did not yield the expected conclusion")]
    WrongConclusion { label: String },
}

/// Top-level error type returned by [`crate::database::Database`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MmError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Proof(#[from] ProofError),
}

/// Outcome of verifying a single provable: either it checked out, it failed,
/// or it could not be checked because its proof contained a `?`/`UNKNOWN`
/// step (spec §7: such a proof must never be silently reported as success).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    Verified,
    Incomplete,
    Failed(ProofError),
}

impl ProofOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, ProofOutcome::Verified | ProofOutcome::Incomplete)
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, ProofOutcome::Failed(_))
    }
}

/// A renderable diagnostic, used by the CLI to print to standard error.
///
/// Thin wrapper so the binary doesn't need to know about `thiserror`'s
/// `Display` vs. `Debug` distinction; kept separate from `MmError` itself
/// because the teacher's own `Notation`/`Diagnostic` split keeps the error
/// *data* (in `scopeck`/`verify`-adjacent modules) apart from its rendering.
pub struct Diagnostic<'a>(pub &'a MmError);

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            MmError::Parse(e) => write!(f, "parse error: {e}"),
            MmError::Proof(e) => write!(f, "proof error: {e}"),
        }
    }
}
