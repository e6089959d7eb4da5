//! A Metamath database loader and proof verifier.
//!
//! Load a `.mm` file with [`database::Database::parse`], then run
//! [`database::Database::verify_pass`] to replay every provable's proof
//! and collect the outcome. See `src/bin/mm-verify.rs` for the CLI built
//! on top of this library.

mod diag;
mod loader;
mod nameck;
mod parser;
mod proof;
mod scopeck;
mod util;
mod verify;

pub mod database;

pub use diag::{Diagnostic, MmError, ParseError, ProofError, ProofOutcome};
pub use loader::{FileLoader, FsLoader};
pub use nameck::{Atom, Label, NameKind, Nameset, Symbol, SymbolType, TypeCode};
pub use proof::{ProofTok, RawProof};
pub use scopeck::{Assertion, AssertionKind, DisjointPair, EssentialHyp, FloatingHyp, MandatoryFrame, Scope};
pub use verify::VerifyResult;
