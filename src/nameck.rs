//! Symbol and label interning: the permanent, never-rolled-back part of the
//! database (spec §3: "constants, variables, and labels grow monotonically").
//!
//! Grounded on the teacher's naming scheme (`formula.rs`: `pub type TypeCode
//! = Atom; pub type Symbol = Atom; pub type Label = Atom;` and
//! `nset.atom_name(..)` / `names.lookup_symbol(..)` / `names.lookup_label(..)`
//! used throughout `grammar_tests.rs`): one dense interned id type, `Atom`,
//! shared by symbols and labels, backed by a single spelling table so that
//! the "no spelling may be reused across constants, variables and labels"
//! invariant falls out of one hash-map lookup instead of three.
//!
//! Because every spelling is interned exactly once and the table is never
//! rolled back, an `Atom`'s numeric value is also its global declaration
//! order -- `scopeck::MandatoryFrame` relies on this to sort mandatory
//! hypotheses (spec §4.5's "sort by the order each label was first declared
//! in the database").

use std::num::NonZeroU32;

use crate::util::HashMap;

/// A dense interned id, shared by the symbol and label namespaces.
///
/// Symbols and labels are drawn from the same spelling table (so a spelling
/// can never be reused across the two), but they are never confused with
/// each other in practice: [`Nameset::kind_of`] always knows which kind a
/// given atom is, and the rest of the crate only ever holds an `Atom` in a
/// context (`Symbol`, `TypeCode`, `Label`) that pins down which one it means.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(NonZeroU32);

impl Atom {
    #[inline]
    pub(crate) fn raw(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Debug for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

/// An interned math symbol (constant or variable spelling).
pub type Symbol = Atom;
/// An interned label spelling.
pub type Label = Atom;
/// An interned constant used in typecode position.
pub type TypeCode = Atom;

/// Which of the three permanent namespaces an [`Atom`] belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameKind {
    Constant,
    Variable,
    Label,
}

impl NameKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NameKind::Constant => "constant",
            NameKind::Variable => "variable",
            NameKind::Label => "label",
        }
    }
}

/// Whether a [`Symbol`] is a constant or a variable (spec §3: "a symbol is
/// exactly one of the two for the lifetime of the database").
///
/// Placed here rather than in `parser.rs` because it is a property of the
/// permanent name table, not of the byte-level grammar; re-exported from
/// `parser` for call sites that import it from there, matching the
/// teacher's own `use crate::parser::SymbolType;` in `formula.rs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolType {
    Constant,
    Variable,
}

/// The permanent symbol/label table for one database.
///
/// Everything here grows monotonically for the lifetime of the database;
/// nothing is ever removed, matching spec §3's invariant list.
#[derive(Default, Debug)]
pub struct Nameset {
    spellings: Vec<Box<[u8]>>,
    kinds: Vec<NameKind>,
    table: HashMap<Box<[u8]>, Atom>,
    /// The typecode a variable was first assigned, preserved across scope
    /// exits and re-activations (spec §3: "A variable may be assigned at
    /// most one type across the whole database").
    var_types: HashMap<Atom, TypeCode>,
}

impl Nameset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, spelling: &[u8]) -> Option<Atom> {
        self.table.get(spelling).copied()
    }

    #[must_use]
    pub fn atom_name(&self, atom: Atom) -> &[u8] {
        &self.spellings[(atom.raw() - 1) as usize]
    }

    #[must_use]
    pub fn kind_of(&self, atom: Atom) -> NameKind {
        self.kinds[(atom.raw() - 1) as usize]
    }

    fn intern(&mut self, spelling: &[u8], kind: NameKind) -> Atom {
        let idx = self.spellings.len() as u32 + 1;
        let atom = Atom(NonZeroU32::new(idx).expect("nonzero by construction"));
        self.spellings.push(spelling.into());
        self.kinds.push(kind);
        self.table.insert(spelling.into(), atom);
        atom
    }

    /// `add_constant` (spec §4.2): error if already a constant, variable or label.
    pub fn declare_constant(&mut self, spelling: &[u8]) -> Result<Atom, NameKind> {
        if let Some(existing) = self.lookup(spelling) {
            return Err(self.kind_of(existing));
        }
        Ok(self.intern(spelling, NameKind::Constant))
    }

    /// `add_label` (spec §4.2): error if already a label, constant or variable.
    pub fn declare_label(&mut self, spelling: &[u8]) -> Result<Label, NameKind> {
        if let Some(existing) = self.lookup(spelling) {
            return Err(self.kind_of(existing));
        }
        Ok(self.intern(spelling, NameKind::Label))
    }

    /// Returns the atom for a variable spelling, interning it if this is the
    /// first time it has ever been seen. Errors (with the conflicting kind)
    /// if the spelling already names a constant or label. Activation in the
    /// current scope and "already active" checks are the caller's job
    /// ([`crate::scopeck::Scope`]), since that's scoped state this table
    /// doesn't track.
    pub fn declare_or_lookup_variable(&mut self, spelling: &[u8]) -> Result<Symbol, NameKind> {
        if let Some(existing) = self.lookup(spelling) {
            let kind = self.kind_of(existing);
            return if kind == NameKind::Variable {
                Ok(existing)
            } else {
                Err(kind)
            };
        }
        Ok(self.intern(spelling, NameKind::Variable))
    }

    /// Binds or checks a variable's permanent typecode. Returns `Ok(())` if
    /// the assignment is new or consistent with a prior one, `Err` with the
    /// previously bound typecode otherwise.
    pub fn bind_variable_type(&mut self, var: Symbol, typecode: TypeCode) -> Result<(), TypeCode> {
        match self.var_types.get(&var) {
            Some(&prev) if prev == typecode => Ok(()),
            Some(&prev) => Err(prev),
            None => {
                self.var_types.insert(var, typecode);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn variable_type(&self, var: Symbol) -> Option<TypeCode> {
        self.var_types.get(&var).copied()
    }

    /// Returns `None` when `atom` turns out to name a label rather than a
    /// symbol -- used where the atom came from parsing a statement body and
    /// might be any kind of spelling.
    #[must_use]
    pub fn symbol_type_checked(&self, atom: Atom) -> Option<SymbolType> {
        match self.kind_of(atom) {
            NameKind::Constant => Some(SymbolType::Constant),
            NameKind::Variable => Some(SymbolType::Variable),
            NameKind::Label => None,
        }
    }
}
