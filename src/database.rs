//! Main API entry point for loading and verifying Metamath databases.
//!
//! A `Database` is constructed empty, then grows monotonically as
//! `parser::parse` walks a loaded buffer and calls the `add_*`/`*_stmt`
//! mutation methods below. Once every statement has been read, `verify_pass`
//! replays every provable's proof and caches the result, following the
//! teacher's own pass-caching discipline (`nameset`/`scopes`/`verify` held as
//! `Option<Arc<T>>`, computed lazily and memoized) minus the segment-based
//! incremental-reparse machinery this spec's single-forward-pass parser has
//! no use for (see DESIGN.md).
//!
//! ## Parallelism and promises
//!
//! If you want to run a number of code fragments in parallel, get a
//! reference to the `Executor` for the current database, then use it to
//! queue a closure for each task you want to run; the queueing step returns
//! a `Promise` that can be used to wait for completion. `verify_pass` uses
//! exactly this to check independent provables concurrently when
//! `DbOptions::jobs > 1`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::fmt::Debug;
use std::panic;
use std::path::Path;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use crate::diag::{MmError, ParseError};
use crate::loader::{self, FsLoader};
use crate::nameck::{Label, NameKind, Nameset, Symbol, SymbolType, TypeCode};
use crate::parser;
use crate::proof::RawProof;
use crate::scopeck::{Assertion, AssertionKind, DisjointPair, Scope};
use crate::util::{new_map, new_set, HashMap};
use crate::verify::{self, VerifyResult};

/// Options affecting database processing, constant for the database's
/// lifetime.
#[derive(Copy, Clone, Debug)]
pub struct DbOptions {
    /// If true, time in milliseconds is printed after each pass completes.
    pub timing: bool,
    /// Number of jobs to run in parallel during `verify_pass`.
    pub jobs: usize,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            timing: false,
            jobs: 1,
        }
    }
}

/// Wraps a heap-allocated closure with a difficulty score used for sorting;
/// jobs are dispatched in descending order of estimated cost.
struct Job(usize, Box<dyn FnMut() + Send>);
impl PartialEq for Job {
    fn eq(&self, other: &Job) -> bool {
        self.0 == other.0
    }
}
impl Eq for Job {}
impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Job) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}
impl Ord for Job {
    fn cmp(&self, other: &Job) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// Holds the state of the work queue and allows queueing tasks onto the
/// thread pool.
#[derive(Clone)]
pub struct Executor {
    concurrency: usize,
    mutex: Arc<Mutex<BinaryHeap<Job>>>,
    work_cv: Arc<Condvar>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.mutex.lock().unwrap();
        write!(f, "Executor(active={})", g.len())
    }
}

fn queue_work(exec: &Executor, estimate: usize, mut f: Box<dyn FnMut() + Send>) {
    if exec.concurrency <= 1 {
        f();
        return;
    }
    let mut wq = exec.mutex.lock().unwrap();
    wq.push(Job(estimate, f));
    exec.work_cv.notify_one();
}

impl Executor {
    /// Instantiates a new work queue and creates the threads to service it.
    #[must_use]
    pub fn new(concurrency: usize) -> Executor {
        let mutex = Arc::new(Mutex::new(BinaryHeap::new()));
        let cv = Arc::new(Condvar::new());

        if concurrency > 1 {
            for _ in 0..concurrency {
                let mutex = mutex.clone();
                let cv = cv.clone();
                thread::spawn(move || loop {
                    let mut task: Job = {
                        let mut mutexg = mutex.lock().unwrap();
                        while mutexg.is_empty() {
                            mutexg = cv.wait(mutexg).unwrap();
                        }
                        mutexg.pop().unwrap()
                    };
                    (task.1)();
                });
            }
        }

        Executor {
            concurrency,
            mutex,
            work_cv: cv,
        }
    }

    /// Queues a job on this work queue, returning a `Promise` for its result.
    pub fn exec<TASK, RV>(&self, estimate: usize, task: TASK) -> Promise<RV>
    where
        TASK: FnOnce() -> RV + Send + 'static,
        RV: Send + 'static,
    {
        let parts = Arc::new((Mutex::new(None), Condvar::new()));

        let partsc = parts.clone();
        let mut task_o = Some(task);
        queue_work(
            self,
            estimate,
            Box::new(move || {
                let mut g = partsc.0.lock().unwrap();
                let task_f =
                    panic::AssertUnwindSafe(task_o.take().expect("should only be called once"));
                *g = Some(panic::catch_unwind(task_f));
                partsc.1.notify_one();
            }),
        );

        Promise::new_once(move || {
            let mut g = parts.0.lock().unwrap();
            while g.is_none() {
                g = parts.1.wait(g).unwrap();
            }
            g.take().unwrap().unwrap()
        })
    }
}

/// A handle for a value that will be available later.
pub struct Promise<T>(Box<dyn FnMut() -> T + Send>);

impl<T> Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Promise(..)")
    }
}

impl<T> Promise<T> {
    #[must_use]
    pub fn wait(mut self) -> T {
        (self.0)()
    }

    pub fn new_once<FN>(fun: FN) -> Promise<T>
    where
        FN: FnOnce() -> T + Send + 'static,
    {
        let mut funcell = Some(fun);
        Promise(Box::new(move || (funcell.take().unwrap())()))
    }

    pub fn new(value: T) -> Self
    where
        T: Send + 'static,
    {
        Promise::new_once(move || value)
    }

    #[must_use]
    pub fn join(promises: Vec<Promise<T>>) -> Promise<Vec<T>>
    where
        T: 'static,
    {
        Promise::new_once(move || promises.into_iter().map(Promise::wait).collect())
    }
}

fn time<R, F: FnOnce() -> R>(opts: &DbOptions, name: &str, f: F) -> R {
    let now = Instant::now();
    let ret = f();
    if opts.timing {
        log::debug!("{name} took {:?}", now.elapsed());
    }
    ret
}

fn spelling_to_string(spelling: &[u8]) -> String {
    String::from_utf8_lossy(spelling).into_owned()
}

/// A loaded Metamath database: the permanent name table, every frozen axiom
/// and provable, and (once `verify_pass` has run) the cached verification
/// outcome for each provable.
#[derive(Debug)]
pub struct Database {
    options: DbOptions,
    nameset: Nameset,
    scope_stack: Vec<Scope>,
    assertions: HashMap<Label, Arc<Assertion>>,
    provable_order: Vec<Label>,
    verify: Option<Arc<VerifyResult>>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DbOptions::default())
    }
}

impl Database {
    /// Constructs a new, empty database.
    #[must_use]
    pub fn new(options: DbOptions) -> Database {
        Database {
            options,
            nameset: Nameset::new(),
            scope_stack: vec![Scope::new()],
            assertions: new_map(),
            provable_order: Vec::new(),
            verify: None,
        }
    }

    /// Loads `root` from disk (resolving `$[ $]` inclusions) and parses it,
    /// mutating this (normally freshly constructed) database.
    pub fn parse(&mut self, root: &Path) -> Result<(), MmError> {
        time(&self.options, "parse", || {
            let buf = loader::load(&FsLoader, root)?;
            parser::parse(&buf, self)?;
            Ok(())
        })
    }

    /// Parses an in-memory buffer directly, with no inclusion resolution --
    /// the escape hatch used by tests and by callers who have already
    /// assembled their own buffer.
    pub fn parse_bytes(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        parser::parse(buf, self)
    }

    #[must_use]
    pub fn nameset(&self) -> &Nameset {
        &self.nameset
    }

    #[must_use]
    pub fn assertion(&self, label: Label) -> Option<&Arc<Assertion>> {
        self.assertions.get(&label)
    }

    #[must_use]
    pub fn assertion_named(&self, name: &str) -> Option<&Arc<Assertion>> {
        let label = self.nameset.lookup(name.as_bytes())?;
        self.assertions.get(&label)
    }

    /// Iterates over every provable statement's label, in the order it was
    /// declared.
    pub fn provables(&self) -> impl Iterator<Item = Label> + '_ {
        self.provable_order.iter().copied()
    }

    /// Replays and checks every provable's proof, caching the combined
    /// result. Dispatches each provable to `Executor` when `jobs > 1`;
    /// single-threaded and sequential otherwise (spec's default `jobs: 1`).
    pub fn verify_pass(&mut self) -> &Arc<VerifyResult> {
        if self.verify.is_none() {
            let opts = self.options;
            time(&opts, "verify", || {
                let mut result = VerifyResult::default();
                if opts.jobs > 1 {
                    let exec = Executor::new(opts.jobs);
                    let promises: Vec<_> = self
                        .provable_order
                        .iter()
                        .map(|&label| {
                            let assertion = self.assertions[&label].clone();
                            let name = spelling_to_string(self.nameset.atom_name(label));
                            let assertions = self.assertions.clone();
                            exec.exec(1, move || {
                                let lookup = |l: Label| assertions.get(&l).cloned();
                                (label, verify::verify_one(&assertion, &name, &lookup))
                            })
                        })
                        .collect();
                    for promise in promises {
                        let (label, outcome) = promise.wait();
                        result.set(label, outcome);
                    }
                } else {
                    let lookup = |l: Label| self.assertions.get(&l).cloned();
                    for &label in &self.provable_order {
                        let assertion = &self.assertions[&label];
                        let name = spelling_to_string(self.nameset.atom_name(label));
                        let outcome = verify::verify_one(assertion, &name, &lookup);
                        result.set(label, outcome);
                    }
                }
                self.verify = Some(Arc::new(result));
            });
        }
        self.verify_result()
    }

    /// Returns the cached verification result. Panics if `verify_pass` was
    /// not previously called.
    #[inline]
    #[must_use]
    pub fn verify_result(&self) -> &Arc<VerifyResult> {
        self.verify.as_ref().unwrap()
    }

    fn scope(&self) -> &Scope {
        self.scope_stack.last().expect("global scope never popped")
    }

    fn scope_mut(&mut self) -> &mut Scope {
        self.scope_stack.last_mut().expect("global scope never popped")
    }

    /// `${` -- pushes a clone of the active scope (spec §4.2/§3).
    pub(crate) fn push_scope(&mut self) {
        let top = self.scope().clone();
        self.scope_stack.push(top);
    }

    /// `$}` -- discards the active scope, restoring the one beneath it.
    pub(crate) fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    /// `$c` (spec §4.2).
    pub(crate) fn add_constant(&mut self, spelling: &[u8], offset: usize) -> Result<(), ParseError> {
        self.nameset
            .declare_constant(spelling)
            .map(|_| ())
            .map_err(|kind| ParseError::AlreadyDefined {
                spelling: spelling_to_string(spelling),
                kind: kind.as_str(),
                offset,
            })
    }

    /// `$v` (spec §4.2): interns the spelling as a variable if new, then
    /// activates it in the current scope.
    pub(crate) fn add_variable(&mut self, spelling: &[u8], offset: usize) -> Result<(), ParseError> {
        let atom = self
            .nameset
            .declare_or_lookup_variable(spelling)
            .map_err(|kind| ParseError::AlreadyDefined {
                spelling: spelling_to_string(spelling),
                kind: kind.as_str(),
                offset,
            })?;
        if !self.scope_mut().variables.insert(atom) {
            return Err(ParseError::VariableAlreadyActive {
                spelling: spelling_to_string(spelling),
                offset,
            });
        }
        Ok(())
    }

    /// `$d` (spec §3, §4.5): every unordered pair drawn from `vars` becomes
    /// disjoint in the current scope. Re-declaring an already-disjoint pair
    /// is a no-op (idempotent), since the restriction itself, not the
    /// statement that introduced it, is what matters downstream.
    pub(crate) fn disjoint_stmt(
        &mut self,
        vars: &[(Vec<u8>, usize)],
        offset: usize,
    ) -> Result<(), ParseError> {
        if vars.len() < 2 {
            return Err(ParseError::DisjointTooFew { offset });
        }
        let mut atoms = Vec::with_capacity(vars.len());
        for (spelling, off) in vars {
            let atom = self.resolve_active_variable(spelling, *off)?;
            if atoms.contains(&atom) {
                return Err(ParseError::DuplicateDisjointVariable {
                    spelling: spelling_to_string(spelling),
                    offset: *off,
                });
            }
            atoms.push(atom);
        }
        let scope = self.scope_mut();
        for i in 0..atoms.len() {
            for j in (i + 1)..atoms.len() {
                scope.disjoints.insert(DisjointPair::new(atoms[i], atoms[j]));
            }
        }
        Ok(())
    }

    /// `LABEL $f typecode variable $.` (spec §4.2).
    pub(crate) fn floating_stmt(
        &mut self,
        label: &[u8],
        label_off: usize,
        typecode: &[u8],
        tc_off: usize,
        var: &[u8],
        v_off: usize,
    ) -> Result<(), ParseError> {
        let label_atom = self.declare_label(label, label_off)?;
        let typecode_atom = self.resolve_constant(typecode, tc_off)?;
        let var_atom = self.resolve_active_variable(var, v_off)?;
        self.nameset
            .bind_variable_type(var_atom, typecode_atom)
            .map_err(|prev| ParseError::VariableTypeConflict {
                spelling: spelling_to_string(var),
                previous: spelling_to_string(self.nameset.atom_name(prev)),
                attempted: spelling_to_string(typecode),
                offset: v_off,
            })?;
        let scope = self.scope_mut();
        scope.floatings.insert(
            label_atom,
            crate::scopeck::FloatingHyp {
                label: label_atom,
                typecode: typecode_atom,
                variable: var_atom,
            },
        );
        scope.float_of.insert(var_atom, label_atom);
        Ok(())
    }

    /// `LABEL $e typecode symbols... $.` (spec §4.2).
    pub(crate) fn essential_stmt(
        &mut self,
        label: &[u8],
        label_off: usize,
        typecode: &[u8],
        tc_off: usize,
        syms: &[(Vec<u8>, usize)],
    ) -> Result<(), ParseError> {
        let label_atom = self.declare_label(label, label_off)?;
        let typecode_atom = self.resolve_constant(typecode, tc_off)?;
        let symbols = self.resolve_symbols(syms)?;
        self.scope_mut().essentials.insert(
            label_atom,
            crate::scopeck::EssentialHyp {
                label: label_atom,
                typecode: typecode_atom,
                symbols,
            },
        );
        Ok(())
    }

    /// `LABEL $a typecode symbols... $.` (spec §4.2).
    pub(crate) fn axiom_stmt(
        &mut self,
        label: &[u8],
        label_off: usize,
        typecode: &[u8],
        tc_off: usize,
        syms: &[(Vec<u8>, usize)],
    ) -> Result<(), ParseError> {
        let label_atom = self.declare_label(label, label_off)?;
        let typecode_atom = self.resolve_constant(typecode, tc_off)?;
        let conclusion = self.resolve_symbols(syms)?;
        let assertion = Assertion::new(
            label_atom,
            AssertionKind::Axiom,
            typecode_atom,
            conclusion,
            self.scope().clone(),
            None,
        );
        self.assertions.insert(label_atom, Arc::new(assertion));
        Ok(())
    }

    /// `LABEL $p typecode symbols... $= proof $.` (spec §4.2).
    pub(crate) fn provable_stmt(
        &mut self,
        label: &[u8],
        label_off: usize,
        typecode: &[u8],
        tc_off: usize,
        syms: &[(Vec<u8>, usize)],
        proof: RawProof,
    ) -> Result<(), ParseError> {
        let label_atom = self.declare_label(label, label_off)?;
        let typecode_atom = self.resolve_constant(typecode, tc_off)?;
        let conclusion = self.resolve_symbols(syms)?;
        let assertion = Assertion::new(
            label_atom,
            AssertionKind::Provable,
            typecode_atom,
            conclusion,
            self.scope().clone(),
            Some(proof),
        );
        self.assertions.insert(label_atom, Arc::new(assertion));
        self.provable_order.push(label_atom);
        self.verify = None;
        Ok(())
    }

    /// Resolves a proof-body token's spelling to a `Label` atom (spec
    /// §4.3): the label must already be declared somewhere earlier in the
    /// database (forward references are not permitted).
    pub(crate) fn resolve_proof_label(&mut self, spelling: &[u8], offset: usize) -> Result<Label, ParseError> {
        match self.nameset.lookup(spelling) {
            Some(atom) if self.nameset.kind_of(atom) == NameKind::Label => Ok(atom),
            _ => Err(ParseError::UndefinedLabel {
                label: spelling_to_string(spelling),
                offset,
            }),
        }
    }

    fn declare_label(&mut self, spelling: &[u8], offset: usize) -> Result<Label, ParseError> {
        self.nameset
            .declare_label(spelling)
            .map_err(|kind| ParseError::AlreadyDefined {
                spelling: spelling_to_string(spelling),
                kind: kind.as_str(),
                offset,
            })
    }

    fn resolve_constant(&self, spelling: &[u8], offset: usize) -> Result<TypeCode, ParseError> {
        match self.nameset.lookup(spelling) {
            None => Err(ParseError::UndefinedSymbol {
                spelling: spelling_to_string(spelling),
                offset,
            }),
            Some(atom) if self.nameset.kind_of(atom) == NameKind::Constant => Ok(atom),
            Some(_) => Err(ParseError::NotAConstant {
                spelling: spelling_to_string(spelling),
                offset,
            }),
        }
    }

    fn resolve_active_variable(&self, spelling: &[u8], offset: usize) -> Result<Symbol, ParseError> {
        match self.nameset.lookup(spelling) {
            None => Err(ParseError::UndefinedSymbol {
                spelling: spelling_to_string(spelling),
                offset,
            }),
            Some(atom) if self.nameset.kind_of(atom) != NameKind::Variable => Err(ParseError::UndefinedSymbol {
                spelling: spelling_to_string(spelling),
                offset,
            }),
            Some(atom) if !self.scope().variables.contains(&atom) => Err(ParseError::VariableNotActive {
                spelling: spelling_to_string(spelling),
                offset,
            }),
            Some(atom) => Ok(atom),
        }
    }

    fn resolve_symbols(&self, syms: &[(Vec<u8>, usize)]) -> Result<Vec<Symbol>, ParseError> {
        syms.iter()
            .map(|(spelling, offset)| self.resolve_symbol(spelling, *offset))
            .collect()
    }

    /// Resolves one symbol appearing in an essential hypothesis or an
    /// axiom/provable conclusion (spec §4.2's `essential_stmt`/`axiom_stmt`/
    /// `provable_stmt`): must be a constant, or an active variable that
    /// additionally has an active floating hypothesis in scope.
    fn resolve_symbol(&self, spelling: &[u8], offset: usize) -> Result<Symbol, ParseError> {
        let atom = self.nameset.lookup(spelling).ok_or_else(|| ParseError::UndefinedSymbol {
            spelling: spelling_to_string(spelling),
            offset,
        })?;
        match self.nameset.symbol_type_checked(atom) {
            Some(SymbolType::Constant) => Ok(atom),
            Some(SymbolType::Variable) => {
                if !self.scope().variables.contains(&atom) {
                    return Err(ParseError::VariableNotActive {
                        spelling: spelling_to_string(spelling),
                        offset,
                    });
                }
                if !self.scope().float_of.contains_key(&atom) {
                    return Err(ParseError::VariableMissingFloat {
                        spelling: spelling_to_string(spelling),
                        offset,
                    });
                }
                Ok(atom)
            }
            None => Err(ParseError::UndefinedSymbol {
                spelling: spelling_to_string(spelling),
                offset,
            }),
        }
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod database_tests;
