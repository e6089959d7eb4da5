use super::*;
use crate::diag::ProofOutcome;

const DB_TEXT: &[u8] = b"
    $c wff |- $.
    $v x y $.
    xf $f wff x $.
    yf $f wff y $.
    ax1 $a wff x $.
    ax2 $a wff y $.
    p1 $p wff x $= xf ax1 $.
    p2 $p wff y $= yf ax2 $.
";

#[test]
fn provables_are_iterated_in_declaration_order() {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(DB_TEXT).unwrap();
    let names: Vec<String> = db
        .provables()
        .map(|l| String::from_utf8_lossy(db.nameset().atom_name(l)).into_owned())
        .collect();
    assert_eq!(names, vec!["p1", "p2"]);
}

#[test]
fn assertion_named_finds_axioms_and_provables() {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(DB_TEXT).unwrap();
    assert!(db.assertion_named("ax1").is_some());
    assert!(db.assertion_named("p1").is_some());
    assert!(db.assertion_named("nonexistent").is_none());
}

#[test]
fn verify_pass_is_cached_until_another_provable_is_added() {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(DB_TEXT).unwrap();
    let first = Arc::as_ptr(db.verify_pass());
    let second = Arc::as_ptr(db.verify_pass());
    assert!(
        std::ptr::eq(first, second),
        "verify_pass should reuse the cached result instead of recomputing"
    );
}

#[test]
fn verify_pass_with_multiple_jobs_matches_single_threaded_result() {
    let mut sequential = Database::new(DbOptions::default());
    sequential.parse_bytes(DB_TEXT).unwrap();
    sequential.verify_pass();

    let mut parallel = Database::new(DbOptions {
        timing: false,
        jobs: 4,
    });
    parallel.parse_bytes(DB_TEXT).unwrap();
    parallel.verify_pass();

    for label in sequential.provables() {
        let name = String::from_utf8_lossy(sequential.nameset().atom_name(label)).into_owned();
        let other_label = parallel.nameset().lookup(name.as_bytes()).unwrap();
        assert_eq!(
            sequential.verify_result().outcome(label),
            parallel.verify_result().outcome(other_label),
        );
    }
}

#[test]
fn all_provables_verify_in_a_well_formed_database() {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(DB_TEXT).unwrap();
    let result = db.verify_pass();
    assert!(result.all_ok());
    for label in db.provables() {
        assert_eq!(result.outcome(label), Some(&ProofOutcome::Verified));
    }
}

#[test]
fn executor_runs_queued_jobs_and_promises_resolve() {
    let exec = Executor::new(2);
    let promises: Vec<_> = (0..8).map(|i| exec.exec(1, move || i * i)).collect();
    let mut results: Vec<i32> = Promise::join(promises).wait();
    results.sort_unstable();
    assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36, 49]);
}

#[test]
fn parse_bytes_rejects_malformed_input_without_panicking() {
    let mut db = Database::new(DbOptions::default());
    let err = db.parse_bytes(b"$c a $.\n$c a $.\n").unwrap_err();
    assert!(matches!(err, crate::diag::ParseError::AlreadyDefined { .. }));
}
