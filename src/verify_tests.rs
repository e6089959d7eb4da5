use crate::database::{Database, DbOptions};
use crate::diag::{ProofError, ProofOutcome};

fn mkdb(text: &[u8]) -> Database {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(text).expect("parse should succeed");
    db
}

fn outcome_of<'a>(db: &'a Database, name: &str) -> &'a ProofOutcome {
    let label = db.nameset().lookup(name.as_bytes()).unwrap();
    db.verify_result().outcome(label).unwrap()
}

const MINIMAL_DB: &[u8] = b"
    $c wff $.
    $v x $.
    xf $f wff x $.
    ax1 $a wff x $.
    p1 $p wff x $= xf ax1 $.
";

#[test]
fn minimal_proof_verifies() {
    let mut db = mkdb(MINIMAL_DB);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Verified);
}

#[test]
fn compressed_encoding_of_the_same_proof_also_verifies() {
    // p1's own mandatory frame is [xf] (m=1); the parenthesized extra list
    // is [ax1] (l=1), so 'A' = Label(xf) (1<=m) and 'B' = Label(ax1)
    // (m < 2 <= m+l).
    let text: &[u8] = b"
        $c wff $.
        $v x $.
        xf $f wff x $.
        ax1 $a wff x $.
        p1 $p wff x $= ( ax1 ) AB $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Verified);
}

#[test]
fn proof_with_unknown_step_is_reported_incomplete_not_success() {
    let text: &[u8] = b"
        $c wff $.
        $v x $.
        xf $f wff x $.
        ax1 $a wff x $.
        p1 $p wff x $= ? $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Incomplete);
    assert!(db.verify_result().all_ok());
}

#[test]
fn wrong_conclusion_is_a_proof_error() {
    let text: &[u8] = b"
        $c wff |- $.
        $v x $.
        xf $f wff x $.
        ax1 $a wff x $.
        p1 $p |- x $= xf ax1 $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    match outcome_of(&db, "p1") {
        ProofOutcome::Failed(ProofError::WrongConclusion { .. }) => {}
        other => panic!("expected WrongConclusion, got {other:?}"),
    }
    assert!(!db.verify_result().all_ok());
}

#[test]
fn stack_underflow_when_a_hypothesis_is_missing() {
    let text: &[u8] = b"
        $c wff $.
        $v x $.
        xf $f wff x $.
        ax1 $a wff x $.
        p1 $p wff x $= ax1 $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    match outcome_of(&db, "p1") {
        ProofOutcome::Failed(ProofError::StackUnderflow { .. }) => {}
        other => panic!("expected StackUnderflow, got {other:?}"),
    }
}

#[test]
fn disjoint_restriction_violation_is_detected_across_a_shared_substitution() {
    let text: &[u8] = b"
        $c wff -- $.
        $v x y a $.
        $d x y $.
        xf $f wff x $.
        yf $f wff y $.
        af $f wff a $.
        th $a wff -- x y $.
        p2 $p wff -- a a $= af af th $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    match outcome_of(&db, "p2") {
        ProofOutcome::Failed(ProofError::DisjointViolation { .. }) => {}
        other => panic!("expected DisjointViolation, got {other:?}"),
    }
}

#[test]
fn disjoint_restriction_is_satisfied_when_substituted_variables_are_themselves_disjoint() {
    let text: &[u8] = b"
        $c wff -- $.
        $v x y a b $.
        $d x y $.
        $d a b $.
        xf $f wff x $.
        yf $f wff y $.
        af $f wff a $.
        bf $f wff b $.
        th $a wff -- x y $.
        p2 $p wff -- a b $= af bf th $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p2"), &ProofOutcome::Verified);
}

#[test]
fn essential_hypothesis_is_checked_against_its_substituted_form() {
    // ax1 depends on essential ax1.e, which becomes mandatory; proving it
    // requires supplying a matching |- x on the stack first.
    let text: &[u8] = b"
        $c wff |- $.
        $v x $.
        xf $f wff x $.
        ax1.e $e |- x $.
        ax1 $a |- x $.
        p1 $p |- x $= xf ax1.e ax1 $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Verified);
}

#[test]
fn substituted_conclusion_applies_variable_bindings_in_order() {
    let text: &[u8] = b"
        $c wff -> $.
        $v ph ps $.
        wph $f wff ph $.
        wps $f wff ps $.
        wi $a wff ph -> ps $.
        p1 $p wff ph -> ps $= wph wps wi $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Verified);
}

#[test]
fn save_and_load_reuse_a_previously_pushed_subproof() {
    // p1's own mandatory frame is [wph] (m=1); the parenthesized extra list
    // is [wi] (l=1). "AZCB" decodes to: A=1 -> Label(wph); Z -> Save;
    // C=3 -> past m+l(2) -> Load(3-1-1-1)=Load(0); B=2 -> Label(extra[0]=wi).
    // So the proof pushes wph once, saves it, reloads the saved copy as a
    // second argument, then applies wi to both -- proving `ph -> ph`
    // without ever re-deriving wph's hypothesis a second time.
    let text: &[u8] = b"
        $c wff ( ) -> $.
        $v ph ps $.
        wph $f wff ph $.
        wps $f wff ps $.
        wi $a wff ( ph -> ps ) $.
        p1 $p wff ( ph -> ph ) $= ( wi ) AZCB $.
    ";
    let mut db = mkdb(text);
    db.verify_pass();
    assert_eq!(outcome_of(&db, "p1"), &ProofOutcome::Verified);
}
