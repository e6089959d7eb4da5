use crate::database::{Database, DbOptions};
use crate::diag::ParseError;

fn parse(text: &[u8]) -> Result<Database, ParseError> {
    let mut db = Database::new(DbOptions::default());
    db.parse_bytes(text)?;
    Ok(db)
}

#[test]
fn comment_between_statements_is_skipped() {
    let db = parse(b"$c wff $.\n$( comment $)\n$v x $.\n").unwrap();
    assert!(db.nameset().lookup(b"wff").is_some());
    assert!(db.nameset().lookup(b"x").is_some());
}

#[test]
fn nested_comment_is_rejected() {
    let err = parse(b"$c wff $.\n$( outer $( nested $) $)").unwrap_err();
    assert!(matches!(err, ParseError::NestedComment { .. }));
}

#[test]
fn unterminated_comment_is_rejected() {
    let err = parse(b"$c wff $.\n$( unterminated").unwrap_err();
    assert!(matches!(err, ParseError::MalformedComment { .. }));
}

#[test]
fn duplicate_constant_is_an_already_defined_error() {
    let err = parse(b"$c a $.\n$c a $.\n").unwrap_err();
    match err {
        ParseError::AlreadyDefined { spelling, .. } => assert_eq!(spelling, "a"),
        other => panic!("expected AlreadyDefined, got {other:?}"),
    }
}

#[test]
fn constant_cannot_also_be_declared_a_variable() {
    let err = parse(b"$c a $.\n$v a $.\n").unwrap_err();
    assert!(matches!(err, ParseError::AlreadyDefined { .. }));
}

#[test]
fn label_cannot_collide_with_a_symbol_spelling() {
    let err = parse(b"$c wff $.\n$v x $.\nx $f wff x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::AlreadyDefined { .. }));
}

#[test]
fn block_scope_round_trips_and_hides_inner_declarations() {
    let text: &[u8] = b"
        $c wff $.
        $v x $.
        xf $f wff x $.
        ${
            $v y $.
            yf $f wff y $.
        $}
        outer $a wff x $.
    ";
    let db = parse(text).unwrap();
    assert!(db.assertion_named("outer").is_some());
    // y was declared inside the closed block, so it cannot be referenced now.
    let err = parse(b"$c wff $.\n${ $v y $. $}\nyf $f wff y $.\n").unwrap_err();
    assert!(matches!(err, ParseError::VariableNotActive { .. }));
}

#[test]
fn variable_reactivated_in_a_later_sibling_scope_keeps_its_type() {
    // `float_of` (the scope-local variable -> floating-label index) is
    // wiped on `$}`, same as the rest of the scope; a sibling block that
    // reactivates `x` must declare a fresh `$f` for it before using it,
    // exactly as spec.md §4.2 requires for axiom/essential statements.
    let text: &[u8] = b"
        $c wff $.
        ${
            $v x $.
            xf $f wff x $.
        $}
        ${
            $v x $.
            xf2 $f wff x $.
            ax $a wff x $.
        $}
    ";
    let db = parse(text).unwrap();
    let ax = db.assertion_named("ax").unwrap();
    assert_eq!(ax.conclusion.len(), 1);
    let x = db.nameset().lookup(b"x").unwrap();
    let wff = db.nameset().lookup(b"wff").unwrap();
    assert_eq!(db.nameset().variable_type(x), Some(wff));
}

#[test]
fn reactivated_variable_without_a_fresh_floating_hyp_cannot_be_used() {
    let text: &[u8] = b"
        $c wff $.
        ${
            $v x $.
            xf $f wff x $.
        $}
        ${
            $v x $.
            ax $a wff x $.
        $}
    ";
    let err = parse(text).unwrap_err();
    assert!(matches!(err, ParseError::VariableMissingFloat { .. }));
}

#[test]
fn redeclaring_a_variable_still_active_in_the_current_scope_is_rejected() {
    let err = parse(b"$c wff $.\n$v x $.\n$v x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::VariableAlreadyActive { .. }));
}

#[test]
fn essential_hypothesis_requires_an_active_floating_for_its_variables() {
    let err = parse(b"$c wff |- $.\n$v x $.\nax.e $e |- x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::VariableMissingFloat { .. }));
}

#[test]
fn disjoint_statement_rejects_a_duplicated_variable() {
    let err = parse(b"$c wff $.\n$v x $.\n$d x x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::DuplicateDisjointVariable { .. }));
}

#[test]
fn disjoint_statement_requires_at_least_two_variables() {
    let err = parse(b"$c wff $.\n$v x $.\n$d x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::DisjointTooFew { .. }));
}

#[test]
fn redeclaring_an_existing_disjoint_pair_is_idempotent() {
    let db = parse(b"$c wff $.\n$v x y $.\n$d x y $.\n$d y x $.\nax $a wff x $.\n").unwrap();
    let ax = db.assertion_named("ax").unwrap();
    assert_eq!(ax.scope.disjoints.len(), 1);
}

#[test]
fn constant_declaration_inside_a_block_is_rejected() {
    let err = parse(b"$c wff $.\n${ $c bad $. $}\n").unwrap_err();
    assert!(matches!(err, ParseError::ConstantInBlock { .. }));
}

#[test]
fn variable_typed_inconsistently_is_rejected() {
    let text: &[u8] = b"
        $c wff class $.
        $v x $.
        xf $f wff x $.
        xg $f class x $.
    ";
    let err = parse(text).unwrap_err();
    assert!(matches!(err, ParseError::VariableTypeConflict { .. }));
}

#[test]
fn unmatched_close_block_is_rejected() {
    let err = parse(b"$c wff $.\n$}\n").unwrap_err();
    assert!(matches!(err, ParseError::UnmatchedCloseBlock { .. }));
}

#[test]
fn missing_block_terminator_is_rejected() {
    let err = parse(b"$c wff $.\n${\n$v x $.\n").unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedBlock { .. }));
}
