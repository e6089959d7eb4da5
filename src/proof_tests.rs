use super::*;
use crate::nameck::Nameset;

fn labels(n: usize) -> (Nameset, Vec<Label>) {
    let mut ns = Nameset::new();
    let labels = (0..n)
        .map(|i| ns.declare_label(format!("L{i}").as_bytes()).unwrap())
        .collect();
    (ns, labels)
}

#[test]
fn uncompressed_round_trips_labels_and_unknown() {
    let (_ns, mandatory) = labels(2);
    let proof = RawProof::Uncompressed(vec![
        ProofTok::Label(mandatory[0]),
        ProofTok::Unknown,
        ProofTok::Label(mandatory[1]),
    ]);
    let steps = decode(&proof, &mandatory, "th").unwrap();
    assert_eq!(
        steps,
        vec![Step::Label(mandatory[0]), Step::Unknown, Step::Label(mandatory[1])]
    );
}

#[test]
fn compressed_resolves_mandatory_and_extra_labels() {
    let (_ns, mandatory) = labels(1);
    let (_ns2, extra) = labels(1);
    // 'B' = 2: falls past the single mandatory hyp, into the extra list.
    let proof = RawProof::Compressed {
        extra: extra.clone(),
        chars: b"B".to_vec(),
    };
    let steps = decode(&proof, &mandatory, "th").unwrap();
    assert_eq!(steps, vec![Step::Label(extra[0])]);
}

#[test]
fn compressed_z_emits_save_and_resets_accumulator() {
    let (_ns, mandatory) = labels(1);
    // Z (save), then 'B' = 2, which is one past the single mandatory hyp and
    // the (empty) extra list, so it resolves to Load(0) -- the first saved step.
    let proof = RawProof::Compressed {
        extra: Vec::new(),
        chars: b"ZB".to_vec(),
    };
    let steps = decode(&proof, &mandatory, "th").unwrap();
    assert_eq!(steps, vec![Step::Save, Step::Load(0)]);
}

#[test]
fn compressed_multi_letter_accumulates_before_emitting() {
    let (_ns, mandatory) = labels(25);
    // "UAA": 'U' accumulates 1, then 'A' emits 1*20 + 1 = 21 (mandatory[20]);
    // the accumulator resets, so the second 'A' emits 0*20 + 1 = 1 (mandatory[0]).
    let proof = RawProof::Compressed {
        extra: Vec::new(),
        chars: b"UAA".to_vec(),
    };
    let steps = decode(&proof, &mandatory, "th").unwrap();
    assert_eq!(steps, vec![Step::Label(mandatory[20]), Step::Label(mandatory[0])]);
}

#[test]
fn compressed_rejects_invalid_byte() {
    let (_ns, mandatory) = labels(1);
    let proof = RawProof::Compressed {
        extra: Vec::new(),
        chars: b"0".to_vec(),
    };
    let err = decode(&proof, &mandatory, "th").unwrap_err();
    assert!(matches!(err, ProofError::MalformedCompressedProof { .. }));
}

#[test]
fn compressed_out_of_range_reference_is_a_negative_load() {
    let (_ns, mandatory) = labels(1);
    // 'A' = 1 is in range (mandatory[0]); nothing here tests the boundary --
    // this checks that a too-small total with no saves yields a negative
    // Load index rather than panicking, leaving the range check to the verifier.
    let proof = RawProof::Compressed {
        extra: Vec::new(),
        chars: b"C".to_vec(), // 3: past mandatory (1) and extra (0)
    };
    let steps = decode(&proof, &mandatory, "th").unwrap();
    assert_eq!(steps, vec![Step::Load(1)]);
}
