//! Small shared helpers used across the crate.
//!
//! Mirrors the teacher's own `util` module (referenced from `formula.rs` as
//! `crate::util::HashMap` / `crate::util::new_map`): a single place to swap
//! the hasher used by every interned-id map in the crate. The teacher's own
//! manifest depends on `fnv` for exactly this purpose, so this module keeps
//! the same hasher rather than reaching for an unrelated one.

use std::hash::BuildHasherDefault;

use fnv::FnvHasher;

/// Hash map keyed by interned ids, using a fast non-cryptographic hasher.
pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FnvHasher>>;

/// Hash set over interned ids.
pub type HashSet<K> = std::collections::HashSet<K, BuildHasherDefault<FnvHasher>>;

#[inline]
pub(crate) fn new_map<K, V>() -> HashMap<K, V> {
    HashMap::default()
}

#[inline]
pub(crate) fn new_set<K>() -> HashSet<K> {
    HashSet::default()
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
pub(crate) fn is_symbol_byte(b: u8) -> bool {
    (0x21..=0x7e).contains(&b) && b != b'$'
}

#[inline]
pub(crate) fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-'
}
