//! String helpers shared by the tree engine and its adapters.
//!
//! Keys are matched character by character, but offsets are kept as byte
//! counts so that slices stay cheap. Every offset produced here falls on a
//! `char` boundary.

/// Length in bytes of the longest common prefix of `a` and `b`.
///
/// The returned offset is always a character boundary in both strings.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    let mut b_chars = b.chars();
    for ca in a.chars() {
        match b_chars.next() {
            Some(cb) if ca == cb => len += ca.len_utf8(),
            _ => break,
        }
    }
    len
}

/// The characters of `s` in reverse order.
pub fn reverse(s: &str) -> String {
    s.chars().rev().collect()
}

/// All non-empty suffixes of `s`, longest first.
///
/// `suffixes("banana")` yields `banana`, `anana`, `nana`, `ana`, `na`, `a`.
pub fn suffixes(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices().map(move |(i, _)| &s[i..])
}
