//! The fixed alphabet of the rule language and the marker characters that give rule text
//! its structure. Ranges and negated classes are resolved against the rank (index) of a
//! character in [`ALPHABET`].

use std::collections::HashMap;

/// Every character usable as a symbol, a state character or an escape target, in rank order.
/// Lower-case letters are absent because rule text is upper-cased before parsing, and so are
/// `_`, `` ` `` and `~`.
pub const ALPHABET: &str =
    " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^{|}";
/// Number of characters in [`ALPHABET`].
pub const ALPHABET_LEN: usize = ALPHABET.len();

/// Takes the following character literally.
pub const ESCAPE: char = '\\';
/// Denotes the blank symbol in symbol fields.
pub const SPACE_MARKER: char = '-';
/// Marks a class as the complement of its content.
pub const NEGATION: char = '^';
/// Repeated [`RANGE_MARKER_COUNT`] times, forms the range operator (`A..Z`).
pub const RANGE_MARKER: char = '.';
pub const RANGE_MARKER_COUNT: usize = 2;

lazy_static::lazy_static! {
    static ref RANKS: HashMap<char, usize> = ALPHABET.chars().enumerate().map(|(i, c)| (c, i)).collect();
}

/// Returns the rank of `c` in the alphabet.
pub fn rank(c: char) -> Option<usize> {
    RANKS.get(&c).copied()
}

/// Returns the character at `rank`.
pub fn char_at(rank: usize) -> Option<char> {
    ALPHABET.as_bytes().get(rank).map(|&b| b as char)
}
