//! RFC 4648 Base32 codec for human-entered secrets.
//!
//! Decoding strips whitespace and is case-insensitive. By default, characters
//! outside of the alphabet are skipped instead of rejected, and trailing bits
//! that do not fill a whole byte are dropped.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const BITS_PER_CHAR: u32 = 5;

/// How characters outside of the alphabet are handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Skip unknown characters silently.
    #[default]
    Lenient,
    /// Fail on the first unknown character.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("{character:?} at position {position} is not a base32 character")]
    InvalidCharacter { character: char, position: usize },
}

/// Position of an (already uppercased) character in the alphabet.
#[inline]
fn index_of(c: char) -> Option<u32> {
    if !c.is_ascii() {
        return None;
    }

    ALPHABET
        .iter()
        .position(|&b| b == c as u8)
        .map(|idx| idx as u32)
}

/// Whitespace as understood by browsers' `\s`: Unicode `White_Space`
/// without U+0085, plus the byte order mark U+FEFF.
pub(crate) fn is_separator(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// Uppercased characters of `input`, separators removed.
pub(crate) fn normalized(input: &str) -> impl Iterator<Item = char> + '_ {
    input
        .chars()
        .filter(|&c| !is_separator(c))
        .flat_map(char::to_uppercase)
}

/// Decode `input`, skipping every character outside of the alphabet.
///
/// Empty or all-invalid input yields an empty vector.
pub fn decode(input: &str) -> Vec<u8> {
    let indices = normalized(input).filter_map(index_of);
    pack(indices)
}

/// Decode `input` according to `mode`.
///
/// # Errors
///
/// Returns `Err` in [`DecodeMode::Strict`] when a character is not part of
/// the alphabet. `position` counts non-whitespace characters.
pub fn decode_with(
    input: &str,
    mode: DecodeMode,
) -> Result<Vec<u8>, DecodeError> {
    match mode {
        DecodeMode::Lenient => Ok(decode(input)),
        DecodeMode::Strict => {
            let indices = Zeroizing::new(
                normalized(input)
                    .enumerate()
                    .map(|(position, character)| {
                        index_of(character).ok_or(DecodeError::InvalidCharacter {
                            character,
                            position,
                        })
                    })
                    .collect::<Result<Vec<u32>, DecodeError>>()?,
            );

            Ok(pack(indices.iter().copied()))
        },
    }
}

/// Concatenate 5-bit groups and emit each complete byte.
fn pack(indices: impl Iterator<Item = u32>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for index in indices {
        buffer = (buffer << BITS_PER_CHAR) | index;
        bits += BITS_PER_CHAR;

        if bits >= 8 {
            bits -= 8;
            bytes.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    // Clear leftover key bits.
    buffer.zeroize();
    bytes
}

/// Encode `bytes` into unpadded RFC 4648 base32.
pub fn encode(bytes: &[u8]) -> String {
    ::base32::encode(::base32::Alphabet::Rfc4648 { padding: false }, bytes)
}
