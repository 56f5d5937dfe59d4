// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of data structures related to domain names.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrayvec::ArrayVec;

mod compression;
mod error;
mod wire;
pub use compression::{Checkpoint, CompressionTable};
pub use error::Error;

/// The maximum number of labels in a domain name.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name.
///
/// A `Name` owns the uncompressed on-the-wire representation of the
/// name, as defined in [RFC 1035 § 3.1]. Only valid names can be
/// constructed, so the representation always ends with the null label
/// and never exceeds 255 octets.
///
/// `Name`s can be constructed
///
/// * through the [`FromStr`] implementation (a missing trailing dot is
///   tolerated, since every name is treated as fully qualified);
/// * from compressed on-the-wire names through
///   [`Name::try_from_compressed`]; and
/// * as the root name through [`Name::root`].
///
/// Comparison and hashing are ASCII-case-insensitive, per
/// [RFC 4343]. The case of the original name is preserved, however,
/// and is what gets serialized.
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[derive(Clone)]
pub struct Name {
    wire: Box<[u8]>,
}

impl Name {
    /// Returns the root name.
    pub fn root() -> Self {
        Self::from_wire_unchecked(&[0])
    }

    /// Wraps an on-the-wire representation that has already been
    /// validated.
    fn from_wire_unchecked(wire: &[u8]) -> Self {
        Self { wire: wire.into() }
    }

    /// Parses a compressed name starting at index `start` of `octets`.
    /// Pointers are followed. Indices given in pointers are treated as
    /// indices of `octets`, so the intention is for an entire DNS
    /// message to be passed in `octets`.
    ///
    /// On success, the name and the number of octets it occupies at
    /// `start` (not counting any data reached through pointers) are
    /// returned.
    pub fn try_from_compressed(octets: &[u8], start: usize) -> Result<(Self, usize), Error> {
        wire::parse_compressed_name(octets, start)
    }

    /// Determines the length of a compressed name at the beginning of
    /// `octets` without following any pointers.
    pub fn skip_compressed(octets: &[u8]) -> Result<usize, Error> {
        wire::skip_compressed_name(octets)
    }

    /// Returns the uncompressed on-the-wire representation of the name.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the number of labels in the name, including the null
    /// label.
    pub fn label_count(&self) -> usize {
        self.labels().count() + 1
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Returns an iterator over the non-null labels of the name, from
    /// left to right. Each label is given without its length octet.
    pub fn labels(&self) -> Labels {
        Labels {
            remaining: &self.wire,
        }
    }

    /// Returns the offsets of the non-null labels in the on-the-wire
    /// representation.
    fn label_offsets(&self) -> ArrayVec<usize, MAX_N_LABELS> {
        let mut offsets = ArrayVec::new();
        let mut offset = 0;
        while self.wire[offset] != 0 {
            offsets.push(offset);
            offset += self.wire[offset] as usize + 1;
        }
        offsets
    }

    /// Returns a copy of the name with all ASCII letters lowercased.
    pub fn to_lowercase(&self) -> Self {
        Self {
            wire: self.wire.to_ascii_lowercase().into_boxed_slice(),
        }
    }
}

/// An iterator over the labels of a [`Name`], as returned by
/// [`Name::labels`].
pub struct Labels<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.remaining.split_first()?;
        if len == 0 {
            None
        } else {
            let (label, rest) = rest.split_at(len as usize);
            self.remaining = rest;
            Some(label)
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Length octets are at most 63, so they are never affected by
        // ASCII case folding.
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.wire.len());
        for octet in self.wire.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TEXT REPRESENTATION                                                //
////////////////////////////////////////////////////////////////////////

impl FromStr for Name {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err(Error::StrEmpty);
        } else if !text.is_ascii() {
            return Err(Error::StrNotAscii);
        } else if text == "." {
            return Ok(Self::root());
        }

        let mut wire = ArrayVec::<u8, MAX_WIRE_LEN>::new();
        let mut label = ArrayVec::<u8, MAX_LABEL_LEN>::new();
        let mut octets = text.bytes();
        while let Some(octet) = octets.next() {
            match octet {
                b'.' => {
                    if label.is_empty() {
                        return Err(Error::NullNonTerminal);
                    }
                    push_label(&mut wire, &label)?;
                    label.clear();
                }
                b'\\' => {
                    let escaped = parse_escape(&mut octets)?;
                    label.try_push(escaped).or(Err(Error::LabelTooLong))?;
                }
                _ => label.try_push(octet).or(Err(Error::LabelTooLong))?,
            }
        }
        if !label.is_empty() {
            push_label(&mut wire, &label)?;
        }
        wire.try_push(0).or(Err(Error::NameTooLong))?;
        Ok(Self::from_wire_unchecked(&wire))
    }
}

/// Appends a length-prefixed label to an in-progress on-the-wire name.
fn push_label(wire: &mut ArrayVec<u8, MAX_WIRE_LEN>, label: &[u8]) -> Result<(), Error> {
    wire.try_push(label.len() as u8).or(Err(Error::NameTooLong))?;
    wire.try_extend_from_slice(label).or(Err(Error::NameTooLong))
}

/// Parses the remainder of an escape sequence (after the backslash).
/// Both the `\DDD` and `\X` forms of [RFC 1035 § 5.1] are accepted.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
fn parse_escape(octets: &mut impl Iterator<Item = u8>) -> Result<u8, Error> {
    match octets.next() {
        Some(first) if first.is_ascii_digit() => {
            let mut value = (first - b'0') as u16;
            for _ in 0..2 {
                match octets.next() {
                    Some(digit) if digit.is_ascii_digit() => {
                        value = value * 10 + (digit - b'0') as u16;
                    }
                    _ => return Err(Error::InvalidEscape),
                }
            }
            u8::try_from(value).or(Err(Error::InvalidEscape))
        }
        Some(other) => Ok(other),
        None => Err(Error::InvalidEscape),
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels() {
            for &octet in label {
                match octet {
                    b'.' | b'\\' => write!(f, "\\{}", octet as char)?,
                    0x21..=0x7e => write!(f, "{}", octet as char)?,
                    _ => write!(f, "\\{:03}", octet)?,
                }
            }
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of(name: &Name) -> u64 {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn from_str_works() {
        let name: Name = "a.tsig.key.".parse().unwrap();
        assert_eq!(name.wire_repr(), b"\x01a\x04tsig\x03key\x00");
        assert_eq!(name.label_count(), 4);
        assert_eq!(name.to_string(), "a.tsig.key.");
    }

    #[test]
    fn from_str_tolerates_missing_trailing_dot() {
        let with_dot: Name = "hmac-sha256.".parse().unwrap();
        let without_dot: Name = "hmac-sha256".parse().unwrap();
        assert_eq!(with_dot.wire_repr(), without_dot.wire_repr());
    }

    #[test]
    fn from_str_handles_root() {
        let root: Name = ".".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root.wire_repr(), b"\x00");
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn from_str_handles_escapes() {
        let name: Name = "a\\.b\\032c.test.".parse().unwrap();
        assert_eq!(name.wire_repr(), b"\x05a.b c\x04test\x00");
        assert_eq!(name.to_string(), "a\\.b\\032c.test.");
    }

    #[test]
    fn from_str_rejects_bad_input() {
        assert_eq!("".parse::<Name>().unwrap_err(), Error::StrEmpty);
        assert_eq!("ex\u{e4}mple.".parse::<Name>().unwrap_err(), Error::StrNotAscii);
        assert_eq!("a..b.".parse::<Name>().unwrap_err(), Error::NullNonTerminal);
        assert_eq!("\\25".parse::<Name>().unwrap_err(), Error::InvalidEscape);
        assert_eq!("\\256.".parse::<Name>().unwrap_err(), Error::InvalidEscape);
        let long_label = "a".repeat(64);
        assert_eq!(long_label.parse::<Name>().unwrap_err(), Error::LabelTooLong);
        let long_name = ["abcdefghi"; 26].join(".");
        assert_eq!(long_name.parse::<Name>().unwrap_err(), Error::NameTooLong);
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let lower: Name = "hmac-md5.sig-alg.reg.int.".parse().unwrap();
        let upper: Name = "HMAC-MD5.SIG-ALG.REG.INT.".parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(hash_of(&lower), hash_of(&upper));
        assert_eq!(upper.to_lowercase().wire_repr(), lower.wire_repr());
        assert_ne!(upper.wire_repr(), lower.wire_repr());
    }

    #[test]
    fn labels_and_offsets_work() {
        let name: Name = "a.tsig.key.".parse().unwrap();
        let labels: Vec<&[u8]> = name.labels().collect();
        assert_eq!(labels, [&b"a"[..], b"tsig", b"key"]);
        assert_eq!(name.label_offsets().as_slice(), &[0, 2, 7]);
        assert!(Name::root().label_offsets().is_empty());
    }
}
