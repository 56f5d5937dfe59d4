// Copyright 2022 Matthew Ingwersen.
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

//! Errors for reading and writing resource records.

use std::fmt;

use super::Type;
use crate::name;

////////////////////////////////////////////////////////////////////////
// PARSING                                                            //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a resource record could not be parsed.
///
/// Any of these makes the record being parsed unusable. Whether the
/// rest of the message can still be processed is up to the caller.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParseError {
    /// The message is shorter than a DNS header.
    HeaderTooShort,

    /// A field, or a length-prefixed region, extends past the end of
    /// the data available for it.
    Framing,

    /// A domain name in the record is invalid.
    InvalidName(name::Error),

    /// The record does not have the expected type.
    WrongType(Type),

    /// A TSIG record does not have class ANY and TTL 0.
    BadTsigHeader,

    /// The RDATA is shorter or longer than its RDLENGTH says.
    LengthMismatch,

    /// The message ran out of records before the one requested.
    MissingRecord,
}

impl From<name::Error> for ParseError {
    fn from(err: name::Error) -> Self {
        match err {
            // A name cut short by the end of the data is a framing
            // problem like any other truncated field.
            name::Error::UnexpectedEom => Self::Framing,
            other => Self::InvalidName(other),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::Framing => f.write_str("field extends past the end of the data"),
            Self::InvalidName(err) => write!(f, "invalid name: {}", err),
            Self::WrongType(rr_type) => write!(f, "unexpected RR type {}", rr_type),
            Self::BadTsigHeader => f.write_str("TSIG record must have class ANY and TTL 0"),
            Self::LengthMismatch => f.write_str("RDATA length does not match RDLENGTH"),
            Self::MissingRecord => f.write_str("message has no such record"),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////
// ENCODING                                                           //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a resource record could not be encoded.
///
/// When encoding fails, whatever was written to the destination buffer
/// must not be transmitted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EncodeError {
    /// The record's algorithm has no on-the-wire name.
    UnknownAlgorithm,

    /// The destination buffer cannot hold the record.
    BufferTooSmall,

    /// The RDATA, or a length-prefixed field within it, would exceed
    /// 65,535 octets.
    RdataTooLong,

    /// A record was to be signed without key data.
    MissingKey,

    /// The message to be signed is shorter than a DNS header.
    HeaderTooShort,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::UnknownAlgorithm => f.write_str("algorithm has no canonical name"),
            Self::BufferTooSmall => f.write_str("buffer too small for the record"),
            Self::RdataTooLong => f.write_str("RDATA would exceed 65,535 octets"),
            Self::MissingKey => f.write_str("no key to sign with"),
            Self::HeaderTooShort => f.write_str("message to sign is shorter than a header"),
        }
    }
}

impl std::error::Error for EncodeError {}
