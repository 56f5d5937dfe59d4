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

//! Implementation of Secret Key Transaction Authentication for DNS
//! (TSIG), as specified by [RFC 8945].
//!
//! The pieces are:
//!
//! * the [`Algorithm`] registry, which maps algorithm names to keyed
//!   hashes ([`Authenticator`]s);
//! * [`TimeSigned`], the 48-bit "time signed" field;
//! * [`TsigRecord`], the TSIG pseudo-RR itself, which implements the
//!   [`Record`](crate::rr::Record) trait and carries the signing and
//!   verification operations.
//!
//! To verify a received message, find its TSIG record with a
//! [`Reader`](crate::message::Reader), then call
//! [`TsigRecord::verify_request`] or [`TsigRecord::verify_response`]
//! with the message up to the record. To sign, create a [`TsigRecord`]
//! with key data, call [`TsigRecord::sign_request`] or
//! [`TsigRecord::sign_response`] on the finished message, and encode
//! the record after it.
//!
//! [RFC 8945]: https://datatracker.ietf.org/doc/html/rfc8945

mod algorithm;
mod record;
mod sign;
mod time;
pub use algorithm::{Algorithm, Authenticator};
pub use record::TsigRecord;
pub use sign::{ValidationResult, VerificationError};
pub use time::{TimeSigned, UnrepresentableTimeError};

/// The fudge recommended by [RFC 8945 § 10], in seconds.
///
/// [RFC 8945 § 10]: https://datatracker.ietf.org/doc/html/rfc8945#section-10
pub const DEFAULT_FUDGE: u16 = 300;
