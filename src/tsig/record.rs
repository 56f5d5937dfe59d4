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

//! The [`TsigRecord`] structure: the TSIG pseudo-RR as it is parsed
//! from and encoded into a message.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::trace;

use super::{Algorithm, TimeSigned, ValidationResult};
use crate::class::Class;
use crate::message::ExtendedRcode;
use crate::name::{CompressionTable, Name};
use crate::rr::{
    encode_record, EncodeError, ParseError, Record, RecordHeader, Type, WireReader, WireWriter,
    FIXED_HEADER_LEN,
};

/// The RDATA octets other than the algorithm name, MAC, and other data:
/// time signed (6), fudge (2), MAC size (2), original ID (2), error (2),
/// and other length (2).
const FIXED_RDATA_LEN: usize = 16;

////////////////////////////////////////////////////////////////////////
// TSIG RECORDS                                                       //
////////////////////////////////////////////////////////////////////////

/// A TSIG record, as specified by [RFC 8945 § 4.2].
///
/// Records to send are created with [`TsigRecord::new`] (or
/// [`TsigRecord::for_response`]) and start out with an empty MAC. The
/// MAC is either computed by the `sign_*` methods from the record's key
/// data, or supplied directly to [`TsigRecord::encode_with_mac`].
///
/// Received records come from [`Record::parse_record_data`] (usually by
/// way of [`Reader::read_record`](crate::message::Reader::read_record)).
/// Their validation result starts out as
/// [`ValidationResult::NotValidated`] and is only changed by the
/// `verify*` methods.
///
/// The class (ANY) and TTL (0) of a TSIG record are fixed, and so are
/// not stored.
///
/// [RFC 8945 § 4.2]: https://datatracker.ietf.org/doc/html/rfc8945#section-4.2
#[derive(Clone)]
pub struct TsigRecord {
    key_name: Name,
    algorithm: Algorithm,
    algorithm_name: Option<Name>,
    time_signed: TimeSigned,
    fudge: u16,
    mac: Box<[u8]>,
    original_id: u16,
    error: ExtendedRcode,
    other_data: Box<[u8]>,
    key_data: Option<Box<[u8]>>,
    validation_result: ValidationResult,
}

impl TsigRecord {
    /// Creates an unsigned TSIG record to send.
    ///
    /// `key_name` is the owner of the record, `fudge` is in seconds, and
    /// `original_id` is normally the ID of the message being signed.
    pub fn new(
        key_name: Name,
        algorithm: Algorithm,
        time_signed: TimeSigned,
        fudge: u16,
        original_id: u16,
    ) -> Self {
        Self {
            key_name,
            algorithm,
            algorithm_name: algorithm.domain_name().cloned(),
            time_signed,
            fudge,
            mac: Box::default(),
            original_id,
            error: ExtendedRcode::NOERROR,
            other_data: Box::default(),
            key_data: None,
            validation_result: ValidationResult::NotValidated,
        }
    }

    /// Creates the TSIG record for a response to `request`.
    ///
    /// The key name, algorithm, and original ID come from the request.
    /// If `error` is [`ExtendedRcode::BADTIME`], then per
    /// [RFC 8945 § 5.2.3] the time signed is echoed from the request and
    /// `now` goes into the other data field, so that the client can
    /// learn the server's clock. Otherwise `now` is the time signed and
    /// there is no other data.
    ///
    /// [RFC 8945 § 5.2.3]: https://datatracker.ietf.org/doc/html/rfc8945#section-5.2.3
    pub fn for_response(
        request: &TsigRecord,
        now: TimeSigned,
        fudge: u16,
        error: ExtendedRcode,
    ) -> Self {
        let (time_signed, other_data) = if error == ExtendedRcode::BADTIME {
            (request.time_signed, now.as_slice().into())
        } else {
            (now, Box::default())
        };
        Self {
            key_name: request.key_name.clone(),
            algorithm: request.algorithm,
            algorithm_name: request.algorithm_name.clone(),
            time_signed,
            fudge,
            mac: Box::default(),
            original_id: request.original_id,
            error,
            other_data,
            key_data: None,
            validation_result: ValidationResult::NotValidated,
        }
    }

    /// Sets the error field.
    pub fn with_error(mut self, error: ExtendedRcode) -> Self {
        self.error = error;
        self
    }

    /// Sets the other data field.
    pub fn with_other_data(mut self, other_data: impl Into<Box<[u8]>>) -> Self {
        self.other_data = other_data.into();
        self
    }

    /// Sets the key used by the `sign_*` methods. The key is never
    /// encoded.
    pub fn with_key_data(mut self, key_data: impl Into<Box<[u8]>>) -> Self {
        self.key_data = Some(key_data.into());
        self
    }

    /// Returns the key name (the owner of the record).
    pub fn key_name(&self) -> &Name {
        &self.key_name
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the algorithm name as found in a received record, or the
    /// registered name for a record created locally. This is `None`
    /// only for a locally created record with [`Algorithm::Unknown`].
    pub fn algorithm_name(&self) -> Option<&Name> {
        self.algorithm_name.as_ref()
    }

    pub fn time_signed(&self) -> TimeSigned {
        self.time_signed
    }

    /// Returns the permitted clock skew.
    pub fn fudge(&self) -> Duration {
        Duration::from_secs(self.fudge.into())
    }

    /// Returns the fudge field as it appears on the wire.
    pub fn fudge_seconds(&self) -> u16 {
        self.fudge
    }

    /// Returns the MAC. This is empty for a record that has not been
    /// signed.
    pub fn mac(&self) -> &[u8] {
        &self.mac
    }

    pub fn original_id(&self) -> u16 {
        self.original_id
    }

    pub fn error(&self) -> ExtendedRcode {
        self.error
    }

    pub fn other_data(&self) -> &[u8] {
        &self.other_data
    }

    pub(super) fn key_data(&self) -> Option<&[u8]> {
        self.key_data.as_deref()
    }

    /// Returns the outcome of the most recent verification.
    pub fn validation_result(&self) -> ValidationResult {
        self.validation_result
    }

    pub(super) fn set_mac(&mut self, mac: Box<[u8]>) {
        self.mac = mac;
    }

    pub(super) fn set_validation_result(&mut self, result: ValidationResult) {
        self.validation_result = result;
    }

    /// Returns an upper bound on the length of the whole record,
    /// assuming that the owner name is not compressed.
    pub fn max_len(&self) -> usize {
        self.key_name.wire_repr().len() + FIXED_HEADER_LEN + self.max_rdata_len()
    }

    /// Encodes the record at index `offset` of `octets` with `mac` in
    /// place of the record's own MAC, returning the number of octets
    /// written.
    ///
    /// This makes it possible to lay out a record before its MAC is
    /// known (for instance, with an empty MAC) and to encode the final
    /// signed record from the same structure. The owner name may be
    /// compressed through `names`; the algorithm name never is. This
    /// fails for [`Algorithm::Unknown`], and on failure nothing written
    /// to `octets` may be transmitted.
    pub fn encode_with_mac(
        &self,
        octets: &mut [u8],
        offset: usize,
        names: &mut CompressionTable,
        mac: &[u8],
    ) -> Result<usize, EncodeError> {
        encode_record(self, octets, offset, names, |writer| {
            self.write_rdata(writer, mac)
        })
    }

    fn write_rdata(&self, writer: &mut WireWriter, mac: &[u8]) -> Result<(), EncodeError> {
        let algorithm_name = self
            .algorithm
            .domain_name()
            .ok_or(EncodeError::UnknownAlgorithm)?;
        writer.write_name(algorithm_name, None)?;
        writer.write_slice(self.time_signed.as_slice())?;
        writer.write_u16(self.fudge)?;
        writer.write_len_prefixed(mac)?;
        writer.write_u16(self.original_id)?;
        writer.write_u16(self.error.into())?;
        writer.write_len_prefixed(&self.other_data)
    }
}

impl Record for TsigRecord {
    const RR_TYPE: Type = Type::TSIG;

    fn owner(&self) -> &Name {
        &self.key_name
    }

    fn class(&self) -> Class {
        Class::ANY
    }

    fn ttl(&self) -> u32 {
        0
    }

    /// The bound assumes a MAC of the algorithm's full digest size (or
    /// the current MAC, if that is longer).
    fn max_rdata_len(&self) -> usize {
        // The registered name without its trailing dot is two octets
        // shorter than its wire form.
        let algorithm_len = match self.algorithm.canonical_name() {
            Some(canonical) => canonical.len() + 2,
            None => self
                .algorithm_name
                .as_ref()
                .map_or(1, |name| name.wire_repr().len()),
        };
        let mac_len = self.algorithm.digest_size().max(self.mac.len());
        algorithm_len + FIXED_RDATA_LEN + mac_len + self.other_data.len()
    }

    fn parse_record_data(
        header: RecordHeader,
        message: &[u8],
        start: usize,
        rdlength: usize,
    ) -> Result<Self, ParseError> {
        if header.class != Class::ANY || header.ttl != 0 {
            return Err(ParseError::BadTsigHeader);
        }

        let mut reader = WireReader::new(message, start, rdlength)?;
        let algorithm_name = reader.read_name()?;
        let algorithm = Algorithm::from_domain_name(&algorithm_name);
        if algorithm == Algorithm::Unknown {
            trace!("TSIG record uses unknown algorithm {}", algorithm_name);
        }
        let time_signed = TimeSigned::from(reader.read_array()?);
        let fudge = reader.read_u16()?;
        let mac = reader.read_len_prefixed()?.into();
        let original_id = reader.read_u16()?;
        let error = reader.read_u16()?.into();
        let other_data = reader.read_len_prefixed()?.into();
        reader.finish()?;

        Ok(Self {
            key_name: header.owner,
            algorithm,
            algorithm_name: Some(algorithm_name),
            time_signed,
            fudge,
            mac,
            original_id,
            error,
            other_data,
            key_data: None,
            validation_result: ValidationResult::NotValidated,
        })
    }

    fn encode_rdata(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        self.write_rdata(writer, &self.mac)
    }
}

impl fmt::Display for TsigRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.algorithm.canonical_name(), &self.algorithm_name) {
            (Some(canonical), _) => f.write_str(canonical)?,
            (None, Some(name)) => write!(f, "{}", name)?,
            (None, None) => f.write_str("unknown")?,
        }
        write!(f, " {} {}", self.time_signed, self.fudge)?;
        write_base64_field(f, &self.mac)?;
        write!(f, " {} {}", self.original_id, u16::from(self.error))?;
        write_base64_field(f, &self.other_data)
    }
}

/// Writes a length followed (unless it is zero) by base64 data.
fn write_base64_field(f: &mut fmt::Formatter, data: &[u8]) -> fmt::Result {
    write!(f, " {}", data.len())?;
    if data.is_empty() {
        Ok(())
    } else {
        write!(f, " {}", BASE64.encode(data))
    }
}

impl fmt::Debug for TsigRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TsigRecord")
            .field("key_name", &self.key_name)
            .field("algorithm", &self.algorithm)
            .field("algorithm_name", &self.algorithm_name)
            .field("time_signed", &self.time_signed)
            .field("fudge", &self.fudge)
            .field("mac", &self.mac)
            .field("original_id", &self.original_id)
            .field("error", &self.error)
            .field("other_data", &self.other_data)
            .field("key_data", &self.key_data.as_ref().map(|_| "<redacted>"))
            .field("validation_result", &self.validation_result)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
