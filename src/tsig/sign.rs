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

//! Signing and verification of messages with TSIG records, following
//! [RFC 8945 § 4.3] and [RFC 8945 § 5].
//!
//! In every case the message passed in is the message up to (but not
//! including) the TSIG record. Its ARCOUNT must already count the TSIG
//! record and its ID may differ from the original ID; both are adjusted
//! when the digest is computed.
//!
//! [RFC 8945 § 4.3]: https://datatracker.ietf.org/doc/html/rfc8945#section-4.3
//! [RFC 8945 § 5]: https://datatracker.ietf.org/doc/html/rfc8945#section-5

use std::fmt;

use log::debug;

use super::{Algorithm, Authenticator, TimeSigned, TsigRecord};
use crate::message::constants::*;
use crate::message::ExtendedRcode;
use crate::rr::EncodeError;

////////////////////////////////////////////////////////////////////////
// VALIDATION RESULTS                                                 //
////////////////////////////////////////////////////////////////////////

/// The outcome of the most recent verification of a [`TsigRecord`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ValidationResult {
    /// No verification has been attempted.
    #[default]
    NotValidated,

    /// The MAC (and, for message verification, the time) checked out.
    Valid,

    /// Verification failed.
    Invalid(VerificationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        *self == Self::Valid
    }
}

impl From<Result<(), VerificationError>> for ValidationResult {
    fn from(result: Result<(), VerificationError>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(err) => Self::Invalid(err),
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotValidated => f.write_str("not validated"),
            Self::Valid => f.write_str("valid"),
            Self::Invalid(err) => write!(f, "invalid ({})", err),
        }
    }
}

/// Errors that arise during TSIG verification.
///
/// A signature mismatch is an expected outcome rather than a fault, so
/// these are reported through [`ValidationResult`].
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum VerificationError {
    /// The message is malformed, or the MAC is truncated beyond what
    /// [RFC 8945 § 5.2.2.1] allows. A response must not be signed.
    ///
    /// [RFC 8945 § 5.2.2.1]: https://datatracker.ietf.org/doc/html/rfc8945#section-5.2.2.1
    FormErr,

    /// The algorithm is not supported, so no MAC can be computed. A
    /// response must not be signed.
    BadKey,

    /// The MAC does not match. A response must not be signed.
    BadSig,

    /// The MAC matches, but the time signed is outside the fudge window.
    /// A response must be signed.
    BadTime,
}

impl VerificationError {
    /// Returns the code to place in the error field of the TSIG record
    /// of a response.
    pub fn tsig_error(&self) -> ExtendedRcode {
        match self {
            Self::FormErr => ExtendedRcode::FORMERR,
            Self::BadKey => ExtendedRcode::BADKEY,
            Self::BadSig => ExtendedRcode::BADSIG,
            Self::BadTime => ExtendedRcode::BADTIME,
        }
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FormErr => f.write_str("FORMERR"),
            Self::BadKey => f.write_str("BADKEY"),
            Self::BadSig => f.write_str("BADSIG"),
            Self::BadTime => f.write_str("BADTIME"),
        }
    }
}

impl std::error::Error for VerificationError {}

////////////////////////////////////////////////////////////////////////
// SIGNING                                                            //
////////////////////////////////////////////////////////////////////////

impl TsigRecord {
    /// Signs a request message with the record's key data. The MAC is
    /// stored in the record (so that [`Record::encode`] includes it) and
    /// returned.
    ///
    /// [`Record::encode`]: crate::rr::Record::encode
    pub fn sign_request(&mut self, message: &[u8]) -> Result<&[u8], EncodeError> {
        self.sign(message, None)
    }

    /// Signs a response message with the record's key data. The MAC of
    /// the request is covered by the new MAC. As with
    /// [`TsigRecord::sign_request`], the MAC is stored and returned.
    pub fn sign_response(
        &mut self,
        message: &[u8],
        request_mac: &[u8],
    ) -> Result<&[u8], EncodeError> {
        self.sign(message, Some(request_mac))
    }

    fn sign(
        &mut self,
        message: &[u8],
        request_mac: Option<&[u8]>,
    ) -> Result<&[u8], EncodeError> {
        if message.len() < HEADER_SIZE {
            return Err(EncodeError::HeaderTooShort);
        }
        let key = self.key_data().ok_or(EncodeError::MissingKey)?;
        let mut authenticator = self
            .algorithm()
            .keyed_hash(key)
            .ok_or(EncodeError::UnknownAlgorithm)?;
        add_digest_components(authenticator.as_mut(), self, message, request_mac)?;
        self.set_mac(authenticator.finalize());
        Ok(self.mac())
    }
}

////////////////////////////////////////////////////////////////////////
// VERIFICATION                                                       //
////////////////////////////////////////////////////////////////////////

impl TsigRecord {
    /// Checks the record's MAC against a keyed hash of `data`, without
    /// any of the message handling or time checks of
    /// [`TsigRecord::verify_request`]. The MAC must be untruncated.
    pub fn verify(&mut self, data: &[u8], key: &[u8]) -> ValidationResult {
        let result = match self.algorithm().keyed_hash(key) {
            Some(mut authenticator) => {
                authenticator.update(data);
                authenticator
                    .verify(self.mac())
                    .or(Err(VerificationError::BadSig))
            }
            None => Err(VerificationError::BadKey),
        };
        self.record_result(result)
    }

    /// Verifies a request message, per [RFC 8945 § 5.2]. `now` is the
    /// local time, which must be within the fudge of the time signed.
    ///
    /// [RFC 8945 § 5.2]: https://datatracker.ietf.org/doc/html/rfc8945#section-5.2
    pub fn verify_request(
        &mut self,
        message: &[u8],
        key: &[u8],
        now: TimeSigned,
    ) -> ValidationResult {
        let result = self.check(message, None, key, now);
        self.record_result(result)
    }

    /// Verifies a response message, per [RFC 8945 § 5.3]. `request_mac`
    /// is the MAC of the request the response answers.
    ///
    /// [RFC 8945 § 5.3]: https://datatracker.ietf.org/doc/html/rfc8945#section-5.3
    pub fn verify_response(
        &mut self,
        message: &[u8],
        request_mac: &[u8],
        key: &[u8],
        now: TimeSigned,
    ) -> ValidationResult {
        let result = self.check(message, Some(request_mac), key, now);
        self.record_result(result)
    }

    fn check(
        &self,
        message: &[u8],
        request_mac: Option<&[u8]>,
        key: &[u8],
        now: TimeSigned,
    ) -> Result<(), VerificationError> {
        if message.len() < HEADER_SIZE {
            return Err(VerificationError::FormErr);
        }
        let mut authenticator = self
            .algorithm()
            .keyed_hash(key)
            .ok_or(VerificationError::BadKey)?;

        // RFC 8945 § 5.2.2: check the MAC.
        check_mac_size(self.algorithm(), self.mac().len())?;
        add_digest_components(authenticator.as_mut(), self, message, request_mac)
            .or(Err(VerificationError::FormErr))?;
        authenticator
            .verify_truncated_left(self.mac())
            .or(Err(VerificationError::BadSig))?;

        // RFC 8945 § 5.2.3: check the time.
        if now.abs_diff(self.time_signed()) > self.fudge_seconds() as u64 {
            return Err(VerificationError::BadTime);
        }

        Ok(())
    }

    fn record_result(&mut self, result: Result<(), VerificationError>) -> ValidationResult {
        match result {
            Ok(()) => debug!("TSIG verification succeeded for key {}", self.key_name()),
            Err(err) => debug!(
                "TSIG verification failed for key {}: {}",
                self.key_name(),
                err
            ),
        }
        let result = ValidationResult::from(result);
        self.set_validation_result(result);
        result
    }
}

/// Ensures that the MAC size is acceptable, per [RFC 8945 § 5.2.2.1]:
/// no longer than the digest, and no shorter than the larger of 10
/// octets and half the digest.
///
/// [RFC 8945 § 5.2.2.1]: https://datatracker.ietf.org/doc/html/rfc8945#section-5.2.2.1
fn check_mac_size(algorithm: Algorithm, mac_size: usize) -> Result<(), VerificationError> {
    let digest_size = algorithm.digest_size();
    let half_digest_size = (digest_size + 1) / 2;
    if mac_size > digest_size || mac_size < 10.max(half_digest_size) {
        Err(VerificationError::FormErr)
    } else {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// DIGEST COMPONENTS                                                  //
////////////////////////////////////////////////////////////////////////

/// Adds everything that the MAC covers to `authenticator`: the request
/// MAC for responses ([RFC 8945 § 4.3.1]), the message, and the TSIG
/// variables. Length-prefixed fields that do not fit a `u16` are
/// rejected before anything is added.
///
/// [RFC 8945 § 4.3.1]: https://datatracker.ietf.org/doc/html/rfc8945#section-4.3.1
fn add_digest_components(
    authenticator: &mut dyn Authenticator,
    record: &TsigRecord,
    message: &[u8],
    request_mac: Option<&[u8]>,
) -> Result<(), EncodeError> {
    let other_len = field_len(record.other_data())?;
    if let Some(request_mac) = request_mac {
        authenticator.update(&field_len(request_mac)?.to_be_bytes());
        authenticator.update(request_mac);
    }
    add_modified_message(authenticator, message, record.original_id());
    add_tsig_variables(authenticator, record, other_len);
    Ok(())
}

/// Returns the length of a field that goes on the wire with a `u16`
/// length prefix.
fn field_len(data: &[u8]) -> Result<u16, EncodeError> {
    u16::try_from(data.len()).or(Err(EncodeError::RdataTooLong))
}

/// Adds the given message to a MAC, decrementing the ARCOUNT and
/// restoring the original message ID first (in accordance with
/// [RFC 8945 § 4.3.2]). The message must be at least a header long.
///
/// [RFC 8945 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc8945#section-4.3.2
fn add_modified_message(authenticator: &mut dyn Authenticator, message: &[u8], original_id: u16) {
    let arcount = u16::from_be_bytes([message[ARCOUNT_START], message[ARCOUNT_END - 1]]);
    authenticator.update(&original_id.to_be_bytes());
    authenticator.update(&message[ID_END..ARCOUNT_START]);
    authenticator.update(&arcount.saturating_sub(1).to_be_bytes());
    authenticator.update(&message[ARCOUNT_END..]);
}

/// Adds the TSIG variables specified by [RFC 8945 § 4.3.3] to a MAC.
/// Names go in lowercase, which is their canonical form; the algorithm
/// always uses its registered name.
///
/// [RFC 8945 § 4.3.3]: https://datatracker.ietf.org/doc/html/rfc8945#section-4.3.3
fn add_tsig_variables(authenticator: &mut dyn Authenticator, record: &TsigRecord, other_len: u16) {
    authenticator.update(record.key_name().to_lowercase().wire_repr());
    authenticator.update(b"\x00\xff\x00\x00\x00\x00");
    if let Some(algorithm_name) = record.algorithm().domain_name() {
        authenticator.update(algorithm_name.wire_repr());
    }
    authenticator.update(record.time_signed().as_slice());
    authenticator.update(&record.fudge_seconds().to_be_bytes());
    authenticator.update(&u16::from(record.error()).to_be_bytes());
    authenticator.update(&other_len.to_be_bytes());
    authenticator.update(record.other_data());
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::message::Reader;
    use crate::name::{CompressionTable, Name};
    use crate::rr::{read_record, Record};

    const REQUEST_WITH_TSIG: &[u8] =
        b"\xa2\xe0\x00\x00\x00\x01\x00\x00\x00\x00\x00\x01\x08\x71\x75\x61\
          \x6e\x64\x61\x72\x79\x04\x74\x65\x73\x74\x00\x00\x10\x00\x01\x01\
          \x61\x04\x74\x73\x69\x67\x03\x6b\x65\x79\x00\x00\xfa\x00\xff\x00\
          \x00\x00\x00\x00\x3d\x0b\x68\x6d\x61\x63\x2d\x73\x68\x61\x32\x35\
          \x36\x00\x00\x00\x63\x2b\x8d\xca\x01\x2c\x00\x20\xbb\x33\x6e\x57\
          \x42\xa7\xa6\xce\x41\x37\x1b\x96\x84\x8b\x3b\x21\x26\x95\x94\x37\
          \x15\xc2\xaa\xd9\x37\x9d\xd9\xaa\xaa\x75\x39\xb8\xa2\xe0\x00\x00\
          \x00\x00";
    const RESPONSE_WITH_TSIG: &[u8] =
        b"\xa2\xe0\x84\x00\x00\x01\x00\x01\x00\x00\x00\x01\x08\x71\x75\x61\
          \x6e\x64\x61\x72\x79\x04\x74\x65\x73\x74\x00\x00\x10\x00\x01\xc0\
          \x0c\x00\x10\x00\x01\x00\x01\x51\x80\x00\x0a\x09\x49\x74\x20\x77\
          \x6f\x72\x6b\x73\x21\x01\x61\x04\x74\x73\x69\x67\x03\x6b\x65\x79\
          \x00\x00\xfa\x00\xff\x00\x00\x00\x00\x00\x3d\x0b\x68\x6d\x61\x63\
          \x2d\x73\x68\x61\x32\x35\x36\x00\x00\x00\x63\x2b\x8d\xca\x01\x2c\
          \x00\x20\xb9\x7f\x50\x3b\xd0\x93\x4d\xcf\x84\xf5\xf4\x89\xb5\xed\
          \xde\x52\x7d\x28\x28\x32\xd5\xe1\xd8\x3c\x0a\xb2\x43\xb6\x43\x9f\
          \xc2\x56\xa2\xe0\x00\x00\x00\x00";

    const REQUEST_TSIG_START: usize = 31;
    const RESPONSE_TSIG_START: usize = 53;
    const MESSAGE_ID: u16 = 0xa2e0;
    const FUDGE: u16 = 300;
    const KEY: &[u8] = b"topsecret";

    lazy_static! {
        static ref KEY_NAME: Name = "a.tsig.key.".parse().unwrap();
        static ref TIME_SIGNED: TimeSigned = TimeSigned::try_from_unix_time(1663798730).unwrap();
        static ref TOO_EARLY: TimeSigned =
            TimeSigned::try_from_unix_time(1663798730 - FUDGE as u64 - 1).unwrap();
        static ref TOO_LATE: TimeSigned =
            TimeSigned::try_from_unix_time(1663798730 + FUDGE as u64 + 1).unwrap();
        static ref REQUEST_MAC: &'static [u8] = &REQUEST_WITH_TSIG[76..108];
        static ref RESPONSE_MAC: &'static [u8] = &RESPONSE_WITH_TSIG[98..130];
    }

    /// Finds the TSIG record of a message, returning the message up to
    /// the record along with the record.
    fn read_message(message: &[u8]) -> (&[u8], TsigRecord) {
        let mut reader = Reader::try_from(message).unwrap();
        reader.seek_last_additional().unwrap();
        let message_up_to_tsig = reader.message_to_cursor();
        let tsig = reader.read_record::<TsigRecord>().unwrap();
        assert!(reader.at_eom());
        (message_up_to_tsig, tsig)
    }

    fn corrupt(message: &[u8]) -> Vec<u8> {
        let mut corrupted = message.to_vec();
        corrupted[2] = 0xff;
        corrupted
    }

    fn request_record() -> TsigRecord {
        TsigRecord::new(
            KEY_NAME.clone(),
            Algorithm::HmacSha256,
            *TIME_SIGNED,
            FUDGE,
            MESSAGE_ID,
        )
        .with_key_data(KEY)
    }

    ////////////////////////////////////////////////////////////////////
    // SIGNING TESTS                                                  //
    ////////////////////////////////////////////////////////////////////

    #[test]
    fn request_signing_works() {
        let mut record = request_record();
        let message = &REQUEST_WITH_TSIG[..REQUEST_TSIG_START];
        assert_eq!(record.sign_request(message).unwrap(), *REQUEST_MAC);

        let mut buf = vec![0; REQUEST_TSIG_START + record.max_len()];
        buf[..REQUEST_TSIG_START].copy_from_slice(message);
        let len = record
            .encode(&mut buf, REQUEST_TSIG_START, &mut CompressionTable::new())
            .unwrap();
        assert_eq!(&buf[..REQUEST_TSIG_START + len], REQUEST_WITH_TSIG);
    }

    #[test]
    fn response_signing_works() {
        let (_, request) = read_message(REQUEST_WITH_TSIG);
        let mut record =
            TsigRecord::for_response(&request, *TIME_SIGNED, FUDGE, ExtendedRcode::NOERROR)
                .with_key_data(KEY);
        let message = &RESPONSE_WITH_TSIG[..RESPONSE_TSIG_START];
        assert_eq!(
            record.sign_response(message, request.mac()).unwrap(),
            *RESPONSE_MAC
        );
    }

    #[test]
    fn signing_canonicalizes_key_name() {
        let mut record = TsigRecord::new(
            "A.TSIG.Key.".parse().unwrap(),
            Algorithm::HmacSha256,
            *TIME_SIGNED,
            FUDGE,
            MESSAGE_ID,
        )
        .with_key_data(KEY);
        let message = &REQUEST_WITH_TSIG[..REQUEST_TSIG_START];
        assert_eq!(record.sign_request(message).unwrap(), *REQUEST_MAC);
    }

    #[test]
    fn signing_failures() {
        let message = &REQUEST_WITH_TSIG[..REQUEST_TSIG_START];
        let mut unkeyed = TsigRecord::new(
            KEY_NAME.clone(),
            Algorithm::HmacSha256,
            *TIME_SIGNED,
            FUDGE,
            MESSAGE_ID,
        );
        assert_eq!(unkeyed.sign_request(message), Err(EncodeError::MissingKey));

        let mut unknown =
            TsigRecord::new(KEY_NAME.clone(), Algorithm::Unknown, *TIME_SIGNED, FUDGE, 1)
                .with_key_data(KEY);
        assert_eq!(
            unknown.sign_request(message),
            Err(EncodeError::UnknownAlgorithm)
        );

        let mut record = request_record();
        assert_eq!(
            record.sign_request(&message[..11]),
            Err(EncodeError::HeaderTooShort)
        );
        assert!(record.mac().is_empty());
    }

    #[test]
    fn signing_rejects_oversized_fields() {
        let message = &REQUEST_WITH_TSIG[..REQUEST_TSIG_START];
        let mut record = request_record().with_other_data(vec![0; u16::MAX as usize + 6]);
        assert_eq!(
            record.sign_request(message),
            Err(EncodeError::RdataTooLong)
        );
        assert!(record.mac().is_empty());

        let mut record = request_record();
        let request_mac = vec![0; u16::MAX as usize + 1];
        assert_eq!(
            record.sign_response(message, &request_mac),
            Err(EncodeError::RdataTooLong)
        );
        assert!(record.mac().is_empty());

        // The largest other data that fits still signs.
        let mut record = request_record().with_other_data(vec![0; u16::MAX as usize]);
        assert_eq!(record.sign_request(message).unwrap().len(), 32);
    }

    #[test]
    fn verification_rejects_oversized_request_mac() {
        let (message_up_to_tsig, mut tsig) = read_message(RESPONSE_WITH_TSIG);
        let request_mac = vec![0; u16::MAX as usize + 1];
        assert_eq!(
            tsig.verify_response(message_up_to_tsig, &request_mac, KEY, *TIME_SIGNED),
            ValidationResult::Invalid(VerificationError::FormErr)
        );
    }

    #[test]
    fn signed_round_trip_verifies() {
        for algorithm in [
            Algorithm::HmacMd5,
            Algorithm::HmacSha1,
            Algorithm::HmacSha256,
            Algorithm::HmacSha384,
            Algorithm::HmacSha512,
        ] {
            let message = &REQUEST_WITH_TSIG[..REQUEST_TSIG_START];
            let mut record =
                TsigRecord::new(KEY_NAME.clone(), algorithm, *TIME_SIGNED, FUDGE, MESSAGE_ID)
                    .with_key_data(KEY);
            record.sign_request(message).unwrap();

            let mut buf = vec![0; REQUEST_TSIG_START + record.max_len()];
            buf[..REQUEST_TSIG_START].copy_from_slice(message);
            let len = record
                .encode(&mut buf, REQUEST_TSIG_START, &mut CompressionTable::new())
                .unwrap();
            buf.truncate(REQUEST_TSIG_START + len);

            let (message_up_to_tsig, mut parsed) = read_message(&buf);
            assert_eq!(
                parsed.verify_request(message_up_to_tsig, KEY, *TIME_SIGNED),
                ValidationResult::Valid
            );
        }
    }

    ////////////////////////////////////////////////////////////////////
    // VERIFICATION TESTS                                             //
    ////////////////////////////////////////////////////////////////////

    fn request_verification_helper(message: &[u8], now: TimeSigned, expected: ValidationResult) {
        let (message_up_to_tsig, mut tsig) = read_message(message);
        assert_eq!(tsig.validation_result(), ValidationResult::NotValidated);
        assert_eq!(tsig.verify_request(message_up_to_tsig, KEY, now), expected);
        assert_eq!(tsig.validation_result(), expected);
    }

    #[test]
    fn request_verification_works() {
        request_verification_helper(REQUEST_WITH_TSIG, *TIME_SIGNED, ValidationResult::Valid);
    }

    #[test]
    fn request_verification_rejects_corrupted_message() {
        request_verification_helper(
            &corrupt(REQUEST_WITH_TSIG),
            *TIME_SIGNED,
            ValidationResult::Invalid(VerificationError::BadSig),
        );
    }

    #[test]
    fn request_verification_rejects_late_message() {
        request_verification_helper(
            REQUEST_WITH_TSIG,
            *TOO_LATE,
            ValidationResult::Invalid(VerificationError::BadTime),
        );
    }

    #[test]
    fn request_verification_rejects_early_message() {
        request_verification_helper(
            REQUEST_WITH_TSIG,
            *TOO_EARLY,
            ValidationResult::Invalid(VerificationError::BadTime),
        );
    }

    #[test]
    fn request_verification_accepts_edges_of_window() {
        for seconds in [1663798730 - FUDGE as u64, 1663798730 + FUDGE as u64] {
            request_verification_helper(
                REQUEST_WITH_TSIG,
                TimeSigned::try_from_unix_time(seconds).unwrap(),
                ValidationResult::Valid,
            );
        }
    }

    #[test]
    fn request_verification_rejects_wrong_key() {
        let (message_up_to_tsig, mut tsig) = read_message(REQUEST_WITH_TSIG);
        assert_eq!(
            tsig.verify_request(message_up_to_tsig, b"wrongsecret", *TIME_SIGNED),
            ValidationResult::Invalid(VerificationError::BadSig)
        );
    }

    #[test]
    fn request_verification_rejects_unknown_algorithm() {
        // Change "hmac-sha256" to "hmac-sha257".
        let mut message = REQUEST_WITH_TSIG.to_vec();
        message[REQUEST_TSIG_START + 22 + 11] = b'7';
        let (message_up_to_tsig, mut tsig) = read_message(&message);
        assert_eq!(tsig.algorithm(), Algorithm::Unknown);
        let result = tsig.verify_request(message_up_to_tsig, KEY, *TIME_SIGNED);
        assert_eq!(result, ValidationResult::Invalid(VerificationError::BadKey));
        assert_eq!(
            VerificationError::BadKey.tsig_error(),
            ExtendedRcode::BADKEY
        );
    }

    #[test]
    fn request_verification_rejects_short_message() {
        let (message_up_to_tsig, mut tsig) = read_message(REQUEST_WITH_TSIG);
        assert_eq!(
            tsig.verify_request(&message_up_to_tsig[..11], KEY, *TIME_SIGNED),
            ValidationResult::Invalid(VerificationError::FormErr)
        );
    }

    /// Re-encodes the request with its MAC truncated to `len` octets.
    fn request_with_truncated_mac(len: usize) -> Vec<u8> {
        let (message_up_to_tsig, tsig) = read_message(REQUEST_WITH_TSIG);
        let mut buf = vec![0; REQUEST_WITH_TSIG.len()];
        buf[..REQUEST_TSIG_START].copy_from_slice(message_up_to_tsig);
        let written = tsig
            .encode_with_mac(
                &mut buf,
                REQUEST_TSIG_START,
                &mut CompressionTable::new(),
                &REQUEST_MAC[..len],
            )
            .unwrap();
        buf.truncate(REQUEST_TSIG_START + written);
        buf
    }

    #[test]
    fn request_verification_applies_truncation_policy() {
        // Half of the SHA-256 digest is the shortest acceptable MAC.
        request_verification_helper(
            &request_with_truncated_mac(16),
            *TIME_SIGNED,
            ValidationResult::Valid,
        );
        request_verification_helper(
            &request_with_truncated_mac(15),
            *TIME_SIGNED,
            ValidationResult::Invalid(VerificationError::FormErr),
        );
        request_verification_helper(
            &request_with_truncated_mac(0),
            *TIME_SIGNED,
            ValidationResult::Invalid(VerificationError::FormErr),
        );
    }

    fn response_verification_helper(message: &[u8], now: TimeSigned, expected: ValidationResult) {
        let (message_up_to_tsig, mut tsig) = read_message(message);
        assert_eq!(
            tsig.verify_response(message_up_to_tsig, *REQUEST_MAC, KEY, now),
            expected
        );
        assert_eq!(tsig.validation_result(), expected);
    }

    #[test]
    fn response_verification_works() {
        response_verification_helper(RESPONSE_WITH_TSIG, *TIME_SIGNED, ValidationResult::Valid);
    }

    #[test]
    fn response_verification_rejects_corrupted_message() {
        response_verification_helper(
            &corrupt(RESPONSE_WITH_TSIG),
            *TIME_SIGNED,
            ValidationResult::Invalid(VerificationError::BadSig),
        );
    }

    #[test]
    fn response_verification_rejects_late_message() {
        response_verification_helper(
            RESPONSE_WITH_TSIG,
            *TOO_LATE,
            ValidationResult::Invalid(VerificationError::BadTime),
        );
    }

    #[test]
    fn response_verification_needs_the_right_request_mac() {
        let (message_up_to_tsig, mut tsig) = read_message(RESPONSE_WITH_TSIG);
        let mut request_mac = REQUEST_MAC.to_vec();
        request_mac[0] ^= 1;
        assert_eq!(
            tsig.verify_response(message_up_to_tsig, &request_mac, KEY, *TIME_SIGNED),
            ValidationResult::Invalid(VerificationError::BadSig)
        );
    }

    #[test]
    fn plain_verification_detects_mac_changes() {
        let data = b"some message bytes";
        let mut authenticator = Algorithm::HmacSha256.keyed_hash(KEY).unwrap();
        authenticator.update(data);
        let mac = authenticator.finalize();

        let record = request_record();
        let mut buf = vec![0; record.max_len()];
        let len = record
            .encode_with_mac(&mut buf, 0, &mut CompressionTable::new(), &mac)
            .unwrap();
        buf.truncate(len);

        let (mut parsed, _) = read_record::<TsigRecord>(&buf, 0).unwrap();
        assert_eq!(parsed.validation_result(), ValidationResult::NotValidated);
        assert_eq!(parsed.verify(data, KEY), ValidationResult::Valid);
        assert!(parsed.validation_result().is_valid());

        // The last octet of the MAC precedes the original ID, error, and
        // other length.
        buf[len - 7] ^= 0x01;
        let (mut parsed, _) = read_record::<TsigRecord>(&buf, 0).unwrap();
        assert_eq!(
            parsed.verify(data, KEY),
            ValidationResult::Invalid(VerificationError::BadSig)
        );
    }

    #[test]
    fn tsig_errors_map_to_rcodes() {
        assert_eq!(VerificationError::FormErr.tsig_error(), ExtendedRcode::FORMERR);
        assert_eq!(VerificationError::BadSig.tsig_error(), ExtendedRcode::BADSIG);
        assert_eq!(VerificationError::BadTime.tsig_error(), ExtendedRcode::BADTIME);
        assert_eq!(
            ValidationResult::Invalid(VerificationError::BadTime).to_string(),
            "invalid (BADTIME)"
        );
    }
}
