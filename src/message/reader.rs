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

//! Implementation of the [`Reader`] type to walk on-the-wire DNS
//! messages.

use std::fmt;

use super::constants::*;
use crate::name::Name;
use crate::rr::{self, ParseError, Record, RecordHeader};

////////////////////////////////////////////////////////////////////////
// READER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer containing a DNS message that enables
/// walking through the message data.
///
/// A `Reader` is constructed using its [`TryFrom`] implementation. Any
/// underlying buffer for a reader must contain at least a full DNS
/// message header of 12 octets; otherwise the construction will fail.
///
/// Header fields can be read at any time. Questions and records are
/// visited with a cursor, which is initially set to the first octet
/// after the header. Only what is needed to reach a TSIG record is
/// supported: questions and untyped records can be skipped, and a
/// record of a known type can be read.
#[derive(Clone, Eq, PartialEq)]
pub struct Reader<'a> {
    octets: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Returns the 16-bit ID of the message.
    pub fn id(&self) -> u16 {
        self.read_header_u16(ID_START, ID_END)
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        (self.octets[QR_BYTE] & QR_MASK) != 0
    }

    /// Returns the number of questions in the message.
    pub fn qdcount(&self) -> u16 {
        self.read_header_u16(QDCOUNT_START, QDCOUNT_END)
    }

    /// Returns the number of records in the answer section.
    pub fn ancount(&self) -> u16 {
        self.read_header_u16(ANCOUNT_START, ANCOUNT_END)
    }

    /// Returns the number of records in the authority section.
    pub fn nscount(&self) -> u16 {
        self.read_header_u16(NSCOUNT_START, NSCOUNT_END)
    }

    /// Returns the number of records in the additional section.
    pub fn arcount(&self) -> u16 {
        self.read_header_u16(ARCOUNT_START, ARCOUNT_END)
    }

    fn read_header_u16(&self, start: usize, end: usize) -> u16 {
        let mut array = [0; 2];
        array.copy_from_slice(&self.octets[start..end]);
        u16::from_be_bytes(array)
    }

    /// Returns the current position of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the message up to (but not including) the cursor. After
    /// the cursor has been moved to a TSIG record, this is the data
    /// that the record's MAC covers.
    pub fn message_to_cursor(&self) -> &'a [u8] {
        &self.octets[..self.cursor]
    }

    /// Skips the question at the current cursor.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn skip_question(&mut self) -> Result<(), ParseError> {
        let qname_len = Name::skip_compressed(&self.octets[self.cursor..])?;
        let end = self.cursor + qname_len + 4;
        if end > self.octets.len() {
            return Err(ParseError::Framing);
        }
        self.cursor = end;
        Ok(())
    }

    /// Skips the resource record at the current cursor, whatever its
    /// type.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn skip_rr(&mut self) -> Result<(), ParseError> {
        let (header, header_len) = RecordHeader::read(self.octets, self.cursor)?;
        let end = self.cursor + header_len + header.rdlength as usize;
        if end > self.octets.len() {
            return Err(ParseError::Framing);
        }
        self.cursor = end;
        Ok(())
    }

    /// Reads a record of type `R` at the current cursor.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn read_record<R: Record>(&mut self) -> Result<R, ParseError> {
        let (record, len) = rr::read_record(self.octets, self.cursor)?;
        self.cursor += len;
        Ok(record)
    }

    /// Moves the cursor to the last record of the additional section,
    /// which is where a TSIG record must be. The walk starts over from
    /// the question section regardless of where the cursor was.
    pub fn seek_last_additional(&mut self) -> Result<(), ParseError> {
        if self.arcount() == 0 {
            return Err(ParseError::MissingRecord);
        }
        let mut walker = Self {
            octets: self.octets,
            cursor: HEADER_SIZE,
        };
        for _ in 0..walker.qdcount() {
            walker.skip_question()?;
        }
        let to_skip =
            walker.ancount() as usize + walker.nscount() as usize + walker.arcount() as usize - 1;
        for _ in 0..to_skip {
            walker.skip_rr()?;
        }
        self.cursor = walker.cursor;
        Ok(())
    }

    /// Returns whether the `Reader`'s cursor has reached the end of the
    /// message.
    pub fn at_eom(&self) -> bool {
        self.cursor >= self.octets.len()
    }
}

impl<'a> TryFrom<&'a [u8]> for Reader<'a> {
    type Error = ParseError;

    fn try_from(octets: &'a [u8]) -> Result<Self, Self::Error> {
        if octets.len() >= HEADER_SIZE {
            Ok(Self {
                octets,
                cursor: HEADER_SIZE,
            })
        } else {
            Err(ParseError::HeaderTooShort)
        }
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("id", &self.id())
            .field("qr", &self.qr())
            .field("qdcount", &self.qdcount())
            .field("ancount", &self.ancount())
            .field("nscount", &self.nscount())
            .field("arcount", &self.arcount())
            .field("cursor", &self.cursor)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// This is a reply to a query for example.com. IN NS to a recursive
    /// server, made on January 7, 2022.
    const EXAMPLE_COM_NS_MESSAGE: &[u8] =
        b"\xe2\xd7\x81\x80\x00\x01\x00\x02\x00\x00\x00\x01\x07\x65\x78\x61\
          \x6d\x70\x6c\x65\x03\x63\x6f\x6d\x00\x00\x02\x00\x01\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x14\x01\x61\x0c\x69\x61\x6e\x61\
          \x2d\x73\x65\x72\x76\x65\x72\x73\x03\x6e\x65\x74\x00\xc0\x0c\x00\
          \x02\x00\x01\x00\x01\x50\xa2\x00\x04\x01\x62\xc0\x2b\x00\x00\x29\
          \x10\x00\x00\x00\x00\x00\x00\x00";

    #[test]
    fn reader_works() {
        let mut reader = Reader::try_from(EXAMPLE_COM_NS_MESSAGE).unwrap();
        assert_eq!(reader.id(), 0xe2d7);
        assert!(reader.qr());
        assert_eq!(reader.qdcount(), 1);
        assert_eq!(reader.ancount(), 2);
        assert_eq!(reader.nscount(), 0);
        assert_eq!(reader.arcount(), 1);

        reader.skip_question().unwrap();
        assert_eq!(reader.cursor(), 29);
        reader.skip_rr().unwrap();
        reader.skip_rr().unwrap();
        let opt_start = reader.cursor();
        reader.skip_rr().unwrap();
        assert!(reader.at_eom());

        reader.seek_last_additional().unwrap();
        assert_eq!(reader.cursor(), opt_start);
        assert_eq!(reader.message_to_cursor(), &EXAMPLE_COM_NS_MESSAGE[..opt_start]);
    }

    #[test]
    fn reader_is_atomic_on_failure() {
        let truncated = &EXAMPLE_COM_NS_MESSAGE[..40];
        let mut reader = Reader::try_from(truncated).unwrap();
        reader.skip_question().unwrap();
        assert_eq!(reader.skip_rr(), Err(ParseError::Framing));
        assert_eq!(reader.cursor(), 29);
        assert_eq!(reader.seek_last_additional(), Err(ParseError::Framing));
        assert_eq!(reader.cursor(), 29);
    }

    #[test]
    fn seek_requires_an_additional_record() {
        let mut message = EXAMPLE_COM_NS_MESSAGE.to_vec();
        message[11] = 0;
        let mut reader = Reader::try_from(message.as_slice()).unwrap();
        assert_eq!(reader.seek_last_additional(), Err(ParseError::MissingRecord));
    }

    #[test]
    fn reader_constructor_rejects_short_message() {
        for size in 0..HEADER_SIZE {
            let buf = vec![0; size];
            assert_eq!(
                Reader::try_from(buf.as_slice()),
                Err(ParseError::HeaderTooShort)
            );
        }
    }
}
