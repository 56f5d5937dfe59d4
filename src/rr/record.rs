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

//! The [`Record`] trait and the fixed header shared by all resource
//! records.

use std::fmt;

use super::{EncodeError, ParseError, Type, WireReader, WireWriter};
use crate::class::Class;
use crate::name::{CompressionTable, Name};

/// The size of the fixed part of an RR header (TYPE, CLASS, TTL and
/// RDLENGTH), which follows the owner name.
pub const FIXED_HEADER_LEN: usize = 10;

////////////////////////////////////////////////////////////////////////
// RECORD HEADER                                                      //
////////////////////////////////////////////////////////////////////////

/// The header of a resource record as found in a message: everything
/// before the RDATA.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordHeader {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: u32,
    pub rdlength: u16,
}

impl RecordHeader {
    /// Reads a record header starting at index `cursor` of `message`.
    /// On success, the header and its on-the-wire length are returned.
    ///
    /// The RDATA itself is not examined, so a header whose RDLENGTH
    /// runs past the end of the message is still returned.
    pub fn read(message: &[u8], cursor: usize) -> Result<(Self, usize), ParseError> {
        let available = message.len().saturating_sub(cursor);
        let mut reader = WireReader::new(message, cursor, available)?;
        let owner = reader.read_name()?;
        let rr_type = reader.read_u16()?.into();
        let class = reader.read_u16()?.into();
        let ttl = reader.read_u32()?;
        let rdlength = reader.read_u16()?;
        let header = Self {
            owner,
            rr_type,
            class,
            ttl,
            rdlength,
        };
        Ok((header, reader.cursor() - cursor))
    }
}

////////////////////////////////////////////////////////////////////////
// RECORD TRAIT                                                       //
////////////////////////////////////////////////////////////////////////

/// Capabilities shared by typed resource records: parsing from a
/// message, encoding into one, and rendering as text (through
/// [`Display`](fmt::Display)).
pub trait Record: fmt::Display {
    /// The RR type of records of this kind.
    const RR_TYPE: Type;

    /// Returns the owner name of the record.
    fn owner(&self) -> &Name;

    /// Returns the class of the record.
    fn class(&self) -> Class;

    /// Returns the TTL of the record.
    fn ttl(&self) -> u32;

    /// Returns an upper bound on the length of the record's RDATA, for
    /// sizing buffers before encoding.
    fn max_rdata_len(&self) -> usize;

    /// Parses a record whose header has already been read. The RDATA
    /// occupies the `rdlength` octets of `message` starting at `start`;
    /// the whole message is needed to follow compression pointers.
    fn parse_record_data(
        header: RecordHeader,
        message: &[u8],
        start: usize,
        rdlength: usize,
    ) -> Result<Self, ParseError>
    where
        Self: Sized;

    /// Writes the record's RDATA.
    fn encode_rdata(&self, writer: &mut WireWriter) -> Result<(), EncodeError>;

    /// Encodes the whole record at index `offset` of `octets`, returning
    /// the number of octets written. See [`encode_record`].
    fn encode(
        &self,
        octets: &mut [u8],
        offset: usize,
        names: &mut CompressionTable,
    ) -> Result<usize, EncodeError> {
        encode_record(self, octets, offset, names, |writer| {
            self.encode_rdata(writer)
        })
    }
}

/// Reads a record of type `R` starting at index `cursor` of `message`,
/// returning it along with its total on-the-wire length.
pub fn read_record<R: Record>(message: &[u8], cursor: usize) -> Result<(R, usize), ParseError> {
    let (header, header_len) = RecordHeader::read(message, cursor)?;
    if header.rr_type != R::RR_TYPE {
        return Err(ParseError::WrongType(header.rr_type));
    }
    let rdlength = header.rdlength as usize;
    let record = R::parse_record_data(header, message, cursor + header_len, rdlength)?;
    Ok((record, header_len + rdlength))
}

/// Encodes a record at index `offset` of `octets` using `write_rdata`
/// for the RDATA, returning the number of octets written.
///
/// The owner name is compressed against `names`. The RDLENGTH field is
/// written as a placeholder and filled in once the RDATA is complete.
/// If anything fails, entries added to `names` are rolled back, since
/// they would point into a region that must not be transmitted.
pub fn encode_record<R, F>(
    record: &R,
    octets: &mut [u8],
    offset: usize,
    names: &mut CompressionTable,
    write_rdata: F,
) -> Result<usize, EncodeError>
where
    R: Record + ?Sized,
    F: FnOnce(&mut WireWriter) -> Result<(), EncodeError>,
{
    let checkpoint = names.checkpoint();
    let mut writer = WireWriter::new(octets, offset);
    match write_record(record, &mut writer, names, write_rdata) {
        Ok(()) => Ok(writer.cursor() - offset),
        Err(err) => {
            names.rollback(checkpoint);
            Err(err)
        }
    }
}

/// The fallible part of [`encode_record`].
fn write_record<R, F>(
    record: &R,
    writer: &mut WireWriter,
    names: &mut CompressionTable,
    write_rdata: F,
) -> Result<(), EncodeError>
where
    R: Record + ?Sized,
    F: FnOnce(&mut WireWriter) -> Result<(), EncodeError>,
{
    writer.write_name(record.owner(), Some(names))?;
    writer.write_u16(R::RR_TYPE.into())?;
    writer.write_u16(record.class().into())?;
    writer.write_u32(record.ttl())?;
    let rdlength_index = writer.cursor();
    writer.write_u16(0)?;
    write_rdata(writer)?;
    let rdlength = writer.cursor() - rdlength_index - 2;
    let rdlength = u16::try_from(rdlength).or(Err(EncodeError::RdataTooLong))?;
    writer.patch_u16(rdlength_index, rdlength);
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_read_works() {
        let message = b"\x01a\x04tsig\x03key\x00\x00\xfa\x00\xff\x00\x00\x00\x00\x00\x3d";
        let (header, len) = RecordHeader::read(message, 0).unwrap();
        assert_eq!(len, message.len());
        assert_eq!(header.owner.to_string(), "a.tsig.key.");
        assert_eq!(header.rr_type, Type::TSIG);
        assert_eq!(header.class, Class::ANY);
        assert_eq!(header.ttl, 0);
        assert_eq!(header.rdlength, 61);
    }

    #[test]
    fn header_read_rejects_truncation() {
        let message = b"\x01a\x04tsig\x03key\x00\x00\xfa\x00\xff\x00\x00\x00\x00\x00";
        assert_eq!(
            RecordHeader::read(message, 0).unwrap_err(),
            ParseError::Framing
        );
        assert_eq!(
            RecordHeader::read(message, message.len() + 1).unwrap_err(),
            ParseError::Framing
        );
    }
}
