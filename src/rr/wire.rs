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

//! Bounds-checked cursors for reading and writing on-the-wire record
//! data. All multi-octet integers are in network byte order.

use super::{EncodeError, ParseError};
use crate::name::{CompressionTable, Name};

////////////////////////////////////////////////////////////////////////
// READING                                                            //
////////////////////////////////////////////////////////////////////////

/// A cursor over a region of a DNS message.
///
/// The reader holds the whole message (so that compressed names can be
/// followed) but refuses to read past the end of its region. Reads that
/// would do so fail with [`ParseError::Framing`] and leave the cursor
/// where it was.
#[derive(Clone, Debug)]
pub struct WireReader<'a> {
    octets: &'a [u8],
    cursor: usize,
    end: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader for the `len` octets of `octets` starting at
    /// `start`. This fails if that region is not entirely within
    /// `octets`.
    pub fn new(octets: &'a [u8], start: usize, len: usize) -> Result<Self, ParseError> {
        let end = start
            .checked_add(len)
            .filter(|end| *end <= octets.len())
            .ok_or(ParseError::Framing)?;
        Ok(Self {
            octets,
            cursor: start,
            end,
        })
    }

    /// Returns the current position in the message.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the number of octets left in the region.
    pub fn remaining(&self) -> usize {
        self.end - self.cursor
    }

    /// Reads a possibly compressed domain name.
    pub fn read_name(&mut self) -> Result<Name, ParseError> {
        let (name, len) = Name::try_from_compressed(&self.octets[..self.end], self.cursor)?;
        self.cursor += len;
        Ok(name)
    }

    /// Reads `len` octets.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if len > self.remaining() {
            return Err(ParseError::Framing);
        }
        let slice = &self.octets[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    /// Reads a fixed-size array of octets.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_slice(N)?);
        Ok(array)
    }

    /// Reads a `u16`.
    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Reads a field consisting of a `u16` length followed by that many
    /// octets. If the length runs past the end of the region, the
    /// cursor is left at the length field.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], ParseError> {
        let start = self.cursor;
        let len = self.read_u16()?;
        self.read_slice(len as usize).map_err(|err| {
            self.cursor = start;
            err
        })
    }

    /// Checks that the entire region has been consumed.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.cursor == self.end {
            Ok(())
        } else {
            Err(ParseError::LengthMismatch)
        }
    }
}

////////////////////////////////////////////////////////////////////////
// WRITING                                                            //
////////////////////////////////////////////////////////////////////////

/// A cursor that writes into a caller-provided message buffer.
///
/// Writes that do not fit fail with [`EncodeError::BufferTooSmall`];
/// the buffer may then hold a partially written field, so callers must
/// not transmit it.
#[derive(Debug)]
pub struct WireWriter<'a> {
    octets: &'a mut [u8],
    cursor: usize,
}

impl<'a> WireWriter<'a> {
    /// Creates a writer that starts writing at index `cursor` of
    /// `octets`.
    pub fn new(octets: &'a mut [u8], cursor: usize) -> Self {
        Self { octets, cursor }
    }

    /// Returns the current position in the message.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Writes `data` verbatim.
    pub fn write_slice(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let end = self
            .cursor
            .checked_add(data.len())
            .filter(|end| *end <= self.octets.len())
            .ok_or(EncodeError::BufferTooSmall)?;
        self.octets[self.cursor..end].copy_from_slice(data);
        self.cursor = end;
        Ok(())
    }

    /// Writes a `u16`.
    pub fn write_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.write_slice(&value.to_be_bytes())
    }

    /// Writes a `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_slice(&value.to_be_bytes())
    }

    /// Writes `data` preceded by its length as a `u16`.
    pub fn write_len_prefixed(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let len = u16::try_from(data.len()).or(Err(EncodeError::RdataTooLong))?;
        self.write_u16(len)?;
        self.write_slice(data)
    }

    /// Writes a domain name. If a [`CompressionTable`] is provided, the
    /// name is compressed against it and its newly written suffixes are
    /// recorded; otherwise it is written uncompressed and the table is
    /// left alone.
    pub fn write_name(
        &mut self,
        name: &Name,
        names: Option<&mut CompressionTable>,
    ) -> Result<(), EncodeError> {
        match names {
            None => self.write_slice(name.wire_repr()),
            Some(names) => {
                let start = self.cursor;
                let (literal_len, pointer) = names.longest_suffix(name);
                self.write_slice(&name.wire_repr()[..literal_len])?;
                if let Some(pointer) = pointer {
                    self.write_u16(0xc000 | pointer)?;
                }
                names.register(name, literal_len, start);
                Ok(())
            }
        }
    }

    /// Overwrites a `u16` that was previously written at `index`.
    pub fn patch_u16(&mut self, index: usize, value: u16) {
        assert!(index + 2 <= self.cursor, "patching a field not yet written");
        self.octets[index..index + 2].copy_from_slice(&value.to_be_bytes());
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_refuses_to_leave_its_region() {
        let octets = b"\x00\x01\x00\x02\xff";
        let mut reader = WireReader::new(octets, 0, 4).unwrap();
        assert_eq!(reader.read_u16(), Ok(1));
        assert_eq!(reader.read_u16(), Ok(2));
        assert_eq!(reader.read_u16(), Err(ParseError::Framing));
        assert_eq!(reader.cursor(), 4);
        assert!(reader.finish().is_ok());
        assert_eq!(
            WireReader::new(octets, 2, 4).unwrap_err(),
            ParseError::Framing
        );
    }

    #[test]
    fn reader_checks_length_prefixes() {
        let octets = b"\x00\x03abc\x00\x05ab";
        let mut reader = WireReader::new(octets, 0, octets.len()).unwrap();
        assert_eq!(reader.read_len_prefixed(), Ok(&b"abc"[..]));
        assert_eq!(reader.read_len_prefixed(), Err(ParseError::Framing));
        assert_eq!(reader.cursor(), 5);
        assert_eq!(reader.finish(), Err(ParseError::LengthMismatch));
    }

    #[test]
    fn reader_keeps_names_inside_the_region() {
        let octets = b"\x04test\x00";
        let mut reader = WireReader::new(octets, 0, 4).unwrap();
        assert_eq!(reader.read_name(), Err(ParseError::Framing));
        let mut reader = WireReader::new(octets, 0, 6).unwrap();
        assert_eq!(reader.read_name().unwrap().to_string(), "test.");
    }

    #[test]
    fn writer_refuses_to_overflow() {
        let mut buf = [0; 3];
        let mut writer = WireWriter::new(&mut buf, 0);
        writer.write_u16(0x1234).unwrap();
        assert_eq!(writer.write_u16(0x5678), Err(EncodeError::BufferTooSmall));
        assert_eq!(writer.cursor(), 2);
        let mut writer = WireWriter::new(&mut buf, 7);
        assert_eq!(writer.write_slice(b"x"), Err(EncodeError::BufferTooSmall));
    }

    #[test]
    fn writer_compresses_names() {
        let mut buf = [0; 64];
        let mut names = CompressionTable::new();
        let question: Name = "quandary.test.".parse().unwrap();
        let key: Name = "a.tsig.quandary.test.".parse().unwrap();
        let mut writer = WireWriter::new(&mut buf, 12);
        writer.write_name(&question, Some(&mut names)).unwrap();
        writer.write_name(&key, Some(&mut names)).unwrap();
        writer.write_name(&key, None).unwrap();
        let len = writer.cursor();
        assert_eq!(
            &buf[12..len],
            b"\x08quandary\x04test\x00\
              \x01a\x04tsig\xc0\x0c\
              \x01a\x04tsig\x08quandary\x04test\x00"
        );
        assert_eq!(names.get(&key), Some(27));
    }
}
