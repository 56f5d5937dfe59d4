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

//! Implementation of parsing and skipping of on-the-wire names.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_WIRE_LEN};

////////////////////////////////////////////////////////////////////////
// PARSING OF COMPRESSED ON-THE-WIRE NAMES                            //
////////////////////////////////////////////////////////////////////////

/// Parses a compressed name starting at index `start` of `octets`.
/// This is the implementation of [`Name::try_from_compressed`].
///
/// Every read is bounds-checked, so a truncated message produces
/// [`Error::UnexpectedEom`] rather than a panic.
pub fn parse_compressed_name(octets: &[u8], start: usize) -> Result<(Name, usize), Error> {
    let mut next_chunk = Some(start);
    let mut wire_len_of_first_chunk = 0;
    let mut wire_repr = ArrayVec::<u8, MAX_WIRE_LEN>::new();

    while let Some(chunk_start) = next_chunk {
        let mut index = chunk_start;

        loop {
            let len = *octets.get(index).ok_or(Error::UnexpectedEom)?;
            if len & 0xc0 == 0xc0 {
                next_chunk = Some(parse_pointer(octets, chunk_start, index)? as usize);
                index += 2;
                break;
            } else if len > (MAX_LABEL_LEN as u8) {
                return Err(Error::LabelTooLong);
            }

            let end_of_label = index + len as usize + 1;
            let label = octets
                .get(index..end_of_label)
                .ok_or(Error::UnexpectedEom)?;
            wire_repr
                .try_extend_from_slice(label)
                .or(Err(Error::NameTooLong))?;
            index = end_of_label;
            if len == 0 {
                next_chunk = None;
                break;
            }
        }

        // Pointers always refer to earlier offsets, so only the first
        // chunk starts at `start`.
        if chunk_start == start {
            wire_len_of_first_chunk = index - chunk_start;
        }
    }

    Ok((Name::from_wire_unchecked(&wire_repr), wire_len_of_first_chunk))
}

/// Parses a pointer at `index` in `octets`. This also checks that the
/// pointer refers to an index *earlier* than the start of the chunk it
/// is in (`chunk_start`).
fn parse_pointer(octets: &[u8], chunk_start: usize, index: usize) -> Result<u16, Error> {
    let pointer_bytes = octets
        .get(index..index + 2)
        .ok_or(Error::UnexpectedEom)?;
    let pointer = u16::from_be_bytes([pointer_bytes[0], pointer_bytes[1]]) & !0xc000;
    if (pointer as usize) >= chunk_start {
        // According to RFC 1035 § 4.1.4, pointers point to a *prior*
        // occurrence of the name. (Importantly, this prevents loops!)
        Err(Error::InvalidPointer)
    } else {
        Ok(pointer)
    }
}

////////////////////////////////////////////////////////////////////////
// SKIPPING OF COMPRESSED ON-THE-WIRE NAMES                           //
////////////////////////////////////////////////////////////////////////

/// Skips a compressed name starting at the beginning of `octets`; this
/// is the implementation of [`Name::skip_compressed`].
pub fn skip_compressed_name(octets: &[u8]) -> Result<usize, Error> {
    let mut offset = 0;
    while offset < octets.len() {
        let label_len = octets[offset];
        if label_len & 0xc0 == 0xc0 {
            return if offset + 2 <= octets.len() {
                Ok(offset + 2)
            } else {
                Err(Error::UnexpectedEom)
            };
        } else if label_len > (MAX_LABEL_LEN as u8) {
            return Err(Error::LabelTooLong);
        } else if label_len == 0 {
            return Ok(offset + 1);
        }
        offset += 1 + label_len as usize;
        if offset > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
    }
    Err(Error::UnexpectedEom)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
