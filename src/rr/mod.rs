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

//! Resource record plumbing: RR types, the record header, the
//! [`Record`] trait implemented by typed records, and the cursors used
//! to read and write their on-the-wire form.

mod error;
mod record;
mod rr_type;
mod wire;
pub use error::{EncodeError, ParseError};
pub use record::{encode_record, read_record, Record, RecordHeader, FIXED_HEADER_LEN};
pub use rr_type::Type;
pub use wire::{WireReader, WireWriter};
