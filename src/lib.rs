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

//! Transaction signatures (TSIG) for DNS messages.
//!
//! The [`tsig`] module holds the algorithm registry, the "time signed"
//! codec, and the TSIG record with its signing and verification
//! operations. The remaining modules provide what those need from the
//! surrounding DNS message: [domain names](name) and their compression,
//! [classes](class), [RR plumbing](rr), and a [message](message) reader.

pub mod class;
pub mod message;
pub mod name;
pub mod rr;
pub mod tsig;
