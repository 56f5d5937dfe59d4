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

//! The parts of the DNS message container that TSIG relies on: header
//! layout, the 16-bit response code space, and a [`Reader`] to find
//! the TSIG record in a received message.

pub mod constants;
mod rcode;
mod reader;
pub use rcode::ExtendedRcode;
pub use reader::Reader;
