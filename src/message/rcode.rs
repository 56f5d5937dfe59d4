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

//! Implementation of the [`ExtendedRcode`] type.

use std::fmt;

////////////////////////////////////////////////////////////////////////
// EXTENDED RCODES                                                    //
////////////////////////////////////////////////////////////////////////

/// A 16-bit DNS response code.
///
/// The header RCODE field only has room for four bits, but the IANA
/// registry of response codes spans 16 bits; the upper bits are carried
/// in other places, such as the OPT pseudo-RR. The TSIG error field
/// holds a full 16-bit value from this same registry, which is why the
/// TSIG-specific codes BADSIG, BADKEY, BADTIME, and BADTRUNC live here.
///
/// Note that the value 16 is assigned both to BADVERS (for EDNS) and to
/// BADSIG (for TSIG). Which meaning applies depends on where the value
/// appears; in a TSIG error field it is always BADSIG.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ExtendedRcode(u16);

impl ExtendedRcode {
    pub const NOERROR: Self = Self(0);
    pub const FORMERR: Self = Self(1);
    pub const SERVFAIL: Self = Self(2);
    pub const NXDOMAIN: Self = Self(3);
    pub const NOTIMP: Self = Self(4);
    pub const REFUSED: Self = Self(5);
    pub const NOTAUTH: Self = Self(9);
    pub const BADVERSBADSIG: Self = Self(16);
    pub const BADKEY: Self = Self(17);
    pub const BADTIME: Self = Self(18);
    pub const BADMODE: Self = Self(19);
    pub const BADNAME: Self = Self(20);
    pub const BADALG: Self = Self(21);
    pub const BADTRUNC: Self = Self(22);
    pub const BADCOOKIE: Self = Self(23);

    // Alias used in TSIG contexts.
    pub const BADSIG: Self = Self::BADVERSBADSIG;
}

impl From<u16> for ExtendedRcode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<ExtendedRcode> for u16 {
    fn from(rcode: ExtendedRcode) -> Self {
        rcode.0
    }
}

impl fmt::Display for ExtendedRcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NOERROR => f.write_str("NOERROR"),
            Self::FORMERR => f.write_str("FORMERR"),
            Self::SERVFAIL => f.write_str("SERVFAIL"),
            Self::NXDOMAIN => f.write_str("NXDOMAIN"),
            Self::NOTIMP => f.write_str("NOTIMP"),
            Self::REFUSED => f.write_str("REFUSED"),
            Self::NOTAUTH => f.write_str("NOTAUTH"),
            Self::BADSIG => f.write_str("BADSIG"),
            Self::BADKEY => f.write_str("BADKEY"),
            Self::BADTIME => f.write_str("BADTIME"),
            Self::BADMODE => f.write_str("BADMODE"),
            Self::BADNAME => f.write_str("BADNAME"),
            Self::BADALG => f.write_str("BADALG"),
            Self::BADTRUNC => f.write_str("BADTRUNC"),
            Self::BADCOOKIE => f.write_str("BADCOOKIE"),
            Self(value) => write!(f, "RCODE{}", value),
        }
    }
}

impl fmt::Debug for ExtendedRcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsig_codes_have_assigned_values() {
        assert_eq!(u16::from(ExtendedRcode::BADSIG), 16);
        assert_eq!(u16::from(ExtendedRcode::BADKEY), 17);
        assert_eq!(u16::from(ExtendedRcode::BADTIME), 18);
        assert_eq!(u16::from(ExtendedRcode::BADTRUNC), 22);
    }

    #[test]
    fn display_works() {
        assert_eq!(ExtendedRcode::BADTIME.to_string(), "BADTIME");
        assert_eq!(ExtendedRcode::from(16).to_string(), "BADSIG");
        assert_eq!(ExtendedRcode::from(3841).to_string(), "RCODE3841");
        assert_eq!(ExtendedRcode::default(), ExtendedRcode::NOERROR);
    }
}
