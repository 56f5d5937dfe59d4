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

//! The TSIG "time signed" field.

use std::fmt;
use std::time::{Duration, SystemTime};

/// The largest Unix time that fits in 48 bits.
const MAX_UNIX_TIME: u64 = (1 << 48) - 1;

/// The TSIG "time signed" field: Unix time as an unsigned 48-bit
/// big-endian integer.
///
/// The on-the-wire octets are the internal representation, so encoding
/// is a copy and the result never depends on host byte order. The type
/// converts to and from Unix time as a [`u64`] and to and from
/// [`SystemTime`].
///
/// Conversions involving [`SystemTime`] assume that it does not count
/// leap seconds, which holds for the Unix and Windows implementations.
/// Even if it did, the difference is far smaller than the usual fudge
/// of 300 seconds.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TimeSigned([u8; 6]);

impl TimeSigned {
    /// The Unix epoch.
    pub const EPOCH: Self = Self([0; 6]);

    /// Reads the system clock.
    pub fn now() -> Result<Self, UnrepresentableTimeError> {
        Self::try_from(SystemTime::now())
    }

    /// Converts Unix time in seconds. This fails if `seconds` needs more
    /// than 48 bits.
    pub fn try_from_unix_time(seconds: u64) -> Result<Self, UnrepresentableTimeError> {
        if seconds > MAX_UNIX_TIME {
            return Err(UnrepresentableTimeError);
        }
        let mut octets = [0; 6];
        octets.copy_from_slice(&seconds.to_be_bytes()[2..]);
        Ok(Self(octets))
    }

    /// Returns the time as Unix time in seconds.
    pub fn to_unix_time(self) -> u64 {
        self.0
            .iter()
            .fold(0, |seconds, octet| (seconds << 8) | *octet as u64)
    }

    /// Returns the number of seconds between two times, in whichever
    /// order they come.
    pub fn abs_diff(self, other: Self) -> u64 {
        self.to_unix_time().abs_diff(other.to_unix_time())
    }

    /// Returns the on-the-wire octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 6]> for TimeSigned {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl From<TimeSigned> for [u8; 6] {
    fn from(time_signed: TimeSigned) -> Self {
        time_signed.0
    }
}

impl TryFrom<SystemTime> for TimeSigned {
    type Error = UnrepresentableTimeError;

    /// Truncates to whole seconds. Times before the epoch cannot be
    /// represented.
    fn try_from(system_time: SystemTime) -> Result<Self, Self::Error> {
        let since_epoch = system_time
            .duration_since(SystemTime::UNIX_EPOCH)
            .or(Err(UnrepresentableTimeError))?;
        Self::try_from_unix_time(since_epoch.as_secs())
    }
}

impl TryFrom<TimeSigned> for SystemTime {
    type Error = UnrepresentableTimeError;

    fn try_from(time_signed: TimeSigned) -> Result<Self, Self::Error> {
        SystemTime::UNIX_EPOCH
            .checked_add(Duration::from_secs(time_signed.to_unix_time()))
            .ok_or(UnrepresentableTimeError)
    }
}

impl fmt::Display for TimeSigned {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_unix_time())
    }
}

impl fmt::Debug for TimeSigned {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_unix_time())
    }
}

/// An error signifying that a time falls outside the range of the
/// target type (before the Unix epoch, or beyond 48 bits of seconds).
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnrepresentableTimeError;

impl fmt::Display for UnrepresentableTimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("time cannot be represented as a TSIG time signed")
    }
}

impl std::error::Error for UnrepresentableTimeError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_big_endian() {
        let time = TimeSigned::try_from_unix_time(0x632912b4).unwrap();
        assert_eq!(time.as_slice(), b"\x00\x00\x63\x29\x12\xb4");
        let time = TimeSigned::try_from_unix_time(0x0102_0304_0506).unwrap();
        assert_eq!(<[u8; 6]>::from(time), [1, 2, 3, 4, 5, 6]);
        assert_eq!(TimeSigned::from([1, 2, 3, 4, 5, 6]).to_unix_time(), 0x0102_0304_0506);
    }

    #[test]
    fn unix_time_round_trips() {
        // The epoch, 2022, the end of 32-bit time, year 10000, and the
        // largest 48-bit value.
        for seconds in [0, 1663798730, 1 << 32, 253402300800, MAX_UNIX_TIME] {
            let time = TimeSigned::try_from_unix_time(seconds).unwrap();
            assert_eq!(time.to_unix_time(), seconds);
        }
        assert_eq!(TimeSigned::try_from_unix_time(0).unwrap(), TimeSigned::EPOCH);
    }

    #[test]
    fn system_time_round_trips() {
        for seconds in [0, 1_000_000, 253402300800] {
            let system_time = SystemTime::UNIX_EPOCH + Duration::from_secs(seconds);
            let time = TimeSigned::try_from(system_time).unwrap();
            assert_eq!(time.to_unix_time(), seconds);
            assert_eq!(SystemTime::try_from(time).unwrap(), system_time);
        }
    }

    #[test]
    fn sub_second_precision_is_truncated() {
        let system_time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_999);
        assert_eq!(TimeSigned::try_from(system_time).unwrap().to_unix_time(), 1);
    }

    #[test]
    fn out_of_range_times_are_rejected() {
        assert_eq!(
            TimeSigned::try_from_unix_time(MAX_UNIX_TIME + 1),
            Err(UnrepresentableTimeError)
        );
        assert_eq!(
            TimeSigned::try_from(SystemTime::UNIX_EPOCH - Duration::from_secs(1)),
            Err(UnrepresentableTimeError)
        );
    }

    #[test]
    fn abs_diff_works() {
        let a = TimeSigned::try_from_unix_time(1000).unwrap();
        let b = TimeSigned::try_from_unix_time(1300).unwrap();
        assert_eq!(a.abs_diff(b), 300);
        assert_eq!(b.abs_diff(a), 300);
        assert!(a < b);
    }
}
