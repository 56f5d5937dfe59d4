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

//! The registry of TSIG algorithms and the [`Authenticator`] trait
//! through which their keyed hashes are computed.

use std::collections::HashMap;
use std::fmt;

use hmac::digest::{MacError, OutputSizeUser};
use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// TSIG ALGORITHMS                                                    //
////////////////////////////////////////////////////////////////////////

const HMAC_MD5: &str = "hmac-md5.sig-alg.reg.int";
const HMAC_SHA1: &str = "hmac-sha1";
const HMAC_SHA256: &str = "hmac-sha256";
const HMAC_SHA384: &str = "hmac-sha384";
const HMAC_SHA512: &str = "hmac-sha512";

lazy_static! {
    static ref HMAC_MD5_NAME: Name = domain_name_of(HMAC_MD5);
    static ref HMAC_SHA1_NAME: Name = domain_name_of(HMAC_SHA1);
    static ref HMAC_SHA256_NAME: Name = domain_name_of(HMAC_SHA256);
    static ref HMAC_SHA384_NAME: Name = domain_name_of(HMAC_SHA384);
    static ref HMAC_SHA512_NAME: Name = domain_name_of(HMAC_SHA512);
    static ref ALGORITHMS_BY_NAME: HashMap<&'static Name, Algorithm> = HashMap::from([
        (&*HMAC_MD5_NAME, Algorithm::HmacMd5),
        (&*HMAC_SHA1_NAME, Algorithm::HmacSha1),
        (&*HMAC_SHA256_NAME, Algorithm::HmacSha256),
        (&*HMAC_SHA384_NAME, Algorithm::HmacSha384),
        (&*HMAC_SHA512_NAME, Algorithm::HmacSha512),
    ]);
}

/// Builds the fully qualified name for one of the constants above.
fn domain_name_of(canonical: &str) -> Name {
    format!("{}.", canonical)
        .parse()
        .expect("algorithm names are valid domain names")
}

/// A TSIG algorithm.
///
/// The concrete variants are the HMAC algorithms registered for TSIG
/// in [RFC 8945 § 6]. Any other algorithm name found in a record maps
/// to [`Algorithm::Unknown`]: such a record is still well formed, but
/// it cannot be signed, encoded, or verified.
///
/// [RFC 8945 § 6]: https://datatracker.ietf.org/doc/html/rfc8945#section-6
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    HmacMd5,
    HmacSha1,
    HmacSha256,
    HmacSha384,
    HmacSha512,
    Unknown,
}

impl Algorithm {
    /// Returns the registered name of the algorithm in lowercase and
    /// without a trailing dot, or `None` for [`Algorithm::Unknown`].
    pub fn canonical_name(&self) -> Option<&'static str> {
        match self {
            Self::HmacMd5 => Some(HMAC_MD5),
            Self::HmacSha1 => Some(HMAC_SHA1),
            Self::HmacSha256 => Some(HMAC_SHA256),
            Self::HmacSha384 => Some(HMAC_SHA384),
            Self::HmacSha512 => Some(HMAC_SHA512),
            Self::Unknown => None,
        }
    }

    /// Returns the registered name of the algorithm as a domain name,
    /// which is how it appears in TSIG RDATA.
    pub fn domain_name(&self) -> Option<&'static Name> {
        match self {
            Self::HmacMd5 => Some(&*HMAC_MD5_NAME),
            Self::HmacSha1 => Some(&*HMAC_SHA1_NAME),
            Self::HmacSha256 => Some(&*HMAC_SHA256_NAME),
            Self::HmacSha384 => Some(&*HMAC_SHA384_NAME),
            Self::HmacSha512 => Some(&*HMAC_SHA512_NAME),
            Self::Unknown => None,
        }
    }

    /// Finds an algorithm by its registered name, ignoring ASCII case.
    /// A single trailing dot is allowed. Anything unrecognized is
    /// [`Algorithm::Unknown`].
    pub fn from_name(name: &str) -> Self {
        let name = name.strip_suffix('.').unwrap_or(name);
        [
            Self::HmacMd5,
            Self::HmacSha1,
            Self::HmacSha256,
            Self::HmacSha384,
            Self::HmacSha512,
        ]
        .into_iter()
        .find(|algorithm| {
            algorithm
                .canonical_name()
                .map_or(false, |canonical| canonical.eq_ignore_ascii_case(name))
        })
        .unwrap_or(Self::Unknown)
    }

    /// Finds an algorithm by the domain name used for it in TSIG RDATA.
    pub fn from_domain_name(name: &Name) -> Self {
        ALGORITHMS_BY_NAME
            .get(name)
            .copied()
            .unwrap_or(Self::Unknown)
    }

    /// Returns the size in octets of the MAC the algorithm produces, or
    /// zero for [`Algorithm::Unknown`].
    pub fn digest_size(&self) -> usize {
        match self {
            Self::HmacMd5 => Hmac::<Md5>::output_size(),
            Self::HmacSha1 => Hmac::<Sha1>::output_size(),
            Self::HmacSha256 => Hmac::<Sha256>::output_size(),
            Self::HmacSha384 => Hmac::<Sha384>::output_size(),
            Self::HmacSha512 => Hmac::<Sha512>::output_size(),
            Self::Unknown => 0,
        }
    }

    /// Creates an [`Authenticator`] that computes this algorithm's MAC
    /// under `key`. This returns `None` for [`Algorithm::Unknown`].
    pub fn keyed_hash(&self, key: &[u8]) -> Option<Box<dyn Authenticator>> {
        match self {
            Self::HmacMd5 => boxed::<Hmac<Md5>>(key),
            Self::HmacSha1 => boxed::<Hmac<Sha1>>(key),
            Self::HmacSha256 => boxed::<Hmac<Sha256>>(key),
            Self::HmacSha384 => boxed::<Hmac<Sha384>>(key),
            Self::HmacSha512 => boxed::<Hmac<Sha512>>(key),
            Self::Unknown => None,
        }
    }
}

/// HMAC accepts keys of any length, so construction only fails for MACs
/// we never instantiate here.
fn boxed<M>(key: &[u8]) -> Option<Box<dyn Authenticator>>
where
    M: Mac + hmac::digest::KeyInit + 'static,
{
    <M as Mac>::new_from_slice(key)
        .ok()
        .map(|mac| Box::new(mac) as Box<dyn Authenticator>)
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.canonical_name().unwrap_or("unknown"))
    }
}

////////////////////////////////////////////////////////////////////////
// AUTHENTICATORS                                                     //
////////////////////////////////////////////////////////////////////////

/// An abstraction over different MAC implementations. Basically, this
/// wraps the `digest` crate's [`Mac`] trait to give us an object-safe
/// trait (so that we can use `Box<dyn Authenticator>`).
pub trait Authenticator {
    /// Feeds data into the MAC.
    fn update(&mut self, data: &[u8]);

    /// Consumes the authenticator and returns the MAC.
    fn finalize(self: Box<Self>) -> Box<[u8]>;

    /// Checks `tag` against the MAC in constant time.
    fn verify(self: Box<Self>, tag: &[u8]) -> Result<(), MacError>;

    /// Checks `tag` against the leftmost octets of the MAC in constant
    /// time, for truncated MACs.
    fn verify_truncated_left(self: Box<Self>, tag: &[u8]) -> Result<(), MacError>;
}

impl<M> Authenticator for M
where
    M: Mac,
{
    fn update(&mut self, data: &[u8]) {
        <Self as Mac>::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Box<[u8]> {
        <Self as Mac>::finalize(*self)
            .into_bytes()
            .to_vec()
            .into_boxed_slice()
    }

    fn verify(self: Box<Self>, tag: &[u8]) -> Result<(), MacError> {
        <Self as Mac>::verify_slice(*self, tag)
    }

    fn verify_truncated_left(self: Box<Self>, tag: &[u8]) -> Result<(), MacError> {
        <Self as Mac>::verify_truncated_left(*self, tag)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
