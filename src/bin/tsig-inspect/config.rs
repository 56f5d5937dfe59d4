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

//! Implements the TSIG key file.
//!
//! A key file is a small TOML document:
//!
//! ```toml
//! name = "a.tsig.key."
//! algorithm = "hmac-sha256"
//! secret = "dG9wc2VjcmV0"   # base64
//! fudge = 300               # optional
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use paste::paste;
use serde::{de, Deserialize};

use tsig::name::Name;
use tsig::tsig::{Algorithm, DEFAULT_FUDGE};

////////////////////////////////////////////////////////////////////////
// KEY FILE LOADING                                                   //
////////////////////////////////////////////////////////////////////////

/// Loads a key from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<KeyConfig> {
    let raw_config = fs::read(path.as_ref()).context("failed to read the key file")?;
    parse(&raw_config)
}

fn parse(raw_config: &[u8]) -> Result<KeyConfig> {
    let config: KeyConfig =
        toml::from_slice(raw_config).context("failed to parse the key file")?;
    debug!(
        "Loaded key {} ({}, fudge {} s).",
        config.name.0, config.algorithm.0, config.fudge
    );
    Ok(config)
}

/// A TSIG key.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    pub name: ConfigName,
    pub algorithm: ConfigAlgorithm,
    pub secret: ConfigSecret,
    #[serde(default = "default_fudge")]
    pub fudge: u16,
}

fn default_fudge() -> u16 {
    DEFAULT_FUDGE
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER LIBRARY TYPES FOR SERDE                              //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type,
/// using `$parse` to convert from a string.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal, $parse:expr) => {
        /// A macro-generated deserializable wrapper.
        #[derive(Clone)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                $parse(value)
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name", |value: &str| value
    .parse::<Name>());
make_serde_wrapper!(
    ConfigAlgorithm,
    Algorithm,
    "TSIG algorithm",
    |value: &str| match Algorithm::from_name(value) {
        Algorithm::Unknown => Err("not a supported algorithm"),
        algorithm => Ok(algorithm),
    }
);
make_serde_wrapper!(ConfigSecret, Box<[u8]>, "base64 secret", |value: &str| BASE64
    .decode(value)
    .map(Vec::into_boxed_slice));

impl fmt::Debug for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConfigName({})", self.0)
    }
}

impl fmt::Debug for ConfigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConfigAlgorithm({})", self.0)
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ConfigSecret(<redacted>)")
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_parses() {
        let config = parse(
            b"name = \"a.tsig.key.\"\n\
              algorithm = \"HMAC-SHA256\"\n\
              secret = \"dG9wc2VjcmV0\"\n",
        )
        .unwrap();
        assert_eq!(config.name.0, "a.tsig.key.".parse().unwrap());
        assert_eq!(config.algorithm.0, Algorithm::HmacSha256);
        assert_eq!(config.secret.0.as_ref(), b"topsecret");
        assert_eq!(config.fudge, DEFAULT_FUDGE);
        assert!(!format!("{:?}", config).contains("topsecret"));
    }

    #[test]
    fn key_file_rejects_bad_values() {
        for raw in [
            &b"name = \"a.tsig.key.\"\nalgorithm = \"gss-tsig\"\nsecret = \"\"\n"[..],
            b"name = \"a.tsig.key.\"\nalgorithm = \"hmac-sha1\"\nsecret = \"***\"\n",
            b"name = \"a..b\"\nalgorithm = \"hmac-sha1\"\nsecret = \"\"\n",
            b"name = \"a.\"\nalgorithm = \"hmac-sha1\"\nsecret = \"\"\nextra = 1\n",
        ] {
            assert!(parse(raw).is_err());
        }
    }
}
