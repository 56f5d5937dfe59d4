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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Inspect, verify, and sign DNS messages with TSIG records
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the TSIG record of a message
    Show(ShowArgs),

    /// Verify the TSIG record of a message
    Verify(VerifyArgs),

    /// Sign a request message, appending a TSIG record
    Sign(SignArgs),
}

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// The raw DNS message
    #[clap(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct VerifyArgs {
    /// The raw DNS message
    #[clap(value_name = "FILE")]
    pub file: PathBuf,

    /// Set the key file to use
    #[clap(long, value_name = "KEYFILE")]
    pub key: PathBuf,

    /// Verify as of this Unix time instead of the current time
    #[clap(long, value_name = "SECONDS")]
    pub now: Option<u64>,

    /// Verify as a response to a request with this MAC
    #[clap(long, value_name = "BASE64", value_parser = parse_base64)]
    pub request_mac: Option<Box<[u8]>>,
}

#[derive(Debug, Parser)]
pub struct SignArgs {
    /// The raw DNS message to sign
    #[clap(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the signed message
    #[clap(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Set the key file to use
    #[clap(long, value_name = "KEYFILE")]
    pub key: PathBuf,

    /// Sign with this Unix time instead of the current time
    #[clap(long, value_name = "SECONDS")]
    pub now: Option<u64>,
}

fn parse_base64(text: &str) -> Result<Box<[u8]>, base64::DecodeError> {
    BASE64.decode(text).map(Vec::into_boxed_slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_args_parse_request_mac() {
        let args = Args::try_parse_from([
            "tsig-inspect",
            "verify",
            "response.bin",
            "--key",
            "key.toml",
            "--now",
            "1663798730",
            "--request-mac",
            "dG9wc2VjcmV0",
        ])
        .unwrap();
        match args.command {
            Command::Verify(verify) => {
                assert_eq!(verify.now, Some(1663798730));
                assert_eq!(verify.request_mac.as_deref(), Some(&b"topsecret"[..]));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn bad_base64_is_rejected() {
        assert!(Args::try_parse_from([
            "tsig-inspect",
            "verify",
            "response.bin",
            "--key",
            "key.toml",
            "--request-mac",
            "not base64!",
        ])
        .is_err());
    }
}
