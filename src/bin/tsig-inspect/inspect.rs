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

//! Implements the `show`, `verify`, and `sign` commands.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use tsig::class::Class;
use tsig::message::constants::{ARCOUNT_END, ARCOUNT_START};
use tsig::message::Reader;
use tsig::name::CompressionTable;
use tsig::rr::{Record, Type};
use tsig::tsig::{TimeSigned, TsigRecord, ValidationResult, VerificationError};

use crate::args::{ShowArgs, SignArgs, VerifyArgs};
use crate::config;

/// Runs the `show` command.
pub fn show(args: ShowArgs) -> Result<()> {
    let message = read_message(&args.file)?;
    let (_, record) = find_tsig(&message)?;
    print_record(&record);
    Ok(())
}

/// Runs the `verify` command. Failed verification is an error.
pub fn verify(args: VerifyArgs) -> Result<()> {
    let key = config::load_from_path(&args.key).context("failed to load the key")?;
    let message = read_message(&args.file)?;
    let (message_up_to_tsig, mut record) = find_tsig(&message)?;
    let now = current_time(args.now)?;

    let result = if *record.key_name() != key.name.0 || record.algorithm() != key.algorithm.0 {
        warn!(
            "The message is signed with key {} ({}), not {} ({}).",
            record.key_name(),
            record.algorithm(),
            key.name.0,
            key.algorithm.0,
        );
        ValidationResult::Invalid(VerificationError::BadKey)
    } else if let Some(request_mac) = args.request_mac {
        record.verify_response(message_up_to_tsig, &request_mac, &key.secret.0, now)
    } else {
        record.verify_request(message_up_to_tsig, &key.secret.0, now)
    };

    print_record(&record);
    println!("; {}", result);
    match result {
        ValidationResult::Invalid(err) => Err(anyhow!(
            "verification failed; a responder would answer {}",
            err.tsig_error()
        )),
        _ => Ok(()),
    }
}

/// Runs the `sign` command.
pub fn sign(args: SignArgs) -> Result<()> {
    let key = config::load_from_path(&args.key).context("failed to load the key")?;
    let mut message = read_message(&args.input)?;
    let reader = Reader::try_from(message.as_slice()).context("failed to read the message")?;
    let id = reader.id();
    let arcount = reader
        .arcount()
        .checked_add(1)
        .ok_or_else(|| anyhow!("the message has no room for another additional record"))?;
    message[ARCOUNT_START..ARCOUNT_END].copy_from_slice(&arcount.to_be_bytes());

    let now = current_time(args.now)?;
    let mut record = TsigRecord::new(key.name.0, key.algorithm.0, now, key.fudge, id)
        .with_key_data(key.secret.0);
    record
        .sign_request(&message)
        .context("failed to sign the message")?;

    let start = message.len();
    message.resize(start + record.max_len(), 0);
    let len = record
        .encode(&mut message, start, &mut CompressionTable::new())
        .context("failed to encode the TSIG record")?;
    message.truncate(start + len);

    fs::write(&args.output, &message)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("Wrote {} octets to {}.", message.len(), args.output.display());
    print_record(&record);
    Ok(())
}

fn read_message(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Finds the TSIG record of a message, returning the message up to the
/// record along with the record.
fn find_tsig(message: &[u8]) -> Result<(&[u8], TsigRecord)> {
    let mut reader = Reader::try_from(message).context("failed to read the message")?;
    reader
        .seek_last_additional()
        .context("failed to find the last additional record")?;
    let message_up_to_tsig = reader.message_to_cursor();
    let record = reader
        .read_record::<TsigRecord>()
        .context("failed to read the TSIG record")?;
    if !reader.at_eom() {
        warn!("The message has data after its TSIG record.");
    }
    Ok((message_up_to_tsig, record))
}

fn current_time(unix_time: Option<u64>) -> Result<TimeSigned> {
    match unix_time {
        Some(seconds) => TimeSigned::try_from_unix_time(seconds),
        None => TimeSigned::now(),
    }
    .context("failed to determine the current time")
}

fn print_record(record: &TsigRecord) {
    println!(
        "{} {} {} {} {}",
        record.owner(),
        record.ttl(),
        Class::ANY,
        Type::TSIG,
        record
    );
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
