// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Environment and configuration utilities.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Source of the timestamps [`record_telemetry`] writes.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Stamps telemetry with the wall-clock time of the run.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Location of the telemetry opt-in file under `home`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tomd::conf::telemetry_file_in;
/// assert_eq!(
///     telemetry_file_in(Path::new("/home/me")),
///     Path::new("/home/me/.config/2md/local-telemetry-opt-in"),
/// );
/// ```
pub fn telemetry_file_in(home: &Path) -> PathBuf {
    home.join(".config")
        .join("2md")
        .join("local-telemetry-opt-in")
}

/// Location of the telemetry opt-in file, or `None` if `$HOME` is not set.
pub fn telemetry_file() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| telemetry_file_in(Path::new(&home)))
}

/// Appends the current time, in milliseconds since the Unix epoch, to
/// `file` if and only if it already exists.
///
/// Returns true if a timestamp was written.
pub fn record_telemetry(file: &Path, clock: &impl Clock) -> io::Result<bool> {
    if !file.exists() {
        return Ok(false);
    }
    let mut f = OpenOptions::new().append(true).open(file)?;
    writeln!(f, "{}", clock.now().timestamp_millis())?;
    Ok(true)
}

/// Opt-in local telemetry. If `~/.config/2md/local-telemetry-opt-in` exists,
/// the current time is appended to it on every run.
///
/// Nothing ever leaves the machine, and failing to write is not an error.
pub fn save_telemetry_maybe() {
    let Some(file) = telemetry_file() else {
        debug!("$HOME is not set, skipping telemetry");
        return;
    };
    match record_telemetry(&file, &SystemClock) {
        Ok(true) => debug!("recorded a run in {}", file.display()),
        Ok(false) => {}
        Err(err) => warn!("could not write to {}: {err}", file.display()),
    }
}
