// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reading HTML from the system clipboard.
//!
//! There is no portable way to do this, so each platform's own clipboard
//! program is tried in turn: `osascript` on macOS, `xclip` on X11, and
//! PowerShell on Windows. A program that is not installed is skipped; any
//! other failure is reported.

use itertools::Itertools;
use log::{debug, trace, warn};
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::LazyLock;
use thiserror::Error;

static OSASCRIPT_HTML: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^«data HTML((?:[0-9A-F]{2})+)»$").expect("invalid osascript regex")
});

static CF_HTML_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Version:0\.9\r\nStartHTML:([0-9]+)").expect("invalid CF_HTML regex")
});

/// Errors that occur while reading the clipboard.
#[derive(Debug, Error)]
pub enum Error {
    /// A clipboard program could not be run or its output could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A clipboard program ran but reported an error.
    #[error("{program} printed an error: {stderr}")]
    CommandFailed {
        program: &'static str,
        stderr: String,
    },

    /// The clipboard holds something, but not formatted text.
    #[error("the clipboard does not contain any formatted text")]
    NoHtml,

    /// A clipboard program's output was not in the expected format.
    #[error("could not parse {program} output: {reason}")]
    Malformed {
        program: &'static str,
        reason: String,
    },

    /// None of the supported clipboard programs is installed.
    #[error("unable to find a clipboard-reading program, please try file input instead")]
    NoClipboardProgram,
}

type Result<T> = std::result::Result<T, Error>;

/// Reads the clipboard as HTML.
pub fn read_clipboard() -> Result<String> {
    let strategies: [(&str, fn() -> Result<String>); 3] = [
        ("macOS", read_clipboard_mac),
        ("X11", read_clipboard_x11),
        ("Windows", read_clipboard_windows),
    ];

    for (platform, read) in strategies {
        debug!("trying to read the {platform} clipboard");
        match read() {
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                trace!("no {platform} clipboard program: {err}");
            }
            result => return result,
        }
    }
    Err(Error::NoClipboardProgram)
}

fn run(program: &str, args: &[&str]) -> Result<Output> {
    trace!("running {program} {args:?}");
    Ok(Command::new(program).args(args).output()?)
}

fn read_clipboard_mac() -> Result<String> {
    let output = run("osascript", &["-e", "the clipboard as «class HTML»"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        // errAECoercionFail: the clipboard can't be coerced to HTML.
        if output.status.code() == Some(1) && stderr.contains("(-1700)") {
            return Err(Error::NoHtml);
        }
        return Err(Error::CommandFailed {
            program: "osascript",
            stderr: stderr.into_owned(),
        });
    }
    parse_osascript_output(&String::from_utf8_lossy(&output.stdout))
}

/// Decodes the `«data HTML…»` literal AppleScript prints for HTML data.
///
/// # Examples
///
/// ```
/// use tomd::clipboard::parse_osascript_output;
/// let html = parse_osascript_output("«data HTML3C623E68693C2F623E»\n").unwrap();
/// assert_eq!(html, "<b>hi</b>");
/// ```
pub fn parse_osascript_output(output: &str) -> Result<String> {
    let hex = OSASCRIPT_HTML
        .captures(output)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::Malformed {
            program: "osascript",
            reason: String::from("no «data HTML» literal"),
        })?
        .as_str();

    let bytes: Vec<u8> = hex
        .chars()
        .tuples()
        .map(|(hi, lo)| {
            // The regex only admits pairs of uppercase hex digits.
            let digit = |c: char| c.to_digit(16).unwrap_or_default() as u8;
            (digit(hi) << 4) | digit(lo)
        })
        .collect();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_clipboard_x11() -> Result<String> {
    let output = run("xclip", &["-o", "-selection", "clipboard", "-t", "text/html"])?;
    if !output.stderr.is_empty() || !output.status.success() {
        return Err(Error::CommandFailed {
            program: "xclip",
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// Printing to the console mangles the encoding even further, so the
// clipboard goes through a temporary file instead.
const POWERSHELL_SCRIPT: &str = "
    $tmp = New-TemporaryFile
    Get-Clipboard -TextFormatType Html > $tmp
    $tmp.ToString()
";

fn read_clipboard_windows() -> Result<String> {
    let output = run("powershell.exe", &["-c", POWERSHELL_SCRIPT])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let tmp = Path::new(stdout.trim());

    if !output.stderr.is_empty() {
        if tmp.exists() {
            remove_temp_file(tmp);
        }
        return Err(Error::CommandFailed {
            program: "powershell",
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let contents = fs::read(tmp);
    remove_temp_file(tmp);
    let cf_html = un_mojibake(&contents?)?;
    Ok(String::from(cf_html_fragment(&cf_html)?))
}

fn remove_temp_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!("could not remove {}: {err}", path.display());
    }
}

/// Returns the HTML of a Windows `CF_HTML` clipboard payload, skipping its
/// header.
///
/// # Examples
///
/// ```
/// use tomd::clipboard::cf_html_fragment;
/// let cf_html = "Version:0.9\r\nStartHTML:27\r\n<b>hi</b>";
/// assert_eq!(cf_html_fragment(cf_html).unwrap(), "<b>hi</b>");
/// ```
pub fn cf_html_fragment(cf_html: &str) -> Result<&str> {
    let malformed = |reason: &str| Error::Malformed {
        program: "Get-Clipboard",
        reason: String::from(reason),
    };

    let start: usize = CF_HTML_HEADER
        .captures(cf_html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| malformed("not CF_HTML output"))?;

    cf_html
        .get(start..)
        .ok_or_else(|| malformed("StartHTML is out of range"))
}

/// The cp1252 byte that decodes to `c`, for the code points above U+00FF.
fn cp1252_inverse(c: u16) -> Option<u8> {
    let byte = match c {
        0x20ac => 0x80,
        0x201a => 0x82,
        0x0192 => 0x83,
        0x201e => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02c6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8a,
        0x2039 => 0x8b,
        0x0152 => 0x8c,
        0x017d => 0x8e,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201c => 0x93,
        0x201d => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02dc => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9a,
        0x203a => 0x9b,
        0x0153 => 0x9c,
        0x017e => 0x9e,
        0x0178 => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Turns what `Get-Clipboard` writes to a file back into a UTF-8 string.
///
/// The clipboard's UTF-8 bytes get read as cp1252 and then written out as
/// UTF-16LE with a byte order mark, so each UTF-16 unit stands for a single
/// original byte.
pub fn un_mojibake(bytes: &[u8]) -> Result<String> {
    let malformed = |reason: String| Error::Malformed {
        program: "Get-Clipboard",
        reason,
    };

    let Some(units) = bytes.strip_prefix(&[0xff, 0xfe]) else {
        return Err(malformed(String::from("no BOM in clipboard output")));
    };

    let decoded = units
        .chunks(2)
        .map(|pair| match pair {
            [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(malformed(String::from("odd number of bytes"))),
        })
        .enumerate()
        .map(|(i, unit)| {
            let unit = unit?;
            match u8::try_from(unit) {
                Ok(byte) => Ok(byte),
                Err(_) => cp1252_inverse(unit).ok_or_else(|| {
                    malformed(format!("unknown cp1252 code point at {i}: {unit:#x}"))
                }),
            }
        })
        .collect::<Result<Vec<u8>>>()?;

    Ok(String::from_utf8_lossy(&decoded).into_owned())
}
