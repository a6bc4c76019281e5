// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Drives the command-line program.

use crate::{ParseOptions, clipboard, conf, html};
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::Verbosity;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

/// Errors that end the program.
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be converted.
    #[error(transparent)]
    Conversion(#[from] crate::Error),

    /// The clipboard could not be read.
    #[error(transparent)]
    Clipboard(#[from] clipboard::Error),

    /// An input file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub fn die(error_code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(error_code);
}

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(
    about = "Converts formatted text to Markdown. Defaults to reading the clipboard.",
    long_about = None
)]
pub struct Config {
    #[command(flatten)]
    verbosity: Verbosity,

    /// What to print
    #[arg(long, value_enum, default_value_t = OutputFormat::Md)]
    output_format: OutputFormat,

    /// Do not wrap the output in a quote
    #[arg(long, default_value_t = false)]
    no_quote: bool,

    /// Replace links with their text
    #[arg(long, default_value_t = false)]
    no_links: bool,

    /// Render a Markdown FILE to HTML before converting it back
    #[arg(long, default_value_t = false, hide = true)]
    dev_mode_md_to_html_first: bool,

    /// HTML file to convert, or "-" for standard input
    file: Option<PathBuf>,
}

impl Config {
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Where the HTML comes from.
    pub fn input(&self) -> Input {
        match &self.file {
            None => Input::Clipboard,
            Some(path) if path.as_os_str() == "-" => Input::Stdin,
            Some(path) => Input::File(path.clone()),
        }
    }

    /// Conversion options. Unlike the library, the program quotes by default.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .quote(!self.no_quote)
            .links(!self.no_links)
    }
}

/// What the program prints.
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// The input, unchanged
    Raw,

    /// The input as parsed into an HTML document
    Html,

    /// The intermediate representation tree
    Ir,

    /// The rendered output blocks
    Blocks,

    /// Markdown
    #[default]
    Md,
}

/// A source of HTML.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Clipboard,
    Stdin,
    File(PathBuf),
}

/// Runs the command-line program.
#[derive(Debug)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new program runner using the given `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads the configured input.
    pub fn read_input(&self) -> Result<String, Error> {
        let input = match self.config.input() {
            Input::Clipboard => clipboard::read_clipboard()?,
            Input::Stdin => io::read_to_string(io::stdin())?,
            Input::File(path) => read_file(&path, self.config.dev_mode_md_to_html_first)?,
        };
        debug!("read {} bytes of input", input.len());
        Ok(input)
    }

    /// Produces the configured output for `input`.
    pub fn output(&self, input: &str) -> Result<String, Error> {
        let options = self.config.parse_options();
        let output = match self.config.output_format() {
            OutputFormat::Raw => String::from(input),
            OutputFormat::Html => html::outer_html(&html::parse_html(input))?,
            OutputFormat::Ir => format!("{:#}", crate::parse(input, &options)?),
            OutputFormat::Blocks => {
                let tree = crate::parse(input, &options)?;
                format!("{:#?}", crate::render_blocks(&tree)?.output_blocks())
            }
            OutputFormat::Md => crate::to_markdown(input, &options)?,
        };
        Ok(output)
    }

    /// Run the command-line program using its stored configuration options.
    pub fn run(&self) -> Result<String, Error> {
        let input = self.read_input()?;
        conf::save_telemetry_maybe();
        self.output(&input)
    }
}

fn read_file(path: &Path, md_to_html_first: bool) -> Result<String, Error> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if md_to_html_first && path.extension().is_some_and(|ext| ext == "md") {
        debug!("rendering {} to HTML first", path.display());
        return Ok(markdown::to_html(&contents));
    }
    Ok(contents)
}

/// Runs the program, printing its output or dying with its error.
pub fn run(config: Config) {
    env_logger::Builder::new()
        .filter_level(config.verbosity().log_level_filter())
        .init();

    match Runner::new(config).run() {
        Ok(output) if output.ends_with('\n') => print!("{output}"),
        Ok(output) => println!("{output}"),
        Err(err) => die(1, &format!("tomd: {err}")),
    }
}
