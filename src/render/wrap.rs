// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Greedy word wrapping of a single output block.

use crate::render::{BlockOptions, PrefixLines, StackedPrefix};
use regex::Regex;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

static WORD_PIECE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+|\n").expect("invalid word regex"));

/// Removes every newline from the end of `text`.
///
/// # Examples
///
/// ```
/// use tomd::render::wrap::strip_trailing_newlines;
/// assert_eq!(strip_trailing_newlines("foo\n\nbar\n\n"), "foo\n\nbar");
/// ```
pub fn strip_trailing_newlines(text: &str) -> &str {
    text.trim_end_matches('\n')
}

/// Number of columns `text` occupies, counting grapheme clusters.
pub(crate) fn columns(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Splits `text` into byte ranges of words, or of lone newlines, each range
/// starting where the previous one ended so that the whitespace in front of
/// a word belongs to it. Trailing whitespace becomes a final piece.
fn pieces(text: &str) -> Vec<(usize, usize)> {
    let mut pieces = vec![];
    let mut last_end = 0;
    for m in WORD_PIECE.find_iter(text) {
        pieces.push((m.start(), m.end()));
        last_end = m.end();
    }
    if last_end < text.len() {
        pieces.push((last_end, text.len()));
    }
    pieces
}

/// Wraps `text` to `options.max_width` columns, decorating every line with
/// the prefixes in `stack`.
///
/// Trailing newlines are always removed. Unless `options.preserve_newlines`
/// is set, embedded newlines are treated as plain spaces. A word that does
/// not fit on the current line starts a new one; a word wider than the line
/// is never split. A `max_width` of 0 disables wrapping.
///
/// Rendering a prefix consumes its first-line text, so `lines` has to be
/// shared by every block rendered from the same [`BlockRendering`].
///
/// [`BlockRendering`]: crate::render::BlockRendering
pub fn wrap(
    text: &str,
    stack: &[StackedPrefix],
    options: &BlockOptions,
    lines: &mut PrefixLines,
) -> String {
    let mut text = strip_trailing_newlines(text).to_string();
    if !options.preserve_newlines {
        text = text.replace('\n', " ").trim_end().to_string();
    }

    let mut wrapper = Wrapper {
        stack,
        lines,
        result: String::new(),
        col: 0,
        at_start_of_line: true,
    };
    wrapper.render_prefix();

    let mut last_end = 0;
    for (start, end) in pieces(&text) {
        let word = &text[start..end];
        let with_space = &text[last_end..end];
        let width = columns(with_space);

        if word != "\n"
            && !wrapper.at_start_of_line
            && options.max_width > 0
            && wrapper.col + width > options.max_width
        {
            wrapper.new_line();
        }

        // A word starting a line is emitted without its leading whitespace,
        // but that whitespace still counts toward the column.
        if wrapper.at_start_of_line {
            wrapper.result += word;
        } else {
            wrapper.result += with_space;
        }

        if word == "\n" {
            wrapper.col = 0;
            wrapper.at_start_of_line = true;
            wrapper.render_prefix();
        }
        wrapper.col += width;
        wrapper.at_start_of_line = false;
        last_end = end;
    }

    wrapper.result
}

struct Wrapper<'a> {
    stack: &'a [StackedPrefix],
    lines: &'a mut PrefixLines,
    result: String,
    col: usize,
    at_start_of_line: bool,
}

impl Wrapper<'_> {
    fn push(&mut self, s: &str, width: usize) {
        self.result += s;
        self.col += width;
    }

    fn render_prefix(&mut self) {
        let prefix = self.lines.render(self.stack);
        self.push(&prefix, columns(&prefix));
    }

    fn new_line(&mut self) {
        self.result.push('\n');
        self.col = 0;
        self.at_start_of_line = true;
        self.render_prefix();
    }
}
