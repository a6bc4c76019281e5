// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Block-oriented text rendering.
//!
//! Rendering the IR does not produce text directly. Instead, nodes push and
//! pop [`Prefix`]es onto a [`BlockRendering`] and append text to whichever
//! [`OutputBlock`] is currently open. Every push or pop opens a new block, so
//! block boundaries fall exactly where the nesting changes. Once the whole
//! tree has been rendered, [`BlockRendering::finish()`] wraps each block,
//! joins the blocks with the blank lines Markdown needs between them, and
//! appends the link references collected along the way.

pub mod wrap;

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while rendering.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A pop did not match the most recent push. This means a node's
    /// render method is unbalanced.
    #[error("pop of {expected:?} does not match what was pushed ({found:?})")]
    PrefixMismatch {
        expected: Prefix,
        found: Option<Prefix>,
    },
}

/// A string prepended to each line of an output block, e.g. `"> "`.
///
/// The first line often differs from the following ones: a bulleted list
/// item starts with `"  - "` and is merely indented afterwards. Which of the
/// two a line gets is tracked by the renderer per push, not by the prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    first: String,
    subsequent: String,
}

impl Prefix {
    /// Creates a prefix that is the same on every line.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            first: prefix.clone(),
            subsequent: prefix,
        }
    }

    /// Creates a prefix whose first line differs from the rest.
    pub fn with_subsequent(first: impl Into<String>, subsequent: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            subsequent: subsequent.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn subsequent(&self) -> &str {
        &self.subsequent
    }
}

/// A prefix as it sits on the prefix stack, tagged with the push it came
/// from.
#[derive(Clone, Debug)]
pub struct StackedPrefix {
    prefix: Prefix,
    slot: usize,
}

impl StackedPrefix {
    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }
}

/// Number of lines rendered so far under each push of a prefix.
///
/// A pushed prefix renders its first-line text exactly once, the first
/// time any block under it emits a line, and its subsequent text ever
/// after.
#[derive(Debug)]
pub struct PrefixLines(Vec<usize>);

impl PrefixLines {
    fn new(pushes: usize) -> Self {
        Self(vec![0; pushes])
    }

    /// Renders the combined prefix of `stack` for the next line.
    pub fn render(&mut self, stack: &[StackedPrefix]) -> String {
        let mut rendered = String::new();
        for StackedPrefix { prefix, slot } in stack {
            let lines = &mut self.0[*slot];
            rendered += if *lines == 0 {
                prefix.first()
            } else {
                prefix.subsequent()
            };
            *lines += 1;
        }
        rendered
    }
}

/// How an output block is wrapped and joined to its neighbours.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockOptions {
    /// Column to wrap at, or 0 to never wrap.
    pub max_width: usize,

    /// Keep embedded newlines instead of reflowing them.
    pub preserve_newlines: bool,

    /// Link references may be rendered inside this block's prefix.
    pub accepts_trailers: bool,

    /// The block ends with a Markdown hard line break.
    pub ends_with_hard_break: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            max_width: 80,
            preserve_newlines: false,
            accepts_trailers: false,
            ends_with_hard_break: false,
        }
    }
}

impl BlockOptions {
    pub fn max_width(mut self, max_width: usize) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn preserve_newlines(mut self, preserve_newlines: bool) -> Self {
        self.preserve_newlines = preserve_newlines;
        self
    }

    pub fn accepts_trailers(mut self, accepts_trailers: bool) -> Self {
        self.accepts_trailers = accepts_trailers;
        self
    }
}

/// A paragraph-like group of lines sharing one prefix stack.
#[derive(Debug)]
pub struct OutputBlock {
    prefix_stack: Vec<StackedPrefix>,
    options: BlockOptions,
    contents: Option<String>,
}

impl OutputBlock {
    fn new(prefix_stack: Vec<StackedPrefix>, options: BlockOptions) -> Self {
        Self {
            prefix_stack,
            options,
            contents: None,
        }
    }

    fn append(&mut self, text: &str) {
        self.contents.get_or_insert_with(String::new).push_str(text);
    }

    /// The raw text appended to the block, or `None` if nothing ever was.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn options(&self) -> &BlockOptions {
        &self.options
    }

    pub fn prefix_stack(&self) -> &[StackedPrefix] {
        &self.prefix_stack
    }

    /// True if the innermost prefix is a Markdown heading marker.
    pub fn is_heading(&self) -> bool {
        self.prefix_stack
            .last()
            .is_some_and(|p| p.prefix.first.trim_end().ends_with('#'))
    }

    fn render(&self, lines: &mut PrefixLines) -> String {
        match &self.contents {
            None => String::new(),
            Some(contents) => wrap::wrap(contents, &self.prefix_stack, &self.options, lines),
        }
    }
}

/// Joins a sequence of blocks into text.
#[derive(Debug)]
pub struct TextRendering<'a> {
    blocks: &'a [OutputBlock],
    lines: PrefixLines,
}

impl<'a> TextRendering<'a> {
    /// Prepares to render `blocks`, which were produced by `pushes` prefix
    /// pushes.
    pub fn new(blocks: &'a [OutputBlock], pushes: usize) -> Self {
        Self {
            blocks,
            lines: PrefixLines::new(pushes),
        }
    }

    /// Renders every block, separating consecutive non-empty blocks with a
    /// blank (prefix-only) line unless both are headings or the first one
    /// ends with a hard break.
    pub fn to_text(&mut self) -> String {
        let mut text = String::new();
        let mut last_non_empty: Option<&OutputBlock> = None;

        for block in self.blocks {
            let rendered = block.render(&mut self.lines);
            if rendered.is_empty() {
                continue;
            }

            if let Some(last) = last_non_empty {
                let between_headings = block.is_heading() && last.is_heading();
                if !text.is_empty() && !between_headings && !last.options.ends_with_hard_break {
                    text += self.lines.render(&last.prefix_stack).trim();
                    text.push('\n');
                }
            }

            text += &rendered;
            if block.options.ends_with_hard_break {
                text += "  ";
            }
            text.push('\n');
            last_non_empty = Some(block);
        }

        text
    }

    /// Renders the prefix `block` would put in front of its next line.
    pub fn render_prefix(&mut self, block: &OutputBlock) -> String {
        self.lines.render(&block.prefix_stack)
    }
}

/// The state of one rendering of an IR tree into Markdown.
#[derive(Debug)]
pub struct BlockRendering {
    prefix_stack: Vec<StackedPrefix>,
    output_blocks: Vec<OutputBlock>,
    pushes: usize,
    link_counter: usize,
    seen_links: HashMap<String, usize>,
    trailers: Vec<String>,
}

impl Default for BlockRendering {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRendering {
    pub fn new() -> Self {
        Self {
            prefix_stack: vec![],
            output_blocks: vec![],
            pushes: 0,
            link_counter: 1,
            seen_links: HashMap::new(),
            trailers: vec![],
        }
    }

    /// The blocks rendered so far.
    pub fn output_blocks(&self) -> &[OutputBlock] {
        &self.output_blocks
    }

    /// Appends text to the currently open block, opening one first if
    /// there is none.
    pub fn append(&mut self, text: &str) {
        if self.output_blocks.is_empty() {
            self.push_prefix(Prefix::new(""), BlockOptions::default());
        }
        if let Some(block) = self.output_blocks.last_mut() {
            block.append(text);
        }
    }

    /// Pushes `prefix` and opens a new block under it.
    pub fn push_prefix(&mut self, prefix: Prefix, options: BlockOptions) {
        self.prefix_stack.push(StackedPrefix {
            prefix,
            slot: self.pushes,
        });
        self.pushes += 1;
        self.output_blocks
            .push(OutputBlock::new(self.prefix_stack.clone(), options));
    }

    /// Pops `prefix`, which must be the most recently pushed prefix, and
    /// opens a new block at the outer level.
    pub fn pop_prefix(&mut self, prefix: &Prefix) -> Result<(), Error> {
        match self.prefix_stack.pop() {
            Some(popped) if popped.prefix == *prefix => {
                self.output_blocks.push(OutputBlock::new(
                    self.prefix_stack.clone(),
                    BlockOptions::default(),
                ));
                Ok(())
            }
            popped => Err(Error::PrefixMismatch {
                expected: prefix.clone(),
                found: popped.map(|p| p.prefix),
            }),
        }
    }

    /// Marks the most recently opened block as ending in a hard line break.
    pub fn mark_hard_break(&mut self) {
        if let Some(block) = self.output_blocks.last_mut() {
            block.options.ends_with_hard_break = true;
        }
    }

    /// Queues a line to be written after the body of the document.
    pub fn add_trailer(&mut self, line: impl Into<String>) {
        self.trailers.push(line.into());
    }

    /// Returns the reference number for `href`, assigning the next one and
    /// queueing its `[n]: href` line the first time `href` is seen.
    pub fn get_link_id(&mut self, href: &str) -> usize {
        if let Some(id) = self.seen_links.get(href) {
            return *id;
        }
        let id = self.link_counter;
        self.link_counter += 1;
        self.seen_links.insert(String::from(href), id);
        self.add_trailer(format!("[{id}]: {href}"));
        id
    }

    /// Renders all blocks to text and appends the link references.
    ///
    /// The references go inside the prefix of the last block that accepts
    /// trailers, if any, separated from the body by one blank line.
    pub fn finish(self) -> String {
        let mut rendering = TextRendering::new(&self.output_blocks, self.pushes);
        let mut text = rendering.to_text();

        let prefix = self
            .output_blocks
            .iter()
            .rev()
            .find(|block| block.options.accepts_trailers)
            .map(|block| rendering.render_prefix(block))
            .unwrap_or_default();

        if !self.trailers.is_empty() {
            let blank = prefix.trim_end();
            let separator = format!("\n{blank}\n");
            while !text.ends_with(&separator) {
                text += blank;
                text.push('\n');
            }
            for trailer in &self.trailers {
                text += &prefix;
                text += trailer;
                text.push('\n');
            }
        }

        text
    }
}
