// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! tomd converts formatted text into Markdown. Copy some text from a web
//! page or a word processor, run `tomd`, and it prints the clipboard's HTML
//! as tidy, 80-column Markdown.
//!
//! # Examples
//!
//! Convert the clipboard, quoted (the default):
//!
//! ```bash
//! tomd
//! ```
//!
//! Convert an HTML file without quoting it:
//!
//! ```bash
//! tomd --no-quote page.html
//! ```
//!
//! Look at the intermediate representation instead of the Markdown:
//!
//! ```bash
//! tomd --output-format ir page.html
//! ```
//!
//! # How it works
//!
//! Conversion is a small compiler pipeline:
//!
//! 1. HTML is parsed into a DOM by [html5ever](html::parse_html()).
//! 2. The DOM is [converted](convert::parse_to_ir()) into an intermediate
//!    [tree](ir::Tree) of Markdown-ish nodes.
//! 3. [Tree transforms](transform) normalize that tree in place.
//! 4. The tree is rendered into [blocks](render::BlockRendering), which are
//!    wrapped, joined and followed by link references.
//!
//! ```
//! use tomd::{ParseOptions, to_markdown};
//! let md = to_markdown("foo <b>bar</b>", &ParseOptions::default()).unwrap();
//! assert_eq!(md, "foo **bar**\n");
//! ```
//!
//! # License
//!
//! tomd is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0

pub mod cli;
pub mod clipboard;
pub mod conf;
pub mod convert;
pub mod html;
pub mod ir;
pub mod render;
pub mod transform;

#[cfg(test)]
mod test_utils;

pub use convert::ParseOptions;

use html::HtmlNode;
use ir::Tree;
use render::BlockRendering;
use thiserror::Error;

/// A fatal error in the conversion pipeline.
///
/// None of these are caused by bad input; they all point to a bug.
#[derive(Debug, Error)]
pub enum Error {
    /// The IR tree was misused.
    #[error("IR error: {0}")]
    Ir(#[from] ir::Error),

    /// Rendering went out of balance.
    #[error("Render error: {0}")]
    Render(#[from] render::Error),
}

/// Converts an HTML document or fragment into Markdown.
pub fn to_markdown(html: &str, options: &ParseOptions) -> Result<String, Error> {
    let dom = html::parse_html(html);
    dom_to_markdown(&dom.document, options)
}

/// Converts an already-parsed HTML document into Markdown.
pub fn dom_to_markdown<N: HtmlNode>(document: &N, options: &ParseOptions) -> Result<String, Error> {
    let tree = convert::parse_to_ir(document, options, false)?;
    Ok(render_blocks(&tree)?.finish())
}

/// Parses HTML into a transformed IR tree without rendering it.
pub fn parse(html: &str, options: &ParseOptions) -> Result<Tree, Error> {
    let dom = html::parse_html(html);
    Ok(convert::parse_to_ir(&dom.document, options, false)?)
}

/// Renders a tree into output blocks without joining them into text.
///
/// Call [`BlockRendering::finish()`] on the result to get the Markdown.
pub fn render_blocks(tree: &Tree) -> Result<BlockRendering, Error> {
    let mut rendering = BlockRendering::new();
    tree.render(tree.root(), &mut rendering)?;
    Ok(rendering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BlockOptions, Prefix};
    use pretty_assertions::assert_eq;

    fn to_md(html: &str) -> String {
        to_markdown(html, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn it_handles_text_with_no_markup_at_all() {
        assert_eq!(to_md("foo"), "foo\n");
    }

    #[test]
    fn it_handles_tt_elements() {
        assert_eq!(to_md("<tt>foo</tt>"), "`foo`\n");
    }

    #[test]
    fn it_ignores_links_with_empty_hrefs() {
        assert_eq!(to_md("foo <a href=''>bar</a>"), "foo bar\n");
        assert_eq!(to_md("foo <a name='blah'>bar</a>"), "foo bar\n");
    }

    #[test]
    fn it_ignores_links_with_no_content() {
        assert_eq!(to_md("foo<a href=example.org></a>"), "foo\n");
    }

    #[test]
    fn it_wraps_normal_text() {
        assert_eq!(to_md("foo\nbar\nbaz\n"), "foo bar baz\n");
    }

    #[test]
    fn it_does_not_crash_on_a_br_by_itself() {
        assert_eq!(to_md("<br>"), "");
    }

    #[test]
    fn it_turns_two_brs_into_a_blank_line() {
        assert_eq!(to_md("foo<br><br>bar<br><br>baz"), "foo\n\nbar\n\nbaz\n");
    }

    #[test]
    fn it_turns_pre_code_into_just_a_preformatted_node() {
        let tree = parse("<pre><code>foo</code></pre>", &ParseOptions::default()).unwrap();
        assert_eq!(tree.to_string(), r#"Document[Preformatted["foo"]]"#);
        assert_eq!(to_md("<pre><code>foo</code></pre>"), "    foo\n");
    }

    #[test]
    fn it_wraps_the_output_in_a_quote() {
        let options = ParseOptions::default().quote(true);
        assert_eq!(to_markdown("foo", &options).unwrap(), "> foo\n");
    }

    #[test]
    fn it_includes_trailers_within_the_quote() {
        let options = ParseOptions::default().quote(true);
        assert_eq!(
            to_markdown("<a href=#top>Top</a>", &options).unwrap(),
            "> [Top][1]\n>\n> [1]: #top\n"
        );
    }

    #[test]
    fn it_shares_one_reference_between_identical_links() {
        let md = to_md("<a href=X>one</a> and <a href=X>two</a>");
        assert_eq!(md, "[one][1] and [two][1]\n\n[1]: X\n");
    }

    #[test]
    fn it_strips_links_when_asked() {
        let options = ParseOptions::default().links(false);
        let md = to_markdown("see <a href=https://example.org>this</a>", &options).unwrap();
        assert_eq!(md, "see this\n");
    }

    #[test]
    fn it_exposes_the_blocks() {
        let tree = parse("<p>foo</p><pre>x</pre>", &ParseOptions::default()).unwrap();
        let rendering = render_blocks(&tree).unwrap();
        let blocks = rendering.output_blocks();

        let contents: Vec<_> = blocks.iter().map(|b| b.contents()).collect();
        assert_eq!(contents, vec![Some("foo"), None, Some("x"), None]);

        let prefixes: Vec<Vec<&Prefix>> = blocks
            .iter()
            .map(|b| b.prefix_stack().iter().map(|p| p.prefix()).collect())
            .collect();
        assert_eq!(
            prefixes,
            vec![
                vec![&Prefix::new("")],
                vec![],
                vec![&Prefix::new("    ")],
                vec![],
            ]
        );

        let preformatted = BlockOptions::default()
            .max_width(0)
            .preserve_newlines(true);
        assert_eq!(blocks[0].options(), &BlockOptions::default());
        assert_eq!(blocks[2].options(), &preformatted);
        assert_eq!(rendering.finish(), "foo\n\n    x\n");
    }
}
