// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Converts parsed HTML into the intermediate representation.

use crate::html::{HtmlNode, HtmlNodeKind};
use crate::ir::{self, HeadingLevel, NodeId, NodeKind, NodeName, Tree};
use crate::transform::{self, TransformOptions};
use log::trace;
use regex::Regex;
use std::sync::LazyLock;

static HEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^H[1-6]$").expect("invalid heading regex"));

/// Options controlling how HTML is turned into Markdown.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseOptions {
    /// Wrap the entire output in a block quote.
    pub quote: bool,

    /// Keep hyperlinks. When false, links are replaced by their text.
    pub links: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            quote: false,
            links: true,
        }
    }
}

impl ParseOptions {
    /// Sets the "quote" option to true or false.
    pub fn quote(mut self, quote: bool) -> Self {
        self.quote = quote;
        self
    }

    /// Sets the "links" option to true or false.
    pub fn links(mut self, links: bool) -> Self {
        self.links = links;
        self
    }
}

/// Extracts the level from a heading tag name such as `H2`.
///
/// # Examples
///
/// ```
/// use tomd::convert::extract_heading_level;
/// assert_eq!(extract_heading_level("H2").unwrap().get(), 2);
/// assert!(extract_heading_level("HR").is_err());
/// ```
pub fn extract_heading_level(tag: &str) -> Result<HeadingLevel, ir::Error> {
    let not_a_heading = || ir::Error::NotAHeading(String::from(tag));
    if !HEADING_TAG.is_match(tag) {
        return Err(not_a_heading());
    }
    tag[1..]
        .parse::<u8>()
        .map_err(|_| not_a_heading())
        .and_then(HeadingLevel::try_from)
}

/// Builds an IR tree from the children of `document`.
///
/// Tree transforms are applied unless `skip_tree_transforms` is set, which
/// is only useful for looking at the raw conversion.
pub fn parse_to_ir<N: HtmlNode>(
    document: &N,
    options: &ParseOptions,
    skip_tree_transforms: bool,
) -> Result<Tree, ir::Error> {
    let mut tree = Tree::new();
    let mut parse_root = tree.root();

    if options.quote {
        let blockquote = tree.add(NodeKind::Blockquote {
            accepts_trailers: true,
        });
        tree.push(parse_root, blockquote)?;
        parse_root = blockquote;
    }

    for child in document.child_nodes() {
        convert(&mut tree, parse_root, &child)?;
    }

    if !skip_tree_transforms {
        let transform_options = TransformOptions {
            remove_links: !options.links,
        };
        transform::apply_tree_transforms(&mut tree, &transform_options)?;
    }

    Ok(tree)
}

fn convert<N: HtmlNode>(tree: &mut Tree, ir_node: NodeId, html_node: &N) -> Result<(), ir::Error> {
    match html_node.kind() {
        HtmlNodeKind::Text(text) => {
            // Lone newlines are formatting between elements, except in <pre>.
            if text != "\n" || tree.is_or_has_parent_named(ir_node, NodeName::Preformatted) {
                tree.push(ir_node, text)?;
            }
        }
        HtmlNodeKind::Element(tag) => {
            let tag = tag.to_ascii_uppercase();
            let receiver = match element_kind(&tag, html_node)? {
                Some(kind) => {
                    let receiver = tree.add(kind);
                    tree.push(ir_node, receiver)?;
                    receiver
                }
                None => {
                    trace!("passing through children of <{tag}>");
                    ir_node
                }
            };
            for child in html_node.child_nodes() {
                convert(tree, receiver, &child)?;
            }
        }
        HtmlNodeKind::Other => trace!("ignoring non-element node"),
    }
    Ok(())
}

fn element_kind<N: HtmlNode>(tag: &str, element: &N) -> Result<Option<NodeKind>, ir::Error> {
    let kind = match tag {
        "H1" | "H2" | "H3" | "H4" | "H5" | "H6" => NodeKind::Heading(extract_heading_level(tag)?),
        "B" | "STRONG" => NodeKind::Bold,
        "I" | "EM" => NodeKind::Italic,
        "OL" => NodeKind::OrderedList,
        "LI" => NodeKind::ListItem,
        "A" => match element.attribute("href") {
            Some(href) if !href.is_empty() => NodeKind::A { href },
            _ => return Ok(None),
        },
        "PRE" => NodeKind::Preformatted,
        // Markdown has nothing for definition lists, but separate lines
        // beat text jammed into one paragraph.
        "P" | "DL" | "DT" => NodeKind::Paragraph,
        "BLOCKQUOTE" => NodeKind::Blockquote {
            accepts_trailers: false,
        },
        "TT" | "CODE" => NodeKind::Code,
        "BR" => NodeKind::Br,
        _ => return Ok(None),
    };
    Ok(Some(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::test_utils::do_logging;
    use pretty_assertions::assert_eq;
    use seq_macro::seq;

    fn raw_ir(html: &str) -> String {
        do_logging();
        let dom = parse_html(html);
        parse_to_ir(&dom.document, &ParseOptions::default(), true)
            .unwrap()
            .to_string()
    }

    seq!(N in 1..=6 {
        #[test]
        fn it_converts_h~N() {
            let html = format!("<h{}>Title</h{}>", N, N);
            let expected = format!(r#"Document[Heading({})["Title"]]"#, N);
            assert_eq!(raw_ir(&html), expected);
        }
    });

    #[test]
    fn it_rejects_non_heading_tags() {
        for tag in ["H0", "H7", "HR", "H", "H12", "h1"] {
            assert_eq!(
                extract_heading_level(tag),
                Err(ir::Error::NotAHeading(String::from(tag))),
                "{tag}"
            );
        }
    }

    #[test]
    fn it_maps_inline_elements() {
        assert_eq!(
            raw_ir("<b>b</b><strong>s</strong><i>i</i><em>e</em><tt>t</tt><code>c</code>"),
            r#"Document[Bold["b"], Bold["s"], Italic["i"], Italic["e"], Code["t"], Code["c"]]"#
        );
    }

    #[test]
    fn it_maps_block_elements() {
        assert_eq!(
            raw_ir("<p>p</p><dl><dt>term</dt></dl><blockquote>q</blockquote><pre>x</pre>"),
            r#"Document[Paragraph["p"], Paragraph[Paragraph["term"]], Blockquote["q"], Preformatted["x"]]"#
        );
    }

    #[test]
    fn it_keeps_ordered_lists_and_brs_for_the_transforms() {
        assert_eq!(
            raw_ir("<ol><li>one</li></ol>a<br>b"),
            r#"Document[OrderedList[ListItem["one"]], "a", Br, "b"]"#
        );
    }

    #[test]
    fn it_passes_through_unknown_elements() {
        assert_eq!(
            raw_ir("<div><span>foo</span> <b>bar</b></div>"),
            r#"Document["foo", " ", Bold["bar"]]"#
        );
    }

    #[test]
    fn it_only_links_anchors_with_an_href() {
        assert_eq!(
            raw_ir("<a href='x'>a</a><a href=''>b</a><a name='c'>c</a>"),
            r#"Document[A("x")["a"], "b", "c"]"#
        );
    }

    #[test]
    fn it_drops_lone_newlines_outside_pre() {
        assert_eq!(
            raw_ir("<p>a</p>\n<p>b</p>"),
            r#"Document[Paragraph["a"], Paragraph["b"]]"#
        );
    }

    #[test]
    fn it_keeps_lone_newlines_inside_pre() {
        assert_eq!(
            raw_ir("<pre><b>a</b>\n<b>b</b></pre>"),
            r#"Document[Preformatted[Bold["a"], "\n", Bold["b"]]]"#
        );
    }

    #[test]
    fn it_wraps_everything_in_a_quote() {
        let dom = parse_html("foo");
        let options = ParseOptions::default().quote(true);
        let tree = parse_to_ir(&dom.document, &options, true).unwrap();
        assert_eq!(tree.to_string(), r#"Document[Blockquote(trailers)["foo"]]"#);
    }

    #[test]
    fn it_applies_the_transforms_by_default() {
        let dom = parse_html("<pre><code>foo</code></pre>");
        let tree = parse_to_ir(&dom.document, &ParseOptions::default(), false).unwrap();
        assert_eq!(tree.to_string(), r#"Document[Preformatted["foo"]]"#);
    }
}
