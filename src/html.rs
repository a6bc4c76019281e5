// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Parsed HTML documents.
//!
//! The converter only needs to know a few things about each HTML node, so
//! it works against the [`HtmlNode`] trait. The implementation used by the
//! command-line tool is backed by [html5ever]'s reference DOM.
//!
//! [html5ever]: https://crates.io/crates/html5ever

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::io;

/// What kind of node an [`HtmlNode`] is.
#[derive(Clone, Debug, PartialEq)]
pub enum HtmlNodeKind {
    /// A run of text and its contents.
    Text(String),

    /// An element and its tag name.
    Element(String),

    /// Anything else: comments, doctypes, the document itself.
    Other,
}

/// A node in a parsed HTML tree.
pub trait HtmlNode: Sized {
    /// The kind of node, with its text or tag name.
    fn kind(&self) -> HtmlNodeKind;

    /// The value of the element's `name` attribute, if it has one.
    fn attribute(&self, name: &str) -> Option<String>;

    /// The node's children, in document order.
    fn child_nodes(&self) -> Vec<Self>;
}

impl HtmlNode for Handle {
    fn kind(&self) -> HtmlNodeKind {
        match &self.data {
            NodeData::Text { contents } => HtmlNodeKind::Text(contents.borrow().to_string()),
            NodeData::Element { name, .. } => HtmlNodeKind::Element(name.local.to_string()),
            _ => HtmlNodeKind::Other,
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| attr.name.local.as_ref() == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children.borrow().clone()
    }
}

/// Parses an HTML document or fragment.
///
/// Parsing never fails: malformed markup is repaired the way a browser
/// would repair it.
pub fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Serializes the document's first element (normally `<html>`), including
/// the element itself.
pub fn outer_html(dom: &RcDom) -> io::Result<String> {
    let first = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|node| matches!(node.data, NodeData::Element { .. }))
        .cloned();
    let Some(first) = first else {
        return Ok(String::new());
    };

    let mut bytes = vec![];
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(first), opts)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(dom: &RcDom) -> Handle {
        let html = dom.document.child_nodes().remove(0);
        html.child_nodes()
            .into_iter()
            .find(|n| n.kind() == HtmlNodeKind::Element(String::from("body")))
            .expect("no body")
    }

    #[test]
    fn it_wraps_fragments_in_a_document() {
        let dom = parse_html("foo");
        let children = body(&dom).child_nodes();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), HtmlNodeKind::Text(String::from("foo")));
    }

    #[test]
    fn it_reads_attributes() {
        let dom = parse_html("<a href='https://example.org' name=x>link</a>");
        let a = body(&dom).child_nodes().remove(0);
        assert_eq!(a.kind(), HtmlNodeKind::Element(String::from("a")));
        assert_eq!(a.attribute("href").as_deref(), Some("https://example.org"));
        assert_eq!(a.attribute("title"), None);
    }

    #[test]
    fn it_decodes_entities() {
        let dom = parse_html("&lt;this &amp; that&gt;");
        let text = body(&dom).child_nodes().remove(0);
        assert_eq!(text.kind(), HtmlNodeKind::Text(String::from("<this & that>")));
    }

    #[test]
    fn it_serializes_the_document_element() {
        let dom = parse_html("<b>foo</b>");
        assert_eq!(
            outer_html(&dom).unwrap(),
            "<html><head></head><body><b>foo</b></body></html>"
        );
    }
}
