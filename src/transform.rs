// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Structural rewrites applied to a freshly converted IR tree.
//!
//! Each pass visits every node of the tree in pre-order and may rewrite that
//! node's child list. Passes run one after the other over the whole tree,
//! so each sees the result of the ones before it.

use crate::ir::{Child, Error, NodeId, NodeKind, NodeName, Tree};
use log::{debug, trace};

/// Options for [`apply_tree_transforms()`].
#[derive(Clone, Debug, Default)]
pub struct TransformOptions {
    /// Replace every link with its contents.
    pub remove_links: bool,
}

type Pass = fn(&mut Tree, NodeId) -> Result<(), Error>;

/// Runs every pass, in order, over the tree.
///
/// Afterwards the tree contains no [`NodeKind::OrderedList`] or
/// [`NodeKind::Br`] nodes and is ready to be rendered.
pub fn apply_tree_transforms(tree: &mut Tree, options: &TransformOptions) -> Result<(), Error> {
    let passes: [(&str, Pass, bool); 8] = [
        ("concatenate_strings", concatenate_strings, true),
        ("replace_em_dashes", replace_em_dashes, true),
        ("remove_empty_links", remove_empty_links, true),
        ("remove_links", remove_links, options.remove_links),
        ("collapse_code_inside_pre", collapse_code_inside_pre, true),
        ("number_lists", number_lists, true),
        ("two_brs_make_one_separator", two_brs_make_one_separator, true),
        // Earlier passes can leave text runs next to each other again.
        ("concatenate_strings", concatenate_strings, true),
    ];

    let root = tree.root();
    for (name, pass, enabled) in passes {
        if enabled {
            debug!("applying tree transform {name}");
            visit_pre(tree, root, pass)?;
        }
    }
    Ok(())
}

/// Runs `pass` on `id`, then on each of the children `id` has afterwards.
fn visit_pre(tree: &mut Tree, id: NodeId, pass: Pass) -> Result<(), Error> {
    pass(tree, id)?;
    let children: Vec<NodeId> = tree.children(id).iter().filter_map(Child::node).collect();
    for child in children {
        visit_pre(tree, child, pass)?;
    }
    Ok(())
}

fn is_named(tree: &Tree, id: NodeId, i: usize, name: NodeName) -> bool {
    tree.is_named(tree.child(id, i), name)
}

/// Merges runs of consecutive text children into one.
pub fn concatenate_strings(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    let mut i = 0;
    while i + 1 < tree.child_count(id) {
        match (tree.child(id, i), tree.child(id, i + 1)) {
            (Child::Text(first), Child::Text(second)) => {
                let merged = format!("{first}{second}");
                tree.set_child(id, i, merged)?;
                tree.remove_child(id, i + 1);
            }
            _ => i += 1,
        }
    }
    Ok(())
}

/// Replaces em-dashes, which are hard to tell apart from hyphens in
/// fixed-width fonts, with `--`.
pub fn replace_em_dashes(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    for i in 0..tree.child_count(id) {
        if let Child::Text(text) = tree.child(id, i) {
            if text.contains('\u{2014}') {
                let replaced = text.replace('\u{2014}', "--");
                tree.set_child(id, i, replaced)?;
            }
        }
    }
    Ok(())
}

/// Removes links with no content, such as `<a name=...></a>` anchors.
pub fn remove_empty_links(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    let mut i = 0;
    while i < tree.child_count(id) {
        match *tree.child(id, i) {
            Child::Node(a) if tree.name(a) == NodeName::A && !tree.has_children(a) => {
                trace!("removing empty link {}", tree.display(a));
                // The next sibling shifts down into this index.
                tree.remove_child(id, i);
            }
            _ => i += 1,
        }
    }
    Ok(())
}

/// Replaces every link with its contents.
pub fn remove_links(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    let mut i = 0;
    while i < tree.child_count(id) {
        match *tree.child(id, i) {
            Child::Node(a) if tree.name(a) == NodeName::A => {
                // Re-examine index i: it now holds the link's first child.
                tree.replace_with_children(a)?;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

/// `<pre><code>foo</code></pre>` becomes `<pre>foo</pre>`.
pub fn collapse_code_inside_pre(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    if tree.name(id) != NodeName::Preformatted || tree.child_count(id) != 1 {
        return Ok(());
    }
    if let Child::Node(code) = *tree.child(id, 0) {
        if tree.name(code) == NodeName::Code {
            tree.replace_with_children(code)?;
        }
    }
    Ok(())
}

/// Replaces each ordered list with its items, numbered from 1.
pub fn number_lists(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    let mut i = 0;
    while i < tree.child_count(id) {
        let list = match *tree.child(id, i) {
            Child::Node(list) if tree.name(list) == NodeName::OrderedList => list,
            _ => {
                i += 1;
                continue;
            }
        };

        let mut counter = 1;
        for item in tree.copy_of_children(list) {
            if let Some(item) = item.node().filter(|n| tree.name(*n) == NodeName::ListItem) {
                tree.set_kind(item, NodeKind::NumberedListItem(counter));
                counter += 1;
            }
        }
        // Index i now holds the list's first child, which gets examined next.
        tree.replace_with_children(list)?;
    }
    Ok(())
}

/// Two consecutive line breaks become one paragraph separator. A single
/// line break has no Markdown rendering and is dropped.
pub fn two_brs_make_one_separator(tree: &mut Tree, id: NodeId) -> Result<(), Error> {
    let mut i = 0;
    while i < tree.child_count(id) {
        if !is_named(tree, id, i, NodeName::Br) {
            i += 1;
            continue;
        }

        if i + 1 < tree.child_count(id) && is_named(tree, id, i + 1, NodeName::Br) {
            tree.remove_child(id, i + 1);
            let separator = tree.add(NodeKind::Separator);
            tree.set_child(id, i, separator)?;
            i += 1;
        } else {
            tree.remove_child(id, i);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ParseOptions, parse_to_ir};
    use crate::html::parse_html;
    use crate::test_utils::do_logging;
    use pretty_assertions::assert_eq;

    fn raw(html: &str) -> Tree {
        do_logging();
        let dom = parse_html(html);
        parse_to_ir(&dom.document, &ParseOptions::default(), true).unwrap()
    }

    fn transformed(html: &str, options: &TransformOptions) -> String {
        let mut tree = raw(html);
        apply_tree_transforms(&mut tree, options).unwrap();
        tree.to_string()
    }

    fn single_pass(html: &str, pass: Pass) -> String {
        let mut tree = raw(html);
        let root = tree.root();
        visit_pre(&mut tree, root, pass).unwrap();
        tree.to_string()
    }

    fn has_adjacent_strings(tree: &Tree, id: NodeId) -> bool {
        let children = tree.children(id);
        children
            .windows(2)
            .any(|w| w[0].text().is_some() && w[1].text().is_some())
            || children
                .iter()
                .filter_map(Child::node)
                .any(|c| has_adjacent_strings(tree, c))
    }

    #[test]
    fn it_concatenates_adjacent_strings() {
        let mut tree = Tree::new();
        let root = tree.root();
        let bold = tree.add(NodeKind::Bold);
        for child in ["a", "b", "c"] {
            tree.push(root, child).unwrap();
        }
        tree.push(root, bold).unwrap();
        tree.push(bold, "d").unwrap();
        tree.push(bold, "e").unwrap();
        tree.push(root, "f").unwrap();

        visit_pre(&mut tree, root, concatenate_strings).unwrap();
        assert_eq!(tree.to_string(), r#"Document["abc", Bold["de"], "f"]"#);
        assert!(!has_adjacent_strings(&tree, root));
    }

    #[test]
    fn it_replaces_em_dashes() {
        assert_eq!(
            single_pass("a\u{2014}b <b>c\u{2014}\u{2014}d</b>", replace_em_dashes),
            r#"Document["a--b ", Bold["c----d"]]"#
        );
    }

    #[test]
    fn it_removes_consecutive_empty_links() {
        assert_eq!(
            single_pass("<p>a<a href=x></a><a href=y></a>b</p>", remove_empty_links),
            r#"Document[Paragraph["a", "b"]]"#
        );
    }

    #[test]
    fn it_removes_links_when_asked() {
        let options = TransformOptions { remove_links: true };
        assert_eq!(
            transformed("see <a href=x>this <b>page</b></a>", &options),
            r#"Document["see this ", Bold["page"]]"#
        );
    }

    #[test]
    fn it_keeps_links_by_default() {
        assert_eq!(
            transformed("see <a href=x>this</a>", &TransformOptions::default()),
            r#"Document["see ", A("x")["this"]]"#
        );
    }

    #[test]
    fn it_collapses_code_inside_pre() {
        assert_eq!(
            single_pass("<pre><code>foo</code></pre>", collapse_code_inside_pre),
            r#"Document[Preformatted["foo"]]"#
        );
    }

    #[test]
    fn it_leaves_mixed_pre_contents_alone() {
        assert_eq!(
            single_pass("<pre>a<code>foo</code></pre>", collapse_code_inside_pre),
            r#"Document[Preformatted["a", Code["foo"]]]"#
        );
    }

    #[test]
    fn it_numbers_ordered_lists() {
        assert_eq!(
            single_pass(
                "<ol><li>one</li><li>two<ol><li>inner</li></ol></li></ol><ol><li>again</li></ol>",
                number_lists
            ),
            r#"Document[NumberedListItem(1)["one"], NumberedListItem(2)["two", NumberedListItem(1)["inner"]], NumberedListItem(1)["again"]]"#
        );
    }

    #[test]
    fn it_turns_two_brs_into_a_separator() {
        assert_eq!(
            single_pass("foo<br><br>bar<br><br>baz", two_brs_make_one_separator),
            r#"Document["foo", Separator, "bar", Separator, "baz"]"#
        );
    }

    #[test]
    fn it_drops_lone_brs() {
        assert_eq!(
            single_pass("foo<br>bar<br><br><br>baz<br>", two_brs_make_one_separator),
            r#"Document["foo", "bar", Separator, "baz"]"#
        );
    }

    #[test]
    fn it_is_idempotent() {
        let html = "<p>a\u{2014}<a name=x></a>b<br>c</p><ol><li>x</li></ol><pre><code>y</code></pre>";
        let mut tree = raw(html);
        apply_tree_transforms(&mut tree, &TransformOptions::default()).unwrap();
        let once = tree.to_string();
        apply_tree_transforms(&mut tree, &TransformOptions::default()).unwrap();
        assert_eq!(tree.to_string(), once);
        assert_eq!(
            once,
            r#"Document[Paragraph["a--bc"], NumberedListItem(1)["x"], Preformatted["y"]]"#
        );
    }
}
