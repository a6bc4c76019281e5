// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Rendering IR nodes into a [`BlockRendering`].

use crate::Error;
use crate::ir::{self, Child, NodeId, NodeKind, NodeName, Tree};
use crate::render::{BlockOptions, BlockRendering, Prefix};

impl Tree {
    /// Renders the subtree rooted at `id` into `r`.
    ///
    /// Fails if the subtree still contains an ordered list, which the tree
    /// transforms should have replaced with numbered items.
    pub fn render(&self, id: NodeId, r: &mut BlockRendering) -> Result<(), Error> {
        match self.kind(id) {
            NodeKind::Document => self.render_children(id, r),

            NodeKind::Heading(level) => {
                let marker = "#".repeat(level.get() as usize);
                // Wrapping a heading would turn it into several headings.
                let options = BlockOptions::default().max_width(0);
                let prefix = Prefix::with_subsequent(format!("{marker} "), "");
                self.render_prefixed(id, r, prefix, options)
            }

            NodeKind::A { href } => self.render_link(id, href, r),

            NodeKind::Bold => self.render_delimited(id, r, "**"),
            NodeKind::Italic => self.render_delimited(id, r, "*"),
            NodeKind::Code => self.render_delimited(id, r, "`"),

            NodeKind::ListItem => self.render_prefixed(
                id,
                r,
                Prefix::with_subsequent("  - ", "    "),
                BlockOptions::default(),
            ),

            NodeKind::NumberedListItem(number) => self.render_prefixed(
                id,
                r,
                Prefix::with_subsequent(format!("{number:02}. "), "    "),
                BlockOptions::default(),
            ),

            NodeKind::Preformatted => {
                let options = BlockOptions::default()
                    .max_width(0)
                    .preserve_newlines(true);
                self.render_prefixed(id, r, Prefix::new("    "), options)
            }

            NodeKind::Paragraph => {
                self.render_prefixed(id, r, Prefix::new(""), BlockOptions::default())
            }

            NodeKind::Blockquote { accepts_trailers } => {
                let options = BlockOptions::default().accepts_trailers(*accepts_trailers);
                self.render_prefixed(id, r, Prefix::new("> "), options)
            }

            NodeKind::Br => {
                r.mark_hard_break();
                Self::render_boundary(r)
            }

            NodeKind::Separator => Self::render_boundary(r),

            NodeKind::OrderedList => Err(ir::Error::Unrenderable(NodeName::OrderedList).into()),
        }
    }

    fn render_children(&self, id: NodeId, r: &mut BlockRendering) -> Result<(), Error> {
        for child in self.children(id) {
            match child {
                Child::Text(text) => r.append(text),
                Child::Node(child) => self.render(*child, r)?,
            }
        }
        Ok(())
    }

    fn render_prefixed(
        &self,
        id: NodeId,
        r: &mut BlockRendering,
        prefix: Prefix,
        options: BlockOptions,
    ) -> Result<(), Error> {
        r.push_prefix(prefix.clone(), options);
        self.render_children(id, r)?;
        r.pop_prefix(&prefix)?;
        Ok(())
    }

    fn render_delimited(
        &self,
        id: NodeId,
        r: &mut BlockRendering,
        delimiter: &str,
    ) -> Result<(), Error> {
        r.append(delimiter);
        self.render_children(id, r)?;
        r.append(delimiter);
        Ok(())
    }

    fn render_link(&self, id: NodeId, href: &str, r: &mut BlockRendering) -> Result<(), Error> {
        let text: Option<String> = self
            .children(id)
            .iter()
            .map(|c| c.text())
            .collect();

        if text.as_deref() == Some(href) {
            r.append("<");
            self.render_children(id, r)?;
            r.append(">");
        } else {
            let link_id = r.get_link_id(href);
            r.append("[");
            self.render_children(id, r)?;
            r.append(&format!("][{link_id}]"));
        }
        Ok(())
    }

    fn render_boundary(r: &mut BlockRendering) -> Result<(), Error> {
        let prefix = Prefix::new("");
        r.push_prefix(prefix.clone(), BlockOptions::default());
        r.pop_prefix(&prefix)?;
        Ok(())
    }
}
