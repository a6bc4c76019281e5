// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

use pretty_assertions::assert_eq;
use std::fs;
use tomd::{ParseOptions, to_markdown};

fn load_fixture(file: &str) -> String {
    let file = format!("tests/fixtures/{file}");
    fs::read_to_string(&file).expect(&format!("could not find test file: {file}"))
}

macro_rules! end_to_end_tests {
    ($($name:ident),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<it_converts_ $name>]() {
                    let html = load_fixture(concat!(stringify!($name), ".html"));
                    let md = load_fixture(concat!(stringify!($name), ".md"));
                    assert_eq!(to_markdown(&html, &ParseOptions::default()).unwrap(), md);
                }
            }
        )*
    };
}

end_to_end_tests!(
    anchors,
    bold_and_italic,
    inline,
    mac_history,
    quote_and_code,
    two_br,
);

#[test]
fn it_quotes_a_whole_document_with_its_references() {
    let html = load_fixture("mac_history.html");
    let options = ParseOptions::default().quote(true);
    let md = to_markdown(&html, &options).unwrap();
    assert!(md.lines().all(|line| line.starts_with('>')), "{md}");
    assert!(md.ends_with(
        ">\n> [1]: https://www.macworld.com/article/1025078/future.html\n\
         > [2]: https://arstechnica.com/gadgets/2005/04/macosx-10-4/4/\n"
    ));
}

#[test]
fn it_converts_a_document_without_links() {
    let html = load_fixture("inline.html");
    let options = ParseOptions::default().links(false);
    assert_eq!(
        to_markdown(&html, &options).unwrap(),
        "See https://example.org and run `cargo test`.\n"
    );
}
