//! Text rendering of a grammar.
//!
//! One line per production in ascending id order:
//!
//! ```text
//! 0 -> 1 _ 1 ↵
//! 1 -> h e l l o                                    hello
//! ```
//!
//! Every production but the start one is followed by its full expansion,
//! starting at column 50 (at least one space after the right-hand side).
//! Spaces, line feeds and tabs print as `_`, `↵` and `⇥`. Lines are joined
//! with `\n` and the output has no trailing newline.

use crate::grammar::{Grammar, Item, ProductionId};
use std::borrow::Cow;
use std::fmt;

/// Column where the expansion of a production starts.
const EXPANSION_COLUMN: usize = 50;

impl<T: fmt::Display> fmt::Display for Item<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Token(token) => fmt::Display::fmt(token, f),
            Item::Mark(mark) => fmt::Display::fmt(mark, f),
            Item::Production(id) => fmt::Display::fmt(id, f),
        }
    }
}

fn printable<T: fmt::Display>(item: &Item<T>) -> Cow<'static, str> {
    let text = item.to_string();
    match text.as_str() {
        " " => Cow::Borrowed("_"),
        "\n" => Cow::Borrowed("\u{21B5}"),
        "\t" => Cow::Borrowed("\u{21E5}"),
        _ => Cow::Owned(text),
    }
}

impl<T: fmt::Display> fmt::Display for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, body) in self.iter() {
            if id != ProductionId::START {
                f.write_str("\n")?;
            }

            let mut line = format!("{id} ->");
            for item in body {
                line.push(' ');
                line.push_str(&printable(item));
            }

            if id != ProductionId::START {
                let width = line.chars().count();
                let padding = EXPANSION_COLUMN.saturating_sub(width).max(1);
                line.extend(std::iter::repeat(' ').take(padding));
                for item in self.expand(id) {
                    line.push_str(&printable(item));
                }
            }

            f.write_str(&line)?;
        }
        Ok(())
    }
}
