//! # Sequitur - Online Grammar Inference
//!
//! Infers a context-free grammar from a token stream in linear time by
//! factoring every repeated pair of adjacent symbols into a rule as soon as it
//! is seen twice.
//!
//! The grammar is maintained incrementally while enforcing two constraints:
//! 1. **Digram Uniqueness**: No digram (pair of consecutive symbols) appears more than once
//! 2. **Rule Utility**: Every rule is used at least twice
//!
//! ## Example
//!
//! ```
//! use sequitur_grammar::{parse, ProductionId};
//!
//! let grammar = parse("abcabdabcabd".chars()).unwrap();
//!
//! assert_eq!(grammar.len(), 3);
//! assert_eq!(grammar.length(ProductionId::START), 12);
//!
//! // Reconstructs the original sequence
//! let text: String = grammar.tokens(ProductionId::START).collect();
//! assert_eq!(text, "abcabdabcabd");
//!
//! println!("{grammar}");
//! ```
//!
//! ## Streaming
//!
//! [`Sequitur`] absorbs tokens one at a time; the constraints hold again after
//! every [`Sequitur::push`]. Independent streams can share one engine when
//! separated by [`Sequitur::push_mark`], which inserts a boundary no rule
//! spans.
//!
//! ## Performance
//!
//! - O(1) amortized time per symbol added
//! - Symbols and rules live in generational arenas (SlotMap)

mod digram;
mod error;
mod grammar;
mod iter;
mod render;
mod rule;
mod sequitur;
mod symbol;
mod token;

#[cfg(test)]
mod tests;

pub use error::{Result, SequiturError};
pub use grammar::{Expand, Grammar, Item, ProductionId};
pub use iter::SequiturIter;
pub use sequitur::{CompressionStats, Sequitur};
pub use symbol::Mark;
pub use token::Token;

/// Feeds a whole sequence into a fresh engine and returns its grammar.
pub fn parse<T, I>(tokens: I) -> Result<Grammar<T>>
where
    T: Token,
    I: IntoIterator<Item = T>,
{
    let mut sequitur = Sequitur::new();
    sequitur.extend(tokens)?;
    Ok(sequitur.grammar())
}
