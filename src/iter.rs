use crate::sequitur::Sequitur;
use crate::symbol::{Symbol, SymbolKey, Value};
use crate::token::Token;

/// Iterator that reconstructs the absorbed tokens by expanding rules.
///
/// Walks the live engine with an explicit stack of return positions, one per
/// rule being expanded. Marks are skipped.
pub struct SequiturIter<'a, T> {
    sequitur: &'a Sequitur<T>,
    current: SymbolKey,
    stack: Vec<SymbolKey>,
}

impl<'a, T: Token> SequiturIter<'a, T> {
    pub(crate) fn new(sequitur: &'a Sequitur<T>) -> Self {
        let guard = sequitur.rules[sequitur.start].guard;
        Self {
            sequitur,
            current: sequitur.symbols[guard].next,
            stack: Vec::new(),
        }
    }
}

impl<'a, T: Token> Iterator for SequiturIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let sequitur: &'a Sequitur<T> = self.sequitur;
        let symbols = &sequitur.symbols;
        loop {
            let node = &symbols[self.current];
            match &node.symbol {
                Symbol::Value(Value::Token(token)) => {
                    self.current = node.next;
                    return Some(token);
                }
                Symbol::Value(Value::Mark(_)) => self.current = node.next,
                Symbol::Value(Value::Rule(rule)) => {
                    self.stack.push(node.next);
                    let guard = sequitur.rules[*rule].guard;
                    self.current = symbols[guard].next;
                }
                // End of a rule body; the start rule's guard ends iteration
                Symbol::Guard(_) => self.current = self.stack.pop()?,
            }
        }
    }
}

impl<T: Token> Sequitur<T> {
    /// Returns an iterator over the reconstructed sequence.
    pub fn iter(&self) -> SequiturIter<'_, T> {
        SequiturIter::new(self)
    }
}

impl<'a, T: Token> IntoIterator for &'a Sequitur<T> {
    type Item = &'a T;
    type IntoIter = SequiturIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
