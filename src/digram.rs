use crate::sequitur::Sequitur;
use crate::symbol::{Symbol, SymbolKey, Value};
use crate::token::Token;
use ahash::AHashMap as HashMap;
use std::hash::Hash;

/// Ordered pair of adjacent values.
pub(crate) type Digram<T> = (Value<T>, Value<T>);

/// Maps each digram to the left symbol of its registered occurrence.
///
/// At most one occurrence per digram is registered.
#[derive(Debug)]
pub(crate) struct DigramIndex<T> {
    map: HashMap<Digram<T>, SymbolKey>,
}

impl<T: Hash + Eq> DigramIndex<T> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn get(&self, digram: &Digram<T>) -> Option<SymbolKey> {
        self.map.get(digram).copied()
    }

    #[inline]
    pub(crate) fn insert(&mut self, digram: Digram<T>, first: SymbolKey) {
        self.map.insert(digram, first);
    }

    /// Removes the entry only if it is registered at `first`.
    #[inline]
    pub(crate) fn remove_if(&mut self, digram: &Digram<T>, first: SymbolKey) {
        if self.map.get(digram) == Some(&first) {
            self.map.remove(digram);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Digram<T>, &SymbolKey)> {
        self.map.iter()
    }
}

impl<T: Token> Sequitur<T> {
    /// The digram starting at `first`, or None if either end is a guard.
    pub(crate) fn digram_at(&self, first: SymbolKey) -> Option<Digram<T>> {
        let node = &self.symbols[first];
        let left = node.symbol.value()?;
        let right = self.symbols[node.next].symbol.value()?;
        Some((left.clone(), right.clone()))
    }

    fn digram_matches(&self, first: SymbolKey, digram: &Digram<T>) -> bool {
        let Some(node) = self.symbols.get(first) else {
            return false;
        };
        match (node.symbol.value(), self.symbols.get(node.next)) {
            (Some(left), Some(next)) => {
                next.symbol.value() == Some(&digram.1) && *left == digram.0
            }
            _ => false,
        }
    }

    /// Registers the digram starting at `first`, replacing any other occurrence.
    pub(crate) fn register_digram(&mut self, first: SymbolKey) {
        if let Some(digram) = self.digram_at(first) {
            self.digrams.insert(digram, first);
        }
    }

    /// Forgets the digram starting at `first` if it is the registered occurrence.
    pub(crate) fn forget_digram(&mut self, first: SymbolKey) {
        if let Some(digram) = self.digram_at(first) {
            self.digrams.remove_if(&digram, first);
        }
    }

    /// Checks the digram starting at `first` against the index.
    ///
    /// Registers it if unseen and resolves a genuine repeat through
    /// `process_match`. Returns true if the digram was already known,
    /// including the overlapping case where nothing is rewritten.
    pub(crate) fn check(&mut self, first: SymbolKey) -> bool {
        let Some(digram) = self.digram_at(first) else {
            return false;
        };

        match self.digrams.get(&digram) {
            // Entries left behind by freed or rewritten symbols are stale
            Some(found) if self.digram_matches(found, &digram) => {
                // Overlapping occurrences such as the two pairs in "aaa"
                if found != first && self.symbols[found].next != first {
                    self.process_match(first, found);
                }
                true
            }
            _ => {
                self.digrams.insert(digram, first);
                false
            }
        }
    }

    /// True if `first` and `second` are both values and compare equal.
    pub(crate) fn same_value(&self, first: SymbolKey, second: SymbolKey) -> bool {
        match (self.symbols.get(first), self.symbols.get(second)) {
            (Some(a), Some(b)) => match (&a.symbol, &b.symbol) {
                (Symbol::Value(a), Symbol::Value(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }
}
