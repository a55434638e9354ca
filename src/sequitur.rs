use crate::digram::DigramIndex;
use crate::error::{Result, SequiturError};
use crate::grammar::Grammar;
use crate::rule::Rule;
use crate::symbol::{Mark, RuleKey, Symbol, SymbolKey, SymbolNode, Value};
use crate::token::Token;
use slotmap::{Key, SlotMap};

/// Main Sequitur data structure.
///
/// Maintains a context-free grammar over the input absorbed so far while
/// enforcing two constraints after every push:
/// 1. Digram Uniqueness: No digram appears more than once
/// 2. Rule Utility: Every rule other than the start rule is used at least twice
///
/// One engine must not be fed from several threads at once; independent
/// streams go through one engine separated by [`Sequitur::push_mark`].
pub struct Sequitur<T> {
    /// Arena of every body symbol and guard
    pub(crate) symbols: SlotMap<SymbolKey, SymbolNode<T>>,

    /// Arena of rule records, the start rule included
    pub(crate) rules: SlotMap<RuleKey, Rule>,

    /// Registered occurrence of every digram
    pub(crate) digrams: DigramIndex<T>,

    /// Top-level rule under construction
    pub(crate) start: RuleKey,

    /// Rules expanded during the current push, released when it returns
    pub(crate) retired: Vec<RuleKey>,

    /// Number of marks issued
    marks: u64,

    /// Number of tokens and marks absorbed
    length: usize,
}

impl<T: Token> Sequitur<T> {
    /// Creates a new empty engine holding only the start rule.
    pub fn new() -> Self {
        Self::from_parts(SlotMap::with_key(), SlotMap::with_key(), DigramIndex::new())
    }

    /// Creates an engine sized for about `capacity` input tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(
            SlotMap::with_capacity_and_key(capacity),
            SlotMap::with_key(),
            DigramIndex::with_capacity(capacity),
        )
    }

    fn from_parts(
        symbols: SlotMap<SymbolKey, SymbolNode<T>>,
        rules: SlotMap<RuleKey, Rule>,
        digrams: DigramIndex<T>,
    ) -> Self {
        let mut seq = Self {
            symbols,
            rules,
            digrams,
            start: RuleKey::null(),
            retired: Vec::new(),
            marks: 0,
            length: 0,
        };
        seq.start = seq.new_rule();
        seq
    }

    /// Appends a token to the start rule and restores the grammar constraints.
    ///
    /// Blank tokens are rejected before anything changes.
    pub fn push(&mut self, token: T) -> Result<()> {
        if token.is_blank() {
            return Err(SequiturError::InvalidToken {
                position: self.length,
            });
        }
        self.append(Value::Token(token));
        Ok(())
    }

    /// Appends a boundary mark that never matches any other value.
    pub fn push_mark(&mut self) -> Mark {
        let mark = Mark::new(self.marks);
        self.marks += 1;
        self.append(Value::Mark(mark));
        mark
    }

    /// Pushes every token of `iter`, stopping at the first blank one.
    ///
    /// Tokens before the rejected one stay in the grammar.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<()> {
        for token in iter {
            self.push(token)?;
        }
        Ok(())
    }

    fn append(&mut self, value: Value<T>) {
        let guard = self.rules[self.start].guard;
        let last = self.symbols[guard].prev;
        self.insert_after(last, value);
        self.check(last);
        self.sweep_retired();
        self.length += 1;
    }

    /// Links `left` to `right`, keeping the digram index in step.
    ///
    /// In a run of three equal values only one of the two overlapping pairs
    /// is registered; when the link being replaced invalidates it, the other
    /// pair is registered instead.
    pub(crate) fn join(&mut self, left: SymbolKey, right: SymbolKey) {
        if !self.symbols[left].next.is_null() {
            self.forget_digram(left);

            let (before, after) = (self.symbols[right].prev, self.symbols[right].next);
            if !before.is_null()
                && !after.is_null()
                && self.same_value(right, before)
                && self.same_value(right, after)
            {
                self.register_digram(right);
            }

            let (before, after) = (self.symbols[left].prev, self.symbols[left].next);
            if !before.is_null()
                && !after.is_null()
                && self.same_value(left, after)
                && self.same_value(left, before)
            {
                self.register_digram(before);
            }
        }

        self.symbols[left].next = right;
        self.symbols[right].prev = left;
    }

    /// Inserts a new symbol carrying `value` after `key`.
    pub(crate) fn insert_after(&mut self, key: SymbolKey, value: Value<T>) -> SymbolKey {
        self.add_use(&value);
        let inserted = self.symbols.insert(SymbolNode::new(Symbol::Value(value)));
        let next = self.symbols[key].next;
        self.join(inserted, next);
        self.join(key, inserted);
        inserted
    }

    /// Unlinks and frees a body symbol, releasing its digram and rule use.
    pub(crate) fn delete_symbol(&mut self, key: SymbolKey) {
        debug_assert!(!self.symbols[key].symbol.is_guard(), "deleting a guard");
        let (prev, next) = (self.symbols[key].prev, self.symbols[key].next);
        self.join(prev, next);
        self.forget_digram(key);
        self.drop_use(key);
        self.symbols.remove(key);
    }

    /// Returns the number of tokens and marks absorbed.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if nothing has been absorbed.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of live rules, the start rule included.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of registered digrams.
    pub fn digram_count(&self) -> usize {
        self.digrams.len()
    }

    /// Number of symbols in the start rule's body.
    pub fn start_len(&self) -> usize {
        self.body(self.start).count()
    }

    /// Snapshots the current grammar as a production table.
    pub fn grammar(&self) -> Grammar<T> {
        Grammar::build(self)
    }

    /// Returns compression statistics.
    pub fn stats(&self) -> CompressionStats {
        let grammar_symbols = self.rules.keys().map(|rule| self.body(rule).count()).sum();

        CompressionStats {
            input_length: self.length,
            grammar_symbols,
            num_rules: self.rules.len(),
        }
    }
}

/// Statistics about the compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    /// Number of input symbols added
    pub input_length: usize,
    /// Total symbols in the grammar
    pub grammar_symbols: usize,
    /// Number of rules, the start rule included
    pub num_rules: usize,
}

impl CompressionStats {
    /// Returns the compression ratio as a percentage.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_length == 0 {
            0.0
        } else {
            (self.grammar_symbols as f64 / self.input_length as f64) * 100.0
        }
    }
}

impl<T: Token> Default for Sequitur<T> {
    fn default() -> Self {
        Self::new()
    }
}
