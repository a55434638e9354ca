//! Read-only production table extracted from an engine.

use crate::sequitur::Sequitur;
use crate::symbol::{Mark, RuleKey, Symbol, Value};
use crate::token::Token;
use ahash::AHashMap as HashMap;
use std::cell::OnceCell;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Index;

/// Identifier of a production; ids follow breadth-first discovery from the start.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductionId(pub usize);

impl ProductionId {
    /// The start production.
    pub const START: ProductionId = ProductionId(0);
}

impl fmt::Display for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One value of a production body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Item<T> {
    Token(T),
    Mark(Mark),
    Production(ProductionId),
}

impl<T> Item<T> {
    /// The token, if this item is one.
    pub fn as_token(&self) -> Option<&T> {
        match self {
            Item::Token(token) => Some(token),
            _ => None,
        }
    }

    /// The referenced production, if this item is a non-terminal.
    pub fn as_production(&self) -> Option<ProductionId> {
        match self {
            Item::Production(id) => Some(*id),
            _ => None,
        }
    }
}

/// Immutable snapshot of an engine's grammar.
///
/// Metrics are computed on first request and memoized.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Grammar<T> {
    productions: Vec<Vec<Item<T>>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    lengths: OnceCell<Vec<usize>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    counts: OnceCell<Vec<usize>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    depths: OnceCell<Vec<usize>>,
}

impl<T: Token> Grammar<T> {
    /// Walks the rules reachable from the start rule breadth-first.
    pub fn build(sequitur: &Sequitur<T>) -> Self {
        let mut ids: HashMap<RuleKey, ProductionId> = HashMap::new();
        let mut queue = VecDeque::new();
        let mut productions = Vec::new();

        ids.insert(sequitur.start, ProductionId::START);
        queue.push_back(sequitur.start);

        // Ids are handed out in enqueue order, so bodies land at their id
        while let Some(rule) = queue.pop_front() {
            let body = sequitur
                .body(rule)
                .filter_map(|key| match &sequitur.symbols[key].symbol {
                    Symbol::Value(Value::Token(token)) => Some(Item::Token(token.clone())),
                    Symbol::Value(Value::Mark(mark)) => Some(Item::Mark(*mark)),
                    Symbol::Value(Value::Rule(child)) => {
                        let next = ProductionId(ids.len());
                        let id = *ids.entry(*child).or_insert_with(|| {
                            queue.push_back(*child);
                            next
                        });
                        Some(Item::Production(id))
                    }
                    Symbol::Guard(_) => None,
                })
                .collect();
            productions.push(body);
        }

        log::debug!("built grammar with {} productions", productions.len());
        Self::from_productions(productions)
    }
}

impl<T> Grammar<T> {
    fn from_productions(productions: Vec<Vec<Item<T>>>) -> Self {
        Self {
            productions,
            lengths: OnceCell::new(),
            counts: OnceCell::new(),
            depths: OnceCell::new(),
        }
    }

    /// Number of productions, the start production included.
    pub fn len(&self) -> usize {
        self.productions.len()
    }

    /// Always false: the start production exists even for empty input.
    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn get(&self, id: ProductionId) -> Option<&[Item<T>]> {
        self.productions.get(id.0).map(Vec::as_slice)
    }

    /// Productions in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductionId, &[Item<T>])> {
        self.productions
            .iter()
            .enumerate()
            .map(|(id, body)| (ProductionId(id), body.as_slice()))
    }

    /// Production bodies indexed by id.
    pub fn productions(&self) -> &[Vec<Item<T>>] {
        &self.productions
    }

    /// Consumes the view, returning the bodies indexed by id.
    pub fn into_productions(self) -> Vec<Vec<Item<T>>> {
        self.productions
    }

    /// Terminal count of every production under full expansion.
    pub fn lengths(&self) -> &[usize] {
        self.lengths.get_or_init(|| self.compute_lengths())
    }

    /// Terminal count of `id` under full expansion.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a production of this grammar.
    pub fn length(&self, id: ProductionId) -> usize {
        self.lengths()[id.0]
    }

    /// Direct references to every production; the start production counts once.
    pub fn counts(&self) -> &[usize] {
        self.counts.get_or_init(|| {
            let mut counts = vec![0; self.productions.len()];
            for item in self.productions.iter().flatten() {
                if let Item::Production(child) = item {
                    counts[child.0] += 1;
                }
            }
            if let Some(root) = counts.first_mut() {
                *root = 1;
            }
            counts
        })
    }

    /// Direct references to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a production of this grammar.
    pub fn count(&self, id: ProductionId) -> usize {
        self.counts()[id.0]
    }

    /// Shortest nesting depth of every production below the start.
    pub fn depths(&self) -> &[usize] {
        self.depths.get_or_init(|| {
            let mut depths = vec![usize::MAX; self.productions.len()];
            let mut queue = VecDeque::new();
            if !depths.is_empty() {
                depths[0] = 0;
                queue.push_back(0);
            }
            while let Some(parent) = queue.pop_front() {
                let depth = depths[parent] + 1;
                for child in self.productions[parent].iter().filter_map(Item::as_production) {
                    if depths[child.0] == usize::MAX {
                        depths[child.0] = depth;
                        queue.push_back(child.0);
                    }
                }
            }
            depths
        })
    }

    /// Shortest nesting depth of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a production of this grammar.
    pub fn depth(&self, id: ProductionId) -> usize {
        self.depths()[id.0]
    }

    /// Lazily flattens a production into its terminals and marks.
    pub fn expand(&self, id: ProductionId) -> Expand<'_, T> {
        Expand {
            grammar: self,
            stack: vec![(id.0, 0)],
        }
    }

    /// Tokens of the full expansion of a production, marks skipped.
    pub fn tokens(&self, id: ProductionId) -> impl Iterator<Item = &T> {
        self.expand(id).filter_map(Item::as_token)
    }

    fn compute_lengths(&self) -> Vec<usize> {
        let mut lengths: Vec<Option<usize>> = vec![None; self.productions.len()];

        for root in 0..self.productions.len() {
            let mut stack = vec![root];
            while let Some(&id) = stack.last() {
                if lengths[id].is_some() {
                    stack.pop();
                    continue;
                }

                let mut total = 0;
                let mut pending = false;
                for item in &self.productions[id] {
                    match item {
                        Item::Production(child) => match lengths[child.0] {
                            Some(length) => total += length,
                            None => {
                                stack.push(child.0);
                                pending = true;
                            }
                        },
                        _ => total += 1,
                    }
                }

                if !pending {
                    lengths[id] = Some(total);
                    stack.pop();
                }
            }
        }

        lengths.into_iter().map(Option::unwrap_or_default).collect()
    }
}

impl<T> Index<ProductionId> for Grammar<T> {
    type Output = [Item<T>];

    fn index(&self, id: ProductionId) -> &Self::Output {
        &self.productions[id.0]
    }
}

impl<T: PartialEq> PartialEq for Grammar<T> {
    fn eq(&self, other: &Self) -> bool {
        self.productions == other.productions
    }
}

impl<T: Eq> Eq for Grammar<T> {}

/// Iterator over the terminals of a production, see [`Grammar::expand`].
pub struct Expand<'a, T> {
    grammar: &'a Grammar<T>,
    stack: Vec<(usize, usize)>,
}

impl<'a, T> Iterator for Expand<'a, T> {
    type Item = &'a Item<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let grammar = self.grammar;
        loop {
            let (id, offset) = self.stack.last_mut()?;
            let Some(item) = grammar.productions.get(*id).and_then(|body| body.get(*offset)) else {
                self.stack.pop();
                continue;
            };
            *offset += 1;

            match item {
                Item::Production(child) => self.stack.push((child.0, 0)),
                _ => return Some(item),
            }
        }
    }
}
