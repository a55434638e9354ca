use slotmap::{new_key_type, Key};
use std::fmt;

new_key_type! {
    /// Handle to a node in the symbol arena.
    pub(crate) struct SymbolKey;

    /// Handle to a rule record.
    pub(crate) struct RuleKey;
}

/// A boundary marker.
///
/// Every mark handed out by an engine carries a fresh serial number, so a mark
/// only ever compares equal to itself. Feeding marks between logically
/// independent streams keeps any rule from spanning the boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mark(u64);

impl Mark {
    pub(crate) fn new(serial: u64) -> Self {
        Mark(serial)
    }

    /// Position of this mark among the marks issued by its engine.
    pub fn serial(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("|")
    }
}

/// What a body symbol stands for.
///
/// Terminals compare structurally, rule references by rule identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Value<T> {
    Token(T),
    Mark(Mark),
    Rule(RuleKey),
}

/// Role of a node in a circular rule body.
#[derive(Debug, Clone)]
pub(crate) enum Symbol<T> {
    /// Head/tail sentinel of the rule's body. Never part of a digram.
    Guard(RuleKey),
    Value(Value<T>),
}

impl<T> Symbol<T> {
    pub(crate) fn is_guard(&self) -> bool {
        matches!(self, Symbol::Guard(_))
    }

    pub(crate) fn value(&self) -> Option<&Value<T>> {
        match self {
            Symbol::Value(v) => Some(v),
            Symbol::Guard(_) => None,
        }
    }

    /// The rule this symbol references, if it is a non-terminal.
    pub(crate) fn rule_ref(&self) -> Option<RuleKey> {
        match self {
            Symbol::Value(Value::Rule(rule)) => Some(*rule),
            _ => None,
        }
    }
}

/// A node in a circular doubly-linked rule body.
#[derive(Debug)]
pub(crate) struct SymbolNode<T> {
    pub symbol: Symbol<T>,
    pub prev: SymbolKey,
    pub next: SymbolKey,
}

impl<T> SymbolNode<T> {
    pub(crate) fn new(symbol: Symbol<T>) -> Self {
        Self {
            symbol,
            prev: SymbolKey::null(),
            next: SymbolKey::null(),
        }
    }
}
