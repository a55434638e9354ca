use crate::sequitur::Sequitur;
use crate::symbol::{RuleKey, Symbol, SymbolKey, SymbolNode, Value};
use crate::token::Token;
use slotmap::Key;

/// A named production.
///
/// The body hangs off `guard` as a circular list. `usage` counts the symbols
/// anywhere in the grammar that reference this rule.
#[derive(Debug)]
pub(crate) struct Rule {
    pub guard: SymbolKey,
    pub usage: u32,
}

impl<T: Token> Sequitur<T> {
    /// Allocates a rule with an empty body (a guard linked to itself).
    pub(crate) fn new_rule(&mut self) -> RuleKey {
        let rule = self.rules.insert(Rule {
            guard: SymbolKey::null(),
            usage: 0,
        });
        let guard = self.symbols.insert(SymbolNode::new(Symbol::Guard(rule)));
        self.symbols[guard].prev = guard;
        self.symbols[guard].next = guard;
        self.rules[rule].guard = guard;
        rule
    }

    /// Resolves a repeat of the digram at `first` found again at `found`.
    ///
    /// Reuses the rule whose whole body is the digram, or creates a new one
    /// and substitutes it at both occurrences. Then inlines any rule left
    /// with a single use inside the resolved rule's body.
    pub(crate) fn process_match(&mut self, first: SymbolKey, found: SymbolKey) {
        let before = self.symbols[found].prev;
        let after = self.symbols[self.symbols[found].next].next;

        // The match is exactly the body of an existing rule
        let complete = match self.symbols[before].symbol {
            Symbol::Guard(rule) if self.symbols[after].symbol.is_guard() => Some(rule),
            _ => None,
        };

        let rule = match complete {
            Some(rule) => {
                log::trace!("reusing rule {:?} for repeated digram", rule);
                self.substitute(first, rule);
                rule
            }
            None => {
                let second = self.symbols[first].next;
                let (Some(left), Some(right)) = (
                    self.symbols[first].symbol.value().cloned(),
                    self.symbols[second].symbol.value().cloned(),
                ) else {
                    debug_assert!(false, "digram touches a guard");
                    return;
                };

                let rule = self.new_rule();
                log::trace!("creating rule {:?} for repeated digram", rule);
                let guard = self.rules[rule].guard;
                let body_first = self.insert_after(guard, left);
                self.insert_after(body_first, right);

                self.substitute(found, rule);
                self.substitute(first, rule);

                let body_first = self.symbols[guard].next;
                self.register_digram(body_first);
                rule
            }
        };

        // Symbols of a retired rule keep their final links until the sweep
        let guard = self.rules[rule].guard;
        let body_first = self.symbols[guard].next;
        self.expand_if_underused(body_first);

        if !self.retired.contains(&rule) {
            let body_last = self.symbols[guard].prev;
            self.expand_if_underused(body_last);
        }
    }

    /// Replaces the digram starting at `first` with a reference to `rule`.
    pub(crate) fn substitute(&mut self, first: SymbolKey, rule: RuleKey) {
        let prev = self.symbols[first].prev;

        let left = self.symbols[prev].next;
        self.delete_symbol(left);
        let right = self.symbols[prev].next;
        self.delete_symbol(right);

        self.insert_after(prev, Value::Rule(rule));

        if !self.check(prev) {
            let inserted = self.symbols[prev].next;
            self.check(inserted);
        }
    }

    fn expand_if_underused(&mut self, key: SymbolKey) {
        let Some(node) = self.symbols.get(key) else {
            return;
        };
        let Some(rule) = node.symbol.rule_ref() else {
            return;
        };
        if self.rules.get(rule).map(|r| r.usage) == Some(1) && !self.retired.contains(&rule) {
            self.expand(key);
        }
    }

    /// Splices the body of the rule referenced at `key` in place of `key`.
    ///
    /// `key` must be the only reference left to that rule. The rule is
    /// retired and released at the end of the current push.
    pub(crate) fn expand(&mut self, key: SymbolKey) {
        let Some(rule) = self.symbols[key].symbol.rule_ref() else {
            return;
        };
        debug_assert_eq!(self.rules[rule].usage, 1, "expanding a shared rule");
        log::trace!("expanding rule {:?} used once", rule);

        let left = self.symbols[key].prev;
        let right = self.symbols[key].next;
        let guard = self.rules[rule].guard;
        let body_first = self.symbols[guard].next;
        let body_last = self.symbols[guard].prev;

        self.forget_digram(key);
        self.join(left, body_first);
        self.join(body_last, right);
        self.register_digram(body_last);

        self.symbols.remove(key);
        self.retired.push(rule);
    }

    /// Releases rules expanded during the last push.
    pub(crate) fn sweep_retired(&mut self) {
        for rule in self.retired.drain(..) {
            if let Some(record) = self.rules.remove(rule) {
                self.symbols.remove(record.guard);
            }
        }
    }

    pub(crate) fn add_use(&mut self, value: &Value<T>) {
        if let Value::Rule(rule) = value {
            if let Some(record) = self.rules.get_mut(*rule) {
                record.usage += 1;
            }
        }
    }

    pub(crate) fn drop_use(&mut self, key: SymbolKey) {
        if let Some(rule) = self.symbols[key].symbol.rule_ref() {
            if let Some(record) = self.rules.get_mut(rule) {
                debug_assert!(record.usage > 0, "rule usage below zero");
                record.usage = record.usage.saturating_sub(1);
            }
        }
    }

    /// Symbols of a rule body in order, guard excluded.
    pub(crate) fn body(&self, rule: RuleKey) -> impl Iterator<Item = SymbolKey> + '_ {
        let guard = self.rules[rule].guard;
        let mut current = self.symbols[guard].next;
        std::iter::from_fn(move || {
            if current == guard {
                return None;
            }
            let key = current;
            current = self.symbols[key].next;
            Some(key)
        })
    }
}
