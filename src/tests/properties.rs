use crate::digram::Digram;
use crate::grammar::{Item, ProductionId};
use crate::sequitur::Sequitur;
use crate::symbol::{RuleKey, Value};
use crate::token::Token;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt::Debug;

/// Small alphabets so repeats, runs and nested rules actually show up.
fn small_input() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..300)
}

/// Tokens interleaved with boundary marks (`None`).
fn marked_input() -> impl Strategy<Value = Vec<Option<u8>>> {
    prop::collection::vec(prop::option::weighted(0.85, 0u8..3), 0..200)
}

fn feed(input: &[Option<u8>]) -> Sequitur<u8> {
    let mut seq = Sequitur::new();
    for token in input {
        match token {
            Some(n) => seq.push(*n).unwrap(),
            None => {
                seq.push_mark();
            }
        }
    }
    seq
}

/// Finds a digram occurring twice across the live rule bodies.
///
/// The overlapping pairs of a run (`a a a`) are a single occurrence.
fn repeated_digram<T: Token>(seq: &Sequitur<T>) -> Option<Digram<T>> {
    let mut seen: HashMap<Digram<T>, (RuleKey, usize)> = HashMap::new();
    for rule in seq.rules.keys() {
        for (offset, key) in seq.body(rule).enumerate() {
            let Some(digram) = seq.digram_at(key) else {
                continue;
            };
            match seen.get(&digram) {
                Some(&(other, at)) if other == rule && at + 1 == offset => {}
                Some(_) => return Some(digram),
                None => {
                    seen.insert(digram, (rule, offset));
                }
            }
        }
    }
    None
}

/// Number of references to every rule found in the bodies.
fn references<T: Token>(seq: &Sequitur<T>) -> HashMap<RuleKey, u32> {
    let mut refs = HashMap::new();
    for rule in seq.rules.keys() {
        for key in seq.body(rule) {
            if let Some(child) = seq.symbols[key].symbol.rule_ref() {
                *refs.entry(child).or_insert(0) += 1;
            }
        }
    }
    refs
}

fn assert_utility<T: Token>(seq: &Sequitur<T>) -> Result<(), TestCaseError> {
    let refs = references(seq);
    for (rule, record) in seq.rules.iter() {
        if rule == seq.start {
            continue;
        }
        let found = refs.get(&rule).copied().unwrap_or(0);
        prop_assert_eq!(record.usage, found);
        prop_assert!(record.usage >= 2, "rule used {} times", record.usage);
        prop_assert!(seq.body(rule).count() >= 2);
    }
    Ok(())
}

fn assert_index_consistent<T: Token + Debug>(seq: &Sequitur<T>) -> Result<(), TestCaseError> {
    for (digram, &first) in seq.digrams.iter() {
        prop_assert!(seq.symbols.contains_key(first), "stale digram entry");
        let at = seq.digram_at(first);
        prop_assert_eq!(at.as_ref(), Some(digram));
    }
    Ok(())
}

proptest! {
    /// The reconstructed sequence must exactly match the input.
    #[test]
    fn prop_roundtrip(input in small_input()) {
        let mut seq = Sequitur::new();
        seq.extend(input.clone()).unwrap();

        let reconstructed: Vec<u8> = seq.iter().copied().collect();
        prop_assert_eq!(&reconstructed, &input);

        let grammar = seq.grammar();
        let expanded: Vec<u8> = grammar.tokens(ProductionId::START).copied().collect();
        prop_assert_eq!(expanded, input);
    }

    /// Arbitrary bytes, mostly distinct, still round-trip.
    #[test]
    fn prop_roundtrip_wide_alphabet(input: Vec<u8>) {
        let mut seq = Sequitur::new();
        seq.extend(input.clone()).unwrap();

        prop_assert_eq!(seq.len(), input.len());
        prop_assert_eq!(seq.iter().copied().collect::<Vec<_>>(), input);
    }

    /// Both constraints hold again after every single push.
    #[test]
    fn prop_constraints_after_every_push(input in small_input()) {
        let mut seq = Sequitur::new();
        for &token in &input {
            seq.push(token).unwrap();

            prop_assert!(seq.retired.is_empty());
            let repeated = repeated_digram(&seq);
            prop_assert!(repeated.is_none(), "repeated digram {:?}", repeated);
            assert_utility(&seq)?;
        }
    }

    /// Every index entry names a live symbol starting that exact digram.
    #[test]
    fn prop_digram_index_consistent(input in small_input()) {
        let mut seq = Sequitur::new();
        for &token in &input {
            seq.push(token).unwrap();
            assert_index_consistent(&seq)?;
        }
    }

    /// Adding items one-by-one produces the same grammar as extend.
    #[test]
    fn prop_incremental_equivalence(input in small_input()) {
        let mut batch = Sequitur::new();
        batch.extend(input.clone()).unwrap();

        let mut incremental = Sequitur::new();
        for &item in &input {
            incremental.push(item).unwrap();
        }

        prop_assert_eq!(batch.grammar(), incremental.grammar());
        prop_assert_eq!(batch.stats(), incremental.stats());
    }

    /// Building the view twice yields the same table and text.
    #[test]
    fn prop_view_idempotent(input in small_input()) {
        let mut seq = Sequitur::new();
        seq.extend(input).unwrap();

        let first = seq.grammar();
        let second = seq.grammar();
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first, second);
    }

    /// Lengths, counts and depths agree with the productions they describe.
    #[test]
    fn prop_metrics_consistent(input in small_input()) {
        let mut seq = Sequitur::new();
        seq.extend(input.clone()).unwrap();
        let grammar = seq.grammar();

        prop_assert_eq!(grammar.length(ProductionId::START), input.len());
        prop_assert_eq!(grammar.count(ProductionId::START), 1);
        prop_assert_eq!(grammar.depth(ProductionId::START), 0);

        for (id, body) in grammar.iter() {
            prop_assert_eq!(grammar.length(id), grammar.expand(id).count());
            if id != ProductionId::START {
                prop_assert!(grammar.count(id) >= 2);
                prop_assert!(grammar.depth(id) >= 1);
            }
            for child in body.iter().filter_map(Item::as_production) {
                prop_assert!(child.0 < grammar.len());
                prop_assert!(grammar.depth(child) <= grammar.depth(id) + 1);
            }
        }
    }

    /// Marks survive the round trip and never end up inside a rule.
    #[test]
    fn prop_marks_stay_at_top_level(input in marked_input()) {
        let seq = feed(&input);

        prop_assert!(repeated_digram(&seq).is_none());
        assert_utility(&seq)?;

        let grammar = seq.grammar();
        for (_, body) in grammar.iter().skip(1) {
            prop_assert!(body.iter().all(|item| !matches!(item, Item::Mark(_))));
        }

        let rebuilt: Vec<Option<u8>> = grammar
            .expand(ProductionId::START)
            .map(|item| item.as_token().copied())
            .collect();
        prop_assert_eq!(rebuilt, input);
    }

    /// Rejecting a blank token leaves the engine as it was.
    #[test]
    fn prop_blank_rejection_is_atomic(words in prop::collection::vec("[ab]{1,2}", 0..50)) {
        let mut seq = Sequitur::new();
        seq.extend(words.clone()).unwrap();
        let before = seq.grammar();

        let err = seq.push(String::new()).unwrap_err();
        prop_assert_eq!(err, crate::SequiturError::InvalidToken { position: words.len() });
        prop_assert_eq!(seq.len(), words.len());
        prop_assert_eq!(seq.grammar(), before);
    }
}

/// Bolero fuzz test: no panics on arbitrary input
#[test]
fn fuzz_no_panic() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let mut seq = Sequitur::new();
        seq.extend(input.iter().copied()).unwrap();

        let _ = seq.stats();
        let grammar = seq.grammar();
        let _ = grammar.to_string();

        let reconstructed: Vec<u8> = seq.iter().copied().collect();
        assert_eq!(reconstructed, *input);
        assert_eq!(grammar.length(ProductionId::START), input.len());
    });
}

/// Bolero fuzz test: constraints hold on inputs folded onto a tiny alphabet
#[test]
fn fuzz_constraints() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let mut seq = Sequitur::new();
        for byte in input {
            if byte % 7 == 0 {
                seq.push_mark();
            } else {
                seq.push(byte % 3).unwrap();
            }
        }

        assert!(repeated_digram(&seq).is_none());
        let refs = references(&seq);
        for (rule, record) in seq.rules.iter() {
            if rule != seq.start {
                assert!(record.usage >= 2);
                assert_eq!(refs.get(&rule).copied(), Some(record.usage));
            }
        }
    });
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_runs_are_single_occurrences() {
        let mut seq = Sequitur::new();
        seq.extend(vec![0u8; 9]).unwrap();

        assert!(repeated_digram(&seq).is_none());
        assert_eq!(seq.iter().count(), 9);
    }

    #[test]
    fn test_repeated_digram_detects_duplicates() {
        // Two copies of "ab" spliced by hand into the start rule
        let mut seq = Sequitur::new();
        let guard = seq.rules[seq.start].guard;
        let mut last = guard;
        for c in "abab".chars() {
            last = seq.insert_after(last, Value::Token(c));
        }

        assert_eq!(
            repeated_digram(&seq),
            Some((Value::Token('a'), Value::Token('b')))
        );
    }

    #[test]
    fn test_all_rules_used_twice() {
        let mut seq = Sequitur::new();
        seq.extend("abracadabra".chars()).unwrap();

        let refs = references(&seq);
        for (rule, record) in seq.rules.iter() {
            if rule != seq.start {
                assert!(record.usage >= 2, "rule only used {} times", record.usage);
                assert_eq!(refs[&rule], record.usage);
            }
        }
    }
}
