use crate::grammar::Grammar;
use crate::rule::RuleId;
use crate::symbol::{SymbolKey, SymbolKind};
use std::fmt;

/// Recursively expands a rule's body back to terminals, in order.
/// `seq.iter().collect()` always reproduces exactly what was pushed.
///
/// Walks with an explicit stack of "where to resume in the enclosing
/// rule" rather than recursion, since nesting depth is driven by input
/// length and a recursive walk would blow the native call stack on
/// long, deeply-factored runs.
pub struct SequiturIter<'a, T> {
    grammar: &'a Grammar<T>,
    current: Option<SymbolKey>,
    stack: Vec<SymbolKey>,
}

impl<'a, T: Clone + PartialEq + fmt::Display> SequiturIter<'a, T> {
    pub(crate) fn new(grammar: &'a Grammar<T>, start_rule: RuleId) -> Self {
        let guard = grammar.rule_guard(start_rule);
        let first = grammar.symbols[guard].next;
        let mut stack = Vec::new();
        let current = Self::resolve_forward(grammar, Some(first), &mut stack);
        Self {
            grammar,
            current,
            stack,
        }
    }

    /// Advances from `key` until it lands on a terminal, descending
    /// into non-terminals and popping back out at guards. `None` once
    /// the walk returns past the top of the stack.
    fn resolve_forward(
        grammar: &Grammar<T>,
        key: Option<SymbolKey>,
        stack: &mut Vec<SymbolKey>,
    ) -> Option<SymbolKey> {
        let mut key = key?;
        loop {
            match &grammar.symbols[key].kind {
                SymbolKind::Terminal(_) => return Some(key),
                SymbolKind::NonTerminal(rule_id) => {
                    stack.push(grammar.symbols[key].next);
                    let guard = grammar.rule_guard(*rule_id);
                    key = grammar.symbols[guard].next;
                }
                SymbolKind::Guard(_) => {
                    key = stack.pop()?;
                }
            }
        }
    }
}

impl<'a, T: Clone + PartialEq + fmt::Display> Iterator for SequiturIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let key = self.current?;
        let value = match &self.grammar.symbols[key].kind {
            SymbolKind::Terminal(v) => v.clone(),
            _ => unreachable!("resolve_forward only ever stops on a terminal"),
        };
        let next = self.grammar.symbols[key].next;
        self.current = Self::resolve_forward(self.grammar, Some(next), &mut self.stack);
        Some(value)
    }
}

/// What kind of symbol a [`SymbolView`] wraps, per the external
/// interface's `symbol_kind` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKindView {
    Terminal,
    NonTerminal,
}

/// A read-only handle to one symbol in a rule's body, as yielded by
/// [`RuleIter`]. Does not descend into non-terminals — that's left to
/// the caller, one level of structure at a time, for `iterate`/
/// `symbol_kind`/`terminal_of`/`rule_of` callers such as a renderer.
pub struct SymbolView<'a, T> {
    grammar: &'a Grammar<T>,
    key: SymbolKey,
}

impl<'a, T: Clone + PartialEq + fmt::Display> SymbolView<'a, T> {
    pub fn kind(&self) -> SymbolKindView {
        match &self.grammar.symbols[self.key].kind {
            SymbolKind::Terminal(_) => SymbolKindView::Terminal,
            SymbolKind::NonTerminal(_) => SymbolKindView::NonTerminal,
            SymbolKind::Guard(_) => unreachable!("RuleIter never yields a guard"),
        }
    }

    /// The terminal value, if this symbol is a terminal.
    pub fn terminal(&self) -> Option<&T> {
        match &self.grammar.symbols[self.key].kind {
            SymbolKind::Terminal(v) => Some(v),
            _ => None,
        }
    }

    /// The referenced rule, if this symbol is a non-terminal.
    pub fn rule(&self) -> Option<RuleId> {
        match &self.grammar.symbols[self.key].kind {
            SymbolKind::NonTerminal(id) => Some(*id),
            _ => None,
        }
    }
}

/// Shallow iteration over one rule's body, in order, excluding the
/// guard. Non-terminals are yielded as a handle naming the rule they
/// reference rather than expanded; use [`SequiturIter`] for a full
/// terminal-level expansion.
pub struct RuleIter<'a, T> {
    grammar: &'a Grammar<T>,
    guard: SymbolKey,
    current: SymbolKey,
}

impl<'a, T: Clone + PartialEq + fmt::Display> RuleIter<'a, T> {
    pub(crate) fn new(grammar: &'a Grammar<T>, rule: RuleId) -> Self {
        let guard = grammar.rule_guard(rule);
        Self {
            grammar,
            guard,
            current: grammar.symbols[guard].next,
        }
    }
}

impl<'a, T: Clone + PartialEq + fmt::Display> Iterator for RuleIter<'a, T> {
    type Item = SymbolView<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.guard {
            return None;
        }
        let key = self.current;
        self.current = self.grammar.symbols[key].next;
        Some(SymbolView {
            grammar: self.grammar,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::sequitur::Sequitur;

    #[test]
    fn full_expansion_round_trips() {
        let mut seq = Sequitur::new();
        seq.extend("abcabcabc".chars());
        let out: String = seq.iter().collect();
        assert_eq!(out, "abcabcabc");
    }

    #[test]
    fn full_expansion_of_empty_is_empty() {
        let seq = Sequitur::<char>::new();
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn rule_iter_is_shallow() {
        let mut seq = Sequitur::new();
        seq.extend("abcabcabc".chars());
        let s0 = seq.start_rule();
        let views: Vec<_> = seq.iterate(s0).collect();
        // S0 = A A A: three non-terminals, no terminals at this level.
        assert_eq!(views.len(), 3);
        for v in &views {
            assert!(v.terminal().is_none());
            assert!(v.rule().is_some());
        }
    }

    #[test]
    fn rule_iter_exposes_terminals_of_inner_rule() {
        let mut seq = Sequitur::new();
        seq.extend("abcabcabc".chars());
        let s0 = seq.start_rule();
        let inner_rule = seq.iterate(s0).next().unwrap().rule().unwrap();
        let body: Vec<char> = seq
            .iterate(inner_rule)
            .map(|v| *v.terminal().unwrap())
            .collect();
        assert_eq!(body, vec!['a', 'b', 'c']);
    }
}
