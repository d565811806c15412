use crate::rule::RuleId;
use slotmap::DefaultKey;
use std::fmt;

/// Key into the symbol arena. Every symbol, including guards, lives here.
pub(crate) type SymbolKey = DefaultKey;

/// Separator spliced between the two halves of a digram fingerprint. A
/// control character that can never occur in a `Display` rendering of an
/// ordinary terminal value or in the `tN`/`rN`/`gN` tags below.
const SEP: char = '\u{1}';

/// A symbol is a terminal value, a reference to another rule, or the
/// guard (sentinel) of a rule's own body. Replaces the inheritance
/// hierarchy a systems-language port would use with a tagged union.
#[derive(Debug, Clone)]
pub(crate) enum SymbolKind<T> {
    Terminal(T),
    NonTerminal(RuleId),
    Guard(RuleId),
}

impl<T> SymbolKind<T> {
    pub(crate) fn is_guard(&self) -> bool {
        matches!(self, SymbolKind::Guard(_))
    }

    pub(crate) fn rule_id(&self) -> Option<RuleId> {
        match self {
            SymbolKind::NonTerminal(id) | SymbolKind::Guard(id) => Some(*id),
            SymbolKind::Terminal(_) => None,
        }
    }
}

impl<T: Clone> SymbolKind<T> {
    pub(crate) fn clone_value(&self) -> SymbolKind<T> {
        match self {
            SymbolKind::Terminal(v) => SymbolKind::Terminal(v.clone()),
            SymbolKind::NonTerminal(id) => SymbolKind::NonTerminal(*id),
            SymbolKind::Guard(id) => SymbolKind::Guard(*id),
        }
    }
}

impl<T: PartialEq> SymbolKind<T> {
    /// Value equality, ignoring which symbol instance this is: two
    /// terminals are equal if their values are equal, two non-terminals
    /// are equal if they reference the same rule. A guard is never equal
    /// to anything; it never participates in a digram.
    pub(crate) fn value_eq(&self, other: &SymbolKind<T>) -> bool {
        match (self, other) {
            (SymbolKind::Terminal(a), SymbolKind::Terminal(b)) => a == b,
            (SymbolKind::NonTerminal(a), SymbolKind::NonTerminal(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: fmt::Display> SymbolKind<T> {
    /// The textual fingerprint used to build digram keys.
    pub(crate) fn string_value(&self) -> String {
        match self {
            SymbolKind::Terminal(v) => format!("t{}", v),
            SymbolKind::NonTerminal(id) => format!("r{}", id.as_u32()),
            SymbolKind::Guard(id) => format!("g{}", id.as_u32()),
        }
    }
}

/// A node in the doubly-linked list of symbols. `prev`/`next` are always
/// valid keys: every rule's body, including an empty one, is a circular
/// list closed by its guard, so there is no "no successor" case to model
/// with `Option`.
#[derive(Debug)]
pub(crate) struct SymbolNode<T> {
    pub(crate) kind: SymbolKind<T>,
    pub(crate) prev: SymbolKey,
    pub(crate) next: SymbolKey,
}

impl<T> SymbolNode<T> {
    pub(crate) fn new(kind: SymbolKind<T>, prev: SymbolKey, next: SymbolKey) -> Self {
        Self { kind, prev, next }
    }
}

/// Joins the two `string_value`s of a digram into its index fingerprint.
pub(crate) fn digram_fingerprint(left: &str, right: &str) -> String {
    let mut key = String::with_capacity(left.len() + right.len() + 1);
    key.push_str(left);
    key.push(SEP);
    key.push_str(right);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_nonterminal_fingerprints_never_collide() {
        let t: SymbolKind<char> = SymbolKind::Terminal('5');
        let n: SymbolKind<char> = SymbolKind::NonTerminal(RuleId::from_u32(5));
        assert_ne!(t.string_value(), n.string_value());
    }

    #[test]
    fn value_eq_compares_by_value_not_identity() {
        let a: SymbolKind<char> = SymbolKind::Terminal('x');
        let b: SymbolKind<char> = SymbolKind::Terminal('x');
        let c: SymbolKind<char> = SymbolKind::Terminal('y');
        assert!(a.value_eq(&b));
        assert!(!a.value_eq(&c));
    }

    #[test]
    fn guard_never_value_equal() {
        let g1: SymbolKind<char> = SymbolKind::Guard(RuleId::from_u32(0));
        let g2: SymbolKind<char> = SymbolKind::Guard(RuleId::from_u32(0));
        assert!(!g1.value_eq(&g2));
    }

    #[test]
    fn digram_fingerprint_is_unambiguous() {
        let k1 = digram_fingerprint("ta", "tb");
        let k2 = digram_fingerprint("t", "atb");
        assert_ne!(k1, k2, "the separator must prevent this kind of collision");
    }
}
