use crate::digram::DigramIndex;
use crate::id_gen::IdGenerator;
use crate::rule::{RuleId, RuleMeta};
use crate::symbol::{digram_fingerprint, SymbolKey, SymbolKind, SymbolNode};
use ahash::AHashMap;
use slotmap::SlotMap;
use std::fmt;

/// The result of offering a symbol's digram to the index: either it was
/// simply recorded (no match, or a tolerated `xxx` overlap), or it
/// matched an existing occurrence and was processed into a rule
/// reference, in which case checking this digram's right-hand neighbour
/// too would be redundant (see `substitute`).
enum CheckOutcome {
    Recorded,
    Processed,
}

/// Owns the symbol arena, the rule table, the digram index, and the rule
/// id allocator. Every operation that could affect Digram Uniqueness
/// (I1) or Rule Utility (I2) is mediated here.
pub(crate) struct Grammar<T> {
    pub(crate) symbols: SlotMap<SymbolKey, SymbolNode<T>>,
    digrams: DigramIndex,
    rules: AHashMap<RuleId, RuleMeta>,
    id_gen: IdGenerator,
}

impl<T: Clone + PartialEq + fmt::Display> Grammar<T> {
    pub(crate) fn new() -> Self {
        Self {
            symbols: SlotMap::new(),
            digrams: DigramIndex::new(),
            rules: AHashMap::new(),
            id_gen: IdGenerator::new(),
        }
    }

    // -- rule table ---------------------------------------------------

    /// Allocates a fresh rule with an empty body (its guard's self-loop)
    /// and a reference count of zero.
    pub(crate) fn create_empty_rule(&mut self) -> RuleId {
        let rule_id = RuleId::from_u32(self.id_gen.get());
        let guard = self.symbols.insert(SymbolNode::new(
            SymbolKind::Guard(rule_id),
            SymbolKey::default(),
            SymbolKey::default(),
        ));
        self.symbols[guard].prev = guard;
        self.symbols[guard].next = guard;
        self.rules.insert(rule_id, RuleMeta::new(guard));
        rule_id
    }

    pub(crate) fn rule_guard(&self, rule_id: RuleId) -> SymbolKey {
        self.rules[&rule_id].guard
    }

    pub(crate) fn reference_count(&self, rule_id: RuleId) -> u32 {
        self.rules[&rule_id].reference_count
    }

    pub(crate) fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.keys().copied()
    }

    fn inc_ref(&mut self, rule_id: RuleId) {
        self.rules.get_mut(&rule_id).unwrap().reference_count += 1;
    }

    fn dec_ref(&mut self, rule_id: RuleId) {
        let meta = self.rules.get_mut(&rule_id).unwrap();
        debug_assert!(meta.reference_count > 0, "reference count underflow");
        meta.reference_count -= 1;
    }

    // -- symbol-level primitives ---------------------------------------

    pub(crate) fn is_guard(&self, key: SymbolKey) -> bool {
        self.symbols[key].kind.is_guard()
    }

    fn string_value(&self, key: SymbolKey) -> String {
        self.symbols[key].kind.string_value()
    }

    fn digram_key(&self, left: SymbolKey) -> String {
        let right = self.symbols[left].next;
        digram_fingerprint(&self.string_value(left), &self.string_value(right))
    }

    fn remove_digram_at(&mut self, left: SymbolKey) {
        if self.is_guard(left) {
            return;
        }
        let right = self.symbols[left].next;
        if self.is_guard(right) {
            return;
        }
        let key = self.digram_key(left);
        self.digrams.remove_if(&key, left);
    }

    fn symbols_form_triple(&self, a: SymbolKey, b: SymbolKey, c: SymbolKey) -> bool {
        if self.is_guard(a) || self.is_guard(b) || self.is_guard(c) {
            return false;
        }
        self.symbols[a].kind.value_eq(&self.symbols[b].kind)
            && self.symbols[b].kind.value_eq(&self.symbols[c].kind)
    }

    /// Splices `left.next = right` / `right.prev = left`.
    ///
    /// Before linking: the old digram anchored at `left` (if any) is
    /// scrubbed from the index; if `right` currently sits at the centre
    /// of an `xxx` triple (using its *current* neighbours, before this
    /// relink), the digram starting at `right` is (re-)registered, since
    /// the tolerated-overlap rule only ever indexes that second half;
    /// symmetrically, if `left` currently sits at the centre of a triple
    /// with its *old* successor, the digram ending at `left` (starting
    /// at `left.prev`) is restored, since deleting the old successor's
    /// digram would otherwise leave it forgotten.
    pub(crate) fn join(&mut self, left: SymbolKey, right: SymbolKey) {
        self.remove_digram_at(left);

        if !self.is_guard(right) {
            let r_prev = self.symbols[right].prev;
            let r_next = self.symbols[right].next;
            if self.symbols_form_triple(r_prev, right, r_next) {
                let key = self.digram_key(right);
                self.digrams.insert(key, right);
            }
        }

        if !self.is_guard(left) {
            let l_prev = self.symbols[left].prev;
            let l_next_old = self.symbols[left].next;
            if self.symbols_form_triple(l_prev, left, l_next_old) && !self.is_guard(l_prev) {
                let key = self.digram_key(l_prev);
                self.digrams.insert(key, l_prev);
            }
        }

        self.symbols[left].next = right;
        self.symbols[right].prev = left;
    }

    /// Inserts a fresh symbol of `kind` directly after `anchor`, returning
    /// its key.
    pub(crate) fn insert_after(&mut self, anchor: SymbolKey, kind: SymbolKind<T>) -> SymbolKey {
        let old_next = self.symbols[anchor].next;
        let new_key = self.symbols.insert(SymbolNode::new(kind, anchor, old_next));
        self.join(anchor, new_key);
        self.join(new_key, old_next);
        new_key
    }

    /// Removes `key` from its list, scrubbing its digram entry and
    /// decrementing the reference count of the rule it names, if any.
    /// Must not be called on a guard.
    fn delete(&mut self, key: SymbolKey) {
        debug_assert!(!self.is_guard(key), "cannot delete a guard symbol");
        let prev = self.symbols[key].prev;
        let next = self.symbols[key].next;

        self.remove_digram_at(key);
        if let Some(rule_id) = self.symbols[key].kind.rule_id() {
            self.dec_ref(rule_id);
        }

        self.join(prev, next);
        self.symbols.remove(key);
    }

    /// Offers the digram `(left, left.next)` to the index. Returns
    /// whether it was freshly recorded or matched and processed.
    fn check(&mut self, left: SymbolKey) -> CheckOutcome {
        if self.is_guard(left) {
            return CheckOutcome::Recorded;
        }
        let right = self.symbols[left].next;
        if self.is_guard(right) {
            return CheckOutcome::Recorded;
        }

        let key = self.digram_key(left);
        match self.digrams.lookup(&key) {
            None => {
                self.digrams.insert(key, left);
                CheckOutcome::Recorded
            }
            Some(m) => {
                if m == left {
                    return CheckOutcome::Recorded;
                }
                debug_assert!(
                    self.symbols.contains_key(m),
                    "digram index referenced a removed symbol"
                );
                let m_next = self.symbols[m].next;
                if m_next == left || m == right {
                    // The tolerated xxx overlap: this digram and the
                    // stored one share a symbol rather than being two
                    // independent occurrences. No action needed — the
                    // existing entry already names a real occurrence of
                    // this digram and must be left in place. Overwriting
                    // it here would make every subsequent digram in a
                    // long run of identical symbols look like a fresh
                    // overlap forever, and the run would never factor.
                    CheckOutcome::Recorded
                } else {
                    self.process_match(left, m);
                    CheckOutcome::Processed
                }
            }
        }
    }

    /// Replaces the digram `(left, left.next)` with a new non-terminal
    /// referencing `rule_id`, then re-checks the surrounding context.
    fn substitute(&mut self, left: SymbolKey, rule_id: RuleId) -> SymbolKey {
        let right = self.symbols[left].next;
        debug_assert!(!self.is_guard(left) && !self.is_guard(right));

        let prev = self.symbols[left].prev;
        let next = self.symbols[right].next;

        self.delete(left);
        self.delete(right);

        let new_key = self.insert_after(prev, SymbolKind::NonTerminal(rule_id));
        self.inc_ref(rule_id);

        // Only check the right-hand boundary if the left check didn't
        // already trigger processing that could have consumed it.
        if let CheckOutcome::Recorded = self.check(prev) {
            self.check(new_key);
        }

        new_key
    }

    /// True if `m` and `m.next` are the entire two-symbol body of some
    /// rule, i.e. this digram already has its own dedicated rule.
    fn complete_rule_at(&self, m: SymbolKey) -> Option<RuleId> {
        let prev = self.symbols[m].prev;
        if !self.is_guard(prev) {
            return None;
        }
        let next = self.symbols[m].next;
        let next_next = self.symbols[next].next;
        if !self.is_guard(next_next) {
            return None;
        }
        self.symbols[prev].kind.rule_id()
    }

    /// Builds a fresh rule whose two-symbol body is a copy of the digram
    /// at `left`, and registers that body's own digram in the index.
    fn create_rule_from_digram(&mut self, left: SymbolKey) -> RuleId {
        let right = self.symbols[left].next;
        let left_kind = self.symbols[left].kind.clone_value();
        let right_kind = self.symbols[right].kind.clone_value();

        let rule_id = self.create_empty_rule();
        let guard = self.rule_guard(rule_id);

        let first = self.insert_after(guard, left_kind);
        let second = self.insert_after(first, right_kind);

        if let Some(id) = self.symbols[first].kind.rule_id() {
            self.inc_ref(id);
        }
        if let Some(id) = self.symbols[second].kind.rule_id() {
            self.inc_ref(id);
        }

        let key = self.digram_key(first);
        self.digrams.insert(key, first);

        rule_id
    }

    /// Handles a confirmed digram match at `(left, matched)`: either
    /// reuse an existing rule whose whole body is this digram, or mint a
    /// new rule for it. Either way, restores Rule Utility afterwards.
    fn process_match(&mut self, left: SymbolKey, matched: SymbolKey) {
        if let Some(existing_rule) = self.complete_rule_at(matched) {
            self.substitute(left, existing_rule);
            self.restore_rule_utility(existing_rule);
        } else {
            let rule_id = self.create_rule_from_digram(left);
            // The older, disjoint occurrence first, then this one.
            self.substitute(matched, rule_id);
            self.substitute(left, rule_id);
            self.restore_rule_utility(rule_id);
        }
    }

    /// After a substitution, a rule may have dropped to single use
    /// because its only remaining reference is the copy embedded in the
    /// new/reused rule's own body. Inline (expand) any such symbol.
    fn restore_rule_utility(&mut self, rule_id: RuleId) {
        let guard = self.rule_guard(rule_id);
        let first = self.symbols[guard].next;
        let second = self.symbols[first].next;
        self.expand_if_singly_used(first);
        self.expand_if_singly_used(second);
    }

    fn expand_if_singly_used(&mut self, symbol: SymbolKey) {
        if self.is_guard(symbol) {
            return;
        }
        if let Some(rule_id) = self.symbols[symbol].kind.rule_id() {
            if self.reference_count(rule_id) == 1 {
                self.expand(symbol);
            }
        }
    }

    /// Replaces `symbol` (a non-terminal whose rule is used exactly
    /// once) by its rule's entire body, then dissolves that rule.
    fn expand(&mut self, symbol: SymbolKey) {
        let rule_id = self.symbols[symbol]
            .kind
            .rule_id()
            .expect("expand() requires a non-terminal symbol");
        debug_assert_eq!(
            self.reference_count(rule_id),
            1,
            "expand() requires a singly-used rule"
        );

        let prev = self.symbols[symbol].prev;
        let next = self.symbols[symbol].next;

        if !self.is_guard(prev) {
            self.remove_digram_at(prev);
        }
        self.remove_digram_at(symbol);

        let guard = self.rule_guard(rule_id);
        let first = self.symbols[guard].next;
        let last = self.symbols[guard].prev;
        debug_assert_ne!(first, guard, "expand() target rule must not be empty");

        self.rules.remove(&rule_id);
        self.symbols.remove(guard);
        self.symbols.remove(symbol);
        self.id_gen.free(rule_id.as_u32());

        self.symbols[prev].next = first;
        self.symbols[first].prev = prev;
        self.symbols[last].next = next;
        self.symbols[next].prev = last;

        if !self.is_guard(prev) {
            self.check(prev);
        }
        self.check(last);
    }

    // -- driver entry point ---------------------------------------------

    /// Called once a new symbol has a real predecessor: offers the
    /// digram ending at the new symbol to the index.
    pub(crate) fn on_symbol_linked(&mut self, left_of_new: SymbolKey) {
        self.check(left_of_new);
    }

    // -- test-only introspection -----------------------------------------

    #[cfg(test)]
    pub(crate) fn digram_entries(&self) -> impl Iterator<Item = (&str, SymbolKey)> {
        self.digrams.entries()
    }

    #[cfg(test)]
    pub(crate) fn digram_key_at(&self, left: SymbolKey) -> String {
        self.digram_key(left)
    }
}
