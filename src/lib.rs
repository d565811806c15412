//! # Sequitur - online context-free grammar induction
//!
//! An implementation of the Sequitur algorithm: given a sequence of
//! terminal symbols presented one at a time, it incrementally builds a
//! context-free grammar whose start rule derives exactly that sequence,
//! factoring out every repeated adjacent pair (digram) into its own
//! rule as it goes.
//!
//! The construction enforces two invariants after every symbol:
//! 1. **Digram Uniqueness** - no digram appears more than once in the
//!    grammar, except as the tolerated overlap in a run of three
//!    identical symbols.
//! 2. **Rule Utility** - every rule but the start rule is used at least
//!    twice; a rule that drops to a single use is inlined back into its
//!    one remaining call site.
//!
//! ## Example
//!
//! ```
//! use sequitur_rs::Sequitur;
//!
//! let mut seq = Sequitur::new();
//! seq.extend("abcabcabc".chars());
//!
//! // Expanding the grammar reconstructs exactly the input sequence.
//! let reconstructed: String = seq.iter().collect();
//! assert_eq!(reconstructed, "abcabcabc");
//!
//! println!("Created {} rules", seq.rule_ids().count());
//! ```
//!
//! ## Performance
//!
//! `push` is O(1) amortized per symbol; grammar size grows
//! sub-linearly with input size on repetitive data. Symbols live in a
//! [`slotmap`] arena addressed by generational keys.

mod digram;
mod grammar;
mod id_gen;
mod iter;
mod rule;
mod sequitur;
mod symbol;

#[cfg(test)]
mod tests;

pub use iter::{RuleIter, SequiturIter, SymbolKindView, SymbolView};
pub use rule::RuleId;
pub use sequitur::{CompressionStats, Sequitur};
