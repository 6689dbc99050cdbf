use grammar::{Grammar, GrammarError, Symbol};
use thiserror::Error;

pub mod lalr;
pub mod lr0;
mod report;
mod tables;

pub use self::lr0::{Automaton, Lr0States};
pub use self::report::Report;
pub use self::tables::{Action, Conflict, LrTable, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LrMethod {
  Lalr,
  Slr,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error("shift/shift conflict in state {state} on {symbol}")]
  ShiftShiftConflict {
    state: usize,
    symbol: Symbol,
  },
}

/// Builds the ACTION/GOTO table of `grammar`.
///
/// Sets the default start symbol if none was chosen, then builds the LR
/// items, FIRST/FOLLOW sets, the LR(0) automaton and, for LALR, the
/// lookahead sets.
pub fn build<A>(
  grammar: &mut Grammar<A>,
  method: LrMethod,
) -> Result<LrTable, TableError> {
  if grammar.start().is_none() {
    grammar.set_start(None)?;
  }
  let start = grammar.start().map(str::to_owned);
  grammar.build_lritems();
  grammar.compute_first()?;
  grammar.compute_follow(start.as_deref())?;
  grammar.warn_unused();

  let grammar = &*grammar;
  let states = Automaton::new(grammar).build_states();
  let lookaheads = match method {
    LrMethod::Lalr => Some(lalr::compute(grammar, &states)),
    LrMethod::Slr => None,
  };
  tables::build(grammar, &states, lookaheads.as_ref(), method)
}
