use bit_set::BitSet;
use grammar::{Assoc, Grammar, ItemId, Precedence, Set, Symbol};
use log::{debug, info, warn};
use crate::lalr::Lookaheads;
use crate::{LrMethod, Lr0States, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  Shift(usize),
  Reduce(usize),
  Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
  Shift,
  Reduce,
}

/// A conflict that was resolved by default rather than by declared
/// precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Conflict {
  ShiftReduce {
    state: usize,
    symbol: Symbol,
    resolution: Resolution,
  },
  ReduceReduce {
    state: usize,
    symbol: Symbol,
    chosen: usize,
    rejected: usize,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LrTable {
  pub method: LrMethod,
  /// `action[state][terminal]`, terminals indexed as in `terminals`.
  /// `None` is a syntax error.
  pub action: Vec<Vec<Option<Action>>>,
  /// `goto[state][nonterminal]`, nonterminals indexed as in `nonterminals`.
  pub goto: Vec<Vec<Option<usize>>>,
  pub terminals: Set<Symbol>,
  pub nonterminals: Set<String>,
  pub states: Vec<Vec<ItemId>>,
  pub conflicts: Vec<Conflict>,
}

impl LrTable {
  pub fn action_on(&self, state: usize, sym: &Symbol) -> Option<Action> {
    let t = self.terminals.get_index_of(sym)?;
    self.action.get(state)?[t]
  }

  pub fn goto_on(&self, state: usize, nonterminal: &str) -> Option<usize> {
    let n = self.nonterminals.get_index_of(nonterminal)?;
    self.goto.get(state)?[n]
  }

  pub fn sr_conflicts(&self) -> impl Iterator<Item = &Conflict> {
    self.conflicts.iter()
      .filter(|c| matches!(c, Conflict::ShiftReduce { .. }))
  }

  pub fn rr_conflicts(&self) -> impl Iterator<Item = &Conflict> {
    self.conflicts.iter()
      .filter(|c| matches!(c, Conflict::ReduceReduce { .. }))
  }
}

enum Choice {
  Shift,
  Reduce,
  Error,
}

/// Shift wins on a higher shift level, or on equal levels with a
/// right-associative rule. A nonassoc rule at the same level makes the cell
/// an error.
fn resolve(shift: Precedence, reduce: Precedence) -> Choice {
  if shift.level > reduce.level
    || (shift.level == reduce.level && reduce.assoc == Assoc::RightAssoc)
  {
    Choice::Shift
  } else if shift.level == reduce.level && reduce.assoc == Assoc::NonAssoc {
    Choice::Error
  } else {
    Choice::Reduce
  }
}

pub(crate) fn build<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
  lookaheads: Option<&Lookaheads>,
  method: LrMethod,
) -> Result<LrTable, TableError> {
  let terminals = grammar.terminals().keys().cloned().collect::<Set<_>>();
  let nonterminals = grammar.nonterminals().keys().cloned().collect::<Set<_>>();
  let end = grammar.terminal_index(&Symbol::end());
  let mut action = Vec::with_capacity(states.len());
  let mut goto = Vec::with_capacity(states.len());
  let mut conflicts = vec![];

  for (st, items) in states.states.iter().enumerate() {
    let mut row: Vec<Option<Action>> = vec![None; terminals.len()];
    // cells made errors by nonassoc stay errors
    let mut cleared = BitSet::new();

    for &id in items {
      let item = grammar.item(id);
      match &item.at_dot {
        None if item.prod == 0 => {
          if let Some(end) = end {
            if let Some(Action::Reduce(r)) = row[end] {
              record_rr(&mut conflicts, st, Symbol::end(), 0, r);
            }
            row[end] = Some(Action::Accept);
          }
        }
        None => {
          let prod = grammar.production(item.prod);
          let laheads = reduce_lookaheads(grammar, st, item.prod, lookaheads);
          for a in laheads.iter() {
            if cleared.contains(a) {
              continue;
            }
            let sym = &terminals[a];
            match row[a] {
              None => row[a] = Some(Action::Reduce(item.prod)),
              Some(Action::Shift(_)) => {
                let sprec = grammar.precedence().get(sym).copied().unwrap_or_default();
                match resolve(sprec, prod.prec) {
                  Choice::Reduce => {
                    row[a] = Some(Action::Reduce(item.prod));
                    if sprec.level == 0 && prod.prec.level == 0 {
                      record_sr(&mut conflicts, st, sym, Resolution::Reduce);
                    }
                  }
                  Choice::Shift => {
                    if sprec.level == 0 && prod.prec.level == 0 {
                      record_sr(&mut conflicts, st, sym, Resolution::Shift);
                    }
                  }
                  Choice::Error => {
                    row[a] = None;
                    cleared.insert(a);
                  }
                }
              }
              Some(Action::Reduce(old)) => {
                let (chosen, rejected) = if old <= item.prod {
                  (old, item.prod)
                } else {
                  (item.prod, old)
                };
                row[a] = Some(Action::Reduce(chosen));
                record_rr(&mut conflicts, st, sym.clone(), chosen, rejected);
              }
              Some(Action::Accept) => {
                record_rr(&mut conflicts, st, sym.clone(), 0, item.prod);
              }
            }
          }
        }
        Some(sym) if sym.is_terminal() => {
          let j = match states.goto(st, sym) {
            Some(j) => j,
            None => continue,
          };
          let a = match terminals.get_index_of(sym) {
            Some(a) => a,
            None => continue,
          };
          if cleared.contains(a) {
            continue;
          }
          match row[a] {
            None => row[a] = Some(Action::Shift(j)),
            Some(Action::Shift(k)) if k == j => {}
            Some(Action::Shift(_)) => {
              return Err(TableError::ShiftShiftConflict {
                state: st,
                symbol: sym.clone(),
              });
            }
            Some(Action::Reduce(r)) => {
              let sprec = grammar.precedence().get(sym).copied().unwrap_or_default();
              let rprec = grammar.production(r).prec;
              match resolve(sprec, rprec) {
                Choice::Shift => {
                  row[a] = Some(Action::Shift(j));
                  if sprec.level == 0 && rprec.level == 0 {
                    record_sr(&mut conflicts, st, sym, Resolution::Shift);
                  }
                }
                Choice::Reduce => {
                  if sprec.level == 0 && rprec.level == 0 {
                    record_sr(&mut conflicts, st, sym, Resolution::Reduce);
                  }
                }
                Choice::Error => {
                  row[a] = None;
                  cleared.insert(a);
                }
              }
            }
            Some(Action::Accept) => {}
          }
        }
        Some(_) => {}
      }
    }

    let mut goto_row = vec![None; nonterminals.len()];
    for (sym, &j) in &states.transitions[st] {
      if let Symbol::Nonterminal(n) = sym {
        if let Some(ix) = nonterminals.get_index_of(n) {
          goto_row[ix] = Some(j);
        }
      }
    }

    debug!("state {}: {} actions, {} gotos",
      st,
      row.iter().filter(|a| a.is_some()).count(),
      goto_row.iter().filter(|g| g.is_some()).count());
    action.push(row);
    goto.push(goto_row);
  }

  let table = LrTable {
    method,
    action,
    goto,
    terminals,
    nonterminals,
    states: states.states.clone(),
    conflicts,
  };

  let sr = table.sr_conflicts().count();
  let rr = table.rr_conflicts().count();
  if sr > 0 {
    warn!("{} shift/reduce conflict{}", sr, if sr == 1 { "" } else { "s" });
  }
  if rr > 0 {
    warn!("{} reduce/reduce conflict{}", rr, if rr == 1 { "" } else { "s" });
  }
  info!("{:?} table: {} states", method, table.action.len());

  Ok(table)
}

fn reduce_lookaheads<A>(
  grammar: &Grammar<A>,
  state: usize,
  prod: usize,
  lookaheads: Option<&Lookaheads>,
) -> BitSet {
  match lookaheads {
    Some(la) => la.get(state, prod).cloned().unwrap_or_default(),
    None => {
      let name = &grammar.production(prod).name;
      grammar.follow()
        .get(name)
        .map(|follow| {
          follow.iter()
            .filter_map(|sym| grammar.terminal_index(sym))
            .collect()
        })
        .unwrap_or_default()
    }
  }
}

fn record_sr(
  conflicts: &mut Vec<Conflict>,
  state: usize,
  symbol: &Symbol,
  resolution: Resolution,
) {
  info!("shift/reduce conflict for {} in state {} resolved as {}",
    symbol,
    state,
    match resolution {
      Resolution::Shift => "shift",
      Resolution::Reduce => "reduce",
    });
  conflicts.push(Conflict::ShiftReduce {
    state,
    symbol: symbol.clone(),
    resolution,
  });
}

fn record_rr(
  conflicts: &mut Vec<Conflict>,
  state: usize,
  symbol: Symbol,
  chosen: usize,
  rejected: usize,
) {
  info!("reduce/reduce conflict for {} in state {} resolved using rule {}",
    symbol, state, chosen);
  conflicts.push(Conflict::ReduceReduce {
    state,
    symbol,
    chosen,
    rejected,
  });
}
