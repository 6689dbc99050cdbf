//! LALR(1) lookaheads by the DeRemer-Pennello relations over nonterminal
//! transitions of the LR(0) automaton.
//!
//! Terminal sets are `BitSet`s of indices into `Grammar::terminals`.

use bit_set::BitSet;
use bitvec::prelude::*;
use fnv::FnvHashMap;
use grammar::{Grammar, Map, Set, Symbol};
use crate::Lr0States;

/// A transition `(state, nonterminal)` of the LR(0) automaton.
pub type Transition = (usize, String);

/// Lookahead terminals of each reduction, keyed by `(state, production)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookaheads {
  sets: FnvHashMap<(usize, usize), BitSet>,
}

impl Lookaheads {
  pub fn get(&self, state: usize, prod: usize) -> Option<&BitSet> {
    self.sets.get(&(state, prod))
  }

  pub fn len(&self) -> usize {
    self.sets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sets.is_empty()
  }
}

pub fn compute<A>(grammar: &Grammar<A>, states: &Lr0States) -> Lookaheads {
  let nullable = nullable_nonterminals(grammar);
  let trans = nonterminal_transitions(grammar, states);
  let read = read_sets(grammar, states, &trans, &nullable);
  let (lookback, includes) =
    lookback_and_includes(grammar, states, &trans, &nullable);
  let follow = follow_sets(&includes, read);
  attach_lookaheads(&lookback, &follow)
}

/// Nonterminals that derive the empty string.
pub fn nullable_nonterminals<A>(grammar: &Grammar<A>) -> Set<String> {
  let nts = grammar.nonterminals();
  let mut nullable = bitvec![0; nts.len()];
  loop {
    let mut changed = false;
    for prod in &grammar.productions()[1..] {
      let ix = match nts.get_index_of(&prod.name) {
        Some(ix) => ix,
        None => continue,
      };
      if nullable[ix] {
        continue;
      }
      let all_nullable = prod.symbols.iter().all(|sym| match sym {
        Symbol::Nonterminal(n) => {
          nts.get_index_of(n).map_or(false, |j| nullable[j])
        }
        _ => false,
      });
      if all_nullable {
        nullable.set(ix, true);
        changed = true;
      }
    }
    if !changed {
      break;
    }
  }

  nullable.iter_ones()
    .filter_map(|i| nts.get_index(i).map(|(n, _)| n.clone()))
    .collect()
}

/// Every `(state, N)` such that some item of `state` has `N` after its dot,
/// in state order.
pub fn nonterminal_transitions<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
) -> Vec<Transition> {
  let mut trans = Set::default();
  for (state, items) in states.states.iter().enumerate() {
    for &id in items {
      if let Some(Symbol::Nonterminal(n)) = &grammar.item(id).at_dot {
        trans.insert((state, n.clone()));
      }
    }
  }
  trans.into_iter().collect()
}

/// Terminals directly read after the transition: the terminals after a dot
/// in its goto state, plus `$end` for the start transition out of state 0.
pub fn dr_relation<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
  (state, n): &Transition,
) -> BitSet {
  let mut terms = BitSet::new();
  if let Some(g) = states.goto(*state, &Symbol::Nonterminal(n.clone())) {
    for &id in &states.states[g] {
      match &grammar.item(id).at_dot {
        Some(sym) if sym.is_terminal() => {
          if let Some(ix) = grammar.terminal_index(sym) {
            terms.insert(ix);
          }
        }
        _ => {}
      }
    }
  }
  if *state == 0 && grammar.start() == Some(n.as_str()) {
    if let Some(ix) = grammar.terminal_index(&Symbol::end()) {
      terms.insert(ix);
    }
  }
  terms
}

/// Transitions read through nullable nonterminals right after this one.
pub fn reads_relation<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
  (state, n): &Transition,
  nullable: &Set<String>,
  index: &Map<Transition, usize>,
) -> Vec<usize> {
  let mut rel = vec![];
  if let Some(g) = states.goto(*state, &Symbol::Nonterminal(n.clone())) {
    for &id in &states.states[g] {
      if let Some(Symbol::Nonterminal(c)) = &grammar.item(id).at_dot {
        if nullable.contains(c) {
          if let Some(&t) = index.get(&(g, c.clone())) {
            rel.push(t);
          }
        }
      }
    }
  }
  rel
}

pub fn read_sets<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
  trans: &[Transition],
  nullable: &Set<String>,
) -> Vec<BitSet> {
  let index = transition_index(trans);
  let dr = trans.iter()
    .map(|t| dr_relation(grammar, states, t))
    .collect::<Vec<_>>();
  let reads = trans.iter()
    .map(|t| reads_relation(grammar, states, t, nullable, &index))
    .collect::<Vec<_>>();
  digraph(&reads, dr)
}

/// For each transition `(p, A)`: the reductions `(q, A -> w)` where `q` is
/// reached from `p` by reading `w` (lookback), and the transitions `(p', B)`
/// whose follow set includes the follow set of `(p, A)` (includes, indexed
/// by the including transition).
pub fn lookback_and_includes<A>(
  grammar: &Grammar<A>,
  states: &Lr0States,
  trans: &[Transition],
  nullable: &Set<String>,
) -> (Vec<Vec<(usize, usize)>>, Vec<Vec<usize>>) {
  let index = transition_index(trans);
  let mut lookback = vec![vec![]; trans.len()];
  let mut includes = vec![vec![]; trans.len()];

  for (ti, (state, n)) in trans.iter().enumerate() {
    for &id in &states.states[*state] {
      let item = grammar.item(id);
      let prod = grammar.production(item.prod);
      if item.dot != 0 || prod.name != *n {
        continue;
      }

      let mut j = Some(*state);
      for (k, sym) in prod.symbols.iter().enumerate() {
        let cur = match j {
          Some(cur) => cur,
          None => break,
        };
        if let Symbol::Nonterminal(b) = sym {
          if let Some(&tj) = index.get(&(cur, b.clone())) {
            let rest_nullable = prod.symbols[k + 1..].iter().all(|s| {
              matches!(s, Symbol::Nonterminal(c) if nullable.contains(c))
            });
            if rest_nullable && !includes[tj].contains(&ti) {
              includes[tj].push(ti);
            }
          }
        }
        j = states.goto(cur, sym);
      }

      if let Some(j) = j {
        lookback[ti].push((j, item.prod));
      }
    }
  }

  (lookback, includes)
}

pub fn follow_sets(includes: &[Vec<usize>], read: Vec<BitSet>) -> Vec<BitSet> {
  digraph(includes, read)
}

pub fn attach_lookaheads(
  lookback: &[Vec<(usize, usize)>],
  follow: &[BitSet],
) -> Lookaheads {
  let mut sets: FnvHashMap<(usize, usize), BitSet> = FnvHashMap::default();
  for (ti, reductions) in lookback.iter().enumerate() {
    for &key in reductions {
      sets.entry(key).or_insert_with(BitSet::new).union_with(&follow[ti]);
    }
  }
  Lookaheads { sets }
}

fn transition_index(trans: &[Transition]) -> Map<Transition, usize> {
  trans.iter()
    .cloned()
    .enumerate()
    .map(|(i, t)| (t, i))
    .collect()
}

/// Computes `F(x) = initial(x) ∪ ⋃{ F(y) | y ∈ relation(x) }` for every node,
/// collapsing strongly connected components to one shared set.
pub fn digraph(relation: &[Vec<usize>], initial: Vec<BitSet>) -> Vec<BitSet> {
  const DONE: usize = usize::MAX;

  let n = initial.len();
  let mut sets = initial;
  let mut depth = vec![0usize; n];
  let mut stack = vec![];
  // (node, depth when pushed, next edge)
  let mut frames: Vec<(usize, usize, usize)> = vec![];

  for root in 0..n {
    if depth[root] != 0 {
      continue;
    }
    stack.push(root);
    depth[root] = stack.len();
    frames.push((root, stack.len(), 0));

    while let Some(frame) = frames.last_mut() {
      let (x, d, edge) = *frame;
      if let Some(&y) = relation[x].get(edge) {
        frame.2 += 1;
        if depth[y] == 0 {
          stack.push(y);
          depth[y] = stack.len();
          frames.push((y, stack.len(), 0));
        } else {
          absorb(&mut sets, &mut depth, x, y);
        }
        continue;
      }

      frames.pop();
      if depth[x] == d {
        while let Some(e) = stack.pop() {
          depth[e] = DONE;
          if e == x {
            break;
          }
          sets[e] = sets[x].clone();
        }
      }
      if let Some(&(parent, _, _)) = frames.last() {
        absorb(&mut sets, &mut depth, parent, x);
      }
    }
  }

  sets
}

fn absorb(sets: &mut [BitSet], depth: &mut [usize], x: usize, y: usize) {
  depth[x] = depth[x].min(depth[y]);
  if x != y {
    let fy = sets[y].clone();
    sets[x].union_with(&fy);
  }
}
