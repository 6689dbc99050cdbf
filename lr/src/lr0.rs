//! Canonical collection of LR(0) item sets.

use fnv::FnvHashMap;
use grammar::{Grammar, ItemId, Map, Set, Symbol};
use log::debug;

/// LR(0) states and their transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lr0States {
  /// Items of each state, closure included.
  pub states: Vec<Vec<ItemId>>,
  /// state -> symbol -> next state
  pub transitions: Vec<Map<Symbol, usize>>,
}

impl Lr0States {
  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  pub fn goto(&self, state: usize, sym: &Symbol) -> Option<usize> {
    self.transitions.get(state)?.get(sym).copied()
  }
}

pub struct Automaton<'g, A> {
  grammar: &'g Grammar<A>,
  /// closure generation in which each production was last added
  added: Vec<u32>,
  generation: u32,
  goto_cache: FnvHashMap<(Vec<ItemId>, Symbol), Vec<ItemId>>,
  kernel_cache: FnvHashMap<Vec<ItemId>, Vec<ItemId>>,
}

impl<'g, A> Automaton<'g, A> {
  /// The grammar must have its LR items built.
  pub fn new(grammar: &'g Grammar<A>) -> Self {
    Self {
      grammar,
      added: vec![0; grammar.productions().len()],
      generation: 0,
      goto_cache: FnvHashMap::default(),
      kernel_cache: FnvHashMap::default(),
    }
  }

  /// Adds the initial item of every production of a nonterminal that
  /// follows a dot, until nothing changes.
  pub fn closure(&mut self, items: &[ItemId]) -> Vec<ItemId> {
    self.generation += 1;
    let mut set = items.to_vec();
    let mut i = 0;
    while i < set.len() {
      let item = self.grammar.item(set[i]);
      for &prod in &item.after {
        if self.added[prod] == self.generation {
          continue;
        }
        self.added[prod] = self.generation;
        if let Some(first) = self.grammar.production(prod).first_item() {
          set.push(first);
        }
      }
      i += 1;
    }
    set
  }

  /// Closure of the items of `items` advanced over `sym`. Empty if no item
  /// has `sym` after its dot.
  pub fn goto(&mut self, items: &[ItemId], sym: &Symbol) -> Vec<ItemId> {
    let key = (canonical(items), sym.clone());
    if let Some(result) = self.goto_cache.get(&key) {
      return result.clone();
    }

    let grammar = self.grammar;
    let kernel = items.iter()
      .filter_map(|&id| {
        let next = grammar.item(id).next?;
        (grammar.item(next).before.as_ref() == Some(sym)).then(|| next)
      })
      .collect::<Vec<_>>();

    let result = if kernel.is_empty() {
      vec![]
    } else if let Some(result) = self.kernel_cache.get(&kernel) {
      result.clone()
    } else {
      let result = self.closure(&kernel);
      self.kernel_cache.insert(kernel, result.clone());
      result
    };

    self.goto_cache.insert(key, result.clone());
    result
  }

  pub fn build_states(mut self) -> Lr0States {
    let start = match self.grammar.production(0).first_item() {
      Some(start) => start,
      None => {
        return Lr0States {
          states: vec![],
          transitions: vec![],
        };
      }
    };

    let mut states = vec![self.closure(&[start])];
    let mut index: Map<Vec<ItemId>, usize> = Map::default();
    index.insert(canonical(&states[0]), 0);
    let mut transitions = vec![];

    let mut i = 0;
    while i < states.len() {
      let current = states[i].clone();
      let symbols = current.iter()
        .filter_map(|&id| self.grammar.item(id).at_dot.clone())
        .collect::<Set<_>>();

      let mut next_states = Map::default();
      for sym in symbols {
        let items = self.goto(&current, &sym);
        if items.is_empty() {
          continue;
        }
        let key = canonical(&items);
        let j = match index.get(&key) {
          Some(&j) => j,
          None => {
            let j = states.len();
            index.insert(key, j);
            states.push(items);
            j
          }
        };
        next_states.insert(sym, j);
      }

      debug!("state {}: {} items, {} transitions",
        i, current.len(), next_states.len());
      transitions.push(next_states);
      i += 1;
    }

    Lr0States {
      states,
      transitions,
    }
  }
}

/// Order-independent identity of an item set.
fn canonical(items: &[ItemId]) -> Vec<ItemId> {
  let mut key = items.to_vec();
  key.sort_unstable();
  key
}
