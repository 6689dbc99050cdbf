use log::{debug, warn};
use crate::symbol::{is_nonterminal_name, is_token_name, ERROR};
use crate::{
  GrammarError, ItemId, LrItem, Map, Precedence, Production, Set, Symbol,
  Assoc,
};

/// Name of the augmenting production's left side.
pub const AUGMENTED_START: &str = "S'";

/// FIRST set of a symbol or of a symbol sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirstSet {
  pub terminals: Set<Symbol>,
  /// The empty string is derivable.
  pub empty: bool,
}

impl FirstSet {
  fn terminal(sym: Symbol) -> Self {
    let mut terminals = Set::default();
    terminals.insert(sym);
    Self {
      terminals,
      empty: false,
    }
  }

  /// Returns true if `self` has changed.
  fn union_with(&mut self, other: &FirstSet) -> bool {
    let mut changed = false;
    for t in &other.terminals {
      changed |= self.terminals.insert(t.clone());
    }
    if other.empty && !self.empty {
      self.empty = true;
      changed = true;
    }
    changed
  }
}

/// Productions of a grammar plus the registries derived from them.
///
/// Production 0 is always the augmenting production `S' -> start`, filled in
/// by [`Grammar::set_start`]. `A` is the semantic action attached to each
/// production.
#[derive(Debug)]
pub struct Grammar<A> {
  productions: Vec<Production<A>>,
  prodnames: Map<String, Vec<usize>>,
  prodmap: Set<(String, Vec<Symbol>)>,
  /// terminal -> productions where it appears
  terminals: Map<Symbol, Vec<usize>>,
  /// nonterminal -> productions where it appears on the right side
  nonterminals: Map<String, Vec<usize>>,
  precedence: Map<Symbol, Precedence>,
  used_precedence: Set<Symbol>,
  start: Option<String>,
  items: Vec<LrItem>,
  first: Map<Symbol, FirstSet>,
  follow: Map<String, Set<Symbol>>,
  /// start symbol `follow` was computed for
  follow_start: Option<String>,
}

impl<A> Grammar<A> {
  /// Creates a grammar over the named tokens. `$end` and `error` are
  /// registered implicitly.
  pub fn new<I, S>(tokens: I) -> Result<Self, GrammarError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut terminals = Map::default();
    terminals.insert(Symbol::end(), vec![]);
    terminals.insert(Symbol::error(), vec![]);
    for name in tokens {
      let name = name.as_ref();
      if name != ERROR && !is_token_name(name) {
        return Err(GrammarError::InvalidName(name.to_owned()));
      }
      terminals.entry(Symbol::token(name)).or_insert_with(Vec::new);
    }

    let placeholder = Production::new(
      0,
      AUGMENTED_START.to_owned(),
      vec![],
      Precedence::default(),
      None,
    );

    Ok(Self {
      productions: vec![placeholder],
      prodnames: Map::default(),
      prodmap: Set::default(),
      terminals,
      nonterminals: Map::default(),
      precedence: Map::default(),
      used_precedence: Set::default(),
      start: None,
      items: vec![],
      first: Map::default(),
      follow: Map::default(),
      follow_start: None,
    })
  }

  pub fn productions(&self) -> &[Production<A>] {
    &self.productions
  }

  pub fn production(&self, index: usize) -> &Production<A> {
    &self.productions[index]
  }

  /// Productions grouped by left-hand side.
  pub fn prodnames(&self) -> &Map<String, Vec<usize>> {
    &self.prodnames
  }

  pub fn terminals(&self) -> &Map<Symbol, Vec<usize>> {
    &self.terminals
  }

  pub fn nonterminals(&self) -> &Map<String, Vec<usize>> {
    &self.nonterminals
  }

  pub fn precedence(&self) -> &Map<Symbol, Precedence> {
    &self.precedence
  }

  pub fn start(&self) -> Option<&str> {
    self.start.as_deref()
  }

  pub fn items(&self) -> &[LrItem] {
    &self.items
  }

  pub fn item(&self, id: ItemId) -> &LrItem {
    &self.items[id.index()]
  }

  pub fn terminal_index(&self, sym: &Symbol) -> Option<usize> {
    self.terminals.get_index_of(sym)
  }

  pub fn nonterminal_index(&self, name: &str) -> Option<usize> {
    self.nonterminals.get_index_of(name)
  }

  /// Computed FIRST sets, empty until [`Grammar::compute_first`] runs.
  pub fn first(&self) -> &Map<Symbol, FirstSet> {
    &self.first
  }

  /// Computed FOLLOW sets, empty until [`Grammar::compute_follow`] runs.
  pub fn follow(&self) -> &Map<String, Set<Symbol>> {
    &self.follow
  }

  /// Declares the precedence of a terminal, or of a pseudo-token used only
  /// in `%prec` tags. Must happen before any production is added.
  pub fn set_precedence(
    &mut self,
    term: Symbol,
    assoc: Assoc,
    level: u32,
  ) -> Result<(), GrammarError> {
    if self.productions.len() > 1 {
      return Err(GrammarError::PrecedenceAfterProductions(term.to_string()));
    }
    if term.is_nonterminal() {
      return Err(GrammarError::InvalidName(term.to_string()));
    }
    if self.precedence.contains_key(&term) {
      return Err(GrammarError::DuplicatePrecedence(term.to_string()));
    }
    self.precedence.insert(term, Precedence { assoc, level });
    Ok(())
  }

  /// Adds `name -> symbols`. Without `prec`, the production takes the
  /// precedence of its rightmost terminal.
  pub fn add_production(
    &mut self,
    name: &str,
    symbols: Vec<Symbol>,
    prec: Option<&Symbol>,
    action: Option<A>,
  ) -> Result<&Production<A>, GrammarError> {
    if name == ERROR {
      return Err(GrammarError::ReservedName(name.to_owned()));
    }
    if !is_nonterminal_name(name) {
      return Err(GrammarError::InvalidName(name.to_owned()));
    }
    for sym in &symbols {
      match sym {
        Symbol::Token(t) if !self.terminals.contains_key(sym) => {
          return Err(GrammarError::UnknownToken(t.clone()));
        }
        Symbol::Nonterminal(n) if n == ERROR || !is_nonterminal_name(n) => {
          return Err(GrammarError::InvalidName(n.clone()));
        }
        _ => {}
      }
    }

    let prec = match prec {
      Some(tag) => {
        let p = *self.precedence.get(tag)
          .ok_or_else(|| GrammarError::UndefinedPrecedence(tag.to_string()))?;
        self.used_precedence.insert(tag.clone());
        p
      }
      None => self.rightmost_terminal_precedence(&symbols),
    };

    let key = (name.to_owned(), symbols);
    if self.prodmap.contains(&key) {
      let dup = Production::<A>::new(0, key.0, key.1, prec, None);
      return Err(GrammarError::DuplicateProduction(dup.to_string()));
    }
    let (name, symbols) = key;

    let index = self.productions.len();
    self.nonterminals.entry(name.clone()).or_insert_with(Vec::new);
    for sym in &symbols {
      match sym {
        Symbol::Nonterminal(n) => {
          self.nonterminals.entry(n.clone()).or_insert_with(Vec::new).push(index);
        }
        _ => {
          self.terminals.entry(sym.clone()).or_insert_with(Vec::new).push(index);
        }
      }
    }
    self.prodmap.insert((name.clone(), symbols.clone()));
    self.prodnames.entry(name.clone()).or_insert_with(Vec::new).push(index);
    self.productions.push(Production::new(index, name, symbols, prec, action));
    self.invalidate();

    debug!("production {}: {}", index, self.productions[index]);
    Ok(&self.productions[index])
  }

  fn rightmost_terminal_precedence(&self, symbols: &[Symbol]) -> Precedence {
    symbols.iter()
      .rev()
      .find(|sym| sym.is_terminal())
      .and_then(|sym| self.precedence.get(sym))
      .copied()
      .unwrap_or_default()
  }

  /// Fills in the augmenting production `S' -> start`. Defaults to the
  /// left side of the first production added.
  pub fn set_start(&mut self, start: Option<&str>) -> Result<(), GrammarError> {
    if self.productions.len() == 1 {
      return Err(GrammarError::NoProductions);
    }
    let start = match start {
      Some(start) => start.to_owned(),
      None => self.productions[1].name.clone(),
    };
    if !self.prodnames.contains_key(&start) {
      return Err(GrammarError::UnknownStartSymbol(start));
    }

    if let Some(old) = self.start.take() {
      if let Some(refs) = self.nonterminals.get_mut(&old) {
        refs.retain(|&p| p != 0);
      }
    }
    self.nonterminals.entry(start.clone()).or_insert_with(Vec::new).insert(0, 0);
    self.productions[0] = Production::new(
      0,
      AUGMENTED_START.to_owned(),
      vec![Symbol::Nonterminal(start.clone())],
      Precedence::default(),
      None,
    );
    self.start = Some(start);
    self.invalidate();
    Ok(())
  }

  fn invalidate(&mut self) {
    self.items.clear();
    self.first.clear();
    self.follow.clear();
    self.follow_start = None;
  }

  /// Builds the chain of LR items for every production.
  pub fn build_lritems(&mut self) {
    self.items.clear();
    for prod in &mut self.productions {
      let base = self.items.len();
      let len = prod.symbols.len();
      for dot in 0..=len {
        let at_dot = prod.symbols.get(dot).cloned();
        let after = match &at_dot {
          Some(Symbol::Nonterminal(n)) => {
            self.prodnames.get(n).cloned().unwrap_or_default()
          }
          _ => vec![],
        };
        self.items.push(LrItem {
          prod: prod.index,
          dot,
          before: dot.checked_sub(1).map(|i| prod.symbols[i].clone()),
          at_dot,
          after,
          next: if dot < len {
            Some(ItemId::new(base + dot + 1))
          } else {
            None
          },
        });
      }
      prod.items = base..self.items.len();
    }
  }

  /// FIRST of every terminal and nonterminal. Fails if a nonterminal is
  /// referenced but never defined.
  pub fn compute_first(&mut self) -> Result<&Map<Symbol, FirstSet>, GrammarError> {
    if !self.first.is_empty() {
      return Ok(&self.first);
    }

    let mut first = Map::default();
    for t in self.terminals.keys() {
      first.insert(t.clone(), FirstSet::terminal(t.clone()));
    }
    for n in self.nonterminals.keys() {
      first.insert(Symbol::Nonterminal(n.clone()), FirstSet::default());
    }

    loop {
      let mut changed = false;
      for (n, _) in &self.nonterminals {
        let prods = self.prodnames.get(n)
          .ok_or_else(|| GrammarError::UndefinedNonterminal(n.clone()))?;
        for &p in prods {
          let f = first_of_sequence(&first, &self.productions[p].symbols);
          if let Some(entry) = first.get_mut(&Symbol::Nonterminal(n.clone())) {
            changed |= entry.union_with(&f);
          }
        }
      }
      if !changed {
        break;
      }
    }

    self.first = first;
    Ok(&self.first)
  }

  /// FIRST of a symbol sequence. Requires [`Grammar::compute_first`].
  pub fn first_of(&self, beta: &[Symbol]) -> FirstSet {
    first_of_sequence(&self.first, beta)
  }

  /// FOLLOW of every nonterminal. `$end` follows `start`, which defaults to
  /// the left side of production 1. Memoized per start symbol.
  pub fn compute_follow(
    &mut self,
    start: Option<&str>,
  ) -> Result<&Map<String, Set<Symbol>>, GrammarError> {
    let start = match start {
      Some(start) => start.to_owned(),
      None => self.productions.get(1)
        .map(|p| p.name.clone())
        .ok_or(GrammarError::NoProductions)?,
    };
    if self.follow_start.as_ref() == Some(&start) {
      return Ok(&self.follow);
    }
    self.compute_first()?;

    let mut follow: Map<String, Set<Symbol>> = self.nonterminals.keys()
      .map(|n| (n.clone(), Set::default()))
      .collect();
    follow.entry(start.clone()).or_insert_with(Set::default).insert(Symbol::end());

    loop {
      let mut changed = false;
      for prod in &self.productions[1..] {
        for (i, sym) in prod.symbols.iter().enumerate() {
          let b = match sym {
            Symbol::Nonterminal(b) => b,
            _ => continue,
          };
          let fst = first_of_sequence(&self.first, &prod.symbols[i + 1..]);
          let mut new = fst.terminals;
          if fst.empty {
            if let Some(parent) = follow.get(&prod.name) {
              new.extend(parent.iter().cloned());
            }
          }
          let entry = follow.entry(b.clone()).or_insert_with(Set::default);
          for t in new {
            changed |= entry.insert(t);
          }
        }
      }
      if !changed {
        break;
      }
    }

    self.follow = follow;
    self.follow_start = Some(start);
    Ok(&self.follow)
  }

  /// Tokens that appear in no production.
  pub fn unused_terminals(&self) -> Vec<&Symbol> {
    self.terminals.iter()
      .filter(|(t, prods)| prods.is_empty() && !t.is_end() && !t.is_error())
      .map(|(t, _)| t)
      .collect()
  }

  /// Defined nonterminals never referenced, except the start symbol.
  pub fn unused_rules(&self) -> Vec<&str> {
    self.prodnames.keys()
      .filter(|n| {
        Some(n.as_str()) != self.start.as_deref()
          && self.nonterminals.get(*n).map_or(true, |refs| refs.is_empty())
      })
      .map(|n| n.as_str())
      .collect()
  }

  /// Nonterminals referenced but never defined, with a production that
  /// references each.
  pub fn undefined_symbols(&self) -> Vec<(&str, usize)> {
    self.nonterminals.iter()
      .filter(|(n, _)| !self.prodnames.contains_key(*n))
      .filter_map(|(n, refs)| refs.first().map(|&p| (n.as_str(), p)))
      .collect()
  }

  /// Precedence declarations that are neither terminals nor used by a
  /// `%prec` tag.
  pub fn unused_precedence(&self) -> Vec<&Symbol> {
    self.precedence.keys()
      .filter(|t| {
        !self.used_precedence.contains(*t) && !self.terminals.contains_key(*t)
      })
      .collect()
  }

  /// Logs unused terminals, rules and precedence declarations.
  pub fn warn_unused(&self) {
    for t in self.unused_terminals() {
      warn!("token {} defined but not used", t);
    }
    for n in self.unused_rules() {
      warn!("rule {} defined but not used", n);
    }
    for t in self.unused_precedence() {
      warn!("precedence for {} defined but not used", t);
    }
  }
}

fn first_of_sequence(first: &Map<Symbol, FirstSet>, beta: &[Symbol]) -> FirstSet {
  let mut result = FirstSet::default();
  for sym in beta {
    match first.get(sym) {
      Some(f) => {
        result.terminals.extend(f.terminals.iter().cloned());
        if !f.empty {
          return result;
        }
      }
      None if sym.is_terminal() => {
        result.terminals.insert(sym.clone());
        return result;
      }
      None => return result,
    }
  }
  result.empty = true;
  result
}
