use std::fmt::{self, Write};
use crate::{Grammar, Symbol};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

impl ItemId {
  pub(crate) fn new(index: usize) -> Self {
    Self(index as u32)
  }

  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// A production with a dot. Items of one production are chained through
/// `next`, dot `0` to dot `len`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LrItem {
  pub prod: usize,
  pub dot: usize,
  /// Symbol right after the dot.
  pub at_dot: Option<Symbol>,
  /// Symbol right before the dot.
  pub before: Option<Symbol>,
  /// Productions of the nonterminal right after the dot.
  pub after: Vec<usize>,
  pub next: Option<ItemId>,
}

impl LrItem {
  pub fn is_complete(&self) -> bool {
    self.at_dot.is_none()
  }

  pub fn fmt<A>(&self, grammar: &Grammar<A>, f: &mut impl Write) -> fmt::Result {
    let prod = grammar.production(self.prod);
    write!(f, "{} ->", prod.name)?;
    for (i, sym) in prod.symbols.iter().enumerate() {
      if i == self.dot {
        f.write_str(" .")?;
      }
      write!(f, " {}", sym)?;
    }
    if self.dot == prod.len() {
      f.write_str(" .")?;
    }
    Ok(())
  }

  pub fn to_string<A>(&self, grammar: &Grammar<A>) -> String {
    let mut s = String::new();
    let _ = self.fmt(grammar, &mut s);
    s
  }
}
