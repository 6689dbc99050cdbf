use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use crate::{GrammarError, ItemId, Symbol};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Assoc {
  LeftAssoc,
  RightAssoc,
  NonAssoc,
}

impl FromStr for Assoc {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "left" => Ok(Assoc::LeftAssoc),
      "right" => Ok(Assoc::RightAssoc),
      "nonassoc" | "noassoc" => Ok(Assoc::NonAssoc),
      _ => Err(GrammarError::InvalidAssociativity(s.to_owned())),
    }
  }
}

impl fmt::Display for Assoc {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(match self {
      Assoc::LeftAssoc => "left",
      Assoc::RightAssoc => "right",
      Assoc::NonAssoc => "nonassoc",
    })
  }
}

/// Higher `level` binds tighter. Level 0 means no declared precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Precedence {
  pub assoc: Assoc,
  pub level: u32,
}

impl Default for Precedence {
  fn default() -> Self {
    Self {
      assoc: Assoc::RightAssoc,
      level: 0,
    }
  }
}

pub struct Production<A> {
  pub index: usize,
  pub name: String,
  pub symbols: Vec<Symbol>,
  pub prec: Precedence,
  pub action: Option<A>,
  pub(crate) items: Range<usize>,
}

impl<A> Production<A> {
  pub(crate) fn new(
    index: usize,
    name: String,
    symbols: Vec<Symbol>,
    prec: Precedence,
    action: Option<A>,
  ) -> Self {
    Self {
      index,
      name,
      symbols,
      prec,
      action,
      items: 0..0,
    }
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  /// Distinct symbols of the right-hand side, in order of first appearance.
  pub fn unique_symbols(&self) -> Vec<&Symbol> {
    let mut syms: Vec<&Symbol> = vec![];
    for sym in &self.symbols {
      if !syms.contains(&sym) {
        syms.push(sym);
      }
    }
    syms
  }

  /// LR items of this production, dot at `0..=len`. Empty until
  /// `Grammar::build_lritems` runs.
  pub fn items(&self) -> impl Iterator<Item = ItemId> {
    self.items.clone().map(ItemId::new)
  }

  /// The item with the dot in front of the first symbol.
  pub fn first_item(&self) -> Option<ItemId> {
    self.items().next()
  }
}

impl<A> fmt::Display for Production<A> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} ->", self.name)?;
    if self.symbols.is_empty() {
      return f.write_str(" <empty>");
    }
    for sym in &self.symbols {
      write!(f, " {}", sym)?;
    }
    Ok(())
  }
}

impl<A> fmt::Debug for Production<A> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Production")
      .field("index", &self.index)
      .field("name", &self.name)
      .field("symbols", &self.symbols)
      .field("prec", &self.prec)
      .field("action", &self.action.is_some())
      .finish()
  }
}
