use std::fmt;
use grammar::Grammar;
use itertools::Itertools;
use crate::{Action, Conflict, LrMethod, LrTable, Resolution};

/// Human-readable dump of a grammar and its parsing table.
pub struct Report<'a, A> {
  grammar: &'a Grammar<A>,
  table: &'a LrTable,
}

impl<'a, A> Report<'a, A> {
  pub fn new(grammar: &'a Grammar<A>, table: &'a LrTable) -> Self {
    Self { grammar, table }
  }

  fn write_grammar(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "Grammar\n")?;
    for prod in self.grammar.productions() {
      writeln!(f, "Rule {:<5} {}", prod.index, prod)?;
    }

    let unused_terminals = self.grammar.unused_terminals();
    if !unused_terminals.is_empty() {
      writeln!(f, "\nUnused terminals:\n")?;
      for t in unused_terminals {
        writeln!(f, "    {}", t)?;
      }
    }

    writeln!(f, "\nTerminals, with rules where they appear\n")?;
    for (t, prods) in self.grammar.terminals() {
      index_line(f, t, prods.iter())?;
    }

    writeln!(f, "\nNonterminals, with rules where they appear\n")?;
    for (n, prods) in self.grammar.nonterminals() {
      index_line(f, n, prods.iter())?;
    }

    writeln!(f, "\nFirst sets\n")?;
    for (sym, first) in self.grammar.first() {
      if !sym.is_nonterminal() {
        continue;
      }
      let empty = if first.empty { Some("<empty>") } else { None };
      let terms = first.terminals.iter().map(|t| t.to_string());
      index_line(f, sym, terms.chain(empty.map(String::from)))?;
    }

    writeln!(f, "\nFollow sets\n")?;
    for (n, follow) in self.grammar.follow() {
      index_line(f, n, follow.iter())?;
    }
    Ok(())
  }

  fn write_state(&self, f: &mut fmt::Formatter, st: usize) -> fmt::Result {
    writeln!(f, "\nstate {}\n", st)?;
    for &id in &self.table.states[st] {
      let item = self.grammar.item(id);
      writeln!(f, "    ({}) {}", item.prod, item.to_string(self.grammar))?;
    }
    writeln!(f)?;

    for (t, action) in self.table.terminals.iter().zip(&self.table.action[st]) {
      let action = match action {
        Some(action) => action,
        None => continue,
      };
      match *action {
        Action::Shift(j) => {
          writeln!(f, "    {:<15} shift and go to state {}", t, j)?;
        }
        Action::Reduce(r) => {
          writeln!(f, "    {:<15} reduce using rule {} ({})",
            t, r, self.grammar.production(r))?;
        }
        Action::Accept => writeln!(f, "    {:<15} accept", t)?,
      }
    }

    let conflicts = self.table.conflicts.iter()
      .filter(|c| conflict_state(c) == st)
      .collect::<Vec<_>>();
    if !conflicts.is_empty() {
      writeln!(f)?;
      for c in conflicts {
        writeln!(f, "  ! {}", DisplayConflict(c))?;
      }
    }

    let gotos = self.table.nonterminals.iter()
      .zip(&self.table.goto[st])
      .filter_map(|(n, g)| g.map(|g| (n, g)))
      .collect::<Vec<_>>();
    if !gotos.is_empty() {
      writeln!(f)?;
      for (n, g) in gotos {
        writeln!(f, "    {:<15} shift and go to state {}", n, g)?;
      }
    }
    Ok(())
  }
}

impl<'a, A> fmt::Display for Report<'a, A> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    self.write_grammar(f)?;

    let method = match self.table.method {
      LrMethod::Lalr => "LALR",
      LrMethod::Slr => "SLR",
    };
    writeln!(f, "\nParsing method: {}", method)?;

    for st in 0..self.table.states.len() {
      self.write_state(f, st)?;
    }

    if !self.table.conflicts.is_empty() {
      writeln!(f, "\nConflicts\n")?;
      for c in &self.table.conflicts {
        writeln!(f, "{}", DisplayConflict(c))?;
      }
    }
    Ok(())
  }
}

fn index_line<K, I>(f: &mut fmt::Formatter, key: K, items: I) -> fmt::Result
where
  K: fmt::Display,
  I: Iterator,
  I::Item: fmt::Display,
{
  let line = format!("{:<20} : {}", key, items.format(" "));
  writeln!(f, "{}", line.trim_end())
}

fn conflict_state(c: &Conflict) -> usize {
  match c {
    Conflict::ShiftReduce { state, .. } | Conflict::ReduceReduce { state, .. } => *state,
  }
}

struct DisplayConflict<'a>(&'a Conflict);

impl<'a> fmt::Display for DisplayConflict<'a> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.0 {
      Conflict::ShiftReduce { state, symbol, resolution } => {
        let resolution = match resolution {
          Resolution::Shift => "shift",
          Resolution::Reduce => "reduce",
        };
        write!(f, "shift/reduce conflict for {} in state {} resolved as {}",
          symbol, state, resolution)
      }
      Conflict::ReduceReduce { state, symbol, chosen, rejected } => {
        write!(f,
          "reduce/reduce conflict for {} in state {} resolved using rule {} (rejected rule {})",
          symbol, state, chosen, rejected)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::{Assoc, Symbol};

  #[test]
  fn report_lists_states_and_conflicts() {
    let e = Symbol::nonterminal("e");
    let mut g = Grammar::<()>::new(&["NUM", "UNUSED"]).unwrap();
    g.set_precedence(Symbol::Literal('*'), Assoc::LeftAssoc, 1).unwrap();
    g.add_production("e", vec![e.clone(), Symbol::Literal('+'), e.clone()], None, None)
      .unwrap();
    g.add_production("e", vec![e.clone(), Symbol::Literal('*'), e], None, None)
      .unwrap();
    g.add_production("e", vec![Symbol::token("NUM")], None, None).unwrap();
    let table = crate::build(&mut g, LrMethod::Lalr).unwrap();
    let text = Report::new(&g, &table).to_string();

    assert!(text.starts_with("Grammar\n\nRule 0     S' -> e\nRule 1     e -> e '+' e\n"));
    assert!(text.contains("Unused terminals:\n\n    UNUSED\n"));
    assert!(text.contains("Parsing method: LALR\n"));
    assert!(text.contains("\nstate 0\n\n    (0) S' -> . e\n"));
    assert!(text.contains("    $end            accept\n"));
    assert!(text.contains("    NUM             shift and go to state"));
    assert!(text.contains("reduce using rule 3 (e -> NUM)"));
    assert!(text.contains("shift/reduce conflict for '+' in state"));
    assert!(text.contains("\nConflicts\n\n"));
  }
}
