use std::iter::once;
use grammar::{Grammar, Symbol};
use lr::{Action, LrTable};

/// Whitespace separated input: digit runs are `NUM`, everything else is
/// classified as a rule string would classify it.
fn kind(text: &str) -> Symbol {
  if text.chars().all(|c| c.is_ascii_digit()) {
    Symbol::token("NUM")
  } else {
    Symbol::from(text)
  }
}

pub fn parse<A>(grammar: &Grammar<A>, table: &LrTable, input: &str) -> Vec<String> {
  let mut tokens = input.split_whitespace()
    .map(|t| (kind(t), t))
    .chain(once((Symbol::end(), "EOF")));
  let mut events = vec![];
  let mut states = vec![0];
  let mut stack: Vec<String> = vec![];
  let (mut kind, mut text) = tokens.next().unwrap();

  loop {
    let state = *states.last().unwrap();
    match table.action_on(state, &kind) {
      Some(Action::Shift(j)) => {
        events.push(format!("shift  {}", text));
        stack.push(text.to_owned());
        states.push(j);
        let next = tokens.next().unwrap();
        kind = next.0;
        text = next.1;
      }
      Some(Action::Reduce(r)) => {
        let prod = grammar.production(r);
        let rhs = stack.drain(stack.len() - prod.len()..).collect::<Vec<_>>();
        states.truncate(states.len() - prod.len());
        if rhs.is_empty() {
          events.push(format!("reduce {} -> <empty>", prod.name));
        } else {
          events.push(format!("reduce {} -> {}", prod.name, rhs.join(" ")));
        }
        let top = *states.last().unwrap();
        states.push(table.goto_on(top, &prod.name).unwrap());
        stack.push(prod.name.clone());
      }
      Some(Action::Accept) => {
        events.push("accept".to_owned());
        break;
      }
      None => {
        events.push(format!("error token {}", text));
        break;
      }
    }
  }

  events
}
