use grammar::{Assoc, Grammar, Symbol};
use insta::assert_snapshot;
use lr::{Conflict, LrMethod, Report, Resolution};
use pretty_assertions::assert_eq;

mod parse;

fn lit(c: char) -> Symbol {
  Symbol::Literal(c)
}

fn rule(g: &mut Grammar<()>, name: &str, symbols: &str) {
  let symbols = symbols.split_whitespace().map(Symbol::from).collect();
  g.add_production(name, symbols, None, None).unwrap();
}

fn expr_grammar() -> Grammar<()> {
  let mut g = Grammar::new(&["NUM", "NEG"]).unwrap();
  g.set_precedence(lit('<'), Assoc::NonAssoc, 1).unwrap();
  g.set_precedence(lit('+'), Assoc::LeftAssoc, 2).unwrap();
  g.set_precedence(lit('-'), Assoc::LeftAssoc, 2).unwrap();
  g.set_precedence(lit('*'), Assoc::LeftAssoc, 3).unwrap();
  g.set_precedence(lit('/'), Assoc::LeftAssoc, 3).unwrap();
  g.set_precedence(lit('^'), Assoc::RightAssoc, 4).unwrap();
  g.set_precedence(Symbol::token("NEG"), Assoc::RightAssoc, 5).unwrap();
  for op in &["<", "+", "-", "*", "/", "^"] {
    rule(&mut g, "e", &format!("e {} e", op));
  }
  g.add_production(
    "e",
    vec![lit('-'), Symbol::nonterminal("e")],
    Some(&Symbol::token("NEG")),
    None,
  ).unwrap();
  rule(&mut g, "e", "( e )");
  rule(&mut g, "e", "NUM");
  g
}

#[test]
fn precedence() {
  init();
  let mut g = expr_grammar();
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();
  assert_eq!(table.conflicts, vec![]);

  let events = parse::parse(&g, &table, "1 + 2 * 3 ^ 4 ^ 5 - - 6");
  assert_snapshot!(events.join("\n"), @r###"
  shift  1
  reduce e -> 1
  shift  +
  shift  2
  reduce e -> 2
  shift  *
  shift  3
  reduce e -> 3
  shift  ^
  shift  4
  reduce e -> 4
  shift  ^
  shift  5
  reduce e -> 5
  reduce e -> e ^ e
  reduce e -> e ^ e
  reduce e -> e * e
  reduce e -> e + e
  shift  -
  shift  -
  shift  6
  reduce e -> 6
  reduce e -> - e
  reduce e -> e - e
  accept
  "###);
}

#[test]
fn nonassoc_is_an_error() {
  let mut g = expr_grammar();
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  let events = parse::parse(&g, &table, "1 < 2 < 3");
  assert_eq!(events.last().unwrap(), "error token <");

  let events = parse::parse(&g, &table, "1 < 2 + 3");
  assert_eq!(events.last().unwrap(), "accept");
}

#[test]
fn lalr_but_not_slr() {
  let build = |method| {
    let mut g = Grammar::<()>::new(&["ID"]).unwrap();
    rule(&mut g, "s", "l = r");
    rule(&mut g, "s", "r");
    rule(&mut g, "l", "* r");
    rule(&mut g, "l", "ID");
    rule(&mut g, "r", "l");
    let table = lr::build(&mut g, method).unwrap();
    (g, table)
  };

  let (g, lalr) = build(LrMethod::Lalr);
  assert_eq!(lalr.conflicts, vec![]);
  assert_eq!(parse::parse(&g, &lalr, "* ID = ID").last().unwrap(), "accept");

  let (_, slr) = build(LrMethod::Slr);
  let conflicts = slr.sr_conflicts().collect::<Vec<_>>();
  assert_eq!(conflicts.len(), 1);
  match conflicts[0] {
    Conflict::ShiftReduce { symbol, resolution, .. } => {
      assert_eq!(symbol, &lit('='));
      assert_eq!(resolution, &Resolution::Shift);
    }
    c => panic!("unexpected conflict {:?}", c),
  }
}

#[test]
fn reduce_reduce_prefers_earlier_production() {
  let mut g = Grammar::<()>::new(&["X"]).unwrap();
  rule(&mut g, "s", "a");
  rule(&mut g, "s", "b");
  rule(&mut g, "a", "X");
  rule(&mut g, "b", "X");
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  assert_eq!(table.conflicts, vec![Conflict::ReduceReduce {
    state: 4,
    symbol: Symbol::end(),
    chosen: 3,
    rejected: 4,
  }]);
  assert_eq!(
    parse::parse(&g, &table, "X"),
    vec!["shift  X", "reduce a -> X", "reduce s -> a", "accept"]);
}

#[test]
fn declared_shift_precedence_is_not_a_conflict() {
  init();
  let mut g = Grammar::<()>::new(&["NUM"]).unwrap();
  g.set_precedence(lit('*'), Assoc::LeftAssoc, 1).unwrap();
  rule(&mut g, "e", "e + e");
  rule(&mut g, "e", "e * e");
  rule(&mut g, "e", "NUM");
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  // only `e + e . +` is an undeclared tie; `e + e . *` shifts by precedence
  let conflicts = table.sr_conflicts().collect::<Vec<_>>();
  assert_eq!(conflicts.len(), 1);
  assert!(matches!(
    conflicts[0],
    Conflict::ShiftReduce { symbol, resolution: Resolution::Shift, .. }
      if symbol == &lit('+')));

  let events = parse::parse(&g, &table, "1 + 2 * 3");
  let tail = events[events.len() - 3..].to_vec();
  assert_eq!(tail, vec!["reduce e -> e * e", "reduce e -> e + e", "accept"]);
}

#[test]
fn dangling_else_shifts() {
  let mut g = Grammar::<()>::new(&["IF", "ELSE", "OTHER", "X"]).unwrap();
  rule(&mut g, "stmt", "IF X stmt");
  rule(&mut g, "stmt", "IF X stmt ELSE stmt");
  rule(&mut g, "stmt", "OTHER");
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  assert_eq!(table.conflicts.len(), 1);
  assert!(matches!(
    &table.conflicts[0],
    Conflict::ShiftReduce { symbol, resolution: Resolution::Shift, .. }
      if symbol == &Symbol::token("ELSE")));

  let events = parse::parse(&g, &table, "IF X IF X OTHER ELSE OTHER");
  let inner = events.iter().position(|e| e == "reduce stmt -> IF X stmt ELSE stmt");
  let outer = events.iter().position(|e| e == "reduce stmt -> IF X stmt");
  assert!(inner.unwrap() < outer.unwrap());
}

#[test]
fn empty_production() {
  let mut g = Grammar::<()>::new(&["ITEM"]).unwrap();
  rule(&mut g, "list", "list ITEM");
  g.add_production("list", vec![], None, None).unwrap();
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  assert_eq!(parse::parse(&g, &table, "ITEM ITEM"), vec![
    "reduce list -> <empty>",
    "shift  ITEM",
    "reduce list -> list ITEM",
    "shift  ITEM",
    "reduce list -> list ITEM",
    "accept",
  ]);
  assert_eq!(parse::parse(&g, &table, ""), vec!["reduce list -> <empty>", "accept"]);
}

#[test]
fn construction_is_deterministic() {
  let mut g1 = expr_grammar();
  let mut g2 = expr_grammar();
  assert_eq!(
    lr::build(&mut g1, LrMethod::Lalr).unwrap(),
    lr::build(&mut g2, LrMethod::Lalr).unwrap());
}

#[test]
fn missing_productions() {
  let mut g = Grammar::<()>::new(&["X"]).unwrap();
  assert_eq!(
    lr::build(&mut g, LrMethod::Lalr),
    Err(lr::TableError::Grammar(grammar::GrammarError::NoProductions)));
}

fn init() {
  let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn report() {
  init();
  let mut g = Grammar::<()>::new(&["A"]).unwrap();
  rule(&mut g, "list", "list A");
  rule(&mut g, "list", "A");
  let table = lr::build(&mut g, LrMethod::Lalr).unwrap();

  assert_snapshot!(Report::new(&g, &table).to_string(), @r###"
  Grammar

  Rule 0     S' -> list
  Rule 1     list -> list A
  Rule 2     list -> A

  Terminals, with rules where they appear

  $end                 :
  error                :
  A                    : 1 2

  Nonterminals, with rules where they appear

  list                 : 0 1

  First sets

  list                 : A

  Follow sets

  list                 : $end A

  Parsing method: LALR

  state 0

      (0) S' -> . list
      (1) list -> . list A
      (2) list -> . A

      A               shift and go to state 2

      list            shift and go to state 1

  state 1

      (0) S' -> list .
      (1) list -> list . A

      $end            accept
      A               shift and go to state 3

  state 2

      (2) list -> A .

      $end            reduce using rule 2 (list -> A)
      A               reduce using rule 2 (list -> A)

  state 3

      (1) list -> list A .

      $end            reduce using rule 1 (list -> list A)
      A               reduce using rule 1 (list -> list A)
  "###);
}
