use criterion::{criterion_group, criterion_main, Criterion};
use grammar::{Assoc, Grammar, Symbol};
use lr::LrMethod;

/// A small expression language with statements and declarations.
fn language() -> Grammar<()> {
  let tokens = ["ID", "NUM", "STRING", "IF", "ELSE", "WHILE", "RETURN", "LET", "FN"];
  let mut g = Grammar::new(&tokens).unwrap();
  let levels: &[(Assoc, &[char])] = &[
    (Assoc::LeftAssoc, &['|']),
    (Assoc::LeftAssoc, &['&']),
    (Assoc::NonAssoc, &['<', '>', '=']),
    (Assoc::LeftAssoc, &['+', '-']),
    (Assoc::LeftAssoc, &['*', '/', '%']),
    (Assoc::RightAssoc, &['^']),
  ];
  for (level, (assoc, ops)) in levels.iter().enumerate() {
    for &op in *ops {
      g.set_precedence(Symbol::Literal(op), *assoc, level as u32 + 1).unwrap();
    }
  }

  let rules: &[(&str, &str)] = &[
    ("program", "items"),
    ("items", "items item"),
    ("items", ""),
    ("item", "FN ID ( params ) block"),
    ("item", "LET ID = expr ;"),
    ("params", "param_list"),
    ("params", ""),
    ("param_list", "param_list , ID"),
    ("param_list", "ID"),
    ("block", "{ stmts }"),
    ("stmts", "stmts stmt"),
    ("stmts", ""),
    ("stmt", "LET ID = expr ;"),
    ("stmt", "expr ;"),
    ("stmt", "RETURN expr ;"),
    ("stmt", "IF expr block"),
    ("stmt", "IF expr block ELSE block"),
    ("stmt", "WHILE expr block"),
    ("stmt", "block"),
    ("args", "arg_list"),
    ("args", ""),
    ("arg_list", "arg_list , expr"),
    ("arg_list", "expr"),
    ("expr", "ID ( args )"),
    ("expr", "( expr )"),
    ("expr", "ID"),
    ("expr", "NUM"),
    ("expr", "STRING"),
  ];
  for (name, rhs) in rules {
    let symbols = rhs.split_whitespace().map(Symbol::from).collect();
    g.add_production(name, symbols, None, None).unwrap();
  }
  for (_, ops) in levels {
    for &op in *ops {
      let e = Symbol::nonterminal("expr");
      g.add_production("expr", vec![e.clone(), Symbol::Literal(op), e], None, None)
        .unwrap();
    }
  }
  g
}

fn lalr_benchmark(c: &mut Criterion) {
  c.bench_function("lalr", |b| b.iter(|| {
    let mut g = language();
    lr::build(&mut g, LrMethod::Lalr).unwrap()
  }));
}

fn slr_benchmark(c: &mut Criterion) {
  c.bench_function("slr", |b| b.iter(|| {
    let mut g = language();
    lr::build(&mut g, LrMethod::Slr).unwrap()
  }));
}

criterion_group!{
  name = benches;
  config = Criterion::default().significance_level(0.1).sample_size(10);
  targets = lalr_benchmark, slr_benchmark
}
criterion_main!(benches);
