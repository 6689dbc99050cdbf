//! Reads rule strings such as `expr : expr '+' expr | NUMBER` with a parser
//! built by this crate from a fixed grammar.

use std::sync::Arc;
use grammar::Symbol;
use lr::LrMethod;
use once_cell::sync::OnceCell;
use thiserror::Error;
use crate::builder::{BuildError, ParserBuilder};
use crate::lexer::{LexError, Lexer};
use crate::parser::{CompiledParser, Parser, Recovery, Rhs, SyntaxFault};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDecl {
  pub name: String,
  pub alternatives: Vec<Alternative>,
}

/// One alternative of a rule, with its `%prec` tag if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alternative {
  pub symbols: Vec<Symbol>,
  pub prec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSyntaxError {
  #[error(transparent)]
  Lex(#[from] LexError),
  #[error("invalid rule `{0}`")]
  Invalid(String),
}

#[derive(Debug)]
pub enum RuleValue {
  Symbol(Symbol),
  Symbols(Vec<Symbol>),
  Alternative(Alternative),
  Alternatives(Vec<Alternative>),
  Decl(RuleDecl),
}

/// The context counts syntax errors seen in one rule.
type Bootstrap = CompiledParser<RuleValue, usize>;

static BOOTSTRAP: OnceCell<Arc<Bootstrap>> = OnceCell::new();

fn bootstrap() -> Result<Arc<Bootstrap>, BuildError> {
  BOOTSTRAP.get_or_try_init(build_bootstrap).map(Arc::clone)
}

fn sym(name: &str) -> Symbol {
  Symbol::from(name)
}

fn symbols(value: Option<RuleValue>) -> Result<Vec<Symbol>, SyntaxFault> {
  match value {
    Some(RuleValue::Symbols(syms)) => Ok(syms),
    _ => Err(SyntaxFault),
  }
}

fn alternatives(value: Option<RuleValue>) -> Result<Vec<Alternative>, SyntaxFault> {
  match value {
    Some(RuleValue::Alternatives(alts)) => Ok(alts),
    _ => Err(SyntaxFault),
  }
}

fn text(rhs: &Rhs<'_, RuleValue>, i: usize) -> Result<String, SyntaxFault> {
  rhs.text(i).map(str::to_owned).ok_or(SyntaxFault)
}

fn build_bootstrap() -> Result<Arc<Bootstrap>, BuildError> {
  let lexer = Lexer::builder()
    .token("PREC", r"%prec\b")
    .token_with("LITERAL", r#""."|'.'"#, |mut t, _| {
      t.text = t.text.chars().nth(1).map(String::from).unwrap_or_default();
      Some(t)
    })
    .token("ID", r"[a-zA-Z_][a-zA-Z_0-9]*")
    .literals(":|")
    .ignore(" \t\r\n")
    .build()?;

  let mut b = ParserBuilder::<RuleValue, usize>::new(lexer)?;
  b.production(
    "grammar",
    vec![sym("ID"), sym(":"), sym("rules")],
    None,
    |_, rhs| {
      let name = text(rhs, 0)?;
      let alternatives = alternatives(rhs.take(2))?;
      Ok(RuleValue::Decl(RuleDecl { name, alternatives }))
    },
  )?;
  b.production("rules", vec![sym("rules"), sym("|"), sym("rule")], None, |_, rhs| {
    let mut alts = alternatives(rhs.take(0))?;
    match rhs.take(2) {
      Some(RuleValue::Alternative(alt)) => alts.push(alt),
      _ => return Err(SyntaxFault),
    }
    Ok(RuleValue::Alternatives(alts))
  })?;
  b.production("rules", vec![sym("rule")], None, |_, rhs| match rhs.take(0) {
    Some(RuleValue::Alternative(alt)) => Ok(RuleValue::Alternatives(vec![alt])),
    _ => Err(SyntaxFault),
  })?;
  b.production("rule", vec![sym("symbols")], None, |_, rhs| {
    Ok(RuleValue::Alternative(Alternative {
      symbols: symbols(rhs.take(0))?,
      prec: None,
    }))
  })?;
  b.production("rule", vec![sym("symbols"), sym("PREC"), sym("ID")], None, |_, rhs| {
    Ok(RuleValue::Alternative(Alternative {
      symbols: symbols(rhs.take(0))?,
      prec: Some(text(rhs, 2)?),
    }))
  })?;
  b.production("rule", vec![], None, |_, _| {
    Ok(RuleValue::Alternative(Alternative::default()))
  })?;
  b.production("symbols", vec![sym("symbols"), sym("symbol")], None, |_, rhs| {
    let mut syms = symbols(rhs.take(0))?;
    match rhs.take(1) {
      Some(RuleValue::Symbol(s)) => syms.push(s),
      _ => return Err(SyntaxFault),
    }
    Ok(RuleValue::Symbols(syms))
  })?;
  b.production("symbols", vec![sym("symbol")], None, |_, rhs| match rhs.take(0) {
    Some(RuleValue::Symbol(s)) => Ok(RuleValue::Symbols(vec![s])),
    _ => Err(SyntaxFault),
  })?;
  b.production("symbol", vec![sym("ID")], None, |_, rhs| {
    Ok(RuleValue::Symbol(Symbol::from(text(rhs, 0)?)))
  })?;
  b.production("symbol", vec![sym("LITERAL")], None, |_, rhs| {
    let c = text(rhs, 0)?.chars().next().ok_or(SyntaxFault)?;
    Ok(RuleValue::Symbol(Symbol::Literal(c)))
  })?;
  b.error_handler(|errors, _| {
    *errors += 1;
    Recovery::Panic
  });

  b.build(LrMethod::Lalr)
}

pub struct RuleParser {
  parser: Parser<RuleValue, usize>,
}

impl RuleParser {
  pub fn new() -> Result<Self, BuildError> {
    Ok(Self {
      parser: Parser::new(bootstrap()?, 0),
    })
  }

  /// Fails on any syntax error, even one panic mode recovered from.
  pub fn parse(&mut self, text: &str) -> Result<RuleDecl, RuleSyntaxError> {
    *self.parser.context_mut() = 0;
    let value = self.parser.parse(text)?;
    match value {
      Some(RuleValue::Decl(decl)) if *self.parser.context() == 0 => Ok(decl),
      _ => Err(RuleSyntaxError::Invalid(text.to_owned())),
    }
  }
}
