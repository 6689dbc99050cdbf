use std::sync::Arc;
use grammar::{Assoc, Grammar, GrammarError, Symbol};
use log::info;
use lr::{LrMethod, TableError};
use thiserror::Error;
use crate::lexer::{Lexer, Token};
use crate::parser::{CompiledParser, ErrorFn, Recovery, ReduceFn, Rhs, SyntaxFault};
use crate::rule_parser::{RuleParser, RuleSyntaxError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error(transparent)]
  Table(#[from] TableError),
  #[error(transparent)]
  Rule(#[from] RuleSyntaxError),
  #[error("bad lexer rule: {0}")]
  Regex(#[from] regex::Error),
}

/// Collects precedence declarations and rules, then compiles them into a
/// [`CompiledParser`].
///
/// ```
/// use lalrgen::{Assoc, Lexer, LrMethod, ParserBuilder, Parser};
///
/// let lexer = Lexer::builder()
///   .token("NUMBER", r"\d+")
///   .literals("+")
///   .ignore(" ")
///   .build()
///   .unwrap();
/// let mut builder = ParserBuilder::<i64, ()>::new(lexer).unwrap();
/// builder.precedence(Assoc::LeftAssoc, ["+"]).unwrap();
/// builder.rule("expr : expr '+' expr", |_, rhs| {
///   Ok(rhs.take(0).unwrap_or(0) + rhs.take(2).unwrap_or(0))
/// }).unwrap();
/// builder.rule("expr : NUMBER", |_, rhs| {
///   Ok(rhs.text(0).and_then(|t| t.parse().ok()).unwrap_or(0))
/// }).unwrap();
/// let compiled = builder.build(LrMethod::Lalr).unwrap();
///
/// let mut parser = Parser::new(compiled, ());
/// assert_eq!(parser.parse("1 + 2 + 3").unwrap(), Some(6));
/// ```
pub struct ParserBuilder<V, C> {
  grammar: Grammar<ReduceFn<V, C>>,
  lexer: Lexer,
  level: u32,
  on_error: Option<ErrorFn<C>>,
  start: Option<String>,
  rule_parser: Option<RuleParser>,
}

impl<V, C> ParserBuilder<V, C> {
  /// Terminals are the tokens named by the lexer's rules; literals are
  /// registered as rules use them.
  pub fn new(lexer: Lexer) -> Result<Self, BuildError> {
    let grammar = Grammar::new(lexer.token_names())?;
    Ok(Self {
      grammar,
      lexer,
      level: 0,
      on_error: None,
      start: None,
      rule_parser: None,
    })
  }

  /// Declares one precedence level, binding tighter than every level
  /// declared before it.
  pub fn precedence<I, S>(&mut self, assoc: Assoc, terminals: I) -> Result<&mut Self, BuildError>
  where
    I: IntoIterator<Item = S>,
    S: Into<Symbol>,
  {
    self.level += 1;
    for term in terminals {
      self.grammar.set_precedence(term.into(), assoc, self.level)?;
    }
    Ok(self)
  }

  /// Adds every alternative of a rule such as
  /// `expr : expr '+' expr | '-' expr %prec UMINUS`, all sharing `action`.
  pub fn rule<F>(&mut self, text: &str, action: F) -> Result<&mut Self, BuildError>
  where
    F: Fn(&mut C, &mut Rhs<'_, V>) -> Result<V, SyntaxFault> + Send + Sync + 'static,
  {
    self.add_rule(text, Some(Arc::new(action)))
  }

  /// Adds a rule whose reductions produce no value.
  pub fn declare(&mut self, text: &str) -> Result<&mut Self, BuildError> {
    self.add_rule(text, None)
  }

  fn add_rule(
    &mut self,
    text: &str,
    action: Option<ReduceFn<V, C>>,
  ) -> Result<&mut Self, BuildError> {
    let mut rule_parser = match self.rule_parser.take() {
      Some(rule_parser) => rule_parser,
      None => RuleParser::new()?,
    };
    let decl = rule_parser.parse(text);
    self.rule_parser = Some(rule_parser);
    let decl = decl?;
    for alt in decl.alternatives {
      let prec = alt.prec.map(Symbol::from);
      self.grammar.add_production(&decl.name, alt.symbols, prec.as_ref(), action.clone())?;
    }
    Ok(self)
  }

  /// Adds a single production.
  pub fn production<F>(
    &mut self,
    name: &str,
    symbols: Vec<Symbol>,
    prec: Option<Symbol>,
    action: F,
  ) -> Result<&mut Self, BuildError>
  where
    F: Fn(&mut C, &mut Rhs<'_, V>) -> Result<V, SyntaxFault> + Send + Sync + 'static,
  {
    let action: ReduceFn<V, C> = Arc::new(action);
    self.grammar.add_production(name, symbols, prec.as_ref(), Some(action))?;
    Ok(self)
  }

  /// Called on a syntax error with the offending token, `None` at end of
  /// input.
  pub fn error_handler<F>(&mut self, handler: F) -> &mut Self
  where
    F: Fn(&mut C, Option<&Token>) -> Recovery + Send + Sync + 'static,
  {
    self.on_error = Some(Arc::new(handler));
    self
  }

  /// Defaults to the left side of the first rule.
  pub fn start(&mut self, name: &str) -> &mut Self {
    self.start = Some(name.to_owned());
    self
  }

  pub fn grammar(&self) -> &Grammar<ReduceFn<V, C>> {
    &self.grammar
  }

  pub fn build(self, method: LrMethod) -> Result<Arc<CompiledParser<V, C>>, BuildError> {
    let mut grammar = self.grammar;
    grammar.set_start(self.start.as_deref())?;
    let table = lr::build(&mut grammar, method)?;
    info!("built {:?} parser: {} productions, {} states",
      method, grammar.productions().len(), table.states.len());
    Ok(Arc::new(CompiledParser {
      grammar,
      table,
      lexer: self.lexer,
      on_error: self.on_error,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn builder() -> ParserBuilder<i64, ()> {
    let lexer = Lexer::builder()
      .token("VALUE", r"\d+")
      .literals("+-*/")
      .build()
      .unwrap();
    ParserBuilder::new(lexer).unwrap()
  }

  #[test]
  fn each_alternative_is_a_production() {
    let mut b = builder();
    b.rule("expr : expr '+' VALUE | expr '-' VALUE | expr '*' VALUE | expr '/' VALUE",
      |_, _| Ok(0)).unwrap();
    b.declare("expr : VALUE").unwrap();

    let prods = b.grammar().productions();
    assert_eq!(prods.len(), 6);
    assert_eq!(prods[3].to_string(), "expr -> expr '*' VALUE");
    assert!(prods[1..5].iter().all(|p| p.action.is_some()));
    assert!(prods[5].action.is_none());
  }

  #[test]
  fn empty_alternative() {
    let mut b = builder();
    b.declare("rule : VALUE |").unwrap();
    let prods = b.grammar().productions();
    assert_eq!(prods[2].to_string(), "rule -> <empty>");
  }

  #[test]
  fn precedence_levels_increase() {
    let mut b = builder();
    b.precedence(Assoc::LeftAssoc, ['+', '-']).unwrap()
      .precedence(Assoc::NonAssoc, ['*']).unwrap();
    let prec = b.grammar().precedence();
    assert_eq!(prec[&Symbol::Literal('-')].level, 1);
    assert_eq!(prec[&Symbol::Literal('*')].level, 2);
    assert_eq!(prec[&Symbol::Literal('*')].assoc, Assoc::NonAssoc);
  }

  #[test]
  fn rules_use_metatokens() {
    let lexer = Lexer::builder()
      .token_with("NAME", "[a-z]+", |mut t, _| {
        if t.text == "if" {
          t.kind = Symbol::token("IF");
        }
        Some(t)
      })
      .metatokens(&["IF"])
      .ignore(" ")
      .build()
      .unwrap();
    let mut b = ParserBuilder::<i64, ()>::new(lexer).unwrap();
    b.rule("stmt : IF NAME", |_, rhs| Ok(rhs.text(1).map_or(0, |t| t.len() as i64)))
      .unwrap();
    let mut parser = crate::Parser::new(b.build(LrMethod::Lalr).unwrap(), ());

    assert_eq!(parser.parse("if abc"), Ok(Some(3)));
    assert_eq!(parser.parse("abc if"), Ok(None));
  }

  #[test]
  fn errors() {
    let mut b = builder();
    assert!(matches!(
      b.declare("expr : NUMBER"),
      Err(BuildError::Grammar(GrammarError::UnknownToken(_)))));
    assert!(matches!(
      b.declare("expr VALUE"),
      Err(BuildError::Rule(RuleSyntaxError::Invalid(_)))));
    b.declare("expr : VALUE").unwrap();
    assert!(matches!(
      b.precedence(Assoc::LeftAssoc, ['+']),
      Err(BuildError::Grammar(GrammarError::PrecedenceAfterProductions(_)))));
    assert!(matches!(
      builder().build(LrMethod::Lalr),
      Err(BuildError::Grammar(GrammarError::NoProductions))));
  }
}
