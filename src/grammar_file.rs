//! Grammar files for the command line tool:
//!
//! ```text
//! %token NUMBER NAME
//! %left '+' '-'
//! %right UMINUS
//! %start statement
//!
//! statement : NAME '=' expression
//!           | expression
//! expression : expression '+' expression
//!            | '-' expression %prec UMINUS
//!            | NUMBER
//! ```
//!
//! Lines starting with `|` continue the previous rule. `#` starts a comment
//! line.

use grammar::{Assoc, Grammar, GrammarError, Symbol};
use lr::{LrMethod, LrTable, TableError};
use thiserror::Error;
use crate::builder::BuildError;
use crate::rule_parser::{RuleDecl, RuleParser, RuleSyntaxError};

#[derive(Debug, Error)]
pub enum GrammarFileError {
  #[error("line {line}: {message}")]
  Directive {
    line: usize,
    message: String,
  },
  #[error("line {line}: {source}")]
  Rule {
    line: usize,
    source: RuleSyntaxError,
  },
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error(transparent)]
  Table(#[from] TableError),
  #[error(transparent)]
  Build(#[from] BuildError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarFile {
  pub tokens: Vec<String>,
  pub precedence: Vec<(Assoc, Vec<Symbol>)>,
  pub start: Option<String>,
  pub rules: Vec<RuleDecl>,
}

impl GrammarFile {
  pub fn parse(input: &str) -> Result<Self, GrammarFileError> {
    let mut file = GrammarFile::default();
    let mut rule_parser = RuleParser::new()?;
    // (first line, text) of the rule being collected
    let mut pending: Option<(usize, String)> = None;

    for (i, line) in input.lines().enumerate() {
      let lineno = i + 1;
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }

      if line.starts_with('|') {
        match &mut pending {
          Some((_, text)) => {
            text.push('\n');
            text.push_str(line);
            continue;
          }
          None => {
            return Err(GrammarFileError::Directive {
              line: lineno,
              message: "alternative without a rule".to_owned(),
            });
          }
        }
      }

      if let Some((first, text)) = pending.take() {
        file.rules.push(parse_rule(&mut rule_parser, first, &text)?);
      }

      if let Some(directive) = line.strip_prefix('%') {
        file.directive(lineno, directive)?;
      } else {
        pending = Some((lineno, line.to_owned()));
      }
    }

    if let Some((first, text)) = pending {
      file.rules.push(parse_rule(&mut rule_parser, first, &text)?);
    }
    Ok(file)
  }

  fn directive(&mut self, line: usize, directive: &str) -> Result<(), GrammarFileError> {
    let mut words = directive.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args = words.collect::<Vec<_>>();
    let bad = |message: &str| GrammarFileError::Directive {
      line,
      message: message.to_owned(),
    };

    match name {
      "token" => self.tokens.extend(args.iter().map(|t| t.to_string())),
      "left" | "right" | "nonassoc" => {
        let assoc = name.parse::<Assoc>()?;
        let terms = args.iter()
          .map(|t| unquote(t))
          .collect::<Vec<_>>();
        if terms.is_empty() {
          return Err(bad("precedence declaration without terminals"));
        }
        self.precedence.push((assoc, terms));
      }
      "start" => match args.as_slice() {
        [start] => self.start = Some(start.to_string()),
        _ => return Err(bad("%start takes one nonterminal")),
      },
      _ => return Err(bad(&format!("unknown directive %{}", name))),
    }
    Ok(())
  }

  /// Builds the grammar, without semantic actions.
  pub fn into_grammar(self) -> Result<Grammar<()>, GrammarFileError> {
    let mut grammar = Grammar::new(&self.tokens)?;
    for (level, (assoc, terms)) in self.precedence.into_iter().enumerate() {
      for term in terms {
        grammar.set_precedence(term, assoc, level as u32 + 1)?;
      }
    }
    for rule in self.rules {
      for alt in rule.alternatives {
        let prec = alt.prec.map(Symbol::from);
        grammar.add_production(&rule.name, alt.symbols, prec.as_ref(), None)?;
      }
    }
    grammar.set_start(self.start.as_deref())?;
    Ok(grammar)
  }
}

fn unquote(text: &str) -> Symbol {
  let mut chars = text.chars();
  match (chars.next(), chars.next(), chars.next(), chars.next()) {
    (Some(q), Some(c), Some(e), None) if (q == '\'' || q == '"') && q == e => {
      Symbol::Literal(c)
    }
    _ => Symbol::from(text),
  }
}

fn parse_rule(
  rule_parser: &mut RuleParser,
  line: usize,
  text: &str,
) -> Result<RuleDecl, GrammarFileError> {
  rule_parser.parse(text)
    .map_err(|source| GrammarFileError::Rule { line, source })
}

/// Reads a grammar file and builds its table.
pub fn compile(
  input: &str,
  method: LrMethod,
) -> Result<(Grammar<()>, LrTable), GrammarFileError> {
  let mut grammar = GrammarFile::parse(input)?.into_grammar()?;
  let table = lr::build(&mut grammar, method)?;
  Ok((grammar, table))
}
