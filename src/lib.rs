//! Build LALR(1) or SLR parsers at runtime from yacc-style rules.
//!
//! A [`Lexer`] turns input into tokens, a [`ParserBuilder`] collects
//! precedence declarations and rules with their reductions, and the
//! resulting [`CompiledParser`] drives any number of [`Parser`]s.

mod builder;
pub mod grammar_file;
mod lexer;
mod parser;
mod rule_parser;

pub use builder::{BuildError, ParserBuilder};
pub use lexer::{LexError, LexState, Lexer, LexerBuilder, Token, Tokens};
pub use parser::{
  CompiledParser, ErrorFn, Parser, Recovery, ReduceFn, Rhs, StackValue,
  SyntaxFault, ERROR_COUNT, value_of,
};
pub use rule_parser::{Alternative, RuleDecl, RuleParser, RuleSyntaxError};

pub use grammar::{Assoc, Grammar, GrammarError, Precedence, Symbol};
pub use lr::{LrMethod, LrTable, Report, TableError};
