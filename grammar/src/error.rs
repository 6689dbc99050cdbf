use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
  #[error("invalid name `{0}`")]
  InvalidName(String),
  #[error("`{0}` is a reserved name")]
  ReservedName(String),
  #[error("unknown token `{0}`")]
  UnknownToken(String),
  #[error("duplicate production `{0}`")]
  DuplicateProduction(String),
  #[error("precedence of `{0}` is already set")]
  DuplicatePrecedence(String),
  #[error("precedence of `{0}` must be set before any production")]
  PrecedenceAfterProductions(String),
  #[error("invalid associativity `{0}`")]
  InvalidAssociativity(String),
  #[error("nothing known about the precedence of `{0}`")]
  UndefinedPrecedence(String),
  #[error("start symbol `{0}` is not a defined nonterminal")]
  UnknownStartSymbol(String),
  #[error("nonterminal `{0}` has no production")]
  UndefinedNonterminal(String),
  #[error("grammar has no production")]
  NoProductions,
}
