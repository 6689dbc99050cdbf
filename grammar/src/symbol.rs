use std::fmt;

/// Name of the end-of-input terminal.
pub const END: &str = "$end";
/// Name of the terminal shifted during error recovery.
pub const ERROR: &str = "error";

/// A grammar symbol.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
  /// Named terminal, e.g. `NUMBER`.
  Token(String),
  /// Single-character terminal, e.g. `'+'`.
  Literal(char),
  Nonterminal(String),
}

impl Symbol {
  pub fn token(name: impl Into<String>) -> Self {
    Symbol::Token(name.into())
  }

  pub fn nonterminal(name: impl Into<String>) -> Self {
    Symbol::Nonterminal(name.into())
  }

  pub fn end() -> Self {
    Symbol::Token(END.to_owned())
  }

  pub fn error() -> Self {
    Symbol::Token(ERROR.to_owned())
  }

  pub fn is_terminal(&self) -> bool {
    !self.is_nonterminal()
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Symbol::Nonterminal(_))
  }

  pub fn is_end(&self) -> bool {
    matches!(self, Symbol::Token(name) if name == END)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, Symbol::Token(name) if name == ERROR)
  }

  pub fn as_nonterminal(&self) -> Option<&str> {
    match self {
      Symbol::Nonterminal(name) => Some(name),
      _ => None,
    }
  }
}

/// Upper-case style name: starts with a letter or `_` and has no lower-case
/// letter.
pub fn is_token_name(name: &str) -> bool {
  starts_like_identifier(name) && !name.chars().any(char::is_lowercase)
}

/// Lower-case style name: starts with a letter or `_` and has no upper-case
/// letter.
pub fn is_nonterminal_name(name: &str) -> bool {
  starts_like_identifier(name) && !name.chars().any(char::is_uppercase)
}

fn starts_like_identifier(name: &str) -> bool {
  name.chars()
    .next()
    .map_or(false, |c| c.is_alphabetic() || c == '_')
}

/// Classifies a bare name the way rule strings are read: a single
/// punctuation character is a literal, `error`, `$end` and upper-case names
/// are tokens, everything else is a nonterminal.
impl From<&str> for Symbol {
  fn from(name: &str) -> Self {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
      (Some(c), None) if !c.is_alphanumeric() && c != '_' => Symbol::Literal(c),
      _ if name == ERROR || name == END || is_token_name(name) => {
        Symbol::Token(name.to_owned())
      }
      _ => Symbol::Nonterminal(name.to_owned()),
    }
  }
}

impl From<String> for Symbol {
  fn from(name: String) -> Self {
    Symbol::from(name.as_str())
  }
}

impl From<char> for Symbol {
  fn from(c: char) -> Self {
    Symbol::Literal(c)
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Symbol::Token(name) | Symbol::Nonterminal(name) => f.pad(name),
      Symbol::Literal(c) => f.pad(&format!("'{}'", c)),
    }
  }
}
