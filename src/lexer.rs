use std::fmt;
use std::sync::Arc;
use grammar::Symbol;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: Symbol,
  pub text: String,
  /// Byte offset in the input.
  pub pos: usize,
  pub lineno: usize,
}

impl Token {
  pub fn new(kind: Symbol, text: impl Into<String>, pos: usize, lineno: usize) -> Self {
    Self {
      kind,
      text: text.into(),
      pos,
      lineno,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}({:?}) at {}:{}", self.kind, self.text, self.lineno, self.pos)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
  #[error("illegal character {ch:?} at index {pos}")]
  IllegalCharacter {
    ch: char,
    pos: usize,
  },
}

/// Position of a token stream. Token callbacks and the error handler may
/// move it.
#[derive(Debug, Clone)]
pub struct LexState<'i> {
  input: &'i str,
  pub pos: usize,
  pub lineno: usize,
}

impl<'i> LexState<'i> {
  pub fn input(&self) -> &'i str {
    self.input
  }

  /// Unconsumed input.
  pub fn rest(&self) -> &'i str {
    &self.input[self.pos.min(self.input.len())..]
  }

  /// Skips `n` characters.
  pub fn skip(&mut self, n: usize) {
    let len = self.rest()
      .chars()
      .take(n)
      .map(char::len_utf8)
      .sum::<usize>();
    self.pos += len;
  }
}

/// May rewrite a matched token or drop it by returning `None`.
pub type TokenCallback =
  Arc<dyn Fn(Token, &mut LexState<'_>) -> Option<Token> + Send + Sync>;
/// Runs on text matched by a rule that produces no token.
pub type SkipCallback = Arc<dyn Fn(&str, &mut LexState<'_>) + Send + Sync>;

#[derive(Clone)]
enum RuleKind {
  Token(Symbol, Option<TokenCallback>),
  Skip(Option<SkipCallback>),
}

#[derive(Clone)]
struct Rule {
  regex: Regex,
  kind: RuleKind,
}

/// Regex-driven tokenizer. Rules are tried in declaration order and the
/// first non-empty match wins; then literals; then the error handler.
#[derive(Clone)]
pub struct Lexer {
  rules: Vec<Rule>,
  metatokens: Vec<String>,
  literals: Vec<char>,
  ignore: Vec<char>,
  on_error: Option<TokenCallback>,
}

impl fmt::Debug for Lexer {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Lexer")
      .field("rules", &self.rules.iter().map(|r| r.regex.as_str()).collect::<Vec<_>>())
      .field("metatokens", &self.metatokens)
      .field("literals", &self.literals)
      .field("ignore", &self.ignore)
      .finish()
  }
}

impl Lexer {
  pub fn builder() -> LexerBuilder {
    LexerBuilder::default()
  }

  /// Names of the tokens the rules can produce, in declaration order,
  /// followed by the metatokens.
  pub fn token_names(&self) -> Vec<&str> {
    let rule_names = self.rules.iter().filter_map(|rule| match &rule.kind {
      RuleKind::Token(Symbol::Token(name), _) => Some(name.as_str()),
      _ => None,
    });
    let mut names = vec![];
    for name in rule_names.chain(self.metatokens.iter().map(String::as_str)) {
      if !names.contains(&name) {
        names.push(name);
      }
    }
    names
  }

  pub fn literals(&self) -> &[char] {
    &self.literals
  }

  pub fn tokens<'l, 'i>(&'l self, input: &'i str) -> Tokens<'l, 'i> {
    Tokens {
      lexer: self,
      state: LexState {
        input,
        pos: 0,
        lineno: 1,
      },
    }
  }
}

#[derive(Default)]
pub struct LexerBuilder {
  rules: Vec<(String, RuleKind)>,
  metatokens: Vec<String>,
  literals: Vec<char>,
  ignore: Vec<char>,
  on_error: Option<TokenCallback>,
}

impl LexerBuilder {
  pub fn token(mut self, name: &str, pattern: &str) -> Self {
    self.rules.push((pattern.to_owned(), RuleKind::Token(Symbol::token(name), None)));
    self
  }

  pub fn token_with<F>(mut self, name: &str, pattern: &str, callback: F) -> Self
  where
    F: Fn(Token, &mut LexState<'_>) -> Option<Token> + Send + Sync + 'static,
  {
    self.rules.push((
      pattern.to_owned(),
      RuleKind::Token(Symbol::token(name), Some(Arc::new(callback))),
    ));
    self
  }

  /// Matched text is consumed without producing a token.
  pub fn skip(mut self, pattern: &str) -> Self {
    self.rules.push((pattern.to_owned(), RuleKind::Skip(None)));
    self
  }

  pub fn skip_with<F>(mut self, pattern: &str, callback: F) -> Self
  where
    F: Fn(&str, &mut LexState<'_>) + Send + Sync + 'static,
  {
    self.rules.push((pattern.to_owned(), RuleKind::Skip(Some(Arc::new(callback)))));
    self
  }

  /// Token kinds with no rule of their own, produced by callbacks that
  /// rewrite a token's kind.
  pub fn metatokens(mut self, names: &[&str]) -> Self {
    self.metatokens.extend(names.iter().map(|n| n.to_string()));
    self
  }

  /// Each character becomes a token of its own kind.
  pub fn literals(mut self, chars: &str) -> Self {
    self.literals.extend(chars.chars());
    self
  }

  pub fn ignore(mut self, chars: &str) -> Self {
    self.ignore.extend(chars.chars());
    self
  }

  pub fn ignore_spaces_and_tabs(self) -> Self {
    self.ignore(" \t")
  }

  /// `NUMBER` tokens made of decimal digits.
  pub fn number_tokens(self) -> Self {
    self.token("NUMBER", r"\d+")
  }

  /// `STRING` tokens in double quotes, with the quotes stripped from the
  /// text.
  pub fn double_quoted_strings(self) -> Self {
    self.token_with("STRING", r#""[^"]*""#, |mut t, _| {
      t.text = t.text[1..t.text.len() - 1].to_owned();
      Some(t)
    })
  }

  /// Called with an `error` token holding the offending character. The
  /// handler must advance the position, otherwise lexing fails.
  pub fn on_error<F>(mut self, handler: F) -> Self
  where
    F: Fn(Token, &mut LexState<'_>) -> Option<Token> + Send + Sync + 'static,
  {
    self.on_error = Some(Arc::new(handler));
    self
  }

  pub fn build(self) -> Result<Lexer, regex::Error> {
    let rules = self.rules.into_iter()
      .map(|(pattern, kind)| {
        let regex = Regex::new(&format!(r"\A(?:{})", pattern))?;
        Ok(Rule { regex, kind })
      })
      .collect::<Result<Vec<_>, regex::Error>>()?;
    Ok(Lexer {
      rules,
      metatokens: self.metatokens,
      literals: self.literals,
      ignore: self.ignore,
      on_error: self.on_error,
    })
  }
}

pub struct Tokens<'l, 'i> {
  lexer: &'l Lexer,
  state: LexState<'i>,
}

impl<'l, 'i> Tokens<'l, 'i> {
  pub fn state(&self) -> &LexState<'i> {
    &self.state
  }
}

impl<'l, 'i> Iterator for Tokens<'l, 'i> {
  type Item = Result<Token, LexError>;

  fn next(&mut self) -> Option<Self::Item> {
    let input = self.state.input;
    while self.state.pos < input.len() {
      let pos = self.state.pos;
      let rest = &input[pos..];
      let c = rest.chars().next()?;

      if self.lexer.ignore.contains(&c) {
        self.state.pos += c.len_utf8();
        continue;
      }

      let matched = self.lexer.rules.iter().find_map(|rule| {
        rule.regex.find(rest)
          .filter(|m| !m.as_str().is_empty())
          .map(|m| (rule, m.as_str()))
      });
      if let Some((rule, text)) = matched {
        self.state.pos += text.len();
        match &rule.kind {
          RuleKind::Token(kind, callback) => {
            let token = Token::new(kind.clone(), text, pos, self.state.lineno);
            match callback {
              Some(callback) => match callback(token, &mut self.state) {
                Some(token) => return Some(Ok(token)),
                None => continue,
              },
              None => return Some(Ok(token)),
            }
          }
          RuleKind::Skip(callback) => {
            if let Some(callback) = callback {
              callback(text, &mut self.state);
            }
            continue;
          }
        }
      }

      if self.lexer.literals.contains(&c) {
        self.state.pos += c.len_utf8();
        return Some(Ok(Token::new(Symbol::Literal(c), c.to_string(), pos, self.state.lineno)));
      }

      let err = LexError::IllegalCharacter { ch: c, pos };
      match &self.lexer.on_error {
        Some(handler) => {
          let token = Token::new(Symbol::error(), c.to_string(), pos, self.state.lineno);
          let result = handler(token, &mut self.state);
          if self.state.pos == pos {
            self.state.pos += c.len_utf8();
            return Some(Err(err));
          }
          if let Some(token) = result {
            return Some(Ok(token));
          }
        }
        None => {
          self.state.pos += c.len_utf8();
          return Some(Err(err));
        }
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn kinds(lexer: &Lexer, input: &str) -> Vec<String> {
    lexer.tokens(input)
      .map(|t| t.unwrap())
      .map(|t| format!("{} {}", t.kind, t.text))
      .collect()
  }

  fn calc() -> Lexer {
    Lexer::builder()
      .token("NAME", r"[a-zA-Z_][a-zA-Z0-9_]*")
      .token("NUMBER", r"\d+")
      .skip_with(r"\n+", |text, state| state.lineno += text.len())
      .literals("=+-*/()")
      .ignore(" \t")
      .build()
      .unwrap()
  }

  #[test]
  fn tokens_in_order() {
    assert_eq!(kinds(&calc(), "x = 3 * (y1+4)"), vec![
      "NAME x", "'=' =", "NUMBER 3", "'*' *", "'(' (", "NAME y1", "'+' +",
      "NUMBER 4", "')' )",
    ]);
  }

  #[test]
  fn first_rule_wins() {
    let lexer = Lexer::builder()
      .token("IF", "if")
      .token("NAME", "[a-z]+")
      .ignore(" ")
      .build()
      .unwrap();
    assert_eq!(kinds(&lexer, "if iffy"), vec!["IF if", "IF if", "NAME fy"]);
  }

  #[test]
  fn line_numbers() {
    let tokens = calc().tokens("a\n\nb\nc")
      .map(|t| t.unwrap().lineno)
      .collect::<Vec<_>>();
    assert_eq!(tokens, vec![1, 3, 4]);
  }

  #[test]
  fn callback_rewrites_and_drops() {
    let lexer = Lexer::builder()
      .token_with("NUMBER", r"\d+", |mut t, _| {
        t.text = t.text.trim_start_matches('0').to_owned();
        Some(t)
      })
      .token_with("COMMENT", r"#[^\n]*", |_, _| None)
      .ignore(" ")
      .build()
      .unwrap();
    assert_eq!(kinds(&lexer, "007 # note"), vec!["NUMBER 7"]);
    assert_eq!(lexer.token_names(), vec!["NUMBER", "COMMENT"]);
  }

  #[test]
  fn illegal_character() {
    let lexer = Lexer::builder().token("NUMBER", r"\d+").build().unwrap();
    let mut tokens = lexer.tokens("test");
    assert_eq!(
      tokens.next(),
      Some(Err(LexError::IllegalCharacter { ch: 't', pos: 0 })));
  }

  #[test]
  fn error_handler_skips() {
    let lexer = Lexer::builder()
      .token("NUMBER", r"\d+")
      .ignore(" ")
      .on_error(|_, state| {
        state.skip(1);
        None
      })
      .build()
      .unwrap();
    assert_eq!(kinds(&lexer, "1 $ 2"), vec!["NUMBER 1", "NUMBER 2"]);
  }

  #[test]
  fn error_handler_must_advance() {
    let lexer = Lexer::builder()
      .token("NUMBER", r"\d+")
      .on_error(|t, _| Some(t))
      .build()
      .unwrap();
    assert_eq!(
      lexer.tokens("1$").collect::<Vec<_>>(),
      vec![
        Ok(Token::new(Symbol::token("NUMBER"), "1", 0, 1)),
        Err(LexError::IllegalCharacter { ch: '$', pos: 1 }),
      ]);
  }

  #[test]
  fn metatokens_are_token_names() {
    let lexer = Lexer::builder()
      .token_with("NAME", "[a-z]+", |mut t, _| {
        if t.text == "if" {
          t.kind = Symbol::token("IF");
        }
        Some(t)
      })
      .metatokens(&["IF", "NAME"])
      .ignore(" ")
      .build()
      .unwrap();
    assert_eq!(lexer.token_names(), vec!["NAME", "IF"]);
    assert_eq!(kinds(&lexer, "if x"), vec!["IF if", "NAME x"]);
  }

  #[test]
  fn presets() {
    let lexer = Lexer::builder()
      .number_tokens()
      .double_quoted_strings()
      .ignore_spaces_and_tabs()
      .build()
      .unwrap();
    assert_eq!(kinds(&lexer, "12 \"a b\"\t\"\" 3"), vec![
      "NUMBER 12", "STRING a b", "STRING ", "NUMBER 3",
    ]);
  }

  #[test]
  fn empty_matches_are_ignored() {
    let lexer = Lexer::builder()
      .token("SPACE", r" *")
      .token("NUMBER", r"\d+")
      .build()
      .unwrap();
    assert_eq!(kinds(&lexer, "1 2"), vec!["NUMBER 1", "SPACE  ", "NUMBER 2"]);
  }
}
