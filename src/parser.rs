use std::fmt;
use std::sync::Arc;
use grammar::{Grammar, Symbol};
use log::{debug, log_enabled, trace, warn, Level};
use lr::{Action, LrTable};
use thiserror::Error;
use crate::lexer::{LexError, Lexer, Token};

/// Tokens shifted after an error before errors are reported again.
pub const ERROR_COUNT: usize = 3;

/// Returned by a reduction to signal a syntax error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("syntax error signaled by a reduction")]
pub struct SyntaxFault;

/// A slot on the value stack.
#[derive(Debug, Clone, PartialEq)]
pub enum StackValue<V> {
  Token(Token),
  Value(V),
  Empty,
}

impl<V> StackValue<V> {
  pub fn token(&self) -> Option<&Token> {
    match self {
      StackValue::Token(t) => Some(t),
      _ => None,
    }
  }

  pub fn value(&self) -> Option<&V> {
    match self {
      StackValue::Value(v) => Some(v),
      _ => None,
    }
  }

  pub fn into_value(self) -> Option<V> {
    match self {
      StackValue::Value(v) => Some(v),
      _ => None,
    }
  }
}

/// Right-hand side of the production being reduced.
pub struct Rhs<'a, V> {
  values: &'a mut [StackValue<V>],
  errok: &'a mut bool,
}

impl<'a, V> Rhs<'a, V> {
  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn get(&self, i: usize) -> Option<&StackValue<V>> {
    self.values.get(i)
  }

  pub fn token(&self, i: usize) -> Option<&Token> {
    self.get(i)?.token()
  }

  /// Text of the token at `i`.
  pub fn text(&self, i: usize) -> Option<&str> {
    self.token(i).map(|t| t.text.as_str())
  }

  /// Moves out the value at `i`, leaving `Empty`.
  pub fn take(&mut self, i: usize) -> Option<V> {
    let slot = self.values.get_mut(i)?;
    match std::mem::replace(slot, StackValue::Empty) {
      StackValue::Value(v) => Some(v),
      other => {
        *slot = other;
        None
      }
    }
  }

  /// Leaves error recovery: the next error is reported at once.
  pub fn errok(&mut self) {
    *self.errok = true;
  }
}

pub type ReduceFn<V, C> =
  Arc<dyn Fn(&mut C, &mut Rhs<'_, V>) -> Result<V, SyntaxFault> + Send + Sync>;
pub type ErrorFn<C> = Arc<dyn Fn(&mut C, Option<&Token>) -> Recovery + Send + Sync>;

/// Reduction that passes on the value at `i`, as in `expr : '(' expr ')'`.
pub fn value_of<V, C>(
  i: usize,
) -> impl Fn(&mut C, &mut Rhs<'_, V>) -> Result<V, SyntaxFault> + Send + Sync + Clone {
  move |_: &mut C, rhs: &mut Rhs<'_, V>| rhs.take(i).ok_or(SyntaxFault)
}

/// What the error handler asks the parser to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
  /// Leave error recovery and continue with the given lookahead, or with
  /// the next token if `None`.
  Resume(Option<Token>),
  /// Discard stack and input until a state can shift `error`.
  Panic,
}

/// A grammar with its table and lexer, ready to be shared by parsers.
pub struct CompiledParser<V, C> {
  pub(crate) grammar: Grammar<ReduceFn<V, C>>,
  pub(crate) table: LrTable,
  pub(crate) lexer: Lexer,
  pub(crate) on_error: Option<ErrorFn<C>>,
}

impl<V, C> CompiledParser<V, C> {
  pub fn grammar(&self) -> &Grammar<ReduceFn<V, C>> {
    &self.grammar
  }

  pub fn table(&self) -> &LrTable {
    &self.table
  }

  pub fn lexer(&self) -> &Lexer {
    &self.lexer
  }

  pub fn report(&self) -> String {
    lr::Report::new(&self.grammar, &self.table).to_string()
  }
}

impl<V, C> fmt::Debug for CompiledParser<V, C> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("CompiledParser")
      .field("productions", &self.grammar.productions().len())
      .field("states", &self.table.states.len())
      .field("method", &self.table.method)
      .finish()
  }
}

/// Runs a compiled parser over inputs, threading the user context `C`
/// through the reductions.
pub struct Parser<V, C> {
  compiled: Arc<CompiledParser<V, C>>,
  context: C,
}

impl<V, C> Parser<V, C> {
  pub fn new(compiled: Arc<CompiledParser<V, C>>, context: C) -> Self {
    Self { compiled, context }
  }

  pub fn compiled(&self) -> &Arc<CompiledParser<V, C>> {
    &self.compiled
  }

  pub fn context(&self) -> &C {
    &self.context
  }

  pub fn context_mut(&mut self) -> &mut C {
    &mut self.context
  }

  pub fn into_context(self) -> C {
    self.context
  }

  /// Returns the value of the start symbol, or `None` if the input could
  /// not be parsed.
  pub fn parse(&mut self, input: &str) -> Result<Option<V>, LexError> {
    let compiled = Arc::clone(&self.compiled);
    let tokens = compiled.lexer.tokens(input);
    run(&compiled, &mut self.context, tokens)
  }

  /// Parses an already tokenized input.
  pub fn parse_tokens<I>(&mut self, tokens: I) -> Result<Option<V>, LexError>
  where
    I: IntoIterator<Item = Result<Token, LexError>>,
  {
    let compiled = Arc::clone(&self.compiled);
    run(&compiled, &mut self.context, tokens.into_iter())
  }
}

enum Status<V> {
  Running,
  Accepted(Option<V>),
  Failed,
}

struct Run<'p, V, C, I> {
  compiled: &'p CompiledParser<V, C>,
  context: &'p mut C,
  tokens: I,
  states: Vec<usize>,
  symbols: Vec<Symbol>,
  values: Vec<StackValue<V>>,
  lookahead: Option<Token>,
  pushback: Vec<Token>,
  errorcount: usize,
  errorok: bool,
  /// where `$end` is reported
  end: (usize, usize),
}

fn run<V, C, I>(
  compiled: &CompiledParser<V, C>,
  context: &mut C,
  tokens: I,
) -> Result<Option<V>, LexError>
where
  I: Iterator<Item = Result<Token, LexError>>,
{
  let mut run = Run {
    compiled,
    context,
    tokens,
    states: vec![0],
    symbols: vec![Symbol::end()],
    values: vec![StackValue::Empty],
    lookahead: None,
    pushback: vec![],
    errorcount: 0,
    errorok: false,
    end: (0, 1),
  };
  loop {
    match run.step()? {
      Status::Running => {}
      Status::Accepted(value) => return Ok(value),
      Status::Failed => return Ok(None),
    }
  }
}

impl<'p, V, C, I> Run<'p, V, C, I>
where
  I: Iterator<Item = Result<Token, LexError>>,
{
  fn next_token(&mut self) -> Result<Token, LexError> {
    if let Some(token) = self.pushback.pop() {
      return Ok(token);
    }
    match self.tokens.next().transpose()? {
      Some(token) => {
        self.end = (token.pos + token.text.len(), token.lineno);
        Ok(token)
      }
      None => Ok(Token::new(Symbol::end(), "", self.end.0, self.end.1)),
    }
  }

  fn state(&self) -> usize {
    self.states.last().copied().unwrap_or(0)
  }

  fn step(&mut self) -> Result<Status<V>, LexError> {
    let lookahead = match self.lookahead.take() {
      Some(token) => token,
      None => self.next_token()?,
    };
    let state = self.state();
    let action = self.compiled.table.action_on(state, &lookahead.kind);

    if log_enabled!(Level::Trace) {
      trace!("state {} stack [{}] lookahead {} action {:?}",
        state,
        self.symbols[1..].iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" "),
        lookahead,
        action);
    }

    match action {
      Some(Action::Shift(next)) => {
        self.states.push(next);
        self.symbols.push(lookahead.kind.clone());
        self.values.push(StackValue::Token(lookahead));
        if self.errorcount > 0 {
          self.errorcount -= 1;
        }
        Ok(Status::Running)
      }
      Some(Action::Reduce(p)) => Ok(self.reduce(p, lookahead)),
      Some(Action::Accept) => {
        let value = self.values.pop().and_then(StackValue::into_value);
        Ok(Status::Accepted(value))
      }
      None => Ok(self.error(lookahead)),
    }
  }

  fn reduce(&mut self, p: usize, lookahead: Token) -> Status<V> {
    let compiled = self.compiled;
    let prod = compiled.grammar.production(p);
    let n = prod.len();
    let base = self.values.len() - n;
    let mut rhs_values = self.values.split_off(base);
    let rhs_symbols = self.symbols.split_off(base);

    let result = match &prod.action {
      Some(action) => {
        let mut rhs = Rhs {
          values: &mut rhs_values,
          errok: &mut self.errorok,
        };
        action(self.context, &mut rhs).map(StackValue::Value)
      }
      None => Ok(StackValue::Empty),
    };

    match result {
      Ok(value) => {
        self.states.truncate(self.states.len() - n);
        let next = match compiled.table.goto_on(self.state(), &prod.name) {
          Some(next) => next,
          None => {
            warn!("no goto from state {} on {}", self.state(), prod.name);
            return Status::Failed;
          }
        };
        self.states.push(next);
        self.symbols.push(Symbol::Nonterminal(prod.name.clone()));
        self.values.push(value);
        self.lookahead = Some(lookahead);
      }
      Err(SyntaxFault) => {
        debug!("reduction of {} signaled a syntax error", prod);
        let pos = lookahead.pos;
        let lineno = lookahead.lineno;
        self.pushback.push(lookahead);
        if n > 0 {
          // put back all but the last symbol
          self.symbols.extend(rhs_symbols.into_iter().take(n - 1));
          self.values.extend(rhs_values.into_iter().take(n - 1));
          self.states.pop();
        } else if self.states.len() > 1 {
          self.states.pop();
          self.symbols.pop();
          self.values.pop();
        }
        self.lookahead = Some(Token::new(Symbol::error(), "error", pos, lineno));
        self.errorcount = ERROR_COUNT;
        self.errorok = false;
      }
    }
    Status::Running
  }

  fn error(&mut self, lookahead: Token) -> Status<V> {
    if self.errorcount == 0 || self.errorok {
      self.errorcount = ERROR_COUNT;
      self.errorok = false;
      let errtoken = if lookahead.kind.is_end() {
        None
      } else {
        Some(&lookahead)
      };

      let compiled = self.compiled;
      match &compiled.on_error {
        Some(handler) => {
          if let Recovery::Resume(token) = handler(self.context, errtoken) {
            // resuming at the end of input with no new token would loop
            if errtoken.is_none() && token.as_ref().map_or(true, |t| t.kind.is_end()) {
              debug!("error handler resumed at end of input");
              return Status::Failed;
            }
            self.errorok = true;
            self.lookahead = token;
            return Status::Running;
          }
        }
        None => match errtoken {
          Some(token) => warn!("syntax error at {}", token),
          None => {
            warn!("syntax error at end of input");
            return Status::Failed;
          }
        },
      }
    } else {
      self.errorcount = ERROR_COUNT;
    }

    // nothing left to unwind: throw the token away and restart
    if self.states.len() <= 1 && !lookahead.kind.is_end() {
      debug!("discarding {}", lookahead);
      self.pushback.clear();
      return Status::Running;
    }

    if lookahead.kind.is_end() {
      return Status::Failed;
    }

    if !lookahead.kind.is_error() {
      if self.symbols.last().map_or(false, Symbol::is_error) {
        debug!("discarding {}", lookahead);
        return Status::Running;
      }
      let error = Token::new(Symbol::error(), lookahead.text.clone(), lookahead.pos, lookahead.lineno);
      self.pushback.push(lookahead);
      self.lookahead = Some(error);
    } else {
      self.states.pop();
      self.symbols.pop();
      self.values.pop();
      self.lookahead = Some(lookahead);
    }
    Status::Running
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn rhs_access() {
    let mut values = vec![
      StackValue::Value(1),
      StackValue::Token(Token::new(Symbol::Literal('+'), "+", 2, 1)),
      StackValue::Empty,
    ];
    let mut errok = false;
    let mut rhs = Rhs {
      values: &mut values,
      errok: &mut errok,
    };

    assert_eq!(rhs.len(), 3);
    assert_eq!(rhs.text(1), Some("+"));
    assert_eq!(rhs.text(0), None);
    assert_eq!(rhs.take(1), None);
    assert_eq!(rhs.take(0), Some(1));
    assert_eq!(rhs.take(0), None);
    assert_eq!(rhs.take(5), None);
    rhs.errok();

    assert!(errok);
    assert_eq!(values[0], StackValue::Empty);
    assert_eq!(values[1].token().map(|t| t.pos), Some(2));
  }
}
