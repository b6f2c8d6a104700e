use crate::ast::Ast;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use crate::token::UNRESERVED_KEYWORDS;

pub mod class_or_object;
pub mod expr;
pub mod func;
pub mod import_export;
pub mod pat;
pub mod stmt;
pub mod type_expr;

// Almost every parse_* function takes this as a parameter. It is a small copy that is altered
// with the with_* methods when a nested construct changes the rules, so nothing needs to be
// unwound after a call returns.
#[derive(Clone, Copy)]
pub struct ParseCtx {
  // Whether the `in` operator is allowed; false in the head of a `for` statement.
  pub allow_in: bool,
}

impl ParseCtx {
  pub fn new() -> ParseCtx {
    ParseCtx { allow_in: true }
  }

  pub fn with_allow_in(&self, allow_in: bool) -> ParseCtx {
    ParseCtx { allow_in, ..*self }
  }
}

#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }
}

pub struct ParserCheckpoint {
  next_tok_i: usize,
  ast_len: usize,
}

/// To get the lexer's `next` after this token was lexed, use `token.loc.1`.
struct BufferedToken {
  token: Token,
  lex_mode: LexMode,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  buf: Vec<BufferedToken>,
  next_tok_i: usize,
  ast: Ast,
}

// Parsing methods are spread over the submodules as further `impl Parser` blocks.
impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>) -> Parser<'a> {
    Parser {
      lexer,
      buf: Vec::new(),
      next_tok_i: 0,
      ast: Ast::new(),
    }
  }

  pub fn str(&self, loc: Loc) -> &'a str {
    let source = self.lexer.source();
    &source[loc.0..loc.1]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn ast(&self) -> &Ast {
    &self.ast
  }

  pub fn ast_mut(&mut self) -> &mut Ast {
    &mut self.ast
  }

  pub fn into_ast(self) -> Ast {
    self.ast
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
      ast_len: self.ast.len(),
    }
  }

  /// Rewinds both the token stream and any nodes allocated since the checkpoint.
  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
    self.ast.truncate(checkpoint.ast_len);
  }

  fn reset_to(&mut self, n: usize) {
    self.next_tok_i = n;
    self.buf.truncate(n);
    match self.buf.last() {
      Some(t) => self.lexer.set_next(t.token.loc.1),
      None => self.lexer.set_next(0),
    };
  }

  fn forward<K: FnOnce(&Token) -> bool>(&mut self, mode: LexMode, keep: K) -> (bool, Token) {
    if self
      .buf
      .get(self.next_tok_i)
      .is_some_and(|t| t.lex_mode != mode)
    {
      self.reset_to(self.next_tok_i);
    }
    debug_assert!(self.buf.len() >= self.next_tok_i);
    if self.buf.len() == self.next_tok_i {
      let token = lex_next(&mut self.lexer, mode);
      self.buf.push(BufferedToken {
        token,
        lex_mode: mode,
      });
    }
    let t = self.buf[self.next_tok_i].token;
    let k = keep(&t);
    if k {
      self.next_tok_i += 1;
    };
    (k, t)
  }

  /// Splits the next buffered token so that only its first `len` bytes are consumed. Used to
  /// close type argument lists that end in `>>`.
  pub fn consume_partial(&mut self, len: usize) -> Token {
    let t = self.peek();
    self.reset_to(self.next_tok_i);
    let loc = Loc(t.loc.0, t.loc.0 + len);
    self.lexer.set_next(loc.1);
    let token = Token {
      loc,
      preceded_by_line_terminator: t.preceded_by_line_terminator,
      typ: TT::ChevronRight,
    };
    self.buf.push(BufferedToken {
      token,
      lex_mode: LexMode::Standard,
    });
    self.next_tok_i += 1;
    token
  }

  pub fn consume_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| true).1
  }

  pub fn consume(&mut self) -> Token {
    self.consume_with_mode(LexMode::Standard)
  }

  pub fn peek_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| false).1
  }

  pub fn peek(&mut self) -> Token {
    self.peek_with_mode(LexMode::Standard)
  }

  pub fn peek_2(&mut self) -> (Token, Token) {
    let cp = self.next_tok_i;
    let a = self.forward(LexMode::Standard, |_| true);
    let b = self.forward(LexMode::Standard, |_| true);
    self.next_tok_i = cp;
    (a.1, b.1)
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    let (matched, t) = self.forward(LexMode::Standard, |t| t.typ == typ);
    MaybeToken {
      typ,
      matched,
      loc: t.loc,
    }
  }

  pub fn require_with_mode(&mut self, typ: TT, mode: LexMode) -> SyntaxResult<Token> {
    let t = self.consume_with_mode(mode);
    if t.typ != typ {
      Err(t.error(SyntaxErrorType::RequiredTokenNotFound(typ)))
    } else {
      Ok(t)
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    self.require_with_mode(typ, LexMode::Standard)
  }

  /// Consumes an identifier, including contextual keywords such as `type` or `of`.
  pub fn require_identifier(&mut self) -> SyntaxResult<String> {
    let t = self.consume();
    if t.typ == TT::Identifier || UNRESERVED_KEYWORDS.contains(&t.typ) {
      Ok(self.string(t.loc))
    } else {
      Err(t.error(SyntaxErrorType::ExpectedSyntax("identifier")))
    }
  }

  /// Consumes any identifier-like token, including reserved words. Used for property names.
  pub fn require_identifier_name(&mut self) -> SyntaxResult<String> {
    let t = self.consume();
    if t.typ.is_identifier_name() {
      Ok(self.string(t.loc))
    } else {
      Err(t.error(SyntaxErrorType::ExpectedSyntax("property name")))
    }
  }

  pub fn is_identifier(&mut self) -> bool {
    let t = self.peek().typ;
    t == TT::Identifier || UNRESERVED_KEYWORDS.contains(&t)
  }

  /// Consumes a statement terminator, applying automatic semicolon insertion.
  pub fn require_semicolon(&mut self) -> SyntaxResult<()> {
    let t = self.peek();
    match t.typ {
      TT::Semicolon => {
        self.consume();
        Ok(())
      }
      TT::BraceClose | TT::EOF => Ok(()),
      _ if t.preceded_by_line_terminator => Ok(()),
      _ => Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon))),
    }
  }

  pub fn with_loc<F>(&mut self, f: F) -> SyntaxResult<NodeId>
  where
    F: FnOnce(&mut Self) -> SyntaxResult<Syntax>,
  {
    let start = self.peek().loc.0;
    let stx = f(self)?;
    Ok(self.alloc_from(start, stx))
  }

  /// Allocates a node spanning from `start` to the end of the last consumed token.
  pub fn alloc_from(&mut self, start: usize, stx: Syntax) -> NodeId {
    let end = self.prev_end().max(start);
    self.ast.alloc(Loc(start, end), stx)
  }

  pub fn alloc(&mut self, loc: Loc, stx: Syntax) -> NodeId {
    self.ast.alloc(loc, stx)
  }

  fn prev_end(&self) -> usize {
    match self.next_tok_i {
      0 => 0,
      n => self.buf[n - 1].token.loc.1,
    }
  }

  /// Parses a list of items separated by `delim` until `close`, which is also consumed.
  /// Allows a trailing delimiter.
  pub fn list<S, F>(&mut self, delim: TT, close: TT, mut f: F) -> SyntaxResult<Vec<S>>
  where
    F: FnMut(&mut Self) -> SyntaxResult<S>,
  {
    let mut items = Vec::new();
    while !self.consume_if(close).is_match() {
      items.push(f(self)?);
      if !self.consume_if(delim).is_match() {
        self.require(close)?;
        break;
      };
    }
    Ok(items)
  }

  pub fn parse_program(&mut self) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let mut body = Vec::new();
    while self.peek().typ != TT::EOF {
      body.push(self.parse_stmt(ParseCtx::new())?);
    }
    let end = self.peek().loc.1;
    let root = self.ast.alloc(Loc(start, end), Syntax::Program { body });
    self.ast.set_root(root);
    Ok(root)
  }
}

#[cfg(test)]
mod tests {
  use super::Parser;
  use crate::lex::Lexer;
  use crate::token::TT;

  #[test]
  fn peeked_tokens_are_consumed_from_the_buffer() {
    let mut p = Parser::new(Lexer::new("a = 1;"));
    assert_eq!(p.peek().typ, TT::Identifier);
    assert_eq!(p.peek().typ, TT::Identifier);
    assert_eq!(p.consume().typ, TT::Identifier);
    let (next, after) = p.peek_2();
    assert_eq!((next.typ, after.typ), (TT::Equals, TT::LiteralNumber));
    assert!(!p.consume_if(TT::Semicolon).is_match());
    assert!(p.consume_if(TT::Equals).is_match());
    let cp = p.checkpoint();
    assert_eq!(p.consume().typ, TT::LiteralNumber);
    p.restore_checkpoint(cp);
    assert_eq!(p.consume().typ, TT::LiteralNumber);
    assert_eq!(p.consume().typ, TT::Semicolon);
    assert_eq!(p.peek().typ, TT::EOF);
  }
}
