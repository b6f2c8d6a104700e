use super::ParseCtx;
use super::Parser;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;
use crate::token::UNRESERVED_KEYWORDS;

fn is_name(tt: TT) -> bool {
  tt == TT::Identifier || UNRESERVED_KEYWORDS.contains(&tt)
}

fn is_binding_start(tt: TT) -> bool {
  is_name(tt) || tt == TT::BracketOpen || tt == TT::BraceOpen
}

impl<'a> Parser<'a> {
  pub fn parse_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    let (t0, t1) = self.peek_2();
    match t0.typ {
      TT::BraceOpen => self.parse_block(ctx),
      TT::Semicolon => self.with_loc(|p| {
        p.consume();
        Ok(Syntax::Empty)
      }),
      TT::KeywordVar | TT::KeywordConst => self.parse_var_stmt(ctx),
      TT::KeywordLet if is_binding_start(t1.typ) => self.parse_var_stmt(ctx),
      TT::KeywordFunction => self.parse_func_decl(ctx),
      TT::KeywordAsync if t1.typ == TT::KeywordFunction && !t1.preceded_by_line_terminator => {
        self.parse_func_decl(ctx)
      }
      TT::KeywordClass => self.parse_class(ctx, true),
      TT::KeywordIf => self.parse_if(ctx),
      TT::KeywordFor => self.parse_for(ctx),
      TT::KeywordWhile => self.with_loc(|p| {
        p.consume();
        p.require(TT::ParenthesisOpen)?;
        let test = p.parse_expr(ctx)?;
        p.require(TT::ParenthesisClose)?;
        let body = p.parse_stmt(ctx)?;
        Ok(Syntax::While { test, body })
      }),
      TT::KeywordDo => self.with_loc(|p| {
        p.consume();
        let body = p.parse_stmt(ctx)?;
        p.require(TT::KeywordWhile)?;
        p.require(TT::ParenthesisOpen)?;
        let test = p.parse_expr(ctx)?;
        p.require(TT::ParenthesisClose)?;
        // A semicolon is always optional after `do ... while (...)`.
        let _ = p.consume_if(TT::Semicolon);
        Ok(Syntax::DoWhile { body, test })
      }),
      TT::KeywordReturn => self.with_loc(|p| {
        p.consume();
        let next = p.peek();
        let value = if matches!(next.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
          || next.preceded_by_line_terminator
        {
          None
        } else {
          Some(p.parse_expr(ctx)?)
        };
        p.require_semicolon()?;
        Ok(Syntax::Return { value })
      }),
      TT::KeywordThrow => self.with_loc(|p| {
        p.consume();
        let next = p.peek();
        if next.preceded_by_line_terminator {
          return Err(next.error(SyntaxErrorType::LineTerminatorAfterThrow));
        };
        let value = p.parse_expr(ctx)?;
        p.require_semicolon()?;
        Ok(Syntax::Throw { value })
      }),
      TT::KeywordTry => self.parse_try(ctx),
      TT::KeywordSwitch => self.parse_switch(ctx),
      TT::KeywordBreak | TT::KeywordContinue => self.with_loc(|p| {
        let kw = p.consume();
        let next = p.peek();
        let label = if !next.preceded_by_line_terminator && p.is_identifier() {
          Some(p.require_identifier()?)
        } else {
          None
        };
        p.require_semicolon()?;
        Ok(if kw.typ == TT::KeywordBreak {
          Syntax::Break { label }
        } else {
          Syntax::Continue { label }
        })
      }),
      TT::KeywordDebugger => self.with_loc(|p| {
        p.consume();
        p.require_semicolon()?;
        Ok(Syntax::Debugger)
      }),
      TT::KeywordImport if !matches!(t1.typ, TT::ParenthesisOpen | TT::Dot) => {
        self.parse_import(ctx)
      }
      TT::KeywordExport => self.parse_export(ctx),
      TT::KeywordType if is_name(t1.typ) => self.parse_type_alias(),
      TT::KeywordInterface if is_name(t1.typ) && !t1.preceded_by_line_terminator => {
        self.parse_interface()
      }
      TT::KeywordEnum => Err(t0.error(SyntaxErrorType::Unsupported("enum declarations"))),
      TT::KeywordWith => Err(t0.error(SyntaxErrorType::Unsupported("with statements"))),
      _ if self.is_identifier() && t1.typ == TT::Colon => self.with_loc(|p| {
        let label = p.require_identifier()?;
        p.require(TT::Colon)?;
        let body = p.parse_stmt(ctx)?;
        Ok(Syntax::Labeled { label, body })
      }),
      _ => self.with_loc(|p| {
        let expr = p.parse_expr(ctx)?;
        p.require_semicolon()?;
        Ok(Syntax::ExprStmt { expr })
      }),
    }
  }

  /// Parses `{ ... }` and returns the statements inside.
  pub fn parse_block_body(&mut self, ctx: ParseCtx) -> SyntaxResult<Vec<NodeId>> {
    self.require(TT::BraceOpen)?;
    let mut body = Vec::new();
    while !self.consume_if(TT::BraceClose).is_match() {
      body.push(self.parse_stmt(ctx.with_allow_in(true))?);
    }
    Ok(body)
  }

  pub fn parse_block(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let body = p.parse_block_body(ctx)?;
      Ok(Syntax::Block { body })
    })
  }

  fn parse_var_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let decl = p.parse_var_decl_syntax(ctx)?;
      p.require_semicolon()?;
      Ok(decl)
    })
  }

  pub fn parse_var_decl(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| p.parse_var_decl_syntax(ctx))
  }

  fn parse_var_decl_syntax(&mut self, ctx: ParseCtx) -> SyntaxResult<Syntax> {
    let kw = self.consume();
    let mode = match kw.typ {
      TT::KeywordConst => VarDeclMode::Const,
      TT::KeywordLet => VarDeclMode::Let,
      TT::KeywordVar => VarDeclMode::Var,
      _ => return Err(kw.error(SyntaxErrorType::ExpectedSyntax("variable declaration"))),
    };
    let mut declarators = Vec::new();
    loop {
      declarators.push(self.with_loc(|p| {
        let pattern = p.parse_binding_pattern(ctx, true)?;
        let init = if p.consume_if(TT::Equals).is_match() {
          Some(p.parse_expr_assign(ctx)?)
        } else {
          None
        };
        Ok(Syntax::VarDeclarator { pattern, init })
      })?);
      if !self.consume_if(TT::Comma).is_match() {
        break;
      };
    }
    Ok(Syntax::VarDecl { mode, declarators })
  }

  fn parse_if(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordIf)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.parse_expr(ctx)?;
      p.require(TT::ParenthesisClose)?;
      let consequent = p.parse_stmt(ctx)?;
      let alternate = if p.consume_if(TT::KeywordElse).is_match() {
        Some(p.parse_stmt(ctx)?)
      } else {
        None
      };
      Ok(Syntax::If {
        test,
        consequent,
        alternate,
      })
    })
  }

  fn parse_for(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordFor)?;
      let is_await = p.consume_if(TT::KeywordAwait).is_match();
      p.require(TT::ParenthesisOpen)?;
      let head_ctx = ctx.with_allow_in(false);
      let (t0, t1) = p.peek_2();
      let init = match t0.typ {
        TT::Semicolon => None,
        TT::KeywordVar | TT::KeywordConst => Some(p.parse_var_decl(head_ctx)?),
        TT::KeywordLet if t1.typ != TT::KeywordIn && t1.typ != TT::KeywordOf => {
          Some(p.parse_var_decl(head_ctx)?)
        }
        _ => Some(p.parse_expr(head_ctx)?),
      };
      if let Some(left) = init {
        let of = p.consume_if(TT::KeywordOf).is_match();
        if of || p.consume_if(TT::KeywordIn).is_match() {
          let left = p.expr_to_assign_target(left)?;
          let right = if of {
            p.parse_expr_assign(ctx)?
          } else {
            p.parse_expr(ctx)?
          };
          p.require(TT::ParenthesisClose)?;
          let body = p.parse_stmt(ctx)?;
          return Ok(if of {
            Syntax::ForOf {
              is_await,
              left,
              right,
              body,
            }
          } else {
            Syntax::ForIn { left, right, body }
          });
        };
      };
      p.require(TT::Semicolon)?;
      let test = match p.peek().typ {
        TT::Semicolon => None,
        _ => Some(p.parse_expr(ctx)?),
      };
      p.require(TT::Semicolon)?;
      let update = match p.peek().typ {
        TT::ParenthesisClose => None,
        _ => Some(p.parse_expr(ctx)?),
      };
      p.require(TT::ParenthesisClose)?;
      let body = p.parse_stmt(ctx)?;
      Ok(Syntax::For {
        init,
        test,
        update,
        body,
      })
    })
  }

  fn parse_try(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let kw = p.require(TT::KeywordTry)?;
      let block = p.parse_block(ctx)?;
      let handler = if p.peek().typ == TT::KeywordCatch {
        Some(p.with_loc(|p| {
          p.require(TT::KeywordCatch)?;
          let param = if p.consume_if(TT::ParenthesisOpen).is_match() {
            let param = p.parse_binding_pattern(ctx, true)?;
            p.require(TT::ParenthesisClose)?;
            Some(param)
          } else {
            None
          };
          let body = p.parse_block_body(ctx)?;
          Ok(Syntax::Catch { param, body })
        })?)
      } else {
        None
      };
      let finalizer = if p.consume_if(TT::KeywordFinally).is_match() {
        Some(p.parse_block(ctx)?)
      } else {
        None
      };
      if handler.is_none() && finalizer.is_none() {
        return Err(kw.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
      };
      Ok(Syntax::Try {
        block,
        handler,
        finalizer,
      })
    })
  }

  fn parse_switch(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordSwitch)?;
      p.require(TT::ParenthesisOpen)?;
      let discriminant = p.parse_expr(ctx)?;
      p.require(TT::ParenthesisClose)?;
      p.require(TT::BraceOpen)?;
      let mut cases = Vec::new();
      while !p.consume_if(TT::BraceClose).is_match() {
        cases.push(p.with_loc(|p| {
          let test = if p.consume_if(TT::KeywordDefault).is_match() {
            None
          } else {
            p.require(TT::KeywordCase)?;
            Some(p.parse_expr(ctx)?)
          };
          p.require(TT::Colon)?;
          let mut body = Vec::new();
          while !matches!(
            p.peek().typ,
            TT::KeywordCase | TT::KeywordDefault | TT::BraceClose | TT::EOF
          ) {
            body.push(p.parse_stmt(ctx)?);
          }
          Ok(Syntax::SwitchCase { test, body })
        })?);
      }
      Ok(Syntax::Switch {
        discriminant,
        cases,
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::Syntax;
  use crate::parse;

  #[test]
  fn asi_splits_statements() {
    let ast = parse("let a = 1\nlet b = a\nreturn_\n").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    assert_eq!(body.len(), 3);
  }

  #[test]
  fn for_of_with_declaration() {
    let ast = parse("for (const x of xs) {}").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    assert!(matches!(ast.stx(body[0]), Syntax::ForOf { .. }));
  }

  #[test]
  fn try_needs_handler() {
    assert!(parse("try {}").is_err());
  }
}
