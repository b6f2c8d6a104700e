use super::ParseCtx;
use super::Parser;
use crate::ast::NodeId;
use crate::ast::PropKey;
use crate::ast::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a binding target: an identifier, or an object or array destructuring pattern.
  /// When `annotated` is set, a trailing `?` and `: Type` are accepted and attached to the
  /// pattern.
  pub fn parse_binding_pattern(&mut self, ctx: ParseCtx, annotated: bool) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let mut stx = match self.peek().typ {
      TT::BracketOpen => self.parse_arr_pat_syntax(ctx)?,
      TT::BraceOpen => self.parse_obj_pat_syntax(ctx)?,
      _ => Syntax::IdPat {
        name: self.require_identifier()?,
        annotation: None,
        optional: false,
      },
    };
    if annotated {
      if let Syntax::IdPat { optional, .. } = &mut stx {
        *optional = self.consume_if(TT::Question).is_match();
      };
      if self.consume_if(TT::Colon).is_match() {
        let ty = self.parse_type()?;
        if let Some(slot) = stx.annotation_mut() {
          *slot = Some(ty);
        };
      };
    };
    Ok(self.alloc_from(start, stx))
  }

  /// A binding pattern optionally followed by `= default`.
  fn parse_binding_element(&mut self, ctx: ParseCtx, annotated: bool) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let target = self.parse_binding_pattern(ctx, annotated)?;
    if self.consume_if(TT::Equals).is_match() {
      let default = self.parse_expr_assign(ctx.with_allow_in(true))?;
      return Ok(self.alloc_from(start, Syntax::AssignPat { target, default }));
    };
    Ok(target)
  }

  fn parse_rest_element(&mut self, ctx: ParseCtx, annotated: bool) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::DotDotDot)?;
      let target = p.parse_binding_pattern(ctx, false)?;
      let annotation = if annotated && p.consume_if(TT::Colon).is_match() {
        Some(p.parse_type()?)
      } else {
        None
      };
      Ok(Syntax::RestPat { target, annotation })
    })
  }

  fn parse_arr_pat_syntax(&mut self, ctx: ParseCtx) -> SyntaxResult<Syntax> {
    self.require(TT::BracketOpen)?;
    let mut elements = Vec::new();
    loop {
      match self.peek().typ {
        TT::BracketClose => {
          self.consume();
          break;
        }
        TT::Comma => {
          self.consume();
          elements.push(None);
          continue;
        }
        TT::DotDotDot => {
          elements.push(Some(self.parse_rest_element(ctx, false)?));
          self.require(TT::BracketClose)?;
          break;
        }
        _ => elements.push(Some(self.parse_binding_element(ctx, false)?)),
      };
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::BracketClose)?;
        break;
      };
    }
    Ok(Syntax::ArrPat {
      elements,
      annotation: None,
    })
  }

  fn parse_obj_pat_syntax(&mut self, ctx: ParseCtx) -> SyntaxResult<Syntax> {
    self.require(TT::BraceOpen)?;
    let props = self.list(TT::Comma, TT::BraceClose, |p| {
      if p.peek().typ == TT::DotDotDot {
        return p.parse_rest_element(ctx, false);
      };
      p.with_loc(|p| {
        let key_tok = p.peek();
        let key = p.parse_prop_key(ctx)?;
        if p.consume_if(TT::Colon).is_match() {
          let target = p.parse_binding_element(ctx, false)?;
          return Ok(Syntax::ObjPatProp {
            key,
            target,
            shorthand: false,
          });
        };
        let PropKey::Ident(name) = &key else {
          return Err(key_tok.error(SyntaxErrorType::ExpectedSyntax("shorthand property name")));
        };
        let id = p.alloc(key_tok.loc, Syntax::IdPat {
          name: name.clone(),
          annotation: None,
          optional: false,
        });
        let target = if p.consume_if(TT::Equals).is_match() {
          let default = p.parse_expr_assign(ctx.with_allow_in(true))?;
          p.alloc_from(key_tok.loc.0, Syntax::AssignPat {
            target: id,
            default,
          })
        } else {
          id
        };
        Ok(Syntax::ObjPatProp {
          key,
          target,
          shorthand: true,
        })
      })
    })?;
    Ok(Syntax::ObjPat {
      props,
      annotation: None,
    })
  }

  /// Parses a parenthesised parameter list.
  pub fn parse_params(&mut self, ctx: ParseCtx) -> SyntaxResult<Vec<NodeId>> {
    self.require(TT::ParenthesisOpen)?;
    let ctx = ctx.with_allow_in(true);
    self.list(TT::Comma, TT::ParenthesisClose, |p| {
      if p.peek().typ == TT::DotDotDot {
        p.parse_rest_element(ctx, true)
      } else {
        p.parse_binding_element(ctx, true)
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::Syntax;
  use crate::parse;

  #[test]
  fn annotated_parameters() {
    let ast = parse("function f(a?: number, {b}: Obj = {}, ...rest: Array<string>) {}").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::Func { params, .. } = ast.stx(body[0]) else {
      panic!("expected function");
    };
    assert!(matches!(
      ast.stx(params[0]),
      Syntax::IdPat {
        optional: true,
        annotation: Some(_),
        ..
      }
    ));
    let Syntax::AssignPat { target, .. } = ast.stx(params[1]) else {
      panic!("expected default");
    };
    assert!(matches!(ast.stx(*target), Syntax::ObjPat { annotation: Some(_), .. }));
    assert!(matches!(ast.stx(params[2]), Syntax::RestPat { annotation: Some(_), .. }));
  }
}
