use super::ParseCtx;
use super::Parser;
use crate::ast::FuncBody;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  pub fn parse_func_decl(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| p.parse_func_syntax(ctx, true))
  }

  pub fn parse_func_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| p.parse_func_syntax(ctx, false))
  }

  /// `[async] function [*] [name] <T>(params): R { body }`.
  fn parse_func_syntax(&mut self, ctx: ParseCtx, is_decl: bool) -> SyntaxResult<Syntax> {
    let is_async = self.consume_if(TT::KeywordAsync).is_match();
    self.require(TT::KeywordFunction)?;
    let generator = self.consume_if(TT::Asterisk).is_match();
    let name = if self.is_identifier() {
      Some(self.require_identifier()?)
    } else {
      None
    };
    let mut stx = self.parse_method_syntax(ctx, is_async, generator)?;
    if let Syntax::Func {
      name: func_name,
      is_decl: decl,
      ..
    } = &mut stx
    {
      *func_name = name;
      *decl = is_decl;
    };
    Ok(stx)
  }

  /// Everything from the type parameters onwards; shared by functions, object methods and class
  /// methods.
  pub fn parse_method_syntax(
    &mut self,
    ctx: ParseCtx,
    is_async: bool,
    generator: bool,
  ) -> SyntaxResult<Syntax> {
    let type_params = self.parse_type_params_opt()?;
    let params = self.parse_params(ctx)?;
    let return_type = if self.consume_if(TT::Colon).is_match() {
      Some(self.parse_return_type()?)
    } else {
      None
    };
    let body = self.parse_block_body(ctx)?;
    Ok(Syntax::Func {
      name: None,
      is_decl: false,
      arrow: false,
      is_async,
      generator,
      type_params,
      params,
      return_type,
      body: FuncBody::Block(body),
    })
  }

  pub fn parse_method(&mut self, ctx: ParseCtx, is_async: bool, generator: bool) -> SyntaxResult<NodeId> {
    self.with_loc(|p| p.parse_method_syntax(ctx, is_async, generator))
  }

  /// Parses the annotation following a parameter list's `:`.
  pub fn parse_return_type(&mut self) -> SyntaxResult<NodeId> {
    self.parse_type()
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::FuncBody;
  use crate::ast::Syntax;
  use crate::parse;

  #[test]
  fn generic_async_function() {
    let ast = parse("async function f<T>(x: T): Promise<T> { return x; }").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::Func {
      name,
      is_decl,
      is_async,
      type_params,
      return_type,
      body,
      ..
    } = ast.stx(body[0])
    else {
      panic!("expected function");
    };
    assert_eq!(name.as_deref(), Some("f"));
    assert!(*is_decl);
    assert!(*is_async);
    assert_eq!(type_params.len(), 1);
    assert!(return_type.is_some());
    assert!(matches!(body, FuncBody::Block(stmts) if stmts.len() == 1));
  }
}
