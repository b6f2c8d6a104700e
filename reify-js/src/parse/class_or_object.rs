use super::ParseCtx;
use super::Parser;
use crate::ast::ClassMemberKind;
use crate::ast::MethodKind;
use crate::ast::NodeId;
use crate::ast::PropKey;
use crate::ast::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::parse::expr::CALL_MEMBER_PRECEDENCE;
use crate::token::TT;

/// Modifiers that may precede a class member or object literal key.
struct MemberModifiers {
  is_static: bool,
  is_async: bool,
  generator: bool,
  accessor: Option<MethodKind>,
}

impl<'a> Parser<'a> {
  /// Whether the token after a modifier keyword means the keyword is itself the member's name.
  fn modifier_is_key(&mut self) -> bool {
    let (_, next) = self.peek_2();
    matches!(
      next.typ,
      TT::ParenthesisOpen
        | TT::Equals
        | TT::Semicolon
        | TT::Colon
        | TT::Comma
        | TT::BraceClose
        | TT::Question
        | TT::ChevronLeft
    ) || next.preceded_by_line_terminator
  }

  fn parse_member_modifiers(&mut self, allow_static: bool) -> MemberModifiers {
    let mut m = MemberModifiers {
      is_static: false,
      is_async: false,
      generator: false,
      accessor: None,
    };
    if allow_static && self.peek().typ == TT::KeywordStatic && !self.modifier_is_key() {
      self.consume();
      m.is_static = true;
    };
    if self.peek().typ == TT::KeywordAsync && !self.modifier_is_key() {
      self.consume();
      m.is_async = true;
    };
    if self.consume_if(TT::Asterisk).is_match() {
      m.generator = true;
    };
    if !m.is_async && !m.generator {
      match self.peek().typ {
        TT::KeywordGet if !self.modifier_is_key() => {
          self.consume();
          m.accessor = Some(MethodKind::Getter);
        }
        TT::KeywordSet if !self.modifier_is_key() => {
          self.consume();
          m.accessor = Some(MethodKind::Setter);
        }
        _ => {}
      };
    };
    m
  }

  pub fn parse_object_literal(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let ctx = ctx.with_allow_in(true);
      let members = p.list(TT::Comma, TT::BraceClose, |p| {
        p.with_loc(|p| {
          if p.consume_if(TT::DotDotDot).is_match() {
            let arg = p.parse_expr_assign(ctx)?;
            return Ok(Syntax::Spread { arg });
          };
          let modifiers = p.parse_member_modifiers(false);
          let key_tok = p.peek();
          let key = p.parse_prop_key(ctx)?;
          if modifiers.is_async
            || modifiers.generator
            || modifiers.accessor.is_some()
            || matches!(p.peek().typ, TT::ParenthesisOpen | TT::ChevronLeft)
          {
            let func = p.parse_method(ctx, modifiers.is_async, modifiers.generator)?;
            return Ok(Syntax::ObjMethod {
              key,
              kind: modifiers.accessor.unwrap_or(MethodKind::Method),
              func,
            });
          };
          if p.consume_if(TT::Colon).is_match() {
            let value = p.parse_expr_assign(ctx)?;
            return Ok(Syntax::ObjProp {
              key,
              value,
              shorthand: false,
            });
          };
          let PropKey::Ident(name) = &key else {
            return Err(key_tok.error(SyntaxErrorType::ExpectedSyntax("property value")));
          };
          let mut value = p.alloc(key_tok.loc, Syntax::Id { name: name.clone() });
          // `{a = 1}` is only valid once reinterpreted as a destructuring pattern.
          if p.consume_if(TT::Equals).is_match() {
            let default = p.parse_expr_assign(ctx)?;
            value = p.alloc_from(key_tok.loc.0, Syntax::Assign {
              op: crate::operator::OperatorName::Assignment,
              target: value,
              value: default,
            });
          };
          Ok(Syntax::ObjProp {
            key,
            value,
            shorthand: true,
          })
        })
      })?;
      Ok(Syntax::LitObj { members })
    })
  }

  /// `class [Name] <T> [extends Base<U>] [implements I] { members }`.
  pub fn parse_class(&mut self, ctx: ParseCtx, is_decl: bool) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordClass)?;
      let name = if p.is_identifier() && p.peek().typ != TT::KeywordImplements {
        Some(p.require_identifier()?)
      } else {
        None
      };
      let type_params = p.parse_type_params_opt()?;
      let mut extends = None;
      let mut super_type_args = Vec::new();
      if p.consume_if(TT::KeywordExtends).is_match() {
        // Stop before `<` so that it can open the supertype's type arguments.
        extends = Some(p.parse_expr_with_min_prec(ctx, CALL_MEMBER_PRECEDENCE)?);
        if p.peek().typ == TT::ChevronLeft {
          super_type_args = p.parse_type_args()?;
        };
      };
      let mut implements = Vec::new();
      if p.consume_if(TT::KeywordImplements).is_match() {
        loop {
          implements.push(p.parse_type_ref()?);
          if !p.consume_if(TT::Comma).is_match() {
            break;
          };
        }
      };
      p.require(TT::BraceOpen)?;
      let mut members = Vec::new();
      while !p.consume_if(TT::BraceClose).is_match() {
        if p.consume_if(TT::Semicolon).is_match() {
          continue;
        };
        members.push(p.parse_class_member(ctx)?);
      }
      Ok(Syntax::Class {
        name,
        is_decl,
        type_params,
        extends,
        super_type_args,
        implements,
        members,
      })
    })
  }

  fn parse_class_member(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let mut decorators = Vec::new();
      while p.consume_if(TT::At).is_match() {
        decorators.push(p.parse_expr_with_min_prec(ctx, CALL_MEMBER_PRECEDENCE)?);
      }
      let modifiers = p.parse_member_modifiers(true);
      let key = p.parse_prop_key(ctx)?;
      if modifiers.is_async
        || modifiers.generator
        || modifiers.accessor.is_some()
        || matches!(p.peek().typ, TT::ParenthesisOpen | TT::ChevronLeft)
      {
        let func = p.parse_method(ctx, modifiers.is_async, modifiers.generator)?;
        let is_constructor = !modifiers.is_static
          && matches!(&key, PropKey::Ident(n) | PropKey::Str(n) if n == "constructor");
        let kind = match modifiers.accessor {
          Some(MethodKind::Getter) => ClassMemberKind::Getter,
          Some(MethodKind::Setter) => ClassMemberKind::Setter,
          _ if is_constructor => ClassMemberKind::Constructor,
          _ => ClassMemberKind::Method,
        };
        return Ok(Syntax::ClassMember {
          key,
          is_static: modifiers.is_static,
          kind,
          value: Some(func),
          annotation: None,
          decorators,
        });
      };
      // Optional properties (`x?: T`) only affect the annotation, which is checked separately.
      let _ = p.consume_if(TT::Question);
      let annotation = if p.consume_if(TT::Colon).is_match() {
        Some(p.parse_type()?)
      } else {
        None
      };
      let value = if p.consume_if(TT::Equals).is_match() {
        Some(p.parse_expr_assign(ctx.with_allow_in(true))?)
      } else {
        None
      };
      p.require_semicolon()?;
      Ok(Syntax::ClassMember {
        key,
        is_static: modifiers.is_static,
        kind: ClassMemberKind::Property,
        value,
        annotation,
        decorators,
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::ClassMemberKind;
  use crate::ast::Syntax;
  use crate::parse;

  #[test]
  fn class_with_supertype_arguments() {
    let ast = parse(
      "class Box<T> extends Base<T, string> implements Thing {\n  value: T;\n  static count = 0;\n  constructor(v: T) { super(); }\n  get size(): number { return 1; }\n}",
    )
    .unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::Class {
      type_params,
      extends,
      super_type_args,
      implements,
      members,
      ..
    } = ast.stx(body[0])
    else {
      panic!("expected class");
    };
    assert_eq!(type_params.len(), 1);
    assert!(extends.is_some());
    assert_eq!(super_type_args.len(), 2);
    assert_eq!(implements.len(), 1);
    let kinds: Vec<_> = members
      .iter()
      .map(|m| match ast.stx(*m) {
        Syntax::ClassMember { kind, .. } => *kind,
        _ => panic!("expected member"),
      })
      .collect();
    assert_eq!(kinds, vec![
      ClassMemberKind::Property,
      ClassMemberKind::Property,
      ClassMemberKind::Constructor,
      ClassMemberKind::Getter,
    ]);
  }

  #[test]
  fn object_literal_members() {
    let ast = parse("x = {a, b: 1, get c() { return 1; }, [d]: 2, ...e, f() {}};").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::ExprStmt { expr } = ast.stx(body[0]) else {
      panic!("expected statement");
    };
    let Syntax::Assign { value, .. } = ast.stx(*expr) else {
      panic!("expected assignment");
    };
    let Syntax::LitObj { members } = ast.stx(*value) else {
      panic!("expected object");
    };
    assert_eq!(members.len(), 6);
  }
}
