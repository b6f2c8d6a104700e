use super::Parser;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::TypeKeyword;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::parse::expr::decode_string_body;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Main entry point for parsing type annotations.
  pub fn parse_type(&mut self) -> SyntaxResult<NodeId> {
    self.type_union()
  }

  /// `A | B | C`, with an optional leading `|`.
  fn type_union(&mut self) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let _ = self.consume_if(TT::Bar);
    let first = self.type_intersection()?;
    let mut types = vec![first];
    loop {
      let (t0, t1) = self.peek_2();
      // `|}` closes an exact object type.
      if t0.typ != TT::Bar || t1.typ == TT::BraceClose {
        break;
      };
      self.consume();
      types.push(self.type_intersection()?);
    }
    if types.len() == 1 {
      return Ok(first);
    };
    Ok(self.alloc_from(start, Syntax::TypeUnion { types }))
  }

  fn type_intersection(&mut self) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let _ = self.consume_if(TT::Ampersand);
    let first = self.type_prefix()?;
    let mut types = vec![first];
    while self.consume_if(TT::Ampersand).is_match() {
      types.push(self.type_prefix()?);
    }
    if types.len() == 1 {
      return Ok(first);
    };
    Ok(self.alloc_from(start, Syntax::TypeIntersection { types }))
  }

  /// `?T`.
  fn type_prefix(&mut self) -> SyntaxResult<NodeId> {
    if self.peek().typ == TT::Question {
      return self.with_loc(|p| {
        p.consume();
        let inner = p.type_prefix()?;
        Ok(Syntax::TypeNullable { inner })
      });
    };
    self.type_postfix()
  }

  /// `T[]`.
  fn type_postfix(&mut self) -> SyntaxResult<NodeId> {
    let start = self.peek().loc.0;
    let mut ty = self.type_primary()?;
    loop {
      let (t0, t1) = self.peek_2();
      if t0.typ != TT::BracketOpen || t0.preceded_by_line_terminator || t1.typ != TT::BracketClose {
        break;
      };
      self.consume();
      self.consume();
      ty = self.alloc_from(start, Syntax::TypeArray { elem: ty });
    }
    Ok(ty)
  }

  fn type_primary(&mut self) -> SyntaxResult<NodeId> {
    let t = self.peek();
    match t.typ {
      TT::ParenthesisOpen => {
        let cp = self.checkpoint();
        match self.type_function() {
          Ok(func) => Ok(func),
          Err(_) => {
            self.restore_checkpoint(cp);
            self.require(TT::ParenthesisOpen)?;
            let inner = self.parse_type()?;
            self.require(TT::ParenthesisClose)?;
            Ok(inner)
          }
        }
      }
      TT::ChevronLeft => {
        // Generic function types; the type parameters only scope the signature.
        self.parse_type_params_opt()?;
        self.type_function()
      }
      TT::BraceOpen => self.type_object(),
      TT::BracketOpen => self.with_loc(|p| {
        p.consume();
        let elems = p.list(TT::Comma, TT::BracketClose, |p| p.parse_type())?;
        Ok(Syntax::TypeTuple { elems })
      }),
      TT::LiteralString => {
        self.consume();
        let raw = self.str(t.loc);
        let value = decode_string_body(&raw[1..raw.len() - 1])
          .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?;
        Ok(self.alloc(t.loc, Syntax::TypeLitStr { value }))
      }
      TT::LiteralNumber => {
        self.consume();
        let raw = self.string(t.loc);
        Ok(self.alloc(t.loc, Syntax::TypeLitNum { raw }))
      }
      TT::Hyphen => self.with_loc(|p| {
        p.consume();
        let num = p.require(TT::LiteralNumber)?;
        Ok(Syntax::TypeLitNum {
          raw: format!("-{}", p.str(num.loc)),
        })
      }),
      TT::LiteralTrue | TT::LiteralFalse => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::TypeLitBool {
          value: t.typ == TT::LiteralTrue,
        }))
      }
      TT::LiteralNull => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::TypeKeyword {
          keyword: TypeKeyword::Null,
        }))
      }
      TT::KeywordVoid => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::TypeKeyword {
          keyword: TypeKeyword::Void,
        }))
      }
      TT::Asterisk => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::TypeKeyword {
          keyword: TypeKeyword::Existential,
        }))
      }
      TT::KeywordTypeof => self.with_loc(|p| {
        p.consume();
        let start = p.peek().loc.0;
        let first = p.require_identifier()?;
        let mut arg = p.alloc_from(start, Syntax::Id { name: first });
        while p.consume_if(TT::Dot).is_match() {
          let property = p.require_identifier_name()?;
          arg = p.alloc_from(start, Syntax::Member {
            object: arg,
            property,
            optional: false,
          });
        }
        Ok(Syntax::TypeTypeof { arg })
      }),
      _ if t.typ.is_identifier_name() => {
        let (_, t1) = self.peek_2();
        let name = self.str(t.loc);
        if let Some(keyword) = TypeKeyword::from_name(name) {
          if t1.typ != TT::Dot && t1.typ != TT::ChevronLeft {
            self.consume();
            return Ok(self.alloc(t.loc, Syntax::TypeKeyword { keyword }));
          };
        };
        self.parse_type_ref()
      }
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("type"))),
    }
  }

  /// A possibly qualified type name with optional type arguments: `A.B<C>`.
  pub fn parse_type_ref(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let mut name = vec![p.require_identifier_name()?];
      while p.consume_if(TT::Dot).is_match() {
        name.push(p.require_identifier_name()?);
      }
      let (t0, _) = p.peek_2();
      let args = if t0.typ == TT::ChevronLeft && !t0.preceded_by_line_terminator {
        p.parse_type_args()?
      } else {
        Vec::new()
      };
      Ok(Syntax::TypeRef { name, args })
    })
  }

  /// `(a: A, b?: B, ...rest: R) => T`; parameter names are optional.
  fn type_function(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let (params, rest) = p.type_func_params()?;
      p.require(TT::EqualsChevronRight)?;
      let ret = p.parse_type()?;
      Ok(Syntax::TypeFunc { params, rest, ret })
    })
  }

  fn type_func_params(&mut self) -> SyntaxResult<(Vec<NodeId>, Option<NodeId>)> {
    self.require(TT::ParenthesisOpen)?;
    let mut params = Vec::new();
    let mut rest = None;
    while !self.consume_if(TT::ParenthesisClose).is_match() {
      let is_rest = self.consume_if(TT::DotDotDot).is_match();
      let param = self.with_loc(|p| {
        let (t0, t1) = p.peek_2();
        let named = t0.typ.is_identifier_name() && matches!(t1.typ, TT::Colon | TT::Question);
        let (name, optional) = if named {
          let name = p.require_identifier_name()?;
          let optional = p.consume_if(TT::Question).is_match();
          p.require(TT::Colon)?;
          (Some(name), optional)
        } else {
          (None, false)
        };
        let value = p.parse_type()?;
        Ok(Syntax::TypeFuncParam {
          name,
          value,
          optional,
        })
      })?;
      if is_rest {
        rest = Some(param);
      } else {
        params.push(param);
      };
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::ParenthesisClose)?;
        break;
      };
    }
    Ok((params, rest))
  }

  /// `{ a: A, b?: B, [k: K]: V, ...S, m(x: X): Y }` and the exact form `{| ... |}`.
  fn type_object(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let exact = p.consume_if(TT::Bar).is_match();
      let mut members = Vec::new();
      loop {
        if exact && p.peek().typ == TT::Bar {
          p.consume();
          p.require(TT::BraceClose)?;
          break;
        };
        if p.consume_if(TT::BraceClose).is_match() {
          break;
        };
        members.push(p.type_object_member()?);
        if !p.consume_if(TT::Comma).is_match() && !p.consume_if(TT::Semicolon).is_match() {
          if exact {
            p.require(TT::Bar)?;
          };
          p.require(TT::BraceClose)?;
          break;
        };
      }
      Ok(Syntax::TypeObject { exact, members })
    })
  }

  fn type_object_member(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      if p.consume_if(TT::DotDotDot).is_match() {
        let arg = p.parse_type()?;
        return Ok(Syntax::TypeSpread { arg });
      };
      if p.consume_if(TT::BracketOpen).is_match() {
        let (t0, t1) = p.peek_2();
        let key_name = if t0.typ.is_identifier_name() && t1.typ == TT::Colon {
          let name = p.require_identifier_name()?;
          p.require(TT::Colon)?;
          Some(name)
        } else {
          None
        };
        let key = p.parse_type()?;
        p.require(TT::BracketClose)?;
        p.require(TT::Colon)?;
        let value = p.parse_type()?;
        return Ok(Syntax::TypeIndexer {
          key_name,
          key,
          value,
        });
      };
      // Variance markers do not affect runtime checks.
      if !p.consume_if(TT::Plus).is_match() {
        let _ = p.consume_if(TT::Hyphen);
      };
      let t = p.peek();
      let key = match t.typ {
        TT::LiteralString => {
          p.consume();
          let raw = p.str(t.loc);
          decode_string_body(&raw[1..raw.len() - 1])
            .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?
        }
        TT::LiteralNumber => {
          p.consume();
          p.string(t.loc)
        }
        _ => p.require_identifier_name()?,
      };
      if matches!(p.peek().typ, TT::ParenthesisOpen | TT::ChevronLeft) {
        if p.peek().typ == TT::ChevronLeft {
          p.parse_type_params_opt()?;
        };
        let params_start = p.peek().loc.0;
        let value = p.type_method_signature(params_start)?;
        return Ok(Syntax::TypeObjectProp {
          key,
          value,
          optional: false,
        });
      };
      let optional = p.consume_if(TT::Question).is_match();
      p.require(TT::Colon)?;
      let value = p.parse_type()?;
      Ok(Syntax::TypeObjectProp {
        key,
        value,
        optional,
      })
    })
  }

  /// `(params): R` inside an object type, represented as a function type.
  fn type_method_signature(&mut self, start: usize) -> SyntaxResult<NodeId> {
    let (params, rest) = self.type_func_params()?;
    self.require(TT::Colon)?;
    let ret = self.parse_type()?;
    Ok(self.alloc_from(start, Syntax::TypeFunc { params, rest, ret }))
  }

  /// `<A, B>` following a type name or a superclass.
  pub fn parse_type_args(&mut self) -> SyntaxResult<Vec<NodeId>> {
    self.require(TT::ChevronLeft)?;
    let mut args = Vec::new();
    loop {
      if self.consume_type_args_close() {
        break;
      };
      args.push(self.parse_type()?);
      if !self.consume_if(TT::Comma).is_match() {
        if !self.consume_type_args_close() {
          let t = self.peek();
          return Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::ChevronRight)));
        };
        break;
      };
    }
    Ok(args)
  }

  /// Consumes a single `>`, splitting tokens such as `>>` that close nested argument lists.
  fn consume_type_args_close(&mut self) -> bool {
    match self.peek().typ {
      TT::ChevronRight => {
        self.consume();
        true
      }
      TT::ChevronRightChevronRight
      | TT::ChevronRightChevronRightChevronRight
      | TT::ChevronRightEquals
      | TT::ChevronRightChevronRightEquals
      | TT::ChevronRightChevronRightChevronRightEquals => {
        self.consume_partial(1);
        true
      }
      _ => false,
    }
  }

  /// `<T, U: Bound = Default>` declaring type parameters, or nothing.
  pub fn parse_type_params_opt(&mut self) -> SyntaxResult<Vec<NodeId>> {
    if !self.consume_if(TT::ChevronLeft).is_match() {
      return Ok(Vec::new());
    };
    let mut params = Vec::new();
    loop {
      if self.consume_type_args_close() {
        break;
      };
      params.push(self.with_loc(|p| {
        if !p.consume_if(TT::Plus).is_match() {
          let _ = p.consume_if(TT::Hyphen);
        };
        let name = p.require_identifier()?;
        let bound = if p.consume_if(TT::Colon).is_match() {
          Some(p.parse_type()?)
        } else {
          None
        };
        let default = if p.consume_if(TT::Equals).is_match() {
          Some(p.parse_type()?)
        } else {
          None
        };
        Ok(Syntax::TypeParam {
          name,
          bound,
          default,
        })
      })?);
      if !self.consume_if(TT::Comma).is_match() {
        if !self.consume_type_args_close() {
          let t = self.peek();
          return Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::ChevronRight)));
        };
        break;
      };
    }
    Ok(params)
  }

  /// `type Name<T> = Type;`
  pub fn parse_type_alias(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordType)?;
      let name = p.require_identifier()?;
      let type_params = p.parse_type_params_opt()?;
      p.require(TT::Equals)?;
      let value = p.parse_type()?;
      p.require_semicolon()?;
      Ok(Syntax::TypeAlias {
        name,
        type_params,
        value,
      })
    })
  }

  /// `interface Name<T> extends A, B { ... }`
  pub fn parse_interface(&mut self) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordInterface)?;
      let name = p.require_identifier()?;
      let type_params = p.parse_type_params_opt()?;
      let mut extends = Vec::new();
      if p.consume_if(TT::KeywordExtends).is_match() {
        loop {
          extends.push(p.parse_type_ref()?);
          if !p.consume_if(TT::Comma).is_match() {
            break;
          };
        }
      };
      let body = p.type_object()?;
      Ok(Syntax::Interface {
        name,
        type_params,
        extends,
        body,
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::Syntax;
  use crate::ast::TypeKeyword;
  use crate::parse;

  fn alias_value(src: &str) -> (crate::ast::Ast, crate::ast::NodeId) {
    let ast = parse(src).unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::TypeAlias { value, .. } = ast.stx(body[0]) else {
      panic!("expected alias");
    };
    let value = *value;
    (ast, value)
  }

  #[test]
  fn nested_type_arguments_split_shift_tokens() {
    let (ast, value) = alias_value("type A = Array<Array<number>>;");
    let Syntax::TypeRef { args, .. } = ast.stx(value) else {
      panic!("expected reference");
    };
    assert!(matches!(ast.stx(args[0]), Syntax::TypeRef { args, .. } if args.len() == 1));
  }

  #[test]
  fn nullable_union_and_arrays() {
    let (ast, value) = alias_value("type A = ?string | number[];");
    let Syntax::TypeUnion { types } = ast.stx(value) else {
      panic!("expected union");
    };
    assert!(matches!(ast.stx(types[0]), Syntax::TypeNullable { .. }));
    assert!(matches!(ast.stx(types[1]), Syntax::TypeArray { .. }));
  }

  #[test]
  fn exact_object_type() {
    let (ast, value) = alias_value("type P = {| x: 1 | 2, y?: string |};");
    let Syntax::TypeObject { exact, members } = ast.stx(value) else {
      panic!("expected object type");
    };
    assert!(*exact);
    assert_eq!(members.len(), 2);
  }

  #[test]
  fn function_types() {
    let (ast, value) = alias_value("type F = (number, name?: string, ...rest: Array<mixed>) => void;");
    let Syntax::TypeFunc { params, rest, ret } = ast.stx(value) else {
      panic!("expected function type");
    };
    assert_eq!(params.len(), 2);
    assert!(rest.is_some());
    assert!(matches!(ast.stx(*ret), Syntax::TypeKeyword {
      keyword: TypeKeyword::Void
    }));
  }

  #[test]
  fn leading_separators_are_skipped() {
    let (ast, value) = alias_value("type S = | \"a\" | \"b\";");
    assert!(matches!(ast.stx(value), Syntax::TypeUnion { types } if types.len() == 2));
    let (ast, value) = alias_value("type I = & A & B;");
    assert!(matches!(ast.stx(value), Syntax::TypeIntersection { types } if types.len() == 2));
  }
}
