use super::ParseCtx;
use super::Parser;
use crate::ast::FuncBody;
use crate::ast::NodeId;
use crate::ast::PropKey;
use crate::ast::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::loc::Loc;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;
use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;

#[rustfmt::skip]
pub static BINARY_OPERATOR_MAPPING: Lazy<HashMap<TT, OperatorName>> = Lazy::new(|| {
  let mut map = HashMap::<TT, OperatorName>::new();
  map.insert(TT::Plus, OperatorName::Addition);
  map.insert(TT::Ampersand, OperatorName::BitwiseAnd);
  map.insert(TT::ChevronLeftChevronLeft, OperatorName::BitwiseLeftShift);
  map.insert(TT::Bar, OperatorName::BitwiseOr);
  map.insert(TT::ChevronRightChevronRight, OperatorName::BitwiseRightShift);
  map.insert(TT::ChevronRightChevronRightChevronRight, OperatorName::BitwiseUnsignedRightShift);
  map.insert(TT::Caret, OperatorName::BitwiseXor);
  map.insert(TT::Comma, OperatorName::Comma);
  map.insert(TT::Slash, OperatorName::Division);
  map.insert(TT::EqualsEquals, OperatorName::Equality);
  map.insert(TT::AsteriskAsterisk, OperatorName::Exponentiation);
  map.insert(TT::ChevronRight, OperatorName::GreaterThan);
  map.insert(TT::ChevronRightEquals, OperatorName::GreaterThanOrEqual);
  map.insert(TT::KeywordIn, OperatorName::In);
  map.insert(TT::ExclamationEquals, OperatorName::Inequality);
  map.insert(TT::KeywordInstanceof, OperatorName::Instanceof);
  map.insert(TT::ChevronLeft, OperatorName::LessThan);
  map.insert(TT::ChevronLeftEquals, OperatorName::LessThanOrEqual);
  map.insert(TT::AmpersandAmpersand, OperatorName::LogicalAnd);
  map.insert(TT::BarBar, OperatorName::LogicalOr);
  map.insert(TT::Asterisk, OperatorName::Multiplication);
  map.insert(TT::QuestionQuestion, OperatorName::NullishCoalescing);
  map.insert(TT::Percent, OperatorName::Remainder);
  map.insert(TT::EqualsEqualsEquals, OperatorName::StrictEquality);
  map.insert(TT::ExclamationEqualsEquals, OperatorName::StrictInequality);
  map.insert(TT::Hyphen, OperatorName::Subtraction);
  map
});

#[rustfmt::skip]
pub static ASSIGNMENT_OPERATOR_MAPPING: Lazy<HashMap<TT, OperatorName>> = Lazy::new(|| {
  let mut map = HashMap::<TT, OperatorName>::new();
  map.insert(TT::Equals, OperatorName::Assignment);
  map.insert(TT::PlusEquals, OperatorName::AssignmentAddition);
  map.insert(TT::AmpersandEquals, OperatorName::AssignmentBitwiseAnd);
  map.insert(TT::ChevronLeftChevronLeftEquals, OperatorName::AssignmentBitwiseLeftShift);
  map.insert(TT::BarEquals, OperatorName::AssignmentBitwiseOr);
  map.insert(TT::ChevronRightChevronRightEquals, OperatorName::AssignmentBitwiseRightShift);
  map.insert(TT::ChevronRightChevronRightChevronRightEquals, OperatorName::AssignmentBitwiseUnsignedRightShift);
  map.insert(TT::CaretEquals, OperatorName::AssignmentBitwiseXor);
  map.insert(TT::SlashEquals, OperatorName::AssignmentDivision);
  map.insert(TT::AsteriskAsteriskEquals, OperatorName::AssignmentExponentiation);
  map.insert(TT::AmpersandAmpersandEquals, OperatorName::AssignmentLogicalAnd);
  map.insert(TT::BarBarEquals, OperatorName::AssignmentLogicalOr);
  map.insert(TT::AsteriskEquals, OperatorName::AssignmentMultiplication);
  map.insert(TT::QuestionQuestionEquals, OperatorName::AssignmentNullishCoalescing);
  map.insert(TT::PercentEquals, OperatorName::AssignmentRemainder);
  map.insert(TT::HyphenEquals, OperatorName::AssignmentSubtraction);
  map
});

#[rustfmt::skip]
pub static UNARY_OPERATOR_MAPPING: Lazy<HashMap<TT, OperatorName>> = Lazy::new(|| {
  let mut map = HashMap::<TT, OperatorName>::new();
  map.insert(TT::KeywordAwait, OperatorName::Await);
  map.insert(TT::Tilde, OperatorName::BitwiseNot);
  map.insert(TT::KeywordDelete, OperatorName::Delete);
  map.insert(TT::Exclamation, OperatorName::LogicalNot);
  map.insert(TT::HyphenHyphen, OperatorName::PrefixDecrement);
  map.insert(TT::PlusPlus, OperatorName::PrefixIncrement);
  map.insert(TT::Hyphen, OperatorName::UnaryNegation);
  map.insert(TT::Plus, OperatorName::UnaryPlus);
  map.insert(TT::KeywordTypeof, OperatorName::Typeof);
  map.insert(TT::KeywordVoid, OperatorName::Void);
  map
});

fn prec(op: OperatorName) -> u8 {
  OPERATORS[&op].precedence
}

/// Precedence used for member access and call chains.
pub const CALL_MEMBER_PRECEDENCE: u8 = 18;

/// Decodes the escapes in the text between a string literal's quotes.
pub fn decode_string_body(raw: &str) -> Option<String> {
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars().peekable();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    };
    match chars.next()? {
      'n' => out.push('\n'),
      'r' => out.push('\r'),
      't' => out.push('\t'),
      'b' => out.push('\u{8}'),
      'f' => out.push('\u{c}'),
      'v' => out.push('\u{b}'),
      '0' if !chars.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
      // Line continuation.
      '\n' | '\u{2028}' | '\u{2029}' => {}
      '\r' => {
        if chars.peek() == Some(&'\n') {
          chars.next();
        };
      }
      'x' => {
        let hex: String = chars.by_ref().take(2).collect();
        out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
      }
      'u' => {
        let hex: String = if chars.peek() == Some(&'{') {
          chars.next();
          let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
          hex
        } else {
          chars.by_ref().take(4).collect()
        };
        let code = u32::from_str_radix(&hex, 16).ok()?;
        // Lone surrogates cannot be represented; keep them escaped.
        match char::from_u32(code) {
          Some(c) => out.push(c),
          None => out.push_str(&format!("\\u{:04x}", code)),
        };
      }
      c => out.push(c),
    };
  }
  Some(out)
}

impl<'a> Parser<'a> {
  /// Parses a full expression, including the comma operator.
  pub fn parse_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.parse_expr_with_min_prec(ctx, 1)
  }

  /// Parses an AssignmentExpression: anything except an unparenthesised comma sequence.
  pub fn parse_expr_assign(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.parse_expr_with_min_prec(ctx, 2)
  }

  pub fn parse_expr_with_min_prec(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<NodeId> {
    let start = self.peek_with_mode(LexMode::SlashIsRegex).loc.0;
    let mut left = self.parse_expr_operand(ctx, min_prec)?;
    loop {
      let t = self.peek();
      match t.typ {
        TT::Dot => {
          self.consume();
          let property = self.parse_member_property_name()?;
          left = self.alloc_from(start, Syntax::Member {
            object: left,
            property,
            optional: false,
          });
        }
        TT::QuestionDot => {
          self.consume();
          left = match self.peek().typ {
            TT::ParenthesisOpen => {
              let args = self.parse_call_args(ctx)?;
              self.alloc_from(start, Syntax::Call {
                callee: left,
                args,
                optional: true,
              })
            }
            TT::BracketOpen => {
              self.consume();
              let property = self.parse_expr(ctx.with_allow_in(true))?;
              self.require(TT::BracketClose)?;
              self.alloc_from(start, Syntax::ComputedMember {
                object: left,
                property,
                optional: true,
              })
            }
            _ => {
              let property = self.parse_member_property_name()?;
              self.alloc_from(start, Syntax::Member {
                object: left,
                property,
                optional: true,
              })
            }
          };
        }
        TT::BracketOpen => {
          self.consume();
          let property = self.parse_expr(ctx.with_allow_in(true))?;
          self.require(TT::BracketClose)?;
          left = self.alloc_from(start, Syntax::ComputedMember {
            object: left,
            property,
            optional: false,
          });
        }
        TT::ParenthesisOpen => {
          let args = self.parse_call_args(ctx)?;
          left = self.alloc_from(start, Syntax::Call {
            callee: left,
            args,
            optional: false,
          });
        }
        TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => {
          let template = self.parse_template(ctx)?;
          left = self.alloc_from(start, Syntax::TaggedTemplate {
            tag: left,
            template,
          });
        }
        TT::PlusPlus | TT::HyphenHyphen if !t.preceded_by_line_terminator => {
          let op = if t.typ == TT::PlusPlus {
            OperatorName::PostfixIncrement
          } else {
            OperatorName::PostfixDecrement
          };
          if prec(op) < min_prec {
            break;
          };
          self.consume();
          left = self.alloc_from(start, Syntax::Postfix { op, arg: left });
        }
        TT::Question => {
          if prec(OperatorName::Conditional) < min_prec {
            break;
          };
          self.consume();
          let consequent = self.parse_expr_assign(ctx.with_allow_in(true))?;
          self.require(TT::Colon)?;
          let alternate = self.parse_expr_assign(ctx)?;
          left = self.alloc_from(start, Syntax::Cond {
            test: left,
            consequent,
            alternate,
          });
        }
        typ => {
          if let Some(&op) = ASSIGNMENT_OPERATOR_MAPPING.get(&typ) {
            if prec(op) < min_prec {
              break;
            };
            self.consume();
            let target = if op == OperatorName::Assignment {
              self.expr_to_assign_target(left)?
            } else {
              left
            };
            let value = self.parse_expr_assign(ctx)?;
            left = self.alloc_from(start, Syntax::Assign { op, target, value });
            continue;
          };
          let Some(&op) = BINARY_OPERATOR_MAPPING.get(&typ) else {
            break;
          };
          if op == OperatorName::In && !ctx.allow_in {
            break;
          };
          let operator = &OPERATORS[&op];
          if operator.precedence < min_prec {
            break;
          };
          self.consume();
          let next_min_prec = match operator.associativity {
            crate::operator::Associativity::Left => operator.precedence + 1,
            crate::operator::Associativity::Right => operator.precedence,
          };
          let right = self.parse_expr_with_min_prec(ctx, next_min_prec)?;
          left = self.alloc_from(start, Syntax::Binary { op, left, right });
        }
      };
    }
    Ok(left)
  }

  fn parse_member_property_name(&mut self) -> SyntaxResult<String> {
    let t = self.peek();
    if t.typ == TT::PrivateMember {
      self.consume();
      return Ok(self.string(t.loc));
    };
    self.require_identifier_name()
  }

  pub fn parse_call_args(&mut self, ctx: ParseCtx) -> SyntaxResult<Vec<NodeId>> {
    self.require(TT::ParenthesisOpen)?;
    let ctx = ctx.with_allow_in(true);
    self.list(TT::Comma, TT::ParenthesisClose, |p| {
      if p.peek().typ == TT::DotDotDot {
        p.with_loc(|p| {
          p.consume();
          let arg = p.parse_expr_assign(ctx)?;
          Ok(Syntax::Spread { arg })
        })
      } else {
        p.parse_expr_assign(ctx)
      }
    })
  }

  fn parse_template(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      let mut quasis = Vec::new();
      let mut exprs = Vec::new();
      let first = p.consume();
      // Strip the leading backtick.
      let mut part = first;
      let mut text_start = first.loc.0 + 1;
      loop {
        let ended = part.typ == TT::LiteralTemplatePartStringEnd;
        let text_end = if ended { part.loc.1 - 1 } else { part.loc.1 - 2 };
        quasis.push(p.string(Loc(text_start, text_end)));
        if ended {
          break;
        };
        exprs.push(p.parse_expr(ctx.with_allow_in(true))?);
        p.require(TT::BraceClose)?;
        part = p.consume_with_mode(LexMode::TemplateStrContinue);
        match part.typ {
          TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => {}
          _ => return Err(part.error(SyntaxErrorType::ExpectedSyntax("template continuation"))),
        };
        text_start = part.loc.0;
      }
      Ok(Syntax::LitTemplate { quasis, exprs })
    })
  }

  fn parse_expr_operand(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<NodeId> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    if let Some(&op) = UNARY_OPERATOR_MAPPING.get(&t.typ) {
      return self.with_loc(|p| {
        p.consume_with_mode(LexMode::SlashIsRegex);
        let arg = p.parse_expr_with_min_prec(ctx, prec(op))?;
        Ok(Syntax::Unary { op, arg })
      });
    };
    match t.typ {
      TT::Invalid => Err(t.error(SyntaxErrorType::ExpectedSyntax("expression"))),
      TT::EOF => Err(t.error(SyntaxErrorType::UnexpectedEnd)),
      TT::LiteralRegex => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        let raw = self.string(t.loc);
        Ok(self.alloc(t.loc, Syntax::LitRegex { raw }))
      }
      TT::LiteralNumber => {
        self.consume();
        let raw = self.string(t.loc);
        Ok(self.alloc(t.loc, Syntax::LitNum { raw }))
      }
      TT::LiteralString => {
        self.consume();
        let raw = self.string(t.loc);
        let value = decode_string_body(&raw[1..raw.len() - 1])
          .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?;
        Ok(self.alloc(t.loc, Syntax::LitStr {
          value,
          raw: Some(raw),
        }))
      }
      TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => self.parse_template(ctx),
      TT::LiteralTrue | TT::LiteralFalse => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::LitBool {
          value: t.typ == TT::LiteralTrue,
        }))
      }
      TT::LiteralNull => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::LitNull))
      }
      TT::KeywordThis => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::This))
      }
      TT::KeywordSuper => {
        self.consume();
        Ok(self.alloc(t.loc, Syntax::Super))
      }
      TT::KeywordImport => {
        // Dynamic `import(...)` and `import.meta` are kept as plain references.
        self.consume();
        Ok(self.alloc(t.loc, Syntax::Id {
          name: "import".into(),
        }))
      }
      TT::KeywordFunction => self.parse_func_expr(ctx),
      TT::KeywordClass => self.parse_class(ctx, false),
      TT::BracketOpen => self.parse_array_literal(ctx),
      TT::BraceOpen => self.parse_object_literal(ctx),
      TT::ParenthesisOpen | TT::ChevronLeft => {
        if min_prec <= 2 {
          let cp = self.checkpoint();
          match self.parse_arrow_func(ctx, false) {
            Ok(arrow) => return Ok(arrow),
            Err(err) => {
              self.restore_checkpoint(cp);
              if t.typ == TT::ChevronLeft {
                return Err(err);
              };
            }
          };
        };
        self.parse_grouping(ctx)
      }
      TT::KeywordNew => self.parse_new(ctx),
      TT::KeywordYield => self.with_loc(|p| {
        p.consume();
        let delegate = p.consume_if(TT::Asterisk).is_match();
        let next = p.peek_with_mode(LexMode::SlashIsRegex);
        let ends = matches!(
          next.typ,
          TT::ParenthesisClose
            | TT::BracketClose
            | TT::BraceClose
            | TT::Comma
            | TT::Semicolon
            | TT::Colon
            | TT::EOF
        ) || (next.preceded_by_line_terminator && !delegate);
        let arg = if ends {
          None
        } else {
          Some(p.parse_expr_assign(ctx)?)
        };
        Ok(Syntax::Yield { arg, delegate })
      }),
      TT::KeywordAsync => {
        let (_, t1) = self.peek_2();
        if !t1.preceded_by_line_terminator {
          if t1.typ == TT::KeywordFunction {
            return self.parse_func_expr(ctx);
          };
          if t1.typ == TT::ParenthesisOpen || t1.typ == TT::ChevronLeft {
            let cp = self.checkpoint();
            match self.parse_arrow_func(ctx, true) {
              Ok(arrow) => return Ok(arrow),
              Err(_) => self.restore_checkpoint(cp),
            };
          };
          if t1.typ == TT::Identifier {
            return self.parse_simple_arrow_func(ctx, true);
          };
        };
        self.parse_id_or_simple_arrow(ctx)
      }
      _ if self.is_identifier() => self.parse_id_or_simple_arrow(ctx),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("expression"))),
    }
  }

  fn parse_id_or_simple_arrow(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    let (_, t1) = self.peek_2();
    if t1.typ == TT::EqualsChevronRight && !t1.preceded_by_line_terminator {
      return self.parse_simple_arrow_func(ctx, false);
    };
    let t = self.peek();
    let name = self.require_identifier()?;
    Ok(self.alloc(t.loc, Syntax::Id { name }))
  }

  /// `x => body` and `async x => body`.
  fn parse_simple_arrow_func(&mut self, ctx: ParseCtx, is_async: bool) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      if is_async {
        p.require(TT::KeywordAsync)?;
      };
      let t = p.peek();
      let name = p.require_identifier()?;
      let param = p.alloc(t.loc, Syntax::IdPat {
        name,
        annotation: None,
        optional: false,
      });
      p.require(TT::EqualsChevronRight)?;
      let body = p.parse_arrow_body(ctx)?;
      Ok(Syntax::Func {
        name: None,
        is_decl: false,
        arrow: true,
        is_async,
        generator: false,
        type_params: Vec::new(),
        params: vec![param],
        return_type: None,
        body,
      })
    })
  }

  fn parse_arrow_func(&mut self, ctx: ParseCtx, is_async: bool) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      if is_async {
        p.require(TT::KeywordAsync)?;
      };
      let type_params = p.parse_type_params_opt()?;
      let params = p.parse_params(ctx)?;
      let return_type = if p.consume_if(TT::Colon).is_match() {
        Some(p.parse_return_type()?)
      } else {
        None
      };
      let arrow = p.require(TT::EqualsChevronRight)?;
      if arrow.preceded_by_line_terminator {
        return Err(arrow.error(SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters));
      };
      let body = p.parse_arrow_body(ctx)?;
      Ok(Syntax::Func {
        name: None,
        is_decl: false,
        arrow: true,
        is_async,
        generator: false,
        type_params,
        params,
        return_type,
        body,
      })
    })
  }

  fn parse_arrow_body(&mut self, ctx: ParseCtx) -> SyntaxResult<FuncBody> {
    Ok(if self.peek().typ == TT::BraceOpen {
      FuncBody::Block(self.parse_block_body(ctx)?)
    } else {
      FuncBody::Expr(self.parse_expr_assign(ctx)?)
    })
  }

  fn parse_grouping(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.require(TT::ParenthesisOpen)?;
    let start = self.peek().loc.0;
    let expr = self.parse_expr(ctx.with_allow_in(true))?;
    let expr = if self.consume_if(TT::Colon).is_match() {
      let annotation = self.parse_type()?;
      self.alloc_from(start, Syntax::TypeCast { expr, annotation })
    } else {
      expr
    };
    self.require(TT::ParenthesisClose)?;
    Ok(expr)
  }

  fn parse_new(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::KeywordNew)?;
      if p.consume_if(TT::Dot).is_match() {
        // `new.target`.
        let property = p.require_identifier_name()?;
        let loc = p.peek().loc;
        let object = p.alloc(loc, Syntax::Id { name: "new".into() });
        return Ok(Syntax::Member {
          object,
          property,
          optional: false,
        });
      };
      let start = p.peek().loc.0;
      let mut callee = p.parse_expr_operand(ctx, CALL_MEMBER_PRECEDENCE)?;
      loop {
        match p.peek().typ {
          TT::Dot => {
            p.consume();
            let property = p.parse_member_property_name()?;
            callee = p.alloc_from(start, Syntax::Member {
              object: callee,
              property,
              optional: false,
            });
          }
          TT::BracketOpen => {
            p.consume();
            let property = p.parse_expr(ctx.with_allow_in(true))?;
            p.require(TT::BracketClose)?;
            callee = p.alloc_from(start, Syntax::ComputedMember {
              object: callee,
              property,
              optional: false,
            });
          }
          _ => break,
        };
      }
      let args = if p.peek().typ == TT::ParenthesisOpen {
        p.parse_call_args(ctx)?
      } else {
        Vec::new()
      };
      Ok(Syntax::New { callee, args })
    })
  }

  fn parse_array_literal(&mut self, ctx: ParseCtx) -> SyntaxResult<NodeId> {
    self.with_loc(|p| {
      p.require(TT::BracketOpen)?;
      let ctx = ctx.with_allow_in(true);
      let mut elements = Vec::new();
      loop {
        match p.peek().typ {
          TT::BracketClose => {
            p.consume();
            break;
          }
          TT::Comma => {
            p.consume();
            elements.push(None);
            continue;
          }
          TT::DotDotDot => {
            let spread = p.with_loc(|p| {
              p.consume();
              let arg = p.parse_expr_assign(ctx)?;
              Ok(Syntax::Spread { arg })
            })?;
            elements.push(Some(spread));
          }
          _ => elements.push(Some(p.parse_expr_assign(ctx)?)),
        };
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::BracketClose)?;
          break;
        };
      }
      Ok(Syntax::LitArr { elements })
    })
  }

  /// Reinterprets an expression parsed before `=` (or in a `for` head) as an assignment target.
  pub fn expr_to_assign_target(&mut self, id: NodeId) -> SyntaxResult<NodeId> {
    let loc = self.ast().loc(id);
    let invalid = || loc.error(SyntaxErrorType::InvalidAssigmentTarget, None);
    let stx = self.ast().stx(id).clone();
    let new_stx = match stx {
      Syntax::Id { .. }
      | Syntax::Member { .. }
      | Syntax::ComputedMember { .. }
      | Syntax::VarDecl { .. }
      | Syntax::ObjPat { .. }
      | Syntax::ArrPat { .. }
      | Syntax::IdPat { .. } => return Ok(id),
      Syntax::TypeCast { expr, .. } => return self.expr_to_assign_target(expr),
      Syntax::LitArr { elements } => {
        let mut out = Vec::new();
        for e in elements {
          out.push(match e {
            Some(e) => Some(self.expr_to_assign_target(e)?),
            None => None,
          });
        }
        Syntax::ArrPat {
          elements: out,
          annotation: None,
        }
      }
      Syntax::LitObj { members } => {
        let mut props = Vec::new();
        for m in members {
          props.push(self.expr_to_assign_target(m)?);
        }
        Syntax::ObjPat {
          props,
          annotation: None,
        }
      }
      Syntax::ObjProp {
        key,
        value,
        shorthand,
      } => Syntax::ObjPatProp {
        key,
        target: self.expr_to_assign_target(value)?,
        shorthand,
      },
      Syntax::Spread { arg } => Syntax::RestPat {
        target: self.expr_to_assign_target(arg)?,
        annotation: None,
      },
      Syntax::Assign {
        op: OperatorName::Assignment,
        target,
        value,
      } => Syntax::AssignPat {
        target,
        default: value,
      },
      _ => return Err(invalid()),
    };
    self.ast_mut().replace(id, new_stx);
    Ok(id)
  }

  /// The name of a property key as written, used by object literals and classes.
  pub fn parse_prop_key(&mut self, ctx: ParseCtx) -> SyntaxResult<PropKey> {
    let t = self.peek();
    Ok(match t.typ {
      TT::LiteralString => {
        self.consume();
        let raw = self.str(t.loc);
        PropKey::Str(
          decode_string_body(&raw[1..raw.len() - 1])
            .ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?,
        )
      }
      TT::LiteralNumber => {
        self.consume();
        PropKey::Num(self.string(t.loc))
      }
      TT::PrivateMember => {
        self.consume();
        PropKey::Private(self.string(t.loc))
      }
      TT::BracketOpen => {
        self.consume();
        let key = self.parse_expr_assign(ctx.with_allow_in(true))?;
        self.require(TT::BracketClose)?;
        PropKey::Computed(key)
      }
      _ => PropKey::Ident(self.require_identifier_name()?),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::decode_string_body;
  use crate::ast::Syntax;
  use crate::operator::OperatorName;
  use crate::parse;

  fn first_expr(src: &str) -> (crate::ast::Ast, crate::ast::NodeId) {
    let ast = parse(src).unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let Syntax::ExprStmt { expr } = ast.stx(body[0]) else {
      panic!("expected expression statement");
    };
    let expr = *expr;
    (ast, expr)
  }

  #[test]
  fn decodes_escapes() {
    assert_eq!(decode_string_body(r"a\nb\x41\u{1F600}").unwrap(), "a\nbA\u{1F600}");
    assert_eq!(decode_string_body(r"\'").unwrap(), "'");
  }

  #[test]
  fn multiplication_binds_tighter() {
    let (ast, expr) = first_expr("a + b * c;");
    let Syntax::Binary { op, right, .. } = ast.stx(expr) else {
      panic!("expected binary");
    };
    assert_eq!(*op, OperatorName::Addition);
    assert!(matches!(
      ast.stx(*right),
      Syntax::Binary {
        op: OperatorName::Multiplication,
        ..
      }
    ));
  }

  #[test]
  fn parenthesised_annotation_is_a_cast() {
    let (ast, expr) = first_expr("(x: number);");
    assert!(matches!(ast.stx(expr), Syntax::TypeCast { .. }));
  }

  #[test]
  fn typed_arrow_parameters() {
    let (ast, expr) = first_expr("(x: number): string => String(x);");
    let Syntax::Func {
      arrow,
      params,
      return_type,
      ..
    } = ast.stx(expr)
    else {
      panic!("expected arrow");
    };
    assert!(*arrow);
    assert_eq!(params.len(), 1);
    assert!(return_type.is_some());
  }

  #[test]
  fn conditional_is_not_an_arrow() {
    let (ast, expr) = first_expr("a ? (b) : c;");
    assert!(matches!(ast.stx(expr), Syntax::Cond { .. }));
  }

  #[test]
  fn destructuring_assignment() {
    let (ast, expr) = first_expr("[a, b] = c;");
    let Syntax::Assign { target, .. } = ast.stx(expr) else {
      panic!("expected assignment");
    };
    assert!(matches!(ast.stx(*target), Syntax::ArrPat { .. }));
  }
}
