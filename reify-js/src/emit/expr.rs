use super::escape::write_string_literal;
use super::precedence::binary_operand_needs_parens;
use super::precedence::child_min_prec_for_binary;
use super::precedence::expr_prec;
use super::precedence::new_callee_needs_parens;
use super::precedence::operator_prec;
use super::precedence::starts_with_brace;
use super::precedence::Side;
use super::precedence::CALL_MEMBER_PRECEDENCE;
use super::precedence::ELEMENT_PRECEDENCE;
use super::Emitter;
use crate::ast::ClassMemberKind;
use crate::ast::FuncBody;
use crate::ast::MethodKind;
use crate::ast::NodeId;
use crate::ast::PropKey;
use crate::ast::Syntax;
use crate::operator::OperatorName;

impl<'a> Emitter<'a> {
  /// Prints an expression, parenthesising it when it binds looser than `min_prec`.
  pub(super) fn expr(&mut self, id: NodeId, min_prec: u8) {
    if expr_prec(self.ast, id) < min_prec {
      self.write("(");
      self.expr_inner(id);
      self.write(")");
    } else {
      self.expr_inner(id);
    }
  }

  fn expr_or_parens(&mut self, id: NodeId, min_prec: u8, force: bool) {
    if force {
      self.write("(");
      self.expr_inner(id);
      self.write(")");
    } else {
      self.expr(id, min_prec);
    }
  }

  fn prop_key(&mut self, key: &PropKey) {
    match key {
      PropKey::Ident(name) | PropKey::Private(name) | PropKey::Num(name) => self.write(name),
      PropKey::Str(value) => write_string_literal(&mut self.out, value),
      PropKey::Computed(expr) => {
        self.write("[");
        self.expr(*expr, ELEMENT_PRECEDENCE);
        self.write("]");
      }
    }
  }

  fn params(&mut self, params: &[NodeId]) {
    self.write("(");
    self.comma_separated(params, |e, p| e.expr(p, ELEMENT_PRECEDENCE));
    self.write(")");
  }

  /// Shared tail of object and class methods: `[async ][get |set ][*]key(params) { body }`.
  fn method(&mut self, key: &PropKey, kind: MethodKind, func: NodeId) {
    let ast = self.ast;
    let Syntax::Func {
      is_async,
      generator,
      params,
      body,
      ..
    } = ast.stx(func)
    else {
      return;
    };
    if *is_async {
      self.write("async ");
    };
    match kind {
      MethodKind::Getter => self.write("get "),
      MethodKind::Setter => self.write("set "),
      MethodKind::Method => {}
    };
    if *generator {
      self.write("*");
    };
    self.prop_key(key);
    self.params(params);
    self.write(" ");
    self.func_body(body);
  }

  fn class(&mut self, id: NodeId) {
    let ast = self.ast;
    let Syntax::Class {
      name,
      extends,
      members,
      ..
    } = ast.stx(id)
    else {
      return;
    };
    self.write("class");
    if let Some(name) = name {
      self.write(" ");
      self.write(name);
    };
    if let Some(extends) = extends {
      self.write(" extends ");
      self.expr(*extends, CALL_MEMBER_PRECEDENCE);
    };
    self.write(" ");
    if members.is_empty() {
      self.write("{}");
      return;
    };
    self.write("{");
    self.indent += 1;
    for member in members {
      self.newline();
      self.class_member(*member);
    }
    self.indent -= 1;
    self.newline();
    self.write("}");
  }

  fn class_member(&mut self, id: NodeId) {
    let ast = self.ast;
    let Syntax::ClassMember {
      key,
      is_static,
      kind,
      value,
      decorators,
      ..
    } = ast.stx(id)
    else {
      return;
    };
    for decorator in decorators {
      self.write("@");
      self.expr(*decorator, CALL_MEMBER_PRECEDENCE);
      self.newline();
    }
    if *is_static {
      self.write("static ");
    };
    match (kind, value) {
      (ClassMemberKind::Property, _) => {
        self.prop_key(key);
        if let Some(value) = value {
          self.write(" = ");
          self.expr(*value, ELEMENT_PRECEDENCE);
        };
        self.write(";");
      }
      (kind, Some(func)) => {
        let kind = match kind {
          ClassMemberKind::Getter => MethodKind::Getter,
          ClassMemberKind::Setter => MethodKind::Setter,
          _ => MethodKind::Method,
        };
        self.method(key, kind, *func);
      }
      (_, None) => {
        self.prop_key(key);
        self.write(";");
      }
    };
  }

  fn func(&mut self, id: NodeId) {
    let ast = self.ast;
    let Syntax::Func {
      name,
      arrow,
      is_async,
      generator,
      params,
      body,
      ..
    } = ast.stx(id)
    else {
      return;
    };
    if *is_async {
      self.write("async ");
    };
    if *arrow {
      self.params(params);
      self.write(" => ");
      match body {
        FuncBody::Expr(e) if starts_with_brace(ast, *e) => {
          self.write("(");
          self.expr(*e, 1);
          self.write(")");
        }
        body => self.func_body(body),
      };
      return;
    };
    self.write("function");
    if *generator {
      self.write("*");
    };
    self.write(" ");
    if let Some(name) = name {
      self.write(name);
    };
    self.params(params);
    self.write(" ");
    self.func_body(body);
  }

  fn args(&mut self, args: &[NodeId]) {
    self.write("(");
    self.comma_separated(args, |e, a| e.expr(a, ELEMENT_PRECEDENCE));
    self.write(")");
  }

  fn expr_inner(&mut self, id: NodeId) {
    let ast = self.ast;
    match ast.stx(id) {
      Syntax::IdPat { name, .. } | Syntax::Id { name } => self.write(name),
      Syntax::ObjPat { props, .. } => {
        if props.is_empty() {
          self.write("{}");
        } else {
          self.write("{ ");
          self.comma_separated(props, |e, p| e.expr(p, ELEMENT_PRECEDENCE));
          self.write(" }");
        };
      }
      Syntax::ObjPatProp {
        key,
        target,
        shorthand,
      } => {
        if *shorthand {
          self.expr(*target, ELEMENT_PRECEDENCE);
        } else {
          self.prop_key(key);
          self.write(": ");
          self.expr(*target, ELEMENT_PRECEDENCE);
        };
      }
      Syntax::ArrPat { elements, .. } | Syntax::LitArr { elements } => {
        self.write("[");
        for (i, element) in elements.iter().enumerate() {
          if i > 0 {
            self.write(", ");
          };
          if let Some(element) = element {
            self.expr(*element, ELEMENT_PRECEDENCE);
          };
        }
        // A trailing hole needs its own comma.
        if matches!(elements.last(), Some(None)) {
          self.write(",");
        };
        self.write("]");
      }
      Syntax::AssignPat { target, default } => {
        self.expr(*target, ELEMENT_PRECEDENCE);
        self.write(" = ");
        self.expr(*default, ELEMENT_PRECEDENCE);
      }
      Syntax::RestPat { target, .. } => {
        self.write("...");
        self.expr(*target, ELEMENT_PRECEDENCE);
      }
      Syntax::This => self.write("this"),
      Syntax::Super => self.write("super"),
      Syntax::LitBool { value } => self.write(if *value { "true" } else { "false" }),
      Syntax::LitNull => self.write("null"),
      Syntax::LitNum { raw } | Syntax::LitRegex { raw } => self.write(raw),
      Syntax::LitStr { value, raw } => match raw {
        Some(raw) => self.write(raw),
        None => write_string_literal(&mut self.out, value),
      },
      Syntax::LitTemplate { quasis, exprs } => {
        self.write("`");
        for (i, quasi) in quasis.iter().enumerate() {
          self.write(quasi);
          if let Some(e) = exprs.get(i) {
            self.write("${");
            self.expr(*e, 1);
            self.write("}");
          };
        }
        self.write("`");
      }
      Syntax::TaggedTemplate { tag, template } => {
        self.expr(*tag, CALL_MEMBER_PRECEDENCE);
        self.expr(*template, CALL_MEMBER_PRECEDENCE);
      }
      Syntax::LitObj { members } => {
        if members.is_empty() {
          self.write("{}");
        } else {
          self.write("{ ");
          self.comma_separated(members, |e, m| e.expr(m, ELEMENT_PRECEDENCE));
          self.write(" }");
        };
      }
      Syntax::ObjProp {
        key,
        value,
        shorthand,
      } => {
        if *shorthand {
          self.expr(*value, ELEMENT_PRECEDENCE);
        } else {
          self.prop_key(key);
          self.write(": ");
          self.expr(*value, ELEMENT_PRECEDENCE);
        };
      }
      Syntax::ObjMethod { key, kind, func } => self.method(key, *kind, *func),
      Syntax::Spread { arg } => {
        self.write("...");
        self.expr(*arg, ELEMENT_PRECEDENCE);
      }
      Syntax::Unary { op, arg } => {
        let symbol = op.symbol();
        self.write(symbol);
        let is_word = symbol.chars().all(|c| c.is_ascii_alphabetic());
        // `- -x` and `+ +x` must not merge into `--x` and `++x`.
        let merges = match ast.stx(*arg) {
          Syntax::Unary { op: inner, .. } => {
            let inner = inner.symbol();
            (symbol == "-" || symbol == "+") && inner.starts_with(symbol)
          }
          _ => false,
        };
        if is_word || merges {
          self.write(" ");
        };
        self.expr(*arg, operator_prec(*op));
      }
      Syntax::Postfix { op, arg } => {
        self.expr(*arg, CALL_MEMBER_PRECEDENCE);
        self.write(op.symbol());
      }
      Syntax::Binary { op, left, right } => {
        let force_left = binary_operand_needs_parens(ast, *op, Side::Left, *left);
        self.expr_or_parens(*left, child_min_prec_for_binary(*op, Side::Left), force_left);
        if *op == OperatorName::Comma {
          self.write(", ");
        } else {
          self.write(" ");
          self.write(op.symbol());
          self.write(" ");
        };
        let force_right = binary_operand_needs_parens(ast, *op, Side::Right, *right);
        self.expr_or_parens(*right, child_min_prec_for_binary(*op, Side::Right), force_right);
      }
      Syntax::Assign { op, target, value } => {
        // Object patterns must not start an expression statement; callers parenthesise.
        self.expr(*target, CALL_MEMBER_PRECEDENCE);
        self.write(" ");
        self.write(op.symbol());
        self.write(" ");
        self.expr(*value, operator_prec(OperatorName::Assignment));
      }
      Syntax::Cond {
        test,
        consequent,
        alternate,
      } => {
        let prec = operator_prec(OperatorName::Conditional);
        self.expr(*test, prec + 1);
        self.write(" ? ");
        self.expr(*consequent, ELEMENT_PRECEDENCE);
        self.write(" : ");
        self.expr(*alternate, ELEMENT_PRECEDENCE);
      }
      Syntax::Call {
        callee,
        args,
        optional,
      } => {
        self.expr(*callee, CALL_MEMBER_PRECEDENCE);
        if *optional {
          self.write("?.");
        };
        self.args(args);
      }
      Syntax::New { callee, args } => {
        self.write("new ");
        let force = new_callee_needs_parens(ast, *callee);
        self.expr_or_parens(*callee, CALL_MEMBER_PRECEDENCE, force);
        self.args(args);
      }
      Syntax::Member {
        object,
        property,
        optional,
      } => {
        // `1.toString()` would read the dot as a decimal point.
        let force = matches!(ast.stx(*object), Syntax::LitNum { raw } if raw.bytes().all(|b| b.is_ascii_digit()));
        self.expr_or_parens(*object, CALL_MEMBER_PRECEDENCE, force);
        self.write(if *optional { "?." } else { "." });
        self.write(property);
      }
      Syntax::ComputedMember {
        object,
        property,
        optional,
      } => {
        self.expr(*object, CALL_MEMBER_PRECEDENCE);
        self.write(if *optional { "?.[" } else { "[" });
        self.expr(*property, 1);
        self.write("]");
      }
      Syntax::Yield { arg, delegate } => {
        self.write(if *delegate { "yield*" } else { "yield" });
        if let Some(arg) = arg {
          self.write(" ");
          self.expr(*arg, ELEMENT_PRECEDENCE);
        };
      }
      Syntax::TypeCast { expr, .. } => self.expr_inner(*expr),
      Syntax::Func { .. } => self.func(id),
      Syntax::Class { .. } => self.class(id),
      Syntax::ClassMember { .. } => self.class_member(id),
      Syntax::VarDecl { .. } => self.var_decl(id),
      Syntax::VarDeclarator { pattern, init } => {
        self.expr(*pattern, ELEMENT_PRECEDENCE);
        if let Some(init) = init {
          self.write(" = ");
          self.expr(*init, ELEMENT_PRECEDENCE);
        };
      }
      // Statements and types never appear in expression position.
      _ => {}
    };
  }
}
