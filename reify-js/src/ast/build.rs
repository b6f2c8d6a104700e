//! Shorthands for allocating synthesized nodes.

use super::Ast;
use super::ClassMemberKind;
use super::FuncBody;
use super::NodeId;
use super::PropKey;
use super::Syntax;
use super::VarDeclMode;
use crate::char::is_identifier_name;
use crate::loc::Loc;
use crate::operator::OperatorName;

/// Allocates nodes into an [`Ast`], all sharing one source location.
pub struct Builder<'a> {
  pub ast: &'a mut Ast,
  pub loc: Loc,
}

impl<'a> Builder<'a> {
  pub fn new(ast: &'a mut Ast, loc: Loc) -> Builder<'a> {
    Builder { ast, loc }
  }

  pub fn node(&mut self, stx: Syntax) -> NodeId {
    self.ast.alloc(self.loc, stx)
  }

  pub fn id(&mut self, name: &str) -> NodeId {
    self.node(Syntax::Id { name: name.into() })
  }

  pub fn id_pat(&mut self, name: &str) -> NodeId {
    self.node(Syntax::IdPat {
      name: name.into(),
      annotation: None,
      optional: false,
    })
  }

  pub fn str(&mut self, value: &str) -> NodeId {
    self.node(Syntax::LitStr {
      value: value.into(),
      raw: None,
    })
  }

  pub fn num(&mut self, raw: &str) -> NodeId {
    self.node(Syntax::LitNum { raw: raw.into() })
  }

  pub fn bool(&mut self, value: bool) -> NodeId {
    self.node(Syntax::LitBool { value })
  }

  pub fn this(&mut self) -> NodeId {
    self.node(Syntax::This)
  }

  pub fn member(&mut self, object: NodeId, property: &str) -> NodeId {
    self.node(Syntax::Member {
      object,
      property: property.into(),
      optional: false,
    })
  }

  pub fn computed(&mut self, object: NodeId, property: NodeId) -> NodeId {
    self.node(Syntax::ComputedMember {
      object,
      property,
      optional: false,
    })
  }

  pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
    self.node(Syntax::Call {
      callee,
      args,
      optional: false,
    })
  }

  /// `object.method(args...)`.
  pub fn method_call(&mut self, object: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
    let callee = self.member(object, method);
    self.call(callee, args)
  }

  /// `name.method(args...)`.
  pub fn named_call(&mut self, name: &str, method: &str, args: Vec<NodeId>) -> NodeId {
    let object = self.id(name);
    self.method_call(object, method, args)
  }

  pub fn unary(&mut self, op: OperatorName, arg: NodeId) -> NodeId {
    self.node(Syntax::Unary { op, arg })
  }

  pub fn binary(&mut self, op: OperatorName, left: NodeId, right: NodeId) -> NodeId {
    self.node(Syntax::Binary { op, left, right })
  }

  pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
    self.node(Syntax::Assign {
      op: OperatorName::Assignment,
      target,
      value,
    })
  }

  /// An object literal with statically named properties.
  pub fn obj(&mut self, props: Vec<(String, NodeId)>) -> NodeId {
    let members = props
      .into_iter()
      .map(|(key, value)| {
        let key = if is_identifier_name(&key) {
          PropKey::Ident(key)
        } else {
          PropKey::Str(key)
        };
        self.node(Syntax::ObjProp {
          key,
          value,
          shorthand: false,
        })
      })
      .collect();
    self.node(Syntax::LitObj { members })
  }

  pub fn arrow(&mut self, params: Vec<NodeId>, body: FuncBody) -> NodeId {
    self.node(Syntax::Func {
      name: None,
      is_decl: false,
      arrow: true,
      is_async: false,
      generator: false,
      type_params: Vec::new(),
      params,
      return_type: None,
      body,
    })
  }

  pub fn func_expr(&mut self, params: Vec<NodeId>, body: Vec<NodeId>) -> NodeId {
    self.node(Syntax::Func {
      name: None,
      is_decl: false,
      arrow: false,
      is_async: false,
      generator: false,
      type_params: Vec::new(),
      params,
      return_type: None,
      body: FuncBody::Block(body),
    })
  }

  pub fn constructor(&mut self) -> NodeId {
    let func = self.func_expr(Vec::new(), Vec::new());
    self.node(Syntax::ClassMember {
      key: PropKey::Ident("constructor".into()),
      is_static: false,
      kind: ClassMemberKind::Constructor,
      value: Some(func),
      annotation: None,
      decorators: Vec::new(),
    })
  }

  pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
    self.node(Syntax::ExprStmt { expr })
  }

  pub fn var_decl(&mut self, mode: VarDeclMode, name: &str, init: Option<NodeId>) -> NodeId {
    let declarator = self.declarator(name, init);
    self.node(Syntax::VarDecl {
      mode,
      declarators: vec![declarator],
    })
  }

  pub fn declarator(&mut self, name: &str, init: Option<NodeId>) -> NodeId {
    let pattern = self.id_pat(name);
    self.node(Syntax::VarDeclarator { pattern, init })
  }

  pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
    self.node(Syntax::Return { value })
  }

  pub fn if_stmt(&mut self, test: NodeId, consequent: NodeId, alternate: Option<NodeId>) -> NodeId {
    self.node(Syntax::If {
      test,
      consequent,
      alternate,
    })
  }

  pub fn throw(&mut self, value: NodeId) -> NodeId {
    self.node(Syntax::Throw { value })
  }

  pub fn block(&mut self, body: Vec<NodeId>) -> NodeId {
    self.node(Syntax::Block { body })
  }
}
