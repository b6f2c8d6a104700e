//! Arena-backed syntax tree.
//!
//! Every node lives in a single [`Ast`] and is addressed by a [`NodeId`]. Parents refer to
//! children by id, so rewriting a node in place means replacing the [`Syntax`] stored in its
//! slot; nothing else has to be updated. Slots are never freed: a node that is no longer
//! reachable from the root simply stops being emitted.

use crate::loc::Loc;
use crate::operator::OperatorName;
use serde::Serialize;
use std::ops::Index;
use std::ops::IndexMut;

pub mod build;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct Node {
  pub loc: Loc,
  pub stx: Syntax,
  /// Set on nodes the rewriter produced itself so that they are not rewritten a second time.
  pub visited: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum VarDeclMode {
  Const,
  Let,
  Var,
}

impl VarDeclMode {
  pub fn keyword(self) -> &'static str {
    match self {
      VarDeclMode::Const => "const",
      VarDeclMode::Let => "let",
      VarDeclMode::Var => "var",
    }
  }
}

/// Whether an import or export moves values or only types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ImportKind {
  Value,
  Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportName {
  pub imported: String,
  pub local: String,
  pub kind: ImportKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportName {
  pub local: String,
  pub exported: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PropKey {
  Ident(String),
  Str(String),
  Num(String),
  Private(String),
  Computed(NodeId),
}

impl PropKey {
  /// The statically known name, if any.
  pub fn name(&self) -> Option<&str> {
    match self {
      PropKey::Ident(n) | PropKey::Str(n) | PropKey::Num(n) | PropKey::Private(n) => Some(n),
      PropKey::Computed(_) => None,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MethodKind {
  Method,
  Getter,
  Setter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ClassMemberKind {
  Constructor,
  Method,
  Getter,
  Setter,
  Property,
}

#[derive(Clone, Debug, Serialize)]
pub enum FuncBody {
  Block(Vec<NodeId>),
  Expr(NodeId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKeyword {
  Any,
  Boolean,
  Empty,
  Existential,
  Mixed,
  Null,
  Number,
  String,
  Symbol,
  Void,
}

impl TypeKeyword {
  pub fn from_name(name: &str) -> Option<TypeKeyword> {
    Some(match name {
      "any" => TypeKeyword::Any,
      "bool" | "boolean" => TypeKeyword::Boolean,
      "empty" => TypeKeyword::Empty,
      "mixed" => TypeKeyword::Mixed,
      "number" => TypeKeyword::Number,
      "string" => TypeKeyword::String,
      "symbol" => TypeKeyword::Symbol,
      "void" => TypeKeyword::Void,
      _ => return None,
    })
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "$t")]
pub enum Syntax {
  // Patterns.
  IdPat {
    name: String,
    annotation: Option<NodeId>,
    optional: bool,
  },
  // Properties are ObjPatProp, optionally followed by a RestPat.
  ObjPat {
    props: Vec<NodeId>,
    annotation: Option<NodeId>,
  },
  ObjPatProp {
    key: PropKey,
    target: NodeId,
    shorthand: bool,
  },
  ArrPat {
    elements: Vec<Option<NodeId>>,
    annotation: Option<NodeId>,
  },
  AssignPat {
    target: NodeId,
    default: NodeId,
  },
  RestPat {
    target: NodeId,
    annotation: Option<NodeId>,
  },

  // Expressions.
  Id {
    name: String,
  },
  This,
  Super,
  LitBool {
    value: bool,
  },
  LitNull,
  LitNum {
    raw: String,
  },
  LitStr {
    value: String,
    // Verbatim source text including quotes; absent on synthesized strings.
    raw: Option<String>,
  },
  LitRegex {
    raw: String,
  },
  LitTemplate {
    quasis: Vec<String>,
    exprs: Vec<NodeId>,
  },
  TaggedTemplate {
    tag: NodeId,
    template: NodeId,
  },
  LitArr {
    elements: Vec<Option<NodeId>>,
  },
  LitObj {
    members: Vec<NodeId>,
  },
  ObjProp {
    key: PropKey,
    value: NodeId,
    shorthand: bool,
  },
  ObjMethod {
    key: PropKey,
    kind: MethodKind,
    func: NodeId,
  },
  Spread {
    arg: NodeId,
  },
  Unary {
    op: OperatorName,
    arg: NodeId,
  },
  Postfix {
    op: OperatorName,
    arg: NodeId,
  },
  Binary {
    op: OperatorName,
    left: NodeId,
    right: NodeId,
  },
  Assign {
    op: OperatorName,
    target: NodeId,
    value: NodeId,
  },
  Cond {
    test: NodeId,
    consequent: NodeId,
    alternate: NodeId,
  },
  Call {
    callee: NodeId,
    args: Vec<NodeId>,
    optional: bool,
  },
  New {
    callee: NodeId,
    args: Vec<NodeId>,
  },
  Member {
    object: NodeId,
    property: String,
    optional: bool,
  },
  ComputedMember {
    object: NodeId,
    property: NodeId,
    optional: bool,
  },
  Yield {
    arg: Option<NodeId>,
    delegate: bool,
  },
  TypeCast {
    expr: NodeId,
    annotation: NodeId,
  },
  Func {
    name: Option<String>,
    // Function declarations appear in statement position.
    is_decl: bool,
    arrow: bool,
    is_async: bool,
    generator: bool,
    type_params: Vec<NodeId>,
    params: Vec<NodeId>,
    return_type: Option<NodeId>,
    body: FuncBody,
  },
  Class {
    name: Option<String>,
    is_decl: bool,
    type_params: Vec<NodeId>,
    extends: Option<NodeId>,
    super_type_args: Vec<NodeId>,
    implements: Vec<NodeId>,
    members: Vec<NodeId>,
  },
  ClassMember {
    key: PropKey,
    is_static: bool,
    kind: ClassMemberKind,
    // A Func for methods, the initializer for properties.
    value: Option<NodeId>,
    annotation: Option<NodeId>,
    decorators: Vec<NodeId>,
  },

  // Statements.
  Program {
    body: Vec<NodeId>,
  },
  Block {
    body: Vec<NodeId>,
  },
  Empty,
  Debugger,
  ExprStmt {
    expr: NodeId,
  },
  VarDecl {
    mode: VarDeclMode,
    declarators: Vec<NodeId>,
  },
  VarDeclarator {
    pattern: NodeId,
    init: Option<NodeId>,
  },
  If {
    test: NodeId,
    consequent: NodeId,
    alternate: Option<NodeId>,
  },
  Return {
    value: Option<NodeId>,
  },
  Throw {
    value: NodeId,
  },
  Try {
    block: NodeId,
    handler: Option<NodeId>,
    finalizer: Option<NodeId>,
  },
  Catch {
    param: Option<NodeId>,
    body: Vec<NodeId>,
  },
  While {
    test: NodeId,
    body: NodeId,
  },
  DoWhile {
    body: NodeId,
    test: NodeId,
  },
  For {
    init: Option<NodeId>,
    test: Option<NodeId>,
    update: Option<NodeId>,
    body: NodeId,
  },
  ForIn {
    left: NodeId,
    right: NodeId,
    body: NodeId,
  },
  ForOf {
    is_await: bool,
    left: NodeId,
    right: NodeId,
    body: NodeId,
  },
  Switch {
    discriminant: NodeId,
    cases: Vec<NodeId>,
  },
  SwitchCase {
    test: Option<NodeId>,
    body: Vec<NodeId>,
  },
  Break {
    label: Option<String>,
  },
  Continue {
    label: Option<String>,
  },
  Labeled {
    label: String,
    body: NodeId,
  },
  Import {
    kind: ImportKind,
    default: Option<String>,
    namespace: Option<String>,
    names: Vec<ImportName>,
    module: String,
  },
  ExportNamed {
    kind: ImportKind,
    names: Vec<ExportName>,
    from: Option<String>,
  },
  ExportAll {
    alias: Option<String>,
    from: String,
  },
  ExportDecl {
    decl: NodeId,
  },
  ExportDefault {
    value: NodeId,
  },
  TypeAlias {
    name: String,
    type_params: Vec<NodeId>,
    value: NodeId,
  },
  Interface {
    name: String,
    type_params: Vec<NodeId>,
    extends: Vec<NodeId>,
    body: NodeId,
  },

  // Type expressions.
  TypeKeyword {
    keyword: TypeKeyword,
  },
  TypeLitStr {
    value: String,
  },
  TypeLitNum {
    raw: String,
  },
  TypeLitBool {
    value: bool,
  },
  TypeRef {
    // Qualified names are split on `.`.
    name: Vec<String>,
    args: Vec<NodeId>,
  },
  TypeNullable {
    inner: NodeId,
  },
  TypeUnion {
    types: Vec<NodeId>,
  },
  TypeIntersection {
    types: Vec<NodeId>,
  },
  TypeArray {
    elem: NodeId,
  },
  TypeTuple {
    elems: Vec<NodeId>,
  },
  TypeObject {
    exact: bool,
    members: Vec<NodeId>,
  },
  TypeObjectProp {
    key: String,
    value: NodeId,
    optional: bool,
  },
  TypeIndexer {
    key_name: Option<String>,
    key: NodeId,
    value: NodeId,
  },
  TypeSpread {
    arg: NodeId,
  },
  TypeFunc {
    params: Vec<NodeId>,
    rest: Option<NodeId>,
    ret: NodeId,
  },
  TypeFuncParam {
    name: Option<String>,
    value: NodeId,
    optional: bool,
  },
  TypeTypeof {
    // An Id or Member expression.
    arg: NodeId,
  },
  TypeParam {
    name: String,
    bound: Option<NodeId>,
    default: Option<NodeId>,
  },
}

impl Syntax {
  pub fn is_type(&self) -> bool {
    matches!(
      self,
      Syntax::TypeKeyword { .. }
        | Syntax::TypeLitStr { .. }
        | Syntax::TypeLitNum { .. }
        | Syntax::TypeLitBool { .. }
        | Syntax::TypeRef { .. }
        | Syntax::TypeNullable { .. }
        | Syntax::TypeUnion { .. }
        | Syntax::TypeIntersection { .. }
        | Syntax::TypeArray { .. }
        | Syntax::TypeTuple { .. }
        | Syntax::TypeObject { .. }
        | Syntax::TypeObjectProp { .. }
        | Syntax::TypeIndexer { .. }
        | Syntax::TypeSpread { .. }
        | Syntax::TypeFunc { .. }
        | Syntax::TypeFuncParam { .. }
        | Syntax::TypeTypeof { .. }
        | Syntax::TypeParam { .. }
    )
  }

  /// The annotation slot of a pattern node, if it has one.
  pub fn annotation_mut(&mut self) -> Option<&mut Option<NodeId>> {
    match self {
      Syntax::IdPat { annotation, .. }
      | Syntax::ObjPat { annotation, .. }
      | Syntax::ArrPat { annotation, .. }
      | Syntax::RestPat { annotation, .. } => Some(annotation),
      _ => None,
    }
  }

  pub fn annotation(&self) -> Option<NodeId> {
    match self {
      Syntax::IdPat { annotation, .. }
      | Syntax::ObjPat { annotation, .. }
      | Syntax::ArrPat { annotation, .. }
      | Syntax::RestPat { annotation, .. } => *annotation,
      _ => None,
    }
  }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Ast {
  nodes: Vec<Node>,
  root: Option<NodeId>,
}

impl Ast {
  pub fn new() -> Ast {
    Ast::default()
  }

  pub fn alloc(&mut self, loc: Loc, stx: Syntax) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(Node {
      loc,
      stx,
      visited: false,
    });
    id
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Drops every node allocated after the first `len`. Used when the parser backtracks.
  pub fn truncate(&mut self, len: usize) {
    self.nodes.truncate(len);
  }

  pub fn root(&self) -> NodeId {
    self.root.unwrap_or(NodeId(0))
  }

  pub fn set_root(&mut self, root: NodeId) {
    self.root = Some(root);
  }

  pub fn stx(&self, id: NodeId) -> &Syntax {
    &self.nodes[id.index()].stx
  }

  pub fn stx_mut(&mut self, id: NodeId) -> &mut Syntax {
    &mut self.nodes[id.index()].stx
  }

  pub fn loc(&self, id: NodeId) -> Loc {
    self.nodes[id.index()].loc
  }

  /// Replaces the content of a slot, returning what was there. All references to `id` now see
  /// the new syntax.
  pub fn replace(&mut self, id: NodeId, stx: Syntax) -> Syntax {
    std::mem::replace(&mut self.nodes[id.index()].stx, stx)
  }

  /// Moves the content of `id` into a new slot so that `id` can be reused for a node that wraps
  /// it. `id` is left holding [`Syntax::Empty`] until the caller overwrites it.
  pub fn detach(&mut self, id: NodeId) -> NodeId {
    let node = &mut self.nodes[id.index()];
    let loc = node.loc;
    let visited = node.visited;
    let stx = std::mem::replace(&mut node.stx, Syntax::Empty);
    let moved = self.alloc(loc, stx);
    self.nodes[moved.index()].visited = visited;
    moved
  }

  pub fn mark_visited(&mut self, id: NodeId) {
    self.nodes[id.index()].visited = true;
  }

  pub fn is_visited(&self, id: NodeId) -> bool {
    self.nodes[id.index()].visited
  }

  /// Direct children in source order.
  pub fn children(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let key = |out: &mut Vec<NodeId>, key: &PropKey| {
      if let PropKey::Computed(k) = key {
        out.push(*k);
      }
    };
    match self.stx(id) {
      Syntax::IdPat { annotation, .. } => out.extend(annotation),
      Syntax::ObjPat { props, annotation } => {
        out.extend(props);
        out.extend(annotation);
      }
      Syntax::ObjPatProp { key: k, target, .. } => {
        key(&mut out, k);
        out.push(*target);
      }
      Syntax::ArrPat {
        elements,
        annotation,
      } => {
        out.extend(elements.iter().flatten());
        out.extend(annotation);
      }
      Syntax::AssignPat { target, default } => out.extend([*target, *default]),
      Syntax::RestPat { target, annotation } => {
        out.push(*target);
        out.extend(annotation);
      }
      Syntax::Id { .. }
      | Syntax::This
      | Syntax::Super
      | Syntax::LitBool { .. }
      | Syntax::LitNull
      | Syntax::LitNum { .. }
      | Syntax::LitStr { .. }
      | Syntax::LitRegex { .. }
      | Syntax::Empty
      | Syntax::Debugger
      | Syntax::Break { .. }
      | Syntax::Continue { .. }
      | Syntax::Import { .. }
      | Syntax::ExportNamed { .. }
      | Syntax::ExportAll { .. }
      | Syntax::TypeKeyword { .. }
      | Syntax::TypeLitStr { .. }
      | Syntax::TypeLitNum { .. }
      | Syntax::TypeLitBool { .. } => {}
      Syntax::LitTemplate { exprs, .. } => out.extend(exprs),
      Syntax::TaggedTemplate { tag, template } => out.extend([*tag, *template]),
      Syntax::LitArr { elements } => out.extend(elements.iter().flatten()),
      Syntax::LitObj { members } => out.extend(members),
      Syntax::ObjProp { key: k, value, .. } => {
        key(&mut out, k);
        out.push(*value);
      }
      Syntax::ObjMethod { key: k, func, .. } => {
        key(&mut out, k);
        out.push(*func);
      }
      Syntax::Spread { arg } | Syntax::Unary { arg, .. } | Syntax::Postfix { arg, .. } => {
        out.push(*arg)
      }
      Syntax::Binary { left, right, .. } => out.extend([*left, *right]),
      Syntax::Assign { target, value, .. } => out.extend([*target, *value]),
      Syntax::Cond {
        test,
        consequent,
        alternate,
      } => out.extend([*test, *consequent, *alternate]),
      Syntax::Call { callee, args, .. } | Syntax::New { callee, args } => {
        out.push(*callee);
        out.extend(args);
      }
      Syntax::Member { object, .. } => out.push(*object),
      Syntax::ComputedMember {
        object, property, ..
      } => out.extend([*object, *property]),
      Syntax::Yield { arg, .. } => out.extend(arg),
      Syntax::TypeCast { expr, annotation } => out.extend([*expr, *annotation]),
      Syntax::Func {
        type_params,
        params,
        return_type,
        body,
        ..
      } => {
        out.extend(type_params);
        out.extend(params);
        out.extend(return_type);
        match body {
          FuncBody::Block(stmts) => out.extend(stmts),
          FuncBody::Expr(e) => out.push(*e),
        };
      }
      Syntax::Class {
        type_params,
        extends,
        super_type_args,
        implements,
        members,
        ..
      } => {
        out.extend(type_params);
        out.extend(extends);
        out.extend(super_type_args);
        out.extend(implements);
        out.extend(members);
      }
      Syntax::ClassMember {
        key: k,
        value,
        annotation,
        decorators,
        ..
      } => {
        out.extend(decorators);
        key(&mut out, k);
        out.extend(annotation);
        out.extend(value);
      }
      Syntax::Program { body } | Syntax::Block { body } => out.extend(body),
      Syntax::ExprStmt { expr } => out.push(*expr),
      Syntax::VarDecl { declarators, .. } => out.extend(declarators),
      Syntax::VarDeclarator { pattern, init } => {
        out.push(*pattern);
        out.extend(init);
      }
      Syntax::If {
        test,
        consequent,
        alternate,
      } => {
        out.extend([*test, *consequent]);
        out.extend(alternate);
      }
      Syntax::Return { value } => out.extend(value),
      Syntax::Throw { value } => out.push(*value),
      Syntax::Try {
        block,
        handler,
        finalizer,
      } => {
        out.push(*block);
        out.extend(handler);
        out.extend(finalizer);
      }
      Syntax::Catch { param, body } => {
        out.extend(param);
        out.extend(body);
      }
      Syntax::While { test, body } => out.extend([*test, *body]),
      Syntax::DoWhile { body, test } => out.extend([*body, *test]),
      Syntax::For {
        init,
        test,
        update,
        body,
      } => {
        out.extend(init);
        out.extend(test);
        out.extend(update);
        out.push(*body);
      }
      Syntax::ForIn { left, right, body } | Syntax::ForOf { left, right, body, .. } => {
        out.extend([*left, *right, *body])
      }
      Syntax::Switch {
        discriminant,
        cases,
      } => {
        out.push(*discriminant);
        out.extend(cases);
      }
      Syntax::SwitchCase { test, body } => {
        out.extend(test);
        out.extend(body);
      }
      Syntax::Labeled { body, .. } => out.push(*body),
      Syntax::ExportDecl { decl } => out.push(*decl),
      Syntax::ExportDefault { value } => out.push(*value),
      Syntax::TypeAlias {
        type_params, value, ..
      } => {
        out.extend(type_params);
        out.push(*value);
      }
      Syntax::Interface {
        type_params,
        extends,
        body,
        ..
      } => {
        out.extend(type_params);
        out.extend(extends);
        out.push(*body);
      }
      Syntax::TypeRef { args, .. } => out.extend(args),
      Syntax::TypeNullable { inner } => out.push(*inner),
      Syntax::TypeUnion { types } | Syntax::TypeIntersection { types } => out.extend(types),
      Syntax::TypeArray { elem } => out.push(*elem),
      Syntax::TypeTuple { elems } => out.extend(elems),
      Syntax::TypeObject { members, .. } => out.extend(members),
      Syntax::TypeObjectProp { value, .. } => out.push(*value),
      Syntax::TypeIndexer { key, value, .. } => out.extend([*key, *value]),
      Syntax::TypeSpread { arg } => out.push(*arg),
      Syntax::TypeFunc { params, rest, ret } => {
        out.extend(params);
        out.extend(rest);
        out.push(*ret);
      }
      Syntax::TypeFuncParam { value, .. } => out.push(*value),
      Syntax::TypeTypeof { arg } => out.push(*arg),
      Syntax::TypeParam { bound, default, .. } => {
        out.extend(bound);
        out.extend(default);
      }
    };
    out
  }

  /// Visits `id` and all of its descendants depth-first, parents before children.
  pub fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId, &Syntax)) {
    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
      f(next, self.stx(next));
      let mut children = self.children(next);
      children.reverse();
      stack.extend(children);
    }
  }
}

impl Index<NodeId> for Ast {
  type Output = Node;

  fn index(&self, index: NodeId) -> &Self::Output {
    &self.nodes[index.index()]
  }
}

impl IndexMut<NodeId> for Ast {
  fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
    &mut self.nodes[index.index()]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn replace_is_visible_through_parent() {
    let mut ast = Ast::new();
    let x = ast.alloc(Loc(0, 1), Syntax::Id { name: "x".into() });
    let stmt = ast.alloc(Loc(0, 2), Syntax::ExprStmt { expr: x });
    ast.replace(x, Syntax::LitNull);
    let Syntax::ExprStmt { expr } = ast.stx(stmt) else {
      panic!("expected expression statement");
    };
    assert!(matches!(ast.stx(*expr), Syntax::LitNull));
  }

  #[test]
  fn detach_keeps_content_reachable() {
    let mut ast = Ast::new();
    let x = ast.alloc(Loc(3, 4), Syntax::Id { name: "x".into() });
    let moved = ast.detach(x);
    assert!(matches!(ast.stx(x), Syntax::Empty));
    assert!(matches!(ast.stx(moved), Syntax::Id { name } if name == "x"));
    assert_eq!(ast.loc(moved), Loc(3, 4));
  }

  #[test]
  fn walk_is_preorder() {
    let mut ast = Ast::new();
    let a = ast.alloc(Loc(0, 1), Syntax::Id { name: "a".into() });
    let b = ast.alloc(Loc(4, 5), Syntax::Id { name: "b".into() });
    let bin = ast.alloc(Loc(0, 5), Syntax::Binary {
      op: OperatorName::Addition,
      left: a,
      right: b,
    });
    let mut seen = Vec::new();
    ast.walk(bin, &mut |id, _| seen.push(id));
    assert_eq!(seen, vec![bin, a, b]);
  }
}
