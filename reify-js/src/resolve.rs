//! Entity resolution pre-pass.
//!
//! Builds a scope tree over the arena and records, for every declared name, what kind of
//! entity it is. The rewriter and the runtime type builder query it to tell type-level
//! bindings from values, class type parameters from function type parameters, and local
//! bindings from ones that are safe to reference eagerly.

use crate::ast::Ast;
use crate::ast::FuncBody;
use crate::ast::ImportKind;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use ahash::HashMap;
use ahash::HashMapExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
  pub fn raw(self) -> u32 {
    self.0
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
  Program,
  Function,
  Class,
  Block,
  Catch,
  For,
  /// Holds the type parameters of a type alias or interface.
  TypeDecl,
}

impl ScopeKind {
  fn is_var_scope(self) -> bool {
    matches!(self, ScopeKind::Program | ScopeKind::Function)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Var,
  Let,
  Const,
  Function,
  Class,
  Param,
  CatchParam,
  Import,
  TypeImport,
  TypeAlias,
  Interface,
  TypeParameter,
  ClassTypeParameter,
}

impl EntityKind {
  pub fn is_value(self) -> bool {
    !matches!(
      self,
      EntityKind::TypeImport
        | EntityKind::TypeAlias
        | EntityKind::Interface
        | EntityKind::TypeParameter
        | EntityKind::ClassTypeParameter
    )
  }

  /// Whether the binding is usable in type positions.
  pub fn is_type(self) -> bool {
    !matches!(
      self,
      EntityKind::Var
        | EntityKind::Let
        | EntityKind::Const
        | EntityKind::Function
        | EntityKind::Param
        | EntityKind::CatchParam
    )
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entity {
  pub kind: EntityKind,
  pub scope: ScopeId,
  pub is_value: bool,
  /// Declared at the top level and initialised before any other code of the module runs:
  /// imports and hoisted function declarations.
  pub is_global: bool,
  pub is_class_type_parameter: bool,
}

#[derive(Debug, Clone)]
pub struct ScopeData {
  pub parent: Option<ScopeId>,
  pub kind: ScopeKind,
  pub owner: NodeId,
  pub values: HashMap<String, EntityKind>,
  pub types: HashMap<String, EntityKind>,
}

#[derive(Clone, Copy, Debug)]
struct NodeInfo {
  scope: ScopeId,
  in_type: bool,
}

#[derive(Debug, Clone)]
pub struct Entities {
  scopes: Vec<ScopeData>,
  nodes: Vec<Option<NodeInfo>>,
  owners: HashMap<NodeId, ScopeId>,
}

impl Entities {
  pub fn program_scope(&self) -> ScopeId {
    ScopeId(0)
  }

  pub fn scope(&self, id: ScopeId) -> &ScopeData {
    &self.scopes[id.0 as usize]
  }

  /// The scope introduced by `owner`, if it introduces one.
  pub fn scope_of_owner(&self, owner: NodeId) -> Option<ScopeId> {
    self.owners.get(&owner).copied()
  }

  /// Looks `name` up from the scope of `node` outwards. Type positions prefer type-level
  /// entities, value positions prefer values.
  pub fn get_entity(&self, name: &str, node: NodeId) -> Option<Entity> {
    let info = self.nodes.get(node.index()).copied().flatten();
    let mut scope = info.map(|i| i.scope).unwrap_or(self.program_scope());
    let prefer_type = info.is_some_and(|i| i.in_type);
    loop {
      let data = self.scope(scope);
      let found = if prefer_type {
        data.types.get(name).or_else(|| data.values.get(name))
      } else {
        data.values.get(name).or_else(|| data.types.get(name))
      };
      if let Some(kind) = found {
        let kind = *kind;
        return Some(Entity {
          kind,
          scope,
          is_value: kind.is_value(),
          is_global: data.kind == ScopeKind::Program
            && matches!(kind, EntityKind::Import | EntityKind::Function),
          is_class_type_parameter: kind == EntityKind::ClassTypeParameter,
        });
      };
      scope = data.parent?;
    }
  }
}

/// Collects the names bound by a pattern.
pub fn bound_names(ast: &Ast, pat: NodeId, out: &mut Vec<String>) {
  match ast.stx(pat) {
    Syntax::IdPat { name, .. } => out.push(name.clone()),
    Syntax::ObjPat { props, .. } => {
      for prop in props {
        bound_names(ast, *prop, out);
      }
    }
    Syntax::ObjPatProp { target, .. }
    | Syntax::AssignPat { target, .. }
    | Syntax::RestPat { target, .. } => bound_names(ast, *target, out),
    Syntax::ArrPat { elements, .. } => {
      for element in elements.iter().flatten() {
        bound_names(ast, *element, out);
      }
    }
    _ => {}
  }
}

struct Resolver<'a> {
  ast: &'a Ast,
  entities: Entities,
}

impl<'a> Resolver<'a> {
  fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind, owner: NodeId) -> ScopeId {
    let id = ScopeId(self.entities.scopes.len() as u32);
    self.entities.scopes.push(ScopeData {
      parent,
      kind,
      owner,
      values: HashMap::new(),
      types: HashMap::new(),
    });
    self.entities.owners.insert(owner, id);
    id
  }

  fn declare(&mut self, scope: ScopeId, name: &str, kind: EntityKind) {
    let data = &mut self.entities.scopes[scope.0 as usize];
    if kind.is_value() {
      data.values.insert(name.to_string(), kind);
    };
    if kind.is_type() {
      data.types.insert(name.to_string(), kind);
    };
  }

  fn var_scope(&self, mut scope: ScopeId) -> ScopeId {
    loop {
      let data = self.entities.scope(scope);
      match data.parent {
        Some(parent) if !data.kind.is_var_scope() => scope = parent,
        _ => return scope,
      }
    }
  }

  fn declare_pattern(&mut self, scope: ScopeId, pat: NodeId, kind: EntityKind) {
    let mut names = Vec::new();
    bound_names(self.ast, pat, &mut names);
    for name in names {
      self.declare(scope, &name, kind);
    }
  }

  fn declare_type_params(&mut self, scope: ScopeId, params: &[NodeId], kind: EntityKind) {
    for param in params {
      if let Syntax::TypeParam { name, .. } = self.ast.stx(*param) {
        self.declare(scope, name, kind);
      };
    }
  }

  fn visit_all(&mut self, ids: &[NodeId], scope: ScopeId, in_type: bool) {
    for id in ids {
      self.visit(*id, scope, in_type);
    }
  }

  fn visit(&mut self, id: NodeId, scope: ScopeId, in_type: bool) {
    let ast = self.ast;
    let stx = ast.stx(id);
    let in_type = in_type || stx.is_type();
    self.entities.nodes[id.index()] = Some(NodeInfo { scope, in_type });
    match stx {
      Syntax::Func {
        name,
        is_decl,
        arrow,
        type_params,
        params,
        return_type,
        body,
        ..
      } => {
        if let (Some(name), true) = (name, *is_decl) {
          let target = self.var_scope(scope);
          self.declare(target, name, EntityKind::Function);
        };
        let inner = self.new_scope(Some(scope), ScopeKind::Function, id);
        if let (Some(name), false, false) = (name, *is_decl, *arrow) {
          self.declare(inner, name, EntityKind::Function);
        };
        self.declare_type_params(inner, type_params, EntityKind::TypeParameter);
        for param in params {
          self.declare_pattern(inner, *param, EntityKind::Param);
        }
        self.visit_all(type_params, inner, true);
        self.visit_all(params, inner, false);
        if let Some(ret) = return_type {
          self.visit(*ret, inner, true);
        };
        match body {
          FuncBody::Block(stmts) => self.visit_all(stmts, inner, false),
          FuncBody::Expr(e) => self.visit(*e, inner, false),
        };
      }
      Syntax::Class {
        name,
        is_decl,
        type_params,
        extends,
        super_type_args,
        implements,
        members,
      } => {
        if let (Some(name), true) = (name, *is_decl) {
          self.declare(scope, name, EntityKind::Class);
        };
        if let Some(extends) = extends {
          self.visit(*extends, scope, false);
        };
        let inner = self.new_scope(Some(scope), ScopeKind::Class, id);
        if let (Some(name), false) = (name, *is_decl) {
          self.declare(inner, name, EntityKind::Class);
        };
        self.declare_type_params(inner, type_params, EntityKind::ClassTypeParameter);
        self.visit_all(type_params, inner, true);
        self.visit_all(super_type_args, inner, true);
        self.visit_all(implements, inner, true);
        self.visit_all(members, inner, false);
      }
      Syntax::Block { body } => {
        let inner = self.new_scope(Some(scope), ScopeKind::Block, id);
        self.visit_all(body, inner, false);
      }
      Syntax::Switch {
        discriminant,
        cases,
      } => {
        self.visit(*discriminant, scope, false);
        let inner = self.new_scope(Some(scope), ScopeKind::Block, id);
        self.visit_all(cases, inner, false);
      }
      Syntax::Catch { param, body } => {
        let inner = self.new_scope(Some(scope), ScopeKind::Catch, id);
        if let Some(param) = param {
          self.declare_pattern(inner, *param, EntityKind::CatchParam);
          self.visit(*param, inner, false);
        };
        self.visit_all(body, inner, false);
      }
      Syntax::For { .. } | Syntax::ForIn { .. } | Syntax::ForOf { .. } => {
        let inner = self.new_scope(Some(scope), ScopeKind::For, id);
        for child in ast.children(id) {
          self.visit(child, inner, false);
        }
      }
      Syntax::VarDecl { mode, declarators } => {
        let (target, kind) = match mode {
          VarDeclMode::Var => (self.var_scope(scope), EntityKind::Var),
          VarDeclMode::Let => (scope, EntityKind::Let),
          VarDeclMode::Const => (scope, EntityKind::Const),
        };
        for declarator in declarators {
          if let Syntax::VarDeclarator { pattern, .. } = ast.stx(*declarator) {
            self.declare_pattern(target, *pattern, kind);
          };
        }
        self.visit_all(declarators, scope, false);
      }
      Syntax::Import {
        kind,
        default,
        namespace,
        names,
        ..
      } => {
        let decl_kind = match kind {
          ImportKind::Value => EntityKind::Import,
          ImportKind::Type => EntityKind::TypeImport,
        };
        for local in default.iter().chain(namespace.iter()) {
          self.declare(scope, local, decl_kind);
        }
        for name in names {
          let kind = if *kind == ImportKind::Type || name.kind == ImportKind::Type {
            EntityKind::TypeImport
          } else {
            EntityKind::Import
          };
          self.declare(scope, &name.local, kind);
        }
      }
      Syntax::TypeAlias {
        name, type_params, ..
      }
      | Syntax::Interface {
        name, type_params, ..
      } => {
        let kind = if matches!(stx, Syntax::TypeAlias { .. }) {
          EntityKind::TypeAlias
        } else {
          EntityKind::Interface
        };
        self.declare(scope, name, kind);
        let inner = self.new_scope(Some(scope), ScopeKind::TypeDecl, id);
        self.declare_type_params(inner, type_params, EntityKind::TypeParameter);
        for child in ast.children(id) {
          self.visit(child, inner, true);
        }
      }
      _ => {
        for child in ast.children(id) {
          self.visit(child, scope, in_type);
        }
      }
    };
  }
}

/// Resolves every declaration reachable from the root of `ast`.
pub fn resolve(ast: &Ast) -> Entities {
  let mut resolver = Resolver {
    ast,
    entities: Entities {
      scopes: Vec::new(),
      nodes: vec![None; ast.len()],
      owners: HashMap::new(),
    },
  };
  let root = ast.root();
  let program = resolver.new_scope(None, ScopeKind::Program, root);
  resolver.entities.nodes[root.index()] = Some(NodeInfo {
    scope: program,
    in_type: false,
  });
  let body = match ast.stx(root) {
    Syntax::Program { body } => body.clone(),
    _ => Vec::new(),
  };
  resolver.visit_all(&body, program, false);
  resolver.entities
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  fn find_id(ast: &Ast, wanted: &str) -> NodeId {
    let mut found = None;
    ast.walk(ast.root(), &mut |id, stx| {
      if let Syntax::Id { name } = stx {
        if name == wanted && found.is_none() {
          found = Some(id);
        };
      };
    });
    found.unwrap()
  }

  fn find_type_ref(ast: &Ast, wanted: &str) -> NodeId {
    let mut found = None;
    ast.walk(ast.root(), &mut |id, stx| {
      if let Syntax::TypeRef { name, .. } = stx {
        if name[0] == wanted && found.is_none() {
          found = Some(id);
        };
      };
    });
    found.unwrap()
  }

  #[test]
  fn classifies_declarations() {
    let ast = parse(
      "import type { T } from 'm';\nimport V from 'v';\ntype A = T;\nfunction f<U>(x: U): A { return x; }\nclass C<K> { k: K; }",
    )
    .unwrap();
    let entities = resolve(&ast);
    let t = find_type_ref(&ast, "T");
    assert_eq!(entities.get_entity("T", t).unwrap().kind, EntityKind::TypeImport);
    assert!(!entities.get_entity("T", t).unwrap().is_value);
    assert!(entities.get_entity("V", t).unwrap().is_global);
    let u = find_type_ref(&ast, "U");
    assert_eq!(entities.get_entity("U", u).unwrap().kind, EntityKind::TypeParameter);
    let k = find_type_ref(&ast, "K");
    assert!(entities.get_entity("K", k).unwrap().is_class_type_parameter);
    let x = find_id(&ast, "x");
    assert_eq!(entities.get_entity("x", x).unwrap().kind, EntityKind::Param);
    assert!(entities.get_entity("nope", x).is_none());
  }

  #[test]
  fn catch_params_and_block_scopes() {
    let ast = parse("try {} catch (e) { e; }\n{ let e = 1; e; }").unwrap();
    let entities = resolve(&ast);
    let first = find_id(&ast, "e");
    let entity = entities.get_entity("e", first).unwrap();
    assert_eq!(entity.kind, EntityKind::CatchParam);
    assert!(!entity.is_global);
  }

  #[test]
  fn var_hoists_to_function_scope() {
    let ast = parse("function f() { { var v = 1; } v; }").unwrap();
    let entities = resolve(&ast);
    let v = find_id(&ast, "v");
    let entity = entities.get_entity("v", v).unwrap();
    assert_eq!(entity.kind, EntityKind::Var);
    assert_eq!(entities.scope(entity.scope).kind, ScopeKind::Function);
  }
}
