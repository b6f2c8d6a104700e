use super::Transformer;
use crate::ast::Ast;
use crate::ast::ClassMemberKind;
use crate::ast::FuncBody;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::error::TransformError;
use crate::error::TransformErrorType;
use crate::error::TransformResult;
use crate::type_expr::CompiledType;
use crate::type_params::type_parameters;
use crate::type_params::type_references;
use tracing::trace;

/// Index of the first expression statement of a constructor body that calls `super(...)`. Calls
/// inside nested functions, arrows included, or inside nested statements do not count: they may
/// run later or not at all.
pub(super) fn super_call_index(ast: &Ast, stmts: &[NodeId]) -> Option<usize> {
  stmts.iter().position(|stmt| match ast.stx(*stmt) {
    Syntax::ExprStmt { expr } => contains_super_call(ast, *expr),
    _ => false,
  })
}

fn contains_super_call(ast: &Ast, id: NodeId) -> bool {
  match ast.stx(id) {
    Syntax::Call { callee, .. } if matches!(ast.stx(*callee), Syntax::Super) => true,
    Syntax::Func { .. } | Syntax::Class { .. } => false,
    _ => ast
      .children(id)
      .into_iter()
      .any(|child| contains_super_call(ast, child)),
  }
}

fn constructor_of(ast: &Ast, members: &[NodeId]) -> Option<NodeId> {
  members.iter().find_map(|member| match ast.stx(*member) {
    Syntax::ClassMember {
      kind: ClassMemberKind::Constructor,
      value: Some(func),
      ..
    } => Some(*func),
    _ => None,
  })
}

impl<'a> Transformer<'a> {
  pub(super) fn visit_class(&mut self, id: NodeId) -> TransformResult<()> {
    let Syntax::Class {
      extends, members, ..
    } = self.ast.stx(id).clone()
    else {
      return Ok(());
    };
    self.visit_opt(extends)?;
    if extends.is_some() {
      if let Some(ctor) = constructor_of(self.ast, &members) {
        self.derived_constructors.insert(ctor);
      };
    };
    self.push_frame(Some(id));
    let res = self.visit_all(&members);
    self.pop_frame();
    res?;
    self.bind_class_type_parameters(id)
  }

  /// Makes the class's type parameters available at runtime on every instance, and binds the
  /// superclass's type parameters to the type arguments given in `extends`.
  fn bind_class_type_parameters(&mut self, id: NodeId) -> TransformResult<()> {
    let Syntax::Class {
      name,
      extends,
      super_type_args,
      members,
      ..
    } = self.ast.stx(id).clone()
    else {
      return Ok(());
    };
    let type_params = type_parameters(self.ast, id).to_vec();
    if type_params.is_empty() && super_type_args.is_empty() {
      return Ok(());
    };
    let loc = self.ast.loc(id);

    if extends.is_none() {
      let ctor = match constructor_of(self.ast, &members) {
        Some(ctor) => ctor,
        None => self.synthesize_constructor(id),
      };
      let stmts = self.type_parameter_map(id, &type_params, false);
      self.splice_into_body(ctor, 0, stmts);
      trace!(rule = "class", node = id.0, "stored type parameters");
      return Ok(());
    };

    let Some(ctor) = constructor_of(self.ast, &members) else {
      return Err(TransformError::new(
        TransformErrorType::MissingConstructor,
        loc,
        name,
      ));
    };
    let index = match self.ast.stx(ctor) {
      Syntax::Func {
        body: FuncBody::Block(stmts),
        ..
      } => super_call_index(self.ast, stmts),
      _ => None,
    };
    let Some(index) = index else {
      return Err(TransformError::new(
        TransformErrorType::MissingSuperCall,
        self.ast.loc(ctor),
        name,
      ));
    };
    let mut stmts = Vec::new();
    if !type_params.is_empty() {
      stmts.extend(self.type_parameter_map(id, &type_params, true));
    };
    if !super_type_args.is_empty() {
      let mut args = Vec::with_capacity(super_type_args.len() + 1);
      args.push(self.builder(id).this());
      for arg in &super_type_args {
        args.push(self.compile(*arg));
      }
      let call = self.lib_call(id, "bindTypeParameters", args);
      stmts.push(self.builder(id).expr_stmt(call));
    };
    self.splice_into_body(ctor, index + 1, stmts);
    trace!(rule = "class", node = id.0, "bound inherited type parameters");
    Ok(())
  }

  fn synthesize_constructor(&mut self, class: NodeId) -> NodeId {
    let member = self.builder(class).constructor();
    let func = match self.ast.stx(member) {
      Syntax::ClassMember { value: Some(func), .. } => *func,
      _ => member,
    };
    if let Syntax::Class { members, .. } = self.ast.stx_mut(class) {
      members.insert(0, member);
    };
    func
  }

  fn splice_into_body(&mut self, func: NodeId, at: usize, stmts: Vec<NodeId>) {
    if let Syntax::Func {
      body: FuncBody::Block(body),
      ..
    } = self.ast.stx_mut(func)
    {
      let at = at.min(body.len());
      body.splice(at..at, stmts);
    };
  }

  /// `this[t.TypeParametersSymbol]`.
  fn type_parameters_slot(&mut self, at: NodeId) -> NodeId {
    let library_id = self.library_id.clone();
    let mut b = self.builder(at);
    let this = b.this();
    let library = b.id(&library_id);
    let symbol = b.member(library, "TypeParametersSymbol");
    b.computed(this, symbol)
  }

  /// `const _typeParameters = { T: t.typeParameter("T") };` followed by storing it on the
  /// instance. With `inherited`, a map the superclass constructor already stored is extended
  /// instead.
  fn type_parameter_map(&mut self, class: NodeId, type_params: &[NodeId], inherited: bool) -> Vec<NodeId> {
    let uid = self.names.fresh("typeParameters");
    let props: Vec<(String, NodeId)> = type_params
      .iter()
      .filter_map(|param| self.type_parameter(*param))
      .collect();
    let mut b = self.builder(class);
    let map = b.obj(props);
    let decl = b.var_decl(VarDeclMode::Const, &uid, Some(map));

    let library_id = self.library_id.clone();
    let mut b = self.builder(class);
    let this = b.this();
    let library = b.id(&library_id);
    let symbol = b.member(library, "TypeParametersSymbol");
    let value = b.id(&uid);
    let descriptor = b.obj(vec![("value".to_string(), value)]);
    let define = b.named_call("Object", "defineProperty", vec![this, symbol, descriptor]);
    let define = b.expr_stmt(define);
    if !inherited {
      return vec![decl, define];
    };
    let test = self.type_parameters_slot(class);
    let existing = self.type_parameters_slot(class);
    let mut b = self.builder(class);
    let value = b.id(&uid);
    let merge = b.named_call("Object", "assign", vec![existing, value]);
    let merge = b.expr_stmt(merge);
    let merge = b.block(vec![merge]);
    let define = b.block(vec![define]);
    let store = b.if_stmt(test, merge, Some(define));
    vec![decl, store]
  }

  /// Attaches `@t.decorate(T)` to an annotated class property. The type is wrapped in a function
  /// when it refers to class type parameters or to values that are not initialised yet when the
  /// class is defined.
  pub(super) fn decorate_class_property(&mut self, id: NodeId) {
    let Syntax::ClassMember {
      kind: ClassMemberKind::Property,
      annotation: Some(annotation),
      ..
    } = self.ast.stx(id).clone()
    else {
      return;
    };
    let deferred = type_references(self.ast, annotation).iter().any(|r| {
      self
        .entities
        .get_entity(&r.name, r.node)
        .is_some_and(|e| e.is_class_type_parameter || (e.is_value && !e.is_global))
    });
    let compiled = self.compile(annotation);
    let compiled = if deferred {
      CompiledType::Deferred(compiled)
    } else {
      CompiledType::Eager(compiled)
    };
    let arg = compiled.into_expr(self.ast);
    let decorator = self.lib_call(id, "decorate", vec![arg]);
    if let Syntax::ClassMember {
      annotation,
      decorators,
      ..
    } = self.ast.stx_mut(id)
    {
      *annotation = None;
      decorators.push(decorator);
    };
    trace!(rule = "property", node = id.0, deferred, "decorated class property");
  }
}
