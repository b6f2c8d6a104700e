use super::class::super_call_index;
use super::scope::FunctionState;
use super::Transformer;
use crate::ast::FuncBody;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::error::TransformResult;
use crate::operator::OperatorName;
use tracing::trace;

/// Statements prepended to a function body: bindings first, then the checks that use them.
#[derive(Default)]
struct Header {
  definitions: Vec<NodeId>,
  invocations: Vec<NodeId>,
}

impl Header {
  fn into_stmts(self) -> Vec<NodeId> {
    let mut stmts = self.definitions;
    stmts.extend(self.invocations);
    stmts
  }

  fn is_empty(&self) -> bool {
    self.definitions.is_empty() && self.invocations.is_empty()
  }
}

impl<'a> Transformer<'a> {
  pub(super) fn visit_func(&mut self, id: NodeId) -> TransformResult<()> {
    self.push_frame(Some(id));
    let res = self.rewrite_func(id);
    self.pop_frame();
    res
  }

  fn rewrite_func(&mut self, id: NodeId) -> TransformResult<()> {
    let Syntax::Func {
      arrow,
      is_async,
      generator,
      type_params,
      mut params,
      return_type,
      body,
      ..
    } = self.ast.stx(id).clone()
    else {
      return Ok(());
    };
    // Default values are evaluated before the header runs.
    self.stmt_stack.push(id);
    let res = self.visit_all(&params);
    self.stmt_stack.pop();
    res?;

    let mut header = Header::default();
    for param in &type_params {
      if let Some((name, value)) = self.type_parameter(*param) {
        let decl = self.builder(*param).var_decl(VarDeclMode::Const, &name, Some(value));
        header.definitions.push(decl);
      };
    }
    for (i, param) in params.iter_mut().enumerate() {
      if let Some(replacement) = self.check_param(arrow, i, *param, &mut header) {
        *param = replacement;
      };
    }
    let state = self.return_bindings(is_async, generator, return_type, &mut header);
    if !header.is_empty() {
      trace!(rule = "function", node = id.0, checks = header.invocations.len(), "built function header");
    };

    self.functions.push(state);
    let res = self.rewrite_func_body(id, body, header);
    self.functions.pop();
    let body = res?;

    if let Syntax::Func {
      type_params,
      params: slot,
      return_type,
      body: body_slot,
      ..
    } = self.ast.stx_mut(id)
    {
      type_params.clear();
      *slot = params;
      *return_type = None;
      *body_slot = body;
    };
    Ok(())
  }

  /// `t.typeParameter("T", bound?, default?)` for a declared type parameter.
  pub(super) fn type_parameter(&mut self, param: NodeId) -> Option<(String, NodeId)> {
    let Syntax::TypeParam {
      name,
      bound,
      default,
    } = self.ast.stx(param).clone()
    else {
      return None;
    };
    let bound = bound.map(|b| self.compile(b));
    let default = default.map(|d| self.compile(d));
    let mut b = self.builder(param);
    let mut args = vec![b.str(&name)];
    match (bound, default) {
      (bound, Some(default)) => {
        let bound = bound.unwrap_or_else(|| b.id("undefined"));
        args.extend([bound, default]);
      }
      (Some(bound), None) => args.push(bound),
      (None, None) => {}
    };
    let value = self.lib_call(param, "typeParameter", args);
    Some((name, value))
  }

  /// Adds the checks for one parameter to `header`. Returns the node that must replace the
  /// parameter in the parameter list, if it is shadowed.
  fn check_param(&mut self, arrow: bool, index: usize, param: NodeId, header: &mut Header) -> Option<NodeId> {
    match self.ast.stx(param).clone() {
      Syntax::IdPat {
        name,
        annotation: Some(annotation),
        optional,
      } => {
        self.check_named_param(param, &name, annotation, optional, "param", header);
        None
      }
      Syntax::RestPat { target, annotation } => {
        let Syntax::IdPat {
          name,
          annotation: inner,
          ..
        } = self.ast.stx(target).clone()
        else {
          return None;
        };
        let annotation = annotation.or(inner)?;
        self.erase_annotation(param);
        self.check_named_param(target, &name, annotation, false, "rest", header);
        None
      }
      Syntax::AssignPat { target, .. } => match self.ast.stx(target).clone() {
        Syntax::IdPat {
          name,
          annotation: Some(annotation),
          ..
        } => {
          self.check_named_param(target, &name, annotation, false, "param", header);
          None
        }
        Syntax::ObjPat {
          annotation: Some(annotation),
          ..
        }
        | Syntax::ArrPat {
          annotation: Some(annotation),
          ..
        } => {
          let shadow = self.check_destructured_param(arrow, index, target, annotation, true, header)?;
          if let Syntax::AssignPat { target, .. } = self.ast.stx_mut(param) {
            *target = shadow;
          };
          None
        }
        _ => None,
      },
      Syntax::ObjPat {
        annotation: Some(annotation),
        ..
      }
      | Syntax::ArrPat {
        annotation: Some(annotation),
        ..
      } => self.check_destructured_param(arrow, index, param, annotation, false, header),
      _ => None,
    }
  }

  fn erase_annotation(&mut self, pat: NodeId) {
    if let Some(slot) = self.ast.stx_mut(pat).annotation_mut() {
      *slot = None;
    };
  }

  /// `let _xType = T;` and `t.param("x", _xType).assert(x);`.
  fn check_named_param(
    &mut self,
    pat: NodeId,
    name: &str,
    annotation: NodeId,
    optional: bool,
    wrapper: &str,
    header: &mut Header,
  ) {
    self.erase_annotation(pat);
    let uid = self.names.fresh(&format!("{}Type", name));
    self.register_binding(name, pat, &uid);
    let compiled = self.compile(annotation);
    let mut b = self.builder(pat);
    let definition = b.var_decl(VarDeclMode::Let, &uid, Some(compiled));
    let label = b.str(name);
    let binding = b.id(&uid);
    let mut args = vec![label, binding];
    if optional {
      args.push(b.bool(true));
    };
    let wrapped = self.lib_call(pat, wrapper, args);
    let mut b = self.builder(pat);
    let subject = b.id(name);
    let check = b.method_call(wrapped, "assert", vec![subject]);
    let invocation = b.expr_stmt(check);
    header.definitions.push(definition);
    header.invocations.push(invocation);
  }

  /// Checks a destructured parameter before it is destructured. Ordinary functions read it from
  /// `arguments[i]`. Arrow functions have no `arguments`, so the parameter is shadowed by a
  /// positional identifier and destructured in the body; the identifier is returned.
  fn check_destructured_param(
    &mut self,
    arrow: bool,
    index: usize,
    pattern: NodeId,
    annotation: NodeId,
    has_default: bool,
    header: &mut Header,
  ) -> Option<NodeId> {
    self.erase_annotation(pattern);
    let compiled = self.compile(annotation);
    if arrow {
      let shadow = self.names.fresh(&format!("arg{}", index));
      let mut b = self.builder(pattern);
      let label = b.str(&shadow);
      let wrapped = self.lib_call(pattern, "param", vec![label, compiled]);
      let mut b = self.builder(pattern);
      let subject = b.id(&shadow);
      let check = b.method_call(wrapped, "assert", vec![subject]);
      let invocation = b.expr_stmt(check);
      let source = b.id(&shadow);
      let declarator = b.node(Syntax::VarDeclarator {
        pattern,
        init: Some(source),
      });
      let destructure = b.node(Syntax::VarDecl {
        mode: VarDeclMode::Let,
        declarators: vec![declarator],
      });
      let param = b.id_pat(&shadow);
      header.invocations.extend([invocation, destructure]);
      return Some(param);
    };
    let label = format!("arguments[{}]", index);
    let mut b = self.builder(pattern);
    let label = b.str(&label);
    let wrapped = self.lib_call(pattern, "param", vec![label, compiled]);
    let subject = self.arguments_at(pattern, index);
    let mut b = self.builder(pattern);
    let check = b.method_call(wrapped, "assert", vec![subject]);
    let mut invocation = b.expr_stmt(check);
    if has_default {
      // Skipped when the default applies.
      let passed = self.arguments_at(pattern, index);
      let mut b = self.builder(pattern);
      let undefined = b.id("undefined");
      let test = b.binary(OperatorName::StrictInequality, passed, undefined);
      invocation = b.if_stmt(test, invocation, None);
    };
    header.invocations.push(invocation);
    None
  }

  /// `arguments[i]`.
  fn arguments_at(&mut self, at: NodeId, index: usize) -> NodeId {
    let mut b = self.builder(at);
    let arguments = b.id("arguments");
    let index = b.num(&index.to_string());
    b.computed(arguments, index)
  }

  /// Declares the return, yield and next bindings the declared return type calls for.
  fn return_bindings(
    &mut self,
    is_async: bool,
    generator: bool,
    return_type: Option<NodeId>,
    header: &mut Header,
  ) -> FunctionState {
    let mut state = FunctionState::default();
    let Some(return_type) = return_type else {
      return state;
    };
    let (name, args) = match self.ast.stx(return_type) {
      Syntax::TypeRef { name, args } => (name.clone(), args.clone()),
      _ => (Vec::new(), Vec::new()),
    };
    if generator {
      // `Generator<Y, R, N>` checks all three; `Iterator<Y>` and friends only check yields.
      match args.as_slice() {
        [yielded, returned, next] => {
          state.yield_uid = Some(self.type_binding("yieldType", *yielded, header));
          state.next_uid = Some(self.type_binding("nextType", *next, header));
          state.return_uid = Some(self.return_binding(*returned, header));
        }
        [yielded] => {
          state.yield_uid = Some(self.type_binding("yieldType", *yielded, header));
        }
        _ => {}
      };
      return state;
    };
    let effective = match args.first() {
      // An async function returns the value its promise resolves to.
      Some(resolved) if is_async && name.len() == 1 && name[0] == "Promise" => *resolved,
      _ => return_type,
    };
    state.return_uid = Some(self.return_binding(effective, header));
    state
  }

  /// `const _base = T;`.
  fn type_binding(&mut self, base: &str, annotation: NodeId, header: &mut Header) -> String {
    let uid = self.names.fresh(base);
    let compiled = self.compile(annotation);
    let decl = self
      .builder(annotation)
      .var_decl(VarDeclMode::Const, &uid, Some(compiled));
    header.definitions.push(decl);
    uid
  }

  /// `const _returnType = t.return(T);`.
  fn return_binding(&mut self, annotation: NodeId, header: &mut Header) -> String {
    let uid = self.names.fresh("returnType");
    let compiled = self.compile(annotation);
    let value = self.lib_call(annotation, "return", vec![compiled]);
    let decl = self
      .builder(annotation)
      .var_decl(VarDeclMode::Const, &uid, Some(value));
    header.definitions.push(decl);
    uid
  }

  fn rewrite_func_body(&mut self, id: NodeId, body: FuncBody, header: Header) -> TransformResult<FuncBody> {
    let stmts = match body {
      FuncBody::Block(stmts) => self.visit_stmt_list(stmts)?,
      FuncBody::Expr(expr) if header.is_empty() => {
        // The expression acts as the statement that casts inside it are checked before.
        self.stmt_stack.push(expr);
        let res = self.visit(expr);
        self.stmt_stack.pop();
        res?;
        let Some(mut before) = self.pending_before.remove(&expr) else {
          return Ok(FuncBody::Expr(expr));
        };
        let ret = self.builder(expr).ret(Some(expr));
        before.push(ret);
        return Ok(FuncBody::Block(before));
      }
      FuncBody::Expr(expr) => {
        let ret = self.builder(expr).ret(Some(expr));
        self.visit_stmt_list(vec![ret])?
      }
    };
    let mut stmts = stmts;
    // In a subclass constructor `this` is only usable once `super()` has returned.
    let at = if self.derived_constructors.contains(&id) {
      super_call_index(self.ast, &stmts).map_or(0, |i| i + 1)
    } else {
      0
    };
    stmts.splice(at..at, header.into_stmts());
    Ok(FuncBody::Block(stmts))
  }

  pub(super) fn rewrite_return(&mut self, id: NodeId) {
    let Some(uid) = self.function_state().and_then(|s| s.return_uid.clone()) else {
      return;
    };
    let Syntax::Return { value } = self.ast.stx(id).clone() else {
      return;
    };
    let call = self.assert_call(id, &uid, value.into_iter().collect());
    if let Syntax::Return { value } = self.ast.stx_mut(id) {
      *value = Some(call);
    };
    self.ast.mark_visited(id);
    trace!(rule = "return", node = id.0, binding = %uid, "asserted return value");
  }

  pub(super) fn rewrite_yield(&mut self, id: NodeId) {
    let Some(state) = self.function_state().cloned() else {
      return;
    };
    let Some(yield_uid) = state.yield_uid else {
      return;
    };
    let Syntax::Yield { arg, delegate } = self.ast.stx(id).clone() else {
      return;
    };
    let checked = match (delegate, arg) {
      // Every value produced through the delegate is checked: `yield* t.wrapIterator(T)(source)`.
      (true, Some(source)) => {
        let binding = self.builder(id).id(&yield_uid);
        let wrapper = self.lib_call(id, "wrapIterator", vec![binding]);
        let call = self.builder(id).call(wrapper, vec![source]);
        self.ast.mark_visited(call);
        call
      }
      (true, None) => return,
      (false, arg) => self.assert_call(id, &yield_uid, arg.into_iter().collect()),
    };
    if let Syntax::Yield { arg, .. } = self.ast.stx_mut(id) {
      *arg = Some(checked);
    };
    self.ast.mark_visited(id);
    trace!(rule = "yield", node = id.0, binding = %yield_uid, "asserted yielded value");

    let Some(next_uid) = state.next_uid else {
      return;
    };
    if delegate || self.stmt_exprs.contains(&id) {
      return;
    };
    // The value sent back in by `next(value)` is used, so it is checked too.
    let moved = self.ast.detach(id);
    let call = self.assert_call(id, &next_uid, vec![moved]);
    self.replace_with(id, call);
    trace!(rule = "yield", node = id.0, binding = %next_uid, "asserted resumed value");
  }
}
