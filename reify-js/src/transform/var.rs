use super::Transformer;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::VarDeclMode;
use crate::error::TransformResult;
use crate::operator::OperatorName;
use crate::resolve::EntityKind;
use tracing::trace;

impl<'a> Transformer<'a> {
  /// Visits a declaration and, when `check` is set, rewrites its annotated declarators. Loop heads
  /// of `for-in` and `for-of` pass `false`: the loop assigns those variables itself.
  pub(super) fn visit_var_decl(&mut self, id: NodeId, check: bool) -> TransformResult<()> {
    let Syntax::VarDecl { mode, declarators } = self.ast.stx(id).clone() else {
      return Ok(());
    };
    let mut out = Vec::with_capacity(declarators.len());
    for declarator in declarators {
      self.visit(declarator)?;
      if check {
        out.extend(self.rewrite_declarator(mode, declarator));
      };
      out.push(declarator);
    }
    if let Syntax::VarDecl { declarators, .. } = self.ast.stx_mut(id) {
      *declarators = out;
    };
    Ok(())
  }

  /// Returns the binding declarator to place before `declarator`, if one is needed.
  fn rewrite_declarator(&mut self, mode: VarDeclMode, declarator: NodeId) -> Option<NodeId> {
    let Syntax::VarDeclarator { pattern, init } = self.ast.stx(declarator).clone() else {
      return None;
    };
    let annotation = self.ast.stx(pattern).annotation()?;
    if let Some(slot) = self.ast.stx_mut(pattern).annotation_mut() {
      *slot = None;
    };
    let name = match self.ast.stx(pattern) {
      Syntax::IdPat { name, .. } => Some(name.clone()),
      _ => None,
    };
    match (name, init) {
      (Some(name), init) if mode != VarDeclMode::Const || init.is_none() => {
        let compiled = self.compile(annotation);
        // A redeclared name keeps its binding, which may be a `let` that cannot be redeclared.
        let (uid, binding) = match self.lookup_binding(&name, pattern) {
          Some(uid) => {
            let mut b = self.builder(declarator);
            let target = b.id(&uid);
            let assign = b.assign(target, compiled);
            let stmt = b.expr_stmt(assign);
            self.ast.mark_visited(stmt);
            self.insert_before_current(stmt);
            (uid, None)
          }
          None => {
            let uid = self.names.fresh(&format!("{}Type", name));
            self.register_binding(&name, pattern, &uid);
            let binding = self.builder(declarator).declarator(&uid, Some(compiled));
            (uid, Some(binding))
          }
        };
        if let Some(init) = init {
          let call = self.assert_call(init, &uid, vec![init]);
          self.set_init(declarator, call);
        };
        trace!(rule = "declarator", node = declarator.0, binding = %uid, "bound declared type");
        binding
      }
      // Constants and destructured declarations are checked once, without a binding.
      (_, Some(init)) => {
        let compiled = self.compile(annotation);
        let call = self.builder(init).method_call(compiled, "assert", vec![init]);
        self.ast.mark_visited(call);
        self.set_init(declarator, call);
        trace!(rule = "declarator", node = declarator.0, "asserted initializer");
        None
      }
      (_, None) => None,
    }
  }

  fn set_init(&mut self, declarator: NodeId, value: NodeId) {
    if let Syntax::VarDeclarator { init, .. } = self.ast.stx_mut(declarator) {
      *init = Some(value);
    };
  }

  /// `x = value` where `x` has a type binding becomes `x = _xType.assert(value)`.
  pub(super) fn rewrite_assign(&mut self, id: NodeId) {
    let Syntax::Assign {
      op: OperatorName::Assignment,
      target,
      value,
    } = self.ast.stx(id).clone()
    else {
      return;
    };
    let Syntax::Id { name } = self.ast.stx(target) else {
      return;
    };
    let name = name.clone();
    let Some(uid) = self.lookup_binding(&name, target) else {
      return;
    };
    let call = self.assert_call(value, &uid, vec![value]);
    if let Syntax::Assign { value, .. } = self.ast.stx_mut(id) {
      *value = call;
    };
    trace!(rule = "assign", node = id.0, binding = %uid, "asserted assigned value");
  }

  pub(super) fn rewrite_cast(&mut self, id: NodeId) {
    let Syntax::TypeCast { expr, annotation } = self.ast.stx(id).clone() else {
      return;
    };
    if !self.options.assert_casts {
      let inner = self.ast.replace(expr, Syntax::Empty);
      self.ast.replace(id, inner);
      return;
    };
    let name = match self.ast.stx(expr) {
      // Parameter defaults have no statement to bind before, so they assert without a binding.
      Syntax::Id { name } if !self.in_parameters() => name.clone(),
      _ => {
        let compiled = self.compile(annotation);
        let call = self.builder(id).method_call(compiled, "assert", vec![expr]);
        self.ast.mark_visited(call);
        self.replace_with(id, call);
        trace!(rule = "cast", node = id.0, "asserted expression");
        return;
      }
    };
    let is_caught = self
      .entities
      .get_entity(&name, expr)
      .is_some_and(|e| e.kind == EntityKind::CatchParam);
    if is_caught {
      self.rewrite_caught_cast(id, expr, annotation, &name);
      return;
    };
    let compiled = self.compile(annotation);
    let stmt = match self.lookup_binding(&name, expr) {
      Some(uid) => {
        let mut b = self.builder(id);
        let target = b.id(&uid);
        let assign = b.assign(target, compiled);
        let stmt = b.expr_stmt(assign);
        self.ast.mark_visited(stmt);
        (uid, stmt)
      }
      None => {
        let uid = self.names.fresh(&format!("{}Type", name));
        self.register_local_binding(&name, &uid);
        let stmt = self
          .builder(id)
          .var_decl(VarDeclMode::Let, &uid, Some(compiled));
        (uid, stmt)
      }
    };
    let (uid, stmt) = stmt;
    self.insert_before_current(stmt);
    let call = self.assert_call(id, &uid, vec![expr]);
    self.replace_with(id, call);
    trace!(rule = "cast", node = id.0, binding = %uid, "asserted identifier");
  }

  /// A cast of a caught error is a guard: `if (!T.match(e)) throw e;`.
  fn rewrite_caught_cast(&mut self, id: NodeId, expr: NodeId, annotation: NodeId, name: &str) {
    let compiled = self.compile(annotation);
    let mut b = self.builder(id);
    let subject = b.id(name);
    let matched = b.method_call(compiled, "match", vec![subject]);
    let test = b.unary(OperatorName::LogicalNot, matched);
    let rethrown = b.id(name);
    let throw = b.throw(rethrown);
    let guard = b.if_stmt(test, throw, None);
    self.ast.mark_visited(guard);
    let whole_stmt = self
      .stmt_stack
      .last()
      .copied()
      .filter(|stmt| matches!(self.ast.stx(*stmt), Syntax::ExprStmt { expr } if *expr == id));
    match whole_stmt {
      Some(stmt) => self.replace_with(stmt, guard),
      None => {
        // The cast is part of a larger statement: guard first, then evaluate it uncast.
        self.insert_before_current(guard);
        let inner = self.ast.replace(expr, Syntax::Empty);
        self.ast.replace(id, inner);
      }
    };
    trace!(rule = "cast", node = id.0, "guarded caught error");
  }
}
