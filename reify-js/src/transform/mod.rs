//! The rewrite engine: one depth-first pass that erases annotations and inserts runtime checks.
//!
//! Rules fire as the traversal enters or leaves nodes. Statements a rule needs before the current
//! statement are queued in `pending_before` and spliced in by whichever walker owns the enclosing
//! statement list. Synthesized type bindings live in [`scope::BindingFrame`]s pushed and popped
//! with the lexical structure.

use crate::ast::build::Builder;
use crate::ast::Ast;
use crate::ast::NodeId;
use crate::ast::PropKey;
use crate::ast::Syntax;
use crate::error::TransformResult;
use crate::options::Options;
use crate::resolve::Entities;
use crate::type_expr::TypeContext;
use crate::type_expr::TypeExprBuilder;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use scope::BindingFrame;
use scope::FunctionState;
use scope::NameGenerator;
use tracing::debug;

mod class;
mod func;
mod program;
mod scope;
mod var;

#[cfg(test)]
mod tests;

pub struct Transformer<'a> {
  ast: &'a mut Ast,
  entities: &'a Entities,
  types: &'a dyn TypeExprBuilder,
  options: &'a Options,
  library_id: String,
  names: NameGenerator,
  frames: Vec<BindingFrame>,
  functions: Vec<FunctionState>,
  // Innermost statement last; the target of `insert_before_current`. A function is pushed while
  // its parameters are visited.
  stmt_stack: Vec<NodeId>,
  pending_before: HashMap<NodeId, Vec<NodeId>>,
  // Expressions whose value is discarded because they form a whole statement.
  stmt_exprs: HashSet<NodeId>,
  // Constructors of classes with a superclass; `this` is unavailable before `super()` in them.
  derived_constructors: HashSet<NodeId>,
}

impl<'a> Transformer<'a> {
  pub fn new(
    ast: &'a mut Ast,
    entities: &'a Entities,
    types: &'a dyn TypeExprBuilder,
    options: &'a Options,
  ) -> Transformer<'a> {
    let mut names = NameGenerator::for_program(ast);
    names.reserve(&options.library_id);
    Transformer {
      ast,
      entities,
      types,
      options,
      library_id: options.library_id.clone(),
      names,
      frames: Vec::new(),
      functions: Vec::new(),
      stmt_stack: Vec::new(),
      pending_before: HashMap::new(),
      stmt_exprs: HashSet::new(),
      derived_constructors: HashSet::new(),
    }
  }

  pub fn run(mut self) -> TransformResult<()> {
    let root = self.ast.root();
    self.visit_program(root)?;
    erase_annotations(self.ast);
    Ok(())
  }

  fn builder(&mut self, at: NodeId) -> Builder<'_> {
    let loc = self.ast.loc(at);
    Builder::new(self.ast, loc)
  }

  /// `t.<method>(args...)`.
  fn lib_call(&mut self, at: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
    let loc = self.ast.loc(at);
    Builder::new(self.ast, loc).named_call(&self.library_id, method, args)
  }

  fn compile(&mut self, annotation: NodeId) -> NodeId {
    let mut cx = TypeContext {
      ast: &mut *self.ast,
      entities: self.entities,
      library_id: &self.library_id,
    };
    self.types.compile(&mut cx, annotation)
  }

  fn compile_alias(&mut self, decl: NodeId) -> NodeId {
    let mut cx = TypeContext {
      ast: &mut *self.ast,
      entities: self.entities,
      library_id: &self.library_id,
    };
    self.types.compile_alias(&mut cx, decl)
  }

  /// `<binding>.assert(args...)`, marked so that it is never rewritten again.
  fn assert_call(&mut self, at: NodeId, binding: &str, args: Vec<NodeId>) -> NodeId {
    let call = self.builder(at).named_call(binding, "assert", args);
    self.ast.mark_visited(call);
    call
  }

  /// Moves the content of the freshly built `replacement` into slot `id`.
  fn replace_with(&mut self, id: NodeId, replacement: NodeId) {
    let stx = self.ast.replace(replacement, Syntax::Empty);
    let visited = self.ast.is_visited(replacement);
    self.ast.replace(id, stx);
    if visited {
      self.ast.mark_visited(id);
    };
  }

  fn insert_before_current(&mut self, stmt: NodeId) {
    if let Some(&current) = self.stmt_stack.last() {
      self.pending_before.entry(current).or_default().push(stmt);
    };
  }

  /// Whether the traversal is inside a parameter list, where the innermost entry of
  /// `stmt_stack` is the function itself.
  fn in_parameters(&self) -> bool {
    self
      .stmt_stack
      .last()
      .is_some_and(|id| matches!(self.ast.stx(*id), Syntax::Func { .. }))
  }

  fn visit_all(&mut self, ids: &[NodeId]) -> TransformResult<()> {
    for id in ids {
      self.visit(*id)?;
    }
    Ok(())
  }

  fn visit_opt(&mut self, id: Option<NodeId>) -> TransformResult<()> {
    match id {
      Some(id) => self.visit(id),
      None => Ok(()),
    }
  }

  /// Visits each statement and splices in whatever the rules queued before it.
  fn visit_stmt_list(&mut self, stmts: Vec<NodeId>) -> TransformResult<Vec<NodeId>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
      self.stmt_stack.push(stmt);
      let res = self.visit(stmt);
      self.stmt_stack.pop();
      res?;
      if let Some(before) = self.pending_before.remove(&stmt) {
        out.extend(before);
      };
      out.push(stmt);
    }
    Ok(out)
  }

  /// Visits a statement that is not part of a list, such as a loop body. If rules queued
  /// statements before it, it is wrapped in a block together with them.
  fn visit_stmt_slot(&mut self, stmt: NodeId) -> TransformResult<()> {
    self.frames.push(BindingFrame::new(None));
    self.stmt_stack.push(stmt);
    let res = self.visit(stmt);
    self.stmt_stack.pop();
    self.pop_frame();
    res?;
    if let Some(mut before) = self.pending_before.remove(&stmt) {
      let moved = self.ast.detach(stmt);
      before.push(moved);
      let block = self.builder(stmt).block(before);
      self.replace_with(stmt, block);
    };
    Ok(())
  }

  fn visit_key(&mut self, key: &PropKey) -> TransformResult<()> {
    if let PropKey::Computed(k) = key {
      self.visit(*k)?;
    };
    Ok(())
  }

  fn visit(&mut self, id: NodeId) -> TransformResult<()> {
    if self.ast.is_visited(id) {
      return Ok(());
    };
    match self.ast.stx(id).clone() {
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
      | Syntax::ExportAll { .. }
      | Syntax::IdPat { .. } => {}

      Syntax::ObjPat { props, .. } => self.visit_all(&props)?,
      Syntax::ObjPatProp { key, target, .. } => {
        self.visit_key(&key)?;
        self.visit(target)?;
      }
      Syntax::ArrPat { elements, .. } => {
        for element in elements.into_iter().flatten() {
          self.visit(element)?;
        }
      }
      Syntax::AssignPat { target, default } => {
        self.visit(target)?;
        self.visit(default)?;
      }
      Syntax::RestPat { target, .. } => self.visit(target)?,

      Syntax::LitTemplate { exprs, .. } => self.visit_all(&exprs)?,
      Syntax::TaggedTemplate { tag, template } => {
        self.visit(tag)?;
        self.visit(template)?;
      }
      Syntax::LitArr { elements } => {
        for element in elements.into_iter().flatten() {
          self.visit(element)?;
        }
      }
      Syntax::LitObj { members } => self.visit_all(&members)?,
      Syntax::ObjProp { key, value, .. } => {
        self.visit_key(&key)?;
        self.visit(value)?;
      }
      Syntax::ObjMethod { key, func, .. } => {
        self.visit_key(&key)?;
        self.visit(func)?;
      }
      Syntax::Spread { arg } | Syntax::Unary { arg, .. } | Syntax::Postfix { arg, .. } => {
        self.visit(arg)?
      }
      Syntax::Binary { left, right, .. } => {
        self.visit(left)?;
        self.visit(right)?;
      }
      Syntax::Assign { target, value, .. } => {
        self.visit(target)?;
        self.visit(value)?;
        self.rewrite_assign(id);
      }
      Syntax::Cond {
        test,
        consequent,
        alternate,
      } => {
        self.visit(test)?;
        self.visit(consequent)?;
        self.visit(alternate)?;
      }
      Syntax::Call { callee, args, .. } | Syntax::New { callee, args } => {
        self.visit(callee)?;
        self.visit_all(&args)?;
      }
      Syntax::Member { object, .. } => self.visit(object)?,
      Syntax::ComputedMember {
        object, property, ..
      } => {
        self.visit(object)?;
        self.visit(property)?;
      }
      Syntax::Yield { arg, .. } => {
        self.visit_opt(arg)?;
        self.rewrite_yield(id);
      }
      Syntax::TypeCast { expr, .. } => {
        self.visit(expr)?;
        self.rewrite_cast(id);
      }
      Syntax::Func { .. } => self.visit_func(id)?,
      Syntax::Class { .. } => self.visit_class(id)?,
      Syntax::ClassMember {
        key,
        value,
        decorators,
        ..
      } => {
        self.visit_all(&decorators)?;
        self.visit_key(&key)?;
        self.visit_opt(value)?;
        self.decorate_class_property(id);
      }

      Syntax::Program { .. } => self.visit_program(id)?,
      Syntax::Block { body } => {
        self.push_frame(Some(id));
        let res = self.visit_stmt_list(body);
        self.pop_frame();
        let new_body = res?;
        if let Syntax::Block { body } = self.ast.stx_mut(id) {
          *body = new_body;
        };
      }
      Syntax::ExprStmt { expr } => {
        self.stmt_exprs.insert(expr);
        self.visit(expr)?;
      }
      Syntax::VarDecl { .. } => self.visit_var_decl(id, true)?,
      Syntax::VarDeclarator { pattern, init } => {
        self.visit(pattern)?;
        self.visit_opt(init)?;
      }
      Syntax::If {
        test,
        consequent,
        alternate,
      } => {
        self.visit(test)?;
        self.visit_stmt_slot(consequent)?;
        if let Some(alternate) = alternate {
          self.visit_stmt_slot(alternate)?;
        };
      }
      Syntax::Return { value } => {
        self.visit_opt(value)?;
        self.rewrite_return(id);
      }
      Syntax::Throw { value } => self.visit(value)?,
      Syntax::Try {
        block,
        handler,
        finalizer,
      } => {
        self.visit(block)?;
        self.visit_opt(handler)?;
        self.visit_opt(finalizer)?;
      }
      Syntax::Catch { param, body } => {
        self.push_frame(Some(id));
        let res = self
          .visit_opt(param)
          .and_then(|_| self.visit_stmt_list(body));
        self.pop_frame();
        let new_body = res?;
        if let Syntax::Catch { body, .. } = self.ast.stx_mut(id) {
          *body = new_body;
        };
      }
      Syntax::While { test, body } => {
        self.visit(test)?;
        self.visit_stmt_slot(body)?;
      }
      Syntax::DoWhile { body, test } => {
        self.visit_stmt_slot(body)?;
        self.visit(test)?;
      }
      Syntax::For {
        init,
        test,
        update,
        body,
      } => {
        self.push_frame(Some(id));
        let res = self.visit_for(init, test, update, body);
        self.pop_frame();
        res?;
      }
      Syntax::ForIn { left, right, body } | Syntax::ForOf { left, right, body, .. } => {
        self.push_frame(Some(id));
        let res = self.visit_for_in_of(left, right, body);
        self.pop_frame();
        res?;
      }
      Syntax::Switch {
        discriminant,
        cases,
      } => {
        self.visit(discriminant)?;
        self.push_frame(Some(id));
        let res = self.visit_all(&cases);
        self.pop_frame();
        res?;
      }
      Syntax::SwitchCase { test, body } => {
        self.visit_opt(test)?;
        let new_body = self.visit_stmt_list(body)?;
        if let Syntax::SwitchCase { body, .. } = self.ast.stx_mut(id) {
          *body = new_body;
        };
      }
      // Statements queued by the body go before the label, which must stay on its loop.
      Syntax::Labeled { body, .. } => self.visit(body)?,
      Syntax::Import { .. } | Syntax::ExportNamed { .. } => self.flip_type_only(id),
      Syntax::ExportDecl { decl } => self.visit(decl)?,
      Syntax::ExportDefault { value } => self.visit(value)?,
      Syntax::TypeAlias { .. } | Syntax::Interface { .. } => self.replace_alias(id),

      // Annotations are compiled by the rule that owns them, never walked.
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
      | Syntax::TypeParam { .. } => {}
    };
    Ok(())
  }

  fn visit_for(
    &mut self,
    init: Option<NodeId>,
    test: Option<NodeId>,
    update: Option<NodeId>,
    body: NodeId,
  ) -> TransformResult<()> {
    if let Some(init) = init {
      match self.ast.stx(init) {
        Syntax::VarDecl { .. } => self.visit_var_decl(init, true)?,
        _ => self.visit(init)?,
      };
    };
    self.visit_opt(test)?;
    self.visit_opt(update)?;
    self.visit_stmt_slot(body)
  }

  fn visit_for_in_of(&mut self, left: NodeId, right: NodeId, body: NodeId) -> TransformResult<()> {
    match self.ast.stx(left) {
      // The declared variable is assigned by the loop itself, so its annotation is only erased.
      Syntax::VarDecl { .. } => self.visit_var_decl(left, false)?,
      _ => self.visit(left)?,
    };
    self.visit(right)?;
    self.visit_stmt_slot(body)
  }
}

/// Clears every annotation, type parameter list and type-only clause still reachable from the
/// root, and unwraps casts that no rule consumed.
fn erase_annotations(ast: &mut Ast) {
  let mut ids = Vec::new();
  ast.walk(ast.root(), &mut |id, stx| {
    if !stx.is_type() {
      ids.push(id);
    };
  });
  for id in ids {
    while let Syntax::TypeCast { expr, .. } = ast.stx(id) {
      let expr = *expr;
      let inner = ast.replace(expr, Syntax::Empty);
      ast.replace(id, inner);
    }
    match ast.stx_mut(id) {
      Syntax::IdPat { annotation, .. }
      | Syntax::ObjPat { annotation, .. }
      | Syntax::ArrPat { annotation, .. }
      | Syntax::RestPat { annotation, .. }
      | Syntax::ClassMember { annotation, .. } => *annotation = None,
      Syntax::Func {
        type_params,
        return_type,
        ..
      } => {
        type_params.clear();
        *return_type = None;
      }
      Syntax::Class {
        type_params,
        super_type_args,
        implements,
        ..
      } => {
        type_params.clear();
        super_type_args.clear();
        implements.clear();
      }
      _ => {}
    };
  }
}

/// Rewrites `ast` in place, compiling annotations through `types`.
pub fn transform_with(
  ast: &mut Ast,
  entities: &Entities,
  types: &dyn TypeExprBuilder,
  options: &Options,
) -> TransformResult<()> {
  debug!(nodes = ast.len(), "rewriting program");
  Transformer::new(ast, entities, types, options).run()
}

