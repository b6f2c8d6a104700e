use super::Transformer;
use crate::ast::ImportKind;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::error::TransformResult;
use tracing::debug;
use tracing::trace;

impl<'a> Transformer<'a> {
  pub(super) fn visit_program(&mut self, id: NodeId) -> TransformResult<()> {
    let Syntax::Program { body } = self.ast.stx(id).clone() else {
      return Ok(());
    };
    self.push_frame(Some(id));
    let existing = self.existing_library_import(&body);
    let res = self.visit_stmt_list(body);
    self.pop_frame();
    let mut body = res?;
    if existing.is_none() {
      let at = body.iter().position(|s| !self.is_directive(*s)).unwrap_or(body.len());
      let import = self.library_import(id);
      body.insert(at, import);
      debug!(module = %self.options.library_module, "inserted runtime import");
    };
    if let Syntax::Program { body: slot } = self.ast.stx_mut(id) {
      *slot = body;
    };
    Ok(())
  }

  /// The local name of a default import of the runtime module already present in `body`. When
  /// found, rewrites use it instead of the configured identifier.
  fn existing_library_import(&mut self, body: &[NodeId]) -> Option<NodeId> {
    let found = body.iter().find_map(|stmt| match self.ast.stx(*stmt) {
      Syntax::Import {
        kind: ImportKind::Value,
        default: Some(local),
        module,
        ..
      } if *module == self.options.library_module => Some((*stmt, local.clone())),
      _ => None,
    });
    let (stmt, local) = found?;
    self.library_id = local;
    Some(stmt)
  }

  fn library_import(&mut self, at: NodeId) -> NodeId {
    let stx = Syntax::Import {
      kind: ImportKind::Value,
      default: Some(self.library_id.clone()),
      namespace: None,
      names: Vec::new(),
      module: self.options.library_module.clone(),
    };
    self.builder(at).node(stx)
  }

  fn is_directive(&self, stmt: NodeId) -> bool {
    let Syntax::ExprStmt { expr } = self.ast.stx(stmt) else {
      return false;
    };
    matches!(self.ast.stx(*expr), Syntax::LitStr { raw: Some(_), .. })
  }

  /// Type-only imports and exports become value imports and exports: the aliases they name are
  /// runtime bindings after rewriting.
  pub(super) fn flip_type_only(&mut self, id: NodeId) {
    match self.ast.stx_mut(id) {
      Syntax::Import { kind, names, .. } => {
        let flipped = *kind == ImportKind::Type
          || names.iter().any(|n| n.kind == ImportKind::Type);
        *kind = ImportKind::Value;
        for name in names.iter_mut() {
          name.kind = ImportKind::Value;
        }
        if flipped {
          trace!(rule = "import", node = id.0, "flipped type import to value");
        };
      }
      Syntax::ExportNamed { kind, .. } => {
        if *kind == ImportKind::Type {
          *kind = ImportKind::Value;
          trace!(rule = "export", node = id.0, "flipped type export to value");
        };
      }
      _ => {}
    };
  }

  /// Replaces a type alias or interface declaration with the runtime type binding it compiles to.
  pub(super) fn replace_alias(&mut self, id: NodeId) {
    let decl = self.compile_alias(id);
    self.replace_with(id, decl);
    trace!(rule = "alias", node = id.0, "replaced type declaration");
  }
}
