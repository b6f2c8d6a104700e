use super::escape::write_string_literal;
use super::precedence::starts_like_declaration;
use super::Emitter;
use crate::ast::FuncBody;
use crate::ast::ImportKind;
use crate::ast::NodeId;
use crate::ast::Syntax;

impl<'a> Emitter<'a> {
  /// Prints `{ ... }` with each printed statement on its own line.
  pub(super) fn block(&mut self, body: &[NodeId]) {
    if !body.iter().any(|s| self.is_printed(*s)) {
      self.write("{}");
      return;
    };
    self.write("{");
    self.indent += 1;
    for stmt in body {
      if self.is_printed(*stmt) {
        self.newline();
        self.stmt(*stmt);
      };
    }
    self.indent -= 1;
    self.newline();
    self.write("}");
  }

  pub(super) fn func_body(&mut self, body: &FuncBody) {
    match body {
      FuncBody::Block(stmts) => self.block(stmts),
      FuncBody::Expr(e) => self.expr(*e, 2),
    }
  }

  /// Prints a statement without a leading line break.
  pub(super) fn stmt(&mut self, id: NodeId) {
    let ast = self.ast;
    match ast.stx(id) {
      Syntax::Block { body } => self.block(body),
      Syntax::Empty => self.write(";"),
      Syntax::Debugger => self.write("debugger;"),
      Syntax::ExprStmt { expr } => {
        if starts_like_declaration(ast, *expr) {
          self.write("(");
          self.expr(*expr, 1);
          self.write(")");
        } else {
          self.expr(*expr, 1);
        };
        self.write(";");
      }
      Syntax::VarDecl { .. } => {
        self.var_decl(id);
        self.write(";");
      }
      Syntax::Func { .. } | Syntax::Class { .. } => self.expr(id, 1),
      Syntax::If {
        test,
        consequent,
        alternate,
      } => {
        self.write("if (");
        self.expr(*test, 1);
        self.write(") ");
        self.stmt(*consequent);
        if let Some(alternate) = alternate {
          self.write(" else ");
          self.stmt(*alternate);
        };
      }
      Syntax::Return { value } => {
        self.write("return");
        if let Some(value) = value {
          self.write(" ");
          self.expr(*value, 1);
        };
        self.write(";");
      }
      Syntax::Throw { value } => {
        self.write("throw ");
        self.expr(*value, 1);
        self.write(";");
      }
      Syntax::Try {
        block,
        handler,
        finalizer,
      } => {
        self.write("try ");
        self.stmt(*block);
        if let Some(handler) = handler {
          self.write(" ");
          self.stmt(*handler);
        };
        if let Some(finalizer) = finalizer {
          self.write(" finally ");
          self.stmt(*finalizer);
        };
      }
      Syntax::Catch { param, body } => {
        self.write("catch ");
        if let Some(param) = param {
          self.write("(");
          self.expr(*param, 1);
          self.write(") ");
        };
        self.block(body);
      }
      Syntax::While { test, body } => {
        self.write("while (");
        self.expr(*test, 1);
        self.write(") ");
        self.stmt(*body);
      }
      Syntax::DoWhile { body, test } => {
        self.write("do ");
        self.stmt(*body);
        self.write(" while (");
        self.expr(*test, 1);
        self.write(");");
      }
      Syntax::For {
        init,
        test,
        update,
        body,
      } => {
        self.write("for (");
        if let Some(init) = init {
          self.for_head(*init);
        };
        self.write(";");
        if let Some(test) = test {
          self.write(" ");
          self.expr(*test, 1);
        };
        self.write(";");
        if let Some(update) = update {
          self.write(" ");
          self.expr(*update, 1);
        };
        self.write(") ");
        self.stmt(*body);
      }
      Syntax::ForIn { left, right, body } => {
        self.write("for (");
        self.for_head(*left);
        self.write(" in ");
        self.expr(*right, 1);
        self.write(") ");
        self.stmt(*body);
      }
      Syntax::ForOf {
        is_await,
        left,
        right,
        body,
      } => {
        self.write(if *is_await { "for await (" } else { "for (" });
        self.for_head(*left);
        self.write(" of ");
        self.expr(*right, 2);
        self.write(") ");
        self.stmt(*body);
      }
      Syntax::Switch {
        discriminant,
        cases,
      } => {
        self.write("switch (");
        self.expr(*discriminant, 1);
        self.write(") {");
        self.indent += 1;
        for case in cases {
          self.newline();
          self.stmt(*case);
        }
        self.indent -= 1;
        self.newline();
        self.write("}");
      }
      Syntax::SwitchCase { test, body } => {
        match test {
          Some(test) => {
            self.write("case ");
            self.expr(*test, 1);
            self.write(":");
          }
          None => self.write("default:"),
        };
        self.indent += 1;
        for stmt in body {
          if self.is_printed(*stmt) {
            self.newline();
            self.stmt(*stmt);
          };
        }
        self.indent -= 1;
      }
      Syntax::Break { label } | Syntax::Continue { label } => {
        self.write(if matches!(ast.stx(id), Syntax::Break { .. }) {
          "break"
        } else {
          "continue"
        });
        if let Some(label) = label {
          self.write(" ");
          self.write(label);
        };
        self.write(";");
      }
      Syntax::Labeled { label, body } => {
        self.write(label);
        self.write(": ");
        self.stmt(*body);
      }
      Syntax::Import {
        default,
        namespace,
        names,
        module,
        ..
      } => {
        self.write("import ");
        let names: Vec<_> = names.iter().filter(|n| n.kind == ImportKind::Value).collect();
        let mut clauses = Vec::new();
        if let Some(default) = default {
          clauses.push(default.clone());
        };
        if let Some(namespace) = namespace {
          clauses.push(format!("* as {}", namespace));
        };
        if !names.is_empty() {
          let specifiers: Vec<_> = names
            .iter()
            .map(|n| {
              if n.imported == n.local {
                n.local.clone()
              } else {
                format!("{} as {}", n.imported, n.local)
              }
            })
            .collect();
          clauses.push(format!("{{ {} }}", specifiers.join(", ")));
        };
        if !clauses.is_empty() {
          self.write(&clauses.join(", "));
          self.write(" from ");
        };
        write_string_literal(&mut self.out, module);
        self.write(";");
      }
      Syntax::ExportNamed { names, from, .. } => {
        let specifiers: Vec<_> = names
          .iter()
          .map(|n| {
            if n.local == n.exported {
              n.local.clone()
            } else {
              format!("{} as {}", n.local, n.exported)
            }
          })
          .collect();
        if specifiers.is_empty() {
          self.write("export {}");
        } else {
          self.write(&format!("export {{ {} }}", specifiers.join(", ")));
        };
        if let Some(from) = from {
          self.write(" from ");
          write_string_literal(&mut self.out, from);
        };
        self.write(";");
      }
      Syntax::ExportAll { alias, from } => {
        self.write("export *");
        if let Some(alias) = alias {
          self.write(" as ");
          self.write(alias);
        };
        self.write(" from ");
        write_string_literal(&mut self.out, from);
        self.write(";");
      }
      Syntax::ExportDecl { decl } => {
        self.write("export ");
        self.stmt(*decl);
      }
      Syntax::ExportDefault { value } => {
        self.write("export default ");
        match ast.stx(*value) {
          Syntax::Func { is_decl: true, .. } | Syntax::Class { is_decl: true, .. } => {
            self.expr(*value, 2)
          }
          _ => {
            if starts_like_declaration(ast, *value) {
              self.write("(");
              self.expr(*value, 1);
              self.write(")");
            } else {
              self.expr(*value, 2);
            };
            self.write(";");
          }
        };
      }
      Syntax::TypeAlias { .. } | Syntax::Interface { .. } => {}
      _ => {
        // Expressions in statement position only occur in synthesized trees.
        self.expr(id, 1);
        self.write(";");
      }
    };
  }

  /// `const a = 1, b`, without the terminating semicolon.
  pub(super) fn var_decl(&mut self, id: NodeId) {
    let ast = self.ast;
    let Syntax::VarDecl { mode, declarators } = ast.stx(id) else {
      return;
    };
    self.write(mode.keyword());
    self.write(" ");
    self.comma_separated(declarators, |e, d| {
      let Syntax::VarDeclarator { pattern, init } = ast.stx(d) else {
        return;
      };
      e.expr(*pattern, 2);
      if let Some(init) = init {
        e.write(" = ");
        e.expr(*init, 2);
      };
    });
  }

  fn for_head(&mut self, id: NodeId) {
    let ast = self.ast;
    match ast.stx(id) {
      Syntax::VarDecl { .. } => self.var_decl(id),
      _ => self.expr(id, 1),
    }
  }
}
