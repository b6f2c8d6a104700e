//! Prints an [`Ast`] back to JavaScript.
//!
//! Output is formatted canonically: one statement per line, two-space indentation, and
//! parentheses inserted only where the precedence table requires them. Type annotations, type
//! parameters and type-only declarations are never printed; decorators are.

use crate::ast::Ast;
use crate::ast::ImportKind;
use crate::ast::NodeId;
use crate::ast::Syntax;

pub mod escape;
mod expr;
pub mod precedence;
mod stmt;

pub struct Emitter<'a> {
  ast: &'a Ast,
  out: String,
  indent: usize,
}

impl<'a> Emitter<'a> {
  pub fn new(ast: &'a Ast) -> Emitter<'a> {
    Emitter {
      ast,
      out: String::new(),
      indent: 0,
    }
  }

  pub fn finish(self) -> String {
    self.out
  }

  fn write(&mut self, s: &str) {
    self.out.push_str(s);
  }

  fn newline(&mut self) {
    self.out.push('\n');
    for _ in 0..self.indent {
      self.out.push_str("  ");
    }
  }

  fn comma_separated(&mut self, items: &[NodeId], mut f: impl FnMut(&mut Self, NodeId)) {
    for (i, item) in items.iter().enumerate() {
      if i > 0 {
        self.write(", ");
      };
      f(self, *item);
    }
  }

  /// Whether a statement produces any output. Type-only declarations are dropped.
  fn is_printed(&self, id: NodeId) -> bool {
    match self.ast.stx(id) {
      Syntax::TypeAlias { .. } | Syntax::Interface { .. } => false,
      Syntax::ExportDecl { decl } => self.is_printed(*decl),
      Syntax::Import { kind, .. } | Syntax::ExportNamed { kind, .. } => *kind == ImportKind::Value,
      _ => true,
    }
  }
}

/// Prints a whole program, ending with a newline.
pub fn emit(ast: &Ast) -> String {
  let mut emitter = Emitter::new(ast);
  let root = ast.root();
  let body = match ast.stx(root) {
    Syntax::Program { body } => body.clone(),
    _ => vec![root],
  };
  let mut first = true;
  for stmt in body {
    if !emitter.is_printed(stmt) {
      continue;
    };
    if !first {
      emitter.write("\n");
    };
    first = false;
    emitter.stmt(stmt);
  }
  let mut out = emitter.finish();
  if !out.is_empty() {
    out.push('\n');
  };
  out
}

/// Prints a single expression, for diagnostics and tests.
pub fn emit_expr(ast: &Ast, id: NodeId) -> String {
  let mut emitter = Emitter::new(ast);
  emitter.expr(id, 1);
  emitter.finish()
}

#[cfg(test)]
mod tests {
  use super::emit;
  use crate::parse;

  fn roundtrip(src: &str) -> String {
    emit(&parse(src).unwrap())
  }

  #[test]
  fn erases_annotations() {
    assert_eq!(
      roundtrip("function f<T>(x: T, y?: number): T { return x; }"),
      "function f(x, y) {\n  return x;\n}\n"
    );
    assert_eq!(roundtrip("type A = number;\nlet a: A = 1;"), "let a = 1;\n");
  }

  #[test]
  fn inserts_required_parentheses() {
    assert_eq!(roundtrip("(a + b) * c;"), "(a + b) * c;\n");
    assert_eq!(roundtrip("a - (b - c);"), "a - (b - c);\n");
    assert_eq!(roundtrip("(function () {})();"), "(function () {}());\n");
    assert_eq!(roundtrip("new (f())();"), "new (f())();\n");
    assert_eq!(roundtrip("(-a) ** 2;"), "(-a) ** 2;\n");
    assert_eq!(roundtrip("x = () => ({});"), "x = () => ({});\n");
  }

  #[test]
  fn formats_objects_and_classes() {
    assert_eq!(roundtrip("x = {a: 1, b};"), "x = { a: 1, b };\n");
    assert_eq!(roundtrip("x = {};"), "x = {};\n");
    assert_eq!(
      roundtrip("class A extends B<number> { static x: number = 1; get y() { return 2 } }"),
      "class A extends B {\n  static x = 1;\n  get y() {\n    return 2;\n  }\n}\n"
    );
  }

  #[test]
  fn keeps_raw_literals_and_directives() {
    assert_eq!(roundtrip("'use strict';\nx = 'a' + `b${c}d`;"), "'use strict';\nx = 'a' + `b${c}d`;\n");
  }

  #[test]
  fn drops_type_only_imports() {
    assert_eq!(
      roundtrip("import type { A } from 'a';\nimport { b } from 'b';"),
      "import { b } from \"b\";\n"
    );
  }
}
