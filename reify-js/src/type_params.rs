//! Queries over declared type parameters and the names referenced by annotations.

use crate::ast::Ast;
use crate::ast::NodeId;
use crate::ast::Syntax;

/// The declared type parameters of a function, class, type alias or interface, in order.
pub fn type_parameters(ast: &Ast, node: NodeId) -> &[NodeId] {
  match ast.stx(node) {
    Syntax::Func { type_params, .. }
    | Syntax::Class { type_params, .. }
    | Syntax::TypeAlias { type_params, .. }
    | Syntax::Interface { type_params, .. } => type_params,
    _ => &[],
  }
}

/// A name referenced from inside a type annotation, with the node that references it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeReference {
  pub name: String,
  pub node: NodeId,
}

/// Every identifier an annotation refers to: the first segment of each named type, the root of
/// each `typeof` target, and everything nested in type arguments and members.
pub fn type_references(ast: &Ast, annotation: NodeId) -> Vec<TypeReference> {
  let mut out = Vec::new();
  ast.walk(annotation, &mut |id, stx| match stx {
    Syntax::TypeRef { name, .. } => {
      if let Some(first) = name.first() {
        out.push(TypeReference {
          name: first.clone(),
          node: id,
        });
      };
    }
    Syntax::Id { name } => out.push(TypeReference {
      name: name.clone(),
      node: id,
    }),
    _ => {}
  });
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  #[test]
  fn collects_nested_references() {
    let ast = parse("type A<T> = { a: Map<K, V.W>, b: typeof x, c: (T) => ?Y };").unwrap();
    let Syntax::Program { body } = ast.stx(ast.root()) else {
      panic!("expected program");
    };
    let alias = body[0];
    assert_eq!(type_parameters(&ast, alias).len(), 1);
    let Syntax::TypeAlias { value, .. } = ast.stx(alias) else {
      panic!("expected alias");
    };
    let names: Vec<_> = type_references(&ast, *value)
      .into_iter()
      .map(|r| r.name)
      .collect();
    assert_eq!(names, vec!["Map", "K", "V", "x", "T", "Y"]);
  }
}
