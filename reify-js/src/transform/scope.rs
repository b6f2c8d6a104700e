//! Rewrite state that follows the lexical structure of the program: binding frames, function
//! state and fresh name allocation.

use super::Transformer;
use crate::ast::Ast;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::resolve::ScopeId;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;

/// Synthesized type bindings visible in one lexical scope, keyed by the name of the variable
/// whose declared type they hold.
#[derive(Debug)]
pub struct BindingFrame {
  /// The resolver scope this frame mirrors. Frames for single-statement slots have none.
  pub scope: Option<ScopeId>,
  pub bindings: HashMap<String, String>,
}

impl BindingFrame {
  pub fn new(scope: Option<ScopeId>) -> BindingFrame {
    BindingFrame {
      scope,
      bindings: HashMap::new(),
    }
  }
}

/// Bindings introduced by the header of the function currently being rewritten.
#[derive(Debug, Default, Clone)]
pub struct FunctionState {
  pub return_uid: Option<String>,
  pub yield_uid: Option<String>,
  pub next_uid: Option<String>,
}

/// Hands out names that collide with nothing in the program.
#[derive(Debug)]
pub struct NameGenerator {
  taken: HashSet<String>,
}

impl NameGenerator {
  pub fn for_program(ast: &Ast) -> NameGenerator {
    let mut taken = HashSet::new();
    ast.walk(ast.root(), &mut |_, stx| match stx {
      Syntax::Id { name }
      | Syntax::IdPat { name, .. }
      | Syntax::TypeParam { name, .. }
      | Syntax::TypeAlias { name, .. }
      | Syntax::Interface { name, .. } => {
        taken.insert(name.clone());
      }
      Syntax::Func { name: Some(name), .. } | Syntax::Class { name: Some(name), .. } => {
        taken.insert(name.clone());
      }
      Syntax::Import {
        default,
        namespace,
        names,
        ..
      } => {
        taken.extend(default.iter().cloned());
        taken.extend(namespace.iter().cloned());
        taken.extend(names.iter().map(|n| n.local.clone()));
      }
      Syntax::TypeRef { name, .. } => {
        taken.extend(name.first().cloned());
      }
      _ => {}
    });
    NameGenerator { taken }
  }

  pub fn reserve(&mut self, name: &str) {
    self.taken.insert(name.to_string());
  }

  /// `_base`, or `_base2`, `_base3`, ... if that is taken.
  pub fn fresh(&mut self, base: &str) -> String {
    let mut candidate = format!("_{}", base);
    let mut n = 2;
    while self.taken.contains(&candidate) {
      candidate = format!("_{}{}", base, n);
      n += 1;
    }
    self.taken.insert(candidate.clone());
    candidate
  }
}

impl<'a> Transformer<'a> {
  pub(super) fn push_frame(&mut self, owner: Option<NodeId>) {
    let scope = owner.and_then(|o| self.entities.scope_of_owner(o));
    self.frames.push(BindingFrame::new(scope));
  }

  pub(super) fn pop_frame(&mut self) {
    self.frames.pop();
  }

  /// Finds the type binding for `name` as referenced at `at`. The search stops at the frame of
  /// the scope that declares `name`, so an unannotated shadowing declaration hides outer
  /// bindings.
  pub(super) fn lookup_binding(&self, name: &str, at: NodeId) -> Option<String> {
    let declared_in = self.entities.get_entity(name, at).map(|e| e.scope);
    for frame in self.frames.iter().rev() {
      if let Some(uid) = frame.bindings.get(name) {
        return Some(uid.clone());
      };
      if declared_in.is_some() && frame.scope == declared_in {
        return None;
      };
    }
    None
  }

  /// Records a binding in the frame of the scope that declares `name`, or the innermost frame if
  /// that scope has no frame.
  pub(super) fn register_binding(&mut self, name: &str, at: NodeId, uid: &str) {
    let declared_in = self.entities.get_entity(name, at).map(|e| e.scope);
    let index = self
      .frames
      .iter()
      .rposition(|f| declared_in.is_some() && f.scope == declared_in)
      .or_else(|| self.frames.len().checked_sub(1));
    if let Some(index) = index {
      self.frames[index]
        .bindings
        .insert(name.to_string(), uid.to_string());
    };
  }

  /// Records a binding in the innermost frame, next to the statement that declares it.
  pub(super) fn register_local_binding(&mut self, name: &str, uid: &str) {
    if let Some(frame) = self.frames.last_mut() {
      frame.bindings.insert(name.to_string(), uid.to_string());
    };
  }

  pub(super) fn function_state(&self) -> Option<&FunctionState> {
    self.functions.last()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  #[test]
  fn fresh_names_avoid_program_identifiers() {
    let ast = parse("let _xType = 1, _xType2 = 2; x;").unwrap();
    let mut names = NameGenerator::for_program(&ast);
    assert_eq!(names.fresh("xType"), "_xType3");
    assert_eq!(names.fresh("xType"), "_xType4");
    assert_eq!(names.fresh("returnType"), "_returnType");
  }
}
