//! Compilation of type annotations into runtime type expressions.
//!
//! A compiled type is an ordinary expression that evaluates to a value of the runtime library
//! exposing `assert(value)` and `match(value)`. [`TypeExprBuilder`] is the seam the rewriter
//! compiles through; [`RuntimeTypeBuilder`] targets the `flow-runtime` API.

use crate::ast::build::Builder;
use crate::ast::Ast;
use crate::ast::FuncBody;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::ast::TypeKeyword;
use crate::ast::VarDeclMode;
use crate::resolve::Entities;
use crate::resolve::EntityKind;
use ahash::HashSet;
use ahash::HashSetExt;
use once_cell::sync::Lazy;

/// Global constructors that can be referenced directly when no local binding shadows them.
/// Other unresolved names are looked up by string in the runtime's registry.
static GLOBAL_VALUES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  let mut set = HashSet::new();
  for name in [
    "ArrayBuffer",
    "Boolean",
    "DataView",
    "Date",
    "Error",
    "EvalError",
    "Float32Array",
    "Float64Array",
    "Int8Array",
    "Int16Array",
    "Int32Array",
    "Map",
    "Number",
    "Promise",
    "Proxy",
    "RangeError",
    "ReferenceError",
    "RegExp",
    "Set",
    "String",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "URIError",
    "Uint8Array",
    "Uint8ClampedArray",
    "Uint16Array",
    "Uint32Array",
    "WeakMap",
    "WeakSet",
  ] {
    set.insert(name);
  }
  set
});

/// Everything a builder may consult while compiling.
pub struct TypeContext<'a> {
  pub ast: &'a mut Ast,
  pub entities: &'a Entities,
  pub library_id: &'a str,
}

impl<'a> TypeContext<'a> {
  fn builder(&mut self, at: NodeId) -> Builder<'_> {
    let loc = self.ast.loc(at);
    Builder::new(self.ast, loc)
  }

  /// `t.<method>(args...)`.
  fn lib_call(&mut self, at: NodeId, method: &str, args: Vec<NodeId>) -> NodeId {
    let library_id = self.library_id;
    self.builder(at).named_call(library_id, method, args)
  }
}

pub trait TypeExprBuilder {
  /// Compiles an annotation into an expression evaluating to a runtime type.
  fn compile(&self, cx: &mut TypeContext, annotation: NodeId) -> NodeId;

  /// Compiles a type alias or interface declaration into the statement that replaces it.
  fn compile_alias(&self, cx: &mut TypeContext, decl: NodeId) -> NodeId;
}

/// A compiled type that is either usable immediately or must be produced on demand because it
/// refers to bindings that are not initialised yet where it is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompiledType {
  Eager(NodeId),
  Deferred(NodeId),
}

impl CompiledType {
  /// The expression to place in code: deferred types become `function () { return T; }`.
  pub fn into_expr(self, ast: &mut Ast) -> NodeId {
    match self {
      CompiledType::Eager(expr) => expr,
      CompiledType::Deferred(expr) => {
        let loc = ast.loc(expr);
        let mut b = Builder::new(ast, loc);
        let ret = b.ret(Some(expr));
        b.func_expr(Vec::new(), vec![ret])
      }
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeTypeBuilder;

impl RuntimeTypeBuilder {
  pub fn new() -> Self {
    RuntimeTypeBuilder
  }

  fn compile_all(&self, cx: &mut TypeContext, ids: &[NodeId]) -> Vec<NodeId> {
    ids.iter().map(|id| self.compile(cx, *id)).collect()
  }

  fn keyword(&self, cx: &mut TypeContext, at: NodeId, keyword: TypeKeyword) -> NodeId {
    let method = match keyword {
      TypeKeyword::Any => "any",
      TypeKeyword::Boolean => "boolean",
      TypeKeyword::Empty => "empty",
      TypeKeyword::Existential => "existential",
      TypeKeyword::Mixed => "mixed",
      TypeKeyword::Null => "null",
      TypeKeyword::Number => "number",
      TypeKeyword::String => "string",
      TypeKeyword::Symbol => "symbol",
      TypeKeyword::Void => "void",
    };
    cx.lib_call(at, method, Vec::new())
  }

  /// Compiles the members of an object type. Spreads are returned separately.
  fn object_members(&self, cx: &mut TypeContext, members: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut props = Vec::new();
    let mut spreads = Vec::new();
    for member in members {
      match cx.ast.stx(*member).clone() {
        Syntax::TypeObjectProp {
          key,
          value,
          optional,
        } => {
          let value = self.compile(cx, value);
          let mut b = cx.builder(*member);
          let mut args = vec![b.str(&key), value];
          if optional {
            args.push(b.bool(true));
          };
          props.push(cx.lib_call(*member, "property", args));
        }
        Syntax::TypeIndexer {
          key_name,
          key,
          value,
        } => {
          let key = self.compile(cx, key);
          let value = self.compile(cx, value);
          let name = cx
            .builder(*member)
            .str(key_name.as_deref().unwrap_or("key"));
          props.push(cx.lib_call(*member, "indexer", vec![name, key, value]));
        }
        Syntax::TypeSpread { arg } => spreads.push(self.compile(cx, arg)),
        _ => {}
      };
    }
    (props, spreads)
  }

  fn object(&self, cx: &mut TypeContext, at: NodeId, exact: bool, members: &[NodeId]) -> NodeId {
    let (props, spreads) = self.object_members(cx, members);
    let object = cx.lib_call(at, if exact { "exactObject" } else { "object" }, props);
    if spreads.is_empty() {
      return object;
    };
    // `{ ...A, b: B }` is checked as `A & { b: B }`.
    let mut types = spreads;
    types.push(object);
    cx.lib_call(at, "intersection", types)
  }

  fn function(
    &self,
    cx: &mut TypeContext,
    at: NodeId,
    params: &[NodeId],
    rest: Option<NodeId>,
    ret: NodeId,
  ) -> NodeId {
    let mut args = Vec::new();
    for (i, param) in params.iter().enumerate() {
      let Syntax::TypeFuncParam {
        name,
        value,
        optional,
      } = cx.ast.stx(*param).clone()
      else {
        continue;
      };
      let value = self.compile(cx, value);
      let mut b = cx.builder(*param);
      let name = b.str(&name.unwrap_or_else(|| format!("_arg{}", i)));
      let mut param_args = vec![name, value];
      if optional {
        param_args.push(b.bool(true));
      };
      args.push(cx.lib_call(*param, "param", param_args));
    }
    if let Some(rest) = rest {
      if let Syntax::TypeFuncParam { name, value, .. } = cx.ast.stx(rest).clone() {
        let value = self.compile(cx, value);
        let name = cx
          .builder(rest)
          .str(name.as_deref().unwrap_or("rest"));
        args.push(cx.lib_call(rest, "rest", vec![name, value]));
      };
    };
    let ret = self.compile(cx, ret);
    args.push(cx.lib_call(at, "return", vec![ret]));
    cx.lib_call(at, "function", args)
  }

  /// Copies the `x` or `a.b.c` expression of a `typeof` type.
  fn copy_typeof_target(&self, cx: &mut TypeContext, arg: NodeId) -> NodeId {
    match cx.ast.stx(arg).clone() {
      Syntax::Member {
        object, property, ..
      } => {
        let object = self.copy_typeof_target(cx, object);
        cx.builder(arg).member(object, &property)
      }
      Syntax::Id { name } => cx.builder(arg).id(&name),
      _ => cx.builder(arg).id("undefined"),
    }
  }

  fn reference(&self, cx: &mut TypeContext, at: NodeId, name: &[String], args: &[NodeId]) -> NodeId {
    let compiled_args = self.compile_all(cx, args);
    if name.len() > 1 {
      let mut b = cx.builder(at);
      let mut target = b.id(&name[0]);
      for segment in &name[1..] {
        target = b.member(target, segment);
      }
      let mut ref_args = vec![target];
      ref_args.extend(compiled_args);
      return cx.lib_call(at, "ref", ref_args);
    };
    let first = name[0].as_str();
    match cx.entities.get_entity(first, at).map(|e| e.kind) {
      Some(EntityKind::TypeParameter) => cx.builder(at).id(first),
      Some(EntityKind::ClassTypeParameter) => {
        let library_id = cx.library_id;
        let mut b = cx.builder(at);
        let this = b.this();
        let symbol = b.id(library_id);
        let symbol = b.member(symbol, "TypeParametersSymbol");
        let params = b.computed(this, symbol);
        b.member(params, first)
      }
      Some(EntityKind::TypeAlias | EntityKind::TypeImport | EntityKind::Interface)
        if compiled_args.is_empty() =>
      {
        cx.builder(at).id(first)
      }
      Some(_) => {
        let target = cx.builder(at).id(first);
        let mut ref_args = vec![target];
        ref_args.extend(compiled_args);
        cx.lib_call(at, "ref", ref_args)
      }
      None => self.global_reference(cx, at, first, compiled_args),
    }
  }

  fn global_reference(&self, cx: &mut TypeContext, at: NodeId, name: &str, args: Vec<NodeId>) -> NodeId {
    let helper = match name {
      "Array" | "$ReadOnlyArray" => Some("array"),
      "Object" if args.is_empty() => Some("object"),
      "Function" if args.is_empty() => Some("function"),
      "Class" => Some("Class"),
      "$Keys" => Some("$keys"),
      "$Values" => Some("$values"),
      "$Exact" => Some("$exact"),
      "$Shape" => Some("$shape"),
      "$Diff" => Some("$diff"),
      "$PropertyType" => Some("$propertyType"),
      "$ElementType" => Some("$elementType"),
      _ => None,
    };
    if let Some(helper) = helper {
      return cx.lib_call(at, helper, args);
    };
    let target = if GLOBAL_VALUES.contains(name) {
      cx.builder(at).id(name)
    } else {
      cx.builder(at).str(name)
    };
    let mut ref_args = vec![target];
    ref_args.extend(args);
    cx.lib_call(at, "ref", ref_args)
  }

  /// `const T = Owner.typeParameter("T", bound)` inside a generic alias body.
  fn alias_type_param(&self, cx: &mut TypeContext, owner: &str, param: NodeId) -> Option<NodeId> {
    let Syntax::TypeParam {
      name,
      bound,
      default,
    } = cx.ast.stx(param).clone()
    else {
      return None;
    };
    let bound = bound.map(|b| self.compile(cx, b));
    let default = default.map(|d| self.compile(cx, d));
    let mut b = cx.builder(param);
    let mut args = vec![b.str(&name)];
    match (bound, default) {
      (Some(bound), Some(default)) => args.extend([bound, default]),
      (Some(bound), None) => args.push(bound),
      (None, Some(default)) => {
        let undefined = b.id("undefined");
        args.extend([undefined, default]);
      }
      (None, None) => {}
    };
    let init = b.named_call(owner, "typeParameter", args);
    Some(b.var_decl(VarDeclMode::Const, &name, Some(init)))
  }
}

impl TypeExprBuilder for RuntimeTypeBuilder {
  fn compile(&self, cx: &mut TypeContext, annotation: NodeId) -> NodeId {
    let at = annotation;
    match cx.ast.stx(annotation).clone() {
      Syntax::TypeKeyword { keyword } => self.keyword(cx, at, keyword),
      Syntax::TypeLitStr { value } => {
        let value = cx.builder(at).str(&value);
        cx.lib_call(at, "string", vec![value])
      }
      Syntax::TypeLitNum { raw } => {
        let value = cx.builder(at).num(&raw);
        cx.lib_call(at, "number", vec![value])
      }
      Syntax::TypeLitBool { value } => {
        let value = cx.builder(at).bool(value);
        cx.lib_call(at, "boolean", vec![value])
      }
      Syntax::TypeRef { name, args } => self.reference(cx, at, &name, &args),
      Syntax::TypeNullable { inner } => {
        let inner = self.compile(cx, inner);
        cx.lib_call(at, "nullable", vec![inner])
      }
      Syntax::TypeUnion { types } => {
        let types = self.compile_all(cx, &types);
        cx.lib_call(at, "union", types)
      }
      Syntax::TypeIntersection { types } => {
        let types = self.compile_all(cx, &types);
        cx.lib_call(at, "intersection", types)
      }
      Syntax::TypeArray { elem } => {
        let elem = self.compile(cx, elem);
        cx.lib_call(at, "array", vec![elem])
      }
      Syntax::TypeTuple { elems } => {
        let elems = self.compile_all(cx, &elems);
        cx.lib_call(at, "tuple", elems)
      }
      Syntax::TypeObject { exact, members } => self.object(cx, at, exact, &members),
      Syntax::TypeFunc { params, rest, ret } => self.function(cx, at, &params, rest, ret),
      Syntax::TypeTypeof { arg } => {
        let target = self.copy_typeof_target(cx, arg);
        cx.lib_call(at, "typeOf", vec![target])
      }
      _ => cx.lib_call(at, "any", Vec::new()),
    }
  }

  fn compile_alias(&self, cx: &mut TypeContext, decl: NodeId) -> NodeId {
    let (name, type_params, body) = match cx.ast.stx(decl).clone() {
      Syntax::TypeAlias {
        name,
        type_params,
        value,
      } => (name, type_params, self.compile(cx, value)),
      Syntax::Interface {
        name,
        type_params,
        extends,
        body,
      } => {
        let mut types = self.compile_all(cx, &extends);
        let body = self.compile(cx, body);
        let body = if types.is_empty() {
          body
        } else {
          types.push(body);
          cx.lib_call(decl, "intersection", types)
        };
        (name, type_params, body)
      }
      _ => {
        let empty = cx.builder(decl).node(Syntax::Empty);
        return empty;
      }
    };
    let value = if type_params.is_empty() {
      body
    } else {
      // Type parameters are declared before the body is evaluated, inside a factory that
      // receives the alias itself.
      let mut stmts: Vec<NodeId> = type_params
        .iter()
        .filter_map(|p| self.alias_type_param(cx, &name, *p))
        .collect();
      let mut b = cx.builder(decl);
      stmts.push(b.ret(Some(body)));
      let param = b.id_pat(&name);
      b.arrow(vec![param], FuncBody::Block(stmts))
    };
    let mut b = cx.builder(decl);
    let label = b.str(&name);
    let init = cx.lib_call(decl, "type", vec![label, value]);
    cx.builder(decl)
      .var_decl(VarDeclMode::Const, &name, Some(init))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::emit::emit_expr;
  use crate::parse;
  use crate::resolve::resolve;

  fn compile_alias_value(src: &str) -> String {
    let mut ast = parse(src).unwrap();
    let entities = resolve(&ast);
    let Syntax::Program { body } = ast.stx(ast.root()).clone() else {
      panic!("expected program");
    };
    let Syntax::TypeAlias { value, .. } = ast.stx(*body.last().unwrap()).clone() else {
      panic!("expected alias");
    };
    let mut cx = TypeContext {
      ast: &mut ast,
      entities: &entities,
      library_id: "t",
    };
    let compiled = RuntimeTypeBuilder.compile(&mut cx, value);
    emit_expr(&ast, compiled)
  }

  #[test]
  fn primitives_and_literals() {
    assert_eq!(compile_alias_value("type A = ?string;"), "t.nullable(t.string())");
    assert_eq!(
      compile_alias_value("type A = 'a' | 2 | true;"),
      "t.union(t.string(\"a\"), t.number(2), t.boolean(true))"
    );
  }

  #[test]
  fn objects_and_functions() {
    assert_eq!(
      compile_alias_value("type A = {| x: number, y?: string, [k: string]: mixed |};"),
      "t.exactObject(t.property(\"x\", t.number()), t.property(\"y\", t.string(), true), t.indexer(\"k\", t.string(), t.mixed()))"
    );
    assert_eq!(
      compile_alias_value("type F = (a: number, ...rest: Array<string>) => void;"),
      "t.function(t.param(\"a\", t.number()), t.rest(\"rest\", t.array(t.string())), t.return(t.void()))"
    );
  }

  #[test]
  fn references() {
    assert_eq!(
      compile_alias_value("type B = number;\nclass C {}\ntype A = [B, C, Date, Iterable<number>];"),
      "t.tuple(B, t.ref(C), t.ref(Date), t.ref(\"Iterable\", t.number()))"
    );
    assert_eq!(compile_alias_value("type A<T> = T[];"), "t.array(T)");
  }

  #[test]
  fn generic_alias_declaration() {
    let mut ast = parse("type Box<T: number> = { value: T };").unwrap();
    let entities = resolve(&ast);
    let Syntax::Program { body } = ast.stx(ast.root()).clone() else {
      panic!("expected program");
    };
    let mut cx = TypeContext {
      ast: &mut ast,
      entities: &entities,
      library_id: "t",
    };
    let decl = RuntimeTypeBuilder.compile_alias(&mut cx, body[0]);
    ast.replace(ast.root(), Syntax::Program { body: vec![decl] });
    assert_eq!(
      crate::emit::emit(&ast),
      "const Box = t.type(\"Box\", (Box) => {\n  const T = Box.typeParameter(\"T\", t.number());\n  return t.object(t.property(\"value\", T));\n});\n"
    );
  }
}
