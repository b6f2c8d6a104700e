use crate::error::ReifyError;
use crate::error::TransformErrorType;
use crate::transform_source;
use crate::Options;

fn rewrite(src: &str) -> String {
  transform_source(src, &Options::default()).unwrap()
}

fn rewrite_body(src: &str) -> String {
  let out = rewrite(src);
  out
    .strip_prefix("import t from \"flow-runtime\";\n")
    .unwrap_or_else(|| panic!("missing runtime import in:\n{}", out))
    .to_string()
}

#[test]
fn reuses_declared_binding_for_assignments() {
  assert_eq!(
    rewrite_body("let x: number = 1;\nx = 2;\nx = 3;"),
    "let _xType = t.number(), x = _xType.assert(1);\nx = _xType.assert(2);\nx = _xType.assert(3);\n"
  );
}

#[test]
fn constants_assert_once() {
  assert_eq!(
    rewrite_body("const x: string = f();\nconst { a }: { a: number } = g();"),
    "const x = t.string().assert(f());\nconst { a } = t.object(t.property(\"a\", t.number())).assert(g());\n"
  );
}

#[test]
fn shadowing_declaration_hides_outer_binding() {
  assert_eq!(
    rewrite_body("let x: number = 1;\nfunction f() {\n  let x = \"s\";\n  x = \"t\";\n}\nx = 2;"),
    "let _xType = t.number(), x = _xType.assert(1);\nfunction f() {\n  let x = \"s\";\n  x = \"t\";\n}\nx = _xType.assert(2);\n"
  );
}

#[test]
fn compound_assignment_is_untouched() {
  assert_eq!(
    rewrite_body("let n: number = 1;\nn += 2;"),
    "let _nType = t.number(), n = _nType.assert(1);\nn += 2;\n"
  );
}

#[test]
fn casts() {
  assert_eq!(
    rewrite_body("const z = (f(): number);"),
    "const z = t.number().assert(f());\n"
  );
  assert_eq!(
    rewrite_body("let y = f();\n(y: string);"),
    "let y = f();\nlet _yType = t.string();\n_yType.assert(y);\n"
  );
  assert_eq!(
    rewrite_body("let y = f();\n(y: string);\n(y: number);"),
    "let y = f();\nlet _yType = t.string();\n_yType.assert(y);\n_yType = t.number();\n_yType.assert(y);\n"
  );
}

#[test]
fn cast_in_single_statement_slot_gets_a_block() {
  assert_eq!(
    rewrite_body("if (c) g((y: string));"),
    "if (c) {\n  let _yType = t.string();\n  g(_yType.assert(y));\n}\n"
  );
}

#[test]
fn caught_error_cast_is_a_guard() {
  assert_eq!(
    rewrite_body("try {\n  f();\n} catch (e) {\n  (e: TypeError);\n}"),
    "try {\n  f();\n} catch (e) {\n  if (!t.ref(TypeError).match(e)) throw e;\n}\n"
  );
}

#[test]
fn casts_are_only_erased_when_disabled() {
  let options = Options::default().with_assert_casts(false);
  assert_eq!(
    transform_source("const z = (y: number);", &options).unwrap(),
    "import t from \"flow-runtime\";\nconst z = y;\n"
  );
}

#[test]
fn function_header() {
  assert_eq!(
    rewrite_body("function add(a: number, b?: string, ...rest: Array<number>): number {\n  return a;\n}"),
    concat!(
      "function add(a, b, ...rest) {\n",
      "  let _aType = t.number();\n",
      "  let _bType = t.string();\n",
      "  let _restType = t.array(t.number());\n",
      "  const _returnType = t.return(t.number());\n",
      "  t.param(\"a\", _aType).assert(a);\n",
      "  t.param(\"b\", _bType, true).assert(b);\n",
      "  t.rest(\"rest\", _restType).assert(rest);\n",
      "  return _returnType.assert(a);\n",
      "}\n",
    )
  );
}

#[test]
fn parameter_binding_checks_reassignment() {
  assert_eq!(
    rewrite_body("function f(a: number) {\n  a = 2;\n}"),
    "function f(a) {\n  let _aType = t.number();\n  t.param(\"a\", _aType).assert(a);\n  a = _aType.assert(2);\n}\n"
  );
}

#[test]
fn function_type_parameters() {
  assert_eq!(
    rewrite_body("function id<T>(x: T): T {\n  return x;\n}"),
    concat!(
      "function id(x) {\n",
      "  const T = t.typeParameter(\"T\");\n",
      "  let _xType = T;\n",
      "  const _returnType = t.return(T);\n",
      "  t.param(\"x\", _xType).assert(x);\n",
      "  return _returnType.assert(x);\n",
      "}\n",
    )
  );
}

#[test]
fn destructured_parameter_reads_arguments() {
  assert_eq!(
    rewrite_body("function h({ a }: { a: number } = {}) {}"),
    "function h({ a } = {}) {\n  if (arguments[0] !== undefined) t.param(\"arguments[0]\", t.object(t.property(\"a\", t.number()))).assert(arguments[0]);\n}\n"
  );
}

#[test]
fn arrow_destructured_parameter_is_shadowed() {
  assert_eq!(
    rewrite_body("const g = ({ a }: { a: number }) => a;"),
    concat!(
      "const g = (_arg0) => {\n",
      "  t.param(\"_arg0\", t.object(t.property(\"a\", t.number()))).assert(_arg0);\n",
      "  let { a } = _arg0;\n",
      "  return a;\n",
      "};\n",
    )
  );
}

#[test]
fn arrow_expression_body_becomes_block() {
  assert_eq!(
    rewrite_body("const f = (x: number): string => String(x);"),
    concat!(
      "const f = (x) => {\n",
      "  let _xType = t.number();\n",
      "  const _returnType = t.return(t.string());\n",
      "  t.param(\"x\", _xType).assert(x);\n",
      "  return _returnType.assert(String(x));\n",
      "};\n",
    )
  );
}

#[test]
fn async_return_checks_resolved_value() {
  assert_eq!(
    rewrite_body("async function f(): Promise<number> {\n  return 1;\n}"),
    "async function f() {\n  const _returnType = t.return(t.number());\n  return _returnType.assert(1);\n}\n"
  );
}

#[test]
fn generator_splits_yield_return_and_next() {
  assert_eq!(
    rewrite_body("function* gen(): Generator<number, string, boolean> {\n  const x = yield 1;\n  yield 2;\n  return \"done\";\n}"),
    concat!(
      "function* gen() {\n",
      "  const _yieldType = t.number();\n",
      "  const _nextType = t.boolean();\n",
      "  const _returnType = t.return(t.string());\n",
      "  const x = _nextType.assert(yield _yieldType.assert(1));\n",
      "  yield _yieldType.assert(2);\n",
      "  return _returnType.assert(\"done\");\n",
      "}\n",
    )
  );
}

#[test]
fn delegated_yield_is_wrapped() {
  assert_eq!(
    rewrite_body("function* g(): Iterator<number> {\n  yield* other();\n  return 1;\n}"),
    "function* g() {\n  const _yieldType = t.number();\n  yield* t.wrapIterator(_yieldType)(other());\n  return 1;\n}\n"
  );
}

#[test]
fn nested_function_has_its_own_return_check() {
  assert_eq!(
    rewrite_body("function f(): number {\n  const g = function () {\n    return \"x\";\n  };\n  return 1;\n}"),
    concat!(
      "function f() {\n",
      "  const _returnType = t.return(t.number());\n",
      "  const g = function () {\n",
      "    return \"x\";\n",
      "  };\n",
      "  return _returnType.assert(1);\n",
      "}\n",
    )
  );
}

#[test]
fn class_type_parameters_without_superclass() {
  assert_eq!(
    rewrite_body("class Box<T> {\n  value: T;\n}"),
    concat!(
      "class Box {\n",
      "  constructor() {\n",
      "    const _typeParameters = { T: t.typeParameter(\"T\") };\n",
      "    Object.defineProperty(this, t.TypeParametersSymbol, { value: _typeParameters });\n",
      "  }\n",
      "  @t.decorate(function () {\n",
      "    return this[t.TypeParametersSymbol].T;\n",
      "  })\n",
      "  value;\n",
      "}\n",
    )
  );
}

#[test]
fn subclass_binds_after_super_call() {
  assert_eq!(
    rewrite_body("class B<T> extends A<T> {\n  constructor() {\n    super();\n  }\n}"),
    concat!(
      "class B extends A {\n",
      "  constructor() {\n",
      "    super();\n",
      "    const _typeParameters = { T: t.typeParameter(\"T\") };\n",
      "    if (this[t.TypeParametersSymbol]) {\n",
      "      Object.assign(this[t.TypeParametersSymbol], _typeParameters);\n",
      "    } else {\n",
      "      Object.defineProperty(this, t.TypeParametersSymbol, { value: _typeParameters });\n",
      "    }\n",
      "    t.bindTypeParameters(this, this[t.TypeParametersSymbol].T);\n",
      "  }\n",
      "}\n",
    )
  );
}

#[test]
fn subclass_constructor_checks_parameters_after_super() {
  assert_eq!(
    rewrite_body("class B extends A<number> {\n  constructor(x: number) {\n    super(x);\n  }\n}"),
    concat!(
      "class B extends A {\n",
      "  constructor(x) {\n",
      "    super(x);\n",
      "    t.bindTypeParameters(this, t.number());\n",
      "    let _xType = t.number();\n",
      "    t.param(\"x\", _xType).assert(x);\n",
      "  }\n",
      "}\n",
    )
  );
}

#[test]
fn subclass_preconditions() {
  let err = transform_source("class B<T> extends A {}", &Options::default()).unwrap_err();
  let ReifyError::Transform(err) = err else {
    panic!("expected transform error, got {:?}", err);
  };
  assert_eq!(err.typ, TransformErrorType::MissingConstructor);
  assert_eq!(err.class_name.as_deref(), Some("B"));

  let err = transform_source(
    "class B<T> extends A {\n  constructor() {\n    f();\n  }\n}",
    &Options::default(),
  )
  .unwrap_err();
  assert_eq!(err.code(), "RT0002");
}

#[test]
fn eager_field_decoration() {
  assert_eq!(
    rewrite_body("class A {\n  n: number = 1;\n}"),
    "class A {\n  @t.decorate(t.number())\n  n = 1;\n}\n"
  );
}

#[test]
fn field_referring_to_local_class_is_deferred() {
  assert_eq!(
    rewrite_body("class Node {\n  next: ?Node;\n}"),
    "class Node {\n  @t.decorate(function () {\n    return t.nullable(t.ref(Node));\n  })\n  next;\n}\n"
  );
}

#[test]
fn aliases_and_type_imports() {
  assert_eq!(
    rewrite(
      "import type { User } from \"./user\";\nimport { type Role, load } from \"./role\";\nexport type Id = string;\nexport type { Id as Key };"
    ),
    concat!(
      "import t from \"flow-runtime\";\n",
      "import { User } from \"./user\";\n",
      "import { Role, load } from \"./role\";\n",
      "export const Id = t.type(\"Id\", t.string());\n",
      "export { Id as Key };\n",
    )
  );
}

#[test]
fn interface_becomes_binding() {
  assert_eq!(
    rewrite_body("interface Named {\n  name: string;\n}"),
    "const Named = t.type(\"Named\", t.object(t.property(\"name\", t.string())));\n"
  );
}

#[test]
fn import_follows_directives_and_is_reused() {
  assert_eq!(
    rewrite("\"use strict\";\nconst n: number = 1;"),
    "\"use strict\";\nimport t from \"flow-runtime\";\nconst n = t.number().assert(1);\n"
  );
  assert_eq!(
    rewrite("import rt from \"flow-runtime\";\nconst n: number = 1;"),
    "import rt from \"flow-runtime\";\nconst n = rt.number().assert(1);\n"
  );
}

#[test]
fn custom_library() {
  let options = Options::default()
    .with_library_id("types")
    .with_library_module("my-runtime");
  assert_eq!(
    transform_source("const n: number = 1;", &options).unwrap(),
    "import types from \"my-runtime\";\nconst n = types.number().assert(1);\n"
  );
}

#[test]
fn unannotated_code_is_unchanged() {
  let src = "function f(a, b) {\n  if (a) {\n    return a + b;\n  }\n  return b;\n}\n";
  assert_eq!(rewrite_body(src), src);
}

#[test]
fn loop_heads_only_erase() {
  assert_eq!(
    rewrite_body("for (const k: string in o) {\n  k;\n}"),
    "for (const k in o) {\n  k;\n}\n"
  );
}

#[test]
fn fresh_names_do_not_collide() {
  assert_eq!(
    rewrite_body("let _xType = 0;\nlet x: number = 1;"),
    "let _xType = 0;\nlet _xType2 = t.number(), x = _xType2.assert(1);\n"
  );
}

#[test]
fn redeclared_name_reassigns_its_binding() {
  assert_eq!(
    rewrite_body("function f(x: number) {\n  var x: string = \"a\";\n}"),
    concat!(
      "function f(x) {\n",
      "  let _xType = t.number();\n",
      "  t.param(\"x\", _xType).assert(x);\n",
      "  _xType = t.string();\n",
      "  var x = _xType.assert(\"a\");\n",
      "}\n",
    )
  );
  assert_eq!(
    rewrite_body("var y = f();\n(y: string);\nvar y: number = 1;"),
    concat!(
      "var y = f();\n",
      "let _yType = t.string();\n",
      "_yType.assert(y);\n",
      "_yType = t.number();\n",
      "var y = _yType.assert(1);\n",
    )
  );
}

#[test]
fn labelled_loop_keeps_its_label() {
  assert_eq!(
    rewrite_body("outer: for (const a of (xs: Array<number>)) {\n  for (const b of a) {\n    continue outer;\n  }\n}"),
    concat!(
      "let _xsType = t.array(t.number());\n",
      "outer: for (const a of _xsType.assert(xs)) {\n",
      "  for (const b of a) {\n",
      "    continue outer;\n",
      "  }\n",
      "}\n",
    )
  );
}

#[test]
fn cast_in_parameter_default_is_checked_in_place() {
  assert_eq!(
    rewrite_body("function f(a = (b: number)) {\n  return a;\n}"),
    "function f(a = t.number().assert(b)) {\n  return a;\n}\n"
  );
}

#[test]
fn resumed_value_inside_an_expression_is_checked() {
  assert_eq!(
    rewrite_body("function* g(): Generator<number, void, string> {\n  log(yield 1);\n}"),
    concat!(
      "function* g() {\n",
      "  const _yieldType = t.number();\n",
      "  const _nextType = t.string();\n",
      "  const _returnType = t.return(t.void());\n",
      "  log(_nextType.assert(yield _yieldType.assert(1)));\n",
      "}\n",
    )
  );
}

#[test]
fn super_call_must_run_in_the_constructor_body() {
  for body in ["const go = () => super();\n    go();", "if (c) super();"] {
    let src = format!("class B<T> extends A {{\n  constructor() {{\n    {}\n  }}\n}}", body);
    let err = transform_source(&src, &Options::default()).unwrap_err();
    assert_eq!(err.code(), "RT0002", "for {:?}", body);
  }
}
