use reify_js::error::ReifyError;
use reify_js::transform_bytes;
use reify_js::transform_source;
use reify_js::Options;
use similar::ChangeTag;
use similar::TextDiff;

#[track_caller]
fn check(src: &str, expected: &str) {
  let actual = transform_source(src, &Options::default()).unwrap();
  if actual == expected {
    return;
  };
  let diff = TextDiff::from_lines(expected, actual.as_str());
  let mut rendered = String::new();
  for change in diff.iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    rendered.push_str(sign);
    rendered.push_str(change.as_str().unwrap_or(""));
    if change.missing_newline() {
      rendered.push('\n');
    };
  }
  panic!("output differs from expected (-expected +actual):\n{}", rendered);
}

#[test]
fn module_with_every_rule() {
  check(
    r#"// @flow
import type { Id } from "./ids";

type Point = { x: number, y: number };

export function distance(a: Point, b: Point): number {
  const dx: number = a.x - b.x;
  let dy: number = a.y - b.y;
  dy = dy * dy;
  return Math.sqrt(dx * dx + dy);
}

export class Registry<T> {
  items: Array<T> = [];
  count: number = 0;

  add(item: T): void {
    this.items.push(item);
  }
}

function lookup(id: Id) {
  try {
    return find(id);
  } catch (err) {
    (err: RangeError);
    return null;
  }
}
"#,
    r#"// @flow
import t from "flow-runtime";
import { Id } from "./ids";
const Point = t.type("Point", t.object(t.property("x", t.number()), t.property("y", t.number())));
export function distance(a, b) {
  let _aType = Point;
  let _bType = Point;
  const _returnType = t.return(t.number());
  t.param("a", _aType).assert(a);
  t.param("b", _bType).assert(b);
  const dx = t.number().assert(a.x - b.x);
  let _dyType = t.number(), dy = _dyType.assert(a.y - b.y);
  dy = _dyType.assert(dy * dy);
  return _returnType.assert(Math.sqrt(dx * dx + dy));
}
export class Registry {
  constructor() {
    const _typeParameters = { T: t.typeParameter("T") };
    Object.defineProperty(this, t.TypeParametersSymbol, { value: _typeParameters });
  }
  @t.decorate(function () {
    return t.array(this[t.TypeParametersSymbol].T);
  })
  items = [];
  @t.decorate(t.number())
  count = 0;
  add(item) {
    let _itemType = this[t.TypeParametersSymbol].T;
    const _returnType2 = t.return(t.void());
    t.param("item", _itemType).assert(item);
    this.items.push(item);
  }
}
function lookup(id) {
  let _idType = Id;
  t.param("id", _idType).assert(id);
  try {
    return find(id);
  } catch (err) {
    if (!t.ref(RangeError).match(err)) throw err;
    return null;
  }
}
"#,
  );
}

#[test]
fn statement_order_is_preserved() {
  check(
    "let a: number = f();\nlet b: string = g();\n(a: number);\nb = h();\n",
    concat!(
      "import t from \"flow-runtime\";\n",
      "let _aType = t.number(), a = _aType.assert(f());\n",
      "let _bType = t.string(), b = _bType.assert(g());\n",
      "_aType = t.number();\n",
      "_aType.assert(a);\n",
      "b = _bType.assert(h());\n",
    ),
  );
}

#[test]
fn generic_alias_and_reference() {
  check(
    "type Box<T> = { value: T };\nconst b: Box<number> = make();\n",
    concat!(
      "import t from \"flow-runtime\";\n",
      "const Box = t.type(\"Box\", (Box) => {\n",
      "  const T = Box.typeParameter(\"T\");\n",
      "  return t.object(t.property(\"value\", T));\n",
      "});\n",
      "const b = t.ref(Box, t.number()).assert(make());\n",
    ),
  );
}

#[test]
fn blocks_keep_bindings_local() {
  check(
    "if (ok) {\n  let n: number = 1;\n  n = 2;\n} else {\n  let n: number = 3;\n}\n",
    concat!(
      "import t from \"flow-runtime\";\n",
      "if (ok) {\n",
      "  let _nType = t.number(), n = _nType.assert(1);\n",
      "  n = _nType.assert(2);\n",
      "} else {\n",
      "  let _nType2 = t.number(), n = _nType2.assert(3);\n",
      "}\n",
    ),
  );
}

#[test]
fn output_reparses_to_the_same_text() {
  let src = "const f = async (a, { b, c = 2 }, ...rest) => {\n  for (const x of rest) {\n    await a(x ?? b);\n  }\n  return c;\n};\n";
  let once = transform_source(src, &Options::default()).unwrap();
  // The second pass reuses the runtime import the first one added.
  let twice = transform_source(&once, &Options::default()).unwrap();
  assert_eq!(twice, once);
}

#[test]
fn syntax_errors_carry_codes() {
  let err = transform_source("let x = ;", &Options::default()).unwrap_err();
  assert!(matches!(err, ReifyError::Syntax(_)));
  assert!(err.code().starts_with("RS"));
}

#[test]
fn invalid_utf8_is_rejected() {
  let err = transform_bytes(b"let a = \"\xff\";", &Options::default()).unwrap_err();
  assert_eq!(err.code(), "RE0001");
  assert_eq!(err.loc().0, 9);
}

#[test]
fn options_from_json() {
  let options = Options::from_json(r#"{ "libraryId": "rt", "assertCasts": false }"#).unwrap();
  assert_eq!(options.library_module, "flow-runtime");
  let out = transform_source("const x = (y: number);\nlet z: string;", &options).unwrap();
  assert_eq!(
    out,
    "import rt from \"flow-runtime\";\nconst x = y;\nlet _zType = rt.string(), z;\n"
  );
}

#[test]
fn annotated_var_is_checked() {
  check(
    "var x: string = \"a\";\nx = \"b\";\n",
    concat!(
      "import t from \"flow-runtime\";\n",
      "var _xType = t.string(), x = _xType.assert(\"a\");\n",
      "x = _xType.assert(\"b\");\n",
    ),
  );
}

#[test]
fn leading_comments_are_kept() {
  check(
    "// keep\n/* license */\nfunction f(a) {\n  return a;\n}\n",
    "// keep\n/* license */\nimport t from \"flow-runtime\";\nfunction f(a) {\n  return a;\n}\n",
  );
}
