use ast::Ast;
use error::ReifyError;
use error::SyntaxResult;
use error::TransformResult;
use lex::Lexer;
use parse::Parser;
use tracing::debug_span;

pub mod ast;
pub mod char;
pub mod emit;
pub mod error;
pub mod lex;
pub mod loc;
pub mod operator;
pub mod options;
pub mod parse;
pub mod resolve;
pub mod token;
pub mod transform;
pub mod type_expr;
pub mod type_params;

pub use options::Options;
pub use type_expr::RuntimeTypeBuilder;
pub use type_expr::TypeExprBuilder;

pub fn parse(source: &str) -> SyntaxResult<Ast> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  parser.parse_program()?;
  Ok(parser.into_ast())
}

/// Rewrites a parsed program in place: annotations are erased and every annotated binding,
/// parameter, return value and cast is checked at runtime through the runtime type library.
pub fn transform(ast: &mut Ast, options: &Options) -> TransformResult<()> {
  transform_with(ast, &RuntimeTypeBuilder::new(), options)
}

/// Like [`transform`], compiling annotations through a custom builder.
pub fn transform_with(
  ast: &mut Ast,
  types: &dyn TypeExprBuilder,
  options: &Options,
) -> TransformResult<()> {
  let entities = {
    let _span = debug_span!("reify.resolve").entered();
    resolve::resolve(ast)
  };
  let _span = debug_span!("reify.transform").entered();
  transform::transform_with(ast, &entities, types, options)
}

/// Parses, rewrites and prints a program. Comments before the first token are kept; all others
/// are dropped.
///
/// # Examples
///
/// ```
/// use reify_js::{transform_source, Options};
///
/// let out = transform_source("const x: number = 1;", &Options::default()).unwrap();
/// assert_eq!(out, "import t from \"flow-runtime\";\nconst x = t.number().assert(1);\n");
/// ```
pub fn transform_source(source: &str, options: &Options) -> Result<String, ReifyError> {
  let mut ast = parse(source)?;
  transform(&mut ast, options)?;
  let _span = debug_span!("reify.emit").entered();
  let mut out = String::new();
  for comment in lex::leading_comments(source) {
    out.push_str(comment);
    out.push('\n');
  }
  out.push_str(&emit::emit(&ast));
  Ok(out)
}

/// [`transform_source`] for raw bytes, which must be UTF-8.
pub fn transform_bytes(source: &[u8], options: &Options) -> Result<String, ReifyError> {
  let source = std::str::from_utf8(source).map_err(ReifyError::InvalidUtf8)?;
  transform_source(source, options)
}
