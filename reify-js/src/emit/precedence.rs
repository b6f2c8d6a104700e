use crate::ast::Ast;
use crate::ast::NodeId;
use crate::ast::Syntax;
use crate::operator::Associativity;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;

/// Precedence for optional chaining, member access and call-like operators.
pub const CALL_MEMBER_PRECEDENCE: u8 = 18;
/// Precedence for atomic expressions (identifiers, literals, function expressions).
pub const PRIMARY_PRECEDENCE: u8 = 19;
/// Arrow functions bind like assignments, so they are parenthesised as operands.
pub const ARROW_FUNCTION_PRECEDENCE: u8 = 2;
/// Elements of argument lists, array and object literals.
pub const ELEMENT_PRECEDENCE: u8 = 2;

#[derive(Clone, Copy, Debug)]
pub enum Side {
  Left,
  Right,
}

pub fn operator_prec(op: OperatorName) -> u8 {
  OPERATORS[&op].precedence
}

pub fn child_min_prec_for_binary(op: OperatorName, side: Side) -> u8 {
  let operator = &OPERATORS[&op];
  match (operator.associativity, side) {
    (Associativity::Left, Side::Left) | (Associativity::Right, Side::Right) => operator.precedence,
    _ => operator.precedence + 1,
  }
}

pub fn expr_prec(ast: &Ast, id: NodeId) -> u8 {
  match ast.stx(id) {
    Syntax::Binary { op, .. } | Syntax::Unary { op, .. } | Syntax::Postfix { op, .. } => {
      operator_prec(*op)
    }
    Syntax::Assign { .. } | Syntax::AssignPat { .. } => operator_prec(OperatorName::Assignment),
    Syntax::Yield { .. } => operator_prec(OperatorName::Yield),
    Syntax::Cond { .. } => operator_prec(OperatorName::Conditional),
    Syntax::Func { arrow: true, .. } => ARROW_FUNCTION_PRECEDENCE,
    Syntax::Call { .. }
    | Syntax::New { .. }
    | Syntax::Member { .. }
    | Syntax::ComputedMember { .. }
    | Syntax::TaggedTemplate { .. } => CALL_MEMBER_PRECEDENCE,
    Syntax::TypeCast { expr, .. } => expr_prec(ast, *expr),
    _ => PRIMARY_PRECEDENCE,
  }
}

fn is_logical(ast: &Ast, id: NodeId) -> bool {
  matches!(
    ast.stx(id),
    Syntax::Binary {
      op: OperatorName::LogicalAnd | OperatorName::LogicalOr,
      ..
    }
  )
}

/// Operands that need parentheses regardless of precedence: `??` cannot be mixed with `&&` or
/// `||`, and the base of `**` cannot be a unary expression.
pub fn binary_operand_needs_parens(ast: &Ast, op: OperatorName, side: Side, operand: NodeId) -> bool {
  match op {
    OperatorName::NullishCoalescing => is_logical(ast, operand),
    OperatorName::LogicalAnd | OperatorName::LogicalOr => matches!(
      ast.stx(operand),
      Syntax::Binary {
        op: OperatorName::NullishCoalescing,
        ..
      }
    ),
    OperatorName::Exponentiation => {
      matches!(side, Side::Left) && matches!(ast.stx(operand), Syntax::Unary { .. })
    }
    _ => false,
  }
}

/// Whether the callee of `new` contains a call that would otherwise be taken as the `new`
/// arguments, as in `new (f())()` or `new (a.b().c)()`.
pub fn new_callee_needs_parens(ast: &Ast, callee: NodeId) -> bool {
  let mut cur = callee;
  loop {
    match ast.stx(cur) {
      Syntax::Call { .. } => return true,
      Syntax::Member { object, .. } | Syntax::ComputedMember { object, .. } => cur = *object,
      Syntax::TaggedTemplate { tag, .. } => cur = *tag,
      _ => return false,
    }
  }
}

/// Whether an expression printed at the start of a statement would begin with `function`,
/// `class` or `{` and therefore be read as a declaration or block.
pub fn starts_like_declaration(ast: &Ast, id: NodeId) -> bool {
  let mut cur = id;
  loop {
    match ast.stx(cur) {
      Syntax::Func { arrow: false, .. }
      | Syntax::Class { .. }
      | Syntax::LitObj { .. }
      | Syntax::ObjPat { .. } => return true,
      Syntax::Binary { left, .. } => cur = *left,
      Syntax::Assign { target, .. } => cur = *target,
      Syntax::Cond { test, .. } => cur = *test,
      Syntax::Call { callee, .. } => cur = *callee,
      Syntax::Member { object, .. } | Syntax::ComputedMember { object, .. } => cur = *object,
      Syntax::Postfix { arg, .. } => cur = *arg,
      Syntax::TaggedTemplate { tag, .. } => cur = *tag,
      Syntax::TypeCast { expr, .. } => cur = *expr,
      _ => return false,
    }
  }
}

/// Whether an arrow function's expression body begins with `{`.
pub fn starts_with_brace(ast: &Ast, id: NodeId) -> bool {
  let mut cur = id;
  loop {
    match ast.stx(cur) {
      Syntax::LitObj { .. } | Syntax::ObjPat { .. } => return true,
      Syntax::Binary { left, .. } => cur = *left,
      Syntax::Assign { target, .. } => cur = *target,
      Syntax::Cond { test, .. } => cur = *test,
      Syntax::Call { callee, .. } => cur = *callee,
      Syntax::Member { object, .. } | Syntax::ComputedMember { object, .. } => cur = *object,
      Syntax::Postfix { arg, .. } => cur = *arg,
      Syntax::TaggedTemplate { tag, .. } => cur = *tag,
      Syntax::TypeCast { expr, .. } => cur = *expr,
      _ => return false,
    }
  }
}
