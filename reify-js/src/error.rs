use crate::loc::Loc;
use crate::token::TT;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use derive_more::derive::From;
use std::error::Error;
use std::fmt::Display;
use std::str::Utf8Error;

/// A stable classification of syntax errors produced by the parser.
///
/// Diagnostic codes (prefix `RS`) are assigned per variant and are stable:
/// - `RS0001`: [`SyntaxErrorType::ExpectedNotFound`]
/// - `RS0002`: [`SyntaxErrorType::ExpectedSyntax`]
/// - `RS0003`: [`SyntaxErrorType::InvalidAssigmentTarget`]
/// - `RS0004`: [`SyntaxErrorType::InvalidCharacterEscape`]
/// - `RS0005`: [`SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters`]
/// - `RS0006`: [`SyntaxErrorType::LineTerminatorAfterThrow`]
/// - `RS0007`: [`SyntaxErrorType::LineTerminatorInRegex`]
/// - `RS0008`: [`SyntaxErrorType::LineTerminatorInString`]
/// - `RS0009`: [`SyntaxErrorType::MalformedLiteralNumber`]
/// - `RS0010`: [`SyntaxErrorType::RequiredTokenNotFound`]
/// - `RS0011`: [`SyntaxErrorType::TryStatementHasNoCatchOrFinally`]
/// - `RS0012`: [`SyntaxErrorType::UnexpectedEnd`]
/// - `RS0013`: [`SyntaxErrorType::Unsupported`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedNotFound,
  ExpectedSyntax(&'static str),
  InvalidAssigmentTarget,
  InvalidCharacterEscape,
  LineTerminatorAfterArrowFunctionParameters,
  LineTerminatorAfterThrow,
  LineTerminatorInRegex,
  LineTerminatorInString,
  MalformedLiteralNumber,
  RequiredTokenNotFound(TT),
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
  Unsupported(&'static str),
}

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::ExpectedNotFound => "RS0001",
      SyntaxErrorType::ExpectedSyntax(_) => "RS0002",
      SyntaxErrorType::InvalidAssigmentTarget => "RS0003",
      SyntaxErrorType::InvalidCharacterEscape => "RS0004",
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => "RS0005",
      SyntaxErrorType::LineTerminatorAfterThrow => "RS0006",
      SyntaxErrorType::LineTerminatorInRegex => "RS0007",
      SyntaxErrorType::LineTerminatorInString => "RS0008",
      SyntaxErrorType::MalformedLiteralNumber => "RS0009",
      SyntaxErrorType::RequiredTokenNotFound(_) => "RS0010",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "RS0011",
      SyntaxErrorType::UnexpectedEnd => "RS0012",
      SyntaxErrorType::Unsupported(_) => "RS0013",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    match self {
      SyntaxErrorType::ExpectedNotFound => "expected token not found".into(),
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::InvalidAssigmentTarget => "invalid assignment target".into(),
      SyntaxErrorType::InvalidCharacterEscape => "invalid character escape".into(),
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => {
        "line terminator not allowed after arrow function parameters".into()
      }
      SyntaxErrorType::LineTerminatorAfterThrow => {
        "line terminator not allowed after `throw`".into()
      }
      SyntaxErrorType::LineTerminatorInRegex => "line terminator not allowed in regex".into(),
      SyntaxErrorType::LineTerminatorInString => "line terminator not allowed in string".into(),
      SyntaxErrorType::MalformedLiteralNumber => "malformed number literal".into(),
      SyntaxErrorType::RequiredTokenNotFound(tt) => match actual_token {
        Some(actual) => format!("expected {:?} but found {:?}", tt, actual),
        None => format!("expected {:?}", tt),
      },
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement requires a catch or finally clause".into()
      }
      SyntaxErrorType::UnexpectedEnd => "unexpected end of input".into(),
      SyntaxErrorType::Unsupported(what) => format!("unsupported syntax: {}", what),
    }
  }
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}: {}",
      self.typ.code(),
      self.typ.message(self.actual_token)
    )
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Failures raised while rewriting an already parsed tree.
///
/// Diagnostic codes (prefix `RT`):
/// - `RT0001`: [`TransformErrorType::MissingConstructor`]
/// - `RT0002`: [`TransformErrorType::MissingSuperCall`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TransformErrorType {
  /// A subclass with type parameters or supertype arguments declares no constructor.
  MissingConstructor,
  /// A subclass constructor never calls `super(...)` at its top level.
  MissingSuperCall,
}

impl TransformErrorType {
  pub fn code(&self) -> &'static str {
    match self {
      TransformErrorType::MissingConstructor => "RT0001",
      TransformErrorType::MissingSuperCall => "RT0002",
    }
  }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TransformError {
  pub typ: TransformErrorType,
  pub loc: Loc,
  pub class_name: Option<String>,
}

impl TransformError {
  pub fn new(typ: TransformErrorType, loc: Loc, class_name: Option<String>) -> TransformError {
    TransformError {
      typ,
      loc,
      class_name,
    }
  }
}

impl Debug for TransformError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for TransformError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let class = self.class_name.as_deref().unwrap_or("<anonymous>");
    match self.typ {
      TransformErrorType::MissingConstructor => write!(
        f,
        "{}: class {} has runtime type parameters but no constructor to bind them in",
        self.typ.code(),
        class
      ),
      TransformErrorType::MissingSuperCall => write!(
        f,
        "{}: constructor of class {} never calls super()",
        self.typ.code(),
        class
      ),
    }
  }
}

impl Error for TransformError {}

pub type TransformResult<T> = Result<T, TransformError>;

/// Any failure of the source-to-source pipeline.
#[derive(Clone, Debug, From, PartialEq, Eq)]
pub enum ReifyError {
  Syntax(SyntaxError),
  Transform(TransformError),
  InvalidUtf8(Utf8Error),
}

impl ReifyError {
  pub fn loc(&self) -> Loc {
    match self {
      ReifyError::Syntax(e) => e.loc,
      ReifyError::Transform(e) => e.loc,
      ReifyError::InvalidUtf8(e) => Loc(e.valid_up_to(), e.valid_up_to()),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ReifyError::Syntax(e) => e.typ.code(),
      ReifyError::Transform(e) => e.typ.code(),
      ReifyError::InvalidUtf8(_) => "RE0001",
    }
  }
}

impl Display for ReifyError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      ReifyError::Syntax(e) => Display::fmt(e, f),
      ReifyError::Transform(e) => Display::fmt(e, f),
      ReifyError::InvalidUtf8(e) => write!(f, "RE0001: source is not valid UTF-8: {}", e),
    }
  }
}

impl Error for ReifyError {}
