use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::lex::KEYWORDS_MAPPING;
use crate::loc::Loc;
use ahash::HashSet;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Token types. Flow annotations reuse JavaScript punctuation, so `type`, `interface` and
/// `implements` are the only additions to the keyword set; `?`, `|`, `&` and `{|` `|}` are lexed as
/// ordinary punctuators and combined by the type parser.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum TT {
  EOF,
  // The lexer never fails; unlexable input becomes this token and the parser rejects it.
  Invalid,

  // Trivia, consumed by the lexer and never handed to the parser.
  CommentMultiline,
  CommentSingle,
  LineTerminator,
  Whitespace,

  Ampersand,
  AmpersandAmpersand,
  AmpersandAmpersandEquals,
  AmpersandEquals,
  Asterisk,
  AsteriskAsterisk,
  AsteriskAsteriskEquals,
  AsteriskEquals,
  At,
  Bar,
  BarBar,
  BarBarEquals,
  BarEquals,
  BraceClose,
  BraceOpen,
  BracketClose,
  BracketOpen,
  Caret,
  CaretEquals,
  ChevronLeft,
  ChevronLeftChevronLeft,
  ChevronLeftChevronLeftEquals,
  ChevronLeftEquals,
  ChevronRight,
  ChevronRightChevronRight,
  ChevronRightChevronRightChevronRight,
  ChevronRightChevronRightChevronRightEquals,
  ChevronRightChevronRightEquals,
  ChevronRightEquals,
  Colon,
  Comma,
  Dot,
  DotDotDot,
  Equals,
  EqualsChevronRight,
  EqualsEquals,
  EqualsEqualsEquals,
  Exclamation,
  ExclamationEquals,
  ExclamationEqualsEquals,
  Hyphen,
  HyphenEquals,
  HyphenHyphen,
  ParenthesisClose,
  ParenthesisOpen,
  Percent,
  PercentEquals,
  Plus,
  PlusEquals,
  PlusPlus,
  Question,
  QuestionDot,
  QuestionQuestion,
  QuestionQuestionEquals,
  Semicolon,
  Slash,
  SlashEquals,
  Tilde,

  Identifier,
  LiteralFalse,
  LiteralNull,
  LiteralNumber,
  LiteralRegex,
  LiteralString,
  LiteralTemplatePartString,
  LiteralTemplatePartStringEnd,
  LiteralTrue,
  PrivateMember,

  // Reserved words.
  KeywordAwait,
  KeywordBreak,
  KeywordCase,
  KeywordCatch,
  KeywordClass,
  KeywordConst,
  KeywordContinue,
  KeywordDebugger,
  KeywordDefault,
  KeywordDelete,
  KeywordDo,
  KeywordElse,
  KeywordEnum,
  KeywordExport,
  KeywordExtends,
  KeywordFinally,
  KeywordFor,
  KeywordFunction,
  KeywordIf,
  KeywordImport,
  KeywordIn,
  KeywordInstanceof,
  KeywordNew,
  KeywordReturn,
  KeywordSuper,
  KeywordSwitch,
  KeywordThis,
  KeywordThrow,
  KeywordTry,
  KeywordTypeof,
  KeywordVar,
  KeywordVoid,
  KeywordWhile,
  KeywordWith,
  KeywordYield,

  // Contextual keywords, also valid as binding and reference names.
  KeywordAs,
  KeywordAsync,
  KeywordFrom,
  KeywordGet,
  KeywordImplements,
  KeywordInterface,
  KeywordLet,
  KeywordOf,
  KeywordSet,
  KeywordStatic,
  KeywordType,
}

pub static UNRESERVED_KEYWORDS: Lazy<HashSet<TT>> = Lazy::new(|| {
  [
    TT::KeywordAs,
    TT::KeywordAsync,
    TT::KeywordFrom,
    TT::KeywordGet,
    TT::KeywordImplements,
    TT::KeywordInterface,
    TT::KeywordLet,
    TT::KeywordOf,
    TT::KeywordSet,
    TT::KeywordStatic,
    TT::KeywordType,
  ]
  .into_iter()
  .collect()
});

impl TT {
  /// Tokens that may appear as a property name after `.` or as an object key.
  pub fn is_identifier_name(self) -> bool {
    self == TT::Identifier || KEYWORDS_MAPPING.contains_key(&self)
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Token {
  pub loc: Loc,
  // Whether one or more whitespace characters appear immediately before this token, and at least
  // one of those whitespace characters is a line terminator.
  pub preceded_by_line_terminator: bool,
  pub typ: TT,
}

impl Token {
  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    self.loc.error(typ, Some(self.typ))
  }
}
