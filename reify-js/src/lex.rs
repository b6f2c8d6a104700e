use crate::char::CharFilter;
use crate::char::DIGIT;
use crate::char::DIGIT_HEX;
use crate::char::ID_CONTINUE;
use crate::char::ID_START;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use ahash::HashMap;
use aho_corasick::AhoCorasick;
use aho_corasick::AhoCorasickBuilder;
use aho_corasick::AhoCorasickKind;
use aho_corasick::Anchored;
use aho_corasick::Input;
use aho_corasick::MatchKind;
use aho_corasick::StartKind;
use core::ops::Index;
use memchr::memchr;
use memchr::memchr3;
use once_cell::sync::Lazy;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LexMode {
  SlashIsRegex,
  Standard,
  TemplateStrContinue,
}

#[derive(Copy, Clone)]
pub struct LexerCheckpoint {
  next: usize,
}

// Contains the match length.
#[derive(Copy, Clone)]
struct Match(usize);

impl Match {
  pub fn len(&self) -> usize {
    self.0
  }

  pub fn prefix(&self, n: usize) -> Match {
    debug_assert!(n <= self.len());
    Match(n)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

struct PatternMatcher {
  patterns: Vec<TT>,
  matcher: AhoCorasick,
}

impl PatternMatcher {
  pub fn new<D: AsRef<str>>(patterns: Vec<(TT, D)>) -> Self {
    let (tts, syns): (Vec<_>, Vec<_>) = patterns.into_iter().unzip();
    let byte_syns: Vec<Vec<u8>> = syns.iter().map(|s| s.as_ref().as_bytes().to_vec()).collect();
    let matcher = AhoCorasickBuilder::new()
      .start_kind(StartKind::Anchored)
      .kind(Some(AhoCorasickKind::DFA))
      .match_kind(MatchKind::LeftmostLongest)
      .build(byte_syns)
      .unwrap();
    PatternMatcher {
      patterns: tts,
      matcher,
    }
  }

  pub fn find(&self, lexer: &Lexer) -> LexResult<(TT, Match)> {
    self
      .matcher
      .find(Input::new(&lexer.source[lexer.next..]).anchored(Anchored::Yes))
      .map(|m| (self.patterns[m.pattern().as_usize()], Match(m.end())))
      .ok_or(LexNotFound)
  }
}

#[derive(Debug)]
struct LexNotFound;

type LexResult<T> = Result<T, LexNotFound>;

pub struct Lexer<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(code: &'a str) -> Lexer<'a> {
    Lexer {
      source: code,
      next: 0,
    }
  }

  pub fn next(&self) -> usize {
    self.next
  }

  pub fn source(&self) -> &'a str {
    self.source
  }

  fn end(&self) -> usize {
    self.source.len()
  }

  fn remaining(&self) -> usize {
    self.end() - self.next
  }

  fn eof_range(&self) -> Loc {
    Loc(self.end(), self.end())
  }

  fn at_end(&self) -> bool {
    self.next >= self.end()
  }

  fn peek(&self, n: usize) -> LexResult<char> {
    self.peek_or_eof(n).ok_or(LexNotFound)
  }

  fn peek_or_eof(&self, n: usize) -> Option<char> {
    self.source[self.next..].chars().nth(n)
  }

  /// Rewinds to a token boundary the parser buffered earlier.
  pub fn set_next(&mut self, next: usize) {
    self.next = next;
  }

  pub fn checkpoint(&self) -> LexerCheckpoint {
    LexerCheckpoint { next: self.next }
  }

  pub fn since_checkpoint(&self, checkpoint: LexerCheckpoint) -> Loc {
    Loc(checkpoint.next, self.next)
  }

  fn if_char(&self, c: char) -> Match {
    match self.source[self.next..].chars().next() {
      Some(first) if first == c => Match(c.len_utf8()),
      _ => Match(0),
    }
  }

  fn through_char_or_end(&self, c: char) -> Match {
    memchr(c as u8, self.source[self.next..].as_bytes())
      .map(|pos| Match(pos + 1))
      .unwrap_or_else(|| Match(self.remaining()))
  }

  fn while_not_3_chars(&self, a: char, b: char, c: char) -> Match {
    Match(
      memchr3(a as u8, b as u8, c as u8, self.source[self.next..].as_bytes())
        .unwrap_or(self.remaining()),
    )
  }

  fn while_chars(&self, chars: &CharFilter) -> Match {
    let mut len = 0;
    for ch in self.source[self.next..].chars() {
      if chars.has(ch) {
        len += ch.len_utf8();
      } else {
        break;
      }
    }
    Match(len)
  }

  fn consume(&mut self, m: Match) -> Match {
    self.next += m.len();
    m
  }

  fn consume_next(&mut self) -> LexResult<char> {
    let c = self.peek(0)?;
    self.next += c.len_utf8();
    Ok(c)
  }

  fn skip_expect(&mut self, n: usize) {
    debug_assert!(self.next + n <= self.end());
    self.next += n;
  }

  fn drive_fallible(
    &mut self,
    preceded_by_line_terminator: bool,
    f: impl FnOnce(&mut Self) -> LexResult<TT>,
  ) -> Token {
    let cp = self.checkpoint();
    let typ = f(self).unwrap_or(TT::Invalid);
    Token {
      loc: self.since_checkpoint(cp),
      typ,
      preceded_by_line_terminator,
    }
  }
}

impl<'a> Index<Loc> for Lexer<'a> {
  type Output = str;

  fn index(&self, index: Loc) -> &Self::Output {
    &self.source[index.0..index.1]
  }
}

/// Punctuators, longest match wins. `#` starts a private name and is lexed further.
#[rustfmt::skip]
const PUNCTUATORS: [(TT, &str); 59] = [
  (TT::At, "@"), (TT::Ampersand, "&"), (TT::AmpersandAmpersand, "&&"),
  (TT::AmpersandAmpersandEquals, "&&="), (TT::AmpersandEquals, "&="), (TT::Asterisk, "*"),
  (TT::AsteriskAsterisk, "**"), (TT::AsteriskAsteriskEquals, "**="), (TT::AsteriskEquals, "*="),
  (TT::Bar, "|"), (TT::BarBar, "||"), (TT::BarBarEquals, "||="), (TT::BarEquals, "|="),
  (TT::BraceClose, "}"), (TT::BraceOpen, "{"), (TT::BracketClose, "]"), (TT::BracketOpen, "["),
  (TT::Caret, "^"), (TT::CaretEquals, "^="), (TT::ChevronLeft, "<"),
  (TT::ChevronLeftChevronLeft, "<<"), (TT::ChevronLeftChevronLeftEquals, "<<="),
  (TT::ChevronLeftEquals, "<="), (TT::ChevronRight, ">"), (TT::ChevronRightChevronRight, ">>"),
  (TT::ChevronRightChevronRightChevronRight, ">>>"),
  (TT::ChevronRightChevronRightChevronRightEquals, ">>>="),
  (TT::ChevronRightChevronRightEquals, ">>="), (TT::ChevronRightEquals, ">="), (TT::Colon, ":"),
  (TT::Comma, ","), (TT::Dot, "."), (TT::DotDotDot, "..."), (TT::Equals, "="),
  (TT::EqualsChevronRight, "=>"), (TT::EqualsEquals, "=="), (TT::EqualsEqualsEquals, "==="),
  (TT::Exclamation, "!"), (TT::ExclamationEquals, "!="), (TT::ExclamationEqualsEquals, "!=="),
  (TT::Hyphen, "-"), (TT::HyphenEquals, "-="), (TT::HyphenHyphen, "--"),
  (TT::ParenthesisClose, ")"), (TT::ParenthesisOpen, "("), (TT::Percent, "%"),
  (TT::PercentEquals, "%="), (TT::Plus, "+"), (TT::PlusEquals, "+="), (TT::PlusPlus, "++"),
  (TT::PrivateMember, "#"), (TT::Question, "?"), (TT::QuestionDot, "?."),
  (TT::QuestionQuestion, "??"), (TT::QuestionQuestionEquals, "??="), (TT::Semicolon, ";"),
  (TT::Slash, "/"), (TT::SlashEquals, "/="), (TT::Tilde, "~"),
];

/// Reserved and contextual words. `true`, `false` and `null` are included so that they are never
/// lexed as identifiers.
#[rustfmt::skip]
const WORDS: [(TT, &str); 49] = [
  (TT::KeywordAs, "as"), (TT::KeywordAsync, "async"), (TT::KeywordAwait, "await"),
  (TT::KeywordBreak, "break"), (TT::KeywordCase, "case"), (TT::KeywordCatch, "catch"),
  (TT::KeywordClass, "class"), (TT::KeywordConst, "const"), (TT::KeywordContinue, "continue"),
  (TT::KeywordDebugger, "debugger"), (TT::KeywordDefault, "default"),
  (TT::KeywordDelete, "delete"), (TT::KeywordDo, "do"), (TT::KeywordElse, "else"),
  (TT::KeywordEnum, "enum"), (TT::KeywordExport, "export"), (TT::KeywordExtends, "extends"),
  (TT::KeywordFinally, "finally"), (TT::KeywordFor, "for"), (TT::KeywordFrom, "from"),
  (TT::KeywordFunction, "function"), (TT::KeywordGet, "get"), (TT::KeywordIf, "if"),
  (TT::KeywordImplements, "implements"), (TT::KeywordImport, "import"), (TT::KeywordIn, "in"),
  (TT::KeywordInstanceof, "instanceof"), (TT::KeywordInterface, "interface"),
  (TT::KeywordLet, "let"), (TT::KeywordNew, "new"), (TT::KeywordOf, "of"),
  (TT::KeywordReturn, "return"), (TT::KeywordSet, "set"), (TT::KeywordStatic, "static"),
  (TT::KeywordSuper, "super"), (TT::KeywordSwitch, "switch"), (TT::KeywordThis, "this"),
  (TT::KeywordThrow, "throw"), (TT::KeywordTry, "try"), (TT::KeywordType, "type"),
  (TT::KeywordTypeof, "typeof"), (TT::KeywordVar, "var"), (TT::KeywordVoid, "void"),
  (TT::KeywordWhile, "while"), (TT::KeywordWith, "with"), (TT::KeywordYield, "yield"),
  (TT::LiteralFalse, "false"), (TT::LiteralNull, "null"), (TT::LiteralTrue, "true"),
];

pub static KEYWORDS_MAPPING: Lazy<HashMap<TT, &'static str>> =
  Lazy::new(|| WORDS.iter().copied().collect());

static KEYWORD_STRS: Lazy<HashMap<&'static str, TT>> =
  Lazy::new(|| WORDS.iter().map(|&(tt, text)| (text, tt)).collect());

#[rustfmt::skip]
static SIG: Lazy<PatternMatcher> = Lazy::new(|| {
  let mut patterns: Vec<(TT, String)> = PUNCTUATORS
    .iter()
    .map(|&(tt, text)| (tt, text.to_string()))
    .collect();
  for c in '0'..='9' {
    patterns.push((TT::LiteralNumber, c.to_string()));
    // Prevent `.` immediately followed by a digit from being recognised as the `.` operator.
    patterns.push((TT::LiteralNumber, format!(".{}", c)));
    // Prevent `?` immediately followed by a decimal number from being recognised as the `?.` operator.
    patterns.push((TT::Question, format!("?.{}", c)));
  }
  patterns.push((TT::LiteralString, "\"".into()));
  patterns.push((TT::LiteralString, "'".into()));
  patterns.push((TT::LiteralTemplatePartString, "`".into()));
  PatternMatcher::new(patterns)
});

static INSIG: Lazy<PatternMatcher> = Lazy::new(|| {
  PatternMatcher::new::<&str>(vec![
    (TT::LineTerminator, "\r"),
    (TT::LineTerminator, "\n"),
    (TT::LineTerminator, "\u{2028}"),
    (TT::LineTerminator, "\u{2029}"),
    (TT::Whitespace, "\x09"),
    (TT::Whitespace, "\x0b"),
    (TT::Whitespace, "\x0c"),
    (TT::Whitespace, "\x20"),
    (TT::Whitespace, "\u{00A0}"),
    (TT::Whitespace, "\u{FEFF}"),
    (TT::CommentMultiline, "/*"),
    (TT::CommentSingle, "//"),
  ])
});

/// Returns whether the comment includes a line terminator.
fn lex_multiline_comment(lexer: &mut Lexer<'_>) -> bool {
  // Consume `/*`.
  lexer.skip_expect(2);
  let rest = &lexer.source[lexer.next..];
  let (body_len, total_len) = match rest.find("*/") {
    Some(pos) => (pos, pos + 2),
    // Unterminated comments swallow the rest of the source.
    None => (rest.len(), rest.len()),
  };
  let contains_newline = rest[..body_len].contains(['\n', '\r', '\u{2028}', '\u{2029}']);
  lexer.consume(Match(total_len));
  contains_newline
}

fn lex_single_comment(lexer: &mut Lexer<'_>) {
  lexer.skip_expect(2);
  lexer.consume(lexer.through_char_or_end('\n'));
}

fn lex_identifier(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let cp = lexer.checkpoint();
  loop {
    lexer.consume(lexer.while_chars(&ID_CONTINUE));
    match lexer.peek_or_eof(0) {
      Some('\\') => {
        // Unicode escapes are kept verbatim in the identifier's text.
        lexer.skip_expect(1);
        if lexer.consume_next()? != 'u' {
          return Ok(TT::Invalid);
        };
        if !lexer.consume(lexer.if_char('{')).is_empty() {
          lexer.consume(lexer.while_chars(&DIGIT_HEX));
          if lexer.consume_next()? != '}' {
            return Ok(TT::Invalid);
          };
        } else {
          for _ in 0..4 {
            if !DIGIT_HEX.has(lexer.consume_next()?) {
              return Ok(TT::Invalid);
            };
          }
        };
      }
      // We assume if it's not ASCII it's part of a valid identifier code point.
      Some(c) if !c.is_ascii() && !crate::char::is_line_terminator(c) && !c.is_whitespace() => {
        lexer.skip_expect(c.len_utf8());
      }
      _ => break,
    };
  }
  let text = &lexer[lexer.since_checkpoint(cp)];
  Ok(KEYWORD_STRS.get(text).copied().unwrap_or(TT::Identifier))
}

fn lex_number(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  if lexer.peek(0)? == '0' {
    if let Some('x' | 'X' | 'b' | 'B' | 'o' | 'O') = lexer.peek_or_eof(1) {
      lexer.skip_expect(2);
      // Binary and octal digits are a subset of hex digits; the parser keeps the raw text.
      if lexer.consume(lexer.while_chars(&DIGIT_HEX)).is_empty() {
        return Ok(TT::Invalid);
      };
      lexer.consume(lexer.if_char('n'));
      return Ok(TT::LiteralNumber);
    };
  };
  lexer.consume(lexer.while_chars(&DIGIT));
  if !lexer.consume(lexer.if_char('n')).is_empty() {
    return Ok(TT::LiteralNumber);
  };
  if !lexer.consume(lexer.if_char('.')).is_empty() {
    lexer.consume(lexer.while_chars(&DIGIT));
  };
  if let Some('e' | 'E') = lexer.peek_or_eof(0) {
    lexer.skip_expect(1);
    if let Some('+' | '-') = lexer.peek_or_eof(0) {
      lexer.skip_expect(1);
    };
    if lexer.consume(lexer.while_chars(&DIGIT)).is_empty() {
      return Ok(TT::Invalid);
    };
  };
  Ok(TT::LiteralNumber)
}

fn lex_private_member(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Include the `#` in the token.
  lexer.skip_expect(1);
  let starter = lexer.peek(0)?;
  if !ID_START.has(starter) && starter.is_ascii() {
    return Ok(TT::Invalid);
  };
  lex_identifier(lexer)?;
  Ok(TT::PrivateMember)
}

fn lex_regex(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Consume slash.
  lexer.skip_expect(1);
  let mut in_charset = false;
  loop {
    match lexer.consume_next()? {
      '\\' => {
        let escaped = lexer.consume_next()?;
        if crate::char::is_line_terminator(escaped) {
          return Ok(TT::Invalid);
        };
      }
      '/' if !in_charset => break,
      '[' => in_charset = true,
      ']' if in_charset => in_charset = false,
      c if crate::char::is_line_terminator(c) => return Ok(TT::Invalid),
      _ => {}
    };
  }
  lexer.consume(lexer.while_chars(&ID_CONTINUE));
  Ok(TT::LiteralRegex)
}

fn lex_string(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let quote = lexer.consume_next()?;
  loop {
    lexer.consume(lexer.while_not_3_chars('\\', '\n', quote));
    match lexer.consume_next()? {
      '\\' => {
        // Also covers line continuations.
        lexer.consume_next()?;
      }
      '\n' => return Ok(TT::Invalid),
      _ => break,
    };
  }
  Ok(TT::LiteralString)
}

/// Ends with `${` or backtick.
fn lex_template_string_continue(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  loop {
    lexer.consume(lexer.while_not_3_chars('\\', '`', '$'));
    match lexer.consume_next()? {
      '\\' => {
        lexer.consume_next()?;
      }
      '`' => return Ok(TT::LiteralTemplatePartStringEnd),
      '$' => {
        if !lexer.consume(lexer.if_char('{')).is_empty() {
          return Ok(TT::LiteralTemplatePartString);
        };
      }
      _ => unreachable!(),
    };
  }
}

/// The comments before the first token of `source`, such as a `@flow` pragma or a license
/// header, in source order and without trailing line terminators.
pub fn leading_comments(source: &str) -> Vec<&str> {
  let mut lexer = Lexer::new(source);
  let mut comments = Vec::new();
  while let Ok((tt, mat)) = INSIG.find(&lexer) {
    let cp = lexer.checkpoint();
    match tt {
      TT::CommentMultiline => {
        lex_multiline_comment(&mut lexer);
      }
      TT::CommentSingle => lex_single_comment(&mut lexer),
      _ => {
        lexer.consume(mat);
        continue;
      }
    };
    let loc = lexer.since_checkpoint(cp);
    comments.push(source[loc.0..loc.1].trim_end_matches(['\n', '\r']));
  }
  comments
}

pub fn lex_next(lexer: &mut Lexer<'_>, mode: LexMode) -> Token {
  if mode == LexMode::TemplateStrContinue {
    return lexer.drive_fallible(false, lex_template_string_continue);
  };

  let mut preceded_by_line_terminator = false;
  while let Ok((tt, mat)) = INSIG.find(lexer) {
    match tt {
      TT::LineTerminator => {
        lexer.consume(mat);
        preceded_by_line_terminator = true;
      }
      TT::Whitespace => {
        lexer.consume(mat);
      }
      TT::CommentMultiline => {
        preceded_by_line_terminator |= lex_multiline_comment(lexer);
      }
      TT::CommentSingle => {
        lex_single_comment(lexer);
        preceded_by_line_terminator = true;
      }
      _ => unreachable!(),
    };
  }

  if lexer.at_end() {
    return Token {
      loc: lexer.eof_range(),
      typ: TT::EOF,
      preceded_by_line_terminator,
    };
  };

  lexer.drive_fallible(preceded_by_line_terminator, |lexer| {
    let c = lexer.peek(0)?;
    if ID_START.has(c) || c == '\\' || (!c.is_ascii() && !c.is_whitespace()) {
      return lex_identifier(lexer);
    };
    SIG.find(lexer).and_then(|(tt, mut mat)| match tt {
      TT::LiteralNumber => lex_number(lexer),
      TT::LiteralString => lex_string(lexer),
      TT::LiteralTemplatePartString => {
        // Consume backtick.
        lexer.skip_expect(1);
        lex_template_string_continue(lexer)
      }
      TT::PrivateMember => lex_private_member(lexer),
      TT::Slash | TT::SlashEquals if mode == LexMode::SlashIsRegex => lex_regex(lexer),
      typ => {
        if typ == TT::Question && mat.len() != 1 {
          // We've matched `?.[0-9]`.
          mat = mat.prefix(1);
        };
        lexer.consume(mat);
        Ok(typ)
      }
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lex_all(code: &str, mode: LexMode) -> Vec<TT> {
    let mut lexer = Lexer::new(code);
    let mut out = Vec::new();
    loop {
      let t = lex_next(&mut lexer, mode);
      if t.typ == TT::EOF {
        break;
      };
      out.push(t.typ);
    }
    out
  }

  #[test]
  fn lexes_annotations() {
    assert_eq!(lex_all("let x: ?number = 1;", LexMode::Standard), vec![
      TT::KeywordLet,
      TT::Identifier,
      TT::Colon,
      TT::Question,
      TT::Identifier,
      TT::Equals,
      TT::LiteralNumber,
      TT::Semicolon,
    ]);
  }

  #[test]
  fn keywords_need_whole_words() {
    assert_eq!(lex_all("types typeof type", LexMode::Standard), vec![
      TT::Identifier,
      TT::KeywordTypeof,
      TT::KeywordType,
    ]);
  }

  #[test]
  fn slash_depends_on_mode() {
    assert_eq!(lex_all("/a/g", LexMode::SlashIsRegex)[0], TT::LiteralRegex);
    assert_eq!(lex_all("/a/g", LexMode::Standard)[0], TT::Slash);
  }

  #[test]
  fn tracks_line_terminators() {
    let mut lexer = Lexer::new("a // c\n/* x */ b");
    assert!(!lex_next(&mut lexer, LexMode::Standard).preceded_by_line_terminator);
    let b = lex_next(&mut lexer, LexMode::Standard);
    assert_eq!(b.typ, TT::Identifier);
    assert!(b.preceded_by_line_terminator);
  }

  #[test]
  fn templates_stop_at_substitutions() {
    let mut lexer = Lexer::new("`a${b}c`");
    assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, TT::LiteralTemplatePartString);
    assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, TT::Identifier);
    assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, TT::BraceClose);
    assert_eq!(
      lex_next(&mut lexer, LexMode::TemplateStrContinue).typ,
      TT::LiteralTemplatePartStringEnd
    );
  }

  #[test]
  fn collects_comments_before_the_first_token() {
    assert_eq!(
      leading_comments("// @flow\n\n/* (c) 2024\n */\nlet a; // not leading\n"),
      vec!["// @flow", "/* (c) 2024\n */"]
    );
    assert!(leading_comments("let a;").is_empty());
  }
}
