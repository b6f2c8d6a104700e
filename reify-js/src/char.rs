use ahash::HashSet;
use ahash::HashSetExt;
use core::ops::RangeInclusive;
use once_cell::sync::Lazy;

#[derive(Clone)]
pub struct CharFilter {
  chars: HashSet<char>,
}

impl CharFilter {
  pub fn new() -> CharFilter {
    CharFilter {
      chars: HashSet::new(),
    }
  }

  pub fn add_char(&mut self, c: char) {
    self.chars.insert(c);
  }

  pub fn add_chars(&mut self, chars: RangeInclusive<char>) {
    for c in chars {
      self.chars.insert(c);
    }
  }

  pub fn has(&self, c: char) -> bool {
    self.chars.contains(&c)
  }
}

pub const ECMASCRIPT_LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

#[inline]
pub fn is_line_terminator(c: char) -> bool {
  ECMASCRIPT_LINE_TERMINATORS.contains(&c)
}

pub static DIGIT: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = CharFilter::new();
  filter.add_chars('0'..='9');
  filter.add_char('_');
  filter
});

pub static DIGIT_HEX: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = CharFilter::new();
  filter.add_chars('0'..='9');
  filter.add_chars('a'..='f');
  filter.add_chars('A'..='F');
  filter.add_char('_');
  filter
});

pub static ID_START: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = CharFilter::new();
  filter.add_chars('a'..='z');
  filter.add_chars('A'..='Z');
  filter.add_char('_');
  filter.add_char('$');
  filter
});

pub static ID_CONTINUE: Lazy<CharFilter> = Lazy::new(|| {
  let mut filter = ID_START.clone();
  filter.add_chars('0'..='9');
  // Zero width joiner and non-joiner.
  filter.add_char('\u{200C}');
  filter.add_char('\u{200D}');
  filter
});

/// Whether `name` can be written as a bare identifier (e.g. an unquoted property key).
pub fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if ID_START.has(c) || !c.is_ascii() => {}
    _ => return false,
  };
  chars.all(|c| ID_CONTINUE.has(c) || !c.is_ascii())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifier_names() {
    assert!(is_identifier_name("_xType"));
    assert!(is_identifier_name("$0"));
    assert!(!is_identifier_name("0x"));
    assert!(!is_identifier_name("a-b"));
    assert!(!is_identifier_name(""));
  }
}
