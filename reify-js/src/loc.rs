use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::token::TT;
use serde::Serialize;
use std::cmp::max;
use std::cmp::min;
use std::ops::Add;
use std::ops::AddAssign;

/// A half-open range of UTF-8 byte offsets into the source text.
///
/// Nodes created by the rewriter carry the location of the node they were
/// derived from, so errors raised against synthesized code still point at
/// something the user wrote.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct Loc(pub usize, pub usize);

impl Loc {
  pub fn error(self, typ: SyntaxErrorType, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError::new(typ, self, actual_token)
  }

  pub fn is_empty(&self) -> bool {
    self.0 >= self.1
  }

  pub fn len(&self) -> usize {
    self.1.saturating_sub(self.0)
  }

  pub fn extend(&mut self, other: Loc) {
    self.0 = min(self.0, other.0);
    self.1 = max(self.1, other.1);
  }

  pub fn add_option(self, rhs: Option<Loc>) -> Loc {
    let mut new = self;
    if let Some(rhs) = rhs {
      new.extend(rhs);
    };
    new
  }

  /// Computes the 1-based line and column of the start offset.
  pub fn line_col(&self, source: &str) -> (usize, usize) {
    let end = min(self.0, source.len());
    let prefix = &source.as_bytes()[..end];
    let line = memchr::memchr_iter(b'\n', prefix).count() + 1;
    let line_start = memchr::memrchr(b'\n', prefix).map(|i| i + 1).unwrap_or(0);
    let col = String::from_utf8_lossy(&prefix[line_start..]).chars().count() + 1;
    (line, col)
  }
}

impl Add for Loc {
  type Output = Loc;

  fn add(self, rhs: Self) -> Self::Output {
    let mut new = self;
    new.extend(rhs);
    new
  }
}

impl AddAssign for Loc {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(rhs);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_covers_both_ranges() {
    assert_eq!(Loc(4, 6) + Loc(1, 2), Loc(1, 6));
    let mut loc = Loc(3, 3);
    loc += Loc(3, 9);
    assert_eq!(loc, Loc(3, 9));
    assert_eq!(Loc(2, 5).add_option(None), Loc(2, 5));
  }

  #[test]
  fn line_col_counts_from_one() {
    let src = "let a;\nlet b: number;\n";
    assert_eq!(Loc(0, 1).line_col(src), (1, 1));
    assert_eq!(Loc(11, 12).line_col(src), (2, 5));
  }
}
