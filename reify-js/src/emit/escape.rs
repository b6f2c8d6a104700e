/// Appends `value` as a double-quoted string literal. Non-ASCII characters are kept as UTF-8
/// except U+2028 and U+2029, which are always escaped.
pub fn write_string_literal(out: &mut String, value: &str) {
  out.push('"');
  let mut chars = value.chars().peekable();
  while let Some(ch) = chars.next() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      '\0' => {
        if chars.peek().is_some_and(|c| c.is_ascii_digit()) {
          out.push_str("\\x00");
        } else {
          out.push_str("\\0");
        }
      }
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      ch if ch < '\u{20}' => out.push_str(&format!("\\x{:02X}", ch as u32)),
      ch => out.push(ch),
    }
  }
  out.push('"');
}

#[cfg(test)]
mod tests {
  use super::*;

  fn quoted(value: &str) -> String {
    let mut out = String::new();
    write_string_literal(&mut out, value);
    out
  }

  #[test]
  fn escapes_quotes_and_backslashes() {
    assert_eq!(quoted("a\"b\\c"), "\"a\\\"b\\\\c\"");
  }

  #[test]
  fn escapes_control_characters() {
    assert_eq!(quoted("a\nb\tc"), "\"a\\nb\\tc\"");
    assert_eq!(quoted("a\u{0007}b"), "\"a\\x07b\"");
    assert_eq!(quoted("\u{0}1"), "\"\\x001\"");
  }
}
