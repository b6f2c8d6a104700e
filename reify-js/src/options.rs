use serde::Deserialize;

/// Settings for a rewrite.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
  /// Local name the runtime library is imported as.
  pub library_id: String,
  /// Module specifier of the runtime library.
  pub library_module: String,
  /// Whether `(expr: T)` casts become runtime assertions. When false, casts are only erased.
  pub assert_casts: bool,
}

impl Default for Options {
  fn default() -> Self {
    Options {
      library_id: "t".to_string(),
      library_module: "flow-runtime".to_string(),
      assert_casts: true,
    }
  }
}

impl Options {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reads options from a JSON object with camelCase keys. Missing keys keep their defaults.
  pub fn from_json(json: &str) -> serde_json::Result<Self> {
    serde_json::from_str(json)
  }

  pub fn with_library_id(mut self, library_id: impl Into<String>) -> Self {
    self.library_id = library_id.into();
    self
  }

  pub fn with_library_module(mut self, library_module: impl Into<String>) -> Self {
    self.library_module = library_module.into();
    self
  }

  pub fn with_assert_casts(mut self, assert_casts: bool) -> Self {
    self.assert_casts = assert_casts;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::Options;

  #[test]
  fn json_fills_in_defaults() {
    let options = Options::from_json(r#"{ "libraryModule": "flow-runtime/lite" }"#).unwrap();
    assert_eq!(options.library_id, "t");
    assert_eq!(options.library_module, "flow-runtime/lite");
    assert!(options.assert_casts);
    assert!(Options::from_json(r#"{ "assertCasts": "yes" }"#).is_err());
  }
}
