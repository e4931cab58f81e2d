use std::fmt;

/// Where, relative to the token that triggered it, a diagnostic occurred.
/// Distinguishes the three cases that matter when formatting
/// `[line N] Error...: message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticSite {
  /// The offending token was the end-of-file sentinel.
  AtEnd,
  /// The offending token was itself a scanner error token: its lexeme is
  /// already the message, so no location suffix is printed.
  ErrorToken,
  /// An ordinary token; its lexeme is quoted in the location suffix.
  AtLexeme(String),
}

/// One reported compile-time error, in both user-facing and
/// programmatically-inspectable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub line: usize,
  pub site: DiagnosticSite,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[line {}] Error", self.line)?;
    match &self.site {
      DiagnosticSite::AtEnd => write!(f, " at end")?,
      DiagnosticSite::ErrorToken => {}
      DiagnosticSite::AtLexeme(lexeme) => write!(f, " at '{}'", lexeme)?,
    }
    write!(f, ": {}", self.message)
  }
}
