use wisp_core::{Token, TokenKind};
use wisp_lexer::Scanner;

/// Two-token lookahead state plus the two sticky error flags.
///
/// `had_error` never clears once set; `panic_mode` suppresses cascading
/// diagnostics until a synchronization point, then clears.
pub struct Parser<'src> {
  pub scanner: Scanner<'src>,
  pub previous: Token<'src>,
  pub current: Token<'src>,
  pub had_error: bool,
  pub panic_mode: bool,
}

impl<'src> Parser<'src> {
  pub fn new(source: &'src str) -> Self {
    let placeholder = Token::new(TokenKind::Eof, "", 0);
    Self {
      scanner: Scanner::new(source),
      previous: placeholder,
      current: placeholder,
      had_error: false,
      panic_mode: false,
    }
  }
}
