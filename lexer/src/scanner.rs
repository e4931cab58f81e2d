use wisp_core::{keyword_kind, Token, TokenKind};

/// A lazy token producer over a borrowed source buffer.
///
/// The scanner holds three pieces of state: the byte offset where the
/// current token started, the byte offset of the next unread character,
/// and the current 1-based line number. It never allocates; every token it
/// produces borrows directly from `source`.
///
/// Identifiers, numbers, and all punctuation are ASCII by construction, so
/// `start`/`current` only ever land on UTF-8 character boundaries — string
/// bodies and comments may contain arbitrary UTF-8 bytes between those
/// boundaries without issue.
pub struct Scanner<'src> {
  source: &'src str,
  start: usize,
  current: usize,
  line: usize,
}

impl<'src> Scanner<'src> {
  pub fn new(source: &'src str) -> Self {
    Self { source, start: 0, current: 0, line: 1 }
  }

  /// Scans and returns the next token. Returns the end-of-file token once
  /// the buffer is exhausted, and on every subsequent call after that.
  pub fn scan_token(&mut self) -> Token<'src> {
    self.skip_whitespace_and_comments();
    self.start = self.current;

    if self.is_at_end() {
      return self.make_token(TokenKind::Eof);
    }

    let c = self.advance();

    if is_ident_start(c) {
      return self.identifier();
    }
    if c.is_ascii_digit() {
      return self.number();
    }

    match c {
      b'(' => self.make_token(TokenKind::LeftParen),
      b')' => self.make_token(TokenKind::RightParen),
      b'{' => self.make_token(TokenKind::LeftBrace),
      b'}' => self.make_token(TokenKind::RightBrace),
      b';' => self.make_token(TokenKind::Semicolon),
      b',' => self.make_token(TokenKind::Comma),
      b'.' => self.make_token(TokenKind::Dot),
      b'-' => self.make_token(TokenKind::Minus),
      b'+' => self.make_token(TokenKind::Plus),
      b'/' => self.make_token(TokenKind::Slash),
      b'*' => self.make_token(TokenKind::Star),
      b'!' => {
        let kind = if self.match_byte(b'=') { TokenKind::BangEqual } else { TokenKind::Bang };
        self.make_token(kind)
      }
      b'=' => {
        let kind = if self.match_byte(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal };
        self.make_token(kind)
      }
      b'<' => {
        let kind = if self.match_byte(b'=') { TokenKind::LessEqual } else { TokenKind::Less };
        self.make_token(kind)
      }
      b'>' => {
        let kind = if self.match_byte(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
        self.make_token(kind)
      }
      b'"' => self.string(),
      _ => self.error_token("Unexpected character"),
    }
  }

  fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  fn advance(&mut self) -> u8 {
    let byte = self.source.as_bytes()[self.current];
    self.current += 1;
    byte
  }

  fn peek(&self) -> u8 {
    if self.is_at_end() {
      0
    } else {
      self.source.as_bytes()[self.current]
    }
  }

  fn peek_next(&self) -> u8 {
    if self.current + 1 >= self.source.len() {
      0
    } else {
      self.source.as_bytes()[self.current + 1]
    }
  }

  fn match_byte(&mut self, expected: u8) -> bool {
    if self.is_at_end() || self.source.as_bytes()[self.current] != expected {
      return false;
    }
    self.current += 1;
    true
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      match self.peek() {
        b' ' | b'\t' | b'\r' => {
          self.current += 1;
        }
        b'\n' => {
          self.line += 1;
          self.current += 1;
        }
        b'/' if self.peek_next() == b'/' => {
          while self.peek() != b'\n' && !self.is_at_end() {
            self.current += 1;
          }
        }
        _ => return,
      }
    }
  }

  fn make_token(&self, kind: TokenKind) -> Token<'src> {
    Token::new(kind, &self.source[self.start..self.current], self.line)
  }

  fn error_token(&self, message: &'static str) -> Token<'src> {
    Token::error(message, self.line)
  }

  fn identifier(&mut self) -> Token<'src> {
    while is_ident_continue(self.peek()) {
      self.current += 1;
    }
    let lexeme = &self.source[self.start..self.current];
    let kind = keyword_kind(lexeme).unwrap_or(TokenKind::Identifier);
    self.make_token(kind)
  }

  /// `[0-9]+ ( . [0-9]+ )?` — a trailing `.` with no following digit is
  /// left unconsumed so the `.` can be scanned as its own token later.
  fn number(&mut self) -> Token<'src> {
    while self.peek().is_ascii_digit() {
      self.current += 1;
    }

    if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
      self.current += 1;
      while self.peek().is_ascii_digit() {
        self.current += 1;
      }
    }

    self.make_token(TokenKind::Number)
  }

  fn string(&mut self) -> Token<'src> {
    while self.peek() != b'"' && !self.is_at_end() {
      if self.peek() == b'\n' {
        self.line += 1;
      }
      self.current += 1;
    }

    if self.is_at_end() {
      return self.error_token("Unterminated string");
    }

    // Consume the closing quote.
    self.current += 1;
    self.make_token(TokenKind::String)
  }
}

fn is_ident_start(c: u8) -> bool {
  c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
  c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(src);
    let mut out = Vec::new();
    loop {
      let tok = scanner.scan_token();
      let done = tok.is_eof();
      out.push(tok.kind);
      if done {
        break;
      }
    }
    out
  }

  #[test]
  fn scans_single_char_punctuation() {
    assert_eq!(
      kinds("(){};,.+-/*"),
      vec![
        TokenKind::LeftParen,
        TokenKind::RightParen,
        TokenKind::LeftBrace,
        TokenKind::RightBrace,
        TokenKind::Semicolon,
        TokenKind::Comma,
        TokenKind::Dot,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Slash,
        TokenKind::Star,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn scans_one_and_two_char_operators() {
    assert_eq!(
      kinds("! != = == < <= > >="),
      vec![
        TokenKind::Bang,
        TokenKind::BangEqual,
        TokenKind::Equal,
        TokenKind::EqualEqual,
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn recognizes_keywords_and_identifiers() {
    let mut scanner = Scanner::new("val foo var");
    assert_eq!(scanner.scan_token().kind, TokenKind::Val);
    let ident = scanner.scan_token();
    assert_eq!(ident.kind, TokenKind::Identifier);
    assert_eq!(ident.lexeme, "foo");
    assert_eq!(scanner.scan_token().kind, TokenKind::Var);
  }

  #[test]
  fn number_does_not_consume_trailing_dot_without_digit() {
    let mut scanner = Scanner::new("1.");
    let num = scanner.scan_token();
    assert_eq!(num.kind, TokenKind::Number);
    assert_eq!(num.lexeme, "1");
    assert_eq!(scanner.scan_token().kind, TokenKind::Dot);
  }

  #[test]
  fn number_with_fraction() {
    let mut scanner = Scanner::new("3.14;");
    let num = scanner.scan_token();
    assert_eq!(num.lexeme, "3.14");
  }

  #[test]
  fn strings_track_embedded_newlines() {
    let mut scanner = Scanner::new("\"a\nb\" nil");
    let s = scanner.scan_token();
    assert_eq!(s.kind, TokenKind::String);
    assert_eq!(s.lexeme, "\"a\nb\"");
    let nil = scanner.scan_token();
    assert_eq!(nil.line, 2);
  }

  #[test]
  fn unterminated_string_is_one_error() {
    let mut scanner = Scanner::new("\"abc");
    let tok = scanner.scan_token();
    assert!(tok.is_error());
    assert_eq!(tok.lexeme, "Unterminated string");
    assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
  }

  #[test]
  fn line_comment_consumed_up_to_newline() {
    let mut scanner = Scanner::new("// a comment\nnil");
    let tok = scanner.scan_token();
    assert_eq!(tok.kind, TokenKind::Nil);
    assert_eq!(tok.line, 2);
  }

  #[test]
  fn unexpected_character_is_an_error_token() {
    let mut scanner = Scanner::new("@");
    let tok = scanner.scan_token();
    assert!(tok.is_error());
    assert_eq!(tok.lexeme, "Unexpected character");
  }

  #[test]
  fn eof_is_returned_on_every_subsequent_call() {
    let mut scanner = Scanner::new("");
    assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
    assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
  }

  #[test]
  fn scanning_is_deterministic() {
    let src = "var x = 1 + 2; // comment\nprint x;";
    assert_eq!(kinds(src), kinds(src));
  }
}
