//! Lexical analysis: a pull-based scanner over the raw template bytes.
//!
//! The scanner is intentionally tiny. It knows nothing about templates: every
//! byte it recognises maps to exactly one token, digit runs become numbers and
//! letter runs become identifiers. It never fails; bytes it does not classify
//! come out as empty identifiers so that callers can slice the source instead
//! of trusting token values.

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Eof,

  // Operators
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  LessThan,
  GreaterThan,
  Equal,
  Not,
  And,
  Or,
  Caret,
  Question,

  // Brackets
  LeftParen,
  RightParen,
  LeftBracket,
  RightBracket,
  LeftBrace,
  RightBrace,

  // Numbers
  Integer,
  Float,

  // Whitespace
  Whitespace,
  Newline,
  Tab,
  CarriageReturn,

  // Punctuation
  Comma,
  Semicolon,
  Colon,
  Dot,
  SingleQuote,
  DoubleQuote,

  Identifier,
}

impl TokenKind {
  /// Single-byte tokens. Anything not listed here starts a number or an
  /// identifier scan.
  fn from_byte(byte: u8) -> Option<Self> {
    let kind = match byte {
      b'+' => Self::Plus,
      b'-' => Self::Minus,
      b'*' => Self::Star,
      b'/' => Self::Slash,
      b'%' => Self::Percent,
      b'<' => Self::LessThan,
      b'>' => Self::GreaterThan,
      b'=' => Self::Equal,
      b'!' => Self::Not,
      b'&' => Self::And,
      b'|' => Self::Or,
      b'^' => Self::Caret,
      b'?' => Self::Question,
      b'(' => Self::LeftParen,
      b')' => Self::RightParen,
      b'[' => Self::LeftBracket,
      b']' => Self::RightBracket,
      b'{' => Self::LeftBrace,
      b'}' => Self::RightBrace,
      b' ' => Self::Whitespace,
      b'\t' => Self::Tab,
      b'\n' => Self::Newline,
      b'\r' => Self::CarriageReturn,
      b',' => Self::Comma,
      b';' => Self::Semicolon,
      b':' => Self::Colon,
      b'.' => Self::Dot,
      b'\'' => Self::SingleQuote,
      b'"' => Self::DoubleQuote,
      _ => return None,
    };
    Some(kind)
  }

  pub fn is_whitespace(self) -> bool {
    matches!(
      self,
      Self::Whitespace | Self::Tab | Self::Newline | Self::CarriageReturn
    )
  }
}

/// A classified lexical unit with its position in the input.
///
/// `row` starts at 1. `col` is 1 for the first byte of a line; a newline token
/// itself is reported at column 0 of the row it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: String,
  pub row: usize,
  pub col: usize,
  /// Byte offset of the token's first byte.
  pub offset: usize,
}

impl Token {
  pub fn new(
    kind: TokenKind,
    value: impl Into<String>,
    row: usize,
    col: usize,
    offset: usize,
  ) -> Self {
    Self {
      kind,
      value: value.into(),
      row,
      col,
      offset,
    }
  }
}

/// Single-byte lookahead scanner. Owns its cursor; one instance per input.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
  source: &'a str,
  ch: Option<u8>,
  position: usize,
  read_position: usize,
  row: usize,
  col: usize,
  exhausted: bool,
}

impl<'a> Scanner<'a> {
  pub fn new(source: &'a str) -> Self {
    let mut scanner = Self {
      source,
      ch: None,
      position: 0,
      read_position: 0,
      row: 1,
      col: 0,
      exhausted: false,
    };
    scanner.read_char();
    scanner
  }

  pub fn source(&self) -> &'a str {
    self.source
  }

  /// Produce the next token. Once the input is exhausted this keeps returning
  /// the same `Eof` token.
  pub fn next_token(&mut self) -> Token {
    let Some(ch) = self.ch else {
      return Token::new(TokenKind::Eof, "", self.row, self.col, self.position);
    };

    let token = if let Some(kind) = TokenKind::from_byte(ch) {
      self.read_simple(kind, ch)
    } else if ch.is_ascii_digit() {
      self.read_number()
    } else {
      self.read_identifier()
    };

    tracing::trace!(
      kind = ?token.kind,
      value = %token.value,
      row = token.row,
      col = token.col,
      "scanned token"
    );
    token
  }

  fn read_char(&mut self) {
    self.ch = self.source.as_bytes().get(self.read_position).copied();
    if self.ch == Some(b'\n') {
      self.row += 1;
      self.col = 0;
    } else {
      self.col += 1;
    }
    self.position = self.read_position;
    self.read_position += 1;
  }

  fn read_simple(&mut self, kind: TokenKind, ch: u8) -> Token {
    let token = Token::new(
      kind,
      char::from(ch).to_string(),
      self.row,
      self.col,
      self.position,
    );
    self.read_char();
    token
  }

  /// Digits and dots, greedily. Any dot turns the literal into a float, so
  /// `1.2.3` comes out as a single `Float`.
  fn read_number(&mut self) -> Token {
    let (start, row, col) = (self.position, self.row, self.col);
    let mut kind = TokenKind::Integer;

    while let Some(ch) = self.ch
      && (ch.is_ascii_digit() || ch == b'.')
    {
      if ch == b'.' {
        kind = TokenKind::Float;
      }
      self.read_char();
    }

    Token::new(kind, &self.source[start..self.position], row, col, start)
  }

  fn read_identifier(&mut self) -> Token {
    let (start, row, col) = (self.position, self.row, self.col);

    while let Some(ch) = self.ch
      && (ch.is_ascii_alphanumeric() || ch == b'_')
    {
      self.read_char();
    }

    if self.position == start {
      // Unclassified byte (non-ASCII, NUL, `#`, ...): step over it so the
      // stream keeps moving, and leave the value empty.
      self.read_char();
      return Token::new(TokenKind::Identifier, "", row, col, start);
    }

    Token::new(
      TokenKind::Identifier,
      &self.source[start..self.position],
      row,
      col,
      start,
    )
  }
}

/// Yields every token up to and including the first `Eof`.
impl Iterator for Scanner<'_> {
  type Item = Token;

  fn next(&mut self) -> Option<Self::Item> {
    if self.exhausted {
      return None;
    }
    let token = self.next_token();
    if token.kind == TokenKind::Eof {
      self.exhausted = true;
    }
    Some(token)
  }
}

/// Scan the whole input into a vector terminated by a single `Eof`.
pub fn tokenize(input: &str) -> Vec<Token> {
  Scanner::new(input).collect()
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: &Token) -> String {
  match token.kind {
    TokenKind::Eof => "EOF".to_string(),
    _ => token.value.clone(),
  }
}
