//! Shared error types for the compilation pipeline.
//!
//! The scanner is total over its input. Parse errors carry the row/column of
//! the offending token so the front-end can point at it with a caret; a
//! compile can also be refused up front for options that would not produce a
//! valid module.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Syntax failures raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
  /// A token that is not valid at this grammar position.
  #[snafu(display("{row}:{col}: unexpected token \"{found}\", expected {expected}"))]
  UnexpectedToken {
    found: String,
    expected: String,
    row: usize,
    col: usize,
  },

  /// A closing delimiter was required but something else was found.
  #[snafu(display("{row}:{col}: expected \"{expected}\", but got \"{found}\""))]
  MissingDelimiter {
    found: String,
    expected: String,
    row: usize,
    col: usize,
  },

  #[snafu(display("{row}:{col}: integer literal \"{found}\" is out of range"))]
  IntegerOutOfRange { found: String, row: usize, col: usize },
}

impl ParseError {
  /// Row and column of the token that triggered the error.
  pub fn location(&self) -> (usize, usize) {
    match self {
      Self::UnexpectedToken { row, col, .. }
      | Self::MissingDelimiter { row, col, .. }
      | Self::IntegerOutOfRange { row, col, .. } => (*row, *col),
    }
  }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("failed to parse input: {source}"))]
  Parse { source: ParseError },

  #[snafu(display("invalid {option} \"{value}\": expected a JavaScript identifier"))]
  InvalidOption { option: String, value: String },
}

impl CompileError {
  pub fn parse_error(&self) -> Option<&ParseError> {
    match self {
      Self::Parse { source } => Some(source),
      Self::InvalidOption { .. } => None,
    }
  }

  /// Render the offending source line with a caret under the reported column.
  /// `None` when the error is not tied to a source position.
  pub fn excerpt(&self, source: &str) -> Option<String> {
    let (row, col) = self.parse_error()?.location();
    let line = source
      .split('\n')
      .nth(row.saturating_sub(1))
      .unwrap_or("")
      .trim_end_matches('\r');
    let byte_col = col.saturating_sub(1).min(line.len());
    let width = line
      .char_indices()
      .take_while(|(i, _)| *i < byte_col)
      .count();
    Some(format!("{line}\n{}^", " ".repeat(width)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unexpected(row: usize, col: usize) -> CompileError {
    CompileError::Parse {
      source: ParseError::UnexpectedToken {
        found: "}".to_string(),
        expected: "an integer or identifier".to_string(),
        row,
        col,
      },
    }
  }

  #[test]
  fn display_wraps_parse_error() {
    let err = unexpected(1, 7);
    assert_eq!(
      err.to_string(),
      "failed to parse input: 1:7: unexpected token \"}\", expected an integer or identifier"
    );
  }

  #[test]
  fn excerpt_points_at_column() {
    let err = unexpected(1, 7);
    assert_eq!(err.excerpt("{ 1 + }").as_deref(), Some("{ 1 + }\n      ^"));
  }

  #[test]
  fn excerpt_selects_row() {
    let err = unexpected(2, 3);
    assert_eq!(err.excerpt("first\r\n{ }\n").as_deref(), Some("{ }\n  ^"));
  }

  #[test]
  fn invalid_option_has_no_excerpt() {
    let err = CompileError::InvalidOption {
      option: "function name".to_string(),
      value: "a(b".to_string(),
    };
    assert_eq!(
      err.to_string(),
      "invalid function name \"a(b\": expected a JavaScript identifier"
    );
    assert_eq!(err.excerpt("anything"), None);
  }
}
