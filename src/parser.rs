//! Recursive-descent parser producing the template's root nodes.
//!
//! The top level alternates between static text runs and `{ ... }`
//! interpolations. Inside an interpolation a two-level arithmetic grammar is
//! parsed:
//!
//! ```text
//! expression := factor ( ('+' | '-') expression )?
//! factor     := primitive ( ('*' | '/' | '%') factor )?
//! primitive  := Integer | Identifier
//! ```
//!
//! Chains associate to the right: `1 - 2 - 3` is `1 - (2 - 3)`. Operands are
//! collected in a loop and folded afterwards, so chain length is not bounded
//! by the call stack.

use crate::ast::{Expression, Node, Span};
use crate::error::{
  IntegerOutOfRangeSnafu, MissingDelimiterSnafu, ParseError, UnexpectedTokenSnafu,
};
use crate::scanner::{Scanner, Token, TokenKind, describe_token};

/// Parse a template source into its root nodes.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
  Parser::new(Scanner::new(source)).parse()
}

/// Pull-based parser with one token of lookahead and one of lookback.
pub struct Parser<'a> {
  scanner: Scanner<'a>,
  current: Token,
  previous: Option<Token>,
}

impl<'a> Parser<'a> {
  pub fn new(mut scanner: Scanner<'a>) -> Self {
    let current = scanner.next_token();
    Self {
      scanner,
      current,
      previous: None,
    }
  }

  pub fn parse(mut self) -> Result<Vec<Node>, ParseError> {
    let mut roots = Vec::new();

    while !self.is_eof() {
      let node = match self.current.kind {
        TokenKind::LeftBrace => self.interpolation()?,
        _ => self.static_text(),
      };
      roots.push(node);
    }

    tracing::debug!(roots = roots.len(), "parsed template");
    Ok(roots)
  }

  /// Consume the current token and return it.
  fn advance(&mut self) -> &Token {
    let next = self.scanner.next_token();
    let consumed = std::mem::replace(&mut self.current, next);
    self.previous.insert(consumed)
  }

  fn is_eof(&self) -> bool {
    self.current.kind == TokenKind::Eof
  }

  fn skip_whitespace(&mut self) {
    while self.current.kind.is_whitespace() {
      self.advance();
    }
  }

  fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
    if self.current.kind == kind {
      self.advance();
      return Ok(());
    }
    MissingDelimiterSnafu {
      found: describe_token(&self.current),
      expected,
      row: self.current.row,
      col: self.current.col,
    }
    .fail()
  }

  /// Everything up to the next `{` or the end of input. The value is sliced
  /// from the source so unclassified bytes survive untouched.
  fn static_text(&mut self) -> Node {
    let start = self.current.offset;
    while !self.is_eof() && self.current.kind != TokenKind::LeftBrace {
      self.advance();
    }
    let end = self.current.offset;
    let value = &self.scanner.source()[start..end];
    Node::static_text(value, Span::new(start, end))
  }

  fn interpolation(&mut self) -> Result<Node, ParseError> {
    let start = self.current.offset;
    self.expect(TokenKind::LeftBrace, "{")?;
    self.skip_whitespace();
    let expression = self.expression()?;
    self.skip_whitespace();
    self.expect(TokenKind::RightBrace, "}")?;
    let end = self.current.offset;
    Ok(Node::interpolation(expression, Span::new(start, end)))
  }

  fn expression(&mut self) -> Result<Expression, ParseError> {
    let first = self.factor()?;
    let mut rest = Vec::new();

    loop {
      self.skip_whitespace();
      if !matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
        break;
      }
      let operator = self.advance().clone();
      self.skip_whitespace();
      rest.push((operator, self.factor()?));
    }

    Ok(fold_right(first, rest))
  }

  fn factor(&mut self) -> Result<Expression, ParseError> {
    let first = self.primitive()?;
    let mut rest = Vec::new();

    loop {
      self.skip_whitespace();
      if !matches!(
        self.current.kind,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent
      ) {
        break;
      }
      let operator = self.advance().clone();
      self.skip_whitespace();
      rest.push((operator, self.primitive()?));
    }

    Ok(fold_right(first, rest))
  }

  fn primitive(&mut self) -> Result<Expression, ParseError> {
    match self.current.kind {
      TokenKind::Integer => {
        let token = self.advance();
        let value = token.value.parse::<i64>().map_err(|_| {
          IntegerOutOfRangeSnafu {
            found: token.value.as_str(),
            row: token.row,
            col: token.col,
          }
          .build()
        })?;
        Ok(Expression::integer(value))
      }
      TokenKind::Identifier => {
        let name = self.advance().value.clone();
        Ok(Expression::identifier(name))
      }
      _ => UnexpectedTokenSnafu {
        found: describe_token(&self.current),
        expected: "an integer or identifier",
        row: self.current.row,
        col: self.current.col,
      }
      .fail(),
    }
  }
}

/// Group `a op1 b op2 c` as `a op1 (b op2 c)`.
fn fold_right(first: Expression, rest: Vec<(Token, Expression)>) -> Expression {
  let mut pairs = rest.into_iter().rev();
  let Some((mut operator, mut acc)) = pairs.next() else {
    return first;
  };
  for (previous, operand) in pairs {
    acc = Expression::binary(operand, operator, acc);
    operator = previous;
  }
  Expression::binary(first, operator, acc)
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Fully parenthesised shape of an expression, to pin grouping.
  fn grouped(expr: &Expression) -> String {
    match expr {
      Expression::Integer { value } => value.to_string(),
      Expression::Identifier { name } => name.clone(),
      Expression::Binary {
        left,
        operator,
        right,
      } => format!("({} {} {})", grouped(left), operator.value, grouped(right)),
    }
  }

  fn single_expression(source: &str) -> Expression {
    let roots = parse(source).unwrap();
    assert_eq!(roots.len(), 1, "roots for {source:?}");
    match roots.into_iter().next() {
      Some(Node::Interpolation { expression, .. }) => expression,
      other => panic!("expected interpolation, got {other:?}"),
    }
  }

  #[test]
  fn empty_template() {
    assert_eq!(parse("").unwrap(), vec![]);
  }

  #[test]
  fn static_text_is_verbatim() {
    for source in ["Hello, world!", "a } b", "x\r\n\ty = 1.2.3;", "caf\u{e9} #1 @home"] {
      let roots = parse(source).unwrap();
      assert_eq!(
        roots,
        vec![Node::static_text(source, Span::new(0, source.len()))],
        "static text for {source:?}"
      );
    }
  }

  #[test]
  fn interpolation_identifier() {
    let expression = single_expression("{ name }");
    assert_eq!(expression, Expression::identifier("name"));
    assert_eq!(expression.render(), "name");
  }

  #[test]
  fn whitespace_inside_braces_is_optional() {
    assert_eq!(grouped(&single_expression("{1+2}")), "(1 + 2)");
    assert_eq!(grouped(&single_expression("{\n\t1 +\r\n 2 }")), "(1 + 2)");
  }

  #[test]
  fn multiplicative_binds_tighter() {
    let expression = single_expression("{ 1 + 2 * 3 }");
    assert_eq!(grouped(&expression), "(1 + (2 * 3))");

    let Expression::Binary {
      left,
      operator,
      right,
    } = &expression
    else {
      panic!("expected binary expression");
    };
    assert_eq!(**left, Expression::integer(1));
    assert_eq!(operator.kind, TokenKind::Plus);
    assert!(matches!(**right, Expression::Binary { ref operator, .. } if operator.value == "*"));

    assert_eq!(grouped(&single_expression("{ a * b + c }")), "((a * b) + c)");
  }

  #[test]
  fn chains_associate_right() {
    assert_eq!(grouped(&single_expression("{ 1 - 2 - 3 }")), "(1 - (2 - 3))");
    assert_eq!(grouped(&single_expression("{ a / b % c }")), "(a / (b % c))");
  }

  #[test]
  fn long_chain_parses_without_deep_recursion() {
    let source = format!("{{ 1{} }}", " - 1".repeat(20_000));
    let expression = single_expression(&source);

    let mut depth = 0;
    let mut cursor = &expression;
    while let Expression::Binary { left, right, .. } = cursor {
      assert_eq!(**left, Expression::integer(1));
      depth += 1;
      cursor = &**right;
    }
    assert_eq!(depth, 20_000);
    assert_eq!(*cursor, Expression::integer(1));

    let product = format!("{{ a{} + b }}", " * a".repeat(20_000));
    assert!(single_expression(&product).render().ends_with("* a + b"));
  }

  #[test]
  fn operator_token_keeps_position() {
    let expression = single_expression("{ x % 2 }");
    let Expression::Binary { operator, .. } = &expression else {
      panic!("expected binary expression");
    };
    assert_eq!((operator.kind, operator.row, operator.col), (TokenKind::Percent, 1, 5));
  }

  #[test]
  fn mixed_roots_carry_spans() {
    let roots = parse("ab{ x }cd").unwrap();
    assert_eq!(
      roots,
      vec![
        Node::static_text("ab", Span::new(0, 2)),
        Node::interpolation(Expression::identifier("x"), Span::new(2, 7)),
        Node::static_text("cd", Span::new(7, 9)),
      ]
    );
  }

  #[test]
  fn adjacent_interpolations() {
    let roots = parse("{a}{b}").unwrap();
    let rendered: Vec<_> = roots
      .iter()
      .map(|node| match node {
        Node::Interpolation { expression, .. } => expression.render(),
        Node::StaticText { value, .. } => value.clone(),
      })
      .collect();
    assert_eq!(rendered, vec!["a", "b"]);
  }

  #[test]
  fn missing_operand_is_unexpected_token() {
    let err = parse("{ 1 + }").unwrap_err();
    assert_eq!(
      err,
      ParseError::UnexpectedToken {
        found: "}".to_string(),
        expected: "an integer or identifier".to_string(),
        row: 1,
        col: 7,
      }
    );
  }

  #[test]
  fn empty_braces_are_unexpected_token() {
    assert!(matches!(
      parse("{ }"),
      Err(ParseError::UnexpectedToken { ref found, .. }) if found == "}"
    ));
  }

  #[test]
  fn float_is_not_a_primitive() {
    assert!(matches!(
      parse("{ 1.5 }"),
      Err(ParseError::UnexpectedToken { ref found, .. }) if found == "1.5"
    ));
  }

  #[test]
  fn unterminated_interpolation() {
    let err = parse("Hi { name").unwrap_err();
    assert_eq!(
      err,
      ParseError::MissingDelimiter {
        found: "EOF".to_string(),
        expected: "}".to_string(),
        row: 1,
        col: 10,
      }
    );
  }

  #[test]
  fn extra_operand_is_missing_delimiter() {
    assert!(matches!(
      parse("{ a b }"),
      Err(ParseError::MissingDelimiter { ref found, .. }) if found == "b"
    ));
  }

  #[test]
  fn oversized_integer() {
    assert!(matches!(
      parse("{ 99999999999999999999 }"),
      Err(ParseError::IntegerOutOfRange { row: 1, col: 3, .. })
    ));
  }

  #[test]
  fn unclassified_byte_parses_as_empty_identifier() {
    assert_eq!(single_expression("{ # }"), Expression::identifier(""));
  }

  #[test]
  fn first_error_aborts() {
    let err = parse("{ a }{ + }{ }").unwrap_err();
    assert_eq!(err.location(), (1, 8));
  }

  #[test]
  fn roots_reconstruct_source() {
    let corpus = [
      "",
      "plain",
      "{ a }",
      "Hello, { name }!",
      "{a}{b} c {1 + 2 * x}\n",
      "} stray {x} \u{1f600} {y}",
      "line one\n{ count }\r\nline { a % b } three",
    ];
    for source in corpus {
      let roots = parse(source).unwrap();
      let mut cursor = 0;
      let mut rebuilt = String::new();
      for node in &roots {
        let span = node.span();
        assert_eq!(span.start, cursor, "gap before {node:?} in {source:?}");
        assert!(span.start < span.end);
        match node {
          Node::StaticText { value, .. } => {
            assert!(!value.contains('{'));
            assert_eq!(value, &source[span.start..span.end]);
            rebuilt.push_str(value);
          }
          Node::Interpolation { .. } => {
            let text = &source[span.start..span.end];
            assert!(text.starts_with('{') && text.ends_with('}'));
            rebuilt.push_str(text);
          }
        }
        cursor = span.end;
      }
      assert_eq!(cursor, source.len());
      assert_eq!(rebuilt, source);
    }
  }
}
