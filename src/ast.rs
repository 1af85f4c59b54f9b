//! Syntax tree shared by the parser and the generator.
//!
//! Nodes are plain data. The only behaviour is the canonical rendering of an
//! [`Expression`], which the generator uses as the key of a reactive binding.

use std::fmt;
use std::mem;

use crate::scanner::Token;

/// Byte range into the template source, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
  pub start: usize,
  pub end: usize,
}

impl Span {
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }
}

/// A root of the parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  /// Literal text between interpolations, exactly as written.
  StaticText { value: String, span: Span },
  /// A `{ expression }` block; the span covers both braces.
  Interpolation { expression: Expression, span: Span },
}

impl Node {
  pub fn static_text(value: impl Into<String>, span: Span) -> Self {
    Self::StaticText {
      value: value.into(),
      span,
    }
  }

  pub fn interpolation(expression: Expression, span: Span) -> Self {
    Self::Interpolation { expression, span }
  }

  pub fn span(&self) -> Span {
    match self {
      Self::StaticText { span, .. } | Self::Interpolation { span, .. } => *span,
    }
  }
}

/// Expression tree produced inside an interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
  Integer {
    value: i64,
  },
  Identifier {
    name: String,
  },
  Binary {
    left: Box<Expression>,
    operator: Token,
    right: Box<Expression>,
  },
}

impl Expression {
  pub fn integer(value: i64) -> Self {
    Self::Integer { value }
  }

  pub fn identifier(name: impl Into<String>) -> Self {
    Self::Identifier { name: name.into() }
  }

  pub fn binary(left: Expression, operator: Token, right: Expression) -> Self {
    Self::Binary {
      left: Box::new(left),
      operator,
      right: Box::new(right),
    }
  }

  /// Canonical text of the expression: `<left> <op> <right>`, recursively,
  /// with no parentheses.
  pub fn render(&self) -> String {
    self.to_string()
  }
}

/// Pending output of an in-order walk.
enum Piece<'e> {
  Expr(&'e Expression),
  Operator(&'e str),
}

/// Walks with an explicit stack: operator chains can be thousands deep.
impl fmt::Display for Expression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut pending = vec![Piece::Expr(self)];
    while let Some(piece) = pending.pop() {
      match piece {
        Piece::Operator(op) => write!(f, " {op} ")?,
        Piece::Expr(Self::Integer { value }) => write!(f, "{value}")?,
        Piece::Expr(Self::Identifier { name }) => f.write_str(name)?,
        Piece::Expr(Self::Binary {
          left,
          operator,
          right,
        }) => {
          pending.push(Piece::Expr(right));
          pending.push(Piece::Operator(&operator.value));
          pending.push(Piece::Expr(left));
        }
      }
    }
    Ok(())
  }
}

/// Tears the tree down iteratively instead of recursing through `Box` drops.
impl Drop for Expression {
  fn drop(&mut self) {
    let mut stack = Vec::new();
    detach_children(self, &mut stack);
    while let Some(mut expr) = stack.pop() {
      detach_children(&mut expr, &mut stack);
    }
  }
}

fn detach_children(expr: &mut Expression, stack: &mut Vec<Expression>) {
  if let Expression::Binary { left, right, .. } = expr {
    stack.push(mem::replace(left.as_mut(), Expression::integer(0)));
    stack.push(mem::replace(right.as_mut(), Expression::integer(0)));
  }
}
