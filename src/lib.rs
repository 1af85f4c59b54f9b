//! Crate root: wires together the template compilation pipeline.
//!
//! The stages are small and composable so they can be evolved independently:
//! - `scanner` performs lexical analysis, one token at a time.
//! - `parser` owns all syntactic knowledge and returns the template's root nodes.
//! - `ast` holds the node and expression types shared by the later stages.
//! - `codegen` lowers the roots into a JavaScript module that creates, mounts
//!   and reactively updates DOM text nodes.
//! - `error` centralises the error types shared by the other modules.
//!
//! ```
//! let js = primoc::compile("Hello, { name }!").unwrap();
//! assert!(js.contains("createEffect(() => { text1.data = ctx[\"name\"]; });"));
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod parser;
pub mod scanner;

pub use ast::{Expression, Node, Span};
pub use codegen::{CompileOptions, Generator};
pub use error::{CompileError, CompileResult, ParseError};
pub use parser::{Parser, parse};
pub use scanner::{Scanner, Token, TokenKind, tokenize};

/// Compile a template into a JavaScript module using the default options.
pub fn compile(source: &str) -> CompileResult<String> {
  compile_with_options(source, &CompileOptions::default())
}

pub fn compile_with_options(source: &str, options: &CompileOptions) -> CompileResult<String> {
  Generator::new(source, options).generate()
}
