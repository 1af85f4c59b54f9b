//! Code generation: lower parsed template roots into a JavaScript module.
//!
//! Emission is staged. Walking the roots appends to three ordered buffers
//! (imports, create statements, mount statements); `assemble` stitches them
//! into a single exported function at the end. Static text becomes a plain
//! text node, an interpolation becomes an empty text node kept in sync by a
//! reactive effect.

use indexmap::{IndexMap, IndexSet};
use snafu::{ResultExt, ensure};

use crate::ast::{Expression, Node};
use crate::error::{CompileResult, InvalidOptionSnafu, ParseSnafu};
use crate::parser;

/// Runtime primitive that re-runs a closure whenever the state it reads changes.
pub const EFFECT_BINDING: &str = "createEffect";

/// Knobs for the emitted module. `function_name` and `context_param` must be
/// plain JavaScript identifiers; `generate` rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
  /// Module the reactive primitives are imported from.
  pub runtime_module: String,
  /// Name of the exported template function.
  pub function_name: String,
  /// Name of the reactive context parameter.
  pub context_param: String,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      runtime_module: "core/signal".to_string(),
      function_name: "template".to_string(),
      context_param: "ctx".to_string(),
    }
  }
}

/// One compilation run. Buffers are owned here and consumed by [`generate`].
///
/// [`generate`]: Generator::generate
pub struct Generator<'a> {
  source: &'a str,
  options: &'a CompileOptions,
  imports: IndexMap<String, IndexSet<String>>,
  create: Vec<String>,
  mount: Vec<String>,
  text_nodes: usize,
}

impl<'a> Generator<'a> {
  pub fn new(source: &'a str, options: &'a CompileOptions) -> Self {
    Self {
      source,
      options,
      imports: IndexMap::new(),
      create: Vec::new(),
      mount: Vec::new(),
      text_nodes: 0,
    }
  }

  /// Parse the source and emit the module. Nothing is returned on failure.
  pub fn generate(mut self) -> CompileResult<String> {
    let options = self.options;
    ensure!(
      is_identifier(&options.function_name),
      InvalidOptionSnafu {
        option: "function name",
        value: options.function_name.as_str(),
      }
    );
    ensure!(
      is_identifier(&options.context_param) && !is_text_node(&options.context_param),
      InvalidOptionSnafu {
        option: "context parameter",
        value: options.context_param.as_str(),
      }
    );

    let roots = parser::parse(self.source).context(ParseSnafu)?;

    for root in &roots {
      match root {
        Node::StaticText { value, .. } => self.static_text(value),
        Node::Interpolation { expression, .. } => self.interpolation(expression),
      }
    }

    tracing::debug!(
      imports = self.imports.len(),
      create = self.create.len(),
      mount = self.mount.len(),
      "generated template"
    );
    Ok(self.assemble())
  }

  fn static_text(&mut self, value: &str) {
    let node = self.next_text_node();
    tracing::debug!(%node, len = value.len(), "static text");
    self.create.push(create_text_line(&node, value));
    self.mount.push(mount_line(&node));
  }

  fn interpolation(&mut self, expression: &Expression) {
    let node = self.next_text_node();
    let key = expression.render();
    tracing::debug!(%node, %key, "interpolation");

    let options = self.options;
    self.create.push(create_text_line(&node, ""));
    self.import(&options.runtime_module, EFFECT_BINDING);
    self
      .create
      .push(effect_line(&node, &options.context_param, &key));
    self.mount.push(mount_line(&node));
  }

  fn import(&mut self, module: &str, name: &str) {
    self
      .imports
      .entry(module.to_string())
      .or_default()
      .insert(name.to_string());
  }

  fn next_text_node(&mut self) -> String {
    let name = format!("text{}", self.text_nodes);
    self.text_nodes += 1;
    name
  }

  fn assemble(&self) -> String {
    let mut out = String::new();

    for (module, names) in &self.imports {
      if names.is_empty() {
        continue;
      }
      out.push_str(&import_line(module, names));
      out.push('\n');
    }

    out.push_str(&format!(
      "export function {}({}) {{",
      self.options.function_name, self.options.context_param
    ));

    if !self.create.is_empty() {
      out.push('\n');
      for stmt in &self.create {
        out.push_str(&format!("\t{stmt}\n"));
      }
    }

    if !self.mount.is_empty() {
      out.push_str("\treturn {\n");
      out.push_str("\t\tmount(container) {\n");
      for stmt in &self.mount {
        out.push_str(&format!("\t\t\t{stmt}\n"));
      }
      out.push_str("\t\t}\n");
      out.push_str("\t}\n");
    }

    out.push('}');
    out
  }
}

fn import_line(module: &str, names: &IndexSet<String>) -> String {
  let names: Vec<&str> = names.iter().map(String::as_str).collect();
  format!("import {{ {} }} from {};", names.join(", "), quote(module))
}

fn create_text_line(node: &str, text: &str) -> String {
  format!("const {node} = document.createTextNode({});", quote(text))
}

fn effect_line(node: &str, context: &str, key: &str) -> String {
  format!(
    "{EFFECT_BINDING}(() => {{ {node}.data = {context}[{}]; }});",
    quote(key)
  )
}

fn mount_line(node: &str) -> String {
  format!("container.appendChild({node});")
}

/// ASCII JavaScript identifier: `[A-Za-z_$][A-Za-z0-9_$]*`, and not one of
/// the names the emitted module already binds.
fn is_identifier(name: &str) -> bool {
  let mut bytes = name.bytes();
  let Some(first) = bytes.next() else {
    return false;
  };
  (first.is_ascii_alphabetic() || first == b'_' || first == b'$')
    && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
    && !matches!(name, "container" | "document" | EFFECT_BINDING)
    && !RESERVED_WORDS.contains(&name)
}

/// Names `next_text_node` hands out, declared `const` in the function body.
fn is_text_node(name: &str) -> bool {
  name
    .strip_prefix("text")
    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

const RESERVED_WORDS: &[&str] = &[
  "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
  "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
  "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
  "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Render `text` as a double-quoted JavaScript string literal.
pub fn quote(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('"');
  for ch in text.chars() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}
