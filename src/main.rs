use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use primoc::{CompileError, CompileOptions, Node, compile_with_options, parse, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
  /// Generated JavaScript module
  Js,
  /// Scanner output, one token per line
  Tokens,
  /// Parsed root nodes
  Ast,
}

#[derive(Debug, Parser)]
#[command(name = "primoc", version)]
#[command(about = "Compile a text template into reactive DOM mounting code")]
struct Cli {
  /// Template file (`-` or omitted reads stdin)
  input: Option<PathBuf>,

  /// Write to FILE instead of stdout
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// What to print
  #[arg(long, value_enum, default_value_t = Emit::Js)]
  emit: Emit,

  /// Module the reactive runtime is imported from
  #[arg(long, value_name = "MODULE")]
  runtime_module: Option<String>,

  /// Name of the exported template function
  #[arg(long, value_name = "NAME")]
  function_name: Option<String>,

  /// Name of the reactive context parameter
  #[arg(long, value_name = "NAME")]
  context_param: Option<String>,

  /// Log pipeline stages to stderr
  #[arg(short, long)]
  verbose: bool,
}

impl Cli {
  fn options(&self) -> CompileOptions {
    let mut options = CompileOptions::default();
    if let Some(module) = &self.runtime_module {
      options.runtime_module = module.clone();
    }
    if let Some(name) = &self.function_name {
      options.function_name = name.clone();
    }
    if let Some(name) = &self.context_param {
      options.context_param = name.clone();
    }
    options
  }
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();
}

fn read_source(input: Option<&Path>) -> io::Result<String> {
  match input {
    Some(path) if path != Path::new("-") => fs::read_to_string(path),
    _ => {
      let mut source = String::new();
      io::stdin().read_to_string(&mut source)?;
      Ok(source)
    }
  }
}

fn fail(err: &CompileError, source: &str) -> ! {
  eprintln!("{err}");
  if let Some(excerpt) = err.excerpt(source) {
    eprintln!("{excerpt}");
  }
  process::exit(1);
}

/// One line per root: kind, byte span, then the text or rendered expression.
fn dump_node(node: &Node) -> String {
  let span = node.span();
  match node {
    Node::StaticText { value, .. } => {
      format!("StaticText    {}..{} {value:?}", span.start, span.end)
    }
    Node::Interpolation { expression, .. } => {
      format!("Interpolation {}..{} {expression}", span.start, span.end)
    }
  }
}

fn render(cli: &Cli, source: &str) -> String {
  match cli.emit {
    Emit::Tokens => tokenize(source)
      .iter()
      .map(|t| format!("{:>4}:{:<4} {:?} {:?}", t.row, t.col, t.kind, t.value))
      .collect::<Vec<_>>()
      .join("\n"),
    Emit::Ast => match parse(source) {
      Ok(roots) => roots.iter().map(dump_node).collect::<Vec<_>>().join("\n"),
      Err(source_err) => fail(&CompileError::Parse { source: source_err }, source),
    },
    Emit::Js => match compile_with_options(source, &cli.options()) {
      Ok(js) => js,
      Err(err) => fail(&err, source),
    },
  }
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let source = match read_source(cli.input.as_deref()) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("primoc: cannot read input: {err}");
      process::exit(1);
    }
  };

  let rendered = render(&cli, &source);

  match &cli.output {
    Some(path) => {
      if let Err(err) = fs::write(path, format!("{rendered}\n")) {
        eprintln!("primoc: cannot write {}: {err}", path.display());
        process::exit(1);
      }
    }
    None => println!("{rendered}"),
  }
}
