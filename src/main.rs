use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;

use cmacs::{process_files, transform_file, GeneratorOptions, GuardStyle, OutputPaths};

#[derive(Parser)]
#[command(
  name = "cmacs",
  about = "Split annotated C++ sources into a header and an implementation"
)]
#[command(version)]
struct Cli {
  /// Annotated source files
  #[arg(required = true)]
  files: Vec<PathBuf>,
  /// Write outputs into the working directory instead of next to each input
  #[arg(long)]
  here: bool,
  /// Run clang-format -i on the generated files
  #[arg(long)]
  format: bool,
  /// Include guard style of the generated header
  #[arg(long, value_enum, default_value = "pragma-once")]
  guard: Guard,
  /// Spaces per indentation level in the class declaration
  #[arg(long, default_value_t = 2)]
  indent: usize,
  /// Print both artifacts to stdout instead of writing files
  #[arg(long, conflicts_with = "format")]
  stdout: bool,
  /// More log output (-v info, -vv debug)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Guard {
  PragmaOnce,
  Macro,
}

impl From<Guard> for GuardStyle {
  fn from(guard: Guard) -> Self {
    match guard {
      Guard::PragmaOnce => GuardStyle::PragmaOnce,
      Guard::Macro => GuardStyle::Macro,
    }
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let options = GeneratorOptions::default()
    .with_indent_size(cli.indent)
    .with_guard(cli.guard.into());

  let failures = if cli.stdout {
    print_files(&cli, &options)
  } else {
    write_files(&cli, &options)
  };

  if failures > 0 {
    ExitCode::from(1)
  } else {
    ExitCode::SUCCESS
  }
}

fn report(file: &Path, e: &anyhow::Error) {
  eprintln!("{} {}: {e:#}", "error:".red().bold(), file.display());
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
    )
    .with_writer(std::io::stderr)
    .init();
}

/// Write the artifacts of every input; returns how many inputs failed
fn write_files(cli: &Cli, options: &GeneratorOptions) -> usize {
  let outcomes = process_files(&cli.files, cli.here, options);
  let mut failures = 0;

  for (file, outcome) in cli.files.iter().zip(outcomes) {
    let result = outcome.map_err(anyhow::Error::from).and_then(|(paths, _)| {
      println!(
        "{} {} -> {}, {}",
        "wrote".green().bold(),
        file.display(),
        paths.header.display(),
        paths.implementation.display()
      );
      if cli.format {
        clang_format(&paths)?;
      }
      Ok(())
    });
    if let Err(e) = result {
      report(file, &e);
      failures += 1;
    }
  }
  failures
}

/// Print the artifacts of every input instead of writing them
fn print_files(cli: &Cli, options: &GeneratorOptions) -> usize {
  let mut failures = 0;
  for file in &cli.files {
    match transform_file(file, cli.here, options) {
      Ok((paths, artifacts)) => {
        println!("// {}", paths.header.display());
        print!("{}", artifacts.header);
        println!("// {}", paths.implementation.display());
        print!("{}", artifacts.implementation);
      }
      Err(e) => {
        report(file, &anyhow::Error::from(e));
        failures += 1;
      }
    }
  }
  failures
}

fn clang_format(paths: &OutputPaths) -> Result<()> {
  for path in [&paths.header, &paths.implementation] {
    info!(path = %path.display(), "running clang-format");
    let status = Command::new("clang-format")
      .arg("-i")
      .arg(path)
      .status()
      .context("Failed to run clang-format")?;
    if !status.success() {
      bail!("clang-format failed on {} ({})", path.display(), status);
    }
  }
  Ok(())
}
