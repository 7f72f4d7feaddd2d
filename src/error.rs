use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the transformation of a document
#[derive(Error, Debug)]
pub enum CmacsError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to read input file: {path}")]
  ReadFailed {
    path: PathBuf,
    #[source]
    source: anyhow::Error,
  },

  #[error("Failed to write output file: {path}")]
  WriteFailed {
    path: PathBuf,
    #[source]
    source: anyhow::Error,
  },

  #[error("Unknown directive '{tag}' at line {line}")]
  UnknownDirectiveKind { tag: String, line: usize },

  #[error("Unterminated '{tag}' region starting at line {line}")]
  UnterminatedRegion { tag: String, line: usize },

  #[error("Malformed '{tag}' directive at line {line}: {reason}")]
  MalformedDirective {
    tag: String,
    line: usize,
    reason: String,
  },

  #[error("'{tag}' directive at line {line} is outside of a class")]
  MemberOutsideClass { tag: String, line: usize },

  #[error("Document has no 'class' directive")]
  MissingClass,

  #[error("Class '{class}' declared at line {line} has no members")]
  EmptyClassBody { class: String, line: usize },

  #[error("Class '{class}' declared at line {line} has no 'main' member")]
  MissingEntryPoint { class: String, line: usize },

  #[error("Second 'class' directive at line {line}: class already declared at line {first_line}")]
  DuplicateClass { line: usize, first_line: usize },

  #[error("Second 'destructor' directive at line {line}: destructor already declared at line {first_line}")]
  DuplicateDestructor { line: usize, first_line: usize },

  #[error("Second 'main' directive at line {line}: entry point already declared at line {first_line}")]
  DuplicateEntryPoint { line: usize, first_line: usize },

  #[error("Malformed '{tag}' signature at line {line}: {reason}")]
  MalformedSignature {
    tag: String,
    line: usize,
    reason: String,
  },

  #[error("'main' member at line {line} cannot forward to 'int main(int, char**)': {reason}")]
  EntryPointArityMismatch { line: usize, reason: String },

  #[error("Regex error: {0}")]
  Regex(#[from] regex::Error),

  #[error("Other error: {0}")]
  Other(#[from] anyhow::Error),
}

/// Result type for transformation operations
pub type Result<T> = std::result::Result<T, CmacsError>;
