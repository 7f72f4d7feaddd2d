//! Splits an annotated C++ translation unit into a header and an implementation.
//!
//! The input mixes ordinary C++ with `#pragma cmacs TAG` directives:
//!
//! ```text
//! #pragma cmacs includes
//! {
//!   #include <iostream>
//! }
//! #pragma cmacs namespace Example
//! #pragma cmacs class
//! class Main {
//! public:
//!   #pragma cmacs main
//!   int main(int argc, char** argv) {
//!     std::cout << argc << std::endl;
//!     return 0;
//!   }
//! };
//! ```
//!
//! The pipeline runs scanner → region builder → class model assembler →
//! header and implementation emitters. Either both artifacts are produced
//! or the run fails with the first fatal error.

mod artifacts;
mod code_writer;
mod diagnostics;
mod directive;
mod error;
mod header;
mod implementation;
mod lexical;
mod model;
mod options;
mod region;
mod scanner;
mod signature;
#[cfg(test)]
mod tests;
mod utils;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as AnyhowContext;
use tracing::{debug, warn};

pub use artifacts::Artifacts;
pub use code_writer::CodeWriter;
pub use diagnostics::Warning;
pub use directive::{DirectiveKind, Shape};
pub use error::{CmacsError, Result};
pub use header::emit_header;
pub use implementation::{emit_implementation, entry_point_shim, ForwardingFunction};
pub use model::{
  assemble, Assembly, Class, Field, FieldOrigin, FieldType, LayoutItem, Member, OPAQUE_TYPE,
};
pub use options::{GeneratorOptions, GuardStyle, OutputPaths};
pub use region::{build_regions, ClassBody, ClassItem, MemberKind, MemberRegion, Region, SharedRegion};
pub use scanner::{scan, Directive, Scanner, Segment, TextSpan};
pub use signature::{Initializer, Param, Signature};

/// Transform one annotated document held in memory
pub fn transform(source: &str, options: &GeneratorOptions) -> Result<Artifacts> {
  let segments = scan(source)?;
  let regions = build_regions(segments)?;
  let Assembly { class, warnings } = assemble(&regions)?;

  for warning in &warnings {
    warn!(line = warning.line(), "{}", warning);
  }

  let header = emit_header(&regions, &class, options)?;
  let implementation = emit_implementation(&regions, &class, options)?;
  debug!(class = %class.qualified_name(), "transformed document");

  Ok(Artifacts {
    header,
    implementation,
    warnings,
  })
}

/// Read `input`, transform it and return the artifacts with their destinations.
///
/// Nothing is written; call [`Artifacts::write`] with the returned paths.
pub fn transform_file(
  input: &Path,
  here: bool,
  options: &GeneratorOptions,
) -> Result<(OutputPaths, Artifacts)> {
  let source = fs::read_to_string(input)
    .with_context(|| format!("Failed to read file: {}", input.display()))
    .map_err(|e| CmacsError::ReadFailed {
      path: input.to_path_buf(),
      source: e,
    })?;

  let options = options
    .clone()
    .with_header_name(OutputPaths::header_name_for(input));
  let artifacts = transform(&source, &options)?;
  Ok((OutputPaths::for_input(input, here), artifacts))
}

/// Transform `input` and write both artifacts next to it (or into the
/// working directory with `here`)
pub fn process_file(
  input: &Path,
  here: bool,
  options: &GeneratorOptions,
) -> Result<(OutputPaths, Artifacts)> {
  let (paths, artifacts) = transform_file(input, here, options)?;
  artifacts.write(&paths)?;
  Ok((paths, artifacts))
}

/// [`process_file`] for every input, in order. A failing input does not stop
/// the ones after it.
pub fn process_files(
  inputs: &[PathBuf],
  here: bool,
  options: &GeneratorOptions,
) -> Vec<Result<(OutputPaths, Artifacts)>> {
  inputs
    .iter()
    .map(|input| {
      let outcome = process_file(input, here, options);
      if let Err(e) = &outcome {
        debug!(input = %input.display(), error = %e, "input failed");
      }
      outcome
    })
    .collect()
}
