use std::path::{Path, PathBuf};

use crate::utils::to_valid_identifier;

/// How the generated header protects itself against double inclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardStyle {
  /// `#pragma once`
  #[default]
  PragmaOnce,
  /// `#ifndef NAME_HPP` / `#define NAME_HPP` / `#endif`
  Macro,
}

/// Settings shared by both emitters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
  /// Spaces per indentation level inside the class declaration
  pub indent_size: usize,
  pub guard: GuardStyle,
  /// File name the implementation uses to include the header
  pub header_name: String,
}

impl GeneratorOptions {
  /// Options for the artifacts of `input`
  pub fn for_input(input: &Path) -> Self {
    Self::default().with_header_name(OutputPaths::header_name_for(input))
  }

  pub fn with_indent_size(mut self, indent_size: usize) -> Self {
    self.indent_size = indent_size;
    self
  }

  pub fn with_guard(mut self, guard: GuardStyle) -> Self {
    self.guard = guard;
    self
  }

  pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
    self.header_name = header_name.into();
    self
  }

  /// Macro used by [`GuardStyle::Macro`], derived from the header name
  pub fn guard_macro(&self) -> String {
    to_valid_identifier(&self.header_name).to_uppercase()
  }
}

impl Default for GeneratorOptions {
  fn default() -> Self {
    Self {
      indent_size: 2,
      guard: GuardStyle::PragmaOnce,
      header_name: "output.hpp".to_string(),
    }
  }
}

/// Where the two artifacts of one input document go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
  pub header: PathBuf,
  pub implementation: PathBuf,
}

impl OutputPaths {
  /// `dir/name.ext` → `dir/name.ext.hpp` and `dir/name.ext.cpp`.
  ///
  /// With `here`, both land in the working directory instead.
  pub fn for_input(input: &Path, here: bool) -> Self {
    let base = if here {
      PathBuf::from(input.file_name().unwrap_or(input.as_os_str()))
    } else {
      input.to_path_buf()
    };
    Self {
      header: with_suffix(&base, ".hpp"),
      implementation: with_suffix(&base, ".cpp"),
    }
  }

  /// File name of the header, as included by the implementation
  pub fn header_name_for(input: &Path) -> String {
    let name = input
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    format!("{}.hpp", name)
  }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
  let mut os = path.as_os_str().to_os_string();
  os.push(suffix);
  PathBuf::from(os)
}
