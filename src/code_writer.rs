use anyhow::Context as AnyhowContext;
use std::io::Write;

use crate::error::{CmacsError, Result};
use crate::utils::{dedent, ensure_ends_with_newline};

/// A writer for generating C++ with proper indentation
pub struct CodeWriter<W: Write> {
  /// The underlying writer
  writer: W,
  /// Current indentation level
  indent_level: usize,
  /// Number of spaces per indentation level
  indent_size: usize,
}

impl<W: Write> CodeWriter<W> {
  /// Create a new CodeWriter with two-space indentation
  pub fn new(writer: W) -> Self {
    Self::with_indent_size(writer, 2)
  }

  /// Create a new CodeWriter with a custom indentation size
  pub fn with_indent_size(writer: W, indent_size: usize) -> Self {
    Self {
      writer,
      indent_level: 0,
      indent_size,
    }
  }

  /// Increase the indentation level
  pub fn indent(&mut self) {
    self.indent_level += 1;
  }

  /// Decrease the indentation level
  pub fn dedent(&mut self) {
    self.indent_level = self.indent_level.saturating_sub(1);
  }

  /// Get the current indentation level
  pub fn indent_level(&self) -> usize {
    self.indent_level
  }

  fn put(&mut self, bytes: &[u8]) -> Result<()> {
    self.writer.write_all(bytes).map_err(CmacsError::Io)
  }

  /// Write each line of `content` at the current indentation, ending with a newline
  pub fn writeln(&mut self, content: &str) -> Result<()> {
    let indent = " ".repeat(self.indent_level * self.indent_size);

    for line in content.lines() {
      if !line.is_empty() {
        self.put(indent.as_bytes())?;
        self.put(line.as_bytes())?;
      }
      self.put(b"\n")?;
    }
    if content.is_empty() {
      self.put(b"\n")?;
    }
    Ok(())
  }

  /// Write `content` untouched
  pub fn write_raw(&mut self, content: &str) -> Result<()> {
    self.put(content.as_bytes())
  }

  /// Write a newline
  pub fn newline(&mut self) -> Result<()> {
    self.put(b"\n")
  }

  /// Write a verbatim block, stripped of its common indentation
  pub fn write_block(&mut self, content: &str) -> Result<()> {
    let block = dedent(content);
    if block.is_empty() {
      return Ok(());
    }
    self.writeln(&block)
  }

  /// Write a line comment
  pub fn write_comment(&mut self, comment: &str) -> Result<()> {
    if comment.contains('\n') {
      self.writeln("/*")?;
      for line in comment.lines() {
        self.writeln(&format!(" * {}", line))?;
      }
      self.writeln(" */")
    } else {
      self.writeln(&format!("// {}", comment))
    }
  }

  /// Write a #include directive
  pub fn write_include(&mut self, header: &str, is_system: bool) -> Result<()> {
    if is_system {
      self.writeln(&format!("#include <{}>", header))
    } else {
      self.writeln(&format!("#include \"{}\"", header))
    }
  }

  /// Write `#pragma once`
  pub fn write_pragma_once(&mut self) -> Result<()> {
    self.writeln("#pragma once")
  }

  /// Write a #define directive
  pub fn write_define(&mut self, name: &str, value: Option<&str>) -> Result<()> {
    match value {
      Some(val) => self.writeln(&format!("#define {} {}", name, val)),
      None => self.writeln(&format!("#define {}", name)),
    }
  }

  /// Write a #ifndef directive
  pub fn write_ifndef(&mut self, name: &str) -> Result<()> {
    self.writeln(&format!("#ifndef {}", name))
  }

  /// Write a #endif directive
  pub fn write_endif(&mut self, comment: Option<&str>) -> Result<()> {
    match comment {
      Some(cmt) => self.writeln(&format!("#endif // {}", cmt)),
      None => self.writeln("#endif"),
    }
  }

  /// Open a namespace; its contents are not indented
  pub fn begin_namespace(&mut self, name: &str) -> Result<()> {
    self.writeln(&format!("namespace {} {{", name))
  }

  /// Close a namespace
  pub fn end_namespace(&mut self, name: &str) -> Result<()> {
    self.writeln(&format!("}} // namespace {}", name))
  }

  /// Write an access specifier one level out from the members
  pub fn write_access_specifier(&mut self, specifier: &str) -> Result<()> {
    self.dedent();
    let result = self.writeln(specifier);
    self.indent();
    result
  }

  /// Begin a function definition
  pub fn begin_function(
    &mut self,
    ret_type: &str,
    name: &str,
    args: &[(&str, &str)],
  ) -> Result<()> {
    let args_formatted: Vec<String> = args
      .iter()
      .map(|(type_name, arg_name)| format!("{} {}", type_name, arg_name))
      .collect();

    self.writeln(&format!(
      "{} {}({}) {{",
      ret_type,
      name,
      args_formatted.join(", ")
    ))
  }

  /// End a function definition
  pub fn end_function(&mut self) -> Result<()> {
    self.writeln("}")
  }

  /// Flush the underlying writer
  pub fn flush(&mut self) -> Result<()> {
    self.writer.flush().map_err(CmacsError::Io)
  }

  /// Recover the underlying writer
  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl CodeWriter<Vec<u8>> {
  /// Run `f` against an in-memory writer and return what it wrote
  pub fn render<F>(indent_size: usize, f: F) -> Result<String>
  where
    F: FnOnce(&mut Self) -> Result<()>,
  {
    let mut writer = Self::with_indent_size(Vec::new(), indent_size);
    f(&mut writer)?;
    let text = String::from_utf8(writer.into_inner()).context("generated code is not valid UTF-8")?;
    Ok(text)
  }
}

/// Join rendered sections with one blank line between them, skipping empty ones
pub fn join_sections(sections: &[String]) -> String {
  sections
    .iter()
    .filter(|s| !s.trim().is_empty())
    .map(|s| ensure_ends_with_newline(s))
    .collect::<Vec<String>>()
    .join("\n")
}
