use indexmap::IndexSet;
use std::io::Write;

use crate::code_writer::{join_sections, CodeWriter};
use crate::error::{CmacsError, Result};
use crate::header::BANNER;
use crate::model::{Class, Member};
use crate::options::GeneratorOptions;
use crate::region::Region;
use crate::utils::{dedent, normalize_ws};

/// Spellings of the second `main` parameter, whitespace removed
const ARGV_TYPES: &[&str] = &[
  "char**",
  "char*[]",
  "constchar**",
  "constchar*[]",
  "char*const*",
  "char*const[]",
  "constchar*const*",
  "constchar*const[]",
];

const NO_ARGS: &[&str] = &[];
const ARGC_ARGV: &[&str] = &["argc", "argv"];

/// A free function whose only statement returns a qualified call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingFunction {
  return_type: String,
  name: String,
  params: Vec<(String, String)>,
  target: String,
  args: Vec<String>,
}

impl ForwardingFunction {
  pub fn new(return_type: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      return_type: return_type.into(),
      name: name.into(),
      params: Vec::new(),
      target: String::new(),
      args: Vec::new(),
    }
  }

  /// Append a parameter
  pub fn param(mut self, ty: impl Into<String>, name: impl Into<String>) -> Self {
    self.params.push((ty.into(), name.into()));
    self
  }

  /// Set the call target and the parameters passed through to it
  pub fn forward_to(mut self, target: impl Into<String>, args: &[&str]) -> Self {
    self.target = target.into();
    self.args = args.iter().map(|a| a.to_string()).collect();
    self
  }

  pub fn write<W: Write>(&self, writer: &mut CodeWriter<W>) -> Result<()> {
    let params: Vec<(&str, &str)> = self
      .params
      .iter()
      .map(|(ty, name)| (ty.as_str(), name.as_str()))
      .collect();

    writer.begin_function(&self.return_type, &self.name, &params)?;
    writer.indent();
    writer.writeln(&format!("return {}({});", self.target, self.args.join(", ")))?;
    writer.dedent();
    writer.end_function()
  }
}

/// Build the process entry point that forwards to the class's `main` member.
///
/// The target convention is `int main(int argc, char** argv)`. A member
/// taking no parameters is called without arguments; anything else fails.
pub fn entry_point_shim(class: &Class) -> Result<ForwardingFunction> {
  let entry = class
    .entry_point()
    .ok_or_else(|| CmacsError::MissingEntryPoint {
      class: class.name.clone(),
      line: class.line,
    })?;
  let signature = &entry.signature;
  let mismatch = |reason: String| CmacsError::EntryPointArityMismatch {
    line: entry.line,
    reason,
  };

  let return_type = normalize_ws(&signature.return_type);
  if return_type != "int" {
    return Err(mismatch(format!(
      "returns '{}' instead of 'int'",
      return_type
    )));
  }

  let args = match signature.params.as_slice() {
    [] => NO_ARGS,
    [count, argv] => {
      if !is_count_type(&count.ty) {
        return Err(mismatch(format!(
          "first parameter has type '{}' instead of 'int'",
          count.ty
        )));
      }
      if !is_argv_type(&argv.ty) {
        return Err(mismatch(format!(
          "second parameter has type '{}' instead of 'char**'",
          argv.ty
        )));
      }
      ARGC_ARGV
    }
    params => {
      return Err(mismatch(format!(
        "takes {} parameters instead of 0 or 2",
        params.len()
      )))
    }
  };

  Ok(
    ForwardingFunction::new("int", "main")
      .param("int", "argc")
      .param("char**", "argv")
      .forward_to(
        format!("::{}::{}", class.qualified_name(), signature.name),
        args,
      ),
  )
}

fn is_count_type(ty: &str) -> bool {
  let ty = normalize_ws(ty);
  ty == "int" || ty == "const int"
}

fn is_argv_type(ty: &str) -> bool {
  let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
  ARGV_TYPES.contains(&compact.as_str())
}

/// Render the implementation: header include, preambles, one out-of-line
/// definition per member in declaration order, then the entry point shim
pub fn emit_implementation(
  regions: &[Region],
  class: &Class,
  options: &GeneratorOptions,
) -> Result<String> {
  let indent = options.indent_size;
  let shim = entry_point_shim(class)?;
  let mut sections = Vec::new();

  sections.push(CodeWriter::render(indent, |w| {
    w.write_comment(BANNER)?;
    w.write_include(&options.header_name, false)
  })?);

  for region in regions {
    if let Region::ImplStart(start) = region {
      sections.push(CodeWriter::render(indent, |w| w.write_block(&start.text))?);
    }
  }

  if let Some(ns) = &class.namespace {
    sections.push(format!("using namespace {};\n", ns));
  }

  sections.push(preamble(regions));

  let scope = class.qualified_name();
  for member in &class.members {
    sections.push(CodeWriter::render(indent, |w| {
      write_definition(w, &scope, member)
    })?);
  }

  sections.push(CodeWriter::render(indent, |w| shim.write(w))?);

  for region in regions {
    if let Region::ImplEnd(end) = region {
      sections.push(CodeWriter::render(indent, |w| w.write_block(&end.text))?);
    }
  }

  Ok(join_sections(&sections))
}

/// All `cpp` regions, each copied verbatim. A block identical to an earlier
/// one is skipped, as is a single-line `using` or `#include` already emitted.
fn preamble(regions: &[Region]) -> String {
  let mut blocks: IndexSet<String> = IndexSet::new();
  let mut declarations: IndexSet<String> = IndexSet::new();
  let mut out = String::new();

  for region in regions {
    let Region::ImplShared(shared) = region else {
      continue;
    };
    let block = dedent(&shared.text);
    if block.is_empty() || !blocks.insert(block.clone()) {
      continue;
    }
    for line in block.lines() {
      let trimmed = line.trim();
      if is_single_line_declaration(trimmed) && !declarations.insert(trimmed.to_string()) {
        continue;
      }
      out.push_str(line);
      out.push('\n');
    }
  }
  out
}

fn is_single_line_declaration(line: &str) -> bool {
  (line.starts_with("using ") && line.ends_with(';')) || line.starts_with("#include")
}

fn write_definition<W: Write>(writer: &mut CodeWriter<W>, scope: &str, member: &Member) -> Result<()> {
  writer.writeln(&member.signature.definition(scope))?;

  writer.indent();
  for (i, init) in member.initializers.iter().enumerate() {
    let lead = if i == 0 { ":" } else { "," };
    writer.writeln(&format!("{} {}", lead, init.render()))?;
  }
  writer.dedent();

  writer.write_raw("{")?;
  writer.write_raw(body_text(&member.body))?;
  writer.write_raw("}\n")
}

/// The body as written, minus the indentation in front of its closing brace
fn body_text(body: &str) -> &str {
  match body.rfind('\n') {
    Some(last) if body[last + 1..].trim().is_empty() => &body[..=last],
    _ => body,
  }
}
