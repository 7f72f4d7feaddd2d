use std::io::Write;

use crate::code_writer::{join_sections, CodeWriter};
use crate::error::Result;
use crate::model::{Class, LayoutItem};
use crate::options::{GeneratorOptions, GuardStyle};
use crate::region::{MemberKind, Region};

/// First line of every generated file
pub const BANNER: &str = "Generated by cmacs. Do not edit.";

/// Render the declarations-only header.
///
/// Member bodies never reach this output; every member becomes a single
/// declaration line.
pub fn emit_header(regions: &[Region], class: &Class, options: &GeneratorOptions) -> Result<String> {
  let indent = options.indent_size;
  let mut sections = Vec::new();

  sections.push(CodeWriter::render(indent, |w| {
    w.write_comment(BANNER)?;
    match options.guard {
      GuardStyle::PragmaOnce => w.write_pragma_once(),
      GuardStyle::Macro => {
        let guard = options.guard_macro();
        w.write_ifndef(&guard)?;
        w.write_define(&guard, None)
      }
    }
  })?);

  for region in regions {
    if let Region::Include(include) = region {
      sections.push(CodeWriter::render(indent, |w| w.write_block(&include.text))?);
    }
  }

  if let Some(ns) = &class.namespace {
    sections.push(CodeWriter::render(indent, |w| w.begin_namespace(ns))?);
  }

  for region in regions {
    if let Region::HeaderShared(shared) = region {
      sections.push(CodeWriter::render(indent, |w| w.write_block(&shared.text))?);
    }
  }

  // loose text and the class keep their relative order
  let mut loose = String::new();
  for region in regions {
    match region {
      Region::Loose(text) => {
        loose.push_str(text.text.trim());
        loose.push('\n');
      }
      Region::Class(_) => {
        sections.push(std::mem::take(&mut loose));
        sections.push(CodeWriter::render(indent, |w| write_class(w, class))?);
      }
      _ => {}
    }
  }
  sections.push(loose);

  if let Some(ns) = &class.namespace {
    sections.push(CodeWriter::render(indent, |w| w.end_namespace(ns))?);
  }

  for region in regions {
    if let Region::HeaderEnd(end) = region {
      sections.push(CodeWriter::render(indent, |w| w.write_block(&end.text))?);
    }
  }

  if options.guard == GuardStyle::Macro {
    let guard = options.guard_macro();
    sections.push(CodeWriter::render(indent, |w| w.write_endif(Some(&guard)))?);
  }

  Ok(join_sections(&sections))
}

fn write_class<W: Write>(writer: &mut CodeWriter<W>, class: &Class) -> Result<()> {
  writer.writeln(&class.head)?;
  writer.indent();

  for item in &class.layout {
    match item {
      LayoutItem::Text(text) if is_access_specifier(text) => writer.write_access_specifier(text)?,
      LayoutItem::Text(text) => writer.writeln(text)?,
      LayoutItem::Member(index) => {
        let member = &class.members[*index];
        let force_static = member.kind == MemberKind::EntryPoint;
        writer.writeln(&format!("{};", member.signature.declaration(force_static)))?;
      }
    }
  }

  let inferred: Vec<String> = class.inferred_fields().map(|f| f.declaration()).collect();
  if !inferred.is_empty() {
    writer.write_access_specifier("private:")?;
    for field in &inferred {
      writer.writeln(field)?;
    }
  }

  writer.dedent();
  writer.writeln(&class.close)
}

fn is_access_specifier(text: &str) -> bool {
  ["public", "protected", "private"].iter().any(|spec| {
    text
      .strip_prefix(spec)
      .map_or(false, |rest| rest.trim_start().starts_with(':'))
  })
}
