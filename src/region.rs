use regex::Regex;
use tracing::debug;

use crate::directive::DirectiveKind;
use crate::error::{CmacsError, Result};
use crate::scanner::{Directive, Segment, TextSpan};

/// Verbatim text routed to one output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedRegion {
  pub line: usize,
  pub text: String,
}

/// Role of a member directive inside a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
  Constructor,
  Destructor,
  Method,
  EntryPoint,
}

impl MemberKind {
  pub fn tag(&self) -> &'static str {
    match self {
      Self::Constructor => "constructor",
      Self::Destructor => "destructor",
      Self::Method => "method",
      Self::EntryPoint => "main",
    }
  }
}

/// A member directive and the definition text it governs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRegion {
  pub kind: MemberKind,
  /// Line of the directive
  pub line: usize,
  /// Line the definition starts on
  pub body_line: usize,
  /// Header line(s) and braced body
  pub text: String,
}

/// Something inside a class scope, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
  /// Access specifiers, comments, field declarations and other plain lines
  Text(TextSpan),
  Member(MemberRegion),
}

/// The scope opened by a `class` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBody {
  /// Line of the directive
  pub line: usize,
  pub name: String,
  /// `class Name : public Base {`
  pub head: String,
  pub items: Vec<ClassItem>,
  /// Closing text, typically `};`
  pub close: String,
}

impl ClassBody {
  pub fn members(&self) -> impl Iterator<Item = &MemberRegion> {
    self.items.iter().filter_map(|item| match item {
      ClassItem::Member(member) => Some(member),
      ClassItem::Text(_) => None,
    })
  }
}

/// Typed unit of the annotated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
  Include(SharedRegion),
  HeaderShared(SharedRegion),
  HeaderEnd(SharedRegion),
  ImplStart(SharedRegion),
  ImplShared(SharedRegion),
  ImplEnd(SharedRegion),
  /// Non-directive text outside the class; goes to the header body
  Loose(SharedRegion),
  Namespace { name: String, line: usize },
  /// `nop`: never emitted
  Note { text: String, line: usize },
  Class(ClassBody),
}

struct OpenScope {
  line: usize,
  name: String,
  head: String,
  items: Vec<ClassItem>,
}

/// Group scanned segments into regions, enforcing class-scope rules
pub fn build_regions(segments: Vec<Segment>) -> Result<Vec<Region>> {
  let head_pattern =
    Regex::new(r"^\s*(?:class|struct)\s+([A-Za-z_]\w*)").map_err(CmacsError::Regex)?;

  let mut regions = Vec::new();
  let mut scope: Option<OpenScope> = None;
  let mut class_line: Option<usize> = None;

  for segment in segments {
    match segment {
      Segment::Text(span) => match scope.as_mut() {
        Some(open) => {
          if !span.text.trim().is_empty() {
            open.items.push(ClassItem::Text(span));
          }
        }
        None => {
          if !span.text.trim().is_empty() {
            regions.push(Region::Loose(SharedRegion {
              line: span.line,
              text: span.text,
            }));
          }
        }
      },
      Segment::ClassEnd(span) => {
        // the scanner only emits this after a class head
        if let Some(open) = scope.take() {
          regions.push(close_scope(open, span.text)?);
        }
      }
      Segment::Directive(directive) => {
        if directive.kind == DirectiveKind::Class {
          if let Some(first_line) = class_line {
            return Err(CmacsError::DuplicateClass {
              line: directive.line,
              first_line,
            });
          }
          let name = head_pattern
            .captures(&directive.body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| CmacsError::MalformedDirective {
              tag: directive.tag.clone(),
              line: directive.line,
              reason: "expected 'class NAME' or 'struct NAME'".to_string(),
            })?;
          debug!(class = %name, line = directive.line, "opening class scope");
          class_line = Some(directive.line);
          scope = Some(OpenScope {
            line: directive.line,
            name,
            head: directive.body,
            items: Vec::new(),
          });
          continue;
        }

        if let Some(kind) = member_kind(directive.kind) {
          let open = scope.as_mut().ok_or_else(|| CmacsError::MemberOutsideClass {
            tag: directive.tag.clone(),
            line: directive.line,
          })?;
          open.items.push(ClassItem::Member(MemberRegion {
            kind,
            line: directive.line,
            body_line: directive.body_line,
            text: directive.body,
          }));
          continue;
        }

        regions.push(shared_region(directive)?);
      }
    }
  }

  Ok(regions)
}

fn member_kind(kind: DirectiveKind) -> Option<MemberKind> {
  match kind {
    DirectiveKind::Constructor => Some(MemberKind::Constructor),
    DirectiveKind::Destructor => Some(MemberKind::Destructor),
    DirectiveKind::Method => Some(MemberKind::Method),
    DirectiveKind::Main => Some(MemberKind::EntryPoint),
    _ => None,
  }
}

fn shared_region(directive: Directive) -> Result<Region> {
  let shared = SharedRegion {
    line: directive.body_line,
    text: directive.body,
  };

  let region = match directive.kind {
    DirectiveKind::Includes => Region::Include(shared),
    DirectiveKind::HeaderShared => Region::HeaderShared(shared),
    DirectiveKind::HeaderEnd => Region::HeaderEnd(shared),
    DirectiveKind::ImplStart => Region::ImplStart(shared),
    DirectiveKind::ImplShared => Region::ImplShared(shared),
    DirectiveKind::ImplEnd => Region::ImplEnd(shared),
    DirectiveKind::Nop => Region::Note {
      text: directive.args.join(" "),
      line: directive.line,
    },
    DirectiveKind::Namespace => {
      let name = directive
        .args
        .first()
        .cloned()
        .ok_or_else(|| CmacsError::MalformedDirective {
          tag: directive.tag.clone(),
          line: directive.line,
          reason: "missing namespace name".to_string(),
        })?;
      Region::Namespace {
        name,
        line: directive.line,
      }
    }
    // class and member directives are routed by the caller
    other => {
      return Err(CmacsError::MalformedDirective {
        tag: other.tag().to_string(),
        line: directive.line,
        reason: "not a shared region".to_string(),
      })
    }
  };
  Ok(region)
}

fn close_scope(open: OpenScope, close: String) -> Result<Region> {
  let body = ClassBody {
    line: open.line,
    name: open.name,
    head: open.head,
    items: open.items,
    close,
  };

  let mut members = body.members().peekable();
  if members.peek().is_none() {
    return Err(CmacsError::EmptyClassBody {
      class: body.name.clone(),
      line: body.line,
    });
  }

  let mut entry_line: Option<usize> = None;
  let mut destructor_line: Option<usize> = None;
  for member in members {
    let seen = match member.kind {
      MemberKind::EntryPoint => &mut entry_line,
      MemberKind::Destructor => &mut destructor_line,
      _ => continue,
    };
    if let Some(first_line) = *seen {
      return Err(match member.kind {
        MemberKind::EntryPoint => CmacsError::DuplicateEntryPoint {
          line: member.line,
          first_line,
        },
        _ => CmacsError::DuplicateDestructor {
          line: member.line,
          first_line,
        },
      });
    }
    *seen = Some(member.line);
  }

  if entry_line.is_none() {
    return Err(CmacsError::MissingEntryPoint {
      class: body.name,
      line: body.line,
    });
  }

  Ok(Region::Class(body))
}
