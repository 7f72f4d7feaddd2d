use tracing::debug;

use crate::diagnostics::Warning;
use crate::error::{CmacsError, Result};
use crate::lexical;
use crate::region::{ClassBody, ClassItem, MemberKind, MemberRegion, Region};
use crate::signature::{stored_type, Initializer, Param, Signature};
use crate::utils::{is_identifier, normalize_ws};

/// Placeholder emitted for fields whose type could not be grounded.
/// It does not compile, so the gap surfaces in the downstream build.
pub const OPAQUE_TYPE: &str = "auto /* cmacs: unresolved type */";

/// Leading words of class-body lines that never declare a data member
const NON_FIELD_WORDS: &[&str] = &[
  "using",
  "typedef",
  "friend",
  "static_assert",
  "static",
  "return",
  "enum",
  "class",
  "struct",
  "union",
  "template",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
  Declared(String),
  /// Inference failed; see [`OPAQUE_TYPE`]
  Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrigin {
  /// Written in the class body
  Explicit,
  /// Derived from a constructor initializer
  Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub name: String,
  pub ty: FieldType,
  pub origin: FieldOrigin,
  pub line: usize,
}

impl Field {
  /// `type name;`
  pub fn declaration(&self) -> String {
    match &self.ty {
      FieldType::Declared(ty) => format!("{} {};", ty, self.name),
      FieldType::Opaque => format!("{} {};", OPAQUE_TYPE, self.name),
    }
  }
}

/// One class member with its parsed signature and untouched body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
  pub kind: MemberKind,
  /// Line of the member directive
  pub line: usize,
  pub signature: Signature,
  /// Constructor initializer list, in source order
  pub initializers: Vec<Initializer>,
  /// Text between the body braces, exactly as written
  pub body: String,
}

/// Class body entries in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutItem {
  /// A plain line (access specifier, comment, field declaration)
  Text(String),
  /// Index into [`Class::members`]
  Member(usize),
}

/// The assembled class descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
  pub name: String,
  pub namespace: Option<String>,
  /// Line of the `class` directive
  pub line: usize,
  /// Head as written, whitespace-normalized, e.g. `class Main : public Base {`
  pub head: String,
  /// Closing text, e.g. `};`
  pub close: String,
  pub bases: Vec<String>,
  pub layout: Vec<LayoutItem>,
  pub members: Vec<Member>,
  /// Explicit fields first, then inferred ones in initializer order
  pub fields: Vec<Field>,
}

impl Class {
  /// `Namespace::Class` or `Class`
  pub fn qualified_name(&self) -> String {
    match &self.namespace {
      Some(ns) => format!("{}::{}", ns, self.name),
      None => self.name.clone(),
    }
  }

  /// The `main`-tagged member
  pub fn entry_point(&self) -> Option<&Member> {
    self
      .members
      .iter()
      .find(|m| m.kind == MemberKind::EntryPoint)
  }

  /// Fields that are not declared in the class body and must be emitted
  pub fn inferred_fields(&self) -> impl Iterator<Item = &Field> {
    self
      .fields
      .iter()
      .filter(|f| f.origin == FieldOrigin::Inferred)
  }
}

/// Assembler output: the class plus every warning raised on the way
#[derive(Debug, Clone)]
pub struct Assembly {
  pub class: Class,
  pub warnings: Vec<Warning>,
}

/// Build the class descriptor from the document's regions
pub fn assemble(regions: &[Region]) -> Result<Assembly> {
  let mut warnings = Vec::new();
  let mut namespace: Option<String> = None;
  let mut body: Option<&ClassBody> = None;

  for region in regions {
    match region {
      Region::Namespace { name, line } => {
        if let Some(previous) = namespace.replace(name.clone()) {
          warnings.push(Warning::NamespaceOverridden {
            previous,
            namespace: name.clone(),
            line: *line,
          });
        }
      }
      Region::Class(class) => body = Some(class),
      _ => {}
    }
  }

  let body = body.ok_or(CmacsError::MissingClass)?;

  let mut members = Vec::new();
  let mut layout = Vec::new();
  let mut fields = Vec::new();
  for item in &body.items {
    match item {
      ClassItem::Text(span) => {
        let text = span.text.trim().to_string();
        for (ty, name) in parse_field_declaration(&text) {
          fields.push(Field {
            name,
            ty: FieldType::Declared(ty),
            origin: FieldOrigin::Explicit,
            line: span.line,
          });
        }
        layout.push(LayoutItem::Text(text));
      }
      ClassItem::Member(region) => {
        layout.push(LayoutItem::Member(members.len()));
        members.push(assemble_member(region, &body.name)?);
      }
    }
  }

  let bases = parse_bases(&body.head);
  infer_fields(&body.name, &bases, &members, &mut fields, &mut warnings);

  debug!(
    class = %body.name,
    members = members.len(),
    fields = fields.len(),
    "assembled class"
  );

  Ok(Assembly {
    class: Class {
      name: body.name.clone(),
      namespace,
      line: body.line,
      head: normalize_ws(&body.head),
      close: body.close.trim().to_string(),
      bases,
      layout,
      members,
      fields,
    },
    warnings,
  })
}

fn assemble_member(region: &MemberRegion, class_name: &str) -> Result<Member> {
  let constructor = region.kind == MemberKind::Constructor;
  let malformed = |reason: String| CmacsError::MalformedSignature {
    tag: region.kind.tag().to_string(),
    line: region.line,
    reason,
  };

  let open = lexical::find_body_open(&region.text, constructor)
    .ok_or_else(|| malformed("missing body".to_string()))?;
  let close = lexical::matching_close(&region.text, open)
    .ok_or_else(|| malformed("unbalanced body".to_string()))?;

  let parsed =
    Signature::parse(&region.text[..open], constructor).map_err(|e| malformed(e.to_string()))?;
  let signature = parsed.signature;

  match region.kind {
    MemberKind::Constructor if signature.name != class_name => {
      return Err(malformed(format!(
        "constructor '{}' does not match class '{}'",
        signature.name, class_name
      )));
    }
    MemberKind::Destructor if signature.name != format!("~{}", class_name) => {
      return Err(malformed(format!(
        "destructor '{}' does not match class '{}'",
        signature.name, class_name
      )));
    }
    MemberKind::Method | MemberKind::EntryPoint if signature.return_type.is_empty() => {
      return Err(malformed("missing return type".to_string()));
    }
    _ => {}
  }

  Ok(Member {
    kind: region.kind,
    line: region.line,
    signature,
    initializers: parsed.initializers,
    body: region.text[open + 1..close].to_string(),
  })
}

/// `class Main : public Base, private Other<int> {` → [`Base`, `Other`]
fn parse_bases(head: &str) -> Vec<String> {
  let head = head.trim_end().trim_end_matches('{');
  let colon = match lexical::find_top_level_colon(head) {
    Some(colon) => colon,
    None => return Vec::new(),
  };

  lexical::split_top_level(&head[colon + 1..], ',')
    .into_iter()
    .filter_map(|base| {
      let base = base.split('<').next().unwrap_or("");
      base.split_whitespace().last().map(str::to_string)
    })
    .collect()
}

/// Explicit data member declarations on one class-body line
fn parse_field_declaration(line: &str) -> Vec<(String, String)> {
  let line = match line.find("//") {
    Some(comment) => line[..comment].trim(),
    None => line.trim(),
  };
  let line = ["public:", "protected:", "private:"]
    .iter()
    .find_map(|spec| line.strip_prefix(spec))
    .unwrap_or(line)
    .trim();

  let decl = match line.strip_suffix(';') {
    Some(decl) => decl.trim(),
    None => return Vec::new(),
  };
  let first_word = decl.split_whitespace().next().unwrap_or("");
  if NON_FIELD_WORDS.contains(&first_word) || decl.starts_with('#') {
    return Vec::new();
  }
  let decl = decl.strip_prefix("mutable ").unwrap_or(decl);
  // function declarations; a `(` inside the initializer does not count
  if lexical::find_top_level(strip_initializer(decl), '(', true).is_some() {
    return Vec::new();
  }

  let mut declarators = lexical::split_top_level(decl, ',').into_iter();
  let first = match declarators.next().map(strip_initializer).map(Param::parse) {
    Some(Param {
      ty,
      name: Some(name),
      ..
    }) => (ty, name),
    _ => return Vec::new(),
  };

  let base = first.0.trim_end_matches(['*', '&']).trim_end().to_string();
  let mut out = vec![first];
  for declarator in declarators {
    let declarator = strip_initializer(declarator).trim();
    let name = declarator.trim_start_matches(['*', '&']).trim();
    if !is_identifier(name) {
      continue;
    }
    let indirection = &declarator[..declarator.len() - name.len()];
    out.push((format!("{}{}", base, indirection.trim()), name.to_string()));
  }
  out
}

/// Cut `= value` or `{value}` off a declarator
fn strip_initializer(declarator: &str) -> &str {
  let cut = lexical::top_level_chars(declarator, true)
    .into_iter()
    .find(|&(_, c)| c == '=' || c == '{')
    .map(|(idx, _)| idx)
    .unwrap_or(declarator.len());
  &declarator[..cut]
}

/// `foo_`, `_foo`, `m_foo` → `foo`
fn base_name(field: &str) -> &str {
  let field = field.strip_prefix("m_").unwrap_or(field);
  field.trim_matches('_')
}

fn infer_fields(
  class_name: &str,
  bases: &[String],
  members: &[Member],
  fields: &mut Vec<Field>,
  warnings: &mut Vec<Warning>,
) {
  for ctor in members.iter().filter(|m| m.kind == MemberKind::Constructor) {
    let params = &ctor.signature.params;
    let param_named = |name: &str| params.iter().find(|p| p.name.as_deref() == Some(name));

    for init in &ctor.initializers {
      let delegating = init.name == class_name || bases.iter().any(|b| *b == init.name);
      if delegating || !is_identifier(&init.name) {
        continue;
      }
      if fields.iter().any(|f| f.name == init.name) {
        continue;
      }

      let param = param_named(base_name(&init.name)).or_else(|| param_named(init.args.trim()));
      let ty = match param {
        Some(param) => FieldType::Declared(stored_type(&param.ty)),
        None => {
          warnings.push(Warning::AmbiguousFieldType {
            field: init.name.clone(),
            line: ctor.line,
          });
          FieldType::Opaque
        }
      };
      fields.push(Field {
        name: init.name.clone(),
        ty,
        origin: FieldOrigin::Inferred,
        line: ctor.line,
      });
    }

    for name in params.iter().filter_map(|p| p.name.as_deref()) {
      let stored = ctor
        .initializers
        .iter()
        .any(|init| init.referenced_identifiers().contains(&name));
      let declared = fields.iter().any(|f| base_name(&f.name) == name);
      if !stored && !declared {
        warnings.push(Warning::UnusedConstructorParameter {
          parameter: name.to_string(),
          line: ctor.line,
        });
      }
    }
  }
}
