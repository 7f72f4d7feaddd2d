//! Header-line parsing for member definitions.
//!
//! A member header such as `virtual int area(int scale = 1) const override`
//! is split into leading qualifiers, return type, name, parameters and
//! trailing qualifiers. Only brackets are understood; types stay opaque text.

use crate::lexical;
use crate::utils::{is_ident_char, is_identifier, normalize_ws};

/// Leading specifiers that belong to the declaration only
pub const LEADING_QUALIFIERS: &[&str] = &["virtual", "static", "inline", "explicit", "constexpr"];

/// Trailing specifiers that are illegal on an out-of-line definition
const DECLARATION_ONLY_TRAILING: &[&str] = &["override", "final"];

/// Words that read like a parameter name but are part of its type
const TYPE_WORDS: &[&str] = &[
  "int", "char", "short", "long", "unsigned", "signed", "float", "double", "bool", "void", "auto",
  "const", "volatile", "wchar_t", "size_t",
];

/// One entry of a parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  /// Declared type with the name removed, e.g. `const std::string&`
  pub ty: String,
  pub name: Option<String>,
  /// Default argument, declaration only
  pub default: Option<String>,
}

impl Param {
  /// Parse one comma-separated parameter declaration
  pub fn parse(text: &str) -> Self {
    let (decl, default) = match lexical::find_top_level(text, '=', true) {
      Some(eq) => (&text[..eq], Some(normalize_ws(&text[eq + 1..]))),
      None => (text, None),
    };
    let decl = normalize_ws(decl);

    // `char* argv[]`: the array suffix belongs to the type
    let (core, suffix) = match decl.find('[') {
      Some(bracket) => (decl[..bracket].trim_end(), decl[bracket..].trim()),
      None => (decl.as_str(), ""),
    };

    let split = core
      .char_indices()
      .rev()
      .take_while(|&(_, c)| is_ident_char(c))
      .last()
      .map(|(idx, _)| idx);

    let named = split.and_then(|idx| {
      let name = &core[idx..];
      let ty = core[..idx].trim_end();
      let looks_named = is_identifier(name)
        && !ty.is_empty()
        && !ty.ends_with("::")
        && !TYPE_WORDS.contains(&name);
      looks_named.then(|| (ty.to_string(), name.to_string()))
    });

    match named {
      Some((ty, name)) => Self {
        ty: format!("{}{}", ty, suffix_for(suffix)),
        name: Some(name),
        default,
      },
      None => Self {
        ty: decl.clone(),
        name: None,
        default,
      },
    }
  }

  /// `type name` without the default argument
  pub fn definition(&self) -> String {
    match &self.name {
      Some(name) => join_type_and_name(&self.ty, name),
      None => self.ty.clone(),
    }
  }

  /// `type name = default`
  pub fn declaration(&self) -> String {
    match &self.default {
      Some(default) => format!("{} = {}", self.definition(), default),
      None => self.definition(),
    }
  }
}

fn suffix_for(suffix: &str) -> String {
  if suffix.is_empty() {
    String::new()
  } else {
    format!(" {}", suffix)
  }
}

/// Glue a type and a name, keeping array suffixes after the name
fn join_type_and_name(ty: &str, name: &str) -> String {
  match ty.find('[') {
    Some(bracket) => format!("{} {}{}", ty[..bracket].trim_end(), name, &ty[bracket..]),
    None => format!("{} {}", ty, name),
  }
}

/// Type suitable for a data member initialized from a parameter of type `ty`.
///
/// `const T&` and `T&&` decay to `T`; anything else is kept as written.
pub fn stored_type(ty: &str) -> String {
  let ty = ty.trim();
  if !ty.ends_with('&') {
    return ty.to_string();
  }
  let base = ty.trim_end_matches('&').trim_end();
  let base = base.strip_prefix("const ").unwrap_or(base);
  let base = base.strip_suffix(" const").unwrap_or(base);
  base.trim().to_string()
}

/// `name(args)` or `name{args}` from a constructor initializer list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
  pub name: String,
  pub args: String,
  pub braced: bool,
}

impl Initializer {
  pub fn render(&self) -> String {
    if self.braced {
      format!("{}{{{}}}", self.name, self.args)
    } else {
      format!("{}({})", self.name, self.args)
    }
  }

  /// Identifiers referenced by the initializer arguments
  pub fn referenced_identifiers(&self) -> Vec<&str> {
    self
      .args
      .split(|c: char| !is_ident_char(c))
      .filter(|word| is_identifier(word))
      .collect()
  }
}

/// Parse the text between a constructor's `:` and its body
pub fn parse_initializers(text: &str) -> Option<Vec<Initializer>> {
  if text.trim().is_empty() {
    return Some(Vec::new());
  }

  lexical::split_top_level(text, ',')
    .into_iter()
    .map(|entry| {
      let entry = entry.trim();
      let open = lexical::top_level_chars(entry, true)
        .into_iter()
        .find(|&(_, c)| c == '(' || c == '{')
        .map(|(idx, _)| idx)?;
      let close = lexical::matching_close(entry, open)?;
      let name = normalize_ws(&entry[..open]);
      if name.is_empty() || !entry[close + 1..].trim().is_empty() {
        return None;
      }
      Some(Initializer {
        name,
        args: entry[open + 1..close].trim().to_string(),
        braced: entry[open..].starts_with('{'),
      })
    })
    .collect()
}

/// A parsed member header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
  /// Leading specifiers such as `virtual` or `static`, in source order
  pub qualifiers: Vec<String>,
  /// Empty for constructors and destructors
  pub return_type: String,
  pub name: String,
  pub params: Vec<Param>,
  /// Text after the parameter list, e.g. `const override`
  pub trailing: String,
}

/// Why a header could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
  MissingParameterList,
  UnbalancedParameterList,
  MissingName,
  MalformedInitializers,
}

impl std::fmt::Display for SignatureError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let msg = match self {
      Self::MissingParameterList => "missing parameter list",
      Self::UnbalancedParameterList => "unbalanced parameter list",
      Self::MissingName => "missing member name",
      Self::MalformedInitializers => "malformed initializer list",
    };
    f.write_str(msg)
  }
}

/// Header split into its signature and, for constructors, initializers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
  pub signature: Signature,
  pub initializers: Vec<Initializer>,
}

impl Signature {
  /// Parse a member header (everything before the body's `{`).
  ///
  /// With `initializer_list`, a top-level `:` after the parameters starts a
  /// constructor initializer list.
  pub fn parse(header: &str, initializer_list: bool) -> Result<ParsedHeader, SignatureError> {
    let mut open = lexical::find_top_level(header, '(', false)
      .ok_or(SignatureError::MissingParameterList)?;
    let mut close =
      lexical::matching_close(header, open).ok_or(SignatureError::UnbalancedParameterList)?;

    // `operator()` names itself with a pair of parentheses
    if header[..open].trim_end().ends_with("operator") {
      open = lexical::find_top_level(&header[close + 1..], '(', false)
        .map(|idx| close + 1 + idx)
        .ok_or(SignatureError::MissingParameterList)?;
      close =
        lexical::matching_close(header, open).ok_or(SignatureError::UnbalancedParameterList)?;
    }

    let before = &header[..open];
    let params_text = &header[open + 1..close];
    let after = &header[close + 1..];

    let (trailing, initializers) = match initializer_list
      .then(|| lexical::find_top_level_colon(after))
      .flatten()
    {
      Some(colon) => {
        let initializers =
          parse_initializers(&after[colon + 1..]).ok_or(SignatureError::MalformedInitializers)?;
        (&after[..colon], initializers)
      }
      None => (after, Vec::new()),
    };

    let mut words: Vec<&str> = before.split_whitespace().collect();
    let mut qualifiers = Vec::new();
    while let Some(first) = words.first() {
      if !LEADING_QUALIFIERS.contains(first) {
        break;
      }
      qualifiers.push(first.to_string());
      words.remove(0);
    }
    let rest = words.join(" ");

    let (return_type, name) = split_name(&rest);
    if name.is_empty() {
      return Err(SignatureError::MissingName);
    }

    let params = if params_text.trim().is_empty() || params_text.trim() == "void" {
      Vec::new()
    } else {
      lexical::split_top_level(params_text, ',')
        .into_iter()
        .map(Param::parse)
        .collect()
    };

    Ok(ParsedHeader {
      signature: Signature {
        qualifiers,
        return_type,
        name,
        params,
        trailing: normalize_ws(trailing),
      },
      initializers,
    })
  }

  /// In-class declaration, without the terminating `;`
  pub fn declaration(&self, force_static: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    if force_static {
      parts.extend(
        self
          .qualifiers
          .iter()
          .filter(|q| *q != "virtual" && *q != "static")
          .cloned(),
      );
      parts.insert(0, "static".to_string());
    } else {
      parts.extend(self.qualifiers.iter().cloned());
    }
    if !self.return_type.is_empty() {
      parts.push(self.return_type.clone());
    }

    let params: Vec<String> = self.params.iter().map(Param::declaration).collect();
    parts.push(format!("{}({})", self.name, params.join(", ")));
    if !self.trailing.is_empty() {
      parts.push(self.trailing.clone());
    }
    parts.join(" ")
  }

  /// Out-of-line definition head, qualified with `scope`
  pub fn definition(&self, scope: &str) -> String {
    let params: Vec<String> = self.params.iter().map(Param::definition).collect();
    let mut head = format!("{}::{}({})", scope, self.name, params.join(", "));
    if !self.return_type.is_empty() {
      head = format!("{} {}", self.return_type, head);
    }

    let trailing: Vec<&str> = self
      .trailing
      .split_whitespace()
      .filter(|word| !DECLARATION_ONLY_TRAILING.contains(word))
      .collect();
    if !trailing.is_empty() {
      head.push(' ');
      head.push_str(&trailing.join(" "));
    }
    head
  }
}

/// Split `int* foo` into (`int*`, `foo`), keeping `operator` names whole
fn split_name(text: &str) -> (String, String) {
  let text = text.trim();

  if let Some(pos) = find_operator(text) {
    return (text[..pos].trim().to_string(), normalize_ws(&text[pos..]));
  }

  let start = text
    .char_indices()
    .rev()
    .take_while(|&(_, c)| is_ident_char(c) || c == '~')
    .last()
    .map(|(idx, _)| idx)
    .unwrap_or(text.len());

  let name = text[start..].replace(' ', "");
  let return_type = text[..start].trim().to_string();
  (return_type, name)
}

fn find_operator(text: &str) -> Option<usize> {
  text.match_indices("operator").map(|(idx, _)| idx).find(|&idx| {
    let before_ok = text[..idx].chars().last().map_or(true, |c| !is_ident_char(c));
    let after_ok = text[idx + "operator".len()..]
      .chars()
      .next()
      .map_or(true, |c| !is_ident_char(c));
    before_ok && after_ok
  })
}
