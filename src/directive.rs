use std::fmt;

/// Every tag understood after `#pragma cmacs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
  /// `includes` / `hppstart`: header, before the namespace
  Includes,
  /// `hpp` / `hppbody`: header, inside the namespace
  HeaderShared,
  /// `hppend`: header, after the namespace
  HeaderEnd,
  /// `cppstart`: implementation, right after the header include
  ImplStart,
  /// `cpp` / `cppbody`: implementation preamble
  ImplShared,
  /// `cppend`: implementation, after the entry point
  ImplEnd,
  Namespace,
  Nop,
  Class,
  Constructor,
  Destructor,
  Method,
  Main,
}

/// How much source text a directive governs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// The directive line only
  Inline,
  /// The following `{ ... }` block, braces excluded
  Block,
  /// The class head up to its opening brace; the scope ends at the matching `}`
  ClassHead,
  /// The following member definition, header and body
  Member,
}

impl DirectiveKind {
  /// Resolve a tag as written in the source
  pub fn from_tag(tag: &str) -> Option<Self> {
    let kind = match tag {
      "includes" | "hppstart" => Self::Includes,
      "hpp" | "hppbody" => Self::HeaderShared,
      "hppend" => Self::HeaderEnd,
      "cppstart" => Self::ImplStart,
      "cpp" | "cppbody" => Self::ImplShared,
      "cppend" => Self::ImplEnd,
      "namespace" => Self::Namespace,
      "nop" => Self::Nop,
      "class" => Self::Class,
      "constructor" => Self::Constructor,
      "destructor" => Self::Destructor,
      "method" => Self::Method,
      "main" => Self::Main,
      _ => return None,
    };
    Some(kind)
  }

  /// Canonical tag
  pub fn tag(&self) -> &'static str {
    match self {
      Self::Includes => "includes",
      Self::HeaderShared => "hpp",
      Self::HeaderEnd => "hppend",
      Self::ImplStart => "cppstart",
      Self::ImplShared => "cpp",
      Self::ImplEnd => "cppend",
      Self::Namespace => "namespace",
      Self::Nop => "nop",
      Self::Class => "class",
      Self::Constructor => "constructor",
      Self::Destructor => "destructor",
      Self::Method => "method",
      Self::Main => "main",
    }
  }

  pub fn shape(&self) -> Shape {
    match self {
      Self::Namespace | Self::Nop => Shape::Inline,
      Self::Class => Shape::ClassHead,
      Self::Constructor | Self::Destructor | Self::Method | Self::Main => Shape::Member,
      _ => Shape::Block,
    }
  }
}

impl fmt::Display for DirectiveKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}
