use std::fmt;

/// Non-fatal findings collected while assembling the class model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
  /// An initializer names a field that is neither declared nor matched by a parameter
  AmbiguousFieldType { field: String, line: usize },
  /// A constructor parameter is never stored and has no declared field
  UnusedConstructorParameter { parameter: String, line: usize },
  /// A later `namespace` directive replaced an earlier one
  NamespaceOverridden {
    previous: String,
    namespace: String,
    line: usize,
  },
}

impl Warning {
  /// Line the warning points at
  pub fn line(&self) -> usize {
    match self {
      Self::AmbiguousFieldType { line, .. }
      | Self::UnusedConstructorParameter { line, .. }
      | Self::NamespaceOverridden { line, .. } => *line,
    }
  }
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::AmbiguousFieldType { field, line } => write!(
        f,
        "line {}: cannot infer the type of field '{}'; declare it explicitly",
        line, field
      ),
      Self::UnusedConstructorParameter { parameter, line } => write!(
        f,
        "line {}: constructor parameter '{}' is not stored in any field",
        line, parameter
      ),
      Self::NamespaceOverridden {
        previous,
        namespace,
        line,
      } => write!(
        f,
        "line {}: namespace '{}' replaces earlier namespace '{}'",
        line, namespace, previous
      ),
    }
  }
}
