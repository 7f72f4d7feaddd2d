/// Convert a string to a valid identifier
pub fn to_valid_identifier(s: &str) -> String {
  let mut result = String::new();
  let mut chars = s.chars();

  // First character must be a letter or underscore
  if let Some(first) = chars.next() {
    if first.is_alphabetic() || first == '_' {
      result.push(first);
    } else {
      result.push('_');
    }
  }

  // Remaining characters can be alphanumeric or underscore
  for c in chars {
    if c.is_alphanumeric() || c == '_' {
      result.push(c);
    } else {
      result.push('_');
    }
  }

  result
}

/// Ensure a string ends with a newline
pub fn ensure_ends_with_newline(s: &str) -> String {
  if s.ends_with('\n') {
    s.to_string()
  } else {
    format!("{}\n", s)
  }
}

/// Collapse every run of whitespace (including newlines) into a single space
pub fn normalize_ws(s: &str) -> String {
  s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Whether `c` can appear in a C++ identifier
pub fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Whether `s` is a plain C++ identifier
pub fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) if first.is_alphabetic() || first == '_' => chars.all(is_ident_char),
    _ => false,
  }
}

/// Strip blank leading/trailing lines and the indentation common to all lines
pub fn dedent(text: &str) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let first = lines.iter().position(|l| !l.trim().is_empty());
  let last = lines.iter().rposition(|l| !l.trim().is_empty());
  let (first, last) = match (first, last) {
    (Some(f), Some(l)) => (f, l),
    _ => return String::new(),
  };
  let body = &lines[first..=last];

  let common = body
    .iter()
    .filter(|l| !l.trim().is_empty())
    .map(|l| l.len() - l.trim_start().len())
    .min()
    .unwrap_or(0);

  let mut out = String::new();
  for line in body {
    if line.trim().is_empty() {
      out.push('\n');
    } else {
      out.push_str(line[common..].trim_end());
      out.push('\n');
    }
  }
  out
}
