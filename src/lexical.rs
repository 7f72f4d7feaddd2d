//! Bracket-aware scanning over C++ text.
//!
//! Nothing here understands C++ beyond what is needed to find matching
//! brackets: string and character literals and comments are skipped so that
//! a `}` inside `"}"` or `// }` never closes a block.

/// What a character means to the bracket tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
  /// Inside a literal or a comment
  Trivia,
  /// Ordinary code character
  Code,
  /// One of `(`, `[`, `{`
  Open,
  /// One of `)`, `]`, `}`
  Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Code,
  LineComment,
  BlockCommentStart,
  BlockComment,
  BlockCommentEnd,
  Str,
  StrEscape,
  Char,
  CharEscape,
}

/// Incremental bracket tracker
#[derive(Debug, Clone)]
pub struct Lexer {
  depth: usize,
  state: State,
  prev: char,
}

impl Lexer {
  /// Create a lexer at depth zero
  pub fn new() -> Self {
    Self::with_depth(0)
  }

  /// Create a lexer that is already nested `depth` brackets deep
  pub fn with_depth(depth: usize) -> Self {
    Self {
      depth,
      state: State::Code,
      prev: ' ',
    }
  }

  /// Current bracket depth
  pub fn depth(&self) -> usize {
    self.depth
  }

  /// Classify `c` and advance. `next` is the character following `c`.
  pub fn step(&mut self, c: char, next: Option<char>) -> CharClass {
    let class = match self.state {
      State::LineComment => {
        if c == '\n' {
          self.state = State::Code;
        }
        CharClass::Trivia
      }
      State::BlockCommentStart => {
        self.state = State::BlockComment;
        CharClass::Trivia
      }
      State::BlockComment => {
        if c == '*' && next == Some('/') {
          self.state = State::BlockCommentEnd;
        }
        CharClass::Trivia
      }
      State::BlockCommentEnd => {
        self.state = State::Code;
        CharClass::Trivia
      }
      State::Str => {
        match c {
          '\\' => self.state = State::StrEscape,
          '"' => self.state = State::Code,
          _ => {}
        }
        CharClass::Trivia
      }
      State::StrEscape => {
        self.state = State::Str;
        CharClass::Trivia
      }
      State::Char => {
        match c {
          '\\' => self.state = State::CharEscape,
          '\'' => self.state = State::Code,
          _ => {}
        }
        CharClass::Trivia
      }
      State::CharEscape => {
        self.state = State::Char;
        CharClass::Trivia
      }
      State::Code => match c {
        '/' if next == Some('/') => {
          self.state = State::LineComment;
          CharClass::Trivia
        }
        '/' if next == Some('*') => {
          self.state = State::BlockCommentStart;
          CharClass::Trivia
        }
        '"' => {
          self.state = State::Str;
          CharClass::Trivia
        }
        // digit separators such as 1'000 are not character literals
        '\'' if !self.prev.is_ascii_alphanumeric() => {
          self.state = State::Char;
          CharClass::Trivia
        }
        '(' | '[' | '{' => {
          self.depth += 1;
          CharClass::Open
        }
        ')' | ']' | '}' => {
          self.depth = self.depth.saturating_sub(1);
          CharClass::Close
        }
        _ => CharClass::Code,
      },
    };
    if class != CharClass::Trivia {
      self.prev = c;
    }
    class
  }
}

/// Byte offsets and characters of `text` that sit at bracket depth zero.
///
/// Opening brackets are reported when they open from depth zero, closing
/// brackets never are. With `angle_aware`, characters between top-level
/// `<` and `>` are also treated as nested.
pub fn top_level_chars(text: &str, angle_aware: bool) -> Vec<(usize, char)> {
  let mut lexer = Lexer::new();
  let mut angle = 0usize;
  let mut prev = ' ';
  let mut out = Vec::new();
  let mut iter = text.char_indices().peekable();

  while let Some((idx, c)) = iter.next() {
    let next = iter.peek().map(|&(_, n)| n);
    let before = lexer.depth();
    match lexer.step(c, next) {
      CharClass::Trivia => continue,
      CharClass::Open if before == 0 && angle == 0 => out.push((idx, c)),
      CharClass::Code if before == 0 => {
        if angle_aware && c == '<' {
          if angle == 0 {
            out.push((idx, c));
          }
          angle += 1;
        } else if angle_aware && c == '>' && angle > 0 && prev != '-' {
          angle -= 1;
        } else if angle == 0 {
          out.push((idx, c));
        }
      }
      _ => {}
    }
    prev = c;
  }
  out
}

/// First top-level occurrence of `target`
pub fn find_top_level(text: &str, target: char, angle_aware: bool) -> Option<usize> {
  top_level_chars(text, angle_aware)
    .into_iter()
    .find(|&(_, c)| c == target)
    .map(|(idx, _)| idx)
}

/// First top-level `:` that is not part of a `::` scope operator
pub fn find_top_level_colon(text: &str) -> Option<usize> {
  let bytes = text.as_bytes();
  top_level_chars(text, false)
    .into_iter()
    .filter(|&(_, c)| c == ':')
    .map(|(idx, _)| idx)
    .find(|&idx| {
      let before = idx > 0 && bytes[idx - 1] == b':';
      let after = bytes.get(idx + 1) == Some(&b':');
      !before && !after
    })
}

/// Offset of the bracket closing the one opened at `open`
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
  let mut lexer = Lexer::new();
  let mut iter = text[open..].char_indices().peekable();

  while let Some((idx, c)) = iter.next() {
    let next = iter.peek().map(|&(_, n)| n);
    if lexer.step(c, next) == CharClass::Close && lexer.depth() == 0 {
      return Some(open + idx);
    }
  }
  None
}

/// Split on top-level `sep`, aware of brackets, templates, literals and comments
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut start = 0;
  for (idx, c) in top_level_chars(text, true) {
    if c == sep {
      parts.push(&text[start..idx]);
      start = idx + c.len_utf8();
    }
  }
  parts.push(&text[start..]);
  parts
}

/// Offset of the `{` that opens a member body.
///
/// With `initializer_list`, brace-initializers such as `value_{v}` after the
/// constructor's `:` are skipped.
pub fn find_body_open(text: &str, initializer_list: bool) -> Option<usize> {
  let bytes = text.as_bytes();
  let mut lexer = Lexer::new();
  let mut after_params = false;
  let mut in_initializers = false;
  let mut last = ' ';
  let mut iter = text.char_indices().peekable();

  while let Some((idx, c)) = iter.next() {
    let next = iter.peek().map(|&(_, n)| n);
    let before = lexer.depth();
    let class = lexer.step(c, next);
    let top = match class {
      CharClass::Trivia => false,
      CharClass::Close => lexer.depth() == 0,
      _ => before == 0,
    };
    if !top {
      continue;
    }
    match c {
      '{' => {
        let brace_init = in_initializers && (crate::utils::is_ident_char(last) || last == '>');
        if !brace_init {
          return Some(idx);
        }
      }
      '(' => after_params = true,
      ':' if initializer_list && after_params => {
        let scope = next == Some(':') || (idx > 0 && bytes[idx - 1] == b':');
        if !scope {
          in_initializers = true;
        }
      }
      _ => {}
    }
    if !c.is_whitespace() {
      last = c;
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_matching_close_skips_literals() {
    let text = "{ s = \"}\"; c = '}'; // }\n /* } */ }";
    assert_eq!(matching_close(text, 0), Some(text.len() - 1));
  }

  #[test]
  fn test_split_top_level_templates() {
    let parts = split_top_level("std::map<int, int> m, int (*f)(int, int), const char* s = \"a,b\"", ',');
    assert_eq!(
      parts,
      vec![
        "std::map<int, int> m",
        " int (*f)(int, int)",
        " const char* s = \"a,b\""
      ]
    );
  }

  #[test]
  fn test_find_body_open_with_brace_initializers() {
    let text = "Point(int x, int y) : x_{x}, y_(y) { init(); }";
    let open = find_body_open(text, true).unwrap();
    assert_eq!(&text[open..], "{ init(); }");
  }

  #[test]
  fn test_find_body_open_method_with_qualifiers() {
    let text = "int size() const override {\n  return n_;\n}";
    let open = find_body_open(text, false).unwrap();
    assert_eq!(&text[open..open + 1], "{");
    assert_eq!(&text[..open], "int size() const override ");
  }

  #[test]
  fn test_colon_ignores_scope_operator() {
    assert_eq!(find_top_level_colon("Main(std::string s) : s_(s)"), Some(20));
    assert_eq!(find_top_level_colon(" std::string"), None);
  }
}
