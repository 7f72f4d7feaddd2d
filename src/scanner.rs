use regex::Regex;
use tracing::debug;

use crate::directive::{DirectiveKind, Shape};
use crate::error::{CmacsError, Result};
use crate::lexical::{self, CharClass, Lexer};

/// A run of source text outside any directive body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
  /// 1-based line the span starts on
  pub line: usize,
  pub text: String,
}

/// A `#pragma cmacs` marker together with the text it governs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
  pub kind: DirectiveKind,
  /// The tag exactly as written, aliases included
  pub tag: String,
  pub args: Vec<String>,
  /// Line of the `#pragma` itself
  pub line: usize,
  /// Governed text; see [`Shape`] for what each kind captures
  pub body: String,
  /// Line the governed text starts on
  pub body_line: usize,
}

/// One element of the scanned stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Directive(Directive),
  Text(TextSpan),
  /// The `}` closing a class scope, with the rest of its line
  ClassEnd(TextSpan),
}

struct OpenClass {
  lexer: Lexer,
  tag: String,
  line: usize,
}

/// Splits annotated source into directives and the text between them
pub struct Scanner<'a> {
  source: &'a str,
  pos: usize,
  line: usize,
  directive_pattern: Regex,
  arg_pattern: Regex,
  classes: Vec<OpenClass>,
  segments: Vec<Segment>,
}

/// Scan `source` into an ordered, gap-free list of segments
pub fn scan(source: &str) -> Result<Vec<Segment>> {
  Scanner::new(source)?.run()
}

impl<'a> Scanner<'a> {
  /// Create a scanner positioned at the start of `source`
  pub fn new(source: &'a str) -> Result<Self> {
    let directive_pattern =
      Regex::new(r"^\s*#\s*pragma\s+cmacs(?:\s+(.*?))?\s*$").map_err(CmacsError::Regex)?;
    let arg_pattern = Regex::new(r#""([^"]*)"|(\S+)"#).map_err(CmacsError::Regex)?;

    Ok(Self {
      source,
      pos: 0,
      line: 1,
      directive_pattern,
      arg_pattern,
      classes: Vec::new(),
      segments: Vec::new(),
    })
  }

  /// Consume the whole source
  pub fn run(mut self) -> Result<Vec<Segment>> {
    let source = self.source;

    while self.pos < source.len() {
      let end = source[self.pos..]
        .find('\n')
        .map(|i| self.pos + i)
        .unwrap_or(source.len());
      let line_text = &source[self.pos..end];

      let rest = self
        .directive_pattern
        .captures(line_text)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()));

      match rest {
        Some(rest) => {
          let line = self.line;
          self.advance_to((end + 1).min(source.len()));
          self.directive(rest, line)?;
        }
        None => self.text(end),
      }
    }

    if let Some(open) = self.classes.pop() {
      return Err(CmacsError::UnterminatedRegion {
        tag: open.tag,
        line: open.line,
      });
    }

    debug!(segments = self.segments.len(), "scanned source");
    Ok(self.segments)
  }

  fn advance_to(&mut self, pos: usize) {
    self.line += self.source[self.pos..pos].matches('\n').count();
    self.pos = pos;
  }

  fn skip_blank(&mut self) -> Option<usize> {
    let start = self.source[self.pos..]
      .find(|c: char| !c.is_whitespace())
      .map(|i| self.pos + i)?;
    self.advance_to(start);
    Some(start)
  }

  /// Consume one line of plain text ending at `end`, closing the innermost
  /// class scope if its final `}` is on this line
  fn text(&mut self, end: usize) {
    let source = self.source;
    let line = self.line;
    let next = (end + 1).min(source.len());
    let chunk = &source[self.pos..next];

    if let Some(open) = self.classes.last_mut() {
      let mut iter = chunk.char_indices().peekable();
      while let Some((idx, c)) = iter.next() {
        let peek = iter.peek().map(|&(_, n)| n);
        if open.lexer.step(c, peek) == CharClass::Close && open.lexer.depth() == 0 {
          let before = &chunk[..idx];
          if !before.trim().is_empty() {
            self.segments.push(Segment::Text(TextSpan {
              line,
              text: before.to_string(),
            }));
          }
          self.segments.push(Segment::ClassEnd(TextSpan {
            line,
            text: source[self.pos + idx..end].to_string(),
          }));
          self.classes.pop();
          self.advance_to(next);
          return;
        }
      }
    }

    self.segments.push(Segment::Text(TextSpan {
      line,
      text: source[self.pos..end].to_string(),
    }));
    self.advance_to(next);
  }

  fn directive(&mut self, rest: &str, line: usize) -> Result<()> {
    let mut words = self.arg_pattern.captures_iter(rest).map(|caps| {
      caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or(String::new(), |m| m.as_str().to_string())
    });

    let tag = words.next().ok_or_else(|| CmacsError::MalformedDirective {
      tag: String::new(),
      line,
      reason: "missing directive name".to_string(),
    })?;
    let args: Vec<String> = words.collect();

    let kind = DirectiveKind::from_tag(&tag).ok_or_else(|| CmacsError::UnknownDirectiveKind {
      tag: tag.clone(),
      line,
    })?;
    debug!(tag = %tag, line, "directive");

    let unterminated = || CmacsError::UnterminatedRegion {
      tag: tag.clone(),
      line,
    };
    let source = self.source;

    let (body, body_line) = match kind.shape() {
      Shape::Inline => (String::new(), line),
      Shape::Block => {
        let open = self.skip_blank().ok_or_else(unterminated)?;
        if !source[open..].starts_with('{') {
          return Err(CmacsError::MalformedDirective {
            tag,
            line,
            reason: "expected a '{' block".to_string(),
          });
        }
        let body_line = self.line;
        let close = lexical::matching_close(source, open).ok_or_else(unterminated)?;
        self.advance_to(close + 1);
        (source[open + 1..close].to_string(), body_line)
      }
      Shape::Member => {
        let start = self.skip_blank().ok_or_else(unterminated)?;
        let body_line = self.line;
        let rest = &source[start..];
        let open = lexical::find_body_open(rest, kind == DirectiveKind::Constructor)
          .ok_or_else(unterminated)?;
        let close = lexical::matching_close(rest, open).ok_or_else(unterminated)?;
        self.advance_to(start + close + 1);
        (rest[..=close].to_string(), body_line)
      }
      Shape::ClassHead => {
        let start = self.skip_blank().ok_or_else(unterminated)?;
        let body_line = self.line;
        let rest = &source[start..];
        let open = lexical::find_top_level(rest, '{', false).ok_or_else(unterminated)?;
        self.advance_to(start + open + 1);
        self.classes.push(OpenClass {
          lexer: Lexer::with_depth(1),
          tag: tag.clone(),
          line,
        });
        (rest[..=open].to_string(), body_line)
      }
    };

    self.segments.push(Segment::Directive(Directive {
      kind,
      tag,
      args,
      line,
      body,
      body_line,
    }));
    Ok(())
  }
}
