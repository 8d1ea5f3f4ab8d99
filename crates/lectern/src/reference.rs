//! Text references and their URL form.
//!
//! A reference ("ref") names a location inside a text: a book title followed by
//! zero or more section numbers, optionally ending in a range.
//!
//! | Human form              | URL form                |
//! |-------------------------|-------------------------|
//! | `Genesis 1:1`           | `Genesis.1.1`           |
//! | `Genesis 1:1-3`         | `Genesis.1.1-3`         |
//! | `Rashi on Genesis 1:1`  | `Rashi_on_Genesis.1.1`  |
//! | `Berakhot 2a`           | `Berakhot.2a`           |
//! | `Genesis`               | `Genesis`               |
//!
//! # Examples
//!
//! ```
//! use lectern::reference::{humanize_ref, normalize_ref, Ref};
//!
//! assert_eq!(normalize_ref("Rashi on Genesis 1:1"), "Rashi_on_Genesis.1.1");
//! assert_eq!(humanize_ref("Rashi_on_Genesis.1.1"), "Rashi on Genesis 1:1");
//!
//! let r: Ref = "Genesis 1:1-3".parse().unwrap();
//! assert_eq!(r.book(), "Genesis");
//! assert_eq!(r.section_ref().to_string(), "Genesis 1");
//! ```

use super::*;

lazy_static! {
  /// Splits a ref into book, starting sections and optional range end.
  ///
  /// The book is matched lazily so that trailing section numbers are never
  /// swallowed by it; separators may be human (`' '`, `':'`) or URL style
  /// (`'.'`, `'_'`).
  static ref REF_PATTERN: Regex = Regex::new(
    r"^(?P<book>.+?)[ ._](?P<sections>\d+[ab]?(?:[:.]\d+[ab]?)*)(?:-(?P<end>\d+[ab]?(?:[:.]\d+[ab]?)*))?$"
  )
  .expect("ref pattern is valid");
}

/// A parsed text reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
  /// Title of the book, with spaces
  book:     String,
  /// Section path of the start of the ref, e.g. `["1", "1"]`
  sections: Vec<String>,
  /// Trailing sections of the range end, relative to the end of `sections`
  end:      Vec<String>,
}

impl Ref {
  /// Title of the book this ref points into.
  pub fn book(&self) -> &str { &self.book }

  /// Section numbers of the start of the ref.
  pub fn sections(&self) -> &[String] { &self.sections }

  /// Whether this ref names a whole book rather than a location in it.
  pub fn is_book(&self) -> bool { self.sections.is_empty() }

  /// Whether this ref spans more than one location.
  pub fn is_range(&self) -> bool { !self.end.is_empty() }

  /// The enclosing section of this ref.
  ///
  /// Segment refs drop their last number (`Genesis 1:4` becomes `Genesis 1`).
  /// Refs that already name a top-level section or a whole book are returned
  /// unchanged, minus any range.
  pub fn section_ref(&self) -> Ref {
    let mut sections = self.sections.clone();
    if sections.len() > 1 {
      sections.pop();
    }
    Ref { book: self.book.clone(), sections, end: Vec::new() }
  }

  /// The URL form of this ref.
  pub fn normalized(&self) -> String {
    let mut out = self.book.replace(' ', "_");
    if !self.sections.is_empty() {
      out.push('.');
      out.push_str(&self.sections.join("."));
    }
    if !self.end.is_empty() {
      out.push('-');
      out.push_str(&self.end.join("."));
    }
    out
  }
}

impl FromStr for Ref {
  type Err = LecternError;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(LecternError::InvalidRef(s.to_string()));
    }

    let Some(captures) = REF_PATTERN.captures(trimmed) else {
      return Ok(Ref { book: trimmed.replace('_', " "), sections: Vec::new(), end: Vec::new() });
    };

    let split = |m: Option<regex::Match<'_>>| -> Vec<String> {
      m.map(|m| m.as_str().split(|c| c == ':' || c == '.').map(str::to_string).collect()).unwrap_or_default()
    };

    Ok(Ref {
      book:     captures["book"].replace('_', " "),
      sections: split(captures.name("sections")),
      end:      split(captures.name("end")),
    })
  }
}

impl Display for Ref {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.book)?;
    if !self.sections.is_empty() {
      write!(f, " {}", self.sections.join(":"))?;
    }
    if !self.end.is_empty() {
      write!(f, "-{}", self.end.join(":"))?;
    }
    Ok(())
  }
}

/// URL form of a ref string, falling back to plain character substitution for
/// input the parser rejects.
pub fn normalize_ref(reference: &str) -> String {
  match reference.parse::<Ref>() {
    Ok(parsed) => parsed.normalized(),
    Err(_) => reference.trim().replace(':', ".").replace(' ', "_"),
  }
}

/// Human form of a ref in URL form.
pub fn humanize_ref(reference: &str) -> String {
  match reference.parse::<Ref>() {
    Ok(parsed) => parsed.to_string(),
    Err(_) => reference.replace('_', " "),
  }
}

/// Book title of a ref string. Unparseable input is its own title.
pub fn book_title(reference: &str) -> String {
  reference.parse::<Ref>().map(|r| r.book).unwrap_or_else(|_| reference.to_string())
}

/// Section-level ref string for `reference`.
pub fn section_of(reference: &str) -> String {
  reference.parse::<Ref>().map(|r| r.section_ref().to_string()).unwrap_or_else(|_| reference.to_string())
}

/// Collapses an ordered list of refs into a single ref covering all of them.
///
/// Refs in the same book become a range from the first to the last
/// (`["Genesis 1:1", "Genesis 1:3"]` gives `Genesis 1:1-3`); anything else
/// falls back to the first ref.
pub fn span_refs(refs: &[String]) -> Option<String> {
  let first = refs.first()?;
  let last = refs.last()?;
  if refs.len() == 1 || first == last {
    return Some(first.clone());
  }

  let (Ok(start), Ok(stop)) = (first.parse::<Ref>(), last.parse::<Ref>()) else {
    return Some(first.clone());
  };
  if start.book != stop.book || start.is_range() || stop.sections.len() != start.sections.len() {
    return Some(first.clone());
  }

  let shared =
    start.sections.iter().zip(stop.sections.iter()).take_while(|(a, b)| a == b).count();
  if shared == start.sections.len() {
    return Some(first.clone());
  }
  let end = stop.sections[shared..].to_vec();
  Some(Ref { end, ..start }.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_segment_ref() {
    let r: Ref = "Genesis 1:1".parse().unwrap();
    assert_eq!(r.book(), "Genesis");
    assert_eq!(r.sections(), ["1", "1"]);
    assert!(!r.is_book());
    assert!(!r.is_range());
  }

  #[test]
  fn test_parse_multiword_book() {
    let r: Ref = "Rashi on Genesis 1:1:2".parse().unwrap();
    assert_eq!(r.book(), "Rashi on Genesis");
    assert_eq!(r.normalized(), "Rashi_on_Genesis.1.1.2");
  }

  #[test]
  fn test_parse_talmud_ref() {
    let r: Ref = "Berakhot 2a:5".parse().unwrap();
    assert_eq!(r.book(), "Berakhot");
    assert_eq!(r.sections(), ["2a", "5"]);
    assert_eq!(r.section_ref().to_string(), "Berakhot 2a");
  }

  #[test]
  fn test_bare_book() {
    let r: Ref = "Genesis".parse().unwrap();
    assert!(r.is_book());
    assert_eq!(r.normalized(), "Genesis");
    let r: Ref = "Mishneh_Torah,_Prayer".parse().unwrap();
    assert_eq!(r.book(), "Mishneh Torah, Prayer");
  }

  #[test]
  fn test_empty_ref_is_rejected() {
    assert!(matches!("  ".parse::<Ref>(), Err(LecternError::InvalidRef(_))));
  }

  #[test]
  fn test_normalize_and_humanize() {
    assert_eq!(normalize_ref("Genesis 1:1"), "Genesis.1.1");
    assert_eq!(normalize_ref("Genesis 1:1-3"), "Genesis.1.1-3");
    assert_eq!(humanize_ref("Genesis.1.1-3"), "Genesis 1:1-3");
    assert_eq!(humanize_ref("Song_of_Songs.2.4"), "Song of Songs 2:4");
  }

  #[test]
  fn test_section_of() {
    assert_eq!(section_of("Genesis 1:4"), "Genesis 1");
    assert_eq!(section_of("Genesis 1"), "Genesis 1");
    assert_eq!(section_of("Genesis 1:1-5"), "Genesis 1");
  }

  #[test]
  fn test_span_refs() {
    let refs = vec!["Genesis 1:1".to_string(), "Genesis 1:2".to_string(), "Genesis 1:3".to_string()];
    assert_eq!(span_refs(&refs).unwrap(), "Genesis 1:1-3");

    let refs = vec!["Genesis 1:30".to_string(), "Genesis 2:3".to_string()];
    assert_eq!(span_refs(&refs).unwrap(), "Genesis 1:30-2:3");

    let refs = vec!["Genesis 1:1".to_string(), "Exodus 1:1".to_string()];
    assert_eq!(span_refs(&refs).unwrap(), "Genesis 1:1");

    assert!(span_refs(&[]).is_none());
  }
}
