//! Rendering matches into report entries.
use std::fmt;

use snafu::ensure;

use crate::{parser::marker::Match, ConfigSnafu, Error};

/// The glyph in front of every entry. Always exactly one character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bullet(char);

impl Default for Bullet {
    fn default() -> Self {
        Bullet('•')
    }
}

impl Bullet {
    /// ```rust
    /// use toad_lib::Bullet;
    ///
    /// assert!(Bullet::new("-").is_ok());
    /// assert!(Bullet::new("•").is_ok());
    /// assert!(Bullet::new("**").is_err());
    /// assert!(Bullet::new("").is_err());
    /// ```
    pub fn new(symbol: &str) -> Result<Self, Error> {
        let mut chars = symbol.chars();
        let first = chars.next();
        ensure!(
            first.is_some() && chars.next().is_none(),
            ConfigSnafu {
                msg: format!("bullet symbol must have only 1 character: {symbol}"),
            }
        );
        Ok(Bullet(first.unwrap_or_default()))
    }

    pub fn width(&self) -> usize {
        console::measure_text_width(&self.0.to_string())
    }
}

impl fmt::Display for Bullet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How matches are turned into entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Label in front of each body, eg `TODO`.
    pub summary: String,
    pub bullet: Bullet,
    /// Add `[i]` after the label, `i` being the 1-based place in the report.
    pub number_entries: bool,
    pub show_line_number: bool,
    /// When false the bullet, label and number are dropped and the whole
    /// trimmed line is shown, with a bare line number.
    pub summarize: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            summary: "TODO".into(),
            bullet: Bullet::default(),
            number_entries: true,
            show_line_number: true,
            summarize: true,
        }
    }
}

impl FormatOptions {
    /// Options for previewing lines that are about to be deleted.
    pub fn for_deletion() -> Self {
        FormatOptions {
            number_entries: false,
            summarize: false,
            ..FormatOptions::default()
        }
    }
}

/// One rendered line of the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub text: String,
    /// The line number of the match in its file.
    pub line_number: usize,
    pub annotation: Option<String>,
}

/// The text after the first colon of the line, trimmed.
///
/// ```rust
/// use toad_lib::format::body;
///
/// assert_eq!(body("  // TODO(2):  add a test  "), "add a test");
/// assert_eq!(body("TODO: see http://example.com"), "see http://example.com");
/// ```
pub fn body(raw_line: &str) -> &str {
    match raw_line.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => raw_line.trim(),
    }
}

impl FormatOptions {
    /// Render one match at 1-based `position` in the report.
    pub fn entry(&self, matched: &Match, position: usize) -> Entry {
        let (text, annotation) = if self.summarize {
            let body = body(&matched.raw_line);
            let text = if self.number_entries {
                format!("{} {}[{}]: {}", self.bullet, self.summary, position, body)
            } else {
                format!("{} {}: {}", self.bullet, self.summary, body)
            };
            let annotation = format!(
                " {}({})",
                " ".repeat(self.bullet.width()),
                matched.line_number
            );
            (text, annotation)
        } else {
            (
                matched.raw_line.trim().to_owned(),
                matched.line_number.to_string(),
            )
        };

        Entry {
            text,
            line_number: matched.line_number,
            annotation: if self.show_line_number {
                Some(annotation)
            } else {
                None
            },
        }
    }

    /// Render all matches in the order given.
    ///
    /// ```rust
    /// use toad_lib::{FormatOptions, Match};
    ///
    /// let matches = vec![Match { raw_line: "# TODO: tidy up".into(), line_number: 4 }];
    /// let entries = FormatOptions::default().entries(&matches);
    /// assert_eq!(entries[0].text, "• TODO[1]: tidy up");
    /// assert_eq!(entries[0].annotation.as_deref(), Some("  (4)"));
    /// ```
    pub fn entries(&self, matches: &[Match]) -> Vec<Entry> {
        matches
            .iter()
            .zip(1..)
            .map(|(matched, position)| self.entry(matched, position))
            .collect()
    }
}
