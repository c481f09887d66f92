//! # Finding marker lines.
//!
//! A line is a match when it contains the marker (ignoring case) as part of a
//! colon-terminated token such as `TODO:`, `todo(3):` or `TODOfix:`. A bare
//! mention of the marker in prose is not a match.
use nom::{character::complete as character, IResult};
use regex::{Regex, RegexBuilder};
use snafu::{ensure, ResultExt};

use super::split_lines;
use crate::{ConfigSnafu, Error, PatternSnafu};

/// A line that carries the marker token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub raw_line: String,
    /// 1-based.
    pub line_number: usize,
}

/// A match whose token asked for a specific place in the final ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionalMatch {
    pub matched: Match,
    /// 1-based, never zero.
    pub target_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScannedLine {
    Plain(Match),
    Positional(PositionalMatch),
}

impl ScannedLine {
    pub fn into_match(self) -> Match {
        match self {
            ScannedLine::Plain(m) => m,
            ScannedLine::Positional(p) => p.matched,
        }
    }
}

/// Eat a number wrapped in the given brackets, eg `(12)`.
///
/// ```rust
/// use toad_lib::parser::marker::*;
///
/// assert_eq!(bracketed_number('[', ']')("[42]: rest"), Ok((": rest", "42")));
/// assert!(bracketed_number('(', ')')("()").is_err());
/// ```
pub fn bracketed_number(open: char, close: char) -> impl Fn(&str) -> IResult<&str, &str> {
    move |i: &str| {
        let (i, _) = character::char(open)(i)?;
        let (i, digits) = character::digit1(i)?;
        let (i, _) = character::char(close)(i)?;
        Ok((i, digits))
    }
}

/// Bracket pairs that may carry a position, in priority order.
pub const POSITION_BRACKETS: &[(char, char); 3] = &[('(', ')'), ('[', ']'), ('{', '}')];

/// Find the position requested by a marker token, if any.
///
/// The first bracket form in [`POSITION_BRACKETS`] order that appears in the
/// token wins. A position of zero, or one too large to represent, counts as
/// no position at all.
///
/// ```rust
/// use toad_lib::parser::marker::*;
///
/// assert_eq!(position_tag("TODO(3):"), Some(3));
/// assert_eq!(position_tag("todo{7}[2]:"), Some(2));
/// assert_eq!(position_tag("TODO(0):"), None);
/// assert_eq!(position_tag("TODO(x):"), None);
/// assert_eq!(position_tag("TODO:"), None);
/// ```
pub fn position_tag(token: &str) -> Option<usize> {
    let digits = POSITION_BRACKETS.iter().find_map(|(open, close)| {
        let parser = bracketed_number(*open, *close);
        token
            .char_indices()
            .filter(|(_, c)| c == open)
            .find_map(|(at, _)| parser(&token[at..]).ok().map(|(_, digits)| digits))
    })?;
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            log::trace!("  ignoring unusable position '{digits}' in '{token}'");
            None
        }
    }
}

/// Scans lines for a marker.
#[derive(Clone, Debug)]
pub struct MarkerMatcher {
    marker: String,
    lowercase_marker: String,
    token: Regex,
    positional: bool,
}

impl MarkerMatcher {
    /// Build a matcher for the given marker. The marker is taken literally and
    /// matched without regard to case.
    pub fn new(marker: &str) -> Result<Self, Error> {
        ensure!(
            !marker.is_empty(),
            ConfigSnafu {
                msg: "target pattern must not be empty",
            }
        );
        let token = RegexBuilder::new(&[regex::escape(marker).as_str(), r"[^ \n]*:"].concat())
            .case_insensitive(true)
            .build()
            .context(PatternSnafu)?;
        Ok(MarkerMatcher {
            marker: marker.to_owned(),
            lowercase_marker: marker.to_lowercase(),
            token,
            positional: true,
        })
    }

    /// Stop extracting positions; every match becomes plain.
    pub fn without_positions(mut self) -> Self {
        self.positional = false;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The marker token in the line, eg `TODO(2):`.
    ///
    /// ```rust
    /// use toad_lib::parser::marker::*;
    ///
    /// let matcher = MarkerMatcher::new("todo").unwrap();
    /// assert_eq!(matcher.token("  // TODO(2): write docs"), Some("TODO(2):"));
    /// assert_eq!(matcher.token("there is a todo here"), None);
    /// ```
    pub fn token<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !line.to_lowercase().contains(&self.lowercase_marker) {
            return None;
        }
        let found = self.token.find(line).map(|m| m.as_str());
        if found.is_none() {
            log::trace!("  '{}' mentioned without a token: '{line}'", self.marker);
        }
        found
    }

    /// Match a single line, which sits at `line_number` (1-based) in its file.
    pub fn match_line(&self, line: &str, line_number: usize) -> Option<ScannedLine> {
        let token = self.token(line)?;
        let matched = Match {
            raw_line: line.to_owned(),
            line_number,
        };
        let target_index = if self.positional {
            position_tag(token)
        } else {
            None
        };
        Some(match target_index {
            Some(target_index) => {
                log::trace!("  line {line_number} wants position {target_index}");
                ScannedLine::Positional(PositionalMatch {
                    matched,
                    target_index,
                })
            }
            None => ScannedLine::Plain(matched),
        })
    }

    /// Match every line of the contents, in line order.
    pub fn scan(&self, contents: &str) -> Result<Vec<ScannedLine>, Error> {
        let matches = split_lines(contents)?
            .into_iter()
            .zip(1..)
            .filter_map(|(line, n)| self.match_line(line.text, n))
            .collect::<Vec<_>>();
        log::debug!("found {} lines marked '{}'", matches.len(), self.marker);
        Ok(matches)
    }
}
