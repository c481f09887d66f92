use nom::{bytes::complete as bytes, character::complete as character, combinator, IResult, Parser};
use snafu::ResultExt;

use crate::{Error, NomSnafu};

pub mod marker;

/// One line of a file, split from its terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// The line without its terminator.
    pub text: &'a str,
    /// `"\n"`, `"\r\n"` or `""` for a final unterminated line.
    pub ending: &'a str,
}

impl<'a> RawLine<'a> {
    /// The line exactly as it appeared in the file.
    pub fn with_ending(&self) -> String {
        [self.text, self.ending].concat()
    }
}

/// Eat a whole line and its ending, returning both separately.
///
/// ```rust
/// use toad_lib::parser::*;
///
/// let (rest, line) = take_line("TODO: one\r\nTODO: two").unwrap();
/// assert_eq!(rest, "TODO: two");
/// assert_eq!(line, RawLine { text: "TODO: one", ending: "\r\n" });
///
/// let (rest, line) = take_line(rest).unwrap();
/// assert_eq!(rest, "");
/// assert_eq!(line, RawLine { text: "TODO: two", ending: "" });
/// ```
pub fn take_line(i: &str) -> IResult<&str, RawLine<'_>> {
    let (rest, body) = bytes::take_till(|c| c == '\n')(i)?;
    let (rest, _) = combinator::opt(character::char('\n')).parse(rest)?;
    let whole = &i[..i.len() - rest.len()];
    let text = body.strip_suffix('\r').unwrap_or(body);
    Ok((
        rest,
        RawLine {
            text,
            ending: &whole[text.len()..],
        },
    ))
}

/// Split file contents into lines, keeping every terminator so the lines can
/// be written back unchanged. Line `n` (1-based) is element `n - 1`.
pub fn split_lines(contents: &str) -> Result<Vec<RawLine<'_>>, Error> {
    let mut lines = vec![];
    let mut i = contents;
    while !i.is_empty() {
        let (rest, line) = take_line(i).map_err(|e| e.to_owned()).context(NomSnafu {
            msg: "couldn't take line",
        })?;
        i = rest;
        lines.push(line);
    }
    Ok(lines)
}
