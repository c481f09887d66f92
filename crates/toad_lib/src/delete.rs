//! Removing marked lines from a file.
//!
//! Deletion goes through [`Deleter::scan`], which yields a
//! [`PendingDeletion`] that can be shown to the user. Nothing is written
//! until the pending deletion is confirmed. The rewrite goes to a temporary
//! file next to the source which then replaces it, so an interrupted rewrite
//! leaves the source untouched.
use snafu::{ensure, ResultExt};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use crate::{
    format::{Entry, FormatOptions},
    parser::{marker::MarkerMatcher, split_lines},
    report::read_source,
    Error, IoSnafu, NoMatchesSnafu, PersistSnafu, WriteSnafu,
};

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, Error>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> Result<bool, Error>,
{
    fn confirm(&mut self, prompt: &str) -> Result<bool, Error> {
        self(prompt)
    }
}

/// Read an answer from the start of a reply, ignoring case and surrounding
/// whitespace.
///
/// ```rust
/// use toad_lib::delete::parse_answer;
///
/// assert_eq!(parse_answer("y"), Some(true));
/// assert_eq!(parse_answer("  Yes please\n"), Some(true));
/// assert_eq!(parse_answer("NO"), Some(false));
/// assert_eq!(parse_answer("maybe"), None);
/// assert_eq!(parse_answer(""), None);
/// ```
pub fn parse_answer(reply: &str) -> Option<bool> {
    match reply.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('y') => Some(true),
        Some('n') => Some(false),
        _ => None,
    }
}

/// Confirms by writing a prompt and reading lines until one starts with `y`
/// or `n`. The end of input counts as a "no".
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LineConfirm { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool, Error> {
        loop {
            write!(self.output, "{prompt} [y/n]: ").context(IoSnafu)?;
            self.output.flush().context(IoSnafu)?;

            let mut reply = String::new();
            if self.input.read_line(&mut reply).context(IoSnafu)? == 0 {
                log::warn!("no answer before end of input, not deleting");
                return Ok(false);
            }
            if let Some(answer) = parse_answer(&reply) {
                return Ok(answer);
            }
            writeln!(self.output, "Invalid answer").context(IoSnafu)?;
        }
    }
}

/// What happened to the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { removed: usize, kept: usize },
    Aborted,
}

pub struct Deleter {
    file: PathBuf,
    matcher: MarkerMatcher,
}

impl Deleter {
    pub fn new(file: impl Into<PathBuf>, marker: &str) -> Result<Self, Error> {
        Ok(Deleter {
            file: file.into(),
            matcher: MarkerMatcher::new(marker)?.without_positions(),
        })
    }

    pub fn marker(&self) -> &str {
        self.matcher.marker()
    }

    /// Find the lines to delete. Fails with [`Error::NoMatches`] when there
    /// are none.
    pub fn scan(&self) -> Result<PendingDeletion, Error> {
        let contents = read_source(&self.file)?;
        let matches = self
            .matcher
            .scan(&contents)?
            .into_iter()
            .map(|line| line.into_match())
            .collect::<Vec<_>>();
        ensure!(
            !matches.is_empty(),
            NoMatchesSnafu {
                marker: self.marker(),
            }
        );
        Ok(PendingDeletion {
            file: self.file.clone(),
            marker: self.marker().to_owned(),
            entries: FormatOptions::for_deletion().entries(&matches),
        })
    }
}

/// Lines found for deletion, not yet removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDeletion {
    pub file: PathBuf,
    pub marker: String,
    /// The lines as previewed to the user, in file order.
    pub entries: Vec<Entry>,
}

impl PendingDeletion {
    pub fn line_numbers(&self) -> BTreeSet<usize> {
        self.entries.iter().map(|e| e.line_number).collect()
    }

    pub fn prompt(&self) -> String {
        format!(
            "Are you sure you want to delete ALL {} lines in this file?",
            self.marker
        )
    }

    /// Ask first, and rewrite the file only on a yes.
    pub fn confirm_with(self, confirm: &mut impl Confirm) -> Result<DeleteOutcome, Error> {
        if confirm.confirm(&self.prompt())? {
            self.apply()
        } else {
            log::debug!("deletion from {:?} declined", self.file);
            Ok(DeleteOutcome::Aborted)
        }
    }

    /// Rewrite the file without the pending lines.
    pub fn apply(self) -> Result<DeleteOutcome, Error> {
        let (removed, kept) = rewrite_without_lines(&self.file, &self.line_numbers())?;
        Ok(DeleteOutcome::Deleted { removed, kept })
    }
}

/// Re-read the file and replace it with every line whose 1-based number is
/// not in `line_numbers`, keeping order and line endings. Returns the number
/// of lines removed and kept.
pub fn rewrite_without_lines(
    path: &Path,
    line_numbers: &BTreeSet<usize>,
) -> Result<(usize, usize), Error> {
    let contents = read_source(path)?;
    let lines = split_lines(&contents)?;
    let mut kept = String::with_capacity(contents.len());
    let mut removed = 0;
    for (line, n) in lines.iter().zip(1..) {
        if line_numbers.contains(&n) {
            removed += 1;
        } else {
            kept.push_str(&line.with_ending());
        }
    }
    log::debug!(
        "rewriting {path:?}: removing {removed} of {} lines",
        lines.len()
    );
    replace_contents(path, |file| file.write_all(kept.as_bytes()))?;
    Ok((removed, lines.len() - removed))
}

/// Atomically replace the contents of the file at `path` with whatever `fill`
/// writes.
///
/// `path` is resolved first, so a symlink keeps pointing at the rewritten
/// file. `fill` writes into a temporary file in the target's directory, which
/// only takes the place of the target once it has been written completely and
/// synced. If `fill` fails the temporary file is removed and the target is
/// unchanged.
///
/// A target with other hard links is copied over in place instead, as a rename
/// would detach it from its other names.
pub fn replace_contents<F>(path: &Path, fill: F) -> Result<(), Error>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let target = std::fs::canonicalize(path).context(WriteSnafu { path })?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let metadata = std::fs::metadata(&target).context(WriteSnafu { path })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).context(WriteSnafu { path })?;
    fill(tmp.as_file_mut()).context(WriteSnafu { path })?;
    tmp.as_file().sync_all().context(WriteSnafu { path })?;
    std::fs::set_permissions(tmp.path(), metadata.permissions())
        .context(WriteSnafu { path })?;

    if has_other_links(&metadata) {
        log::debug!("{target:?} has other hard links, copying over it");
        std::fs::copy(tmp.path(), &target).context(WriteSnafu { path })?;
        return Ok(());
    }
    tmp.persist(&target).context(PersistSnafu { path })?;
    Ok(())
}

#[cfg(unix)]
fn has_other_links(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink() > 1
}

#[cfg(not(unix))]
fn has_other_links(_metadata: &std::fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SOURCE: &str = "x\nTODO: fix bug\ny\r\n  todo(2): add test\nTODO(1): refactor\nlast";

    fn source_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("source.rs");
        std::fs::write(&path, SOURCE).unwrap();
        path
    }

    fn dir_entries(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn line_confirm_reprompts() {
        let mut output = vec![];
        let answer = LineConfirm::new(Cursor::new("what\n\nNope\n"), &mut output)
            .confirm("Delete?")
            .unwrap();
        assert!(!answer);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Delete? [y/n]: Invalid answer\nDelete? [y/n]: Invalid answer\nDelete? [y/n]: "
        );
    }

    #[test]
    fn line_confirm_eof_declines() {
        let mut output = vec![];
        let answer = LineConfirm::new(Cursor::new("x\n"), &mut output)
            .confirm("Delete?")
            .unwrap();
        assert!(!answer);
    }

    #[test]
    fn scan_previews_raw_lines() {
        let dir = tempfile::tempdir().unwrap();
        let pending = Deleter::new(source_file(&dir), "todo")
            .unwrap()
            .scan()
            .unwrap();
        let texts = pending
            .entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec!["TODO: fix bug", "todo(2): add test", "TODO(1): refactor"]
        );
        assert_eq!(
            pending.line_numbers().into_iter().collect::<Vec<_>>(),
            vec![2, 4, 5]
        );
    }

    #[test]
    fn confirmed_delete_keeps_other_lines_and_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let outcome = Deleter::new(&path, "todo")
            .unwrap()
            .scan()
            .unwrap()
            .confirm_with(&mut |_: &str| Ok::<_, Error>(true))
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted { removed: 3, kept: 3 });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\ny\r\nlast");
        assert_eq!(dir_entries(&dir), 1);
    }

    #[test]
    fn declined_delete_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let mut asked = vec![];
        let outcome = Deleter::new(&path, "todo")
            .unwrap()
            .scan()
            .unwrap()
            .confirm_with(&mut |prompt: &str| {
                asked.push(prompt.to_owned());
                Ok::<_, Error>(false)
            })
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Aborted);
        assert_eq!(asked.len(), 1);
        assert_eq!(std::fs::read(&path).unwrap(), SOURCE.as_bytes());
    }

    #[test]
    fn interrupted_rewrite_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let result = replace_contents(&path, |file| {
            file.write_all(b"x\n")?;
            Err(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "killed mid-write",
            ))
        });
        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), SOURCE.as_bytes());
        assert_eq!(dir_entries(&dir), 1);
    }

    #[test]
    fn nothing_to_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.txt");
        std::fs::write(&path, "a todo without a colon\n").unwrap();
        let err = Deleter::new(&path, "todo").unwrap().scan().unwrap_err();
        assert!(err.is_no_matches());
    }

    #[test]
    fn rewrite_ignores_numbers_past_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let numbers = [1, 100].iter().copied().collect::<BTreeSet<_>>();
        let (removed, kept) = rewrite_without_lines(&path, &numbers).unwrap();
        assert_eq!((removed, kept), (1, 5));
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("TODO: fix bug\n"));
    }

    #[cfg(unix)]
    #[test]
    fn delete_through_symlink_rewrites_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        std::fs::write(&real, "a\nTODO: b\nc\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let outcome = Deleter::new(&link, "todo")
            .unwrap()
            .scan()
            .unwrap()
            .confirm_with(&mut |_: &str| Ok::<_, Error>(true))
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted { removed: 1, kept: 2 });
        assert!(std::fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(std::fs::read_to_string(&real).unwrap(), "a\nc\n");
        assert_eq!(dir_entries(&dir), 2);
    }

    #[cfg(unix)]
    #[test]
    fn delete_keeps_hard_links_together() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let other = dir.path().join("other.rs");
        std::fs::hard_link(&path, &other).unwrap();

        let numbers = [2].iter().copied().collect::<BTreeSet<_>>();
        rewrite_without_lines(&path, &numbers).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("fix bug"));
        assert_eq!(std::fs::read_to_string(&other).unwrap(), contents);
        assert_eq!(dir_entries(&dir), 2);
    }
}
