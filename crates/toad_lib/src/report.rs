//! Building the report and writing it to the console or a file.
use snafu::{ensure, ResultExt};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    format::{Entry, FormatOptions},
    order::Collected,
    parser::marker::MarkerMatcher,
    Error, NoMatchesSnafu, ReadSnafu, WriteSnafu, DEFAULT_MARKER,
};

/// Everything needed for one report run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    /// The file to scan.
    pub file: PathBuf,
    pub marker: String,
    /// Honour positional tags and number the entries.
    pub sort: bool,
    /// Put `---` after each entry when writing to a markdown file.
    pub markdown: bool,
    /// Skip the console box.
    pub quiet: bool,
    pub output: Option<PathBuf>,
    pub format: FormatOptions,
}

impl ReportConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        ReportConfig {
            file: file.into(),
            marker: DEFAULT_MARKER.into(),
            sort: true,
            markdown: true,
            quiet: false,
            output: None,
            format: FormatOptions::default(),
        }
    }

    pub fn matcher(&self) -> Result<MarkerMatcher, Error> {
        let matcher = MarkerMatcher::new(&self.marker)?;
        Ok(if self.sort {
            matcher
        } else {
            matcher.without_positions()
        })
    }

    /// Scan the file and render its entries in report order. Fails with
    /// [`Error::NoMatches`] when nothing is marked.
    pub fn collect(&self) -> Result<Vec<Entry>, Error> {
        let matcher = self.matcher()?;
        let contents = read_source(&self.file)?;
        let collected = Collected::from_scanned(matcher.scan(&contents)?);
        ensure!(
            !collected.is_empty(),
            NoMatchesSnafu {
                marker: matcher.marker(),
            }
        );
        log::debug!(
            "{} plain and {} positional matches",
            collected.plain.len(),
            collected.positional.len()
        );
        let format = FormatOptions {
            number_entries: self.sort && self.format.number_entries,
            ..self.format.clone()
        };
        Ok(format.entries(&collected.into_ordered()))
    }

    /// Write the entries to the configured output file, if any.
    pub fn write_output(&self, entries: &[Entry]) -> Result<(), Error> {
        match self.output.as_ref() {
            Some(path) => write_report_file(path, entries, self.markdown),
            None => Ok(()),
        }
    }
}

pub fn read_source(path: &Path) -> Result<String, Error> {
    log::trace!("Reading {path:?}");
    std::fs::read_to_string(path).context(ReadSnafu { path })
}

/// Whether the path names a markdown file.
///
/// ```rust
/// use toad_lib::report::is_markdown_path;
///
/// assert!(is_markdown_path("notes/TODO.md"));
/// assert!(is_markdown_path("README.Markdown"));
/// assert!(!is_markdown_path("todo.txt"));
/// assert!(!is_markdown_path("md"));
/// ```
pub fn is_markdown_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

/// Write entries as blank-line separated blocks, each optionally followed by
/// a `---` line.
pub fn write_entries<W: Write>(
    writer: &mut W,
    entries: &[Entry],
    separators: bool,
) -> std::io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        writeln!(writer, "{}", entry.text)?;
        if let Some(annotation) = entry.annotation.as_ref() {
            writeln!(writer, "{annotation}")?;
        }
        if separators {
            writeln!(writer, "---")?;
        }
        if i + 1 < entries.len() {
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Create (or truncate) the file at `path` and write the entries into it.
pub fn write_report_file(path: &Path, entries: &[Entry], markdown: bool) -> Result<(), Error> {
    let separators = markdown && is_markdown_path(path);
    log::debug!(
        "writing {} entries to {path:?}{}",
        entries.len(),
        if separators { " with separators" } else { "" }
    );
    let file = File::create(path).context(WriteSnafu { path })?;
    let mut writer = BufWriter::new(file);
    write_entries(&mut writer, entries, separators).context(WriteSnafu { path })?;
    writer.flush().context(WriteSnafu { path })
}

/// Draw the entries inside a box. Every row, ruled or not, has the same
/// visible width.
///
/// ```rust
/// use toad_lib::{report::render_box, Entry};
///
/// let entries = vec![Entry {
///     text: "• TODO[1]: ship".into(),
///     line_number: 3,
///     annotation: Some("  (3)".into()),
/// }];
/// assert_eq!(
///     render_box(&entries),
///     "-----------------\n\
///      • TODO[1]: ship  |\n\
///      \x20 (3)            |\n\
///      -----------------\n"
/// );
/// ```
pub fn render_box(entries: &[Entry]) -> String {
    let widest = entries
        .iter()
        .flat_map(|entry| std::iter::once(&entry.text).chain(entry.annotation.as_ref()))
        .map(|s| console::measure_text_width(s))
        .max()
        .unwrap_or_default();
    let width = widest + 2;
    let rule = "-".repeat(width);

    let mut lines = vec![rule.clone()];
    for entry in entries.iter() {
        lines.push(boxed_row(&entry.text, width));
        if let Some(annotation) = entry.annotation.as_ref() {
            lines.push(boxed_row(annotation, width));
        }
        lines.push(rule.clone());
    }
    lines.push(String::new());
    lines.join("\n")
}

fn boxed_row(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(console::measure_text_width(s));
    format!("{s}{}|", " ".repeat(padding))
}
