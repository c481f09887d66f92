use std::path::PathBuf;

use clap::Parser;
use console::{Style, Term};
use toad_lib::{
    delete::LineConfirm, report::render_box, Bullet, Confirm, DeleteOutcome, Deleter, Entry,
    FormatOptions, ReportConfig,
};

#[derive(clap::Parser, Debug)]
#[command(
    version,
    about,
    author,
    help_template(
        "\
{before-help}{name} {version} by {author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
    )
)]
struct Cli {
    #[clap(short, long, default_value = toad_lib::DEFAULT_MARKER)]
    /// The marker to look for, matched regardless of case.
    target: String,

    #[clap(short, long)]
    /// Also write the report to this file.
    output_file: Option<PathBuf>,

    #[clap(long, default_value = "TODO")]
    /// Label printed in front of every entry.
    summary: String,

    #[clap(long)]
    /// Bullet symbol in front of every entry, exactly one character.
    bullet: Option<String>,

    #[clap(short = 'l', long)]
    /// Do not show the line number each match was found on.
    no_line: bool,

    #[clap(short = 'm', long, visible_alias = "no-md")]
    /// Do not put markdown separators in a markdown output file.
    no_markdown: bool,

    #[clap(short = 's', long)]
    /// List matches in the order they were found, ignoring position tags
    /// like `TODO(2):`, and do not number them.
    no_sort: bool,

    #[clap(short, long, visible_alias = "silent")]
    /// Do not print the report to the terminal.
    quiet: bool,

    #[clap(short, long, value_name = "PATTERN")]
    /// Delete every line marked with PATTERN from the file, after asking.
    delete: Option<String>,

    /// The file to search.
    file: PathBuf,
}

impl Cli {
    /// Validate the arguments into a report configuration. Touches no files.
    fn report_config(&self) -> Result<ReportConfig, toad_lib::Error> {
        let bullet = match self.bullet.as_deref() {
            Some(symbol) => Bullet::new(symbol)?,
            None => Bullet::default(),
        };
        let config = ReportConfig {
            marker: self.target.clone(),
            sort: !self.no_sort,
            markdown: !self.no_markdown,
            quiet: self.quiet,
            output: self.output_file.clone(),
            format: FormatOptions {
                summary: self.summary.clone(),
                bullet,
                number_entries: !self.no_sort,
                show_line_number: !self.no_line,
                summarize: true,
            },
            ..ReportConfig::new(&self.file)
        };
        // Fail on a bad marker before reading anything.
        config.matcher()?;
        Ok(config)
    }
}

struct Printer {
    red: Style,
    green: Style,
    dim: Style,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            red: Style::new().red().bold(),
            green: Style::new().green(),
            dim: Style::new().dim(),
        }
    }
}

impl Printer {
    fn count(&self, count: usize, marker: &str) {
        println!(
            "Found {} matches for {}",
            self.red.apply_to(count),
            self.red.apply_to(marker)
        );
    }

    fn entries(&self, entries: &[Entry]) {
        print!("{}", render_box(entries));
    }

    fn error(&self, err: &toad_lib::Error) {
        match err {
            toad_lib::Error::NoMatches { marker } => self.count(0, marker),
            err => eprintln!("{}", self.red.apply_to(format!("toad: error: {err}"))),
        }
    }

    fn delete_outcome(&self, outcome: DeleteOutcome) {
        match outcome {
            DeleteOutcome::Deleted { removed, kept } => {
                println!(
                    "🏁 {} {}",
                    self.green
                        .apply_to(format!("All {removed} matches have been deleted from file!")),
                    self.dim.apply_to(format!("({kept} lines left)"))
                );
            }
            DeleteOutcome::Aborted => println!("{}", self.dim.apply_to("Nothing was deleted.")),
        }
    }
}

fn run(cli: &Cli, printer: &Printer, confirm: &mut impl Confirm) -> Result<(), toad_lib::Error> {
    let config = cli.report_config()?;

    if let Some(marker) = cli.delete.as_deref() {
        let pending = Deleter::new(&config.file, marker)?.scan()?;
        printer.count(pending.entries.len(), marker);
        printer.entries(&pending.entries);
        let outcome = pending.confirm_with(confirm)?;
        printer.delete_outcome(outcome);
        return Ok(());
    }

    let entries = config.collect()?;
    printer.count(entries.len(), &config.marker);
    if !config.quiet {
        printer.entries(&entries);
    }
    config.write_output(&entries)
}

/// Help and version requests are not failures, anything else clap rejects is.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

/// Success, including a declined deletion, is 0. Finding nothing and every
/// error are 1.
fn exit_code(result: &Result<(), toad_lib::Error>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn main() {
    env_logger::builder().init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(usage_exit_code(&err));
        }
    };
    log::debug!("{cli:#?}");

    let printer = Printer::default();
    let mut confirm = LineConfirm::new(std::io::stdin().lock(), Term::stdout());
    let result = run(&cli, &printer, &mut confirm);
    if let Err(err) = result.as_ref() {
        printer.error(err);
    }
    std::process::exit(exit_code(&result));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("toad").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["notes.txt"]).report_config().unwrap();
        assert_eq!(config, ReportConfig::new("notes.txt"));
    }

    #[test]
    fn flags_map_onto_config() {
        let config = parse(&[
            "-t", "fixme", "-o", "out.md", "--summary", "FIX", "--bullet", "-", "-l", "-m",
            "-s", "--silent", "src.rs",
        ])
        .report_config()
        .unwrap();
        assert_eq!(config.marker, "fixme");
        assert_eq!(config.output, Some(PathBuf::from("out.md")));
        assert!(!config.sort && !config.markdown && config.quiet);
        assert_eq!(config.format.summary, "FIX");
        assert_eq!(config.format.bullet, Bullet::new("-").unwrap());
        assert!(!config.format.number_entries && !config.format.show_line_number);
    }

    #[test]
    fn long_bullet_fails_before_reading() {
        let err = parse(&["--bullet", "**", "does/not/exist.txt"])
            .report_config()
            .unwrap_err();
        assert!(matches!(err, toad_lib::Error::Config { .. }));
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::try_parse_from(["toad"]).is_err());
    }

    #[test]
    fn delete_takes_a_pattern() {
        let cli = parse(&["-d", "todo", "src.rs"]);
        assert_eq!(cli.delete.as_deref(), Some("todo"));
    }

    fn never_asked(_: &str) -> Result<bool, toad_lib::Error> {
        panic!("should not prompt")
    }

    fn source_file(dir: &tempfile::TempDir, contents: &str) -> String {
        let path = dir.path().join("src.txt");
        std::fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_owned()
    }

    #[test]
    fn report_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(&dir, "TODO: one\n");
        let cli = parse(&["-q", file.as_str()]);
        let result = run(&cli, &Printer::default(), &mut never_asked);
        assert_eq!(exit_code(&result), 0);
    }

    #[test]
    fn no_matches_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(&dir, "nothing here\n");
        let cli = parse(&[file.as_str()]);
        let result = run(&cli, &Printer::default(), &mut never_asked);
        assert!(result.as_ref().unwrap_err().is_no_matches());
        assert_eq!(exit_code(&result), 1);
    }

    #[test]
    fn bad_bullet_exits_one() {
        let result = run(
            &parse(&["--bullet", "**", "does/not/exist.txt"]),
            &Printer::default(),
            &mut never_asked,
        );
        assert_eq!(exit_code(&result), 1);
    }

    #[test]
    fn declined_delete_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(&dir, "a\nTODO: b\n");
        let mut decline = |_: &str| Ok::<_, toad_lib::Error>(false);
        let cli = parse(&["-d", "todo", file.as_str()]);
        let result = run(&cli, &Printer::default(), &mut decline);
        assert_eq!(exit_code(&result), 0);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "a\nTODO: b\n");
    }

    #[test]
    fn confirmed_delete_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(&dir, "a\nTODO: b\n");
        let mut accept = |_: &str| Ok::<_, toad_lib::Error>(true);
        let cli = parse(&["-d", "todo", file.as_str()]);
        let result = run(&cli, &Printer::default(), &mut accept);
        assert_eq!(exit_code(&result), 0);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "a\n");
    }

    #[test]
    fn usage_errors_exit_one_and_help_exits_zero() {
        let missing_file = Cli::try_parse_from(["toad"]).unwrap_err();
        assert_eq!(usage_exit_code(&missing_file), 1);
        let unknown_flag = Cli::try_parse_from(["toad", "--frobnicate", "x"]).unwrap_err();
        assert_eq!(usage_exit_code(&unknown_flag), 1);
        let help = Cli::try_parse_from(["toad", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&help), 0);
    }
}
