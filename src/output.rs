//! Output formatting for search results (ripgrep-like text, JSON lines)

use crate::results::{ResultModel, ResultPresenter};
use crate::search::{
    Diagnostic, FileResult, LineMatch, SearchProgress, SearchStatus, SearchSummary,
};
use crate::utils::progress::{format_progress, SearchSpinner};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorSpec, WriteColor};

/// Marker for text cut from a long line
pub const ELLIPSIS: &str = "[…]";

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Grouped by file with highlighted matches
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// Only the paths of matching files (-l)
    FilesWithMatches,
    /// `path:count` per file (-c)
    Count,
}

/// Writes file results in ripgrep style
pub struct ResultPrinter<W> {
    out: W,
    heading: bool,
    files_printed: usize,
}

impl<W: WriteColor> ResultPrinter<W> {
    pub fn new(out: W, heading: bool) -> Self {
        Self {
            out,
            heading,
            files_printed: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print one file and its match lines
    pub fn print_file(&mut self, file: &FileResult) -> io::Result<()> {
        if self.heading {
            if self.files_printed > 0 {
                // Blank line between files
                writeln!(self.out)?;
            }
            self.out
                .set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
            write!(self.out, "{}", file.path.display())?;
            self.out.reset()?;
            if let Some(score) = file.score {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                write!(self.out, " ({:.4})", score)?;
                self.out.reset()?;
            }
            writeln!(self.out)?;
        }

        for m in &file.matches {
            self.print_match_line(&file.path, m)?;
        }

        self.files_printed += 1;
        Ok(())
    }

    fn print_match_line(&mut self, path: &Path, m: &LineMatch) -> io::Result<()> {
        if self.heading {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(self.out, "{:>6}", m.line_number)?;
            self.out.reset()?;
            write!(self.out, ": ")?;
        } else {
            // Path prefix when not using heading mode
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(self.out, "{}", path.display())?;
            self.out.reset()?;
            write!(self.out, ":")?;
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(self.out, "{}", m.line_number)?;
            self.out.reset()?;
            write!(self.out, ":")?;
        }

        if m.cut_before() {
            write!(self.out, "{} ", ELLIPSIS)?;
        }

        // Content with every visible match highlighted
        let text = m.display_text.as_str();
        let mut pos = 0;
        for span in m.visible_spans() {
            if span.start > pos {
                write!(self.out, "{}", &text[pos..span.start])?;
            }
            self.out
                .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(self.out, "{}", &text[span.start..span.end])?;
            self.out.reset()?;
            pos = span.end;
        }
        if pos < text.len() {
            write!(self.out, "{}", &text[pos..])?;
        }

        if m.cut_after() {
            write!(self.out, " {}", ELLIPSIS)?;
        }

        writeln!(self.out)
    }

    /// Print only the file name (for -l)
    pub fn print_path(&mut self, file: &FileResult) -> io::Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(self.out, "{}", file.path.display())?;
        self.out.reset()?;
        writeln!(self.out)
    }

    /// Print `path:count` (for -c)
    pub fn print_count(&mut self, file: &FileResult) -> io::Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(self.out, "{}", file.path.display())?;
        self.out.reset()?;
        write!(self.out, ":")?;
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(self.out, "{}", file.hit_count())?;
        self.out.reset()?;
        writeln!(self.out)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonRecord<'a> {
    File(&'a FileResult),
    Diagnostic(&'a Diagnostic),
    Summary(JsonSummary),
}

#[derive(Serialize)]
struct JsonSummary {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    files_searched: usize,
    files_matched: usize,
    hits: usize,
    elapsed_ms: u64,
}

impl From<&SearchSummary> for JsonSummary {
    fn from(summary: &SearchSummary) -> Self {
        let (status, reason) = match &summary.status {
            SearchStatus::Completed => ("completed", None),
            SearchStatus::Truncated => ("truncated", None),
            SearchStatus::Cancelled => ("cancelled", None),
            SearchStatus::Failed(reason) => ("failed", Some(reason.clone())),
        };
        Self {
            status,
            reason,
            files_searched: summary.progress.files_searched,
            files_matched: summary.progress.files_matched,
            hits: summary.progress.hits,
            elapsed_ms: summary.progress.elapsed.as_millis() as u64,
        }
    }
}

fn write_json(out: &mut impl Write, record: &JsonRecord<'_>) -> io::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)
}

pub fn print_json_file(out: &mut impl Write, file: &FileResult) -> io::Result<()> {
    write_json(out, &JsonRecord::File(file))
}

pub fn print_json_diagnostic(out: &mut impl Write, diagnostic: &Diagnostic) -> io::Result<()> {
    write_json(out, &JsonRecord::Diagnostic(diagnostic))
}

pub fn print_json_summary(out: &mut impl Write, summary: &SearchSummary) -> io::Result<()> {
    write_json(out, &JsonRecord::Summary(summary.into()))
}

/// Presenter for the command line: streams results to stdout as they
/// arrive, diagnostics and status to stderr.
pub struct ConsolePresenter<W, E> {
    printer: ResultPrinter<W>,
    stderr: E,
    format: OutputFormat,
    show_diagnostics: bool,
    show_stats: bool,
    spinner: SearchSpinner,
    error: Option<io::Error>,
}

impl<W: WriteColor, E: Write> ConsolePresenter<W, E> {
    pub fn new(stdout: W, stderr: E, format: OutputFormat, heading: bool) -> Self {
        Self {
            printer: ResultPrinter::new(stdout, heading),
            stderr,
            format,
            show_diagnostics: true,
            show_stats: false,
            spinner: SearchSpinner::new(false),
            error: None,
        }
    }

    pub fn show_diagnostics(mut self, yes: bool) -> Self {
        self.show_diagnostics = yes;
        self
    }

    pub fn show_stats(mut self, yes: bool) -> Self {
        self.show_stats = yes;
        self
    }

    pub fn with_spinner(mut self, spinner: SearchSpinner) -> Self {
        self.spinner = spinner;
        self
    }

    /// First write error, if any. A closed stdout (e.g. `| head`) shows up
    /// here as `BrokenPipe`.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> (W, E) {
        (self.printer.into_inner(), self.stderr)
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result
            && self.error.is_none()
        {
            self.error = Some(err);
        }
    }

    fn write_file(&mut self, file: &FileResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.printer.print_file(file),
            OutputFormat::Json => print_json_file(&mut self.printer.out, file),
            OutputFormat::FilesWithMatches => self.printer.print_path(file),
            OutputFormat::Count => self.printer.print_count(file),
        }
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => print_json_diagnostic(&mut self.printer.out, diagnostic),
            _ => writeln!(self.stderr, "scour: {}", diagnostic),
        }
    }

    fn write_summary(&mut self, summary: &SearchSummary) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return print_json_summary(&mut self.printer.out, summary);
        }
        if summary.status != SearchStatus::Completed {
            writeln!(self.stderr, "scour: {}", summary.status)?;
        }
        if self.show_stats {
            writeln!(self.stderr, "{}", format_progress(&summary.progress))?;
        }
        Ok(())
    }
}

impl<W: WriteColor, E: Write> ResultPresenter for ConsolePresenter<W, E> {
    fn on_batch(&mut self, _model: &ResultModel, files: &[FileResult]) {
        if self.error.is_some() {
            return;
        }
        let spinner = std::mem::replace(&mut self.spinner, SearchSpinner::new(false));
        let result = spinner.suspend(|| files.iter().try_for_each(|f| self.write_file(f)));
        self.spinner = spinner;
        self.record(result);
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        if !self.show_diagnostics || self.error.is_some() {
            return;
        }
        let spinner = std::mem::replace(&mut self.spinner, SearchSpinner::new(false));
        let result = spinner.suspend(|| self.write_diagnostic(diagnostic));
        self.spinner = spinner;
        self.record(result);
    }

    fn on_progress(&mut self, progress: &SearchProgress) {
        self.spinner.update(progress);
    }

    fn on_finished(&mut self, _model: &ResultModel, summary: &SearchSummary) {
        self.spinner.finish();
        if self.error.is_some() {
            return;
        }
        let result = self.write_summary(summary).and_then(|_| self.printer.out.flush());
        self.record(result);
    }
}
