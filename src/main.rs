use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use scour::config::SearchConfig;
use scour::output::{ConsolePresenter, OutputFormat};
use scour::results::{SearchSession, SearchState};
use scour::search::{DirectorySource, SearchEngine, SearchMode, SearchRequest};
use scour::utils::app_data::get_config_path;
use scour::utils::progress::SearchSpinner;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scour", version)]
#[command(about = "Project text search with incremental results and tf-idf ranking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    #[command(flatten)]
    search: SearchArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive result view
    Tui {
        /// Initial query
        query: Option<String>,
    },
    /// Show the config file location and effective values
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Options that shape the search itself
#[derive(Args)]
struct SearchArgs {
    /// Directory to search in (repeatable)
    #[arg(short, long = "path", global = true)]
    paths: Vec<PathBuf>,

    /// Rank files by tf-idf relevance instead of listing every match
    #[arg(long, global = true)]
    rank: bool,

    /// Case-insensitive plain search
    #[arg(short = 'i', long, global = true, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// Case-sensitive plain search (the default)
    #[arg(short = 's', long, global = true)]
    case_sensitive: bool,

    /// Candidate encoding, tried in order (repeatable, replaces the configured list)
    #[arg(short = 'E', long = "encoding", global = true)]
    encodings: Vec<String>,

    /// Maximum characters shown per result line
    #[arg(long, global = true)]
    max_line_length: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long, global = true)]
    max_file_size: Option<u64>,

    /// Stop after this many hits (0 = unlimited)
    #[arg(short = 'm', long = "max-count", global = true)]
    max_hit_count: Option<usize>,

    /// Never descend into directories with this name (repeatable, added to the config)
    #[arg(long = "exclude-dir", global = true)]
    exclude_dirs: Vec<String>,

    /// Never read files with this extension (repeatable, added to the config)
    #[arg(long = "exclude-ext", global = true)]
    exclude_extensions: Vec<String>,

    /// Search files that look binary
    #[arg(long, global = true)]
    binary: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long, global = true)]
    follow: bool,

    /// Skip hidden files and directories
    #[arg(long, global = true)]
    no_hidden: bool,

    /// Honour .gitignore and .ignore files
    #[arg(long, global = true)]
    respect_ignore: bool,

    /// Read configuration from this file instead of the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

impl SearchArgs {
    fn roots(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }

    fn mode(&self) -> SearchMode {
        if self.rank {
            SearchMode::Ranked
        } else {
            SearchMode::Plain
        }
    }

    /// Configured values with command line overrides applied
    fn load_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load_from(path)?,
            None => SearchConfig::load()?,
        };

        if self.ignore_case {
            config.case_sensitive = false;
        }
        if self.case_sensitive {
            config.case_sensitive = true;
        }
        if !self.encodings.is_empty() {
            config.encodings = self.encodings.clone();
        }
        if let Some(len) = self.max_line_length {
            config.max_line_length = len;
        }
        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        if let Some(count) = self.max_hit_count {
            config.max_hit_count = count;
        }
        config.excluded_dirs.extend(self.exclude_dirs.iter().cloned());
        config
            .excluded_extensions
            .extend(self.exclude_extensions.iter().cloned());
        if self.binary {
            config.skip_binary = false;
        }
        if self.follow {
            config.follow_symlinks = true;
        }
        if self.no_hidden {
            config.include_hidden = false;
        }
        if self.respect_ignore {
            config.respect_ignore_files = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum ColorWhen {
    #[default]
    Auto,
    Always,
    Never,
}

/// Options for non-interactive output
#[derive(Args)]
struct OutputArgs {
    /// Print results as JSON lines
    #[arg(long, conflicts_with_all = ["files_with_matches", "count"])]
    json: bool,

    /// Print only the paths of matching files
    #[arg(short = 'l', long, conflicts_with = "count")]
    files_with_matches: bool,

    /// Print the number of matching lines per file
    #[arg(short, long)]
    count: bool,

    /// Prefix every line with its path instead of grouping under a heading
    #[arg(long)]
    no_heading: bool,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,

    /// Don't report skipped files
    #[arg(long)]
    no_messages: bool,

    /// Print search statistics when done
    #[arg(long)]
    stats: bool,

    /// Don't show the progress spinner
    #[arg(long)]
    no_progress: bool,
}

impl OutputArgs {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.files_with_matches {
            OutputFormat::FilesWithMatches
        } else if self.count {
            OutputFormat::Count
        } else {
            OutputFormat::Text
        }
    }

    fn color_choice(&self) -> ColorChoice {
        match self.color {
            ColorWhen::Always => ColorChoice::Always,
            ColorWhen::Never => ColorChoice::Never,
            ColorWhen::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            ColorWhen::Auto => ColorChoice::Never,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("scour: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Tui { query }) => interactive(&cli.search, query),
        Some(Commands::Config { init }) => {
            init_logging();
            show_config(&cli.search, init)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            if cli.query.is_empty() {
                // Interactive mode
                interactive(&cli.search, None)
            } else {
                init_logging();
                search(cli.query.join(" "), &cli.search, &cli.output)
            }
        }
    }
}

/// Log to stderr, filtered by `SCOUR_LOG` (default: warnings only)
fn init_logging() {
    let filter = EnvFilter::try_from_env("SCOUR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn search(query: String, args: &SearchArgs, output: &OutputArgs) -> Result<ExitCode> {
    let config = args.load_config()?;
    let format = output.format();

    let source = DirectorySource::from_config(args.roots(), &config);
    let mut session = SearchSession::new(SearchEngine::new(Arc::new(source)));

    let spinner = SearchSpinner::new(!output.no_progress && format != OutputFormat::Json);
    let mut presenter = ConsolePresenter::new(
        StandardStream::stdout(output.color_choice()),
        io::stderr(),
        format,
        !output.no_heading,
    )
    .show_diagnostics(!output.no_messages)
    .show_stats(output.stats)
    .with_spinner(spinner);

    session.start(SearchRequest::new(query, args.mode(), config));
    session.wait(&mut presenter);

    if let Some(err) = presenter.take_error() {
        // Reader went away (e.g. piped into `head`)
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(ExitCode::SUCCESS);
        }
        return Err(err).context("Failed to write results");
    }

    let model = session.model();
    Ok(match model.state() {
        SearchState::Failed(_) => ExitCode::from(2),
        _ if !model.is_empty() => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    })
}

#[cfg(feature = "interactive")]
fn interactive(args: &SearchArgs, query: Option<String>) -> Result<ExitCode> {
    let config = args.load_config()?;
    scour::tui::run(args.roots(), config, args.mode(), query)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "interactive"))]
fn interactive(_args: &SearchArgs, _query: Option<String>) -> Result<ExitCode> {
    anyhow::bail!("built without the `interactive` feature; pass a query to search")
}

fn show_config(args: &SearchArgs, init: bool) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };

    if init && !path.exists() {
        SearchConfig::default().save_to(&path)?;
        println!("Wrote default config to {}", path.display());
    }

    let config = args.load_config()?;
    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("(not present, using defaults)");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("Failed to serialize config")?
    );
    Ok(())
}
