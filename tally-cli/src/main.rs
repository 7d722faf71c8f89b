use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tally_core::{CurrencyCode, SignPolicy};
use tally_export::{write_groups, write_preview, write_transactions};
use tally_ingest::{FormFeedPages, ParseOutcome, StatementParser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Turn bank statement text into per-account transaction CSVs"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse extracted statement text (pages separated by form feeds)
    Parse(ParseArgs),

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ParseArgs {
    /// Text file from `pdftotext`, or `-` for stdin
    input: PathBuf,

    /// Write the CSV here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write one CSV per account/currency into this directory
    #[arg(long)]
    split_dir: Option<PathBuf>,

    /// Omit the account column from the main CSV
    #[arg(long)]
    preview: bool,

    /// Print account groups as JSON instead of CSV
    #[arg(long, conflicts_with = "preview")]
    json: bool,

    /// Config file (default: ~/.tally/config.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accept an additional currency code (repeatable)
    #[arg(long = "currency", value_name = "CODE")]
    currencies: Vec<CurrencyCode>,

    /// Currency assumed until the statement declares one
    #[arg(long, value_name = "CODE")]
    default_currency: Option<CurrencyCode>,

    /// How to read the amount's sign
    #[arg(long, value_enum)]
    sign_policy: Option<SignArg>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SignArg {
    PassThrough,
    DashMarksDebit,
}

impl From<SignArg> for SignPolicy {
    fn from(a: SignArg) -> Self {
        match a {
            SignArg::PassThrough => SignPolicy::PassThrough,
            SignArg::DashMarksDebit => SignPolicy::DashMarksDebit,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse(args) => {
            let cfg = config::load_config(args.config.as_deref())?;
            let stdout = io::stdout();
            run_parse(&args, cfg, &mut stdout.lock())?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                config::init_config()?;
            }
            ConfigCommand::Show { config: path } => {
                let cfg = config::load_config(path.as_deref())?;
                print!("{}", config::render_config(&cfg)?);
            }
            ConfigCommand::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: &Path) -> Result<FormFeedPages> {
    if input == Path::new("-") {
        FormFeedPages::from_reader(io::stdin().lock()).context("reading stdin")
    } else {
        let file = fs::File::open(input).with_context(|| format!("opening {}", input.display()))?;
        FormFeedPages::from_reader(file).with_context(|| format!("reading {}", input.display()))
    }
}

/// Parse `args.input` and write results. Summary and warnings go to stderr
/// so CSV on `stdout` stays clean.
fn run_parse(args: &ParseArgs, cfg: Config, stdout: &mut dyn Write) -> Result<ParseOutcome> {
    let cfg = cfg.apply(&Overrides {
        extra_currencies: args.currencies.clone(),
        default_currency: args.default_currency,
        sign: args.sign_policy.map(SignPolicy::from),
        preview: args.preview,
    })?;
    debug!(parser = ?cfg.parser, "effective configuration");

    let parser = StatementParser::new(cfg.parser.clone())?;
    let mut source = read_input(&args.input)?;
    let outcome = parser
        .parse_source(&mut source)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let warnings = outcome.report.warnings();
    for w in &warnings {
        eprintln!("warning: {}", w);
    }
    if outcome.is_empty() {
        return Ok(outcome);
    }

    let groups = outcome.segment();
    eprintln!(
        "Parsed {} transactions from {} pages ({} without text)",
        outcome.report.transactions, outcome.report.pages, outcome.report.pages_without_text
    );
    for g in groups.values() {
        eprintln!(
            "  {} | count={} | net={} | closing={}",
            g.key,
            g.len(),
            g.net_amount(),
            g.closing_balance().map(|b| b.to_string()).unwrap_or_default()
        );
    }

    if args.json {
        let list: Vec<_> = groups.values().collect();
        let json = serde_json::to_string_pretty(&list).context("serialize groups")?;
        writeln!(stdout, "{}", json)?;
    } else {
        match &args.out {
            Some(path) => {
                let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
                write_main_csv(file, &outcome, cfg.output.preview)?;
                eprintln!("Wrote {}", path.display());
            }
            None => write_main_csv(&mut *stdout, &outcome, cfg.output.preview)?,
        }
    }

    if let Some(dir) = args.split_dir.as_ref().or(cfg.output.split_dir.as_ref()) {
        for p in write_groups(dir, &groups)? {
            eprintln!("Wrote {}", p.display());
        }
    }

    Ok(outcome)
}

fn write_main_csv<W: Write>(w: W, outcome: &ParseOutcome, preview: bool) -> Result<()> {
    if preview {
        write_preview(w, &outcome.transactions)
    } else {
        write_transactions(w, &outcome.transactions)
    }
}
