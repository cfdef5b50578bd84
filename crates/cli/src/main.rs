// RosterDesk CLI - influencer roster reconciliation against a shared sheet

mod backend;
mod exit_codes;
mod roster;
mod tracing_setup;
mod upload;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rosterdesk_recon::Credibility;

use backend::Context;
use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use tracing_setup::{init_subscriber, Verbosity};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Reconcile influencer uploads against the shared roster sheet")]
#[command(version)]
struct Cli {
    /// Use a local CSV file as the roster instead of the Google sheet
    #[arg(long, global = true, env = "ROSTERDESK_STORE_FILE", value_name = "CSV")]
    store_file: Option<PathBuf>,

    /// Settings file (default: ~/.config/rosterdesk/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roster size, verdict counts and version
    #[command(after_help = "\
Examples:
  roster status
  roster status --json
  roster --store-file roster.csv status")]
    Status {
        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// List roster rows, optionally filtered
    #[command(after_help = "\
Examples:
  roster list
  roster list --credibility rejected
  roster list --comment 'fake followers' --json")]
    List {
        /// Only rows with this verdict (approved, rejected, unknown)
        #[arg(long)]
        credibility: Option<Credibility>,

        /// Only rows whose comment contains this text (case-insensitive)
        #[arg(long)]
        comment: Option<String>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Classify an uploaded file into pending / rejected / unknown / approved
    #[command(after_help = "\
Examples:
  roster classify agency_list.xlsx
  roster classify agency_list.csv --json
  roster classify agency_list.csv --output buckets.json")]
    Classify {
        /// Uploaded file (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .ods)
        file: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export pending candidates in the fixed 20-column layout
    #[command(after_help = "\
Examples:
  roster export agency_list.xlsx
  roster export agency_list.xlsx --id jane --id bob -o picks.xlsx
  roster export agency_list.csv -o pending.csv")]
    Export {
        /// Uploaded file
        file: PathBuf,

        /// Export only these pending candidates (repeatable; default: all)
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Output path (.xlsx or .csv; default from settings)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Add influencers to the roster and commit
    #[command(after_help = "\
Examples:
  roster add --id jane --id bob --comment 'fake followers'
  roster add --id carl --credibility unknown --append
  roster add --id dora --dry-run")]
    Add {
        /// Influencer id (repeatable)
        #[arg(long = "id", value_name = "ID", required = true)]
        ids: Vec<String>,

        /// Comment for every added row
        #[arg(long)]
        comment: Option<String>,

        /// Verdict for every added row
        #[arg(long, default_value = "rejected")]
        credibility: Credibility,

        /// Append rows at the end instead of rewriting the roster
        #[arg(long)]
        append: bool,

        /// Show what would change without committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Change the verdict or comment of a roster row and commit
    #[command(after_help = "\
Examples:
  roster set jane --credibility approved
  roster set @bob --comment 'price too high'")]
    Set {
        /// Influencer id
        id: String,

        /// New verdict (approved, rejected, unknown)
        #[arg(long)]
        credibility: Option<Credibility>,

        /// New comment
        #[arg(long)]
        comment: Option<String>,

        /// Show what would change without committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Record a verdict for candidates from an upload and commit
    #[command(after_help = "\
Pending candidates are added as new roster rows. Candidates already in the
roster have their verdict updated.

Examples:
  roster promote agency_list.xlsx --id new_guy --credibility approved
  roster promote agency_list.csv --id jane --id carl --credibility rejected --dry-run")]
    Promote {
        /// Uploaded file
        file: PathBuf,

        /// Candidate id (repeatable)
        #[arg(long = "id", value_name = "ID", required = true)]
        ids: Vec<String>,

        /// Verdict to record
        #[arg(long)]
        credibility: Credibility,

        /// Show what would change without committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the roster version token
    Fingerprint,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet));

    let result = Context::load(cli.config, cli.store_file).and_then(|ctx| run(&ctx, cli.command));

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Status { json } => roster::cmd_status(ctx, json),
        Commands::List { credibility, comment, json } => {
            roster::cmd_list(ctx, credibility, comment, json)
        }
        Commands::Classify { file, json, output } => upload::cmd_classify(ctx, file, json, output),
        Commands::Export { file, ids, output } => upload::cmd_export(ctx, file, ids, output),
        Commands::Add { ids, comment, credibility, append, dry_run } => {
            roster::cmd_add(ctx, ids, comment, credibility, append, dry_run)
        }
        Commands::Set { id, credibility, comment, dry_run } => {
            roster::cmd_set(ctx, id, credibility, comment, dry_run)
        }
        Commands::Promote { file, ids, credibility, dry_run } => {
            upload::cmd_promote(ctx, file, ids, credibility, dry_run)
        }
        Commands::Fingerprint => roster::cmd_fingerprint(ctx),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
