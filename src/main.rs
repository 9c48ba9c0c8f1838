mod appendix;
mod classify;
mod commands;
mod config;
mod context;
mod convert;
mod diagnostics;
mod driver;
mod error;
mod info;
mod ledger;
mod linkify;
mod ranges;
mod scanner;
mod sources;
mod types;
mod urls;
mod workbook;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::scanner::Target;

#[derive(Parser)]
#[command(
    name = "eftalink",
    version,
    about = "Hyperlink EFTA document IDs and DOJ dataset references in markdown narratives"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append per-narrative sections from a combined appendices file
    AppendAppendices {
        /// Combined appendices markdown file
        #[arg(long)]
        appendices: PathBuf,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Replace an existing appendix instead of skipping the file
        #[arg(long)]
        force: bool,
        /// Directory holding the narrative files
        #[arg(long)]
        narratives_dir: PathBuf,
    },
    /// Convert [text](https://…) links into anchors that open in a new tab
    Convert(RewriteArgs),
    /// Output eftalink reference documentation
    Info {
        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Inject "📄 EFTA Source Documents" tables into narratives
    InjectSources {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Link bare EFTA document IDs and dataset references
    Linkify(RewriteArgs),
    /// Build the forensic workbook from a JSON wire ledger
    Report {
        /// JSON array of wire objects
        #[arg(long, default_value = "master_wire_ledger.json")]
        ledger: PathBuf,
        /// Workbook to write, replaced if it exists
        #[arg(long, default_value = "forensic_workbook.xlsx")]
        output: PathBuf,
    },
}

/// Arguments shared by the rewrite passes.
#[derive(Args)]
struct RewriteArgs {
    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
    /// Descend into subdirectories of --dir
    #[arg(long, short)]
    recursive: bool,
    #[command(flatten)]
    target: TargetArgs,
}

/// Exactly one of `--dir` or `--file`.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Directory of markdown files
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Single markdown file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TargetArgs {
    /// Resolve into a scan target. Clap guarantees exactly one of the two is set.
    fn into_target(self, recursive: bool) -> Target {
        return match (self.file, self.dir) {
            (Some(file), _) => Target::File(file),
            (None, dir) => Target::Dir {
                path: dir.unwrap_or_else(|| return PathBuf::from(".")),
                recursive,
            },
        };
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::AppendAppendices { appendices, dry_run, force, narratives_dir } => {
            commands::append_appendices(&narratives_dir, &appendices, force, dry_run)
        },
        Commands::Convert(args) => {
            let dry_run = args.dry_run;
            commands::convert(&args.target.into_target(args.recursive), dry_run)
        },
        Commands::Info { json } => {
            info::run(json);
            return ExitCode::SUCCESS;
        },
        Commands::InjectSources { dry_run, target } => {
            commands::inject_sources(&target.into_target(false), dry_run)
        },
        Commands::Linkify(args) => {
            let dry_run = args.dry_run;
            commands::linkify(&args.target.into_target(args.recursive), dry_run)
        },
        Commands::Report { ledger, output } => commands::report(&ledger, &output),
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
