use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use site_problem_sync::config::{self, SyncSettings};
use site_problem_sync::io::inbox::InboxFetcher;
use site_problem_sync::sync::{self, AttachmentFetcher, SyncReport, WorkbookTable};
use site_problem_sync::{ReconcileConfig, Reconciler, Result, logging};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init_tracing(cli.verbose)?;
    match cli.command {
        Command::Compare(args) => execute_compare(args),
        Command::Sync(args) => execute_sync(args),
        Command::Fetch(args) => execute_fetch(args),
    }
}

fn execute_compare(args: CompareArgs) -> Result<()> {
    sync::require_file(&args.google)?;
    sync::require_file(&args.customer)?;
    let reconciler = load_reconciler(&args.mapping)?;

    let target = WorkbookTable::new(&args.google, args.target_sheet);
    let source = WorkbookTable::new(&args.customer, args.sheets.source_sheet)
        .with_header_row(config::header_offset(args.sheets.source_header_row)?)
        .skipping_blank_rows();
    let output = args
        .output
        .unwrap_or_else(|| sync::updated_path(&args.google));

    let summary = sync::compare_workbooks(&target, &source, &output, &reconciler)?;
    println!("\u{2714} Updated rows: {}", summary.rows_updated);
    println!("\u{26a0} Missing escalated rows: {}", summary.warnings_added);
    println!("Saved updated sheet to: {}", summary.output.display());
    Ok(())
}

fn execute_sync(args: SyncArgs) -> Result<()> {
    sync::require_file(&args.target)?;
    let reconciler = load_reconciler(&args.mapping)?;

    let settings = SyncSettings {
        query: args.query,
        source_sheet: args.sheets.source_sheet,
        source_header_row: args.sheets.source_header_row,
        target_sheet: args.target_sheet,
        work_dir: args
            .work_dir
            .unwrap_or_else(|| std::env::temp_dir().join("site-problem-sync")),
    };
    let target = WorkbookTable::new(&args.target, settings.target_sheet.clone());
    let mut fetcher = InboxFetcher::new(args.inbox);

    match sync::run_sync(&mut fetcher, &target, &settings, &reconciler)? {
        SyncReport::NoAttachment => println!("No new attachments."),
        SyncReport::Unchanged => println!("No changes needed."),
        SyncReport::Written {
            rows_updated,
            warnings_added,
        } => println!("Wrote sheet: {rows_updated} updates, {warnings_added} warnings."),
    }
    Ok(())
}

fn execute_fetch(args: FetchArgs) -> Result<()> {
    let mut fetcher = InboxFetcher::new(args.inbox);
    match fetcher.fetch_latest(&args.query, &args.dest)? {
        Some(path) => println!("{}", path.display()),
        None => println!("No attachment found"),
    }
    Ok(())
}

fn load_reconciler(mapping: &Path) -> Result<Reconciler> {
    let config = ReconcileConfig::from_json_file(mapping)?;
    Ok(Reconciler::new(config))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Synchronise the internal site-problem tracker with the customer tracker."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile two local workbooks and write an updated copy of the internal one.
    Compare(CompareArgs),
    /// Pick up the newest customer attachment and update the internal tracker in place.
    Sync(SyncArgs),
    /// Copy the newest matching customer attachment into a directory and print its path.
    Fetch(FetchArgs),
}

#[derive(clap::Args)]
struct SourceSheetArgs {
    /// Sheet of the customer workbook holding the tracker.
    #[arg(long, default_value = sync::SOURCE_SHEET)]
    source_sheet: String,

    /// 1-based row of the customer header.
    #[arg(long, default_value_t = sync::SOURCE_HEADER_OFFSET + 1)]
    source_header_row: usize,
}

#[derive(clap::Args)]
struct CompareArgs {
    /// Export of the internal tracker.
    #[arg(long)]
    google: PathBuf,

    /// Customer tracker workbook.
    #[arg(long)]
    customer: PathBuf,

    /// Field mapping and column names as JSON.
    #[arg(long)]
    mapping: PathBuf,

    /// Output path; defaults to `<google stem>_updated.xlsx`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Sheet of the internal export.
    #[arg(long, default_value = sync::TARGET_SHEET)]
    target_sheet: String,

    #[command(flatten)]
    sheets: SourceSheetArgs,
}

#[derive(clap::Args)]
struct SyncArgs {
    /// Directory customer attachments are dropped into.
    #[arg(long)]
    inbox: PathBuf,

    /// Text the attachment file name must contain.
    #[arg(long, default_value = "Site Problem")]
    query: String,

    /// Internal tracker workbook, rewritten in place.
    #[arg(long)]
    target: PathBuf,

    /// Field mapping and column names as JSON.
    #[arg(long)]
    mapping: PathBuf,

    #[arg(long, default_value = sync::TARGET_SHEET)]
    target_sheet: String,

    /// Scratch directory for fetched attachments.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    #[command(flatten)]
    sheets: SourceSheetArgs,
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Directory customer attachments are dropped into.
    #[arg(long)]
    inbox: PathBuf,

    /// Text the attachment file name must contain.
    #[arg(long, default_value = "Site Problem")]
    query: String,

    /// Directory the attachment is copied into.
    #[arg(long, default_value = ".")]
    dest: PathBuf,
}
