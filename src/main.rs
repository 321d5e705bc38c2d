//! Sheetsum CLI - Transform timesheet spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! sheetsum serve                                   # Start HTTP server (port 3000)
//! sheetsum convert input.xlsx -t user-summary      # Transform a spreadsheet
//! sheetsum inspect input.csv                       # Show parsing metadata
//! sheetsum transforms                              # List transformations
//! ```

use clap::{Parser, Subcommand};
use sheetsum::{run_file, RunOptions, TransformKind};
use std::path::{Path, PathBuf};

/// Output directory convention, overridable per invocation.
const DEFAULT_OUT_DIR: &str = "processed_files";

#[derive(Parser)]
#[command(name = "sheetsum")]
#[command(about = "Transform timesheet spreadsheets into summary workbooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a spreadsheet and write the artifact
    Convert {
        /// Input file (xlsx or csv)
        input: PathBuf,

        /// Transformation selector (row-sum, user-summary)
        #[arg(short, long, value_parser = TransformKind::from_selector)]
        transformation: TransformKind,

        /// Artifact base name (".xlsx" is appended)
        #[arg(short, long, default_value = "processed")]
        output_name: String,

        /// Output directory (default: $SHEETSUM_OUT_DIR or "processed_files")
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Parse a spreadsheet and show metadata
    Inspect {
        /// Input file (xlsx or csv)
        input: PathBuf,
    },

    /// List available transformations
    Transforms,

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Output directory (default: $SHEETSUM_OUT_DIR or "processed_files")
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            transformation,
            output_name,
            out_dir,
        } => cmd_convert(&input, transformation, &output_name, out_dir),

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Transforms => cmd_transforms(),

        Commands::Serve { port, out_dir } => cmd_serve(port, out_dir).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Output directory: flag > env > convention. The caller creates it.
fn resolve_out_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("SHEETSUM_OUT_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}

fn cmd_convert(
    input: &Path,
    transformation: TransformKind,
    output_name: &str,
    out_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = resolve_out_dir(out_dir);
    std::fs::create_dir_all(&out_dir)?;

    eprintln!("📄 Processing: {}", input.display());
    eprintln!("   Transformation: {}", transformation);

    let options = RunOptions::new(transformation, out_dir, output_name);
    let report = run_file(input, &options)?;

    eprintln!();
    eprintln!("   Format: {}", report.table_info.format);
    if let Some(d) = report.table_info.delimiter {
        eprintln!("   Encoding: {}", report.table_info.encoding);
        eprintln!("   Delimiter: '{}'", format_delimiter(d));
    }
    eprintln!("   Input rows: {}", report.table_info.row_count);
    eprintln!("   Sheets written: {}", report.sheet_count);
    eprintln!("   Summary rows: {}", report.row_count);
    eprintln!();
    eprintln!("💾 Artifact: {}", report.artifact.display());
    eprintln!("✨ Done!");

    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let table = sheetsum::read_file(input)?;

    eprintln!("   Format: {}", table.format.as_str());
    eprintln!("   Encoding: {}", table.encoding);
    if let Some(d) = table.delimiter {
        eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(d));
    }
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Parsed {} rows", table.records.len());

    Ok(())
}

fn cmd_transforms() -> Result<(), Box<dyn std::error::Error>> {
    println!("Available transformations:\n");
    for kind in TransformKind::all() {
        println!("  {:14} {}", kind.selector(), kind.describe());
    }
    Ok(())
}

async fn cmd_serve(port: u16, out_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = resolve_out_dir(out_dir);
    std::fs::create_dir_all(&out_dir)?;
    sheetsum::server::start_server(port, out_dir).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
