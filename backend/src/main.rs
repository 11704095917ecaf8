//! Quizstats CLI - Convert quiz statistics spreadsheets to import documents
//!
//! # Main Commands
//!
//! ```bash
//! quizstats serve                               # Start HTTP server (port 3000)
//! quizstats convert stats.xlsx --test-id <hex>  # Spreadsheet to import JSON
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! quizstats parse stats.xlsx        # Just parse the sheet to JSON rows
//! quizstats validate result.json    # Validate a document against the schema
//! quizstats duration 1:30           # Print a duration in milliseconds
//! ```

use clap::{Parser, Subcommand};
use quizstats::{
    parse_duration_ms, parse_file, process_file, validate_export, Config, IdPolicy,
    ProcessOptions,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "quizstats")]
#[command(about = "Convert quiz statistics spreadsheets to import-ready JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: QUIZSTATS_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Full pipeline: spreadsheet -> statistics document (import JSON)
    Convert {
        /// Input spreadsheet (xlsx, xls, ods or csv)
        input: PathBuf,

        /// Test identifier, 24 hex characters (generated if omitted)
        #[arg(short, long)]
        test_id: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip schema validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Parse a spreadsheet and output its rows as JSON
    Parse {
        /// Input spreadsheet
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a document (or array of documents) against the schema
    Validate {
        /// Input JSON file
        input: PathBuf,
    },

    /// Print a "M:S" or "H:M:S" duration in milliseconds
    Duration {
        /// Duration text
        value: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,

        Commands::Convert {
            input,
            test_id,
            output,
            no_validate,
        } => cmd_convert(&input, test_id.as_deref(), output.as_deref(), no_validate),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Duration { value } => cmd_duration(&value),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env().with_port(port);
    quizstats::server::start_server(config).await
}

fn cmd_convert(
    input: &Path,
    test_id: Option<&str>,
    output: Option<&Path>,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = match test_id {
        Some(id) => IdPolicy::supplied(id)?,
        None => IdPolicy::Generate,
    };
    let options = ProcessOptions {
        skip_validation: no_validate,
    };

    let result = process_file(input, policy, options)?;

    if !result.schema_errors.is_empty() {
        eprintln!(
            "⚠️  Document has {} schema violations",
            result.schema_errors.len()
        );
    }

    let json = String::from_utf8(result.document.to_import_json()?)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let result = parse_file(input)?;

    eprintln!("   Format: {}", result.format);
    if let Some(ref sheet) = result.sheet_name {
        eprintln!("   Worksheet: {}", sheet);
    }
    if let Some(ref encoding) = result.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = result.delimiter {
        eprintln!(
            "   Delimiter: '{}'",
            quizstats::transform::format_delimiter(delimiter)
        );
    }
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let data: Value = serde_json::from_str(&content)?;

    match validate_export(&data) {
        Ok(count) => {
            eprintln!("\n📊 All {} documents valid", count);
            Ok(())
        }
        Err(errors) => {
            eprintln!("\n❌ {} schema violations:", errors.len());
            for err in errors.iter().take(10) {
                eprintln!("   - {}", err);
            }
            std::process::exit(1);
        }
    }
}

fn cmd_duration(value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ms = parse_duration_ms(value)?;
    println!("{}", ms);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
