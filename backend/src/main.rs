//! xls2csv CLI - Convert .xls/.xlsx exports to UTF-8 CSV
//!
//! ```bash
//! xls2csv data.xls                       # writes data.csv next to the input
//! xls2csv data.xls output.csv            # explicit destination
//! xls2csv --batch ./input                # every *.xls in ./input
//! xls2csv --batch ./input ./output       # CSVs into ./output
//! xls2csv serve --port 8000              # start the upload server
//! ```
//!
//! Conversion failures are reported on stderr but never change the exit
//! status; only usage errors exit non-zero.

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use xls2csv::{batch_convert, Config, Converter};

#[derive(Parser)]
#[command(name = "xls2csv", version)]
#[command(about = "Convert .xls/.xlsx files (including HTML saved as .xls) to CSV UTF-8", long_about = None)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// Treat INPUT as a directory and convert every *.xls inside it
    #[arg(long)]
    batch: bool,

    /// Input file (or directory with --batch; default ".")
    input: Option<PathBuf>,

    /// Output file (or directory with --batch)
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP upload server
    Serve {
        /// Port to listen on (overrides XLS2CSV_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            let config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Configuration error: {}", e);
                    std::process::exit(1);
                }
            };
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            if let Err(e) = xls2csv::server::start_server(config).await {
                eprintln!("❌ Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Conversion only reads XLS2CSV_ENCODINGS; a bad list is a usage error.
            let converter = match Config::decoders_from_env() {
                Ok(chain) => Converter::new(chain),
                Err(e) => {
                    eprintln!("❌ Configuration error: {}", e);
                    std::process::exit(2);
                }
            };
            let args = cli.convert;

            if args.batch {
                let input = args.input.unwrap_or_else(|| PathBuf::from("."));
                cmd_batch(&converter, &input, args.output.as_deref());
            } else if let Some(input) = args.input {
                cmd_convert(&converter, &input, args.output.as_deref());
            } else {
                let _ = Cli::command().print_help();
                std::process::exit(2);
            }
        }
    }
}

fn cmd_convert(converter: &Converter, input: &Path, output: Option<&Path>) {
    match converter.convert_to_file(input, output) {
        Ok(destination) => println!("✓ {} → {}", input.display(), destination.display()),
        Err(e) => eprintln!("✗ {}: {}", input.display(), e),
    }
}

fn cmd_batch(converter: &Converter, input_dir: &Path, output_dir: Option<&Path>) {
    let report = match batch_convert(converter, input_dir, output_dir) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", e);
            return;
        }
    };

    if report.is_empty() {
        println!("No .xls files found in: {}", input_dir.display());
        return;
    }

    println!("Found {} .xls file(s)", report.found.len());
    for (source, destination) in &report.converted {
        println!("✓ {} → {}", source.display(), destination.display());
    }
    for (source, error) in &report.failed {
        eprintln!("✗ {}: {}", source.display(), error);
    }
    println!(
        "\n📊 {} converted, {} failed",
        report.converted.len(),
        report.failed.len()
    );
}
