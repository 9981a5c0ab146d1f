//! Command-line front end: ingest markup files, optionally prune them with a
//! filter expression, and write the result back out.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagtree::{Filter, Node, ParseOptions, SerializeOptions};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// tagtree -- read, filter, and rewrite attributed markup trees.
#[derive(Parser, Debug)]
#[command(name = "tagtree", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Markup files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print additional information during processing.
    #[arg(long)]
    verbose: bool,

    // -- Ingestion options -------------------------------------------------
    /// Drop whitespace-only text.
    #[arg(long)]
    noblanks: bool,

    // -- Filtering ---------------------------------------------------------
    /// Keep only the parts of each tree matching a filter expression,
    /// e.g. `name == "Alice" | : == "root"`.
    #[arg(long, value_name = "EXPR")]
    select: Option<String>,

    // -- Output options ----------------------------------------------------
    /// Pretty-print (indent) the output.
    #[arg(long)]
    indent: bool,

    /// Print the number of nodes in each (filtered) tree instead of the tree.
    #[arg(long)]
    count: bool,

    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Print timing information for ingestion and serialization.
    #[arg(long)]
    timing: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "tagtree=debug" } else { "tagtree=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let filter = match cli.select.as_deref().map(Filter::parse).transpose() {
        Ok(filter) => filter.unwrap_or_default(),
        Err(e) => {
            eprintln!("--select: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let mut worst_exit = EXIT_SUCCESS;
    let mut output = String::new();
    for file in &cli.files {
        match process_file(&cli, &filter, file) {
            Ok(rendered) => output.push_str(&rendered),
            Err(msg) => {
                eprintln!("{file}: {msg}");
                worst_exit = EXIT_FAILURE;
            }
        }
    }

    if !output.is_empty() {
        if let Err(e) = write_output(&cli, &output) {
            eprintln!("failed to write output: {e}");
            worst_exit = EXIT_FAILURE;
        }
    }

    ExitCode::from(worst_exit)
}

/// Processes a single input file, returning what should be printed for it.
fn process_file(cli: &Cli, filter: &Filter, filename: &str) -> Result<String, String> {
    let input = read_input(filename).map_err(|e| format!("failed to read: {e}"))?;

    let start_parse = Instant::now();
    let options = ParseOptions::default().no_blanks(cli.noblanks);
    let root = tagtree::parse_bytes(&input, &options).map_err(|e| e.to_string())?;
    if cli.timing {
        eprintln!("Ingesting {filename} took {:?}", start_parse.elapsed());
    }
    tracing::debug!(file = filename, nodes = root.descendant_count() + 1, "ingested");

    let selected = if filter.is_any() {
        Some(root)
    } else {
        root.select_tree(filter)
    };

    if cli.count {
        let count = selected.as_ref().map_or(0, |n| n.descendant_count() + 1);
        return Ok(format!("{filename}: {count}\n"));
    }

    let Some(selected) = selected else {
        tracing::info!(file = filename, "root does not match the filter");
        return Ok(String::new());
    };

    if cli.noout {
        return Ok(String::new());
    }

    let start_serial = Instant::now();
    let rendered = render(cli, &selected);
    if cli.timing {
        eprintln!("Serializing took {:?}", start_serial.elapsed());
    }
    Ok(rendered)
}

fn render(cli: &Cli, node: &Node) -> String {
    let options = SerializeOptions::default().indent(cli.indent);
    tagtree::serialize_with_options(node, &options)
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn write_output(cli: &Cli, content: &str) -> io::Result<()> {
    if let Some(ref output_file) = cli.output {
        fs::write(output_file, content)
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()
    }
}
