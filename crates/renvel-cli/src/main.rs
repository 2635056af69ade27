//! Renvel CLI
//!
//! Command-line tool for building reinforcement envelopes over directories of
//! SQLite stores, plus the small maintenance utilities that grew around that
//! workflow (table dumps, DEF cleaning, marker insertion).

use clap::{Parser, Subcommand};
use renvel_core::{
    clean_def, dump_store, dump_table, import_directory, insert_after_marker, run_analysis,
    scan_directory, AnalyzerConfig, DumpOptions, ImportOptions, Store,
};
use renvel_core::config::{DEFAULT_CSV_OUTPUT, DEFAULT_DB_OUTPUT};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "renvel")]
#[command(about = "Reinforcement Envelope Toolkit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reinforcement envelope over a directory of stores
    Analyze {
        /// Directory with input .db files
        #[arg(short, long)]
        root: PathBuf,

        /// Name of the element identifier column
        #[arg(long, default_value = "elemId")]
        element_id_column: String,

        /// Name of the set/combination column
        #[arg(long, default_value = "setN")]
        set_column: String,

        /// Prefix of the reinforcement columns to maximize
        #[arg(long, default_value = "As")]
        prefix: String,

        /// File name of the CSV output (created inside the root directory)
        #[arg(long, default_value = DEFAULT_CSV_OUTPUT)]
        csv_out: String,

        /// File name of the database output (created inside the root directory)
        #[arg(long, default_value = DEFAULT_DB_OUTPUT)]
        db_out: String,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// List store files and their tables
    Scan {
        /// Directory with .db files
        #[arg(short, long)]
        root: PathBuf,
    },

    /// Dump every table of a store to per-table CSV files
    Dump {
        /// Store file to dump
        #[arg(short, long)]
        file: PathBuf,

        /// Output directory for the CSV files
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: String,

        /// Collapse embedded line breaks in text values
        #[arg(long)]
        sanitize: bool,
    },

    /// Dump one named table of a store to a CSV file
    DumpTable {
        /// Store file to read
        #[arg(short, long)]
        file: PathBuf,

        /// Table to dump
        #[arg(short, long)]
        table: String,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: String,

        /// Collapse embedded line breaks in text values
        #[arg(long)]
        sanitize: bool,
    },

    /// Build SQLite databases from a directory of prefix-grouped CSV files
    CsvToDb {
        /// Directory with `<prefix>_<table>.csv` files
        #[arg(short, long)]
        dir: PathBuf,

        /// Field delimiter of the input files
        #[arg(long, default_value = ";")]
        delimiter: String,
    },

    /// Clean a dumpbin /exports listing into a linker-ready DEF file
    CleanDef {
        /// Raw listing produced by dumpbin
        #[arg(short, long)]
        input: PathBuf,

        /// Clean DEF file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Insert a text block after the last marker line in every file of a directory
    Insert {
        /// Directory whose files are updated
        #[arg(short, long)]
        dir: PathBuf,

        /// Marker text; the block goes after the last line containing it
        #[arg(short, long)]
        marker: String,

        /// Text block to insert
        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the text block from a file instead
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> renvel_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            root,
            element_id_column,
            set_column,
            prefix,
            csv_out,
            db_out,
            summary,
        } => cmd_analyze(
            &root,
            element_id_column,
            set_column,
            prefix,
            csv_out,
            db_out,
            summary,
        ),
        Commands::Scan { root } => cmd_scan(&root),
        Commands::Dump {
            file,
            out_dir,
            delimiter,
            sanitize,
        } => cmd_dump(&file, &out_dir, &delimiter, sanitize),
        Commands::DumpTable {
            file,
            table,
            output,
            delimiter,
            sanitize,
        } => cmd_dump_table(&file, &table, &output, &delimiter, sanitize),
        Commands::CsvToDb { dir, delimiter } => cmd_csv_to_db(&dir, &delimiter),
        Commands::CleanDef { input, output } => cmd_clean_def(&input, &output),
        Commands::Insert {
            dir,
            marker,
            content,
            content_file,
        } => cmd_insert(&dir, &marker, content, content_file),
    }
}

fn cmd_analyze(
    root: &PathBuf,
    element_id_column: String,
    set_column: String,
    prefix: String,
    csv_out: String,
    db_out: String,
    summary_path: Option<PathBuf>,
) -> renvel_core::Result<()> {
    println!("--- Reinforcement Envelope Analyzer ---");

    let config = AnalyzerConfig {
        element_id_column,
        set_index_column: set_column,
        reinforcement_prefix: prefix,
        csv_output: csv_out,
        db_output: db_out,
    };

    let summary = run_analysis(root, &config)?;

    println!();
    println!("Analysis complete!");
    println!(
        "  {} store(s) scanned, {} table(s) aggregated, {} table(s) skipped",
        summary.stores_scanned(),
        summary.tables_aggregated(),
        summary.tables_skipped()
    );
    println!("  {} records written", summary.records_written);

    if let Some(path) = summary_path {
        summary.save(&path)?;
        println!("  run summary saved to {}", path.display());
    }

    Ok(())
}

fn cmd_scan(root: &PathBuf) -> renvel_core::Result<()> {
    let result = scan_directory(root, &[])?;

    println!("Scanned {}", result.root.display());
    println!("Found {} store file(s)", result.store_count());
    println!();

    for store_file in &result.stores {
        match Store::open(&store_file.path) {
            Ok(store) => {
                let tables = store.table_names()?;
                println!("{} ({} tables)", store_file.name, tables.len());
                for table in tables {
                    println!("  {}", table);
                }
            }
            Err(e) => println!("{} (unreadable: {})", store_file.name, e),
        }
    }

    Ok(())
}

fn cmd_dump(
    file: &PathBuf,
    out_dir: &PathBuf,
    delimiter: &str,
    sanitize: bool,
) -> renvel_core::Result<()> {
    let options = dump_options(delimiter, sanitize)?;
    let result = dump_store(file, out_dir, &options)?;

    println!(
        "Dumped {} table(s) to {}",
        result.files_written.len(),
        out_dir.display()
    );
    for path in &result.files_written {
        println!("  {}", path.display());
    }

    if !result.errors.is_empty() {
        println!("\nErrors ({}):", result.errors.len());
        for (table, err) in &result.errors {
            println!("  {}: {}", table, err);
        }
    }

    Ok(())
}

fn cmd_dump_table(
    file: &PathBuf,
    table: &str,
    output: &PathBuf,
    delimiter: &str,
    sanitize: bool,
) -> renvel_core::Result<()> {
    let options = dump_options(delimiter, sanitize)?;
    let rows = dump_table(file, table, output, &options)?;
    println!("Dumped {} row(s) of '{}' to {}", rows, table, output.display());
    Ok(())
}

fn cmd_csv_to_db(dir: &PathBuf, delimiter: &str) -> renvel_core::Result<()> {
    println!("--- CSV to DB Converter ---");

    let options = ImportOptions {
        delimiter: dump_options(delimiter, false)?.delimiter,
    };
    let result = import_directory(dir, &options)?;

    if result.databases_created.is_empty() {
        println!("No suitable .csv files found to process.");
        return Ok(());
    }

    println!();
    println!("Conversion complete!");
    println!(
        "  {} database(s) created, {} table(s), {} row(s) skipped",
        result.databases_created.len(),
        result.tables_created,
        result.skipped_rows
    );

    if !result.errors.is_empty() {
        println!("\nErrors ({}):", result.errors.len());
        for (path, err) in &result.errors {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

fn cmd_clean_def(input: &PathBuf, output: &PathBuf) -> renvel_core::Result<()> {
    let count = clean_def(input, output)?;
    println!("Found {} export name(s). Clean file: {}", count, output.display());
    Ok(())
}

fn cmd_insert(
    dir: &PathBuf,
    marker: &str,
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> renvel_core::Result<()> {
    let block = match (content, content_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path).map_err(|e| {
            renvel_core::Error::FileRead { path, source: e }
        })?,
        (None, None) => {
            eprintln!("Either --content or --content-file is required");
            std::process::exit(2);
        }
    };

    let result = insert_after_marker(dir, marker, &block)?;

    println!(
        "{} file(s) updated, {} file(s) without the marker",
        result.modified.len(),
        result.skipped.len()
    );
    for path in &result.skipped {
        println!("  skipped: {}", path.display());
    }

    if !result.errors.is_empty() {
        println!("\nErrors ({}):", result.errors.len());
        for (path, err) in &result.errors {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

fn dump_options(delimiter: &str, sanitize: bool) -> renvel_core::Result<DumpOptions> {
    let bytes = delimiter.as_bytes();
    if bytes.len() != 1 {
        eprintln!("Delimiter must be a single ASCII character");
        std::process::exit(2);
    }
    Ok(DumpOptions {
        delimiter: bytes[0],
        sanitize,
    })
}
