//! bindery - DAISY 3.0 book merge and check tool

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bindery::{merge_directory, validate_dtbook_file};

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version, about = "DAISY 3.0 book toolkit", long_about = None)]
#[command(after_help = "EXAMPLES:
    bindery merge chapters/ merged/    Merge per-chapter books into one
    bindery validate book.xml          Report a DTBook file's structure")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Suppress output messages
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the DAISY book parts under a directory into one book
    Merge {
        /// Directory containing one subdirectory per part
        source: PathBuf,
        /// Output directory for the merged book
        dest: PathBuf,
    },
    /// Parse a DTBook file and report its structure
    Validate {
        /// DTBook XML file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Merge { source, dest } => merge(&source, &dest, cli.quiet),
        Command::Validate { file } => validate(&file, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn merge(source: &PathBuf, dest: &PathBuf, quiet: bool) -> bindery::Result<()> {
    let summary = merge_directory(source, dest)?;

    if !quiet {
        for (from, to) in &summary.copied {
            println!("Copied {} -> {}", from.display(), to.display());
        }
        println!("Parts: {}", summary.copied.len());
        println!("Manifest items: {}", summary.manifest_items);
        println!("Spine refs: {}", summary.spine_refs);
        println!("Nav points: {}", summary.nav_points);
    }
    Ok(())
}

fn validate(file: &PathBuf, quiet: bool) -> bindery::Result<()> {
    match validate_dtbook_file(file) {
        Ok(report) => {
            if !quiet {
                println!("File: {}", file.display());
                println!("Sections: {}", report.sections);
                println!("Paragraphs: {}", report.paragraphs);
                println!("Page markers: {}", report.page_markers);
                println!("Headings:");
                for (index, heading) in report.headings.iter().enumerate() {
                    println!("  {}. {}", index + 1, heading);
                }
            }
            Ok(())
        }
        // A structural problem is a warning; only failing to read the file
        // at all is an error.
        Err(e @ bindery::Error::Io(_)) => Err(e),
        Err(e) => {
            eprintln!("warning: {}: {e}", file.display());
            Ok(())
        }
    }
}
