//! kniga - document tree to FictionBook converter

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use kniga::document::json::from_json_reader;
use kniga::{ConvertOptions, convert, read_fb2_file, write_fb2, write_fb2_zip};

#[derive(Parser)]
#[command(name = "kniga")]
#[command(version, about = "Document tree to FictionBook converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    kniga book.json                 Write book.fb2.zip
    kniga book.json -o out.fb2 -p   Write plain FB2
    kniga -i book.fb2.zip           Show book metadata")]
struct Cli {
    /// Input file (JSON document tree, or FB2 with --info)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (defaults to INPUT with .fb2.zip, or .fb2 with --plain)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Write plain .fb2 instead of a zip container
    #[arg(short, long)]
    plain: bool,

    /// Directory searched for images before the document directory
    #[arg(long, value_name = "DIR")]
    to_dir: Option<PathBuf>,

    /// Tool that produced the document tree, recorded as `program-used`
    #[arg(long, value_name = "NAME")]
    generator: Option<String>,

    /// Show book metadata of an existing .fb2 or .fb2.zip without converting
    #[arg(short, long)]
    info: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let result = if cli.info {
        show_info(&cli.input)
    } else {
        run_convert(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_info(path: &Path) -> kniga::Result<()> {
    let book = read_fb2_file(path)?;

    let meta = &book.metadata;
    println!("File: {}", path.display());
    println!("Title: {}", meta.title);
    if !meta.authors.is_empty() {
        let names: Vec<String> = meta.authors.iter().map(|a| a.display_name()).collect();
        println!("Authors: {}", names.join(", "));
    }
    println!("Language: {}", meta.lang);
    if let Some(date) = &meta.date {
        println!("Date: {}", date.display);
    }
    if let Some(series) = &meta.series {
        match series.number {
            Some(n) => println!("Series: {} #{n}", series.name),
            None => println!("Series: {}", series.name),
        }
    }
    if !meta.publishers.is_empty() {
        println!("Publisher: {}", meta.publishers.join(", "));
    }
    if let Some(program) = &meta.program_used {
        println!("Program: {program}");
    }
    if let Some(desc) = &meta.annotation {
        let desc = desc.trim();
        match desc.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
            None => println!("Description: {desc}"),
        }
    }
    println!("Bodies: {}", book.bodies.len());
    println!("Binaries: {}", book.binaries.len());

    Ok(())
}

fn run_convert(cli: &Cli) -> kniga::Result<()> {
    let file = File::open(&cli.input)?;
    let mut tree = from_json_reader(BufReader::new(file))?;

    // Relative image paths resolve against the input file unless the tree
    // names its own base directory.
    if tree.base_dir == Path::new(".")
        && let Some(parent) = cli.input.parent().filter(|p| !p.as_os_str().is_empty())
    {
        tree.base_dir = parent.to_path_buf();
    }

    let options = ConvertOptions {
        to_dir: cli.to_dir.clone(),
        generator: cli.generator.clone(),
    };

    let book = convert(&tree, &options)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.input, cli.plain));
    if cli.plain {
        write_fb2(&book, &output)?;
    } else {
        write_fb2_zip(&book, &output)?;
    }

    if !cli.quiet {
        println!(
            "{} -> {} ({} binaries{})",
            cli.input.display(),
            output.display(),
            book.binaries.len(),
            if book.notes_body().is_some() {
                ", footnotes"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn default_output(input: &Path, plain: bool) -> PathBuf {
    let extension = if plain { "fb2" } else { "fb2.zip" };
    input.with_extension(extension)
}
