//! apadoc CLI - APA 7th edition DOCX formatting tool

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use apadoc::{classify, read_document, Apadoc, BodySpacing};

#[derive(Parser)]
#[command(name = "apadoc")]
#[command(version)]
#[command(about = "Format DOCX documents to APA 7th edition style", long_about = None)]
struct Cli {
    /// Input DOCX file(s)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Running head for the page header (defaults to the file name)
    #[arg(long, value_name = "TITLE")]
    running_head: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Format documents (writes <name>_APA.docx next to each input)
    #[command(alias = "fmt")]
    Format {
        /// Input DOCX file(s)
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or a directory to write <name>_APA.docx into
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Running head for the page header (defaults to the file name)
        #[arg(long, value_name = "TITLE")]
        running_head: Option<String>,

        /// Body text line spacing
        #[arg(long, value_enum, default_value = "double")]
        body_spacing: SpacingMode,

        /// Skip writing the running-head page header
        #[arg(long)]
        no_header: bool,
    },

    /// Show how each paragraph would be classified, without writing
    Inspect {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SpacingMode {
    /// Double spacing (APA default)
    Double,
    /// 1.5 line spacing
    OnePointFive,
}

impl From<SpacingMode> for BodySpacing {
    fn from(mode: SpacingMode) -> Self {
        match mode {
            SpacingMode::Double => BodySpacing::Double,
            SpacingMode::OnePointFive => BodySpacing::OnePointFive,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Format {
            inputs,
            output,
            running_head,
            body_spacing,
            no_header,
        }) => cmd_format(
            &inputs,
            output.as_deref(),
            running_head,
            body_spacing.into(),
            no_header,
        ),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: format if inputs are provided
            if !cli.inputs.is_empty() {
                cmd_format(
                    &cli.inputs,
                    None,
                    cli.running_head,
                    BodySpacing::Double,
                    false,
                )
            } else {
                println!("{}", "Usage: apadoc <FILE>...".yellow());
                println!("       apadoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_format(
    inputs: &[PathBuf],
    output: Option<&Path>,
    running_head: Option<String>,
    body_spacing: BodySpacing,
    no_header: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        if inputs.len() > 1 && !path.is_dir() {
            return Err("--output must be a directory when formatting several files".into());
        }
    }

    let pb = if inputs.len() > 1 {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    for input in inputs {
        if let Some(pb) = &pb {
            pb.set_message(input.display().to_string());
        }

        let mut builder = Apadoc::new().body_spacing(body_spacing);
        if let Some(title) = &running_head {
            builder = builder.running_head(title.clone());
        }
        if no_header {
            builder = builder.no_header();
        }
        if let Some(path) = output {
            if path.is_dir() {
                let default_name = apadoc::output_path_for(input);
                match default_name.file_name() {
                    Some(name) => builder = builder.output(path.join(name)),
                    None => builder = builder.output(path),
                }
            } else {
                builder = builder.output(path);
            }
        }

        let outcome = builder.format(input)?;

        if let Some(pb) = &pb {
            pb.inc(1);
        }
        println!(
            "{} {} ({})",
            "Wrote".green(),
            outcome.output_path.display(),
            outcome.report
        );
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done!");
    }

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_document(input)?;

    if json {
        let paragraphs: Vec<serde_json::Value> = doc
            .paragraphs
            .iter()
            .enumerate()
            .map(|(i, p)| {
                serde_json::json!({
                    "index": i,
                    "level": classify(&p.runs).map(|l| l.rank()),
                    "max_font_size": p.max_font_size(),
                    "text": preview(&p.plain_text()),
                })
            })
            .collect();

        let out = serde_json::json!({
            "file": input.display().to_string(),
            "paragraphs": paragraphs,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", "Paragraph Classification".cyan().bold());
    println!("{}", "─".repeat(60).dimmed());

    let mut headings = 0usize;
    for (i, p) in doc.paragraphs.iter().enumerate() {
        let label = match classify(&p.runs) {
            Some(level) => {
                headings += 1;
                level.to_string().yellow().bold()
            }
            None => "body".dimmed(),
        };
        let size = p
            .max_font_size()
            .map(|s| format!("{s:.0}pt"))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>4}  {:<6} {:>5}  {}", i, label, size, preview(&p.plain_text()));
    }

    println!();
    println!(
        "{}: {} paragraphs, {} headings",
        "Total".bold(),
        doc.paragraphs.len(),
        headings
    );

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }

    Ok(())
}

fn preview(text: &str) -> String {
    const MAX: usize = 50;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

fn cmd_version() {
    println!("{} {}", "apadoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("APA 7th edition DOCX formatting tool");
    println!();
    println!("License: MIT");
}
