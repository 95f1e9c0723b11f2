use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use tldr_core::{summarize_document, Document, Mode, SummaryResult};
use tldr_fetch::{PdfExtractor, TextExtractor};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "tldr")]
#[command(about = "Extractive summaries of local text and PDF files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one file and print the result as JSON
    Summarize {
        /// Input file (.txt, .md or .pdf)
        #[arg(long)]
        input: PathBuf,
        /// Title prepended in quick mode
        #[arg(long)]
        title: Option<String>,
        /// quick treats the file as an abstract, deep as a full body
        #[arg(long, default_value = "deep")]
        mode: Mode,
        /// Number of sentences to keep
        #[arg(long)]
        sentences: Option<usize>,
    },
    /// Summarize every supported file under a directory into JSONL
    Batch {
        /// Input directory
        #[arg(long)]
        input: PathBuf,
        /// Output JSONL file
        #[arg(long)]
        output: PathBuf,
        /// Number of sentences to keep
        #[arg(long)]
        sentences: Option<usize>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutDoc<'a> {
    path: &'a str,
    summarized_at: String,
    #[serde(flatten)]
    result: &'a SummaryResult,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize { input, title, mode, sentences } => {
            let document = load_document(&input, title.as_deref(), mode)?;
            let result = summarize_document(&document, sentences);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Batch { input, output, sentences } => batch(&input, &output, sentences),
    }
}

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("txt" | "md" | "pdf")
    )
}

fn read_text(path: &Path) -> Result<String> {
    if path.extension().and_then(|s| s.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf")) {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let text = PdfExtractor.extract(&bytes).with_context(|| format!("extracting {}", path.display()))?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn load_document(path: &Path, title: Option<&str>, mode: Mode) -> Result<Document> {
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }
    let identity = path.to_string_lossy();
    let text = read_text(path)?;
    Ok(match mode {
        Mode::Quick => Document::quick(&identity, title, Some(&text)),
        Mode::Deep => Document::deep(&identity, title, &text),
    })
}

fn batch(input: &Path, output: &Path, sentences: Option<usize>) -> Result<()> {
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(output)?);

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();

    let mut written = 0usize;
    for file in &files {
        let document = match load_document(file, None, Mode::Deep) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "skipping file");
                continue;
            }
        };
        let result = summarize_document(&document, sentences);
        let path = file.to_string_lossy();
        let rec = OutDoc {
            path: &path,
            summarized_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            result: &result,
        };
        serde_json::to_writer(&mut out, &rec)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;

    tracing::info!(found = files.len(), written, output = %output.display(), "batch complete");
    Ok(())
}
