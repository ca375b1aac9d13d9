use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{error, info, warn, Level};

use pdfparagraphs::pipeline::{find_pdfs, validate_input_path};
use pdfparagraphs::{Converter, ConverterConfig, OcrMode};

#[derive(Parser, Debug)]
#[command(name = "pdfparagraphs")]
#[command(version, about = "Extract paragraphs from PDF files into JSON, with OCR fallback", long_about = None)]
struct Cli {
    /// PDF file to convert (default: every PDF in the working directory)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output JSON path (default: input path with a .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rendering DPI for OCR
    #[arg(long, default_value_t = 200)]
    dpi: u32,

    /// When to use OCR: auto, always or never
    #[arg(long, default_value_t = OcrMode::Auto)]
    ocr: OcrMode,

    /// Pages rendered per OCR batch
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    batch: u64,

    /// OCR language code
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Minimum paragraph length in characters
    #[arg(long, default_value_t = 20)]
    min_length: usize,

    /// Length below which unterminated paragraphs merge into the next one
    #[arg(long, default_value_t = 50)]
    merge_threshold: usize,

    /// Disable merging of short paragraphs
    #[arg(long)]
    no_merge: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = ConverterConfig::new()
        .with_dpi(cli.dpi)
        .with_ocr_mode(cli.ocr)
        .with_batch_size(usize::try_from(cli.batch).unwrap_or(usize::MAX))
        .with_lang(cli.lang)
        .with_min_paragraph_length(cli.min_length)
        .with_merge_threshold(cli.merge_threshold)
        .with_merge_short_paragraphs(!cli.no_merge);
    let converter = Converter::new(config);

    match cli.input {
        Some(input) => convert_single(&converter, &input, cli.output.as_deref()),
        None => {
            if cli.output.is_some() {
                warn!("--output is ignored when converting a whole directory");
            }
            convert_directory(&converter, Path::new("."))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn convert_single(converter: &Converter, input: &Path, output: Option<&Path>) -> Result<()> {
    validate_input_path(input)?;

    converter
        .convert_pdf_to_json(input, output)
        .with_context(|| format!("Failed to process PDF: {}", input.display()))?;
    Ok(())
}

fn convert_directory(converter: &Converter, dir: &Path) -> Result<()> {
    let inputs = find_pdfs(dir)
        .with_context(|| format!("Failed to list PDF files in {}", dir.display()))?;

    if inputs.is_empty() {
        info!("No PDF files found in {}", dir.display());
        return Ok(());
    }

    info!("Batch processing {} file(s)", inputs.len());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, inputs.len(), input.display());
        // Failures are already reported by the converter.
        match converter.convert_pdf_to_json(input, None) {
            Ok(_) => success += 1,
            Err(_) => failed += 1,
        }
    }

    info!("Summary: {} succeeded, {} failed", success, failed);

    if failed > 0 {
        error!("{} file(s) failed to convert", failed);
        anyhow::bail!("{} file(s) failed to process", failed);
    }

    Ok(())
}
