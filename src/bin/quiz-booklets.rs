//! Quiz Booklets CLI tool
//!
//! Splits quiz-result screenshots into question and answer PDF booklets.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use quiz_booklets::booklet::BookletKind;
use quiz_booklets::collect::{collect_folders, resolve_folder};
use quiz_booklets::layout::{LayoutConfig, LayoutMode, Length, Margins, PageDimensions};
use quiz_booklets::ocr::TesseractRecognizer;
use quiz_booklets::pdf::Fidelity;
use quiz_booklets::split::{FallbackPolicy, SplitConfig};
use quiz_booklets::{pipeline, Assembly, EmptyFolderPolicy, RunConfig, RunSummary};

/// Quiz Booklets - split quiz screenshots into question and answer PDFs
#[derive(Parser)]
#[command(name = "quiz-booklets")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Ask for folders interactively
    quiz-booklets

    # Two folders, several screenshots per page
    quiz-booklets --layout flowing week-1 week-2

    # Letter paper, downsample embedded images to 200 dpi
    quiz-booklets --page letter --dpi 200 ~/quiz/week-3")]
struct Cli {
    /// Screenshot folders, in booklet order. Prompted for when omitted
    folders: Vec<String>,

    /// How screenshots are arranged on pages
    #[arg(long, value_enum, default_value_t = LayoutArg::OnePerPage)]
    layout: LayoutArg,

    /// Paper size
    #[arg(long, value_enum, default_value_t = PageArg::A4)]
    page: PageArg,

    /// Page margin in millimeters (default: 0 for one-per-page, 12.7 for flowing)
    #[arg(long)]
    margin_mm: Option<f64>,

    /// Space between images in flowing layout, in millimeters
    #[arg(long, default_value_t = 4.0)]
    gap_mm: f64,

    /// Build one document per booklet, or per folder and merge at the end
    #[arg(long, value_enum, default_value_t = AssemblyArg::Continuous)]
    assembly: AssemblyArg,

    /// Answer parts shorter than this many pixels are treated as empty
    #[arg(long, default_value_t = 5)]
    min_answer_height: u32,

    /// When the phrase is not found, split at this fraction of the height
    /// instead of using the whole image as the question
    #[arg(long, value_parser = parse_fraction)]
    fallback_split: Option<f64>,

    /// Downsample embedded images to this resolution (Lanczos3)
    #[arg(long)]
    dpi: Option<u32>,

    /// Phrase that starts the answer part
    #[arg(long, default_value = "You answered")]
    phrase: String,

    /// Tesseract language
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Inserted into output names: <stamp>_<prefix>_Questions.pdf
    #[arg(long, default_value = "SME")]
    prefix: String,

    /// Emit title pages for folders without images
    #[arg(long)]
    keep_empty_folders: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    OnePerPage,
    Flowing,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageArg {
    A4,
    Letter,
}

#[derive(Clone, Copy, ValueEnum)]
enum AssemblyArg {
    Continuous,
    Merge,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err("fraction must be between 0 and 1".to_string())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cmd_build(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Translate CLI flags into a run configuration
fn run_config(cli: &Cli) -> RunConfig {
    let mut layout = match cli.layout {
        LayoutArg::OnePerPage => LayoutConfig::default(),
        LayoutArg::Flowing => LayoutConfig {
            mode: LayoutMode::Flowing { gap: Length::from_mm(cli.gap_mm) },
            ..LayoutConfig::flowing()
        },
    };
    layout.page = match cli.page {
        PageArg::A4 => PageDimensions::a4(),
        PageArg::Letter => PageDimensions::letter(),
    };
    if let Some(margin) = cli.margin_mm {
        layout.margins = Margins::uniform(Length::from_mm(margin));
    }

    RunConfig {
        phrase: cli.phrase.clone(),
        lang: cli.lang.clone(),
        split: SplitConfig {
            min_answer_height: cli.min_answer_height,
            fallback: cli
                .fallback_split
                .map_or(FallbackPolicy::WholeAsQuestion, FallbackPolicy::FractionalSplit),
        },
        layout,
        fidelity: cli.dpi.map_or(Fidelity::Direct, |dpi| Fidelity::Resampled { dpi }),
        assembly: match cli.assembly {
            AssemblyArg::Continuous => Assembly::Continuous,
            AssemblyArg::Merge => Assembly::MergeFolders,
        },
        empty_folders: if cli.keep_empty_folders {
            EmptyFolderPolicy::TitleOnly
        } else {
            EmptyFolderPolicy::Omit
        },
        output_prefix: cli.prefix.clone(),
        ..RunConfig::default()
    }
}

/// Collect folders, run the pipeline and report the result
fn cmd_build(cli: Cli) -> anyhow::Result<()> {
    let config = run_config(&cli);

    let folders = if cli.folders.is_empty() {
        collect_folders(io::stdin().lock(), io::stdout()).context("Failed to read folder paths")?
    } else {
        cli.folders
            .iter()
            .filter_map(|raw| match resolve_folder(raw) {
                Ok(folder) => Some(folder),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect::<Vec<PathBuf>>()
    };

    if folders.is_empty() {
        bail!("No folders provided");
    }

    if let Err(e) = TesseractRecognizer::probe() {
        warn!("{}; every image will use the fallback split", e);
    }
    let recognizer = TesseractRecognizer::new(config.lang.clone());

    let summary = pipeline::run(&folders, &recognizer, &config)?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n---");
    for (kind, pages) in [
        (BookletKind::Questions, summary.question_pages),
        (BookletKind::Answers, summary.answer_pages),
    ] {
        println!(
            "{} PDF created: {} ({} pages)",
            kind.label(),
            summary.output.get(kind).display(),
            pages
        );
    }
    println!("Images placed: {}", summary.slots.len());
    let failed = summary.failed_images();
    if failed > 0 {
        println!("Images skipped (unreadable): {}", failed);
    }
    println!("---");
}
