//! bubblegrid CLI: decode and grade photographed answer sheets.

use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bubblegrid::{
    AnswerKey, DecodeConfig, ImageInput, PngFileSink, QuestionAnswer, ScanError, SheetDecoder,
    DEFAULT_TOTAL_QUESTIONS,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "bubblegrid")]
#[command(about = "Decode multiple-choice bubble sheets (4 options per question) into answers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one sheet image into per-question answers.
    Decode(CliDecodeArgs),

    /// Decode one sheet and score it against an answer key.
    Grade(CliGradeArgs),

    /// Decode many sheet images in parallel.
    Batch(CliBatchArgs),

    /// Print the default decoder configuration as JSON.
    ConfigInfo,
}

#[derive(Debug, Clone, Args)]
struct CliDecodeArgs {
    /// Path to the input image (encoded image file, or a text file holding
    /// base64 / a data URI).
    #[arg(long)]
    image: PathBuf,

    /// Number of questions on the sheet.
    #[arg(long, default_value_t = DEFAULT_TOTAL_QUESTIONS)]
    questions: u32,

    /// Partial JSON config overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the answers (JSON). Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to write the full scan diagnostics (JSON).
    #[arg(long)]
    debug_json: Option<PathBuf>,

    /// Path to write an annotated overlay (PNG).
    #[arg(long)]
    overlay: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliGradeArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Answer key (JSON). Its totalQuestions sets the question count.
    #[arg(long)]
    key: PathBuf,

    /// Partial JSON config overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the grade report (JSON). Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliBatchArgs {
    /// Input images.
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Number of questions on every sheet.
    #[arg(long, default_value_t = DEFAULT_TOTAL_QUESTIONS)]
    questions: u32,

    /// Partial JSON config overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving one `<image stem>.json` per input (`<stem>-<index>.json`
    /// when several inputs share a stem).
    #[arg(long)]
    out_dir: PathBuf,

    /// Worker threads (default: one per core).
    #[arg(long)]
    jobs: Option<usize>,
}

/// Per-image outcome written by `batch`.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry<'a> {
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    answers: Option<&'a [QuestionAnswer]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    sheet_not_found: bool,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode(args) => run_decode(&args),
        Commands::Grade(args) => run_grade(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::ConfigInfo => run_config_info(),
    }
}

fn load_decoder(config: Option<&Path>) -> CliResult<SheetDecoder> {
    match config {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            Ok(SheetDecoder::from_config_json_file(path)?)
        }
        None => Ok(SheetDecoder::new()),
    }
}

fn read_image_file(path: &Path) -> CliResult<Vec<u8>> {
    tracing::info!("Loading image: {}", path.display());
    std::fs::read(path).map_err(|e| -> CliError {
        format!("Failed to read image {}: {}", path.display(), e).into()
    })
}

/// Text files holding a data URI are decoded as base64, everything else as
/// an encoded image.
fn as_input(bytes: &[u8]) -> ImageInput<'_> {
    match std::str::from_utf8(bytes) {
        Ok(text) if text.trim_start().starts_with("data:image/") => ImageInput::Text(text),
        _ => ImageInput::Bytes(bytes),
    }
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Output file name per batch input. Stems shared by several inputs get the
/// input's position appended so no result overwrites another.
fn batch_output_names(images: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = images
        .iter()
        .map(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string())
        })
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }
    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            if counts[stem.as_str()] > 1 {
                format!("{stem}-{i}.json")
            } else {
                format!("{stem}.json")
            }
        })
        .collect()
}

fn report_scan_error(path: &Path, e: &ScanError) {
    if e.is_sheet_not_found() {
        tracing::warn!("{}: {}", path.display(), e);
    } else {
        tracing::error!("{}: {}", path.display(), e);
    }
}

// ── config-info ───────────────────────────────────────────────────────

fn run_config_info() -> CliResult<()> {
    write_json(&DecodeConfig::default(), None)
}

// ── decode ─────────────────────────────────────────────────────────────

fn run_decode(args: &CliDecodeArgs) -> CliResult<()> {
    let mut decoder = load_decoder(args.config.as_deref())?;
    if let Some(path) = &args.overlay {
        decoder = decoder.with_overlay_sink(PngFileSink::new(path));
    }
    let bytes = read_image_file(&args.image)?;

    let scan = decoder
        .decode_detailed(as_input(&bytes), args.questions)
        .inspect_err(|e| report_scan_error(&args.image, e))?;
    tracing::info!(
        "Image size: {}x{}, {} of {} questions answered",
        scan.image_size[0],
        scan.image_size[1],
        scan.answered_count(),
        args.questions
    );

    write_json(&scan.answers(), args.out.as_deref())?;

    if let Some(debug_path) = &args.debug_json {
        let debug_json = serde_json::to_string_pretty(&scan)?;
        std::fs::write(debug_path, &debug_json)?;
        tracing::info!("Scan diagnostics written to {}", debug_path.display());
    }
    Ok(())
}

// ── grade ──────────────────────────────────────────────────────────────

fn run_grade(args: &CliGradeArgs) -> CliResult<()> {
    let decoder = load_decoder(args.config.as_deref())?;
    let key = AnswerKey::from_json_file(&args.key)?;
    tracing::info!(
        "Answer key '{}': {} questions",
        key.name,
        key.total_questions
    );
    let bytes = read_image_file(&args.image)?;

    let answers = decoder
        .decode(as_input(&bytes), key.total_questions)
        .inspect_err(|e| report_scan_error(&args.image, e))?;
    let report = bubblegrid::grade(&key, &answers);
    tracing::info!(
        "Score {}/{} ({:.2}%)",
        report.score,
        report.total_questions,
        report.percentage
    );

    write_json(&report, args.out.as_deref())
}

// ── batch ──────────────────────────────────────────────────────────────

fn run_batch(args: &CliBatchArgs) -> CliResult<()> {
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
    }
    let decoder = load_decoder(args.config.as_deref())?;
    std::fs::create_dir_all(&args.out_dir)?;

    let files = args
        .images
        .iter()
        .map(|p| read_image_file(p))
        .collect::<CliResult<Vec<_>>>()?;
    let inputs: Vec<ImageInput<'_>> = files.iter().map(|b| as_input(b)).collect();
    let results = decoder.decode_batch(&inputs, args.questions);

    let names = batch_output_names(&args.images);
    let mut decoded = 0usize;
    let mut not_found = 0usize;
    let mut failed = 0usize;
    for ((path, result), name) in args.images.iter().zip(&results).zip(&names) {
        let entry = match result {
            Ok(answers) => {
                decoded += 1;
                BatchEntry {
                    image: path.display().to_string(),
                    answers: Some(answers.as_slice()),
                    error: None,
                    sheet_not_found: false,
                }
            }
            Err(e) => {
                report_scan_error(path, e);
                if e.is_sheet_not_found() {
                    not_found += 1;
                } else {
                    failed += 1;
                }
                BatchEntry {
                    image: path.display().to_string(),
                    answers: None,
                    error: Some(e.to_string()),
                    sheet_not_found: e.is_sheet_not_found(),
                }
            }
        };
        let out = args.out_dir.join(name);
        std::fs::write(&out, serde_json::to_string_pretty(&entry)?)?;
    }

    tracing::info!(
        "{} decoded, {} without a recognizable sheet, {} failed",
        decoded,
        not_found,
        failed
    );
    if failed > 0 {
        return Err(format!("{failed} image(s) could not be decoded").into());
    }
    Ok(())
}
