//! `subtok` command line interface: train, encode, decode, and inspect
//! word-level BPE tokenizers.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use serde_json::json;
use subtok::corpus;
use subtok::{
    IngestConfig, Result, SubtokError, TokenId, Tokenizer, Trainer, TrainerConfig,
};

const DEFAULT_OUTPUT: &str = "tokenizer.bin";

#[derive(Parser, Debug)]
#[command(author, version, about = "Word-level BPE toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a new tokenizer from text corpora
    Train(TrainArgs),
    /// Encode text into token ids with a trained tokenizer
    Encode(EncodeArgs),
    /// Decode token ids back into text
    Decode(DecodeArgs),
    /// Inspect tokenizer metadata
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path for the binary artifact
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Target vocabulary size
    #[arg(long, value_name = "SIZE")]
    vocab_size: Option<usize>,

    /// Maximum ingested word length in bytes
    #[arg(long, value_name = "LEN")]
    max_word_len: Option<usize>,

    /// Word-frequency threshold for the post-training prune
    #[arg(long, value_name = "COUNT")]
    prune_threshold: Option<u64>,

    /// Skip the post-training prune passes
    #[arg(long)]
    no_prune: bool,

    /// Maximum merge iterations
    #[arg(long, value_name = "COUNT")]
    max_merge_iterations: Option<usize>,

    /// Header lines skipped at the start of every corpus file
    #[arg(long, value_name = "COUNT")]
    skip_header_lines: Option<usize>,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,

    /// Disable per-iteration logging/progress
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Tokenizer artifact to load
    #[arg(short = 'm', long, value_name = "PATH")]
    tokenizer: PathBuf,

    /// Text files to encode
    inputs: Vec<PathBuf>,

    /// Encode a literal string instead of files
    #[arg(long, value_name = "TEXT", conflicts_with = "inputs")]
    text: Option<String>,

    /// Emit JSON instead of space-separated ids
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Tokenizer artifact to load
    #[arg(short = 'm', long, value_name = "PATH")]
    tokenizer: PathBuf,

    /// Token ids to decode
    #[arg(required = true)]
    ids: Vec<TokenId>,

    /// Write raw bytes to this path instead of printing lossy UTF-8
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Tokenizer artifact to load
    #[arg(short = 'm', long, value_name = "PATH")]
    tokenizer: PathBuf,

    /// List every merge rule in learning order
    #[arg(long)]
    rules: bool,
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => LevelFilter::Off,
        -1 => LevelFilter::Error,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let outcome = match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut builder = TrainerConfig::builder()
        .prune_after_training(!args.no_prune)
        .show_progress(!args.no_progress);
    if let Some(size) = args.vocab_size {
        builder = builder.target_vocab_size(size);
    }
    if let Some(len) = args.max_word_len {
        builder = builder.max_word_len(len);
    }
    if let Some(threshold) = args.prune_threshold {
        builder = builder.prune_threshold(threshold);
    }
    builder = builder.max_merge_iterations(args.max_merge_iterations);
    let cfg = builder.build()?;

    let mut ingest = IngestConfig::builder()
        .recursive(!args.no_recursive)
        .follow_symlinks(args.follow_symlinks);
    if let Some(count) = args.skip_header_lines {
        ingest = ingest.skip_header_lines(count);
    }
    let ingest = ingest.build();

    let files = corpus::collect_paths(&args.inputs, &ingest)?;
    let mut tokenizer = Tokenizer::new(cfg.tokenizer.clone());
    let bar = file_progress_bar(files.len(), args.no_progress);
    let start = Instant::now();
    for file in &files {
        corpus::ingest_file(&mut tokenizer, file, &ingest)?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(
        "ingested {} files ({} distinct words) in {:.2?}",
        files.len(),
        tokenizer.word_count(),
        start.elapsed()
    );

    let trainer = Trainer::new(cfg);
    let artifacts = trainer.train_tokenizer(tokenizer)?;
    artifacts.tokenizer.save(&args.output)?;
    println!("{artifacts}");
    println!("Saved artifact to {}", args.output.display());
    Ok(())
}

fn file_progress_bar(total: usize, disabled: bool) -> ProgressBar {
    if disabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} files {elapsed_precise}")
            .expect("static template is valid"),
    );
    bar
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let tokenizer = Tokenizer::load(&args.tokenizer)?;
    if args.inputs.is_empty() && args.text.is_none() {
        return Err(SubtokError::InvalidConfig(
            "encode requires input files or --text".into(),
        ));
    }

    if let Some(text) = &args.text {
        let ids = tokenizer.tokenize(text);
        emit_ids(None, &ids, args.json);
        return Ok(());
    }

    for path in &args.inputs {
        let text = fs::read_to_string(path)
            .map_err(|err| SubtokError::io(err, Some(path.clone())))?;
        let ids = tokenizer.tokenize(&text);
        emit_ids(Some(path), &ids, args.json);
    }
    Ok(())
}

fn emit_ids(path: Option<&PathBuf>, ids: &[TokenId], as_json: bool) {
    if as_json {
        let value = match path {
            Some(path) => json!({ "path": path, "tokens": ids }),
            None => json!({ "tokens": ids }),
        };
        println!("{value}");
    } else {
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        println!("{}", rendered.join(" "));
    }
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let tokenizer = Tokenizer::load(&args.tokenizer)?;
    let bytes = tokenizer.detokenize(&args.ids)?;
    match args.output {
        Some(path) => {
            let mut file = fs::File::create(&path)
                .map_err(|err| SubtokError::io(err, Some(path.clone())))?;
            file.write_all(&bytes)
                .map_err(|err| SubtokError::io(err, Some(path.clone())))?;
        }
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let tokenizer = Tokenizer::load(&args.tokenizer)?;
    println!("Vocab size: {}", tokenizer.vocab_size());
    println!("Merge rules: {}", tokenizer.rule_count());
    println!("Next id: {}", tokenizer.vocab().next_id());
    if args.rules {
        for (index, rule) in tokenizer.rules().iter().enumerate() {
            println!("{index:>6}: {rule}");
        }
    }
    Ok(())
}
