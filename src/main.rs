use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;

use pcm2g729::{convert_file, ConvertOptions, ConvertSummary};

#[derive(Parser)]
#[command(name = "pcm2g729", version)]
#[command(about = "Compress raw 8kHz PCM audio into a G.729 WAV container")]
struct Cli {
    /// Input file: headerless 16-bit mono 8kHz PCM, or a WAV file in the same format
    input: PathBuf,

    /// Output WAV file (created or truncated)
    output: PathBuf,

    /// Enable voice activity detection; silent frames are suppressed
    #[arg(long)]
    vad: bool,
}

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.use_stderr() {
                let _ = err.print();
                process::exit(1);
            }
            // --help and --version keep their usual exit status.
            err.exit();
        }
    };

    match run(&cli) {
        Ok(summary) => {
            println!(
                "Encoded {} frames ({} bytes audio data)",
                summary.frame_count, summary.data_size
            );
        }
        Err(err) => {
            eprintln!("pcm2g729: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ConvertSummary> {
    let options = ConvertOptions { vad: cli.vad };
    convert_file(&cli.input, &cli.output, &options)
        .with_context(|| format!("failed to convert {}", cli.input.display()))
}

fn init_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
