use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mp3ify::{
    AudioFetcher, Bitrate, Converter, FfmpegEncoder, FileCollector, Materializer, PendingFile,
    ProgressObserver, ProgressReporter, ProgressUpdate,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  mp3ify fetch https://example.com/song.wav --bitrate 320 --out downloads\n  mp3ify convert a.wav b.ogg --bitrate 192 --out converted --progress\n  mp3ify convert *.wav --json\n  mp3ify completions zsh > _mp3ify";

#[derive(Debug, Parser)]
#[command(
    name = "mp3ify",
    version,
    about = "Convert remote or local audio files to MP3",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar with the current status line.
    #[arg(long)]
    progress: bool,

    /// Path to the ffmpeg binary (defaults to `ffmpeg` on PATH).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary (defaults to `ffprobe` on PATH).
    #[arg(long)]
    ffprobe: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a direct audio URL and convert it to MP3.
    #[command(
        about = "Fetch a remote audio file and convert it",
        after_help = "Examples:\n  mp3ify fetch https://example.com/song.wav\n  mp3ify fetch https://example.com/song.ogg --bitrate 256 --out downloads"
    )]
    Fetch {
        /// Direct URL to an audio file (platform pages are rejected).
        url: String,

        /// Target bitrate in kbps: 128 | 192 | 256 | 320.
        #[arg(long, default_value = "192")]
        bitrate: String,

        /// Output directory for the converted file.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Convert local audio files to MP3, strictly in order.
    #[command(
        about = "Convert picked local files",
        after_help = "Examples:\n  mp3ify convert track.wav --out converted\n  mp3ify convert a.wav b.ogg c.flac --bitrate 320 --json"
    )]
    Convert {
        /// Input files; non-audio candidates are skipped.
        files: Vec<PathBuf>,

        /// Target bitrate in kbps: 128 | 192 | 256 | 320.
        #[arg(long, default_value = "192")]
        bitrate: String,

        /// Output directory for the converted files.
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Print a machine-readable JSON summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_bitrate(value: &str) -> Option<Bitrate> {
    value.parse().ok()
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_update(&self, update: &ProgressUpdate) {
        self.bar.set_position(u64::from(update.percent));
        self.bar.set_message(update.status.clone());
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn build_reporter(global: &GlobalOptions) -> ProgressReporter {
    if global.progress {
        ProgressReporter::with_observer(Arc::new(TerminalProgress::new()))
    } else {
        ProgressReporter::new()
    }
}

fn build_converter(global: &GlobalOptions, reporter: ProgressReporter) -> Converter {
    let mut encoder = FfmpegEncoder::new();
    if let Some(ffmpeg) = &global.ffmpeg {
        encoder = encoder.with_binary(ffmpeg);
    }
    if let Some(ffprobe) = &global.ffprobe {
        encoder = encoder.with_probe_binary(ffprobe);
    }
    Converter::new(Arc::new(encoder)).with_reporter(reporter)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match cli.command {
        Commands::Fetch { url, bitrate, out } => {
            let bitrate =
                parse_bitrate(&bitrate).ok_or(format!("unsupported --bitrate: {bitrate}"))?;

            let reporter = build_reporter(&cli.global);
            let fetcher = AudioFetcher::new().with_reporter(reporter.clone());
            let converter = build_converter(&cli.global, reporter);
            let materializer = Materializer::new(&out);

            let audio = fetcher.fetch(&url).await?;
            eprintln!(
                "{} {} ({})",
                "loaded:".cyan().bold(),
                audio.display_name,
                audio.mime,
            );

            let result = converter.convert(&audio, bitrate).await?;
            let handle = materializer.present(&result)?;
            println!("{} {}", "saved:".green().bold(), handle.path.display());
        }
        Commands::Convert {
            files,
            bitrate,
            out,
            json,
        } => {
            let bitrate =
                parse_bitrate(&bitrate).ok_or(format!("unsupported --bitrate: {bitrate}"))?;

            let mut collector = FileCollector::new();
            let candidates = files
                .iter()
                .map(PendingFile::from_path)
                .collect::<Result<Vec<_>, _>>()?;
            let accepted = collector.add_files(candidates);

            if !collector.can_convert() {
                return Err("no audio files among the inputs".into());
            }
            if accepted < files.len() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("skipped {} non-audio input(s)", files.len() - accepted).yellow(),
                );
            }
            for row in collector.listing() {
                eprintln!("  {row}");
            }

            let reporter = build_reporter(&cli.global);
            let converter = build_converter(&cli.global, reporter);
            let materializer = Materializer::new(&out).retain_all();

            let outcomes = converter.convert_all(collector.pending(), bitrate).await;

            let mut summary = Vec::new();
            let mut failures = 0_usize;
            for (file, outcome) in collector.pending().iter().zip(outcomes) {
                match outcome {
                    Ok(result) => {
                        let handle = materializer.present(&result)?;
                        if !json {
                            println!(
                                "{} {} -> {}",
                                "ok:".green().bold(),
                                file.name,
                                handle.path.display(),
                            );
                        }
                        summary.push(json!({
                            "input": file.name,
                            "status": "ok",
                            "output": handle.path.display().to_string(),
                            "bytes": result.bytes.len(),
                        }));
                    }
                    Err(error) => {
                        failures += 1;
                        if !json {
                            eprintln!("{} {} — {error}", "failed:".red().bold(), file.name);
                        }
                        summary.push(json!({
                            "input": file.name,
                            "status": "error",
                            "error": error.to_string(),
                        }));
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&json!({ "files": summary }))?);
            }
            if failures > 0 {
                return Err(format!("{failures} file(s) failed to convert").into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "mp3ify", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bitrate;
    use mp3ify::Bitrate;

    #[test]
    fn parse_bitrate_ladder() {
        assert_eq!(parse_bitrate("128"), Some(Bitrate::Kbps128));
        assert_eq!(parse_bitrate("192"), Some(Bitrate::Kbps192));
        assert_eq!(parse_bitrate("256"), Some(Bitrate::Kbps256));
        assert_eq!(parse_bitrate("320"), Some(Bitrate::Kbps320));
    }

    #[test]
    fn parse_bitrate_accepts_k_suffix() {
        assert_eq!(parse_bitrate("320k"), Some(Bitrate::Kbps320));
    }

    #[test]
    fn parse_bitrate_rejects_unknown() {
        assert!(parse_bitrate("64").is_none());
        assert!(parse_bitrate("high").is_none());
    }
}
