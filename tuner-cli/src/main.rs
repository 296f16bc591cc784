//! # Tuner - command-line front end
//!
//! Captures audio from the microphone (or a WAV file, or a synthetic tone),
//! runs it through the `tuner-core` analyzer on a worker thread and prints
//! one line per reading.
//!
//! ## Architecture
//! - **Main Thread**: parses flags, loads config, renders readings
//! - **Worker Thread**: owns the capture source and the analyzer
//! - **Communication**: crossbeam channel of `WorkerEvent`s
//!
//! Logging goes to stderr through `env_logger`; set `RUST_LOG=debug` to see
//! every raw reading.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{info, warn};
use tuner_core::{
    CaptureError,
    audio::{CaptureSource, CpalCapture, ToneSource, WavFileSource},
    config::TunerConfig,
    display::{DisplaySink, JsonDisplay, TextDisplay},
    worker::{AnalysisWorker, WorkerEvent, WorkerSettings},
};

/// Extra slack on top of one block's duration before a live read gives up.
const READ_TIMEOUT_SLACK: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "tuner", version, about = "Chromatic tuner: prints the dominant note of the input")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Requested capture rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Samples per analysis block
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Pause between readings in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Input device name (default: host default input)
    #[arg(long)]
    device: Option<String>,

    /// Analyze a 16-bit PCM WAV file instead of live input
    #[arg(long, conflicts_with = "tone")]
    wav: Option<PathBuf>,

    /// Analyze a synthetic sine wave at this frequency in Hz
    #[arg(long)]
    tone: Option<f64>,

    /// Print one JSON object per reading instead of text
    #[arg(long)]
    json: bool,

    /// Stop after this many readings
    #[arg(long, short = 'n')]
    count: Option<usize>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Where the worker gets its audio from.
#[derive(Debug, Clone)]
enum Input {
    Microphone,
    Wav(PathBuf),
    Tone(f64),
}

impl Args {
    fn input(&self) -> Input {
        match (&self.wav, self.tone) {
            (Some(path), _) => Input::Wav(path.clone()),
            (None, Some(freq)) => Input::Tone(freq),
            (None, None) => Input::Microphone,
        }
    }

    /// Loads the config file, if any, and applies flag overrides.
    fn resolve_config(&self) -> Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => TunerConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => TunerConfig::default(),
        };
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }
        if let Some(ms) = self.interval_ms {
            config.refresh_interval_ms = ms;
        }
        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn open_source(input: Input, config: TunerConfig) -> Result<Box<dyn CaptureSource>, CaptureError> {
    match input {
        Input::Microphone => {
            let block = Duration::from_secs_f64(config.buffer_size as f64 / config.sample_rate as f64);
            let source = CpalCapture::open(
                config.device.as_deref(),
                config.sample_rate,
                config.buffer_size,
                block + READ_TIMEOUT_SLACK,
            )?;
            Ok(Box::new(source))
        }
        Input::Wav(path) => Ok(Box::new(WavFileSource::open(path)?)),
        Input::Tone(freq) => Ok(Box::new(ToneSource::new(freq, 0.5, config.sample_rate))),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.resolve_config()?;

    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("saving config to {}", path.display()))?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let input = args.input();
    info!("Starting tuner with {:?} input, {:?}", input, config);

    let settings = WorkerSettings::from(&config);
    let (worker, events) = AnalysisWorker::spawn(settings, move || open_source(input, config));

    let stdout = io::stdout().lock();
    let mut display: Box<dyn DisplaySink> = if args.json {
        Box::new(JsonDisplay::new(stdout))
    } else {
        Box::new(TextDisplay::new(stdout))
    };

    let mut readings = 0usize;
    let outcome = loop {
        let event = match events.recv() {
            Ok(event) => event,
            Err(_) => break Err(anyhow!("analysis thread exited unexpectedly")),
        };
        match event {
            WorkerEvent::Started { sample_rate } => {
                info!("Capture running at {} Hz", sample_rate);
            }
            WorkerEvent::Reading(reading) => {
                if let Err(e) = display.render(reading.as_ref()) {
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        break Ok(());
                    }
                    break Err(e).context("writing reading");
                }
                readings += 1;
                if args.count.is_some_and(|limit| readings >= limit) {
                    break Ok(());
                }
            }
            WorkerEvent::Failed(e) => {
                break Err(anyhow::Error::new(e).context("capture stopped"));
            }
            WorkerEvent::Finished => {
                info!("Input exhausted after {} readings", readings);
                break Ok(());
            }
        }
    };

    worker.shutdown();
    if outcome.is_err() {
        warn!("Tuner stopped with an error");
    }
    outcome
}
