use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use voice_memo_audio::audio::CancelFlag;
use voice_memo_audio::config::{AppPaths, CodecBackend, PipelineConfig};
use voice_memo_audio::pipeline::{AudioPipeline, DecodeOutcome, EmptyReason};
use voice_memo_audio::stt::{RecognizerHandle, SttError, Transcript};

#[derive(Parser, Debug)]
#[command(name = "voice-memo-audio")]
#[command(about = "Decode voice memos for transcription and waveform display")]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Decode on a dedicated worker thread
    #[arg(short, long, global = true)]
    threaded: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a recording and print what was found
    Info { input: PathBuf },

    /// Print the container-advertised duration in milliseconds
    Duration { input: PathBuf },

    /// Print normalized waveform bar heights
    Waveform {
        input: PathBuf,

        /// Number of bars (overrides the settings file)
        #[arg(short, long)]
        bars: Option<usize>,

        /// Print the bars as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Transcribe a recording with the local speech recognizer
    Transcribe {
        input: PathBuf,

        /// GGML model file (overrides the settings file)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            PipelineConfig::default()
        }),
    };
    if args.threaded {
        config.decode.backend = CodecBackend::Threaded;
    }

    match args.command {
        Command::Info { input } => info(&AudioPipeline::new(config), &input),
        Command::Duration { input } => {
            println!("{}", AudioPipeline::new(config).duration_ms(&input));
            Ok(())
        }
        Command::Waveform { input, bars, json } => {
            if let Some(bars) = bars {
                config.output.waveform_bars = bars;
            }
            config.validate()?;
            waveform(&AudioPipeline::new(config), &input, json)
        }
        Command::Transcribe { input, model } => {
            if let Some(model) = model {
                config.recognizer.model_path = Some(model);
            }
            transcribe(config, &input)
        }
    }
}

fn info(pipeline: &AudioPipeline, input: &Path) -> Result<()> {
    let outcome = pipeline.decode(input, &CancelFlag::new());
    let duration_ms = pipeline.duration_ms(input);

    match outcome {
        DecodeOutcome::Decoded(audio) => {
            println!("file:        {}", input.display());
            println!("codec:       {}", audio.track.codec_identifier);
            println!("channels:    {}", audio.track.channel_count);
            println!("sample rate: {} Hz", audio.sample_rate_hz);
            println!("frames:      {}", audio.frames_decoded);
            println!("samples:     {}", audio.samples.len());
            println!("decoded:     {:.3} s", audio.duration_secs());
            println!("container:   {duration_ms} ms");
        }
        DecodeOutcome::Empty(EmptyReason::NoSamples) => {
            println!("{}: no audio samples", input.display());
        }
        DecodeOutcome::Empty(EmptyReason::Failed(err)) => {
            println!("{}: {err}", input.display());
        }
    }
    Ok(())
}

fn waveform(pipeline: &AudioPipeline, input: &Path, json: bool) -> Result<()> {
    let bars = pipeline.waveform(input);
    if json {
        println!("{}", serde_json::to_string(&bars).context("serializing bars")?);
    } else {
        let line: Vec<String> = bars.iter().map(|b| format!("{b:.3}")).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

fn transcribe(config: PipelineConfig, input: &Path) -> Result<()> {
    let model_path = config.recognizer.resolve_model_path(&AppPaths::new());
    let handle = RecognizerHandle::new();
    handle
        .init(|| load_recognizer(&config, &model_path))
        .with_context(|| format!("loading recognizer from {}", model_path.display()))?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let pipeline = AudioPipeline::new(config);
    let result = rt.block_on(pipeline.transcribe_async(input.to_path_buf(), handle.clone()));
    handle.shutdown();

    match result.with_context(|| format!("transcribing {}", input.display()))? {
        Transcript::Text(text) => println!("{text}"),
        Transcript::NoSpeech => log::info!("{}: no speech", input.display()),
    }
    Ok(())
}

#[cfg(feature = "whisper")]
fn load_recognizer(
    config: &PipelineConfig,
    model_path: &Path,
) -> Result<std::sync::Arc<dyn voice_memo_audio::stt::Recognizer>, SttError> {
    use voice_memo_audio::stt::{TranscribeParams, WhisperRecognizer};

    let params = TranscribeParams::from_config(&config.recognizer);
    let engine = WhisperRecognizer::load(model_path, params)?;
    Ok(std::sync::Arc::new(engine))
}

#[cfg(not(feature = "whisper"))]
fn load_recognizer(
    _config: &PipelineConfig,
    _model_path: &Path,
) -> Result<std::sync::Arc<dyn voice_memo_audio::stt::Recognizer>, SttError> {
    Err(SttError::BackendUnavailable)
}
