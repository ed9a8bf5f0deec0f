//! salute-speech: SaluteSpeech 命令行工具
//!
//! Usage:
//!   salute-speech transcribe <file> [-f txt|vtt|srt|tsv|json] [-o out]   Full transcription
//!   salute-speech upload <file>                                          Upload audio, print file id
//!   salute-speech recognize <file> <request_file_id>                     Create a task, print task id
//!   salute-speech status <task_id>                                       Show task status
//!   salute-speech download <response_file_id> [-o out]                   Fetch the raw result

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use salute_speech::audio::{self, AudioValidator};
use salute_speech::{
    render, ClientConfig, OutputFormat, SaluteSpeechClient, TranscriptionOptions,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "salute-speech", version, about = "SaluteSpeech asynchronous speech recognition")]
struct Cli {
    /// YAML client configuration; SALUTE_SPEECH_* variables still apply on top
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Language {
    #[value(name = "ru-RU")]
    RuRu,
    #[value(name = "en-US")]
    EnUs,
    #[value(name = "kk-KZ")]
    KkKz,
}

impl Language {
    fn code(self) -> &'static str {
        match self {
            Language::RuRu => "ru-RU",
            Language::EnUs => "en-US",
            Language::KkKz => "kk-KZ",
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Upload, recognize, wait and write the transcript
    Transcribe {
        file: PathBuf,
        /// Expected channel count; every channel is transcribed separately
        #[arg(long, default_value_t = 1)]
        channels: u16,
        #[arg(long, value_enum, default_value = "ru-RU")]
        language: Language,
        /// Defaults to the output file extension, then txt
        #[arg(short = 'f', long = "output_format")]
        output_format: Option<String>,
        /// Defaults to stdout
        #[arg(short = 'o', long = "output_file")]
        output_file: Option<PathBuf>,
        /// Also save the raw service payload here
        #[arg(long = "debug_dump")]
        debug_dump: Option<PathBuf>,
        /// Seconds between status checks
        #[arg(long, default_value_t = 1.0)]
        poll_interval: f64,
        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
    /// Upload audio and print its request_file_id
    Upload { file: PathBuf },
    /// Create a recognition task for an uploaded file
    Recognize {
        /// The audio that was uploaded, used to detect its parameters
        file: PathBuf,
        request_file_id: String,
        #[arg(long, value_enum, default_value = "ru-RU")]
        language: Language,
    },
    /// Show the status of a task
    Status { task_id: String },
    /// Download the raw result of a finished task
    Download {
        response_file_id: String,
        #[arg(short = 'o', long = "output_file")]
        output_file: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "salute_speech=debug"
    } else {
        "salute_speech=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn build_client(config_path: Option<&Path>) -> Result<SaluteSpeechClient> {
    let mut builder = SaluteSpeechClient::builder();
    if let Some(path) = config_path {
        let config = ClientConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?
            .with_env_overrides();
        builder = builder.config(config);
    }
    Ok(builder.build()?)
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{} must be a positive number of seconds", flag);
    }
    Ok(Duration::from_secs_f64(value))
}

/// Write the whole file or nothing.
async fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("partial");
    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to move output into {}", path.display()))?;
    Ok(())
}

/// Save the raw payload; a directory receives `<task_id>.json`.
async fn dump_raw(path: &Path, task_id: &str, raw: &str) -> Result<PathBuf> {
    let target = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => path.join(format!("{}.json", task_id)),
        _ => path.to_path_buf(),
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_atomically(&target, raw).await?;
    Ok(target)
}

async fn emit(output_file: Option<&Path>, contents: &str) -> Result<()> {
    match output_file {
        Some(path) => write_atomically(path, contents).await,
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}

async fn read_descriptor(file: &Path) -> Result<(bytes::Bytes, salute_speech::AudioDescriptor)> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let bytes = bytes::Bytes::from(bytes);
    let descriptor = audio::probe(&bytes)?;
    AudioValidator::validate(&descriptor)?;
    Ok((bytes, descriptor))
}

#[allow(clippy::too_many_arguments)]
async fn transcribe(
    client: &SaluteSpeechClient,
    file: &Path,
    channels: u16,
    language: Language,
    output_format: Option<&str>,
    output_file: Option<&Path>,
    debug_dump: Option<&Path>,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> Result<()> {
    let format = match (output_format, output_file) {
        (Some(name), _) => name.parse::<OutputFormat>()?,
        (None, Some(path)) => OutputFormat::from_path(path),
        (None, None) => OutputFormat::Txt,
    };

    let (bytes, descriptor) = read_descriptor(file).await?;
    if descriptor.channels != channels {
        bail!(
            "unexpected audio channels number - {}. 1 channel is recommended since SaluteSpeech transcribes each channel independently",
            descriptor.channels
        );
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut options = TranscriptionOptions::new()
        .language(language.code())
        .audio(descriptor)
        .poll_interval(poll_interval)
        .cancel_token(cancel);
    options.timeout = timeout;

    let output = client
        .transcriptions()
        .create_with_raw(std::io::Cursor::new(bytes), &options)
        .await?;

    if let Some(path) = debug_dump {
        match dump_raw(path, &output.task.id, &output.raw).await {
            Ok(target) => debug!(path = %target.display(), "raw result dumped"),
            Err(e) => error!("Failed to dump raw result: {:#}", e),
        }
    }
    let rendered = render(&output.response, format)?;
    emit(output_file, &rendered).await
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(cli.config.as_deref())?;

    match cli.command {
        Command::Transcribe {
            file,
            channels,
            language,
            output_format,
            output_file,
            debug_dump,
            poll_interval,
            timeout,
        } => {
            let poll_interval = seconds(poll_interval, "--poll-interval")?;
            let timeout = timeout.map(|t| seconds(t, "--timeout")).transpose()?;
            transcribe(
                &client,
                &file,
                channels,
                language,
                output_format.as_deref(),
                output_file.as_deref(),
                debug_dump.as_deref(),
                poll_interval,
                timeout,
            )
            .await
        }
        Command::Upload { file } => {
            let (bytes, descriptor) = read_descriptor(&file).await?;
            let file_id = client.upload_file(bytes, &descriptor).await?;
            println!("{}", file_id);
            Ok(())
        }
        Command::Recognize {
            file,
            request_file_id,
            language,
        } => {
            let (_, descriptor) = read_descriptor(&file).await?;
            let task = client
                .async_recognize(&request_file_id, &descriptor, language.code(), None)
                .await?;
            println!("{}\t{}", task.id, task.status);
            Ok(())
        }
        Command::Status { task_id } => {
            let task = client.get_task_status(&task_id).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
            Ok(())
        }
        Command::Download {
            response_file_id,
            output_file,
        } => {
            let payload = client.download_result(&response_file_id).await?;
            emit(output_file.as_deref(), &payload).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<salute_speech::Error>() {
            Some(e) => eprintln!("Error [{}]: {}", e.kind(), e),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
