//! `sendwise`: assess the consequences of a message before sending it.
//!
//! Results go to stdout as JSON (or plain text for `prompt` and `refactor`).
//! Logs go to stderr; set `RUST_LOG` to change the level.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sendwise_core::{parse_response, validate_text, FallbackAnalyzer};
use sendwise_runtime::{
    build_analysis_prompt, AnalysisRequest, AnalyzeError, AnalyzerConfig, ConfigError,
    ConsequenceAnalyzer, RefactorError, TextRefactorer, DEFAULT_CONTEXT, DEFAULT_COUNTRY,
};

mod exit_codes;
mod report;

use report::AnalysisReport;

/// Config file path used when `--config` is not given.
const CONFIG_ENV: &str = "SENDWISE_CONFIG";

const DEFAULT_LOG_FILTER: &str = "sendwise=info";

#[derive(Parser, Debug)]
#[command(name = "sendwise")]
#[command(author, version, about = "Assess the legal, emotional and practical consequences of a message")]
struct Cli {
    /// YAML config file (defaults to $SENDWISE_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a message with the model, falling back to local rules
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Print the prompt that would be sent for a message
    Prompt {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Validate a raw model reply and print the parsed analysis
    Parse {
        /// File containing the reply (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Print the local fallback analysis for a message
    Fallback {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Rewrite a message in a clear, professional register
    Refactor {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Message text
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// Read the message from a file
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Situational context: workplace, academic, personal
    #[arg(long, default_value = DEFAULT_CONTEXT)]
    context: String,

    /// Country code, e.g. CO, PE, MX
    #[arg(long, default_value = DEFAULT_COUNTRY)]
    country: String,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let code = if e.downcast_ref::<ConfigError>().is_some() {
                exit_codes::CONFIG_ERROR
            } else {
                exit_codes::FAILURE
            };
            eprintln!("error: {:#}", e);
            code
        }
    };
    std::process::exit(code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Analyze { input, frame } => {
            let text = read_input(&input)?;
            if let Err(e) = validate_text(&text) {
                eprintln!("error: {}", e);
                return Ok(exit_codes::INVALID_INPUT);
            }

            let config = load_config(cli.config.as_deref())?;
            let analyzer = ConsequenceAnalyzer::from_config(config)?;
            let request = AnalysisRequest::new(text)
                .with_context(frame.context)
                .with_country(frame.country);

            let cancel = cancel_on_ctrl_c();
            let outcome = match analyzer.attempt(&request, &cancel).await {
                Ok(outcome) => outcome,
                Err(AnalyzeError::InvalidInput(e)) => {
                    eprintln!("error: {}", e);
                    return Ok(exit_codes::INVALID_INPUT);
                }
                Err(AnalyzeError::Cancelled) => return Ok(exit_codes::CANCELLED),
            };

            let branch = outcome.branch();
            let analysis = analyzer.resolve(outcome, &request.text);
            let report = AnalysisReport::new(branch, &request.context, &request.country, &analysis);
            print_json(&report, cli.pretty)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Prompt { input, frame } => {
            let text = read_input(&input)?;
            println!(
                "{}",
                build_analysis_prompt(&text, &frame.context, &frame.country)
            );
            Ok(exit_codes::SUCCESS)
        }

        Commands::Parse { file } => {
            let raw = read_source(file.as_deref())?;
            match parse_response(&raw) {
                Ok(analysis) => {
                    print_json(&analysis, cli.pretty)?;
                    Ok(exit_codes::SUCCESS)
                }
                Err(e) => {
                    eprintln!("error: reply rejected at {} stage: {}", e.stage(), e);
                    Ok(exit_codes::FAILURE)
                }
            }
        }

        Commands::Fallback { input } => {
            let text = read_input(&input)?;
            let config = load_config(cli.config.as_deref())?;
            let fallback = FallbackAnalyzer::new(config.fallback.to_lexicon());
            print_json(&fallback.build(&text), cli.pretty)?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Refactor { input } => {
            let text = read_input(&input)?;
            let config = load_config(cli.config.as_deref())?;
            let refactorer = TextRefactorer::from_config(&config)?;

            match refactorer.refactor(&text, &cancel_on_ctrl_c()).await {
                Ok(rewritten) => {
                    println!("{}", rewritten);
                    Ok(exit_codes::SUCCESS)
                }
                Err(RefactorError::EmptyText) => {
                    eprintln!("error: {}", RefactorError::EmptyText);
                    Ok(exit_codes::INVALID_INPUT)
                }
                Err(RefactorError::Cancelled) => Ok(exit_codes::CANCELLED),
                Err(e @ RefactorError::Transport(_)) => {
                    eprintln!("error: {}", e);
                    Ok(exit_codes::UPSTREAM_ERROR)
                }
            }
        }
    }
}

fn load_config(flag: Option<&Path>) -> Result<AnalyzerConfig> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let path = flag.map(Path::to_path_buf).or(from_env);

    let config = AnalyzerConfig::load(path.as_deref()).map_err(|e| {
        let context = match &path {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "invalid configuration".to_string(),
        };
        anyhow::Error::new(e).context(context)
    })?;

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

fn read_input(input: &InputArgs) -> Result<String> {
    match &input.text {
        Some(text) => Ok(text.clone()),
        None => read_source(input.file.as_deref()),
    }
}

fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

/// Token that fires on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let guard = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            guard.cancel();
        }
    });
    token
}
