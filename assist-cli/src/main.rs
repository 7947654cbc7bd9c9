use anyhow::{Context, Result};
use assist_config::{Config, load};
use assist_image::ImageMagick;
use assist_openai::{OpenAiClient, OpenAiSettings};
use assist_prompt::Template;
use assist_utils::trimmed_or_none;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod pipeline;
mod progress;

use pipeline::{Assistant, Outcome};

/// assist CLI entry point.
///
/// Sends a file to a chat model under a fixed instruction and prints the
/// reply. The `comic` command additionally turns the reply into panel images
/// and a finished strip.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "assist",
    author,
    version,
    about = "Summarize, explain, translate or illustrate a text file with an LLM.",
    long_about = None
)]
struct Cli {
    /// Chat model to use instead of the configured one.
    #[arg(long, value_name = "MODEL", global = true)]
    model: Option<String>,
    /// Directory that receives comic runs instead of the configured one.
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Summarize a text file
    Summarize { file: PathBuf },
    /// Explain a code file step by step
    Explain { file: PathBuf },
    /// Translate a file
    Translate {
        file: PathBuf,
        /// Target language, e.g. "French".
        #[arg(long, value_name = "LANGUAGE")]
        lang: String,
    },
    /// Turn text into a 4-panel comic strip
    Comic {
        file: PathBuf,
        /// Burn each panel's dialogue onto its image.
        #[arg(long)]
        overlay: bool,
    },
}

impl Command {
    pub(crate) fn file(&self) -> &Path {
        match self {
            Command::Summarize { file }
            | Command::Explain { file }
            | Command::Translate { file, .. }
            | Command::Comic { file, .. } => file,
        }
    }

    pub(crate) fn template(&self) -> Template {
        match self {
            Command::Summarize { .. } => Template::Summarize,
            Command::Explain { .. } => Template::Explain,
            Command::Translate { lang, .. } => Template::Translate { lang: lang.clone() },
            Command::Comic { .. } => Template::Comic,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "assist=info",
        1 => "assist=debug",
        _ => "assist=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config();
    let api_key = config.resolve_api_key()?;

    let settings = openai_settings(&config, api_key, cli.model.as_deref());
    debug!(model = %settings.chat_model, "Using chat model");
    let client = OpenAiClient::new(settings).context("failed to configure the OpenAI client")?;
    let compositor = ImageMagick::new(
        config.compositor.program.clone(),
        config.compositor.point_size,
        config.compositor.band_height,
    );

    let assistant = Assistant {
        text: &client,
        images: &client,
        compositor: &compositor,
        output_root: cli
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output_root)),
    };

    let outcome = assistant.run(&cli.command)?;
    print_outcome(&outcome);
    Ok(())
}

/// Loads the user configuration, falling back to defaults when it is unusable.
fn load_config() -> Config {
    match load() {
        Ok(outcome) => {
            if !outcome.found {
                debug!(
                    "No configuration at {}; using defaults",
                    outcome.path.display()
                );
            }
            outcome.config
        }
        Err(error) => {
            warn!("Failed to load assist configuration ({error}). Falling back to defaults.");
            Config::default()
        }
    }
}

fn openai_settings(config: &Config, api_key: String, model: Option<&str>) -> OpenAiSettings {
    let chat_model = trimmed_or_none(model)
        .unwrap_or(config.openai.chat_model.as_str())
        .to_string();

    OpenAiSettings {
        api_key,
        base_url: config.openai.base_url.clone(),
        chat_model,
        image_model: config.openai.image_model.clone(),
        image_size: config.openai.image_size.clone(),
    }
}

fn print_outcome(outcome: &Outcome) {
    println!("\n=== OUTPUT ===\n");
    println!("{}", outcome.output);

    if let Some(report) = &outcome.comic {
        println!("\nComic script saved to {}", report.script_path.display());
        println!(
            "Saved {} panel image(s), {} captioned, in {}",
            report.panels.len(),
            report.captioned.len(),
            report.run_dir.display()
        );
        match (&report.strip, &report.manual_command) {
            (Some(strip), _) => println!("Comic strip saved to {}", strip.display()),
            (None, Some(command)) => println!("Assemble the strip manually with:\n  {command}"),
            (None, None) => println!("No comic strip was assembled."),
        }
        if !report.warnings.is_empty() {
            println!("Finished with {} warning(s).", report.warnings.len());
        }
    }
}
