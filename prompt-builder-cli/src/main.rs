use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use prompt_builder::optimizer::{OptimizationResult, OptimizeError, OptimizedPrompt};
use prompt_builder::session::Session;
use prompt_builder::utils::llm::openai::CompletionConfig;
use termimad::MadSkin;
use tokio::io::AsyncReadExt;

const USAGE: &str = "Usage: prompt-builder [--json] [FILE]\n\n\
Reads the prompt to optimize from FILE, or from stdin when FILE is missing or `-`.\n\
The API key is read from OPENAI_API_KEY; set logging=DEBUG for detailed errors.";

const REVIEW_NOTE: &str = "Please review the optimized prompt before using it in production. \
Remember that the model may still make mistakes. You can adjust the prompt manually if needed.";

#[derive(Debug, Default, PartialEq)]
struct Args {
    help: bool,
    json: bool,
    file: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item=String>) -> Result<Self> {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--json" => parsed.json = true,
                "-h" | "--help" => parsed.help = true,
                "-" => parsed.file = None,
                flag if flag.starts_with("--") => bail!("unknown option {}\n\n{}", flag, USAGE),
                path => {
                    if parsed.file.is_some() {
                        bail!("only one prompt file can be given\n\n{}", USAGE);
                    }
                    parsed.file = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

/// `logging=DEBUG` switches error output to full detail.
fn verbose_errors() -> bool {
    env::var("logging").map_or(false, |level| level.eq_ignore_ascii_case("debug"))
}

async fn read_prompt(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("could not read prompt from {}", path.display())),
        None => {
            let mut prompt = String::new();
            tokio::io::stdin()
                .read_to_string(&mut prompt)
                .await
                .context("could not read prompt from stdin")?;
            Ok(prompt)
        }
    }
}

fn render_markdown(optimized: &OptimizedPrompt) -> String {
    format!(
        "# Optimized Prompt\n```txt\n{}\n```\n> {}\n# Required Info\n{}\n",
        optimized.optimized_prompt, REVIEW_NOTE, optimized.required_info
    )
}

fn render_error(err: &OptimizeError, verbose: bool) -> String {
    if verbose {
        format!("{}: {}", err.user_message(), err)
    } else {
        err.user_message()
    }
}

fn completion_config() -> CompletionConfig {
    let mut config = CompletionConfig::default();
    if let Ok(api_base) = env::var("OPENAI_API_BASE") {
        debug!("Using API base {}", api_base);
        config.api_base = Some(api_base);
    }
    config
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .format_target(false)
        .init();

    let args = Args::parse(env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }
    let verbose = verbose_errors();

    let api_key = env::var("OPENAI_API_KEY").context(
        "OPENAI_API_KEY is not set. You can find or create your OpenAI API key at \
        https://platform.openai.com/account/api-keys",
    )?;
    let mut session = Session::new(completion_config());
    session.set_credential(&api_key)?;

    let prompt = read_prompt(args.file.as_ref()).await?;
    info!("Optimizing a prompt of {} bytes", prompt.len());
    let outcome = session.try_optimize(&prompt).await;
    let succeeded = outcome.is_ok();

    if args.json {
        let result: OptimizationResult = match outcome {
            Ok(optimized) => optimized.into(),
            Err(e) => e.into(),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match outcome {
            Ok(optimized) => MadSkin::default().print_text(&render_markdown(&optimized)),
            Err(e) => eprintln!("{}", render_error(&e, verbose)),
        }
    }

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
